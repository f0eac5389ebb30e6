//! EduTrack - application pipeline tracker
//!
//! A CLI over the EduTrack data layer: dashboards, performance tables,
//! trend series, filtered application lists and record maintenance.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, store failure, invalid input, etc.)

use anyhow::{Context, Result};
use edutrack::analysis::{AnalyticsService, Workspace};
use edutrack::cli::{Args, Collection, Command, OutputFormat};
use edutrack::config::{Config, CONFIG_FILE};
use edutrack::filter::{FilterCriteria, FilterEngine, FilterOutcome, TableState};
use edutrack::models::{GroupBy, RecordId};
use edutrack::report;
use edutrack::store::{Entity, Repositories, Repository};
use edutrack::users::UserAdmin;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("EduTrack v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .edutrack.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Set store.project_id and store.public_key, or use --mock with fixtures.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

fn spinner(args: &Args, message: &str) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Run the selected subcommand and write its output.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let format = args
        .format
        .or_else(|| OutputFormat::from_name(&config.general.format))
        .unwrap_or_default();

    let (repos, monthly) =
        Repositories::from_config(&config).context("Failed to set up the record store")?;

    let command = args
        .command
        .clone()
        .context("A subcommand is required (try --help)")?;

    let pb = spinner(&args, "Loading records...");
    let result = execute(command, &repos, monthly, format).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let output = result?;

    report::write_output(&output, args.output.as_deref())?;
    debug!("Finished in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

async fn execute(
    command: Command,
    repos: &Repositories,
    monthly: Vec<edutrack::models::AnalyticsDataPoint>,
    format: OutputFormat,
) -> Result<String> {
    let analytics = AnalyticsService::new(repos.clone(), monthly);

    match command {
        Command::Dashboard => {
            let stats = analytics
                .dashboard_stats()
                .await
                .context("Failed to load dashboard")?;
            match format {
                OutputFormat::Json => report::generate_json(&stats),
                OutputFormat::Markdown => Ok(report::generate_dashboard_markdown(&stats)),
            }
        }

        Command::Trends { weekly } => {
            let (title, points) = if weekly {
                ("Weekly Performance Trends", analytics.weekly_data().await)
            } else {
                ("Monthly Performance Trends", analytics.monthly_data().await)
            };
            let points = points.context("Failed to load trend data")?;
            match format {
                OutputFormat::Json => report::generate_json(&points),
                OutputFormat::Markdown => Ok(report::generate_trends_markdown(title, &points)),
            }
        }

        Command::Performance {
            by,
            campus,
            course,
            intake,
        } => {
            let group_by = GroupBy::from(by);
            let criteria = FilterCriteria {
                campus,
                course,
                intake,
                ..Default::default()
            };
            let summaries = analytics
                .performance_by_filters(group_by, &criteria)
                .await
                .context("Failed to load performance data")?;
            match format {
                OutputFormat::Json => report::generate_json(&summaries),
                OutputFormat::Markdown => Ok(report::generate_performance_markdown(
                    &format!("{} Performance", group_by),
                    &summaries,
                )),
            }
        }

        Command::Applications(filters) => {
            let criteria = FilterCriteria::from(filters);
            let workspace = Workspace::load(repos)
                .await
                .context("Failed to load applications")?;
            let mut table = TableState::new(workspace.applications);

            let engine = FilterEngine::new(repos.clone());
            match table.apply_filters(&engine, &criteria).await {
                FilterOutcome::Applied(count) => info!("{} application(s) match", count),
                FilterOutcome::Unchanged => debug!("No filters given"),
                FilterOutcome::Retained(e) => eprintln!("⚠️  Showing unfiltered results: {}", e),
            }

            match format {
                OutputFormat::Json => report::generate_json(table.rows()),
                OutputFormat::Markdown => Ok(report::generate_applications_markdown(table.rows())),
            }
        }

        Command::ByMarketer { name } => {
            let applications = analytics
                .applications_by_marketer(&name)
                .await
                .with_context(|| format!("Failed to load applications for {}", name))?;
            match format {
                OutputFormat::Json => report::generate_json(&applications),
                OutputFormat::Markdown => Ok(report::generate_applications_markdown(&applications)),
            }
        }

        Command::List { collection } => {
            dispatch(repos, collection, RecordAction::List, format).await
        }
        Command::Get { collection, id } => {
            dispatch(repos, collection, RecordAction::Get(parse_id(&id)?), format).await
        }
        Command::Create { collection, data } => {
            let data = parse_data(&data)?;
            dispatch(repos, collection, RecordAction::Create(data), format).await
        }
        Command::Update {
            collection,
            id,
            data,
        } => {
            let id = parse_id(&id)?;
            let data = parse_data(&data)?;
            dispatch(repos, collection, RecordAction::Update(id, data), format).await
        }
        Command::Delete { collection, id } => {
            dispatch(repos, collection, RecordAction::Delete(parse_id(&id)?), format).await
        }

        Command::ResetPassword { id, password } => {
            let admin = UserAdmin::new(repos.users.clone());
            admin
                .reset_password(parse_id(&id)?, &password)
                .await
                .context("Failed to reset password")?;
            Ok(format!("✅ Password reset for user {}", id))
        }

        Command::Invite { email, app_url } => {
            let admin = UserAdmin::new(repos.users.clone());
            let credentials = admin
                .generate_login_credentials(&email, &app_url)
                .context("Failed to issue credentials")?;
            report::generate_json(&credentials)
        }
    }
}

/// A generic record operation.
enum RecordAction {
    List,
    Get(RecordId),
    Create(serde_json::Value),
    Update(RecordId, serde_json::Value),
    Delete(RecordId),
}

fn parse_id(raw: &str) -> Result<RecordId> {
    RecordId::parse(raw).map_err(Into::into)
}

fn parse_data(raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).context("--data must be a JSON object")
}

async fn dispatch(
    repos: &Repositories,
    collection: Collection,
    action: RecordAction,
    format: OutputFormat,
) -> Result<String> {
    match collection {
        Collection::Students => record_command(&repos.students, action, format).await,
        Collection::Applications => record_command(&repos.applications, action, format).await,
        Collection::Agents => record_command(&repos.agents, action, format).await,
        Collection::Marketers => record_command(&repos.marketers, action, format).await,
        Collection::Campuses => record_command(&repos.campuses, action, format).await,
        Collection::MarketerPerformance => {
            record_command(&repos.marketer_performance, action, format).await
        }
        Collection::Users => record_command(&repos.users, action, format).await,
    }
}

async fn record_command<E: Entity>(
    repo: &Arc<dyn Repository<E>>,
    action: RecordAction,
    format: OutputFormat,
) -> Result<String> {
    let body = match action {
        RecordAction::List => {
            let records = repo.get_all().await?;
            info!("{} {} record(s)", records.len(), E::TABLE);
            report::generate_json(&records)?
        }
        RecordAction::Get(id) => report::generate_json(&repo.get_by_id(id).await?)?,
        RecordAction::Create(data) => {
            let draft: E::Draft = serde_json::from_value(data)
                .with_context(|| format!("Invalid {} fields", E::TABLE))?;
            let created = repo.create(draft).await?;
            info!("Created {} {}", E::TABLE, created.id());
            report::generate_json(&created)?
        }
        RecordAction::Update(id, data) => {
            let draft: E::Draft = serde_json::from_value(data)
                .with_context(|| format!("Invalid {} fields", E::TABLE))?;
            report::generate_json(&repo.update(id, draft).await?)?
        }
        RecordAction::Delete(id) => {
            repo.delete(id).await?;
            return Ok(format!("✅ Deleted {} {}", E::TABLE, id));
        }
    };

    Ok(match format {
        OutputFormat::Json => body,
        OutputFormat::Markdown => format!("```json\n{}\n```", body),
    })
}
