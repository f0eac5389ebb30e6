//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::filter::FilterCriteria;
use crate::models::GroupBy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// EduTrack - application pipeline tracker for study-abroad consultancies
///
/// Dashboards, performance tables and filtered application lists over the
/// hosted record store, or over local JSON fixtures with --mock.
///
/// Examples:
///   edutrack dashboard
///   edutrack --mock trends --weekly
///   edutrack performance --by marketer --intake "July 2024"
///   edutrack applications --campus Sydney --offer-status Issued
///   edutrack create agents --data '{"name": "Global Reach", "email": "g@x.com", "phone": "98"}'
///   edutrack --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .edutrack.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Use in-memory collections seeded from fixture files
    #[arg(long, global = true)]
    pub mock: bool,

    /// Directory holding the fixture files
    #[arg(long, value_name = "DIR", global = true)]
    pub fixtures: Option<PathBuf>,

    /// Simulated latency for in-memory calls, in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    pub latency_ms: Option<u64>,

    /// Record store base URL
    #[arg(long, value_name = "URL", env = "EDUTRACK_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Record store project identifier
    #[arg(long, value_name = "ID", env = "EDUTRACK_PROJECT_ID", global = true)]
    pub project_id: Option<String>,

    /// Record store public key
    #[arg(
        long,
        value_name = "KEY",
        env = "EDUTRACK_PUBLIC_KEY",
        hide_env_values = true,
        global = true
    )]
    pub public_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .edutrack.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Headline numbers: applications, offers, COEs, collections
    Dashboard,

    /// Monthly (or derived weekly) trend series
    Trends {
        /// Split each month into four weeks
        #[arg(long)]
        weekly: bool,
    },

    /// Performance table grouped by agent or marketer
    Performance {
        #[arg(long, value_enum, default_value = "agent")]
        by: GroupByArg,

        #[arg(long)]
        campus: Option<String>,

        #[arg(long)]
        course: Option<String>,

        #[arg(long)]
        intake: Option<String>,
    },

    /// Filtered applications table
    Applications(FilterArgs),

    /// Applications credited to one marketer
    ByMarketer {
        /// Marketer display name
        name: String,
    },

    /// List every record of a collection
    List {
        #[arg(value_enum)]
        collection: Collection,
    },

    /// Show one record
    Get {
        #[arg(value_enum)]
        collection: Collection,
        id: String,
    },

    /// Create a record from a JSON object
    Create {
        #[arg(value_enum)]
        collection: Collection,
        #[arg(long, value_name = "JSON")]
        data: String,
    },

    /// Merge JSON fields onto a record
    Update {
        #[arg(value_enum)]
        collection: Collection,
        id: String,
        #[arg(long, value_name = "JSON")]
        data: String,
    },

    /// Delete a record
    Delete {
        #[arg(value_enum)]
        collection: Collection,
        id: String,
    },

    /// Reset a dashboard user's password
    ResetPassword { id: String, password: String },

    /// Issue temporary login credentials
    Invite {
        email: String,
        /// Dashboard URL the login link points at
        #[arg(long, default_value = "http://localhost:5173")]
        app_url: String,
    },
}

/// Filter flags for the applications table.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub campus: Option<String>,
    #[arg(long)]
    pub course: Option<String>,
    #[arg(long)]
    pub agent: Option<String>,
    #[arg(long)]
    pub intake: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Substring of the applicant name
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub offer_status: Option<String>,
    #[arg(long)]
    pub gs_status: Option<String>,
    #[arg(long)]
    pub coe_status: Option<String>,
    #[arg(long)]
    pub visa_status: Option<String>,
    #[arg(long)]
    pub marketer: Option<String>,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        Self {
            campus: args.campus,
            course: args.course,
            agent: args.agent,
            intake: args.intake,
            location: args.location,
            search: args.search,
            offer_status: args.offer_status,
            gs_status: args.gs_status,
            coe_status: args.coe_status,
            visa_status: args.visa_status,
            marketer: args.marketer,
        }
    }
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Grouping dimension for `performance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GroupByArg {
    Agent,
    Marketer,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Agent => GroupBy::Agent,
            GroupByArg::Marketer => GroupBy::Marketer,
        }
    }
}

/// Collections reachable through the generic record commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Collection {
    Students,
    Applications,
    Agents,
    Marketers,
    Campuses,
    MarketerPerformance,
    Users,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A subcommand is required (try --help)".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref fixtures) = self.fixtures {
            if !fixtures.is_dir() {
                return Err(format!(
                    "Fixture directory does not exist: {}",
                    fixtures.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
