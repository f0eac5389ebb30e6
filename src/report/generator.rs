//! Markdown report generation.
//!
//! This module renders dashboard numbers, performance tables, trend
//! series and application lists as Markdown, plus JSON for scripting.

use crate::analysis::sort_for_display;
use crate::models::{AnalyticsDataPoint, Application, DashboardStats, PerformanceSummary, Ref};
use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

/// Format a currency amount with thousands separators.
///
/// Whole amounts print without decimals; anything else is rounded to cents.
pub fn format_amount(amount: Decimal) -> String {
    let text = amount.round_dp(2).normalize().to_string();
    let (digits, fraction) = match text.split_once('.') {
        Some((digits, fraction)) => (digits, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(fraction) = fraction {
        out.push_str(&format!(".{:0<2}", fraction));
    }
    out
}

fn reference_label(reference: &Option<Ref>) -> String {
    match reference {
        Some(r) => r
            .display_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", r.id())),
        None => "-".to_string(),
    }
}

/// Escape pipes so free text cannot break a table row.
fn cell(text: &str) -> String {
    if text.is_empty() {
        "-".to_string()
    } else {
        text.replace('|', "\\|")
    }
}

/// Generate the dashboard summary.
pub fn generate_dashboard_markdown(stats: &DashboardStats) -> String {
    let mut output = String::new();

    output.push_str("# EduTrack Dashboard\n\n");
    output.push_str(&format!(
        "*Generated {}*\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str("| Total Applications | Offers Issued | COE Issued | Total Collection |\n");
    output.push_str("|:---:|:---:|:---:|:---:|\n");
    output.push_str(&format!(
        "| {} | {} | {} | {} |\n",
        stats.total_applications,
        stats.offers_issued,
        stats.coe_issued,
        format_amount(stats.total_collection)
    ));

    output
}

/// Generate a performance table.
pub fn generate_performance_markdown(title: &str, summaries: &[PerformanceSummary]) -> String {
    let mut output = String::new();
    output.push_str(&format!("## {}\n\n", title));

    let filters = summaries.iter().find_map(|s| s.filters.as_ref());
    if let Some(filters) = filters {
        let mut applied = Vec::new();
        if let Some(ref campus) = filters.campus {
            applied.push(format!("campus = {}", campus));
        }
        if let Some(ref course) = filters.course {
            applied.push(format!("course = {}", course));
        }
        if let Some(ref intake) = filters.intake {
            applied.push(format!("intake = {}", intake));
        }
        output.push_str(&format!("*Filters: {}*\n\n", applied.join(", ")));
    }

    if summaries.is_empty() {
        output.push_str("No applications found.\n");
        return output;
    }

    let mut rows = summaries.to_vec();
    sort_for_display(&mut rows);

    let dimension = rows[0].group_by;
    output.push_str(&format!(
        "| {} | Applications | Offers | COE | Amount | Conversion |\n",
        dimension
    ));
    output.push_str("|---|---:|---:|---:|---:|---:|\n");
    for row in &rows {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {}% |\n",
            cell(&row.name),
            row.applications,
            row.offers_issued,
            row.coe_issued,
            format_amount(row.total_amount),
            row.conversion_rate
        ));
    }

    output
}

/// Generate a trend table.
pub fn generate_trends_markdown(title: &str, points: &[AnalyticsDataPoint]) -> String {
    let mut output = String::new();
    output.push_str(&format!("## {}\n\n", title));

    if points.is_empty() {
        output.push_str("No trend data available.\n");
        return output;
    }

    output.push_str("| Period | Applications | Offers | COE | Collection |\n");
    output.push_str("|---|---:|---:|---:|---:|\n");
    for point in points {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            point.period,
            point.total_applications,
            point.offers_issued,
            point.coe_issued,
            format_amount(point.total_collection)
        ));
    }

    output
}

/// Generate the applications table.
pub fn generate_applications_markdown(applications: &[Application]) -> String {
    let mut output = String::new();
    output.push_str(&format!("## Applications ({})\n\n", applications.len()));

    if applications.is_empty() {
        output.push_str("No applications match.\n");
        return output;
    }

    output.push_str(
        "| ID | Name | Campus | Course | Intake | Agent | Offer | GS | Visa | COE | Amount |\n",
    );
    output.push_str("|---:|---|---|---|---|---|---|---|---|---|---:|\n");
    for app in applications {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            app.id,
            cell(&app.name),
            cell(&reference_label(&app.campus)),
            cell(&app.course),
            cell(&app.intake),
            cell(&reference_label(&app.agent)),
            app.offer_status,
            app.gs_status,
            app.visa_status,
            app.coe_status,
            format_amount(app.amount)
        ));
    }

    output
}

/// Generate pretty JSON for any output.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Write output to `path`, or to stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write output to {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
