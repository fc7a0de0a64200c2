//! Validate command - surface disposals that outrun the available inventory

use super::InputArgs;
use crate::core::{DisposalSummary, TaxableEvent, Warning};
use crate::utils::{format_amount, format_quantity};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Calendar year to check (e.g., 2024)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A validation issue for output
#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    row: Option<usize>,
    date: String,
    asset: String,
    quantity: String,
    shortfall: String,
    unattributed_proceeds: String,
    message: String,
}

impl ValidationIssue {
    fn new(disposal: &DisposalSummary, warning: &Warning, events: &[TaxableEvent]) -> Self {
        ValidationIssue {
            issue_type: warning.name().to_string(),
            row: events.iter().find(|e| e.id == disposal.event).map(|e| e.row),
            date: disposal.datetime.format("%Y-%m-%d").to_string(),
            asset: disposal.asset.clone(),
            quantity: format_quantity(disposal.quantity),
            shortfall: format_quantity(disposal.shortfall),
            unattributed_proceeds: format_amount(disposal.unattributed_proceeds()),
            message: warning_message(warning),
        }
    }
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput {
    year: String,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;

        let issues: Vec<ValidationIssue> = run
            .report
            .disposals(self.year)
            .filter_map(|d| d.warning().map(|w| ValidationIssue::new(d, &w, &run.events)))
            .collect();

        if self.json {
            self.print_json(&issues)?;
        } else {
            self.print_text(&issues);
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn year_label(&self) -> String {
        self.year.map_or("All Years".to_string(), |y| y.to_string())
    }

    fn print_text(&self, issues: &[ValidationIssue]) {
        println!();
        println!("VALIDATION RESULTS ({})", self.year_label());
        println!();

        if issues.is_empty() {
            println!("\u{2713} No issues found.");
            return;
        }

        println!("\u{26A0} {} issue(s) found:", issues.len());
        println!();
        for (i, issue) in issues.iter().enumerate() {
            let row = issue.row.map(|r| format!(" (row {})", r)).unwrap_or_default();
            println!(
                "  {}. [{}] {} Disposal of {} {}{}",
                i + 1,
                issue.issue_type,
                issue.date,
                issue.quantity,
                issue.asset,
                row
            );
            println!("     {}", issue.message);
            println!(
                "     Proceeds without cost basis: {}",
                issue.unattributed_proceeds
            );
            println!();
        }
    }

    fn print_json(&self, issues: &[ValidationIssue]) -> anyhow::Result<()> {
        let output = ValidationOutput {
            year: self.year_label(),
            issue_count: issues.len(),
            issues: issues.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

fn warning_message(warning: &Warning) -> String {
    match warning {
        Warning::NoInventory { required } => format!(
            "No lots acquired on or before this date - {} unmatched",
            format_quantity(*required)
        ),
        Warning::InsufficientInventory { matched, required } => format!(
            "Inventory only covered {} of {} - {} unmatched",
            format_quantity(*matched),
            format_quantity(*required),
            format_quantity(*required - *matched)
        ),
    }
}
