//! Summary command - realized gains and income per calendar year

use super::rows::AnnualRow;
use super::InputArgs;
use crate::core::{annual_summary, AnnualReport, MatchReport};
use crate::utils::{format_amount, print_table};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Calendar year to report (e.g., 2024)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Summary data for JSON output
#[derive(Debug, Serialize)]
struct SummaryData {
    year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    asset: Option<String>,
    years: Vec<AnnualRow>,
    totals: AnnualRow,
    total_proceeds: String,
    total_cost: String,
    unattributed_proceeds: String,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;
        let annual = annual_summary(&run.events, &run.report);

        if self.json {
            self.print_json(&annual, &run.report)
        } else {
            self.print_summary(&annual, &run.report);
            Ok(())
        }
    }

    fn year_label(&self) -> String {
        self.year.map_or("All Years".to_string(), |y| y.to_string())
    }

    fn print_summary(&self, annual: &AnnualReport, report: &MatchReport) {
        println!();
        match self.input.asset {
            Some(ref asset) => println!("SUMMARY ({}, {})", self.year_label(), asset.to_uppercase()),
            None => println!("SUMMARY ({})", self.year_label()),
        }
        println!();

        let mut rows: Vec<AnnualRow> = annual.rows(self.year).map(AnnualRow::from).collect();
        if rows.is_empty() {
            println!("No events in range.");
            println!();
            return;
        }
        if rows.len() > 1 {
            rows.push(AnnualRow::totals(&annual.totals(self.year)));
        }
        print_table(&rows);

        println!();
        println!(
            "Proceeds: {} | Cost basis: {} | Gain: {}",
            format_amount(report.total_proceeds(self.year)),
            format_amount(report.total_cost(self.year)),
            format_amount(report.total_gain(self.year))
        );

        let shortfalls = report
            .disposals(self.year)
            .filter(|d| !d.is_fully_matched())
            .count();
        if shortfalls > 0 {
            println!(
                "\u{26A0} {} disposal(s) exceed available inventory. Run `validate` for details.",
                shortfalls
            );
        }
        println!();
    }

    fn print_json(&self, annual: &AnnualReport, report: &MatchReport) -> anyhow::Result<()> {
        let unattributed: Decimal = report
            .disposals(self.year)
            .map(|d| d.unattributed_proceeds())
            .sum();

        let data = SummaryData {
            year: self.year_label(),
            asset: self.input.asset.as_ref().map(|a| a.to_uppercase()),
            years: annual.rows(self.year).map(AnnualRow::from).collect(),
            totals: AnnualRow::totals(&annual.totals(self.year)),
            total_proceeds: format_amount(report.total_proceeds(self.year)),
            total_cost: format_amount(report.total_cost(self.year)),
            unattributed_proceeds: format_amount(unattributed),
        };

        println!("{}", serde_json::to_string_pretty(&data)?);
        Ok(())
    }
}
