//! Trace command - every lot drawn by every disposal

use super::rows::TraceRow;
use super::InputArgs;
use crate::utils::{print_table, write_csv};
use clap::Args;
use std::io;

#[derive(Args, Debug)]
pub struct TraceCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Calendar year of the disposals to trace (e.g., 2024)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as CSV instead of a table
    #[arg(long)]
    csv: bool,
}

impl TraceCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;
        let report = &run.report;
        let rows: Vec<TraceRow> = report
            .summaries
            .iter()
            .enumerate()
            .filter(|(_, d)| self.year.is_none_or(|y| d.year() == y))
            .flat_map(|(index, _)| report.matches_for(index))
            .map(TraceRow::from)
            .collect();

        if self.csv {
            return write_csv(rows, io::stdout());
        }
        if rows.is_empty() {
            println!("No matched lots in range.");
        } else {
            print_table(&rows);
        }
        Ok(())
    }
}
