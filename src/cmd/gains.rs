//! Gains command - one row per disposal

use super::rows::GainRow;
use super::InputArgs;
use crate::utils::{print_table, write_csv};
use clap::Args;
use std::io;

#[derive(Args, Debug)]
pub struct GainsCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Calendar year to report (e.g., 2024)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as CSV instead of a table
    #[arg(long)]
    csv: bool,
}

impl GainsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;
        let rows: Vec<GainRow> = run.report.disposals(self.year).map(GainRow::from).collect();

        if self.csv {
            return write_csv(rows, io::stdout());
        }
        if rows.is_empty() {
            println!("No disposals in range.");
        } else {
            print_table(&rows);
        }
        Ok(())
    }
}
