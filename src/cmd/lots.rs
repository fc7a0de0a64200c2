//! Lots command - inventory left open after all disposals

use super::rows::LotRow;
use super::InputArgs;
use crate::utils::{format_amount, print_table};
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct LotsCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Output as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl LotsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;
        let rows: Vec<LotRow> = run.report.open_lots.iter().map(LotRow::from).collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        if rows.is_empty() {
            println!("No open lots.");
            return Ok(());
        }
        print_table(&rows);

        let basis: Decimal = run.report.open_lots.iter().map(|l| l.remaining_cost()).sum();
        println!();
        println!("{} open lot(s), cost basis {}", rows.len(), format_amount(basis));
        Ok(())
    }
}
