mod cmd;
mod core;
mod utils;

use clap::{Parser, Subcommand};

/// FIFO capital gains and income for crypto assets
#[derive(Parser, Debug)]
#[command(name = "fifotax", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Realized gains and income per calendar year
    Summary(cmd::summary::SummaryCommand),
    /// Gain or loss for every disposal
    Gains(cmd::gains::GainsCommand),
    /// Lots drawn by each disposal
    Trace(cmd::trace::TraceCommand),
    /// Lots left open after all disposals
    Lots(cmd::lots::LotsCommand),
    /// Report disposals that exceed available inventory
    Validate(cmd::validate::ValidateCommand),
    /// Write annual summary, disposal gains and FIFO trace CSV files
    Export(cmd::export::ExportCommand),
    /// Print the expected input format
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Summary(summary) => summary.exec(),
        Command::Gains(gains) => gains.exec(),
        Command::Trace(trace) => trace.exec(),
        Command::Lots(lots) => lots.exec(),
        Command::Validate(validate) => validate.exec(),
        Command::Export(export) => export.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
