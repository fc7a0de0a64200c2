//! Export command - write the annual summary, disposal gains and FIFO trace
//! as CSV files

use super::rows::{AnnualRow, GainRow, TraceRow};
use super::InputArgs;
use crate::core::annual_summary;
use crate::utils::write_csv;
use clap::Args;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const ANNUAL_SUMMARY_FILE: &str = "annual_summary.csv";
pub const DISPOSAL_GAINS_FILE: &str = "disposal_gains.csv";
pub const FIFO_TRACE_FILE: &str = "fifo_trace.csv";

#[derive(Args, Debug)]
pub struct ExportCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Directory to write the CSV files into (created if missing)
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

impl ExportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;
        let annual = annual_summary(&run.events, &run.report);

        fs::create_dir_all(&self.out_dir)?;

        let annual_rows = annual.rows(None).map(AnnualRow::from);
        let path = write_file(&self.out_dir, ANNUAL_SUMMARY_FILE, annual_rows)?;
        println!("Annual summary written to: {}", path.display());

        let gain_rows = run.report.summaries.iter().map(GainRow::from);
        let path = write_file(&self.out_dir, DISPOSAL_GAINS_FILE, gain_rows)?;
        println!("Disposal gains written to: {}", path.display());

        let trace_rows = run.report.matches.iter().map(TraceRow::from);
        let path = write_file(&self.out_dir, FIFO_TRACE_FILE, trace_rows)?;
        println!("FIFO trace written to: {}", path.display());

        Ok(())
    }
}

fn write_file<I, R>(dir: &Path, name: &str, rows: I) -> anyhow::Result<PathBuf>
where
    I: IntoIterator<Item = R>,
    R: serde::Serialize,
{
    let path = dir.join(name);
    let file = File::create(&path)?;
    write_csv(rows, BufWriter::new(file))?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}
