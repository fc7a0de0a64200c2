pub mod export;
pub mod gains;
pub mod lots;
pub mod rows;
pub mod schema;
pub mod summary;
pub mod trace;
pub mod validate;

use crate::core::{self, match_disposals, MatchReport, TaxableEvent};
use clap::Args;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Input flags shared by the reporting commands
#[derive(Args, Debug)]
pub struct InputArgs {
    /// CSV or JSON file containing events (reads stdin with "-")
    #[arg(short, long, default_value = "-")]
    pub events: PathBuf,

    /// Only include events for this asset (e.g., BTC, ETH)
    #[arg(short, long)]
    pub asset: Option<String>,
}

/// Normalized events together with their matching result
pub struct Run {
    pub events: Vec<TaxableEvent>,
    pub report: MatchReport,
}

impl InputArgs {
    /// Read, filter and match the input
    pub fn run(&self) -> anyhow::Result<Run> {
        let events = read_events(&self.events)?;
        let events: Vec<_> = match self.asset {
            Some(ref asset) => events
                .into_iter()
                .filter(|e| e.asset.eq_ignore_ascii_case(asset.trim()))
                .collect(),
            None => events,
        };
        let report = match_disposals(&events)?;
        Ok(Run { events, report })
    }
}

/// Read events from CSV or JSON file based on extension (or stdin with "-")
pub fn read_events(path: &Path) -> anyhow::Result<Vec<TaxableEvent>> {
    if path.as_os_str() == "-" {
        return read_from_stdin();
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let events = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => core::read_json(reader)?,
        _ => core::read_csv(reader)?,
    };
    log::info!("Read {} events from {}", events.len(), path.display());
    Ok(events)
}

fn read_from_stdin() -> anyhow::Result<Vec<TaxableEvent>> {
    let mut buffer = Vec::new();
    io::stdin().lock().read_to_end(&mut buffer)?;

    if buffer.iter().all(u8::is_ascii_whitespace) {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    // JSON input is an object, CSV starts with its header row
    let is_json = buffer
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');
    let cursor = io::Cursor::new(buffer);
    if is_json {
        core::read_json(cursor)
    } else {
        core::read_csv(cursor)
    }
}
