pub mod annual;
pub mod error;
pub mod events;
pub mod inventory;
pub mod matching;
pub mod normalize;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use annual::{annual_summary, AnnualReport, AnnualSummary};
pub use events::TaxableEvent;
pub use inventory::AcquisitionLot;
pub use matching::{match_disposals, DisposalSummary, MatchRecord, MatchReport};
pub use normalize::{read_csv, read_json, EventRecord, TaxInput};
pub use warnings::Warning;
