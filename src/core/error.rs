use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// A broken precondition of the matching engine or the lot inventory.
///
/// These are programming or feed errors rather than data conditions: the run
/// is aborted and no partial output is produced.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("event {event}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity { event: usize, quantity: Decimal },
    #[error("event {event}: value must not be negative, got {value}")]
    NegativeValue { event: usize, value: Decimal },
    #[error("event {event} at {current} is earlier than the previous event at {previous}")]
    UnsortedFeed {
        event: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
    #[error("lot {lot} ({asset}): cannot consume {requested}, only {remaining} remaining")]
    OverConsumption {
        lot: usize,
        asset: String,
        requested: Decimal,
        remaining: Decimal,
    },
    #[error("lot {lot} ({asset}): consumed amount must be positive, got {amount}")]
    NonPositiveConsumption {
        lot: usize,
        asset: String,
        amount: Decimal,
    },
    #[error("lot {lot} ({asset}) is not open")]
    UnknownLot { lot: usize, asset: String },
}

/// A raw input row that could not be turned into a typed event.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("row {row}: invalid date/datetime '{value}'")]
    InvalidDatetime { row: usize, value: String },
    #[error("row {row}: unknown event kind '{value}'")]
    UnknownEventKind { row: usize, value: String },
    #[error("row {row}: no total_value, unit_price or fair_value to value the {kind} event")]
    MissingValue { row: usize, kind: String },
    #[error("row {row}: asset is empty")]
    EmptyAsset { row: usize },
    #[error("row {row}: unit_price * quantity is out of range")]
    ValueOverflow { row: usize },
}
