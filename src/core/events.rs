use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a normalized event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum EventKind {
    Purchase,
    Reward,
    Mined,
    Disposal,
}

impl EventKind {
    /// The lot origin for acquisition kinds, `None` for disposals.
    pub fn origin(self) -> Option<OriginKind> {
        match self {
            EventKind::Purchase => Some(OriginKind::Purchase),
            EventKind::Reward => Some(OriginKind::Reward),
            EventKind::Mined => Some(OriginKind::Mined),
            EventKind::Disposal => None,
        }
    }

    /// Acquisitions that are also taxable as income when received
    pub fn is_income(self) -> bool {
        matches!(self, EventKind::Reward | EventKind::Mined)
    }

    pub fn display(self) -> &'static str {
        match self {
            EventKind::Purchase => "Purchase",
            EventKind::Reward => "Reward",
            EventKind::Mined => "Mined",
            EventKind::Disposal => "Disposal",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "purchase" | "buy" | "compra" => Ok(EventKind::Purchase),
            "reward" | "staking" | "stakingreward" | "recompensa" => Ok(EventKind::Reward),
            "mined" | "mining" | "minería" | "mineria" => Ok(EventKind::Mined),
            "disposal" | "sale" | "sell" | "venta" => Ok(EventKind::Disposal),
            _ => Err(s.to_string()),
        }
    }
}

/// How an acquisition lot came into the inventory. Traceability only; it
/// never changes matching priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum OriginKind {
    Purchase,
    Reward,
    Mined,
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OriginKind::Purchase => "Purchase",
            OriginKind::Reward => "Reward",
            OriginKind::Mined => "Mined",
        };
        f.write_str(s)
    }
}

/// A typed acquisition or disposal, as produced by the normalizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxableEvent {
    /// Position in the normalized (sorted) event sequence
    pub id: usize,
    /// 1-based row in the source file
    pub row: usize,
    pub datetime: NaiveDateTime,
    pub kind: EventKind,
    pub asset: String,
    pub quantity: Decimal,
    /// Cost basis for acquisitions, total proceeds for disposals
    pub value: Decimal,
    /// Fair-market valuation, used as income for rewards and mined units
    pub fair_value: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub description: Option<String>,
}

impl TaxableEvent {
    pub fn year(&self) -> i32 {
        self.datetime.year()
    }

    /// Value declared as income for this event, zero for purchases and disposals
    pub fn income_value(&self) -> Decimal {
        if self.kind.is_income() {
            self.fair_value.unwrap_or(self.value)
        } else {
            Decimal::ZERO
        }
    }
}
