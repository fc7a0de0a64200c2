use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Domain warning types emitted during matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// No eligible lot at all: the whole disposal has no cost basis.
    NoInventory {
        #[schemars(with = "f64")]
        required: Decimal,
    },
    /// Inventory ran out part way through the disposal.
    InsufficientInventory {
        #[schemars(with = "f64")]
        matched: Decimal,
        #[schemars(with = "f64")]
        required: Decimal,
    },
}

impl Warning {
    pub fn name(&self) -> &'static str {
        match self {
            Warning::NoInventory { .. } => "NoInventory",
            Warning::InsufficientInventory { .. } => "InsufficientInventory",
        }
    }
}
