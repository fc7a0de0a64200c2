use super::error::InvariantViolation;
use super::events::OriginKind;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// An open quantity of an asset acquired at one time and unit cost
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionLot {
    /// Insertion sequence number, assigned by [`LotInventory::acquire`]
    pub id: usize,
    pub asset: String,
    pub timestamp: NaiveDateTime,
    /// Remaining quantity
    pub quantity: Decimal,
    pub original_quantity: Decimal,
    pub unit_cost: Decimal,
    pub origin: OriginKind,
}

impl AcquisitionLot {
    /// Create a lot whose unit cost is `total_value / quantity`.
    ///
    /// `quantity` must be positive.
    pub fn new(
        asset: String,
        timestamp: NaiveDateTime,
        quantity: Decimal,
        total_value: Decimal,
        origin: OriginKind,
    ) -> Self {
        AcquisitionLot {
            id: 0,
            asset,
            timestamp,
            quantity,
            original_quantity: quantity,
            unit_cost: total_value / quantity,
            origin,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.quantity <= Decimal::ZERO
    }

    /// Cost basis of the quantity still open
    pub fn remaining_cost(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

/// Open acquisition lots, one FIFO queue per asset.
///
/// Lots must be acquired in non-decreasing timestamp order. Under that
/// precondition the first open lot of a queue is the earliest one, so lookups
/// never scan past it.
#[derive(Debug, Default)]
pub struct LotInventory {
    lots: HashMap<String, VecDeque<AcquisitionLot>>,
    next_id: usize,
}

impl LotInventory {
    pub fn new() -> Self {
        LotInventory::default()
    }

    /// Append a lot to its asset's queue, returning the id assigned to it
    pub fn acquire(&mut self, mut lot: AcquisitionLot) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        lot.id = id;
        log::debug!(
            "Lot {} {} ACQUIRE: qty={}, unit_cost={}, at {} ({})",
            id,
            lot.asset,
            lot.quantity,
            lot.unit_cost,
            lot.timestamp,
            lot.origin
        );
        self.lots.entry(lot.asset.clone()).or_default().push_back(lot);
        id
    }

    /// Whether any lot of `asset` was ever acquired and is still open
    pub fn contains_asset(&self, asset: &str) -> bool {
        self.lots.get(asset).is_some_and(|queue| !queue.is_empty())
    }

    /// The earliest open lot of `asset` acquired at or before `as_of`.
    ///
    /// Lots with equal timestamps are returned in insertion order.
    pub fn earliest_eligible(&self, asset: &str, as_of: NaiveDateTime) -> Option<&AcquisitionLot> {
        self.lots
            .get(asset)?
            .iter()
            .find(|lot| !lot.is_exhausted())
            .filter(|lot| lot.timestamp <= as_of)
    }

    /// Draw `amount` from lot `lot_id`, returning the quantity left in it.
    ///
    /// A lot drawn down to zero is removed for good.
    pub fn consume(
        &mut self,
        asset: &str,
        lot_id: usize,
        amount: Decimal,
    ) -> Result<Decimal, InvariantViolation> {
        let unknown = || InvariantViolation::UnknownLot {
            lot: lot_id,
            asset: asset.to_string(),
        };
        let queue = self.lots.get_mut(asset).ok_or_else(unknown)?;
        let index = queue
            .iter()
            .position(|lot| lot.id == lot_id)
            .ok_or_else(unknown)?;
        let lot = &mut queue[index];

        if amount <= Decimal::ZERO {
            return Err(InvariantViolation::NonPositiveConsumption {
                lot: lot_id,
                asset: asset.to_string(),
                amount,
            });
        }
        if amount > lot.quantity {
            return Err(InvariantViolation::OverConsumption {
                lot: lot_id,
                asset: asset.to_string(),
                requested: amount,
                remaining: lot.quantity,
            });
        }

        lot.quantity -= amount;
        let remaining = lot.quantity;
        log::debug!(
            "Lot {} {} CONSUME: qty={}. Remaining: qty={}",
            lot_id,
            asset,
            amount,
            remaining
        );

        if remaining.is_zero() {
            queue.remove(index);
            log::debug!("Lot {} {} exhausted", lot_id, asset);
        }
        Ok(remaining)
    }

    /// Total open quantity of `asset` visible at `as_of`
    pub fn available(&self, asset: &str, as_of: NaiveDateTime) -> Decimal {
        self.lots
            .get(asset)
            .map(|queue| {
                queue
                    .iter()
                    .filter(|lot| lot.timestamp <= as_of)
                    .map(|lot| lot.quantity)
                    .sum()
            })
            .unwrap_or(Decimal::ZERO)
    }

    /// All open lots, assets in alphabetical order, each in FIFO order
    pub fn open_lots(&self) -> Vec<AcquisitionLot> {
        let mut assets: Vec<&String> = self.lots.keys().collect();
        assets.sort();
        assets
            .into_iter()
            .flat_map(|asset| self.lots[asset].iter())
            .filter(|lot| !lot.is_exhausted())
            .cloned()
            .collect()
    }

    pub fn into_open_lots(self) -> Vec<AcquisitionLot> {
        self.open_lots()
    }
}
