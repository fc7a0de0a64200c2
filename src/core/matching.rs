use super::error::InvariantViolation;
use super::events::{EventKind, OriginKind, TaxableEvent};
use super::inventory::{AcquisitionLot, LotInventory};
use super::warnings::Warning;
use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

/// One draw of a disposal against one acquisition lot.
///
/// Amounts are exact; round them only when producing output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Index of the disposal in [`MatchReport::summaries`]
    pub disposal_index: usize,
    pub disposal_datetime: NaiveDateTime,
    pub asset: String,
    pub disposal_quantity: Decimal,
    pub disposal_unit_price: Decimal,
    pub lot_id: usize,
    pub lot_datetime: NaiveDateTime,
    pub lot_origin: OriginKind,
    pub lot_unit_cost: Decimal,
    /// Quantity drawn from the lot
    pub quantity: Decimal,
    pub cost: Decimal,
    pub proceeds: Decimal,
    pub gain: Decimal,
}

/// Result of matching a single disposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisposalSummary {
    /// Id of the disposal event
    pub event: usize,
    pub datetime: NaiveDateTime,
    pub asset: String,
    pub quantity: Decimal,
    pub matched_quantity: Decimal,
    /// Quantity no eligible lot could cover
    pub shortfall: Decimal,
    /// Total proceeds of the disposal
    pub proceeds: Decimal,
    /// Proceeds attributed to matched quantity
    pub attributed_proceeds: Decimal,
    pub cost: Decimal,
    pub gain: Decimal,
    pub match_count: usize,
    pub description: Option<String>,
}

impl DisposalSummary {
    pub fn year(&self) -> i32 {
        self.datetime.year()
    }

    pub fn is_fully_matched(&self) -> bool {
        self.shortfall.is_zero()
    }

    /// Proceeds of the shortfall quantity, not reflected in `gain`
    pub fn unattributed_proceeds(&self) -> Decimal {
        self.proceeds - self.attributed_proceeds
    }

    pub fn warning(&self) -> Option<Warning> {
        if self.is_fully_matched() {
            None
        } else if self.matched_quantity.is_zero() {
            Some(Warning::NoInventory {
                required: self.quantity,
            })
        } else {
            Some(Warning::InsufficientInventory {
                matched: self.matched_quantity,
                required: self.quantity,
            })
        }
    }
}

/// Output of a matching run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    /// One per disposal, in disposal order
    pub summaries: Vec<DisposalSummary>,
    /// Every draw, in disposal order then draw order
    pub matches: Vec<MatchRecord>,
    /// Lots still open after the last disposal
    pub open_lots: Vec<AcquisitionLot>,
}

impl MatchReport {
    /// Draws of one disposal; `matches` is ordered by disposal index
    pub fn matches_for(&self, disposal_index: usize) -> impl Iterator<Item = &MatchRecord> {
        let start = self
            .matches
            .partition_point(|m| m.disposal_index < disposal_index);
        let end = self
            .matches
            .partition_point(|m| m.disposal_index <= disposal_index);
        self.matches[start..end].iter()
    }

    /// Disposals that could not be fully matched
    pub fn shortfalls(&self) -> impl Iterator<Item = &DisposalSummary> {
        self.summaries.iter().filter(|s| !s.is_fully_matched())
    }

    pub fn disposals(&self, year: Option<i32>) -> impl Iterator<Item = &DisposalSummary> {
        self.summaries
            .iter()
            .filter(move |s| year.is_none_or(|y| s.year() == y))
    }

    pub fn total_gain(&self, year: Option<i32>) -> Decimal {
        self.disposals(year).map(|s| s.gain).sum()
    }

    pub fn total_proceeds(&self, year: Option<i32>) -> Decimal {
        self.disposals(year).map(|s| s.attributed_proceeds).sum()
    }

    pub fn total_cost(&self, year: Option<i32>) -> Decimal {
        self.disposals(year).map(|s| s.cost).sum()
    }
}

/// Match every disposal in `events` against earlier acquisitions, FIFO.
///
/// `events` must be sorted by timestamp. All acquisitions enter the inventory
/// first; each disposal can only see lots acquired at or before it. Running
/// out of lots is recorded as a shortfall on the disposal, not an error.
pub fn match_disposals(events: &[TaxableEvent]) -> Result<MatchReport, InvariantViolation> {
    validate_feed(events)?;

    let mut inventory = LotInventory::new();
    for event in events {
        if let Some(origin) = event.kind.origin() {
            inventory.acquire(AcquisitionLot::new(
                event.asset.clone(),
                event.datetime,
                event.quantity,
                event.value,
                origin,
            ));
        }
    }

    let mut summaries = Vec::new();
    let mut matches = Vec::new();
    for disposal in events.iter().filter(|e| e.kind == EventKind::Disposal) {
        let summary = match_disposal(&mut inventory, disposal, summaries.len(), &mut matches)?;
        summaries.push(summary);
    }

    let report = MatchReport {
        summaries,
        matches,
        open_lots: inventory.into_open_lots(),
    };
    log::info!(
        "Matched {} disposals in {} draws, total gain {}, {} shortfalls",
        report.summaries.len(),
        report.matches.len(),
        report.total_gain(None).round_dp(2),
        report.shortfalls().count()
    );
    Ok(report)
}

fn match_disposal(
    inventory: &mut LotInventory,
    disposal: &TaxableEvent,
    disposal_index: usize,
    matches: &mut Vec<MatchRecord>,
) -> Result<DisposalSummary, InvariantViolation> {
    let total_quantity = disposal.quantity;
    let total_proceeds = disposal.value;
    let unit_price = total_proceeds / total_quantity;

    log::debug!(
        "Disposal of {} {} at {}, {} available",
        total_quantity,
        disposal.asset,
        disposal.datetime,
        inventory.available(&disposal.asset, disposal.datetime)
    );

    let mut remaining = total_quantity;
    let mut attributed = Decimal::ZERO;
    let mut cost_total = Decimal::ZERO;
    let mut gain_total = Decimal::ZERO;
    let mut match_count = 0;

    while remaining > Decimal::ZERO {
        let Some(lot) = inventory.earliest_eligible(&disposal.asset, disposal.datetime) else {
            break;
        };

        let used = remaining.min(lot.quantity);
        let cost = used * lot.unit_cost;
        // The draw that completes the disposal takes whatever proceeds are
        // left, so a full match attributes exactly the total.
        let proceeds = if used == remaining {
            total_proceeds - attributed
        } else {
            match total_proceeds.checked_mul(used) {
                Some(scaled) => scaled / total_quantity,
                None => used / total_quantity * total_proceeds,
            }
        };
        let gain = proceeds - cost;

        log::debug!(
            "Draw {} {} from lot {} ({}) at unit cost {}: cost={}, proceeds={}, gain={}",
            used,
            disposal.asset,
            lot.id,
            lot.timestamp,
            lot.unit_cost,
            cost,
            proceeds,
            gain
        );

        let record = MatchRecord {
            disposal_index,
            disposal_datetime: disposal.datetime,
            asset: disposal.asset.clone(),
            disposal_quantity: total_quantity,
            disposal_unit_price: unit_price,
            lot_id: lot.id,
            lot_datetime: lot.timestamp,
            lot_origin: lot.origin,
            lot_unit_cost: lot.unit_cost,
            quantity: used,
            cost,
            proceeds,
            gain,
        };
        inventory.consume(&disposal.asset, record.lot_id, used)?;
        matches.push(record);

        remaining -= used;
        attributed += proceeds;
        cost_total += cost;
        gain_total += gain;
        match_count += 1;
    }

    if remaining > Decimal::ZERO && !inventory.contains_asset(&disposal.asset) {
        log::warn!(
            "No {} lots for disposal of {} at {}: shortfall {}",
            disposal.asset,
            total_quantity,
            disposal.datetime,
            remaining
        );
    } else if remaining > Decimal::ZERO {
        log::warn!(
            "Insufficient inventory for disposal of {} {} at {}: matched {}, shortfall {}",
            total_quantity,
            disposal.asset,
            disposal.datetime,
            total_quantity - remaining,
            remaining
        );
    }

    Ok(DisposalSummary {
        event: disposal.id,
        datetime: disposal.datetime,
        asset: disposal.asset.clone(),
        quantity: total_quantity,
        matched_quantity: total_quantity - remaining,
        shortfall: remaining,
        proceeds: total_proceeds,
        attributed_proceeds: attributed,
        cost: cost_total,
        gain: gain_total,
        match_count,
        description: disposal.description.clone(),
    })
}

fn validate_feed(events: &[TaxableEvent]) -> Result<(), InvariantViolation> {
    let mut previous: Option<NaiveDateTime> = None;
    for event in events {
        if event.quantity <= Decimal::ZERO {
            return Err(InvariantViolation::NonPositiveQuantity {
                event: event.id,
                quantity: event.quantity,
            });
        }
        if event.value < Decimal::ZERO {
            return Err(InvariantViolation::NegativeValue {
                event: event.id,
                value: event.value,
            });
        }
        if let Some(previous) = previous {
            if event.datetime < previous {
                return Err(InvariantViolation::UnsortedFeed {
                    event: event.id,
                    previous,
                    current: event.datetime,
                });
            }
        }
        previous = Some(event.datetime);
    }
    Ok(())
}
