//! Output rows shared by the table, CSV and export views. All money values
//! are rounded here, at the output boundary.

use crate::core::{AcquisitionLot, AnnualSummary, DisposalSummary, MatchRecord};
use crate::utils::{format_amount, format_quantity};
use chrono::NaiveDateTime;
use serde::Serialize;
use tabled::Tabled;

fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One row per calendar year
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct AnnualRow {
    #[tabled(rename = "Year")]
    pub year: String,

    #[tabled(rename = "Disposals")]
    pub disposals: usize,

    #[tabled(rename = "Gain/Loss")]
    pub disposal_gain: String,

    #[tabled(rename = "Rewards")]
    pub reward_income: String,

    #[tabled(rename = "Mining")]
    pub mined_income: String,

    #[tabled(rename = "Fees")]
    pub fees: String,

    #[tabled(rename = "Total")]
    pub total: String,

    #[tabled(rename = "Shortfalls")]
    pub shortfalls: usize,
}

impl AnnualRow {
    pub fn totals(summary: &AnnualSummary) -> Self {
        AnnualRow {
            year: "Total".to_string(),
            ..summary.into()
        }
    }
}

impl From<&AnnualSummary> for AnnualRow {
    fn from(s: &AnnualSummary) -> Self {
        AnnualRow {
            year: s.year.to_string(),
            disposals: s.disposals,
            disposal_gain: format_amount(s.disposal_gain),
            reward_income: format_amount(s.reward_income),
            mined_income: format_amount(s.mined_income),
            fees: format_amount(s.fees),
            total: format_amount(s.total()),
            shortfalls: s.shortfalls,
        }
    }
}

/// One row per disposal
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct GainRow {
    #[tabled(rename = "Date")]
    pub date: String,

    #[tabled(rename = "Asset")]
    pub asset: String,

    #[tabled(rename = "Quantity")]
    pub quantity: String,

    #[tabled(rename = "Proceeds")]
    pub proceeds: String,

    #[tabled(rename = "Cost")]
    pub cost: String,

    #[tabled(rename = "Gain/Loss")]
    pub gain: String,

    #[tabled(rename = "Lots")]
    pub lots: usize,

    #[tabled(rename = "Shortfall")]
    pub shortfall: String,

    /// Proceeds of the shortfall quantity, left out of the gain
    #[tabled(rename = "Unattributed")]
    pub unattributed_proceeds: String,

    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&DisposalSummary> for GainRow {
    fn from(d: &DisposalSummary) -> Self {
        GainRow {
            date: format_datetime(d.datetime),
            asset: d.asset.clone(),
            quantity: format_quantity(d.quantity),
            proceeds: format_amount(d.attributed_proceeds),
            cost: format_amount(d.cost),
            gain: format_amount(d.gain),
            lots: d.match_count,
            shortfall: format_quantity(d.shortfall),
            unattributed_proceeds: format_amount(d.unattributed_proceeds()),
            description: d.description.clone().unwrap_or_default(),
        }
    }
}

/// One row per lot drawn by a disposal
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct TraceRow {
    #[tabled(rename = "Sold")]
    pub disposal_date: String,

    #[tabled(rename = "Asset")]
    pub asset: String,

    #[tabled(rename = "Disposed")]
    pub disposal_quantity: String,

    #[tabled(rename = "Sale Price")]
    pub sale_unit_price: String,

    #[tabled(rename = "Acquired")]
    pub lot_date: String,

    #[tabled(rename = "Origin")]
    pub lot_origin: String,

    #[tabled(rename = "Used")]
    pub quantity: String,

    #[tabled(rename = "Unit Cost")]
    pub unit_cost: String,

    #[tabled(rename = "Cost")]
    pub cost: String,

    #[tabled(rename = "Proceeds")]
    pub proceeds: String,

    #[tabled(rename = "Gain/Loss")]
    pub gain: String,
}

impl From<&MatchRecord> for TraceRow {
    fn from(m: &MatchRecord) -> Self {
        TraceRow {
            disposal_date: format_datetime(m.disposal_datetime),
            asset: m.asset.clone(),
            disposal_quantity: format_quantity(m.disposal_quantity),
            sale_unit_price: format_amount(m.disposal_unit_price),
            lot_date: format_datetime(m.lot_datetime),
            lot_origin: m.lot_origin.to_string(),
            quantity: format_quantity(m.quantity),
            unit_cost: format_amount(m.lot_unit_cost),
            cost: format_amount(m.cost),
            proceeds: format_amount(m.proceeds),
            gain: format_amount(m.gain),
        }
    }
}

/// One row per lot still open after matching
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct LotRow {
    #[tabled(rename = "Asset")]
    pub asset: String,

    #[tabled(rename = "Acquired")]
    pub date: String,

    #[tabled(rename = "Origin")]
    pub origin: String,

    #[tabled(rename = "Remaining")]
    pub quantity: String,

    #[tabled(rename = "Original")]
    pub original_quantity: String,

    #[tabled(rename = "Unit Cost")]
    pub unit_cost: String,

    #[tabled(rename = "Cost Basis")]
    pub cost_basis: String,
}

impl From<&AcquisitionLot> for LotRow {
    fn from(lot: &AcquisitionLot) -> Self {
        LotRow {
            asset: lot.asset.clone(),
            date: format_datetime(lot.timestamp),
            origin: lot.origin.to_string(),
            quantity: format_quantity(lot.quantity),
            original_quantity: format_quantity(lot.original_quantity),
            unit_cost: format_amount(lot.unit_cost),
            cost_basis: format_amount(lot.remaining_cost()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::OriginKind;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn trace_row_rounds_once() {
        let record = MatchRecord {
            disposal_index: 0,
            disposal_datetime: dt(2024, 3, 1),
            asset: "X".to_string(),
            disposal_quantity: dec!(15),
            disposal_unit_price: dec!(2000) / dec!(15),
            lot_id: 0,
            lot_datetime: dt(2024, 1, 1),
            lot_origin: OriginKind::Purchase,
            lot_unit_cost: dec!(100),
            quantity: dec!(10),
            cost: dec!(1000),
            proceeds: dec!(2000) * dec!(10) / dec!(15),
            gain: dec!(2000) * dec!(10) / dec!(15) - dec!(1000),
        };
        let row = TraceRow::from(&record);
        assert_eq!(row.disposal_date, "2024-03-01 00:00:00");
        assert_eq!(row.sale_unit_price, "133.33");
        assert_eq!(row.proceeds, "1333.33");
        assert_eq!(row.gain, "333.33");
        assert_eq!(row.cost, "1000.00");
        assert_eq!(row.lot_origin, "Purchase");
    }

    #[test]
    fn gain_row_proceeds_match_cost_and_gain() {
        // 1.5 sold for 60000 with only 1 in inventory at 30000
        let summary = DisposalSummary {
            event: 1,
            datetime: dt(2024, 6, 1),
            asset: "BTC".to_string(),
            quantity: dec!(1.5),
            matched_quantity: dec!(1),
            shortfall: dec!(0.5),
            proceeds: dec!(60000),
            attributed_proceeds: dec!(40000),
            cost: dec!(30000),
            gain: dec!(10000),
            match_count: 1,
            description: None,
        };
        let row = GainRow::from(&summary);
        assert_eq!(row.proceeds, "40000.00");
        assert_eq!(row.cost, "30000.00");
        assert_eq!(row.gain, "10000.00");
        assert_eq!(row.shortfall, "0.5");
        assert_eq!(row.unattributed_proceeds, "20000.00");
    }

    #[test]
    fn annual_totals_row() {
        let summary = AnnualSummary {
            year: 0,
            disposal_gain: dec!(400),
            reward_income: dec!(10.005),
            mined_income: dec!(0),
            fees: dec!(1),
            disposals: 2,
            shortfalls: 0,
        };
        let row = AnnualRow::totals(&summary);
        assert_eq!(row.year, "Total");
        assert_eq!(row.disposal_gain, "400.00");
        assert_eq!(row.reward_income, "10.00");
        assert_eq!(row.total, "410.00");
    }
}
