use super::events::{EventKind, TaxableEvent};
use super::matching::MatchReport;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Realized gains and income for one calendar year
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnualSummary {
    pub year: i32,
    pub disposal_gain: Decimal,
    pub reward_income: Decimal,
    pub mined_income: Decimal,
    /// Reported only, never deducted from gains
    pub fees: Decimal,
    pub disposals: usize,
    pub shortfalls: usize,
}

impl AnnualSummary {
    fn new(year: i32) -> Self {
        AnnualSummary {
            year,
            ..Default::default()
        }
    }

    pub fn income(&self) -> Decimal {
        self.reward_income + self.mined_income
    }

    /// Gains plus income
    pub fn total(&self) -> Decimal {
        self.disposal_gain + self.income()
    }

    fn add(&mut self, other: &AnnualSummary) {
        self.disposal_gain += other.disposal_gain;
        self.reward_income += other.reward_income;
        self.mined_income += other.mined_income;
        self.fees += other.fees;
        self.disposals += other.disposals;
        self.shortfalls += other.shortfalls;
    }
}

/// Annual summaries keyed by year
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnualReport {
    pub years: BTreeMap<i32, AnnualSummary>,
}

impl AnnualReport {
    /// Summaries in year order, optionally just one year
    pub fn rows(&self, year: Option<i32>) -> impl Iterator<Item = &AnnualSummary> {
        self.years
            .values()
            .filter(move |s| year.is_none_or(|y| s.year == y))
    }

    /// Sum of the selected rows; `year` of the result is the filter year or 0
    pub fn totals(&self, year: Option<i32>) -> AnnualSummary {
        let mut total = AnnualSummary::new(year.unwrap_or_default());
        for row in self.rows(year) {
            total.add(row);
        }
        total
    }
}

/// Group realized gains and income by calendar year.
///
/// A year shows up if anything happened in it; categories with nothing in
/// that year are zero.
pub fn annual_summary(events: &[TaxableEvent], report: &MatchReport) -> AnnualReport {
    let mut years: BTreeMap<i32, AnnualSummary> = BTreeMap::new();

    for event in events {
        let summary = years
            .entry(event.year())
            .or_insert_with(|| AnnualSummary::new(event.year()));
        match event.kind {
            EventKind::Reward => summary.reward_income += event.income_value(),
            EventKind::Mined => summary.mined_income += event.income_value(),
            EventKind::Purchase | EventKind::Disposal => {}
        }
        if let Some(fee) = event.fee {
            summary.fees += fee;
        }
    }

    for disposal in &report.summaries {
        let summary = years
            .entry(disposal.year())
            .or_insert_with(|| AnnualSummary::new(disposal.year()));
        summary.disposal_gain += disposal.gain;
        summary.disposals += 1;
        if !disposal.is_fully_matched() {
            summary.shortfalls += 1;
        }
    }

    for summary in years.values() {
        log::debug!(
            "Year {}: gain={}, rewards={}, mined={}, fees={}",
            summary.year,
            summary.disposal_gain,
            summary.reward_income,
            summary.mined_income,
            summary.fees
        );
    }

    AnnualReport { years }
}
