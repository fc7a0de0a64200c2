//! Turns raw input rows into typed, sorted events.

use super::error::NormalizeError;
use super::events::{EventKind, TaxableEvent};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use fifotax_derive::CsvSchema;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Column description generated by `#[derive(CsvSchema)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub name: &'static str,
    pub required: bool,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
}

/// JSON input root
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaxInput {
    pub events: Vec<EventRecord>,
}

/// One raw input row (CSV record or JSON object)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, CsvSchema)]
pub struct EventRecord {
    /// Event date (YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, RFC3339 or DD/MM/YYYY HH:MM)
    #[serde(alias = "fecha")]
    pub date: String,
    /// purchase, reward, mined or disposal
    #[serde(alias = "type", alias = "tipo")]
    pub kind: String,
    /// Asset identifier (e.g., BTC, ETH)
    #[serde(alias = "currency", alias = "moneda")]
    pub asset: String,
    /// Units acquired or disposed
    #[serde(alias = "cantidad")]
    #[schemars(with = "f64")]
    pub quantity: Decimal,
    /// Price per unit
    #[serde(default, alias = "precio de la cripto en eur", alias = "precio_unitario")]
    #[schemars(with = "Option<f64>")]
    pub unit_price: Option<Decimal>,
    /// Total paid, or total received after fees for disposals
    #[serde(default, alias = "total eur (tras pagar comisión)", alias = "total_eur")]
    #[schemars(with = "Option<f64>")]
    pub total_value: Option<Decimal>,
    /// Fair-market valuation, the income value of rewards and mined units
    #[serde(default, alias = "valoración fiscal (€)", alias = "valoracion_fiscal")]
    #[schemars(with = "Option<f64>")]
    pub fair_value: Option<Decimal>,
    /// Commission paid (reported only)
    #[serde(default, alias = "comisión", alias = "comision")]
    #[schemars(with = "Option<f64>")]
    pub fee: Option<Decimal>,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Read event rows from CSV, normalized and sorted.
///
/// Header names are matched case-insensitively.
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<TaxableEvent>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: csv::StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    rdr.set_headers(headers);
    let records: Result<Vec<EventRecord>, _> = rdr.deserialize::<EventRecord>().collect();
    Ok(normalize(records?)?)
}

/// Read event rows from JSON, normalized and sorted
pub fn read_json<R: Read>(reader: R) -> anyhow::Result<Vec<TaxableEvent>> {
    let input: TaxInput = serde_json::from_reader(reader)?;
    Ok(normalize(input.events)?)
}

/// Resolve values and timestamps for every row, then sort by timestamp.
///
/// The sort is stable: rows sharing a timestamp keep their input order, which
/// is the FIFO order between them.
pub fn normalize(records: Vec<EventRecord>) -> Result<Vec<TaxableEvent>, NormalizeError> {
    let mut events = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_event(index + 1))
        .collect::<Result<Vec<_>, _>>()?;

    events.sort_by_key(|e| e.datetime);
    for (id, event) in events.iter_mut().enumerate() {
        event.id = id;
    }
    log::debug!("Normalized {} events", events.len());
    Ok(events)
}

impl EventRecord {
    fn into_event(self, row: usize) -> Result<TaxableEvent, NormalizeError> {
        let datetime = parse_datetime(&self.date).ok_or_else(|| NormalizeError::InvalidDatetime {
            row,
            value: self.date.clone(),
        })?;
        let kind: EventKind = self
            .kind
            .parse()
            .map_err(|value| NormalizeError::UnknownEventKind { row, value })?;
        let asset = normalize_asset(&self.asset);
        if asset.is_empty() {
            return Err(NormalizeError::EmptyAsset { row });
        }

        let value = self.resolve_value(kind, row)?;

        Ok(TaxableEvent {
            id: 0,
            row,
            datetime,
            kind,
            asset,
            quantity: self.quantity,
            value,
            fair_value: self.fair_value,
            fee: self.fee,
            description: self.description.filter(|d| !d.trim().is_empty()),
        })
    }

    /// Cost basis for acquisitions, proceeds for disposals
    fn resolve_value(&self, kind: EventKind, row: usize) -> Result<Decimal, NormalizeError> {
        // unit_price * quantity, only computed when no earlier column applies
        let priced = || match self.unit_price {
            Some(price) => price
                .checked_mul(self.quantity)
                .map(Some)
                .ok_or(NormalizeError::ValueOverflow { row }),
            None => Ok(None),
        };
        let value = match kind {
            EventKind::Purchase => match self.total_value {
                Some(total) => Some(total),
                None => priced()?.or(self.fair_value),
            },
            EventKind::Reward | EventKind::Mined => match self.total_value.or(self.fair_value) {
                Some(value) => Some(value),
                None => priced()?,
            },
            EventKind::Disposal => match self.total_value {
                Some(total) => Some(total),
                None => priced()?,
            },
        };
        value.ok_or_else(|| NormalizeError::MissingValue {
            row,
            kind: kind.to_string(),
        })
    }
}

fn normalize_asset(s: &str) -> String {
    s.trim().to_uppercase()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a date or datetime; date-only values fall at midnight and offsets
/// are converted to UTC.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(date: &str, kind: &str, quantity: Decimal) -> EventRecord {
        EventRecord {
            date: date.to_string(),
            kind: kind.to_string(),
            asset: "btc".to_string(),
            quantity,
            unit_price: None,
            total_value: None,
            fair_value: None,
            fee: None,
            description: None,
        }
    }

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parse_supported_datetime_formats() {
        let noon = ymd_hms(2024, 3, 5, 12, 30, 0);
        assert_eq!(parse_datetime("2024-03-05T12:30:00"), Some(noon));
        assert_eq!(parse_datetime("2024-03-05 12:30:00"), Some(noon));
        assert_eq!(parse_datetime("2024-03-05 12:30"), Some(noon));
        assert_eq!(parse_datetime("05/03/2024 12:30"), Some(noon));
        assert_eq!(parse_datetime("05/03/2024 12:30:00"), Some(noon));
        assert_eq!(parse_datetime("2024-03-05T13:30:00+01:00"), Some(noon));
        assert_eq!(
            parse_datetime("2024-03-05T12:30:00.250"),
            Some(noon + chrono::Duration::milliseconds(250))
        );
    }

    #[test]
    fn date_only_is_midnight() {
        let midnight = ymd_hms(2024, 3, 5, 0, 0, 0);
        assert_eq!(parse_datetime("2024-03-05"), Some(midnight));
        assert_eq!(parse_datetime(" 05/03/2024 "), Some(midnight));
        assert_eq!(parse_datetime("05-03-2024"), Some(midnight));
    }

    #[test]
    fn invalid_datetime() {
        assert_eq!(parse_datetime("March 5th"), None);
        assert_eq!(parse_datetime("2024-13-01"), None);
    }

    #[test]
    fn purchase_value_resolution() {
        let mut r = record("2024-01-01", "purchase", dec!(2));
        r.unit_price = Some(dec!(110));
        r.fair_value = Some(dec!(300));
        r.total_value = Some(dec!(225));
        assert_eq!(r.resolve_value(EventKind::Purchase, 1), Ok(dec!(225)));

        r.total_value = None;
        assert_eq!(r.resolve_value(EventKind::Purchase, 1), Ok(dec!(220)));

        r.unit_price = None;
        assert_eq!(r.resolve_value(EventKind::Purchase, 1), Ok(dec!(300)));
    }

    #[test]
    fn reward_falls_back_to_fair_value() {
        let mut r = record("2024-01-01", "reward", dec!(2));
        r.fair_value = Some(dec!(12));
        r.unit_price = Some(dec!(5));
        assert_eq!(r.resolve_value(EventKind::Reward, 1), Ok(dec!(12)));

        r.total_value = Some(dec!(9));
        assert_eq!(r.resolve_value(EventKind::Mined, 1), Ok(dec!(9)));
    }

    #[test]
    fn disposal_ignores_fair_value() {
        let mut r = record("2024-01-01", "sale", dec!(2));
        r.fair_value = Some(dec!(12));
        assert!(matches!(
            r.resolve_value(EventKind::Disposal, 1),
            Err(NormalizeError::MissingValue { row: 1, .. })
        ));

        r.unit_price = Some(dec!(50));
        assert_eq!(r.resolve_value(EventKind::Disposal, 1), Ok(dec!(100)));
    }

    #[test]
    fn priced_value_out_of_range_is_an_error() {
        let mut r = record("2024-01-01", "sell", Decimal::MAX);
        r.unit_price = Some(dec!(2));
        assert_eq!(
            normalize(vec![r.clone()]),
            Err(NormalizeError::ValueOverflow { row: 1 })
        );

        // an explicit total wins, so the product is never needed
        r.total_value = Some(dec!(10));
        assert_eq!(normalize(vec![r]).unwrap()[0].value, dec!(10));
    }

    #[test]
    fn parse_spanish_sheet_columns() {
        let csv_data = "Fecha,Tipo,Moneda,Cantidad,Precio de la cripto en EUR,Total EUR (tras pagar comisión),Valoración fiscal (€),Comisión
01/02/2024 10:00,Compra,btc,0.5,40000,20010,,10
15/02/2024,Recompensa,ETH,0.1,,,250,
20/02/2024,Minería,ETH,0.2,2500,,,
21/02/2024,mineria,ETH,0.1,2600,,,
01/03/2024 18:30,Venta,BTC,0.25,,15000,,5";

        let events = read_csv(csv_data.as_bytes()).unwrap();
        assert_eq!(events.len(), 5);

        assert_eq!(events[0].kind, EventKind::Purchase);
        assert_eq!(events[0].datetime, ymd_hms(2024, 2, 1, 10, 0, 0));
        assert_eq!(events[0].asset, "BTC");
        assert_eq!(events[0].value, dec!(20010));
        assert_eq!(events[0].fee, Some(dec!(10)));

        assert_eq!(events[1].kind, EventKind::Reward);
        assert_eq!(events[1].value, dec!(250));
        assert_eq!(events[1].fair_value, Some(dec!(250)));

        assert_eq!(events[2].kind, EventKind::Mined);
        assert_eq!(events[2].value, dec!(500));
        assert_eq!(events[3].kind, EventKind::Mined);
        assert_eq!(events[3].value, dec!(260));

        assert_eq!(events[4].kind, EventKind::Disposal);
        assert_eq!(events[4].datetime, ymd_hms(2024, 3, 1, 18, 30, 0));
        assert_eq!(events[4].value, dec!(15000));
    }

    #[test]
    fn missing_value_is_an_error() {
        let r = record("2024-01-01", "sell", dec!(1));
        assert_eq!(
            normalize(vec![r]),
            Err(NormalizeError::MissingValue {
                row: 1,
                kind: "Disposal".to_string()
            })
        );
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let mut r = record("2024-01-01", "airdrop", dec!(1));
        r.total_value = Some(dec!(1));
        assert_eq!(
            normalize(vec![r]),
            Err(NormalizeError::UnknownEventKind {
                row: 1,
                value: "airdrop".to_string()
            })
        );
    }

    #[test]
    fn empty_asset_is_an_error() {
        let mut r = record("2024-01-01", "buy", dec!(1));
        r.total_value = Some(dec!(1));
        r.asset = "  ".to_string();
        assert_eq!(normalize(vec![r]), Err(NormalizeError::EmptyAsset { row: 1 }));
    }

    #[test]
    fn bad_date_reports_row() {
        let mut ok = record("2024-01-01", "buy", dec!(1));
        ok.total_value = Some(dec!(1));
        let mut bad = ok.clone();
        bad.date = "yesterday".to_string();
        assert_eq!(
            normalize(vec![ok, bad]),
            Err(NormalizeError::InvalidDatetime {
                row: 2,
                value: "yesterday".to_string()
            })
        );
    }

    #[test]
    fn sorted_stably_with_ids() {
        let mut a = record("2024-02-01", "buy", dec!(1));
        a.total_value = Some(dec!(1));
        let mut b = record("2024-01-01", "buy", dec!(2));
        b.total_value = Some(dec!(2));
        let mut c = record("2024-01-01", "buy", dec!(3));
        c.total_value = Some(dec!(3));

        let events = normalize(vec![a, b, c]).unwrap();
        let order: Vec<(usize, usize)> = events.iter().map(|e| (e.id, e.row)).collect();
        assert_eq!(order, vec![(0, 2), (1, 3), (2, 1)]);
        assert!(events.iter().all(|e| e.asset == "BTC"));
    }

    #[test]
    fn parse_csv() {
        let csv_data = "date,kind,asset,quantity,unit_price,total_value,fair_value,fee,description
15/01/2024 10:30,Purchase,btc,0.5,,15000.00,,25.00,Coinbase
2024-03-20,Disposal,BTC,0.25,,10000.00,,15.00,
2024-02-01,Reward,eth,0.01,,,25.00,,Kraken
2024-02-02,Mined,ETH,0.02,1500,,,,";

        let events = read_csv(csv_data.as_bytes()).unwrap();
        assert_eq!(events.len(), 4);

        assert_eq!(events[0].kind, EventKind::Purchase);
        assert_eq!(events[0].datetime, ymd_hms(2024, 1, 15, 10, 30, 0));
        assert_eq!(events[0].asset, "BTC");
        assert_eq!(events[0].value, dec!(15000));
        assert_eq!(events[0].fee, Some(dec!(25)));
        assert_eq!(events[0].description, Some("Coinbase".to_string()));

        assert_eq!(events[1].kind, EventKind::Reward);
        assert_eq!(events[1].asset, "ETH");
        assert_eq!(events[1].value, dec!(25));
        assert_eq!(events[1].income_value(), dec!(25));
        assert_eq!(events[1].fee, None);

        assert_eq!(events[2].kind, EventKind::Mined);
        assert_eq!(events[2].value, dec!(30));

        assert_eq!(events[3].kind, EventKind::Disposal);
        assert_eq!(events[3].value, dec!(10000));
        assert_eq!(events[3].description, None);
    }

    #[test]
    fn parse_json() {
        let json_data = r#"{
            "events": [
                {
                    "date": "2024-06-15",
                    "kind": "sale",
                    "asset": "BTC",
                    "quantity": 1.0,
                    "total_value": 60000.00
                },
                {
                    "date": "2024-01-15T09:00:00",
                    "type": "purchase",
                    "asset": "BTC",
                    "quantity": "1.0",
                    "unit_price": "50000"
                }
            ]
        }"#;

        let events = read_json(json_data.as_bytes()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Purchase);
        assert_eq!(events[0].value, dec!(50000));
        assert_eq!(events[1].kind, EventKind::Disposal);
        assert_eq!(events[1].value, dec!(60000));
    }

    #[test]
    fn csv_columns_from_derive() {
        let columns = EventRecord::csv_columns();
        let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "date",
                "kind",
                "asset",
                "quantity",
                "unit_price",
                "total_value",
                "fair_value",
                "fee",
                "description"
            ]
        );
        assert!(columns[0].required);
        assert_eq!(columns[1].aliases, &["type", "tipo"]);
        assert!(!columns[4].required);
        assert_eq!(columns[2].description, "Asset identifier (e.g., BTC, ETH)");
    }
}
