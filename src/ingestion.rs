//! Record Normalizer: raw sheet rows to canonical [`Record`]s.

use crate::columns::ResolvedColumns;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::schema::{CurrencyFamily, ExchangeRates, NetOriginal, RawRow, Record};
use crate::valuation::compute_net_eur;
use crate::utils::{month_label, quarter_of};
use chrono::{Datelike, Duration, NaiveDate};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Day zero of spreadsheet serial dates.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub ingested: usize,
    /// Rows excluded by the drop rule (no resolvable date or invalid EUR amount).
    pub dropped: usize,
    pub columns: ResolvedColumns,
}

/// Distinct values offered by each filter's option list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub managers: Vec<String>,
    pub regions: Vec<String>,
    pub cities: Vec<String>,
    pub types: Vec<String>,
    pub currencies: Vec<String>,
    /// Chronological month labels, e.g. "January 2024".
    pub months: Vec<String>,
}

/// Accepts the JSON produced by a sheet-to-JSON export: an array of objects.
pub fn parse_rows_json(json: &str) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| DashboardError::ParseError(format!("rows are not valid JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(DashboardError::ParseError(
            "expected a JSON array of row objects".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(DashboardError::ParseError(format!(
                "row #{} is not an object: {}",
                idx, other
            ))),
        })
        .collect()
}

/// Parses a number written with "." as thousands separator and "," as decimal separator.
/// Numeric cells pass through; unparseable text is 0.
pub fn parse_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let clean = s.replace('.', "").replacen(',', ".", 1);
            parse_leading_float(&clean).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Longest numeric prefix of `text` after leading whitespace ("12,5 TL" style cells).
fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}

/// Resolves an invoice date from a spreadsheet serial number or a `DD.MM.YYYY` string.
/// Any other shape is unresolvable.
pub fn parse_date(value: Option<&Value>) -> Option<NaiveDate> {
    match value? {
        Value::Number(n) => {
            let serial = n.as_f64().filter(|s| s.is_finite())?;
            let (y, m, d) = SERIAL_EPOCH;
            NaiveDate::from_ymd_opt(y, m, d)?
                .checked_add_signed(Duration::try_days(serial.floor() as i64)?)
        }
        Value::String(s) => {
            let parts: Vec<&str> = s.trim().split('.').collect();
            let [day, month, year] = parts.as_slice() else {
                return None;
            };
            NaiveDate::from_ymd_opt(
                year.trim().parse().ok()?,
                month.trim().parse().ok()?,
                day.trim().parse().ok()?,
            )
        }
        _ => None,
    }
}

/// Trimmed text of a cell. Blank cells are `None` so callers can apply defaults.
fn text_field(row: &RawRow, header: &str) -> Option<String> {
    let text = match row.get(header)? {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn text_or(row: &RawRow, header: &str, default: &str) -> String {
    text_field(row, header).unwrap_or_else(|| default.to_string())
}

/// Turns raw rows into canonical records, applying column resolution, defaults and the
/// drop rule. Each record is valued under `rates`; a row whose EUR amount is not a finite
/// number, whether taken from the sheet or derived from a rate, is dropped.
pub fn normalize_rows(
    rows: &[RawRow],
    config: &DashboardConfig,
    rates: &ExchangeRates,
) -> Result<(Vec<Record>, IngestReport)> {
    let Some(first) = rows.first() else {
        return Err(DashboardError::EmptyInput);
    };

    let cols = &config.columns;
    if !rows.iter().any(|row| row.contains_key(&cols.date)) {
        return Err(DashboardError::MissingColumn(cols.date.clone()));
    }

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let resolved = ResolvedColumns::resolve(headers.iter().copied(), &config.aliases, cols);

    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0;

    for (idx, row) in rows.iter().enumerate() {
        let Some(date) = parse_date(row.get(&cols.date)) else {
            trace!("Dropping row #{}: unresolvable date {:?}", idx, row.get(&cols.date));
            dropped += 1;
            continue;
        };

        let source_eur = parse_number(row.get(&cols.net_eur_equivalent));
        let amount = |family: CurrencyFamily| parse_number(row.get(resolved.header(family)));
        let net_original = NetOriginal {
            eur: amount(CurrencyFamily::Eur),
            usd: amount(CurrencyFamily::Usd),
            gbp: amount(CurrencyFamily::Gbp),
            tl: amount(CurrencyFamily::Tl),
        };

        let mut record = Record {
            id: idx,
            firm: text_or(row, &cols.firm, ""),
            manager: text_or(row, &cols.manager, "Unassigned"),
            region: text_or(row, &cols.region, "Unknown"),
            city: text_or(row, &cols.city, ""),
            record_type: text_or(row, &cols.record_type, "Material"),
            currency: text_or(row, &cols.currency, "TL"),
            date,
            invoice_number: row.get(&cols.invoice_number).cloned().unwrap_or(Value::Null),
            net_eur: source_eur,
            source_net_eur: (source_eur != 0.0).then_some(source_eur),
            net_original,
            vat_amount: parse_number(row.get(&cols.vat_tl)),
        };
        record.net_eur = compute_net_eur(&record, rates);
        if !record.net_eur.is_finite() {
            trace!(
                "Dropping row #{}: {} amount does not convert to a finite EUR value",
                idx,
                record.currency
            );
            dropped += 1;
            continue;
        }
        records.push(record);
    }

    info!(
        "Normalized {} of {} rows ({} dropped)",
        records.len(),
        rows.len(),
        dropped
    );

    let report = IngestReport {
        ingested: records.len(),
        dropped,
        columns: resolved,
    };
    Ok((records, report))
}

impl FilterOptions {
    pub fn from_records(records: &[Record]) -> Self {
        fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
            values
                .filter(|v| !v.is_empty())
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }

        let months: BTreeSet<(i32, u32)> =
            records.iter().map(|r| (r.date.year(), r.date.month())).collect();

        Self {
            managers: distinct(records.iter().map(|r| &r.manager)),
            regions: distinct(records.iter().map(|r| &r.region)),
            cities: distinct(records.iter().map(|r| &r.city)),
            types: distinct(records.iter().map(|r| &r.record_type)),
            currencies: distinct(records.iter().map(|r| &r.currency)),
            months: months
                .into_iter()
                .filter_map(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
                .map(month_label)
                .collect(),
        }
    }
}

/// The most common "Q<n> <year>" among the records. Ties go to the quarter seen later.
pub fn dominant_quarter(records: &[Record]) -> Option<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = format!("Q{} {}", quarter_of(record.date), record.date.year());
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let best = order
        .into_iter()
        .reduce(|best, next| if counts[&best] > counts[&next] { best } else { next });
    debug!("Dominant quarter: {:?}", best);
    best
}
