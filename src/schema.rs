use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One loosely-typed sheet row: header text to cell value, in sheet column order.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
pub enum CurrencyFamily {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "GBP")]
    Gbp,
    /// Local currency. Also the family of every label nothing else claims.
    #[serde(rename = "TL")]
    Tl,
}

impl CurrencyFamily {
    pub const ALL: [CurrencyFamily; 4] = [
        CurrencyFamily::Eur,
        CurrencyFamily::Usd,
        CurrencyFamily::Gbp,
        CurrencyFamily::Tl,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            CurrencyFamily::Eur => "EUR",
            CurrencyFamily::Usd => "USD",
            CurrencyFamily::Gbp => "GBP",
            CurrencyFamily::Tl => "TL",
        }
    }
}

/// Net amount of an invoice as found in each original-currency column.
/// Only the entry matching the record's own currency is authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NetOriginal {
    #[serde(rename = "EUR")]
    pub eur: f64,
    #[serde(rename = "USD")]
    pub usd: f64,
    #[serde(rename = "GBP")]
    pub gbp: f64,
    #[serde(rename = "TL")]
    pub tl: f64,
}

impl NetOriginal {
    pub fn get(&self, family: CurrencyFamily) -> f64 {
        match family {
            CurrencyFamily::Eur => self.eur,
            CurrencyFamily::Usd => self.usd,
            CurrencyFamily::Gbp => self.gbp,
            CurrencyFamily::Tl => self.tl,
        }
    }
}

/// A canonical invoice line.
///
/// Identity fields never change after ingestion. `net_eur` is derived and only the
/// valuation engine writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Position in the ingested batch; stable external reference.
    pub id: usize,
    pub firm: String,
    pub manager: String,
    pub region: String,
    pub city: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub currency: String,
    pub date: NaiveDate,
    pub invoice_number: serde_json::Value,
    pub(crate) net_eur: f64,
    /// EUR equivalent supplied by the sheet itself. Wins over any rate conversion.
    pub source_net_eur: Option<f64>,
    pub net_original: NetOriginal,
    /// Informational only, never aggregated.
    pub vat_amount: f64,
}

impl Record {
    pub fn net_eur(&self) -> f64 {
        self.net_eur
    }
}

/// Manager name to EUR target. A missing entry means "no target", which is not the
/// same thing as a target of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Targets(pub BTreeMap<String, f64>);

impl Targets {
    pub fn get(&self, manager: &str) -> Option<f64> {
        self.0.get(manager).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Divisors converting an amount in a currency into EUR (`amount / rate`).
/// EUR is the base unit and has no rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExchangeRates {
    #[serde(rename = "USD")]
    #[schemars(description = "Units of USD per 1 EUR")]
    pub usd: f64,

    #[serde(rename = "GBP")]
    #[schemars(description = "Units of GBP per 1 EUR")]
    pub gbp: f64,

    #[serde(rename = "TRY")]
    #[schemars(description = "Units of TL per 1 EUR")]
    pub try_rate: f64,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self {
            usd: 1.08,
            gbp: 0.85,
            try_rate: 35.0,
        }
    }
}

impl ExchangeRates {
    /// `None` for EUR, which needs no conversion.
    pub fn divisor(&self, family: CurrencyFamily) -> Option<f64> {
        match family {
            CurrencyFamily::Eur => None,
            CurrencyFamily::Usd => Some(self.usd),
            CurrencyFamily::Gbp => Some(self.gbp),
            CurrencyFamily::Tl => Some(self.try_rate),
        }
    }
}

/// Conjunctive predicates over the canonical set. `None` (or an empty string) matches all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Filters {
    /// Month label as produced for the month option list, e.g. "March 2024".
    pub month: Option<String>,
    pub manager: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub currency: Option<String>,
    /// Case-insensitive substring of the firm name.
    pub search: Option<String>,
}

impl Filters {
    /// The month label, if a month filter is set.
    pub fn active_month(&self) -> Option<&str> {
        self.month.as_deref().filter(|m| !m.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        [
            &self.month,
            &self.manager,
            &self.region,
            &self.city,
            &self.record_type,
            &self.currency,
            &self.search,
        ]
        .iter()
        .all(|p| p.as_deref().map_or(true, str::is_empty))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    Date,
    InvoiceNumber,
    Customer,
    Manager,
    Region,
    City,
    Type,
    Currency,
    /// EUR-equivalent net amount.
    Net,
    /// Net amount in the record's own currency.
    NetOriginal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SortKey {
    pub field: SortField,
    pub ascending: bool,
}

/// Whether totals are shown as EUR equivalents or split per original currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMode {
    #[default]
    Normalized,
    Original,
}

/// Presentation state over the active view. Never stored in the canonical set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ViewSettings {
    /// `None` keeps ingestion order.
    pub sort: Option<SortKey>,
    pub rows_per_page: usize,
    /// 1-indexed.
    pub current_page: usize,
    pub mode: ValuationMode,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            sort: None,
            rows_per_page: 25,
            current_page: 1,
            mode: ValuationMode::Normalized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Manager,
    Region,
    City,
    Type,
    Currency,
    Customer,
}

impl Dimension {
    pub fn value_of<'r>(&self, record: &'r Record) -> &'r str {
        match self {
            Dimension::Manager => &record.manager,
            Dimension::Region => &record.region,
            Dimension::City => &record.city,
            Dimension::Type => &record.record_type,
            Dimension::Currency => &record.currency,
            Dimension::Customer => &record.firm,
        }
    }
}
