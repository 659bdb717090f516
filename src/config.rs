use crate::error::Result;
use crate::schema::{CurrencyFamily, ExchangeRates, Targets};
use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Canonical header names of the sales sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ColumnHeaders {
    pub row_number: String,
    pub firm: String,
    pub date: String,
    pub invoice_number: String,
    pub region: String,
    pub city: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub currency: String,
    pub net_tl: String,
    pub vat_tl: String,
    #[schemars(
        description = "EUR equivalent already computed by the sheet; wins over rate conversion"
    )]
    pub net_eur_equivalent: String,
    pub net_original_eur: String,
    pub net_original_usd: String,
    pub net_original_gbp: String,
    pub manager: String,
}

impl Default for ColumnHeaders {
    fn default() -> Self {
        Self {
            row_number: "NO".to_string(),
            firm: "FİRMA ÜNVANI".to_string(),
            date: "FAT. TARİHİ".to_string(),
            invoice_number: "FATURA NO".to_string(),
            region: "BÖLGE".to_string(),
            city: "İL".to_string(),
            record_type: "CİNSİ".to_string(),
            currency: "DÖVİZ CİNSİ".to_string(),
            net_tl: "KDV HARİÇ TL".to_string(),
            vat_tl: "K.D.V.".to_string(),
            net_eur_equivalent: "KDV HARİÇ EURO KARŞILIĞI".to_string(),
            net_original_eur: "KDV HARİÇ (EURO)".to_string(),
            net_original_usd: "KDV HARİÇ (USD)".to_string(),
            net_original_gbp: "KDV HARİÇ (GBP)".to_string(),
            manager: "SATIŞ TEMSİLCİSİ".to_string(),
        }
    }
}

impl ColumnHeaders {
    /// Header used when no alias matches for a currency's net-amount column.
    pub fn net_original(&self, family: CurrencyFamily) -> &str {
        match family {
            CurrencyFamily::Eur => &self.net_original_eur,
            CurrencyFamily::Usd => &self.net_original_usd,
            CurrencyFamily::Gbp => &self.net_original_gbp,
            CurrencyFamily::Tl => &self.net_tl,
        }
    }
}

fn tokens(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Ranked alias tokens for each net-amount column. Earlier tokens win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ColumnAliases {
    #[serde(rename = "TL")]
    pub tl: Vec<String>,
    #[serde(rename = "USD")]
    pub usd: Vec<String>,
    #[serde(rename = "GBP")]
    pub gbp: Vec<String>,
    #[serde(rename = "EUR")]
    pub eur: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            tl: tokens(&[
                "KDV HARİÇ TL",
                "KDV HARİÇ TUTAR",
                "TUTAR",
                "NET TUTAR",
                "TL TUTAR",
                "TL",
            ]),
            usd: tokens(&["KDV HARİÇ (USD)", "USD TUTAR", "USD", "DOLAR"]),
            gbp: tokens(&["KDV HARİÇ (GBP)", "GBP TUTAR", "GBP", "STERLİN"]),
            eur: tokens(&["KDV HARİÇ (EURO)", "EURO TUTAR", "EURO", "EUR", "AVRO"]),
        }
    }
}

impl ColumnAliases {
    pub fn for_family(&self, family: CurrencyFamily) -> &[String] {
        match family {
            CurrencyFamily::Eur => &self.eur,
            CurrencyFamily::Usd => &self.usd,
            CurrencyFamily::Gbp => &self.gbp,
            CurrencyFamily::Tl => &self.tl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DashboardConfig {
    pub columns: ColumnHeaders,
    pub aliases: ColumnAliases,
    pub default_rates: ExchangeRates,
    #[schemars(description = "Rows per table page; must be at least 1")]
    pub rows_per_page: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            columns: ColumnHeaders::default(),
            aliases: ColumnAliases::default(),
            default_rates: ExchangeRates::default(),
            rows_per_page: 25,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DashboardConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

/// Reads a flat `{"key": number}` object, skipping entries that are not finite numbers.
/// `None` when the text is not a JSON object at all.
fn read_number_map(json: &str) -> Option<BTreeMap<String, f64>> {
    let value: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => {
            warn!("Ignoring malformed persisted JSON: {}", e);
            return None;
        }
    };

    let Value::Object(map) = value else {
        warn!("Ignoring persisted JSON that is not an object");
        return None;
    };

    let mut out = BTreeMap::new();
    for (key, raw) in map {
        match raw.as_f64().filter(|v| v.is_finite()) {
            Some(v) => {
                out.insert(key, v);
            }
            None => warn!("Skipping persisted entry '{}' with non-numeric value {}", key, raw),
        }
    }
    Some(out)
}

impl ExchangeRates {
    /// Loads persisted rates. Missing, malformed or non-positive entries keep their defaults.
    pub fn from_persisted_json(json: &str) -> Self {
        let mut rates = Self::default();
        let Some(map) = read_number_map(json) else {
            return rates;
        };

        let slots = [
            ("USD", &mut rates.usd),
            ("GBP", &mut rates.gbp),
            ("TRY", &mut rates.try_rate),
        ];
        for (code, slot) in slots {
            match map.get(code) {
                Some(&v) if v > 0.0 => *slot = v,
                Some(&v) => warn!("Ignoring persisted non-positive rate {} for {}", v, code),
                None => {}
            }
        }
        rates
    }

    pub fn to_persisted_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Targets {
    /// Loads persisted targets. Malformed JSON yields no targets; negative or
    /// non-numeric entries are dropped.
    pub fn from_persisted_json(json: &str) -> Self {
        let Some(map) = read_number_map(json) else {
            return Self::default();
        };

        Targets(
            map.into_iter()
                .filter(|(manager, v)| {
                    if *v < 0.0 {
                        warn!("Dropping negative persisted target {} for '{}'", v, manager);
                        false
                    } else {
                        true
                    }
                })
                .collect(),
        )
    }

    pub fn to_persisted_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
