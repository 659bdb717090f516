//! Currency Valuation Engine.
//!
//! The only code allowed to write `Record::net_eur`. A figure supplied by the sheet
//! always wins; otherwise the record's own-currency amount is divided by the manual
//! rate for its currency family.

use crate::schema::{CurrencyFamily, ExchangeRates, Record};
use crate::utils::turkish_upper;
use log::debug;

/// Classifies a free-text currency label. `None` when no family claims it.
pub fn classify(label: &str) -> Option<CurrencyFamily> {
    let upper = turkish_upper(label.trim());

    if matches!(upper.as_str(), "TL" | "TRY" | "TRL") {
        Some(CurrencyFamily::Tl)
    } else if upper == "USD" || upper.contains("DOLAR") {
        Some(CurrencyFamily::Usd)
    } else if upper == "GBP" || upper.contains("STERLİN") || upper.contains("STERLIN") {
        Some(CurrencyFamily::Gbp)
    } else if upper.contains("EUR") || upper.contains("AVRO") {
        Some(CurrencyFamily::Eur)
    } else {
        None
    }
}

/// Like [`classify`], with unknown labels treated as local currency.
pub fn family_or_local(label: &str) -> CurrencyFamily {
    classify(label).unwrap_or(CurrencyFamily::Tl)
}

/// EUR-equivalent net amount of one record under `rates`.
pub fn compute_net_eur(record: &Record, rates: &ExchangeRates) -> f64 {
    if let Some(source) = record.source_net_eur {
        return source;
    }

    let family = family_or_local(&record.currency);
    let amount = record.net_original.get(family);
    match rates.divisor(family) {
        Some(rate) => amount / rate,
        None => amount,
    }
}

impl Record {
    /// Authoritative amount in the record's own currency, for display.
    /// EUR records without an EUR column figure fall back to the EUR equivalent.
    pub fn original_amount(&self) -> (CurrencyFamily, f64) {
        let family = family_or_local(&self.currency);
        let amount = match family {
            CurrencyFamily::Eur if self.net_original.eur == 0.0 => self.net_eur,
            _ => self.net_original.get(family),
        };
        (family, amount)
    }
}

/// Recomputes `net_eur` for every record. Returns how many records were rate-derived.
pub fn revalue(records: &mut [Record], rates: &ExchangeRates) -> usize {
    let mut derived = 0;
    for record in records.iter_mut() {
        if record.source_net_eur.is_none() {
            derived += 1;
        }
        record.net_eur = compute_net_eur(record, rates);
    }
    debug!(
        "Revalued {} records ({} from manual rates)",
        records.len(),
        derived
    );
    derived
}
