//! Header resolution for sheets whose amount columns are not named consistently.
//!
//! Resolution runs in two passes over a ranked alias list: an exact header match for
//! any alias, then a case-insensitive "header contains alias" match. The first alias
//! that matches wins. When nothing matches, the canonical default header is used,
//! which may itself be missing from the sheet (yielding zero amounts).

use crate::config::{ColumnAliases, ColumnHeaders};
use crate::schema::CurrencyFamily;
use crate::utils::turkish_upper;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum ColumnMatch {
    Exact { header: String },
    Fuzzy { header: String, alias: String },
    /// No alias matched; the canonical header is used as-is.
    Default { header: String },
}

impl ColumnMatch {
    pub fn header(&self) -> &str {
        match self {
            ColumnMatch::Exact { header }
            | ColumnMatch::Fuzzy { header, .. }
            | ColumnMatch::Default { header } => header,
        }
    }
}

/// Upper-cases both sides the same way and folds dotted/dotless I, so "Kdv Hariç Tl"
/// still finds "KDV HARİÇ TL" and "Price" still finds "PRICE".
fn normalize(text: &str) -> String {
    turkish_upper(text).replace('İ', "I")
}

/// Finds the header for one concept among `headers` (in sheet order).
/// `None` is the terminal "no match" case.
pub fn find_best_column<'h, I>(headers: I, aliases: &[String]) -> Option<ColumnMatch>
where
    I: IntoIterator<Item = &'h str> + Clone,
{
    for alias in aliases {
        if headers.clone().into_iter().any(|h| h == alias.as_str()) {
            return Some(ColumnMatch::Exact {
                header: alias.clone(),
            });
        }
    }

    for alias in aliases {
        let needle = normalize(alias);
        if needle.is_empty() {
            continue;
        }
        if let Some(header) = headers
            .clone()
            .into_iter()
            .find(|h| normalize(h).contains(&needle))
        {
            return Some(ColumnMatch::Fuzzy {
                header: header.to_string(),
                alias: alias.clone(),
            });
        }
    }

    None
}

/// The header each net-amount concept was resolved to for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumns {
    pub tl: ColumnMatch,
    pub usd: ColumnMatch,
    pub gbp: ColumnMatch,
    pub eur: ColumnMatch,
}

impl ResolvedColumns {
    pub fn resolve<'h, I>(headers: I, aliases: &ColumnAliases, defaults: &ColumnHeaders) -> Self
    where
        I: IntoIterator<Item = &'h str> + Clone,
    {
        let pick = |family: CurrencyFamily| {
            let found = find_best_column(headers.clone(), aliases.for_family(family))
                .unwrap_or_else(|| ColumnMatch::Default {
                    header: defaults.net_original(family).to_string(),
                });
            debug!("Net {} column resolved as {:?}", family.code(), found);
            found
        };

        Self {
            tl: pick(CurrencyFamily::Tl),
            usd: pick(CurrencyFamily::Usd),
            gbp: pick(CurrencyFamily::Gbp),
            eur: pick(CurrencyFamily::Eur),
        }
    }

    pub fn header(&self, family: CurrencyFamily) -> &str {
        match family {
            CurrencyFamily::Eur => self.eur.header(),
            CurrencyFamily::Usd => self.usd.header(),
            CurrencyFamily::Gbp => self.gbp.header(),
            CurrencyFamily::Tl => self.tl.header(),
        }
    }
}
