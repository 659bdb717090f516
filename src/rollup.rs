//! Grouped sums, rankings and running totals over the active view.

use crate::bucketing::BucketSeries;
use crate::schema::{CurrencyFamily, Dimension, Record};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
}

/// Sums per dimension value, kept in the order each value was first encountered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupTotals {
    pub entries: Vec<GroupTotal>,
}

impl GroupTotals {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.total)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn grand_total(&self) -> f64 {
        self.entries.iter().map(|e| e.total).sum()
    }

    /// Descending by total. Equal totals keep first-encountered order.
    pub fn ranked(mut self) -> Vec<GroupTotal> {
        self.entries
            .sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
        self.entries
    }

    pub fn top(self, n: usize) -> Vec<GroupTotal> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

pub fn group_sum(records: &[&Record], dimension: Dimension) -> GroupTotals {
    let mut entries: Vec<GroupTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for &record in records {
        let key = dimension.value_of(record);
        match index.get(key) {
            Some(&i) => entries[i].total += record.net_eur(),
            None => {
                index.insert(key, entries.len());
                entries.push(GroupTotal {
                    key: key.to_string(),
                    total: record.net_eur(),
                });
            }
        }
    }

    GroupTotals { entries }
}

pub fn top_n(records: &[&Record], dimension: Dimension, n: usize) -> Vec<GroupTotal> {
    group_sum(records, dimension).top(n)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerCustomers {
    pub manager: String,
    pub total: f64,
    pub customers: Vec<GroupTotal>,
}

/// Best customers of each of the best managers, each ranking computed within that
/// manager's own invoices.
pub fn top_customers_per_manager(
    records: &[&Record],
    managers: usize,
    customers: usize,
) -> Vec<ManagerCustomers> {
    top_n(records, Dimension::Manager, managers)
        .into_iter()
        .map(|manager| {
            let own: Vec<&Record> = records
                .iter()
                .copied()
                .filter(|r| r.manager == manager.key)
                .collect();
            ManagerCustomers {
                customers: top_n(&own, Dimension::Customer, customers),
                manager: manager.key,
                total: manager.total,
            }
        })
        .collect()
}

/// The `n` largest invoices by EUR value. Ties keep view order.
pub fn top_invoices<'a>(records: &[&'a Record], n: usize) -> Vec<&'a Record> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        b.net_eur()
            .partial_cmp(&a.net_eur())
            .unwrap_or(Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    pub keys: Vec<String>,
    pub labels: Vec<String>,
    pub per_manager: BTreeMap<String, Vec<f64>>,
    pub total: Vec<f64>,
}

/// Running sums across the gap-filled buckets, starting from zero.
pub fn cumulative(series: &BucketSeries) -> CumulativeSeries {
    let mut running: BTreeMap<String, f64> =
        series.managers.iter().map(|m| (m.clone(), 0.0)).collect();
    let mut per_manager: BTreeMap<String, Vec<f64>> = series
        .managers
        .iter()
        .map(|m| (m.clone(), Vec::with_capacity(series.buckets.len())))
        .collect();
    let mut total = Vec::with_capacity(series.buckets.len());
    let mut grand = 0.0;

    for bucket in &series.buckets {
        for (manager, acc) in running.iter_mut() {
            let amount = bucket.amounts.get(manager).copied().unwrap_or(0.0);
            *acc += amount;
            grand += amount;
            if let Some(points) = per_manager.get_mut(manager) {
                points.push(*acc);
            }
        }
        total.push(grand);
    }

    CumulativeSeries {
        keys: series.buckets.iter().map(|b| b.key.clone()).collect(),
        labels: series.buckets.iter().map(|b| b.label.clone()).collect(),
        per_manager,
        total,
    }
}

/// Net sales summed in each record's own currency, without conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    #[serde(rename = "EUR")]
    pub eur: f64,
    #[serde(rename = "USD")]
    pub usd: f64,
    #[serde(rename = "GBP")]
    pub gbp: f64,
    #[serde(rename = "TL")]
    pub tl: f64,
}

impl CurrencyTotals {
    fn slot(&mut self, family: CurrencyFamily) -> &mut f64 {
        match family {
            CurrencyFamily::Eur => &mut self.eur,
            CurrencyFamily::Usd => &mut self.usd,
            CurrencyFamily::Gbp => &mut self.gbp,
            CurrencyFamily::Tl => &mut self.tl,
        }
    }

    /// Currencies with a positive total, EUR first and TL last.
    pub fn positive(&self) -> Vec<(CurrencyFamily, f64)> {
        [
            (CurrencyFamily::Eur, self.eur),
            (CurrencyFamily::Usd, self.usd),
            (CurrencyFamily::Gbp, self.gbp),
            (CurrencyFamily::Tl, self.tl),
        ]
        .into_iter()
        .filter(|(_, v)| *v > 0.0)
        .collect()
    }
}

pub fn original_currency_totals(records: &[&Record]) -> CurrencyTotals {
    let mut totals = CurrencyTotals::default();
    for record in records {
        let (family, amount) = record.original_amount();
        *totals.slot(family) += amount;
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub key: String,
    pub value: f64,
    /// Rounded share of the list total, 0 when the total is 0.
    pub percent: u32,
}

pub fn percent_shares(entries: &[GroupTotal]) -> Vec<Share> {
    let sum: f64 = entries.iter().map(|e| e.total).sum();
    entries
        .iter()
        .map(|e| Share {
            key: e.key.clone(),
            value: e.total,
            percent: if sum > 0.0 {
                (e.total / sum * 100.0).round().max(0.0) as u32
            } else {
                0
            },
        })
        .collect()
}
