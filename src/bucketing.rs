//! Time bucketing with gap filling.
//!
//! Buckets are laid out over a contiguous calendar range first, then the active view
//! is poured into them, so a day or week without invoices still appears with zero
//! amounts for every manager.

use crate::schema::{Filters, Granularity, Record};
use crate::utils::{days_in_range, parse_month_label};
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// `YYYY-MM-DD` or `YYYY-Www`; sorts lexically in chronological order.
    pub key: String,
    pub label: String,
    /// EUR per manager. Every manager of the series is present, zero when idle.
    pub amounts: BTreeMap<String, f64>,
}

impl Bucket {
    pub fn total(&self) -> f64 {
        self.amounts.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSeries {
    pub granularity: Granularity,
    /// Managers appearing in the active view, sorted.
    pub managers: Vec<String>,
    pub buckets: Vec<Bucket>,
}

pub fn bucket_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
    }
}

pub fn bucket_label(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => date.format("%d.%m.%Y").to_string(),
        Granularity::Weekly => {
            let week = date.iso_week();
            format!("H{}, {}", week.week(), week.year())
        }
    }
}

/// Calendar range the series must cover.
///
/// An active month filter pins the range to that month. Otherwise the range spans the
/// active view, or the whole canonical set when the view is empty.
pub fn bucket_range(
    active: &[&Record],
    all: &[Record],
    filters: &Filters,
) -> Option<(NaiveDate, NaiveDate)> {
    if let Some(label) = filters.active_month() {
        match parse_month_label(label) {
            Ok(bounds) => return Some(bounds),
            Err(e) => debug!("Month filter not usable as range, using data range: {}", e),
        }
    }

    let dates: Vec<NaiveDate> = if active.is_empty() {
        all.iter().map(|r| r.date).collect()
    } else {
        active.iter().map(|r| r.date).collect()
    };

    let start = dates.iter().min()?;
    let end = dates.iter().max()?;
    Some((*start, *end))
}

pub fn bucket_series(
    active: &[&Record],
    all: &[Record],
    filters: &Filters,
    granularity: Granularity,
) -> BucketSeries {
    let managers: Vec<String> = active
        .iter()
        .map(|r| r.manager.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let Some((start, end)) = bucket_range(active, all, filters) else {
        return BucketSeries {
            granularity,
            managers,
            buckets: Vec::new(),
        };
    };

    let zero: BTreeMap<String, f64> = managers.iter().map(|m| (m.clone(), 0.0)).collect();
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    // Day by day even for weekly buckets, so every week touched by the range shows up.
    for day in days_in_range(start, end) {
        let key = bucket_key(day, granularity);
        if index.contains_key(&key) {
            continue;
        }
        index.insert(key.clone(), buckets.len());
        buckets.push(Bucket {
            key,
            label: bucket_label(day, granularity),
            amounts: zero.clone(),
        });
    }

    let mut outside = 0;
    for record in active {
        let key = bucket_key(record.date, granularity);
        match index.get(&key) {
            Some(&i) => {
                if let Some(amount) = buckets[i].amounts.get_mut(&record.manager) {
                    *amount += record.net_eur();
                }
            }
            None => outside += 1,
        }
    }

    debug!(
        "Built {} {:?} buckets from {} to {} ({} records outside range)",
        buckets.len(),
        granularity,
        start,
        end,
        outside
    );

    BucketSeries {
        granularity,
        managers,
        buckets,
    }
}
