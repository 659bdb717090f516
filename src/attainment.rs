//! Target attainment.
//!
//! The global figure divides total sales of the whole active view by the sum of the
//! targets that exist for managers in that view. Untargeted managers add to the
//! numerator but not the denominator.

use crate::rollup::group_sum;
use crate::schema::{Dimension, Record, Targets};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attainment {
    pub percent: f64,
    pub target_sum: f64,
    /// Total EUR of the entire active view.
    pub actual_sum: f64,
    /// EUR of targeted managers only.
    pub actual_for_target: f64,
}

/// `None` when no manager in the view has a target, or the targets sum to zero.
pub fn attainment(records: &[&Record], targets: &Targets) -> Option<Attainment> {
    let per_manager = group_sum(records, Dimension::Manager);

    let mut target_sum = 0.0;
    let mut actual_for_target = 0.0;
    for entry in &per_manager.entries {
        if let Some(target) = targets.get(&entry.key) {
            target_sum += target;
            actual_for_target += entry.total;
        }
    }

    if target_sum == 0.0 {
        return None;
    }

    let actual_sum = per_manager.grand_total();
    Some(Attainment {
        percent: actual_sum / target_sum * 100.0,
        target_sum,
        actual_sum,
        actual_for_target,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    NoTarget,
    Met,
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerPerformance {
    pub manager: String,
    pub actual: f64,
    pub target: Option<f64>,
    /// `None` without a positive target.
    pub percent: Option<f64>,
    pub status: TargetStatus,
}

/// One row per manager in the view, best seller first.
pub fn manager_performance(records: &[&Record], targets: &Targets) -> Vec<ManagerPerformance> {
    group_sum(records, Dimension::Manager)
        .ranked()
        .into_iter()
        .map(|entry| {
            let target = targets.get(&entry.key);
            let percent = target
                .filter(|t| *t > 0.0)
                .map(|t| entry.total / t * 100.0);
            let status = match target {
                None => TargetStatus::NoTarget,
                Some(t) if entry.total >= t => TargetStatus::Met,
                Some(_) => TargetStatus::Below,
            };
            ManagerPerformance {
                manager: entry.key,
                actual: entry.total,
                target,
                percent,
                status,
            }
        })
        .collect()
}
