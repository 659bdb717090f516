//! # Sales Dashboard Engine
//!
//! Turns loosely-typed sales invoice sheets into a canonical record set valued in EUR,
//! and serves the filtered, time-bucketed and ranked views a sales dashboard displays.
//!
//! ## Core Concepts
//!
//! - **Canonical records**: invoice lines after number/date parsing, column alias
//!   resolution and defaulting. Rows without a usable date, or whose EUR value is not a
//!   finite number, are dropped and counted.
//! - **Valuation**: an EUR figure supplied by the sheet always wins; otherwise the
//!   own-currency amount is divided by a manually configured rate.
//! - **Active view**: the records passing every filter. All aggregates read from it.
//! - **Gap-filled buckets**: daily or ISO-week series with a zero entry for every idle
//!   slot and manager.
//! - **Attainment**: total sales of the view against the targets of the managers in it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_dashboard_engine::*;
//!
//! let rows = parse_rows_json(r#"[
//!     {"FAT. TARİHİ": "02.01.2024", "FİRMA ÜNVANI": "Acme", "SATIŞ TEMSİLCİSİ": "Ali",
//!      "DÖVİZ CİNSİ": "USD", "KDV HARİÇ (USD)": 108}
//! ]"#).unwrap();
//!
//! let mut dashboard = build_dashboard(&rows, DashboardConfig::default()).unwrap();
//! dashboard.set_rate(CurrencyFamily::Usd, 1.2).unwrap();
//!
//! let by_manager = dashboard.aggregate_by(Dimension::Manager);
//! let weekly = dashboard.bucket_series(Granularity::Weekly);
//! let kpis = dashboard.kpis();
//! ```

pub mod attainment;
pub mod bucketing;
pub mod columns;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod ingestion;
pub mod kpi;
pub mod rollup;
pub mod schema;
pub mod utils;
pub mod valuation;
pub mod view;

pub use attainment::{attainment, manager_performance, Attainment, ManagerPerformance, TargetStatus};
pub use bucketing::{bucket_key, bucket_label, bucket_range, bucket_series, Bucket, BucketSeries};
pub use columns::{find_best_column, ColumnMatch, ResolvedColumns};
pub use config::{ColumnAliases, ColumnHeaders, DashboardConfig};
pub use dashboard::SalesDashboard;
pub use error::{DashboardError, Result};
pub use filter::apply_filters;
pub use ingestion::*;
pub use kpi::{is_service, kpi_summary, KpiSummary, NetSales};
pub use rollup::*;
pub use schema::*;
pub use utils::*;
pub use valuation::{classify, compute_net_eur, family_or_local, revalue};
pub use view::{compare_by, sort_view, PageWindow};

/// Builds a dashboard from one batch of raw rows with default rates and no targets.
pub fn build_dashboard(rows: &[RawRow], config: DashboardConfig) -> Result<SalesDashboard> {
    let mut dashboard = SalesDashboard::new(config);
    dashboard.ingest(rows)?;
    Ok(dashboard)
}
