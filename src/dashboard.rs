//! The coordinating context owning the canonical set and everything derived from it.

use crate::attainment::{self, Attainment, ManagerPerformance};
use crate::bucketing::{self, BucketSeries};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::ingestion::{self, FilterOptions, IngestReport};
use crate::kpi::{kpi_summary, KpiSummary};
use crate::rollup::{
    self, CumulativeSeries, CurrencyTotals, GroupTotal, GroupTotals, ManagerCustomers, Share,
};
use crate::schema::{
    CurrencyFamily, Dimension, ExchangeRates, Filters, Granularity, RawRow, Record, SortField,
    Targets, ValuationMode, ViewSettings,
};
use crate::valuation::{compute_net_eur, family_or_local, revalue};
use crate::view::{sort_view, PageWindow};
use log::{debug, info, warn};
use std::collections::BTreeSet;

const TOP_MANAGERS: usize = 3;
const TOP_CUSTOMERS_PER_MANAGER: usize = 5;

#[derive(Debug, Clone)]
pub struct SalesDashboard {
    config: DashboardConfig,
    records: Vec<Record>,
    rates: ExchangeRates,
    targets: Targets,
    filters: Filters,
    settings: ViewSettings,
    /// Positions in `records` passing the filters, in canonical order.
    active: Vec<usize>,
    last_report: Option<IngestReport>,
}

impl Default for SalesDashboard {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

fn check_rate(family: CurrencyFamily, value: f64) -> Result<()> {
    if family == CurrencyFamily::Eur || !value.is_finite() || value <= 0.0 {
        return Err(DashboardError::InvalidRate {
            code: family.code().to_string(),
            value,
        });
    }
    Ok(())
}

/// Rejects `rates` when any rate-derived record would lose its finite EUR value under them.
fn check_derived_values(records: &[Record], rates: &ExchangeRates) -> Result<()> {
    let Some(record) = records
        .iter()
        .find(|r| !compute_net_eur(r, rates).is_finite())
    else {
        return Ok(());
    };
    let family = family_or_local(&record.currency);
    Err(DashboardError::InvalidRate {
        code: family.code().to_string(),
        value: rates.divisor(family).unwrap_or(1.0),
    })
}

impl SalesDashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let settings = ViewSettings {
            rows_per_page: config.rows_per_page.max(1),
            ..Default::default()
        };
        Self {
            rates: config.default_rates,
            config,
            records: Vec::new(),
            targets: Targets::default(),
            filters: Filters::default(),
            settings,
            active: Vec::new(),
            last_report: None,
        }
    }

    /// Restores rates and targets saved by the presentation layer. Never fails: unusable
    /// JSON leaves defaults in place.
    pub fn load_persisted(&mut self, rates_json: Option<&str>, targets_json: Option<&str>) {
        if let Some(json) = rates_json {
            if let Err(e) = self.set_rates(ExchangeRates::from_persisted_json(json)) {
                warn!("Keeping current rates, persisted rates rejected: {}", e);
            }
        }
        if let Some(json) = targets_json {
            self.targets = Targets::from_persisted_json(json);
        }
        info!(
            "Loaded persisted state: rates {:?}, {} targets",
            self.rates,
            self.targets.0.len()
        );
    }

    /// Replaces the canonical set with a new batch. On error the previous set, and
    /// everything derived from it, is left untouched.
    pub fn ingest(&mut self, rows: &[RawRow]) -> Result<IngestReport> {
        let (records, report) = ingestion::normalize_rows(rows, &self.config, &self.rates)?;

        self.records = records;
        self.filters = Filters::default();
        self.settings.current_page = 1;
        self.refilter();

        info!(
            "Ingested batch: {} records, {} dropped, {} managers",
            report.ingested,
            report.dropped,
            self.managers().len()
        );
        self.last_report = Some(report.clone());
        Ok(report)
    }

    pub fn ingest_json(&mut self, json: &str) -> Result<IngestReport> {
        let rows = ingestion::parse_rows_json(json)?;
        self.ingest(&rows)
    }

    /// Replaces every rate at once. A single invalid rate rejects the whole update, as does
    /// a rate that would push a derived EUR value out of the finite range.
    pub fn set_rates(&mut self, rates: ExchangeRates) -> Result<()> {
        check_rate(CurrencyFamily::Usd, rates.usd)?;
        check_rate(CurrencyFamily::Gbp, rates.gbp)?;
        check_rate(CurrencyFamily::Tl, rates.try_rate)?;
        check_derived_values(&self.records, &rates)?;

        self.rates = rates;
        let derived = revalue(&mut self.records, &self.rates);
        self.refilter();
        info!("Rates updated to {:?}; {} records re-derived", self.rates, derived);
        Ok(())
    }

    pub fn set_rate(&mut self, family: CurrencyFamily, value: f64) -> Result<()> {
        check_rate(family, value)?;
        let mut rates = self.rates;
        match family {
            CurrencyFamily::Usd => rates.usd = value,
            CurrencyFamily::Gbp => rates.gbp = value,
            CurrencyFamily::Tl => rates.try_rate = value,
            CurrencyFamily::Eur => {}
        }
        self.set_rates(rates)
    }

    pub fn set_targets(&mut self, targets: Targets) -> Result<()> {
        if let Some((manager, &value)) = targets
            .0
            .iter()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(DashboardError::InvalidTarget {
                manager: manager.clone(),
                value,
            });
        }
        info!("Targets replaced: {} managers", targets.0.len());
        self.targets = targets;
        Ok(())
    }

    /// Applies a full filter set and returns the new view as the table shows it.
    pub fn set_filters(&mut self, filters: Filters) -> Vec<&Record> {
        self.filters = filters;
        self.settings.current_page = 1;
        self.refilter();
        self.table_view()
    }

    pub fn reset_filters(&mut self) -> Vec<&Record> {
        self.set_filters(Filters::default())
    }

    fn refilter(&mut self) {
        self.active = if self.filters.is_empty() {
            (0..self.records.len()).collect()
        } else {
            self.records
                .iter()
                .enumerate()
                .filter(|(_, r)| self.filters.matches(r))
                .map(|(i, _)| i)
                .collect()
        };
        debug!(
            "Active view: {} of {} records (filtered: {})",
            self.active.len(),
            self.records.len(),
            !self.filters.is_empty()
        );
    }

    /// The filtered records in canonical order. Every aggregate is computed from this.
    pub fn active_view(&self) -> Vec<&Record> {
        self.active.iter().map(|&i| &self.records[i]).collect()
    }

    /// The filtered records in table order: sorted when a sort is selected.
    pub fn table_view(&self) -> Vec<&Record> {
        let mut view = self.active_view();
        if let Some(key) = self.settings.sort {
            sort_view(&mut view, key);
        }
        view
    }

    pub fn sort_by(&mut self, field: SortField) {
        self.settings.toggle_sort(field);
    }

    pub fn set_mode(&mut self, mode: ValuationMode) {
        self.settings.mode = mode;
    }

    pub fn set_rows_per_page(&mut self, rows: usize) -> Result<()> {
        self.settings.set_rows_per_page(rows)
    }

    pub fn change_page(&mut self, delta: isize) -> bool {
        let total = self.active.len();
        self.settings.change_page(delta, total)
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        let total = self.active.len();
        self.settings.go_to_page(page, total)
    }

    pub fn page(&self) -> Vec<&Record> {
        let view = self.table_view();
        self.settings.page(&view).to_vec()
    }

    pub fn page_window(&self) -> PageWindow {
        self.settings.page_window(self.active.len())
    }

    pub fn total_pages(&self) -> usize {
        self.settings.total_pages(self.active.len())
    }

    pub fn view_total_eur(&self) -> f64 {
        self.active_view().iter().map(|r| r.net_eur()).sum()
    }

    pub fn aggregate_by(&self, dimension: Dimension) -> GroupTotals {
        rollup::group_sum(&self.active_view(), dimension)
    }

    pub fn top_n(&self, dimension: Dimension, n: usize) -> Vec<GroupTotal> {
        rollup::top_n(&self.active_view(), dimension, n)
    }

    pub fn shares(&self, dimension: Dimension, n: usize) -> Vec<Share> {
        rollup::percent_shares(&self.top_n(dimension, n))
    }

    pub fn top_customers_per_manager(&self) -> Vec<ManagerCustomers> {
        rollup::top_customers_per_manager(
            &self.active_view(),
            TOP_MANAGERS,
            TOP_CUSTOMERS_PER_MANAGER,
        )
    }

    pub fn top_invoices(&self, n: usize) -> Vec<&Record> {
        rollup::top_invoices(&self.active_view(), n)
    }

    pub fn currency_totals(&self) -> CurrencyTotals {
        rollup::original_currency_totals(&self.active_view())
    }

    pub fn bucket_series(&self, granularity: Granularity) -> BucketSeries {
        bucketing::bucket_series(&self.active_view(), &self.records, &self.filters, granularity)
    }

    pub fn cumulative(&self, granularity: Granularity) -> CumulativeSeries {
        rollup::cumulative(&self.bucket_series(granularity))
    }

    pub fn attainment(&self) -> Option<Attainment> {
        attainment::attainment(&self.active_view(), &self.targets)
    }

    pub fn manager_performance(&self) -> Vec<ManagerPerformance> {
        attainment::manager_performance(&self.active_view(), &self.targets)
    }

    pub fn kpis(&self) -> KpiSummary {
        kpi_summary(&self.active_view(), &self.targets, self.settings.mode)
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::from_records(&self.records)
    }

    pub fn dominant_quarter(&self) -> Option<String> {
        ingestion::dominant_quarter(&self.records)
    }

    /// Sorted distinct managers of the canonical set.
    pub fn managers(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.manager.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn record(&self, id: usize) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn dropped_count(&self) -> usize {
        self.last_report.as_ref().map_or(0, |r| r.dropped)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn last_report(&self) -> Option<&IngestReport> {
        self.last_report.as_ref()
    }
}
