//! Sorting and pagination of the active view.

use crate::error::{DashboardError, Result};
use crate::schema::{Record, SortField, SortKey, ViewSettings};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

fn invoice_number_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numbers compare numerically; anything else compares by its text.
fn compare_invoice_numbers(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => invoice_number_text(a).cmp(&invoice_number_text(b)),
    }
}

pub fn compare_by(field: SortField, a: &Record, b: &Record) -> Ordering {
    let by_amount = |x: f64, y: f64| x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Date => a.date.cmp(&b.date),
        SortField::InvoiceNumber => compare_invoice_numbers(&a.invoice_number, &b.invoice_number),
        SortField::Customer => a.firm.cmp(&b.firm),
        SortField::Manager => a.manager.cmp(&b.manager),
        SortField::Region => a.region.cmp(&b.region),
        SortField::City => a.city.cmp(&b.city),
        SortField::Type => a.record_type.cmp(&b.record_type),
        SortField::Currency => a.currency.cmp(&b.currency),
        SortField::Net => by_amount(a.net_eur(), b.net_eur()),
        SortField::NetOriginal => by_amount(a.original_amount().1, b.original_amount().1),
    }
}

/// Stable: records with equal keys keep their relative order.
pub fn sort_view(view: &mut [&Record], key: SortKey) {
    view.sort_by(|a, b| {
        let ord = compare_by(key.field, a, b);
        if key.ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// 1-based position of the first row on the page, 0 for an empty view.
    pub start: usize,
    /// 1-based position of the last row on the page.
    pub end: usize,
    pub total: usize,
}

impl ViewSettings {
    /// Same field flips direction; a new field starts ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort = Some(match self.sort {
            Some(current) if current.field == field => SortKey {
                field,
                ascending: !current.ascending,
            },
            _ => SortKey {
                field,
                ascending: true,
            },
        });
    }

    pub fn set_rows_per_page(&mut self, rows: usize) -> Result<()> {
        if rows == 0 {
            return Err(DashboardError::InvalidPageSize(rows));
        }
        self.rows_per_page = rows;
        self.current_page = 1;
        Ok(())
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.rows_per_page.max(1))
    }

    /// Moves to `page` if it lies within `[1, total_pages]`; otherwise nothing changes.
    pub fn go_to_page(&mut self, page: usize, total: usize) -> bool {
        if page >= 1 && page <= self.total_pages(total) {
            self.current_page = page;
            true
        } else {
            false
        }
    }

    pub fn change_page(&mut self, delta: isize, total: usize) -> bool {
        match self.current_page.checked_add_signed(delta) {
            Some(page) => self.go_to_page(page, total),
            None => false,
        }
    }

    pub fn page_window(&self, total: usize) -> PageWindow {
        let start = (self.current_page.saturating_sub(1) * self.rows_per_page).min(total);
        let end = (start + self.rows_per_page).min(total);
        PageWindow {
            start: if start < end { start + 1 } else { 0 },
            end,
            total,
        }
    }

    /// The slice of `rows` shown on the current page.
    pub fn page<'v, T>(&self, rows: &'v [T]) -> &'v [T] {
        let window = self.page_window(rows.len());
        let start = window.start.saturating_sub(1);
        &rows[start..window.end.max(start)]
    }
}
