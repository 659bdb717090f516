use crate::error::{DashboardError, Result};
use chrono::{Datelike, Days, NaiveDate};

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(NaiveDate::MAX)
}

/// First and last day of the calendar month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.with_day(1).unwrap_or(date);
    let end = last_day_of_month(date.year(), date.month());
    (start, end)
}

/// Month label used both as filter vocabulary and as the month filter's matching key,
/// e.g. "March 2024".
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Parses a label produced by [`month_label`] back into the bounds of that month.
pub fn parse_month_label(label: &str) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::parse_from_str(&format!("01 {}", label.trim()), "%d %B %Y")
        .map_err(|_| DashboardError::UnknownMonthLabel(label.to_string()))?;
    Ok(month_bounds(first))
}

pub fn quarter_of(date: NaiveDate) -> u32 {
    date.month0() / 3 + 1
}

/// Every calendar day from `start` to `end`, both inclusive. Empty when `end < start`.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
}

/// Upper-cases with Turkish casing rules so that "servis" becomes "SERVİS".
pub fn turkish_upper(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            'i' => out.push('İ'),
            'ı' => out.push('I'),
            other => out.extend(other.to_uppercase()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2023, 2),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            last_day_of_month(2023, 12),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_month_label_round_trip_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 17).unwrap();
        let label = month_label(date);
        assert_eq!(label, "February 2024");

        let (start, end) = parse_month_label(&label).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_parse_month_label_rejects_garbage() {
        assert!(matches!(
            parse_month_label("Smarch 2024"),
            Err(DashboardError::UnknownMonthLabel(_))
        ));
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), 1);
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()), 2);
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()), 3);
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()), 4);
    }

    #[test]
    fn test_days_in_range_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let days: Vec<_> = days_in_range(start, end).collect();
        assert_eq!(days.len(), 5);
        assert_eq!(days.first(), Some(&start));
        assert_eq!(days.last(), Some(&end));

        assert_eq!(days_in_range(end, start).count(), 0);
    }

    #[test]
    fn test_turkish_upper() {
        assert_eq!(turkish_upper("servis"), "SERVİS");
        assert_eq!(turkish_upper("hizmet bedeli"), "HİZMET BEDELİ");
        assert_eq!(turkish_upper("ılık"), "ILIK");
    }
}
