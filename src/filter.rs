use crate::schema::{Filters, Record};
use crate::utils::month_label;

fn matches_exact(predicate: &Option<String>, value: &str) -> bool {
    match predicate.as_deref() {
        None | Some("") => true,
        Some(expected) => expected == value,
    }
}

impl Filters {
    pub fn matches(&self, record: &Record) -> bool {
        let month_ok = match self.active_month() {
            None => true,
            Some(label) => month_label(record.date) == label,
        };
        let search_ok = match self.search.as_deref() {
            None | Some("") => true,
            Some(needle) => record
                .firm
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };

        month_ok
            && matches_exact(&self.manager, &record.manager)
            && matches_exact(&self.region, &record.region)
            && matches_exact(&self.city, &record.city)
            && matches_exact(&self.record_type, &record.record_type)
            && matches_exact(&self.currency, &record.currency)
            && search_ok
    }
}

/// The active view: every record passing all predicates, in canonical order.
pub fn apply_filters<'a>(records: &'a [Record], filters: &Filters) -> Vec<&'a Record> {
    records.iter().filter(|r| filters.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NetOriginal;
    use chrono::NaiveDate;

    fn record(id: usize, firm: &str, manager: &str, date: (i32, u32, u32)) -> Record {
        Record {
            id,
            firm: firm.to_string(),
            manager: manager.to_string(),
            region: "Marmara".to_string(),
            city: "İstanbul".to_string(),
            record_type: "Material".to_string(),
            currency: "TL".to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            invoice_number: serde_json::Value::Null,
            net_eur: 1.0,
            source_net_eur: Some(1.0),
            net_original: NetOriginal::default(),
            vat_amount: 0.0,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record(0, "Acme Makina", "Ali", (2024, 1, 5)),
            record(1, "Beta Yapı", "Ayşe", (2024, 2, 7)),
            record(2, "ACME Lojistik", "Ayşe", (2024, 2, 9)),
        ]
    }

    #[test]
    fn test_empty_filters_return_everything_in_order() {
        let records = sample();
        let view = apply_filters(&records, &Filters::default());
        let ids: Vec<usize> = view.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let records = sample();
        let filters = Filters {
            manager: Some("Ayşe".to_string()),
            search: Some("acme".to_string()),
            ..Default::default()
        };
        let view = apply_filters(&records, &filters);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, 2);
    }

    #[test]
    fn test_month_filter_matches_label() {
        let records = sample();
        let filters = Filters {
            month: Some("February 2024".to_string()),
            ..Default::default()
        };
        let ids: Vec<usize> = apply_filters(&records, &filters).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_blank_predicate_matches_all() {
        let records = sample();
        let filters = Filters {
            region: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &filters).len(), 3);
    }
}
