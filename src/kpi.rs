//! Headline figures for the active view.

use crate::attainment::{attainment, Attainment};
use crate::rollup::original_currency_totals;
use crate::schema::{CurrencyFamily, Record, Targets, ValuationMode};
use crate::utils::turkish_upper;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NetSales {
    Normalized { total_eur: f64 },
    /// Own-currency totals, positive buckets only.
    Original { breakdown: Vec<(CurrencyFamily, f64)> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub invoice_count: usize,
    pub customer_count: usize,
    pub total_net_eur: f64,
    pub average_invoice_eur: f64,
    pub product_total_eur: f64,
    pub service_total_eur: f64,
    pub net_sales: NetSales,
    pub attainment: Option<Attainment>,
}

pub fn is_service(record: &Record) -> bool {
    let kind = turkish_upper(&record.record_type);
    kind.contains("SERVİS") || kind.contains("HİZMET")
}

pub fn kpi_summary(records: &[&Record], targets: &Targets, mode: ValuationMode) -> KpiSummary {
    let total_net_eur: f64 = records.iter().map(|r| r.net_eur()).sum();
    let customer_count = records
        .iter()
        .map(|r| r.firm.as_str())
        .collect::<HashSet<_>>()
        .len();

    let (service_total_eur, product_total_eur) =
        records.iter().fold((0.0, 0.0), |(service, product), r| {
            if is_service(r) {
                (service + r.net_eur(), product)
            } else {
                (service, product + r.net_eur())
            }
        });

    let net_sales = match mode {
        ValuationMode::Normalized => NetSales::Normalized {
            total_eur: total_net_eur,
        },
        ValuationMode::Original => NetSales::Original {
            breakdown: original_currency_totals(records).positive(),
        },
    };

    KpiSummary {
        invoice_count: records.len(),
        customer_count,
        total_net_eur,
        average_invoice_eur: if records.is_empty() {
            0.0
        } else {
            total_net_eur / records.len() as f64
        },
        product_total_eur,
        service_total_eur,
        net_sales,
        attainment: attainment(records, targets),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NetOriginal;
    use chrono::NaiveDate;

    fn record(firm: &str, kind: &str, currency: &str, net: f64, original: NetOriginal) -> Record {
        Record {
            id: 0,
            firm: firm.to_string(),
            manager: "Ali".to_string(),
            region: "Ege".to_string(),
            city: "İzmir".to_string(),
            record_type: kind.to_string(),
            currency: currency.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            invoice_number: serde_json::Value::Null,
            net_eur: net,
            source_net_eur: Some(net),
            net_original: original,
            vat_amount: 0.0,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record(
                "Acme",
                "Material",
                "EUR",
                100.0,
                NetOriginal {
                    eur: 100.0,
                    ..Default::default()
                },
            ),
            record(
                "Acme",
                "Yedek Parça Servis",
                "TL",
                20.0,
                NetOriginal {
                    tl: 700.0,
                    ..Default::default()
                },
            ),
            record(
                "Beta",
                "hizmet bedeli",
                "USD",
                30.0,
                NetOriginal {
                    usd: 32.4,
                    ..Default::default()
                },
            ),
        ]
    }

    #[test]
    fn test_service_detection_uses_turkish_casing() {
        let records = sample();
        assert!(!is_service(&records[0]));
        assert!(is_service(&records[1]));
        // lowercase "i" must upper-case to "İ" for HİZMET to match
        assert!(is_service(&records[2]));
    }

    #[test]
    fn test_summary_counts_and_split() {
        let records = sample();
        let view: Vec<&Record> = records.iter().collect();
        let kpi = kpi_summary(&view, &Targets::default(), ValuationMode::Normalized);

        assert_eq!(kpi.invoice_count, 3);
        assert_eq!(kpi.customer_count, 2);
        assert_eq!(kpi.total_net_eur, 150.0);
        assert_eq!(kpi.average_invoice_eur, 50.0);
        assert_eq!(kpi.product_total_eur, 100.0);
        assert_eq!(kpi.service_total_eur, 50.0);
        assert_eq!(
            kpi.net_sales,
            NetSales::Normalized { total_eur: 150.0 }
        );
        assert_eq!(kpi.attainment, None);
    }

    #[test]
    fn test_original_mode_breakdown() {
        let records = sample();
        let view: Vec<&Record> = records.iter().collect();
        let kpi = kpi_summary(&view, &Targets::default(), ValuationMode::Original);

        match kpi.net_sales {
            NetSales::Original { breakdown } => {
                let families: Vec<CurrencyFamily> = breakdown.iter().map(|(f, _)| *f).collect();
                assert_eq!(
                    families,
                    vec![CurrencyFamily::Eur, CurrencyFamily::Usd, CurrencyFamily::Tl]
                );
                assert_eq!(breakdown[2].1, 700.0);
            }
            other => panic!("expected original breakdown, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_view() {
        let kpi = kpi_summary(&[], &Targets::default(), ValuationMode::Normalized);
        assert_eq!(kpi.invoice_count, 0);
        assert_eq!(kpi.average_invoice_eur, 0.0);
    }
}
