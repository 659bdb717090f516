use anyhow::Result;
use chrono::NaiveDate;
use rand::Rng;
use sales_dashboard_engine::*;
use serde_json::{json, Value};

const SALES_SHEET: &str = r#"NO,FATURA NO,FAT. TARİHİ,FİRMA ÜNVANI,BÖLGE,İL,CİNSİ,DÖVİZ CİNSİ,SATIŞ TEMSİLCİSİ,KDV HARİÇ TL,K.D.V.,KDV HARİÇ EURO KARŞILIĞI,KDV HARİÇ (EURO),KDV HARİÇ (USD),KDV HARİÇ (GBP)
1,1001,02.01.2024,Acme Makina,Marmara,İstanbul,Malzeme,EUR,Ali,,,"1.500,00","1.500,00",,
2,1002,03.01.2024,Beta Yapı,Ege,İzmir,Servis,USD,Ayşe,,,,,540,
3,1003,05.01.2024,Acme Makina,Marmara,İstanbul,Malzeme,TL,Ali,"35.000,00","7.000,00",,,,
4,1004,10.01.2024,Delta Enerji,İç Anadolu,Ankara,Hizmet,GBP,Mehmet,,,,,,85
5,1005,15.01.2024,Beta Yapı,Ege,İzmir,Malzeme,EUR,Ayşe,,,250,,,
6,1006,01.02.2024,Acme Lojistik,Marmara,Bursa,Malzeme,USD,Ali,,,900,,1.000,
7,1007,12.02.2024,Delta Enerji,İç Anadolu,Ankara,Malzeme,TL,Mehmet,17.500,,,,,
8,1008,2024-02-13,Gamma Tekstil,Ege,Manisa,Malzeme,EUR,Ayşe,,,300,,,
"#;

fn rows_from_csv(data: &str) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new().from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn json_rows(values: Vec<Value>) -> Vec<RawRow> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

fn sample_dashboard() -> Result<SalesDashboard> {
    let rows = rows_from_csv(SALES_SHEET)?;
    Ok(build_dashboard(&rows, DashboardConfig::default())?)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_ingest_sales_sheet() -> Result<()> {
    let dashboard = sample_dashboard()?;

    assert_eq!(dashboard.records().len(), 7);
    assert_eq!(dashboard.dropped_count(), 1);
    let ids: Vec<usize> = dashboard.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6]);

    let first = dashboard.record(0).expect("record 0");
    assert_eq!(first.firm, "Acme Makina");
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    assert_eq!(first.source_net_eur, Some(1500.0));
    assert_eq!(first.invoice_number, json!("1001"));

    let tl = dashboard.record(2).expect("record 2");
    assert_eq!(tl.net_original.tl, 35000.0);
    assert_eq!(tl.vat_amount, 7000.0);
    assert!(approx(tl.net_eur(), 1000.0));

    let report = dashboard.last_report().expect("report");
    assert!(matches!(report.columns.usd, ColumnMatch::Exact { .. }));

    let options = dashboard.filter_options();
    assert_eq!(options.managers, vec!["Ali", "Ayşe", "Mehmet"]);
    assert_eq!(options.months, vec!["January 2024", "February 2024"]);
    assert_eq!(dashboard.dominant_quarter().as_deref(), Some("Q1 2024"));

    println!("✓ Sales sheet ingested: {} records", dashboard.records().len());
    Ok(())
}

#[test]
fn test_source_figure_wins_over_any_rate() -> Result<()> {
    let mut dashboard = sample_dashboard()?;
    let mut rng = rand::thread_rng();

    for _ in 0..50 {
        let rates = ExchangeRates {
            usd: rng.gen_range(0.1..10.0),
            gbp: rng.gen_range(0.1..10.0),
            try_rate: rng.gen_range(1.0..100.0),
        };
        dashboard.set_rates(rates)?;

        assert_eq!(dashboard.record(0).map(|r| r.net_eur()), Some(1500.0));
        // USD record carrying its own EUR figure
        assert_eq!(dashboard.record(5).map(|r| r.net_eur()), Some(900.0));
    }
    Ok(())
}

#[test]
fn test_usd_record_follows_rate_exactly() -> Result<()> {
    let mut dashboard = sample_dashboard()?;
    let mut rng = rand::thread_rng();

    for _ in 0..50 {
        let rate: f64 = rng.gen_range(0.01..20.0);
        dashboard.set_rate(CurrencyFamily::Usd, rate)?;
        let record = dashboard.record(1).expect("record 1");
        assert_eq!(record.source_net_eur, None);
        assert_eq!(record.net_eur(), record.net_original.usd / rate);
    }
    Ok(())
}

#[test]
fn test_invalid_rate_keeps_prior_rate() -> Result<()> {
    let mut dashboard = sample_dashboard()?;
    dashboard.set_rate(CurrencyFamily::Usd, 1.2)?;
    let before = dashboard.record(1).map(|r| r.net_eur());

    for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let result = dashboard.set_rate(CurrencyFamily::Usd, bad);
        assert!(matches!(result, Err(DashboardError::InvalidRate { .. })));
    }
    let result = dashboard.set_rates(ExchangeRates {
        usd: 2.0,
        gbp: -1.0,
        try_rate: 30.0,
    });
    assert!(result.is_err());

    assert_eq!(dashboard.rates().usd, 1.2);
    assert_eq!(dashboard.record(1).map(|r| r.net_eur()), before);
    Ok(())
}

#[test]
fn test_overflowing_amounts_never_reach_aggregates() -> Result<()> {
    let sheet = format!(
        "{}{}\n{}\n",
        SALES_SHEET,
        "9,1009,20.02.2024,Omega Dış Ticaret,Ege,İzmir,Malzeme,USD,Ayşe,,,,,1e400,",
        "10,1010,21.02.2024,Omega Dış Ticaret,Ege,İzmir,Malzeme,EUR,Ayşe,,,1e400,,,"
    );
    let mut dashboard = build_dashboard(&rows_from_csv(&sheet)?, DashboardConfig::default())?;

    assert_eq!(dashboard.records().len(), 7);
    assert_eq!(dashboard.dropped_count(), 3);
    assert!(!dashboard.managers().is_empty());

    let mut targets = Targets::default();
    targets.0.insert("Ayşe".to_string(), 1000.0);
    dashboard.set_targets(targets)?;
    let attainment = dashboard.attainment().expect("attainment");
    assert!(attainment.percent.is_finite());
    for share in dashboard.shares(Dimension::Manager, 5) {
        assert!(share.value.is_finite(), "{} share overflowed", share.key);
    }

    let result = dashboard.set_rate(CurrencyFamily::Tl, f64::MIN_POSITIVE);
    assert!(result.is_err());
    assert_eq!(dashboard.rates().try_rate, 35.0);
    println!("✓ Overflowing amounts dropped, totals stay finite");
    Ok(())
}

#[test]
fn test_parse_error_leaves_canonical_set() -> Result<()> {
    let mut dashboard = sample_dashboard()?;
    dashboard.set_filters(Filters {
        manager: Some("Ali".to_string()),
        ..Default::default()
    });

    assert!(matches!(
        dashboard.ingest_json("[1, 2, 3]"),
        Err(DashboardError::ParseError(_))
    ));
    assert!(matches!(
        dashboard.ingest(&json_rows(vec![json!({"FİRMA ÜNVANI": "X"})])),
        Err(DashboardError::MissingColumn(_))
    ));

    assert_eq!(dashboard.records().len(), 7);
    assert_eq!(dashboard.active_view().len(), 3);
    Ok(())
}

#[test]
fn test_excel_serial_dates() -> Result<()> {
    let rows = json_rows(vec![
        json!({"FAT. TARİHİ": 45293, "DÖVİZ CİNSİ": "EUR", "KDV HARİÇ EURO KARŞILIĞI": 10}),
        json!({"FAT. TARİHİ": 45293.75, "DÖVİZ CİNSİ": "EUR", "KDV HARİÇ EURO KARŞILIĞI": 20}),
    ]);
    let dashboard = build_dashboard(&rows, DashboardConfig::default())?;

    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    assert!(dashboard.records().iter().all(|r| r.date == day));
    assert_eq!(dashboard.records()[0].manager, "Unassigned");
    assert_eq!(dashboard.records()[0].region, "Unknown");
    assert_eq!(dashboard.records()[0].record_type, "Material");
    Ok(())
}

#[test]
fn test_daily_gap_fill_covers_view_range() -> Result<()> {
    let dashboard = sample_dashboard()?;
    let series = dashboard.bucket_series(Granularity::Daily);

    let d0 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let d1 = NaiveDate::from_ymd_opt(2024, 2, 12).unwrap();
    assert_eq!(series.buckets.len() as i64, (d1 - d0).num_days() + 1);
    assert_eq!(series.buckets.first().map(|b| b.key.as_str()), Some("2024-01-02"));
    assert_eq!(series.buckets.last().map(|b| b.key.as_str()), Some("2024-02-12"));

    for pair in series.buckets.windows(2) {
        assert!(pair[0].key < pair[1].key);
    }
    for bucket in &series.buckets {
        assert_eq!(bucket.amounts.len(), 3);
    }

    let grand: f64 = series.buckets.iter().map(|b| b.total()).sum();
    assert!(approx(grand, dashboard.view_total_eur()));

    let cumulative = dashboard.cumulative(Granularity::Daily);
    assert_eq!(cumulative.total.len(), series.buckets.len());
    for points in cumulative.per_manager.values() {
        assert!(points.windows(2).all(|w| w[0] <= w[1]));
    }
    assert!(approx(*cumulative.total.last().unwrap(), grand));
    Ok(())
}

#[test]
fn test_month_filter_fills_whole_month() -> Result<()> {
    let mut dashboard = sample_dashboard()?;
    let view = dashboard.set_filters(Filters {
        month: Some("January 2024".to_string()),
        ..Default::default()
    });
    assert_eq!(view.len(), 5);

    let series = dashboard.bucket_series(Granularity::Daily);
    assert_eq!(series.buckets.len(), 31);
    assert_eq!(series.buckets[0].key, "2024-01-01");
    assert_eq!(series.buckets[0].label, "01.01.2024");
    Ok(())
}

#[test]
fn test_iso_week_boundary() -> Result<()> {
    let rows = json_rows(vec![
        json!({"FAT. TARİHİ": "01.01.2021", "SATIŞ TEMSİLCİSİ": "Ali",
               "KDV HARİÇ EURO KARŞILIĞI": 5}),
        json!({"FAT. TARİHİ": "04.01.2021", "SATIŞ TEMSİLCİSİ": "Ali",
               "KDV HARİÇ EURO KARŞILIĞI": 7}),
    ]);
    let dashboard = build_dashboard(&rows, DashboardConfig::default())?;
    let series = dashboard.bucket_series(Granularity::Weekly);

    let keys: Vec<&str> = series.buckets.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, vec!["2020-W53", "2021-W01"]);
    assert_eq!(series.buckets[0].amounts["Ali"], 5.0);
    assert_eq!(series.buckets[1].amounts["Ali"], 7.0);
    assert_eq!(series.buckets[1].label, "H1, 2021");
    Ok(())
}

#[test]
fn test_attainment_counts_untargeted_sales() -> Result<()> {
    let rows = json_rows(vec![
        json!({"FAT. TARİHİ": "01.03.2024", "SATIŞ TEMSİLCİSİ": "A",
               "KDV HARİÇ EURO KARŞILIĞI": 150}),
        json!({"FAT. TARİHİ": "02.03.2024", "SATIŞ TEMSİLCİSİ": "C",
               "KDV HARİÇ EURO KARŞILIĞI": 50}),
    ]);
    let mut dashboard = build_dashboard(&rows, DashboardConfig::default())?;
    assert_eq!(dashboard.attainment(), None);

    dashboard.set_targets(Targets::from_persisted_json(r#"{"A": 100}"#))?;
    let attainment = dashboard.attainment().expect("attainment");
    assert_eq!(attainment.target_sum, 100.0);
    assert_eq!(attainment.actual_sum, 200.0);
    assert_eq!(attainment.actual_for_target, 150.0);
    assert_eq!(attainment.percent, 200.0);

    let rows = dashboard.manager_performance();
    assert_eq!(rows[0].status, TargetStatus::Met);
    assert_eq!(rows[1].status, TargetStatus::NoTarget);
    Ok(())
}

#[test]
fn test_rollups_and_rankings() -> Result<()> {
    let dashboard = sample_dashboard()?;

    let by_manager = dashboard.aggregate_by(Dimension::Manager);
    let keys: Vec<&str> = by_manager.entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["Ali", "Ayşe", "Mehmet"]);
    assert!(approx(by_manager.get("Ali").unwrap_or_default(), 3400.0));
    assert!(approx(by_manager.get("Ayşe").unwrap_or_default(), 750.0));
    assert!(approx(by_manager.get("Mehmet").unwrap_or_default(), 600.0));

    let top = dashboard.top_n(Dimension::Customer, 2);
    assert_eq!(top[0].key, "Acme Makina");
    assert!(approx(top[0].total, 2500.0));
    assert_eq!(top[1].key, "Acme Lojistik");

    let nested = dashboard.top_customers_per_manager();
    assert_eq!(nested.len(), 3);
    assert_eq!(nested[0].manager, "Ali");
    assert_eq!(nested[0].customers.len(), 2);

    let invoices = dashboard.top_invoices(2);
    assert_eq!(invoices.iter().map(|r| r.id).collect::<Vec<_>>(), vec![0, 2]);

    let shares = dashboard.shares(Dimension::Manager, 3);
    let percents: Vec<u32> = shares.iter().map(|s| s.percent).collect();
    assert_eq!(percents, vec![72, 16, 13]);

    let currencies = dashboard.currency_totals();
    assert_eq!(currencies.eur, 1750.0);
    assert_eq!(currencies.usd, 1540.0);
    assert_eq!(currencies.gbp, 85.0);
    assert_eq!(currencies.tl, 52500.0);
    Ok(())
}

#[test]
fn test_kpi_summary() -> Result<()> {
    let mut dashboard = sample_dashboard()?;
    let kpis = dashboard.kpis();

    assert_eq!(kpis.invoice_count, 7);
    assert_eq!(kpis.customer_count, 4);
    assert!(approx(kpis.total_net_eur, 4750.0));
    assert!(approx(kpis.service_total_eur, 600.0));
    assert!(approx(kpis.product_total_eur, 4150.0));
    assert!(matches!(kpis.net_sales, NetSales::Normalized { .. }));

    dashboard.set_mode(ValuationMode::Original);
    match dashboard.kpis().net_sales {
        NetSales::Original { breakdown } => assert_eq!(breakdown.len(), 4),
        other => panic!("unexpected net sales {:?}", other),
    }
    Ok(())
}

#[test]
fn test_empty_filters_are_idempotent() -> Result<()> {
    let mut dashboard = sample_dashboard()?;
    let canonical: Vec<usize> = dashboard.records().iter().map(|r| r.id).collect();

    let first: Vec<usize> = dashboard
        .set_filters(Filters::default())
        .iter()
        .map(|r| r.id)
        .collect();
    let second: Vec<usize> = dashboard
        .set_filters(Filters::default())
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(first, canonical);
    assert_eq!(second, canonical);

    dashboard.set_filters(Filters {
        region: Some("Ege".to_string()),
        record_type: Some("Malzeme".to_string()),
        ..Default::default()
    });
    assert_eq!(dashboard.active_view().len(), 1);
    let reset: Vec<usize> = dashboard.reset_filters().iter().map(|r| r.id).collect();
    assert_eq!(reset, canonical);
    Ok(())
}

#[test]
fn test_sort_keeps_ingestion_order_on_ties() -> Result<()> {
    let mut dashboard = sample_dashboard()?;
    dashboard.sort_by(SortField::Customer);

    let ids: Vec<usize> = dashboard.table_view().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![5, 0, 2, 1, 4, 3, 6]);

    dashboard.sort_by(SortField::Customer);
    let ids: Vec<usize> = dashboard.table_view().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 6, 1, 4, 0, 2, 5]);
    Ok(())
}

#[test]
fn test_pagination_bounds() -> Result<()> {
    let rows = json_rows(
        (1..=30)
            .map(|day| {
                json!({
                    "FAT. TARİHİ": format!("{:02}.04.2024", day),
                    "SATIŞ TEMSİLCİSİ": "Ali",
                    "KDV HARİÇ EURO KARŞILIĞI": day,
                })
            })
            .collect(),
    );
    let mut dashboard = build_dashboard(&rows, DashboardConfig::default())?;
    assert_eq!(dashboard.settings().rows_per_page, 25);
    assert_eq!(dashboard.total_pages(), 2);

    assert!(dashboard.go_to_page(2));
    assert_eq!(dashboard.page().len(), 5);
    assert!(!dashboard.go_to_page(3));
    assert_eq!(dashboard.settings().current_page, 2);
    assert_eq!(
        dashboard.page_window(),
        PageWindow {
            start: 26,
            end: 30,
            total: 30
        }
    );

    dashboard.set_rows_per_page(10)?;
    assert_eq!(dashboard.settings().current_page, 1);
    assert_eq!(dashboard.total_pages(), 3);
    assert!(dashboard.set_rows_per_page(0).is_err());
    Ok(())
}
