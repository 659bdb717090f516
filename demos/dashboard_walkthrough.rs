use sales_dashboard_engine::*;

const ROWS: &str = r#"[
    {"NO": 1, "FATURA NO": "A-1001", "FAT. TARİHİ": 45293, "FİRMA ÜNVANI": "Acme Makina", "BÖLGE": "Marmara",
     "İL": "İstanbul", "CİNSİ": "Malzeme", "DÖVİZ CİNSİ": "EUR", "SATIŞ TEMSİLCİSİ": "Ali",
     "KDV HARİÇ EURO KARŞILIĞI": "1.500,00", "KDV HARİÇ (EURO)": "1.500,00"},
    {"NO": 2, "FATURA NO": "A-1002", "FAT. TARİHİ": "03.01.2024", "FİRMA ÜNVANI": "Beta Yapı", "BÖLGE": "Ege",
     "İL": "İzmir", "CİNSİ": "Servis", "DÖVİZ CİNSİ": "DOLAR", "SATIŞ TEMSİLCİSİ": "Ayşe",
     "KDV HARİÇ (USD)": "540,00"},
    {"NO": 3, "FATURA NO": "A-1003", "FAT. TARİHİ": "08.01.2024", "FİRMA ÜNVANI": "Acme Makina", "BÖLGE": "Marmara",
     "İL": "İstanbul", "CİNSİ": "Malzeme", "DÖVİZ CİNSİ": "TL", "SATIŞ TEMSİLCİSİ": "Ali",
     "KDV HARİÇ TL": "35.000,00", "K.D.V.": "7.000,00"},
    {"NO": 4, "FATURA NO": "A-1004", "FAT. TARİHİ": "15.01.2024", "FİRMA ÜNVANI": "Delta Enerji", "BÖLGE": "İç Anadolu",
     "İL": "Ankara", "CİNSİ": "Hizmet", "DÖVİZ CİNSİ": "STERLİN", "SATIŞ TEMSİLCİSİ": "Mehmet",
     "KDV HARİÇ (GBP)": 85},
    {"NO": 5, "FATURA NO": "A-1005", "FAT. TARİHİ": "", "FİRMA ÜNVANI": "Eksik Tarih", "SATIŞ TEMSİLCİSİ": "Ali"}
]"#;

fn main() {
    println!("📊 Sales Dashboard Walkthrough\n");

    let mut dashboard = SalesDashboard::default();
    dashboard.load_persisted(
        Some(r#"{"USD": 1.10, "GBP": 0.86, "TRY": 35.0}"#),
        Some(r#"{"Ali": 2000, "Ayşe": 600}"#),
    );

    let report = dashboard.ingest_json(ROWS).unwrap();
    println!(
        "Ingested {} records, dropped {} rows",
        report.ingested, report.dropped
    );
    for family in CurrencyFamily::ALL {
        println!("  {} amounts read from {:?}", family.code(), report.columns.header(family));
    }

    println!("\n💶 Records in EUR:");
    for record in dashboard.page() {
        let (family, amount) = record.original_amount();
        println!(
            "  #{} {} {:<14} {:>10.2} {} -> {:>9.2} EUR",
            record.id,
            record.date.format("%d.%m.%Y"),
            record.firm,
            amount,
            family.code(),
            record.net_eur()
        );
    }

    println!("\n👥 Sales by manager:");
    for share in dashboard.shares(Dimension::Manager, 5) {
        println!("  {:<8} {:>10.2} EUR ({}%)", share.key, share.value, share.percent);
    }

    match dashboard.attainment() {
        Some(a) => println!(
            "\n🎯 Attainment: {:.1}% ({:.2} of {:.2} EUR target)",
            a.percent, a.actual_sum, a.target_sum
        ),
        None => println!("\n🎯 Attainment: no target configured"),
    }
    for row in dashboard.manager_performance() {
        println!("  {:<8} {:?} {:?}", row.manager, row.status, row.percent);
    }

    println!("\n📅 Weekly series:");
    let cumulative = dashboard.cumulative(Granularity::Weekly);
    for (label, total) in cumulative.labels.iter().zip(&cumulative.total) {
        println!("  {:<10} cumulative {:>10.2} EUR", label, total);
    }

    println!("\n💱 USD rate to 1.20");
    dashboard.set_rate(CurrencyFamily::Usd, 1.20).unwrap();
    let kpis = dashboard.kpis();
    println!(
        "  {} invoices, {} customers, {:.2} EUR total, {:.2} EUR service",
        kpis.invoice_count, kpis.customer_count, kpis.total_net_eur, kpis.service_total_eur
    );

    dashboard.set_filters(Filters {
        search: Some("acme".to_string()),
        ..Default::default()
    });
    println!("\n🔎 'acme' filter: {:.2} EUR", dashboard.view_total_eur());

    println!(
        "\nPersisted rates: {}",
        dashboard.rates().to_persisted_json().unwrap()
    );
}
