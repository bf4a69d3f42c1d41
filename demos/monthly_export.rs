use chrono::{Local, NaiveDate, Timelike};
use sepa_export::core::*;
use sepa_export::job::{DirectoryStore, run_monthly_export};

const SETTINGS: &str = r#"{
    "INITIATING_BUSINESS": "Positoos B.V.",
    "END_TO_END_ID": "Saldo Positoos",
    "RECONCILIATION": {
        "SEND_SEPA_MONTHLY_RESET_INVOICE": true,
        "INVOICE_LIST_URL": "https://www.positoos.nl/invoices/"
    },
    "CREDITOR": {
        "NAME": "Positoos B.V., Administratie", "IBAN": "NL15RABO0154443476",
        "BIC": "RABONL2U", "ULTIMATE_CREDITOR": "Rabobank",
        "IDENTIFIER": "NL66ZZZ172728960000", "COUNTRY": "NL",
        "STREET_NUMBER": "Groenstraat 139/155", "POSTCODE_CITY": "5021LL Tilburg"
    },
    "DEBTOR": {
        "NAME": "Positoos B.V., Administratie", "IBAN": "NL15RABO0154443476",
        "BIC": "RABONL2U", "ULTIMATE_DEBTOR": "Rabobank",
        "IDENTIFIER": "NL66ZZZ172728960000", "COUNTRY": "NL",
        "STREET_NUMBER": "Groenstraat 139/155", "POSTCODE_CITY": "5021LL Tilburg"
    }
}"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "sepa_export=info".to_string()),
        )
        .init();

    let config = SepaExportConfig::from_json(SETTINGS).expect("valid settings");
    let now = Local::now().naive_local().with_nanosecond(0).expect("valid time");
    let signed = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();

    let mut businesses = vec![
        BusinessBuilder::new(
            1,
            "Bakkerij Smit",
            "bakker",
            AddressBuilder::new("Tilburg", "5021 LL", "NL")
                .street("Heuvel 1")
                .build(),
        )
        .contact_name("Jan Smit")
        .account_holder("J. Smit")
        .iban("NL91ABNA0417164300")
        .bic("ABNANL2A")
        .mandate("POS-0001", signed)
        .build(),
        BusinessBuilder::new(
            2,
            "Kapsalon Zoë",
            "kapper",
            AddressBuilder::new("Tilburg", "5038 AB", "NL")
                .street("Stationsstraat 12")
                .build(),
        )
        .account_holder("Z. de Vries")
        .iban("NL02RABO0123456789")
        .bic("RABONL2U")
        .mandate("POS-0002", signed)
        .build(),
        BusinessBuilder::new(
            3,
            "Fietsenmaker Jansen",
            "fietsen",
            AddressBuilder::new("Tilburg", "5017 GD", "NL")
                .street("Korte Heuvel 30")
                .build(),
        )
        .account_holder("P. Jansen")
        .iban("NL44INGB0001234567")
        .bic("INGBNL2A")
        .mandate("POS-0003", signed)
        .latest_payment_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        .build(),
    ];

    let mut ledger = MemoryLedger::new(now)
        .with_account("bakker", 12_550)
        .with_account("kapper", -3_275)
        .with_account("fietsen", -800);
    let mut invoices: Vec<ReconciliationInvoice> = Vec::new();
    let mut notices: Vec<ResetNotice> = Vec::new();
    let mut store = DirectoryStore::new(std::env::temp_dir().join("sepa-export-demo"));

    let outcome = run_monthly_export(
        config,
        &mut ledger,
        &mut businesses,
        &mut invoices,
        &mut notices,
        &mut store,
        now,
    )
    .expect("monthly export");

    println!("Period: {} .. {}", outcome.date_from, outcome.date_to);
    for doc in &outcome.documents {
        println!(
            "  {} -> {}/{}: {} transactions, EUR {}",
            doc.kind,
            store.root().display(),
            doc.file_name,
            doc.summary.number_of_transactions,
            doc.summary.control_sum
        );
    }
    println!("Payment dates recorded for: {:?}", outcome.updated_businesses);
    for invoice in &invoices {
        println!(
            "  invoice {} for {}: EUR {}",
            invoice.kind.as_str(),
            invoice.to_account,
            invoice.total()
        );
    }
    for notice in &notices {
        println!("  notice to {} <{}>", notice.contact_name, notice.business_name);
    }
    println!(
        "Reconciled {}/{} businesses",
        outcome.reconciliation.succeeded(),
        outcome.reconciliation.entries.len()
    );
}
