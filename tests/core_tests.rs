#![cfg(feature = "core")]

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sepa_export::core::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn party(ultimate: &str) -> String {
    format!(
        r#"{{"NAME": "Positoos B.V., Administratie", "IBAN": "NL15RABO0154443476",
            "BIC": "RABONL2U", "{ultimate}": "Rabobank", "IDENTIFIER": "NL66ZZZ172728960000",
            "COUNTRY": "NL", "STREET_NUMBER": "Groenstraat 139/155",
            "POSTCODE_CITY": "5021LL Tilburg"}}"#
    )
}

fn business(id: BusinessId, account: &str) -> BusinessBuilder {
    BusinessBuilder::new(
        id,
        format!("Winkel {id}"),
        account,
        AddressBuilder::new("Tilburg", "5021 LL", "NL")
            .street("Heuvel 1")
            .build(),
    )
    .account_holder("Eigenaar")
    .iban("NL91ABNA0417164300")
    .bic("ABNANL2A")
    .mandate(format!("POS-{id}"), date(2023, 1, 1))
}

fn ledger() -> MemoryLedger {
    MemoryLedger::new(date(2024, 6, 1).and_hms_opt(2, 0, 0).unwrap())
}

// --- Configuration ---

#[test]
fn settings_with_overrides() {
    let json = format!(
        r#"{{"INITIATING_BUSINESS": "Positoos", "END_TO_END_ID": "Saldo",
            "CREDITOR": {}, "DEBTOR": {},
            "CURRENCY_CONVERSION": 1000, "COLLECTION_OFFSET_DAYS": 2,
            "RECONCILIATION": {{"DEBIT_TRANSFER_TYPE_ID": 7, "VAT_RATE": "21"}}}}"#,
        party("ULTIMATE_CREDITOR"),
        party("ULTIMATE_DEBTOR")
    );
    let config = SepaExportConfig::from_json(&json).unwrap();

    assert_eq!(config.currency_conversion, 1000);
    assert_eq!(config.collection_offset_days, 2);
    assert_eq!(config.creditor.ultimate_party, "Rabobank");
    assert_eq!(config.debtor.ultimate_party, "Rabobank");
    assert_eq!(config.reconciliation.debit_transfer_type_id, 7);
    assert_eq!(config.reconciliation.vat_rate, dec!(21));
    // untouched keys keep their defaults
    assert_eq!(config.reconciliation.credit_transfer_type_id, 36);
    assert_eq!(config.reconciliation.bank_user, "Positoos Reserve");
    assert_eq!(config.remittance_information, "Saldo verrekening Positoos");
}

#[test]
fn missing_creditor_key_is_named() {
    let creditor = party("ULTIMATE_CREDITOR").replace(r#""BIC": "RABONL2U","#, "");
    let json = format!(
        r#"{{"INITIATING_BUSINESS": "Positoos", "END_TO_END_ID": "Saldo",
            "CREDITOR": {creditor}, "DEBTOR": {}}}"#,
        party("ULTIMATE_DEBTOR")
    );
    let err = SepaExportConfig::from_json(&json).unwrap_err();
    assert_eq!(err.to_string(), "configuration error: CREDITOR BIC not defined");
}

#[test]
fn missing_end_to_end_id() {
    let json = format!(
        r#"{{"INITIATING_BUSINESS": "Positoos", "CREDITOR": {}, "DEBTOR": {}}}"#,
        party("ULTIMATE_CREDITOR"),
        party("ULTIMATE_DEBTOR")
    );
    let err = SepaExportConfig::from_json(&json).unwrap_err();
    assert!(err.to_string().contains("INITIATING_BUSINESS or END_TO_END_ID not defined"));
}

#[test]
fn malformed_settings() {
    let err = SepaExportConfig::from_json("{not json").unwrap_err();
    assert!(matches!(err, ExportError::Configuration(_)));
}

// --- Eligibility ---

#[test]
fn blank_bank_fields_count_as_missing() {
    let complete = business(1, "a").build();
    assert!(complete.has_banking_details());

    let blank_iban = business(2, "b").iban("  ").build();
    assert!(!blank_iban.has_banking_details());
    assert!(Counterparty::from_business(&blank_iban).is_none());
}

#[test]
fn address_line_format() {
    let address = AddressBuilder::new("Tilburg", "5021 LL", "NL")
        .street("Groenstraat 139")
        .build();
    assert_eq!(address.address_line(), "Groenstraat 139, 5021 LL, Tilburg, NL");
}

// --- Classification ---

#[test]
fn conversion_factor_and_rounding() {
    let ledger = ledger().with_account("a", 12_345).with_account("b", -5);
    let businesses = vec![business(1, "a").build(), business(2, "b").build()];
    let c = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 1000)
        .unwrap();

    assert_eq!(c.credit[&1].amount, dec!(12.34));
    // 0.005 rounds half to even, leaving nothing to collect
    assert!(c.debit_first.is_empty());
    assert_eq!(c.skipped[0].reason, SkipReason::ZeroBalance);
}

#[test]
fn business_appears_in_one_bucket_only() {
    let ledger = ledger()
        .with_account("a", 100)
        .with_account("b", -100)
        .with_account("c", -100);
    let businesses = vec![
        business(1, "a").build(),
        business(2, "b").build(),
        business(3, "c").latest_payment_date(date(2024, 4, 30)).build(),
    ];
    let c = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
        .unwrap();

    for id in [1, 2, 3] {
        let hits = [
            c.credit.contains_key(&id),
            c.debit_first.contains_key(&id),
            c.debit_recurring.contains_key(&id),
        ];
        assert_eq!(hits.iter().filter(|h| **h).count(), 1, "business {id}");
    }
}

#[test]
fn ledger_outage_skips_only_that_business() {
    struct FlakyLedger(MemoryLedger);

    impl Ledger for FlakyLedger {
        fn account_balance(&self, account: &str) -> Result<i64, LedgerError> {
            if account == "flaky" {
                return Err(LedgerError::Unavailable("timeout".into()));
            }
            self.0.account_balance(account)
        }

        fn transactions(
            &self,
            account: &str,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<LedgerTransaction>, LedgerError> {
            self.0.transactions(account, from, to)
        }

        fn to_system_payment(
            &mut self,
            account: &str,
            amount: i64,
            description: &str,
            transfer_type_id: u32,
        ) -> Result<(), LedgerError> {
            self.0.to_system_payment(account, amount, description, transfer_type_id)
        }

        fn from_system_payment(
            &mut self,
            account: &str,
            amount: i64,
            description: &str,
            transfer_type_id: u32,
        ) -> Result<(), LedgerError> {
            self.0.from_system_payment(account, amount, description, transfer_type_id)
        }
    }

    let ledger = FlakyLedger(ledger().with_account("a", 100));
    let businesses = vec![business(1, "a").build(), business(2, "flaky").build()];
    let c = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
        .unwrap();

    assert_eq!(c.credit.len(), 1);
    assert_eq!(
        c.skipped,
        vec![SkippedBusiness {
            business_id: 2,
            reason: SkipReason::Ledger(LedgerError::Unavailable("timeout".into())),
        }]
    );
}

#[test]
fn classifying_twice_after_recording_moves_first_to_recurring() {
    let ledger = ledger().with_account("b", -50);
    let mut businesses = vec![business(2, "b").build()];

    let first = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
        .unwrap();
    assert_eq!(first.debit_first.len(), 1);
    first.record_payment_dates(&mut businesses);

    let second = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
        .unwrap();
    assert!(second.debit_first.is_empty());
    assert_eq!(second.debit_recurring[&2].amount, dec!(0.50));
}

// --- Period ---

#[test]
fn previous_month_for_monthly_run() {
    assert_eq!(
        previous_month(date(2024, 3, 1)),
        (date(2024, 2, 1), date(2024, 2, 29))
    );
    assert_eq!(first_of_previous_month(date(2024, 1, 15)), date(2023, 12, 1));
}
