//! # sepa-export
//!
//! Monthly settlement of a community currency against euros. Each business's
//! ledger balance is exported as SEPA payment instructions and then reset to
//! zero on the ledger:
//!
//! - positive balances become a pain.001.001.03 credit transfer (payout)
//! - negative balances become a pain.008.001.02 direct debit, `FRST` for a
//!   first collection and `RCUR` afterwards
//!
//! All monetary values use [`rust_decimal::Decimal`] and are rounded to cents
//! once, at classification time.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use sepa_export::core::*;
//! use sepa_export::SepaExporter;
//!
//! let party = |ultimate: &str| format!(
//!     r#"{{"NAME": "Positoos B.V.", "IBAN": "NL15RABO0154443476", "BIC": "RABONL2U",
//!         "{ultimate}": "Rabobank", "IDENTIFIER": "NL66ZZZ172728960000", "COUNTRY": "NL",
//!         "STREET_NUMBER": "Groenstraat 139/155", "POSTCODE_CITY": "5021LL Tilburg"}}"#
//! );
//! let config = SepaExportConfig::from_json(&format!(
//!     r#"{{"INITIATING_BUSINESS": "Positoos", "END_TO_END_ID": "Saldo",
//!         "CREDITOR": {}, "DEBTOR": {}}}"#,
//!     party("ULTIMATE_CREDITOR"),
//!     party("ULTIMATE_DEBTOR"),
//! ))
//! .unwrap();
//!
//! let mut businesses = vec![
//!     BusinessBuilder::new(1, "Bakkerij Smit", "bakker",
//!         AddressBuilder::new("Tilburg", "5021 LL", "NL").street("Heuvel 1").build())
//!         .account_holder("J. Smit")
//!         .iban("NL91ABNA0417164300")
//!         .bic("ABNANL2A")
//!         .mandate("POS-1", NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
//!         .build(),
//! ];
//! let now = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(2, 0, 0).unwrap();
//! let mut ledger = MemoryLedger::new(now).with_account("bakker", -1250);
//!
//! let (from, to) = previous_month(now.date());
//! let exporter = SepaExporter::new(config, from, to).unwrap();
//! let classification = exporter.classify(&ledger, &businesses).unwrap();
//! let debit_xml = exporter.build_direct_debit_xml(&classification).unwrap();
//! assert!(debit_xml.contains("<SeqTp>FRST</SeqTp>"));
//!
//! classification.record_payment_dates(&mut businesses);
//! let mut invoices: Vec<ReconciliationInvoice> = Vec::new();
//! let report = exporter.reconcile(&classification, &mut ledger, &mut invoices, &mut (), now.date());
//! assert!(report.is_clean());
//! assert_eq!(ledger.account_balance("bakker").unwrap(), 0);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Business profiles, ledger trait, classification, reconciliation |
//! | `pain` (default) | pain.001 / pain.008 generation and control-sum verification, `SepaExporter` |
//! | `job` | Monthly export run with document storage |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "pain")]
pub mod pain;

#[cfg(feature = "pain")]
mod exporter;

#[cfg(feature = "job")]
pub mod job;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

#[cfg(feature = "pain")]
pub use exporter::SepaExporter;
