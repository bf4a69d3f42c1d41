//! ISO 20022 payment initiation documents.
//!
//! - **pain.001.001.03**: customer credit transfer, paying out positive
//!   balances (`to_pain_001_xml`)
//! - **pain.008.001.02**: customer direct debit, collecting negative
//!   balances (`to_pain_008_xml`)
//!
//! Fragments are plain values built by the `*_transaction` and
//! `*_payments_info` functions and serialized in one pass. Amounts inside a
//! fragment are always positive; the document type carries the direction.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use sepa_export::core::*;
//! use sepa_export::pain;
//!
//! let business = BusinessBuilder::new(
//!     7,
//!     "Bakkerij Smit",
//!     "bakker",
//!     AddressBuilder::new("Tilburg", "5021 LL", "NL").street("Heuvel 1").build(),
//! )
//! .account_holder("J. Smit")
//! .iban("NL91ABNA0417164300")
//! .bic("ABNANL2A")
//! .mandate("M-7", NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
//! .build();
//! let counterparty = Counterparty::from_business(&business).unwrap();
//!
//! let tx = pain::credit_transaction(&counterparty, dec!(12.50), "Saldo 05/2024 - 7", "Saldo");
//! assert_eq!(tx.amount, dec!(12.50));
//! ```

mod credit;
mod debit;
mod header;
mod verify;
pub(crate) mod xml_utils;

pub use credit::{
    CreditTransferDocument, CreditTransferPaymentInfo, CreditTransferTransaction,
    credit_payments_info, credit_transaction, to_pain_001_xml,
};
pub use debit::{
    DirectDebitDocument, DirectDebitPaymentInfo, DirectDebitTransaction, SequenceType,
    debit_payments_info, debit_transaction, to_pain_008_xml,
};
pub use header::{GroupHeader, sepa_header};
pub use verify::{DocumentFormat, DocumentSummary, verify_document};
pub use xml_utils::{XmlResult, format_amount, sepa_text};

/// pain.001.001.03 namespace (credit transfer initiation).
pub const PAIN_001_NS: &str = "urn:iso:std:iso:20022:tech:xsd:pain.001.001.03";

/// pain.008.001.02 namespace (direct debit initiation).
pub const PAIN_008_NS: &str = "urn:iso:std:iso:20022:tech:xsd:pain.008.001.02";

pub(crate) const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// `CreDtTm` and description timestamp format.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Maximum length of SEPA identifier fields such as `PmtInfId` and `MsgId`.
pub const MAX_IDENTIFIER_LEN: usize = 35;
