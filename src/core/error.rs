use chrono::NaiveDate;
use thiserror::Error;

/// Errors that abort a SEPA export run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// Required settings are missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The final date of the export period lies before the initial date.
    #[error("invalid dates passed to SEPA exporter: {to} is before {from}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    /// There are no active business profiles to export.
    #[error("no business profiles available")]
    NoBusinesses,

    /// XML generation or parsing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// `NbOfTxs` / `CtrlSum` in a document disagree with its transactions.
    #[error("control sum mismatch: {0}")]
    ControlSum(String),

    /// Writing an export document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the external ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// The ledger has no member with the given account name.
    #[error("member not found: {0}")]
    MemberNotFound(String),

    /// The ledger rejected a transfer (e.g. insufficient funds on the reserve).
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// The ledger could not be reached or answered with garbage.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Failure to persist a reconciliation invoice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invoice could not be stored: {0}")]
pub struct InvoiceError(pub String);

/// Failure to deliver a reset notification to a business.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification could not be sent: {0}")]
pub struct NotifyError(pub String);

/// Per-business reconciliation failure.
///
/// These never abort the run; they are collected in a
/// [`ReconciliationReport`](super::ReconciliationReport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ReconciliationError {
    #[error("member not found: {0}")]
    MemberNotFound(String),

    /// The balancing transfer was rejected; nothing was invoiced.
    #[error("balance transfer failed: {0}")]
    Transfer(String),

    /// Any other ledger failure while reading balance or history.
    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    /// The transfer went through but the invoice could not be stored.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Today plus `INVOICE_DAYS_DUE` is not a valid date; nothing was moved.
    #[error("invoice due date out of range: {0} days")]
    DueDateOutOfRange(i64),

    /// The ledger reported a balance that cannot be negated; nothing was moved.
    #[error("balance out of range: {0}")]
    BalanceOutOfRange(i64),
}

impl From<LedgerError> for ReconciliationError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::MemberNotFound(account) => Self::MemberNotFound(account),
            LedgerError::Transaction(msg) => Self::Transfer(msg),
            other => Self::Ledger(other),
        }
    }
}
