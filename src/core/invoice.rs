use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{InvoiceError, NotifyError};
use super::ledger::LedgerTransaction;
use super::types::BusinessId;

/// Whether a reconciliation invoice charges the business or pays it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceKind {
    /// The business owes euros (its ledger balance was negative).
    Debit,
    /// The business receives euros (its ledger balance was positive).
    Credit,
}

impl InvoiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

/// One invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: Decimal,
    /// Net amount in EUR. Positive charges the business.
    pub amount: Decimal,
    /// VAT percentage.
    pub tax_rate: Decimal,
}

/// Automatic EUR invoice documenting one balance reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationInvoice {
    pub business_id: BusinessId,
    /// Issuing user (the reserve / bank user).
    pub from_user: String,
    /// Ledger account of the invoiced business.
    pub to_account: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency_code: String,
    pub kind: InvoiceKind,
    pub automatic: bool,
    pub admin_comment: String,
    pub line: InvoiceLine,
}

impl ReconciliationInvoice {
    /// Build the invoice for a signed EUR amount (positive = business pays).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        business_id: BusinessId,
        from_user: impl Into<String>,
        to_account: impl Into<String>,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        amount: Decimal,
        tax_rate: Decimal,
        description: impl Into<String>,
    ) -> Self {
        let kind = if amount > Decimal::ZERO {
            InvoiceKind::Debit
        } else {
            InvoiceKind::Credit
        };
        Self {
            business_id,
            from_user: from_user.into(),
            to_account: to_account.into(),
            issue_date,
            due_date,
            currency_code: "EUR".into(),
            kind,
            automatic: true,
            admin_comment: format!("Automatic invoice of type {}", kind.as_str()),
            line: InvoiceLine {
                description: description.into(),
                quantity: Decimal::ONE,
                amount,
                tax_rate,
            },
        }
    }

    /// Gross total including VAT, rounded to cents.
    pub fn total(&self) -> Decimal {
        let net = self.line.amount * self.line.quantity;
        (net + net * self.line.tax_rate / Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// `issue_date` plus `days_due` days. `None` when negative or past the end
/// of the calendar.
pub fn due_date(issue_date: NaiveDate, days_due: i64) -> Option<NaiveDate> {
    let days = u64::try_from(days_due).ok()?;
    issue_date.checked_add_days(Days::new(days))
}

/// Receiver of reconciliation invoices (the billing module).
pub trait InvoiceSink {
    fn create_invoice(&mut self, invoice: &ReconciliationInvoice) -> Result<(), InvoiceError>;
}

impl InvoiceSink for Vec<ReconciliationInvoice> {
    fn create_invoice(&mut self, invoice: &ReconciliationInvoice) -> Result<(), InvoiceError> {
        self.push(invoice.clone());
        Ok(())
    }
}

/// Message telling a business its balance was reset and invoiced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetNotice {
    pub business_id: BusinessId,
    pub ledger_account: String,
    /// Person addressed in the message.
    pub contact_name: String,
    pub business_name: String,
    /// The invoice line description.
    pub invoice_text: String,
    /// Where the business can find its invoices.
    pub link_url: String,
}

/// Delivers reset notices (usually by mail).
pub trait ResetNotifier {
    fn notify(&mut self, notice: &ResetNotice) -> Result<(), NotifyError>;
}

impl ResetNotifier for Vec<ResetNotice> {
    fn notify(&mut self, notice: &ResetNotice) -> Result<(), NotifyError> {
        self.push(notice.clone());
        Ok(())
    }
}

/// Drops every notice.
impl ResetNotifier for () {
    fn notify(&mut self, _: &ResetNotice) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Monthly settlement text for the invoice line.
///
/// Sums spent and received currency in `transactions`, restarting the count
/// (and the reported start date) at every transfer whose description is one
/// of `reset_descriptions`.
pub fn settlement_summary(
    from_date: NaiveDate,
    to_date: NaiveDate,
    transactions: &[LedgerTransaction],
    reset_descriptions: &[&str],
    conversion: i64,
) -> String {
    let mut from_date = from_date;
    let mut spent: i64 = 0;
    let mut received: i64 = 0;

    for t in transactions {
        if reset_descriptions.contains(&t.description.as_str()) {
            spent = 0;
            received = 0;
            from_date = t.created.date();
            continue;
        }
        if t.amount > 0 {
            received += t.amount;
        } else {
            spent += t.amount;
        }
    }

    let spent = -spent;
    let total = spent - received;
    let is_debit = total > 0;

    let (kind, receive_or_pay) = if is_debit {
        ("Afschrijving", "betalen")
    } else {
        ("Bijschrijving", "ontvangen")
    };
    let plus = if is_debit { "+" } else { "" };
    let total_eur = if is_debit {
        to_euros(total, conversion)
    } else {
        -to_euros(total, conversion)
    };

    format!(
        "{kind} maandelijkse verrekening {} tot {}.\n\n \
         Uitgegeven Positoos: {spent} Positoos (€ {})\n\
         Ingenomen Positoos: {received} Positoos (€ {})\n\
         Saldoverrekening: {plus}{total} Positoos te {receive_or_pay}, € {}",
        from_date.format("%d-%m-%Y"),
        to_date.format("%d-%m-%Y"),
        cents(to_euros(spent, conversion)),
        cents(to_euros(received, conversion)),
        cents(total_eur),
    )
}

/// Minor units to EUR, rounded to two places.
pub fn to_euros(minor_units: i64, conversion: i64) -> Decimal {
    (Decimal::from(minor_units) / Decimal::from(conversion)).round_dp(2)
}

fn cents(amount: Decimal) -> String {
    let mut d = amount.round_dp(2);
    d.rescale(2);
    d.to_string()
}
