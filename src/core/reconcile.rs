use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::classify::Classification;
use super::config::ReconciliationSettings;
use super::error::ReconciliationError;
use super::invoice::{
    InvoiceSink, ReconciliationInvoice, ResetNotice, ResetNotifier, due_date, settlement_summary,
    to_euros,
};
use super::ledger::Ledger;
use super::period::first_of_previous_month;
use super::types::{Business, BusinessId};

/// Direction of the balancing transfer against the system reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Positive balance taken out of circulation (member → reserve).
    ToSystem,
    /// Negative balance topped up (reserve → member).
    FromSystem,
}

/// Successful reconciliation of one business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// Balance was already zero; nothing transferred or invoiced.
    AlreadyBalanced,
    Reconciled {
        direction: TransferDirection,
        /// Ledger balance in minor units before the transfer.
        balance: i64,
        invoice: ReconciliationInvoice,
        /// A reset notice was delivered to the business.
        notified: bool,
    },
}

#[derive(Debug, Clone)]
pub struct ReconciliationEntry {
    pub business_id: BusinessId,
    pub ledger_account: String,
    pub result: Result<ReconciliationOutcome, ReconciliationError>,
}

/// Per-business results of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationReport {
    pub entries: Vec<ReconciliationEntry>,
    /// Businesses whose balance at reconciliation differs from the amount
    /// exported at classification time.
    pub amount_mismatches: Vec<AmountMismatch>,
}

/// Exported and reconciled EUR amounts disagree for a business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountMismatch {
    pub business_id: BusinessId,
    /// Signed amount in the exported document (zero when not exported).
    pub exported: Decimal,
    /// Signed balance found when reconciling.
    pub reconciled: Decimal,
}

impl ReconciliationReport {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReconciliationEntry> {
        self.entries.iter().filter(|e| e.result.is_err())
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn invoices(&self) -> impl Iterator<Item = &ReconciliationInvoice> {
        self.entries.iter().filter_map(|e| match &e.result {
            Ok(ReconciliationOutcome::Reconciled { invoice, .. }) => Some(invoice),
            _ => None,
        })
    }
}

/// Bring one business's ledger balance back to zero and invoice it.
///
/// Re-reads the balance instead of trusting the classified amount. Performs
/// at most one ledger transfer and creates at most one invoice. When
/// `send_monthly_reset_invoice` is set the business is then notified; a
/// failed notification is logged and does not fail the reset.
pub fn reset_balance<L, S, N>(
    business: &Business,
    ledger: &mut L,
    invoices: &mut S,
    notifier: &mut N,
    settings: &ReconciliationSettings,
    conversion: i64,
    today: NaiveDate,
) -> Result<ReconciliationOutcome, ReconciliationError>
where
    L: Ledger + ?Sized,
    S: InvoiceSink + ?Sized,
    N: ResetNotifier + ?Sized,
{
    let account = business.ledger_account.as_str();
    let from_date = first_of_previous_month(today);
    let due = due_date(today, settings.invoice_days_due)
        .ok_or(ReconciliationError::DueDateOutOfRange(settings.invoice_days_due))
        .inspect_err(|e| error!(%account, error = %e, "cannot reset balance"))?;

    let balance = ledger
        .account_balance(account)
        .inspect_err(|e| error!(%account, error = %e, "cannot read balance for reset"))?;
    let history = ledger
        .transactions(account, from_date, today)
        .inspect_err(|e| error!(%account, error = %e, "cannot read transaction history"))?;

    info!(%account, balance, "resetting balance");
    if balance == 0 {
        info!(%account, "balance already zero, no transfer required");
        return Ok(ReconciliationOutcome::AlreadyBalanced);
    }

    let description = settlement_summary(
        from_date,
        today,
        &history,
        &settings.reset_descriptions(),
        conversion,
    );

    let (direction, transfer) = if balance > 0 {
        info!(
            %account,
            transfer_type_id = settings.credit_transfer_type_id,
            "credit transfer: {}", settings.credit_transfer_description
        );
        let transfer = ledger.to_system_payment(
            account,
            balance,
            &settings.credit_transfer_description,
            settings.credit_transfer_type_id,
        );
        (TransferDirection::ToSystem, transfer)
    } else {
        let owed = balance
            .checked_neg()
            .ok_or(ReconciliationError::BalanceOutOfRange(balance))
            .inspect_err(|e| error!(%account, error = %e, "cannot reset balance"))?;
        info!(
            %account,
            transfer_type_id = settings.debit_transfer_type_id,
            "debit transfer: {}", settings.debit_transfer_description
        );
        let transfer = ledger.from_system_payment(
            account,
            owed,
            &settings.debit_transfer_description,
            settings.debit_transfer_type_id,
        );
        (TransferDirection::FromSystem, transfer)
    };
    transfer.inspect_err(|e| error!(%account, error = %e, "unable to perform balance reset"))?;

    info!(%account, balance, ?direction, "monthly balance reconciled");

    let invoice = ReconciliationInvoice::new(
        business.id,
        &settings.bank_user,
        account,
        today,
        due,
        -to_euros(balance, conversion),
        settings.vat_rate,
        description,
    );
    invoices
        .create_invoice(&invoice)
        .inspect_err(|e| error!(%account, error = %e, "balance transferred but invoice not stored"))?;
    info!(
        %account,
        kind = invoice.kind.as_str(),
        total = %invoice.total(),
        "created reconciliation invoice"
    );

    let notified = settings.send_monthly_reset_invoice
        && notify_reset(business, &invoice, notifier, settings);

    Ok(ReconciliationOutcome::Reconciled {
        direction,
        balance,
        invoice,
        notified,
    })
}

fn notify_reset<N: ResetNotifier + ?Sized>(
    business: &Business,
    invoice: &ReconciliationInvoice,
    notifier: &mut N,
    settings: &ReconciliationSettings,
) -> bool {
    let contact_name = business
        .contact_name
        .clone()
        .or_else(|| business.account_holder.clone())
        .unwrap_or_else(|| business.name.clone());
    let notice = ResetNotice {
        business_id: business.id,
        ledger_account: business.ledger_account.clone(),
        contact_name,
        business_name: business.name.clone(),
        invoice_text: invoice.line.description.clone(),
        link_url: settings.invoice_list_url.clone(),
    };
    match notifier.notify(&notice) {
        Ok(()) => {
            info!(account = %business.ledger_account, "sent monthly reset notice");
            true
        }
        Err(e) => {
            warn!(account = %business.ledger_account, error = %e, "monthly reset notice not sent");
            false
        }
    }
}

/// Reconcile every business of the run, isolating failures per business.
///
/// Must only be called after the exported documents have been stored:
/// afterwards the balances they were built from no longer exist.
///
/// A business whose balance could not be read during classification is in
/// neither document. Its balance is left untouched and the classification
/// failure is reported as its entry.
pub fn reconcile_all<L, S, N>(
    classification: &Classification,
    ledger: &mut L,
    invoices: &mut S,
    notifier: &mut N,
    settings: &ReconciliationSettings,
    conversion: i64,
    today: NaiveDate,
) -> ReconciliationReport
where
    L: Ledger + ?Sized,
    S: InvoiceSink + ?Sized,
    N: ResetNotifier + ?Sized,
{
    let mut report = ReconciliationReport::default();

    for business in classification.businesses() {
        let result = match classification.ledger_failure(business.id) {
            Some(e) => {
                warn!(
                    account = %business.ledger_account,
                    error = %e,
                    "balance was not exported, leaving it untouched"
                );
                Err(ReconciliationError::Ledger(e.clone()))
            }
            None => reset_balance(
                business,
                &mut *ledger,
                &mut *invoices,
                &mut *notifier,
                settings,
                conversion,
                today,
            ),
        };

        if let Ok(ReconciliationOutcome::Reconciled { balance, .. }) = &result {
            let reconciled = to_euros(*balance, conversion);
            let exported = classification
                .exported_amount(business.id)
                .unwrap_or(Decimal::ZERO);
            if reconciled != exported {
                warn!(
                    business_id = business.id,
                    %exported,
                    %reconciled,
                    "reconciled balance differs from exported amount"
                );
                report.amount_mismatches.push(AmountMismatch {
                    business_id: business.id,
                    exported,
                    reconciled,
                });
            }
        }

        report.entries.push(ReconciliationEntry {
            business_id: business.id,
            ledger_account: business.ledger_account.clone(),
            result,
        });
    }

    info!(
        succeeded = report.succeeded(),
        failed = report.entries.len() - report.succeeded(),
        "balance reconciliation finished"
    );
    report
}
