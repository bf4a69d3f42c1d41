//! The monthly export run: classify, build both documents, reconcile.

use chrono::{Days, Local, NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use tracing::{debug, error, info};

use crate::core::{
    Business, BusinessId, Classification, ClassifiedPayment, ExportError, InvoiceSink, Ledger,
    ReconciliationReport, ResetNotifier, SepaExportConfig, classify_balances, reconcile_all,
};
use crate::pain::{
    self, CreditTransferDocument, DirectDebitDocument, GroupHeader, MAX_IDENTIFIER_LEN,
    SequenceType, TIMESTAMP_FORMAT, XmlResult,
};

/// One export run over the period `date_from..=date_to`.
///
/// Construction validates settings and dates and nothing else. The run is
/// driven by the caller:
///
/// 1. [`classify`](Self::classify) the ledger balances
/// 2. build and store both documents
/// 3. [`Classification::record_payment_dates`] and persist the businesses
/// 4. [`reconcile`](Self::reconcile), only after the documents are stored
///
/// At most one run per period may be in flight; nothing here guards against
/// two overlapping runs paying out the same balance twice.
#[derive(Debug, Clone)]
pub struct SepaExporter {
    config: SepaExportConfig,
    date_from: NaiveDate,
    date_to: NaiveDate,
    timestamp: NaiveDateTime,
    collection_date: NaiveDate,
    description: String,
    end_to_end_id: String,
}

impl SepaExporter {
    pub fn new(
        config: SepaExportConfig,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Self, ExportError> {
        let now = Local::now().naive_local();
        let now = now.with_nanosecond(0).unwrap_or(now);
        Self::with_timestamp(config, date_from, date_to, now)
    }

    /// Like [`new`](Self::new) with a fixed creation timestamp.
    pub fn with_timestamp(
        config: SepaExportConfig,
        date_from: NaiveDate,
        date_to: NaiveDate,
        timestamp: NaiveDateTime,
    ) -> Result<Self, ExportError> {
        config.validate()?;

        let description = format!(
            "{} {}",
            config.initiating_business,
            timestamp.format(TIMESTAMP_FORMAT)
        );
        if description.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(ExportError::Configuration(format!(
                "description length (initiating business + timestamp) is too long: \
                 {description:?} exceeds {MAX_IDENTIFIER_LEN} characters"
            )));
        }

        if date_to < date_from {
            error!(%date_from, %date_to, "final date cannot be before initial date");
            return Err(ExportError::InvalidDateRange {
                from: date_from,
                to: date_to,
            });
        }

        let collection_date = u64::try_from(config.collection_offset_days)
            .ok()
            .and_then(|days| timestamp.date().checked_add_days(Days::new(days)))
            .ok_or_else(|| {
                ExportError::Configuration(format!(
                    "collection date out of range: {} + {} days",
                    timestamp.date(),
                    config.collection_offset_days
                ))
            })?;

        let end_to_end_id = format!("{} {}", config.end_to_end_id, date_from.format("%m/%Y"));

        debug!(%description, %end_to_end_id, "SEPA exporter ready");
        Ok(Self {
            config,
            date_from,
            date_to,
            timestamp,
            collection_date,
            description,
            end_to_end_id,
        })
    }

    pub fn config(&self) -> &SepaExportConfig {
        &self.config
    }

    pub fn date_from(&self) -> NaiveDate {
        self.date_from
    }

    pub fn date_to(&self) -> NaiveDate {
        self.date_to
    }

    /// `"{initiating business} {timestamp}"`, used as `PmtInfId`.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// `"{END_TO_END_ID} {MM/YYYY}"` of the period start.
    pub fn end_to_end_id(&self) -> &str {
        &self.end_to_end_id
    }

    /// Unique `EndToEndId` of a business's transaction.
    pub fn transaction_description(&self, business_id: BusinessId) -> String {
        format!("{} - {}", self.end_to_end_id, business_id)
    }

    /// Requested collection or execution date.
    pub fn collection_date(&self) -> NaiveDate {
        self.collection_date
    }

    /// Group header; the initiating party defaults to the run description.
    pub fn sepa_header(
        &self,
        checksum: Decimal,
        operations: usize,
        initiating_business: Option<&str>,
    ) -> GroupHeader {
        let initiating = initiating_business.unwrap_or(self.description.as_str());
        pain::sepa_header(checksum, operations, initiating, self.timestamp)
    }

    /// Classify the current ledger balances. Reads only.
    pub fn classify<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        businesses: &[Business],
    ) -> Result<Classification, ExportError> {
        classify_balances(
            ledger,
            businesses,
            self.date_from,
            self.date_to,
            self.config.currency_conversion,
        )
    }

    /// Typed pain.001 document paying out every credit balance.
    pub fn credit_transfer_document(&self, classification: &Classification) -> CreditTransferDocument {
        let transactions = classification
            .credit
            .values()
            .map(|p| {
                pain::credit_transaction(
                    &p.counterparty,
                    p.amount,
                    self.transaction_description(p.counterparty.business_id),
                    &self.config.remittance_information,
                )
            })
            .collect();
        let payment_info = pain::credit_payments_info(
            &self.description,
            self.collection_date(),
            &self.config.debtor,
            transactions,
        );
        CreditTransferDocument {
            header: self.sepa_header(classification.total_credit(), classification.credit.len(), None),
            payment_info,
        }
    }

    /// Typed pain.008 document: one `FRST` block per first-time debtor,
    /// then one shared `RCUR` block when there are recurring debtors.
    pub fn direct_debit_document(&self, classification: &Classification) -> DirectDebitDocument {
        let mut payment_infos: Vec<_> = classification
            .debit_first
            .values()
            .map(|p| self.debit_block(SequenceType::First, std::slice::from_ref(p)))
            .collect();

        if !classification.debit_recurring.is_empty() {
            let recurring: Vec<ClassifiedPayment> =
                classification.debit_recurring.values().cloned().collect();
            payment_infos.push(self.debit_block(SequenceType::Recurring, &recurring));
        }

        DirectDebitDocument {
            header: self.sepa_header(classification.total_debit(), classification.debit_count(), None),
            payment_infos,
        }
    }

    fn debit_block(
        &self,
        sequence_type: SequenceType,
        payments: &[ClassifiedPayment],
    ) -> pain::DirectDebitPaymentInfo {
        let transactions = payments
            .iter()
            .map(|p| {
                pain::debit_transaction(
                    &p.counterparty,
                    p.amount,
                    self.transaction_description(p.counterparty.business_id),
                    &self.config.remittance_information,
                )
            })
            .collect();
        pain::debit_payments_info(
            &self.description,
            sequence_type,
            self.collection_date(),
            &self.config.creditor,
            transactions,
        )
    }

    /// Serialized pain.001.001.03 credit transfer document.
    pub fn build_direct_credit_xml(&self, classification: &Classification) -> XmlResult {
        let doc = self.credit_transfer_document(classification);
        info!(
            transactions = doc.header.number_of_operations,
            checksum = %doc.header.checksum,
            "building SEPA credit transfer document"
        );
        pain::to_pain_001_xml(&doc)
    }

    /// Serialized pain.008.001.02 direct debit document.
    pub fn build_direct_debit_xml(&self, classification: &Classification) -> XmlResult {
        let doc = self.direct_debit_document(classification);
        info!(
            transactions = doc.header.number_of_operations,
            blocks = doc.payment_infos.len(),
            checksum = %doc.header.checksum,
            "building SEPA direct debit document"
        );
        pain::to_pain_008_xml(&doc)
    }

    /// Reset every business of the run to a zero balance.
    ///
    /// Call only after both documents have been durably stored.
    pub fn reconcile<L, S, N>(
        &self,
        classification: &Classification,
        ledger: &mut L,
        invoices: &mut S,
        notifier: &mut N,
        today: NaiveDate,
    ) -> ReconciliationReport
    where
        L: Ledger + ?Sized,
        S: InvoiceSink + ?Sized,
        N: ResetNotifier + ?Sized,
    {
        reconcile_all(
            classification,
            ledger,
            invoices,
            notifier,
            &self.config.reconciliation,
            self.config.currency_conversion,
            today,
        )
    }
}
