//! Scheduled monthly export.
//!
//! Settles the previous calendar month: classify, build and verify both
//! documents, store them, record payment dates and finally reconcile. If a
//! document cannot be stored, nothing is reconciled and the ledger balances
//! stay available for a retry.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{error, info, warn};

use crate::core::{
    Business, BusinessId, Classification, ExportError, InvoiceSink, Ledger, ReconciliationReport,
    ResetNotifier, SepaExportConfig, previous_month,
};
use crate::exporter::SepaExporter;
use crate::pain::{DocumentSummary, verify_document};

/// The two documents of a monthly run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    /// pain.001 payouts
    Credit,
    /// pain.008 collections
    Debit,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `2024-05-01_debit.xml`
pub fn export_file_name(date_from: NaiveDate, kind: DocumentKind) -> String {
    format!("{}_{}.xml", date_from.format("%Y-%m-%d"), kind)
}

/// Durable storage for exported documents.
pub trait DocumentStore {
    fn store(&mut self, file_name: &str, contents: &str) -> Result<(), ExportError>;
}

/// Writes documents into a directory, creating it when missing.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentStore for DirectoryStore {
    fn store(&mut self, file_name: &str, contents: &str) -> Result<(), ExportError> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(file_name);
        fs::write(&path, contents)?;
        info!(path = %path.display(), bytes = contents.len(), "stored SEPA document");
        Ok(())
    }
}

impl DocumentStore for BTreeMap<String, String> {
    fn store(&mut self, file_name: &str, contents: &str) -> Result<(), ExportError> {
        self.insert(file_name.to_string(), contents.to_string());
        Ok(())
    }
}

/// A document that was verified and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub kind: DocumentKind,
    pub file_name: String,
    /// First day of the exported period.
    pub file_date: NaiveDate,
    /// When the run generated the document.
    pub generated: NaiveDateTime,
    pub summary: DocumentSummary,
}

/// Everything a monthly run did.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub classification: Classification,
    pub documents: Vec<StoredDocument>,
    /// Businesses whose `latest_payment_date` was set; persist them.
    pub updated_businesses: Vec<BusinessId>,
    pub reconciliation: ReconciliationReport,
}

/// Export and settle the month before `now`.
///
/// Only one run per period may execute at a time; the scheduler enforces it.
pub fn run_monthly_export<L, S, N, D>(
    config: SepaExportConfig,
    ledger: &mut L,
    businesses: &mut [Business],
    invoices: &mut S,
    notifier: &mut N,
    store: &mut D,
    now: NaiveDateTime,
) -> Result<ExportOutcome, ExportError>
where
    L: Ledger + ?Sized,
    S: InvoiceSink + ?Sized,
    N: ResetNotifier + ?Sized,
    D: DocumentStore + ?Sized,
{
    let (date_from, date_to) = previous_month(now.date());
    info!(%date_from, %date_to, "starting monthly SEPA export");

    let exporter = SepaExporter::with_timestamp(config, date_from, date_to, now)?;
    let classification = exporter.classify(&*ledger, businesses)?;

    let mut pending = Vec::new();
    if classification.credit.is_empty() {
        info!("no credit balances, skipping credit transfer document");
    } else {
        pending.push((DocumentKind::Credit, exporter.build_direct_credit_xml(&classification)?));
    }
    if classification.debit_count() == 0 {
        info!("no debit balances, skipping direct debit document");
    } else {
        pending.push((DocumentKind::Debit, exporter.build_direct_debit_xml(&classification)?));
    }

    let mut verified = Vec::with_capacity(pending.len());
    for (kind, xml) in pending {
        let summary = verify_document(&xml)
            .inspect_err(|e| error!(%kind, error = %e, "generated document failed verification"))?;
        verified.push((kind, xml, summary));
    }

    let mut documents = Vec::with_capacity(verified.len());
    for (kind, xml, summary) in verified {
        let file_name = export_file_name(date_from, kind);
        store.store(&file_name, &xml).inspect_err(|e| {
            error!(%file_name, error = %e, "cannot store document, balances are not reconciled")
        })?;
        documents.push(StoredDocument {
            kind,
            file_name,
            file_date: date_from,
            generated: now,
            summary,
        });
    }

    let updated_businesses = classification.record_payment_dates(businesses);
    let reconciliation = exporter.reconcile(&classification, ledger, invoices, notifier, now.date());

    for entry in reconciliation.failures() {
        if let Err(e) = &entry.result {
            warn!(
                business_id = entry.business_id,
                account = %entry.ledger_account,
                error = %e,
                "balance not reconciled"
            );
        }
    }
    info!(
        documents = documents.len(),
        reconciled = reconciliation.succeeded(),
        "monthly SEPA export finished"
    );

    Ok(ExportOutcome {
        date_from,
        date_to,
        classification,
        documents,
        updated_businesses,
        reconciliation,
    })
}
