use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::error::{ExportError, LedgerError};
use super::invoice::to_euros;
use super::ledger::Ledger;
use super::types::{Business, BusinessId, Counterparty};

/// One classified balance: who, and how many euros (always positive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPayment {
    pub counterparty: Counterparty,
    pub amount: Decimal,
}

/// Why a business contributes no line to this run's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// IBAN, BIC, mandate, signature date or account holder missing.
    MissingBankDetails,
    /// The ledger does not know the business's account.
    MemberNotFound,
    /// Balance is zero, or less than half a cent.
    ZeroBalance,
    /// The ledger reported a balance whose magnitude does not fit in `i64`.
    BalanceOutOfRange(i64),
    /// Any other ledger failure.
    Ledger(LedgerError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBusiness {
    pub business_id: BusinessId,
    pub reason: SkipReason,
}

/// Result of classifying every active business's balance for one period.
///
/// Buckets are keyed by business id so document order is stable between runs.
/// A business appears in at most one bucket.
#[derive(Debug, Clone)]
pub struct Classification {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Businesses with a positive balance: they are paid out.
    pub credit: BTreeMap<BusinessId, ClassifiedPayment>,
    /// Negative balance, never debited before (`FRST`).
    pub debit_first: BTreeMap<BusinessId, ClassifiedPayment>,
    /// Negative balance, debited in an earlier period (`RCUR`).
    pub debit_recurring: BTreeMap<BusinessId, ClassifiedPayment>,
    pub skipped: Vec<SkippedBusiness>,
    businesses: Vec<Business>,
}

impl Classification {
    /// Active businesses taking part in the run, including skipped ones.
    pub fn businesses(&self) -> &[Business] {
        &self.businesses
    }

    pub fn total_credit(&self) -> Decimal {
        sum(&self.credit)
    }

    pub fn total_debit_first(&self) -> Decimal {
        sum(&self.debit_first)
    }

    pub fn total_debit_recurring(&self) -> Decimal {
        sum(&self.debit_recurring)
    }

    pub fn total_debit(&self) -> Decimal {
        self.total_debit_first() + self.total_debit_recurring()
    }

    pub fn debit_count(&self) -> usize {
        self.debit_first.len() + self.debit_recurring.len()
    }

    /// Debit amount of a business from either sequence bucket.
    pub fn debit_amount(&self, id: BusinessId) -> Option<Decimal> {
        self.debit_first
            .get(&id)
            .or_else(|| self.debit_recurring.get(&id))
            .map(|p| p.amount)
    }

    /// The ledger failure that kept a business out of the documents, if any.
    ///
    /// Member-not-found is not included: reconciliation reports it anyway.
    pub fn ledger_failure(&self, id: BusinessId) -> Option<&LedgerError> {
        self.skipped.iter().find_map(|s| match &s.reason {
            SkipReason::Ledger(e) if s.business_id == id => Some(e),
            _ => None,
        })
    }

    /// Signed EUR amount exported for a business: positive when paid out,
    /// negative when debited, `None` when it is in no document.
    pub fn exported_amount(&self, id: BusinessId) -> Option<Decimal> {
        self.credit
            .get(&id)
            .map(|p| p.amount)
            .or_else(|| self.debit_amount(id).map(|a| -a))
    }

    /// Set `latest_payment_date = date_to` on every debited business.
    ///
    /// Not idempotent: once recorded, the next classification puts these
    /// businesses into `RCUR` whether or not a document was ever sent.
    /// Returns the ids that were updated; the caller persists them.
    pub fn record_payment_dates(&self, businesses: &mut [Business]) -> Vec<BusinessId> {
        let mut updated = Vec::new();
        for business in businesses.iter_mut() {
            if self.debit_amount(business.id).is_some() {
                business.latest_payment_date = Some(self.date_to);
                updated.push(business.id);
            }
        }
        debug!(count = updated.len(), date = %self.date_to, "recorded latest payment dates");
        updated
    }
}

fn sum(bucket: &BTreeMap<BusinessId, ClassifiedPayment>) -> Decimal {
    bucket.values().map(|p| p.amount).sum()
}

/// Query the ledger for every active business and sort it into the credit
/// or one of the debit buckets.
///
/// Read-only: neither the ledger nor the businesses are modified. Failures
/// for a single business are logged and recorded in
/// [`Classification::skipped`]; they never abort the run.
pub fn classify_balances<L: Ledger + ?Sized>(
    ledger: &L,
    businesses: &[Business],
    date_from: NaiveDate,
    date_to: NaiveDate,
    conversion: i64,
) -> Result<Classification, ExportError> {
    if date_to < date_from {
        error!(%date_from, %date_to, "final date cannot be before initial date");
        return Err(ExportError::InvalidDateRange {
            from: date_from,
            to: date_to,
        });
    }
    if conversion <= 0 {
        return Err(ExportError::Configuration(format!(
            "currency conversion must be positive, got {conversion}"
        )));
    }

    let active: Vec<Business> = businesses.iter().filter(|b| b.is_active).cloned().collect();
    if active.is_empty() {
        error!("no business profiles available, no SEPA transfers can be exported");
        return Err(ExportError::NoBusinesses);
    }

    let mut result = Classification {
        date_from,
        date_to,
        credit: BTreeMap::new(),
        debit_first: BTreeMap::new(),
        debit_recurring: BTreeMap::new(),
        skipped: Vec::new(),
        businesses: Vec::new(),
    };

    for business in &active {
        let skip = |reason| SkippedBusiness {
            business_id: business.id,
            reason,
        };

        let Some(counterparty) = Counterparty::from_business(business) else {
            debug!(business_id = business.id, "skipping business without bank details");
            result.skipped.push(skip(SkipReason::MissingBankDetails));
            continue;
        };

        let balance = match ledger.account_balance(&business.ledger_account) {
            Ok(balance) => balance,
            Err(LedgerError::MemberNotFound(account)) => {
                error!(%account, "member not found in ledger");
                result.skipped.push(skip(SkipReason::MemberNotFound));
                continue;
            }
            Err(e) => {
                warn!(account = %business.ledger_account, error = %e, "balance query failed");
                result.skipped.push(skip(SkipReason::Ledger(e)));
                continue;
            }
        };

        if balance == 0 {
            result.skipped.push(skip(SkipReason::ZeroBalance));
            continue;
        }

        let Some(magnitude) = balance.checked_abs() else {
            warn!(account = %business.ledger_account, balance, "balance out of range");
            result.skipped.push(skip(SkipReason::BalanceOutOfRange(balance)));
            continue;
        };
        let amount = to_euros(magnitude, conversion);
        if amount.is_zero() {
            debug!(business_id = business.id, balance, "balance rounds to zero euros");
            result.skipped.push(skip(SkipReason::ZeroBalance));
            continue;
        }
        let payment = ClassifiedPayment {
            counterparty,
            amount,
        };
        if balance > 0 {
            result.credit.insert(business.id, payment);
        } else if business.latest_payment_date.is_none() {
            result.debit_first.insert(business.id, payment);
        } else {
            result.debit_recurring.insert(business.id, payment);
        }
    }

    info!(
        credit = result.credit.len(),
        debit_first = result.debit_first.len(),
        debit_recurring = result.debit_recurring.len(),
        skipped = result.skipped.len(),
        "classified business balances"
    );

    result.businesses = active;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AddressBuilder, BusinessBuilder, MemoryLedger};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn business(id: BusinessId, account: &str) -> BusinessBuilder {
        BusinessBuilder::new(
            id,
            format!("Business {id}"),
            account,
            AddressBuilder::new("Tilburg", "5021 LL", "NL")
                .street("Heuvel 1")
                .build(),
        )
        .account_holder("Holder")
        .iban("NL91ABNA0417164300")
        .bic("ABNANL2A")
        .mandate(format!("M-{id}"), date(2023, 1, 1))
    }

    fn ledger() -> MemoryLedger {
        MemoryLedger::new(date(2024, 6, 1).and_hms_opt(0, 0, 0).unwrap())
    }

    #[test]
    fn sign_decides_bucket() {
        let ledger = ledger()
            .with_account("a", 150)
            .with_account("b", -50)
            .with_account("c", 200);
        let businesses = vec![
            business(1, "a").build(),
            business(2, "b").build(),
            business(3, "c").build(),
        ];

        let c = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
            .unwrap();

        assert_eq!(c.credit.len(), 2);
        assert_eq!(c.credit[&1].amount, dec!(1.50));
        assert_eq!(c.credit[&3].amount, dec!(2.00));
        assert_eq!(c.debit_first[&2].amount, dec!(0.50));
        assert!(c.debit_recurring.is_empty());
        assert_eq!(c.total_credit(), dec!(3.50));
        assert_eq!(c.total_debit(), dec!(0.50));
        assert_eq!(c.exported_amount(2), Some(dec!(-0.50)));
    }

    #[test]
    fn prior_payment_means_recurring() {
        let ledger = ledger().with_account("b", -1234);
        let businesses = vec![business(2, "b").latest_payment_date(date(2024, 4, 30)).build()];

        let c = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
            .unwrap();
        assert!(c.debit_first.is_empty());
        assert_eq!(c.debit_recurring[&2].amount, dec!(12.34));
        assert_eq!(c.total_debit_recurring(), dec!(12.34));
    }

    #[test]
    fn classification_does_not_touch_businesses() {
        let ledger = ledger().with_account("b", -50);
        let businesses = vec![business(2, "b").build()];
        classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100).unwrap();
        assert_eq!(businesses[0].latest_payment_date, None);
    }

    #[test]
    fn skip_reasons() {
        let ledger = ledger().with_account("zero", 0).with_account("nobank", 500);
        let businesses = vec![
            business(1, "zero").build(),
            business(2, "ghost").build(),
            BusinessBuilder::new(3, "No bank", "nobank", Default::default()).build(),
            business(4, "inactive").inactive().build(),
        ];

        let c = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
            .unwrap();
        assert!(c.credit.is_empty() && c.debit_count() == 0);
        assert_eq!(
            c.skipped,
            vec![
                SkippedBusiness { business_id: 1, reason: SkipReason::ZeroBalance },
                SkippedBusiness { business_id: 2, reason: SkipReason::MemberNotFound },
                SkippedBusiness { business_id: 3, reason: SkipReason::MissingBankDetails },
            ]
        );
        assert_eq!(c.businesses().len(), 3);
    }

    #[test]
    fn extreme_balance_is_skipped() {
        let ledger = ledger().with_account("min", i64::MIN).with_account("max", i64::MAX);
        let businesses = vec![business(1, "min").build(), business(2, "max").build()];

        let c = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
            .unwrap();
        assert_eq!(
            c.skipped,
            vec![SkippedBusiness {
                business_id: 1,
                reason: SkipReason::BalanceOutOfRange(i64::MIN),
            }]
        );
        assert!(c.credit.contains_key(&2));
        assert_eq!(c.exported_amount(1), None);
    }

    #[test]
    fn inverted_dates_rejected() {
        let ledger = ledger();
        let businesses = vec![business(1, "a").build()];
        let err = classify_balances(&ledger, &businesses, date(2024, 3, 1), date(2024, 2, 1), 100)
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidDateRange { .. }));
    }

    #[test]
    fn no_active_businesses_rejected() {
        let ledger = ledger();
        let businesses = vec![business(1, "a").inactive().build()];
        let err = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
            .unwrap_err();
        assert!(matches!(err, ExportError::NoBusinesses));
    }

    #[test]
    fn recording_payment_dates_moves_first_to_recurring() {
        let ledger = ledger().with_account("a", 300).with_account("b", -50);
        let mut businesses = vec![business(1, "a").build(), business(2, "b").build()];

        let first = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
            .unwrap();
        assert!(first.debit_first.contains_key(&2));

        assert_eq!(first.record_payment_dates(&mut businesses), vec![2]);
        assert_eq!(businesses[0].latest_payment_date, None);
        assert_eq!(businesses[1].latest_payment_date, Some(date(2024, 5, 31)));

        let second = classify_balances(&ledger, &businesses, date(2024, 5, 1), date(2024, 5, 31), 100)
            .unwrap();
        assert!(second.debit_first.is_empty());
        assert!(second.debit_recurring.contains_key(&2));
    }
}
