use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// A booked ledger transfer as seen from one member account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Signed amount in minor units; positive means received.
    pub amount: i64,
    pub description: String,
    pub created: NaiveDateTime,
}

/// The community-currency ledger holding every business's balance.
///
/// Calls are synchronous and have no retry logic; callers isolate failures
/// per business.
pub trait Ledger {
    /// Current balance of a member account in minor units.
    fn account_balance(&self, account: &str) -> Result<i64, LedgerError>;

    /// Transfers of a member account booked between `from` and `to`
    /// (inclusive), oldest first.
    fn transactions(
        &self,
        account: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LedgerTransaction>, LedgerError>;

    /// Move `amount` minor units from the member to the system reserve.
    fn to_system_payment(
        &mut self,
        account: &str,
        amount: i64,
        description: &str,
        transfer_type_id: u32,
    ) -> Result<(), LedgerError>;

    /// Move `amount` minor units from the system reserve to the member.
    fn from_system_payment(
        &mut self,
        account: &str,
        amount: i64,
        description: &str,
        transfer_type_id: u32,
    ) -> Result<(), LedgerError>;
}

/// A transfer booked against the reserve by [`MemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTransfer {
    pub account: String,
    /// Positive: into the reserve. Negative: out of the reserve.
    pub amount: i64,
    pub description: String,
    pub transfer_type_id: u32,
}

#[derive(Debug, Clone, Default)]
struct MemoryAccount {
    balance: i64,
    history: Vec<LedgerTransaction>,
}

/// In-process ledger for tests, demos and dry runs.
///
/// The reserve account is unlimited unless [`with_reserve`](Self::with_reserve)
/// bounds it, in which case payouts beyond its funds fail with
/// [`LedgerError::Transaction`].
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    accounts: HashMap<String, MemoryAccount>,
    reserve: Option<i64>,
    now: NaiveDateTime,
    transfers: Vec<SystemTransfer>,
}

impl MemoryLedger {
    /// Booking timestamp for transfers made through this ledger.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            accounts: HashMap::new(),
            reserve: None,
            now,
            transfers: Vec::new(),
        }
    }

    /// Open an account with a starting balance and no history.
    pub fn with_account(mut self, account: impl Into<String>, balance: i64) -> Self {
        self.accounts.insert(
            account.into(),
            MemoryAccount {
                balance,
                history: Vec::new(),
            },
        );
        self
    }

    /// Bound the reserve to `funds` minor units.
    pub fn with_reserve(mut self, funds: i64) -> Self {
        self.reserve = Some(funds);
        self
    }

    /// Book a historic transfer on an account, adjusting its balance.
    pub fn record(
        &mut self,
        account: &str,
        amount: i64,
        description: impl Into<String>,
        created: NaiveDateTime,
    ) {
        let entry = self.accounts.entry(account.to_string()).or_default();
        entry.balance += amount;
        entry.history.push(LedgerTransaction {
            amount,
            description: description.into(),
            created,
        });
    }

    pub fn set_balance(&mut self, account: &str, balance: i64) {
        self.accounts.entry(account.to_string()).or_default().balance = balance;
    }

    /// Remaining reserve funds, `None` when unlimited.
    pub fn reserve(&self) -> Option<i64> {
        self.reserve
    }

    /// Every reserve transfer made through the [`Ledger`] interface.
    pub fn transfers(&self) -> &[SystemTransfer] {
        &self.transfers
    }

    fn account_mut(&mut self, account: &str) -> Result<&mut MemoryAccount, LedgerError> {
        self.accounts
            .get_mut(account)
            .ok_or_else(|| LedgerError::MemberNotFound(account.to_string()))
    }

    fn book(
        &mut self,
        account: &str,
        delta: i64,
        description: &str,
        transfer_type_id: u32,
    ) -> Result<(), LedgerError> {
        if let Some(reserve) = self.reserve {
            if reserve + delta < 0 {
                return Err(LedgerError::Transaction(format!(
                    "insufficient reserve funds: {reserve} available, {} requested",
                    -delta
                )));
            }
        }
        let now = self.now;
        let acct = self.account_mut(account)?;
        acct.balance -= delta;
        acct.history.push(LedgerTransaction {
            amount: -delta,
            description: description.to_string(),
            created: now,
        });
        if let Some(reserve) = self.reserve.as_mut() {
            *reserve += delta;
        }
        self.transfers.push(SystemTransfer {
            account: account.to_string(),
            amount: delta,
            description: description.to_string(),
            transfer_type_id,
        });
        Ok(())
    }
}

impl Ledger for MemoryLedger {
    fn account_balance(&self, account: &str) -> Result<i64, LedgerError> {
        self.accounts
            .get(account)
            .map(|a| a.balance)
            .ok_or_else(|| LedgerError::MemberNotFound(account.to_string()))
    }

    fn transactions(
        &self,
        account: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LedgerTransaction>, LedgerError> {
        let acct = self
            .accounts
            .get(account)
            .ok_or_else(|| LedgerError::MemberNotFound(account.to_string()))?;
        let mut found: Vec<_> = acct
            .history
            .iter()
            .filter(|t| {
                let day = t.created.date();
                day >= from && day <= to
            })
            .cloned()
            .collect();
        found.sort_by_key(|t| t.created);
        Ok(found)
    }

    fn to_system_payment(
        &mut self,
        account: &str,
        amount: i64,
        description: &str,
        transfer_type_id: u32,
    ) -> Result<(), LedgerError> {
        self.account_mut(account)?;
        self.book(account, amount, description, transfer_type_id)
    }

    fn from_system_payment(
        &mut self,
        account: &str,
        amount: i64,
        description: &str,
        transfer_type_id: u32,
    ) -> Result<(), LedgerError> {
        self.account_mut(account)?;
        self.book(account, -amount, description, transfer_type_id)
    }
}
