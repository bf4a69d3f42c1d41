use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Primary key of a business profile.
pub type BusinessId = u64;

/// A business profile as supplied by the member administration.
///
/// Only the fields the export needs are modelled. `latest_payment_date` is the
/// single field this crate writes back (see
/// [`Classification::record_payment_dates`](super::Classification::record_payment_dates)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    /// Display name, used as `Nm` of the counterparty.
    pub name: String,
    /// Account identifier (username) in the external ledger.
    pub ledger_account: String,
    /// Inactive users take no part in the export run.
    pub is_active: bool,
    /// Contact person addressed in notifications.
    #[serde(default)]
    pub contact_name: Option<String>,
    pub account_holder: Option<String>,
    pub iban: Option<String>,
    pub bic_code: Option<String>,
    /// SEPA direct debit mandate reference (`MndtId`).
    pub mandate_id: Option<String>,
    /// Date the mandate was signed (`DtOfSgntr`).
    pub signature_date: Option<NaiveDate>,
    pub address: PostalAddress,
    /// Last period end for which a direct debit was issued. `None` means the
    /// next debit is the first one (`FRST`).
    pub latest_payment_date: Option<NaiveDate>,
}

impl Business {
    /// True when IBAN, BIC, mandate id, signature date and account holder are
    /// all present and non-blank.
    pub fn has_banking_details(&self) -> bool {
        filled(&self.iban)
            && filled(&self.bic_code)
            && filled(&self.mandate_id)
            && self.signature_date.is_some()
            && filled(&self.account_holder)
    }
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Postal address of a business profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    /// Street and house number.
    pub street: String,
    pub postal_code: String,
    pub city: String,
    /// ISO 3166-1 alpha-2.
    pub country_code: String,
}

impl PostalAddress {
    /// Single free-text `AdrLine`: `"street, postcode, city, country"`.
    pub fn address_line(&self) -> String {
        format!(
            "{}, {}, {}, {}",
            self.street, self.postal_code, self.city, self.country_code
        )
    }
}

/// Banking identity of an eligible business.
///
/// Only constructed from a [`Business`] that passes
/// [`Business::has_banking_details`], so the SEPA fields are never missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub business_id: BusinessId,
    pub name: String,
    pub ledger_account: String,
    pub account_holder: String,
    pub iban: String,
    pub bic: String,
    pub mandate_id: String,
    pub signature_date: NaiveDate,
    pub address: PostalAddress,
    pub latest_payment_date: Option<NaiveDate>,
}

impl Counterparty {
    pub fn from_business(business: &Business) -> Option<Self> {
        if !business.has_banking_details() {
            return None;
        }
        Some(Self {
            business_id: business.id,
            name: business.name.clone(),
            ledger_account: business.ledger_account.clone(),
            account_holder: business.account_holder.clone()?,
            iban: business.iban.clone()?,
            bic: business.bic_code.clone()?,
            mandate_id: business.mandate_id.clone()?,
            signature_date: business.signature_date?,
            address: business.address.clone(),
            latest_payment_date: business.latest_payment_date,
        })
    }
}
