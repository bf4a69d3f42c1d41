use chrono::NaiveDate;

use super::types::*;

/// Builder for [`Business`] profiles.
///
/// ```
/// use chrono::NaiveDate;
/// use sepa_export::core::*;
///
/// let business = BusinessBuilder::new(
///     7,
///     "Bakkerij de Vries",
///     "bakkerij",
///     AddressBuilder::new("Tilburg", "5038 AB", "NL").street("Heuvel 12").build(),
/// )
/// .account_holder("J. de Vries")
/// .iban("NL91ABNA0417164300")
/// .bic("ABNANL2A")
/// .mandate("MNDT-0007", NaiveDate::from_ymd_opt(2023, 11, 2).unwrap())
/// .build();
///
/// assert!(business.has_banking_details());
/// ```
pub struct BusinessBuilder {
    id: BusinessId,
    name: String,
    ledger_account: String,
    is_active: bool,
    contact_name: Option<String>,
    account_holder: Option<String>,
    iban: Option<String>,
    bic_code: Option<String>,
    mandate_id: Option<String>,
    signature_date: Option<NaiveDate>,
    address: PostalAddress,
    latest_payment_date: Option<NaiveDate>,
}

impl BusinessBuilder {
    pub fn new(
        id: BusinessId,
        name: impl Into<String>,
        ledger_account: impl Into<String>,
        address: PostalAddress,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            ledger_account: ledger_account.into(),
            is_active: true,
            contact_name: None,
            account_holder: None,
            iban: None,
            bic_code: None,
            mandate_id: None,
            signature_date: None,
            address,
            latest_payment_date: None,
        }
    }

    pub fn contact_name(mut self, name: impl Into<String>) -> Self {
        self.contact_name = Some(name.into());
        self
    }

    pub fn account_holder(mut self, holder: impl Into<String>) -> Self {
        self.account_holder = Some(holder.into());
        self
    }

    pub fn iban(mut self, iban: impl Into<String>) -> Self {
        self.iban = Some(iban.into());
        self
    }

    pub fn bic(mut self, bic: impl Into<String>) -> Self {
        self.bic_code = Some(bic.into());
        self
    }

    /// Set the direct debit mandate reference and its signature date.
    pub fn mandate(mut self, mandate_id: impl Into<String>, signed: NaiveDate) -> Self {
        self.mandate_id = Some(mandate_id.into());
        self.signature_date = Some(signed);
        self
    }

    pub fn latest_payment_date(mut self, date: NaiveDate) -> Self {
        self.latest_payment_date = Some(date);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn build(self) -> Business {
        Business {
            id: self.id,
            name: self.name,
            ledger_account: self.ledger_account,
            is_active: self.is_active,
            contact_name: self.contact_name,
            account_holder: self.account_holder,
            iban: self.iban,
            bic_code: self.bic_code,
            mandate_id: self.mandate_id,
            signature_date: self.signature_date,
            address: self.address,
            latest_payment_date: self.latest_payment_date,
        }
    }
}

/// Builder for [`PostalAddress`].
pub struct AddressBuilder {
    street: Option<String>,
    city: String,
    postal_code: String,
    country_code: String,
}

impl AddressBuilder {
    pub fn new(
        city: impl Into<String>,
        postal_code: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            street: None,
            city: city.into(),
            postal_code: postal_code.into(),
            country_code: country_code.into(),
        }
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn build(self) -> PostalAddress {
        PostalAddress {
            street: self.street.unwrap_or_default(),
            city: self.city,
            postal_code: self.postal_code,
            country_code: self.country_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> PostalAddress {
        AddressBuilder::new("Tilburg", "5021 LL", "NL")
            .street("Groenstraat 139")
            .build()
    }

    fn complete() -> BusinessBuilder {
        BusinessBuilder::new(1, "Fietsenmaker", "fiets", address())
            .account_holder("P. Jansen")
            .iban("NL91ABNA0417164300")
            .bic("ABNANL2A")
            .mandate("M-1", NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
    }

    #[test]
    fn complete_profile_has_banking_details() {
        let b = complete().build();
        assert!(b.has_banking_details());
        assert!(b.is_active);
        assert_eq!(
            b.address.address_line(),
            "Groenstraat 139, 5021 LL, Tilburg, NL"
        );
    }

    #[test]
    fn blank_fields_count_as_missing() {
        assert!(!complete().iban("").build().has_banking_details());
        assert!(!complete().bic("  ").build().has_banking_details());
        assert!(!complete().account_holder("").build().has_banking_details());

        let mut no_mandate = complete().build();
        no_mandate.mandate_id = None;
        assert!(!no_mandate.has_banking_details());

        let mut unsigned = complete().build();
        unsigned.signature_date = None;
        assert!(!unsigned.has_banking_details());
    }

    #[test]
    fn counterparty_requires_banking_details() {
        let b = complete().build();
        let cp = Counterparty::from_business(&b).unwrap();
        assert_eq!(cp.business_id, 1);
        assert_eq!(cp.bic, "ABNANL2A");
        assert_eq!(cp.mandate_id, "M-1");

        let incomplete = BusinessBuilder::new(2, "Kapper", "kapper", address()).build();
        assert!(Counterparty::from_business(&incomplete).is_none());
    }
}
