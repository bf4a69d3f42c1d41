use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::ExportError;

/// Settings for a SEPA export run.
///
/// Deserializes from the same shape as the platform's `SEPA_SETTINGS` block:
///
/// ```
/// use sepa_export::core::SepaExportConfig;
///
/// let config = SepaExportConfig::from_json(r#"{
///     "INITIATING_BUSINESS": "Positoos B.V.",
///     "END_TO_END_ID": "Saldo Positoos",
///     "CREDITOR": {
///         "NAME": "Positoos B.V., Administratie", "IBAN": "NL15RABO0154443476",
///         "BIC": "RABONL2U", "ULTIMATE_CREDITOR": "Rabobank",
///         "IDENTIFIER": "NL66ZZZ172728960000", "COUNTRY": "NL",
///         "STREET_NUMBER": "Groenstraat 139/155", "POSTCODE_CITY": "5021LL Tilburg"
///     },
///     "DEBTOR": {
///         "NAME": "Positoos B.V., Administratie", "IBAN": "NL15RABO0154443476",
///         "BIC": "RABONL2U", "ULTIMATE_DEBTOR": "Rabobank",
///         "IDENTIFIER": "NL66ZZZ172728960000", "COUNTRY": "NL",
///         "STREET_NUMBER": "Groenstraat 139/155", "POSTCODE_CITY": "5021LL Tilburg"
///     }
/// }"#).unwrap();
///
/// assert_eq!(config.currency_conversion, 100);
/// assert_eq!(config.reconciliation.credit_transfer_type_id, 36);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SepaExportConfig {
    /// Name of the party initiating the payments; prefix of `PmtInfId`.
    #[serde(default)]
    pub initiating_business: String,
    /// Prefix of every `EndToEndId`.
    #[serde(default)]
    pub end_to_end_id: String,
    /// Identity used as `Cdtr` in direct debit documents.
    #[serde(default, with = "creditor_block")]
    pub creditor: PartySettings,
    /// Identity used as `Dbtr` in credit transfer documents.
    #[serde(default, with = "debtor_block")]
    pub debtor: PartySettings,
    /// Ledger minor units per euro.
    #[serde(default = "default_currency_conversion")]
    pub currency_conversion: i64,
    /// Days between the export and the requested collection/execution date.
    #[serde(default = "default_collection_offset_days")]
    pub collection_offset_days: i64,
    /// Unstructured remittance text (`RmtInf/Ustrd`) on every transaction.
    #[serde(default = "default_remittance_information")]
    pub remittance_information: String,
    #[serde(default)]
    pub reconciliation: ReconciliationSettings,
}

/// Largest accepted `COLLECTION_OFFSET_DAYS` and `INVOICE_DAYS_DUE`.
pub const MAX_DAY_OFFSET: i64 = 365;

/// Name, account and address of the platform's own bank account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PartySettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bic: String,
    #[serde(default)]
    pub iban: String,
    /// Creditor scheme identifier (`CdtrSchmeId`).
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub street_number: String,
    #[serde(default)]
    pub postcode_city: String,
    /// `ULTIMATE_CREDITOR` in the creditor block, `ULTIMATE_DEBTOR` in the
    /// debtor block.
    #[serde(skip)]
    pub ultimate_party: String,
}

/// Wire shape of the `CREDITOR` block.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct CreditorBlock {
    #[serde(flatten)]
    party: PartySettings,
    #[serde(default)]
    ultimate_creditor: String,
}

/// Wire shape of the `DEBTOR` block.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct DebtorBlock {
    #[serde(flatten)]
    party: PartySettings,
    #[serde(default)]
    ultimate_debtor: String,
}

mod creditor_block {
    use super::*;

    pub fn serialize<S: Serializer>(party: &PartySettings, serializer: S) -> Result<S::Ok, S::Error> {
        CreditorBlock {
            party: party.clone(),
            ultimate_creditor: party.ultimate_party.clone(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PartySettings, D::Error> {
        let block = CreditorBlock::deserialize(deserializer)?;
        Ok(PartySettings {
            ultimate_party: block.ultimate_creditor,
            ..block.party
        })
    }
}

mod debtor_block {
    use super::*;

    pub fn serialize<S: Serializer>(party: &PartySettings, serializer: S) -> Result<S::Ok, S::Error> {
        DebtorBlock {
            party: party.clone(),
            ultimate_debtor: party.ultimate_party.clone(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PartySettings, D::Error> {
        let block = DebtorBlock::deserialize(deserializer)?;
        Ok(PartySettings {
            ultimate_party: block.ultimate_debtor,
            ..block.party
        })
    }
}

/// Ledger transfer types and invoice parameters for balance reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ReconciliationSettings {
    /// Transfer type for moving currency from the reserve to a business.
    pub debit_transfer_type_id: u32,
    pub debit_transfer_description: String,
    /// Transfer type for taking a business's currency out of circulation.
    pub credit_transfer_type_id: u32,
    pub credit_transfer_description: String,
    pub invoice_days_due: i64,
    /// VAT percentage on the reconciliation invoice line.
    pub vat_rate: Decimal,
    /// Issuer of reconciliation invoices.
    pub bank_user: String,
    /// Notify each business of its reconciliation invoice.
    #[serde(alias = "SEND_SEPA_MONTHLY_RESET_INVOICE")]
    pub send_monthly_reset_invoice: bool,
    /// Link to the invoice overview included in the notification.
    pub invoice_list_url: String,
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        Self {
            debit_transfer_type_id: 39,
            debit_transfer_description: "Bijschrijving na automatisch incasso".into(),
            credit_transfer_type_id: 36,
            credit_transfer_description: "Afschrijving na automatisch incasso".into(),
            invoice_days_due: 15,
            vat_rate: Decimal::ZERO,
            bank_user: "Positoos Reserve".into(),
            send_monthly_reset_invoice: false,
            invoice_list_url: String::new(),
        }
    }
}

impl ReconciliationSettings {
    /// Descriptions that mark a previous reset transfer in ledger history.
    pub fn reset_descriptions(&self) -> [&str; 2] {
        [
            self.debit_transfer_description.as_str(),
            self.credit_transfer_description.as_str(),
        ]
    }
}

fn default_currency_conversion() -> i64 {
    100
}

fn default_collection_offset_days() -> i64 {
    5
}

fn default_remittance_information() -> String {
    "Saldo verrekening Positoos".into()
}

impl SepaExportConfig {
    /// Parse and validate a JSON settings document.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ExportError::Configuration(format!("invalid SEPA settings: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every required setting is present.
    pub fn validate(&self) -> Result<(), ExportError> {
        if blank(&self.initiating_business) || blank(&self.end_to_end_id) {
            return Err(ExportError::Configuration(
                "INITIATING_BUSINESS or END_TO_END_ID not defined".into(),
            ));
        }
        self.creditor.validate("CREDITOR", "ULTIMATE_CREDITOR")?;
        self.debtor.validate("DEBTOR", "ULTIMATE_DEBTOR")?;

        if self.currency_conversion <= 0 {
            return Err(ExportError::Configuration(format!(
                "CURRENCY_CONVERSION must be positive, got {}",
                self.currency_conversion
            )));
        }
        day_offset("COLLECTION_OFFSET_DAYS", self.collection_offset_days)?;
        day_offset("INVOICE_DAYS_DUE", self.reconciliation.invoice_days_due)?;
        Ok(())
    }
}

impl PartySettings {
    fn validate(&self, block: &str, ultimate_key: &str) -> Result<(), ExportError> {
        let fields = [
            ("NAME", &self.name),
            ("BIC", &self.bic),
            ("IBAN", &self.iban),
            ("IDENTIFIER", &self.identifier),
            ("COUNTRY", &self.country),
            ("STREET_NUMBER", &self.street_number),
            ("POSTCODE_CITY", &self.postcode_city),
            (ultimate_key, &self.ultimate_party),
        ];
        match fields.iter().find(|(_, value)| blank(value)) {
            Some((key, _)) => Err(ExportError::Configuration(format!(
                "{block} {key} not defined"
            ))),
            None => Ok(()),
        }
    }
}

fn day_offset(key: &str, days: i64) -> Result<(), ExportError> {
    if (0..=MAX_DAY_OFFSET).contains(&days) {
        Ok(())
    } else {
        Err(ExportError::Configuration(format!(
            "{key} must be between 0 and {MAX_DAY_OFFSET} days, got {days}"
        )))
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}
