use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::TIMESTAMP_FORMAT;
use super::xml_utils::{XmlWriter, format_amount};
use crate::core::ExportError;

/// `GrpHdr` of a pain document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupHeader {
    /// `MsgId`: 32 hex characters, unique per document.
    pub message_id: String,
    /// `CreDtTm`
    pub created: NaiveDateTime,
    /// `NbOfTxs`: transactions in the whole document.
    pub number_of_operations: usize,
    /// `CtrlSum`: sum of every transaction amount in the document.
    pub checksum: Decimal,
    /// `InitgPty/Nm`
    pub initiating_party: String,
}

/// Build a group header with a fresh message id.
pub fn sepa_header(
    checksum: Decimal,
    operations: usize,
    initiating_party: impl Into<String>,
    created: NaiveDateTime,
) -> GroupHeader {
    GroupHeader {
        message_id: Uuid::new_v4().simple().to_string(),
        created,
        number_of_operations: operations,
        checksum: checksum.round_dp(2),
        initiating_party: initiating_party.into(),
    }
}

impl GroupHeader {
    pub(crate) fn write(&self, w: &mut XmlWriter) -> Result<(), ExportError> {
        w.start_element("GrpHdr")?;
        w.text_element("MsgId", &self.message_id)?;
        w.text_element("CreDtTm", &self.created.format(TIMESTAMP_FORMAT).to_string())?;
        w.text_element("NbOfTxs", &self.number_of_operations.to_string())?;
        w.text_element("CtrlSum", &format_amount(self.checksum))?;
        w.name_element("InitgPty", &self.initiating_party)?;
        w.end_element("GrpHdr")?;
        Ok(())
    }
}
