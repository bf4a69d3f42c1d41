use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::header::GroupHeader;
use super::xml_utils::{XmlResult, XmlWriter, batch_booking, bool_text, format_amount};
use super::{PAIN_008_NS, XSI_NS};
use crate::core::{Counterparty, ExportError, PartySettings};

/// `SeqTp` of a direct debit block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceType {
    /// First collection under a mandate.
    First,
    /// Any later collection under the same mandate.
    Recurring,
}

impl SequenceType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::First => "FRST",
            Self::Recurring => "RCUR",
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// `DrctDbtTxInf`: one collection from a business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDebitTransaction {
    pub end_to_end_id: String,
    pub amount: Decimal,
    pub mandate_id: String,
    pub signature_date: NaiveDate,
    pub debtor_name: String,
    pub debtor_bic: String,
    pub debtor_iban: String,
    pub debtor_country: String,
    pub debtor_address: String,
    pub remittance_information: String,
}

/// Build the transaction collecting `amount` EUR from `debtor`.
pub fn debit_transaction(
    debtor: &Counterparty,
    amount: Decimal,
    end_to_end_id: impl Into<String>,
    remittance_information: impl Into<String>,
) -> DirectDebitTransaction {
    DirectDebitTransaction {
        end_to_end_id: end_to_end_id.into(),
        amount,
        mandate_id: debtor.mandate_id.clone(),
        signature_date: debtor.signature_date,
        debtor_name: debtor.name.clone(),
        debtor_bic: debtor.bic.clone(),
        debtor_iban: debtor.iban.clone(),
        debtor_country: debtor.address.country_code.clone(),
        debtor_address: debtor.address.address_line(),
        remittance_information: remittance_information.into(),
    }
}

/// `PmtInf` of a direct debit: the platform account collects from debtors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDebitPaymentInfo {
    pub payment_info_id: String,
    pub sequence_type: SequenceType,
    pub batch_booking: bool,
    pub number_of_operations: usize,
    pub checksum: Decimal,
    pub collection_date: NaiveDate,
    pub creditor: PartySettings,
    pub transactions: Vec<DirectDebitTransaction>,
}

/// Wrap `transactions` in one payment block credited to `creditor`.
pub fn debit_payments_info(
    payment_info_id: impl Into<String>,
    sequence_type: SequenceType,
    collection_date: NaiveDate,
    creditor: &PartySettings,
    transactions: Vec<DirectDebitTransaction>,
) -> DirectDebitPaymentInfo {
    let checksum: Decimal = transactions.iter().map(|t| t.amount).sum();
    DirectDebitPaymentInfo {
        payment_info_id: payment_info_id.into(),
        sequence_type,
        batch_booking: batch_booking(transactions.len()),
        number_of_operations: transactions.len(),
        checksum,
        collection_date,
        creditor: creditor.clone(),
        transactions,
    }
}

/// A complete pain.008.001.02 document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDebitDocument {
    pub header: GroupHeader,
    /// `FRST` blocks first, one per business, then at most one `RCUR` block.
    pub payment_infos: Vec<DirectDebitPaymentInfo>,
}

/// Serialize a direct debit document.
pub fn to_pain_008_xml(doc: &DirectDebitDocument) -> XmlResult {
    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs("Document", &[("xmlns", PAIN_008_NS), ("xmlns:xsi", XSI_NS)])?;
    w.start_element("CstmrDrctDbtInitn")?;
    doc.header.write(&mut w)?;
    for info in &doc.payment_infos {
        write_payment_info(&mut w, info)?;
    }
    w.end_element("CstmrDrctDbtInitn")?;
    w.end_element("Document")?;
    w.into_string()
}

fn write_payment_info(w: &mut XmlWriter, info: &DirectDebitPaymentInfo) -> Result<(), ExportError> {
    let creditor = &info.creditor;

    w.start_element("PmtInf")?;
    w.text_element("PmtInfId", &info.payment_info_id)?;
    w.text_element("PmtMtd", "DD")?;
    w.text_element("BtchBookg", bool_text(info.batch_booking))?;
    w.text_element("NbOfTxs", &info.number_of_operations.to_string())?;
    w.text_element("CtrlSum", &format_amount(info.checksum))?;

    w.start_element("PmtTpInf")?;
    w.start_element("SvcLvl")?;
    w.text_element("Cd", "SEPA")?;
    w.end_element("SvcLvl")?;
    w.start_element("LclInstrm")?;
    w.text_element("Cd", "CORE")?;
    w.end_element("LclInstrm")?;
    w.text_element("SeqTp", info.sequence_type.code())?;
    w.end_element("PmtTpInf")?;

    w.text_element("ReqdColltnDt", &info.collection_date.to_string())?;
    w.party_element(
        "Cdtr",
        &creditor.name,
        &creditor.country,
        &[creditor.street_number.as_str(), creditor.postcode_city.as_str()],
    )?;
    w.account_element("CdtrAcct", &creditor.iban)?;
    w.agent_element("CdtrAgt", &creditor.bic)?;
    w.name_element("UltmtCdtr", &creditor.ultimate_party)?;
    w.text_element("ChrgBr", "SLEV")?;

    // <CdtrSchmeId><Id><PrvtId><Othr><Id/><SchmeNm><Prtry/></SchmeNm></Othr>
    w.start_element("CdtrSchmeId")?;
    w.start_element("Id")?;
    w.start_element("PrvtId")?;
    w.start_element("Othr")?;
    w.text_element("Id", &creditor.identifier)?;
    w.start_element("SchmeNm")?;
    w.text_element("Prtry", "SEPA")?;
    w.end_element("SchmeNm")?;
    w.end_element("Othr")?;
    w.end_element("PrvtId")?;
    w.end_element("Id")?;
    w.end_element("CdtrSchmeId")?;

    for tx in &info.transactions {
        write_transaction(w, tx)?;
    }

    w.end_element("PmtInf")?;
    Ok(())
}

fn write_transaction(w: &mut XmlWriter, tx: &DirectDebitTransaction) -> Result<(), ExportError> {
    w.start_element("DrctDbtTxInf")?;
    w.start_element("PmtId")?;
    w.text_element("EndToEndId", &tx.end_to_end_id)?;
    w.end_element("PmtId")?;
    w.amount_element("InstdAmt", tx.amount)?;

    w.start_element("DrctDbtTx")?;
    w.start_element("MndtRltdInf")?;
    w.text_element("MndtId", &tx.mandate_id)?;
    w.text_element("DtOfSgntr", &tx.signature_date.to_string())?;
    w.end_element("MndtRltdInf")?;
    w.end_element("DrctDbtTx")?;

    w.agent_element("DbtrAgt", &tx.debtor_bic)?;
    w.party_element(
        "Dbtr",
        &tx.debtor_name,
        &tx.debtor_country,
        &[tx.debtor_address.as_str()],
    )?;
    w.account_element("DbtrAcct", &tx.debtor_iban)?;
    w.remittance_element(&tx.remittance_information)?;
    w.end_element("DrctDbtTxInf")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AddressBuilder, BusinessBuilder};
    use crate::pain::sepa_header;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn counterparty(id: u64) -> Counterparty {
        let business = BusinessBuilder::new(
            id,
            format!("Kapsalon {id}"),
            format!("kapper{id}"),
            AddressBuilder::new("Tilburg", "5038 AB", "NL")
                .street("Stationsstraat 12")
                .build(),
        )
        .account_holder("Holder")
        .iban("NL02ABNA0123456789")
        .bic("ABNANL2A")
        .mandate(format!("POS-{id}"), date(2022, 11, 3))
        .build();
        Counterparty::from_business(&business).unwrap()
    }

    fn creditor() -> PartySettings {
        PartySettings {
            name: "Positoos B.V., Administratie".into(),
            bic: "RABONL2U".into(),
            iban: "NL15RABO0154443476".into(),
            identifier: "NL66ZZZ172728960000".into(),
            country: "NL".into(),
            street_number: "Groenstraat 139/155".into(),
            postcode_city: "5021LL Tilburg".into(),
            ultimate_party: "Rabobank".into(),
        }
    }

    #[test]
    fn sequence_codes() {
        assert_eq!(SequenceType::First.to_string(), "FRST");
        assert_eq!(SequenceType::Recurring.code(), "RCUR");
    }

    #[test]
    fn recurring_block_totals() {
        let info = debit_payments_info(
            "Positoos 2024-06-01T10:00:00",
            SequenceType::Recurring,
            date(2024, 6, 6),
            &creditor(),
            vec![
                debit_transaction(&counterparty(1), dec!(0.50), "E - 1", "Saldo"),
                debit_transaction(&counterparty(2), dec!(12.25), "E - 2", "Saldo"),
                debit_transaction(&counterparty(4), dec!(3.00), "E - 4", "Saldo"),
            ],
        );
        assert_eq!(info.number_of_operations, 3);
        assert_eq!(info.checksum, dec!(15.75));
        assert!(!info.batch_booking);
    }

    #[test]
    fn blocks_compare_by_creditor() {
        let build = |creditor: &PartySettings| {
            debit_payments_info(
                "id",
                SequenceType::First,
                date(2024, 6, 6),
                creditor,
                vec![debit_transaction(&counterparty(2), dec!(0.5), "E - 2", "Saldo")],
            )
        };
        assert_eq!(build(&creditor()), build(&creditor()));
        let other = PartySettings {
            identifier: "NL00ZZZ000000000000".into(),
            ..creditor()
        };
        assert_ne!(build(&creditor()), build(&other));
    }

    #[test]
    fn document_layout() {
        let first = debit_payments_info(
            "Positoos 2024-06-01T10:00:00",
            SequenceType::First,
            date(2024, 6, 6),
            &creditor(),
            vec![debit_transaction(&counterparty(2), dec!(0.5), "Saldo 05/2024 - 2", "Saldo")],
        );
        let created = date(2024, 6, 1).and_hms_opt(10, 0, 0).unwrap();
        let doc = DirectDebitDocument {
            header: sepa_header(first.checksum, 1, "Positoos", created),
            payment_infos: vec![first],
        };
        let xml = to_pain_008_xml(&doc).unwrap();

        assert!(xml.contains(r#"<Document xmlns="urn:iso:std:iso:20022:tech:xsd:pain.008.001.02""#));
        assert!(xml.contains("<PmtMtd>DD</PmtMtd>"));
        assert!(xml.contains("<BtchBookg>true</BtchBookg>"));
        assert!(xml.contains("<SeqTp>FRST</SeqTp>"));
        assert!(xml.contains("<ReqdColltnDt>2024-06-06</ReqdColltnDt>"));
        assert!(xml.contains("<Prtry>SEPA</Prtry>"));
        assert!(xml.contains("<MndtId>POS-2</MndtId>"));
        assert!(xml.contains("<DtOfSgntr>2022-11-03</DtOfSgntr>"));
        assert!(xml.contains(r#"<InstdAmt Ccy="EUR">0.50</InstdAmt>"#));
        assert!(xml.contains("<EndToEndId>Saldo 05/2024 - 2</EndToEndId>"));
        assert!(!xml.contains("<Amt>"));
    }
}
