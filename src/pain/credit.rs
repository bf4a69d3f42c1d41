use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::header::GroupHeader;
use super::xml_utils::{XmlResult, XmlWriter, batch_booking, bool_text, format_amount};
use super::{PAIN_001_NS, XSI_NS};
use crate::core::{Counterparty, ExportError, PartySettings};

/// `CdtTrfTxInf`: one payout to a business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditTransferTransaction {
    pub end_to_end_id: String,
    pub amount: Decimal,
    pub creditor_name: String,
    pub creditor_bic: String,
    pub creditor_iban: String,
    pub creditor_country: String,
    pub creditor_address: String,
    pub remittance_information: String,
}

/// Build the transaction paying `amount` EUR to `creditor`.
pub fn credit_transaction(
    creditor: &Counterparty,
    amount: Decimal,
    end_to_end_id: impl Into<String>,
    remittance_information: impl Into<String>,
) -> CreditTransferTransaction {
    CreditTransferTransaction {
        end_to_end_id: end_to_end_id.into(),
        amount,
        creditor_name: creditor.name.clone(),
        creditor_bic: creditor.bic.clone(),
        creditor_iban: creditor.iban.clone(),
        creditor_country: creditor.address.country_code.clone(),
        creditor_address: creditor.address.address_line(),
        remittance_information: remittance_information.into(),
    }
}

/// `PmtInf` of a credit transfer: the platform account pays every creditor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditTransferPaymentInfo {
    pub payment_info_id: String,
    pub batch_booking: bool,
    pub number_of_operations: usize,
    pub checksum: Decimal,
    pub execution_date: NaiveDate,
    pub debtor: PartySettings,
    pub transactions: Vec<CreditTransferTransaction>,
}

/// Wrap `transactions` in one payment block debited from `debtor`.
pub fn credit_payments_info(
    payment_info_id: impl Into<String>,
    execution_date: NaiveDate,
    debtor: &PartySettings,
    transactions: Vec<CreditTransferTransaction>,
) -> CreditTransferPaymentInfo {
    let checksum: Decimal = transactions.iter().map(|t| t.amount).sum();
    CreditTransferPaymentInfo {
        payment_info_id: payment_info_id.into(),
        batch_booking: batch_booking(transactions.len()),
        number_of_operations: transactions.len(),
        checksum,
        execution_date,
        debtor: debtor.clone(),
        transactions,
    }
}

/// A complete pain.001.001.03 document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditTransferDocument {
    pub header: GroupHeader,
    pub payment_info: CreditTransferPaymentInfo,
}

/// Serialize a credit transfer document.
pub fn to_pain_001_xml(doc: &CreditTransferDocument) -> XmlResult {
    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs("Document", &[("xmlns", PAIN_001_NS), ("xmlns:xsi", XSI_NS)])?;
    w.start_element("CstmrCdtTrfInitn")?;
    doc.header.write(&mut w)?;
    write_payment_info(&mut w, &doc.payment_info)?;
    w.end_element("CstmrCdtTrfInitn")?;
    w.end_element("Document")?;
    w.into_string()
}

fn write_payment_info(w: &mut XmlWriter, info: &CreditTransferPaymentInfo) -> Result<(), ExportError> {
    let debtor = &info.debtor;

    w.start_element("PmtInf")?;
    w.text_element("PmtInfId", &info.payment_info_id)?;
    w.text_element("PmtMtd", "TRF")?;
    w.text_element("BtchBookg", bool_text(info.batch_booking))?;
    w.text_element("NbOfTxs", &info.number_of_operations.to_string())?;
    w.text_element("CtrlSum", &format_amount(info.checksum))?;

    w.start_element("PmtTpInf")?;
    w.start_element("SvcLvl")?;
    w.text_element("Cd", "SEPA")?;
    w.end_element("SvcLvl")?;
    w.start_element("LclInstrm")?;
    w.text_element("Cd", "ACCEPT")?;
    w.end_element("LclInstrm")?;
    w.end_element("PmtTpInf")?;

    w.text_element("ReqdExctnDt", &info.execution_date.to_string())?;
    w.party_element(
        "Dbtr",
        &debtor.name,
        &debtor.country,
        &[debtor.street_number.as_str(), debtor.postcode_city.as_str()],
    )?;
    w.account_element("DbtrAcct", &debtor.iban)?;
    w.agent_element("DbtrAgt", &debtor.bic)?;
    w.name_element("UltmtDbtr", &debtor.ultimate_party)?;
    w.text_element("ChrgBr", "SLEV")?;

    for tx in &info.transactions {
        write_transaction(w, tx)?;
    }

    w.end_element("PmtInf")?;
    Ok(())
}

fn write_transaction(w: &mut XmlWriter, tx: &CreditTransferTransaction) -> Result<(), ExportError> {
    w.start_element("CdtTrfTxInf")?;
    w.start_element("PmtId")?;
    w.text_element("EndToEndId", &tx.end_to_end_id)?;
    w.end_element("PmtId")?;
    w.start_element("Amt")?;
    w.amount_element("InstdAmt", tx.amount)?;
    w.end_element("Amt")?;
    w.agent_element("CdtrAgt", &tx.creditor_bic)?;
    w.party_element(
        "Cdtr",
        &tx.creditor_name,
        &tx.creditor_country,
        &[tx.creditor_address.as_str()],
    )?;
    w.account_element("CdtrAcct", &tx.creditor_iban)?;
    w.remittance_element(&tx.remittance_information)?;
    w.end_element("CdtTrfTxInf")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AddressBuilder, BusinessBuilder};
    use crate::pain::sepa_header;
    use rust_decimal_macros::dec;

    fn counterparty(id: u64, name: &str) -> Counterparty {
        let business = BusinessBuilder::new(
            id,
            name,
            format!("user{id}"),
            AddressBuilder::new("Tilburg", "5021 LL", "NL")
                .street("Heuvel 1")
                .build(),
        )
        .account_holder("Holder")
        .iban("NL91ABNA0417164300")
        .bic("ABNANL2A")
        .mandate("M-1", NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
        .build();
        Counterparty::from_business(&business).unwrap()
    }

    fn debtor() -> PartySettings {
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

    fn execution() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 6).unwrap()
    }

    #[test]
    fn block_totals() {
        let info = credit_payments_info(
            "Positoos 2024-06-01T10:00:00",
            execution(),
            &debtor(),
            vec![
                credit_transaction(&counterparty(1, "A"), dec!(1.50), "E - 1", "Saldo"),
                credit_transaction(&counterparty(3, "C"), dec!(2.00), "E - 3", "Saldo"),
            ],
        );
        assert_eq!(info.number_of_operations, 2);
        assert_eq!(info.checksum, dec!(3.50));
        assert!(!info.batch_booking);
    }

    #[test]
    fn single_transaction_books_as_batch() {
        let info = credit_payments_info(
            "id",
            execution(),
            &debtor(),
            vec![credit_transaction(&counterparty(1, "A"), dec!(5), "E - 1", "Saldo")],
        );
        assert!(info.batch_booking);
    }

    #[test]
    fn blocks_compare_by_debtor() {
        let build = |debtor: &PartySettings| {
            credit_payments_info(
                "id",
                execution(),
                debtor,
                vec![credit_transaction(&counterparty(1, "A"), dec!(5), "E - 1", "Saldo")],
            )
        };
        assert_eq!(build(&debtor()), build(&debtor()));
        let other = PartySettings {
            ultimate_party: "ING".into(),
            ..debtor()
        };
        assert_ne!(build(&debtor()), build(&other));
    }

    #[test]
    fn document_layout() {
        let info = credit_payments_info(
            "Positoos 2024-06-01T10:00:00",
            execution(),
            &debtor(),
            vec![credit_transaction(&counterparty(1, "Café Noël"), dec!(1.5), "E - 1", "Saldo")],
        );
        let created = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let doc = CreditTransferDocument {
            header: sepa_header(info.checksum, 1, "Positoos", created),
            payment_info: info,
        };
        let xml = to_pain_001_xml(&doc).unwrap();

        assert!(xml.contains(r#"<Document xmlns="urn:iso:std:iso:20022:tech:xsd:pain.001.001.03""#));
        assert!(xml.contains("<PmtMtd>TRF</PmtMtd>"));
        assert!(xml.contains("<ReqdExctnDt>2024-06-06</ReqdExctnDt>"));
        assert!(xml.contains(r#"<InstdAmt Ccy="EUR">1.50</InstdAmt>"#));
        assert!(xml.contains("<Nm>Caf? No?l</Nm>"));
        assert!(xml.contains("<AdrLine>Heuvel 1, 5021 LL, Tilburg, NL</AdrLine>"));
        assert!(xml.contains("<ChrgBr>SLEV</ChrgBr>"));
        assert!(xml.find("<Dbtr>").unwrap() < xml.find("<CdtTrfTxInf>").unwrap());
    }
}
