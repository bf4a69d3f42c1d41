use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::ExportError;

pub type XmlResult = Result<String, ExportError>;

fn xml_io(e: std::io::Error) -> ExportError {
    ExportError::Xml(format!("XML write error: {e}"))
}

pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, ExportError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, ExportError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| ExportError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, ExportError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, ExportError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, ExportError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, ExportError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, ExportError> {
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// `<name Ccy="EUR">12.34</name>`
    pub fn amount_element(&mut self, name: &str, amount: Decimal) -> Result<&mut Self, ExportError> {
        self.text_element_with_attrs(name, &format_amount(amount), &[("Ccy", "EUR")])
    }

    /// `<name><FinInstnId><BIC>..</BIC></FinInstnId></name>`
    pub fn agent_element(&mut self, name: &str, bic: &str) -> Result<&mut Self, ExportError> {
        self.start_element(name)?;
        self.start_element("FinInstnId")?;
        self.text_element("BIC", bic)?;
        self.end_element("FinInstnId")?;
        self.end_element(name)
    }

    /// `<name><Id><IBAN>..</IBAN></Id></name>`
    pub fn account_element(&mut self, name: &str, iban: &str) -> Result<&mut Self, ExportError> {
        self.start_element(name)?;
        self.start_element("Id")?;
        self.text_element("IBAN", iban)?;
        self.end_element("Id")?;
        self.end_element(name)
    }

    /// `<name><Nm>..</Nm><PstlAdr><Ctry/><AdrLine/>*</PstlAdr></name>`
    pub fn party_element(
        &mut self,
        name: &str,
        party_name: &str,
        country: &str,
        address_lines: &[&str],
    ) -> Result<&mut Self, ExportError> {
        self.start_element(name)?;
        self.text_element("Nm", &sepa_text(party_name))?;
        self.start_element("PstlAdr")?;
        self.text_element("Ctry", country)?;
        for line in address_lines {
            self.text_element("AdrLine", &sepa_text(line))?;
        }
        self.end_element("PstlAdr")?;
        self.end_element(name)
    }

    /// `<name><Nm>..</Nm></name>`
    pub fn name_element(&mut self, name: &str, party_name: &str) -> Result<&mut Self, ExportError> {
        self.start_element(name)?;
        self.text_element("Nm", &sepa_text(party_name))?;
        self.end_element(name)
    }

    /// `<RmtInf><Ustrd>..</Ustrd></RmtInf>`
    pub fn remittance_element(&mut self, text: &str) -> Result<&mut Self, ExportError> {
        self.start_element("RmtInf")?;
        self.text_element("Ustrd", &sepa_text(text))?;
        self.end_element("RmtInf")
    }
}

/// Format an amount with exactly two decimals, as SEPA requires.
pub fn format_amount(d: Decimal) -> String {
    let mut rounded = d.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

/// Replace characters outside ASCII with `?`.
pub fn sepa_text(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii() { c } else { '?' }).collect()
}

/// `BtchBookg`: a block with more than one transaction is not batch booked.
pub fn batch_booking(transactions: usize) -> bool {
    transactions <= 1
}

pub fn bool_text(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}
