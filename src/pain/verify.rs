use quick_xml::Reader;
use quick_xml::events::Event;
use rust_decimal::Decimal;

use crate::core::ExportError;

/// Which pain message a document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// pain.001.001.03
    CreditTransfer,
    /// pain.008.001.02
    DirectDebit,
}

/// Totals read back from a verified document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub format: DocumentFormat,
    pub message_id: String,
    pub number_of_transactions: usize,
    pub control_sum: Decimal,
    pub payment_blocks: usize,
}

#[derive(Default)]
struct Block {
    declared_count: Option<usize>,
    declared_sum: Option<Decimal>,
    count: usize,
    sum: Decimal,
}

#[derive(Default)]
struct Parsed {
    format: Option<DocumentFormat>,
    message_id: Option<String>,
    declared_count: Option<usize>,
    declared_sum: Option<Decimal>,
    blocks: Vec<Block>,
    current: Option<Block>,
}

/// Read a pain.001 or pain.008 document and check every `NbOfTxs` and
/// `CtrlSum` against the `InstdAmt` values it contains.
pub fn verify_document(xml: &str) -> Result<DocumentSummary, ExportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut p = Parsed::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                match name.as_str() {
                    "CstmrCdtTrfInitn" => p.format = Some(DocumentFormat::CreditTransfer),
                    "CstmrDrctDbtInitn" => p.format = Some(DocumentFormat::DirectDebit),
                    "PmtInf" => p.current = Some(Block::default()),
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if !text.is_empty() {
                    p.handle_text(&path, &text)?;
                }
            }
            Ok(Event::End(_)) => {
                let ended = path.pop().unwrap_or_default();
                if ended == "PmtInf" {
                    if let Some(block) = p.current.take() {
                        p.blocks.push(block);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExportError::Xml(format!("XML parse error: {e}")));
            }
            _ => {}
        }
    }

    p.into_summary()
}

impl Parsed {
    fn handle_text(&mut self, path: &[String], text: &str) -> Result<(), ExportError> {
        let Some(leaf) = path.last().map(String::as_str) else {
            return Ok(());
        };
        let parent = path
            .len()
            .checked_sub(2)
            .and_then(|i| path.get(i))
            .map(String::as_str)
            .unwrap_or("");

        match (parent, leaf) {
            ("GrpHdr", "MsgId") => self.message_id = Some(text.to_string()),
            ("GrpHdr", "NbOfTxs") => self.declared_count = Some(parse_count(text)?),
            ("GrpHdr", "CtrlSum") => self.declared_sum = Some(parse_amount(text)?),
            ("PmtInf", "NbOfTxs") => {
                if let Some(block) = self.current.as_mut() {
                    block.declared_count = Some(parse_count(text)?);
                }
            }
            ("PmtInf", "CtrlSum") => {
                if let Some(block) = self.current.as_mut() {
                    block.declared_sum = Some(parse_amount(text)?);
                }
            }
            (_, "InstdAmt") => {
                let amount = parse_amount(text)?;
                if let Some(block) = self.current.as_mut() {
                    block.count += 1;
                    block.sum += amount;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn into_summary(self) -> Result<DocumentSummary, ExportError> {
        let format = self
            .format
            .ok_or_else(|| ExportError::Xml("not a pain.001 or pain.008 document".into()))?;
        let message_id = self
            .message_id
            .ok_or_else(|| ExportError::Xml("group header has no MsgId".into()))?;

        let mut count = 0;
        let mut sum = Decimal::ZERO;
        for (i, block) in self.blocks.iter().enumerate() {
            let n = i + 1;
            if block.declared_count != Some(block.count) {
                return Err(ExportError::ControlSum(format!(
                    "payment block {n}: NbOfTxs {:?} but {} transactions",
                    block.declared_count, block.count
                )));
            }
            if block.declared_sum != Some(block.sum) {
                return Err(ExportError::ControlSum(format!(
                    "payment block {n}: CtrlSum {:?} but transactions sum to {}",
                    block.declared_sum, block.sum
                )));
            }
            count += block.count;
            sum += block.sum;
        }

        if self.declared_count != Some(count) {
            return Err(ExportError::ControlSum(format!(
                "group header: NbOfTxs {:?} but {count} transactions",
                self.declared_count
            )));
        }
        if self.declared_sum != Some(sum) {
            return Err(ExportError::ControlSum(format!(
                "group header: CtrlSum {:?} but transactions sum to {sum}",
                self.declared_sum
            )));
        }

        Ok(DocumentSummary {
            format,
            message_id,
            number_of_transactions: count,
            control_sum: sum,
            payment_blocks: self.blocks.len(),
        })
    }
}

fn parse_count(text: &str) -> Result<usize, ExportError> {
    text.parse()
        .map_err(|_| ExportError::Xml(format!("invalid NbOfTxs: {text}")))
}

fn parse_amount(text: &str) -> Result<Decimal, ExportError> {
    text.parse()
        .map_err(|_| ExportError::Xml(format!("invalid amount: {text}")))
}
