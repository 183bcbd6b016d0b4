//! Streaming accumulation of CNVD advisory records
//!
//! The CNVD dumps are too large to hold as a DOM, so records are accumulated
//! from a stream of structural events. [`Accumulator`] is the pure state
//! machine over open/text/close events; [`AdvisoryReader`] drives it with
//! events produced by `quick-xml`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::model::Advisory;

/// The XML tag enclosing one advisory record.
pub const RECORD_TAG: &str = "vulnerability";

/// The field tags of an advisory record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Number,
    Title,
    Severity,
    Product,
    IsEvent,
    SubmitTime,
    OpenTime,
    DiscovererName,
    ReferenceLink,
    FormalWay,
    Description,
    PatchName,
    PatchDescription,
    CveNumber,
    CveUrl,
}

impl Field {
    /// Map a tag name to its field. Unknown tags route nothing.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "number" => Self::Number,
            "title" => Self::Title,
            // the spelling used by the upstream dumps
            "serverity" => Self::Severity,
            "product" => Self::Product,
            "isEvent" => Self::IsEvent,
            "submitTime" => Self::SubmitTime,
            "openTime" => Self::OpenTime,
            "discovererName" => Self::DiscovererName,
            "referenceLink" => Self::ReferenceLink,
            "formalWay" => Self::FormalWay,
            "description" => Self::Description,
            "patchName" => Self::PatchName,
            "patchDescription" => Self::PatchDescription,
            "cveNumber" => Self::CveNumber,
            "cveUrl" => Self::CveUrl,
            _ => return None,
        })
    }
}

/// Accumulates the fields of the advisory record currently being parsed.
///
/// A small state machine over structural open/text/close events: outside a
/// record every event is ignored; inside a record, text is routed to the
/// field whose tag is currently open, and text arriving while no field is
/// open is discarded. Repeated text for the same field replaces the previous
/// value, except for `product`, which appends to the list of affected
/// products.
#[derive(Debug, Default)]
pub struct Accumulator {
    record: Option<Advisory>,
    current: Option<Field>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle an opening tag. Opening a record boundary resets the
    /// accumulator to an empty record.
    pub fn open(&mut self, tag: &str) {
        if tag == RECORD_TAG {
            self.record = Some(Advisory::default());
            self.current = None;
        } else if self.record.is_some() {
            self.current = Field::from_tag(tag);
        }
    }

    /// Handle character data for the currently open field.
    ///
    /// The `product` field gets an extra entity-decoding pass on top of the
    /// XML unescaping: the upstream dumps double-escape entities in product
    /// names.
    pub fn text(&mut self, content: &str) {
        let Some(record) = &mut self.record else {
            return;
        };
        let Some(field) = self.current else {
            return;
        };

        match field {
            Field::Number => record.number = content.to_string(),
            Field::Title => record.title = content.to_string(),
            Field::Severity => record.severity = content.to_string(),
            Field::Product => record
                .products
                .push(html_escape::decode_html_entities(content).into_owned()),
            Field::IsEvent => record.is_event = content.to_string(),
            Field::SubmitTime => record.submit_time = content.to_string(),
            Field::OpenTime => record.open_time = content.to_string(),
            Field::DiscovererName => record.discoverer_name = content.to_string(),
            Field::ReferenceLink => record.reference_link = content.to_string(),
            Field::FormalWay => record.formal_way = content.to_string(),
            Field::Description => record.description = content.to_string(),
            Field::PatchName => record.patch_name = content.to_string(),
            Field::PatchDescription => record.patch_description = content.to_string(),
            Field::CveNumber => record.cve_number = content.to_string(),
            Field::CveUrl => record.cve_url = content.to_string(),
        }
    }

    /// Handle a closing tag, yielding the completed record on the record
    /// boundary. Stray text after a field close is discarded until the next
    /// field opens.
    pub fn close(&mut self, tag: &str) -> Option<Advisory> {
        self.current = None;
        if tag == RECORD_TAG {
            self.record.take()
        } else {
            None
        }
    }

    /// Whether a record is currently open.
    pub fn in_record(&self) -> bool {
        self.record.is_some()
    }

    /// Drop a half-open record, returning to the idle state.
    pub fn abandon(&mut self) {
        self.record = None;
        self.current = None;
    }
}

/// Reads advisory records from one CNVD XML dump.
pub struct AdvisoryReader {
    reader: Reader<BufReader<File>>,
    accumulator: Accumulator,
    buf: Vec<u8>,
    truncated: bool,
}

impl AdvisoryReader {
    /// Open an XML dump for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, quick_xml::Error> {
        Ok(Self {
            reader: Reader::from_file(path)?,
            accumulator: Accumulator::new(),
            buf: Vec::new(),
            truncated: false,
        })
    }

    /// Whether the input ended inside a record. Such a record is dropped.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// The next completed advisory record, `None` at end of input.
    pub fn next_record(&mut self) -> Result<Option<Advisory>, quick_xml::Error> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(start) => {
                    let tag = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    self.accumulator.open(&tag);
                }
                Event::Empty(start) => {
                    let tag = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    self.accumulator.open(&tag);
                    if let Some(advisory) = self.accumulator.close(&tag) {
                        return Ok(Some(advisory));
                    }
                }
                Event::Text(text) => {
                    let content = text.unescape()?;
                    self.accumulator.text(&content);
                }
                Event::CData(data) => {
                    let content = self.reader.decoder().decode(&data)?.into_owned();
                    self.accumulator.text(&content);
                }
                Event::End(end) => {
                    let tag = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                    if let Some(advisory) = self.accumulator.close(&tag) {
                        return Ok(Some(advisory));
                    }
                }
                Event::Eof => {
                    if self.accumulator.in_record() {
                        self.truncated = true;
                        self.accumulator.abandon();
                    }
                    return Ok(None);
                }
                // declarations, comments, processing instructions
                _ => {}
            }
        }
    }
}
