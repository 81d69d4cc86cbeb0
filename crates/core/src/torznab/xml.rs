//! Thin wrapper over the quick-xml writer.
//!
//! Text nodes and attribute values are escaped by quick-xml (all five
//! reserved characters), so nothing upstream of this module escapes by hand.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("XML write failed: {0}")]
    Xml(String),

    #[error("Encoded document is not valid UTF-8: {0}")]
    Utf8(String),
}

impl EncodeError {
    fn xml(err: impl std::fmt::Display) -> Self {
        EncodeError::Xml(err.to_string())
    }
}

pub(crate) struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Start a document with the XML declaration already written.
    pub fn new() -> Result<Self, EncodeError> {
        let mut inner = Writer::new_with_indent(Vec::new(), b' ', 2);
        inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(EncodeError::xml)?;
        Ok(Self { inner })
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), EncodeError> {
        self.write(Event::Start(element(name, attrs)))
    }

    pub fn end(&mut self, name: &str) -> Result<(), EncodeError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), EncodeError> {
        self.write(Event::Empty(element(name, attrs)))
    }

    /// `<name>text</name>`
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<(), EncodeError> {
        self.start(name, &[])?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    pub fn finish(self) -> Result<String, EncodeError> {
        String::from_utf8(self.inner.into_inner()).map_err(|e| EncodeError::Utf8(e.to_string()))
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), EncodeError> {
        self.inner.write_event(event).map_err(EncodeError::xml)
    }
}

fn element<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for attr in attrs {
        start.push_attribute(*attr);
    }
    start
}
