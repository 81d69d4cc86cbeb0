//! Torznab document encoding.

use std::sync::Arc;

use crate::category::CategoryTranslator;
use crate::upstream::{SearchMode, TorrentRecord};

use super::caps::{CapabilityDescriptor, SERVER_TITLE};
use super::item::TorznabItem;
use super::xml::{EncodeError, XmlWriter};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const TORZNAB_NS: &str = "http://torznab.com/schemas/2015/feed";

/// Encodes search results, capabilities and errors as Torznab XML.
#[derive(Debug, Clone)]
pub struct ProtocolEncoder {
    base_url: String,
    translator: Arc<CategoryTranslator>,
    min_age_hours: u32,
    caps: CapabilityDescriptor,
}

impl ProtocolEncoder {
    pub fn new(
        base_url: impl Into<String>,
        translator: Arc<CategoryTranslator>,
        min_age_hours: u32,
        results_limit: u32,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            translator,
            min_age_hours,
            caps: CapabilityDescriptor::new(results_limit),
        }
    }

    /// RSS 2.0 channel with one item per record, in input order.
    pub fn encode_search(
        &self,
        records: &[TorrentRecord],
        mode: SearchMode,
        credential: Option<&str>,
    ) -> Result<String, EncodeError> {
        let description = format!(
            "Generation-Free {} results older than {}h",
            mode.as_str(),
            self.min_age_hours
        );

        let mut w = XmlWriter::new()?;
        w.start(
            "rss",
            &[
                ("version", "2.0"),
                ("xmlns:atom", ATOM_NS),
                ("xmlns:torznab", TORZNAB_NS),
            ],
        )?;
        w.start("channel", &[])?;
        w.text_element("title", SERVER_TITLE)?;
        w.text_element("description", &description)?;
        w.text_element("link", &self.base_url)?;

        for record in records {
            TorznabItem::from_record(record, &self.base_url, &self.translator, credential)
                .write(&mut w)?;
        }

        w.end("channel")?;
        w.end("rss")?;
        w.finish()
    }

    pub fn encode_capabilities(&self) -> Result<String, EncodeError> {
        let mut w = XmlWriter::new()?;
        self.caps.write(&mut w)?;
        w.finish()
    }

    /// `<error code=".." description=".."/>`
    pub fn encode_error(&self, code: u16, description: &str) -> Result<String, EncodeError> {
        let code = code.to_string();
        let mut w = XmlWriter::new()?;
        w.empty("error", &[("code", code.as_str()), ("description", description)])?;
        w.finish()
    }
}
