//! Projection of an upstream record onto a Torznab `<item>`.

use crate::category::CategoryTranslator;
use crate::upstream::{normalize_imdb_id, normalize_numeric_id, parse_timestamp, TorrentRecord};

use super::xml::{EncodeError, XmlWriter};

const RFC822_UTC: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// A `<torznab:attr name=".." value=".."/>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorznabAttr {
    pub name: &'static str,
    pub value: String,
}

impl TorznabAttr {
    fn new(name: &'static str, value: impl ToString) -> Self {
        Self {
            name,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorznabItem {
    pub title: String,
    /// Details page; used for both `guid` and `comments`.
    pub details_url: String,
    /// Download link, credential appended when needed. Empty if unknown.
    pub link: String,
    pub pub_date: Option<String>,
    pub size: u64,
    pub attrs: Vec<TorznabAttr>,
}

impl TorznabItem {
    pub fn from_record(
        record: &TorrentRecord,
        base_url: &str,
        translator: &CategoryTranslator,
        credential: Option<&str>,
    ) -> Self {
        let mut attrs: Vec<TorznabAttr> = record
            .category_id
            .map(|id| translator.to_wire(id))
            .unwrap_or_default()
            .into_iter()
            .map(|cat| TorznabAttr::new("category", cat))
            .collect();

        attrs.push(TorznabAttr::new("seeders", record.seeders));
        attrs.push(TorznabAttr::new(
            "peers",
            u64::from(record.seeders) + u64::from(record.leechers),
        ));
        if let Some(hash) = record.info_hash.as_deref().filter(|h| !h.is_empty()) {
            attrs.push(TorznabAttr::new("infohash", hash));
        }
        let download_factor = if record.has_download_discount() { 0 } else { 1 };
        attrs.push(TorznabAttr::new("downloadvolumefactor", download_factor));
        attrs.push(TorznabAttr::new("uploadvolumefactor", 1));

        if let Some(imdb) = record.imdb_id.as_deref().and_then(normalize_imdb_id) {
            attrs.push(TorznabAttr::new("imdbid", format!("tt{:0>7}", imdb)));
        }
        if let Some(tmdb) = record.tmdb_id.as_deref().and_then(normalize_numeric_id) {
            attrs.push(TorznabAttr::new("tmdbid", tmdb));
        }
        if let Some(tvdb) = record.tvdb_id.as_deref().and_then(normalize_numeric_id) {
            attrs.push(TorznabAttr::new("tvdbid", tvdb));
        }

        Self {
            title: record.name.clone(),
            details_url: format!("{}/torrents/{}", base_url.trim_end_matches('/'), record.id),
            link: download_link(record.download_link.as_deref(), credential),
            pub_date: record
                .created_at
                .as_deref()
                .and_then(|raw| parse_timestamp(raw).ok())
                .map(|dt| dt.format(RFC822_UTC).to_string()),
            size: record.size_bytes,
            attrs,
        }
    }

    pub(crate) fn write(&self, w: &mut XmlWriter) -> Result<(), EncodeError> {
        let size = self.size.to_string();

        w.start("item", &[])?;
        w.text_element("title", &self.title)?;
        w.text_element("guid", &self.details_url)?;
        w.text_element("link", &self.link)?;
        w.text_element("comments", &self.details_url)?;
        if let Some(pub_date) = &self.pub_date {
            w.text_element("pubDate", pub_date)?;
        }
        w.text_element("size", &size)?;
        w.empty(
            "enclosure",
            &[
                ("url", self.link.as_str()),
                ("length", size.as_str()),
                ("type", "application/x-bittorrent"),
            ],
        )?;
        for attr in &self.attrs {
            w.empty(
                "torznab:attr",
                &[("name", attr.name), ("value", attr.value.as_str())],
            )?;
        }
        w.end("item")
    }
}

/// Append `api_token` to a download link that doesn't already carry one.
fn download_link(link: Option<&str>, credential: Option<&str>) -> String {
    let link = link.unwrap_or_default();
    match credential {
        Some(token) if !link.is_empty() && !link.contains("api_token") => {
            let sep = if link.contains('?') { '&' } else { '?' };
            format!("{}{}api_token={}", link, sep, urlencoding::encode(token))
        }
        _ => link.to_string(),
    }
}
