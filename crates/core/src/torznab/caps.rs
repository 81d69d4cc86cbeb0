//! The Torznab capability descriptor (`t=caps`).

use crate::upstream::SearchMode;

use super::xml::{EncodeError, XmlWriter};

pub const SERVER_TITLE: &str = "GF-Free Proxy";
pub const SERVER_VERSION: &str = "1.0";
const DEFAULT_LIMIT: u32 = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchingCap {
    pub mode: SearchMode,
    pub supported_params: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCap {
    pub id: u32,
    pub name: &'static str,
    pub subcats: Vec<CategoryCap>,
}

impl CategoryCap {
    fn new(id: u32, name: &'static str) -> Self {
        Self {
            id,
            name,
            subcats: Vec::new(),
        }
    }

    fn with_subcats(mut self, subcats: Vec<CategoryCap>) -> Self {
        self.subcats = subcats;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    pub limit_max: u32,
    pub limit_default: u32,
    pub searching: Vec<SearchingCap>,
    pub categories: Vec<CategoryCap>,
}

impl CapabilityDescriptor {
    /// The descriptor advertised by this proxy.
    pub fn new(results_limit: u32) -> Self {
        Self {
            limit_max: results_limit,
            limit_default: DEFAULT_LIMIT.min(results_limit),
            searching: vec![
                SearchingCap {
                    mode: SearchMode::General,
                    supported_params: "q",
                },
                SearchingCap {
                    mode: SearchMode::Tv,
                    supported_params: "q,season,ep,imdbid,tvdbid",
                },
                SearchingCap {
                    mode: SearchMode::Movie,
                    supported_params: "q,imdbid,tmdbid",
                },
            ],
            categories: vec![
                CategoryCap::new(2000, "Movies").with_subcats(vec![
                    CategoryCap::new(2030, "Movies/HD"),
                    CategoryCap::new(2045, "Movies/UHD"),
                ]),
                CategoryCap::new(5000, "TV").with_subcats(vec![CategoryCap::new(5030, "TV/HD")]),
                CategoryCap::new(3000, "Audio"),
                CategoryCap::new(4000, "PC"),
                CategoryCap::new(7000, "Books"),
            ],
        }
    }

    pub(crate) fn write(&self, w: &mut XmlWriter) -> Result<(), EncodeError> {
        let max = self.limit_max.to_string();
        let default = self.limit_default.to_string();

        w.start("caps", &[])?;
        w.empty(
            "server",
            &[("version", SERVER_VERSION), ("title", SERVER_TITLE)],
        )?;
        w.empty("limits", &[("max", max.as_str()), ("default", default.as_str())])?;

        w.start("searching", &[])?;
        for cap in &self.searching {
            w.empty(
                cap.mode.as_str(),
                &[("available", "yes"), ("supportedParams", cap.supported_params)],
            )?;
        }
        w.end("searching")?;

        w.start("categories", &[])?;
        for category in &self.categories {
            let id = category.id.to_string();
            let attrs = [("id", id.as_str()), ("name", category.name)];
            if category.subcats.is_empty() {
                w.empty("category", &attrs)?;
                continue;
            }
            w.start("category", &attrs)?;
            for sub in &category.subcats {
                let sub_id = sub.id.to_string();
                w.empty("subcat", &[("id", sub_id.as_str()), ("name", sub.name)])?;
            }
            w.end("category")?;
        }
        w.end("categories")?;

        w.end("caps")
    }
}
