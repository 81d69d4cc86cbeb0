//! Translation between Torznab categories and upstream tracker categories.
//!
//! Both directions are many-to-many and deliberately asymmetric, so they are
//! kept as two independent tables rather than one table and its inverse.
//! Unknown ids are silently dropped in both directions.

mod tables;

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{CategoryConfig, ConfigError};

type CategoryTable = BTreeMap<u32, BTreeSet<u32>>;

/// Forward and reverse category tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMapping {
    /// Upstream id -> Torznab ids.
    forward: CategoryTable,
    /// Torznab id -> upstream ids.
    reverse: CategoryTable,
}

impl Default for CategoryMapping {
    fn default() -> Self {
        Self {
            forward: table_from_static(tables::FORWARD),
            reverse: table_from_static(tables::REVERSE),
        }
    }
}

impl CategoryMapping {
    /// Build a mapping from explicit tables.
    pub fn new(forward: CategoryTable, reverse: CategoryTable) -> Self {
        Self { forward, reverse }
    }

    /// Built-in tables, with any table present in the config replacing its default.
    pub fn from_config(config: &CategoryConfig) -> Result<Self, ConfigError> {
        let mut mapping = Self::default();
        if let Some(forward) = &config.forward {
            mapping.forward = table_from_config("categories.forward", forward)?;
        }
        if let Some(reverse) = &config.reverse {
            mapping.reverse = table_from_config("categories.reverse", reverse)?;
        }
        Ok(mapping)
    }

    /// Upstream ids that have at least one Torznab counterpart.
    pub fn upstream_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.forward.keys().copied()
    }
}

fn table_from_static(entries: &[(u32, &[u32])]) -> CategoryTable {
    entries
        .iter()
        .map(|(key, targets)| (*key, targets.iter().copied().collect()))
        .collect()
}

fn table_from_config(
    name: &str,
    entries: &BTreeMap<String, Vec<u32>>,
) -> Result<CategoryTable, ConfigError> {
    entries
        .iter()
        .map(|(key, targets)| {
            let id = key.trim().parse::<u32>().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "{} has a non-numeric category id: {:?}",
                    name, key
                ))
            })?;
            Ok((id, targets.iter().copied().collect()))
        })
        .collect()
}

/// Bidirectional category lookup.
#[derive(Debug, Clone, Default)]
pub struct CategoryTranslator {
    mapping: CategoryMapping,
}

impl CategoryTranslator {
    pub fn new(mapping: CategoryMapping) -> Self {
        Self { mapping }
    }

    /// Union of the upstream ids mapped from each Torznab id.
    pub fn to_upstream<'a, I>(&self, wire_ids: I) -> BTreeSet<u32>
    where
        I: IntoIterator<Item = &'a u32>,
    {
        wire_ids
            .into_iter()
            .filter_map(|id| self.mapping.reverse.get(id))
            .flatten()
            .copied()
            .collect()
    }

    /// Torznab ids for one upstream id, in ascending order. May be empty.
    pub fn to_wire(&self, upstream_id: u32) -> BTreeSet<u32> {
        self.mapping
            .forward
            .get(&upstream_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn mapping(&self) -> &CategoryMapping {
        &self.mapping
    }
}
