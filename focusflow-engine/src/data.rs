//! Embedded catalogs and their validation.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::CatalogSource;
use crate::badges::BadgeCatalog;
use crate::config::EconomyConfig;
use crate::loot::ItemCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse {name} catalog")]
    Parse {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate item name {0:?}")]
    DuplicateItem(String),
    #[error("duplicate badge name {0:?}")]
    DuplicateBadge(String),
    #[error("catalog entry with a blank name")]
    BlankName,
}

/// Every static catalog the engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Catalogs {
    #[serde(default)]
    pub items: ItemCatalog,
    #[serde(default)]
    pub badges: BadgeCatalog,
    #[serde(default)]
    pub economy: EconomyConfig,
}

impl Catalogs {
    #[must_use]
    pub fn load_from_static() -> Self {
        Self {
            items: ItemCatalog::load_from_static(),
            badges: BadgeCatalog::load_from_static(),
            economy: EconomyConfig::load_from_static(),
        }
    }

    /// Parse and validate catalogs from JSON documents.
    ///
    /// # Errors
    ///
    /// Returns an error when a document fails to parse or a catalog contains
    /// blank or duplicate names.
    pub fn from_json(items: &str, badges: &str, economy: &str) -> Result<Self, CatalogError> {
        let catalogs = Self {
            items: ItemCatalog::from_json(items)
                .map_err(|source| CatalogError::Parse { name: "item", source })?,
            badges: BadgeCatalog::from_json(badges)
                .map_err(|source| CatalogError::Parse { name: "badge", source })?,
            economy: EconomyConfig::from_json(economy)
                .map_err(|source| CatalogError::Parse { name: "economy", source })?,
        };
        catalogs.validate()?;
        Ok(catalogs)
    }

    /// Names must be non-blank and unique within each catalog.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for item in &self.items.items {
            if item.name.trim().is_empty() {
                return Err(CatalogError::BlankName);
            }
            if !seen.insert(item.name.as_str()) {
                return Err(CatalogError::DuplicateItem(item.name.clone()));
            }
        }
        seen.clear();
        for badge in &self.badges.badges {
            if badge.name.trim().is_empty() {
                return Err(CatalogError::BlankName);
            }
            if !seen.insert(badge.name.as_str()) {
                return Err(CatalogError::DuplicateBadge(badge.name.clone()));
            }
        }
        Ok(())
    }
}

/// Catalog source backed by the assets compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogs;

impl CatalogSource for StaticCatalogs {
    type Error = CatalogError;

    fn load_catalogs(&self) -> Result<Catalogs, Self::Error> {
        let catalogs = Catalogs::load_from_static();
        catalogs.validate()?;
        Ok(catalogs)
    }
}
