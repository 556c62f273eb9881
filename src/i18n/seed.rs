//! Static locale definitions used for bulk seeding.
//!
//! The seed file is a JSON object keyed by ISO code:
//!
//! ```json
//! { "en": { "name": "English" }, "ar": { "name": "Arabic", "rtl": true } }
//! ```

use crate::error::{Error, Result};
use crate::i18n::locale::{is_truthy, NewLocale};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One entry of the seed file. `name` is optional so that incomplete entries
/// can be skipped instead of failing the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub rtl: Option<Value>,
}

/// Seed definitions keyed by ISO code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SeedDefinitions {
    entries: BTreeMap<String, SeedEntry>,
}

impl SeedDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Seed(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Seed(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    pub fn insert(&mut self, code: &str, entry: SeedEntry) {
        self.entries.insert(code.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with a usable name, normalized for insertion.
    pub fn valid_locales(&self) -> Vec<NewLocale> {
        self.entries
            .iter()
            .filter_map(|(code, entry)| {
                let name = entry.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
                let code = code.trim();
                if code.is_empty() {
                    return None;
                }
                Some(NewLocale {
                    iso_code: code.to_string(),
                    name: name.to_string(),
                    charset: entry
                        .charset
                        .as_deref()
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string),
                    rtl: entry.rtl.as_ref().map(is_truthy).unwrap_or(false),
                })
            })
            .collect()
    }
}
