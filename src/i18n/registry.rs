//! Locale registry: maps ISO codes to locale ids and holds the default locale.
//!
//! The code→id mapping is shared process-wide through a `SharedCache`. The
//! registry boots lazily: the first lookup loads the mapping from the shared
//! cache, or rebuilds it from storage on a miss. `clear_cache` forces the next
//! lookup to boot again.
//!
//! Lookups for an unknown code never fail. `id` falls back to the default
//! locale so that an unsupported request locale degrades instead of erroring.

use crate::cache::SharedCache;
use crate::error::{Error, Result, StorageError, ValidationErrors};
use crate::i18n::locale::{Locale, LocaleInput, ENGLISH};
use crate::i18n::metrics::CacheMetrics;
use crate::i18n::seed::SeedDefinitions;
use crate::storage::Storage;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Shared cache key holding the code→id mapping.
pub const LOCALE_IDS_CACHE_KEY: &str = "translatable.locale_ids";

/// Shared cache key holding the full locale list.
pub const LOCALES_CACHE_KEY: &str = "translatable.locales";

/// Default number of locales inserted per statement while seeding.
pub const DEFAULT_SEED_BATCH_SIZE: usize = 100;

/// Library-level registry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Locale used when a requested code is not supported
    pub default_locale: String,

    /// Number of locales per insert statement while seeding
    pub seed_batch_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_locale: ENGLISH.to_string(),
            seed_batch_size: DEFAULT_SEED_BATCH_SIZE,
        }
    }
}

#[derive(Debug)]
struct RegistryState {
    booted: bool,
    ids: HashMap<String, i64>,
    default_locale: String,
}

/// Authoritative mapping between locale codes and locale ids.
pub struct LocaleRegistry {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn SharedCache>,
    config: RegistryConfig,
    state: Mutex<RegistryState>,
    metrics: CacheMetrics,
}

impl LocaleRegistry {
    pub fn new(storage: Arc<dyn Storage>, cache: Arc<dyn SharedCache>) -> Self {
        Self::with_config(storage, cache, RegistryConfig::default())
    }

    pub fn with_config(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn SharedCache>,
        config: RegistryConfig,
    ) -> Self {
        let state = RegistryState {
            booted: false,
            ids: HashMap::new(),
            default_locale: config.default_locale.clone(),
        };
        Self {
            storage,
            cache,
            config,
            state: Mutex::new(state),
            metrics: CacheMetrics::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cache counters: hits when the mapping came from the shared cache,
    /// reloads when it was rebuilt from storage.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    // ==================== Boot & Cache Lifecycle ====================

    /// Load the code→id mapping if it has not been loaded yet.
    pub fn boot(&self) -> Result<()> {
        let mut state = self.state();
        if state.booted {
            return Ok(());
        }

        match self.cached::<HashMap<String, i64>>(LOCALE_IDS_CACHE_KEY) {
            Some(ids) => {
                debug!("Locale ids loaded from shared cache ({} locales)", ids.len());
                self.metrics.record_cache_hit();
                state.ids = ids;
            }
            None => {
                self.metrics.record_cache_miss();
                state.ids = self.rebuild_ids()?;
            }
        }

        state.booted = true;
        Ok(())
    }

    /// Rebuild the mapping from storage, overwriting the shared cache entry.
    pub fn cache(&self) -> Result<()> {
        let ids = self.rebuild_ids()?;
        self.cache.forget(LOCALES_CACHE_KEY);

        let mut state = self.state();
        state.ids = ids;
        state.booted = true;
        Ok(())
    }

    /// Drop every cached view; the next lookup boots again.
    pub fn clear_cache(&self) {
        self.cache.forget(LOCALE_IDS_CACHE_KEY);
        self.cache.forget(LOCALES_CACHE_KEY);

        let mut state = self.state();
        state.ids.clear();
        state.booted = false;
        debug!("Locale cache cleared");
    }

    /// Clear caches and restore the baseline default locale.
    pub fn reset(&self) {
        self.clear_cache();
        self.state().default_locale = ENGLISH.to_string();
    }

    fn rebuild_ids(&self) -> Result<HashMap<String, i64>> {
        let locales = self.storage.all_locales()?;
        let ids: HashMap<String, i64> = locales
            .into_iter()
            .map(|locale| (locale.iso_code, locale.id))
            .collect();

        let value = serde_json::to_value(&ids).map_err(|e| StorageError::Decode(e.to_string()))?;
        self.cache.put(LOCALE_IDS_CACHE_KEY, value);
        self.metrics.record_reload();

        info!("Rebuilt locale id cache ({} locales)", ids.len());
        Ok(ids)
    }

    /// Decode a shared cache entry; an undecodable entry counts as a miss.
    fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.cache.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Ignoring undecodable cache entry '{}': {}", key, e);
                None
            }
        }
    }

    // ==================== Lookups ====================

    fn lookup(&self, code: &str) -> Result<Option<i64>> {
        self.boot()?;
        Ok(self.state().ids.get(code).copied())
    }

    /// Whether `code` is a registered ISO code.
    pub fn supports(&self, code: &str) -> Result<bool> {
        Ok(self.lookup(code)?.is_some())
    }

    /// Locale id for `code`, or the default locale's id when `code` is unknown.
    ///
    /// Fails only if the default locale itself is not registered.
    pub fn id(&self, code: &str) -> Result<i64> {
        if let Some(id) = self.lookup(code)? {
            return Ok(id);
        }

        let default = self.default_locale();
        debug!("Locale '{}' not supported, falling back to '{}'", code, default);
        self.lookup(&default)?
            .ok_or(Error::LocaleNotSupported(default))
    }

    /// Reverse lookup: ISO code registered for `id`.
    pub fn code(&self, id: i64) -> Result<Option<String>> {
        self.boot()?;
        Ok(self
            .state()
            .ids
            .iter()
            .find(|(_, locale_id)| **locale_id == id)
            .map(|(code, _)| code.clone()))
    }

    pub fn default_locale(&self) -> String {
        self.state().default_locale.clone()
    }

    /// Change the default locale; the code must already be registered.
    pub fn set_default_locale(&self, code: &str) -> Result<()> {
        if !self.supports(code)? {
            return Err(Error::LocaleNotSupported(code.to_string()));
        }
        self.state().default_locale = code.to_string();
        Ok(())
    }

    /// All registered locales, served from the shared cache when possible.
    pub fn locales(&self) -> Result<Vec<Locale>> {
        if let Some(locales) = self.cached::<Vec<Locale>>(LOCALES_CACHE_KEY) {
            self.metrics.record_cache_hit();
            return Ok(locales);
        }

        self.metrics.record_cache_miss();
        let locales = self.storage.all_locales()?;
        let value =
            serde_json::to_value(&locales).map_err(|e| StorageError::Decode(e.to_string()))?;
        self.cache.put(LOCALES_CACHE_KEY, value);
        Ok(locales)
    }

    // ==================== Registration ====================

    /// Validate and persist a new locale, then rebuild the cache.
    pub fn add(&self, input: LocaleInput) -> Result<Locale> {
        let mut errors = ValidationErrors::new();

        if input.name().is_none() {
            errors.add("name", "The name field is required.");
        }
        match input.iso_code() {
            None => errors.add("iso_code", "The iso code field is required."),
            Some(code) if self.storage.locale_code_exists(code)? => {
                errors.add("iso_code", "The iso code has already been taken.")
            }
            Some(_) => {}
        }

        let new_locale = match input.normalize() {
            Some(locale) if errors.is_empty() => locale,
            _ => return Err(Error::Validation(errors)),
        };

        let locale = self.storage.insert_locale(&new_locale).map_err(|e| match e {
            StorageError::Conflict(_) => {
                let mut errors = ValidationErrors::new();
                errors.add("iso_code", "The iso code has already been taken.");
                Error::Validation(errors)
            }
            other => other.into(),
        })?;

        self.cache()?;
        info!("Registered locale '{}' ({}) with id {}", locale.iso_code, locale.name, locale.id);
        Ok(locale)
    }

    /// Bulk-insert seed definitions in one transaction.
    ///
    /// Entries without a name and codes that are already registered are
    /// skipped. Returns the number of inserted locales.
    pub fn seed(&self, definitions: &SeedDefinitions) -> Result<usize> {
        let existing: HashSet<String> = self
            .storage
            .all_locales()?
            .into_iter()
            .map(|locale| locale.iso_code)
            .collect();

        let valid = definitions.valid_locales();
        let skipped_unnamed = definitions.len() - valid.len();
        let pending: Vec<_> = valid
            .into_iter()
            .filter(|locale| !existing.contains(&locale.iso_code))
            .collect();

        if skipped_unnamed > 0 {
            warn!("Skipped {} seed entries without a name", skipped_unnamed);
        }
        if pending.is_empty() {
            info!("No new locales to seed");
            return Ok(0);
        }

        let inserted = self
            .storage
            .insert_locales(&pending, self.config.seed_batch_size)?;
        self.cache()?;

        info!(
            "Seeded {} locales in batches of {}",
            inserted, self.config.seed_batch_size
        );
        Ok(inserted)
    }

    /// Seed from a JSON file keyed by ISO code.
    pub fn seed_from_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let definitions = SeedDefinitions::from_json_file(path)?;
        self.seed(&definitions)
    }
}
