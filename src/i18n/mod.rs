//! Locale management.
//!
//! # Architecture
//!
//! - `locale`: Locale records, raw registration input and normalization
//! - `registry`: Code↔id mapping with a shared cache and the default locale
//! - `seed`: Static locale definitions for bulk seeding
//! - `request`: Provider of the current request's locale code
//! - `metrics`: Cache hit/miss/reload counters
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use translatable_models::cache::MemoryCache;
//! use translatable_models::i18n::{LocaleInput, LocaleRegistry};
//! use translatable_models::storage::MemoryStorage;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let registry = LocaleRegistry::new(storage, Arc::new(MemoryCache::new()));
//! registry.add(LocaleInput::new("fr", "French"))?;
//!
//! // Unknown codes fall back to the default locale
//! let id = registry.id("xx")?;
//! ```

mod locale;
mod metrics;
mod registry;
mod request;
mod seed;

pub use locale::{is_truthy, Locale, LocaleInput, NewLocale, ENGLISH};
pub use metrics::{CacheMetrics, MetricsReport};
pub use registry::{
    LocaleRegistry, RegistryConfig, DEFAULT_SEED_BATCH_SIZE, LOCALES_CACHE_KEY,
    LOCALE_IDS_CACHE_KEY,
};
pub use request::{RequestLocale, SharedLocale};
pub use seed::{SeedDefinitions, SeedEntry};
