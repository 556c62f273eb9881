//! Multilingual attribute translations for arbitrary entities.
//!
//! - [`i18n::LocaleRegistry`] maps locale codes to ids and holds the default locale.
//! - [`translatable::TranslationStore`] caches an entity's rows per locale and
//!   resolves the translation to show for the current request.
//! - [`translatable::TranslationReconciler`] persists property updates and keeps
//!   the cache in sync.
//!
//! Storage and the shared cache are collaborators behind the
//! [`storage::Storage`] and [`cache::SharedCache`] traits.

pub mod cache;
pub mod config;
pub mod error;
pub mod i18n;
pub mod storage;
pub mod translatable;

pub use error::{Error, Result};
