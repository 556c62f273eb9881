//! Storage collaborator for locales and translation rows.
//!
//! Two backends are provided: `SqliteStorage` for persistent use and
//! `MemoryStorage` for tests and embedders that keep data elsewhere.

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::error::StorageError;
use crate::i18n::{Locale, NewLocale};
use crate::translatable::TranslationRow;

/// Persistence contract consumed by the registry, store and reconciler.
///
/// Calls are blocking. Implementations serialize access internally.
pub trait Storage: Send + Sync {
    /// Persist a new locale and return it with its assigned id.
    fn insert_locale(&self, locale: &NewLocale) -> Result<Locale, StorageError>;

    /// All locales, ordered by id.
    fn all_locales(&self) -> Result<Vec<Locale>, StorageError>;

    /// Whether a locale with this ISO code exists.
    fn locale_code_exists(&self, iso_code: &str) -> Result<bool, StorageError>;

    /// Insert locales in chunks of `batch_size` inside a single transaction.
    /// Either every locale is inserted or none is.
    fn insert_locales(
        &self,
        locales: &[NewLocale],
        batch_size: usize,
    ) -> Result<usize, StorageError>;

    /// Rows owned by an entity, optionally restricted to one locale, ordered by id.
    fn find_translations(
        &self,
        translatable_type: &str,
        translatable_id: i64,
        locale_id: Option<i64>,
    ) -> Result<Vec<TranslationRow>, StorageError>;

    /// Create (when `row.id` is `None`) or update a row. On success the row's
    /// id and timestamps reflect what was stored.
    fn save_translation(&self, row: &mut TranslationRow) -> Result<(), StorageError>;

    /// Insert many new rows inside a single transaction.
    fn insert_translations(&self, rows: &[TranslationRow]) -> Result<usize, StorageError>;

    /// Delete every row owned by an entity and return how many were removed.
    fn delete_translations(
        &self,
        translatable_type: &str,
        translatable_id: i64,
    ) -> Result<usize, StorageError>;
}
