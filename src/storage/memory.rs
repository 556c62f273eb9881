use super::Storage;
use crate::error::StorageError;
use crate::i18n::{Locale, NewLocale};
use crate::translatable::TranslationRow;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    locales: Vec<Locale>,
    rows: Vec<TranslationRow>,
    next_locale_id: i64,
    next_row_id: i64,
}

impl State {
    fn allocate_locale_id(&mut self) -> i64 {
        self.next_locale_id += 1;
        self.next_locale_id
    }

    fn allocate_row_id(&mut self) -> i64 {
        self.next_row_id += 1;
        self.next_row_id
    }

    fn row_exists(&self, row: &TranslationRow) -> bool {
        self.rows.iter().any(|r| {
            r.belongs_to(&row.translatable_type, row.translatable_id)
                && r.locale_id == row.locale_id
                && r.property == row.property
        })
    }
}

/// In-memory storage with the same uniqueness rules as the SQLite schema.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total number of stored translation rows.
    pub fn translation_count(&self) -> usize {
        self.state().rows.len()
    }
}

fn conflict_for(row: &TranslationRow) -> StorageError {
    StorageError::Conflict(format!(
        "translation {}#{} locale {} property '{}' already exists",
        row.translatable_type, row.translatable_id, row.locale_id, row.property
    ))
}

impl Storage for MemoryStorage {
    fn insert_locale(&self, locale: &NewLocale) -> Result<Locale, StorageError> {
        let mut state = self.state();
        if state.locales.iter().any(|l| l.iso_code == locale.iso_code) {
            return Err(StorageError::Conflict(format!(
                "locale '{}' already exists",
                locale.iso_code
            )));
        }
        let id = state.allocate_locale_id();
        let created = locale.clone().into_locale(id);
        state.locales.push(created.clone());
        Ok(created)
    }

    fn all_locales(&self) -> Result<Vec<Locale>, StorageError> {
        Ok(self.state().locales.clone())
    }

    fn locale_code_exists(&self, iso_code: &str) -> Result<bool, StorageError> {
        Ok(self.state().locales.iter().any(|l| l.iso_code == iso_code))
    }

    fn insert_locales(
        &self,
        locales: &[NewLocale],
        batch_size: usize,
    ) -> Result<usize, StorageError> {
        let mut state = self.state();

        // Validate everything up front so a conflict leaves state untouched
        let mut seen: HashSet<&str> = state.locales.iter().map(|l| l.iso_code.as_str()).collect();
        for locale in locales {
            if !seen.insert(locale.iso_code.as_str()) {
                return Err(StorageError::Conflict(format!(
                    "locale '{}' already exists",
                    locale.iso_code
                )));
            }
        }

        for chunk in locales.chunks(batch_size.max(1)) {
            for locale in chunk {
                let id = state.allocate_locale_id();
                state.locales.push(locale.clone().into_locale(id));
            }
        }
        Ok(locales.len())
    }

    fn find_translations(
        &self,
        translatable_type: &str,
        translatable_id: i64,
        locale_id: Option<i64>,
    ) -> Result<Vec<TranslationRow>, StorageError> {
        Ok(self
            .state()
            .rows
            .iter()
            .filter(|r| r.belongs_to(translatable_type, translatable_id))
            .filter(|r| locale_id.map_or(true, |id| r.locale_id == id))
            .cloned()
            .collect())
    }

    fn save_translation(&self, row: &mut TranslationRow) -> Result<(), StorageError> {
        let mut state = self.state();
        let now = Utc::now();

        match row.id {
            None => {
                if state.row_exists(row) {
                    return Err(conflict_for(row));
                }
                row.id = Some(state.allocate_row_id());
                row.created_at = Some(now);
                row.updated_at = Some(now);
                state.rows.push(row.clone());
            }
            Some(id) => {
                let stored = state
                    .rows
                    .iter_mut()
                    .find(|r| r.id == Some(id))
                    .ok_or(StorageError::NotFound(id))?;
                stored.property_value = row.property_value.clone();
                stored.updated_at = Some(now);
                row.created_at = stored.created_at;
                row.updated_at = stored.updated_at;
            }
        }
        Ok(())
    }

    fn insert_translations(&self, rows: &[TranslationRow]) -> Result<usize, StorageError> {
        let mut state = self.state();

        let mut keys = HashSet::new();
        for row in rows {
            let key = (
                row.translatable_type.as_str(),
                row.translatable_id,
                row.locale_id,
                row.property.as_str(),
            );
            if state.row_exists(row) || !keys.insert(key) {
                return Err(conflict_for(row));
            }
        }

        let now = Utc::now();
        for row in rows {
            let mut stored = row.clone();
            stored.id = Some(state.allocate_row_id());
            stored.created_at = Some(now);
            stored.updated_at = Some(now);
            state.rows.push(stored);
        }
        Ok(rows.len())
    }

    fn delete_translations(
        &self,
        translatable_type: &str,
        translatable_id: i64,
    ) -> Result<usize, StorageError> {
        let mut state = self.state();
        let before = state.rows.len();
        state
            .rows
            .retain(|r| !r.belongs_to(translatable_type, translatable_id));
        Ok(before - state.rows.len())
    }
}
