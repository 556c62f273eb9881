//! Persisting property updates for one locale while keeping the entity's
//! cache and attribute overlay in sync with storage.
//!
//! Saves are best-effort per property: a storage failure for one key is
//! logged and reported, and the remaining keys are still processed.

use super::{Translatable, TranslationRow, TranslationStore};
use crate::error::Result;
use crate::i18n::is_truthy;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Key holding the per-locale entries in `save_all_translations` input.
pub const PROPERTY_TRANSLATIONS_KEY: &str = "property_translations";

/// Outcome of a save, per property key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Keys persisted successfully
    pub saved: Vec<String>,

    /// Keys ignored because they are not translatable
    pub skipped: Vec<String>,

    /// Keys whose persistence failed; cache and overlay were left unchanged
    pub failed: Vec<String>,

    /// `save_all_translations` entries ignored for lack of a `locale_id`
    pub skipped_entries: usize,
}

impl SaveReport {
    pub fn merge(&mut self, other: SaveReport) {
        self.saved.extend(other.saved);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
        self.skipped_entries += other.skipped_entries;
    }

    /// Whether every attempted key was persisted.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Create-or-update reconciliation of incoming translation values.
pub struct TranslationReconciler<'a> {
    store: &'a TranslationStore,
}

impl<'a> TranslationReconciler<'a> {
    pub fn new(store: &'a TranslationStore) -> Self {
        Self { store }
    }

    /// Save `properties` for one locale.
    ///
    /// Unless `allow_all_props` is set, keys outside the entity's
    /// translatable keys are skipped. Existing rows are updated in place;
    /// missing ones are created and appended to the locale's cached group.
    pub fn save_translations<T: Translatable + ?Sized>(
        &self,
        entity: &mut T,
        properties: &Map<String, Value>,
        locale_id: i64,
        allow_all_props: bool,
    ) -> Result<SaveReport> {
        let allowed: HashSet<String> = entity
            .translatable_keys()
            .iter()
            .map(|key| key.to_string())
            .collect();
        let mut report = SaveReport::default();

        for (key, value) in properties {
            if !allow_all_props && !allowed.contains(key) {
                debug!("Skipping non-translatable property '{}'", key);
                report.skipped.push(key.clone());
                continue;
            }

            let mut row = match self.store.get_translation_model(entity, key, locale_id)? {
                Some(row) => row,
                None => TranslationRow::new(
                    entity.translatable_type(),
                    entity.translatable_id(),
                    locale_id,
                    key,
                ),
            };
            let created = row.is_new();
            row.property_value = entity.mutate_translation_value(key, value);

            if let Err(e) = self.store.storage().save_translation(&mut row) {
                warn!(
                    "Failed to save '{}' for {}#{} locale {}: {}",
                    key,
                    entity.translatable_type(),
                    entity.translatable_id(),
                    locale_id,
                    e
                );
                report.failed.push(key.clone());
                continue;
            }

            let state = entity.translation_state_mut();
            state.set_attribute(key, &row.property_value);
            if created {
                state.push_row(row);
            } else {
                state.replace_row(row);
            }
            report.saved.push(key.clone());
        }

        Ok(report)
    }

    /// Save every entry of `data["property_translations"]`.
    ///
    /// Each entry is an object holding `locale_id` plus property keys; the
    /// collection may be an array or an object of entries. Entries without a
    /// truthy `locale_id` are skipped.
    pub fn save_all_translations<T: Translatable + ?Sized>(
        &self,
        entity: &mut T,
        data: &Value,
        allow_all_props: bool,
    ) -> Result<SaveReport> {
        let entries: Vec<&Value> = match data.get(PROPERTY_TRANSLATIONS_KEY) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Object(map)) => map.values().collect(),
            _ => Vec::new(),
        };

        let mut report = SaveReport::default();
        for entry in entries {
            let Some(fields) = entry.as_object() else {
                report.skipped_entries += 1;
                continue;
            };

            let mut properties = fields.clone();
            let locale_id = properties.remove("locale_id");
            match locale_id.as_ref().and_then(parse_locale_id) {
                Some(locale_id) => {
                    let saved =
                        self.save_translations(entity, &properties, locale_id, allow_all_props)?;
                    report.merge(saved);
                }
                None => {
                    debug!("Skipping translation entry without locale_id");
                    report.skipped_entries += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Accept truthy integer ids, given as numbers or numeric strings.
fn parse_locale_id(value: &Value) -> Option<i64> {
    if !is_truthy(value) {
        return None;
    }
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::StorageError;
    use crate::i18n::{Locale, LocaleInput, LocaleRegistry, NewLocale, SharedLocale};
    use crate::storage::{MemoryStorage, Storage};
    use crate::translatable::TranslationState;
    use serde_json::json;
    use std::sync::Arc;

    // ==================== Helper Functions ====================

    #[derive(Debug, Default)]
    struct Product {
        id: i64,
        translations: TranslationState,
    }

    impl Translatable for Product {
        fn translatable_type(&self) -> &str {
            "product"
        }

        fn translatable_id(&self) -> i64 {
            self.id
        }

        fn translatable_keys(&self) -> &[&str] {
            &["title", "slug"]
        }

        fn mutate_translation_value(&self, key: &str, value: &Value) -> String {
            let value = crate::translatable::value_to_string(value);
            if key == "slug" {
                value.trim().to_lowercase().replace(' ', "-")
            } else {
                value
            }
        }

        fn translation_state(&self) -> &TranslationState {
            &self.translations
        }

        fn translation_state_mut(&mut self) -> &mut TranslationState {
            &mut self.translations
        }
    }

    /// Storage that refuses to save one property name.
    struct RejectingStorage {
        inner: MemoryStorage,
        rejected: &'static str,
    }

    impl Storage for RejectingStorage {
        fn insert_locale(&self, locale: &NewLocale) -> std::result::Result<Locale, StorageError> {
            self.inner.insert_locale(locale)
        }
        fn all_locales(&self) -> std::result::Result<Vec<Locale>, StorageError> {
            self.inner.all_locales()
        }
        fn locale_code_exists(&self, iso_code: &str) -> std::result::Result<bool, StorageError> {
            self.inner.locale_code_exists(iso_code)
        }
        fn insert_locales(
            &self,
            locales: &[NewLocale],
            batch_size: usize,
        ) -> std::result::Result<usize, StorageError> {
            self.inner.insert_locales(locales, batch_size)
        }
        fn find_translations(
            &self,
            translatable_type: &str,
            translatable_id: i64,
            locale_id: Option<i64>,
        ) -> std::result::Result<Vec<TranslationRow>, StorageError> {
            self.inner.find_translations(translatable_type, translatable_id, locale_id)
        }
        fn save_translation(
            &self,
            row: &mut TranslationRow,
        ) -> std::result::Result<(), StorageError> {
            if row.property == self.rejected {
                return Err(StorageError::Conflict("rejected".to_string()));
            }
            self.inner.save_translation(row)
        }
        fn insert_translations(
            &self,
            rows: &[TranslationRow],
        ) -> std::result::Result<usize, StorageError> {
            self.inner.insert_translations(rows)
        }
        fn delete_translations(
            &self,
            translatable_type: &str,
            translatable_id: i64,
        ) -> std::result::Result<usize, StorageError> {
            self.inner.delete_translations(translatable_type, translatable_id)
        }
    }

    fn create_store(storage: Arc<dyn Storage>) -> TranslationStore {
        let registry = Arc::new(LocaleRegistry::new(storage.clone(), Arc::new(MemoryCache::new())));
        registry.add(LocaleInput::new("en", "English")).expect("Should add en");
        registry.add(LocaleInput::new("fr", "French")).expect("Should add fr");
        TranslationStore::new(storage, registry, Arc::new(SharedLocale::new("en")))
    }

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("Properties must be an object")
    }

    fn product(id: i64) -> Product {
        Product {
            id,
            ..Product::default()
        }
    }

    // ==================== save_translations Tests ====================

    #[test]
    fn test_save_creates_rows_and_updates_cache() {
        let storage = Arc::new(MemoryStorage::new());
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);

        let report = reconciler
            .save_translations(&mut p, &props(json!({"title": "Chaise"})), 2, false)
            .expect("Should save");

        assert_eq!(report.saved, vec!["title"]);
        assert_eq!(p.translated("title"), Some("Chaise"));
        let cached = p.translations.group(2).expect("Group should be cached");
        assert_eq!(cached.len(), 1);
        assert!(cached[0].id.is_some());
        assert_eq!(storage.translation_count(), 1);
    }

    #[test]
    fn test_save_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);
        let input = props(json!({"title": "Chaise", "slug": "chaise"}));

        reconciler.save_translations(&mut p, &input, 2, false).unwrap();
        reconciler.save_translations(&mut p, &input, 2, false).unwrap();

        assert_eq!(storage.translation_count(), 2);
        assert_eq!(p.translations.group(2).unwrap().len(), 2);
    }

    #[test]
    fn test_save_updates_existing_row() {
        let storage = Arc::new(MemoryStorage::new());
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);

        reconciler
            .save_translations(&mut p, &props(json!({"title": "Chaise"})), 2, false)
            .unwrap();

        // A fresh instance must find the stored row rather than insert
        let mut fresh = product(1);
        reconciler
            .save_translations(&mut fresh, &props(json!({"title": "Fauteuil"})), 2, false)
            .unwrap();

        let rows = storage.find_translations("product", 1, Some(2)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].property_value, "Fauteuil");
        assert_eq!(fresh.translations.group(2).unwrap()[0].property_value, "Fauteuil");
    }

    #[test]
    fn test_save_skips_non_translatable_keys() {
        let storage = Arc::new(MemoryStorage::new());
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);

        let report = reconciler
            .save_translations(&mut p, &props(json!({"title": "Chaise", "price": 10})), 2, false)
            .unwrap();

        assert_eq!(report.saved, vec!["title"]);
        assert_eq!(report.skipped, vec!["price"]);
        assert!(p.translated("price").is_none());
        assert_eq!(storage.translation_count(), 1);
    }

    #[test]
    fn test_save_allow_all_props() {
        let storage = Arc::new(MemoryStorage::new());
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);

        let report = reconciler
            .save_translations(&mut p, &props(json!({"price": 10})), 2, true)
            .unwrap();

        assert_eq!(report.saved, vec!["price"]);
        assert_eq!(p.translated("price"), Some("10"));
    }

    #[test]
    fn test_save_applies_value_mutation() {
        let storage = Arc::new(MemoryStorage::new());
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);

        reconciler
            .save_translations(&mut p, &props(json!({"slug": " Chaise Longue "})), 2, false)
            .unwrap();

        assert_eq!(p.translated("slug"), Some("chaise-longue"));
        let rows = storage.find_translations("product", 1, Some(2)).unwrap();
        assert_eq!(rows[0].property_value, "chaise-longue");
    }

    #[test]
    fn test_failed_persistence_skips_cache_and_continues() {
        let storage = Arc::new(RejectingStorage {
            inner: MemoryStorage::new(),
            rejected: "slug",
        });
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);
        p.translations.set_attribute("slug", "previous");

        let report = reconciler
            .save_translations(
                &mut p,
                &props(json!({"slug": "chaise", "title": "Chaise"})),
                2,
                false,
            )
            .unwrap();

        assert_eq!(report.failed, vec!["slug"]);
        assert_eq!(report.saved, vec!["title"]);
        assert!(!report.is_success());
        assert_eq!(p.translated("slug"), Some("previous"));
        assert_eq!(p.translated("title"), Some("Chaise"));
        let cached = p.translations.group(2).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].property, "title");
    }

    // ==================== save_all_translations Tests ====================

    #[test]
    fn test_save_all_skips_entries_without_locale() {
        let storage = Arc::new(MemoryStorage::new());
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);

        let data = json!({
            "property_translations": [
                {"locale_id": 2, "title": "Salut"},
                {"title": "NoLocale"}
            ]
        });
        let report = reconciler.save_all_translations(&mut p, &data, false).unwrap();

        assert_eq!(report.saved, vec!["title"]);
        assert_eq!(report.skipped_entries, 1);
        assert_eq!(storage.translation_count(), 1);
        let rows = storage.find_translations("product", 1, None).unwrap();
        assert_eq!(rows[0].locale_id, 2);
        assert_eq!(rows[0].property_value, "Salut");
    }

    #[test]
    fn test_save_all_accepts_object_and_string_ids() {
        let storage = Arc::new(MemoryStorage::new());
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);

        let data = json!({
            "property_translations": {
                "en": {"locale_id": "1", "title": "Chair"},
                "fr": {"locale_id": 2, "title": "Chaise"},
                "xx": {"locale_id": 0, "title": "Zero"},
                "yy": {"locale_id": "", "title": "Empty"}
            }
        });
        let report = reconciler.save_all_translations(&mut p, &data, false).unwrap();

        assert_eq!(report.saved.len(), 2);
        assert_eq!(report.skipped_entries, 2);
        assert_eq!(
            storage.find_translations("product", 1, Some(1)).unwrap()[0].property_value,
            "Chair"
        );
    }

    #[test]
    fn test_save_all_without_collection_is_noop() {
        let storage = Arc::new(MemoryStorage::new());
        let store = create_store(storage.clone());
        let reconciler = TranslationReconciler::new(&store);
        let mut p = product(1);

        let report = reconciler
            .save_all_translations(&mut p, &json!({"title": "x"}), false)
            .unwrap();

        assert_eq!(report, SaveReport::default());
        assert_eq!(storage.translation_count(), 0);
    }

    #[test]
    fn test_parse_locale_id() {
        assert_eq!(parse_locale_id(&json!(2)), Some(2));
        assert_eq!(parse_locale_id(&json!("3")), Some(3));
        assert_eq!(parse_locale_id(&json!(0)), None);
        assert_eq!(parse_locale_id(&json!("")), None);
        assert_eq!(parse_locale_id(&json!(null)), None);
        assert_eq!(parse_locale_id(&json!("fr")), None);
        assert_eq!(parse_locale_id(&json!(true)), None);
    }
}
