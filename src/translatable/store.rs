//! Loading, caching and resolving an entity's translation rows.
//!
//! Resolution order for "the translation to show now":
//!
//! 1. the request locale's group (an unsupported request locale is replaced
//!    by English),
//! 2. the English group,
//! 3. the group with the lowest locale id,
//! 4. nothing, if no group is cached.

use super::{DeleteMode, LocaleTranslation, Translatable, TranslationRow};
use crate::error::{Error, Result};
use crate::i18n::{CacheMetrics, LocaleRegistry, RequestLocale, ENGLISH};
use crate::storage::Storage;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Accessor over translatable entities' rows and per-instance caches.
pub struct TranslationStore {
    storage: Arc<dyn Storage>,
    registry: Arc<LocaleRegistry>,
    request_locale: Arc<dyn RequestLocale>,
    metrics: CacheMetrics,
}

impl TranslationStore {
    pub fn new(
        storage: Arc<dyn Storage>,
        registry: Arc<LocaleRegistry>,
        request_locale: Arc<dyn RequestLocale>,
    ) -> Self {
        Self {
            storage,
            registry,
            request_locale,
            metrics: CacheMetrics::new(),
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn registry(&self) -> &LocaleRegistry {
        &self.registry
    }

    /// Counters for per-locale cache hits, misses and storage loads.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn all_rows<T: Translatable + ?Sized>(&self, entity: &T) -> Result<Vec<TranslationRow>> {
        let rows = self
            .storage
            .find_translations(entity.translatable_type(), entity.translatable_id(), None)?;
        Ok(rows)
    }

    // ==================== Loading ====================

    /// Group rows into the entity's cache and copy the resolved locale's
    /// values onto its attribute overlay.
    ///
    /// Without explicit rows the entity's full row set is fetched. An empty
    /// row set leaves the overlay untouched.
    pub fn load_translation<T: Translatable + ?Sized>(
        &self,
        entity: &mut T,
        rows: Option<Vec<TranslationRow>>,
    ) -> Result<()> {
        let rows = match rows {
            Some(rows) => rows,
            None => {
                self.metrics.record_reload();
                self.all_rows(entity)?
            }
        };
        if rows.is_empty() {
            debug!(
                "No translations for {}#{}",
                entity.translatable_type(),
                entity.translatable_id()
            );
            return Ok(());
        }

        let state = entity.translation_state_mut();
        for (locale_id, group) in group_by_locale(rows) {
            state.set_group(locale_id, group);
        }

        let resolved: Vec<(String, String)> = self
            .translation_of_current_request(entity)?
            .map(|(_, rows)| {
                rows.iter()
                    .map(|row| (row.property.clone(), row.property_value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let state = entity.translation_state_mut();
        for (property, value) in &resolved {
            state.set_attribute(property, value);
        }
        Ok(())
    }

    /// Drop the entity's cached rows and load them again from storage.
    pub fn reload<T: Translatable + ?Sized>(&self, entity: &mut T) -> Result<()> {
        entity.translation_state_mut().clear_cache();
        self.load_translation(entity, None)
    }

    // ==================== Resolution ====================

    /// Id of the English locale, or of the default locale when English is not
    /// registered; `None` when neither is.
    fn english_id(&self) -> Result<Option<i64>> {
        match self.registry.id(ENGLISH) {
            Ok(id) => Ok(Some(id)),
            Err(Error::LocaleNotSupported(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Cached group to show for the current request, with its locale id.
    pub fn translation_of_current_request<'e, T: Translatable + ?Sized>(
        &self,
        entity: &'e T,
    ) -> Result<Option<(i64, &'e [TranslationRow])>> {
        let state = entity.translation_state();
        if state.is_empty() {
            return Ok(None);
        }

        let requested = self.request_locale.current_locale();
        let english_id = self.english_id()?;
        let requested_id = if self.registry.supports(&requested)? {
            Some(self.registry.id(&requested)?)
        } else {
            english_id
        };

        for locale_id in [requested_id, english_id].into_iter().flatten() {
            if let Some(rows) = state.group(locale_id) {
                debug!("Resolved translation for '{}' to locale {}", requested, locale_id);
                return Ok(Some((locale_id, rows)));
            }
        }

        let first = state.first_group();
        if let Some((locale_id, _)) = first {
            debug!(
                "No '{}' or English translation, using first available locale {}",
                requested, locale_id
            );
        }
        Ok(first)
    }

    // ==================== Accessors ====================

    /// Cached rows for a locale, loading (and caching, even if empty) on a miss.
    pub fn get_translation_of_locale<'e, T: Translatable + ?Sized>(
        &self,
        entity: &'e mut T,
        locale_id: i64,
    ) -> Result<&'e [TranslationRow]> {
        if entity.translation_state().has_group(locale_id) {
            self.metrics.record_cache_hit();
        } else {
            self.metrics.record_cache_miss();
            let rows = self.storage.find_translations(
                entity.translatable_type(),
                entity.translatable_id(),
                Some(locale_id),
            )?;
            entity.translation_state_mut().set_group(locale_id, rows);
        }

        Ok(entity
            .translation_state()
            .group(locale_id)
            .unwrap_or_default())
    }

    /// Property map for a locale, with `locale_id` embedded.
    pub fn get_translation<T: Translatable + ?Sized>(
        &self,
        entity: &mut T,
        locale_id: i64,
    ) -> Result<LocaleTranslation> {
        let rows = self.get_translation_of_locale(entity, locale_id)?;
        Ok(LocaleTranslation::from_rows(locale_id, rows))
    }

    /// Row for one property in one locale, if it exists.
    pub fn get_translation_model<T: Translatable + ?Sized>(
        &self,
        entity: &mut T,
        key: &str,
        locale_id: i64,
    ) -> Result<Option<TranslationRow>> {
        let rows = self.get_translation_of_locale(entity, locale_id)?;
        Ok(rows.iter().find(|row| row.property == key).cloned())
    }

    /// Every locale's property map, ordered by locale id.
    pub fn all_translations<T: Translatable + ?Sized>(
        &self,
        entity: &T,
    ) -> Result<Vec<LocaleTranslation>> {
        let rows = self.all_rows(entity)?;
        Ok(group_by_locale(rows)
            .into_iter()
            .map(|(locale_id, group)| LocaleTranslation::from_rows(locale_id, &group))
            .collect())
    }

    // ==================== Deletion ====================

    /// Deletion hook: remove the entity's rows unless this is a soft delete
    /// of an entity that supports soft deletes. Returns the number removed.
    pub fn delete_translations<T: Translatable + ?Sized>(
        &self,
        entity: &mut T,
        mode: DeleteMode,
    ) -> Result<usize> {
        if entity.uses_soft_deletes() && mode == DeleteMode::Soft {
            debug!(
                "Soft delete of {}#{}, keeping translations",
                entity.translatable_type(),
                entity.translatable_id()
            );
            return Ok(0);
        }

        let deleted = self
            .storage
            .delete_translations(entity.translatable_type(), entity.translatable_id())?;

        let state = entity.translation_state_mut();
        state.clear_cache();
        state.clear_attributes();

        debug!(
            "Deleted {} translations of {}#{}",
            deleted,
            entity.translatable_type(),
            entity.translatable_id()
        );
        Ok(deleted)
    }
}

fn group_by_locale(rows: Vec<TranslationRow>) -> BTreeMap<i64, Vec<TranslationRow>> {
    let mut groups: BTreeMap<i64, Vec<TranslationRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.locale_id).or_default().push(row);
    }
    groups
}
