//! Translatable entities and their per-instance translation cache.
//!
//! Any entity type opts in by implementing [`Translatable`]: it names itself
//! (type + id), declares which properties may be translated, and owns a
//! [`TranslationState`]. [`TranslationStore`] and [`TranslationReconciler`]
//! work generically over that trait.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Post { id: i64, translations: TranslationState }
//!
//! impl Translatable for Post {
//!     fn translatable_type(&self) -> &str { "post" }
//!     fn translatable_id(&self) -> i64 { self.id }
//!     fn translatable_keys(&self) -> &[&str] { &["title", "body"] }
//!     fn translation_state(&self) -> &TranslationState { &self.translations }
//!     fn translation_state_mut(&mut self) -> &mut TranslationState { &mut self.translations }
//! }
//!
//! store.load_translation(&mut post, None)?;
//! let title = post.translated("title");
//! ```

mod reconciler;
mod row;
mod store;

pub use reconciler::{SaveReport, TranslationReconciler, PROPERTY_TRANSLATIONS_KEY};
pub use row::TranslationRow;
pub use store::TranslationStore;

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Capability implemented by every entity whose properties can be translated.
pub trait Translatable {
    /// Entity type used as the polymorphic owner discriminator (e.g. "post").
    fn translatable_type(&self) -> &str;

    /// Entity id within its type.
    fn translatable_id(&self) -> i64;

    /// Property names accepted by `save_translations`.
    fn translatable_keys(&self) -> &[&str];

    /// Compute the stored value from a raw input value.
    fn mutate_translation_value(&self, _key: &str, value: &Value) -> String {
        value_to_string(value)
    }

    /// Whether deletion of this entity is normally a soft delete.
    fn uses_soft_deletes(&self) -> bool {
        false
    }

    fn translation_state(&self) -> &TranslationState;

    fn translation_state_mut(&mut self) -> &mut TranslationState;

    /// Resolved translated value of a property, if one was loaded or saved.
    fn translated(&self, key: &str) -> Option<&str> {
        self.translation_state().attribute(key)
    }
}

/// Render a JSON value as stored text: strings verbatim, `null` as empty.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// How an entity is being deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Entity is only flagged as deleted (if it supports soft deletes)
    Soft,
    /// Entity row is permanently removed
    Hard,
}

/// Per-instance translation cache plus the dynamic attribute overlay.
///
/// Only the overlay is serialized, so cached rows never leak into an entity's
/// generic serialization; embed with `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranslationState {
    #[serde(skip)]
    groups: BTreeMap<i64, Vec<TranslationRow>>,
    #[serde(flatten)]
    attributes: BTreeMap<String, String>,
}

impl TranslationState {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Cache ====================

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn has_group(&self, locale_id: i64) -> bool {
        self.groups.contains_key(&locale_id)
    }

    pub fn group(&self, locale_id: i64) -> Option<&[TranslationRow]> {
        self.groups.get(&locale_id).map(Vec::as_slice)
    }

    /// Cached locale ids in ascending order.
    pub fn locale_ids(&self) -> Vec<i64> {
        self.groups.keys().copied().collect()
    }

    /// Group with the lowest locale id.
    pub fn first_group(&self) -> Option<(i64, &[TranslationRow])> {
        self.groups
            .iter()
            .next()
            .map(|(id, rows)| (*id, rows.as_slice()))
    }

    pub fn set_group(&mut self, locale_id: i64, rows: Vec<TranslationRow>) {
        self.groups.insert(locale_id, rows);
    }

    /// Append a row to its locale group, creating the group if needed.
    pub fn push_row(&mut self, row: TranslationRow) {
        self.groups.entry(row.locale_id).or_default().push(row);
    }

    /// Replace a cached row with the same id; append it if not cached.
    pub fn replace_row(&mut self, row: TranslationRow) {
        let group = self.groups.entry(row.locale_id).or_default();
        match group.iter_mut().find(|cached| cached.id.is_some() && cached.id == row.id) {
            Some(cached) => *cached = row,
            None => group.push(row),
        }
    }

    pub fn clear_cache(&mut self) {
        self.groups.clear();
    }

    // ==================== Attribute Overlay ====================

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn clear_attributes(&mut self) {
        self.attributes.clear();
    }
}

/// Property map of one locale, with the locale id embedded.
///
/// Serializes flat: `{"title": "Bonjour", "locale_id": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleTranslation {
    pub locale_id: i64,
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
}

impl LocaleTranslation {
    /// Reduce rows to a property map; later rows win on duplicate properties.
    pub fn from_rows(locale_id: i64, rows: &[TranslationRow]) -> Self {
        let properties = rows
            .iter()
            .map(|row| (row.property.clone(), row.property_value.clone()))
            .collect();
        Self {
            locale_id,
            properties,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize)]
    struct Post {
        id: i64,
        slug: String,
        #[serde(flatten)]
        translations: TranslationState,
    }

    fn row(id: i64, locale_id: i64, property: &str, value: &str) -> TranslationRow {
        let mut row = TranslationRow::new("post", 1, locale_id, property).with_value(value);
        row.id = Some(id);
        row
    }

    // ==================== TranslationState Tests ====================

    #[test]
    fn test_groups_are_ordered_by_locale_id() {
        let mut state = TranslationState::new();
        state.push_row(row(1, 5, "title", "Hallo"));
        state.push_row(row(2, 3, "title", "Bonjour"));

        assert_eq!(state.locale_ids(), vec![3, 5]);
        assert_eq!(state.first_group().map(|(id, _)| id), Some(3));
    }

    #[test]
    fn test_replace_row_updates_in_place() {
        let mut state = TranslationState::new();
        state.push_row(row(1, 2, "title", "Bonjour"));
        state.push_row(row(2, 2, "body", "Texte"));

        state.replace_row(row(1, 2, "title", "Salut"));

        let group = state.group(2).unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].property_value, "Salut");
    }

    #[test]
    fn test_replace_row_appends_unknown_row() {
        let mut state = TranslationState::new();
        state.replace_row(row(7, 2, "title", "Salut"));
        assert_eq!(state.group(2).unwrap().len(), 1);
    }

    #[test]
    fn test_serialization_hides_cached_rows() {
        let mut translations = TranslationState::new();
        translations.push_row(row(1, 2, "title", "Bonjour"));
        translations.set_attribute("title", "Bonjour");

        let post = Post {
            id: 1,
            slug: "hello".to_string(),
            translations,
        };

        let json = serde_json::to_value(&post).expect("Should serialize");
        assert_eq!(json, json!({"id": 1, "slug": "hello", "title": "Bonjour"}));
    }

    // ==================== LocaleTranslation Tests ====================

    #[test]
    fn test_locale_translation_serializes_flat() {
        let translation = LocaleTranslation::from_rows(2, &[row(1, 2, "title", "Bonjour")]);
        let json = serde_json::to_value(&translation).expect("Should serialize");
        assert_eq!(json, json!({"title": "Bonjour", "locale_id": 2}));
    }

    #[test]
    fn test_locale_translation_later_rows_win() {
        let translation = LocaleTranslation::from_rows(
            2,
            &[row(1, 2, "title", "Old"), row(2, 2, "title", "New")],
        );
        assert_eq!(translation.get("title"), Some("New"));
    }

    // ==================== value_to_string Tests ====================

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("Salut")), "Salut");
        assert_eq!(value_to_string(&json!(null)), "");
        assert_eq!(value_to_string(&json!(42)), "42");
        assert_eq!(value_to_string(&json!(true)), "true");
    }
}
