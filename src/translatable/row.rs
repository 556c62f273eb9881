use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One translated property value of one entity in one locale.
///
/// A row with `id == None` has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRow {
    pub id: Option<i64>,
    pub translatable_type: String,
    pub translatable_id: i64,
    pub locale_id: i64,
    pub property: String,
    pub property_value: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TranslationRow {
    /// Build an unsaved row bound to an entity, locale and property.
    pub fn new(
        translatable_type: &str,
        translatable_id: i64,
        locale_id: i64,
        property: &str,
    ) -> Self {
        Self {
            id: None,
            translatable_type: translatable_type.to_string(),
            translatable_id,
            locale_id,
            property: property.to_string(),
            property_value: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.property_value = value.to_string();
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Whether this row belongs to the given entity.
    pub fn belongs_to(&self, translatable_type: &str, translatable_id: i64) -> bool {
        self.translatable_type == translatable_type && self.translatable_id == translatable_id
    }
}
