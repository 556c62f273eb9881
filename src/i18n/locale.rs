//! Locale records and the raw input used to register them.
//!
//! `Locale` is what storage hands back. `LocaleInput` is the loosely-typed
//! payload accepted by `LocaleRegistry::add`, and `NewLocale` is the validated,
//! normalized form that storage inserts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Code of the locale used as the resolution fallback.
pub const ENGLISH: &str = "en";

/// A registered locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    /// Stable numeric identifier assigned by storage
    pub id: i64,

    /// ISO code (e.g., "en", "fr", "pt-BR"), unique across locales
    pub iso_code: String,

    /// Display name (e.g., "English")
    pub name: String,

    /// Optional charset hint (e.g., "UTF-8")
    pub charset: Option<String>,

    /// Whether the script is written right-to-left
    pub rtl: bool,
}

/// Raw locale payload, as received from a form or JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocaleInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub iso_code: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub rtl: Option<Value>,
}

impl LocaleInput {
    pub fn new(iso_code: &str, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            iso_code: Some(iso_code.to_string()),
            ..Self::default()
        }
    }

    pub fn with_charset(mut self, charset: &str) -> Self {
        self.charset = Some(charset.to_string());
        self
    }

    pub fn with_rtl(mut self, rtl: impl Into<Value>) -> Self {
        self.rtl = Some(rtl.into());
        self
    }

    /// Trimmed name, `None` when missing or blank.
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Trimmed ISO code, `None` when missing or blank.
    pub fn iso_code(&self) -> Option<&str> {
        non_blank(self.iso_code.as_deref())
    }

    /// Normalize into an insertable locale. Returns `None` if a required
    /// field is missing; uniqueness is checked by the registry.
    pub fn normalize(&self) -> Option<NewLocale> {
        Some(NewLocale {
            iso_code: self.iso_code()?.to_string(),
            name: self.name()?.to_string(),
            charset: non_blank(self.charset.as_deref()).map(str::to_string),
            rtl: self.rtl.as_ref().map(is_truthy).unwrap_or(false),
        })
    }
}

/// A validated locale ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocale {
    pub iso_code: String,
    pub name: String,
    pub charset: Option<String>,
    pub rtl: bool,
}

impl NewLocale {
    pub fn into_locale(self, id: i64) -> Locale {
        Locale {
            id,
            iso_code: self.iso_code,
            name: self.name,
            charset: self.charset,
            rtl: self.rtl,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Form-style truthiness for loosely typed flags.
///
/// `null`, `false`, `0`, empty strings, `"0"`, `"false"`, `"off"` and `"no"`
/// are false; everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            !matches!(s.as_str(), "" | "0" | "false" | "off" | "no")
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
