use crate::i18n::{RegistryConfig, DEFAULT_SEED_BATCH_SIZE, ENGLISH};
use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: String,

    // Locales
    pub default_locale: String,

    // Seeding
    pub seed_file: String,
    pub seed_batch_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let seed_batch_size = match std::env::var("TRANSLATABLE_SEED_BATCH_SIZE") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .context("TRANSLATABLE_SEED_BATCH_SIZE must be a positive integer")?,
            Err(_) => DEFAULT_SEED_BATCH_SIZE,
        };
        if seed_batch_size == 0 {
            bail!("TRANSLATABLE_SEED_BATCH_SIZE must be greater than 0");
        }

        Ok(Self {
            database_path: std::env::var("TRANSLATABLE_DATABASE_PATH")
                .unwrap_or_else(|_| "translatable.db".to_string()),

            default_locale: std::env::var("TRANSLATABLE_DEFAULT_LOCALE")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| ENGLISH.to_string()),

            seed_file: std::env::var("TRANSLATABLE_SEED_FILE")
                .unwrap_or_else(|_| "data/locales.json".to_string()),
            seed_batch_size,
        })
    }

    /// Settings consumed by `LocaleRegistry`.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            default_locale: self.default_locale.clone(),
            seed_batch_size: self.seed_batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "TRANSLATABLE_DATABASE_PATH",
        "TRANSLATABLE_DEFAULT_LOCALE",
        "TRANSLATABLE_SEED_FILE",
        "TRANSLATABLE_SEED_BATCH_SIZE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().expect("Should load defaults");

        assert_eq!(config.database_path, "translatable.db");
        assert_eq!(config.default_locale, "en");
        assert_eq!(config.seed_file, "data/locales.json");
        assert_eq!(config.seed_batch_size, 100);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("TRANSLATABLE_DATABASE_PATH", "/tmp/t.db");
        std::env::set_var("TRANSLATABLE_DEFAULT_LOCALE", "fr");
        std::env::set_var("TRANSLATABLE_SEED_BATCH_SIZE", "25");

        let config = Config::from_env().expect("Should load");
        let registry_config = config.registry_config();
        clear_env();

        assert_eq!(config.database_path, "/tmp/t.db");
        assert_eq!(registry_config.default_locale, "fr");
        assert_eq!(registry_config.seed_batch_size, 25);
    }

    #[test]
    #[serial]
    fn test_invalid_batch_size() {
        clear_env();
        std::env::set_var("TRANSLATABLE_SEED_BATCH_SIZE", "lots");
        let result = Config::from_env();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_zero_batch_size() {
        clear_env();
        std::env::set_var("TRANSLATABLE_SEED_BATCH_SIZE", "0");
        let result = Config::from_env();
        clear_env();
        assert!(result.unwrap_err().to_string().contains("greater than 0"));
    }
}
