use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use translatable_models::cache::MemoryCache;
use translatable_models::config;
use translatable_models::i18n::LocaleRegistry;
use translatable_models::storage::SqliteStorage;

fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translatable_models=info".parse()?)
                .add_directive("translatable_seed=info".parse()?),
        )
        .init();

    info!("Starting locale seeding");

    let config = config::Config::from_env()?;

    let storage = SqliteStorage::new(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;
    let registry = LocaleRegistry::with_config(
        Arc::new(storage),
        Arc::new(MemoryCache::global()),
        config.registry_config(),
    );

    let inserted = registry
        .seed_from_file(&config.seed_file)
        .with_context(|| format!("Failed to seed locales from {}", config.seed_file))?;
    info!("Inserted {} new locales from {}", inserted, config.seed_file);

    let locales = registry.locales().context("Failed to list locales")?;
    for locale in &locales {
        info!(
            "  {:>3} {:<8} {}{}",
            locale.id,
            locale.iso_code,
            locale.name,
            if locale.rtl { " (rtl)" } else { "" }
        );
    }

    if !registry.supports(&config.default_locale)? {
        warn!(
            "Default locale '{}' is not registered; lookups of unknown codes will fail",
            config.default_locale
        );
    }

    info!("✓ {} locales registered", locales.len());
    Ok(())
}
