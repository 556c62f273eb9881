use super::Storage;
use crate::error::StorageError;
use crate::i18n::{Locale, NewLocale};
use crate::translatable::TranslationRow;
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS locales (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        iso_code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        charset TEXT,
        rtl INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS translations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        translatable_type TEXT NOT NULL,
        translatable_id INTEGER NOT NULL,
        locale_id INTEGER NOT NULL,
        property TEXT NOT NULL,
        property_value TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS translations_owner_locale_property
        ON translations (translatable_type, translatable_id, locale_id, property);
";

const ROW_COLUMNS: &str = "id, translatable_type, translatable_id, locale_id, property, \
                           property_value, created_at, updated_at";

/// Bound parameters per statement allowed by SQLite (`SQLITE_MAX_VARIABLE_NUMBER`).
const MAX_BOUND_PARAMS: usize = 32766;

/// Each locale row binds four parameters.
const MAX_LOCALES_PER_INSERT: usize = MAX_BOUND_PARAMS / 4;

/// SQLite-backed storage. Clones share the same connection.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn new(database_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(database_path.as_ref())?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` inside a transaction; roll back if it fails.
    fn transaction<T>(
        conn: &Connection,
        f: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        conn.execute("BEGIN TRANSACTION", [])?;

        match f(conn) {
            Ok(value) => {
                conn.execute("COMMIT", [])?;
                Ok(value)
            }
            Err(e) => {
                warn!("Transaction failed, rolling back: {}", e);
                conn.execute("ROLLBACK", [])?;
                Err(e)
            }
        }
    }
}

/// Translate constraint violations into `Conflict`.
fn map_constraint(err: rusqlite::Error, what: impl FnOnce() -> String) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::Conflict(what())
        }
        _ => StorageError::Sqlite(err),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Decode(format!("timestamp '{}': {}", raw, e)))
}

type RawRow = (i64, String, i64, i64, String, String, String, String);

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn row_from_raw(raw: RawRow) -> Result<TranslationRow, StorageError> {
    let (
        id,
        translatable_type,
        translatable_id,
        locale_id,
        property,
        property_value,
        created,
        updated,
    ) = raw;
    Ok(TranslationRow {
        id: Some(id),
        translatable_type,
        translatable_id,
        locale_id,
        property,
        property_value,
        created_at: Some(parse_timestamp(&created)?),
        updated_at: Some(parse_timestamp(&updated)?),
    })
}

fn insert_row(conn: &Connection, row: &TranslationRow, now: &str) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO translations
            (translatable_type, translatable_id, locale_id, property, property_value,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            row.translatable_type,
            row.translatable_id,
            row.locale_id,
            row.property,
            row.property_value,
            now
        ],
    )
    .map_err(|e| {
        map_constraint(e, || {
            format!(
                "translation {}#{} locale {} property '{}' already exists",
                row.translatable_type, row.translatable_id, row.locale_id, row.property
            )
        })
    })?;
    Ok(conn.last_insert_rowid())
}

impl Storage for SqliteStorage {
    fn insert_locale(&self, locale: &NewLocale) -> Result<Locale, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO locales (iso_code, name, charset, rtl) VALUES (?1, ?2, ?3, ?4)",
            params![locale.iso_code, locale.name, locale.charset, locale.rtl],
        )
        .map_err(|e| map_constraint(e, || format!("locale '{}' already exists", locale.iso_code)))?;

        Ok(locale.clone().into_locale(conn.last_insert_rowid()))
    }

    fn all_locales(&self) -> Result<Vec<Locale>, StorageError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, iso_code, name, charset, rtl FROM locales ORDER BY id")?;

        let locales = stmt
            .query_map([], |row| {
                Ok(Locale {
                    id: row.get(0)?,
                    iso_code: row.get(1)?,
                    name: row.get(2)?,
                    charset: row.get(3)?,
                    rtl: row.get::<_, i64>(4)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(locales)
    }

    fn locale_code_exists(&self, iso_code: &str) -> Result<bool, StorageError> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM locales WHERE iso_code = ?1",
            params![iso_code],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_locales(
        &self,
        locales: &[NewLocale],
        batch_size: usize,
    ) -> Result<usize, StorageError> {
        if locales.is_empty() {
            return Ok(0);
        }
        let conn = self.conn();

        Self::transaction(&conn, |conn| {
            let mut inserted = 0;
            for chunk in locales.chunks(batch_size.clamp(1, MAX_LOCALES_PER_INSERT)) {
                let placeholders = vec!["(?, ?, ?, ?)"; chunk.len()].join(", ");
                let sql = format!(
                    "INSERT INTO locales (iso_code, name, charset, rtl) VALUES {}",
                    placeholders
                );
                let values = chunk.iter().flat_map(|l| {
                    [
                        SqlValue::Text(l.iso_code.clone()),
                        SqlValue::Text(l.name.clone()),
                        l.charset.clone().map_or(SqlValue::Null, SqlValue::Text),
                        SqlValue::Integer(i64::from(l.rtl)),
                    ]
                });
                inserted += conn
                    .execute(&sql, params_from_iter(values))
                    .map_err(|e| {
                        map_constraint(e, || "duplicate iso_code in seed batch".to_string())
                    })?;
                debug!("Inserted locale batch of {}", chunk.len());
            }
            Ok(inserted)
        })
    }

    fn find_translations(
        &self,
        translatable_type: &str,
        translatable_id: i64,
        locale_id: Option<i64>,
    ) -> Result<Vec<TranslationRow>, StorageError> {
        let conn = self.conn();

        let raw_rows = match locale_id {
            Some(locale_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM translations
                     WHERE translatable_type = ?1 AND translatable_id = ?2 AND locale_id = ?3
                     ORDER BY id",
                    ROW_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![translatable_type, translatable_id, locale_id], raw_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM translations
                     WHERE translatable_type = ?1 AND translatable_id = ?2
                     ORDER BY id",
                    ROW_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![translatable_type, translatable_id], raw_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        raw_rows.into_iter().map(row_from_raw).collect()
    }

    fn save_translation(&self, row: &mut TranslationRow) -> Result<(), StorageError> {
        let conn = self.conn();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        match row.id {
            None => {
                let id = insert_row(&conn, row, &now_str)?;
                row.id = Some(id);
                row.created_at = Some(now);
                row.updated_at = Some(now);
            }
            Some(id) => {
                let updated = conn.execute(
                    "UPDATE translations SET property_value = ?1, updated_at = ?2 WHERE id = ?3",
                    params![row.property_value, now_str, id],
                )?;
                if updated == 0 {
                    return Err(StorageError::NotFound(id));
                }
                row.updated_at = Some(now);
            }
        }
        Ok(())
    }

    fn insert_translations(&self, rows: &[TranslationRow]) -> Result<usize, StorageError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        Self::transaction(&conn, |conn| {
            for row in rows {
                insert_row(conn, row, &now)?;
            }
            Ok(rows.len())
        })
    }

    fn delete_translations(
        &self,
        translatable_type: &str,
        translatable_id: i64,
    ) -> Result<usize, StorageError> {
        let conn = self.conn();
        let deleted = conn.execute(
            "DELETE FROM translations WHERE translatable_type = ?1 AND translatable_id = ?2",
            params![translatable_type, translatable_id],
        )?;
        Ok(deleted)
    }
}
