//! Sqlite-backed persistence.
//!
//! Holds the application settings row and the per-document flag store
//! (`col1ScrollTop`, `openToc`, `twoCols`, `darkMode`).

use std::path::Path;

use anyhow::Context as _;
use bifocals_core::{FlagStore, Settings};
use rusqlite::{Connection, OptionalExtension as _};

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                settings_json TEXT NOT NULL DEFAULT '{}'
            );
            INSERT OR IGNORE INTO settings (id, settings_json) VALUES (1, '{}');

            CREATE TABLE IF NOT EXISTS flags (
                scope TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
                PRIMARY KEY (scope, key)
            );
            "#,
            )
            .context("migrate storage schema")?;
        Ok(())
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT settings_json FROM settings WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        let mut settings = match json.as_deref() {
            Some(json) => serde_json::from_str::<Settings>(json).unwrap_or_else(|err| {
                log::warn!("storage: ignoring unreadable settings: {err}");
                Settings::default()
            }),
            None => Settings::default(),
        };
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();
        let json = serde_json::to_string(&settings)?;
        self.conn.execute(
            "INSERT INTO settings (id, settings_json) VALUES (1, ?)
             ON CONFLICT(id) DO UPDATE SET settings_json = excluded.settings_json",
            [json],
        )?;
        Ok(())
    }

    pub fn flag(&self, scope: &str, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM flags WHERE scope = ? AND key = ?",
                (scope, key),
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_flag(&self, scope: &str, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO flags (scope, key, value, updated_at) VALUES (?, ?, ?, unixepoch())
            ON CONFLICT(scope, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            (scope, key, value),
        )?;
        Ok(())
    }

    /// Flag store bound to one document.
    pub fn scoped(self, scope: impl Into<String>) -> ScopedFlags {
        ScopedFlags {
            storage: self,
            scope: scope.into(),
        }
    }
}

#[derive(Debug)]
pub struct ScopedFlags {
    storage: Storage,
    scope: String,
}

impl FlagStore for ScopedFlags {
    fn get(&self, key: &str) -> Option<String> {
        match self.storage.flag(&self.scope, key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("storage: read {key} for {}: {err:#}", self.scope);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Err(err) = self.storage.set_flag(&self.scope, key, value) {
            log::warn!("storage: write {key} for {}: {err:#}", self.scope);
        }
    }
}
