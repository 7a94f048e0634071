use crate::error::{LineageError, Result};
use crate::github::RepoSlug;
use crate::model::SCHEMA_VERSION;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Base SHAs already resolved on earlier runs.
pub struct BaseShaCache {
    conn: Connection,
}

impl BaseShaCache {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        std::fs::create_dir_all(cache_dir)?;
        let conn = Connection::open(cache_dir.join("cache.db"))?;
        let cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&self) -> Result<()> {
        match self.stored_version()? {
            0 => self
                .conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?,
            v if v == SCHEMA_VERSION => {}
            v => {
                return Err(LineageError::Cache(format!(
                    "cache.db was written with schema {v}, expected {SCHEMA_VERSION}"
                )))
            }
        }

        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS base_shas (
                owner TEXT NOT NULL,
                repo TEXT NOT NULL,
                number INTEGER NOT NULL,
                sha TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (owner, repo, number)
            );
            ",
        )?;
        Ok(())
    }

    fn stored_version(&self) -> Result<u32> {
        Ok(self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    pub fn get(&self, slug: &RepoSlug, number: i64) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT sha FROM base_shas WHERE owner = ? AND repo = ? AND number = ?",
                params![slug.owner, slug.name, number],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn store(&mut self, entries: &[(RepoSlug, i64, String)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO base_shas (owner, repo, number, sha, fetched_at)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            let now = Utc::now();
            for (slug, number, sha) in entries {
                stmt.execute(params![slug.owner, slug.name, number, sha, now])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM base_shas", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
