//! Persistent storage using SQLite (rusqlite)
//!
//! This module provides:
//! - OS-standard data directory location (via `directories` crate)
//! - SQLite database with schema versioning
//! - The remembered session (identity) for each game variant
//! - The Venns round-points ledger, so a reload mid-round shows the same
//!   "points this round" figures
//! - The last player name typed in the lobby

use crate::config::Variant;
use crate::game::venns::ScoreLedger;
use crate::game::LocalIdentity;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use std::path::{Path, PathBuf};

/// Current schema version. Bump this when making schema changes.
/// Version history:
/// - v1: meta, sessions and ledgers tables
const SCHEMA_VERSION: u32 = 1;

const DB_FILE: &str = "huddle.db";

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// Database error from SQLite
    Database(rusqlite::Error),
    /// Could not determine data directory
    NoDataDirectory,
    /// Schema version mismatch (future version)
    FutureSchemaVersion { found: u32, supported: u32 },
    /// Failed to create data directory
    CreateDirFailed(std::io::Error),
    /// A stored JSON payload could not be read or written
    Payload(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Database(e) => write!(f, "database error: {}", e),
            StorageError::NoDataDirectory => write!(f, "could not determine data directory"),
            StorageError::FutureSchemaVersion { found, supported } => {
                write!(
                    f,
                    "database schema version {} is newer than supported version {}",
                    found, supported
                )
            }
            StorageError::CreateDirFailed(e) => write!(f, "failed to create data directory: {}", e),
            StorageError::Payload(e) => write!(f, "stored payload is invalid: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Payload(e)
    }
}

/// The storage handle for client-side state.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create the storage database.
    ///
    /// `dir` overrides the OS-standard location:
    /// - Linux: `$XDG_DATA_HOME/huddle/` or `~/.local/share/huddle/`
    /// - macOS: `~/Library/Application Support/huddle/`
    pub fn open(dir: Option<&Path>) -> Result<Self, StorageError> {
        let data_dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::data_dir()?,
        };

        std::fs::create_dir_all(&data_dir).map_err(StorageError::CreateDirFailed)?;

        let conn = Connection::open(data_dir.join(DB_FILE))?;
        let storage = Storage { conn };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage { conn };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Get the OS-standard data directory
    pub fn data_dir() -> Result<PathBuf, StorageError> {
        ProjectDirs::from("", "", "huddle")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StorageError::NoDataDirectory)
    }

    /// Get the last player name used in the lobby.
    pub fn handle(&self) -> SqlResult<Option<String>> {
        self.conn
            .query_row("SELECT handle FROM meta LIMIT 1", [], |row| row.get::<_, Option<String>>(0))
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                _ => Err(e),
            })
    }

    /// Remember the player name.
    pub fn set_handle(&self, handle: &str) -> SqlResult<()> {
        self.conn.execute("UPDATE meta SET handle = ?1", params![handle])?;
        Ok(())
    }

    /// The remembered identity for a variant, if any
    pub fn load_identity(&self, variant: Variant) -> Result<Option<LocalIdentity>, StorageError> {
        let identity = self
            .conn
            .query_row(
                "SELECT game_id, player_id, session_token, player_name, team
                 FROM sessions WHERE variant = ?1",
                params![variant.as_str()],
                |row| {
                    Ok(LocalIdentity {
                        game_id: row.get(0)?,
                        player_id: row.get(1)?,
                        session_token: row.get(2)?,
                        player_name: row.get(3)?,
                        team: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(identity)
    }

    /// Remember an identity, replacing any previous one for the variant.
    /// The ledger belongs to the old game and is dropped.
    pub fn save_identity(&self, variant: Variant, identity: &LocalIdentity) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM ledgers WHERE variant = ?1", params![variant.as_str()])?;
        tx.execute(
            "INSERT OR REPLACE INTO sessions
                (variant, game_id, player_id, session_token, player_name, team, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                variant.as_str(),
                &identity.game_id,
                &identity.player_id,
                &identity.session_token,
                &identity.player_name,
                &identity.team,
                now_millis()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Forget the identity and ledger for a variant.
    pub fn clear_session(&self, variant: Variant) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM sessions WHERE variant = ?1", params![variant.as_str()])?;
        tx.execute("DELETE FROM ledgers WHERE variant = ?1", params![variant.as_str()])?;
        tx.commit()?;
        Ok(())
    }

    /// The round-points ledger for a game, or an empty one
    pub fn load_ledger(&self, variant: Variant, game_id: &str) -> Result<ScoreLedger, StorageError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM ledgers WHERE variant = ?1 AND game_id = ?2",
                params![variant.as_str(), game_id],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(ScoreLedger::default()),
        }
    }

    pub fn save_ledger(&self, variant: Variant, game_id: &str, ledger: &ScoreLedger) -> Result<(), StorageError> {
        let payload = serde_json::to_string(ledger)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO ledgers (variant, game_id, payload, saved_at) VALUES (?1, ?2, ?3, ?4)",
            params![variant.as_str(), game_id, payload, now_millis()],
        )?;
        Ok(())
    }

    // Schema management

    fn initialize_schema(&self) -> Result<(), StorageError> {
        let current_version = self.get_schema_version()?;

        if current_version == 0 {
            self.create_schema_v1()?;
        } else if current_version > SCHEMA_VERSION {
            return Err(StorageError::FutureSchemaVersion {
                found: current_version,
                supported: SCHEMA_VERSION,
            });
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StorageError> {
        let table_exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: u32 = self
            .conn
            .query_row("SELECT schema_version FROM meta LIMIT 1", [], |row| row.get(0))
            .unwrap_or(0);

        Ok(version)
    }

    fn create_schema_v1(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            r#"
            -- Meta table: schema version and the last player name
            CREATE TABLE IF NOT EXISTS meta (
                schema_version INTEGER NOT NULL,
                handle TEXT,
                created_at INTEGER NOT NULL
            );

            -- One remembered session per game variant
            CREATE TABLE IF NOT EXISTS sessions (
                variant TEXT PRIMARY KEY,
                game_id TEXT NOT NULL,
                player_id TEXT NOT NULL,
                session_token TEXT NOT NULL,
                player_name TEXT NOT NULL,
                team TEXT,
                saved_at INTEGER NOT NULL
            );

            -- Round-points ledger (JSON), scoped to the remembered game
            CREATE TABLE IF NOT EXISTS ledgers (
                variant TEXT NOT NULL,
                game_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                saved_at INTEGER NOT NULL,
                PRIMARY KEY (variant, game_id)
            );
            "#,
        )?;

        self.conn.execute(
            "INSERT INTO meta (schema_version, handle, created_at) VALUES (?1, NULL, ?2)",
            params![SCHEMA_VERSION, now_millis()],
        )?;

        Ok(())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
