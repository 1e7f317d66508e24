//! Reader preferences persisted in a small key-value settings database
//!
//! Values are read once at startup into a [`Snapshot`]. Later writes go
//! through a [`PreferenceWriter`], which applies them off the caller's
//! thread in the order they were issued.

use crate::error::{ReaderError, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

pub const SYSTEM_THEME: &str = "system_theme";
pub const FONT_SIZE: &str = "font_size";
pub const BOOKMARKS: &str = "bookmarks";
pub const READING_PROGRESS: &str = "reading_progress";

const DEFAULT_READING_PROGRESS: i64 = 1;

/// Values loaded at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Follow the system theme (true) or invert it (false)
    pub system_theme: bool,
    pub font_size: f32,
    /// Most recently bookmarked first
    pub bookmarks: Vec<i64>,
    pub reading_progress: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrefWrite {
    SystemTheme(bool),
    FontSize(f32),
    Bookmarks(Vec<i64>),
    ReadingProgress(i64),
    ClearAll,
}

pub struct PreferenceStore {
    conn: Connection,
}

impl PreferenceStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS app_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO app_settings (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM app_settings", [])?;
        Ok(())
    }

    pub fn load_snapshot(&self, default_font_size: f32) -> Result<Snapshot> {
        Ok(Snapshot {
            system_theme: self.parsed(SYSTEM_THEME)?.unwrap_or(true),
            font_size: self.parsed(FONT_SIZE)?.unwrap_or(default_font_size),
            bookmarks: self
                .get(BOOKMARKS)?
                .map(|raw| decode_bookmarks(&raw))
                .unwrap_or_default(),
            reading_progress: self
                .parsed(READING_PROGRESS)?
                .unwrap_or(DEFAULT_READING_PROGRESS),
        })
    }

    /// Unparsable values read as absent.
    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match raw.parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                warn!(key, raw = %raw, "ignoring unparsable preference");
                Ok(None)
            }
        }
    }

    pub fn apply(&self, write: &PrefWrite) -> Result<()> {
        match write {
            PrefWrite::SystemTheme(value) => self.set(SYSTEM_THEME, &value.to_string()),
            PrefWrite::FontSize(size) => self.set(FONT_SIZE, &size.to_string()),
            PrefWrite::Bookmarks(ids) => self.set(BOOKMARKS, &encode_bookmarks(ids)),
            PrefWrite::ReadingProgress(id) => self.set(READING_PROGRESS, &id.to_string()),
            PrefWrite::ClearAll => self.clear_all(),
        }
    }
}

pub fn encode_bookmarks(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a stored bookmark list, keeping the first occurrence of each id.
pub fn decode_bookmarks(raw: &str) -> Vec<i64> {
    let mut ids: Vec<i64> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<i64>() {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(_) => warn!(entry = part, "skipping malformed bookmark entry"),
        }
    }
    ids
}

enum Command {
    Write(PrefWrite),
    Flush(oneshot::Sender<()>),
}

enum WriterMode {
    Background(mpsc::UnboundedSender<Command>),
    Inline(PreferenceStore),
}

/// Applies preference writes in issue order.
///
/// Inside a tokio runtime the store moves onto one blocking worker fed by a
/// channel; elsewhere writes apply on the calling thread. Dropping the writer
/// closes the channel without waiting for queued writes.
pub struct PreferenceWriter {
    mode: WriterMode,
}

impl PreferenceWriter {
    pub fn spawn(store: PreferenceStore) -> Self {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                debug!("no tokio runtime, preference writes apply inline");
                return Self {
                    mode: WriterMode::Inline(store),
                };
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        handle.spawn_blocking(move || {
            while let Some(command) = rx.blocking_recv() {
                match command {
                    Command::Write(write) => {
                        if let Err(e) = store.apply(&write) {
                            error!(error = %e, ?write, "failed to persist preference");
                        }
                    }
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });

        Self {
            mode: WriterMode::Background(tx),
        }
    }

    pub fn is_background(&self) -> bool {
        matches!(self.mode, WriterMode::Background(_))
    }

    pub fn submit(&self, write: PrefWrite) {
        match &self.mode {
            WriterMode::Background(tx) => {
                if tx.send(Command::Write(write)).is_err() {
                    error!("preference worker stopped, write dropped");
                }
            }
            WriterMode::Inline(store) => {
                if let Err(e) = store.apply(&write) {
                    error!(error = %e, ?write, "failed to persist preference");
                }
            }
        }
    }

    /// Wait until every write submitted before this call has been applied.
    pub async fn flush(&self) -> Result<()> {
        let WriterMode::Background(tx) = &self.mode else {
            return Ok(());
        };
        let (done_tx, done_rx) = oneshot::channel();
        tx.send(Command::Flush(done_tx))
            .map_err(|_| ReaderError::Preferences("preference worker stopped".to_string()))?;
        done_rx
            .await
            .map_err(|_| ReaderError::Preferences("preference worker stopped".to_string()))
    }
}
