//! Error types for the reader core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Content asset error: {0}")]
    ContentAsset(String),

    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for ReaderError {
    fn from(e: rusqlite::Error) -> Self {
        ReaderError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for ReaderError {
    fn from(e: serde_json::Error) -> Self {
        ReaderError::Config(e.to_string())
    }
}

impl serde::Serialize for ReaderError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
