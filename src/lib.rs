//! Riyad al-Saliheen - Hadith Reader Core
//!
//! Read-only access to the bundled hadith corpus plus the reading state a
//! reader UI binds to: position, reading window, bookmarks, search and
//! display preferences.

// Shared value types first, everything else builds on them
pub mod model;
pub mod error;
pub mod text;
pub mod markup;
pub mod config;
pub mod content;
pub mod repository;
pub mod preferences;
pub mod cache;
pub mod state;

#[cfg(test)]
mod test_fixtures;

pub use error::ReaderError;
pub use state::{ReaderState, SearchState};
pub use config::{BookmarkOrder, ReaderConfig, default_data_dir};
pub use model::{Book, Catalog, CorpusStats, Door, Hadith, HadithDetails};
pub use repository::Repository;
pub use preferences::{PrefWrite, PreferenceStore, PreferenceWriter, Snapshot};
pub use cache::{DoorCache, ReadingWindow};
pub use content::{CONTENT_VERSION, InstallOutcome, install, is_installed, verify_file_hash};
pub use markup::{Color, Emphasis, Segment};
pub use text::{parse_hadith_id, strip_tashkeel};
