//! Reader state: current position, reading window, bookmarks, search and
//! display preferences.
//!
//! One `ReaderState` owns the store handle for its whole session. Mutations
//! run synchronously on the caller; only preference persistence is deferred.

use crate::cache::{DoorCache, ReadingWindow};
use crate::config::{BookmarkOrder, ReaderConfig};
use crate::content;
use crate::error::Result as ReaderResult;
use crate::model::{Book, Catalog, CorpusStats, Door, Hadith, HadithDetails};
use crate::preferences::{PrefWrite, PreferenceStore, PreferenceWriter};
use crate::repository::Repository;
use crate::text::parse_hadith_id;
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Hadith>,
    pub is_searching: bool,
}

pub struct ReaderState {
    config: ReaderConfig,
    repository: Repository,
    catalog: Catalog,
    hadith_count: i64,
    window: ReadingWindow,
    door_cache: DoorCache,
    writer: PreferenceWriter,
    current_hadith_id: i64,
    /// Most recently toggled first, mirrors the persisted list
    bookmark_ids: Vec<i64>,
    bookmarks: Vec<Hadith>,
    search: SearchState,
    font_size: f32,
    system_theme: bool,
}

impl ReaderState {
    /// Install the content store if needed, open it and restore preferences.
    pub fn open(config: ReaderConfig) -> Result<Self> {
        config.validate()?;

        let content_path = config.content_path();
        content::install(&config.bundled_asset, &content_path)
            .context("Failed to install content store")?;

        let repository = Repository::open(&content_path)
            .with_context(|| format!("Failed to open content store at {:?}", content_path))?;
        let store = PreferenceStore::open(&config.settings_path())
            .context("Failed to open preferences")?;

        Self::new(config, repository, store)
    }

    /// Build state over an already opened store.
    pub fn new(config: ReaderConfig, repository: Repository, store: PreferenceStore) -> Result<Self> {
        let books = repository.list_books().context("Failed to load books")?;
        let doors = repository.list_doors().context("Failed to load doors")?;
        let hadith_count = repository
            .count_hadiths()
            .context("Failed to count hadiths")?;
        let snapshot = store
            .load_snapshot(config.default_font_size)
            .context("Failed to load preferences")?;

        let catalog = Catalog::new(books, doors);
        let current_hadith_id = if (1..=hadith_count).contains(&snapshot.reading_progress) {
            snapshot.reading_progress
        } else {
            warn!(
                saved = snapshot.reading_progress,
                hadith_count, "saved reading position out of range, starting at 1"
            );
            1
        };

        let mut state = Self {
            window: ReadingWindow::new(config.cache_radius),
            door_cache: DoorCache::new(config.door_cache_capacity),
            writer: PreferenceWriter::spawn(store),
            font_size: config.clamp_font_size(snapshot.font_size),
            system_theme: snapshot.system_theme,
            bookmark_ids: snapshot.bookmarks,
            bookmarks: Vec::new(),
            search: SearchState::default(),
            current_hadith_id,
            hadith_count,
            catalog,
            repository,
            config,
        };
        state.refresh_bookmarks();
        state.rebuild_window();

        info!(
            books = state.catalog.book_count(),
            doors = state.catalog.door_count(),
            hadiths = hadith_count,
            position = current_hadith_id,
            "reader state ready"
        );
        Ok(state)
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    // ============ Catalog ============

    pub fn hadith_count(&self) -> i64 {
        self.hadith_count
    }

    pub fn is_valid_hadith_id(&self, id: i64) -> bool {
        (1..=self.hadith_count).contains(&id)
    }

    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.catalog.books()
    }

    pub fn doors(&self) -> impl Iterator<Item = &Door> {
        self.catalog.doors()
    }

    pub fn book(&self, id: i64) -> Option<&Book> {
        self.catalog.book(id)
    }

    pub fn door(&self, id: i64) -> Option<&Door> {
        self.catalog.door(id)
    }

    pub fn doors_for_book(&self, book_id: i64) -> Vec<Door> {
        self.catalog.doors_for_book(book_id)
    }

    pub fn hadiths_for_door(&mut self, door_id: i64) -> ReaderResult<Arc<Vec<Hadith>>> {
        let repository = &self.repository;
        self.door_cache
            .get_or_load(door_id, || repository.hadiths_for_door(door_id))
    }

    pub fn first_hadith_id_in_door(&self, door_id: i64) -> ReaderResult<Option<i64>> {
        self.repository.first_hadith_id_in_door(door_id)
    }

    pub fn hadith(&self, id: i64) -> ReaderResult<Option<Hadith>> {
        if !self.is_valid_hadith_id(id) {
            return Ok(None);
        }
        self.repository.hadith_by_id(id)
    }

    pub fn corpus_stats(&self) -> CorpusStats {
        CorpusStats {
            books: self.catalog.book_count() as i64,
            doors: self.catalog.door_count() as i64,
            hadiths: self.hadith_count,
        }
    }

    // ============ Navigation ============

    pub fn current_hadith_id(&self) -> i64 {
        self.current_hadith_id
    }

    /// `None` while the current hadith could not be loaded.
    pub fn current_hadith(&self) -> Option<&HadithDetails> {
        self.window.get(self.current_hadith_id)
    }

    pub fn cached(&self, id: i64) -> Option<&HadithDetails> {
        self.window.get(id)
    }

    pub fn cached_ids(&self) -> Vec<i64> {
        self.window.ids()
    }

    pub fn next_hadith_id(&self) -> Option<i64> {
        let next = self.current_hadith_id + 1;
        self.is_valid_hadith_id(next).then_some(next)
    }

    pub fn previous_hadith_id(&self) -> Option<i64> {
        let previous = self.current_hadith_id - 1;
        self.is_valid_hadith_id(previous).then_some(previous)
    }

    /// Move the reading position. Returns false (and changes nothing) when
    /// `id` is already current or outside `[1, hadith_count]`.
    pub fn navigate_to_hadith(&mut self, id: i64) -> bool {
        if id == self.current_hadith_id || !self.is_valid_hadith_id(id) {
            return false;
        }

        debug!(from = self.current_hadith_id, to = id, "navigate");
        self.current_hadith_id = id;
        self.rebuild_window();
        self.writer.submit(PrefWrite::ReadingProgress(id));
        true
    }

    fn rebuild_window(&mut self) {
        let repository = &self.repository;
        let catalog = &self.catalog;
        self.window
            .recenter(self.current_hadith_id, self.hadith_count, |id| {
                match repository.hadith_by_id(id) {
                    Ok(Some(hadith)) => {
                        let (door_id, book_id) = (hadith.door_id, hadith.book_id);
                        let details = catalog.details(hadith);
                        if details.is_none() {
                            warn!(id, door_id, book_id, "hadith references unknown door or book");
                        }
                        details
                    }
                    Ok(None) => None,
                    Err(e) => {
                        error!(id, error = %e, "failed to load hadith");
                        None
                    }
                }
            });
    }

    // ============ Bookmarks ============

    pub fn bookmarks(&self) -> &[Hadith] {
        &self.bookmarks
    }

    pub fn bookmark_ids(&self) -> &[i64] {
        &self.bookmark_ids
    }

    pub fn is_bookmarked(&self, id: i64) -> bool {
        self.bookmark_ids.contains(&id)
    }

    /// Flip bookmark membership of `id`. Returns whether it is now bookmarked.
    /// Ids outside the corpus are ignored.
    pub fn toggle_bookmark(&mut self, id: i64) -> bool {
        if !self.is_valid_hadith_id(id) {
            warn!(id, "ignoring bookmark toggle for unknown hadith");
            return false;
        }

        let bookmarked = match self.bookmark_ids.iter().position(|b| *b == id) {
            Some(pos) => {
                self.bookmark_ids.remove(pos);
                false
            }
            None => {
                self.bookmark_ids.insert(0, id);
                true
            }
        };

        self.writer
            .submit(PrefWrite::Bookmarks(self.bookmark_ids.clone()));
        self.refresh_bookmarks();
        bookmarked
    }

    fn refresh_bookmarks(&mut self) {
        let ids: Vec<i64> = self
            .bookmark_ids
            .iter()
            .copied()
            .filter(|id| self.is_valid_hadith_id(*id))
            .collect();

        let mut hadiths = match self.repository.hadiths_by_ids(&ids) {
            Ok(hadiths) => hadiths,
            Err(e) => {
                error!(error = %e, "failed to resolve bookmarks");
                return;
            }
        };

        if self.config.bookmark_order == BookmarkOrder::MostRecentFirst {
            hadiths.sort_by_key(|h| ids.iter().position(|id| *id == h.id));
        }
        self.bookmarks = hadiths;
    }

    // ============ Search ============

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn search_query(&self) -> &str {
        &self.search.query
    }

    pub fn search_results(&self) -> &[Hadith] {
        &self.search.results
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_searching
    }

    /// Run a search and keep its results.
    ///
    /// A query that is a valid hadith number jumps straight to that hadith.
    /// Otherwise (and when the number is unknown) a substring search runs if
    /// the trimmed query has at least `min_search_chars` characters.
    pub fn search_hadiths(&mut self, query: &str) -> &[Hadith] {
        self.search.query = query.to_string();
        self.search.is_searching = true;
        self.search.results = self.run_search(query.trim());
        self.search.is_searching = false;
        &self.search.results
    }

    fn run_search(&self, query: &str) -> Vec<Hadith> {
        if query.is_empty() {
            return Vec::new();
        }

        if let Some(id) = parse_hadith_id(query) {
            match self.hadith(id) {
                Ok(Some(hadith)) => return vec![hadith],
                Ok(None) => {}
                Err(e) => error!(id, error = %e, "hadith lookup failed"),
            }
        }

        if query.chars().count() < self.config.min_search_chars {
            debug!(query, "query too short, skipping search");
            return Vec::new();
        }

        self.repository
            .search_hadiths(query, self.config.search_limit)
            .unwrap_or_else(|e| {
                error!(query, error = %e, "search failed");
                Vec::new()
            })
    }

    pub fn clear_search(&mut self) {
        self.search = SearchState::default();
    }

    // ============ Display preferences ============

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Clamp and store a new font size. Returns the value applied.
    pub fn update_font_size(&mut self, size: f32) -> f32 {
        self.font_size = self.config.clamp_font_size(size);
        self.writer.submit(PrefWrite::FontSize(self.font_size));
        self.font_size
    }

    /// Whether the theme follows the system setting (true) or its inverse.
    pub fn follows_system_theme(&self) -> bool {
        self.system_theme
    }

    pub fn toggle_theme(&mut self) -> bool {
        self.system_theme = !self.system_theme;
        self.writer.submit(PrefWrite::SystemTheme(self.system_theme));
        self.system_theme
    }

    /// Forget every stored preference except the reading position.
    pub fn reset_preferences(&mut self) {
        self.font_size = self.config.clamp_font_size(self.config.default_font_size);
        self.system_theme = true;
        self.bookmark_ids.clear();
        self.bookmarks.clear();

        self.writer.submit(PrefWrite::ClearAll);
        self.writer
            .submit(PrefWrite::ReadingProgress(self.current_hadith_id));
    }

    // ============ Lifecycle ============

    /// Wait for queued preference writes.
    pub async fn flush(&self) -> ReaderResult<()> {
        self.writer.flush().await
    }

    /// End the session and release the store handle. Queued preference
    /// writes are not awaited.
    pub fn close(self) -> ReaderResult<()> {
        info!("closing reader state");
        self.repository.close()
    }
}
