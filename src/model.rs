//! Corpus entities: books, doors (chapters) and hadiths

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub id: i64,
    pub book_id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hadith {
    pub id: i64,
    pub door_id: i64,
    pub book_id: i64,
    pub title: String,
    /// Narration body, may carry inline markup (see [`crate::markup`])
    pub matn: String,
    /// Commentary, same markup as `matn`
    pub sharh: String,
    /// Tashkeel-stripped narration used for search, absent in older assets
    pub matn_normal: Option<String>,
}

/// A hadith joined to its door and book for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HadithDetails {
    pub hadith: Hadith,
    pub door: Door,
    pub book: Book,
}

/// Totals shown on the home/about screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub books: i64,
    pub doors: i64,
    pub hadiths: i64,
}

/// Books and doors loaded once at startup, keyed by id so that gaps in the
/// id sequence never turn into out-of-range lookups.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: BTreeMap<i64, Book>,
    doors: BTreeMap<i64, Door>,
}

impl Catalog {
    pub fn new(books: Vec<Book>, doors: Vec<Door>) -> Self {
        Self {
            books: books.into_iter().map(|b| (b.id, b)).collect(),
            doors: doors.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    pub fn book(&self, id: i64) -> Option<&Book> {
        self.books.get(&id)
    }

    pub fn door(&self, id: i64) -> Option<&Door> {
        self.doors.get(&id)
    }

    /// Books in ascending id order
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    /// Doors in ascending id order
    pub fn doors(&self) -> impl Iterator<Item = &Door> {
        self.doors.values()
    }

    pub fn doors_for_book(&self, book_id: i64) -> Vec<Door> {
        self.doors
            .values()
            .filter(|d| d.book_id == book_id)
            .cloned()
            .collect()
    }

    /// Joins a hadith to its parents. `None` when either parent is missing.
    pub fn details(&self, hadith: Hadith) -> Option<HadithDetails> {
        let door = self.doors.get(&hadith.door_id)?.clone();
        let book = self.books.get(&hadith.book_id)?.clone();
        Some(HadithDetails { hadith, door, book })
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    pub fn door_count(&self) -> usize {
        self.doors.len()
    }
}
