//! Synthetic corpus builders shared by unit tests

use crate::config::ReaderConfig;
use crate::markup::plain_text;
use crate::text::strip_tashkeel;
use rusqlite::{params, Connection};
use std::path::Path;

pub struct FixtureOptions {
    pub books: i64,
    pub doors_per_book: i64,
    pub hadiths: i64,
    pub with_matn_normal: bool,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            books: 3,
            doors_per_book: 2,
            hadiths: 40,
            with_matn_normal: true,
        }
    }
}

pub const FIRST_MATN: &str = "<p0>عن عمر رضي الله عنه</p0> إِنَّمَا الأَعْمَالُ بِالنِّيَّةِ";
pub const FIRST_SHARH: &str = "في هذا الحديث بيان فضل النية (رواه البخاري 6689)";
pub const PERCENT_SHARH: &str = "نسبة 50% من الأجر";

/// Door that owns `hadith_id` when hadiths are spread evenly in id order.
pub fn door_of(hadith_id: i64, opts: &FixtureOptions) -> i64 {
    let doors = opts.books * opts.doors_per_book;
    (hadith_id - 1) * doors / opts.hadiths + 1
}

pub fn book_of_door(door_id: i64, opts: &FixtureOptions) -> i64 {
    (door_id - 1) / opts.doors_per_book + 1
}

/// Write a corpus asset to `path` (user_version left at 0, like a fresh bundle).
pub fn build_corpus(path: &Path, opts: &FixtureOptions) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut conn = Connection::open(path).unwrap();

    let hadith_table = if opts.with_matn_normal {
        "CREATE TABLE hadiths (id INTEGER PRIMARY KEY, door_id INTEGER NOT NULL, book_id INTEGER NOT NULL,
                               title TEXT, hadith TEXT NOT NULL, sharh TEXT, matn_normal TEXT)"
    } else {
        "CREATE TABLE hadiths (id INTEGER PRIMARY KEY, door_id INTEGER NOT NULL, book_id INTEGER NOT NULL,
                               title TEXT, hadith TEXT NOT NULL, sharh TEXT)"
    };
    conn.execute_batch(
        "CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT NOT NULL);
         CREATE TABLE doors (id INTEGER PRIMARY KEY, book_id INTEGER NOT NULL, title TEXT NOT NULL);",
    )
    .unwrap();
    conn.execute_batch(hadith_table).unwrap();

    let tx = conn.transaction().unwrap();
    for book in 1..=opts.books {
        tx.execute(
            "INSERT INTO books (id, title) VALUES (?1, ?2)",
            params![book, format!("كتاب {}", book)],
        )
        .unwrap();
    }
    for door in 1..=opts.books * opts.doors_per_book {
        tx.execute(
            "INSERT INTO doors (id, book_id, title) VALUES (?1, ?2, ?3)",
            params![door, book_of_door(door, opts), format!("باب {}", door)],
        )
        .unwrap();
    }
    for id in 1..=opts.hadiths {
        let (title, matn, sharh) = match id {
            1 => (
                "حديث الأعمال".to_string(),
                FIRST_MATN.to_string(),
                FIRST_SHARH.to_string(),
            ),
            2 => (
                "حديث رقم 2".to_string(),
                "<p1>متن</p1> الحديث رقم 2".to_string(),
                PERCENT_SHARH.to_string(),
            ),
            _ => (
                format!("حديث رقم {}", id),
                format!("<p1>متن</p1> الحديث رقم {}", id),
                format!("شرح رقم {}", id),
            ),
        };
        let door = door_of(id, opts);
        let book = book_of_door(door, opts);
        if opts.with_matn_normal {
            tx.execute(
                "INSERT INTO hadiths (id, door_id, book_id, title, hadith, sharh, matn_normal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, door, book, title, matn, sharh, strip_tashkeel(&plain_text(&matn))],
            )
            .unwrap();
        } else {
            tx.execute(
                "INSERT INTO hadiths (id, door_id, book_id, title, hadith, sharh)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, door, book, title, matn, sharh],
            )
            .unwrap();
        }
    }
    tx.commit().unwrap();
}

/// Config rooted in `dir` with a freshly built bundled asset.
pub fn reader_config(dir: &Path, opts: &FixtureOptions) -> ReaderConfig {
    let bundled = dir.join("bundle/riyad_salheen.db");
    build_corpus(&bundled, opts);
    ReaderConfig::default()
        .with_data_dir(dir.join("data"))
        .with_bundled_asset(bundled)
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
