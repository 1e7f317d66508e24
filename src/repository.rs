//! Read-only queries over the installed corpus

use crate::content::open_read_only;
use crate::error::Result;
use crate::model::{Book, CorpusStats, Door, Hadith};
use crate::text::{like_pattern, strip_tashkeel};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

/// SQLite caps bound parameters at 999 on older builds
const ID_CHUNK: usize = 500;

const HADITH_COLUMNS: &str = "id, door_id, book_id, title, hadith, sharh";

fn row_to_book(row: &Row) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
    })
}

fn row_to_door(row: &Row) -> rusqlite::Result<Door> {
    Ok(Door {
        id: row.get(0)?,
        book_id: row.get(1)?,
        title: row.get(2)?,
    })
}

fn row_to_hadith(row: &Row) -> rusqlite::Result<Hadith> {
    Ok(Hadith {
        id: row.get(0)?,
        door_id: row.get(1)?,
        book_id: row.get(2)?,
        title: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        matn: row.get(4)?,
        sharh: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        matn_normal: row.get(6)?,
    })
}

/// Data access over one read-only connection. Dropping it closes the handle.
pub struct Repository {
    conn: Connection,
    has_matn_normal: bool,
    hadith_select: String,
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(open_read_only(path)?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        let has_matn_normal = {
            let mut stmt = conn.prepare(
                "SELECT COUNT(*) FROM pragma_table_info('hadiths') WHERE name = 'matn_normal'",
            )?;
            let count: i64 = stmt.query_row([], |row| row.get(0))?;
            count > 0
        };

        // Older assets lack matn_normal; select NULL so row mapping stays uniform
        let hadith_select = if has_matn_normal {
            format!("SELECT {}, matn_normal FROM hadiths", HADITH_COLUMNS)
        } else {
            format!("SELECT {}, NULL FROM hadiths", HADITH_COLUMNS)
        };

        debug!(has_matn_normal, "repository opened");
        Ok(Self {
            conn,
            has_matn_normal,
            hadith_select,
        })
    }

    pub fn has_normalized_text(&self) -> bool {
        self.has_matn_normal
    }

    pub fn list_books(&self) -> Result<Vec<Book>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, title FROM books ORDER BY id ASC")?;
        let books = stmt
            .query_map([], row_to_book)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }

    pub fn list_doors(&self) -> Result<Vec<Door>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, book_id, title FROM doors ORDER BY id ASC")?;
        let doors = stmt
            .query_map([], row_to_door)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(doors)
    }

    pub fn doors_for_book(&self, book_id: i64) -> Result<Vec<Door>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, book_id, title FROM doors WHERE book_id = ?1 ORDER BY id ASC",
        )?;
        let doors = stmt
            .query_map([book_id], row_to_door)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(doors)
    }

    /// Hadiths of one door in reading order.
    pub fn hadiths_for_door(&self, door_id: i64) -> Result<Vec<Hadith>> {
        let sql = format!("{} WHERE door_id = ?1 ORDER BY id ASC", self.hadith_select);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let hadiths = stmt
            .query_map([door_id], row_to_hadith)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(hadiths)
    }

    pub fn first_hadith_id_in_door(&self, door_id: i64) -> Result<Option<i64>> {
        let id: Option<i64> = self.conn.query_row(
            "SELECT MIN(id) FROM hadiths WHERE door_id = ?1",
            [door_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn hadith_by_id(&self, id: i64) -> Result<Option<Hadith>> {
        let sql = format!("{} WHERE id = ?1", self.hadith_select);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let hadith = stmt.query_row([id], row_to_hadith).optional()?;
        Ok(hadith)
    }

    /// Batch lookup, ascending by id. Unknown ids are skipped.
    pub fn hadiths_by_ids(&self, ids: &[i64]) -> Result<Vec<Hadith>> {
        let mut hadiths = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(ID_CHUNK) {
            let placeholders: String = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!("{} WHERE id IN ({})", self.hadith_select, placeholders);
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(chunk.iter()), row_to_hadith)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            hadiths.extend(rows);
        }

        hadiths.sort_by_key(|h| h.id);
        hadiths.dedup_by_key(|h| h.id);
        Ok(hadiths)
    }

    /// Substring search over title, narration and commentary, ascending by id.
    ///
    /// When the corpus carries `matn_normal`, the tashkeel-stripped query is
    /// also matched against it. A blank query returns nothing without
    /// touching the store.
    pub fn search_hadiths(&self, query: &str, limit: usize) -> Result<Vec<Hadith>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let pattern = like_pattern(query);
        let mut sql = format!(
            "{} WHERE title LIKE ?1 ESCAPE '\\' OR hadith LIKE ?1 ESCAPE '\\' OR sharh LIKE ?1 ESCAPE '\\'",
            self.hadith_select
        );
        if self.has_matn_normal {
            sql.push_str(" OR matn_normal LIKE ?2 ESCAPE '\\'");
        }
        sql.push_str(" ORDER BY id ASC LIMIT ?3");

        let normalized = like_pattern(&strip_tashkeel(query));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        // ?2 stays bound even when the legacy statement never reads it
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let hadiths = stmt
            .query_map(params![pattern, normalized, limit], row_to_hadith)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(query, matches = hadiths.len(), "substring search");
        Ok(hadiths)
    }

    pub fn count_hadiths(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM hadiths", [], |row| row.get(0))?)
    }

    pub fn count_doors(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM doors", [], |row| row.get(0))?)
    }

    pub fn count_books(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?)
    }

    pub fn corpus_stats(&self) -> Result<CorpusStats> {
        Ok(CorpusStats {
            books: self.count_books()?,
            doors: self.count_doors()?,
            hadiths: self.count_hadiths()?,
        })
    }

    /// Release the store handle.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}
