//! Knowledge-base articles. A side table for canned answers; nothing in the
//! ingestion path reads it.

use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{Database, DatabaseError};

/// Maximum number of articles a search returns.
pub const SEARCH_LIMIT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KbArticle {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Comma-separated, e.g. "login,auth,dashboard".
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewKbArticle {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Option<String>,
}

impl KbArticle {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            tags: row.get("tags")?,
        })
    }
}

pub fn insert(db: &Database, article: &NewKbArticle) -> Result<KbArticle, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO kb_articles (title, content, tags) VALUES (?1, ?2, ?3)",
            params![article.title, article.content, article.tags],
        )?;
        Ok(KbArticle {
            id: conn.last_insert_rowid(),
            title: article.title.clone(),
            content: article.content.clone(),
            tags: article.tags.clone(),
        })
    })
}

pub fn list(db: &Database) -> Result<Vec<KbArticle>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id, title, content, tags FROM kb_articles ORDER BY id")?;
        let rows = stmt
            .query_map([], KbArticle::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Case-insensitive substring search over title and content, first
/// [`SEARCH_LIMIT`] matches by id.
pub fn search(db: &Database, query: &str) -> Result<Vec<KbArticle>, DatabaseError> {
    let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, title, content, tags FROM kb_articles
             WHERE lower(title) LIKE ?1 ESCAPE '\\' OR lower(content) LIKE ?1 ESCAPE '\\'
             ORDER BY id LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![pattern, SEARCH_LIMIT], KbArticle::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
