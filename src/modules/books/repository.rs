//! Book persistence.

use anyhow::Context;
use libris_db::Db;
use sqlx::{FromRow, SqliteConnection};

use super::models::{Book, BookDraft};
use crate::modules::authors::models::Author;
use crate::utils::Page;

const SELECT_PAGE: &str = r#"
    SELECT b.id, b.title, b.cover_text,
           a.id AS author_id, a.first_name AS author_first_name, a.last_name AS author_last_name
    FROM book b
    LEFT JOIN author a ON a.id = b.author_id
    ORDER BY b.id
    LIMIT ? OFFSET ?
"#;

const SELECT_ONE: &str = r#"
    SELECT b.id, b.title, b.cover_text,
           a.id AS author_id, a.first_name AS author_first_name, a.last_name AS author_last_name
    FROM book b
    LEFT JOIN author a ON a.id = b.author_id
    WHERE b.id = ?
"#;

#[derive(Debug, FromRow)]
struct BookRow {
    id: i64,
    title: String,
    cover_text: Option<String>,
    author_id: Option<i64>,
    author_first_name: Option<String>,
    author_last_name: Option<String>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        let author = match (row.author_id, row.author_first_name, row.author_last_name) {
            (Some(id), Some(first_name), Some(last_name)) => Some(Author {
                id,
                first_name,
                last_name,
                books: Vec::new(),
            }),
            _ => None,
        };

        Book {
            id: row.id,
            title: row.title,
            cover_text: row.cover_text,
            author,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BookRepository {
    db: Db,
}

impl BookRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// One page of books ordered by id, each with its author.
    pub async fn find_page(&self, page: Page) -> anyhow::Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(SELECT_PAGE)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.db.pool())
            .await
            .context("failed to load book page")?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    pub async fn find(&self, id: i64) -> anyhow::Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(SELECT_ONE)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .with_context(|| format!("failed to load book {id}"))?;

        Ok(row.map(Book::from))
    }

    pub async fn insert(conn: &mut SqliteConnection, draft: &BookDraft) -> anyhow::Result<i64> {
        let result = sqlx::query("INSERT INTO book (title, cover_text, author_id) VALUES (?, ?, ?)")
            .bind(&draft.title)
            .bind(&draft.cover_text)
            .bind(draft.author_id)
            .execute(&mut *conn)
            .await
            .context("failed to insert book")?;

        Ok(result.last_insert_rowid())
    }

    /// Returns `false` when no book has this id.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        draft: &BookDraft,
    ) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE book SET title = ?, cover_text = ?, author_id = ? WHERE id = ?")
                .bind(&draft.title)
                .bind(&draft.cover_text)
                .bind(draft.author_id)
                .bind(id)
                .execute(&mut *conn)
                .await
                .with_context(|| format!("failed to update book {id}"))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to delete book {id}"))?;

        Ok(result.rows_affected() > 0)
    }
}
