//! Author persistence.

use std::collections::HashMap;

use anyhow::Context;
use libris_db::Db;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use super::models::{Author, AuthorDraft};
use crate::modules::books::models::Book;
use crate::utils::Page;

#[derive(Debug, FromRow)]
struct AuthorRow {
    id: i64,
    first_name: String,
    last_name: String,
}

#[derive(Debug, FromRow)]
struct OwnedBookRow {
    id: i64,
    title: String,
    cover_text: Option<String>,
    author_id: i64,
}

#[derive(Clone, Debug)]
pub struct AuthorRepository {
    db: Db,
}

impl AuthorRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// One page of authors ordered by id, each with its books.
    pub async fn find_page(&self, page: Page) -> anyhow::Result<Vec<Author>> {
        let rows: Vec<AuthorRow> = sqlx::query_as(
            "SELECT id, first_name, last_name FROM author ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.db.pool())
        .await
        .context("failed to load author page")?;

        self.with_books(rows).await
    }

    pub async fn find(&self, id: i64) -> anyhow::Result<Option<Author>> {
        let row: Option<AuthorRow> =
            sqlx::query_as("SELECT id, first_name, last_name FROM author WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .with_context(|| format!("failed to load author {id}"))?;

        Ok(self.with_books(row.into_iter().collect()).await?.pop())
    }

    /// Resolve an author reference inside an open transaction.
    pub async fn find_id(conn: &mut SqliteConnection, id: i64) -> anyhow::Result<Option<i64>> {
        sqlx::query_scalar("SELECT id FROM author WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .with_context(|| format!("failed to resolve author {id}"))
    }

    pub async fn insert(conn: &mut SqliteConnection, draft: &AuthorDraft) -> anyhow::Result<i64> {
        let result = sqlx::query("INSERT INTO author (first_name, last_name) VALUES (?, ?)")
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .execute(&mut *conn)
            .await
            .context("failed to insert author")?;

        Ok(result.last_insert_rowid())
    }

    /// Returns `false` when no author has this id.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        draft: &AuthorDraft,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE author SET first_name = ?, last_name = ? WHERE id = ?")
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to update author {id}"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove the author; the store cascades to their books.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM author WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to delete author {id}"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn with_books(&self, rows: Vec<AuthorRow>) -> anyhow::Result<Vec<Author>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, title, cover_text, author_id FROM book WHERE author_id IN (",
        );
        let mut ids = query.separated(", ");
        for row in &rows {
            ids.push_bind(row.id);
        }
        ids.push_unseparated(") ORDER BY id");

        let books: Vec<OwnedBookRow> = query
            .build_query_as()
            .fetch_all(self.db.pool())
            .await
            .context("failed to load books of authors")?;

        let mut by_author: HashMap<i64, Vec<Book>> = HashMap::new();
        for book in books {
            by_author.entry(book.author_id).or_default().push(Book {
                id: book.id,
                title: book.title,
                cover_text: book.cover_text,
                author: None,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Author {
                books: by_author.remove(&row.id).unwrap_or_default(),
                id: row.id,
                first_name: row.first_name,
                last_name: row.last_name,
            })
            .collect())
    }
}
