//! Book lifecycle: cached listing, fetch, and cache-consistent writes.

use std::time::Duration;

use anyhow::{anyhow, Context};
use bytes::Bytes;
use libris_authz::{Principal, Role};
use libris_cache::{CacheKey, ResponseCache};
use libris_db::Db;
use libris_http::AppError;
use libris_kernel::settings::PaginationSettings;
use serde_json::Value;
use validator::Validate;

use super::models::{Book, BookInput};
use super::repository::BookRepository;
use crate::modules::authors::repository::AuthorRepository;
use crate::modules::{Created, BOOKS_TAG, CATALOGUE_TAGS};
use crate::utils::{self, ListParams};
use crate::views::{self, Audience, ResourceKind, View};

#[derive(Clone)]
pub struct BookService {
    db: Db,
    books: BookRepository,
    cache: ResponseCache,
    ttl: Duration,
    pagination: PaginationSettings,
}

impl BookService {
    pub fn new(
        db: Db,
        cache: ResponseCache,
        ttl: Duration,
        pagination: PaginationSettings,
    ) -> Self {
        Self {
            books: BookRepository::new(db.clone()),
            db,
            cache,
            ttl,
            pagination,
        }
    }

    /// Encoded page of books, served from the cache when possible.
    pub async fn list(&self, principal: &Principal, params: ListParams) -> Result<Bytes, AppError> {
        let page = params.resolve(&self.pagination)?;
        let audience = Audience::of(principal);
        let key = CacheKey::list("Book", page.page, page.limit, audience.as_str());

        let books = self.books.clone();
        let body = self
            .cache
            .get_or_compute(&key, &[BOOKS_TAG], self.ttl, || async move {
                let items = books.find_page(page).await?;
                views::encode_list(&items, View::GetBooks, audience)
            })
            .await?;

        Ok(body)
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> Result<Value, AppError> {
        let book = self.load(id).await?;
        Ok(views::encode(&book, View::GetBooks, Audience::of(principal))?)
    }

    pub async fn create(&self, principal: &Principal, body: &Bytes) -> Result<Created, AppError> {
        principal.require(
            Role::Admin,
            "You do not have sufficient rights to create a book",
        )?;

        let body = utils::json_object(body)?;
        let input = decode(&body)?;
        validate(&input)?;

        let mut tx = self.db.begin_write().await?;

        let author_id = match utils::author_id_from_body(&body) {
            Some(requested) => AuthorRepository::find_id(&mut tx, requested).await?,
            None => None,
        };
        let id = BookRepository::insert(&mut tx, &input.into_draft(author_id)).await?;

        tx.commit().await.context("failed to commit new book")?;
        self.cache.invalidate_tags(&CATALOGUE_TAGS);

        tracing::info!(book_id = id, author_id = ?author_id, "book created");

        let book = self
            .books
            .find(id)
            .await?
            .ok_or_else(|| anyhow!("book {id} missing right after commit"))?;

        Ok(Created {
            location: ResourceKind::Book.location(id),
            body: views::encode(&book, View::GetBooks, Audience::of(principal))?,
        })
    }

    /// Replace title and cover text, and re-resolve the author.
    pub async fn update(&self, principal: &Principal, id: i64, body: &Bytes) -> Result<(), AppError> {
        principal.require(
            Role::Admin,
            "You do not have sufficient rights to update a book",
        )?;

        let body = utils::json_object(body)?;
        let input = decode(&body)?;
        self.load(id).await?;
        validate(&input)?;

        let mut tx = self.db.begin_write().await?;

        let author_id = match utils::author_id_from_body(&body) {
            Some(requested) => AuthorRepository::find_id(&mut tx, requested).await?,
            None => None,
        };

        if !BookRepository::update(&mut tx, id, &input.into_draft(author_id)).await? {
            return Err(not_found(id));
        }

        tx.commit().await.context("failed to commit book update")?;
        self.cache.invalidate_tags(&CATALOGUE_TAGS);

        tracing::info!(book_id = id, author_id = ?author_id, "book updated");
        Ok(())
    }

    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<(), AppError> {
        principal.require(
            Role::Admin,
            "You do not have sufficient rights to delete a book",
        )?;

        let mut tx = self.db.begin_write().await?;

        if !BookRepository::delete(&mut tx, id).await? {
            return Err(not_found(id));
        }

        tx.commit().await.context("failed to commit book deletion")?;
        self.cache.invalidate_tags(&CATALOGUE_TAGS);

        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }

    async fn load(&self, id: i64) -> Result<Book, AppError> {
        self.books.find(id).await?.ok_or_else(|| not_found(id))
    }
}

fn not_found(id: i64) -> AppError {
    AppError::not_found(format!("book {id} not found"))
}

fn decode(body: &Value) -> Result<BookInput, AppError> {
    serde_json::from_value(body.clone())
        .map_err(|err| AppError::bad_request(format!("invalid book payload: {err}")))
}

fn validate(input: &BookInput) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::validation(utils::violations(&errors), "the book is invalid"))
}
