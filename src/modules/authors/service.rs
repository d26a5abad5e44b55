//! Author lifecycle: cached listing, fetch, and cache-consistent writes.

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

use super::models::{Author, AuthorInput};
use super::repository::AuthorRepository;
use crate::modules::{Created, AUTHORS_TAG, CATALOGUE_TAGS};
use crate::utils::{self, ListParams};
use crate::views::{self, Audience, ResourceKind, View};

#[derive(Clone)]
pub struct AuthorService {
    db: Db,
    authors: AuthorRepository,
    cache: ResponseCache,
    ttl: Duration,
    pagination: PaginationSettings,
}

impl AuthorService {
    pub fn new(
        db: Db,
        cache: ResponseCache,
        ttl: Duration,
        pagination: PaginationSettings,
    ) -> Self {
        Self {
            authors: AuthorRepository::new(db.clone()),
            db,
            cache,
            ttl,
            pagination,
        }
    }

    pub async fn list(&self, principal: &Principal, params: ListParams) -> Result<Bytes, AppError> {
        let page = params.resolve(&self.pagination)?;
        let audience = Audience::of(principal);
        let key = CacheKey::list("Author", page.page, page.limit, audience.as_str());

        let authors = self.authors.clone();
        let body = self
            .cache
            .get_or_compute(&key, &[AUTHORS_TAG], self.ttl, || async move {
                let items = authors.find_page(page).await?;
                views::encode_list(&items, View::GetAuthors, audience)
            })
            .await?;

        Ok(body)
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> Result<Value, AppError> {
        let author = self.load(id).await?;
        Ok(views::encode(&author, View::GetAuthors, Audience::of(principal))?)
    }

    pub async fn create(&self, principal: &Principal, body: &Bytes) -> Result<Created, AppError> {
        principal.require(
            Role::Admin,
            "You do not have sufficient rights to create an author",
        )?;

        let input = decode(&utils::json_object(body)?)?;
        validate(&input)?;

        let mut tx = self.db.begin_write().await?;
        let id = AuthorRepository::insert(&mut tx, &input.into_draft()).await?;
        tx.commit().await.context("failed to commit new author")?;

        self.cache.invalidate_tags(&CATALOGUE_TAGS);
        tracing::info!(author_id = id, "author created");

        let author = self
            .authors
            .find(id)
            .await?
            .ok_or_else(|| anyhow!("author {id} missing right after commit"))?;

        Ok(Created {
            location: ResourceKind::Author.location(id),
            body: views::encode(&author, View::GetAuthors, Audience::of(principal))?,
        })
    }

    /// Merge the fields present in `body` onto the stored author.
    pub async fn update(&self, principal: &Principal, id: i64, body: &Bytes) -> Result<(), AppError> {
        principal.require(
            Role::Admin,
            "You do not have sufficient rights to update an author",
        )?;

        let input = decode(&utils::json_object(body)?)?;
        let current = self.load(id).await?;
        let merged = input.merged_onto(&current);
        validate(&merged)?;

        let mut tx = self.db.begin_write().await?;

        if !AuthorRepository::update(&mut tx, id, &merged.into_draft()).await? {
            return Err(not_found(id));
        }

        tx.commit().await.context("failed to commit author update")?;
        self.cache.invalidate_tags(&CATALOGUE_TAGS);

        tracing::info!(author_id = id, "author updated");
        Ok(())
    }

    /// Delete the author together with the books they own.
    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<(), AppError> {
        principal.require(
            Role::Admin,
            "You do not have sufficient rights to delete an author",
        )?;

        let mut tx = self.db.begin_write().await?;

        if !AuthorRepository::delete(&mut tx, id).await? {
            return Err(not_found(id));
        }

        tx.commit().await.context("failed to commit author deletion")?;
        self.cache.invalidate_tags(&CATALOGUE_TAGS);

        tracing::info!(author_id = id, "author deleted");
        Ok(())
    }

    async fn load(&self, id: i64) -> Result<Author, AppError> {
        self.authors.find(id).await?.ok_or_else(|| not_found(id))
    }
}

fn not_found(id: i64) -> AppError {
    AppError::not_found(format!("author {id} not found"))
}

fn decode(body: &Value) -> Result<AuthorInput, AppError> {
    serde_json::from_value(body.clone())
        .map_err(|err| AppError::bad_request(format!("invalid author payload: {err}")))
}

fn validate(input: &AuthorInput) -> Result<(), AppError> {
    input.validate().map_err(|errors| {
        AppError::validation(utils::violations(&errors), "the author is invalid")
    })
}
