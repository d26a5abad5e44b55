pub mod authors;
pub mod books;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use libris_cache::CacheTag;
use libris_kernel::{InitCtx, ModuleRegistry};

/// Tag of every cached book listing page
pub const BOOKS_TAG: CacheTag = CacheTag::new("booksCache");

/// Tag of every cached author listing page
pub const AUTHORS_TAG: CacheTag = CacheTag::new("authorsCache");

/// Tags retired by any book or author write. Book pages embed authors and
/// author pages embed books, so both go together.
pub const CATALOGUE_TAGS: [CacheTag; 2] = [BOOKS_TAG, AUTHORS_TAG];

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, ctx: &InitCtx<'_>) {
    registry.register(authors::create_module(ctx));
    registry.register(books::create_module(ctx));
}

/// `201 Created` with a `Location` header and the encoded resource.
#[derive(Debug)]
pub struct Created {
    pub location: String,
    pub body: serde_json::Value,
}

impl IntoResponse for Created {
    fn into_response(self) -> Response {
        (
            StatusCode::CREATED,
            [(header::LOCATION, self.location)],
            Json(self.body),
        )
            .into_response()
    }
}
