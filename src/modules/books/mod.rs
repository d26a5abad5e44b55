pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Migration, Module};

use service::BookService;

/// Books: cached paginated listing plus admin-only writes.
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(service: BookService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            ttl_secs = ctx.settings.cache.books_ttl_secs,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 1, "default": 1 } },
                            { "name": "limit", "in": "query", "schema": { "type": "integer", "minimum": 1, "default": 3 } }
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of books",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                                    }
                                }
                            },
                            "400": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/BookInput" } }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Book created",
                                "headers": { "Location": { "schema": { "type": "string" } } },
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
                                }
                            },
                            "403": { "$ref": "#/components/responses/Error" },
                            "422": { "$ref": "#/components/responses/Error" }
                        }
                    }
                },
                "/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                    ],
                    "get": {
                        "summary": "Fetch a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
                                }
                            },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/BookInput" } }
                            }
                        },
                        "responses": {
                            "204": { "description": "Book updated" },
                            "403": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" },
                            "422": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "204": { "description": "Book deleted" },
                            "403": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "title": { "type": "string" },
                            "coverText": { "type": "string", "nullable": true },
                            "author": {
                                "type": "object",
                                "nullable": true,
                                "properties": {
                                    "id": { "type": "integer" },
                                    "firstName": { "type": "string" },
                                    "lastName": { "type": "string" }
                                }
                            },
                            "_links": { "type": "object" }
                        },
                        "required": ["id", "title"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "maxLength": 255 },
                            "coverText": { "type": "string", "maxLength": 255 },
                            "idAuthor": { "type": "integer", "nullable": true }
                        },
                        "required": ["title"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration {
                id: "001_init",
                up: r#"
                CREATE TABLE IF NOT EXISTS book (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    title      TEXT NOT NULL CHECK (length(trim(title)) > 0),
                    cover_text TEXT,
                    author_id  INTEGER REFERENCES author (id) ON DELETE CASCADE
                );
                "#,
            },
            Migration {
                id: "002_author_index",
                up: "CREATE INDEX IF NOT EXISTS book_author_id_idx ON book (author_id);",
            },
        ]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module wired to the shared store and response cache
pub fn create_module(ctx: &InitCtx<'_>) -> Arc<dyn Module> {
    let service = BookService::new(
        ctx.db.clone(),
        ctx.cache.clone(),
        ctx.settings.cache.books_ttl(),
        ctx.settings.pagination.clone(),
    );
    Arc::new(BooksModule::new(service))
}
