pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Migration, Module};

use service::AuthorService;

/// Authors and their books; deleting an author takes the books with it.
pub struct AuthorsModule {
    service: AuthorService,
}

impl AuthorsModule {
    pub fn new(service: AuthorService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            ttl_secs = ctx.settings.cache.authors_ttl_secs,
            "authors module initialized"
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
                        "summary": "List authors",
                        "tags": ["Authors"],
                        "parameters": [
                            { "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 1, "default": 1 } },
                            { "name": "limit", "in": "query", "schema": { "type": "integer", "minimum": 1, "default": 3 } }
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of authors",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Author" } }
                                    }
                                }
                            },
                            "400": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Authors"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/AuthorInput" } }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Author created",
                                "headers": { "Location": { "schema": { "type": "string" } } },
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Author" } }
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
                        "summary": "Fetch an author",
                        "tags": ["Authors"],
                        "responses": {
                            "200": {
                                "description": "The author with their books",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Author" } }
                                }
                            },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "put": {
                        "summary": "Update an author",
                        "tags": ["Authors"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/AuthorInput" } }
                            }
                        },
                        "responses": {
                            "204": { "description": "Author updated" },
                            "403": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" },
                            "422": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "delete": {
                        "summary": "Delete an author and their books",
                        "tags": ["Authors"],
                        "responses": {
                            "204": { "description": "Author deleted" },
                            "403": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "firstName": { "type": "string" },
                            "lastName": { "type": "string" },
                            "books": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "id": { "type": "integer" },
                                        "title": { "type": "string" },
                                        "coverText": { "type": "string", "nullable": true }
                                    }
                                }
                            },
                            "_links": { "type": "object" }
                        },
                        "required": ["id", "firstName", "lastName"]
                    },
                    "AuthorInput": {
                        "type": "object",
                        "properties": {
                            "firstName": { "type": "string", "maxLength": 255 },
                            "lastName": { "type": "string", "maxLength": 255 }
                        },
                        "required": ["firstName", "lastName"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS author (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    first_name TEXT NOT NULL,
                    last_name  TEXT NOT NULL
                );
                "#,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}

/// Create the authors module wired to the shared store and response cache
pub fn create_module(ctx: &InitCtx<'_>) -> Arc<dyn Module> {
    let service = AuthorService::new(
        ctx.db.clone(),
        ctx.cache.clone(),
        ctx.settings.cache.authors_ttl(),
        ctx.settings.pagination.clone(),
    );
    Arc::new(AuthorsModule::new(service))
}
