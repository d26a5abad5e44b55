//! HTTP handlers for `/api/authors`.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use libris_http::extract::{Path, Query};
use libris_http::{AppError, Caller};
use serde_json::Value;

use super::service::AuthorService;
use crate::utils::ListParams;

pub fn router(service: AuthorService) -> Router {
    Router::new()
        .route("/", get(list_authors).post(create_author))
        .route(
            "/{id}",
            get(show_author).put(update_author).delete(delete_author),
        )
        .with_state(service)
}

async fn list_authors(
    State(service): State<AuthorService>,
    Caller(principal): Caller,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let body = service.list(&principal, params).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn show_author(
    State(service): State<AuthorService>,
    Caller(principal): Caller,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(service.get(&principal, id).await?))
}

async fn create_author(
    State(service): State<AuthorService>,
    Caller(principal): Caller,
    body: Bytes,
) -> Result<Response, AppError> {
    Ok(service.create(&principal, &body).await?.into_response())
}

async fn update_author(
    State(service): State<AuthorService>,
    Caller(principal): Caller,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    service.update(&principal, id, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_author(
    State(service): State<AuthorService>,
    Caller(principal): Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
