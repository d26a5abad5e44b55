//! HTTP handlers for `/api/books`.

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

use super::service::BookService;
use crate::utils::ListParams;

pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(show_book).put(update_book).delete(delete_book),
        )
        .with_state(service)
}

async fn list_books(
    State(service): State<BookService>,
    Caller(principal): Caller,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let body = service.list(&principal, params).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn show_book(
    State(service): State<BookService>,
    Caller(principal): Caller,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(service.get(&principal, id).await?))
}

async fn create_book(
    State(service): State<BookService>,
    Caller(principal): Caller,
    body: Bytes,
) -> Result<Response, AppError> {
    Ok(service.create(&principal, &body).await?.into_response())
}

async fn update_book(
    State(service): State<BookService>,
    Caller(principal): Caller,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    service.update(&principal, id, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_book(
    State(service): State<BookService>,
    Caller(principal): Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
