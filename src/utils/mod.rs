//! Request helpers shared by the resource modules.

use bytes::Bytes;
use libris_http::AppError;
use libris_kernel::settings::PaginationSettings;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::{ValidationError, ValidationErrors};

/// Raw `page` / `limit` query parameters of a listing endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A validated, 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    /// Rows skipped before this page: `(page - 1) * limit`, saturating so
    /// that absurdly distant pages are simply empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }
}

impl ListParams {
    /// Apply defaults (page 1, configured limit). Limits above
    /// `max_limit` are clamped; pages past the end are valid and empty.
    pub fn resolve(self, settings: &PaginationSettings) -> Result<Page, AppError> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(i64::from(settings.default_limit));

        if page < 1 {
            return Err(AppError::bad_request("page must be at least 1"));
        }
        if limit < 1 {
            return Err(AppError::bad_request("limit must be at least 1"));
        }

        Ok(Page {
            page,
            limit: limit.min(i64::from(settings.max_limit)),
        })
    }
}

/// Parse a request body that must be a JSON object.
pub fn json_object(body: &Bytes) -> Result<Value, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| AppError::bad_request(format!("request body is not valid JSON: {err}")))?;

    if !value.is_object() {
        return Err(AppError::bad_request("request body must be a JSON object"));
    }
    Ok(value)
}

/// Read the `idAuthor` field of a raw book payload.
///
/// Accepts an integer or a numeric string; anything else counts as absent.
pub fn author_id_from_body(body: &Value) -> Option<i64> {
    match body.get("idAuthor")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `NotBlank`: reject strings made only of whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.message = Some("This value should not be blank.".into());
        return Err(error);
    }
    Ok(())
}

/// Flatten validator output into `[{propertyPath, code, message}]`, ordered by
/// property path.
pub fn violations(errors: &ValidationErrors) -> Vec<Value> {
    let mut violations: Vec<(String, Value)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            let property_path = camel_case(&field);
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                (
                    property_path.clone(),
                    json!({
                        "propertyPath": property_path,
                        "code": error.code,
                        "message": message,
                    }),
                )
            })
        })
        .collect();

    violations.sort_by(|a, b| a.0.cmp(&b.0));
    violations.into_iter().map(|(_, violation)| violation).collect()
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
