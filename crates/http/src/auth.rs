//! Request extractor resolving the calling principal.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use libris_authz::{ApiKeyring, AuthError, Principal};

use crate::error::AppError;

/// Principal of the current request.
///
/// Reads the keyring installed by [`crate::router::RouterBuilder::with_keyring`];
/// without one, only anonymous callers are accepted.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

impl Caller {
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map_err(|_| AuthError::Malformed))
            .transpose()?;

        let principal = match parts.extensions.get::<Arc<ApiKeyring>>() {
            Some(keyring) => keyring.authenticate(header)?,
            None => ApiKeyring::default().authenticate(header)?,
        };

        Ok(Caller(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use libris_authz::{ApiKey, Role};

    fn parts(authorization: Option<&str>, keyring: Option<ApiKeyring>) -> Parts {
        let mut builder = Request::builder().uri("/api/books");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if let Some(keyring) = keyring {
            parts.extensions.insert(Arc::new(keyring));
        }
        parts
    }

    fn keyring() -> ApiKeyring {
        ApiKeyring::new([ApiKey {
            name: "ops".to_string(),
            key: "secret".to_string(),
            roles: vec![Role::Admin],
        }])
    }

    #[tokio::test]
    async fn anonymous_without_header() {
        let mut parts = parts(None, Some(keyring()));
        let caller = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(!caller.principal().is_admin());
    }

    #[tokio::test]
    async fn bearer_key_yields_admin() {
        let mut parts = parts(Some("Bearer secret"), Some(keyring()));
        let caller = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(caller.principal().is_admin());
    }

    #[tokio::test]
    async fn unknown_key_is_unauthorized() {
        let mut parts = parts(Some("Bearer secret"), None);
        let err = Caller::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
