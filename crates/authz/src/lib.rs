//! Authorization gate for Libris.
//!
//! Callers present an API key as `Authorization: Bearer <key>`. The
//! [`ApiKeyring`] resolves it to a [`Principal`], and mutating operations call
//! [`Principal::require`] before touching the store or the cache.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Capability granted to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Principal {
    subject: Option<String>,
    roles: Vec<Role>,
}

impl Principal {
    /// Caller that presented no credentials
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(subject: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            subject: Some(subject.into()),
            roles,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Fail with `reason` unless the principal holds `role`.
    pub fn require(&self, role: Role, reason: &str) -> Result<(), Denied> {
        if self.has_role(role) {
            return Ok(());
        }

        tracing::warn!(
            target: "libris-authz",
            subject = self.subject().unwrap_or("anonymous"),
            required = %role,
            "authorization denied"
        );

        Err(Denied {
            role,
            reason: reason.to_string(),
        })
    }
}

/// A principal lacked the role an operation requires.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct Denied {
    pub role: Role,
    pub reason: String,
}

/// Presented credentials could not be turned into a principal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header must use the Bearer scheme")]
    Malformed,

    #[error("unknown API key")]
    UnknownKey,
}

/// Configured API key entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Lookup table from presented key to principal.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyring {
    keys: HashMap<String, Principal>,
}

impl ApiKeyring {
    pub fn new(keys: impl IntoIterator<Item = ApiKey>) -> Self {
        let keys = keys
            .into_iter()
            .map(|entry| (entry.key, Principal::new(entry.name, entry.roles)))
            .collect();
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Resolve the raw `Authorization` header value.
    ///
    /// A missing header is an anonymous caller, not an error.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        let Some(header) = authorization else {
            return Ok(Principal::anonymous());
        };

        let key = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AuthError::Malformed)?;

        self.keys.get(key).cloned().ok_or(AuthError::UnknownKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyring() -> ApiKeyring {
        ApiKeyring::new([
            ApiKey {
                name: "ops".to_string(),
                key: "admin-secret".to_string(),
                roles: vec![Role::Admin],
            },
            ApiKey {
                name: "reader".to_string(),
                key: "reader-secret".to_string(),
                roles: vec![Role::User],
            },
        ])
    }

    #[test]
    fn missing_header_is_anonymous() {
        let principal = keyring().authenticate(None).unwrap();
        assert_eq!(principal, Principal::anonymous());
        assert!(!principal.is_admin());
    }

    #[test]
    fn bearer_key_resolves_to_configured_principal() {
        let principal = keyring().authenticate(Some("Bearer admin-secret")).unwrap();
        assert_eq!(principal.subject(), Some("ops"));
        assert!(principal.is_admin());
    }

    #[test]
    fn unknown_and_malformed_credentials_are_rejected() {
        let keyring = keyring();
        assert_eq!(
            keyring.authenticate(Some("Bearer nope")),
            Err(AuthError::UnknownKey)
        );
        assert_eq!(
            keyring.authenticate(Some("Basic YWRtaW46YWRtaW4=")),
            Err(AuthError::Malformed)
        );
        assert_eq!(keyring.authenticate(Some("Bearer ")), Err(AuthError::Malformed));
    }

    #[test]
    fn require_reports_the_reason() {
        let reader = keyring().authenticate(Some("Bearer reader-secret")).unwrap();
        let denied = reader
            .require(Role::Admin, "insufficient rights to delete a book")
            .unwrap_err();
        assert_eq!(denied.role, Role::Admin);
        assert_eq!(denied.to_string(), "insufficient rights to delete a book");

        let admin = keyring().authenticate(Some("Bearer admin-secret")).unwrap();
        assert!(admin.require(Role::Admin, "unused").is_ok());
    }

    #[test]
    fn api_keys_deserialize_from_config_shape() {
        let key: ApiKey = serde_json::from_value(serde_json::json!({
            "name": "ops",
            "key": "k",
            "roles": ["admin"]
        }))
        .unwrap();
        assert_eq!(key.roles, vec![Role::Admin]);
    }
}
