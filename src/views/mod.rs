//! Response representations.
//!
//! Entities serialize to their full shape; a per-`(resource, view)` field
//! policy then decides which fields are emitted, how relations are projected,
//! and whether hypermedia links are attached.

use std::collections::HashMap;

use anyhow::Context;
use bytes::Bytes;
use libris_authz::Principal;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Book,
    Author,
}

impl ResourceKind {
    pub const fn collection_path(&self) -> &'static str {
        match self {
            ResourceKind::Book => "/api/books",
            ResourceKind::Author => "/api/authors",
        }
    }

    /// Canonical single-fetch location of resource `id`.
    pub fn location(&self, id: i64) -> String {
        format!("{}/{}", self.collection_path(), id)
    }
}

/// Named visibility group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    GetBooks,
    GetAuthors,
}

/// Who a representation is rendered for. Admins see write links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    Public,
    Admin,
}

impl Audience {
    pub fn of(principal: &Principal) -> Self {
        if principal.is_admin() {
            Audience::Admin
        } else {
            Audience::Public
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Audience::Public => "public",
            Audience::Admin => "admin",
        }
    }
}

struct FieldPolicy {
    fields: &'static [&'static str],
    relations: &'static [(&'static str, ResourceKind)],
    links: bool,
}

impl FieldPolicy {
    fn relation(&self, field: &str) -> Option<ResourceKind> {
        self.relations
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }
}

static POLICIES: Lazy<HashMap<(ResourceKind, View), FieldPolicy>> = Lazy::new(|| {
    HashMap::from([
        (
            (ResourceKind::Book, View::GetBooks),
            FieldPolicy {
                fields: &["id", "title", "coverText", "author"],
                relations: &[("author", ResourceKind::Author)],
                links: true,
            },
        ),
        (
            (ResourceKind::Author, View::GetBooks),
            FieldPolicy {
                fields: &["id", "firstName", "lastName"],
                relations: &[],
                links: false,
            },
        ),
        (
            (ResourceKind::Author, View::GetAuthors),
            FieldPolicy {
                fields: &["id", "firstName", "lastName", "books"],
                relations: &[("books", ResourceKind::Book)],
                links: true,
            },
        ),
        (
            (ResourceKind::Book, View::GetAuthors),
            FieldPolicy {
                fields: &["id", "title", "coverText"],
                relations: &[],
                links: false,
            },
        ),
    ])
});

/// An entity that can be rendered through the policy table.
pub trait Resource: Serialize {
    const KIND: ResourceKind;
}

/// Render one resource under `view` for `audience`.
pub fn encode<T: Resource>(resource: &T, view: View, audience: Audience) -> anyhow::Result<Value> {
    let value = serde_json::to_value(resource)
        .with_context(|| format!("failed to serialize {:?}", T::KIND))?;
    Ok(project(T::KIND, view, audience, value))
}

/// Render a page of resources as the final JSON array bytes.
pub fn encode_list<T: Resource>(
    resources: &[T],
    view: View,
    audience: Audience,
) -> anyhow::Result<Bytes> {
    let items = resources
        .iter()
        .map(|resource| encode(resource, view, audience))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let body = serde_json::to_vec(&items).context("failed to encode resource list")?;
    Ok(Bytes::from(body))
}

fn project(kind: ResourceKind, view: View, audience: Audience, value: Value) -> Value {
    let Value::Object(mut object) = value else {
        return value;
    };

    let Some(policy) = POLICIES.get(&(kind, view)) else {
        // Kinds without a policy for this view expose nothing.
        return Value::Object(Map::new());
    };

    let id = object.get("id").and_then(Value::as_i64);
    let mut projected = Map::new();

    for field in policy.fields {
        let Some(value) = object.remove(*field) else {
            continue;
        };
        let value = match policy.relation(field) {
            Some(related) => project_relation(related, view, audience, value),
            None => value,
        };
        projected.insert((*field).to_string(), value);
    }

    if let (true, Some(id)) = (policy.links, id) {
        projected.insert("_links".to_string(), links(kind, id, audience));
    }

    Value::Object(projected)
}

fn project_relation(kind: ResourceKind, view: View, audience: Audience, value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| project(kind, view, audience, item))
                .collect(),
        ),
        other => project(kind, view, audience, other),
    }
}

fn links(kind: ResourceKind, id: i64, audience: Audience) -> Value {
    let href = kind.location(id);
    let mut links = Map::new();
    links.insert("self".to_string(), json!({ "href": href }));

    if audience == Audience::Admin {
        links.insert("update".to_string(), json!({ "href": href }));
        links.insert("delete".to_string(), json!({ "href": href }));
    }

    Value::Object(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::authors::models::Author;
    use crate::modules::books::models::Book;

    fn dune() -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            cover_text: Some("Spice".to_string()),
            author: Some(Author {
                id: 7,
                first_name: "Frank".to_string(),
                last_name: "Herbert".to_string(),
                books: vec![],
            }),
        }
    }

    #[test]
    fn book_view_embeds_author_without_its_books() {
        let value = encode(&dune(), View::GetBooks, Audience::Public).unwrap();

        assert_eq!(value["title"], "Dune");
        assert_eq!(value["coverText"], "Spice");
        assert_eq!(
            value["author"],
            json!({"id": 7, "firstName": "Frank", "lastName": "Herbert"})
        );
        assert_eq!(value["_links"], json!({"self": {"href": "/api/books/1"}}));
    }

    #[test]
    fn admins_get_write_links() {
        let value = encode(&dune(), View::GetBooks, Audience::Admin).unwrap();
        assert_eq!(value["_links"]["update"]["href"], "/api/books/1");
        assert_eq!(value["_links"]["delete"]["href"], "/api/books/1");
    }

    #[test]
    fn author_view_lists_books_without_back_reference() {
        let mut book = dune();
        book.author = None;
        let author = Author {
            id: 7,
            first_name: "Frank".to_string(),
            last_name: "Herbert".to_string(),
            books: vec![book],
        };

        let value = encode(&author, View::GetAuthors, Audience::Public).unwrap();
        assert_eq!(
            value["books"],
            json!([{"id": 1, "title": "Dune", "coverText": "Spice"}])
        );
        assert_eq!(value["_links"]["self"]["href"], "/api/authors/7");
    }

    #[test]
    fn missing_author_stays_null() {
        let mut book = dune();
        book.author = None;
        let value = encode(&book, View::GetBooks, Audience::Public).unwrap();
        assert!(value["author"].is_null());
    }

    #[test]
    fn list_encoding_is_a_json_array() {
        let body = encode_list(&[dune()], View::GetBooks, Audience::Public).unwrap();
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }
}
