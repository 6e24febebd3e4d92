use super::schema::{Field, FieldKind};
use super::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog post, looked up by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub tags: Vec<String>,
    pub author_id: String,
    pub date_added: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<DateTime<Utc>>,
}

impl Entity for BlogPost {
    const KIND: &'static str = "blog_posts";
    const LABEL: &'static str = "blog post";
    const NATURAL_KEY: &'static str = "slug";
    const SCHEMA: &'static [Field] = &[
        Field::required("id", FieldKind::NonEmptyString),
        Field::required("title", FieldKind::NonEmptyString),
        Field::required("slug", FieldKind::NonEmptyString),
        Field::required("body", FieldKind::String),
        Field::required("tags", FieldKind::StringArray),
        Field::required("authorId", FieldKind::NonEmptyString),
        Field::required("dateAdded", FieldKind::DateTime),
        Field::optional("updateAuthorId", FieldKind::String),
        Field::optional("dateUpdated", FieldKind::DateTime),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.slug
    }

    fn added_at(&self) -> DateTime<Utc> {
        self.date_added
    }

    fn name(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trips_with_tags() {
        let raw = json!({
            "id": "b1",
            "title": "Hello",
            "slug": "hello",
            "body": "first post",
            "tags": ["intro", "meta"],
            "authorId": "a1",
            "dateAdded": "2023-12-31T23:59:59.999Z"
        });
        let post = BlogPost::from_json(&raw).unwrap();
        assert_eq!(post.key(), "hello");
        assert_eq!(BlogPost::from_json(&post.to_json()).unwrap(), post);
    }

    #[test]
    fn test_tags_must_be_strings() {
        let raw = json!({
            "id": "b1",
            "title": "Hello",
            "slug": "",
            "body": "",
            "tags": ["ok", 3],
            "authorId": "a1",
            "dateAdded": "2023-12-31T23:59:59Z"
        });
        let err = BlogPost::from_json(&raw).unwrap_err();
        assert_eq!(err.invalid_fields().unwrap(), &["slug", "tags"]);
    }
}
