use super::schema::{Field, FieldKind};
use super::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub date_added: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<DateTime<Utc>>,
}

impl Entity for Note {
    const KIND: &'static str = "notes";
    const LABEL: &'static str = "note";
    const NATURAL_KEY: &'static str = "id";
    const SCHEMA: &'static [Field] = &[
        Field::required("id", FieldKind::NonEmptyString),
        Field::required("title", FieldKind::NonEmptyString),
        Field::required("content", FieldKind::String),
        Field::required("authorId", FieldKind::NonEmptyString),
        Field::required("dateAdded", FieldKind::DateTime),
        Field::optional("updateAuthorId", FieldKind::String),
        Field::optional("dateUpdated", FieldKind::DateTime),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.id
    }

    fn added_at(&self) -> DateTime<Utc> {
        self.date_added
    }

    fn name(&self) -> &str {
        &self.title
    }
}
