use super::schema::{Field, FieldKind};
use super::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for an uploaded file. The bytes themselves live elsewhere;
/// `filename` is the stored name and the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    pub id: String,
    pub original_filename: String,
    pub filename: String,
    pub date_added: DateTime<Utc>,
    pub author_id: String,
    pub mimetype: String,
    pub size: u64,
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<DateTime<Utc>>,
}

impl Entity for FileDetails {
    const KIND: &'static str = "files";
    const LABEL: &'static str = "file";
    const NATURAL_KEY: &'static str = "filename";
    const SCHEMA: &'static [Field] = &[
        Field::required("id", FieldKind::NonEmptyString),
        Field::required("originalFilename", FieldKind::NonEmptyString),
        Field::required("filename", FieldKind::NonEmptyString),
        Field::required("dateAdded", FieldKind::DateTime),
        Field::required("authorId", FieldKind::NonEmptyString),
        Field::required("mimetype", FieldKind::NonEmptyString),
        Field::required("size", FieldKind::NonNegativeInteger),
        Field::required("isPrivate", FieldKind::Bool),
        Field::optional("updateAuthorId", FieldKind::String),
        Field::optional("dateUpdated", FieldKind::DateTime),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.filename
    }

    fn added_at(&self) -> DateTime<Utc> {
        self.date_added
    }

    fn name(&self) -> &str {
        &self.original_filename
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trips() {
        let raw = json!({
            "id": "f1",
            "originalFilename": "Cat Picture.png",
            "filename": "3f2a.png",
            "dateAdded": "2024-01-01T00:00:00Z",
            "authorId": "a1",
            "mimetype": "image/png",
            "size": 2048,
            "isPrivate": true
        });
        let file = FileDetails::from_json(&raw).unwrap();
        assert_eq!(file.key(), "3f2a.png");
        assert_eq!(file.name(), "Cat Picture.png");
        assert_eq!(FileDetails::from_json(&file.to_json()).unwrap(), file);
    }

    #[test]
    fn test_size_must_be_a_non_negative_integer() {
        let raw = json!({
            "id": "f1",
            "originalFilename": "a.txt",
            "filename": "a.txt",
            "dateAdded": "2024-01-01T00:00:00Z",
            "authorId": "a1",
            "mimetype": "text/plain",
            "size": -4,
            "isPrivate": "no"
        });
        let err = FileDetails::from_json(&raw).unwrap_err();
        assert_eq!(err.invalid_fields().unwrap(), &["size", "isPrivate"]);
    }
}
