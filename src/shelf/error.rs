use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("Invalid {kind}: {}", fields.join(", "))]
    InvalidInput {
        kind: &'static str,
        fields: Vec<String>,
    },

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document store error: {0}")]
    Document(#[from] sled::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ShelfError {
    pub fn invalid(kind: &'static str, fields: Vec<String>) -> Self {
        ShelfError::InvalidInput { kind, fields }
    }

    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        ShelfError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// HTTP status a request boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ShelfError::InvalidInput { .. } => 400,
            ShelfError::NotFound { .. } => 404,
            _ => 500,
        }
    }

    /// Message safe to show to a client. Internal failures are not described.
    pub fn public_message(&self) -> String {
        match self {
            ShelfError::InvalidInput { fields, .. } => {
                format!("Invalid input: {}", fields.join(", "))
            }
            ShelfError::NotFound { kind, key } => format!("No {} found for '{}'", kind, key),
            _ => "Internal server error".to_string(),
        }
    }

    pub fn invalid_fields(&self) -> Option<&[String]> {
        match self {
            ShelfError::InvalidInput { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;
