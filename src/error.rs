//! Error taxonomy shared by the schema store, review store and directory.

use sea_orm::DbErr;
use serde::Serialize;

/// Result alias used by every core operation.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Rejected input. Review submissions fill `missing` / `out_of_range` with
/// field names in schema order; other payloads set `message`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub missing: Vec<String>,
    pub out_of_range: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationError {
    /// A validation failure described only by a message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            message: Some(msg.into()),
            ..Default::default()
        }
    }

    /// A validation failure on a single named attribute.
    pub fn invalid(field: &str, msg: impl Into<String>) -> Self {
        Self {
            out_of_range: vec![field.to_string()],
            message: Some(msg.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.out_of_range.is_empty() && self.message.is_none()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(msg) = &self.message {
            parts.push(msg.clone());
        }
        if !self.missing.is_empty() {
            parts.push(format!("missing fields: {}", self.missing.join(", ")));
        }
        if !self.out_of_range.is_empty() {
            parts.push(format!("invalid fields: {}", self.out_of_range.join(", ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by core operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Submitted data violates required/bounds/uniqueness constraints
    Validation(ValidationError),
    /// Referenced builder, review, user or field definition does not exist
    NotFound(String),
    /// Caller may not touch this resource
    Authorization(String),
    /// A cardinality bound was exceeded (e.g. photo count)
    LimitExceeded(String),
    /// Aggregate recomputation failed; the enclosing mutation was rolled back
    Consistency(DbErr),
    /// Any other storage failure
    Database(DbErr),
}

impl ServiceError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} {} not found", what, id))
    }

    /// True for failures the caller cannot fix by changing the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, ServiceError::Consistency(_) | ServiceError::Database(_))
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Validation(e) => write!(f, "Validation error: {}", e),
            ServiceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServiceError::Authorization(msg) => write!(f, "Not authorized: {}", msg),
            ServiceError::LimitExceeded(msg) => write!(f, "Limit exceeded: {}", msg),
            ServiceError::Consistency(e) => write!(f, "Aggregate recomputation failed: {}", e),
            ServiceError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Validation(e) => Some(e),
            ServiceError::Consistency(e) | ServiceError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        ServiceError::Database(e)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::Validation(e)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        ServiceError::Validation(ValidationError {
            out_of_range: fields,
            message: Some("Invalid input".to_string()),
            ..Default::default()
        })
    }
}
