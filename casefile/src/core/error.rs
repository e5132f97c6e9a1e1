//! Failure taxonomy shared by every core component.
//!
//! Each pipeline stage returns either a validated value or the most specific
//! [`RecordError`]. Boundary layers translate the [`Outcome`] class into a
//! caller-visible response; nothing in the core decides status codes.

use thiserror::Error;

/// Entity collections tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Agent,
    Case,
}

impl Entity {
    pub fn label(self) -> &'static str {
        match self {
            Entity::Agent => "agente",
            Entity::Case => "caso",
        }
    }
}

/// Outcome class of a failed request, as seen by the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Validation,
    NotFound,
    ReferencedNotFound,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid identifier '{token}'")]
    InvalidIdentifierFormat { token: String },

    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("field '{field}' cannot be set or altered by the caller")]
    ForbiddenFieldInPayload { field: String },

    #[error("missing required field '{field}'")]
    MissingRequiredField { field: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("invalid date for '{field}': '{value}' ({reason})")]
    InvalidDate {
        field: String,
        value: String,
        reason: String,
    },

    #[error("invalid value '{value}' for '{field}' (allowed: {})", .allowed.join(", "))]
    InvalidEnumValue {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("{} '{id}' not found", .entity.label())]
    RecordNotFound { entity: Entity, id: String },

    #[error("referenced {} '{id}' not found", .entity.label())]
    ReferencedEntityNotFound { entity: Entity, id: String },
}

impl RecordError {
    pub fn outcome(&self) -> Outcome {
        match self {
            RecordError::RecordNotFound { .. } => Outcome::NotFound,
            RecordError::ReferencedEntityNotFound { .. } => Outcome::ReferencedNotFound,
            _ => Outcome::Validation,
        }
    }

    /// Stable machine-readable kind, used in CLI and HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::InvalidIdentifierFormat { .. } => "invalid_identifier_format",
            RecordError::MalformedPayload { .. } => "malformed_payload",
            RecordError::ForbiddenFieldInPayload { .. } => "forbidden_field_in_payload",
            RecordError::MissingRequiredField { .. } => "missing_required_field",
            RecordError::InvalidFieldValue { .. } => "invalid_field_value",
            RecordError::InvalidDate { .. } => "invalid_date",
            RecordError::InvalidEnumValue { .. } => "invalid_enum_value",
            RecordError::RecordNotFound { .. } => "record_not_found",
            RecordError::ReferencedEntityNotFound { .. } => "referenced_entity_not_found",
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        RecordError::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        RecordError::InvalidFieldValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
