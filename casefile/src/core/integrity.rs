//! Cross-record reference checks.
//!
//! The checker never touches storage itself. Callers hand in an existence
//! lookup, so the same rule runs against the in-memory store in tests and the
//! file-backed store in production, and storage failures flow through the
//! caller's own error type.

use serde_json::Value;

use crate::core::error::{Entity, RecordError};
use crate::core::identifier::{IdentifierPolicy, RecordId};

/// Format-check a raw reference value and confirm the target exists.
///
/// Returns the canonical identifier of the referenced record.
pub fn resolve_reference<E, F>(
    target: Entity,
    raw: &Value,
    policy: IdentifierPolicy,
    exists: F,
) -> Result<RecordId, E>
where
    E: From<RecordError>,
    F: FnOnce(&RecordId) -> Result<bool, E>,
{
    let token = RecordId::from_json(raw).ok_or_else(|| RecordError::InvalidIdentifierFormat {
        token: raw.to_string(),
    })?;
    let id = policy.parse(token.as_str())?;
    ensure_exists(target, &id, exists)?;
    Ok(id)
}

/// Confirm an already format-checked reference names a stored record.
pub fn ensure_exists<E, F>(target: Entity, id: &RecordId, exists: F) -> Result<(), E>
where
    E: From<RecordError>,
    F: FnOnce(&RecordId) -> Result<bool, E>,
{
    if exists(id)? {
        Ok(())
    } else {
        Err(RecordError::ReferencedEntityNotFound {
            entity: target,
            id: id.to_string(),
        }
        .into())
    }
}
