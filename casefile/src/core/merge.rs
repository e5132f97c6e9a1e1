//! Overlay of a validated sparse update onto a stored record.

use serde_json::{Map, Value};

use crate::core::error::RecordError;
use crate::core::identifier::RecordId;
use crate::core::types::Record;
use crate::core::validator::ID_FIELD;

/// Returns `existing` with every field present in `updates` replaced.
///
/// `updates` must already have passed sparse validation. The identifier of
/// the result is always `id`, whatever either input says.
pub fn merge_partial<R: Record>(
    existing: &R,
    updates: &Map<String, Value>,
    id: &RecordId,
) -> Result<R, RecordError> {
    let mut object = match serde_json::to_value(existing) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return Err(RecordError::malformed("stored record is not an object")),
        Err(err) => return Err(RecordError::malformed(format!("stored record: {err}"))),
    };
    for (field, value) in updates {
        if field != ID_FIELD {
            object.insert(field.clone(), value.clone());
        }
    }
    let id = serde_json::to_value(id)
        .map_err(|err| RecordError::malformed(format!("record identifier: {err}")))?;
    object.insert(ID_FIELD.to_string(), id);
    serde_json::from_value(Value::Object(object))
        .map_err(|err| RecordError::malformed(format!("merged record: {err}")))
}
