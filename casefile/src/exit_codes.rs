//! Stable exit codes for casefile CLI commands.

use crate::core::error::Outcome;
use crate::service::ServiceError;

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid input, invalid config/store, or any other failure.
pub const INVALID: i32 = 1;
/// The addressed record does not exist.
pub const NOT_FOUND: i32 = 2;
/// A case references an agent that does not exist.
pub const REFERENCED_NOT_FOUND: i32 = 3;
/// The mutation conflicts with stored records (agent still has cases).
pub const CONFLICT: i32 = 4;

pub fn for_error(err: &ServiceError) -> i32 {
    match err {
        ServiceError::Record(record) => match record.outcome() {
            Outcome::Validation => INVALID,
            Outcome::NotFound => NOT_FOUND,
            Outcome::ReferencedNotFound => REFERENCED_NOT_FOUND,
        },
        ServiceError::AgentInUse { .. } => CONFLICT,
        ServiceError::Storage(_) => INVALID,
    }
}
