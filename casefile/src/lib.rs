//! Record registry for police agents (`agentes`) and their cases (`casos`).
//!
//! The crate keeps a strict separation between:
//!
//! - **[`core`]**: Pure, deterministic logic (validation, identifier policy,
//!   reference checks, filtering, sorting, partial merges). No I/O.
//! - **[`io`]**: Side-effecting collaborators (configuration, the JSON store,
//!   seed data).
//!
//! [`service`] wires the two together into the query and mutation pipelines
//! used by the `casefile` CLI and the `casefile-api` HTTP server.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
