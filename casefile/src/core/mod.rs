//! Deterministic, pure logic shared by the casefile service.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! records and payloads and return deterministic outputs suitable for tests.
//! Storage is reached only through closures handed in by the caller.

pub mod collation;
pub mod error;
pub mod filter;
pub mod identifier;
pub mod integrity;
pub mod merge;
pub mod query;
pub mod sort;
pub mod types;
pub mod validator;
