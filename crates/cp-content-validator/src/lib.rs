//! # Content Validator
//!
//! Structural validation of uploaded batch files against their registered
//! schema. The check is presence-only: every field the schema declares must
//! exist in the file's own structure; declared types, row contents, and extra
//! fields are not judged.
//!
//! The boolean verdict is fail-closed. Any failure along the way (schema
//! resolution, file parsing, a missing field) yields `false`; the detailed
//! cause is available through [`SchemaValidator::check`] and is logged.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod validator;

pub use error::ValidationError;
pub use validator::SchemaValidator;
