//! # formquery-core
//!
//! Annotation-driven encoding of records into URL query strings.
//!
//! A [`Query`] accumulates key/value pairs through typed setters and renders
//! them as `application/x-www-form-urlencoded` text with sorted keys. Record
//! types registered with [`query_record!`] are projected field by field,
//! honouring `url`/`json` annotations, `omitempty`, and timestamp formats.
//!
//! ## Modules
//!
//! - [`query`] - The query accumulator and canonical encoding
//! - [`field`] - Field annotations, options, and time formats
//! - [`value`] - Value dispatch for projected fields
//! - [`record`] - Struct projection and the `query_record!` macro
//! - [`serialized`] - Projection of serde-serializable values
//! - [`config`] - Client configuration
//! - [`error`] - Error types

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod field;
pub mod query;
pub mod record;
pub mod serialized;
pub mod value;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use field::{FieldOptions, FieldSpec, FieldTags, TimeFormat};
pub use query::{Query, FALSE, TRUE};
pub use record::{QueryField, QueryRecord};
pub use value::{QueryValue, ToQueryValue};
