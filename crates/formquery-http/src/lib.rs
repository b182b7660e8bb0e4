//! HTTP helpers that consume encoded queries.
//!
//! Builds request URLs from a base, a path, and a [`Query`], and sends single
//! requests that expect one status code and a JSON body.
//!
//! [`Query`]: formquery_core::Query

#![deny(missing_docs)]

pub mod client;
pub mod endpoint;

pub use client::{HttpClient, RequestOptions};
pub use endpoint::request_url;

/// Convenient result alias that reuses the shared formquery error type.
pub type Result<T> = formquery_core::Result<T>;
