//! Remote Steam app-metadata lookup.
//!
//! Thin async client for the public steamcmd.net app-info API, used to
//! resolve an app's display name and client-icon hash. The lookup is
//! best-effort: callers that only need the hash get `None` on any
//! failure rather than an error.

pub mod client;
pub mod types;

pub use client::{Client, Error};
pub use types::AppMetadata;
