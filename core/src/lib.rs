//! Core building blocks for request signing.
//!
//! This crate carries everything a signing scheme needs that is not specific
//! to one scheme:
//!
//! - [`hash`]: SHA-256 and HMAC-SHA256 helpers.
//! - [`time`]: timestamp formatting and the injectable [`Clock`] capability.
//! - [`RequestView`]: a read-only projection of the request being signed.
//! - [`Error`]: the error type shared across the workspace.
//!
//! The scheme itself (canonicalization, key derivation, header assembly)
//! lives in the service crates, e.g. `awsign-aws-v4`.

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};
mod request;
pub use request::RequestView;

pub use time::{Clock, FixedClock, SystemClock};
