//! Time related utils.
//!
//! Signatures embed the signing instant twice (in the `x-amz-date` header and
//! in the string-to-sign), and both must come from the same reading of the
//! same clock. Everything here is UTC; the wire formats have no offset.

use std::fmt::Debug;

use chrono::SecondsFormat;
use chrono::Utc;

use crate::{Error, Result};

/// DateTime in UTC.
pub type DateTime = chrono::DateTime<Utc>;

/// Returns the current time in UTC.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format a datetime as a date stamp: `yyyyMMdd`.
///
/// ```text
/// 20220301
/// ```
pub fn format_date(t: DateTime) -> String {
    t.format("%Y%m%d").to_string()
}

/// Format a datetime as a full timestamp: `yyyyMMdd'T'HHmmss'Z'`.
///
/// ```text
/// 20220301T165657Z
/// ```
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format a datetime as RFC 3339: `2022-03-01T16:56:57Z`.
pub fn format_rfc3339(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC 3339 string like `2022-03-01T16:56:57Z` into a [`DateTime`].
pub fn parse_rfc3339(s: &str) -> Result<DateTime> {
    let t = chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| Error::unexpected(format!("parse '{s}' as rfc3339 failed")).with_source(e))?;
    Ok(t.with_timezone(&Utc))
}

/// A capability that supplies the current instant.
///
/// Injected into signers so that signing is deterministic under test: the
/// signer reads the clock exactly once per signing operation and derives
/// every timestamp field from that single reading.
pub trait Clock: Debug + Send + Sync + 'static {
    /// Returns the current time in UTC.
    fn now(&self) -> DateTime;
}

/// The wall clock. The default for production signers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        now()
    }
}

/// A clock frozen at a fixed instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime);

impl Clock for FixedClock {
    fn now(&self) -> DateTime {
        self.0
    }
}
