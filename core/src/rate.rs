//! Client-side view of the API rate limit.
//!
//! # Design
//! The server reports its budget through three response headers. After each
//! dispatched request the client replaces its cached [`Rate`] wholesale
//! (last write wins) and consults it before the next request. The cache only
//! saves pointless round-trips; the server stays the authority, so races
//! between the pre-check and a concurrent update are tolerated.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::http::HttpResponse;

pub const HEADER_RATE_LIMIT: &str = "X-RateLimit-Limit";
pub const HEADER_RATE_REMAINING: &str = "X-RateLimit-Remaining";
pub const HEADER_RATE_RESET: &str = "X-RateLimit-Reset";

/// Rate-limit counters observed on a response.
///
/// The default value is the empty snapshot: nothing known about the limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub limit: u32,
    pub remaining: u32,
    pub reset: Option<DateTime<Utc>>,
}

impl Rate {
    /// Read the rate-limit headers from a response.
    ///
    /// Missing or unparseable headers leave the corresponding field at its
    /// default. A reset of `0` means no reset time is known.
    pub fn from_response(response: &HttpResponse) -> Self {
        let mut rate = Rate::default();
        if let Some(limit) = parse_header::<u32>(response, HEADER_RATE_LIMIT) {
            rate.limit = limit;
        }
        if let Some(remaining) = parse_header::<u32>(response, HEADER_RATE_REMAINING) {
            rate.remaining = remaining;
        }
        rate.reset = parse_header::<i64>(response, HEADER_RATE_RESET)
            .filter(|secs| *secs != 0)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        rate
    }

    /// True when this snapshot proves a request made at `now` would be refused.
    pub fn is_exhausted_at(&self, now: DateTime<Utc>) -> bool {
        match self.reset {
            Some(reset) => self.remaining == 0 && now < reset,
            None => false,
        }
    }
}

fn parse_header<T: std::str::FromStr>(response: &HttpResponse, name: &str) -> Option<T> {
    response.header(name).and_then(|value| value.trim().parse().ok())
}

/// Lock-protected holder of the most recent [`Rate`] snapshot.
#[derive(Debug, Default)]
pub struct RateLimitState {
    current: Mutex<Rate>,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the latest snapshot.
    pub fn snapshot(&self) -> Rate {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the stored snapshot.
    pub fn replace(&self, rate: Rate) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = rate;
    }

    /// Pre-check a request about to be sent at `now`.
    ///
    /// Never blocks; when the cached limit is exhausted this returns a
    /// [`Error::RateLimit`] without a status, and the caller decides when to
    /// try again.
    pub fn check(&self, now: DateTime<Utc>) -> Result<()> {
        let rate = self.snapshot();
        match rate.reset {
            Some(reset) if rate.is_exhausted_at(now) => Err(Error::RateLimit {
                status: None,
                rate,
                messages: vec![format!(
                    "API rate limit of {} still exceeded until {}, not making remote request.",
                    rate.limit, reset
                )],
            }),
            _ => Ok(()),
        }
    }
}
