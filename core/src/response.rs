//! Response envelope returned next to decoded payloads.

use serde::{Deserialize, Serialize};

use crate::http::{find_header, HttpResponse};
use crate::rate::Rate;

/// Pagination metadata from the `meta` object of list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub previous_page: Option<String>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub total: u64,
}

/// Transport-level facts about a completed call.
///
/// `meta` is only filled in by list operations whose body carries a `meta`
/// object; elsewhere it stays at its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub rate: Rate,
    pub meta: Meta,
}

impl Response {
    pub(crate) fn new(raw: &HttpResponse, rate: Rate) -> Self {
        Self {
            status: raw.status,
            headers: raw.headers.clone(),
            rate,
            meta: Meta::default(),
        }
    }

    pub(crate) fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn next_page(&self) -> Option<&str> {
        self.meta.next_page.as_deref()
    }

    pub fn previous_page(&self) -> Option<&str> {
        self.meta.previous_page.as_deref()
    }

    pub fn total(&self) -> u64 {
        self.meta.total
    }
}
