//! Records returned by the DocBase API.
//!
//! # Design
//! Every nested shape (users, groups, tags, comments, attachments embedded
//! in a post) is a named type shared by all resources that embed it, so its
//! decode contract does not depend on the enclosing response. Collections
//! default to empty when absent; values the API may send as `null` are
//! `Option`s.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Who can read a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Everyone,
    Group,
    Private,
}

/// User reference embedded in posts, comments and groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleUser {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// Group reference embedded in posts and users; also the group list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleGroup {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub created_at: DateTime<FixedOffset>,
    pub user: SimpleUser,
}

/// An uploaded file. `id` is the server-assigned file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub url: String,
    pub markdown: String,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub draft: bool,
    pub archived: bool,
    pub url: String,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub scope: Scope,
    #[serde(default)]
    pub sharing_url: Option<String>,
    pub user: SimpleUser,
    #[serde(default)]
    pub stars_count: u64,
    #[serde(default)]
    pub good_jobs_count: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub groups: Vec<SimpleGroup>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub posts_count: u64,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub users: Vec<SimpleUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    pub role: String,
    #[serde(default)]
    pub posts_count: u64,
    #[serde(default)]
    pub last_access_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub two_step_authentication: bool,
    /// Only populated when the list was requested with group membership.
    #[serde(default)]
    pub groups: Vec<SimpleGroup>,
}
