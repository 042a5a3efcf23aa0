//! Wire shapes served by the mock.
//!
//! Defined independently of the client's records so end-to-end tests catch
//! drift between the two.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
    pub profile_image_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub created_at: DateTime<FixedOffset>,
    pub user: UserRef,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub url: String,
    pub markdown: String,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub draft: bool,
    pub archived: bool,
    pub url: String,
    pub created_at: DateTime<FixedOffset>,
    pub tags: Vec<Tag>,
    pub scope: String,
    pub sharing_url: Option<String>,
    pub user: UserRef,
    pub stars_count: u64,
    pub good_jobs_count: u64,
    pub comments: Vec<Comment>,
    pub groups: Vec<GroupRef>,
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub posts_count: u64,
    pub last_activity_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub users: Vec<UserRef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub profile_image_url: String,
    pub role: String,
    pub posts_count: u64,
    pub last_access_time: Option<DateTime<FixedOffset>>,
    pub two_step_authentication: bool,
    pub groups: Vec<GroupRef>,
}

impl User {
    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id,
            name: self.name.clone(),
            profile_image_url: self.profile_image_url.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub previous_page: Option<String>,
    pub next_page: Option<String>,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostList {
    pub posts: Vec<Post>,
    pub meta: Meta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub messages: Vec<String>,
}

// Request payloads. Unknown fields (notice, author_id, ...) are accepted and ignored.

#[derive(Debug, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub groups: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub body: Option<String>,
    pub draft: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub scope: Option<String>,
    pub groups: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroupUsers {
    pub user_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UploadFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupQuery {
    pub name: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub include_user_groups: Option<bool>,
}
