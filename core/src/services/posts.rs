//! `/posts` endpoints.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::response::{Meta, Response};
use crate::services::{push_paging, with_query};
use crate::types::{Post, Scope};

/// Sort term appended to list queries that do not name their own order.
pub const DEFAULT_SORT: &str = "desc:score";

pub trait PostApi {
    /// Search posts. The response carries the pagination `meta`.
    fn list(&self, opts: &PostListOptions) -> Result<(Vec<Post>, Response)>;
    fn get(&self, post_id: u64) -> Result<(Post, Response)>;
    fn create(&self, request: &PostCreateRequest) -> Result<(Post, Response)>;
    fn update(&self, post_id: u64, request: &PostUpdateRequest) -> Result<(Post, Response)>;
    fn delete(&self, post_id: u64) -> Result<Response>;
    fn archive(&self, post_id: u64) -> Result<Response>;
    fn unarchive(&self, post_id: u64) -> Result<Response>;
}

/// Query parameters for [`PostApi::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostListOptions {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PostListOptions {
    /// The search query actually sent: `q` plus [`DEFAULT_SORT`] unless the
    /// query already carries an `asc:` or `desc:` term.
    pub fn query_with_default_sort(&self) -> String {
        let q = self.q.as_deref().map(str::trim).unwrap_or_default();
        if q.contains("desc:") || q.contains("asc:") {
            q.to_string()
        } else if q.is_empty() {
            DEFAULT_SORT.to_string()
        } else {
            format!("{q} {DEFAULT_SORT}")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostCreateRequest {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Group ids; only meaningful with [`Scope::Group`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<FixedOffset>>,
}

impl PostCreateRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }
}

/// Partial update; unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize)]
struct PostList {
    posts: Vec<Post>,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Clone, Copy)]
pub struct Posts<'a> {
    client: &'a Client,
}

impl<'a> Posts<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl PostApi for Posts<'_> {
    fn list(&self, opts: &PostListOptions) -> Result<(Vec<Post>, Response)> {
        let mut params = vec![("q", opts.query_with_default_sort())];
        push_paging(&mut params, opts.page, opts.per_page);

        let req = self
            .client
            .new_request(HttpMethod::Get, &with_query("/posts", &params))?;
        let (list, response): (PostList, _) = self.client.send_json(&req)?;
        Ok((list.posts, response.with_meta(list.meta)))
    }

    fn get(&self, post_id: u64) -> Result<(Post, Response)> {
        let req = self
            .client
            .new_request(HttpMethod::Get, &format!("/posts/{post_id}"))?;
        self.client.send_json(&req)
    }

    fn create(&self, request: &PostCreateRequest) -> Result<(Post, Response)> {
        let req = self
            .client
            .new_json_request(HttpMethod::Post, "/posts", request)?;
        self.client.send_json(&req)
    }

    fn update(&self, post_id: u64, request: &PostUpdateRequest) -> Result<(Post, Response)> {
        let req = self.client.new_json_request(
            HttpMethod::Patch,
            &format!("/posts/{post_id}"),
            request,
        )?;
        self.client.send_json(&req)
    }

    fn delete(&self, post_id: u64) -> Result<Response> {
        let req = self
            .client
            .new_request(HttpMethod::Delete, &format!("/posts/{post_id}"))?;
        self.client.send(&req)
    }

    fn archive(&self, post_id: u64) -> Result<Response> {
        let req = self
            .client
            .new_request(HttpMethod::Put, &format!("/posts/{post_id}/archive"))?;
        self.client.send(&req)
    }

    fn unarchive(&self, post_id: u64) -> Result<Response> {
        let req = self
            .client
            .new_request(HttpMethod::Put, &format!("/posts/{post_id}/unarchive"))?;
        self.client.send(&req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(q: Option<&str>) -> PostListOptions {
        PostListOptions {
            q: q.map(str::to_string),
            ..PostListOptions::default()
        }
    }

    #[test]
    fn default_sort_is_added_to_plain_queries() {
        assert_eq!(opts(None).query_with_default_sort(), "desc:score");
        assert_eq!(opts(Some("")).query_with_default_sort(), "desc:score");
        assert_eq!(
            opts(Some("author:danny")).query_with_default_sort(),
            "author:danny desc:score"
        );
    }

    #[test]
    fn explicit_sort_is_kept() {
        assert_eq!(
            opts(Some("rails desc:created_at")).query_with_default_sort(),
            "rails desc:created_at"
        );
        assert_eq!(
            opts(Some("asc:title")).query_with_default_sort(),
            "asc:title"
        );
    }

    #[test]
    fn create_request_omits_unset_fields() {
        let body = serde_json::to_value(PostCreateRequest::new("t", "b")).unwrap();
        assert_eq!(body, serde_json::json!({"title": "t", "body": "b"}));
    }

    #[test]
    fn update_request_only_sends_changes() {
        let request = PostUpdateRequest {
            draft: Some(false),
            tags: Some(vec!["rust".to_string()]),
            ..PostUpdateRequest::default()
        };
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(body, serde_json::json!({"draft": false, "tags": ["rust"]}));
    }
}
