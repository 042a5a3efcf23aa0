//! Comment endpoints.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::response::Response;
use crate::types::Comment;

pub trait CommentApi {
    /// Comment on the post `post_id`.
    fn create(&self, post_id: u64, request: &CommentCreateRequest) -> Result<(Comment, Response)>;
    fn delete(&self, comment_id: u64) -> Result<Response>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentCreateRequest {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<FixedOffset>>,
}

impl CommentCreateRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Comments<'a> {
    client: &'a Client,
}

impl<'a> Comments<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl CommentApi for Comments<'_> {
    fn create(&self, post_id: u64, request: &CommentCreateRequest) -> Result<(Comment, Response)> {
        let req = self.client.new_json_request(
            HttpMethod::Post,
            &format!("/posts/{post_id}/comments"),
            request,
        )?;
        self.client.send_json(&req)
    }

    fn delete(&self, comment_id: u64) -> Result<Response> {
        let req = self
            .client
            .new_request(HttpMethod::Delete, &format!("/comments/{comment_id}"))?;
        self.client.send(&req)
    }
}
