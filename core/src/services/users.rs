//! `/users` endpoint.

use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::response::Response;
use crate::services::{push_paging, with_query};
use crate::types::User;

pub trait UserApi {
    fn list(&self, opts: &UserListOptions) -> Result<(Vec<User>, Response)>;
}

/// Query parameters for [`UserApi::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListOptions {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Ask the server to fill in each user's `groups`.
    pub include_user_groups: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    client: &'a Client,
}

impl<'a> Users<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl UserApi for Users<'_> {
    fn list(&self, opts: &UserListOptions) -> Result<(Vec<User>, Response)> {
        let mut params = Vec::new();
        if let Some(q) = opts.q.as_deref().filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        push_paging(&mut params, opts.page, opts.per_page);
        if opts.include_user_groups {
            params.push(("include_user_groups", "true".to_string()));
        }

        let req = self
            .client
            .new_request(HttpMethod::Get, &with_query("/users", &params))?;
        self.client.send_json(&req)
    }
}
