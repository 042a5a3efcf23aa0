//! `/groups` endpoints.

use serde::Serialize;

use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::response::Response;
use crate::services::{push_paging, with_query};
use crate::types::{Group, SimpleGroup};

pub trait GroupApi {
    fn list(&self, opts: &GroupListOptions) -> Result<(Vec<SimpleGroup>, Response)>;
    fn get(&self, group_id: u64) -> Result<(Group, Response)>;
    fn create(&self, request: &GroupCreateRequest) -> Result<(Group, Response)>;
    fn add_users(&self, group_id: u64, request: &GroupUsersRequest) -> Result<Response>;
    fn remove_users(&self, group_id: u64, request: &GroupUsersRequest) -> Result<Response>;
}

/// Query parameters for [`GroupApi::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupListOptions {
    pub name: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupCreateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Users to add to or remove from a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupUsersRequest {
    pub user_ids: Vec<u64>,
}

impl GroupUsersRequest {
    pub fn new(user_ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            user_ids: user_ids.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Groups<'a> {
    client: &'a Client,
}

impl<'a> Groups<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

pub(crate) fn group_users_path(group_id: u64) -> String {
    format!("/groups/{group_id}/users")
}

impl GroupApi for Groups<'_> {
    fn list(&self, opts: &GroupListOptions) -> Result<(Vec<SimpleGroup>, Response)> {
        let mut params = Vec::new();
        if let Some(name) = opts.name.as_deref().filter(|name| !name.is_empty()) {
            params.push(("name", name.to_string()));
        }
        push_paging(&mut params, opts.page, opts.per_page);

        let req = self
            .client
            .new_request(HttpMethod::Get, &with_query("/groups", &params))?;
        self.client.send_json(&req)
    }

    fn get(&self, group_id: u64) -> Result<(Group, Response)> {
        let req = self
            .client
            .new_request(HttpMethod::Get, &format!("/groups/{group_id}"))?;
        self.client.send_json(&req)
    }

    fn create(&self, request: &GroupCreateRequest) -> Result<(Group, Response)> {
        let req = self
            .client
            .new_json_request(HttpMethod::Post, "/groups", request)?;
        self.client.send_json(&req)
    }

    fn add_users(&self, group_id: u64, request: &GroupUsersRequest) -> Result<Response> {
        let req = self.client.new_json_request(
            HttpMethod::Post,
            &group_users_path(group_id),
            request,
        )?;
        self.client.send(&req)
    }

    fn remove_users(&self, group_id: u64, request: &GroupUsersRequest) -> Result<Response> {
        let req = self.client.new_json_request(
            HttpMethod::Delete,
            &group_users_path(group_id),
            request,
        )?;
        self.client.send(&req)
    }
}
