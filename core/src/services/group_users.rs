//! Group membership as a capability of its own.
//!
//! Hits the same endpoints as [`GroupApi::add_users`] and
//! [`GroupApi::remove_users`], for callers that only manage membership.
//!
//! [`GroupApi::add_users`]: crate::services::GroupApi::add_users
//! [`GroupApi::remove_users`]: crate::services::GroupApi::remove_users

use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::response::Response;
use crate::services::groups::group_users_path;
use crate::services::GroupUsersRequest;

pub trait GroupUserApi {
    fn create(&self, group_id: u64, request: &GroupUsersRequest) -> Result<Response>;
    fn delete(&self, group_id: u64, request: &GroupUsersRequest) -> Result<Response>;
}

#[derive(Debug, Clone, Copy)]
pub struct GroupUsers<'a> {
    client: &'a Client,
}

impl<'a> GroupUsers<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl GroupUserApi for GroupUsers<'_> {
    fn create(&self, group_id: u64, request: &GroupUsersRequest) -> Result<Response> {
        let req = self.client.new_json_request(
            HttpMethod::Post,
            &group_users_path(group_id),
            request,
        )?;
        self.client.send(&req)
    }

    fn delete(&self, group_id: u64, request: &GroupUsersRequest) -> Result<Response> {
        let req = self.client.new_json_request(
            HttpMethod::Delete,
            &group_users_path(group_id),
            request,
        )?;
        self.client.send(&req)
    }
}
