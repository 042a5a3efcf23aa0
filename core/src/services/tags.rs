//! `/tags` endpoint.

use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::response::Response;
use crate::types::Tag;

pub trait TagApi {
    fn list(&self) -> Result<(Vec<Tag>, Response)>;
}

#[derive(Debug, Clone, Copy)]
pub struct Tags<'a> {
    client: &'a Client,
}

impl<'a> Tags<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl TagApi for Tags<'_> {
    fn list(&self) -> Result<(Vec<Tag>, Response)> {
        let req = self.client.new_request(HttpMethod::Get, "/tags")?;
        self.client.send_json(&req)
    }
}
