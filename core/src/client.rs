//! The shared request pipeline behind every resource service.
//!
//! # Design
//! `Client` owns the configuration (base URL, team, token, transport) and
//! the only piece of mutable state, the cached [`Rate`] snapshot. A call
//! goes through the same steps regardless of resource:
//!
//! 1. `new_request` / `new_json_request` build an [`HttpRequest`] with the
//!    absolute URL and the standard headers.
//! 2. The rate-limit pre-check refuses the call locally when the cached
//!    snapshot says the budget is spent and the reset time is ahead.
//! 3. The transport executes the request; the rate headers of whatever
//!    response arrives replace the cached snapshot.
//! 4. `check_response` turns non-success statuses into typed errors.
//! 5. The body is decoded as JSON, or handed back as raw bytes.
//!
//! Resource services borrow the client and only add paths and queries.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result, UNDECODABLE_ERROR_BODY};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::rate::{Rate, RateLimitState};
use crate::response::Response;
use crate::services::{
    Attachments, Comments, GroupUsers, Groups, Posts, Tags, Users,
};
use crate::transport::{Transport, UreqTransport};

pub const DEFAULT_API_HOST: &str = "https://api.docbase.io";
pub const API_VERSION: &str = "2";
pub const HEADER_TOKEN: &str = "X-DocBaseToken";
pub const HEADER_API_VERSION: &str = "X-Api-Version";
pub const DEFAULT_USER_AGENT: &str = concat!("docbase-rs/", env!("CARGO_PKG_VERSION"));

/// Blocking client for the DocBase API.
///
/// Safe to share across threads; the rate-limit snapshot is the only state
/// mutated after construction.
pub struct Client {
    base_url: Url,
    team: String,
    access_token: String,
    user_agent: String,
    transport: Arc<dyn Transport>,
    rate: RateLimitState,
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    team: String,
    access_token: String,
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Override the API root, e.g. to point at a local server.
    ///
    /// The URL must already include the team segment
    /// (`http://127.0.0.1:3000/teams/kray`).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<Client> {
        let raw = self
            .base_url
            .unwrap_or_else(|| format!("{DEFAULT_API_HOST}/teams/{}", self.team));
        let base_url = parse_base_url(&raw)?;

        Ok(Client {
            base_url,
            team: self.team,
            access_token: self.access_token,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(UreqTransport::new())),
            rate: RateLimitState::new(),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::Url {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::Url {
            url: raw.to_string(),
            reason: "base url must be an absolute http(s) url".to_string(),
        });
    }
    Ok(url)
}

/// Error body sent with non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<String>,
}

impl Client {
    /// Client for `team` using the default base URL and transport.
    pub fn new(team: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::builder(team, access_token).build()
    }

    pub fn builder(team: impl Into<String>, access_token: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            team: team.into(),
            access_token: access_token.into(),
            base_url: None,
            transport: None,
            user_agent: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Self::builder(config.team.clone(), config.token.clone());
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url.clone());
        }
        builder.build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    /// The most recently observed rate-limit snapshot.
    pub fn rate(&self) -> Rate {
        self.rate.snapshot()
    }

    pub fn posts(&self) -> Posts<'_> {
        Posts::new(self)
    }

    pub fn comments(&self) -> Comments<'_> {
        Comments::new(self)
    }

    pub fn groups(&self) -> Groups<'_> {
        Groups::new(self)
    }

    pub fn group_users(&self) -> GroupUsers<'_> {
        GroupUsers::new(self)
    }

    pub fn tags(&self) -> Tags<'_> {
        Tags::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn attachments(&self) -> Attachments<'_> {
        Attachments::new(self)
    }

    /// Build a request without a payload for `path` relative to the base URL.
    pub fn new_request(&self, method: HttpMethod, path: &str) -> Result<HttpRequest> {
        let url = self.endpoint(path)?;
        Ok(self.build_request(method, url, None))
    }

    /// Build a request for `path` followed by `segment` as one escaped path
    /// segment. `/`, `#`, `?` and `%` in `segment` never change the route.
    pub fn new_segment_request(
        &self,
        method: HttpMethod,
        path: &str,
        segment: &str,
    ) -> Result<HttpRequest> {
        let url = self.endpoint_with_segment(path, segment)?;
        Ok(self.build_request(method, url, None))
    }

    /// Build a request whose payload is `body` serialized as JSON.
    pub fn new_json_request<B>(&self, method: HttpMethod, path: &str, body: &B) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body).map_err(Error::Encoding)?;
        let url = self.endpoint(path)?;
        Ok(self.build_request(method, url, Some(body)))
    }

    fn build_request(&self, method: HttpMethod, url: Url, body: Option<String>) -> HttpRequest {
        let headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
            (HEADER_TOKEN.to_string(), self.access_token.clone()),
            (HEADER_API_VERSION.to_string(), API_VERSION.to_string()),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ];
        HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
        }
    }

    /// Join `path` (with or without a leading slash) onto the base URL.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| Error::Url {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }

    fn endpoint_with_segment(&self, path: &str, segment: &str) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        // Dot segments cannot be escaped; the URL parser resolves `%2E%2E` too.
        if matches!(segment, "" | "." | "..") {
            return Err(Error::Url {
                url: format!("{url}/{segment}"),
                reason: format!("`{segment}` is not a valid path segment"),
            });
        }
        let invalid = Error::Url {
            url: url.to_string(),
            reason: "base url cannot take path segments".to_string(),
        };
        url.path_segments_mut()
            .map_err(|()| invalid)?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Fail locally if the cached snapshot says the rate limit is spent.
    pub fn check_rate_limit(&self) -> Result<()> {
        self.rate.check(Utc::now())
    }

    /// Send `request` and decode the JSON body into `T`.
    pub fn send_json<T: DeserializeOwned>(&self, request: &HttpRequest) -> Result<(T, Response)> {
        let (raw, response) = self.round_trip(request)?;
        let value = decode_json(&raw)?;
        Ok((value, response))
    }

    /// Send `request` and ignore any response body.
    pub fn send(&self, request: &HttpRequest) -> Result<Response> {
        let (_, response) = self.round_trip(request)?;
        Ok(response)
    }

    /// Send `request` and return the body bytes untouched.
    pub fn send_bytes(&self, request: &HttpRequest) -> Result<(Vec<u8>, Response)> {
        let (raw, response) = self.round_trip(request)?;
        Ok((raw.body, response))
    }

    fn round_trip(&self, request: &HttpRequest) -> Result<(HttpResponse, Response)> {
        self.check_rate_limit()?;
        let (raw, rate) = self.dispatch(request)?;
        check_response(&raw, rate)?;
        let response = Response::new(&raw, rate);
        Ok((raw, response))
    }

    /// Execute `request` and record the rate headers of the response.
    ///
    /// Returns the snapshot parsed from this response; the shared cell may
    /// already hold a newer one from a concurrent call.
    fn dispatch(&self, request: &HttpRequest) -> Result<(HttpResponse, Rate)> {
        debug!(method = %request.method, url = %request.url, "dispatching request");
        let raw = self.transport.execute(request).map_err(Error::Transport)?;

        let rate = Rate::from_response(&raw);
        self.rate.replace(rate);
        trace!(
            limit = rate.limit,
            remaining = rate.remaining,
            reset = ?rate.reset,
            "rate limit snapshot replaced"
        );
        debug!(status = raw.status, url = %request.url, "received response");
        Ok((raw, rate))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("team", &self.team)
            .field("access_token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("rate", &self.rate.snapshot())
            .finish_non_exhaustive()
    }
}

/// Map a raw response to success or to a typed error.
///
/// 200, 201 and 204 are successes. 429 becomes [`Error::RateLimit`]
/// carrying `rate`; any other status becomes [`Error::Api`].
pub fn check_response(response: &HttpResponse, rate: Rate) -> Result<()> {
    if matches!(response.status, 200 | 201 | 204) {
        return Ok(());
    }

    let (error, messages) = match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) if body.error.is_some() || !body.messages.is_empty() => {
            (body.error, body.messages)
        }
        _ => (None, vec![UNDECODABLE_ERROR_BODY.to_string()]),
    };

    if response.status == 429 {
        return Err(Error::RateLimit {
            status: Some(response.status),
            rate,
            messages,
        });
    }
    Err(Error::Api {
        status: response.status,
        error,
        messages,
    })
}

/// Decode a success body; a 204 decodes as JSON `null`.
fn decode_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    let body: &[u8] = if response.status == 204 {
        b"null"
    } else {
        &response.body
    };
    serde_json::from_slice(body).map_err(Error::Decode)
}
