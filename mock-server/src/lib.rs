//! In-memory stand-in for the DocBase API.
//!
//! Serves every endpoint the client uses under `/teams/{team}/...`, checks
//! the token header, and enforces a small rate-limit budget reported through
//! the `X-RateLimit-*` headers so the client's rate handling can be exercised
//! over real HTTP.

mod handlers;
mod model;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, FixedOffset, Utc};
use tokio::{net::TcpListener, sync::RwLock};

pub use model::*;

pub const TOKEN_HEADER: &str = "x-docbasetoken";

/// Largest request body accepted; uploads carry base64 file contents.
pub const BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Rate-limit budget enforced by the mock.
#[derive(Debug, Clone, Copy)]
pub struct MockConfig {
    /// Requests allowed per window.
    pub rate_limit: u32,
    /// Window length; the reset header is the window end in unix seconds.
    pub reset_after_secs: i64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            rate_limit: 300,
            reset_after_secs: 300,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Store {
    pub(crate) posts: BTreeMap<u64, Post>,
    pub(crate) groups: BTreeMap<u64, Group>,
    pub(crate) users: Vec<User>,
    pub(crate) files: HashMap<String, Vec<u8>>,
    pub(crate) next_post_id: u64,
    pub(crate) next_comment_id: u64,
    pub(crate) next_group_id: u64,
    remaining: u32,
    reset_at: i64,
}

impl Store {
    fn seeded() -> Self {
        let created_at = timestamp(1_585_268_709);
        let danny = User {
            id: 1,
            name: "danny".to_string(),
            username: "danny".to_string(),
            profile_image_url: "https://image.docbase.io/uploads/aaa.gif".to_string(),
            role: "owner".to_string(),
            posts_count: 0,
            last_access_time: Some(created_at),
            two_step_authentication: false,
            groups: Vec::new(),
        };
        let alice = User {
            id: 2,
            name: "alice".to_string(),
            username: "alice".to_string(),
            profile_image_url: "https://image.docbase.io/uploads/bbb.gif".to_string(),
            role: "user".to_string(),
            posts_count: 0,
            last_access_time: None,
            two_step_authentication: true,
            groups: Vec::new(),
        };

        let mut groups = BTreeMap::new();
        groups.insert(
            1,
            Group {
                id: 1,
                name: "DocBase".to_string(),
                description: Some("Everyone working on DocBase".to_string()),
                posts_count: 0,
                last_activity_at: Some(created_at),
                created_at,
                users: vec![danny.to_ref()],
            },
        );
        groups.insert(
            2,
            Group {
                id: 2,
                name: "kray-internal".to_string(),
                description: None,
                posts_count: 0,
                last_activity_at: None,
                created_at,
                users: Vec::new(),
            },
        );

        Self {
            groups,
            users: vec![danny, alice],
            next_post_id: 1,
            next_comment_id: 1,
            next_group_id: 3,
            ..Self::default()
        }
    }

    pub(crate) fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }
}

pub(crate) fn timestamp(secs: i64) -> DateTime<FixedOffset> {
    DateTime::from_timestamp(secs, 0)
        .unwrap_or_default()
        .fixed_offset()
}

pub(crate) fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

#[derive(Clone)]
pub struct AppState {
    pub(crate) db: Arc<RwLock<Store>>,
    config: MockConfig,
}

struct Budget {
    limit: u32,
    remaining: u32,
    reset_at: i64,
    allowed: bool,
}

impl AppState {
    fn new(config: MockConfig) -> Self {
        Self {
            db: Arc::new(RwLock::new(Store::seeded())),
            config,
        }
    }

    /// Charge one request against the current window.
    async fn spend(&self) -> Budget {
        let now = Utc::now().timestamp();
        let mut store = self.db.write().await;
        if now >= store.reset_at {
            store.remaining = self.config.rate_limit;
            store.reset_at = now + self.config.reset_after_secs;
        }
        let allowed = store.remaining > 0;
        if allowed {
            store.remaining -= 1;
        }
        Budget {
            limit: self.config.rate_limit,
            remaining: store.remaining,
            reset_at: store.reset_at,
            allowed,
        }
    }
}

pub(crate) fn error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: code.to_string(),
        messages: vec![message.into()],
    };
    (status, Json(body)).into_response()
}

async fn gatekeeper(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let budget = state.spend().await;
    let authorized = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|token| !token.trim().is_empty());

    tracing::debug!(
        method = %request.method(),
        uri = %request.uri(),
        remaining = budget.remaining,
        "mock request"
    );

    let mut response = if !budget.allowed {
        error(
            StatusCode::TOO_MANY_REQUESTS,
            "too_many_requests",
            "API rate limit exceeded",
        )
    } else if !authorized {
        error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "X-DocBaseToken header is missing",
        )
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(budget.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(budget.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(budget.reset_at));
    response
}

pub fn app() -> Router {
    app_with_config(MockConfig::default())
}

pub fn app_with_config(config: MockConfig) -> Router {
    let state = AppState::new(config);
    Router::new()
        .route(
            "/teams/{team}/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/teams/{team}/posts/{id}",
            get(handlers::get_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/teams/{team}/posts/{id}/archive", put(handlers::archive_post))
        .route(
            "/teams/{team}/posts/{id}/unarchive",
            put(handlers::unarchive_post),
        )
        .route(
            "/teams/{team}/posts/{id}/comments",
            post(handlers::create_comment),
        )
        .route("/teams/{team}/comments/{id}", delete(handlers::delete_comment))
        .route(
            "/teams/{team}/groups",
            get(handlers::list_groups).post(handlers::create_group),
        )
        .route("/teams/{team}/groups/{id}", get(handlers::get_group))
        .route(
            "/teams/{team}/groups/{id}/users",
            post(handlers::add_group_users).delete(handlers::remove_group_users),
        )
        .route("/teams/{team}/tags", get(handlers::list_tags))
        .route("/teams/{team}/users", get(handlers::list_users))
        .route("/teams/{team}/attachments", post(handlers::upload_attachments))
        .route(
            "/teams/{team}/attachments/{id}",
            get(handlers::download_attachment),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn_with_state(state.clone(), gatekeeper))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_config(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_config(config)).await
}
