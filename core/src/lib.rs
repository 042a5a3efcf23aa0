//! Blocking, typed client for the DocBase REST API.
//!
//! # Overview
//! [`Client`] builds authenticated JSON requests, checks the cached rate
//! limit before sending, executes requests over a pluggable [`Transport`],
//! and turns responses into typed values or a single [`Error`]. Resource
//! services (`client.posts()`, `client.groups()`, ...) are thin wrappers
//! that supply paths, queries and payloads.
//!
//! # Design
//! - One shared pipeline; resource services hold no state of their own.
//! - Each service implements a capability trait ([`PostApi`], [`TagApi`],
//!   ...) so callers can swap in a test double.
//! - The rate-limit snapshot lives behind a mutex inside the client and is
//!   replaced after every response.
//! - No retries, caching or pagination traversal: list calls return the
//!   server's `meta` on the [`Response`] and callers page manually.
//!
//! ```no_run
//! use docbase_core::{Client, PostApi, PostListOptions};
//!
//! let client = Client::new("kray", "token")?;
//! let (posts, response) = client.posts().list(&PostListOptions {
//!     q: Some("author:danny".to_string()),
//!     per_page: Some(20),
//!     ..PostListOptions::default()
//! })?;
//! println!("{} of {} posts", posts.len(), response.total());
//! # Ok::<(), docbase_core::Error>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod rate;
pub mod response;
pub mod services;
pub mod transport;
pub mod types;

pub use client::{check_response, Client, ClientBuilder};
pub use config::Config;
pub use error::{Error, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use rate::{Rate, RateLimitState};
pub use response::{Meta, Response};
pub use services::{
    AttachmentApi, Attachments, CommentApi, CommentCreateRequest, Comments, GroupApi,
    GroupCreateRequest, GroupListOptions, GroupUserApi, GroupUsers, GroupUsersRequest, Groups,
    PostApi, PostCreateRequest, PostListOptions, PostUpdateRequest, Posts, TagApi, Tags,
    UploadFile, UserApi, UserListOptions, Users,
};
pub use transport::{Transport, UreqTransport};
pub use types::{Attachment, Comment, Group, Post, Scope, SimpleGroup, SimpleUser, Tag, User};
