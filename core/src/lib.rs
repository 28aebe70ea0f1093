//! Synchronous client for a hosted mailing-list management API.
//!
//! # Overview
//! Lists and their members live on the remote service; this crate only
//! builds authenticated requests and decodes the server's answers.
//!
//! # Design
//! - `ListsApi` is sans-IO: `build_*` produces an `HttpRequest`, `parse_*`
//!   consumes an `HttpResponse`.
//! - `Transport` is the I/O seam. `ReqwestTransport` (feature `blocking`,
//!   on by default) is the stock implementation.
//! - `ListsClient` glues the two together, one round trip per call.
//! - Create/update inputs are prototypes of optional fields; tri-state
//!   subscription flags are `Option<bool>`.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use api::{ListsApi, DEFAULT_LIMIT, DEFAULT_SKIP};
pub use client::ListsClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
#[cfg(feature = "blocking")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{
    AccessLevel, ListPage, ListPrototype, MailingList, Subscriber, SubscriberPrototype, Vars, ALL,
    SUBSCRIBED, UNSUBSCRIBED,
};
