//! # DocDav Gateway
//!
//! WebDAV gateway for a workspace-scoped, ID-addressed document API.
//!
//! This crate provides:
//! - **WebDAV**: OPTIONS, GET, HEAD, PUT, DELETE, MKCOL, COPY, MOVE and PROPFIND
//! - **Authentication**: Basic credentials exchanged for bearer tokens, with a bounded token cache
//! - **Rate Limiting**: Per-user request throttling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  WebDAV Clients                     │
//! │        (Finder, Explorer, davfs2, cadaver)          │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                  DocDav Gateway                     │
//! ├─────────────────────────────────────────────────────┤
//! │  Basic Auth + Token Cache │ Rate Limiter │ Dispatch │
//! ├─────────────────────────────────────────────────────┤
//! │      Method Handlers │ Path Resolver │ Multistatus  │
//! ├─────────────────────────────────────────────────────┤
//! │                  docdav-client                      │
//! │     (document API, identity service, memory store)  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod path;
pub mod resolver;
pub mod routes;
pub mod server;
pub mod state;
pub mod token_cache;
pub mod xml;

pub use config::GatewayConfig;
pub use error::{DavError, ErrorKind};
pub use server::run_server_with_shutdown;
pub use state::AppState;
