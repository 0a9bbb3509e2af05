//! # DocDav Client
//!
//! Typed client for the document API (v2) and its identity service.
//!
//! ## Features
//!
//! - **Document API**: path lookup, listing, folder and file creation, delete,
//!   copy, rename, move and streamed downloads
//! - **Token exchange**: password and refresh-token grants against the identity service
//! - **In-memory store**: a [`MemoryDocumentStore`] implementing the same
//!   [`DocumentApi`] trait for development and tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use docdav_client::{Config, DocumentApi, DocumentClient, IdpClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::new("https://api.example.com", "https://id.example.com");
//!     let token = IdpClient::new(config.clone())?
//!         .exchange_password("alice", "secret")
//!         .await?;
//!
//!     let client = DocumentClient::new(config)?;
//!     for file in client.list_by_path(&token.access_token, "/").await? {
//!         println!("{} ({:?})", file.name, file.file_type);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod api;
mod client;
mod config;
mod error;
mod idp;
mod memory;
mod types;

pub use api::{ByteStream, DocumentApi};
pub use client::DocumentClient;
pub use config::Config;
pub use error::{ClientError, Result};
pub use idp::IdpClient;
pub use memory::MemoryDocumentStore;
pub use types::*;
