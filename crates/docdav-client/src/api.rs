//! The document API abstraction shared by the HTTP client and the in-memory store

use crate::{
    Result,
    types::{CreateFileOptions, CreateFolderOptions, File},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Streamed file content
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Operations the gateway needs from the document API.
///
/// Every call takes the caller's bearer token. A missing resource is reported
/// as [`crate::ClientError::NotFound`], every other failure with the remaining
/// variants.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Look up the entry at a slash-delimited path
    async fn get_by_path(&self, token: &str, path: &str) -> Result<File>;

    /// List the immediate children of the folder at a path
    async fn list_by_path(&self, token: &str, path: &str) -> Result<Vec<File>>;

    /// Create a folder under a parent folder
    async fn create_folder(&self, token: &str, options: CreateFolderOptions) -> Result<File>;

    /// Upload a new file under a parent folder
    async fn create_file(&self, token: &str, options: CreateFileOptions) -> Result<File>;

    /// Delete an entry (folders recursively)
    async fn delete(&self, token: &str, id: &str) -> Result<()>;

    /// Clone an entry into a target folder, returning the clone
    async fn copy(&self, token: &str, id: &str, target_id: &str) -> Result<File>;

    /// Rename an entry in place
    async fn rename(&self, token: &str, id: &str, name: &str) -> Result<File>;

    /// Move an entry into a target folder
    async fn move_to(&self, token: &str, id: &str, target_id: &str) -> Result<()>;

    /// Stream the original content of a file
    async fn download_original(&self, token: &str, file: &File) -> Result<ByteStream>;
}
