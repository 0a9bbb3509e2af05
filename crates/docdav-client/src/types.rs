//! Common types for the document API and identity service

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a document API entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Folder,
}

/// A file or folder as returned by the document API
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Resource ID
    pub id: String,
    /// Workspace the resource belongs to
    pub workspace_id: String,
    /// Display name
    pub name: String,
    /// File or folder
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// Parent folder ID (absent for workspace roots)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Caller's permission on the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    /// Whether the resource is shared
    #[serde(default)]
    pub is_shared: bool,
    /// Current snapshot (files only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    /// Creation time (RFC 3339)
    pub create_time: String,
    /// Last update time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl File {
    /// Check if this entry is a folder
    pub fn is_folder(&self) -> bool {
        self.file_type == FileType::Folder
    }

    /// The original download of the current snapshot, if any
    pub fn original(&self) -> Option<&Download> {
        self.snapshot.as_ref().and_then(|s| s.original.as_ref())
    }

    /// Parsed creation time
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.create_time)
    }

    /// Parsed update time
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.update_time.as_deref().and_then(parse_time)
    }
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// A versioned snapshot of a file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot version
    #[serde(default)]
    pub version: u32,
    /// Original content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Download>,
}

/// A downloadable rendition of a snapshot
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Download {
    /// Extension including the leading dot (e.g. ".txt")
    #[serde(default)]
    pub extension: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Token issued by the identity service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Options for creating a folder
#[derive(Clone, Debug)]
pub struct CreateFolderOptions {
    pub workspace_id: String,
    pub parent_id: String,
    pub name: String,
}

/// Options for uploading a new file
#[derive(Clone, Debug)]
pub struct CreateFileOptions {
    pub workspace_id: String,
    pub parent_id: String,
    pub name: String,
    pub data: Bytes,
}
