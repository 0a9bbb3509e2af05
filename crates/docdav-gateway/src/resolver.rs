//! Resolution of protocol paths against the document API

use crate::{DavError, path::DavPath};
use chrono::{DateTime, Utc};
use docdav_client::{DocumentApi, File};

/// Kind of a resolved entity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    File,
    Folder,
}

/// What a path currently points to in the backend
#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub id: String,
    pub workspace_id: String,
    pub parent_id: Option<String>,
    pub kind: EntityKind,
    pub name: String,
    /// Set for files only
    pub size_bytes: Option<u64>,
    /// Set for files only, with the leading dot (empty when the name has none)
    pub extension: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// The backend record, needed for downloads
    pub file: File,
}

impl ResolvedEntity {
    pub fn from_file(file: File) -> Self {
        let (kind, size_bytes, extension) = if file.is_folder() {
            (EntityKind::Folder, None, None)
        } else {
            let original = file.original();
            let size = original.map(|o| o.size).unwrap_or(0);
            let extension = original
                .map(|o| o.extension.clone())
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| extension_of(&file.name));
            (EntityKind::File, Some(size), Some(extension))
        };

        Self {
            id: file.id.clone(),
            workspace_id: file.workspace_id.clone(),
            parent_id: file.parent_id.clone(),
            kind,
            name: file.name.clone(),
            size_bytes,
            extension,
            created_at: file.created_at(),
            updated_at: file.updated_at(),
            file,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntityKind::Folder
    }
}

fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name[pos..].to_string(),
        _ => String::new(),
    }
}

/// Resolves paths for one request, on behalf of one token
pub struct PathResolver<'a> {
    documents: &'a dyn DocumentApi,
    token: &'a str,
}

impl<'a> PathResolver<'a> {
    pub fn new(documents: &'a dyn DocumentApi, token: &'a str) -> Self {
        Self { documents, token }
    }

    /// Resolve a path; a missing entity is `NotFound`, other backend failures are upstream failures
    pub async fn resolve(&self, path: &DavPath) -> Result<ResolvedEntity, DavError> {
        let file = self.documents.get_by_path(self.token, &path.to_string()).await?;
        Ok(ResolvedEntity::from_file(file))
    }

    /// Resolve a path that may legitimately be missing
    pub async fn try_resolve(&self, path: &DavPath) -> Result<Option<ResolvedEntity>, DavError> {
        match self.documents.get_by_path(self.token, &path.to_string()).await {
            Ok(file) => Ok(Some(ResolvedEntity::from_file(file))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the folder containing a path
    pub async fn resolve_parent(&self, path: &DavPath) -> Result<ResolvedEntity, DavError> {
        self.resolve(&path.parent()).await
    }

    /// Immediate children of the folder at a path
    pub async fn children(&self, path: &DavPath) -> Result<Vec<ResolvedEntity>, DavError> {
        let files = self.documents.list_by_path(self.token, &path.to_string()).await?;
        Ok(files.into_iter().map(ResolvedEntity::from_file).collect())
    }
}
