//! In-memory document store for development and testing

use crate::{
    ClientError, Result,
    api::{ByteStream, DocumentApi},
    types::*,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug)]
struct Entry {
    file: File,
    data: Bytes,
}

#[derive(Debug)]
struct Tree {
    entries: HashMap<String, Entry>,
    root_id: String,
}

/// A [`DocumentApi`] that keeps every entry in process memory.
///
/// The root folder lives at `/` in a default workspace. Further workspaces are
/// mounted as top-level folders carrying their own workspace ID. Tokens are
/// accepted without validation.
pub struct MemoryDocumentStore {
    tree: RwLock<Tree>,
    mutations: AtomicU64,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    /// Create a store holding only the root folder
    pub fn new() -> Self {
        let root = new_entry(FileType::Folder, &new_id(), None, "/", Bytes::new());
        let root_id = root.file.id.clone();

        let mut entries = HashMap::new();
        entries.insert(root_id.clone(), root);

        Self {
            tree: RwLock::new(Tree { entries, root_id }),
            mutations: AtomicU64::new(0),
        }
    }

    /// Workspace ID of the root folder
    pub fn root_workspace_id(&self) -> String {
        let tree = self.tree.read();
        tree.entries
            .get(&tree.root_id)
            .map(|e| e.file.workspace_id.clone())
            .unwrap_or_default()
    }

    /// Mount a new workspace as a top-level folder and return its workspace ID
    pub fn add_workspace(&self, name: &str) -> String {
        let mut tree = self.tree.write();
        let workspace_id = new_id();
        let root_id = tree.root_id.clone();
        let entry = new_entry(FileType::Folder, &workspace_id, Some(&root_id), name, Bytes::new());
        tree.entries.insert(entry.file.id.clone(), entry);
        workspace_id
    }

    /// Number of entries, the root folder included
    pub fn len(&self) -> usize {
        self.tree.read().entries.len()
    }

    /// Check if the store holds nothing but the root folder
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Number of mutating calls served so far
    pub fn mutations(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

impl Tree {
    fn get(&self, id: &str) -> Result<&Entry> {
        self.entries
            .get(id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    fn folder(&self, id: &str) -> Result<&Entry> {
        let entry = self.get(id)?;
        if !entry.file.is_folder() {
            return Err(bad_request(format!("{} is not a folder", id)));
        }
        Ok(entry)
    }

    fn child_ids(&self, id: &str) -> Vec<String> {
        let mut children: Vec<&Entry> = self
            .entries
            .values()
            .filter(|e| e.file.parent_id.as_deref() == Some(id))
            .collect();
        children.sort_by(|a, b| a.file.name.cmp(&b.file.name));
        children.into_iter().map(|e| e.file.id.clone()).collect()
    }

    fn find_child(&self, parent_id: &str, name: &str) -> Option<&Entry> {
        self.entries
            .values()
            .find(|e| e.file.parent_id.as_deref() == Some(parent_id) && e.file.name == name)
    }

    fn find_by_path(&self, path: &str) -> Option<&Entry> {
        let mut current = self.entries.get(&self.root_id)?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.find_child(&current.file.id, segment)?;
        }
        Some(current)
    }

    /// IDs of an entry and everything below it
    fn subtree(&self, id: &str) -> Vec<String> {
        let mut ids = vec![id.to_string()];
        let mut index = 0;
        while index < ids.len() {
            let children = self.child_ids(&ids[index]);
            ids.extend(children);
            index += 1;
        }
        ids
    }

    fn unique_name(&self, parent_id: &str, name: &str) -> String {
        if self.find_child(parent_id, name).is_none() {
            return name.to_string();
        }

        let (stem, extension) = match name.rfind('.') {
            Some(pos) if pos > 0 => name.split_at(pos),
            _ => (name, ""),
        };
        (1..)
            .map(|n| format!("{} ({}){}", stem, n, extension))
            .find(|candidate| self.find_child(parent_id, candidate).is_none())
            .unwrap_or_else(|| format!("{} ({})", name, new_id()))
    }

    fn clone_subtree(
        &mut self,
        source_id: &str,
        parent_id: &str,
        workspace_id: &str,
        name: String,
    ) -> Result<String> {
        let source = self.get(source_id)?.clone();
        let children = self.child_ids(source_id);

        let mut file = source.file;
        file.id = new_id();
        file.parent_id = Some(parent_id.to_string());
        file.workspace_id = workspace_id.to_string();
        file.name = name;
        file.create_time = now();
        file.update_time = None;

        let clone_id = file.id.clone();
        self.entries.insert(clone_id.clone(), Entry { file, data: source.data });

        for child_id in children {
            let child_name = self.get(&child_id)?.file.name.clone();
            self.clone_subtree(&child_id, &clone_id, workspace_id, child_name)?;
        }
        Ok(clone_id)
    }
}

#[async_trait]
impl DocumentApi for MemoryDocumentStore {
    async fn get_by_path(&self, _token: &str, path: &str) -> Result<File> {
        let tree = self.tree.read();
        tree.find_by_path(path)
            .map(|e| e.file.clone())
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }

    async fn list_by_path(&self, _token: &str, path: &str) -> Result<Vec<File>> {
        let tree = self.tree.read();
        let folder = tree
            .find_by_path(path)
            .ok_or_else(|| ClientError::NotFound(path.to_string()))?;
        if !folder.file.is_folder() {
            return Err(bad_request(format!("{} is not a folder", path)));
        }

        tree.child_ids(&folder.file.id)
            .iter()
            .map(|id| tree.get(id).map(|e| e.file.clone()))
            .collect()
    }

    async fn create_folder(&self, _token: &str, options: CreateFolderOptions) -> Result<File> {
        let mut tree = self.tree.write();
        tree.folder(&options.parent_id)?;

        let entry = new_entry(
            FileType::Folder,
            &options.workspace_id,
            Some(&options.parent_id),
            &options.name,
            Bytes::new(),
        );
        let file = entry.file.clone();
        tree.entries.insert(file.id.clone(), entry);
        self.record_mutation();
        Ok(file)
    }

    async fn create_file(&self, _token: &str, options: CreateFileOptions) -> Result<File> {
        let mut tree = self.tree.write();
        tree.folder(&options.parent_id)?;

        let entry = new_entry(
            FileType::File,
            &options.workspace_id,
            Some(&options.parent_id),
            &options.name,
            options.data,
        );
        let file = entry.file.clone();
        tree.entries.insert(file.id.clone(), entry);
        self.record_mutation();
        Ok(file)
    }

    async fn delete(&self, _token: &str, id: &str) -> Result<()> {
        let mut tree = self.tree.write();
        tree.get(id)?;
        if id == tree.root_id {
            return Err(bad_request("the root folder cannot be deleted".to_string()));
        }

        for removed in tree.subtree(id) {
            tree.entries.remove(&removed);
        }
        self.record_mutation();
        Ok(())
    }

    async fn copy(&self, _token: &str, id: &str, target_id: &str) -> Result<File> {
        let mut tree = self.tree.write();
        let name = tree.get(id)?.file.name.clone();
        let workspace_id = tree.folder(target_id)?.file.workspace_id.clone();
        if tree.subtree(id).iter().any(|d| d == target_id) {
            return Err(bad_request("cannot copy a folder into itself".to_string()));
        }

        let name = tree.unique_name(target_id, &name);
        let clone_id = tree.clone_subtree(id, target_id, &workspace_id, name)?;
        self.record_mutation();
        tree.get(&clone_id).map(|e| e.file.clone())
    }

    async fn rename(&self, _token: &str, id: &str, name: &str) -> Result<File> {
        let mut tree = self.tree.write();
        let entry = tree
            .entries
            .get_mut(id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?;

        entry.file.name = name.to_string();
        entry.file.update_time = Some(now());
        if let Some(original) = entry.file.snapshot.as_mut().and_then(|s| s.original.as_mut()) {
            original.extension = extension_of(name);
        }
        let file = entry.file.clone();
        self.record_mutation();
        Ok(file)
    }

    async fn move_to(&self, _token: &str, id: &str, target_id: &str) -> Result<()> {
        let mut tree = self.tree.write();
        tree.get(id)?;
        let workspace_id = tree.folder(target_id)?.file.workspace_id.clone();
        let subtree = tree.subtree(id);
        if subtree.iter().any(|d| d == target_id) {
            return Err(bad_request("cannot move a folder into itself".to_string()));
        }

        for moved in &subtree {
            if let Some(entry) = tree.entries.get_mut(moved) {
                entry.file.workspace_id = workspace_id.clone();
                if moved == id {
                    entry.file.parent_id = Some(target_id.to_string());
                    entry.file.update_time = Some(now());
                }
            }
        }
        self.record_mutation();
        Ok(())
    }

    async fn download_original(&self, _token: &str, file: &File) -> Result<ByteStream> {
        let data = {
            let tree = self.tree.read();
            let entry = tree.get(&file.id)?;
            if entry.file.is_folder() {
                return Err(bad_request(format!("{} is a folder", file.id)));
            }
            entry.data.clone()
        };

        Ok(futures::stream::once(async move { Ok(data) }).boxed())
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name[pos..].to_lowercase(),
        _ => String::new(),
    }
}

fn bad_request(message: String) -> ClientError {
    ClientError::Api {
        status: 400,
        code: "invalid_request".to_string(),
        message,
    }
}

fn new_entry(
    file_type: FileType,
    workspace_id: &str,
    parent_id: Option<&str>,
    name: &str,
    data: Bytes,
) -> Entry {
    let snapshot = (file_type == FileType::File).then(|| Snapshot {
        version: 1,
        original: Some(Download {
            extension: extension_of(name),
            size: data.len() as u64,
        }),
    });

    Entry {
        file: File {
            id: new_id(),
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
            file_type,
            parent_id: parent_id.map(str::to_string),
            permission: Some("owner".to_string()),
            is_shared: false,
            snapshot,
            create_time: now(),
            update_time: None,
        },
        data,
    }
}
