//! Lazily populated node tree.
//!
//! Nodes live in an arena indexed by `NodeId`; directories own a map of
//! child names to ids. Each directory's children and population state sit
//! behind their own async mutex, held across the whole
//! check-fetch-populate sequence so a directory is fetched at most once.
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use gistfs_core::{Collection, Error, GistSource, Owner, RemoteFile, Result};
//! use gistfs_vfs::{NodeKind, VirtualFs};
//! use std::sync::Arc;
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl GistSource for Offline {
//!     async fn fetch_listing(&self, owner: &Owner) -> Result<Vec<Collection>> {
//!         Err(Error::ResourceNotFound { resource: owner.to_string() })
//!     }
//!     async fn fetch_content(&self, url: &str) -> Result<Vec<u8>> {
//!         Err(Error::ResourceNotFound { resource: url.to_string() })
//!     }
//! }
//!
//! # tokio_test();
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn tokio_test() {
//! let fs = VirtualFs::new(Arc::new(Offline));
//! let bob = fs.mkdir(fs.root(), "bob").await.unwrap();
//! assert_eq!(fs.kind(bob).unwrap(), NodeKind::Directory);
//! assert!(fs.list(bob).await.unwrap_err().is_not_found());
//! # }
//! ```

use crate::cache::ContentCache;
use crate::types::{Attributes, DirEntry, NodeId, NodeKind, Population, Result, VfsError};
use gistfs_core::{FsConfig, GistSource, Owner, RemoteFile};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Children and population state of one directory.
#[derive(Debug, Default)]
struct Directory {
    population: Population,
    children: HashMap<String, NodeId>,
}

#[derive(Debug)]
enum Payload {
    Directory(Mutex<Directory>),
    File(Option<RemoteFile>),
}

#[derive(Debug)]
struct Node {
    name: String,
    payload: Payload,
}

impl Node {
    fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Directory(Mutex::new(Directory::default())),
        }
    }

    fn file(name: impl Into<String>, remote: Option<RemoteFile>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::File(remote),
        }
    }

    const fn kind(&self) -> NodeKind {
        match self.payload {
            Payload::Directory(_) => NodeKind::Directory,
            Payload::File(_) => NodeKind::File,
        }
    }

    /// Directory state. Calling this on a file is a caller bug.
    fn dir_state(&self) -> &Mutex<Directory> {
        match &self.payload {
            Payload::Directory(state) => state,
            Payload::File(_) => panic!("directory operation on file node '{}'", self.name),
        }
    }
}

/// Rejects names that cannot be a single path segment.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
        return Err(VfsError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Virtual filesystem over a `GistSource`.
///
/// The root is never populated from the remote; its children come from
/// [`mkdir`](Self::mkdir). Any other directory is populated from the
/// listing of the owner it is named after, once, on its first
/// [`list`](Self::list) or [`lookup`](Self::lookup). Nodes are never
/// removed.
///
/// # Thread Safety
///
/// This type is `Send` and `Sync`. Remote content fetches run without any
/// tree lock held.
pub struct VirtualFs {
    nodes: RwLock<Vec<Arc<Node>>>,
    source: Arc<dyn GistSource>,
    cache: ContentCache,
    file_perm: u16,
    dir_perm: u16,
}

impl std::fmt::Debug for VirtualFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFs")
            .field("nodes", &self.node_count())
            .field("cache", &self.cache)
            .field("file_perm", &format_args!("{:#o}", self.file_perm))
            .field("dir_perm", &format_args!("{:#o}", self.dir_perm))
            .finish_non_exhaustive()
    }
}

impl VirtualFs {
    /// Creates a filesystem with default configuration.
    #[must_use]
    pub fn new(source: Arc<dyn GistSource>) -> Self {
        Self::with_config(source, &FsConfig::default())
    }

    /// Creates a filesystem using the cache capacity and permission bits
    /// from `config`.
    #[must_use]
    pub fn with_config(source: Arc<dyn GistSource>, config: &FsConfig) -> Self {
        Self {
            nodes: RwLock::new(vec![Arc::new(Node::directory(String::new()))]),
            source,
            cache: ContentCache::new(config.cache_capacity),
            file_perm: config.file_mode,
            dir_perm: config.dir_mode,
        }
    }

    /// The root directory.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The content cache.
    #[must_use]
    pub const fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Number of nodes ever created, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn node(&self, id: NodeId) -> Result<Arc<Node>> {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        id.index()
            .and_then(|index| nodes.get(index))
            .cloned()
            .ok_or_else(|| VfsError::NotFound {
                name: id.to_string(),
            })
    }

    fn alloc(&self, node: Node) -> NodeId {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        nodes.push(Arc::new(node));
        NodeId::from_index(nodes.len() - 1)
    }

    /// Returns the kind of `id`.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` for an unknown id.
    pub fn kind(&self, id: NodeId) -> Result<NodeKind> {
        Ok(self.node(id)?.kind())
    }

    /// Returns `true` if `id` is a directory; `false` for files and unknown
    /// ids.
    #[must_use]
    pub fn is_dir(&self, id: NodeId) -> bool {
        self.kind(id).is_ok_and(NodeKind::is_dir)
    }

    /// Returns the name of `id` (empty for the root).
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` for an unknown id.
    pub fn name(&self, id: NodeId) -> Result<String> {
        Ok(self.node(id)?.name.clone())
    }

    /// Population state of a directory; `None` for files and unknown ids.
    pub async fn population(&self, id: NodeId) -> Option<Population> {
        let node = self.node(id).ok()?;
        match &node.payload {
            Payload::Directory(state) => Some(state.lock().await.population),
            Payload::File(_) => None,
        }
    }

    /// Lists a directory, populating it from the remote listing first if
    /// this is its first successful listing.
    ///
    /// Entries are sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` if the id is unknown or the remote
    /// listing fails. A failed listing leaves the directory unpopulated so
    /// the next call retries.
    ///
    /// # Panics
    ///
    /// Panics if `dir` is a file.
    pub async fn list(&self, dir: NodeId) -> Result<Vec<DirEntry>> {
        let node = self.node(dir)?;
        let mut state = node.dir_state().lock().await;
        self.populate(&node, &mut state).await?;

        let mut entries: Vec<DirEntry> = state
            .children
            .iter()
            .map(|(name, &id)| DirEntry {
                name: name.clone(),
                id,
                is_dir: self.is_dir(id),
            })
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Resolves `name` under `parent`.
    ///
    /// A miss on an unpopulated directory populates it first, so a path can
    /// be resolved without listing its directory beforehand.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` if there is no such child or the
    /// population it required failed.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is a file.
    pub async fn lookup(&self, parent: NodeId, name: &str) -> Result<NodeId> {
        let node = self.node(parent)?;
        let mut state = node.dir_state().lock().await;
        if let Some(&id) = state.children.get(name) {
            return Ok(id);
        }

        self.populate(&node, &mut state).await?;
        state
            .children
            .get(name)
            .copied()
            .ok_or_else(|| VfsError::NotFound {
                name: name.to_string(),
            })
    }

    /// Enumerates the current children of `dir` without populating it.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` for an unknown id.
    ///
    /// # Panics
    ///
    /// Panics if `dir` is a file.
    pub async fn children(&self, dir: NodeId) -> Result<Vec<(String, NodeId)>> {
        let node = self.node(dir)?;
        let state = node.dir_state().lock().await;
        let mut children: Vec<_> = state
            .children
            .iter()
            .map(|(name, &id)| (name.clone(), id))
            .collect();
        children.sort();
        Ok(children)
    }

    /// Creates a directory named `name` under `parent`.
    ///
    /// Nothing is fetched; the new directory is populated on its first
    /// listing, using `name` as the remote owner. An existing child with
    /// the same name is shadowed, not merged.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::InvalidName` if `name` is not a single path
    /// segment, `VfsError::NotFound` if `parent` is unknown.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is a file.
    pub async fn mkdir(&self, parent: NodeId, name: &str) -> Result<NodeId> {
        let id = self.new_child(parent, name, true).await?;
        info!("created directory '{name}' as {id}");
        Ok(id)
    }

    /// Attaches a new child to `parent`: an unpopulated directory when
    /// `is_dir`, otherwise a file with no remote descriptor.
    ///
    /// # Errors
    ///
    /// Same as [`mkdir`](Self::mkdir).
    ///
    /// # Panics
    ///
    /// Panics if `parent` is a file.
    pub async fn new_child(&self, parent: NodeId, name: &str, is_dir: bool) -> Result<NodeId> {
        validate_name(name)?;
        let node = self.node(parent)?;
        let mut state = node.dir_state().lock().await;

        let child = if is_dir {
            Node::directory(name)
        } else {
            Node::file(name, None)
        };
        let id = self.alloc(child);
        if let Some(previous) = state.children.insert(name.to_string(), id) {
            debug!("'{name}' under {parent}: {id} shadows {previous}");
        }
        Ok(id)
    }

    /// Synthesizes the attributes of `id`.
    ///
    /// A file reports the size declared by the listing, which may differ
    /// from the length of the content actually served.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::BadFileState` for a file with no remote
    /// descriptor, `VfsError::NotFound` for an unknown id.
    pub fn attributes(&self, id: NodeId) -> Result<Attributes> {
        let node = self.node(id)?;
        match &node.payload {
            Payload::Directory(_) => Ok(Attributes {
                kind: NodeKind::Directory,
                perm: self.dir_perm,
                size: 0,
            }),
            Payload::File(Some(remote)) => Ok(Attributes {
                kind: NodeKind::File,
                perm: self.file_perm,
                size: remote.size,
            }),
            Payload::File(None) => Err(VfsError::BadFileState {
                name: node.name.clone(),
            }),
        }
    }

    /// Returns the content of file `id`, fetching it unless cached.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::NotFound` if the file has no descriptor or the
    /// fetch fails.
    ///
    /// # Panics
    ///
    /// Panics if `id` is a directory.
    pub async fn open(&self, id: NodeId) -> Result<Arc<[u8]>> {
        let node = self.node(id)?;
        let remote = match &node.payload {
            Payload::File(Some(remote)) => remote,
            Payload::File(None) => {
                return Err(VfsError::NotFound {
                    name: node.name.clone(),
                });
            }
            Payload::Directory(_) => panic!("open on directory node '{}'", node.name),
        };

        if let Some(content) = self.cache.get(id) {
            return Ok(content);
        }

        let bytes = self
            .source
            .fetch_content(&remote.url)
            .await
            .map_err(|err| {
                warn!("fetching '{}' from {} failed: {err}", node.name, remote.url);
                VfsError::NotFound {
                    name: node.name.clone(),
                }
            })?;

        if bytes.len() as u64 != remote.size {
            debug!(
                "'{}' declared {} bytes, served {}",
                node.name,
                remote.size,
                bytes.len()
            );
        }

        let content: Arc<[u8]> = Arc::from(bytes);
        self.cache.insert(id, Arc::clone(&content));
        Ok(content)
    }

    /// Fills an unpopulated, non-root directory from its owner's listing.
    ///
    /// Files are combined across collections in listing order; a later
    /// collection declaring an already seen filename wins. Children that
    /// already exist under the directory are kept.
    async fn populate(&self, node: &Node, state: &mut Directory) -> Result<()> {
        if node.name.is_empty() || state.population == Population::Populated {
            return Ok(());
        }

        let owner = Owner::new(node.name.clone());
        debug!("populating '{owner}' from remote listing");
        let listing = self.source.fetch_listing(&owner).await.map_err(|err| {
            warn!("listing for '{owner}' failed: {err}");
            VfsError::NotFound {
                name: node.name.clone(),
            }
        })?;

        let mut combined: BTreeMap<String, (String, RemoteFile)> = BTreeMap::new();
        for collection in listing {
            for (filename, remote) in collection.files {
                if validate_name(&filename).is_err() {
                    warn!("'{owner}': skipping unusable filename {filename:?}");
                    continue;
                }
                if let Some((previous, _)) =
                    combined.insert(filename.clone(), (collection.id.clone(), remote))
                {
                    warn!(
                        "'{owner}': '{filename}' from collection {} shadows collection {previous}",
                        collection.id
                    );
                }
            }
        }

        let count = combined.len();
        for (filename, (_, remote)) in combined {
            match state.children.entry(filename) {
                Entry::Occupied(existing) => {
                    debug!("'{owner}': keeping existing entry '{}'", existing.key());
                }
                Entry::Vacant(slot) => {
                    let id = self.alloc(Node::file(slot.key().clone(), Some(remote)));
                    slot.insert(id);
                }
            }
        }

        state.population = Population::Populated;
        info!("populated '{owner}' with {count} files");
        Ok(())
    }
}
