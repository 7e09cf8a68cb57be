//! FUSE adapter over `VirtualFs`.
//!
//! `fuser` invokes callbacks one at a time on its session thread. Every
//! callback that touches async state moves its reply into a task spawned on
//! the runtime and returns at once; the task answers the kernel when the
//! core resolves. A slow listing for one owner therefore never stalls
//! requests for the rest of the mount. `getattr` only reads the arena and
//! answers inline.
//!
//! Only the read side is implemented, plus `mkdir` for adding owners.
//! Every other operation falls back to the `fuser` default (`ENOSYS`).

use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, Request,
};
use gistfs_core::FsConfig;
use gistfs_vfs::{Attributes, DirEntry, NodeId, NodeKind, VirtualFs};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Block size reported in attributes.
const BLOCK_SIZE: u32 = 512;

/// Ownership reported for every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    /// User id
    pub uid: u32,
    /// Group id
    pub gid: u32,
}

/// Fixed part of every attribute reply.
#[derive(Debug, Clone, Copy)]
struct AttrTemplate {
    ttl: Duration,
    owner: Ownership,
    mounted_at: SystemTime,
}

impl AttrTemplate {
    fn file_attr(&self, id: NodeId, attrs: Attributes) -> FileAttr {
        let (kind, nlink) = match attrs.kind {
            NodeKind::Directory => (FileType::Directory, 2),
            NodeKind::File => (FileType::RegularFile, 1),
        };

        FileAttr {
            ino: id.get(),
            size: attrs.size,
            blocks: attrs.size.div_ceil(u64::from(BLOCK_SIZE)),
            atime: self.mounted_at,
            mtime: self.mounted_at,
            ctime: self.mounted_at,
            crtime: self.mounted_at,
            kind,
            perm: attrs.perm,
            nlink,
            uid: self.owner.uid,
            gid: self.owner.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }
}

/// Open file handles and the content snapshot each one reads from.
#[derive(Debug)]
struct FileHandles {
    files: Mutex<HashMap<u64, Arc<[u8]>>>,
    next: AtomicU64,
}

impl FileHandles {
    fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            next: AtomicU64::new(1),
        }
    }

    async fn insert(&self, content: Arc<[u8]>) -> u64 {
        let fh = self.next.fetch_add(1, Ordering::Relaxed);
        self.files.lock().await.insert(fh, content);
        fh
    }

    async fn get(&self, fh: u64) -> Result<Arc<[u8]>, libc::c_int> {
        self.files
            .lock()
            .await
            .get(&fh)
            .cloned()
            .ok_or(libc::EBADF)
    }

    async fn remove(&self, fh: u64) -> bool {
        self.files.lock().await.remove(&fh).is_some()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.files.lock().await.len()
    }
}

/// One `readdir` slot. `next` is the offset that resumes after it.
#[derive(Debug)]
struct DirSlot {
    ino: u64,
    next: i64,
    kind: FileType,
    name: String,
}

/// State shared between the session thread and spawned reply tasks.
#[derive(Debug)]
struct Shared {
    vfs: Arc<VirtualFs>,
    attrs: AttrTemplate,
    handles: FileHandles,
}

impl Shared {
    fn entry_for(&self, id: NodeId) -> Result<FileAttr, libc::c_int> {
        self.vfs
            .attributes(id)
            .map(|attrs| self.attrs.file_attr(id, attrs))
            .map_err(|e| e.errno())
    }

    async fn lookup(&self, parent: NodeId, name: &str) -> Result<FileAttr, libc::c_int> {
        expect_kind(&self.vfs, parent, NodeKind::Directory)?;
        let id = self
            .vfs
            .lookup(parent, name)
            .await
            .map_err(|e| e.errno())?;
        self.entry_for(id)
    }

    async fn mkdir(&self, parent: NodeId, name: &str) -> Result<FileAttr, libc::c_int> {
        expect_kind(&self.vfs, parent, NodeKind::Directory)?;
        let id = self.vfs.mkdir(parent, name).await.map_err(|e| e.errno())?;
        self.entry_for(id)
    }

    async fn readdir(&self, dir: NodeId, offset: i64) -> Result<Vec<DirSlot>, libc::c_int> {
        expect_kind(&self.vfs, dir, NodeKind::Directory)?;
        let entries = self.vfs.list(dir).await.map_err(|e| e.errno())?;
        Ok(page(dir_listing(dir, entries), offset))
    }

    async fn open(&self, id: NodeId, flags: i32) -> Result<u64, libc::c_int> {
        expect_kind(&self.vfs, id, NodeKind::File)?;
        check_open_flags(flags)?;

        let content = self.vfs.open(id).await.map_err(|e| e.errno())?;
        let len = content.len();
        let fh = self.handles.insert(content).await;
        debug!("Opened {id} as handle {fh} ({len} bytes)");
        Ok(fh)
    }

    async fn read(&self, fh: u64, offset: i64, size: u32) -> Result<Vec<u8>, libc::c_int> {
        let content = self.handles.get(fh).await?;
        Ok(slice_at(&content, offset, size).to_vec())
    }

    async fn release(&self, fh: u64) {
        if !self.handles.remove(fh).await {
            debug!("Release of unknown handle {fh}");
        }
    }
}

/// `fuser::Filesystem` implementation serving a `VirtualFs`.
#[derive(Debug)]
pub struct GistFs {
    runtime: Handle,
    shared: Arc<Shared>,
}

impl GistFs {
    /// Creates the adapter.
    ///
    /// `runtime` must belong to a multi-threaded runtime that outlives the
    /// mount. Replies are answered from its worker threads.
    #[must_use]
    pub fn new(vfs: Arc<VirtualFs>, runtime: Handle, config: &FsConfig, owner: Ownership) -> Self {
        let attrs = AttrTemplate {
            ttl: config.attr_ttl(),
            owner,
            mounted_at: SystemTime::now(),
        };

        Self {
            runtime,
            shared: Arc::new(Shared {
                vfs,
                attrs,
                handles: FileHandles::new(),
            }),
        }
    }

    /// Runs `task` on the runtime with the shared state.
    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(Arc<Shared>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task(Arc::clone(&self.shared)));
    }
}

impl Filesystem for GistFs {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), libc::c_int> {
        info!("Filesystem mounted");
        Ok(())
    }

    fn destroy(&mut self) {
        info!(
            "Filesystem unmounted ({} nodes, {} cached files)",
            self.shared.vfs.node_count(),
            self.shared.vfs.cache().len()
        );
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(name) = name.to_str().map(str::to_owned) else {
            reply.error(libc::ENOENT);
            return;
        };

        self.spawn(move |shared| async move {
            match shared.lookup(NodeId::new(parent), &name).await {
                Ok(attr) => reply.entry(&shared.attrs.ttl, &attr, 0),
                Err(errno) => reply.error(errno),
            }
        });
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        match self.shared.entry_for(NodeId::new(ino)) {
            Ok(attr) => reply.attr(&self.shared.attrs.ttl, &attr),
            Err(errno) => reply.error(errno),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        self.spawn(move |shared| async move {
            match shared.readdir(NodeId::new(ino), offset).await {
                Ok(slots) => {
                    for slot in slots {
                        if reply.add(slot.ino, slot.next, slot.kind, slot.name) {
                            break;
                        }
                    }
                    reply.ok();
                }
                Err(errno) => reply.error(errno),
            }
        });
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let Some(name) = name.to_str().map(str::to_owned) else {
            reply.error(libc::EINVAL);
            return;
        };

        self.spawn(move |shared| async move {
            match shared.mkdir(NodeId::new(parent), &name).await {
                Ok(attr) => reply.entry(&shared.attrs.ttl, &attr, 0),
                Err(errno) => reply.error(errno),
            }
        });
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        self.spawn(move |shared| async move {
            match shared.open(NodeId::new(ino), flags).await {
                Ok(fh) => reply.opened(fh, 0),
                Err(errno) => reply.error(errno),
            }
        });
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        self.spawn(move |shared| async move {
            match shared.read(fh, offset, size).await {
                Ok(data) => reply.data(&data),
                Err(errno) => reply.error(errno),
            }
        });
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        self.spawn(move |shared| async move {
            shared.release(fh).await;
            reply.ok();
        });
    }
}

/// Checks that `id` exists and has the expected kind.
fn expect_kind(vfs: &VirtualFs, id: NodeId, expected: NodeKind) -> Result<(), libc::c_int> {
    match vfs.kind(id) {
        Ok(kind) if kind == expected => Ok(()),
        Ok(NodeKind::File) => Err(libc::ENOTDIR),
        Ok(NodeKind::Directory) => Err(libc::EISDIR),
        Err(e) => Err(e.errno()),
    }
}

/// Files are read-only: any access mode other than `O_RDONLY` is refused.
const fn check_open_flags(flags: i32) -> Result<(), libc::c_int> {
    if flags & libc::O_ACCMODE == libc::O_RDONLY {
        Ok(())
    } else {
        Err(libc::EACCES)
    }
}

/// Directory stream for `dir`: `.` and `..` followed by the entries.
///
/// The kernel resolves `..` itself; the inode given for it is informational.
fn dir_listing(dir: NodeId, entries: Vec<DirEntry>) -> Vec<(u64, FileType, String)> {
    let dots = [
        (dir.get(), FileType::Directory, ".".to_string()),
        (NodeId::ROOT.get(), FileType::Directory, "..".to_string()),
    ];

    dots.into_iter()
        .chain(entries.into_iter().map(|entry| {
            let kind = if entry.is_dir {
                FileType::Directory
            } else {
                FileType::RegularFile
            };
            (entry.id.get(), kind, entry.name)
        }))
        .collect()
}

/// The slots of `listing` from `offset` on. A negative offset starts over.
fn page(listing: Vec<(u64, FileType, String)>, offset: i64) -> Vec<DirSlot> {
    let skip = usize::try_from(offset).unwrap_or(0);
    listing
        .into_iter()
        .enumerate()
        .skip(skip)
        .map(|(index, (ino, kind, name))| DirSlot {
            ino,
            next: i64::try_from(index + 1).unwrap_or(i64::MAX),
            kind,
            name,
        })
        .collect()
}

/// The part of `content` a read of `size` bytes at `offset` returns.
fn slice_at(content: &[u8], offset: i64, size: u32) -> &[u8] {
    let start = usize::try_from(offset).unwrap_or(0).min(content.len());
    let len = usize::try_from(size).unwrap_or(usize::MAX);
    let end = start.saturating_add(len).min(content.len());
    &content[start..end]
}
