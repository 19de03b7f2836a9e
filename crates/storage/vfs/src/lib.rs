//! Vesper kernel Virtual File System core.
//!
//! Presents a single `/`-rooted namespace and a uniform operation surface
//! (open, read, write, seek, close, directory traversal, chmod, ioctl,
//! mount, unlink, refresh, create) dispatched to concrete back-ends (an
//! on-disk filesystem, an in-memory filesystem, a TTY filesystem, a pipe
//! filesystem) through the [`Provider`] capability set. Concrete back-ends,
//! the log sink, the heap allocator, the scheduler, timers/RTC, and the
//! lock primitive are external collaborators, named here only by contract.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │           Kernel / user code          │
//! └──────────────────┬───────────────────┘
//!                    │ open/read/write/close/...
//! ┌──────────────────▼───────────────────┐
//! │               Vfs (one lock)          │
//! │  - tree of tnodes/inodes              │
//! │  - handle table                       │
//! │  - back-end registry                  │
//! └──────────────────┬───────────────────┘
//!                    │ Provider trait
//! ┌─────────┬────────┴────────┬──────────┐
//! │  RAMFS  │       FAT       │   ...    │
//! └─────────┴─────────────────┴──────────┘
//! ```

#![no_std]

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use spin::Mutex;

pub mod diagnostics;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod ids;
pub mod init;
pub mod mount;
pub mod node;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod time;

pub use dispatcher::SeekWhence;
pub use error::{VfsError, VfsResult};
pub use handle::{FileMode, Handle};
pub use ids::{DevId, InodeId};
pub use node::{Inode, NodeData, NodeType, Stat, Tnode, TnodeId};
pub use provider::{Dirent, NewNode, Provider};
pub use registry::Registry;
pub use resolver::ResolvePolicy;
pub use time::{BootClock, DateTime, Timespec};

/// Maximum path length accepted by the VFS.
pub const MAX_PATH: usize = vesper_path::MAX_PATH;
/// Maximum filename length accepted by the VFS.
pub const MAX_FILENAME: usize = vesper_path::MAX_FILENAME;
/// Lowest handle value ever handed out.
pub const MIN_HANDLE: u64 = handle::MIN_HANDLE;

/// All of the VFS's mutable state: the tree, the handle table, the
/// allocators, the registry, and the injected clock. Guarded as a unit by
/// [`Vfs`]'s single lock.
pub struct VfsState {
    inodes: BTreeMap<InodeId, Inode>,
    tnodes: BTreeMap<TnodeId, Tnode>,
    root: TnodeId,
    registry: Registry,
    handles: handle::HandleTable,
    dev_ids: ids::IdAllocator,
    ino_ids: ids::IdAllocator,
    next_tnode: u64,
    clock: Arc<dyn BootClock>,
    /// The reserved TTY handle captured during boot; `read` bypasses its
    /// size clamp.
    tty_handle: Option<Handle>,
}

impl VfsState {
    pub fn new(clock: Arc<dyn BootClock>, registry: Registry) -> Self {
        let mut inodes = BTreeMap::new();
        let mut tnodes = BTreeMap::new();
        let dev_ids = ids::IdAllocator::new();
        let ino_ids = ids::IdAllocator::new();

        let dev = DevId(dev_ids.next_id());
        let ino = InodeId(ino_ids.next_id());
        let now = Timespec::now(clock.as_ref());

        inodes.insert(ino, Inode::new(NodeType::Folder, 0o777));

        let root = TnodeId(0);
        tnodes.insert(
            root,
            Tnode { name: String::from("/"), inode: ino, stat: Stat::new(dev, ino, NodeType::Folder, 0o777, now), parent: root },
        );

        VfsState {
            inodes,
            tnodes,
            root,
            registry,
            handles: handle::HandleTable::new(),
            dev_ids,
            ino_ids,
            next_tnode: 1,
            clock,
            tty_handle: None,
        }
    }

    fn next_tnode_id(&mut self) -> TnodeId {
        let id = self.next_tnode;
        self.next_tnode += 1;
        TnodeId(id)
    }

    #[cfg(test)]
    pub fn new_for_test() -> Self {
        VfsState::new(Arc::new(time::TestClock::new(0)), Registry::new())
    }
}

/// The VFS, as a single lifecycle-managed object behind one coarse lock.
/// Everything reachable from the tree or the handle table is guarded by
/// this lock; provider calls made while it's held are assumed bounded and
/// non-blocking.
pub struct Vfs {
    inner: Mutex<VfsState>,
}

impl Vfs {
    /// Constructs an empty VFS (just the root folder) without mounting
    /// anything. Most callers want [`Vfs::boot`] instead.
    pub fn new(clock: Arc<dyn BootClock>, registry: Registry) -> Self {
        Vfs { inner: Mutex::new(VfsState::new(clock, registry)) }
    }

    /// Runs the standard boot sequence: mounts an in-memory root, creates
    /// `/disk` and `/dev`, mounts the TTY and pipe back-ends. Panics if a
    /// required provider (`ramfs`, `ttyfs`, `pipefs`) is missing from
    /// `registry` — the one place this crate raises `Fatal` as a panic
    /// rather than a `Result`.
    pub fn boot(clock: Arc<dyn BootClock>, registry: Registry) -> Self {
        log::info!("vfs: boot sequence starting");
        let vfs = Self::new(clock, registry);
        vfs.inner.lock().boot().expect("vfs: required provider missing during boot");
        log::info!("vfs: boot sequence complete");
        vfs
    }

    pub fn create(&self, path: &str, node_type: NodeType) -> VfsResult<()> {
        self.inner.lock().create(path, node_type)
    }

    pub fn mount(&self, device: &str, path: &str, fsname: &str) -> VfsResult<()> {
        self.inner.lock().mount(device, path, fsname)
    }

    pub fn open(&self, path: &str, mode: FileMode) -> VfsResult<Handle> {
        self.inner.lock().open(path, mode)
    }

    pub fn close(&self, handle: Handle) -> VfsResult<()> {
        self.inner.lock().close(handle)
    }

    pub fn read(&self, handle: Handle, buf: &mut [u8]) -> VfsResult<usize> {
        self.inner.lock().read(handle, buf)
    }

    pub fn write(&self, handle: Handle, buf: &[u8]) -> VfsResult<usize> {
        self.inner.lock().write(handle, buf)
    }

    pub fn seek(&self, handle: Handle, pos: i64, whence: SeekWhence) -> VfsResult<u64> {
        self.inner.lock().seek(handle, pos, whence)
    }

    pub fn tell(&self, handle: Handle) -> u64 {
        self.inner.lock().tell(handle)
    }

    pub fn getdent(&self, handle: Handle) -> VfsResult<Option<Dirent>> {
        self.inner.lock().getdent(handle)
    }

    pub fn refresh(&self, handle: Handle) -> VfsResult<()> {
        self.inner.lock().refresh(handle)
    }

    pub fn unlink(&self, path: &str) -> VfsResult<()> {
        self.inner.lock().unlink(path)
    }

    pub fn chmod(&self, handle: Handle, perms: u32) -> VfsResult<()> {
        self.inner.lock().chmod(handle, perms)
    }

    pub fn ioctl(&self, handle: Handle, request: i64, arg: i64) -> VfsResult<i64> {
        self.inner.lock().ioctl(handle, request, arg)
    }

    /// Read-only tree dump for diagnostics.
    pub fn dump(&self) -> String {
        self.inner.lock().dump()
    }
}

/// Process-wide VFS handle for callers that can't thread a `&Vfs` through,
/// mirroring the teacher's global-`Option`-behind-a-lock pattern.
static GLOBAL: Mutex<Option<Vfs>> = Mutex::new(None);

/// Installs `vfs` as the process-wide instance.
pub fn init_global(vfs: Vfs) {
    *GLOBAL.lock() = Some(vfs);
}

/// Runs `f` against the process-wide instance. Fails with [`VfsError::Fatal`]
/// if [`init_global`] hasn't run yet.
pub fn with_global<R>(f: impl FnOnce(&Vfs) -> R) -> VfsResult<R> {
    let guard = GLOBAL.lock();
    match guard.as_ref() {
        Some(vfs) => Ok(f(vfs)),
        None => Err(VfsError::Fatal),
    }
}
