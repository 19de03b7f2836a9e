//! The back-end contract: a capability set, dispatched by value of the
//! inode's provider reference rather than by inheritance.
//!
//! Four methods are required (`mount`, `open`, `read`, `write`); the
//! remaining five carry default bodies that report "optional capability
//! absent", mirroring the teacher's `Filesystem` trait default-bodied
//! "compatibility" methods.

use alloc::string::String;

use crate::error::{VfsError, VfsResult};
use crate::node::{NodeData, NodeType};
use crate::time::DateTime;

/// Description of a freshly materialized inode, returned by `mount` and
/// `open`. The VFS core allocates the actual `Inode`/`Tnode` from this; the
/// provider never touches the tree directly.
pub struct NewNode {
    pub node_type: NodeType,
    pub perms: u32,
    pub size: u64,
    pub mtime: DateTime,
    pub data: Option<NodeData>,
}

/// One entry as reported by `getdent`.
pub struct Dirent {
    pub name: String,
    pub node_type: NodeType,
    pub size: u64,
    pub mtime: DateTime,
}

/// A filesystem back-end's capability record.
///
/// Mutating methods receive `&mut Option<NodeData>` rather than
/// `Option<&mut NodeData>` — an inode created through plain path resolution
/// (as opposed to `mount`/`open`) starts with no opaque data at all, and a
/// back-end needs to be able to lazily install its own on first write.
pub trait Provider: Send + Sync {
    /// Provider name, matched by the registry under a bounded-length prefix
    /// compare.
    fn name(&self) -> &str;

    /// "Is temporary" — no backing block device required at mount time.
    fn is_temporary(&self) -> bool {
        false
    }

    /// Returns the root of a newly mounted instance. `device` is the opaque
    /// data of the backing block device's inode, when this provider isn't
    /// temporary.
    fn mount(&self, device: Option<&NodeData>) -> VfsResult<NewNode>;

    /// Lazily materializes `path` as a child reachable from `dir`'s opaque
    /// data. Returns `Ok(None)` when the back-end has nothing to contribute
    /// at that path — including the common case of per-open setup on an
    /// already-resolved node, where a provider typically just confirms its
    /// state is current without producing a replacement node.
    fn open(&self, dir: Option<&NodeData>, path: &str) -> VfsResult<Option<NewNode>>;

    /// Copies bytes into `buf`, starting at `offset`.
    fn read(&self, data: &mut Option<NodeData>, offset: u64, buf: &mut [u8]) -> VfsResult<usize>;

    /// Copies bytes from `buf`, starting at `offset`.
    fn write(&self, data: &mut Option<NodeData>, offset: u64, buf: &[u8]) -> VfsResult<usize>;

    /// Flushes metadata (size, perms) to the backing store.
    fn sync(&self, _data: &mut Option<NodeData>) -> VfsResult<()> {
        Ok(())
    }

    /// Repopulates the back-end's child view.
    fn refresh(&self, _data: &mut Option<NodeData>) -> VfsResult<()> {
        Ok(())
    }

    /// Enumerates back-end children by index. `None` signals end of stream.
    fn getdent(&self, _data: Option<&NodeData>, _index: usize) -> Option<Dirent> {
        None
    }

    /// Removes the backing object for a detached tnode.
    fn rmnode(&self, _data: &mut Option<NodeData>) -> VfsResult<()> {
        Ok(())
    }

    /// Back-end-specific control operation.
    fn ioctl(&self, _data: &mut Option<NodeData>, _request: i64, _arg: i64) -> VfsResult<i64> {
        Err(VfsError::BackendFailure)
    }
}
