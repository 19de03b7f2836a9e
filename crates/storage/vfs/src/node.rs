//! The tree model: tnodes and inodes, arena-allocated with stable IDs.
//!
//! The reference kernel links these through raw pointers (inode ↔
//! mount-point tnode, tnode → parent → children → back to tnode). Here the
//! arena holds the owning storage and every cross-reference is a plain
//! `TnodeId`/`InodeId` copy — non-owning by construction, since copying an ID
//! doesn't keep anything alive.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use crate::ids::{DevId, InodeId};
use crate::provider::Provider;
use crate::time::{DateTime, Timespec};
use alloc::sync::Arc;

/// A stable, arena-local identifier for a tnode. Unlike `InodeId`/`DevId`
/// this carries no meaning outside this crate's tree — it's an
/// implementation detail of how cyclic references are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TnodeId(pub u64);

/// The closed set of inode types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Folder,
    File,
    MountPoint,
    BlockDevice,
    CharDevice,
    Pipe,
    Symlink,
}

impl NodeType {
    /// Only folders and mount-points may carry children or answer `getdent`.
    pub fn is_traversable(self) -> bool {
        matches!(self, NodeType::Folder | NodeType::MountPoint)
    }
}

// S_IFMT family, kept as the reference mode bits even though this crate
// enforces no POSIX permission semantics beyond storing them.
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFBLK: u32 = 0o060000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFIFO: u32 = 0o010000;
pub const S_IFLNK: u32 = 0o120000;

pub const S_IRWXU: u32 = 0o700;
pub const S_IRWXG: u32 = 0o070;
pub const S_IRWXO: u32 = 0o007;

pub(crate) fn type_bits(node_type: NodeType) -> u32 {
    match node_type {
        NodeType::Folder | NodeType::MountPoint => S_IFDIR,
        NodeType::File => S_IFREG,
        NodeType::BlockDevice => S_IFBLK,
        NodeType::CharDevice => S_IFCHR,
        NodeType::Pipe => S_IFIFO,
        NodeType::Symlink => S_IFLNK,
    }
}

/// Unix-flavored stat record carried by a tnode.
#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub dev: DevId,
    pub ino: InodeId,
    pub mode: u32,
    pub nlink: u32,
    pub size: u64,
    pub atime: Timespec,
    pub mtime: Timespec,
    pub ctime: Timespec,
}

impl Stat {
    pub fn new(dev: DevId, ino: InodeId, node_type: NodeType, perms: u32, now: Timespec) -> Self {
        Stat {
            dev,
            ino,
            mode: type_bits(node_type) | (perms & (S_IRWXU | S_IRWXG | S_IRWXO)),
            nlink: 1,
            size: 0,
            atime: now,
            mtime: now,
            ctime: now,
        }
    }
}

/// Opaque back-end-private storage. The VFS core never inspects it; only
/// the provider that owns the inode downcasts it.
pub type NodeData = Box<dyn Any + Send + Sync>;

/// One per name in a directory.
pub struct Tnode {
    pub name: String,
    /// Owning reference, except that on mount the owned inode is swapped
    /// for the back-end's root — see invariant 2.
    pub inode: InodeId,
    pub stat: Stat,
    /// Non-owning. The root tnode is its own parent.
    pub parent: TnodeId,
}

/// One per file object.
pub struct Inode {
    pub node_type: NodeType,
    pub perms: u32,
    pub size: u64,
    pub mtime: DateTime,
    pub refcount: u32,
    pub provider: Option<Arc<dyn Provider>>,
    pub data: Option<NodeData>,
    /// Owning. Only meaningful when `node_type.is_traversable()`.
    pub children: Vec<TnodeId>,
    /// Non-owning back-reference, set when this inode is the root of a
    /// mounted back-end.
    pub mountpoint: Option<TnodeId>,
}

impl Inode {
    pub fn new(node_type: NodeType, perms: u32) -> Self {
        Inode {
            node_type,
            perms: perms & (S_IRWXU | S_IRWXG | S_IRWXO),
            size: 0,
            mtime: DateTime::default(),
            refcount: 0,
            provider: None,
            data: None,
            children: Vec::new(),
            mountpoint: None,
        }
    }
}
