//! Open-file handle table.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::ids::InodeId;
use crate::node::TnodeId;

/// Opaque key into the handle table. `0` is reserved to mean "invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(pub u64);

impl Handle {
    pub const INVALID: Handle = Handle(0);

    pub fn is_valid(self) -> bool {
        self.0 >= MIN_HANDLE
    }
}

/// The lowest handle value ever handed out; values below it (including the
/// invalid sentinel) are reserved.
pub const MIN_HANDLE: u64 = 3;

/// Open mode requested at `open()` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMode(u8);

impl FileMode {
    pub const READ: FileMode = FileMode(0b0001);
    pub const WRITE: FileMode = FileMode(0b0010);
    pub const READ_WRITE: FileMode = FileMode(0b0011);
    pub const APPEND: FileMode = FileMode(0b0110);

    pub fn contains(self, other: FileMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_read_only(self) -> bool {
        self.0 & Self::WRITE.0 == 0
    }
}

/// Per-open state: the reference kernel's `fd`.
pub struct Descriptor {
    pub path: String,
    pub tnode: TnodeId,
    pub inode: InodeId,
    pub seek_pos: u64,
    pub mode: FileMode,
}

/// Maps handles to descriptors. All operations run under the global lock;
/// this type does no locking of its own.
pub struct HandleTable {
    next: u64,
    descriptors: BTreeMap<u64, Descriptor>,
}

impl HandleTable {
    pub fn new() -> Self {
        HandleTable { next: MIN_HANDLE, descriptors: BTreeMap::new() }
    }

    /// Allocates a fresh handle and inserts `descriptor` under it.
    pub fn insert(&mut self, descriptor: Descriptor) -> Handle {
        let handle = self.next;
        self.next += 1;
        self.descriptors.insert(handle, descriptor);
        Handle(handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&Descriptor> {
        self.descriptors.get(&handle.0)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Descriptor> {
        self.descriptors.get_mut(&handle.0)
    }

    pub fn remove(&mut self, handle: Handle) -> Option<Descriptor> {
        self.descriptors.remove(&handle.0)
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}
