//! Back-end registry: a named list of providers, looked up by name.
//!
//! Registration happens only during init; lookup never takes the VFS lock,
//! matching the reference design's separation of "who can provide a
//! filesystem" from "what the tree currently looks like".

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::error::{VfsError, VfsResult};
use crate::provider::Provider;

pub struct Registry {
    providers: Vec<Arc<dyn Provider>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { providers: Vec::new() }
    }

    /// Appends a provider. Later registrations under a name already present
    /// are reachable but never matched, since lookup returns the first hit.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.push(provider);
    }

    /// Returns the first provider whose name matches `name`, compared over
    /// at most `MAX_FILENAME` bytes of each side.
    pub fn lookup(&self, name: &str) -> VfsResult<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| names_match(p.name(), name))
            .cloned()
            .ok_or(VfsError::ProviderUnknown)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded-length name equality, mirroring a fixed-buffer `strncmp` against
/// two `char[MAX_FILENAME]`-sized C strings: this is a full compare within
/// the bound, not a substring/prefix test, so registering `"ramfs"` never
/// matches a lookup of `"ramfs2"`.
fn names_match(provider_name: &str, requested: &str) -> bool {
    let bound = crate::MAX_FILENAME;
    let a = &provider_name.as_bytes()[..provider_name.len().min(bound)];
    let b = &requested.as_bytes()[..requested.len().min(bound)];
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;
    use crate::provider::NewNode;
    use crate::time::DateTime;

    struct Stub(&'static str);

    impl Provider for Stub {
        fn name(&self) -> &str {
            self.0
        }

        fn mount(&self, _device: Option<&crate::node::NodeData>) -> VfsResult<NewNode> {
            Ok(NewNode {
                node_type: NodeType::Folder,
                perms: 0o755,
                size: 0,
                mtime: DateTime::default(),
                data: None,
            })
        }

        fn open(&self, _dir: Option<&crate::node::NodeData>, _path: &str) -> VfsResult<Option<NewNode>> {
            Ok(None)
        }

        fn read(&self, _data: &mut Option<crate::node::NodeData>, _offset: u64, _buf: &mut [u8]) -> VfsResult<usize> {
            Ok(0)
        }

        fn write(&self, _data: &mut Option<crate::node::NodeData>, _offset: u64, _buf: &[u8]) -> VfsResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn lookup_finds_registered_provider_by_name() {
        let mut reg = Registry::new();
        reg.register(Arc::new(Stub("ramfs")));
        reg.register(Arc::new(Stub("ttyfs")));

        assert_eq!(reg.lookup("ramfs").unwrap().name(), "ramfs");
        assert_eq!(reg.lookup("ttyfs").unwrap().name(), "ttyfs");
    }

    #[test]
    fn lookup_fails_for_unregistered_name() {
        let reg = Registry::new();
        assert!(matches!(reg.lookup("fat32"), Err(VfsError::ProviderUnknown)));
    }
}
