//! Path resolution: walks `/`-separated paths against the tree, creating or
//! failing intermediate components according to policy.

use alloc::string::String;

use crate::error::{VfsError, VfsResult};
use crate::ids::InodeId;
use crate::node::{Inode, NodeType, Stat, Tnode, TnodeId};
use crate::time::Timespec;
use crate::VfsState;

/// Resolution policy for a single path.
#[derive(Debug, Clone, Copy)]
pub enum ResolvePolicy {
    /// Fail at the first missing component.
    NoCreate,
    /// Create missing components. Intermediates are always folders; the
    /// final component takes `node_type`. `err_on_exist` additionally fails
    /// when the final component already names something.
    Create { node_type: NodeType, err_on_exist: bool },
}

impl VfsState {
    /// Resolves `path` to the tnode naming its final component.
    pub fn resolve(&mut self, path: &str, policy: ResolvePolicy) -> VfsResult<TnodeId> {
        let components = vesper_path::components(path);
        let mut current = self.root;

        if components.is_empty() {
            return Ok(current);
        }

        let last = components.len() - 1;
        for (i, name) in components.iter().enumerate() {
            let is_final = i == last;
            match self.child_named(current, name) {
                Some(child) => {
                    if is_final {
                        if let ResolvePolicy::Create { err_on_exist: true, .. } = policy {
                            return Err(VfsError::AlreadyExists);
                        }
                    }
                    current = child;
                }
                None => match policy {
                    ResolvePolicy::NoCreate => return Err(VfsError::NotFound),
                    ResolvePolicy::Create { node_type, .. } => {
                        let child_type = if is_final { node_type } else { NodeType::Folder };
                        current = self.create_child(current, name, child_type)?;
                    }
                },
            }
        }

        Ok(current)
    }

    /// Mirrors `get_parent_dir`: the parent path and basename of `path`. If
    /// `path` has no parent, the parent is `/`.
    pub fn get_parent_dir(&self, path: &str) -> (String, String) {
        vesper_path::parent_and_basename(path)
    }

    fn child_named(&self, parent: TnodeId, name: &str) -> Option<TnodeId> {
        let parent_tnode = self.tnodes.get(&parent)?;
        let parent_inode = self.inodes.get(&parent_tnode.inode)?;
        for &child_id in &parent_inode.children {
            if let Some(child) = self.tnodes.get(&child_id) {
                if child.name == name {
                    return Some(child_id);
                }
            }
        }
        None
    }

    fn create_child(&mut self, parent: TnodeId, name: &str, node_type: NodeType) -> VfsResult<TnodeId> {
        if !vesper_path::is_valid_name(name) {
            return Err(VfsError::NotFound);
        }

        // Validate the parent before allocating or inserting anything: a
        // rejected creation must leave no orphaned inode/tnode behind.
        let parent_inode_id = self.tnodes.get(&parent).ok_or(VfsError::NotFound)?.inode;
        let (parent_traversable, parent_provider) = {
            let parent_inode = self.inodes.get(&parent_inode_id).ok_or(VfsError::NotFound)?;
            (parent_inode.node_type.is_traversable(), parent_inode.provider.clone())
        };
        if !parent_traversable {
            return Err(VfsError::WrongType);
        }

        let dev = crate::ids::DevId(self.dev_ids.next_id());
        let ino = InodeId(self.ino_ids.next_id());
        let now = Timespec::now(self.clock.as_ref());

        // A newly created node dispatches through the same back-end as its
        // parent: the provider pointer is copied down the tree at creation
        // time rather than resolved by walking up on every operation.
        let mut inode = Inode::new(node_type, 0o755);
        inode.provider = parent_provider;
        self.inodes.insert(ino, inode);

        let tnode_id = self.next_tnode_id();
        let tnode = Tnode {
            name: String::from(name),
            inode: ino,
            stat: Stat::new(dev, ino, node_type, 0o755, now),
            parent,
        };
        self.tnodes.insert(tnode_id, tnode);

        if let Some(parent_inode) = self.inodes.get_mut(&parent_inode_id) {
            parent_inode.children.push(tnode_id);
        }

        Ok(tnode_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VfsState;

    #[test]
    fn resolve_creates_intermediate_folders() {
        let mut state = VfsState::new_for_test();
        let tnode = state
            .resolve("/a/b/c", ResolvePolicy::Create { node_type: NodeType::File, err_on_exist: false })
            .unwrap();
        assert_eq!(state.tnodes.get(&tnode).unwrap().name, "c");

        let a = state.resolve("/a", ResolvePolicy::NoCreate).unwrap();
        assert_eq!(state.inodes.get(&state.tnodes.get(&a).unwrap().inode).unwrap().node_type, NodeType::Folder);
    }

    #[test]
    fn resolve_no_create_fails_on_miss() {
        let mut state = VfsState::new_for_test();
        assert_eq!(state.resolve("/missing", ResolvePolicy::NoCreate).unwrap_err(), VfsError::NotFound);
    }

    #[test]
    fn resolve_err_on_exist_fails_on_collision() {
        let mut state = VfsState::new_for_test();
        state
            .resolve("/x", ResolvePolicy::Create { node_type: NodeType::File, err_on_exist: false })
            .unwrap();
        let result = state.resolve("/x", ResolvePolicy::Create { node_type: NodeType::File, err_on_exist: true });
        assert_eq!(result.unwrap_err(), VfsError::AlreadyExists);
    }

    #[test]
    fn create_under_a_non_traversable_parent_leaves_no_orphaned_arena_entries() {
        let mut state = VfsState::new_for_test();
        state
            .resolve("/f", ResolvePolicy::Create { node_type: NodeType::File, err_on_exist: true })
            .unwrap();

        let before_tnodes = state.tnodes.len();
        let before_inodes = state.inodes.len();

        let result = state.resolve("/f/sub", ResolvePolicy::Create { node_type: NodeType::Folder, err_on_exist: false });
        assert_eq!(result.unwrap_err(), VfsError::WrongType);

        assert_eq!(state.tnodes.len(), before_tnodes);
        assert_eq!(state.inodes.len(), before_inodes);
    }
}
