//! Read-only tree introspection, grounded in the reference kernel's
//! `vfs_debug()`. Not a back-end, not policy — purely for operator
//! visibility.

use alloc::format;
use alloc::string::String;

use crate::node::TnodeId;
use crate::VfsState;

impl VfsState {
    /// Recursively renders the tree starting at the root, one line per
    /// tnode, indented by depth, annotated with the owning inode's
    /// refcount.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, tnode_id: TnodeId, depth: usize, out: &mut String) {
        let Some(tnode) = self.tnodes.get(&tnode_id) else { return };
        let Some(inode) = self.inodes.get(&tnode.inode) else { return };

        let name = if tnode_id == self.root { "/" } else { tnode.name.as_str() };
        out.push_str(&format!(
            "{:indent$}{} [ino={} refcount={} type={:?}]\n",
            "",
            name,
            tnode.inode.0,
            inode.refcount,
            inode.node_type,
            indent = depth * 2
        ));

        for &child in &inode.children {
            self.dump_node(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::node::NodeType;
    use crate::resolver::ResolvePolicy;
    use crate::VfsState;

    #[test]
    fn dump_includes_created_children() {
        let mut state = VfsState::new_for_test();
        state
            .resolve("/dev", ResolvePolicy::Create { node_type: NodeType::Folder, err_on_exist: false })
            .unwrap();

        let rendered = state.dump();
        assert!(rendered.contains('/'));
        assert!(rendered.contains("dev"));
    }
}
