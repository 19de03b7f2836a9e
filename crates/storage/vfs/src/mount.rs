//! Mount manager: replaces the inode at a mount point with a back-end root.

use crate::error::{VfsError, VfsResult};
use crate::ids::InodeId;
use crate::node::{type_bits, Inode, NodeType, S_IRWXG, S_IRWXO, S_IRWXU};
use crate::resolver::ResolvePolicy;
use crate::VfsState;

impl VfsState {
    pub fn mount(&mut self, device: &str, path: &str, fsname: &str) -> VfsResult<()> {
        let provider = self.registry.lookup(fsname)?;

        let device_inode_id = if provider.is_temporary() {
            None
        } else {
            let dev_tnode = self.resolve(device, ResolvePolicy::NoCreate)?;
            let dev_inode_id = self.tnodes.get(&dev_tnode).ok_or(VfsError::NotFound)?.inode;
            let dev_inode = self.inodes.get(&dev_inode_id).ok_or(VfsError::NotFound)?;
            if dev_inode.node_type != NodeType::BlockDevice {
                return Err(VfsError::WrongType);
            }
            Some(dev_inode_id)
        };

        let target_tnode = self.resolve(path, ResolvePolicy::NoCreate)?;
        let target_inode_id = self.tnodes.get(&target_tnode).ok_or(VfsError::NotFound)?.inode;
        {
            let target_inode = self.inodes.get(&target_inode_id).ok_or(VfsError::NotFound)?;
            if target_inode.node_type != NodeType::Folder || !target_inode.children.is_empty() {
                return Err(VfsError::WrongType);
            }
        }

        let new_node = {
            let device_data =
                device_inode_id.and_then(|id| self.inodes.get(&id)).and_then(|i| i.data.as_ref());
            provider.mount(device_data)?
        };

        // Free the placeholder inode at the mount point and replace it with
        // the back-end's root, as `vfs_mount` does.
        self.inodes.remove(&target_inode_id);

        let new_ino = InodeId(self.ino_ids.next_id());
        let mut inode = Inode::new(NodeType::MountPoint, new_node.perms);
        inode.size = new_node.size;
        inode.mtime = new_node.mtime;
        inode.provider = Some(provider);
        inode.mountpoint = Some(target_tnode);
        inode.data = new_node.data;
        self.inodes.insert(new_ino, inode);

        if let Some(tnode) = self.tnodes.get_mut(&target_tnode) {
            tnode.inode = new_ino;
            tnode.stat.ino = new_ino;
            let perms = new_node.perms & (S_IRWXU | S_IRWXG | S_IRWXO);
            tnode.stat.mode = type_bits(NodeType::MountPoint) | perms;
        }

        Ok(())
    }
}
