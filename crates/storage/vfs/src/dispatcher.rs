//! The operation dispatcher: `create`, `open`, `close`, `read`, `write`,
//! `seek`, `tell`, `getdent`, `refresh`, `unlink`, `chmod`, `ioctl`.
//!
//! Every method here runs under the caller's hold of the single VFS lock
//! (see [`crate::Vfs`]); none of them take or release a lock themselves.

use alloc::string::String;

use crate::error::{VfsError, VfsResult};
use crate::handle::{Descriptor, FileMode, Handle};
use crate::ids::{DevId, InodeId};
use crate::node::{Inode, NodeType, Stat, Tnode, TnodeId};
use crate::provider::Dirent;
use crate::resolver::ResolvePolicy;
use crate::time::Timespec;
use crate::VfsState;

/// Seek origin. Numeric values are preserved from the reference kernel for
/// wire compatibility; `End` is subtractive, not additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekWhence {
    Cur = 1,
    End = 2,
    Set = 3,
}

impl VfsState {
    /// `create(path, type)` — resolves with `CREATE | ERR_ON_EXIST`, which
    /// stamps the new tnode's timestamps as a side effect of
    /// [`VfsState::resolve`].
    pub fn create(&mut self, path: &str, node_type: NodeType) -> VfsResult<()> {
        self.resolve(path, ResolvePolicy::Create { node_type, err_on_exist: true })?;
        Ok(())
    }

    /// `open(path, mode)` — resolves the path, falling back to a lazy
    /// ancestor-provider materialization on miss; always gives an
    /// already-resolved provider-backed inode a chance to do per-open
    /// setup.
    pub fn open(&mut self, path: &str, mode: FileMode) -> VfsResult<Handle> {
        let resolved = match self.resolve(path, ResolvePolicy::NoCreate) {
            Ok(t) => t,
            Err(_) => self.lazy_open(path)?,
        };

        let inode_id = self.tnodes.get(&resolved).ok_or(VfsError::NotFound)?.inode;

        if let Some(provider) = self.inodes.get(&inode_id).and_then(|i| i.provider.clone()) {
            let dir_data = self.inodes.get(&inode_id).and_then(|i| i.data.as_ref());
            if let Some(new_node) = provider.open(dir_data, path)? {
                if let Some(inode) = self.inodes.get_mut(&inode_id) {
                    inode.size = new_node.size;
                    inode.mtime = new_node.mtime;
                    inode.data = new_node.data;
                }
            }
        }

        let size = {
            let inode = self.inodes.get_mut(&inode_id).ok_or(VfsError::NotFound)?;
            inode.refcount += 1;
            inode.size
        };
        if let Some(tnode) = self.tnodes.get_mut(&resolved) {
            tnode.stat.size = size;
        }

        let descriptor = Descriptor { path: String::from(path), tnode: resolved, inode: inode_id, seek_pos: 0, mode };
        Ok(self.handles.insert(descriptor))
    }

    /// Walks ancestors of `path` until one resolves, matching
    /// `vfs_get_parent_dir` called repeatedly in the reference `vfs_open`.
    /// Only single-level lazy materialization is attempted: if the nearest
    /// resolvable ancestor isn't `path`'s immediate parent, this fails
    /// rather than asking a provider to materialize several levels at once.
    fn lazy_open(&mut self, path: &str) -> VfsResult<TnodeId> {
        let (immediate_parent, basename) = self.get_parent_dir(path);

        let mut probe_parent = immediate_parent.clone();
        let ancestor = loop {
            match self.resolve(&probe_parent, ResolvePolicy::NoCreate) {
                Ok(t) => break t,
                Err(_) => probe_parent = self.get_parent_dir(&probe_parent).0,
            }
        };

        if probe_parent != immediate_parent {
            return Err(VfsError::NotFound);
        }

        // Validate the ancestor before allocating or inserting anything, and
        // before calling into the provider: a rejected materialization must
        // leave no orphaned inode/tnode behind.
        let ancestor_inode_id = self.tnodes.get(&ancestor).ok_or(VfsError::NotFound)?.inode;
        let (ancestor_traversable, provider) = {
            let ancestor_inode = self.inodes.get(&ancestor_inode_id).ok_or(VfsError::NotFound)?;
            (ancestor_inode.node_type.is_traversable(), ancestor_inode.provider.clone())
        };
        if !ancestor_traversable {
            return Err(VfsError::WrongType);
        }
        let provider = provider.ok_or(VfsError::NotFound)?;

        let dir_data = self.inodes.get(&ancestor_inode_id).and_then(|i| i.data.as_ref());
        let new_node = provider.open(dir_data, path)?.ok_or(VfsError::NotFound)?;

        let dev = DevId(self.dev_ids.next_id());
        let ino = InodeId(self.ino_ids.next_id());
        let now = Timespec::now(self.clock.as_ref());

        let mut inode = Inode::new(new_node.node_type, new_node.perms);
        inode.size = new_node.size;
        inode.mtime = new_node.mtime;
        inode.data = new_node.data;
        inode.provider = Some(provider);
        self.inodes.insert(ino, inode);

        let tnode_id = self.next_tnode_id();
        let tnode = Tnode {
            name: basename,
            inode: ino,
            stat: Stat::new(dev, ino, new_node.node_type, new_node.perms, now),
            parent: ancestor,
        };
        self.tnodes.insert(tnode_id, tnode);

        if let Some(ancestor_inode) = self.inodes.get_mut(&ancestor_inode_id) {
            ancestor_inode.children.push(tnode_id);
        }

        Ok(tnode_id)
    }

    /// `close(handle)` — reads refcount/nlink/provider before freeing the
    /// descriptor. The reference kernel frees the descriptor first and
    /// dereferences it afterward to decide whether to call `rmnode`; this
    /// is the fix the design notes call for.
    pub fn close(&mut self, handle: Handle) -> VfsResult<()> {
        let descriptor = self.handles.get(handle).ok_or(VfsError::BadHandle)?;
        let inode_id = descriptor.inode;
        let tnode_id = descriptor.tnode;

        let refcount_after = {
            let inode = self.inodes.get_mut(&inode_id).ok_or(VfsError::BadHandle)?;
            inode.refcount = inode.refcount.saturating_sub(1);
            inode.refcount
        };
        let nlink = self.tnodes.get(&tnode_id).map(|t| t.stat.nlink).unwrap_or(0);
        let provider = self.inodes.get(&inode_id).and_then(|i| i.provider.clone());

        self.handles.remove(handle);

        if refcount_after == 0 && nlink == 0 {
            if let Some(provider) = provider {
                if let Some(inode) = self.inodes.get_mut(&inode_id) {
                    provider.rmnode(&mut inode.data)?;
                }
            }
            self.detach(tnode_id, inode_id);
        }

        Ok(())
    }

    /// `read(handle, buf)` — clamps `len` to `size - seek_pos` unless this
    /// is the reserved TTY handle. Back-end failure degrades to `Ok(0)`.
    pub fn read(&mut self, handle: Handle, buf: &mut [u8]) -> VfsResult<usize> {
        let (inode_id, seek_pos, is_tty) = {
            let d = self.handles.get(handle).ok_or(VfsError::BadHandle)?;
            (d.inode, d.seek_pos, self.tty_handle == Some(handle))
        };

        let size = self.inodes.get(&inode_id).ok_or(VfsError::BadHandle)?.size;
        let mut len = buf.len();
        if !is_tty && seek_pos + len as u64 > size {
            len = size.saturating_sub(seek_pos) as usize;
        }
        if len == 0 {
            return Ok(0);
        }

        let provider = self.inodes.get(&inode_id).and_then(|i| i.provider.clone());
        let read_len = match provider {
            Some(p) => match self.inodes.get_mut(&inode_id) {
                Some(inode) => p.read(&mut inode.data, seek_pos, &mut buf[..len]).unwrap_or(0),
                None => 0,
            },
            None => 0,
        };

        if let Some(d) = self.handles.get_mut(handle) {
            d.seek_pos += read_len as u64;
        }
        Ok(read_len)
    }

    /// `write(handle, buf)` — grows the inode (and syncs) before
    /// delegating, then reflects the possibly-grown size back into the
    /// tnode's stat.
    pub fn write(&mut self, handle: Handle, buf: &[u8]) -> VfsResult<usize> {
        let (inode_id, tnode_id, seek_pos, mode) = {
            let d = self.handles.get(handle).ok_or(VfsError::BadHandle)?;
            (d.inode, d.tnode, d.seek_pos, d.mode)
        };
        if mode.is_read_only() {
            return Err(VfsError::ReadOnly);
        }

        let len = buf.len() as u64;
        let size = self.inodes.get(&inode_id).ok_or(VfsError::BadHandle)?.size;
        if seek_pos + len > size {
            let new_size = seek_pos + len;
            if let Some(inode) = self.inodes.get_mut(&inode_id) {
                inode.size = new_size;
            }
            if let Some(provider) = self.inodes.get(&inode_id).and_then(|i| i.provider.clone()) {
                if let Some(inode) = self.inodes.get_mut(&inode_id) {
                    provider.sync(&mut inode.data)?;
                }
            }
        }

        let provider = self.inodes.get(&inode_id).and_then(|i| i.provider.clone());
        let written = match provider {
            Some(p) => match self.inodes.get_mut(&inode_id) {
                Some(inode) => p.write(&mut inode.data, seek_pos, buf).unwrap_or(0),
                None => 0,
            },
            None => 0,
        };

        let size_after = self.inodes.get(&inode_id).map(|i| i.size).unwrap_or(0);
        if let Some(tnode) = self.tnodes.get_mut(&tnode_id) {
            tnode.stat.size = size_after;
        }
        if let Some(d) = self.handles.get_mut(handle) {
            d.seek_pos += written as u64;
        }

        Ok(written)
    }

    /// `seek(handle, pos, whence)` — `SEEK_END` is subtractive
    /// (`size - pos`), preserved verbatim from the reference encoding.
    pub fn seek(&mut self, handle: Handle, pos: i64, whence: SeekWhence) -> VfsResult<u64> {
        let (inode_id, seek_pos) = {
            let d = self.handles.get(handle).ok_or(VfsError::BadHandle)?;
            (d.inode, d.seek_pos)
        };
        let size = self.inodes.get(&inode_id).ok_or(VfsError::BadHandle)?.size;

        let offset = match whence {
            SeekWhence::Set => pos,
            SeekWhence::Cur => seek_pos as i64 + pos,
            SeekWhence::End => size as i64 - pos,
        };

        if offset < 0 || offset as u64 > size {
            return Err(VfsError::OutOfBounds);
        }

        if let Some(d) = self.handles.get_mut(handle) {
            d.seek_pos = offset as u64;
        }
        Ok(offset as u64)
    }

    /// `tell(handle)` — deliberately returns the file's size, not the seek
    /// position; some callers rely on this. A missing handle returns 0.
    pub fn tell(&self, handle: Handle) -> u64 {
        self.handles
            .get(handle)
            .and_then(|d| self.inodes.get(&d.inode))
            .map(|i| i.size)
            .unwrap_or(0)
    }

    /// `getdent(handle)` — `Ok(None)` signals end of stream; `Err(WrongType)`
    /// if the inode isn't traversable.
    pub fn getdent(&mut self, handle: Handle) -> VfsResult<Option<Dirent>> {
        let (inode_id, seek_pos) = {
            let d = self.handles.get(handle).ok_or(VfsError::BadHandle)?;
            (d.inode, d.seek_pos)
        };
        let child_id = {
            let inode = self.inodes.get(&inode_id).ok_or(VfsError::BadHandle)?;
            if !inode.node_type.is_traversable() {
                return Err(VfsError::WrongType);
            }
            if seek_pos as usize >= inode.children.len() {
                return Ok(None);
            }
            inode.children[seek_pos as usize]
        };

        let child = self.tnodes.get(&child_id).ok_or(VfsError::BadHandle)?;
        let child_inode = self.inodes.get(&child.inode).ok_or(VfsError::BadHandle)?;
        let dirent = Dirent {
            name: child.name.clone(),
            node_type: child_inode.node_type,
            size: child_inode.size,
            mtime: child_inode.mtime,
        };

        if let Some(d) = self.handles.get_mut(handle) {
            d.seek_pos += 1;
        }
        Ok(Some(dirent))
    }

    /// `refresh(handle)` — repopulates the back-end's child view, then
    /// materializes every reported child via `CREATE`.
    pub fn refresh(&mut self, handle: Handle) -> VfsResult<()> {
        let (inode_id, path) = {
            let d = self.handles.get(handle).ok_or(VfsError::BadHandle)?;
            (d.inode, d.path.clone())
        };

        let Some(provider) = self.inodes.get(&inode_id).and_then(|i| i.provider.clone()) else {
            return Ok(());
        };

        {
            let inode = self.inodes.get_mut(&inode_id).ok_or(VfsError::BadHandle)?;
            provider.refresh(&mut inode.data)?;
        }

        let mut index = 0usize;
        loop {
            let dirent = {
                let data = self.inodes.get(&inode_id).and_then(|i| i.data.as_ref());
                provider.getdent(data, index)
            };
            let Some(dirent) = dirent else { break };

            let child_path = vesper_path::join(&path, &dirent.name);
            let tnode_id =
                self.resolve(&child_path, ResolvePolicy::Create { node_type: dirent.node_type, err_on_exist: false })?;
            let child_inode_id = self.tnodes.get(&tnode_id).map(|t| t.inode);
            if let Some(child_inode_id) = child_inode_id {
                if let Some(inode) = self.inodes.get_mut(&child_inode_id) {
                    inode.size = dirent.size;
                    inode.mtime = dirent.mtime;
                }
            }
            index += 1;
        }
        Ok(())
    }

    /// `unlink(path)` — requires `st_nlink == 1`; hard links aren't
    /// implemented, so anything else is unreachable absent a `link()` op.
    /// Detaches the name from its parent immediately, so a subsequent
    /// `open`/`unlink` on the same path fails with `NotFound` even while a
    /// handle opened before this call keeps the inode itself alive; the
    /// arena entries are only torn down once the last handle closes.
    pub fn unlink(&mut self, path: &str) -> VfsResult<()> {
        let tnode_id = self.resolve(path, ResolvePolicy::NoCreate)?;
        let (inode_id, nlink) = {
            let t = self.tnodes.get(&tnode_id).ok_or(VfsError::NotFound)?;
            (t.inode, t.stat.nlink)
        };
        if nlink != 1 {
            return Err(VfsError::WrongType);
        }
        if let Some(t) = self.tnodes.get_mut(&tnode_id) {
            t.stat.nlink = 0;
        }

        self.detach_name(tnode_id);

        let refcount = self.inodes.get(&inode_id).map(|i| i.refcount).unwrap_or(0);
        if refcount == 0 {
            let provider = self.inodes.get(&inode_id).and_then(|i| i.provider.clone());
            if let Some(p) = provider {
                if let Some(inode) = self.inodes.get_mut(&inode_id) {
                    p.rmnode(&mut inode.data)?;
                }
            }
            self.detach(tnode_id, inode_id);
        }
        Ok(())
    }

    /// `chmod(handle, perms)` — masks by `S_IRWXU|S_IRWXG|S_IRWXO`.
    pub fn chmod(&mut self, handle: Handle, perms: u32) -> VfsResult<()> {
        let (inode_id, tnode_id, mode) = {
            let d = self.handles.get(handle).ok_or(VfsError::BadHandle)?;
            (d.inode, d.tnode, d.mode)
        };
        if mode.is_read_only() {
            return Err(VfsError::ReadOnly);
        }

        let masked = perms & (crate::node::S_IRWXU | crate::node::S_IRWXG | crate::node::S_IRWXO);
        if let Some(inode) = self.inodes.get_mut(&inode_id) {
            inode.perms = masked;
        }
        if let Some(tnode) = self.tnodes.get_mut(&tnode_id) {
            tnode.stat.mode |= masked;
        }

        if let Some(provider) = self.inodes.get(&inode_id).and_then(|i| i.provider.clone()) {
            if let Some(inode) = self.inodes.get_mut(&inode_id) {
                provider.sync(&mut inode.data)?;
            }
        }
        Ok(())
    }

    /// `ioctl(handle, request, arg)` — fails if the provider doesn't
    /// implement it (the default body returns `BackendFailure`).
    pub fn ioctl(&mut self, handle: Handle, request: i64, arg: i64) -> VfsResult<i64> {
        let inode_id = self.handles.get(handle).ok_or(VfsError::BadHandle)?.inode;
        let provider = self
            .inodes
            .get(&inode_id)
            .and_then(|i| i.provider.clone())
            .ok_or(VfsError::ProviderUnknown)?;
        let inode = self.inodes.get_mut(&inode_id).ok_or(VfsError::BadHandle)?;
        provider.ioctl(&mut inode.data, request, arg)
    }

    /// Removes `tnode_id` from its parent's children vector only, making it
    /// path-unreachable while leaving its tnode/inode arena entries — and
    /// any handle's view of them — intact. Safe to call on a tnode whose
    /// parent no longer lists it (a no-op).
    fn detach_name(&mut self, tnode_id: TnodeId) {
        let Some(parent) = self.tnodes.get(&tnode_id).map(|t| t.parent) else { return };
        if let Some(parent_tnode) = self.tnodes.get(&parent) {
            let parent_inode_id = parent_tnode.inode;
            if let Some(parent_inode) = self.inodes.get_mut(&parent_inode_id) {
                parent_inode.children.retain(|&id| id != tnode_id);
            }
        }
    }

    /// Full teardown: detaches the name (harmless if already detached by
    /// `detach_name`) and frees the tnode/inode arena entries.
    fn detach(&mut self, tnode_id: TnodeId, inode_id: InodeId) {
        self.detach_name(tnode_id);
        self.tnodes.remove(&tnode_id);
        self.inodes.remove(&inode_id);
    }
}
