//! Integration scenarios exercising the dispatcher end to end through a
//! booted `Vfs`, backed by small in-memory provider fixtures.

use std::any::Any;
use std::sync::Arc;

use vesper_vfs::{
    BootClock, DateTime, FileMode, Handle, NewNode, NodeData, NodeType, Provider, Registry,
    SeekWhence, Vfs, VfsError, VfsResult,
};

struct FixedClock;

impl BootClock for FixedClock {
    fn uptime_seconds(&self) -> u64 {
        0
    }

    fn boot_epoch_seconds(&self) -> u64 {
        1_700_000_000
    }
}

/// A file's content, stored as a flat byte buffer and downcast through the
/// opaque `NodeData` slot the dispatcher hands back to us.
struct FileBytes(Vec<u8>);

fn boxed(bytes: Vec<u8>) -> NodeData {
    Box::new(FileBytes(bytes))
}

/// An in-memory filesystem good enough to exercise reads, writes, and sparse
/// overwrites: every file's data lives behind its own inode, installed
/// lazily on first write.
struct Ramfs;

impl Provider for Ramfs {
    fn name(&self) -> &str {
        "ramfs"
    }

    fn is_temporary(&self) -> bool {
        true
    }

    fn mount(&self, _device: Option<&NodeData>) -> VfsResult<NewNode> {
        Ok(NewNode { node_type: NodeType::Folder, perms: 0o755, size: 0, mtime: DateTime::default(), data: None })
    }

    fn open(&self, _dir: Option<&NodeData>, _path: &str) -> VfsResult<Option<NewNode>> {
        Ok(None)
    }

    fn read(&self, data: &mut Option<NodeData>, offset: u64, buf: &mut [u8]) -> VfsResult<usize> {
        let Some(file) = data.as_ref().and_then(|d| d.downcast_ref::<FileBytes>()) else {
            return Ok(0);
        };
        let offset = offset as usize;
        if offset >= file.0.len() {
            return Ok(0);
        }
        let n = buf.len().min(file.0.len() - offset);
        buf[..n].copy_from_slice(&file.0[offset..offset + n]);
        Ok(n)
    }

    fn write(&self, data: &mut Option<NodeData>, offset: u64, buf: &[u8]) -> VfsResult<usize> {
        let slot = data.get_or_insert_with(|| boxed(Vec::new()));
        let file = slot.downcast_mut::<FileBytes>().expect("ramfs node data is always FileBytes");
        let offset = offset as usize;
        let end = offset + buf.len();
        if file.0.len() < end {
            file.0.resize(end, 0);
        }
        file.0[offset..end].copy_from_slice(buf);
        Ok(buf.len())
    }
}

/// Stands in for `ttyfs`/`pipefs` during boot: neither is exercised by these
/// scenarios beyond being mountable.
struct TrivialFs(&'static str);

impl Provider for TrivialFs {
    fn name(&self) -> &str {
        self.0
    }

    fn is_temporary(&self) -> bool {
        true
    }

    fn mount(&self, _device: Option<&NodeData>) -> VfsResult<NewNode> {
        Ok(NewNode { node_type: NodeType::Folder, perms: 0o666, size: 0, mtime: DateTime::default(), data: None })
    }

    fn open(&self, _dir: Option<&NodeData>, _path: &str) -> VfsResult<Option<NewNode>> {
        Ok(None)
    }

    fn read(&self, _data: &mut Option<NodeData>, _offset: u64, _buf: &mut [u8]) -> VfsResult<usize> {
        Ok(0)
    }

    fn write(&self, _data: &mut Option<NodeData>, _offset: u64, buf: &[u8]) -> VfsResult<usize> {
        Ok(buf.len())
    }
}

fn booted_vfs() -> Vfs {
    let mut registry = Registry::new();
    registry.register(Arc::new(Ramfs));
    registry.register(Arc::new(TrivialFs("ttyfs")));
    registry.register(Arc::new(TrivialFs("pipefs")));
    Vfs::boot(Arc::new(FixedClock), registry)
}

#[test]
fn s1_root_lists_the_well_known_directories_in_creation_order() {
    let vfs = booted_vfs();
    let handle = vfs.open("/", FileMode::READ).unwrap();

    let mut names = Vec::new();
    while let Some(dirent) = vfs.getdent(handle).unwrap() {
        names.push(dirent.name);
    }
    vfs.close(handle).unwrap();

    assert_eq!(names, vec!["disk".to_string(), "dev".to_string()]);
}

#[test]
fn s2_write_then_read_round_trips_exactly() {
    let vfs = booted_vfs();
    vfs.create("/test.txt", NodeType::File).unwrap();

    let handle = vfs.open("/test.txt", FileMode::READ_WRITE).unwrap();
    let payload = b"(1) This is a test -- END";
    assert_eq!(vfs.write(handle, payload).unwrap(), payload.len());
    vfs.close(handle).unwrap();

    let handle = vfs.open("/test.txt", FileMode::READ).unwrap();
    let mut buf = vec![0u8; payload.len()];
    let read = vfs.read(handle, &mut buf).unwrap();
    vfs.close(handle).unwrap();

    assert_eq!(read, payload.len());
    assert_eq!(&buf, payload);
}

#[test]
fn s3_seek_within_bounds_then_write_grows_the_file_past_its_old_end() {
    // `seek` rejects any offset past the current size (see `s6`), so a
    // write that grows a file always starts at or before the old end —
    // never past it. This exercises that growth path: bytes before the
    // seek position survive untouched, and the new bytes from the seek
    // position onward come from this write.
    let vfs = booted_vfs();
    vfs.create("/sparse.bin", NodeType::File).unwrap();
    let handle = vfs.open("/sparse.bin", FileMode::READ_WRITE).unwrap();
    assert_eq!(vfs.write(handle, b"0000000000").unwrap(), 10);

    let mut payload = b"(2) This is a test".to_vec();
    payload.extend(std::iter::repeat(b'A').take(102));
    payload.push(b'B');

    assert_eq!(vfs.seek(handle, 5, SeekWhence::Set).unwrap(), 5);
    assert_eq!(vfs.write(handle, &payload).unwrap(), payload.len());
    vfs.close(handle).unwrap();

    let handle = vfs.open("/sparse.bin", FileMode::READ).unwrap();
    let mut buf = vec![0u8; 5 + payload.len()];
    let read = vfs.read(handle, &mut buf).unwrap();
    vfs.close(handle).unwrap();

    assert_eq!(read, buf.len());
    assert_eq!(&buf[..5], b"00000");
    assert_eq!(&buf[5..], payload.as_slice());
}

#[test]
fn s4_unlink_detaches_the_name_immediately_but_keeps_data_reachable_until_close() {
    let vfs = booted_vfs();
    vfs.create("/evict.txt", NodeType::File).unwrap();
    let handle = vfs.open("/evict.txt", FileMode::READ_WRITE).unwrap();
    vfs.write(handle, b"still here").unwrap();
    vfs.seek(handle, 0, SeekWhence::Set).unwrap();

    vfs.unlink("/evict.txt").unwrap();

    // The name is gone from the namespace right away, even though the
    // handle opened before the unlink keeps the inode itself alive.
    assert_eq!(vfs.open("/evict.txt", FileMode::READ).unwrap_err(), VfsError::NotFound);

    let mut buf = [0u8; 10];
    assert_eq!(vfs.read(handle, &mut buf).unwrap(), 10);
    assert_eq!(&buf, b"still here");

    // A second unlink finds nothing at that path anymore, same as any
    // other miss.
    assert_eq!(vfs.unlink("/evict.txt").unwrap_err(), VfsError::NotFound);

    vfs.close(handle).unwrap();

    // Only after the last close does the name become free again.
    vfs.create("/evict.txt", NodeType::File).unwrap();
}

#[test]
fn s5_mount_with_an_unregistered_provider_name_fails() {
    let vfs = booted_vfs();
    vfs.create("/mnt", NodeType::Folder).unwrap();
    assert_eq!(vfs.mount("", "/mnt", "fat32").unwrap_err(), VfsError::ProviderUnknown);
}

#[test]
fn s5_mount_onto_a_non_empty_folder_fails() {
    let vfs = booted_vfs();
    // "/dev" already has "tty" and "pipe" mounted under it by boot().
    assert_eq!(vfs.mount("", "/dev", "ramfs").unwrap_err(), VfsError::WrongType);
}

#[test]
fn s6_seek_end_is_subtractive_and_rejects_out_of_bounds_offsets() {
    let vfs = booted_vfs();
    vfs.create("/seek.bin", NodeType::File).unwrap();
    let handle = vfs.open("/seek.bin", FileMode::READ_WRITE).unwrap();
    vfs.write(handle, b"0123456789").unwrap();

    assert_eq!(vfs.seek(handle, 4, SeekWhence::End).unwrap(), 6);
    assert_eq!(vfs.seek(handle, 2, SeekWhence::Cur).unwrap(), 8);
    assert_eq!(vfs.seek(handle, 100, SeekWhence::Set).unwrap_err(), VfsError::OutOfBounds);

    vfs.close(handle).unwrap();
}

#[test]
fn tell_reports_file_size_rather_than_the_seek_position() {
    let vfs = booted_vfs();
    vfs.create("/tell.txt", NodeType::File).unwrap();
    let handle = vfs.open("/tell.txt", FileMode::READ_WRITE).unwrap();
    vfs.write(handle, b"hello").unwrap();
    vfs.seek(handle, 1, SeekWhence::Set).unwrap();

    assert_eq!(vfs.tell(handle), 5);

    vfs.close(handle).unwrap();
}

#[test]
fn write_through_a_read_only_handle_is_rejected() {
    let vfs = booted_vfs();
    vfs.create("/ro.txt", NodeType::File).unwrap();
    let handle = vfs.open("/ro.txt", FileMode::READ).unwrap();
    assert_eq!(vfs.write(handle, b"nope").unwrap_err(), VfsError::ReadOnly);
    vfs.close(handle).unwrap();
}

#[test]
fn getdent_on_a_plain_file_fails_with_wrong_type() {
    let vfs = booted_vfs();
    vfs.create("/plain.txt", NodeType::File).unwrap();
    let handle = vfs.open("/plain.txt", FileMode::READ).unwrap();
    assert_eq!(vfs.getdent(handle).unwrap_err(), VfsError::WrongType);
    vfs.close(handle).unwrap();
}

#[test]
fn operations_on_an_unknown_handle_return_bad_handle() {
    let vfs = booted_vfs();
    let bogus = Handle(9999);
    let mut buf = [0u8; 4];

    assert_eq!(vfs.read(bogus, &mut buf).unwrap_err(), VfsError::BadHandle);
    assert_eq!(vfs.write(bogus, &buf).unwrap_err(), VfsError::BadHandle);
    assert_eq!(vfs.close(bogus).unwrap_err(), VfsError::BadHandle);
    assert_eq!(vfs.tell(bogus), 0);
}

#[test]
fn create_with_an_existing_name_fails_with_already_exists() {
    let vfs = booted_vfs();
    vfs.create("/dup.txt", NodeType::File).unwrap();
    assert_eq!(vfs.create("/dup.txt", NodeType::File).unwrap_err(), VfsError::AlreadyExists);
}

#[test]
fn files_created_under_the_mounted_root_inherit_its_provider() {
    // A file created through plain path resolution (not via a provider's
    // mount/open) must still read back what it was written, because
    // `create_child` propagates the parent's provider down the tree.
    let vfs = booted_vfs();
    vfs.create("/disk/data.bin", NodeType::File).unwrap();
    let handle = vfs.open("/disk/data.bin", FileMode::READ_WRITE).unwrap();
    vfs.write(handle, b"inherited").unwrap();
    vfs.close(handle).unwrap();

    let handle = vfs.open("/disk/data.bin", FileMode::READ).unwrap();
    let mut buf = [0u8; 9];
    assert_eq!(vfs.read(handle, &mut buf).unwrap(), 9);
    vfs.close(handle).unwrap();
    assert_eq!(&buf, b"inherited");
}
