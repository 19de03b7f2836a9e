//! Boot wiring: the exact sequence the reference kernel's `vfs_init`
//! performs, minus the concrete back-ends (registered by the caller before
//! calling this).

use crate::handle::FileMode;
use crate::node::NodeType;
use crate::VfsState;

impl VfsState {
    /// Mounts an in-memory root, creates the well-known directories, and
    /// mounts the TTY and pipe back-ends, capturing the TTY's reserved
    /// handle for the read-clamp exception.
    pub fn boot(&mut self) -> crate::error::VfsResult<()> {
        self.mount("", "/", "ramfs")?;

        let root_handle = self.open("/", FileMode::READ_WRITE)?;
        self.refresh(root_handle)?;
        self.close(root_handle)?;

        self.create("/disk", NodeType::Folder)?;
        self.create("/dev", NodeType::Folder)?;

        self.create("/dev/tty", NodeType::Folder)?;
        self.mount("", "/dev/tty", "ttyfs")?;
        let tty_handle = self.open("/dev/tty", FileMode::READ_WRITE)?;
        self.tty_handle = Some(tty_handle);

        self.create("/dev/pipe", NodeType::Folder)?;
        self.mount("", "/dev/pipe", "pipefs")?;

        Ok(())
    }
}
