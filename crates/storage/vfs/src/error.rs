//! Error taxonomy for the VFS core.

/// Result type threaded through every VFS operation.
pub type VfsResult<T> = Result<T, VfsError>;

/// The nine kinds of failure the VFS core can report.
///
/// Every variant maps to a negative errno-style code via [`VfsError::to_errno`],
/// mirroring how the dispatcher surfaces failures to callers that expect a
/// sentinel return rather than a `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfsError {
    /// Path resolution failed under `NO_CREATE`.
    NotFound,
    /// `CREATE | ERR_ON_EXIST` collided with an existing name.
    AlreadyExists,
    /// Mount device isn't a block device, mount target isn't an empty
    /// folder, or `getdent` was called on a non-traversable inode.
    WrongType,
    /// Handle not present in the open-file table.
    BadHandle,
    /// Write or chmod attempted through a read-only descriptor.
    ReadOnly,
    /// Seek result fell outside `[0, size]`.
    OutOfBounds,
    /// A back-end operation reported failure; read/write degrade this to
    /// "0 bytes transferred" rather than propagating it.
    BackendFailure,
    /// No provider is registered under the requested name.
    ProviderUnknown,
    /// Unrecoverable condition at init time (e.g. a required provider
    /// absent from the registry). Never raised by a normal operation.
    Fatal,
}

impl VfsError {
    /// Convert to the negative errno-style code a syscall boundary would return.
    pub fn to_errno(&self) -> i32 {
        match self {
            VfsError::NotFound => -2,         // ENOENT
            VfsError::AlreadyExists => -17,   // EEXIST
            VfsError::WrongType => -20,       // ENOTDIR
            VfsError::BadHandle => -9,        // EBADF
            VfsError::ReadOnly => -30,        // EROFS
            VfsError::OutOfBounds => -22,     // EINVAL
            VfsError::BackendFailure => -5,   // EIO
            VfsError::ProviderUnknown => -19, // ENODEV
            VfsError::Fatal => -1,            // EPERM, never expected to surface
        }
    }
}
