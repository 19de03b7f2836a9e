//! Path handling utilities shared by the kernel's filesystem layer.
//!
//! Paths are always `/`-separated and absolute; there is a single
//! hierarchical namespace rooted at `/` (no drive letters, no relative
//! cwd resolution — that is a shell/process concern, not a VFS one).

#![no_std]

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Path separator.
pub const SEPARATOR: char = '/';

/// Maximum path length accepted by the VFS.
pub const MAX_PATH: usize = 256;

/// Maximum filename length accepted by the VFS.
pub const MAX_FILENAME: usize = 255;

/// Normalize a path string.
///
/// - Collapses duplicate slashes and trailing slashes.
/// - Drops `.` components.
/// - Resolves `..` against preceding components (can't escape `/`).
/// - Always returns an absolute, `/`-rooted path.
pub fn normalize(path: &str) -> String {
    let mut components: Vec<&str> = Vec::new();

    for part in path.split(SEPARATOR) {
        match part {
            "" | "." => continue,
            ".." => {
                components.pop();
            }
            _ => components.push(part),
        }
    }

    if components.is_empty() {
        String::from("/")
    } else {
        format!("/{}", components.join("/"))
    }
}

/// Split a normalized path into its `/`-separated components.
pub fn components(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Split a path into (parent, basename).
///
/// `/` itself has no parent: returns `("/", "")`.
pub fn split(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches(SEPARATOR);

    if trimmed.is_empty() {
        return ("/", "");
    }

    match trimmed.rfind(SEPARATOR) {
        Some(0) => ("/", &trimmed[1..]),
        Some(pos) => (&trimmed[..pos], &trimmed[pos + 1..]),
        None => ("/", trimmed),
    }
}

/// Get the parent directory of a path, and the basename.
///
/// Mirrors `vfs_get_parent_dir` from the reference kernel: if `path` has
/// no parent (it names `/` or a direct child of `/`), the parent is `/`.
pub fn parent_and_basename(path: &str) -> (String, String) {
    let normalized = normalize(path);
    let (parent, base) = split(&normalized);
    (String::from(parent), String::from(base))
}

/// Join a directory path with a single path component.
pub fn join(base: &str, component: &str) -> String {
    if base == "/" {
        format!("/{}", component)
    } else {
        format!("{}/{}", base, component)
    }
}

/// Check whether a single path component is a valid name for a tnode.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(SEPARATOR)
        && !name.contains('\0')
        && name.len() <= MAX_FILENAME
}

/// Check whether a path is well-formed: absolute and within `MAX_PATH`.
pub fn is_valid_path(path: &str) -> bool {
    path.starts_with(SEPARATOR) && path.len() <= MAX_PATH
}
