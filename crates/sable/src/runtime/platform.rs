//! Operating-system services used by library code around the core.
//!
//! Path functions resolve relative paths against [`Vm::cwd`] and return
//! text allocated in the VM's current scratch arena, so results live until
//! the enclosing [`Vm::scope`] ends.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::runtime::vm::Vm;

/// What a path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    NoExist,
    Dir,
    File,
}

/// Canonical form of `path`.
///
/// Relative paths are first joined to the VM's working directory. When the
/// path cannot be canonicalised (it does not exist, say) the joined path is
/// returned as is.
pub fn realpath<'vm>(vm: &'vm Vm, path: &str) -> &'vm str {
    let joined = vm.cwd().join(path);
    let resolved = fs::canonicalize(&joined).unwrap_or(joined);
    vm.alloc_str(&resolved.to_string_lossy())
}

/// Whether `path`, resolved like [`realpath`], exists.
pub fn file_exists(vm: &Vm, path: &str) -> bool {
    fs::metadata(realpath(vm, path)).is_ok()
}

/// Kind of filesystem entry at `path`, resolved like [`realpath`].
pub fn file_type(vm: &Vm, path: &str) -> FileType {
    match fs::metadata(realpath(vm, path)) {
        Ok(meta) if meta.is_dir() => FileType::Dir,
        Ok(_) => FileType::File,
        Err(_) => FileType::NoExist,
    }
}

/// Whether the absolute `path` exists. Relative paths are never found.
pub fn abs_file_exists(path: &str) -> bool {
    Path::new(path).is_absolute() && fs::metadata(path).is_ok()
}

/// Seed for the host's random number generator.
///
/// Reads four bytes from `/dev/urandom`, falling back to the wall clock.
#[must_use]
pub fn seed() -> i32 {
    let mut bytes = [0u8; 4];
    let urandom = fs::File::open("/dev/urandom").and_then(|mut f| f.read_exact(&mut bytes));
    if urandom.is_ok() {
        return i32::from_ne_bytes(bytes);
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (u64::from(now.subsec_micros()) ^ now.as_secs()) as i32
}

/// Environment of the process as `(name, value)` pairs. Entries that are not
/// valid Unicode are converted lossily.
#[must_use]
pub fn environ() -> Vec<(String, String)> {
    std::env::vars_os()
        .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
        .collect()
}
