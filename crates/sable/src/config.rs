//! VM configuration.
//!
//! ```
//! use sable::VmConfig;
//! use sable_log::Level;
//!
//! let config = VmConfig::default()
//!     .with_max_call_depth(64)
//!     .with_log_level(Level::Debug);
//! assert_eq!(config.max_call_depth, 64);
//! ```

use sable_log::{Level, warn};

/// Default chunk size for scratch arenas (64 KiB).
pub const DEFAULT_ARENA_CHUNK_SIZE: usize = 64 * 1024;

/// Default limit on nested sends.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

/// Environment variable naming the log level.
pub const ENV_LOG: &str = "SABLE_LOG";

/// Environment variable overriding [`VmConfig::max_call_depth`].
pub const ENV_MAX_CALL_DEPTH: &str = "SABLE_MAX_CALL_DEPTH";

/// Settings fixed when a [`Vm`](crate::Vm) is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// First-chunk size of every scratch arena, in bytes.
    pub arena_chunk_size: usize,
    /// Sends nested deeper than this raise `StackError`.
    pub max_call_depth: usize,
    /// Applied to the global logger on VM creation when set.
    pub log_level: Option<Level>,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            arena_chunk_size: DEFAULT_ARENA_CHUNK_SIZE,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            log_level: None,
        }
    }
}

impl VmConfig {
    /// Defaults overridden by `SABLE_LOG` and `SABLE_MAX_CALL_DEPTH`.
    ///
    /// Unparsable values are reported at Warn and the default is kept.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.log_level = sable_log::level_from_env(ENV_LOG);

        if let Ok(raw) = std::env::var(ENV_MAX_CALL_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(depth) => config.max_call_depth = depth,
                Err(err) => warn!("{ENV_MAX_CALL_DEPTH}={raw:?}: {err}"),
            }
        }

        config
    }

    #[must_use]
    pub fn with_arena_chunk_size(mut self, bytes: usize) -> Self {
        self.arena_chunk_size = bytes;
        self
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = Some(level);
        self
    }
}
