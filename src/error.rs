//! Configuration errors raised when a container is constructed.
//!
//! Misuse of a container after construction (out-of-range indices, removing a
//! slot twice, removing a tree root) is a caller bug and panics instead.

/// Error type for container construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No tombstone test was supplied to a [`CallbacksBuilder`](crate::CallbacksBuilder).
    MissingTombstoneTest,
    /// No tombstone setter was supplied to a [`CallbacksBuilder`](crate::CallbacksBuilder).
    MissingTombstoneSetter,
    /// An initial capacity of zero can never double.
    ZeroCapacity,
    /// The trinary resort threshold must lie in `(0.0, 1.0]`.
    InvalidResortThreshold(f64),
    /// Tree nodes are linked by `u32` indices.
    CapacityExceedsNodeRange(usize),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingTombstoneTest => write!(f, "tombstone test callback is required"),
            ConfigError::MissingTombstoneSetter => {
                write!(f, "tombstone setter callback is required")
            }
            ConfigError::ZeroCapacity => write!(f, "initial capacity must be at least 1"),
            ConfigError::InvalidResortThreshold(t) => {
                write!(f, "resort threshold must be in (0.0, 1.0], got {}", t)
            }
            ConfigError::CapacityExceedsNodeRange(c) => {
                write!(f, "tree capacity {} exceeds the u32 node index range", c)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Result type for container construction.
pub type Result<T> = std::result::Result<T, ConfigError>;
