//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors reported by the fallible (`try_*`) container accessors.
///
/// The infallible accessors treat the same conditions as contract
/// violations and panic with this error's `Display` text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The index was never handed out by this container.
    OutOfRange {
        /// The offending index.
        index: u32,
        /// Number of slots the container has ever handed out.
        len: usize,
    },
    /// The index was handed out but has since been removed.
    Vacant {
        /// The offending index.
        index: u32,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range ({len} slots)")
            }
            Self::Vacant { index } => write!(f, "index {index} is not live"),
        }
    }
}

impl Error for ArenaError {}
