//! Storage hand-off for trees (feature-gated).
//!
//! A [`Compound`] produced by the tree codec is handed to storage as bytes
//! in one of the serde formats below. The codec itself never touches disk.
//! Both formats keep a compound's entry order, so a stored tree reloads
//! with the same iteration order it was saved with.

use crate::error::CodecResult;
use crate::tree::Compound;

/// Storage encodings for a persisted tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Pretty-printed RON; leaves appear as `Int(7)`, `String("beta")` and so on.
    #[cfg(feature = "serialize-ron")]
    Ron,
    /// Bincode; compact, and only readable by the same `Tag` layout.
    #[cfg(feature = "serialize-bincode")]
    Bincode,
}

#[cfg(any(feature = "serialize-ron", feature = "serialize-bincode"))]
fn storage_error(e: impl std::fmt::Display) -> crate::CodecError {
    crate::CodecError::Format(e.to_string())
}

/// Serialize `tree` for storage.
#[allow(unused_variables)]
pub fn encode(tree: &Compound, format: Format) -> CodecResult<Vec<u8>> {
    match format {
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::ser::to_string_pretty(tree, ron::ser::PrettyConfig::default())
            .map(String::into_bytes)
            .map_err(storage_error),
        #[cfg(feature = "serialize-bincode")]
        Format::Bincode => bincode::serialize(tree).map_err(storage_error),
    }
}

/// Load a tree written by [`encode`] in the same format. Anything that is
/// not a compound at the top level is a [`CodecError::Format`](crate::CodecError::Format).
#[allow(unused_variables)]
pub fn decode(bytes: &[u8], format: Format) -> CodecResult<Compound> {
    match format {
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::from_str(std::str::from_utf8(bytes).map_err(storage_error)?)
            .map_err(storage_error),
        #[cfg(feature = "serialize-bincode")]
        Format::Bincode => bincode::deserialize(bytes).map_err(storage_error),
    }
}
