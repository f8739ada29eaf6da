use serde::{Deserialize, Serialize};

use crate::registry::FallbackPolicy;
use crate::wire::WireLimits;

/// Settings fixed when a [`CodecContext`](crate::CodecContext) is built.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```ron
/// (
///     include_unannotated: false,
///     fallback: NearestDeclared,
///     limits: (max_text_len: 1024),
/// )
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Persist fields that carry no explicit persistence flags.
    pub include_unannotated: bool,
    /// Resolution of value types without an exact translator.
    pub fallback: FallbackPolicy,
    /// Bounds applied when reading wire data.
    pub limits: WireLimits,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            include_unannotated: true,
            fallback: FallbackPolicy::FirstRegistered,
            limits: WireLimits::default(),
        }
    }
}

impl CodecConfig {
    /// Parse a config from RON text.
    #[cfg(feature = "serialize-ron")]
    pub fn from_ron(text: &str) -> crate::CodecResult<Self> {
        ron::from_str(text).map_err(|e| crate::CodecError::Format(e.to_string()))
    }
}
