//! ABI decoding errors.

/// Errors produced while decoding guest records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    /// A subscription carried a kind tag outside the defined enumeration.
    #[error("unknown subscription kind tag {0}")]
    UnknownKindTag(u8),
}
