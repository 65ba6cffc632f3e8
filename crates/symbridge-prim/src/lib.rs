//! Keyed cipher transform provider for the symbridge mode engine.
//!
//! This crate is the "primitive provider" seam: it resolves a cipher family
//! and raw key material to a boxed single-block (or keystream) transform and
//! owns nothing beyond key-length policy. The transforms themselves come from
//! the RustCrypto primitive crates; all chaining, padding and buffering
//! lives in `symbridge-core`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod family;
mod provider;
mod transform;

pub use crate::family::CipherFamily;
pub use crate::provider::{block_transform, stream_transform};
pub use crate::transform::{BlockTransform, StreamTransform};

use std::fmt;

/// Errors reported while constructing a keyed transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimError {
    /// Key length is not valid for the selected cipher family.
    KeyLength {
        /// Cipher family the key was offered to.
        family: CipherFamily,
        /// Rejected key length in bytes.
        len: usize,
    },
    /// The cipher family does not provide this transform shape
    /// (e.g. a block transform for RC4).
    WrongShape(CipherFamily),
}

impl fmt::Display for PrimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimError::KeyLength { family, len } => {
                write!(f, "invalid {}-byte key for {:?}", len, family)
            }
            PrimError::WrongShape(family) => {
                write!(f, "{:?} does not provide this transform shape", family)
            }
        }
    }
}

impl std::error::Error for PrimError {}
