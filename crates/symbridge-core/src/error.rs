//! Error taxonomy shared by the mode, padding and key-derivation layers.

use std::fmt;

use symbridge_prim::PrimError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the dispatch, padding and derivation layers.
///
/// `BadPadding` is deliberately distinct from `LengthMismatch` and
/// `InvalidParameter`: protocol layers branch on it to keep padding-oracle
/// handling separate from transport faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A required argument is missing, empty or out of range.
    InvalidParameter(&'static str),
    /// The cipher × mode × operation combination is not populated.
    UnsupportedCombination,
    /// A buffer length does not match what the mode requires.
    LengthMismatch {
        /// Required length in bytes.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// Decrypted PKCS#7 trailer bytes are malformed.
    BadPadding,
    /// Failure propagated from the primitive provider.
    Primitive(PrimError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter(what) => write!(f, "invalid parameter: {}", what),
            Error::UnsupportedCombination => {
                write!(f, "cipher/mode/operation combination is not supported")
            }
            Error::LengthMismatch { expected, actual } => {
                write!(f, "length mismatch: expected {} bytes, got {}", expected, actual)
            }
            Error::BadPadding => write!(f, "padding validation failed"),
            Error::Primitive(err) => write!(f, "primitive failure: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<PrimError> for Error {
    fn from(err: PrimError) -> Self {
        Error::Primitive(err)
    }
}
