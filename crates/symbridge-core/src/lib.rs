//! Uniform symmetric-cipher mode dispatch, padding and key derivation.
//!
//! The crate exposes three surfaces:
//!
//! - a descriptor table mapping (cipher family, mode kind) pairs to uniform
//!   [`ModeOps`] implementations, with unpopulated slots reported as
//!   [`Error::UnsupportedCombination`],
//! - padding and ciphertext-stealing descriptors ([`PaddingOps`]) plus a
//!   streaming [`Session`] that wires the two layers together behind an
//!   update/finish API,
//! - PBKDF2 key derivation with a selectable HMAC PRF ([`derive_key`]).
//!
//! Cipher primitives come from `symbridge-prim`, which adapts the RustCrypto
//! block and stream cipher crates behind object-safe transforms.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block_modes;
mod context;
mod error;
mod gcm;
mod kdf;
mod mode;
mod padding;
mod session;
mod stream_modes;
mod xts;

pub use context::ModeContext;
pub use error::{Error, Result};
pub use kdf::{derive_key, KdfAlgorithm, Prf};
pub use mode::{lookup, Direction, ModeKind, ModeObject, ModeOps, SetupParams};
pub use padding::{padding_ops, PaddingKind, PaddingOps};
pub use session::Session;
pub use symbridge_prim::CipherFamily;
