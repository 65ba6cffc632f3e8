//! Password-based key derivation.

use hmac::Hmac;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::error::{Error, Result};

/// Key-derivation algorithm selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KdfAlgorithm {
    /// PKCS#5 PBKDF2.
    Pbkdf2,
}

/// Pseudo-random function underlying the derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prf {
    /// HMAC over SHA-1.
    HmacSha1,
    /// HMAC over SHA-224.
    HmacSha224,
    /// HMAC over SHA-256.
    HmacSha256,
    /// HMAC over SHA-384.
    HmacSha384,
    /// HMAC over SHA-512.
    HmacSha512,
}

/// Derives `out.len()` bytes of key material from a password and salt.
///
/// Every argument is validated up front; an empty password, salt or output
/// buffer and a zero round count are all rejected rather than producing a
/// degenerate key.
pub fn derive_key(
    algorithm: KdfAlgorithm,
    password: &[u8],
    salt: &[u8],
    prf: Prf,
    rounds: u32,
    out: &mut [u8],
) -> Result<()> {
    let KdfAlgorithm::Pbkdf2 = algorithm;
    if password.is_empty() {
        return Err(Error::InvalidParameter("password must not be empty"));
    }
    if salt.is_empty() {
        return Err(Error::InvalidParameter("salt must not be empty"));
    }
    if out.is_empty() {
        return Err(Error::InvalidParameter("derived key must not be empty"));
    }
    if rounds == 0 {
        return Err(Error::InvalidParameter("round count must be positive"));
    }

    let result = match prf {
        Prf::HmacSha1 => pbkdf2::pbkdf2::<Hmac<Sha1>>(password, salt, rounds, out),
        Prf::HmacSha224 => pbkdf2::pbkdf2::<Hmac<Sha224>>(password, salt, rounds, out),
        Prf::HmacSha256 => pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, rounds, out),
        Prf::HmacSha384 => pbkdf2::pbkdf2::<Hmac<Sha384>>(password, salt, rounds, out),
        Prf::HmacSha512 => pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, rounds, out),
    };
    result.map_err(|_| Error::InvalidParameter("derived key length out of range"))
}
