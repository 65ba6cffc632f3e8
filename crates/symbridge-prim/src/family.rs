//! Cipher family selector.

/// Symmetric cipher families served by the provider.
///
/// The set matches the algorithm rows of the mode dispatch table in
/// `symbridge-core`; RC4 is the only stream cipher and carries a block size
/// of one byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CipherFamily {
    /// AES with 128/192/256-bit keys.
    Aes,
    /// Single DES, 64-bit key (56 effective bits).
    Des,
    /// Triple DES, EDE keying with two or three distinct keys.
    TripleDes,
    /// CAST5 (CAST-128) with a 128-bit key.
    Cast,
    /// RC2 with a variable-length key, effective bits equal to the key size.
    Rc2,
    /// Blowfish with a 4..=56 byte key.
    Blowfish,
    /// RC4 stream cipher.
    Rc4,
}

impl CipherFamily {
    /// Natural block size of the family in bytes (1 for stream ciphers).
    pub fn block_size(self) -> usize {
        match self {
            CipherFamily::Aes => 16,
            CipherFamily::Rc4 => 1,
            _ => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_sizes() {
        assert_eq!(CipherFamily::Aes.block_size(), 16);
        assert_eq!(CipherFamily::Des.block_size(), 8);
        assert_eq!(CipherFamily::TripleDes.block_size(), 8);
        assert_eq!(CipherFamily::Cast.block_size(), 8);
        assert_eq!(CipherFamily::Rc2.block_size(), 8);
        assert_eq!(CipherFamily::Blowfish.block_size(), 8);
        assert_eq!(CipherFamily::Rc4.block_size(), 1);
    }
}
