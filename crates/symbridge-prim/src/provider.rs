//! Family-to-transform resolution and key-length policy.

use aes::{Aes128, Aes192, Aes256};
use blowfish::Blowfish;
use cast5::Cast5;
use cipher::consts::{U16, U24, U32, U5, U8};
use cipher::generic_array::GenericArray;
use cipher::KeyInit;
use des::{Des, TdesEde2, TdesEde3};
use rc2::Rc2;
use rc4::Rc4;

use crate::transform::{BlockPrim, StreamPrim};
use crate::{BlockTransform, CipherFamily, PrimError, StreamTransform};

fn bad_key(family: CipherFamily, len: usize) -> PrimError {
    PrimError::KeyLength { family, len }
}

/// Builds a keyed block transform for `family`.
///
/// Accepted key lengths: AES 16/24/32, DES 8, 3DES 16 (two-key EDE) or
/// 24 (three-key EDE), CAST 16, RC2 1..=128 (effective bits follow the key
/// length), Blowfish 4..=56. RC4 has no block shape and is rejected with
/// [`PrimError::WrongShape`].
pub fn block_transform(
    family: CipherFamily,
    key: &[u8],
) -> Result<Box<dyn BlockTransform>, PrimError> {
    match family {
        CipherFamily::Aes => match key.len() {
            16 => Ok(Box::new(BlockPrim {
                inner: Aes128::new(GenericArray::from_slice(key)),
            })),
            24 => Ok(Box::new(BlockPrim {
                inner: Aes192::new(GenericArray::from_slice(key)),
            })),
            32 => Ok(Box::new(BlockPrim {
                inner: Aes256::new(GenericArray::from_slice(key)),
            })),
            len => Err(bad_key(family, len)),
        },
        CipherFamily::Des => match key.len() {
            8 => Ok(Box::new(BlockPrim {
                inner: Des::new(GenericArray::from_slice(key)),
            })),
            len => Err(bad_key(family, len)),
        },
        CipherFamily::TripleDes => match key.len() {
            16 => Ok(Box::new(BlockPrim {
                inner: TdesEde2::new(GenericArray::from_slice(key)),
            })),
            24 => Ok(Box::new(BlockPrim {
                inner: TdesEde3::new(GenericArray::from_slice(key)),
            })),
            len => Err(bad_key(family, len)),
        },
        CipherFamily::Cast => match key.len() {
            16 => Ok(Box::new(BlockPrim {
                inner: Cast5::new(GenericArray::from_slice(key)),
            })),
            len => Err(bad_key(family, len)),
        },
        CipherFamily::Rc2 => match key.len() {
            1..=128 => Ok(Box::new(BlockPrim {
                inner: Rc2::new_with_eff_key_len(key, key.len() * 8),
            })),
            len => Err(bad_key(family, len)),
        },
        CipherFamily::Blowfish => Blowfish::new_from_slice(key)
            .map(|inner: Blowfish| Box::new(BlockPrim { inner }) as Box<dyn BlockTransform>)
            .map_err(|_| bad_key(family, key.len())),
        CipherFamily::Rc4 => Err(PrimError::WrongShape(family)),
    }
}

/// Builds a keyed keystream transform for `family`.
///
/// Only RC4 has a stream shape; the supported key lengths are the common
/// deployment sizes (5, 8, 16, 24 and 32 bytes).
pub fn stream_transform(
    family: CipherFamily,
    key: &[u8],
) -> Result<Box<dyn StreamTransform>, PrimError> {
    match family {
        CipherFamily::Rc4 => match key.len() {
            5 => Ok(Box::new(StreamPrim {
                inner: Rc4::<U5>::new(GenericArray::from_slice(key)),
            })),
            8 => Ok(Box::new(StreamPrim {
                inner: Rc4::<U8>::new(GenericArray::from_slice(key)),
            })),
            16 => Ok(Box::new(StreamPrim {
                inner: Rc4::<U16>::new(GenericArray::from_slice(key)),
            })),
            24 => Ok(Box::new(StreamPrim {
                inner: Rc4::<U24>::new(GenericArray::from_slice(key)),
            })),
            32 => Ok(Box::new(StreamPrim {
                inner: Rc4::<U32>::new(GenericArray::from_slice(key)),
            })),
            len => Err(bad_key(family, len)),
        },
        _ => Err(PrimError::WrongShape(family)),
    }
}
