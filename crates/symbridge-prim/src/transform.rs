//! Object-safe transform contracts and the generic RustCrypto adapters.

use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, BlockSizeUser, StreamCipher};

/// A keyed block cipher exposed as raw single-block transforms.
///
/// `block` slices passed to the transform methods must be exactly
/// [`BlockTransform::block_size`] bytes long.
pub trait BlockTransform {
    /// Block size in bytes.
    fn block_size(&self) -> usize;
    /// Encrypts one block in place.
    fn encrypt_block(&self, block: &mut [u8]);
    /// Decrypts one block in place.
    fn decrypt_block(&self, block: &mut [u8]);
}

/// A keyed stream cipher applying its keystream in place.
pub trait StreamTransform {
    /// XORs the next keystream bytes into `data`.
    fn crypt(&mut self, data: &mut [u8]);
}

/// Adapter from a RustCrypto block cipher to [`BlockTransform`].
pub(crate) struct BlockPrim<C> {
    pub(crate) inner: C,
}

impl<C: BlockEncrypt + BlockDecrypt> BlockTransform for BlockPrim<C> {
    fn block_size(&self) -> usize {
        <C as BlockSizeUser>::block_size()
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        self.inner.encrypt_block(GenericArray::from_mut_slice(block));
    }

    fn decrypt_block(&self, block: &mut [u8]) {
        self.inner.decrypt_block(GenericArray::from_mut_slice(block));
    }
}

/// Adapter from a RustCrypto stream cipher to [`StreamTransform`].
pub(crate) struct StreamPrim<C> {
    pub(crate) inner: C,
}

impl<C: StreamCipher> StreamTransform for StreamPrim<C> {
    fn crypt(&mut self, data: &mut [u8]) {
        self.inner.apply_keystream(data);
    }
}
