//! XTS mode with built-in ciphertext stealing.
//!
//! The tweaked entry points treat each call as one logical unit (a "sector"):
//! the tweak is derived from the supplied IV, so any length of at least one
//! block is legal and output never expands. The plain encrypt/decrypt slots
//! are deliberately unpopulated, matching the descriptor contract.

use std::mem;

use symbridge_prim::{block_transform, BlockTransform};

use crate::context::{check_output, xor_in_place, ModeContext};
use crate::error::{Error, Result};
use crate::mode::{ModeObject, ModeOps, SetupParams};

const BLOCK: usize = 16;

/// XTS session state: independently keyed data and tweak transforms.
pub struct XtsState {
    data: Box<dyn BlockTransform>,
    tweak: Box<dyn BlockTransform>,
}

/// Multiplies the tweak by alpha in GF(2^128), little-endian convention.
fn gf_mul2(t: &mut [u8; BLOCK]) {
    let mut carry = 0u8;
    for byte in t.iter_mut() {
        let next = *byte >> 7;
        *byte = (*byte << 1) | carry;
        carry = next;
    }
    if carry == 1 {
        t[0] ^= 0x87;
    }
}

impl XtsState {
    fn derive_tweak(&self, iv: &[u8]) -> Result<[u8; BLOCK]> {
        if iv.len() != BLOCK {
            return Err(Error::LengthMismatch {
                expected: BLOCK,
                actual: iv.len(),
            });
        }
        let mut t = [0u8; BLOCK];
        t.copy_from_slice(iv);
        self.tweak.encrypt_block(&mut t);
        Ok(t)
    }

    fn crypt_block(&self, block: &mut [u8; BLOCK], t: &[u8; BLOCK], decrypt: bool) {
        xor_in_place(block, t);
        if decrypt {
            self.data.decrypt_block(block);
        } else {
            self.data.encrypt_block(block);
        }
        xor_in_place(block, t);
    }

    fn encrypt_unit(&self, input: &[u8], output: &mut [u8], iv: &[u8]) -> Result<usize> {
        let len = input.len();
        if len < BLOCK {
            return Err(Error::LengthMismatch {
                expected: BLOCK,
                actual: len,
            });
        }
        check_output(output, len)?;
        let mut t = self.derive_tweak(iv)?;

        let rem = len % BLOCK;
        let whole = if rem == 0 { len / BLOCK } else { len / BLOCK - 1 };
        for i in 0..whole {
            let mut block = [0u8; BLOCK];
            block.copy_from_slice(&input[i * BLOCK..(i + 1) * BLOCK]);
            self.crypt_block(&mut block, &t, false);
            output[i * BLOCK..(i + 1) * BLOCK].copy_from_slice(&block);
            gf_mul2(&mut t);
        }

        if rem != 0 {
            // Steal from the last full ciphertext block to cover the tail.
            let mut cm = [0u8; BLOCK];
            cm.copy_from_slice(&input[whole * BLOCK..(whole + 1) * BLOCK]);
            self.crypt_block(&mut cm, &t, false);

            let mut t2 = t;
            gf_mul2(&mut t2);
            let mut last = [0u8; BLOCK];
            last[..rem].copy_from_slice(&input[(whole + 1) * BLOCK..]);
            last[rem..].copy_from_slice(&cm[rem..]);
            self.crypt_block(&mut last, &t2, false);

            output[whole * BLOCK..(whole + 1) * BLOCK].copy_from_slice(&last);
            output[(whole + 1) * BLOCK..len].copy_from_slice(&cm[..rem]);
        }
        Ok(len)
    }

    fn decrypt_unit(&self, input: &[u8], output: &mut [u8], iv: &[u8]) -> Result<usize> {
        let len = input.len();
        if len < BLOCK {
            return Err(Error::LengthMismatch {
                expected: BLOCK,
                actual: len,
            });
        }
        check_output(output, len)?;
        let mut t = self.derive_tweak(iv)?;

        let rem = len % BLOCK;
        let whole = if rem == 0 { len / BLOCK } else { len / BLOCK - 1 };
        for i in 0..whole {
            let mut block = [0u8; BLOCK];
            block.copy_from_slice(&input[i * BLOCK..(i + 1) * BLOCK]);
            self.crypt_block(&mut block, &t, true);
            output[i * BLOCK..(i + 1) * BLOCK].copy_from_slice(&block);
            gf_mul2(&mut t);
        }

        if rem != 0 {
            let mut t2 = t;
            gf_mul2(&mut t2);

            // The stolen block decrypts under the successor tweak.
            let mut b = [0u8; BLOCK];
            b.copy_from_slice(&input[whole * BLOCK..(whole + 1) * BLOCK]);
            self.crypt_block(&mut b, &t2, true);

            let mut cfull = [0u8; BLOCK];
            cfull[..rem].copy_from_slice(&input[(whole + 1) * BLOCK..]);
            cfull[rem..].copy_from_slice(&b[rem..]);
            self.crypt_block(&mut cfull, &t, true);

            output[whole * BLOCK..(whole + 1) * BLOCK].copy_from_slice(&cfull);
            output[(whole + 1) * BLOCK..len].copy_from_slice(&b[..rem]);
        }
        Ok(len)
    }
}

/// XTS mode descriptor: only the tweaked entry points are populated.
pub struct XtsMode;

impl ModeOps for XtsMode {
    fn context_size(&self, _mode: &ModeObject) -> usize {
        mem::size_of::<XtsState>()
    }

    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext> {
        let tweak_key = params
            .tweak
            .ok_or(Error::InvalidParameter("xts requires tweak-key material"))?;
        if tweak_key.len() != params.key.len() {
            return Err(Error::LengthMismatch {
                expected: params.key.len(),
                actual: tweak_key.len(),
            });
        }
        let data = block_transform(mode.family(), params.key)?;
        let tweak = block_transform(mode.family(), tweak_key)?;
        Ok(ModeContext::Xts(XtsState { data, tweak }))
    }

    fn encrypt(
        &self,
        _mode: &ModeObject,
        _ctx: &mut ModeContext,
        _input: &[u8],
        _output: &mut [u8],
    ) -> Result<usize> {
        Err(Error::UnsupportedCombination)
    }

    fn decrypt(
        &self,
        _mode: &ModeObject,
        _ctx: &mut ModeContext,
        _input: &[u8],
        _output: &mut [u8],
    ) -> Result<usize> {
        Err(Error::UnsupportedCombination)
    }

    fn encrypt_tweaked(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
        iv: &[u8],
    ) -> Result<usize> {
        ctx.as_xts_mut()?.encrypt_unit(input, output, iv)
    }

    fn decrypt_tweaked(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
        iv: &[u8],
    ) -> Result<usize> {
        ctx.as_xts_mut()?.decrypt_unit(input, output, iv)
    }
}
