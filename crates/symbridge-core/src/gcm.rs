//! GCM payload path: 32-bit counter keystream plus GHASH accumulation.
//!
//! The descriptor carries the payload encrypt/decrypt and IV injection;
//! tag retrieval stays off the uniform surface and is reached through
//! [`crate::Session::auth_tag`].

use std::mem;

use ghash::universal_hash::{KeyInit, UniversalHash};
use ghash::GHash;
use symbridge_prim::{block_transform, BlockTransform};

use crate::context::{check_output, ModeContext};
use crate::error::{Error, Result};
use crate::mode::{ModeObject, ModeOps, SetupParams};

const BLOCK: usize = 16;

/// GCM session state.
pub struct GcmState {
    prim: Box<dyn BlockTransform>,
    h: [u8; BLOCK],
    ghash: GHash,
    buf: [u8; BLOCK],
    buf_len: usize,
    j0: [u8; BLOCK],
    counter: [u8; BLOCK],
    ks: [u8; BLOCK],
    ks_pos: usize,
    ct_len: u64,
    iv_ready: bool,
}

fn inc32(counter: &mut [u8; BLOCK]) {
    let mut word = u32::from_be_bytes([counter[12], counter[13], counter[14], counter[15]]);
    word = word.wrapping_add(1);
    counter[12..].copy_from_slice(&word.to_be_bytes());
}

impl GcmState {
    /// Injects the IV, deriving J0 and resetting the payload accumulator.
    pub(crate) fn set_iv(&mut self, iv: &[u8]) -> Result<()> {
        if iv.is_empty() {
            return Err(Error::InvalidParameter("gcm iv must not be empty"));
        }
        let mut j0 = [0u8; BLOCK];
        if iv.len() == 12 {
            j0[..12].copy_from_slice(iv);
            j0[15] = 1;
        } else {
            let mut hash = GHash::new(&self.h.into());
            hash.update_padded(iv);
            let mut len_block = [0u8; BLOCK];
            len_block[8..].copy_from_slice(&((iv.len() as u64) * 8).to_be_bytes());
            hash.update(&[len_block.into()]);
            j0 = hash.finalize().into();
        }
        self.j0 = j0;
        self.counter = j0;
        inc32(&mut self.counter);
        self.ghash = GHash::new(&self.h.into());
        self.buf_len = 0;
        self.ct_len = 0;
        self.ks_pos = BLOCK;
        self.iv_ready = true;
        Ok(())
    }

    fn keystream_byte(&mut self) -> u8 {
        if self.ks_pos == BLOCK {
            self.ks = self.counter;
            self.prim.encrypt_block(&mut self.ks);
            inc32(&mut self.counter);
            self.ks_pos = 0;
        }
        let byte = self.ks[self.ks_pos];
        self.ks_pos += 1;
        byte
    }

    fn absorb(&mut self, ciphertext_byte: u8) {
        self.buf[self.buf_len] = ciphertext_byte;
        self.buf_len += 1;
        if self.buf_len == BLOCK {
            self.ghash.update(&[self.buf.into()]);
            self.buf_len = 0;
        }
        self.ct_len += 1;
    }

    fn crypt(&mut self, input: &[u8], output: &mut [u8], decrypt: bool) -> Result<usize> {
        if !self.iv_ready {
            return Err(Error::InvalidParameter("gcm iv has not been set"));
        }
        check_output(output, input.len())?;
        for (i, &byte) in input.iter().enumerate() {
            let ks = self.keystream_byte();
            let out = byte ^ ks;
            output[i] = out;
            self.absorb(if decrypt { byte } else { out });
        }
        Ok(input.len())
    }

    /// Authentication tag over the ciphertext consumed so far.
    ///
    /// Reads a snapshot; the session may keep processing payload afterwards.
    pub fn tag(&self) -> Result<[u8; BLOCK]> {
        if !self.iv_ready {
            return Err(Error::InvalidParameter("gcm iv has not been set"));
        }
        let mut hash = self.ghash.clone();
        hash.update_padded(&self.buf[..self.buf_len]);
        let mut len_block = [0u8; BLOCK];
        // No AAD path through this bridge: the first length word stays zero.
        len_block[8..].copy_from_slice(&(self.ct_len * 8).to_be_bytes());
        hash.update(&[len_block.into()]);
        let mut tag: [u8; BLOCK] = hash.finalize().into();
        let mut e_j0 = self.j0;
        self.prim.encrypt_block(&mut e_j0);
        for (t, e) in tag.iter_mut().zip(e_j0.iter()) {
            *t ^= *e;
        }
        Ok(tag)
    }
}

/// GCM mode descriptor: payload crypt plus IV injection. Reading the IV
/// back is not meaningful here and stays unsupported.
pub struct GcmMode;

impl ModeOps for GcmMode {
    fn context_size(&self, _mode: &ModeObject) -> usize {
        mem::size_of::<GcmState>()
    }

    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext> {
        let prim = block_transform(mode.family(), params.key)?;
        let mut h = [0u8; BLOCK];
        prim.encrypt_block(&mut h);
        let mut state = GcmState {
            prim,
            h,
            ghash: GHash::new(&h.into()),
            buf: [0u8; BLOCK],
            buf_len: 0,
            j0: [0u8; BLOCK],
            counter: [0u8; BLOCK],
            ks: [0u8; BLOCK],
            ks_pos: BLOCK,
            ct_len: 0,
            iv_ready: false,
        };
        if let Some(iv) = params.iv {
            state.set_iv(iv)?;
        }
        Ok(ModeContext::Gcm(state))
    }

    fn encrypt(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        ctx.as_gcm_mut()?.crypt(input, output, false)
    }

    fn decrypt(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        ctx.as_gcm_mut()?.crypt(input, output, true)
    }

    fn set_iv(&self, _mode: &ModeObject, ctx: &mut ModeContext, iv: &[u8]) -> Result<()> {
        ctx.as_gcm_mut()?.set_iv(iv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{lookup, Direction, ModeKind};
    use symbridge_prim::CipherFamily;

    fn setup(key: &[u8], iv: Option<&[u8]>) -> (ModeObject, ModeContext) {
        let mode = lookup(CipherFamily::Aes, Direction::Encrypt, ModeKind::Gcm).unwrap();
        let params = SetupParams {
            key,
            iv,
            tweak: None,
        };
        let ctx = mode.ops().setup(&mode, &params).unwrap();
        (mode, ctx)
    }

    #[test]
    fn matches_nist_zero_vector() {
        // NIST GCM test case 2: all-zero key, 96-bit zero IV, one zero block.
        let (mode, mut ctx) = setup(&[0u8; 16], Some(&[0u8; 12]));
        let mut ct = [0u8; 16];
        mode.ops()
            .encrypt(&mode, &mut ctx, &[0u8; 16], &mut ct)
            .unwrap();
        assert_eq!(hex::encode(ct), "0388dace60b6a392f328c2b971b2fe78");
        let tag = match &ctx {
            ModeContext::Gcm(state) => state.tag().unwrap(),
            _ => unreachable!(),
        };
        assert_eq!(hex::encode(tag), "ab6e47d42cec13bdf53a67b21257bdff");
    }

    #[test]
    fn empty_payload_tag_matches_nist() {
        // NIST GCM test case 1.
        let (_, mut ctx) = setup(&[0u8; 16], Some(&[0u8; 12]));
        let tag = ctx.as_gcm_mut().unwrap().tag().unwrap();
        assert_eq!(hex::encode(tag), "58e2fccefa7e3061367f1d57a4e7455a");
    }

    #[test]
    fn roundtrip_with_odd_lengths_and_chunks() {
        let key = [0x42u8; 32];
        let iv = [7u8; 12];
        let (mode, mut enc) = setup(&key, Some(&iv));
        let (_, mut dec) = setup(&key, Some(&iv));
        let pt: Vec<u8> = (0..53u8).collect();

        let mut ct = Vec::new();
        for chunk in pt.chunks(9) {
            let mut out = vec![0u8; chunk.len()];
            mode.ops().encrypt(&mode, &mut enc, chunk, &mut out).unwrap();
            ct.extend_from_slice(&out);
        }
        let mut back = vec![0u8; ct.len()];
        mode.ops().decrypt(&mode, &mut dec, &ct, &mut back).unwrap();
        assert_eq!(back, pt);

        // Encrypt and decrypt sides agree on the tag.
        let enc_tag = enc.as_gcm_mut().unwrap().tag().unwrap();
        let dec_tag = dec.as_gcm_mut().unwrap().tag().unwrap();
        assert_eq!(enc_tag, dec_tag);
    }

    #[test]
    fn non_96_bit_iv_is_accepted() {
        let key = [1u8; 16];
        let iv = [9u8; 16];
        let (mode, mut enc) = setup(&key, Some(&iv));
        let (_, mut dec) = setup(&key, Some(&iv));
        let pt = b"sixteen byte msg";
        let mut ct = [0u8; 16];
        let mut back = [0u8; 16];
        mode.ops().encrypt(&mode, &mut enc, pt, &mut ct).unwrap();
        mode.ops().decrypt(&mode, &mut dec, &ct, &mut back).unwrap();
        assert_eq!(&back, pt);
    }

    #[test]
    fn crypt_before_iv_is_invalid() {
        let (mode, mut ctx) = setup(&[0u8; 16], None);
        let mut out = [0u8; 4];
        let err = mode
            .ops()
            .encrypt(&mode, &mut ctx, &[0u8; 4], &mut out)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn get_iv_is_unsupported() {
        let (mode, mut ctx) = setup(&[0u8; 16], Some(&[0u8; 12]));
        let mut out = [0u8; 16];
        assert_eq!(
            mode.ops().get_iv(&mode, &mut ctx, &mut out),
            Err(Error::UnsupportedCombination)
        );
    }
}
