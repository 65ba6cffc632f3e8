//! Padding and ciphertext-stealing descriptors.
//!
//! Each scheme tells its caller how many already-processed bytes to hold
//! back (`reserve`), how much finalization output to budget for (`pad_len`),
//! and performs the final padded/stolen block transform. PKCS#7 runs through
//! the uniform mode descriptor; the CTS variants need raw block and IV
//! access and therefore require a CBC context.

use crate::block_modes::CbcState;
use crate::context::{xor_in_place, ModeContext};
use crate::error::{Error, Result};
use crate::mode::{Direction, ModeObject};

/// Padding scheme selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaddingKind {
    /// PKCS#7 over a CBC context.
    Pkcs7,
    /// PKCS#7 over an ECB context.
    Pkcs7Ecb,
    /// Ciphertext stealing, truncated penultimate block kept in place.
    Cts1,
    /// Ciphertext stealing, final blocks swapped only when the tail is partial.
    Cts2,
    /// Ciphertext stealing, final blocks always swapped (Kerberos flavor).
    Cts3,
    /// No padding; callers supply exact block multiples.
    NoPad,
}

/// Uniform padding/stealing contract.
pub trait PaddingOps: Sync {
    /// Processed bytes the caller must withhold before the final pad call.
    fn reserve(&self, direction: Direction, mode: &ModeObject) -> usize;

    /// Worst-case extra output produced by the final pad call.
    fn pad_len(&self, direction: Direction, mode: &ModeObject) -> usize;

    /// Finalizes an encryption stream, consuming the residual `buf`.
    fn encrypt_pad(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        buf: &[u8],
        out: &mut [u8],
    ) -> Result<usize>;

    /// Finalizes a decryption stream, consuming the residual `buf`.
    fn decrypt_pad(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        buf: &[u8],
        out: &mut [u8],
    ) -> Result<usize>;
}

static PKCS7: Pkcs7Pad = Pkcs7Pad { ecb: false };
static PKCS7_ECB: Pkcs7Pad = Pkcs7Pad { ecb: true };
static CTS1: CtsPad = CtsPad {
    variant: CtsVariant::Cs1,
};
static CTS2: CtsPad = CtsPad {
    variant: CtsVariant::Cs2,
};
static CTS3: CtsPad = CtsPad {
    variant: CtsVariant::Cs3,
};
static NO_PAD: NoPad = NoPad;

/// Resolves a padding kind to its process-wide descriptor.
pub fn padding_ops(kind: PaddingKind) -> &'static dyn PaddingOps {
    match kind {
        PaddingKind::Pkcs7 => &PKCS7,
        PaddingKind::Pkcs7Ecb => &PKCS7_ECB,
        PaddingKind::Cts1 => &CTS1,
        PaddingKind::Cts2 => &CTS2,
        PaddingKind::Cts3 => &CTS3,
        PaddingKind::NoPad => &NO_PAD,
    }
}

const MAX_BLOCK: usize = 16;

struct Pkcs7Pad {
    ecb: bool,
}

impl Pkcs7Pad {
    fn check_context(&self, ctx: &ModeContext) -> Result<()> {
        let ok = if self.ecb {
            matches!(ctx, ModeContext::Ecb(_))
        } else {
            matches!(ctx, ModeContext::Cbc(_))
        };
        if ok {
            Ok(())
        } else {
            Err(Error::UnsupportedCombination)
        }
    }
}

impl PaddingOps for Pkcs7Pad {
    fn reserve(&self, direction: Direction, mode: &ModeObject) -> usize {
        match direction {
            // Padding only appends; nothing needs to be held back.
            Direction::Encrypt => 0,
            // The last ciphertext block may be pure padding, so it cannot be
            // released as plaintext until the pad byte is known.
            Direction::Decrypt => mode.block_size(),
        }
    }

    fn pad_len(&self, _direction: Direction, mode: &ModeObject) -> usize {
        // On decrypt the true count would require decrypting the final block
        // first; one block is the conservative bound either way.
        mode.block_size()
    }

    fn encrypt_pad(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        buf: &[u8],
        out: &mut [u8],
    ) -> Result<usize> {
        self.check_context(ctx)?;
        let bs = mode.block_size();
        if buf.len() >= bs {
            return Err(Error::LengthMismatch {
                expected: bs - 1,
                actual: buf.len(),
            });
        }
        // A block-aligned stream still gains a full pad block.
        let pad = (bs - buf.len()) as u8;
        let mut block = [0u8; MAX_BLOCK];
        block[..buf.len()].copy_from_slice(buf);
        for byte in block[buf.len()..bs].iter_mut() {
            *byte = pad;
        }
        mode.ops().encrypt(mode, ctx, &block[..bs], out)
    }

    fn decrypt_pad(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        buf: &[u8],
        out: &mut [u8],
    ) -> Result<usize> {
        self.check_context(ctx)?;
        let bs = mode.block_size();
        if buf.len() != bs {
            return Err(Error::LengthMismatch {
                expected: bs,
                actual: buf.len(),
            });
        }
        let mut block = [0u8; MAX_BLOCK];
        mode.ops().decrypt(mode, ctx, buf, &mut block[..bs])?;

        // Validate the trailer in time independent of the pad length: every
        // byte of the block is visited and folded under a mask.
        let pad = block[bs - 1];
        let pad_len = pad as usize;
        let out_of_range = u8::from(pad == 0) | u8::from(pad_len > bs);
        let mut diff = 0u8;
        for (i, &byte) in block[..bs].iter().rev().enumerate() {
            let in_pad = (((i as u32).wrapping_sub(pad_len as u32)) >> 31) as u8;
            diff |= (byte ^ pad) & in_pad.wrapping_neg();
        }
        if out_of_range | u8::from(diff != 0) != 0 {
            return Err(Error::BadPadding);
        }

        let moved = bs - pad_len;
        out[..moved].copy_from_slice(&block[..moved]);
        Ok(moved)
    }
}

#[derive(Clone, Copy)]
enum CtsVariant {
    Cs1,
    Cs2,
    Cs3,
}

struct CtsPad {
    variant: CtsVariant,
}

impl CtsPad {
    /// Encrypts the final one-to-two logical blocks with stealing.
    /// `buf` holds more than one and at most two blocks here.
    fn steal_encrypt(
        &self,
        state: &mut CbcState,
        buf: &[u8],
        out: &mut [u8],
    ) -> Result<()> {
        let bs = state.iv.len();
        let d = buf.len() - bs;

        // C_{n-1} = E(P_{n-1} xor IV)
        let mut c1 = [0u8; MAX_BLOCK];
        c1[..bs].copy_from_slice(&buf[..bs]);
        xor_in_place(&mut c1[..bs], &state.iv);
        state.prim.encrypt_block(&mut c1[..bs]);

        // C_n = E(C_{n-1} xor (P_n || 0..))
        let mut c2 = [0u8; MAX_BLOCK];
        c2[..d].copy_from_slice(&buf[bs..]);
        xor_in_place(&mut c2[..bs], &c1[..bs]);
        state.prim.encrypt_block(&mut c2[..bs]);
        state.iv.copy_from_slice(&c2[..bs]);

        let swap = match self.variant {
            CtsVariant::Cs1 => false,
            CtsVariant::Cs2 => d != bs,
            CtsVariant::Cs3 => true,
        };
        if swap {
            out[..bs].copy_from_slice(&c2[..bs]);
            out[bs..bs + d].copy_from_slice(&c1[..d]);
        } else {
            out[..d].copy_from_slice(&c1[..d]);
            out[d..d + bs].copy_from_slice(&c2[..bs]);
        }
        Ok(())
    }

    /// Inverts [`Self::steal_encrypt`] for the final one-to-two blocks.
    fn steal_decrypt(
        &self,
        state: &mut CbcState,
        buf: &[u8],
        out: &mut [u8],
    ) -> Result<()> {
        let bs = state.iv.len();
        let d = buf.len() - bs;

        let swapped = match self.variant {
            CtsVariant::Cs1 => false,
            CtsVariant::Cs2 => d != bs,
            CtsVariant::Cs3 => true,
        };
        let (c_prev_part, c_last) = if swapped {
            (&buf[bs..], &buf[..bs])
        } else {
            (&buf[..d], &buf[d..])
        };

        // Z = D(C_n); the tail of Z is the tail of C_{n-1} because the
        // stolen plaintext positions were zero.
        let mut z = [0u8; MAX_BLOCK];
        z[..bs].copy_from_slice(c_last);
        state.prim.decrypt_block(&mut z[..bs]);

        let mut c_full = [0u8; MAX_BLOCK];
        c_full[..d].copy_from_slice(c_prev_part);
        c_full[d..bs].copy_from_slice(&z[d..bs]);

        // P_n = (Z xor C_{n-1}) truncated to d bytes.
        let mut p_tail = [0u8; MAX_BLOCK];
        p_tail[..bs].copy_from_slice(&z[..bs]);
        xor_in_place(&mut p_tail[..bs], &c_full[..bs]);

        // P_{n-1} = D(C_{n-1}) xor IV.
        let mut p_head = [0u8; MAX_BLOCK];
        p_head[..bs].copy_from_slice(&c_full[..bs]);
        state.prim.decrypt_block(&mut p_head[..bs]);
        xor_in_place(&mut p_head[..bs], &state.iv);
        state.iv.copy_from_slice(c_last);

        out[..bs].copy_from_slice(&p_head[..bs]);
        out[bs..bs + d].copy_from_slice(&p_tail[..d]);
        Ok(())
    }

    fn finalize(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        buf: &[u8],
        out: &mut [u8],
        decrypt: bool,
    ) -> Result<usize> {
        let bs = mode.block_size();
        if buf.len() < bs {
            return Err(Error::LengthMismatch {
                expected: bs,
                actual: buf.len(),
            });
        }
        if out.len() < buf.len() {
            return Err(Error::LengthMismatch {
                expected: buf.len(),
                actual: out.len(),
            });
        }

        // Run leading whole blocks through plain CBC until at most two
        // logical blocks remain.
        let mut offset = 0;
        while buf.len() - offset > 2 * bs {
            let state = ctx.as_cbc_mut()?;
            if decrypt {
                state.decrypt_block_chained(&buf[offset..offset + bs], &mut out[offset..offset + bs]);
            } else {
                state.encrypt_block_chained(&buf[offset..offset + bs], &mut out[offset..offset + bs]);
            }
            offset += bs;
        }

        let rest = &buf[offset..];
        let state = ctx.as_cbc_mut()?;
        if rest.len() == bs {
            // Degenerate single-block tail: stealing reduces to plain CBC.
            if decrypt {
                state.decrypt_block_chained(rest, &mut out[offset..offset + bs]);
            } else {
                state.encrypt_block_chained(rest, &mut out[offset..offset + bs]);
            }
        } else if decrypt {
            self.steal_decrypt(state, rest, &mut out[offset..])?;
        } else {
            self.steal_encrypt(state, rest, &mut out[offset..])?;
        }
        Ok(buf.len())
    }
}

impl PaddingOps for CtsPad {
    fn reserve(&self, _direction: Direction, mode: &ModeObject) -> usize {
        // Correct stealing needs visibility into the last two blocks.
        mode.block_size() * 2
    }

    fn pad_len(&self, _direction: Direction, _mode: &ModeObject) -> usize {
        0
    }

    fn encrypt_pad(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        buf: &[u8],
        out: &mut [u8],
    ) -> Result<usize> {
        self.finalize(mode, ctx, buf, out, false)
    }

    fn decrypt_pad(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        buf: &[u8],
        out: &mut [u8],
    ) -> Result<usize> {
        self.finalize(mode, ctx, buf, out, true)
    }
}

struct NoPad;

impl PaddingOps for NoPad {
    fn reserve(&self, _direction: Direction, _mode: &ModeObject) -> usize {
        0
    }

    fn pad_len(&self, _direction: Direction, _mode: &ModeObject) -> usize {
        0
    }

    fn encrypt_pad(
        &self,
        mode: &ModeObject,
        _ctx: &mut ModeContext,
        buf: &[u8],
        _out: &mut [u8],
    ) -> Result<usize> {
        if buf.is_empty() {
            Ok(0)
        } else {
            Err(Error::LengthMismatch {
                expected: mode.block_size(),
                actual: buf.len(),
            })
        }
    }

    fn decrypt_pad(
        &self,
        mode: &ModeObject,
        _ctx: &mut ModeContext,
        buf: &[u8],
        _out: &mut [u8],
    ) -> Result<usize> {
        if buf.is_empty() {
            Ok(0)
        } else {
            Err(Error::LengthMismatch {
                expected: mode.block_size(),
                actual: buf.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{lookup, Direction, ModeKind, SetupParams};
    use symbridge_prim::CipherFamily;

    fn cbc_ctx(key: &[u8], iv: &[u8]) -> (ModeObject, ModeContext) {
        let mode = lookup(CipherFamily::Aes, Direction::Encrypt, ModeKind::Cbc).unwrap();
        let params = SetupParams {
            key,
            iv: Some(iv),
            tweak: None,
        };
        let ctx = mode.ops().setup(&mode, &params).unwrap();
        (mode, ctx)
    }

    #[test]
    fn pkcs7_aligned_input_gains_full_pad_block() {
        // The worked example: zero key, zero IV, one aligned block.
        let (mode, mut enc) = cbc_ctx(&[0u8; 16], &[0u8; 16]);
        let pad = padding_ops(PaddingKind::Pkcs7);
        let pt = b"1234567890123456";

        let mut ct = vec![0u8; 32];
        let n = mode.ops().encrypt(&mode, &mut enc, pt, &mut ct[..16]).unwrap();
        assert_eq!(n, 16);
        // Residual is empty, so the pad call emits one whole block of 0x10.
        let n = pad.encrypt_pad(&mode, &mut enc, &[], &mut ct[16..]).unwrap();
        assert_eq!(n, 16);

        let (_, mut dec) = cbc_ctx(&[0u8; 16], &[0u8; 16]);
        let mut head = vec![0u8; 16];
        mode.ops().decrypt(&mode, &mut dec, &ct[..16], &mut head).unwrap();
        let mut tail = vec![0u8; 16];
        let n = pad.decrypt_pad(&mode, &mut dec, &ct[16..], &mut tail).unwrap();
        assert_eq!(n, 0, "final block must be pure padding");
        assert_eq!(&head, pt);
    }

    #[test]
    fn pkcs7_pad_value_is_bytes_missing() {
        let (mode, mut enc) = cbc_ctx(&[3u8; 16], &[5u8; 16]);
        let pad = padding_ops(PaddingKind::Pkcs7);
        let mut ct = [0u8; 16];
        pad.encrypt_pad(&mode, &mut enc, b"abc", &mut ct).unwrap();

        let (_, mut dec) = cbc_ctx(&[3u8; 16], &[5u8; 16]);
        let mut pt = [0u8; 16];
        let n = pad.decrypt_pad(&mode, &mut dec, &ct, &mut pt).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&pt[..3], b"abc");
    }

    #[test]
    fn pkcs7_rejects_malformed_trailers() {
        let (mode, mut enc) = cbc_ctx(&[1u8; 16], &[2u8; 16]);
        let pad = padding_ops(PaddingKind::Pkcs7);
        let mut ct = [0u8; 16];
        pad.encrypt_pad(&mode, &mut enc, b"hello", &mut ct).unwrap();

        // Corrupt the ciphertext; the decrypted trailer can no longer agree.
        ct[15] ^= 0x01;
        let (_, mut dec) = cbc_ctx(&[1u8; 16], &[2u8; 16]);
        let mut pt = [0u8; 16];
        assert_eq!(
            pad.decrypt_pad(&mode, &mut dec, &ct, &mut pt),
            Err(Error::BadPadding)
        );
    }

    #[test]
    fn pkcs7_zero_and_overlong_pad_bytes_are_bad_padding() {
        // Craft ciphertexts whose final decrypted byte is 0 or > block size
        // by encrypting forged "plaintext" blocks with no-pad CBC first.
        for forged_pad in [0u8, 17u8] {
            let (mode, mut enc) = cbc_ctx(&[9u8; 16], &[0u8; 16]);
            let mut block = [forged_pad; 16];
            block[0] = 0x41;
            let mut ct = [0u8; 16];
            mode.ops().encrypt(&mode, &mut enc, &block, &mut ct).unwrap();

            let (_, mut dec) = cbc_ctx(&[9u8; 16], &[0u8; 16]);
            let pad = padding_ops(PaddingKind::Pkcs7);
            let mut pt = [0u8; 16];
            assert_eq!(
                pad.decrypt_pad(&mode, &mut dec, &ct, &mut pt),
                Err(Error::BadPadding),
                "forged pad byte {}",
                forged_pad
            );
        }
    }

    #[test]
    fn pkcs7_wrong_context_is_unsupported() {
        let mode = lookup(CipherFamily::Aes, Direction::Encrypt, ModeKind::Ecb).unwrap();
        let params = SetupParams {
            key: &[0u8; 16],
            iv: None,
            tweak: None,
        };
        let mut ctx = mode.ops().setup(&mode, &params).unwrap();
        let pad = padding_ops(PaddingKind::Pkcs7);
        let mut out = [0u8; 16];
        assert_eq!(
            pad.encrypt_pad(&mode, &mut ctx, b"x", &mut out),
            Err(Error::UnsupportedCombination)
        );
        // The ECB flavor accepts the same context.
        let ecb_pad = padding_ops(PaddingKind::Pkcs7Ecb);
        assert!(ecb_pad.encrypt_pad(&mode, &mut ctx, b"x", &mut out).is_ok());
    }

    #[test]
    fn cts_roundtrip_all_variants_and_lengths() {
        for kind in [PaddingKind::Cts1, PaddingKind::Cts2, PaddingKind::Cts3] {
            let pad = padding_ops(kind);
            for len in 32..=57usize {
                let pt: Vec<u8> = (0..len as u8).map(|i| i.wrapping_mul(11)).collect();
                let (mode, mut enc) = cbc_ctx(&[6u8; 16], &[7u8; 16]);
                let mut ct = vec![0u8; len];
                let n = pad.encrypt_pad(&mode, &mut enc, &pt, &mut ct).unwrap();
                assert_eq!(n, len, "{:?} len {}: no expansion", kind, len);

                let (_, mut dec) = cbc_ctx(&[6u8; 16], &[7u8; 16]);
                let mut back = vec![0u8; len];
                let n = pad.decrypt_pad(&mode, &mut dec, &ct, &mut back).unwrap();
                assert_eq!(n, len);
                assert_eq!(back, pt, "{:?} len {}", kind, len);
            }
        }
    }

    #[test]
    fn cts3_swaps_even_when_aligned() {
        // For aligned input CS1 degenerates to plain CBC while CS3 swaps the
        // last two blocks, so the two outputs must be block-swapped images.
        let pt: Vec<u8> = (0..32u8).collect();
        let (mode, mut e1) = cbc_ctx(&[8u8; 16], &[9u8; 16]);
        let mut cs1 = vec![0u8; 32];
        padding_ops(PaddingKind::Cts1)
            .encrypt_pad(&mode, &mut e1, &pt, &mut cs1)
            .unwrap();

        let (_, mut e3) = cbc_ctx(&[8u8; 16], &[9u8; 16]);
        let mut cs3 = vec![0u8; 32];
        padding_ops(PaddingKind::Cts3)
            .encrypt_pad(&mode, &mut e3, &pt, &mut cs3)
            .unwrap();

        assert_eq!(&cs1[..16], &cs3[16..]);
        assert_eq!(&cs1[16..], &cs3[..16]);
    }

    #[test]
    fn cts2_matches_cts1_when_aligned_and_cts3_otherwise() {
        for len in [32usize, 33, 47] {
            let pt: Vec<u8> = (0..len as u8).collect();
            let mut outs = Vec::new();
            for kind in [PaddingKind::Cts1, PaddingKind::Cts2, PaddingKind::Cts3] {
                let (mode, mut enc) = cbc_ctx(&[4u8; 16], &[2u8; 16]);
                let mut ct = vec![0u8; len];
                padding_ops(kind)
                    .encrypt_pad(&mode, &mut enc, &pt, &mut ct)
                    .unwrap();
                outs.push(ct);
            }
            if len % 16 == 0 {
                assert_eq!(outs[1], outs[0], "aligned: CS2 keeps CBC order");
            } else {
                assert_eq!(outs[1], outs[2], "partial: CS2 swaps like CS3");
            }
        }
    }

    #[test]
    fn cts_needs_more_than_nothing() {
        let (mode, mut ctx) = cbc_ctx(&[0u8; 16], &[0u8; 16]);
        let pad = padding_ops(PaddingKind::Cts3);
        let mut out = [0u8; 16];
        assert!(pad.encrypt_pad(&mode, &mut ctx, &[0u8; 8], &mut out).is_err());
    }

    #[test]
    fn reserve_table() {
        let mode = lookup(CipherFamily::Aes, Direction::Encrypt, ModeKind::Cbc).unwrap();
        let pkcs7 = padding_ops(PaddingKind::Pkcs7);
        assert_eq!(pkcs7.reserve(Direction::Encrypt, &mode), 0);
        assert_eq!(pkcs7.reserve(Direction::Decrypt, &mode), 16);
        let cts = padding_ops(PaddingKind::Cts2);
        assert_eq!(cts.reserve(Direction::Encrypt, &mode), 32);
        assert_eq!(cts.reserve(Direction::Decrypt, &mode), 32);
        let nopad = padding_ops(PaddingKind::NoPad);
        assert_eq!(nopad.reserve(Direction::Encrypt, &mode), 0);
        assert_eq!(nopad.pad_len(Direction::Decrypt, &mode), 0);
    }
}
