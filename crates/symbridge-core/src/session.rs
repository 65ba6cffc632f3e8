//! One-shot-per-direction streaming session.
//!
//! A [`Session`] binds a populated cipher/mode slot, its live context and a
//! padding descriptor behind a plain update/finish surface. Input may arrive
//! in arbitrary fragments; the session withholds the padding scheme's
//! reserve so finalization always sees the bytes it needs.

use crate::context::ModeContext;
use crate::error::{Error, Result};
use crate::mode::{lookup, Direction, ModeKind, ModeObject, SetupParams};
use crate::padding::{padding_ops, PaddingKind, PaddingOps};
use symbridge_prim::CipherFamily;

/// Streaming encryption or decryption session.
pub struct Session {
    mode: ModeObject,
    ctx: ModeContext,
    padding: &'static dyn PaddingOps,
    direction: Direction,
    residual: Vec<u8>,
    reserve: usize,
}

impl Session {
    /// Opens a session for the given cipher/mode/padding triple.
    ///
    /// Fails with [`Error::UnsupportedCombination`] when the slot is not
    /// populated and with the setup routine's error when key or IV material
    /// is malformed.
    pub fn new(
        family: CipherFamily,
        kind: ModeKind,
        padding: PaddingKind,
        direction: Direction,
        params: &SetupParams<'_>,
    ) -> Result<Self> {
        let mode = lookup(family, direction, kind)?;
        let ctx = mode.ops().setup(&mode, params)?;
        let padding = padding_ops(padding);
        let reserve = padding.reserve(direction, &mode);
        Ok(Session {
            mode,
            ctx,
            padding,
            direction,
            residual: Vec::new(),
            reserve,
        })
    }

    /// Cipher and mode this session was opened with.
    pub fn mode(&self) -> &ModeObject {
        &self.mode
    }

    /// Bytes `finish` may produce beyond what `update` has already emitted.
    pub fn final_output_bound(&self) -> usize {
        self.residual.len() + self.padding.pad_len(self.direction, &self.mode)
    }

    /// Feeds `input` through the session, appending output to `out`.
    ///
    /// Block modes emit only whole blocks; stream-shaped modes emit byte for
    /// byte. Anything withheld is carried until the next call or `finish`.
    pub fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        self.residual.extend_from_slice(input);

        let bs = self.mode.block_size();
        let avail = self.residual.len().saturating_sub(self.reserve);
        let take = if self.block_oriented() {
            avail - avail % bs
        } else {
            avail
        };
        if take == 0 {
            return Ok(());
        }

        let start = out.len();
        out.resize(start + take, 0);
        let ops = self.mode.ops();
        let written = match self.direction {
            Direction::Encrypt => {
                ops.encrypt(&self.mode, &mut self.ctx, &self.residual[..take], &mut out[start..])?
            }
            Direction::Decrypt => {
                ops.decrypt(&self.mode, &mut self.ctx, &self.residual[..take], &mut out[start..])?
            }
        };
        out.truncate(start + written);
        self.residual.drain(..take);
        Ok(())
    }

    /// Finalizes the session, flushing the residual through the padding
    /// descriptor and appending the tail output to `out`.
    pub fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let bound = self.final_output_bound();
        let start = out.len();
        out.resize(start + bound, 0);
        let written = match self.direction {
            Direction::Encrypt => self.padding.encrypt_pad(
                &self.mode,
                &mut self.ctx,
                &self.residual,
                &mut out[start..],
            )?,
            Direction::Decrypt => self.padding.decrypt_pad(
                &self.mode,
                &mut self.ctx,
                &self.residual,
                &mut out[start..],
            )?,
        };
        out.truncate(start + written);
        self.residual.clear();
        self.mode.ops().done(&mut self.ctx)
    }

    /// Processes one tweaked data unit (XTS). `iv` selects the unit.
    pub fn crypt_tweaked(&mut self, iv: &[u8], input: &[u8], output: &mut [u8]) -> Result<usize> {
        let ops = self.mode.ops();
        match self.direction {
            Direction::Encrypt => ops.encrypt_tweaked(&self.mode, &mut self.ctx, input, output, iv),
            Direction::Decrypt => ops.decrypt_tweaked(&self.mode, &mut self.ctx, input, output, iv),
        }
    }

    /// Replaces the running IV or injects a nonce, where the mode allows it.
    pub fn set_iv(&mut self, iv: &[u8]) -> Result<()> {
        self.mode.ops().set_iv(&self.mode, &mut self.ctx, iv)
    }

    /// Copies the running IV into `out`, returning bytes written.
    pub fn get_iv(&mut self, out: &mut [u8]) -> Result<usize> {
        self.mode.ops().get_iv(&self.mode, &mut self.ctx, out)
    }

    /// Authentication tag over everything processed so far (GCM only).
    pub fn auth_tag(&self) -> Result<[u8; 16]> {
        match &self.ctx {
            ModeContext::Gcm(state) => state.tag(),
            _ => Err(Error::UnsupportedCombination),
        }
    }

    fn block_oriented(&self) -> bool {
        matches!(self.mode.kind(), ModeKind::Ecb | ModeKind::Cbc | ModeKind::Xts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(
        family: CipherFamily,
        kind: ModeKind,
        padding: PaddingKind,
        direction: Direction,
        key: &[u8],
        iv: Option<&[u8]>,
    ) -> Session {
        let params = SetupParams {
            key,
            iv,
            tweak: None,
        };
        Session::new(family, kind, padding, direction, &params).unwrap()
    }

    fn roundtrip(
        family: CipherFamily,
        kind: ModeKind,
        padding: PaddingKind,
        key: &[u8],
        iv: Option<&[u8]>,
        pt: &[u8],
    ) -> Vec<u8> {
        let mut enc = open(family, kind, padding, Direction::Encrypt, key, iv);
        let mut ct = Vec::new();
        // Feed in ragged 5-byte fragments to exercise the residual buffer.
        for chunk in pt.chunks(5) {
            enc.update(chunk, &mut ct).unwrap();
        }
        enc.finish(&mut ct).unwrap();

        let mut dec = open(family, kind, padding, Direction::Decrypt, key, iv);
        let mut back = Vec::new();
        for chunk in ct.chunks(7) {
            dec.update(chunk, &mut back).unwrap();
        }
        dec.finish(&mut back).unwrap();
        assert_eq!(back, pt);
        ct
    }

    #[test]
    fn aes_cbc_pkcs7_worked_example() {
        let ct = roundtrip(
            CipherFamily::Aes,
            ModeKind::Cbc,
            PaddingKind::Pkcs7,
            &[0u8; 16],
            Some(&[0u8; 16]),
            b"1234567890123456",
        );
        // One aligned block plus a full pad block.
        assert_eq!(ct.len(), 32);
    }

    #[test]
    fn corrupted_ciphertext_is_bad_padding() {
        let mut ct = roundtrip(
            CipherFamily::Aes,
            ModeKind::Cbc,
            PaddingKind::Pkcs7,
            &[0u8; 16],
            Some(&[0u8; 16]),
            b"attack at dawn",
        );
        *ct.last_mut().unwrap() ^= 0x80;
        let mut dec = open(
            CipherFamily::Aes,
            ModeKind::Cbc,
            PaddingKind::Pkcs7,
            Direction::Decrypt,
            &[0u8; 16],
            Some(&[0u8; 16]),
        );
        let mut out = Vec::new();
        dec.update(&ct, &mut out).unwrap();
        assert_eq!(dec.finish(&mut out), Err(Error::BadPadding));
    }

    #[test]
    fn cross_family_cbc_roundtrips() {
        let pt = b"the quick brown fox jumps over the lazy dog";
        roundtrip(
            CipherFamily::Des,
            ModeKind::Cbc,
            PaddingKind::Pkcs7,
            &[0x13u8; 8],
            Some(&[0u8; 8]),
            pt,
        );
        roundtrip(
            CipherFamily::TripleDes,
            ModeKind::Cbc,
            PaddingKind::Pkcs7,
            &[0x24u8; 24],
            Some(&[1u8; 8]),
            pt,
        );
        roundtrip(
            CipherFamily::Cast,
            ModeKind::Cbc,
            PaddingKind::Pkcs7,
            &[0x35u8; 16],
            Some(&[2u8; 8]),
            pt,
        );
        roundtrip(
            CipherFamily::Rc2,
            ModeKind::Ecb,
            PaddingKind::Pkcs7Ecb,
            &[0x46u8; 16],
            None,
            pt,
        );
        roundtrip(
            CipherFamily::Blowfish,
            ModeKind::Cfb,
            PaddingKind::NoPad,
            &[0x57u8; 16],
            Some(&[3u8; 8]),
            pt,
        );
        roundtrip(
            CipherFamily::Rc4,
            ModeKind::Stream,
            PaddingKind::NoPad,
            &[0x68u8; 16],
            None,
            pt,
        );
    }

    #[test]
    fn cts_sessions_preserve_length() {
        for kind in [PaddingKind::Cts1, PaddingKind::Cts2, PaddingKind::Cts3] {
            for len in [16usize, 17, 31, 32, 33, 57, 100] {
                let pt: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
                let ct = roundtrip(
                    CipherFamily::Aes,
                    ModeKind::Cbc,
                    kind,
                    &[0xabu8; 16],
                    Some(&[0xcdu8; 16]),
                    &pt,
                );
                assert_eq!(ct.len(), len, "{:?} len {}", kind, len);
            }
        }
    }

    #[test]
    fn no_pad_rejects_trailing_partial_block() {
        let mut enc = open(
            CipherFamily::Aes,
            ModeKind::Cbc,
            PaddingKind::NoPad,
            Direction::Encrypt,
            &[0u8; 16],
            Some(&[0u8; 16]),
        );
        let mut out = Vec::new();
        enc.update(&[0u8; 20], &mut out).unwrap();
        assert_eq!(out.len(), 16, "only the whole block is released");
        assert!(matches!(
            enc.finish(&mut out),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn unsupported_slot_rejected_at_open() {
        let params = SetupParams {
            key: &[0u8; 16],
            iv: None,
            tweak: None,
        };
        assert_eq!(
            Session::new(
                CipherFamily::Rc4,
                ModeKind::Cbc,
                PaddingKind::NoPad,
                Direction::Encrypt,
                &params,
            )
            .err(),
            Some(Error::UnsupportedCombination)
        );
    }

    #[test]
    fn gcm_session_exposes_tag() {
        // NIST GCM test case 2: zero key, zero 96-bit IV, one zero block.
        let mut enc = open(
            CipherFamily::Aes,
            ModeKind::Gcm,
            PaddingKind::NoPad,
            Direction::Encrypt,
            &[0u8; 16],
            Some(&[0u8; 12]),
        );
        let mut ct = Vec::new();
        enc.update(&[0u8; 16], &mut ct).unwrap();
        enc.finish(&mut ct).unwrap();
        assert_eq!(hex::encode(&ct), "0388dace60b6a392f328c2b971b2fe78");
        assert_eq!(
            hex::encode(enc.auth_tag().unwrap()),
            "ab6e47d42cec13bdf53a67b21257bdff"
        );
    }

    #[test]
    fn cbc_iv_surface_via_session() {
        let mut enc = open(
            CipherFamily::Aes,
            ModeKind::Cbc,
            PaddingKind::NoPad,
            Direction::Encrypt,
            &[0u8; 16],
            Some(&[0u8; 16]),
        );
        let mut iv = [0u8; 16];
        assert_eq!(enc.get_iv(&mut iv).unwrap(), 16);
        enc.set_iv(&[9u8; 16]).unwrap();
        enc.get_iv(&mut iv).unwrap();
        assert_eq!(iv, [9u8; 16]);
    }

    #[test]
    fn xts_session_crypt_tweaked() {
        // XTS carries both halves of the key material in `key` + `tweak`.
        let params = SetupParams {
            key: &[0x11u8; 16],
            iv: None,
            tweak: Some(&[0x22u8; 16]),
        };
        let mut enc = Session::new(
            CipherFamily::Aes,
            ModeKind::Xts,
            PaddingKind::NoPad,
            Direction::Encrypt,
            &params,
        )
        .unwrap();
        let mut dec = Session::new(
            CipherFamily::Aes,
            ModeKind::Xts,
            PaddingKind::NoPad,
            Direction::Decrypt,
            &params,
        )
        .unwrap();

        let unit = [0u8; 16];
        let pt: Vec<u8> = (0..40u8).collect();
        let mut ct = vec![0u8; 40];
        enc.crypt_tweaked(&unit, &pt, &mut ct).unwrap();
        assert_ne!(&ct[..], &pt[..]);
        let mut back = vec![0u8; 40];
        dec.crypt_tweaked(&unit, &ct, &mut back).unwrap();
        assert_eq!(back, pt);
    }
}
