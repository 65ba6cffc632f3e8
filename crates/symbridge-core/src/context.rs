//! Tagged per-session mode context.

use crate::block_modes::{CbcState, EcbState};
use crate::error::{Error, Result};
use crate::gcm::GcmState;
use crate::stream_modes::{Cfb8State, CfbState, CtrState, OfbState, StreamState};
use crate::xts::XtsState;

/// Per-session cryptographic state, one live variant per session.
///
/// The variant is fixed at `setup` and owned exclusively by its session;
/// handing a context of the wrong variant to a mode operation is reported as
/// an invalid parameter, never interpreted.
pub enum ModeContext {
    /// ECB: keyed transform only.
    Ecb(EcbState),
    /// CBC: keyed transform plus running IV.
    Cbc(CbcState),
    /// CFB full-block feedback state.
    Cfb(CfbState),
    /// CFB 8-bit feedback state.
    Cfb8(Cfb8State),
    /// CTR counter/keystream state.
    Ctr(CtrState),
    /// OFB keystream state.
    Ofb(OfbState),
    /// XTS dual-key state.
    Xts(XtsState),
    /// GCM counter, GHASH and tag state.
    Gcm(GcmState),
    /// Raw stream cipher state.
    Stream(StreamState),
}

impl ModeContext {
    pub(crate) fn as_cbc_mut(&mut self) -> Result<&mut CbcState> {
        match self {
            ModeContext::Cbc(state) => Ok(state),
            _ => Err(Error::InvalidParameter("context is not a CBC context")),
        }
    }

    pub(crate) fn as_gcm_mut(&mut self) -> Result<&mut GcmState> {
        match self {
            ModeContext::Gcm(state) => Ok(state),
            _ => Err(Error::InvalidParameter("context is not a GCM context")),
        }
    }

    pub(crate) fn as_xts_mut(&mut self) -> Result<&mut XtsState> {
        match self {
            ModeContext::Xts(state) => Ok(state),
            _ => Err(Error::InvalidParameter("context is not an XTS context")),
        }
    }
}

/// XORs `src` into `dst` byte-wise; the slices must be the same length.
pub(crate) fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d ^= *s;
    }
}

/// Checks that an input length is an exact multiple of the block size.
pub(crate) fn check_block_multiple(len: usize, block_size: usize) -> Result<()> {
    if len % block_size != 0 {
        return Err(Error::LengthMismatch {
            expected: len - len % block_size + block_size,
            actual: len,
        });
    }
    Ok(())
}

/// Checks that `output` can hold `needed` bytes.
pub(crate) fn check_output(output: &[u8], needed: usize) -> Result<()> {
    if output.len() < needed {
        return Err(Error::LengthMismatch {
            expected: needed,
            actual: output.len(),
        });
    }
    Ok(())
}

/// Checks that the supplied IV is exactly one block long.
pub(crate) fn check_iv(iv: Option<&[u8]>, block_size: usize) -> Result<&[u8]> {
    let iv = iv.ok_or(Error::InvalidParameter("mode requires an IV"))?;
    if iv.len() != block_size {
        return Err(Error::LengthMismatch {
            expected: block_size,
            actual: iv.len(),
        });
    }
    Ok(iv)
}
