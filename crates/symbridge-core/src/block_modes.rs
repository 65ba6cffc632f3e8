//! ECB and CBC mode operation descriptors.

use std::mem;

use symbridge_prim::{block_transform, BlockTransform};

use crate::context::{check_block_multiple, check_iv, check_output, xor_in_place, ModeContext};
use crate::error::{Error, Result};
use crate::mode::{ModeObject, ModeOps, SetupParams};

/// ECB session state.
pub struct EcbState {
    pub(crate) prim: Box<dyn BlockTransform>,
}

/// CBC session state; the running IV lives next to the keyed transform.
pub struct CbcState {
    pub(crate) prim: Box<dyn BlockTransform>,
    pub(crate) iv: Vec<u8>,
}

impl CbcState {
    /// Encrypts exactly one block with chaining, advancing the running IV.
    pub(crate) fn encrypt_block_chained(&mut self, input: &[u8], output: &mut [u8]) {
        output.copy_from_slice(input);
        xor_in_place(output, &self.iv);
        self.prim.encrypt_block(output);
        self.iv.copy_from_slice(output);
    }

    /// Decrypts exactly one block with chaining, advancing the running IV.
    pub(crate) fn decrypt_block_chained(&mut self, input: &[u8], output: &mut [u8]) {
        output.copy_from_slice(input);
        self.prim.decrypt_block(output);
        xor_in_place(output, &self.iv);
        self.iv.copy_from_slice(input);
    }
}

/// ECB mode descriptor: independent block transforms, no IV surface.
pub struct EcbMode;

impl ModeOps for EcbMode {
    fn context_size(&self, _mode: &ModeObject) -> usize {
        mem::size_of::<EcbState>()
    }

    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext> {
        let prim = block_transform(mode.family(), params.key)?;
        Ok(ModeContext::Ecb(EcbState { prim }))
    }

    fn encrypt(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = match ctx {
            ModeContext::Ecb(state) => state,
            _ => return Err(Error::InvalidParameter("context is not an ECB context")),
        };
        let bs = mode.block_size();
        check_block_multiple(input.len(), bs)?;
        check_output(output, input.len())?;
        output[..input.len()].copy_from_slice(input);
        for chunk in output[..input.len()].chunks_mut(bs) {
            state.prim.encrypt_block(chunk);
        }
        Ok(input.len())
    }

    fn decrypt(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = match ctx {
            ModeContext::Ecb(state) => state,
            _ => return Err(Error::InvalidParameter("context is not an ECB context")),
        };
        let bs = mode.block_size();
        check_block_multiple(input.len(), bs)?;
        check_output(output, input.len())?;
        output[..input.len()].copy_from_slice(input);
        for chunk in output[..input.len()].chunks_mut(bs) {
            state.prim.decrypt_block(chunk);
        }
        Ok(input.len())
    }
}

/// CBC mode descriptor; the only block mode exposing the IV surface.
pub struct CbcMode;

impl ModeOps for CbcMode {
    fn context_size(&self, _mode: &ModeObject) -> usize {
        mem::size_of::<CbcState>()
    }

    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext> {
        let iv = check_iv(params.iv, mode.block_size())?;
        let prim = block_transform(mode.family(), params.key)?;
        Ok(ModeContext::Cbc(CbcState {
            prim,
            iv: iv.to_vec(),
        }))
    }

    fn encrypt(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = ctx.as_cbc_mut()?;
        let bs = mode.block_size();
        check_block_multiple(input.len(), bs)?;
        check_output(output, input.len())?;
        for (chunk_in, chunk_out) in input.chunks(bs).zip(output.chunks_mut(bs)) {
            state.encrypt_block_chained(chunk_in, chunk_out);
        }
        Ok(input.len())
    }

    fn decrypt(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = ctx.as_cbc_mut()?;
        let bs = mode.block_size();
        check_block_multiple(input.len(), bs)?;
        check_output(output, input.len())?;
        for (chunk_in, chunk_out) in input.chunks(bs).zip(output.chunks_mut(bs)) {
            state.decrypt_block_chained(chunk_in, chunk_out);
        }
        Ok(input.len())
    }

    fn set_iv(&self, mode: &ModeObject, ctx: &mut ModeContext, iv: &[u8]) -> Result<()> {
        let state = ctx.as_cbc_mut()?;
        let bs = mode.block_size();
        if iv.len() != bs {
            return Err(Error::LengthMismatch {
                expected: bs,
                actual: iv.len(),
            });
        }
        state.iv.copy_from_slice(iv);
        Ok(())
    }

    fn get_iv(&self, mode: &ModeObject, ctx: &mut ModeContext, out: &mut [u8]) -> Result<usize> {
        let state = ctx.as_cbc_mut()?;
        let bs = mode.block_size();
        if out.len() < bs {
            return Err(Error::LengthMismatch {
                expected: bs,
                actual: out.len(),
            });
        }
        out[..bs].copy_from_slice(&state.iv);
        Ok(bs)
    }
}
