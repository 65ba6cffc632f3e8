//! Keystream-shaped modes: CFB, CFB8, CTR, OFB and the raw stream slot.
//!
//! All five accept arbitrary input lengths and keep their position across
//! calls, so callers can feed data in any chunking they like.

use std::mem;

use symbridge_prim::{block_transform, stream_transform, BlockTransform, StreamTransform};

use crate::context::{check_iv, check_output, ModeContext};
use crate::error::{Error, Result};
use crate::mode::{ModeObject, ModeOps, SetupParams};

/// CFB state: feedback register, current keystream block and position.
pub struct CfbState {
    prim: Box<dyn BlockTransform>,
    reg: Vec<u8>,
    ks: Vec<u8>,
    pos: usize,
}

/// CFB8 state: one feedback register shifted a byte at a time.
pub struct Cfb8State {
    prim: Box<dyn BlockTransform>,
    reg: Vec<u8>,
}

/// CTR state: big-endian counter block, keystream block and position.
pub struct CtrState {
    prim: Box<dyn BlockTransform>,
    counter: Vec<u8>,
    ks: Vec<u8>,
    pos: usize,
}

/// OFB state: the register is both feedback and keystream.
pub struct OfbState {
    prim: Box<dyn BlockTransform>,
    reg: Vec<u8>,
    pos: usize,
}

/// Raw stream-cipher state.
pub struct StreamState {
    prim: Box<dyn StreamTransform>,
}

fn increment_be(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        let (next, carry) = byte.overflowing_add(1);
        *byte = next;
        if !carry {
            break;
        }
    }
}

/// CFB with full-block feedback segments.
pub struct CfbMode;

impl CfbState {
    fn crypt(&mut self, input: &[u8], output: &mut [u8], decrypt: bool) {
        let bs = self.reg.len();
        for (i, &byte) in input.iter().enumerate() {
            if self.pos == bs {
                self.ks.copy_from_slice(&self.reg);
                self.prim.encrypt_block(&mut self.ks);
                self.pos = 0;
            }
            let out = byte ^ self.ks[self.pos];
            // The register always tracks ciphertext bytes.
            self.reg[self.pos] = if decrypt { byte } else { out };
            output[i] = out;
            self.pos += 1;
        }
    }
}

impl ModeOps for CfbMode {
    fn context_size(&self, _mode: &ModeObject) -> usize {
        mem::size_of::<CfbState>()
    }

    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext> {
        let bs = mode.block_size();
        let iv = check_iv(params.iv, bs)?;
        let prim = block_transform(mode.family(), params.key)?;
        Ok(ModeContext::Cfb(CfbState {
            prim,
            reg: iv.to_vec(),
            ks: vec![0u8; bs],
            pos: bs,
        }))
    }

    fn encrypt(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = match ctx {
            ModeContext::Cfb(state) => state,
            _ => return Err(Error::InvalidParameter("context is not a CFB context")),
        };
        check_output(output, input.len())?;
        state.crypt(input, output, false);
        Ok(input.len())
    }

    fn decrypt(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = match ctx {
            ModeContext::Cfb(state) => state,
            _ => return Err(Error::InvalidParameter("context is not a CFB context")),
        };
        check_output(output, input.len())?;
        state.crypt(input, output, true);
        Ok(input.len())
    }
}

/// CFB with 8-bit feedback segments; one block encryption per byte.
pub struct Cfb8Mode;

impl Cfb8State {
    fn crypt(&mut self, input: &[u8], output: &mut [u8], decrypt: bool) {
        let bs = self.reg.len();
        let mut ks = vec![0u8; bs];
        for (i, &byte) in input.iter().enumerate() {
            ks.copy_from_slice(&self.reg);
            self.prim.encrypt_block(&mut ks);
            let out = byte ^ ks[0];
            self.reg.rotate_left(1);
            self.reg[bs - 1] = if decrypt { byte } else { out };
            output[i] = out;
        }
    }
}

impl ModeOps for Cfb8Mode {
    fn context_size(&self, _mode: &ModeObject) -> usize {
        mem::size_of::<Cfb8State>()
    }

    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext> {
        let iv = check_iv(params.iv, mode.block_size())?;
        let prim = block_transform(mode.family(), params.key)?;
        Ok(ModeContext::Cfb8(Cfb8State {
            prim,
            reg: iv.to_vec(),
        }))
    }

    fn encrypt(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = match ctx {
            ModeContext::Cfb8(state) => state,
            _ => return Err(Error::InvalidParameter("context is not a CFB8 context")),
        };
        check_output(output, input.len())?;
        state.crypt(input, output, false);
        Ok(input.len())
    }

    fn decrypt(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = match ctx {
            ModeContext::Cfb8(state) => state,
            _ => return Err(Error::InvalidParameter("context is not a CFB8 context")),
        };
        check_output(output, input.len())?;
        state.crypt(input, output, true);
        Ok(input.len())
    }
}

/// Counter mode; encrypt and decrypt are the same keystream XOR.
pub struct CtrMode;

impl CtrState {
    fn crypt(&mut self, input: &[u8], output: &mut [u8]) {
        let bs = self.counter.len();
        for (i, &byte) in input.iter().enumerate() {
            if self.pos == bs {
                self.ks.copy_from_slice(&self.counter);
                self.prim.encrypt_block(&mut self.ks);
                increment_be(&mut self.counter);
                self.pos = 0;
            }
            output[i] = byte ^ self.ks[self.pos];
            self.pos += 1;
        }
    }
}

impl ModeOps for CtrMode {
    fn context_size(&self, _mode: &ModeObject) -> usize {
        mem::size_of::<CtrState>()
    }

    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext> {
        let bs = mode.block_size();
        let iv = check_iv(params.iv, bs)?;
        let prim = block_transform(mode.family(), params.key)?;
        Ok(ModeContext::Ctr(CtrState {
            prim,
            counter: iv.to_vec(),
            ks: vec![0u8; bs],
            pos: bs,
        }))
    }

    fn encrypt(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = match ctx {
            ModeContext::Ctr(state) => state,
            _ => return Err(Error::InvalidParameter("context is not a CTR context")),
        };
        check_output(output, input.len())?;
        state.crypt(input, output);
        Ok(input.len())
    }

    fn decrypt(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        self.encrypt(mode, ctx, input, output)
    }
}

/// Output feedback mode; symmetric keystream XOR.
pub struct OfbMode;

impl OfbState {
    fn crypt(&mut self, input: &[u8], output: &mut [u8]) {
        let bs = self.reg.len();
        for (i, &byte) in input.iter().enumerate() {
            if self.pos == bs {
                self.prim.encrypt_block(&mut self.reg);
                self.pos = 0;
            }
            output[i] = byte ^ self.reg[self.pos];
            self.pos += 1;
        }
    }
}

impl ModeOps for OfbMode {
    fn context_size(&self, _mode: &ModeObject) -> usize {
        mem::size_of::<OfbState>()
    }

    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext> {
        let bs = mode.block_size();
        let iv = check_iv(params.iv, bs)?;
        let prim = block_transform(mode.family(), params.key)?;
        Ok(ModeContext::Ofb(OfbState {
            prim,
            reg: iv.to_vec(),
            pos: bs,
        }))
    }

    fn encrypt(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = match ctx {
            ModeContext::Ofb(state) => state,
            _ => return Err(Error::InvalidParameter("context is not an OFB context")),
        };
        check_output(output, input.len())?;
        state.crypt(input, output);
        Ok(input.len())
    }

    fn decrypt(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        self.encrypt(mode, ctx, input, output)
    }
}

/// Dedicated slot for raw stream ciphers (RC4); no IV, unit block size.
pub struct StreamMode;

impl ModeOps for StreamMode {
    fn context_size(&self, _mode: &ModeObject) -> usize {
        mem::size_of::<StreamState>()
    }

    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext> {
        let prim = stream_transform(mode.family(), params.key)?;
        Ok(ModeContext::Stream(StreamState { prim }))
    }

    fn encrypt(
        &self,
        _mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let state = match ctx {
            ModeContext::Stream(state) => state,
            _ => return Err(Error::InvalidParameter("context is not a stream context")),
        };
        check_output(output, input.len())?;
        output[..input.len()].copy_from_slice(input);
        state.prim.crypt(&mut output[..input.len()]);
        Ok(input.len())
    }

    fn decrypt(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        self.encrypt(mode, ctx, input, output)
    }
}
