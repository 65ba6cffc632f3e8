//! Mode descriptor table and the uniform mode operation contract.

use symbridge_prim::CipherFamily;

use crate::block_modes::{CbcMode, EcbMode};
use crate::context::ModeContext;
use crate::error::{Error, Result};
use crate::gcm::GcmMode;
use crate::stream_modes::{Cfb8Mode, CfbMode, CtrMode, OfbMode, StreamMode};
use crate::xts::XtsMode;

/// Direction of a cryptographic session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

/// Chaining construction selector.
///
/// `Stream` is the dedicated slot for raw stream ciphers (RC4) rather than
/// overloading OFB for them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeKind {
    /// Electronic codebook.
    Ecb,
    /// Cipher block chaining.
    Cbc,
    /// Cipher feedback, full-block segments.
    Cfb,
    /// Cipher feedback, 8-bit segments.
    Cfb8,
    /// Counter mode.
    Ctr,
    /// Output feedback.
    Ofb,
    /// XEX with ciphertext stealing, tweak per logical unit.
    Xts,
    /// Galois/counter mode (payload path; tag retrieval sits on the session).
    Gcm,
    /// Raw stream cipher keystream.
    Stream,
}

/// Keying material handed to [`ModeOps::setup`].
#[derive(Clone, Copy, Debug)]
pub struct SetupParams<'a> {
    /// Cipher key.
    pub key: &'a [u8],
    /// Initialization vector; required by the IV-bearing modes, exactly one
    /// block long. GCM accepts it here or later via `set_iv`.
    pub iv: Option<&'a [u8]>,
    /// Tweak-key material; XTS only, same length as `key`.
    pub tweak: Option<&'a [u8]>,
}

/// A resolved (cipher family, mode kind) pair from the descriptor table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeObject {
    family: CipherFamily,
    kind: ModeKind,
}

impl ModeObject {
    /// Cipher family of this mode object.
    pub fn family(&self) -> CipherFamily {
        self.family
    }

    /// Mode kind of this mode object.
    pub fn kind(&self) -> ModeKind {
        self.kind
    }

    /// Natural block size in bytes (1 for the stream slot).
    pub fn block_size(&self) -> usize {
        match self.kind {
            ModeKind::Stream => 1,
            _ => self.family.block_size(),
        }
    }

    /// Bytes of per-session context state this mode materializes at setup.
    pub fn context_size(&self) -> usize {
        self.ops().context_size(self)
    }

    /// Operation descriptor for this mode kind.
    pub fn ops(&self) -> &'static dyn ModeOps {
        ops_for(self.kind)
    }
}

/// Uniform per-mode operation contract.
///
/// One implementation exists per [`ModeKind`]; operations a mode does not
/// define fall through to the `UnsupportedCombination` defaults rather than
/// silently misbehaving.
pub trait ModeOps: Sync {
    /// Byte size of the context variant `setup` will materialize.
    fn context_size(&self, mode: &ModeObject) -> usize;

    /// Natural block size for this mode.
    fn block_size(&self, mode: &ModeObject) -> usize {
        mode.block_size()
    }

    /// Materializes a fresh per-session context from key/IV/tweak material.
    fn setup(&self, mode: &ModeObject, params: &SetupParams<'_>) -> Result<ModeContext>;

    /// Encrypts `input` into `output`, returning bytes written.
    fn encrypt(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize>;

    /// Decrypts `input` into `output`, returning bytes written.
    fn decrypt(
        &self,
        mode: &ModeObject,
        ctx: &mut ModeContext,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize>;

    /// Encrypts one logical unit under the tweak derived from `iv` (XTS).
    fn encrypt_tweaked(
        &self,
        _mode: &ModeObject,
        _ctx: &mut ModeContext,
        _input: &[u8],
        _output: &mut [u8],
        _iv: &[u8],
    ) -> Result<usize> {
        Err(Error::UnsupportedCombination)
    }

    /// Decrypts one logical unit under the tweak derived from `iv` (XTS).
    fn decrypt_tweaked(
        &self,
        _mode: &ModeObject,
        _ctx: &mut ModeContext,
        _input: &[u8],
        _output: &mut [u8],
        _iv: &[u8],
    ) -> Result<usize> {
        Err(Error::UnsupportedCombination)
    }

    /// Replaces the running IV (CBC) or injects the nonce (GCM).
    fn set_iv(&self, _mode: &ModeObject, _ctx: &mut ModeContext, _iv: &[u8]) -> Result<()> {
        Err(Error::UnsupportedCombination)
    }

    /// Copies the running IV out (CBC only), returning bytes written.
    fn get_iv(&self, _mode: &ModeObject, _ctx: &mut ModeContext, _out: &mut [u8]) -> Result<usize> {
        Err(Error::UnsupportedCombination)
    }

    /// Optional teardown hook; a no-op for every in-scope mode.
    fn done(&self, _ctx: &mut ModeContext) -> Result<()> {
        Ok(())
    }
}

static ECB: EcbMode = EcbMode;
static CBC: CbcMode = CbcMode;
static CFB: CfbMode = CfbMode;
static CFB8: Cfb8Mode = Cfb8Mode;
static CTR: CtrMode = CtrMode;
static OFB: OfbMode = OfbMode;
static XTS: XtsMode = XtsMode;
static GCM: GcmMode = GcmMode;
static STREAM: StreamMode = StreamMode;

fn ops_for(kind: ModeKind) -> &'static dyn ModeOps {
    match kind {
        ModeKind::Ecb => &ECB,
        ModeKind::Cbc => &CBC,
        ModeKind::Cfb => &CFB,
        ModeKind::Cfb8 => &CFB8,
        ModeKind::Ctr => &CTR,
        ModeKind::Ofb => &OFB,
        ModeKind::Xts => &XTS,
        ModeKind::Gcm => &GCM,
        ModeKind::Stream => &STREAM,
    }
}

const MODE_SLOTS: usize = 9;

fn slot(kind: ModeKind) -> usize {
    match kind {
        ModeKind::Ecb => 0,
        ModeKind::Cbc => 1,
        ModeKind::Cfb => 2,
        ModeKind::Cfb8 => 3,
        ModeKind::Ctr => 4,
        ModeKind::Ofb => 5,
        ModeKind::Xts => 6,
        ModeKind::Gcm => 7,
        ModeKind::Stream => 8,
    }
}

fn row(family: CipherFamily) -> usize {
    match family {
        CipherFamily::Aes => 0,
        CipherFamily::Des => 1,
        CipherFamily::TripleDes => 2,
        CipherFamily::Cast => 3,
        CipherFamily::Rc4 => 4,
        CipherFamily::Rc2 => 5,
        CipherFamily::Blowfish => 6,
    }
}

// Population matrix, one row per cipher family in the order above. AES is the
// only family carrying XTS and GCM; RC4 carries only the stream slot.
#[rustfmt::skip]
static MODE_TABLE: [[bool; MODE_SLOTS]; 7] = [
    // ecb    cbc    cfb    cfb8   ctr    ofb    xts    gcm    stream
    [  true,  true,  true,  true,  true,  true,  true,  true,  false ], // AES
    [  true,  true,  true,  true,  true,  true,  false, false, false ], // DES
    [  true,  true,  true,  true,  true,  true,  false, false, false ], // 3DES
    [  true,  true,  true,  true,  true,  true,  false, false, false ], // CAST
    [  false, false, false, false, false, false, false, false, true  ], // RC4
    [  true,  true,  true,  true,  true,  true,  false, false, false ], // RC2
    [  true,  true,  true,  true,  true,  true,  false, false, false ], // Blowfish
];

/// Resolves (family, direction, kind) against the descriptor table.
///
/// Every populated combination serves both directions; the direction argument
/// participates in the lookup contract so callers treat an unpopulated cell
/// exactly like an invalid parameter, never as a panic.
pub fn lookup(family: CipherFamily, _direction: Direction, kind: ModeKind) -> Result<ModeObject> {
    if MODE_TABLE[row(family)][slot(kind)] {
        Ok(ModeObject { family, kind })
    } else {
        Err(Error::UnsupportedCombination)
    }
}
