//! Command-line interface for `symbridge`.

#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::RngCore;
use symbridge_core::{
    derive_key, CipherFamily, Direction, KdfAlgorithm, ModeKind, PaddingKind, Prf, Session,
    SetupParams,
};

/// Symmetric cipher mode / key derivation CLI.
#[derive(Parser)]
#[command(
    name = "symbridge",
    version,
    author,
    about = "Symmetric cipher modes, padding and PBKDF2 key derivation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FamilyArg {
    Aes,
    Des,
    #[value(name = "3des")]
    TripleDes,
    Cast,
    Rc2,
    Blowfish,
    Rc4,
}

impl From<FamilyArg> for CipherFamily {
    fn from(value: FamilyArg) -> Self {
        match value {
            FamilyArg::Aes => CipherFamily::Aes,
            FamilyArg::Des => CipherFamily::Des,
            FamilyArg::TripleDes => CipherFamily::TripleDes,
            FamilyArg::Cast => CipherFamily::Cast,
            FamilyArg::Rc2 => CipherFamily::Rc2,
            FamilyArg::Blowfish => CipherFamily::Blowfish,
            FamilyArg::Rc4 => CipherFamily::Rc4,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Ecb,
    Cbc,
    Cfb,
    Cfb8,
    Ctr,
    Ofb,
    Xts,
    Gcm,
    Stream,
}

impl From<ModeArg> for ModeKind {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Ecb => ModeKind::Ecb,
            ModeArg::Cbc => ModeKind::Cbc,
            ModeArg::Cfb => ModeKind::Cfb,
            ModeArg::Cfb8 => ModeKind::Cfb8,
            ModeArg::Ctr => ModeKind::Ctr,
            ModeArg::Ofb => ModeKind::Ofb,
            ModeArg::Xts => ModeKind::Xts,
            ModeArg::Gcm => ModeKind::Gcm,
            ModeArg::Stream => ModeKind::Stream,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PaddingArg {
    Pkcs7,
    #[value(name = "pkcs7-ecb")]
    Pkcs7Ecb,
    Cts1,
    Cts2,
    Cts3,
    None,
}

impl From<PaddingArg> for PaddingKind {
    fn from(value: PaddingArg) -> Self {
        match value {
            PaddingArg::Pkcs7 => PaddingKind::Pkcs7,
            PaddingArg::Pkcs7Ecb => PaddingKind::Pkcs7Ecb,
            PaddingArg::Cts1 => PaddingKind::Cts1,
            PaddingArg::Cts2 => PaddingKind::Cts2,
            PaddingArg::Cts3 => PaddingKind::Cts3,
            PaddingArg::None => PaddingKind::NoPad,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PrfArg {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl From<PrfArg> for Prf {
    fn from(value: PrfArg) -> Self {
        match value {
            PrfArg::Sha1 => Prf::HmacSha1,
            PrfArg::Sha224 => Prf::HmacSha224,
            PrfArg::Sha256 => Prf::HmacSha256,
            PrfArg::Sha384 => Prf::HmacSha384,
            PrfArg::Sha512 => Prf::HmacSha512,
        }
    }
}

#[derive(Args)]
struct CryptArgs {
    /// Cipher family.
    #[arg(long, value_enum)]
    cipher: FamilyArg,
    /// Chaining mode.
    #[arg(long, value_enum, default_value = "cbc")]
    mode: ModeArg,
    /// Padding scheme.
    #[arg(long, value_enum, default_value = "pkcs7")]
    padding: PaddingArg,
    /// Key as hex characters.
    #[arg(long, value_name = "HEX")]
    key_hex: String,
    /// IV as hex characters (IV-bearing modes).
    #[arg(long, value_name = "HEX")]
    iv_hex: Option<String>,
    /// Second key half for XTS, as hex characters.
    #[arg(long, value_name = "HEX")]
    tweak_hex: Option<String>,
    /// Input file.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    /// Output file.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file.
    Encrypt(CryptArgs),
    /// Decrypt a file.
    Decrypt(CryptArgs),
    /// Derive a key from a password with PBKDF2.
    Derive {
        /// Password (UTF-8).
        #[arg(long)]
        password: String,
        /// Salt as hex characters; a random 16-byte salt is generated and
        /// printed when omitted.
        #[arg(long, value_name = "HEX")]
        salt_hex: Option<String>,
        /// HMAC hash underlying the PRF.
        #[arg(long, value_enum, default_value = "sha256")]
        prf: PrfArg,
        /// Iteration count.
        #[arg(long, default_value_t = 10_000)]
        rounds: u32,
        /// Derived key length in bytes.
        #[arg(long, default_value_t = 32)]
        length: usize,
    },
    /// Estimate the PBKDF2 round count that takes a target time.
    Calibrate {
        /// Password length the estimate is for.
        #[arg(long, default_value_t = 10)]
        password_len: usize,
        /// Salt length the estimate is for.
        #[arg(long, default_value_t = 16)]
        salt_len: usize,
        /// HMAC hash underlying the PRF.
        #[arg(long, value_enum, default_value = "sha256")]
        prf: PrfArg,
        /// Derived key length in bytes.
        #[arg(long, default_value_t = 32)]
        length: usize,
        /// Target derivation time in milliseconds.
        #[arg(long, default_value_t = 100)]
        msec: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Encrypt(args) => cmd_crypt(&args, Direction::Encrypt),
        Commands::Decrypt(args) => cmd_crypt(&args, Direction::Decrypt),
        Commands::Derive {
            password,
            salt_hex,
            prf,
            rounds,
            length,
        } => cmd_derive(&password, salt_hex.as_deref(), prf, rounds, length),
        Commands::Calibrate {
            password_len,
            salt_len,
            prf,
            length,
            msec,
        } => cmd_calibrate(password_len, salt_len, prf, length, msec),
    }
}

fn cmd_crypt(args: &CryptArgs, direction: Direction) -> Result<()> {
    let key = hex::decode(args.key_hex.trim()).context("decode key hex")?;
    let iv = args
        .iv_hex
        .as_deref()
        .map(|h| hex::decode(h.trim()).context("decode iv hex"))
        .transpose()?;
    let tweak = args
        .tweak_hex
        .as_deref()
        .map(|h| hex::decode(h.trim()).context("decode tweak hex"))
        .transpose()?;

    let data = fs::read(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;

    let params = SetupParams {
        key: &key,
        iv: iv.as_deref(),
        tweak: tweak.as_deref(),
    };
    let mode: ModeKind = args.mode.into();
    let mut session = Session::new(
        args.cipher.into(),
        mode,
        args.padding.into(),
        direction,
        &params,
    )
    .context("open session")?;

    let out = if mode == ModeKind::Xts {
        // XTS works on one logical unit per IV; the whole file is one unit
        // under the zero tweak here.
        let unit_iv = [0u8; 16];
        let mut out = vec![0u8; data.len()];
        session
            .crypt_tweaked(&unit_iv, &data, &mut out)
            .context("process input")?;
        out
    } else {
        let mut out = Vec::with_capacity(data.len() + 16);
        session.update(&data, &mut out).context("process input")?;
        session.finish(&mut out).context("finalize")?;
        out
    };

    fs::write(&args.output, out)
        .with_context(|| format!("write {}", args.output.display()))?;

    if mode == ModeKind::Gcm {
        let tag = session.auth_tag().context("read tag")?;
        println!("tag: {}", hex::encode(tag));
    }
    Ok(())
}

fn cmd_derive(
    password: &str,
    salt_hex: Option<&str>,
    prf: PrfArg,
    rounds: u32,
    length: usize,
) -> Result<()> {
    let salt = match salt_hex {
        Some(h) => hex::decode(h.trim()).context("decode salt hex")?,
        None => {
            let mut salt = vec![0u8; 16];
            rand::rngs::OsRng.fill_bytes(&mut salt);
            println!("salt: {}", hex::encode(&salt));
            salt
        }
    };
    let mut key = vec![0u8; length];
    derive_key(
        KdfAlgorithm::Pbkdf2,
        password.as_bytes(),
        &salt,
        prf.into(),
        rounds,
        &mut key,
    )
    .context("derive key")?;
    println!("{}", hex::encode(key));
    Ok(())
}

// Fixed sampling round count for calibration runs.
const ROUNDMEASURE: u32 = 100_000;

fn cmd_calibrate(
    password_len: usize,
    salt_len: usize,
    prf: PrfArg,
    length: usize,
    msec: u64,
) -> Result<()> {
    if length == 0 {
        bail!("derived key length must be positive");
    }
    // Synthetic inputs of the advertised sizes; timing depends on lengths,
    // not content.
    let password = vec![b'a'; password_len.max(1)];
    let salt: Vec<u8> = (0..salt_len.max(1)).map(|i| (i % 256) as u8).collect();
    let mut key = vec![0u8; length];

    let start = Instant::now();
    derive_key(
        KdfAlgorithm::Pbkdf2,
        &password,
        &salt,
        prf.into(),
        ROUNDMEASURE,
        &mut key,
    )
    .context("measure derivation")?;
    let elapsed = start.elapsed().as_millis().max(1) as u64;

    let rounds = (msec * u64::from(ROUNDMEASURE) / elapsed).max(1);
    println!("{}", rounds.min(u64::from(u32::MAX)));
    Ok(())
}
