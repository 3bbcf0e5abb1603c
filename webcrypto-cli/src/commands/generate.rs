use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};

use webcrypto::{AlgorithmName, CryptoKey, KeyFormat, KeyUsage, KeyUsages, SubtleCrypto};

use super::AlgorithmArgs;

#[derive(Clone, Copy, ValueEnum)]
enum Encoding {
    /// PKCS#8 private key and SPKI public key.
    Der,
    /// JSON Web Keys.
    Jwk,
}

/**
    Generate a key pair and write both halves to disk.

    DER output writes `<name>.pk8` and `<name>.spki`; JWK output writes
    `<name>.jwk` and `<name>.pub.jwk`.
*/
#[derive(Args)]
pub struct GenerateCommand {
    #[command(flatten)]
    algorithm: AlgorithmArgs,

    /// RSA modulus length in bits.
    #[arg(short, long, default_value = "2048")]
    modulus_length: usize,

    /// RSA public exponent: 3 or 65537.
    #[arg(short = 'e', long, default_value = "65537")]
    public_exponent: u32,

    /// Output encoding.
    #[arg(long, value_enum, default_value = "der")]
    encoding: Encoding,

    /// Output file name stem.
    #[arg(short, long, default_value = "key")]
    name: String,

    /// Output directory. Defaults to the current directory.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl GenerateCommand {
    pub async fn run(self, subtle: &SubtleCrypto) -> Result<()> {
        let mut params = self.algorithm.params();
        let algorithm = params.algorithm_name()?;
        let usages = match algorithm {
            AlgorithmName::RsaEsPkcs1v15 => {
                KeyUsages::from_slice(&[KeyUsage::Encrypt, KeyUsage::Decrypt])
            }
            AlgorithmName::RsaSsaPkcs1v15 | AlgorithmName::Ecdsa => {
                KeyUsages::from_slice(&[KeyUsage::Sign, KeyUsage::Verify])
            }
        };
        if algorithm != AlgorithmName::Ecdsa {
            params = params
                .with_modulus_length(self.modulus_length)
                .with_public_exponent(exponent_bytes(self.public_exponent));
        }

        let pair = subtle
            .generate_key(&params, true, usages)
            .await
            .context("failed to generate key pair")?;

        let out_dir = self.output.unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;

        let (private_format, public_format, private_ext, public_ext) = match self.encoding {
            Encoding::Der => (KeyFormat::Pkcs8, KeyFormat::Spki, "pk8", "spki"),
            Encoding::Jwk => (KeyFormat::Jwk, KeyFormat::Jwk, "jwk", "pub.jwk"),
        };
        let private_path = out_dir.join(format!("{}.{private_ext}", self.name));
        let public_path = out_dir.join(format!("{}.{public_ext}", self.name));
        if private_path.exists() || public_path.exists() {
            bail!("refusing to overwrite existing key files in {}", out_dir.display());
        }

        write_key(subtle, private_format, &pair.private_key, &private_path).await?;
        write_key(subtle, public_format, &pair.public_key, &public_path).await?;

        println!("Algorithm:    {}", pair.private_key.algorithm().name());
        println!("Private key:  {}", private_path.display());
        println!("Public key:   {}", public_path.display());

        Ok(())
    }
}

async fn write_key(
    subtle: &SubtleCrypto,
    format: KeyFormat,
    key: &CryptoKey,
    path: &Path,
) -> Result<()> {
    let data = subtle
        .export_key(format, key)
        .await
        .with_context(|| format!("failed to export {} key", key.key_type()))?;
    std::fs::write(path, data.to_bytes()?)
        .with_context(|| format!("failed to write {}", path.display()))
}

/**
    Minimal big-endian encoding: 65537 → `[1, 0, 1]`, 3 → `[3]`.
*/
fn exponent_bytes(exponent: u32) -> Vec<u8> {
    let bytes = exponent.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}
