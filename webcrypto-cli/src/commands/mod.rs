mod convert_signature;
mod decrypt;
mod encrypt;
mod generate;
mod sign;
mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use webcrypto::{
    Algorithm, CryptoKey, KeyData, KeyFormat, KeyType, KeyUsage, KeyUsages, SubtleCrypto,
};

pub use self::convert_signature::ConvertSignatureCommand;
pub use self::decrypt::DecryptCommand;
pub use self::encrypt::EncryptCommand;
pub use self::generate::GenerateCommand;
pub use self::sign::SignCommand;
pub use self::verify::VerifyCommand;

/**
    Algorithm selection shared by the key-using commands.
*/
#[derive(Args)]
pub struct AlgorithmArgs {
    /// Algorithm name: RSASSA-PKCS1-v1_5, RSAES-PKCS1-v1_5 or ECDSA.
    #[arg(short, long, default_value = "RSASSA-PKCS1-v1_5")]
    pub algorithm: String,

    /// Hash for RSASSA-PKCS1-v1_5 and ECDSA.
    #[arg(long, default_value = "SHA-256")]
    pub hash: String,

    /// Curve for ECDSA.
    #[arg(long, default_value = "P-256")]
    pub curve: String,
}

impl AlgorithmArgs {
    pub fn params(&self) -> Algorithm {
        Algorithm::new(&*self.algorithm)
            .with_hash(&*self.hash)
            .with_named_curve(&*self.curve)
    }
}

/**
    Read a key file and import it for a single usage.

    JSON content is treated as a JWK; anything else as DER, PKCS#8 for
    private keys and SPKI for public ones.
*/
pub async fn import_key_file(
    subtle: &SubtleCrypto,
    path: &Path,
    params: &Algorithm,
    key_type: KeyType,
    usage: KeyUsage,
) -> Result<CryptoKey> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read key {}", path.display()))?;
    let format = match (bytes.trim_ascii_start().first(), key_type) {
        (Some(b'{'), _) => KeyFormat::Jwk,
        (_, KeyType::Private) => KeyFormat::Pkcs8,
        _ => KeyFormat::Spki,
    };
    let key_data = KeyData::from_bytes(format, bytes).context("failed to parse key file")?;
    subtle
        .import_key(format, key_data, params, false, KeyUsages::from_slice(&[usage]))
        .await
        .with_context(|| format!("failed to import {format} key {}", path.display()))
}

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/**
    Write binary output to `path`, or print it as hex when no path is given.
*/
pub fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, data)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => println!("{}", hex::encode(data)),
    }
    Ok(())
}
