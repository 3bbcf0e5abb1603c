use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use webcrypto::{Algorithm, KeyType, KeyUsage, SubtleCrypto};

use super::{import_key_file, read_input, write_output};

/**
    Encrypt a file with an RSAES-PKCS1-v1_5 public key.
*/
#[derive(Args)]
pub struct EncryptCommand {
    /// Public key file (SPKI DER or JWK).
    #[arg(short, long)]
    key: PathBuf,

    /// File to encrypt. At most k - 11 bytes for a k-byte modulus.
    input: PathBuf,

    /// Write the ciphertext to this file instead of printing hex.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl EncryptCommand {
    pub async fn run(self, subtle: &SubtleCrypto) -> Result<()> {
        let params = Algorithm::new("RSAES-PKCS1-v1_5");
        let key = import_key_file(subtle, &self.key, &params, KeyType::Public, KeyUsage::Encrypt)
            .await?;
        let data = read_input(&self.input)?;

        let ciphertext = subtle
            .encrypt(&params, &key, &data)
            .await
            .context("failed to encrypt")?;
        write_output(self.output.as_deref(), &ciphertext)
    }
}
