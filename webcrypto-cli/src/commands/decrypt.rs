use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use webcrypto::{Algorithm, KeyType, KeyUsage, SubtleCrypto};

use super::{import_key_file, read_input, write_output};

/**
    Decrypt an RSAES-PKCS1-v1_5 ciphertext with a private key.
*/
#[derive(Args)]
pub struct DecryptCommand {
    /// Private key file (PKCS#8 DER or JWK).
    #[arg(short, long)]
    key: PathBuf,

    /// Ciphertext file.
    input: PathBuf,

    /// Write the plaintext to this file instead of printing hex.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl DecryptCommand {
    pub async fn run(self, subtle: &SubtleCrypto) -> Result<()> {
        let params = Algorithm::new("RSAES-PKCS1-v1_5");
        let key = import_key_file(subtle, &self.key, &params, KeyType::Private, KeyUsage::Decrypt)
            .await?;
        let ciphertext = read_input(&self.input)?;

        let plaintext = subtle
            .decrypt(&params, &key, &ciphertext)
            .await
            .context("failed to decrypt")?;
        write_output(self.output.as_deref(), &plaintext)
    }
}
