use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use webcrypto::{KeyType, KeyUsage, SubtleCrypto};

use super::{AlgorithmArgs, import_key_file, read_input};

/**
    Verify a signature over a file with a public key.

    Exits with an error when the signature does not verify.
*/
#[derive(Args)]
pub struct VerifyCommand {
    #[command(flatten)]
    algorithm: AlgorithmArgs,

    /// Public key file (SPKI DER or JWK).
    #[arg(short, long)]
    key: PathBuf,

    /// Hex-encoded signature.
    #[arg(short, long)]
    signature: String,

    /// Signed file.
    input: PathBuf,
}

impl VerifyCommand {
    pub async fn run(self, subtle: &SubtleCrypto) -> Result<()> {
        let params = self.algorithm.params();
        let key = import_key_file(subtle, &self.key, &params, KeyType::Public, KeyUsage::Verify)
            .await?;
        let signature = hex::decode(self.signature.trim()).context("signature is not valid hex")?;
        let data = read_input(&self.input)?;

        let valid = subtle
            .verify(&params, &key, &signature, &data)
            .await
            .context("failed to verify")?;
        if !valid {
            bail!("signature is invalid");
        }
        println!("Signature is valid");
        Ok(())
    }
}
