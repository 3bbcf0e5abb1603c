use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use webcrypto::{KeyType, KeyUsage, SubtleCrypto};

use super::{AlgorithmArgs, import_key_file, read_input, write_output};

/**
    Sign a file with a private key.

    The signature is printed as hex unless `--output` is given.
*/
#[derive(Args)]
pub struct SignCommand {
    #[command(flatten)]
    algorithm: AlgorithmArgs,

    /// Private key file (PKCS#8 DER or JWK).
    #[arg(short, long)]
    key: PathBuf,

    /// File to sign.
    input: PathBuf,

    /// Write the raw signature to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SignCommand {
    pub async fn run(self, subtle: &SubtleCrypto) -> Result<()> {
        let params = self.algorithm.params();
        let key = import_key_file(subtle, &self.key, &params, KeyType::Private, KeyUsage::Sign)
            .await?;
        let data = read_input(&self.input)?;

        let signature = subtle
            .sign(&params, &key, &data)
            .await
            .context("failed to sign")?;
        write_output(self.output.as_deref(), &signature)
    }
}
