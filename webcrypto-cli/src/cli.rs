use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use webcrypto::{CryptoConfig, SubtleCrypto};

use crate::commands::{
    ConvertSignatureCommand, DecryptCommand, EncryptCommand, GenerateCommand, SignCommand,
    VerifyCommand,
};

/**
    WebCrypto-style key generation, signing and encryption.
*/
#[derive(Parser)]
#[command(name = "webcrypto")]
pub struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Allowed RSA modulus lengths, comma-separated (overrides the config file).
    #[arg(long, global = true, value_delimiter = ',')]
    rsa_modulus_lengths: Option<Vec<usize>>,

    /// Maximum concurrent backend operations (overrides the config file).
    #[arg(long, global = true)]
    max_in_flight: Option<usize>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key pair.
    Generate(GenerateCommand),
    /// Sign a file.
    Sign(SignCommand),
    /// Verify a signature over a file.
    Verify(VerifyCommand),
    /// Encrypt a file with a public key.
    Encrypt(EncryptCommand),
    /// Decrypt a file with a private key.
    Decrypt(DecryptCommand),
    /// Convert an ECDSA signature between raw r||s and DER.
    ConvertSignature(ConvertSignatureCommand),
}

impl Cli {
    fn load_config(&self) -> Result<CryptoConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                CryptoConfig::from_json(&json).context("failed to parse config")?
            }
            None => CryptoConfig::default(),
        };
        if let Some(lengths) = &self.rsa_modulus_lengths {
            config.rsa_modulus_lengths = lengths.clone();
        }
        if let Some(max_in_flight) = self.max_in_flight {
            config.max_in_flight = max_in_flight;
        }
        Ok(config)
    }

    pub async fn run(self) -> Result<()> {
        let config = self.load_config()?;
        tracing::debug!(?config, "loaded configuration");
        let subtle = SubtleCrypto::new(config).context("invalid configuration")?;

        match self.command {
            Command::Generate(cmd) => cmd.run(&subtle).await,
            Command::Sign(cmd) => cmd.run(&subtle).await,
            Command::Verify(cmd) => cmd.run(&subtle).await,
            Command::Encrypt(cmd) => cmd.run(&subtle).await,
            Command::Decrypt(cmd) => cmd.run(&subtle).await,
            Command::ConvertSignature(cmd) => cmd.run(),
        }
    }
}
