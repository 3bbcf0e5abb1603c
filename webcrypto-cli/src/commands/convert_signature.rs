use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use webcrypto::P256_FIELD_LEN;
use webcrypto::asn::EcdsaSignature;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SignatureForm {
    /// Fixed-width r || s, as produced by WebCrypto.
    Raw,
    /// DER ECDSA-Sig-Value.
    Der,
}

/**
    Convert an ECDSA signature between raw `r || s` and DER.
*/
#[derive(Args)]
pub struct ConvertSignatureCommand {
    /// Hex-encoded input signature.
    signature: String,

    /// Output form; the input is assumed to be the other one.
    #[arg(long, value_enum)]
    to: SignatureForm,

    /// Byte width of r and s in raw form.
    #[arg(long, default_value_t = P256_FIELD_LEN)]
    field_len: usize,
}

impl ConvertSignatureCommand {
    pub fn run(self) -> Result<()> {
        let input = hex::decode(self.signature.trim()).context("signature is not valid hex")?;

        let output = match self.to {
            SignatureForm::Der => EcdsaSignature::from_raw(&input)
                .context("failed to parse raw signature")?
                .to_der()?,
            SignatureForm::Raw => EcdsaSignature::from_der(&input)
                .context("failed to parse DER signature")?
                .to_raw(self.field_len)?,
        };
        println!("{}", hex::encode(output));
        Ok(())
    }
}
