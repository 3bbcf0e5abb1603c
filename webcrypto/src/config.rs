use std::num::NonZeroUsize;
use std::thread::available_parallelism;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_RSA_MODULUS_LENGTHS;
use crate::error::{CryptoError, CryptoResult};

/**
    Runtime configuration for a [`crate::SubtleCrypto`] context.

    Missing members take their defaults, so `{}` is a valid configuration:

    ```json
    { "rsaModulusLengths": [2048, 4096], "maxInFlight": 8 }
    ```
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CryptoConfig {
    /// Modulus lengths (bits) the RSA providers generate and import.
    pub rsa_modulus_lengths: Vec<usize>,
    /// Upper bound on backend calls running at once.
    pub max_in_flight: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            rsa_modulus_lengths: DEFAULT_RSA_MODULUS_LENGTHS.to_vec(),
            max_in_flight: available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }
}

impl CryptoConfig {
    pub fn from_json(json: &str) -> CryptoResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CryptoError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CryptoResult<()> {
        if self.rsa_modulus_lengths.is_empty() {
            return Err(CryptoError::InvalidConfig(
                "rsaModulusLengths cannot be empty".into(),
            ));
        }
        if let Some(bits) = self
            .rsa_modulus_lengths
            .iter()
            .find(|&&bits| bits < 512 || bits % 8 != 0)
        {
            return Err(CryptoError::InvalidConfig(format!(
                "rsaModulusLengths: {bits} is not a multiple of 8 of at least 512"
            )));
        }
        if self.max_in_flight == 0 {
            return Err(CryptoError::InvalidConfig(
                "maxInFlight must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
