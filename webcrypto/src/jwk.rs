use data_encoding::BASE64URL_NOPAD;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{KeyUsage, KeyUsages};

/**
    JSON Web Key (RFC 7517) restricted to the members used by RSA and EC keys.

    Binary members (`n`, `e`, `d`, `x`, ...) hold unpadded base64url strings
    as they appear on the wire; use [`JsonWebKey::member`] to decode them.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
}

impl JsonWebKey {
    pub fn new(kty: impl Into<String>) -> Self {
        Self {
            kty: kty.into(),
            ..Self::default()
        }
    }

    pub fn to_json(&self) -> CryptoResult<String> {
        serde_json::to_string(self).map_err(CryptoError::invalid_key_data)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        serde_json::from_slice(bytes).map_err(CryptoError::invalid_key_data)
    }

    /**
        Decode a required base64url member.
    */
    pub fn member(&self, value: &Option<String>, name: &str) -> CryptoResult<Vec<u8>> {
        let value = value
            .as_deref()
            .ok_or_else(|| CryptoError::InvalidKeyData(format!("jwk: missing '{name}'")))?;
        decode_b64(value)
            .map_err(|_| CryptoError::InvalidKeyData(format!("jwk: '{name}' is not base64url")))
    }

    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    pub fn expect_kty(&self, kty: &str) -> CryptoResult<()> {
        if self.kty == kty {
            Ok(())
        } else {
            Err(CryptoError::InvalidKeyData(format!(
                "jwk: kty is '{}', expected '{kty}'",
                self.kty
            )))
        }
    }

    /**
        Check the `ext` and `key_ops` members against an import request.

        An `ext: false` key cannot become extractable, and every requested
        usage must appear in `key_ops` when that member is present.
    */
    pub fn check_import(&self, extractable: bool, usages: KeyUsages) -> CryptoResult<()> {
        if extractable && self.ext == Some(false) {
            return Err(CryptoError::invalid_key_data(
                "jwk: 'ext' is false but an extractable key was requested",
            ));
        }
        if let Some(key_ops) = &self.key_ops {
            let allowed: KeyUsages = key_ops
                .iter()
                .filter_map(|op| KeyUsage::from_name(op.as_bytes()))
                .collect();
            if let Some(usage) = usages.iter().find(|u| !allowed.contains(*u)) {
                return Err(CryptoError::InvalidKeyData(format!(
                    "jwk: 'key_ops' does not include '{usage}'"
                )));
            }
        }
        Ok(())
    }

    /**
        Set `ext` and `key_ops` from a key's attributes on export.
    */
    pub fn with_attributes(mut self, extractable: bool, usages: KeyUsages) -> Self {
        self.ext = Some(extractable);
        self.key_ops = Some(usages.to_names());
        self
    }
}

pub(crate) fn encode_b64(bytes: &[u8]) -> String {
    BASE64URL_NOPAD.encode(bytes)
}

pub(crate) fn decode_b64(value: &str) -> Result<Vec<u8>, data_encoding::DecodeError> {
    BASE64URL_NOPAD.decode(value.trim_end_matches('=').as_bytes())
}
