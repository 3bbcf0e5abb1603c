use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{AlgorithmName, HashAlgorithm, NamedCurve};

/**
    Algorithm parameters as supplied by a caller.

    Mirrors the WebCrypto algorithm dictionaries: every member except `name`
    is optional here and becomes required (or is rejected) only once a
    provider validates it. Deserializes from the usual camelCase JSON, e.g.
    `{"name":"RSASSA-PKCS1-v1_5","modulusLength":2048,"publicExponent":[1,0,1],"hash":"SHA-256"}`.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Algorithm {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulus_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_exponent: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_curve: Option<String>,
}

impl Algorithm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_modulus_length(mut self, modulus_length: usize) -> Self {
        self.modulus_length = Some(modulus_length);
        self
    }

    pub fn with_public_exponent(mut self, public_exponent: impl Into<Vec<u8>>) -> Self {
        self.public_exponent = Some(public_exponent.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_named_curve(mut self, named_curve: impl Into<String>) -> Self {
        self.named_curve = Some(named_curve.into());
        self
    }

    /**
        Resolve `name` to a known algorithm family.
    */
    pub fn algorithm_name(&self) -> CryptoResult<AlgorithmName> {
        AlgorithmName::from_name(self.name.as_bytes())
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(self.name.clone()))
    }

    /**
        The required `hash` member, parsed.
    */
    pub fn hash_algorithm(&self) -> CryptoResult<HashAlgorithm> {
        let hash = required(&self.hash, "hash")?;
        HashAlgorithm::from_name(hash.as_bytes()).ok_or_else(|| {
            CryptoError::invalid_parameter(
                "hash",
                format!("'{hash}' is not one of SHA-1, SHA-256, SHA-384, SHA-512"),
            )
        })
    }

    /**
        The required `namedCurve` member, parsed.
    */
    pub fn curve(&self) -> CryptoResult<NamedCurve> {
        let curve = required(&self.named_curve, "namedCurve")?;
        NamedCurve::from_name(curve.as_bytes()).ok_or_else(|| {
            CryptoError::invalid_parameter("namedCurve", format!("'{curve}' is not supported"))
        })
    }
}

impl From<&str> for Algorithm {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/**
    Required-property check: the member must be present.
*/
pub(crate) fn required<'a, T>(value: &'a Option<T>, property: &'static str) -> CryptoResult<&'a T> {
    value.as_ref().ok_or(CryptoError::MissingProperty(property))
}
