use core::fmt;
use std::sync::Arc;

use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::{CryptoError, CryptoResult};
use crate::jwk::JsonWebKey;
use crate::types::{
    AlgorithmName, HashAlgorithm, KeyFormat, KeyType, KeyUsage, KeyUsages, NamedCurve,
};

/**
    Algorithm descriptor attached to an RSA key.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaKeyAlgorithm {
    pub name: AlgorithmName,
    pub modulus_length: usize,
    pub public_exponent: Vec<u8>,
    /// Present for hashed algorithms (RSASSA-PKCS1-v1_5).
    pub hash: Option<HashAlgorithm>,
}

/**
    Algorithm descriptor attached to an elliptic-curve key.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcKeyAlgorithm {
    pub name: AlgorithmName,
    pub named_curve: NamedCurve,
}

/**
    The algorithm a key was created for, with its parameters.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa(RsaKeyAlgorithm),
    Ec(EcKeyAlgorithm),
}

impl KeyAlgorithm {
    pub fn name(&self) -> AlgorithmName {
        match self {
            Self::Rsa(rsa) => rsa.name,
            Self::Ec(ec) => ec.name,
        }
    }

    pub fn hash(&self) -> Option<HashAlgorithm> {
        match self {
            Self::Rsa(rsa) => rsa.hash,
            Self::Ec(_) => None,
        }
    }
}

/**
    Backend key material. Never mutated after the key is created.
*/
#[derive(Clone)]
pub(crate) enum KeyMaterial {
    RsaPrivate(RsaPrivateKey),
    RsaPublic(RsaPublicKey),
    EcPrivate(p256::SecretKey),
    EcPublic(p256::PublicKey),
}

impl KeyMaterial {
    fn key_type(&self) -> KeyType {
        match self {
            Self::RsaPrivate(_) | Self::EcPrivate(_) => KeyType::Private,
            Self::RsaPublic(_) | Self::EcPublic(_) => KeyType::Public,
        }
    }
}

/**
    Opaque key handle.

    Cloning is cheap and shares the underlying material; every attribute is
    fixed at creation, so a key can be read from any number of tasks at once.
*/
#[derive(Clone)]
pub struct CryptoKey {
    key_type: KeyType,
    algorithm: KeyAlgorithm,
    extractable: bool,
    usages: KeyUsages,
    material: Arc<KeyMaterial>,
}

impl CryptoKey {
    pub(crate) fn new(
        algorithm: KeyAlgorithm,
        extractable: bool,
        usages: KeyUsages,
        material: KeyMaterial,
    ) -> Self {
        Self {
            key_type: material.key_type(),
            algorithm,
            extractable,
            usages,
            material: Arc::new(material),
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn algorithm(&self) -> &KeyAlgorithm {
        &self.algorithm
    }

    pub fn extractable(&self) -> bool {
        self.extractable
    }

    pub fn usages(&self) -> KeyUsages {
        self.usages
    }

    pub fn has_usage(&self, usage: KeyUsage) -> bool {
        self.usages.contains(usage)
    }

    pub(crate) fn material(&self) -> &KeyMaterial {
        &self.material
    }

    pub(crate) fn rsa_public_key(&self) -> CryptoResult<RsaPublicKey> {
        match self.material() {
            KeyMaterial::RsaPublic(key) => Ok(key.clone()),
            KeyMaterial::RsaPrivate(key) => Ok(key.to_public_key()),
            _ => Err(CryptoError::invalid_key_data("not an RSA key")),
        }
    }

    pub(crate) fn rsa_private_key(&self) -> CryptoResult<&RsaPrivateKey> {
        match self.material() {
            KeyMaterial::RsaPrivate(key) => Ok(key),
            KeyMaterial::RsaPublic(_) => Err(self.type_mismatch(KeyType::Private)),
            _ => Err(CryptoError::invalid_key_data("not an RSA key")),
        }
    }

    pub(crate) fn ec_public_key(&self) -> CryptoResult<p256::PublicKey> {
        match self.material() {
            KeyMaterial::EcPublic(key) => Ok(key.clone()),
            KeyMaterial::EcPrivate(key) => Ok(key.public_key()),
            _ => Err(CryptoError::invalid_key_data("not an EC key")),
        }
    }

    pub(crate) fn ec_secret_key(&self) -> CryptoResult<&p256::SecretKey> {
        match self.material() {
            KeyMaterial::EcPrivate(key) => Ok(key),
            KeyMaterial::EcPublic(_) => Err(self.type_mismatch(KeyType::Private)),
            _ => Err(CryptoError::invalid_key_data("not an EC key")),
        }
    }

    pub(crate) fn type_mismatch(&self, expected: KeyType) -> CryptoError {
        CryptoError::KeyTypeMismatch {
            expected,
            actual: self.key_type,
        }
    }
}

impl fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoKey")
            .field("type", &self.key_type)
            .field("algorithm", &self.algorithm)
            .field("extractable", &self.extractable)
            .field("usages", &self.usages)
            .finish_non_exhaustive()
    }
}

/**
    Result of asymmetric key generation.
*/
#[derive(Debug, Clone)]
pub struct CryptoKeyPair {
    pub public_key: CryptoKey,
    pub private_key: CryptoKey,
}

/**
    Key material in one of the import/export encodings.

    `raw`, `pkcs8` and `spki` carry DER or raw bytes; `jwk` carries a parsed
    JSON Web Key.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyData {
    Bytes(Vec<u8>),
    Jwk(JsonWebKey),
}

impl KeyData {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Jwk(_) => None,
        }
    }

    pub fn as_jwk(&self) -> Option<&JsonWebKey> {
        match self {
            Self::Jwk(jwk) => Some(jwk),
            Self::Bytes(_) => None,
        }
    }

    /**
        Serialize for transport: bytes as-is, JWKs as JSON.
    */
    pub fn to_bytes(&self) -> CryptoResult<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Jwk(jwk) => jwk.to_json().map(String::into_bytes),
        }
    }

    /**
        Inverse of [`KeyData::to_bytes`] for the given format.
    */
    pub fn from_bytes(format: KeyFormat, bytes: Vec<u8>) -> CryptoResult<Self> {
        match format {
            KeyFormat::Jwk => JsonWebKey::from_json_bytes(&bytes).map(Self::Jwk),
            KeyFormat::Raw | KeyFormat::Pkcs8 | KeyFormat::Spki => Ok(Self::Bytes(bytes)),
        }
    }
}

impl From<Vec<u8>> for KeyData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for KeyData {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<JsonWebKey> for KeyData {
    fn from(jwk: JsonWebKey) -> Self {
        Self::Jwk(jwk)
    }
}
