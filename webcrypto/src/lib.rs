#![allow(clippy::doc_overindented_list_items)]

/*!
    WebCrypto-style algorithm providers.

    - [`Registry`] maps algorithm names to [`Provider`]s
    - [`SubtleCrypto`] is the async front end over a registry
    - RSASSA-PKCS1-v1_5, RSAES-PKCS1-v1_5 and ECDSA (P-256) are built in
    - [`asn::EcdsaSignature`] converts ECDSA signatures between the raw
      `r || s` form and DER `ECDSA-Sig-Value`
*/

mod config;
mod constants;
mod crypto;
mod error;
mod jwk;
mod key;
mod params;
mod registry;
mod subtle;
mod types;
mod utils;

pub mod asn;
pub mod provider;

pub use self::config::CryptoConfig;
pub use self::constants::{DEFAULT_RSA_MODULUS_LENGTHS, P256_FIELD_LEN};
pub use self::error::{CryptoError, CryptoResult, ErrorKind, ParseError};
pub use self::jwk::JsonWebKey;
pub use self::key::{
    CryptoKey, CryptoKeyPair, EcKeyAlgorithm, KeyAlgorithm, KeyData, RsaKeyAlgorithm,
};
pub use self::params::Algorithm;
pub use self::provider::{EcdsaProvider, Provider, RsaEsProvider, RsaSsaProvider, UsagePolicy};
pub use self::registry::Registry;
pub use self::subtle::SubtleCrypto;
pub use self::types::{
    AlgorithmName, HashAlgorithm, KeyFormat, KeyType, KeyUsage, KeyUsages, NamedCurve,
};
