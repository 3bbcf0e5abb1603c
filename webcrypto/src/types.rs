use core::fmt;
use core::str::FromStr;

use der::asn1::ObjectIdentifier;
use sha1::Sha1;
use sha2::digest::const_oid::AssociatedOid;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::asn::digest_info;
use crate::error::{CryptoResult, ParseError};
use crate::utils::eq_ignore_ascii_case;

/**
    Operation a key may be used for.
    Names follow the WebCrypto `KeyUsage` strings.
*/
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyUsage {
    Encrypt = 0,
    Decrypt = 1,
    Sign = 2,
    Verify = 3,
    WrapKey = 4,
    UnwrapKey = 5,
    DeriveKey = 6,
    DeriveBits = 7,
}

impl KeyUsage {
    pub const ALL: [KeyUsage; 8] = [
        Self::Encrypt,
        Self::Decrypt,
        Self::Sign,
        Self::Verify,
        Self::WrapKey,
        Self::UnwrapKey,
        Self::DeriveKey,
        Self::DeriveBits,
    ];

    pub const fn from_name(name: &[u8]) -> Option<Self> {
        let name = name.trim_ascii();
        match name.len() {
            4 if eq_ignore_ascii_case(name, b"sign") => Some(Self::Sign),
            6 if eq_ignore_ascii_case(name, b"verify") => Some(Self::Verify),
            7 if eq_ignore_ascii_case(name, b"encrypt") => Some(Self::Encrypt),
            7 if eq_ignore_ascii_case(name, b"decrypt") => Some(Self::Decrypt),
            7 if eq_ignore_ascii_case(name, b"wrapKey") => Some(Self::WrapKey),
            9 if eq_ignore_ascii_case(name, b"unwrapKey") => Some(Self::UnwrapKey),
            9 if eq_ignore_ascii_case(name, b"deriveKey") => Some(Self::DeriveKey),
            10 if eq_ignore_ascii_case(name, b"deriveBits") => Some(Self::DeriveBits),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
            Self::Sign => "sign",
            Self::Verify => "verify",
            Self::WrapKey => "wrapKey",
            Self::UnwrapKey => "unwrapKey",
            Self::DeriveKey => "deriveKey",
            Self::DeriveBits => "deriveBits",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for KeyUsage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "key usage",
            value: s.to_owned(),
        })
    }
}

/**
    Set of [`KeyUsage`] values, stored as a bitmask.
*/
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyUsages(u8);

impl KeyUsages {
    pub const EMPTY: Self = Self(0);

    pub const fn from_slice(usages: &[KeyUsage]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < usages.len() {
            bits |= usages[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn with(self, usage: KeyUsage) -> Self {
        Self(self.0 | usage.bit())
    }

    pub const fn contains(self, usage: KeyUsage) -> bool {
        self.0 & usage.bit() != 0
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = KeyUsage> {
        KeyUsage::ALL.into_iter().filter(move |u| self.contains(*u))
    }

    pub fn to_names(self) -> Vec<String> {
        self.iter().map(|u| u.to_name().to_owned()).collect()
    }
}

impl From<&[KeyUsage]> for KeyUsages {
    fn from(usages: &[KeyUsage]) -> Self {
        Self::from_slice(usages)
    }
}

impl FromIterator<KeyUsage> for KeyUsages {
    fn from_iter<I: IntoIterator<Item = KeyUsage>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Debug for KeyUsages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/**
    Kind of key material held by a `CryptoKey`.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Public,
    Private,
    Secret,
}

impl KeyType {
    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Secret => "secret",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

/**
    Key import/export encoding.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFormat {
    Raw,
    Pkcs8,
    Spki,
    Jwk,
}

impl KeyFormat {
    pub const fn from_name(name: &[u8]) -> Option<Self> {
        let name = name.trim_ascii();
        match name.len() {
            3 if eq_ignore_ascii_case(name, b"raw") => Some(Self::Raw),
            3 if eq_ignore_ascii_case(name, b"jwk") => Some(Self::Jwk),
            4 if eq_ignore_ascii_case(name, b"spki") => Some(Self::Spki),
            5 if eq_ignore_ascii_case(name, b"pkcs8") => Some(Self::Pkcs8),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Pkcs8 => "pkcs8",
            Self::Spki => "spki",
            Self::Jwk => "jwk",
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for KeyFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "key format",
            value: s.to_owned(),
        })
    }
}

/**
    Digest algorithms usable with the signature providers.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const fn from_name(name: &[u8]) -> Option<Self> {
        let name = name.trim_ascii();
        match name.len() {
            5 if eq_ignore_ascii_case(name, b"SHA-1") => Some(Self::Sha1),
            7 if eq_ignore_ascii_case(name, b"SHA-256") => Some(Self::Sha256),
            7 if eq_ignore_ascii_case(name, b"SHA-384") => Some(Self::Sha384),
            7 if eq_ignore_ascii_case(name, b"SHA-512") => Some(Self::Sha512),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /**
        Digest size in bytes.
    */
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    pub const fn oid(self) -> ObjectIdentifier {
        match self {
            Self::Sha1 => <Sha1 as AssociatedOid>::OID,
            Self::Sha256 => <Sha256 as AssociatedOid>::OID,
            Self::Sha384 => <Sha384 as AssociatedOid>::OID,
            Self::Sha512 => <Sha512 as AssociatedOid>::OID,
        }
    }

    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /**
        DER DigestInfo over the digest of `data`.
    */
    pub fn digest_info(self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        digest_info::encode(self, &self.digest(data))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "hash algorithm",
            value: s.to_owned(),
        })
    }
}

/**
    Algorithm families known to the registry.

    Names are matched case-insensitively; the canonical spelling is the one
    returned by [`AlgorithmName::to_name`].
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlgorithmName {
    RsaSsaPkcs1v15,
    RsaEsPkcs1v15,
    Ecdsa,
}

impl AlgorithmName {
    pub const fn from_name(name: &[u8]) -> Option<Self> {
        let name = name.trim_ascii();
        match name.len() {
            5 if eq_ignore_ascii_case(name, b"ECDSA") => Some(Self::Ecdsa),
            17 if eq_ignore_ascii_case(name, b"RSASSA-PKCS1-v1_5") => Some(Self::RsaSsaPkcs1v15),
            16 if eq_ignore_ascii_case(name, b"RSAES-PKCS1-v1_5") => Some(Self::RsaEsPkcs1v15),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::RsaSsaPkcs1v15 => "RSASSA-PKCS1-v1_5",
            Self::RsaEsPkcs1v15 => "RSAES-PKCS1-v1_5",
            Self::Ecdsa => "ECDSA",
        }
    }
}

impl fmt::Display for AlgorithmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for AlgorithmName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "algorithm",
            value: s.to_owned(),
        })
    }
}

/**
    Elliptic curves supported by the ECDSA provider.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedCurve {
    P256,
}

impl NamedCurve {
    pub const fn from_name(name: &[u8]) -> Option<Self> {
        match name.trim_ascii() {
            n if eq_ignore_ascii_case(n, b"P-256") => Some(Self::P256),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
        }
    }
}

impl fmt::Display for NamedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for NamedCurve {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "named curve",
            value: s.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn key_usage_name_round_trip() {
        for usage in KeyUsage::ALL {
            assert_eq!(KeyUsage::from_name(usage.to_name().as_bytes()), Some(usage));
        }
        assert_eq!(KeyUsage::from_name(b" WRAPKEY "), Some(KeyUsage::WrapKey));
        assert_eq!("bogus".parse::<KeyUsage>().unwrap_err().kind, "key usage");
    }

    #[test]
    fn key_usages_set_operations() {
        let sign_verify = KeyUsages::from_slice(&[KeyUsage::Sign, KeyUsage::Verify]);
        assert_eq!(sign_verify.len(), 2);
        assert!(sign_verify.contains(KeyUsage::Sign));
        assert!(!sign_verify.contains(KeyUsage::Encrypt));

        let verify = KeyUsages::EMPTY.with(KeyUsage::Verify);
        assert!(verify.is_subset(sign_verify));
        assert!(!sign_verify.is_subset(verify));
        assert_eq!(sign_verify.intersection(verify), verify);
        assert!(KeyUsages::EMPTY.is_empty());
        assert_eq!(sign_verify.to_names(), vec!["sign", "verify"]);
    }

    #[test]
    fn key_usages_from_iter_dedupes() {
        let usages: KeyUsages = [KeyUsage::Sign, KeyUsage::Sign, KeyUsage::Verify]
            .into_iter()
            .collect();
        assert_eq!(usages.len(), 2);
        assert_eq!(format!("{usages:?}"), "{Sign, Verify}");
    }

    #[test]
    fn algorithm_name_case_insensitive() {
        assert_eq!(
            AlgorithmName::from_name(b"rsassa-pkcs1-V1_5"),
            Some(AlgorithmName::RsaSsaPkcs1v15)
        );
        assert_eq!(
            AlgorithmName::from_name(b"RSAES-PKCS1-v1_5"),
            Some(AlgorithmName::RsaEsPkcs1v15)
        );
        assert_eq!(AlgorithmName::from_name(b"ecdsa"), Some(AlgorithmName::Ecdsa));
        assert_eq!(AlgorithmName::from_name(b"RSA-OAEP"), None);
    }

    #[test]
    fn key_format_parse() {
        assert_eq!("PKCS8".parse::<KeyFormat>().unwrap(), KeyFormat::Pkcs8);
        assert_eq!("spki".parse::<KeyFormat>().unwrap(), KeyFormat::Spki);
        assert!("pem".parse::<KeyFormat>().is_err());
    }

    #[test]
    fn hash_digest_lengths() {
        for hash in [
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            assert_eq!(hash.digest(b"abc").len(), hash.output_len());
            // DigestInfo ends with the digest itself.
            let info = hash.digest_info(b"abc").unwrap();
            assert!(info.ends_with(&hash.digest(b"abc")));
        }
    }

    #[test]
    fn sha256_digest_info_vector() {
        let info = HashAlgorithm::Sha256.digest_info(b"abc").unwrap();
        assert_eq!(&info[..19], &hex!("3031300d060960864801650304020105000420"));
        assert_eq!(
            &info[19..],
            &hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn named_curve_parse() {
        assert_eq!(NamedCurve::from_name(b"p-256"), Some(NamedCurve::P256));
        assert_eq!(NamedCurve::from_name(b"P-384"), None);
    }
}
