use crate::constants::DEFAULT_RSA_MODULUS_LENGTHS;
use crate::crypto::padding::{blocks_equal, signature_block};
use crate::crypto::rsa::{modulus_len, private_transform, public_transform};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{CryptoKey, CryptoKeyPair, KeyData};
use crate::params::Algorithm;
use crate::provider::rsa::{RSA_FORMATS, RsaFamily};
use crate::provider::{Provider, UsagePolicy, check_key_algorithm};
use crate::types::{AlgorithmName, HashAlgorithm, KeyFormat, KeyType, KeyUsage, KeyUsages};

const POLICY: UsagePolicy = UsagePolicy::asymmetric(&[KeyUsage::Verify], &[KeyUsage::Sign]);

/**
    RSASSA-PKCS1-v1_5 (RFC 8017 §8.2).

    The hash is bound to the key at generation or import time. Verification
    is fail-closed: malformed, out-of-range or mismatching signatures all
    yield `Ok(false)`.
*/
#[derive(Debug, Clone)]
pub struct RsaSsaProvider {
    modulus_lengths: Vec<usize>,
}

impl RsaSsaProvider {
    pub fn new(modulus_lengths: impl Into<Vec<usize>>) -> Self {
        Self {
            modulus_lengths: modulus_lengths.into(),
        }
    }

    fn family(&self) -> RsaFamily<'_> {
        RsaFamily {
            name: AlgorithmName::RsaSsaPkcs1v15,
            policy: &POLICY,
            modulus_lengths: &self.modulus_lengths,
        }
    }
}

impl Default for RsaSsaProvider {
    fn default() -> Self {
        Self::new(DEFAULT_RSA_MODULUS_LENGTHS)
    }
}

fn key_hash(key: &CryptoKey) -> CryptoResult<HashAlgorithm> {
    key.algorithm()
        .hash()
        .ok_or_else(|| CryptoError::invalid_key_data("RSASSA key has no hash"))
}

impl Provider for RsaSsaProvider {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::RsaSsaPkcs1v15
    }

    fn usage_policy(&self) -> &UsagePolicy {
        &POLICY
    }

    fn formats(&self) -> &'static [KeyFormat] {
        RSA_FORMATS
    }

    fn check_generate_key_params(&self, params: &Algorithm) -> CryptoResult<()> {
        self.family().check_generate_key_params(params)?;
        params.hash_algorithm()?;
        Ok(())
    }

    fn on_generate_key(
        &self,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKeyPair> {
        let hash = params.hash_algorithm()?;
        self.family()
            .generate_key(params, Some(hash), extractable, usages)
    }

    fn on_import_key(
        &self,
        format: KeyFormat,
        key_data: &KeyData,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKey> {
        let hash = params.hash_algorithm()?;
        self.family()
            .import_key(format, key_data, Some(hash), extractable, usages)
    }

    fn on_export_key(&self, format: KeyFormat, key: &CryptoKey) -> CryptoResult<KeyData> {
        self.family().export_key(format, key)
    }

    fn on_sign(&self, _params: &Algorithm, key: &CryptoKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let private = key.rsa_private_key()?;
        let block = signature_block(key_hash(key)?, data, modulus_len(private))?;
        private_transform(private, &block)
    }

    fn on_verify(
        &self,
        _params: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> CryptoResult<bool> {
        Ok(verify_signature(key, signature, data).unwrap_or(false))
    }

    fn check_crypto_key(&self, key: &CryptoKey, usage: KeyUsage) -> CryptoResult<()> {
        check_key_algorithm(self.name(), key)?;
        if !key.has_usage(usage) {
            return Err(CryptoError::UsageNotPermitted(usage));
        }
        let expected = match usage {
            KeyUsage::Sign => KeyType::Private,
            _ => KeyType::Public,
        };
        if key.key_type() != expected {
            return Err(key.type_mismatch(expected));
        }
        Ok(())
    }
}

/**
    Every failure, backend errors included, collapses to `None` here and to
    `false` at the caller.
*/
fn verify_signature(key: &CryptoKey, signature: &[u8], data: &[u8]) -> Option<bool> {
    let public = key.rsa_public_key().ok()?;
    let k = modulus_len(&public);
    if signature.len() != k {
        return Some(false);
    }
    let expected = signature_block(key_hash(key).ok()?, data, k).ok()?;
    let actual = public_transform(&public, signature).ok()?;
    Some(blocks_equal(&actual, &expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1v15;
    use rsa::pkcs8::DecodePrivateKey;
    use rsa::signature::{SignatureEncoding, Signer, Verifier};
    use rsa::RsaPrivateKey;
    use sha2::Sha256;

    const PK8_2048: &[u8] = include_bytes!("../../testfiles/rsa2048.pk8");
    const SPKI_2048: &[u8] = include_bytes!("../../testfiles/rsa2048.spki");
    const PK8_1024: &[u8] = include_bytes!("../../testfiles/rsa1024.pk8");
    const SPKI_1024: &[u8] = include_bytes!("../../testfiles/rsa1024.spki");

    const HASHES: [&str; 4] = ["SHA-1", "SHA-256", "SHA-384", "SHA-512"];

    fn params(hash: &str) -> Algorithm {
        Algorithm::new("RSASSA-PKCS1-v1_5").with_hash(hash)
    }

    fn key_pair(pk8: &[u8], spki: &[u8], hash: &str) -> (CryptoKey, CryptoKey) {
        let provider = RsaSsaProvider::default();
        let private = provider
            .import_key(
                KeyFormat::Pkcs8,
                &KeyData::from(pk8),
                &params(hash),
                true,
                KeyUsages::from_slice(&[KeyUsage::Sign]),
            )
            .unwrap();
        let public = provider
            .import_key(
                KeyFormat::Spki,
                &KeyData::from(spki),
                &params(hash),
                true,
                KeyUsages::from_slice(&[KeyUsage::Verify]),
            )
            .unwrap();
        (private, public)
    }

    #[test]
    fn sign_verify_every_hash_and_size() {
        let provider = RsaSsaProvider::default();
        for (pk8, spki, k) in [(PK8_1024, SPKI_1024, 128), (PK8_2048, SPKI_2048, 256)] {
            for hash in HASHES {
                let (private, public) = key_pair(pk8, spki, hash);
                let signature = provider.sign(&params(hash), &private, b"message").unwrap();
                assert_eq!(signature.len(), k);
                assert!(provider.verify(&params(hash), &public, &signature, b"message").unwrap());
                assert!(!provider.verify(&params(hash), &public, &signature, b"massage").unwrap());
            }
        }
    }

    #[test]
    fn signatures_are_deterministic() {
        let provider = RsaSsaProvider::default();
        let (private, _) = key_pair(PK8_1024, SPKI_1024, "SHA-256");
        let a = provider.sign(&params("SHA-256"), &private, b"same").unwrap();
        let b = provider.sign(&params("SHA-256"), &private, b"same").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn verify_is_fail_closed_on_any_bit_flip() {
        let provider = RsaSsaProvider::default();
        let (private, public) = key_pair(PK8_1024, SPKI_1024, "SHA-256");
        let signature = provider.sign(&params("SHA-256"), &private, b"message").unwrap();

        for byte in [0, 1, 64, 127] {
            for bit in [0, 7] {
                let mut tampered = signature.clone();
                tampered[byte] ^= 1 << bit;
                assert_eq!(
                    provider.verify(&params("SHA-256"), &public, &tampered, b"message"),
                    Ok(false)
                );
            }
        }
    }

    #[test]
    fn verify_rejects_malformed_signatures_without_error() {
        let provider = RsaSsaProvider::default();
        let (_, public) = key_pair(PK8_1024, SPKI_1024, "SHA-256");
        let sha256 = params("SHA-256");

        assert_eq!(provider.verify(&sha256, &public, &[], b"message"), Ok(false));
        assert_eq!(provider.verify(&sha256, &public, &[0x01; 127], b"message"), Ok(false));
        assert_eq!(provider.verify(&sha256, &public, &[0x01; 129], b"message"), Ok(false));
        // Not below the modulus.
        assert_eq!(provider.verify(&sha256, &public, &[0xFF; 128], b"message"), Ok(false));
    }

    #[test]
    fn interop_with_rsa_crate() {
        let provider = RsaSsaProvider::default();
        let (private, public) = key_pair(PK8_2048, SPKI_2048, "SHA-256");
        let reference = RsaPrivateKey::from_pkcs8_der(PK8_2048).unwrap();

        let signature = provider.sign(&params("SHA-256"), &private, b"interop").unwrap();
        let verifying_key = pkcs1v15::VerifyingKey::<Sha256>::new(reference.to_public_key());
        let parsed = pkcs1v15::Signature::try_from(signature.as_slice()).unwrap();
        assert!(verifying_key.verify(b"interop", &parsed).is_ok());

        let signing_key = pkcs1v15::SigningKey::<Sha256>::new(reference);
        let theirs = signing_key.sign(b"interop").to_vec();
        assert_eq!(theirs, signature);
        assert!(provider.verify(&params("SHA-256"), &public, &theirs, b"interop").unwrap());
    }

    #[test]
    fn verify_only_key_cannot_sign() {
        let provider = RsaSsaProvider::default();
        let pair = provider
            .generate_key(
                &params("SHA-256")
                    .with_modulus_length(1024)
                    .with_public_exponent([1, 0, 1]),
                true,
                KeyUsages::from_slice(&[KeyUsage::Verify]),
            )
            .unwrap();
        assert!(pair.private_key.usages().is_empty());

        let err = provider.sign(&params("SHA-256"), &pair.private_key, b"data").unwrap_err();
        assert_eq!(err, CryptoError::UsageNotPermitted(KeyUsage::Sign));
        let err = provider.sign(&params("SHA-256"), &pair.public_key, b"data").unwrap_err();
        assert_eq!(err, CryptoError::UsageNotPermitted(KeyUsage::Sign));
    }

    #[test]
    fn generate_key_validation() {
        let provider = RsaSsaProvider::default();
        let usages = KeyUsages::from_slice(&[KeyUsage::Sign, KeyUsage::Verify]);

        let ok = params("SHA-256").with_modulus_length(2048).with_public_exponent([1, 0, 1]);
        assert!(provider.check_generate_key_params(&ok).is_ok());

        let bad_length = params("SHA-256")
            .with_modulus_length(3000)
            .with_public_exponent([1, 0, 1]);
        let err = provider.generate_key(&bad_length, true, usages).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parameter);

        let bad_exponent = params("SHA-256").with_modulus_length(2048).with_public_exponent([5]);
        let err = provider.generate_key(&bad_exponent, true, usages).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parameter);

        let no_hash = Algorithm::new("RSASSA-PKCS1-v1_5")
            .with_modulus_length(2048)
            .with_public_exponent([1, 0, 1]);
        let err = provider.generate_key(&no_hash, true, usages).unwrap_err();
        assert_eq!(err, CryptoError::MissingProperty("hash"));
    }

    #[test]
    fn generated_key_signs_and_verifies() {
        let provider = RsaSsaProvider::default();
        let pair = provider
            .generate_key(
                &params("SHA-512")
                    .with_modulus_length(1024)
                    .with_public_exponent([3]),
                true,
                KeyUsages::from_slice(&[KeyUsage::Sign, KeyUsage::Verify]),
            )
            .unwrap();
        assert_eq!(pair.private_key.algorithm().hash(), Some(HashAlgorithm::Sha512));

        let signature = provider.sign(&params("SHA-512"), &pair.private_key, b"e=3").unwrap();
        assert!(provider.verify(&params("SHA-512"), &pair.public_key, &signature, b"e=3").unwrap());
    }

    #[test]
    fn key_type_checked_per_operation() {
        let provider = RsaSsaProvider::default();
        let (private, public) = key_pair(PK8_1024, SPKI_1024, "SHA-256");
        assert!(provider.check_crypto_key(&private, KeyUsage::Sign).is_ok());
        assert!(provider.check_crypto_key(&public, KeyUsage::Verify).is_ok());
        assert!(matches!(
            provider.check_crypto_key(&public, KeyUsage::Sign),
            Err(CryptoError::UsageNotPermitted(KeyUsage::Sign))
        ));
    }

    #[test]
    fn foreign_key_is_rejected() {
        let provider = RsaSsaProvider::default();
        let es_key = crate::provider::RsaEsProvider::default()
            .import_key(
                KeyFormat::Spki,
                &KeyData::from(SPKI_1024),
                &Algorithm::new("RSAES-PKCS1-v1_5"),
                true,
                KeyUsages::from_slice(&[KeyUsage::Encrypt]),
            )
            .unwrap();
        let err = provider
            .verify(&params("SHA-256"), &es_key, &[0; 128], b"data")
            .unwrap_err();
        assert_eq!(
            err,
            CryptoError::AlgorithmMismatch {
                expected: AlgorithmName::RsaSsaPkcs1v15,
                actual: AlgorithmName::RsaEsPkcs1v15,
            }
        );
    }

    #[test]
    fn export_import_round_trip_keeps_parameters() {
        let provider = RsaSsaProvider::default();
        let (private, public) = key_pair(PK8_1024, SPKI_1024, "SHA-384");

        let cases = [
            (&private, KeyFormat::Pkcs8),
            (&public, KeyFormat::Spki),
            (&private, KeyFormat::Jwk),
        ];
        for (key, format) in cases {
            let exported = provider.export_key(format, key).unwrap();
            let reimported = provider
                .import_key(format, &exported, &params("SHA-384"), true, key.usages())
                .unwrap();
            assert_eq!(reimported.algorithm(), key.algorithm());
            assert_eq!(reimported.key_type(), key.key_type());
        }

        let exported = provider.export_key(KeyFormat::Jwk, &private).unwrap();
        let reimported = provider
            .import_key(KeyFormat::Jwk, &exported, &params("SHA-384"), true, private.usages())
            .unwrap();
        let signature = provider.sign(&params("SHA-384"), &reimported, b"round trip").unwrap();
        assert!(provider.verify(&params("SHA-384"), &public, &signature, b"round trip").unwrap());
    }
}
