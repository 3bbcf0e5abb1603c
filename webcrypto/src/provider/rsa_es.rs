use crate::constants::DEFAULT_RSA_MODULUS_LENGTHS;
use crate::crypto::padding::{check_message_len, decode_encryption_block, encryption_block};
use crate::crypto::rsa::{modulus_len, private_transform, public_transform};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{CryptoKey, CryptoKeyPair, KeyAlgorithm, KeyData};
use crate::params::Algorithm;
use crate::provider::rsa::{RSA_FORMATS, RsaFamily};
use crate::provider::{Provider, UsagePolicy, check_params_name};
use crate::types::{AlgorithmName, KeyFormat, KeyUsage, KeyUsages};

const POLICY: UsagePolicy = UsagePolicy::asymmetric(
    &[KeyUsage::Encrypt, KeyUsage::WrapKey],
    &[KeyUsage::Decrypt, KeyUsage::UnwrapKey],
);

/**
    RSAES-PKCS1-v1_5 (RFC 8017 §7.2).

    Messages are limited to `k - 11` bytes for a `k`-byte modulus. Decryption
    failures of any kind are reported as [`CryptoError::DecryptionFailed`].
*/
#[derive(Debug, Clone)]
pub struct RsaEsProvider {
    modulus_lengths: Vec<usize>,
}

impl RsaEsProvider {
    pub fn new(modulus_lengths: impl Into<Vec<usize>>) -> Self {
        Self {
            modulus_lengths: modulus_lengths.into(),
        }
    }

    fn family(&self) -> RsaFamily<'_> {
        RsaFamily {
            name: AlgorithmName::RsaEsPkcs1v15,
            policy: &POLICY,
            modulus_lengths: &self.modulus_lengths,
        }
    }
}

impl Default for RsaEsProvider {
    fn default() -> Self {
        Self::new(DEFAULT_RSA_MODULUS_LENGTHS)
    }
}

impl Provider for RsaEsProvider {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::RsaEsPkcs1v15
    }

    fn usage_policy(&self) -> &UsagePolicy {
        &POLICY
    }

    fn formats(&self) -> &'static [KeyFormat] {
        RSA_FORMATS
    }

    fn check_generate_key_params(&self, params: &Algorithm) -> CryptoResult<()> {
        self.family().check_generate_key_params(params)
    }

    fn on_generate_key(
        &self,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKeyPair> {
        self.family().generate_key(params, None, extractable, usages)
    }

    fn on_import_key(
        &self,
        format: KeyFormat,
        key_data: &KeyData,
        _params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKey> {
        self.family()
            .import_key(format, key_data, None, extractable, usages)
    }

    fn on_export_key(&self, format: KeyFormat, key: &CryptoKey) -> CryptoResult<KeyData> {
        self.family().export_key(format, key)
    }

    fn check_operation(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        usage: KeyUsage,
        data: &[u8],
    ) -> CryptoResult<()> {
        check_params_name(self.name(), params)?;
        self.check_crypto_key(key, usage)?;
        if let (KeyUsage::Encrypt | KeyUsage::WrapKey, KeyAlgorithm::Rsa(algorithm)) =
            (usage, key.algorithm())
        {
            check_message_len(data.len(), algorithm.modulus_length.div_ceil(8))?;
        }
        Ok(())
    }

    fn on_encrypt(
        &self,
        _params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let public = key.rsa_public_key()?;
        let block = encryption_block(data, modulus_len(&public))?;
        public_transform(&public, &block)
    }

    fn on_decrypt(
        &self,
        _params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let private = key.rsa_private_key()?;
        let k = modulus_len(private);
        if data.len() != k {
            return Err(CryptoError::DecryptionFailed);
        }
        let block = private_transform(private, data).map_err(|_| CryptoError::DecryptionFailed)?;
        decode_encryption_block(&block, k)
    }
}
