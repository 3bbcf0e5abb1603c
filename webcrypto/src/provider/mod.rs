/*!
    Per-algorithm providers.

    A [`Provider`] implements the `on_*` hooks for one algorithm family.
    The provided methods (`generate_key`, `sign`, `decrypt`, ...) run the
    shared parameter, usage and key checks first and only then call the hook,
    so every provider enforces the same contract.
*/

mod ecdsa;
mod rsa;
mod rsa_es;
mod rsa_ssa;

pub use self::ecdsa::EcdsaProvider;
pub use self::rsa_es::RsaEsProvider;
pub use self::rsa_ssa::RsaSsaProvider;

use crate::error::{CryptoError, CryptoResult};
use crate::key::{CryptoKey, CryptoKeyPair, KeyAlgorithm, KeyData, KeyMaterial};
use crate::params::Algorithm;
use crate::types::{AlgorithmName, KeyFormat, KeyType, KeyUsage, KeyUsages};

/**
    Usages a provider allows, per key type.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsagePolicy {
    pub public_key: KeyUsages,
    pub private_key: KeyUsages,
    pub secret_key: KeyUsages,
}

impl UsagePolicy {
    pub const fn asymmetric(public_key: &[KeyUsage], private_key: &[KeyUsage]) -> Self {
        Self {
            public_key: KeyUsages::from_slice(public_key),
            private_key: KeyUsages::from_slice(private_key),
            secret_key: KeyUsages::EMPTY,
        }
    }

    pub const fn for_type(&self, key_type: KeyType) -> KeyUsages {
        match key_type {
            KeyType::Public => self.public_key,
            KeyType::Private => self.private_key,
            KeyType::Secret => self.secret_key,
        }
    }

    pub const fn all(&self) -> KeyUsages {
        self.public_key.union(self.private_key).union(self.secret_key)
    }
}

/**
    One algorithm family's implementation of the crypto contract.

    Implementors supply the identity (`name`, `usage_policy`, `formats`), the
    parameter check and the `on_*` hooks for what they support. Unsupported
    operations keep the default hooks, which fail with
    [`CryptoError::NotSupported`].
*/
pub trait Provider: Send + Sync {
    fn name(&self) -> AlgorithmName;

    fn usage_policy(&self) -> &UsagePolicy;

    fn formats(&self) -> &'static [KeyFormat];

    /**
        Validate generation parameters: required members present and in domain.
    */
    fn check_generate_key_params(&self, params: &Algorithm) -> CryptoResult<()>;

    /**
        Produce a key pair. Parameters and usages are already validated.
    */
    fn on_generate_key(
        &self,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKeyPair>;

    /**
        Decode key data. The format is already known to be supported.
    */
    fn on_import_key(
        &self,
        format: KeyFormat,
        key_data: &KeyData,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKey>;

    fn on_export_key(&self, format: KeyFormat, key: &CryptoKey) -> CryptoResult<KeyData>;

    fn on_sign(
        &self,
        _params: &Algorithm,
        _key: &CryptoKey,
        _data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        Err(self.not_supported("sign"))
    }

    /**
        Must return `Ok(false)` for every malformed or mismatching signature;
        errors are reserved for unsupported operations.
    */
    fn on_verify(
        &self,
        _params: &Algorithm,
        _key: &CryptoKey,
        _signature: &[u8],
        _data: &[u8],
    ) -> CryptoResult<bool> {
        Err(self.not_supported("verify"))
    }

    fn on_encrypt(
        &self,
        _params: &Algorithm,
        _key: &CryptoKey,
        _data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        Err(self.not_supported("encrypt"))
    }

    fn on_decrypt(
        &self,
        _params: &Algorithm,
        _key: &CryptoKey,
        _data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        Err(self.not_supported("decrypt"))
    }

    // ── Shared checks ────────────────────────────────────────────────
    //
    // These read key metadata only, never key material.

    /**
        The key must belong to this provider's algorithm and allow `usage`.
    */
    fn check_crypto_key(&self, key: &CryptoKey, usage: KeyUsage) -> CryptoResult<()> {
        check_key_algorithm(self.name(), key)?;
        if !key.has_usage(usage) {
            return Err(CryptoError::UsageNotPermitted(usage));
        }
        Ok(())
    }

    /**
        Requested usages must be non-empty and each allowed for some key type.
    */
    fn check_key_usages(&self, usages: KeyUsages) -> CryptoResult<()> {
        if usages.is_empty() {
            return Err(CryptoError::EmptyUsages);
        }
        let allowed = self.usage_policy().all();
        match usages.iter().find(|u| !allowed.contains(*u)) {
            Some(usage) => Err(CryptoError::InvalidUsage(usage, self.name())),
            None => Ok(()),
        }
    }

    fn check_format(&self, format: KeyFormat) -> CryptoResult<()> {
        if self.formats().contains(&format) {
            Ok(())
        } else {
            Err(CryptoError::UnsupportedFormat {
                algorithm: self.name(),
                format,
            })
        }
    }

    fn check_generate_key(&self, params: &Algorithm, usages: KeyUsages) -> CryptoResult<()> {
        check_params_name(self.name(), params)?;
        self.check_generate_key_params(params)?;
        self.check_key_usages(usages)
    }

    fn check_import_key(&self, format: KeyFormat, params: &Algorithm) -> CryptoResult<()> {
        check_params_name(self.name(), params)?;
        self.check_format(format)
    }

    /**
        Usages of a decoded key must fit the policy for its key type.
    */
    fn check_imported_key(&self, key: &CryptoKey, usages: KeyUsages) -> CryptoResult<()> {
        let allowed = self.usage_policy().for_type(key.key_type());
        if let Some(usage) = usages.iter().find(|u| !allowed.contains(*u)) {
            return Err(CryptoError::InvalidUsage(usage, self.name()));
        }
        if key.key_type() != KeyType::Public && usages.is_empty() {
            return Err(CryptoError::EmptyUsages);
        }
        Ok(())
    }

    fn check_export_key(&self, format: KeyFormat, key: &CryptoKey) -> CryptoResult<()> {
        self.check_format(format)?;
        check_key_algorithm(self.name(), key)?;
        if !key.extractable() {
            return Err(CryptoError::NotExtractable);
        }
        Ok(())
    }

    /**
        Checks for sign, verify, encrypt, decrypt, wrap and unwrap. `data` is
        the message (not the signature) for providers that bound its size.
    */
    fn check_operation(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        usage: KeyUsage,
        _data: &[u8],
    ) -> CryptoResult<()> {
        check_params_name(self.name(), params)?;
        self.check_crypto_key(key, usage)
    }

    fn not_supported(&self, operation: &'static str) -> CryptoError {
        CryptoError::NotSupported {
            algorithm: self.name(),
            operation,
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    fn generate_key(
        &self,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKeyPair> {
        self.check_generate_key(params, usages)?;
        self.on_generate_key(params, extractable, usages)
    }

    fn import_key(
        &self,
        format: KeyFormat,
        key_data: &KeyData,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKey> {
        self.check_import_key(format, params)?;
        let key = self.on_import_key(format, key_data, params, extractable, usages)?;
        self.check_imported_key(&key, usages)?;
        Ok(key)
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> CryptoResult<KeyData> {
        self.check_export_key(format, key)?;
        self.on_export_key(format, key)
    }

    fn sign(&self, params: &Algorithm, key: &CryptoKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
        self.check_operation(params, key, KeyUsage::Sign, data)?;
        self.on_sign(params, key, data)
    }

    fn verify(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> CryptoResult<bool> {
        self.check_operation(params, key, KeyUsage::Verify, data)?;
        self.on_verify(params, key, signature, data)
    }

    fn encrypt(&self, params: &Algorithm, key: &CryptoKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
        self.check_operation(params, key, KeyUsage::Encrypt, data)?;
        self.on_encrypt(params, key, data)
    }

    fn decrypt(&self, params: &Algorithm, key: &CryptoKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
        self.check_operation(params, key, KeyUsage::Decrypt, data)?;
        self.on_decrypt(params, key, data)
    }

    /**
        Encrypt exported key bytes under a `wrapKey` key.
    */
    fn wrap_key_data(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        self.check_operation(params, key, KeyUsage::WrapKey, data)?;
        self.on_encrypt(params, key, data)
    }

    /**
        Decrypt wrapped key bytes under an `unwrapKey` key.
    */
    fn unwrap_key_data(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        self.check_operation(params, key, KeyUsage::UnwrapKey, data)?;
        self.on_decrypt(params, key, data)
    }
}

pub(super) fn check_params_name(expected: AlgorithmName, params: &Algorithm) -> CryptoResult<()> {
    let actual = params.algorithm_name()?;
    if actual != expected {
        return Err(CryptoError::AlgorithmMismatch { expected, actual });
    }
    Ok(())
}

pub(super) fn check_key_algorithm(expected: AlgorithmName, key: &CryptoKey) -> CryptoResult<()> {
    let actual = key.algorithm().name();
    if actual != expected {
        return Err(CryptoError::AlgorithmMismatch { expected, actual });
    }
    Ok(())
}

/**
    Build a generated key pair: each half gets `policy(type) ∩ usages`, and
    the public half is always extractable.
*/
pub(crate) fn new_key_pair(
    policy: &UsagePolicy,
    algorithm: KeyAlgorithm,
    extractable: bool,
    usages: KeyUsages,
    public: KeyMaterial,
    private: KeyMaterial,
) -> CryptoKeyPair {
    CryptoKeyPair {
        public_key: CryptoKey::new(
            algorithm.clone(),
            true,
            usages.intersection(policy.public_key),
            public,
        ),
        private_key: CryptoKey::new(
            algorithm,
            extractable,
            usages.intersection(policy.private_key),
            private,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGN_POLICY: UsagePolicy =
        UsagePolicy::asymmetric(&[KeyUsage::Verify], &[KeyUsage::Sign]);

    #[test]
    fn policy_by_key_type() {
        assert_eq!(
            SIGN_POLICY.for_type(KeyType::Public),
            KeyUsages::from_slice(&[KeyUsage::Verify])
        );
        assert_eq!(SIGN_POLICY.for_type(KeyType::Secret), KeyUsages::EMPTY);
        assert_eq!(
            SIGN_POLICY.all(),
            KeyUsages::from_slice(&[KeyUsage::Sign, KeyUsage::Verify])
        );
    }

    #[test]
    fn params_name_must_match_provider() {
        let err = check_params_name(AlgorithmName::Ecdsa, &Algorithm::new("RSASSA-PKCS1-v1_5"))
            .unwrap_err();
        assert_eq!(
            err,
            CryptoError::AlgorithmMismatch {
                expected: AlgorithmName::Ecdsa,
                actual: AlgorithmName::RsaSsaPkcs1v15,
            }
        );
        assert!(check_params_name(AlgorithmName::Ecdsa, &Algorithm::new("ecdsa")).is_ok());
    }
}
