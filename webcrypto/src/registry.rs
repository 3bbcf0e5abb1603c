use std::collections::HashMap;
use std::sync::Arc;

use crate::config::CryptoConfig;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{CryptoKey, CryptoKeyPair, KeyData};
use crate::params::Algorithm;
use crate::provider::{EcdsaProvider, Provider, RsaEsProvider, RsaSsaProvider};
use crate::types::{AlgorithmName, KeyFormat, KeyUsages};

/**
    Algorithm name → provider table.

    Lookups are case-insensitive and each name maps to exactly one provider;
    registering a second provider for a name replaces the first. Every
    operation resolves the provider from the algorithm parameters (or, for
    export, from the key) and lets the provider run its checks.
*/
#[derive(Clone, Default)]
pub struct Registry {
    providers: HashMap<AlgorithmName, Arc<dyn Provider>>,
}

impl Registry {
    /**
        An empty registry.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        A registry with every built-in provider, configured from `config`.
    */
    pub fn with_defaults(config: &CryptoConfig) -> Self {
        let mut registry = Self::new();
        registry.register(RsaSsaProvider::new(config.rsa_modulus_lengths.clone()));
        registry.register(RsaEsProvider::new(config.rsa_modulus_lengths.clone()));
        registry.register(EcdsaProvider);
        registry
    }

    /**
        Add a provider, returning the one it replaces, if any.
    */
    pub fn register(&mut self, provider: impl Provider + 'static) -> Option<Arc<dyn Provider>> {
        let name = provider.name();
        tracing::debug!(algorithm = %name, "registering provider");
        self.providers.insert(name, Arc::new(provider))
    }

    pub fn provider(&self, name: AlgorithmName) -> Option<&Arc<dyn Provider>> {
        self.providers.get(&name)
    }

    /**
        Resolve an algorithm name as supplied by a caller.
    */
    pub fn get(&self, name: &str) -> CryptoResult<&dyn Provider> {
        AlgorithmName::from_name(name.as_bytes())
            .and_then(|algorithm| self.provider(algorithm))
            .map(|provider| &**provider)
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(name.to_owned()))
    }

    /**
        Registered algorithm names, in a stable order.
    */
    pub fn algorithms(&self) -> Vec<AlgorithmName> {
        let mut names: Vec<_> = self.providers.keys().copied().collect();
        names.sort();
        names
    }

    /**
        The provider for `params.name`, for running checks and hooks
        separately.
    */
    pub fn resolve(
        &self,
        params: &Algorithm,
        operation: &'static str,
    ) -> CryptoResult<Arc<dyn Provider>> {
        let provider = AlgorithmName::from_name(params.name.as_bytes())
            .and_then(|algorithm| self.provider(algorithm))
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(params.name.clone()))?;
        tracing::debug!(algorithm = %provider.name(), operation, "dispatching");
        Ok(Arc::clone(provider))
    }

    /**
        The provider that owns `key`.
    */
    pub fn resolve_key(
        &self,
        key: &CryptoKey,
        operation: &'static str,
    ) -> CryptoResult<Arc<dyn Provider>> {
        let name = key.algorithm().name();
        let provider = self
            .provider(name)
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(name.to_string()))?;
        tracing::debug!(algorithm = %name, operation, "dispatching");
        Ok(Arc::clone(provider))
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    pub fn generate_key(
        &self,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKeyPair> {
        self.resolve(params, "generateKey")?
            .generate_key(params, extractable, usages)
    }

    pub fn import_key(
        &self,
        format: KeyFormat,
        key_data: &KeyData,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKey> {
        self.resolve(params, "importKey")?
            .import_key(format, key_data, params, extractable, usages)
    }

    pub fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> CryptoResult<KeyData> {
        self.resolve_key(key, "exportKey")?.export_key(format, key)
    }

    pub fn sign(&self, params: &Algorithm, key: &CryptoKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
        self.resolve(params, "sign")?.sign(params, key, data)
    }

    pub fn verify(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> CryptoResult<bool> {
        self.resolve(params, "verify")?
            .verify(params, key, signature, data)
    }

    pub fn encrypt(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        self.resolve(params, "encrypt")?.encrypt(params, key, data)
    }

    pub fn decrypt(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        self.resolve(params, "decrypt")?.decrypt(params, key, data)
    }

    pub fn wrap_key_data(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        self.resolve(params, "wrapKey")?
            .wrap_key_data(params, key, data)
    }

    pub fn unwrap_key_data(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        self.resolve(params, "unwrapKey")?
            .unwrap_key_data(params, key, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyUsage;

    #[test]
    fn resolves_names_case_insensitively() {
        let registry = Registry::with_defaults(&CryptoConfig::default());
        assert_eq!(
            registry.get("rsassa-pkcs1-v1_5").unwrap().name(),
            AlgorithmName::RsaSsaPkcs1v15
        );
        assert_eq!(
            registry.get("RSAES-PKCS1-V1_5").unwrap().name(),
            AlgorithmName::RsaEsPkcs1v15
        );
        assert_eq!(registry.get("Ecdsa").unwrap().name(), AlgorithmName::Ecdsa);
    }

    #[test]
    fn unknown_name_is_not_supported() {
        let registry = Registry::with_defaults(&CryptoConfig::default());
        let err = registry.get("RSA-OAEP").err().unwrap();
        assert_eq!(err, CryptoError::UnsupportedAlgorithm("RSA-OAEP".into()));
        assert_eq!(err.kind(), crate::error::ErrorKind::NotSupported);
    }

    #[test]
    fn known_name_without_provider_is_not_supported() {
        let mut registry = Registry::new();
        registry.register(EcdsaProvider);
        assert_eq!(registry.algorithms(), vec![AlgorithmName::Ecdsa]);
        assert!(matches!(
            registry.get("RSASSA-PKCS1-v1_5"),
            Err(CryptoError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn register_replaces_existing_provider() {
        let mut registry = Registry::with_defaults(&CryptoConfig::default());
        let replaced = registry.register(RsaSsaProvider::new(vec![2048]));
        assert!(replaced.is_some());
        assert_eq!(registry.algorithms().len(), 3);
    }

    #[test]
    fn dispatch_uses_configured_lengths() {
        let config = CryptoConfig {
            rsa_modulus_lengths: vec![2048],
            ..CryptoConfig::default()
        };
        let registry = Registry::with_defaults(&config);
        let params = Algorithm::new("RSASSA-PKCS1-v1_5")
            .with_hash("SHA-256")
            .with_modulus_length(1024)
            .with_public_exponent([1, 0, 1]);
        let err = registry
            .generate_key(&params, true, KeyUsages::from_slice(&[KeyUsage::Sign]))
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidParameter { property: "modulusLength", .. }));
    }

    #[test]
    fn sign_and_verify_through_registry() {
        let registry = Registry::with_defaults(&CryptoConfig::default());
        let import = |format, data: &[u8], usage| {
            registry
                .import_key(
                    format,
                    &KeyData::from(data),
                    &Algorithm::new("ECDSA").with_named_curve("P-256"),
                    true,
                    KeyUsages::from_slice(&[usage]),
                )
                .unwrap()
        };
        let private = import(
            KeyFormat::Pkcs8,
            include_bytes!("../testfiles/p256.pk8"),
            KeyUsage::Sign,
        );
        let public = import(
            KeyFormat::Spki,
            include_bytes!("../testfiles/p256.spki"),
            KeyUsage::Verify,
        );

        let params = Algorithm::new("ecdsa").with_hash("SHA-256");
        let signature = registry.sign(&params, &private, b"dispatch").unwrap();
        assert!(registry.verify(&params, &public, &signature, b"dispatch").unwrap());

        let exported = registry.export_key(KeyFormat::Raw, &public).unwrap();
        assert_eq!(exported.as_bytes().unwrap().len(), 65);
    }

    #[test]
    fn key_from_other_algorithm_is_rejected() {
        let registry = Registry::with_defaults(&CryptoConfig::default());
        let key = registry
            .import_key(
                KeyFormat::Spki,
                &KeyData::from(&include_bytes!("../testfiles/p256.spki")[..]),
                &Algorithm::new("ECDSA").with_named_curve("P-256"),
                true,
                KeyUsages::from_slice(&[KeyUsage::Verify]),
            )
            .unwrap();
        let params = Algorithm::new("RSASSA-PKCS1-v1_5").with_hash("SHA-256");
        let err = registry.verify(&params, &key, &[0; 64], b"data").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Usage);
    }
}
