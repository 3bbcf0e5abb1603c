use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::CryptoConfig;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{CryptoKey, CryptoKeyPair, KeyData};
use crate::params::Algorithm;
use crate::registry::Registry;
use crate::types::{HashAlgorithm, KeyFormat, KeyUsage, KeyUsages};

/**
    Async entry point, shaped after WebCrypto's `SubtleCrypto`.

    Each call takes a permit from a semaphore sized by
    [`CryptoConfig::max_in_flight`], then runs the registry operation on
    Tokio's blocking pool. Cloning shares the registry and the permits.

    ```no_run
    # async fn demo() -> webcrypto::CryptoResult<()> {
    use webcrypto::{Algorithm, CryptoConfig, KeyUsage, KeyUsages, SubtleCrypto};

    let subtle = SubtleCrypto::new(CryptoConfig::default())?;
    let params = Algorithm::new("RSASSA-PKCS1-v1_5")
        .with_modulus_length(2048)
        .with_public_exponent([1, 0, 1])
        .with_hash("SHA-256");
    let pair = subtle
        .generate_key(&params, true, KeyUsages::from_slice(&[KeyUsage::Sign, KeyUsage::Verify]))
        .await?;
    let signature = subtle.sign(&params, &pair.private_key, b"hello").await?;
    assert!(subtle.verify(&params, &pair.public_key, &signature, b"hello").await?);
    # Ok(())
    # }
    ```
*/
#[derive(Clone)]
pub struct SubtleCrypto {
    registry: Arc<Registry>,
    permits: Arc<Semaphore>,
}

impl SubtleCrypto {
    /**
        A context with the built-in providers, configured from `config`.
    */
    pub fn new(config: CryptoConfig) -> CryptoResult<Self> {
        config.validate()?;
        Ok(Self::with_registry(
            Registry::with_defaults(&config),
            config.max_in_flight,
        ))
    }

    /**
        A context over a caller-assembled registry.
    */
    pub fn with_registry(registry: Registry, max_in_flight: usize) -> Self {
        Self {
            registry: Arc::new(registry),
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /**
        Run a backend hook on the blocking pool once a permit is free.
        Callers finish every parameter, usage and key check before this.
    */
    async fn run<T, F>(&self, operation: &'static str, f: F) -> CryptoResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> CryptoResult<T> + Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| CryptoError::Worker(e.to_string()))?;
        tracing::trace!(
            operation,
            available = self.permits.available_permits(),
            "scheduling on blocking pool"
        );
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| CryptoError::Worker(e.to_string()))?
    }

    pub async fn generate_key(
        &self,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKeyPair> {
        let provider = self.registry.resolve(params, "generateKey")?;
        provider.check_generate_key(params, usages)?;
        let params = params.clone();
        self.run("generateKey", move || {
            provider.on_generate_key(&params, extractable, usages)
        })
        .await
    }

    pub async fn import_key(
        &self,
        format: KeyFormat,
        key_data: KeyData,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKey> {
        let provider = self.registry.resolve(params, "importKey")?;
        provider.check_import_key(format, params)?;
        let params = params.clone();
        self.run("importKey", move || {
            let key = provider.on_import_key(format, &key_data, &params, extractable, usages)?;
            provider.check_imported_key(&key, usages)?;
            Ok(key)
        })
        .await
    }

    pub async fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> CryptoResult<KeyData> {
        let provider = self.registry.resolve_key(key, "exportKey")?;
        provider.check_export_key(format, key)?;
        let key = key.clone();
        self.run("exportKey", move || provider.on_export_key(format, &key))
            .await
    }

    pub async fn sign(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let provider = self.registry.resolve(params, "sign")?;
        provider.check_operation(params, key, KeyUsage::Sign, data)?;
        let (params, key, data) = (params.clone(), key.clone(), data.to_vec());
        self.run("sign", move || provider.on_sign(&params, &key, &data))
            .await
    }

    pub async fn verify(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> CryptoResult<bool> {
        let provider = self.registry.resolve(params, "verify")?;
        provider.check_operation(params, key, KeyUsage::Verify, data)?;
        let (params, key) = (params.clone(), key.clone());
        let (signature, data) = (signature.to_vec(), data.to_vec());
        self.run("verify", move || {
            provider.on_verify(&params, &key, &signature, &data)
        })
        .await
    }

    pub async fn encrypt(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let provider = self.registry.resolve(params, "encrypt")?;
        provider.check_operation(params, key, KeyUsage::Encrypt, data)?;
        let (params, key, data) = (params.clone(), key.clone(), data.to_vec());
        self.run("encrypt", move || provider.on_encrypt(&params, &key, &data))
            .await
    }

    pub async fn decrypt(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let provider = self.registry.resolve(params, "decrypt")?;
        provider.check_operation(params, key, KeyUsage::Decrypt, data)?;
        let (params, key, data) = (params.clone(), key.clone(), data.to_vec());
        self.run("decrypt", move || provider.on_decrypt(&params, &key, &data))
            .await
    }

    /**
        Digest `data` with the hash named by `params.name`.
    */
    pub async fn digest(&self, params: &Algorithm, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let hash = HashAlgorithm::from_name(params.name.as_bytes())
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(params.name.clone()))?;
        let data = data.to_vec();
        self.run("digest", move || Ok(hash.digest(&data))).await
    }

    /**
        Export `key` in `format` and encrypt the result with `wrapping_key`.
        JWKs are wrapped as their JSON text.
    */
    pub async fn wrap_key(
        &self,
        format: KeyFormat,
        key: &CryptoKey,
        wrapping_key: &CryptoKey,
        wrap_params: &Algorithm,
    ) -> CryptoResult<Vec<u8>> {
        let exporter = self.registry.resolve_key(key, "exportKey")?;
        exporter.check_export_key(format, key)?;
        let wrapper = self.registry.resolve(wrap_params, "wrapKey")?;
        wrapper.check_operation(wrap_params, wrapping_key, KeyUsage::WrapKey, &[])?;

        let (key, wrapping_key) = (key.clone(), wrapping_key.clone());
        let wrap_params = wrap_params.clone();
        self.run("wrapKey", move || {
            let exported = exporter.on_export_key(format, &key)?.to_bytes()?;
            wrapper.wrap_key_data(&wrap_params, &wrapping_key, &exported)
        })
        .await
    }

    /**
        Decrypt `wrapped` with `unwrapping_key` and import the result.
    */
    #[allow(clippy::too_many_arguments)]
    pub async fn unwrap_key(
        &self,
        format: KeyFormat,
        wrapped: &[u8],
        unwrapping_key: &CryptoKey,
        unwrap_params: &Algorithm,
        key_params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKey> {
        let unwrapper = self.registry.resolve(unwrap_params, "unwrapKey")?;
        unwrapper.check_operation(unwrap_params, unwrapping_key, KeyUsage::UnwrapKey, wrapped)?;
        let importer = self.registry.resolve(key_params, "importKey")?;
        importer.check_import_key(format, key_params)?;

        let (wrapped, unwrapping_key) = (wrapped.to_vec(), unwrapping_key.clone());
        let (unwrap_params, key_params) = (unwrap_params.clone(), key_params.clone());
        self.run("unwrapKey", move || {
            let bytes = unwrapper.on_decrypt(&unwrap_params, &unwrapping_key, &wrapped)?;
            let key_data = KeyData::from_bytes(format, bytes)?;
            let key = importer.on_import_key(format, &key_data, &key_params, extractable, usages)?;
            importer.check_imported_key(&key, usages)?;
            Ok(key)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyType;
    use hex_literal::hex;
    use std::time::Duration;

    fn subtle() -> SubtleCrypto {
        SubtleCrypto::new(CryptoConfig::default()).unwrap()
    }

    fn usages(usages: &[KeyUsage]) -> KeyUsages {
        KeyUsages::from_slice(usages)
    }

    async fn rsa_es_pair(subtle: &SubtleCrypto) -> (CryptoKey, CryptoKey) {
        let params = Algorithm::new("RSAES-PKCS1-v1_5");
        let public = subtle
            .import_key(
                KeyFormat::Spki,
                KeyData::from(&include_bytes!("../testfiles/rsa2048.spki")[..]),
                &params,
                true,
                usages(&[KeyUsage::Encrypt, KeyUsage::WrapKey]),
            )
            .await
            .unwrap();
        let private = subtle
            .import_key(
                KeyFormat::Pkcs8,
                KeyData::from(&include_bytes!("../testfiles/rsa2048.pk8")[..]),
                &params,
                false,
                usages(&[KeyUsage::Decrypt, KeyUsage::UnwrapKey]),
            )
            .await
            .unwrap();
        (public, private)
    }

    #[tokio::test]
    async fn generate_sign_verify() {
        let subtle = subtle();
        let params = Algorithm::new("RSASSA-PKCS1-v1_5")
            .with_modulus_length(1024)
            .with_public_exponent([1, 0, 1])
            .with_hash("SHA-256");
        let pair = subtle
            .generate_key(&params, true, usages(&[KeyUsage::Sign, KeyUsage::Verify]))
            .await
            .unwrap();
        assert_eq!(pair.public_key.key_type(), KeyType::Public);

        let signature = subtle.sign(&params, &pair.private_key, b"async").await.unwrap();
        assert!(subtle.verify(&params, &pair.public_key, &signature, b"async").await.unwrap());
        assert!(!subtle.verify(&params, &pair.public_key, &signature, b"sync").await.unwrap());
    }

    #[tokio::test]
    async fn encrypt_decrypt() {
        let subtle = subtle();
        let (public, private) = rsa_es_pair(&subtle).await;
        let params = Algorithm::new("RSAES-PKCS1-v1_5");

        let ciphertext = subtle.encrypt(&params, &public, b"payload").await.unwrap();
        assert_eq!(ciphertext.len(), 256);
        assert_eq!(subtle.decrypt(&params, &private, &ciphertext).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn wrap_and_unwrap_ec_key() {
        let subtle = subtle();
        let (wrapping, unwrapping) = rsa_es_pair(&subtle).await;
        let ec_params = Algorithm::new("ECDSA").with_named_curve("P-256");
        let wrap_params = Algorithm::new("RSAES-PKCS1-v1_5");

        let pair = subtle
            .generate_key(&ec_params, true, usages(&[KeyUsage::Sign, KeyUsage::Verify]))
            .await
            .unwrap();

        let wrapped = subtle
            .wrap_key(KeyFormat::Pkcs8, &pair.private_key, &wrapping, &wrap_params)
            .await
            .unwrap();
        let unwrapped = subtle
            .unwrap_key(
                KeyFormat::Pkcs8,
                &wrapped,
                &unwrapping,
                &wrap_params,
                &ec_params,
                false,
                usages(&[KeyUsage::Sign]),
            )
            .await
            .unwrap();
        assert!(!unwrapped.extractable());

        let sign_params = Algorithm::new("ECDSA").with_hash("SHA-256");
        let signature = subtle.sign(&sign_params, &unwrapped, b"wrapped").await.unwrap();
        let valid = subtle
            .verify(&sign_params, &pair.public_key, &signature, b"wrapped")
            .await
            .unwrap();
        assert!(valid);
    }

    #[tokio::test]
    async fn wrap_requires_wrap_key_usage() {
        let subtle = subtle();
        let params = Algorithm::new("RSAES-PKCS1-v1_5");
        let encrypt_only = subtle
            .import_key(
                KeyFormat::Spki,
                KeyData::from(&include_bytes!("../testfiles/rsa2048.spki")[..]),
                &params,
                true,
                usages(&[KeyUsage::Encrypt]),
            )
            .await
            .unwrap();
        let err = subtle
            .wrap_key(KeyFormat::Spki, &encrypt_only, &encrypt_only, &params)
            .await
            .unwrap_err();
        assert_eq!(err, CryptoError::UsageNotPermitted(KeyUsage::WrapKey));
    }

    #[tokio::test]
    async fn digest_vectors() {
        let subtle = subtle();
        let digest = subtle.digest(&Algorithm::new("SHA-256"), b"abc").await.unwrap();
        assert_eq!(
            digest,
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        let digest = subtle.digest(&Algorithm::new("sha-1"), b"abc").await.unwrap();
        assert_eq!(digest, hex!("a9993e364706816aba3e25717850c26c9cd0d89d"));

        let err = subtle.digest(&Algorithm::new("MD5"), b"abc").await.unwrap_err();
        assert_eq!(err, CryptoError::UnsupportedAlgorithm("MD5".into()));
    }

    #[tokio::test]
    async fn concurrent_calls_share_keys() {
        let subtle = SubtleCrypto::new(CryptoConfig {
            max_in_flight: 2,
            ..CryptoConfig::default()
        })
        .unwrap();
        let params = Algorithm::new("ECDSA").with_named_curve("P-256").with_hash("SHA-256");
        let pair = subtle
            .generate_key(&params, true, usages(&[KeyUsage::Sign, KeyUsage::Verify]))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..8u8)
            .map(|i| {
                let subtle = subtle.clone();
                let pair = pair.clone();
                let params = params.clone();
                tokio::spawn(async move {
                    let message = [i; 16];
                    let signature = subtle.sign(&params, &pair.private_key, &message).await?;
                    subtle.verify(&params, &pair.public_key, &signature, &message).await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }
    }

    #[tokio::test]
    async fn checks_fail_while_every_permit_is_held() {
        let subtle = SubtleCrypto::new(CryptoConfig {
            max_in_flight: 1,
            ..CryptoConfig::default()
        })
        .unwrap();
        let (public, _) = rsa_es_pair(&subtle).await;
        let _busy = Arc::clone(&subtle.permits).acquire_owned().await.unwrap();
        let limit = Duration::from_secs(1);

        let params = Algorithm::new("RSASSA-PKCS1-v1_5")
            .with_hash("SHA-256")
            .with_modulus_length(3000)
            .with_public_exponent([1, 0, 1]);
        let err = tokio::time::timeout(
            limit,
            subtle.generate_key(&params, true, usages(&[KeyUsage::Sign])),
        )
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidParameter { property: "modulusLength", .. }));

        let es_params = Algorithm::new("RSAES-PKCS1-v1_5");
        let err = tokio::time::timeout(limit, subtle.decrypt(&es_params, &public, &[0; 256]))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err, CryptoError::UsageNotPermitted(KeyUsage::Decrypt));

        let err = tokio::time::timeout(limit, subtle.encrypt(&es_params, &public, &[0; 246]))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err, CryptoError::DataTooLong { len: 246, max: 245 });

        let err = tokio::time::timeout(limit, subtle.export_key(KeyFormat::Raw, &public))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotSupported);
    }

    #[test]
    fn invalid_config_rejected() {
        let err = SubtleCrypto::new(CryptoConfig {
            max_in_flight: 0,
            ..CryptoConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, CryptoError::InvalidConfig(_)));
    }
}
