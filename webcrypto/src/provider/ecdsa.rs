use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::rand_core::OsRng;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use p256::{PublicKey, SecretKey};

use crate::constants::P256_FIELD_LEN;
use crate::error::{CryptoError, CryptoResult};
use crate::jwk::{JsonWebKey, encode_b64};
use crate::key::{CryptoKey, CryptoKeyPair, EcKeyAlgorithm, KeyAlgorithm, KeyData, KeyMaterial};
use crate::params::Algorithm;
use crate::provider::{Provider, UsagePolicy, check_params_name, new_key_pair};
use crate::types::{AlgorithmName, KeyFormat, KeyType, KeyUsage, KeyUsages, NamedCurve};
use crate::utils::left_pad;

const POLICY: UsagePolicy = UsagePolicy::asymmetric(&[KeyUsage::Verify], &[KeyUsage::Sign]);

const FORMATS: &[KeyFormat] = &[KeyFormat::Raw, KeyFormat::Pkcs8, KeyFormat::Spki, KeyFormat::Jwk];

/**
    ECDSA over P-256.

    Signatures are the WebCrypto fixed-width `r || s` (64 bytes); use
    [`crate::asn::EcdsaSignature`] to convert to and from DER. The hash is
    chosen per call through the `hash` parameter.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdsaProvider;

impl EcdsaProvider {
    fn key_algorithm(curve: NamedCurve) -> KeyAlgorithm {
        KeyAlgorithm::Ec(EcKeyAlgorithm {
            name: AlgorithmName::Ecdsa,
            named_curve: curve,
        })
    }
}

impl Provider for EcdsaProvider {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Ecdsa
    }

    fn usage_policy(&self) -> &UsagePolicy {
        &POLICY
    }

    fn formats(&self) -> &'static [KeyFormat] {
        FORMATS
    }

    fn check_generate_key_params(&self, params: &Algorithm) -> CryptoResult<()> {
        params.curve().map(|_| ())
    }

    fn on_generate_key(
        &self,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKeyPair> {
        let curve = params.curve()?;
        tracing::debug!(%curve, "generating EC key pair");

        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        Ok(new_key_pair(
            &POLICY,
            Self::key_algorithm(curve),
            extractable,
            usages,
            KeyMaterial::EcPublic(public),
            KeyMaterial::EcPrivate(secret),
        ))
    }

    fn on_import_key(
        &self,
        format: KeyFormat,
        key_data: &KeyData,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKey> {
        let curve = params.curve()?;
        let bytes = || {
            key_data
                .as_bytes()
                .ok_or_else(|| CryptoError::invalid_key_data("expected binary key data"))
        };

        let material = match format {
            KeyFormat::Raw => PublicKey::from_sec1_bytes(bytes()?)
                .map(KeyMaterial::EcPublic)
                .map_err(|_| CryptoError::invalid_key_data("not a valid P-256 point"))?,
            KeyFormat::Spki => PublicKey::from_public_key_der(bytes()?)
                .map(KeyMaterial::EcPublic)
                .map_err(CryptoError::invalid_key_data)?,
            KeyFormat::Pkcs8 => SecretKey::from_pkcs8_der(bytes()?)
                .map(KeyMaterial::EcPrivate)
                .map_err(CryptoError::invalid_key_data)?,
            KeyFormat::Jwk => {
                let jwk = key_data
                    .as_jwk()
                    .ok_or_else(|| CryptoError::invalid_key_data("expected a JSON Web Key"))?;
                jwk.check_import(extractable, usages)?;
                material_from_jwk(jwk, curve)?
            }
        };
        Ok(CryptoKey::new(
            Self::key_algorithm(curve),
            extractable,
            usages,
            material,
        ))
    }

    fn on_export_key(&self, format: KeyFormat, key: &CryptoKey) -> CryptoResult<KeyData> {
        match format {
            KeyFormat::Raw | KeyFormat::Spki if key.key_type() != KeyType::Public => {
                Err(key.type_mismatch(KeyType::Public))
            }
            KeyFormat::Raw => {
                let point = key.ec_public_key()?.to_encoded_point(false);
                Ok(KeyData::Bytes(point.as_bytes().to_vec()))
            }
            KeyFormat::Spki => {
                let der = key
                    .ec_public_key()?
                    .to_public_key_der()
                    .map_err(|e| CryptoError::Operation("SPKI encoding", e.to_string()))?;
                Ok(KeyData::Bytes(der.into_vec()))
            }
            KeyFormat::Pkcs8 => {
                let der = key
                    .ec_secret_key()?
                    .to_pkcs8_der()
                    .map_err(|e| CryptoError::Operation("PKCS#8 encoding", e.to_string()))?;
                Ok(KeyData::Bytes(der.as_bytes().to_vec()))
            }
            KeyFormat::Jwk => Ok(KeyData::Jwk(jwk_from_key(key)?)),
        }
    }

    fn check_operation(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        usage: KeyUsage,
        _data: &[u8],
    ) -> CryptoResult<()> {
        check_params_name(self.name(), params)?;
        params.hash_algorithm()?;
        self.check_crypto_key(key, usage)
    }

    fn on_sign(&self, params: &Algorithm, key: &CryptoKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let hash = params.hash_algorithm()?;
        let signing_key = SigningKey::from(key.ec_secret_key()?);
        let signature: Signature = signing_key
            .sign_prehash(&hash.digest(data))
            .map_err(|e| CryptoError::Operation("ECDSA signing", e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn on_verify(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> CryptoResult<bool> {
        let hash = params.hash_algorithm()?;
        if signature.len() != 2 * P256_FIELD_LEN {
            return Ok(false);
        }
        let Ok(public) = key.ec_public_key() else {
            return Ok(false);
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        let verifying_key = VerifyingKey::from(public);
        Ok(verifying_key
            .verify_prehash(&hash.digest(data), &signature)
            .is_ok())
    }
}

fn material_from_jwk(jwk: &JsonWebKey, curve: NamedCurve) -> CryptoResult<KeyMaterial> {
    jwk.expect_kty("EC")?;
    match jwk.crv.as_deref().and_then(|c| NamedCurve::from_name(c.as_bytes())) {
        Some(crv) if crv == curve => {}
        _ => {
            return Err(CryptoError::InvalidKeyData(format!(
                "jwk: crv must be '{curve}'"
            )));
        }
    }

    let pad = |value: Vec<u8>, name: &str| {
        left_pad(&value, P256_FIELD_LEN)
            .ok_or_else(|| CryptoError::InvalidKeyData(format!("jwk: '{name}' is too long")))
    };
    let mut point = vec![0x04];
    point.extend(pad(jwk.member(&jwk.x, "x")?, "x")?);
    point.extend(pad(jwk.member(&jwk.y, "y")?, "y")?);
    let public = PublicKey::from_sec1_bytes(&point)
        .map_err(|_| CryptoError::invalid_key_data("jwk: x, y is not a valid P-256 point"))?;

    if !jwk.is_private() {
        return Ok(KeyMaterial::EcPublic(public));
    }
    let d = pad(jwk.member(&jwk.d, "d")?, "d")?;
    let secret = SecretKey::from_slice(&d)
        .map_err(|_| CryptoError::invalid_key_data("jwk: 'd' is not a valid P-256 scalar"))?;
    if secret.public_key() != public {
        return Err(CryptoError::invalid_key_data(
            "jwk: 'd' does not match the public point",
        ));
    }
    Ok(KeyMaterial::EcPrivate(secret))
}

fn jwk_from_key(key: &CryptoKey) -> CryptoResult<JsonWebKey> {
    let point = key.ec_public_key()?.to_encoded_point(false);
    let (Some(x), Some(y)) = (point.x(), point.y()) else {
        return Err(CryptoError::Operation(
            "JWK encoding",
            "public key is the identity point".into(),
        ));
    };

    let mut jwk = JsonWebKey::new("EC");
    jwk.crv = Some(NamedCurve::P256.to_name().to_owned());
    jwk.x = Some(encode_b64(x));
    jwk.y = Some(encode_b64(y));
    if key.key_type() == KeyType::Private {
        jwk.d = Some(encode_b64(&key.ec_secret_key()?.to_bytes()));
    }
    Ok(jwk.with_attributes(key.extractable(), key.usages()))
}
