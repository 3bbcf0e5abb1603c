/*!
    Key handling shared by the RSA providers: parameter checks, generation,
    and PKCS#8 / SPKI / JWK import and export.
*/

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use crate::constants::{RSA_EXPONENT_3, RSA_EXPONENT_65537};
use crate::crypto::rsa::{generate_private_key, modulus_bits};
use crate::error::{CryptoError, CryptoResult};
use crate::jwk::{JsonWebKey, encode_b64};
use crate::key::{CryptoKey, CryptoKeyPair, KeyAlgorithm, KeyData, KeyMaterial, RsaKeyAlgorithm};
use crate::params::{Algorithm, required};
use crate::provider::{UsagePolicy, new_key_pair};
use crate::types::{AlgorithmName, HashAlgorithm, KeyFormat, KeyType, KeyUsages};

pub(super) const RSA_FORMATS: &[KeyFormat] = &[KeyFormat::Pkcs8, KeyFormat::Spki, KeyFormat::Jwk];

/**
    Algorithm identity and limits for one RSA provider.
*/
pub(super) struct RsaFamily<'a> {
    pub name: AlgorithmName,
    pub policy: &'a UsagePolicy,
    pub modulus_lengths: &'a [usize],
}

impl RsaFamily<'_> {
    /**
        `publicExponent` must be `[3]` or `[1,0,1]`; `modulusLength` must be
        in the allow-list.
    */
    pub fn check_generate_key_params(&self, params: &Algorithm) -> CryptoResult<()> {
        let exponent = required(&params.public_exponent, "publicExponent")?;
        if !is_allowed_exponent(exponent) {
            return Err(CryptoError::invalid_parameter(
                "publicExponent",
                "must be [3] or [1,0,1]",
            ));
        }

        let modulus_length = *required(&params.modulus_length, "modulusLength")?;
        if !self.modulus_lengths.contains(&modulus_length) {
            return Err(CryptoError::invalid_parameter(
                "modulusLength",
                format!("must be one of {}", self.allowed_lengths()),
            ));
        }
        Ok(())
    }

    pub fn generate_key(
        &self,
        params: &Algorithm,
        hash: Option<HashAlgorithm>,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKeyPair> {
        let modulus_length = *required(&params.modulus_length, "modulusLength")?;
        let exponent = required(&params.public_exponent, "publicExponent")?;
        tracing::debug!(algorithm = %self.name, modulus_length, "generating RSA key pair");

        let private = generate_private_key(modulus_length, exponent)?;
        let public = private.to_public_key();
        Ok(new_key_pair(
            self.policy,
            self.key_algorithm(&public, hash),
            extractable,
            usages,
            KeyMaterial::RsaPublic(public),
            KeyMaterial::RsaPrivate(private),
        ))
    }

    pub fn import_key(
        &self,
        format: KeyFormat,
        key_data: &KeyData,
        hash: Option<HashAlgorithm>,
        extractable: bool,
        usages: KeyUsages,
    ) -> CryptoResult<CryptoKey> {
        let material = match format {
            KeyFormat::Pkcs8 => {
                let key = RsaPrivateKey::from_pkcs8_der(expect_bytes(key_data)?)
                    .map_err(CryptoError::invalid_key_data)?;
                KeyMaterial::RsaPrivate(key)
            }
            KeyFormat::Spki => {
                let key = RsaPublicKey::from_public_key_der(expect_bytes(key_data)?)
                    .map_err(CryptoError::invalid_key_data)?;
                KeyMaterial::RsaPublic(key)
            }
            KeyFormat::Jwk => {
                let jwk = key_data
                    .as_jwk()
                    .ok_or_else(|| CryptoError::invalid_key_data("expected a JSON Web Key"))?;
                jwk.check_import(extractable, usages)?;
                self.material_from_jwk(jwk, hash)?
            }
            KeyFormat::Raw => {
                return Err(CryptoError::UnsupportedFormat {
                    algorithm: self.name,
                    format,
                });
            }
        };

        let public = match &material {
            KeyMaterial::RsaPrivate(key) => {
                key.validate().map_err(CryptoError::invalid_key_data)?;
                key.to_public_key()
            }
            KeyMaterial::RsaPublic(key) => key.clone(),
            _ => return Err(CryptoError::invalid_key_data("not an RSA key")),
        };
        self.check_imported_key(&public)?;

        Ok(CryptoKey::new(
            self.key_algorithm(&public, hash),
            extractable,
            usages,
            material,
        ))
    }

    pub fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> CryptoResult<KeyData> {
        match format {
            KeyFormat::Pkcs8 => {
                let der = key
                    .rsa_private_key()?
                    .to_pkcs8_der()
                    .map_err(|e| CryptoError::Operation("PKCS#8 encoding", e.to_string()))?;
                Ok(KeyData::Bytes(der.as_bytes().to_vec()))
            }
            KeyFormat::Spki => {
                if key.key_type() != KeyType::Public {
                    return Err(key.type_mismatch(KeyType::Public));
                }
                let der = key
                    .rsa_public_key()?
                    .to_public_key_der()
                    .map_err(|e| CryptoError::Operation("SPKI encoding", e.to_string()))?;
                Ok(KeyData::Bytes(der.into_vec()))
            }
            KeyFormat::Jwk => Ok(KeyData::Jwk(self.jwk_from_key(key)?)),
            KeyFormat::Raw => Err(CryptoError::UnsupportedFormat {
                algorithm: self.name,
                format,
            }),
        }
    }

    fn key_algorithm(&self, key: &RsaPublicKey, hash: Option<HashAlgorithm>) -> KeyAlgorithm {
        KeyAlgorithm::Rsa(RsaKeyAlgorithm {
            name: self.name,
            modulus_length: modulus_bits(key),
            public_exponent: key.e().to_bytes_be(),
            hash,
        })
    }

    fn check_imported_key(&self, key: &RsaPublicKey) -> CryptoResult<()> {
        let bits = modulus_bits(key);
        if !self.modulus_lengths.contains(&bits) {
            return Err(CryptoError::InvalidKeyData(format!(
                "modulus length {bits} is not one of {}",
                self.allowed_lengths()
            )));
        }
        if !is_allowed_exponent(&key.e().to_bytes_be()) {
            return Err(CryptoError::invalid_key_data(
                "public exponent must be 3 or 65537",
            ));
        }
        Ok(())
    }

    fn material_from_jwk(
        &self,
        jwk: &JsonWebKey,
        hash: Option<HashAlgorithm>,
    ) -> CryptoResult<KeyMaterial> {
        jwk.expect_kty("RSA")?;
        if let Some(alg) = &jwk.alg {
            let expected = jwk_alg(self.name, hash);
            if alg != expected {
                return Err(CryptoError::InvalidKeyData(format!(
                    "jwk: alg is '{alg}', expected '{expected}'"
                )));
            }
        }

        let n = BigUint::from_bytes_be(&jwk.member(&jwk.n, "n")?);
        let e = BigUint::from_bytes_be(&jwk.member(&jwk.e, "e")?);
        if !jwk.is_private() {
            let key = RsaPublicKey::new(n, e).map_err(CryptoError::invalid_key_data)?;
            return Ok(KeyMaterial::RsaPublic(key));
        }

        let d = BigUint::from_bytes_be(&jwk.member(&jwk.d, "d")?);
        let p = BigUint::from_bytes_be(&jwk.member(&jwk.p, "p")?);
        let q = BigUint::from_bytes_be(&jwk.member(&jwk.q, "q")?);
        let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(CryptoError::invalid_key_data)?;
        Ok(KeyMaterial::RsaPrivate(key))
    }

    fn jwk_from_key(&self, key: &CryptoKey) -> CryptoResult<JsonWebKey> {
        let public = key.rsa_public_key()?;
        let mut jwk = JsonWebKey::new("RSA");
        jwk.alg = Some(jwk_alg(self.name, key.algorithm().hash()).to_owned());
        jwk.n = Some(encode_b64(&public.n().to_bytes_be()));
        jwk.e = Some(encode_b64(&public.e().to_bytes_be()));

        if key.key_type() == KeyType::Private {
            let private = key.rsa_private_key()?;
            let [p, q] = private.primes() else {
                return Err(CryptoError::Operation(
                    "JWK encoding",
                    "only two-prime RSA keys can be exported".into(),
                ));
            };
            let one = BigUint::from(1u32);
            let d = private.d();
            let dp = d.clone() % (p.clone() - one.clone());
            let dq = d.clone() % (q.clone() - one);
            // p is prime, so q^(p-2) is the inverse of q mod p.
            let qi = q.modpow(&(p.clone() - BigUint::from(2u32)), p);

            jwk.d = Some(encode_b64(&d.to_bytes_be()));
            jwk.p = Some(encode_b64(&p.to_bytes_be()));
            jwk.q = Some(encode_b64(&q.to_bytes_be()));
            jwk.dp = Some(encode_b64(&dp.to_bytes_be()));
            jwk.dq = Some(encode_b64(&dq.to_bytes_be()));
            jwk.qi = Some(encode_b64(&qi.to_bytes_be()));
        }
        Ok(jwk.with_attributes(key.extractable(), key.usages()))
    }

    fn allowed_lengths(&self) -> String {
        self.modulus_lengths
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/**
    JWK `alg` value for an RSA key (RFC 7518 §3.1, §4.1).
*/
pub(super) fn jwk_alg(name: AlgorithmName, hash: Option<HashAlgorithm>) -> &'static str {
    match (name, hash) {
        (AlgorithmName::RsaEsPkcs1v15, _) => "RSA1_5",
        (_, Some(HashAlgorithm::Sha1)) => "RS1",
        (_, Some(HashAlgorithm::Sha384)) => "RS384",
        (_, Some(HashAlgorithm::Sha512)) => "RS512",
        _ => "RS256",
    }
}

fn is_allowed_exponent(exponent: &[u8]) -> bool {
    exponent == RSA_EXPONENT_3 || exponent == RSA_EXPONENT_65537
}

fn expect_bytes(key_data: &KeyData) -> CryptoResult<&[u8]> {
    key_data
        .as_bytes()
        .ok_or_else(|| CryptoError::invalid_key_data("expected binary key data"))
}
