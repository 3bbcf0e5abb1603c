use rsa::hazmat::{rsa_decrypt_and_check, rsa_encrypt};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use crate::error::{CryptoError, CryptoResult};
use crate::utils::left_pad;

/**
    Generate an RSA private key with `bits` modulus bits and the given
    big-endian public exponent.

    CPU-bound: thousands of milliseconds for 4096-bit keys.
    Callers on an async runtime should run this on a blocking thread.
*/
pub fn generate_private_key(bits: usize, public_exponent: &[u8]) -> CryptoResult<RsaPrivateKey> {
    let exponent = BigUint::from_bytes_be(public_exponent);
    let mut rng = rsa::rand_core::OsRng;
    RsaPrivateKey::new_with_exp(&mut rng, bits, &exponent)
        .map_err(|e| CryptoError::Operation("RSA key generation", e.to_string()))
}

/**
    Modulus size in bytes (`k` in RFC 8017).
*/
pub fn modulus_len(key: &impl PublicKeyParts) -> usize {
    key.size()
}

/**
    Modulus size in bits.
*/
pub fn modulus_bits(key: &impl PublicKeyParts) -> usize {
    key.n().bits()
}

/**
    Public-key transform: `input^e mod n` (RSAEP / RSAVP1).

    Input: exactly `k` bytes, interpreted big-endian, strictly less than `n`.
    Output: `k` bytes, left-padded with zeros.
*/
pub fn public_transform(key: &RsaPublicKey, input: &[u8]) -> CryptoResult<Vec<u8>> {
    let m = to_representative(key.n(), modulus_len(key), input)?;
    let c = rsa_encrypt(key, &m)
        .map_err(|e| CryptoError::Operation("RSA transform", e.to_string()))?;
    to_octets(&c, modulus_len(key))
}

/**
    Private-key transform: `input^d mod n` (RSADP / RSASP1).

    Same framing rules as [`public_transform`]. Runs blinded with CRT and
    re-applies the public exponent, so a faulty result is never returned.
*/
pub fn private_transform(key: &RsaPrivateKey, input: &[u8]) -> CryptoResult<Vec<u8>> {
    let c = to_representative(key.n(), modulus_len(key), input)?;
    let mut rng = rsa::rand_core::OsRng;
    let m = rsa_decrypt_and_check(key, Some(&mut rng), &c)
        .map_err(|e| CryptoError::Operation("RSA private transform", e.to_string()))?;
    to_octets(&m, modulus_len(key))
}

/**
    OS2IP with range check: the value must fit `k` bytes and be below `n`.
*/
fn to_representative(n: &BigUint, k: usize, input: &[u8]) -> CryptoResult<BigUint> {
    if input.len() != k {
        return Err(CryptoError::Operation(
            "RSA transform",
            format!("input is {} bytes, expected {k}", input.len()),
        ));
    }
    let value = BigUint::from_bytes_be(input);
    if &value >= n {
        return Err(CryptoError::Operation(
            "RSA transform",
            "input out of range for modulus".into(),
        ));
    }
    Ok(value)
}

/**
    I2OSP: big-endian encoding left-padded to `k` bytes.
*/
fn to_octets(value: &BigUint, k: usize) -> CryptoResult<Vec<u8>> {
    left_pad(&value.to_bytes_be(), k).ok_or_else(|| {
        CryptoError::Operation("RSA transform", "result does not fit modulus".into())
    })
}
