use core::fmt;

use der::asn1::AnyRef;
use der::{Decode, Encode, Sequence, Tag, Tagged};

use crate::asn::integer;
use crate::error::{CryptoError, CryptoResult};
use crate::utils::{left_pad, trim_leading_zeros};

/**
    RFC 3279 §2.2.3:

    ```text
    ECDSA-Sig-Value ::= SEQUENCE {
        r  INTEGER,
        s  INTEGER
    }
    ```

    The fields hold INTEGER content bytes exactly as produced by
    [`integer::encode`]; the sequence only adds tags and lengths.
*/
#[derive(Sequence)]
struct EcdsaSigValue<'a> {
    r: AnyRef<'a>,
    s: AnyRef<'a>,
}

/**
    An ECDSA signature value `(r, s)`.

    Both components are kept as minimal unsigned big-endian bytes. WebCrypto
    hands signatures around as fixed-width `r || s`; X.509, CMS and TLS use
    the DER `ECDSA-Sig-Value` form. This type converts between the two.
*/
#[derive(Clone, PartialEq, Eq)]
pub struct EcdsaSignature {
    r: Vec<u8>,
    s: Vec<u8>,
}

impl EcdsaSignature {
    pub fn new(r: impl AsRef<[u8]>, s: impl AsRef<[u8]>) -> Self {
        Self {
            r: minimal(r.as_ref()),
            s: minimal(s.as_ref()),
        }
    }

    pub fn r(&self) -> &[u8] {
        &self.r
    }

    pub fn s(&self) -> &[u8] {
        &self.s
    }

    /**
        Split a fixed-width `r || s` signature into its components.
    */
    pub fn from_raw(raw: &[u8]) -> CryptoResult<Self> {
        if raw.is_empty() || raw.len() % 2 != 0 {
            return Err(CryptoError::InvalidSignature(format!(
                "raw signature length {} is not a non-zero even number",
                raw.len()
            )));
        }
        let (r, s) = raw.split_at(raw.len() / 2);
        Ok(Self::new(r, s))
    }

    /**
        Concatenate `r || s`, each left-padded to `field_len` bytes.
    */
    pub fn to_raw(&self, field_len: usize) -> CryptoResult<Vec<u8>> {
        let too_long = || {
            CryptoError::InvalidSignature(format!("component exceeds {field_len} bytes"))
        };
        let mut out = left_pad(&self.r, field_len).ok_or_else(too_long)?;
        out.extend(left_pad(&self.s, field_len).ok_or_else(too_long)?);
        Ok(out)
    }

    /**
        DER-encode as `ECDSA-Sig-Value`.
    */
    pub fn to_der(&self) -> CryptoResult<Vec<u8>> {
        let r = integer::encode(&self.r);
        let s = integer::encode(&self.s);
        let value = EcdsaSigValue {
            r: AnyRef::new(Tag::Integer, &r).map_err(der_error)?,
            s: AnyRef::new(Tag::Integer, &s).map_err(der_error)?,
        };
        value.to_der().map_err(der_error)
    }

    /**
        Parse a DER `ECDSA-Sig-Value`.

        Both components must be non-negative INTEGERs in canonical form;
        trailing data after the sequence is rejected.
    */
    pub fn from_der(bytes: &[u8]) -> CryptoResult<Self> {
        let value = EcdsaSigValue::from_der(bytes).map_err(der_error)?;
        let r = integer_content(value.r, "r")?;
        let s = integer_content(value.s, "s")?;
        Ok(Self {
            r: integer::decode(r),
            s: integer::decode(s),
        })
    }
}

impl fmt::Debug for EcdsaSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaSignature")
            .field("r", &hex::encode(&self.r))
            .field("s", &hex::encode(&self.s))
            .finish()
    }
}

fn minimal(value: &[u8]) -> Vec<u8> {
    match trim_leading_zeros(value) {
        [] => vec![0x00],
        trimmed => trimmed.to_vec(),
    }
}

fn integer_content<'a>(any: AnyRef<'a>, field: &str) -> CryptoResult<&'a [u8]> {
    if any.tag() != Tag::Integer {
        return Err(CryptoError::InvalidSignature(format!(
            "{field}: expected INTEGER, found {}",
            any.tag()
        )));
    }
    let content = any.value();
    if !integer::is_canonical_unsigned(content) {
        return Err(CryptoError::InvalidSignature(format!(
            "{field}: not a canonical non-negative INTEGER"
        )));
    }
    Ok(content)
}

fn der_error(e: der::Error) -> CryptoError {
    CryptoError::InvalidSignature(e.to_string())
}
