/*!
    ASN.1 helpers for signature values.

    The tag/length/value layer comes from the `der` crate; this module only
    owns the INTEGER content rules for `r` and `s`, the RFC 3279
    `ECDSA-Sig-Value` structure built from them, and the PKCS#1 DigestInfo.
*/

pub(crate) mod digest_info;
mod ec_signature;

pub mod integer;

pub use self::ec_signature::EcdsaSignature;
