use der::asn1::{Null, ObjectIdentifier, OctetStringRef};
use der::{Encode, Sequence};

use crate::error::{CryptoError, CryptoResult};
use crate::types::HashAlgorithm;

/**
    RFC 5280 §4.1.1.2, with the NULL parameters RFC 8017 requires for the
    SHA family.
*/
#[derive(Sequence)]
struct AlgorithmIdentifier {
    algorithm: ObjectIdentifier,
    parameters: Null,
}

/**
    RFC 8017 §9.2:

    ```text
    DigestInfo ::= SEQUENCE {
        digestAlgorithm AlgorithmIdentifier,
        digest OCTET STRING
    }
    ```
*/
#[derive(Sequence)]
struct DigestInfo<'a> {
    digest_algorithm: AlgorithmIdentifier,
    digest: OctetStringRef<'a>,
}

/**
    DER-encode a DigestInfo for an already computed `digest`.
*/
pub(crate) fn encode(hash: HashAlgorithm, digest: &[u8]) -> CryptoResult<Vec<u8>> {
    let info = DigestInfo {
        digest_algorithm: AlgorithmIdentifier {
            algorithm: hash.oid(),
            parameters: Null,
        },
        digest: OctetStringRef::new(digest).map_err(encode_error)?,
    };
    info.to_der().map_err(encode_error)
}

fn encode_error(e: der::Error) -> CryptoError {
    CryptoError::Operation("DigestInfo encoding", e.to_string())
}
