/*!
    Low-level RSA primitives used by the providers.

    - Raw RSA transforms (RSAEP/RSADP, RSASP1/RSAVP1) over `rsa::BigUint`
    - RSA key generation with a caller-chosen public exponent
    - PKCS#1 v1.5 encryption and signature block formatting

    Nothing here checks key usages or algorithm parameters; that is the
    provider layer's job.
*/

pub(crate) mod padding;
pub(crate) mod rsa;
