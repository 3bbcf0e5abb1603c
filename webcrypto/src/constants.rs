/// Public exponent 3, big-endian.
pub const RSA_EXPONENT_3: &[u8] = &[0x03];

/// Public exponent 65537 (F4), big-endian.
pub const RSA_EXPONENT_65537: &[u8] = &[0x01, 0x00, 0x01];

/// Modulus lengths accepted when no configuration overrides them.
pub const DEFAULT_RSA_MODULUS_LENGTHS: &[usize] = &[1024, 2048, 4096];

/// Bytes of PKCS#1 v1.5 overhead: `0x00 0x0N` + 8 padding bytes + `0x00`.
pub const PKCS1_V15_OVERHEAD: usize = 11;

/// Byte length of a P-256 field element (and of each half of a raw signature).
pub const P256_FIELD_LEN: usize = 32;
