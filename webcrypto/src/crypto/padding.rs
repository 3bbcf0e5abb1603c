use rand::{Rng, RngCore};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use crate::constants::PKCS1_V15_OVERHEAD;
use crate::error::{CryptoError, CryptoResult};
use crate::types::HashAlgorithm;

/**
    EME-PKCS1-v1_5 encoding (RFC 8017 §7.2.1 step 2).

    Layout: `0x00 || 0x02 || PS || 0x00 || M`, where PS is at least eight
    random non-zero bytes and the whole block is exactly `k` bytes.
*/
pub fn encryption_block(message: &[u8], k: usize) -> CryptoResult<Vec<u8>> {
    check_message_len(message.len(), k)?;

    let ps_len = k - message.len() - 3;
    let mut block = vec![0u8; k];
    block[1] = 0x02;
    fill_non_zero(&mut block[2..2 + ps_len]);
    block[k - message.len()..].copy_from_slice(message);
    Ok(block)
}

/**
    A `k`-byte modulus carries at most `k - 11` message bytes.
*/
pub fn check_message_len(len: usize, k: usize) -> CryptoResult<()> {
    let max = k.saturating_sub(PKCS1_V15_OVERHEAD);
    if len > max {
        return Err(CryptoError::DataTooLong { len, max });
    }
    Ok(())
}

/**
    EME-PKCS1-v1_5 decoding (RFC 8017 §7.2.2 step 3).

    Every structural check runs over the whole block without early exit,
    and all failures collapse into [`CryptoError::DecryptionFailed`].
*/
pub fn decode_encryption_block(block: &[u8], k: usize) -> CryptoResult<Vec<u8>> {
    if k < PKCS1_V15_OVERHEAD || block.len() != k {
        return Err(CryptoError::DecryptionFailed);
    }

    let first_byte_is_zero = block[0].ct_eq(&0u8);
    let second_byte_is_two = block[1].ct_eq(&2u8);

    // Index of the first zero byte after the 0x00 0x02 header.
    let mut looking_for_index = Choice::from(1u8);
    let mut index = 0u32;
    for (i, byte) in block.iter().enumerate().skip(2) {
        let is_zero = byte.ct_eq(&0u8);
        index.conditional_assign(&(i as u32), looking_for_index & is_zero);
        looking_for_index &= !is_zero;
    }

    // PS must be at least 8 bytes, i.e. the separator sits at index >= 10.
    let ps_long_enough = !index.ct_lt(10);

    let valid = first_byte_is_zero & second_byte_is_two & !looking_for_index & ps_long_enough;
    if bool::from(valid) {
        Ok(block[index as usize + 1..].to_vec())
    } else {
        Err(CryptoError::DecryptionFailed)
    }
}

/**
    EMSA-PKCS1-v1_5 encoding (RFC 8017 §9.2).

    Layout: `0x00 || 0x01 || 0xFF.. || 0x00 || DigestInfo`, padded to `k`
    bytes with at least eight `0xFF` bytes.
*/
pub fn signature_block(hash: HashAlgorithm, message: &[u8], k: usize) -> CryptoResult<Vec<u8>> {
    let digest_info = hash.digest_info(message)?;
    if k < digest_info.len() + PKCS1_V15_OVERHEAD {
        return Err(CryptoError::Operation(
            "PKCS#1 v1.5 signature encoding",
            format!("{k}-byte modulus is too short for {hash}"),
        ));
    }

    let mut block = vec![0xFFu8; k];
    block[0] = 0x00;
    block[1] = 0x01;
    block[k - digest_info.len() - 1] = 0x00;
    block[k - digest_info.len()..].copy_from_slice(&digest_info);
    Ok(block)
}

/**
    Constant-time equality of two byte strings (lengths are not secret).
*/
pub fn blocks_equal(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

fn fill_non_zero(buf: &mut [u8]) {
    let mut rng = rand::rng();
    rng.fill_bytes(buf);
    for byte in buf.iter_mut() {
        while *byte == 0 {
            *byte = rng.random();
        }
    }
}

/// Constant-time `<` for the separator index.
trait CtLt {
    fn ct_lt(&self, other: u32) -> Choice;
}

impl CtLt for u32 {
    fn ct_lt(&self, other: u32) -> Choice {
        // Both operands are far below 2^31, so the borrow lands in the top bit.
        let borrow = self.wrapping_sub(other) >> 31;
        Choice::from(borrow as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encryption_block_layout() {
        let block = encryption_block(b"hello", 64).unwrap();
        assert_eq!(block.len(), 64);
        assert_eq!(&block[..2], &[0x00, 0x02]);
        assert!(block[2..64 - 6].iter().all(|&b| b != 0));
        assert_eq!(block[64 - 6], 0x00);
        assert_eq!(&block[64 - 5..], b"hello");
    }

    #[test]
    fn encryption_block_is_randomized() {
        let a = encryption_block(b"same", 64).unwrap();
        let b = encryption_block(b"same", 64).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn encryption_block_max_length() {
        let max = vec![0xAB; 64 - 11];
        let block = encryption_block(&max, 64).unwrap();
        assert_eq!(decode_encryption_block(&block, 64).unwrap(), max);

        let err = encryption_block(&[0xAB; 64 - 10], 64).unwrap_err();
        assert_eq!(err, CryptoError::DataTooLong { len: 54, max: 53 });
    }

    #[test]
    fn encryption_block_round_trip_empty_message() {
        let block = encryption_block(b"", 32).unwrap();
        assert_eq!(decode_encryption_block(&block, 32).unwrap(), b"");
    }

    #[test]
    fn decode_rejects_bad_header() {
        let mut block = encryption_block(b"data", 64).unwrap();
        block[0] = 0x01;
        assert_eq!(decode_encryption_block(&block, 64), Err(CryptoError::DecryptionFailed));

        let mut block = encryption_block(b"data", 64).unwrap();
        block[1] = 0x01;
        assert_eq!(decode_encryption_block(&block, 64), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn decode_rejects_short_padding() {
        // Separator after only 7 padding bytes.
        let mut block = vec![0x11u8; 64];
        block[0] = 0x00;
        block[1] = 0x02;
        block[9] = 0x00;
        assert_eq!(decode_encryption_block(&block, 64), Err(CryptoError::DecryptionFailed));

        // Exactly 8 padding bytes is fine.
        block[9] = 0x11;
        block[10] = 0x00;
        assert_eq!(decode_encryption_block(&block, 64).unwrap(), vec![0x11; 53]);
    }

    #[test]
    fn decode_rejects_missing_separator() {
        let mut block = vec![0x11u8; 64];
        block[0] = 0x00;
        block[1] = 0x02;
        assert_eq!(decode_encryption_block(&block, 64), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let block = encryption_block(b"data", 64).unwrap();
        assert_eq!(decode_encryption_block(&block[1..], 64), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn signature_block_layout() {
        let block = signature_block(HashAlgorithm::Sha256, b"abc", 128).unwrap();
        let info = HashAlgorithm::Sha256.digest_info(b"abc").unwrap();
        assert_eq!(block.len(), 128);
        assert_eq!(&block[..2], &[0x00, 0x01]);
        let separator = 128 - info.len() - 1;
        assert!(block[2..separator].iter().all(|&b| b == 0xFF));
        assert_eq!(block[separator], 0x00);
        assert_eq!(&block[separator + 1..], info.as_slice());
    }

    #[test]
    fn signature_block_needs_room() {
        // SHA-512 DigestInfo is 83 bytes; 93 is one short.
        assert!(signature_block(HashAlgorithm::Sha512, b"abc", 93).is_err());
        assert!(signature_block(HashAlgorithm::Sha512, b"abc", 94).is_ok());
    }

    #[test]
    fn ct_lt_boundaries() {
        assert!(bool::from(9u32.ct_lt(10)));
        assert!(!bool::from(10u32.ct_lt(10)));
        assert!(!bool::from(200u32.ct_lt(10)));
    }

    #[test]
    fn blocks_equal_checks_length_and_content() {
        assert!(blocks_equal(b"abc", b"abc"));
        assert!(!blocks_equal(b"abc", b"abd"));
        assert!(!blocks_equal(b"abc", b"ab"));
    }
}
