/**
    Const-compatible case-insensitive ASCII byte comparison.
    Slices of different lengths never compare equal.
*/
pub(crate) const fn eq_ignore_ascii_case(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i].to_ascii_lowercase() != b[i].to_ascii_lowercase() {
            return false;
        }
        i += 1;
    }
    true
}

/**
    Left-pad a big-endian integer to exactly `len` bytes.

    Returns `None` when the value needs more than `len` bytes once its
    leading zeros are removed.
*/
pub(crate) fn left_pad(value: &[u8], len: usize) -> Option<Vec<u8>> {
    let value = trim_leading_zeros(value);
    if value.len() > len {
        return None;
    }
    let mut out = vec![0u8; len];
    out[len - value.len()..].copy_from_slice(value);
    Some(out)
}

/**
    Strip leading zero bytes from a big-endian integer, keeping at least one byte.
*/
pub(crate) fn trim_leading_zeros(value: &[u8]) -> &[u8] {
    match value.iter().position(|&b| b != 0) {
        Some(start) => &value[start..],
        None if value.is_empty() => value,
        None => &value[value.len() - 1..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_ignore_case() {
        assert!(eq_ignore_ascii_case(b"rsassa-pkcs1-v1_5", b"RSASSA-PKCS1-v1_5"));
        assert!(!eq_ignore_ascii_case(b"ecdsa", b"ecdh"));
        assert!(!eq_ignore_ascii_case(b"sha-1", b"sha-1 "));
    }

    #[test]
    fn left_pad_fills_to_length() {
        assert_eq!(left_pad(&[0x01, 0x02], 4), Some(vec![0, 0, 1, 2]));
        assert_eq!(left_pad(&[0x00, 0x00, 0x01], 2), Some(vec![0, 1]));
        assert_eq!(left_pad(&[0x01, 0x02, 0x03], 2), None);
    }

    #[test]
    fn trim_keeps_single_zero() {
        assert_eq!(trim_leading_zeros(&[0, 0, 5]), &[5]);
        assert_eq!(trim_leading_zeros(&[0, 0, 0]), &[0]);
        assert_eq!(trim_leading_zeros(&[]), &[] as &[u8]);
    }
}
