/*!
    Canonical INTEGER content encoding for unsigned values.

    An unsigned big-endian magnitude becomes the shortest two's-complement
    byte string that still reads as non-negative:

    - `encode`: prepend `0x00` when the first byte has its high bit set.
    - `decode`: drop a single leading `0x00`, except for the lone byte
      `[0x00]`, which is the encoding of zero and is returned unchanged.

    Input to `encode` is expected in minimal form (see `trim_leading_zeros`
    in the crate utilities); callers holding fixed-width values strip them
    first.
*/

/**
    Encode an unsigned big-endian value as INTEGER content bytes.

    An empty input is zero and encodes as `[0x00]`.
*/
pub fn encode(value: &[u8]) -> Vec<u8> {
    match value.first() {
        None => vec![0x00],
        Some(&first) if first >= 0x80 => {
            let mut out = Vec::with_capacity(value.len() + 1);
            out.push(0x00);
            out.extend_from_slice(value);
            out
        }
        Some(_) => value.to_vec(),
    }
}

/**
    Decode INTEGER content bytes back into an unsigned big-endian value.
*/
pub fn decode(encoded: &[u8]) -> Vec<u8> {
    match encoded {
        [0x00, rest @ ..] if !rest.is_empty() => rest.to_vec(),
        _ => encoded.to_vec(),
    }
}

/**
    Whether `content` is a valid DER INTEGER body for a non-negative value:
    non-empty, sign bit clear and no redundant leading zero.
*/
pub(crate) fn is_canonical_unsigned(content: &[u8]) -> bool {
    match content {
        [] => false,
        [first, ..] if *first >= 0x80 => false,
        [0x00, second, ..] => *second >= 0x80,
        _ => true,
    }
}
