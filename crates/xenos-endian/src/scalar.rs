//! Portable reference implementations.
//!
//! These are the semantics every accelerated backend must reproduce bit-for-bit. All routines read
//! `count` elements from `src` and write `count` elements to `dst`; bytes past the last element are
//! left untouched.

#[inline]
pub(crate) fn check_lengths(dst: &[u8], src: &[u8], count: usize, width: usize) -> usize {
    let Some(len) = count.checked_mul(width) else {
        panic!("element count {count} overflows usize");
    };
    assert!(
        src.len() >= len,
        "source too short: {} bytes for {count} x {width}-byte elements",
        src.len()
    );
    assert!(
        dst.len() >= len,
        "destination too short: {} bytes for {count} x {width}-byte elements",
        dst.len()
    );
    len
}

/// Reverse the byte order of each 16-bit element.
pub fn copy_and_swap_16(dst: &mut [u8], src: &[u8], count: usize) {
    let len = check_lengths(dst, src, count, 2);
    for (d, s) in dst[..len].chunks_exact_mut(2).zip(src[..len].chunks_exact(2)) {
        d[0] = s[1];
        d[1] = s[0];
    }
}

/// Reverse the byte order of each 32-bit element.
pub fn copy_and_swap_32(dst: &mut [u8], src: &[u8], count: usize) {
    let len = check_lengths(dst, src, count, 4);
    for (d, s) in dst[..len].chunks_exact_mut(4).zip(src[..len].chunks_exact(4)) {
        d.copy_from_slice(&[s[3], s[2], s[1], s[0]]);
    }
}

/// Exchange the two 16-bit halves of each 32-bit element, keeping the byte order inside each half.
pub fn copy_and_swap_16_in_32(dst: &mut [u8], src: &[u8], count: usize) {
    let len = check_lengths(dst, src, count, 4);
    for (d, s) in dst[..len].chunks_exact_mut(4).zip(src[..len].chunks_exact(4)) {
        d.copy_from_slice(&[s[2], s[3], s[0], s[1]]);
    }
}

/// Byte-swap each 16-bit element, then replace any result equal to `sentinel` with `0xFFFF`.
pub fn copy_cmp_swap_16(dst: &mut [u8], src: &[u8], sentinel: u16, count: usize) {
    let len = check_lengths(dst, src, count, 2);
    for (d, s) in dst[..len].chunks_exact_mut(2).zip(src[..len].chunks_exact(2)) {
        let value = u16::from_ne_bytes([s[0], s[1]]).swap_bytes();
        let value = if value == sentinel { u16::MAX } else { value };
        d.copy_from_slice(&value.to_ne_bytes());
    }
}

/// Byte-swap each 32-bit element, then replace any result equal to `sentinel` with `0xFFFF_FFFF`.
pub fn copy_cmp_swap_32(dst: &mut [u8], src: &[u8], sentinel: u32, count: usize) {
    let len = check_lengths(dst, src, count, 4);
    for (d, s) in dst[..len].chunks_exact_mut(4).zip(src[..len].chunks_exact(4)) {
        let value = u32::from_ne_bytes([s[0], s[1], s[2], s[3]]).swap_bytes();
        let value = if value == sentinel { u32::MAX } else { value };
        d.copy_from_slice(&value.to_ne_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_16_reverses_each_pair() {
        let src = [0x12, 0x34, 0xAB, 0xCD];
        let mut dst = [0u8; 4];
        copy_and_swap_16(&mut dst, &src, 2);
        assert_eq!(dst, [0x34, 0x12, 0xCD, 0xAB]);
    }

    #[test]
    fn swap_32_reverses_each_word() {
        let src = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut dst = [0u8; 8];
        copy_and_swap_32(&mut dst, &src, 2);
        assert_eq!(dst, [0x04, 0x03, 0x02, 0x01, 0x08, 0x07, 0x06, 0x05]);
    }

    #[test]
    fn swap_16_in_32_keeps_bytes_inside_halves() {
        let src = [0x01, 0x02, 0x03, 0x04];
        let mut dst = [0u8; 4];
        copy_and_swap_16_in_32(&mut dst, &src, 1);
        assert_eq!(dst, [0x03, 0x04, 0x01, 0x02]);
    }

    #[test]
    fn cmp_swap_16_substitutes_sentinel_after_swapping() {
        // Guest big-endian indices: 0x0001, 0xBEEF (restart), 0x0002.
        let src = [0x00, 0x01, 0xBE, 0xEF, 0x00, 0x02];
        let mut dst = [0u8; 6];
        copy_cmp_swap_16(&mut dst, &src, 0xBEEF, 3);

        let out: Vec<u16> = dst
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(out, vec![0x0001, 0xFFFF, 0x0002]);
    }

    #[test]
    fn cmp_swap_32_only_matches_swapped_value() {
        // 0x0000_00FF stored big-endian, and its byte-reversed twin which must not match.
        let src = [0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00];
        let mut dst = [0u8; 8];
        copy_cmp_swap_32(&mut dst, &src, 0xFF, 2);

        let out: Vec<u32> = dst
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(out, vec![u32::MAX, 0xFF00_0000]);
    }

    #[test]
    fn bytes_past_count_are_untouched() {
        let src = [0x11, 0x22, 0x33, 0x44, 0x55];
        let mut dst = [0xEE; 5];
        copy_and_swap_32(&mut dst, &src, 1);
        assert_eq!(dst, [0x44, 0x33, 0x22, 0x11, 0xEE]);
    }

    #[test]
    fn zero_count_is_a_no_op() {
        let mut dst = [0xAAu8; 2];
        copy_and_swap_16(&mut dst, &[], 0);
        assert_eq!(dst, [0xAA, 0xAA]);
    }

    #[test]
    #[should_panic(expected = "source too short")]
    fn short_source_panics() {
        let mut dst = [0u8; 8];
        copy_and_swap_32(&mut dst, &[0u8; 7], 2);
    }
}
