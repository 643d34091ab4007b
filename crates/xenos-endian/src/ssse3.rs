//! SSSE3 (`pshufb`) fast paths.
//!
//! Each routine handles whole 128-bit lanes (8 x u16 or 4 x u32) and hands the remainder to the
//! scalar reference code, so the output matches [`crate::scalar`] for every `count`.
//!
//! Callers must have verified SSSE3 support (see [`crate::Backend::is_supported`]) and checked the
//! slice lengths with [`crate::scalar::check_lengths`].

use core::arch::x86_64::{
    __m128i, _mm_cmpeq_epi16, _mm_cmpeq_epi32, _mm_loadu_si128, _mm_or_si128, _mm_set1_epi16,
    _mm_set1_epi32, _mm_setr_epi8, _mm_shuffle_epi8, _mm_storeu_si128,
};

use crate::scalar;

const LANE_BYTES: usize = 16;

#[target_feature(enable = "ssse3")]
unsafe fn swap16_mask() -> __m128i {
    _mm_setr_epi8(1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13, 12, 15, 14)
}

#[target_feature(enable = "ssse3")]
unsafe fn swap32_mask() -> __m128i {
    _mm_setr_epi8(3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8, 15, 14, 13, 12)
}

#[target_feature(enable = "ssse3")]
unsafe fn swap16_in_32_mask() -> __m128i {
    _mm_setr_epi8(2, 3, 0, 1, 6, 7, 4, 5, 10, 11, 8, 9, 14, 15, 12, 13)
}

/// Shuffle every full lane of `len` bytes through `mask`; returns the number of bytes processed.
#[target_feature(enable = "ssse3")]
unsafe fn shuffle_lanes(dst: &mut [u8], src: &[u8], len: usize, mask: __m128i) -> usize {
    let mut off = 0;
    while off + LANE_BYTES <= len {
        // Safety: `off + 16 <= len <= min(src.len(), dst.len())`; loads/stores are unaligned.
        let input = _mm_loadu_si128(src.as_ptr().add(off) as *const __m128i);
        let output = _mm_shuffle_epi8(input, mask);
        _mm_storeu_si128(dst.as_mut_ptr().add(off) as *mut __m128i, output);
        off += LANE_BYTES;
    }
    off
}

/// # Safety
/// The CPU must support SSSE3 and both slices must hold at least `count * 2` bytes.
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn copy_and_swap_16(dst: &mut [u8], src: &[u8], count: usize) {
    let len = count * 2;
    let done = shuffle_lanes(dst, src, len, swap16_mask());
    scalar::copy_and_swap_16(&mut dst[done..], &src[done..], (len - done) / 2);
}

/// # Safety
/// The CPU must support SSSE3 and both slices must hold at least `count * 4` bytes.
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn copy_and_swap_32(dst: &mut [u8], src: &[u8], count: usize) {
    let len = count * 4;
    let done = shuffle_lanes(dst, src, len, swap32_mask());
    scalar::copy_and_swap_32(&mut dst[done..], &src[done..], (len - done) / 4);
}

/// # Safety
/// The CPU must support SSSE3 and both slices must hold at least `count * 4` bytes.
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn copy_and_swap_16_in_32(dst: &mut [u8], src: &[u8], count: usize) {
    let len = count * 4;
    let done = shuffle_lanes(dst, src, len, swap16_in_32_mask());
    scalar::copy_and_swap_16_in_32(&mut dst[done..], &src[done..], (len - done) / 4);
}

/// # Safety
/// The CPU must support SSSE3 and both slices must hold at least `count * 2` bytes.
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn copy_cmp_swap_16(dst: &mut [u8], src: &[u8], sentinel: u16, count: usize) {
    let len = count * 2;
    let mask = swap16_mask();
    let cmp = _mm_set1_epi16(sentinel as i16);

    let mut off = 0;
    while off + LANE_BYTES <= len {
        let input = _mm_loadu_si128(src.as_ptr().add(off) as *const __m128i);
        let swapped = _mm_shuffle_epi8(input, mask);
        // Matching lanes become all-ones, which is exactly the host restart index.
        let hits = _mm_cmpeq_epi16(swapped, cmp);
        _mm_storeu_si128(
            dst.as_mut_ptr().add(off) as *mut __m128i,
            _mm_or_si128(swapped, hits),
        );
        off += LANE_BYTES;
    }
    scalar::copy_cmp_swap_16(&mut dst[off..], &src[off..], sentinel, (len - off) / 2);
}

/// # Safety
/// The CPU must support SSSE3 and both slices must hold at least `count * 4` bytes.
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn copy_cmp_swap_32(dst: &mut [u8], src: &[u8], sentinel: u32, count: usize) {
    let len = count * 4;
    let mask = swap32_mask();
    let cmp = _mm_set1_epi32(sentinel as i32);

    let mut off = 0;
    while off + LANE_BYTES <= len {
        let input = _mm_loadu_si128(src.as_ptr().add(off) as *const __m128i);
        let swapped = _mm_shuffle_epi8(input, mask);
        let hits = _mm_cmpeq_epi32(swapped, cmp);
        _mm_storeu_si128(
            dst.as_mut_ptr().add(off) as *mut __m128i,
            _mm_or_si128(swapped, hits),
        );
        off += LANE_BYTES;
    }
    scalar::copy_cmp_swap_32(&mut dst[off..], &src[off..], sentinel, (len - off) / 4);
}
