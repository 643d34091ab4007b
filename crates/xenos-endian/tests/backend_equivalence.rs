#![cfg(not(target_arch = "wasm32"))]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use xenos_endian::{scalar, Backend};

fn words32(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn words16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect()
}

/// Run `f` on every supported backend and assert they all match the scalar reference.
fn assert_backends_agree(len: usize, f: impl Fn(Backend, &mut [u8])) {
    let mut reference = vec![0xA5u8; len];
    f(Backend::Scalar, &mut reference);
    for backend in Backend::supported() {
        let mut out = vec![0xA5u8; len];
        f(backend, &mut out);
        assert_eq!(out, reference, "{backend:?} diverged from scalar");
    }
}

#[test]
fn small_arrays_agree_exhaustively_across_counts() {
    // Every count from 0 through several lanes, with every sentinel position and a sentinel
    // that never matches.
    for count in 0..=40usize {
        let src16: Vec<u8> = (0..count * 2).map(|i| (i * 7 + 3) as u8).collect();
        let src32: Vec<u8> = (0..count * 4).map(|i| (i * 13 + 1) as u8).collect();

        assert_backends_agree(src16.len(), |b, dst| b.copy_and_swap_16(dst, &src16, count));
        assert_backends_agree(src32.len(), |b, dst| b.copy_and_swap_32(dst, &src32, count));
        assert_backends_agree(src32.len(), |b, dst| {
            b.copy_and_swap_16_in_32(dst, &src32, count)
        });

        let mut sentinels16: Vec<u16> = {
            let mut tmp = vec![0u8; src16.len()];
            scalar::copy_and_swap_16(&mut tmp, &src16, count);
            words16(&tmp)
        };
        sentinels16.push(0xFFFF);
        for sentinel in sentinels16 {
            assert_backends_agree(src16.len(), |b, dst| {
                b.copy_cmp_swap_16(dst, &src16, sentinel, count)
            });
        }

        let mut sentinels32: Vec<u32> = {
            let mut tmp = vec![0u8; src32.len()];
            scalar::copy_and_swap_32(&mut tmp, &src32, count);
            words32(&tmp)
        };
        sentinels32.push(0);
        for sentinel in sentinels32 {
            assert_backends_agree(src32.len(), |b, dst| {
                b.copy_cmp_swap_32(dst, &src32, sentinel, count)
            });
        }
    }
}

#[test]
fn cmp_swap_tail_elements_are_substituted_too() {
    // 4 full lanes of u32 plus a 3-element tail; the sentinel only appears in the tail.
    let count = 19;
    let mut src = vec![0u8; count * 4];
    src[count * 4 - 4..].copy_from_slice(&0xDEAD_BEEFu32.to_be_bytes());

    for backend in Backend::supported() {
        let mut dst = vec![0u8; src.len()];
        backend.copy_cmp_swap_32(&mut dst, &src, 0xDEAD_BEEF, count);
        assert_eq!(words32(&dst)[count - 1], u32::MAX, "{backend:?}");
    }
}

#[test]
fn unaligned_slices_are_accepted() {
    let backing: Vec<u8> = (0u8..=200).collect();
    let src = &backing[1..1 + 4 * 21];
    for backend in Backend::supported() {
        let mut out = vec![0u8; 4 * 21 + 3];
        backend.copy_and_swap_32(&mut out[3..], src, 21);

        let mut expected = vec![0u8; 4 * 21 + 3];
        scalar::copy_and_swap_32(&mut expected[3..], src, 21);
        assert_eq!(out, expected, "{backend:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn swap_32_is_self_inverse(bytes in proptest::collection::vec(any::<u8>(), 0..1024)) {
        let count = bytes.len() / 4;
        for backend in Backend::supported() {
            let mut once = bytes.clone();
            let mut twice = bytes.clone();
            backend.copy_and_swap_32(&mut once, &bytes, count);
            backend.copy_and_swap_32(&mut twice, &once, count);
            prop_assert_eq!(&twice, &bytes);
        }
    }

    #[test]
    fn swap_16_in_32_is_self_inverse(bytes in proptest::collection::vec(any::<u8>(), 0..1024)) {
        let count = bytes.len() / 4;
        let mut once = bytes.clone();
        let mut twice = bytes.clone();
        xenos_endian::copy_and_swap_16_in_32(&mut once, &bytes, count);
        xenos_endian::copy_and_swap_16_in_32(&mut twice, &once, count);
        prop_assert_eq!(twice, bytes);
    }

    #[test]
    fn cmp_swap_32_matches_definition(
        words in proptest::collection::vec(any::<u32>(), 0..600),
        pick in any::<prop::sample::Index>(),
        use_present in any::<bool>(),
    ) {
        let src: Vec<u8> = words.iter().flat_map(|w| w.to_ne_bytes()).collect();
        let sentinel = if use_present && !words.is_empty() {
            words[pick.index(words.len())].swap_bytes()
        } else {
            0x1234_5678
        };

        let expected: Vec<u32> = words
            .iter()
            .map(|e| {
                let swapped = e.swap_bytes();
                if swapped == sentinel { u32::MAX } else { swapped }
            })
            .collect();

        for backend in Backend::supported() {
            let mut dst = vec![0u8; src.len()];
            backend.copy_cmp_swap_32(&mut dst, &src, sentinel, words.len());
            prop_assert_eq!(&words32(&dst), &expected);
        }
    }

    #[test]
    fn cmp_swap_16_backends_agree_on_large_inputs(
        words in proptest::collection::vec(0u16..8, 0..4096),
        sentinel in 0u16..8,
    ) {
        // A tiny value domain makes sentinel hits dense.
        let src: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        let mut reference = vec![0u8; src.len()];
        scalar::copy_cmp_swap_16(&mut reference, &src, sentinel, words.len());
        for backend in Backend::supported() {
            let mut dst = vec![0u8; src.len()];
            backend.copy_cmp_swap_16(&mut dst, &src, sentinel, words.len());
            prop_assert_eq!(&dst, &reference);
        }
    }
}
