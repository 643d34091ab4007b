//! Guest byte-order conversion for GPU uploads.
//!
//! Xenos guest memory is big-endian; vertex, index and constant data must be converted to host
//! order before the host GPU can read it. This crate provides:
//! - The portable reference routines in [`scalar`].
//! - An SSSE3 fast path on x86_64, selected at runtime (see [`Backend`]).
//! - Free functions that dispatch through [`Backend::active`].
//!
//! Every backend produces byte-identical output for every input; the fast path only changes how
//! many elements are processed per step.
//!
//! The SIMD path can be disabled with `XENOS_DISABLE_SIMD_SWAP=1`, which is useful when bisecting
//! a suspected backend mismatch.

pub mod scalar;

#[cfg(target_arch = "x86_64")]
mod ssse3;

use std::sync::OnceLock;

/// Env var that forces the scalar backend even when a vector backend is available.
pub const DISABLE_SIMD_SWAP_ENV: &str = "XENOS_DISABLE_SIMD_SWAP";

fn env_var_truthy(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };

    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

/// Implementation strategy for the copy routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Portable element-at-a-time loop. Always available.
    Scalar,
    /// 128-bit `pshufb` lanes, with a scalar tail.
    Ssse3,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Scalar, Backend::Ssse3];

    /// Whether this backend can run on the current CPU.
    pub fn is_supported(self) -> bool {
        match self {
            Backend::Scalar => true,
            Backend::Ssse3 => ssse3_detected(),
        }
    }

    /// All backends that can run on the current CPU, scalar first.
    pub fn supported() -> impl Iterator<Item = Backend> {
        Self::ALL.into_iter().filter(|b| b.is_supported())
    }

    /// The backend used by the free functions of this crate.
    ///
    /// Detection runs once per process; [`DISABLE_SIMD_SWAP_ENV`] is read at that point.
    pub fn active() -> Backend {
        static ACTIVE: OnceLock<Backend> = OnceLock::new();
        *ACTIVE.get_or_init(|| select_backend(env_var_truthy(DISABLE_SIMD_SWAP_ENV)))
    }

    /// Reverse the byte order of each of `count` 16-bit elements.
    ///
    /// # Panics
    /// If either slice is shorter than `count * 2` bytes.
    pub fn copy_and_swap_16(self, dst: &mut [u8], src: &[u8], count: usize) {
        scalar::check_lengths(dst, src, count, 2);
        #[cfg(target_arch = "x86_64")]
        {
            if self == Backend::Ssse3 && ssse3_detected() {
                // Safety: SSSE3 support was detected and the lengths were checked above.
                unsafe { ssse3::copy_and_swap_16(dst, src, count) };
                return;
            }
        }
        scalar::copy_and_swap_16(dst, src, count);
    }

    /// Reverse the byte order of each of `count` 32-bit elements.
    ///
    /// # Panics
    /// If either slice is shorter than `count * 4` bytes.
    pub fn copy_and_swap_32(self, dst: &mut [u8], src: &[u8], count: usize) {
        scalar::check_lengths(dst, src, count, 4);
        #[cfg(target_arch = "x86_64")]
        {
            if self == Backend::Ssse3 && ssse3_detected() {
                // Safety: SSSE3 support was detected and the lengths were checked above.
                unsafe { ssse3::copy_and_swap_32(dst, src, count) };
                return;
            }
        }
        scalar::copy_and_swap_32(dst, src, count);
    }

    /// Swap the 16-bit halves of each of `count` 32-bit elements.
    ///
    /// # Panics
    /// If either slice is shorter than `count * 4` bytes.
    pub fn copy_and_swap_16_in_32(self, dst: &mut [u8], src: &[u8], count: usize) {
        scalar::check_lengths(dst, src, count, 4);
        #[cfg(target_arch = "x86_64")]
        {
            if self == Backend::Ssse3 && ssse3_detected() {
                // Safety: SSSE3 support was detected and the lengths were checked above.
                unsafe { ssse3::copy_and_swap_16_in_32(dst, src, count) };
                return;
            }
        }
        scalar::copy_and_swap_16_in_32(dst, src, count);
    }

    /// Byte-swap `count` 16-bit elements, mapping `sentinel` to `0xFFFF`.
    ///
    /// # Panics
    /// If either slice is shorter than `count * 2` bytes.
    pub fn copy_cmp_swap_16(self, dst: &mut [u8], src: &[u8], sentinel: u16, count: usize) {
        scalar::check_lengths(dst, src, count, 2);
        #[cfg(target_arch = "x86_64")]
        {
            if self == Backend::Ssse3 && ssse3_detected() {
                // Safety: SSSE3 support was detected and the lengths were checked above.
                unsafe { ssse3::copy_cmp_swap_16(dst, src, sentinel, count) };
                return;
            }
        }
        scalar::copy_cmp_swap_16(dst, src, sentinel, count);
    }

    /// Byte-swap `count` 32-bit elements, mapping `sentinel` to `0xFFFF_FFFF`.
    ///
    /// # Panics
    /// If either slice is shorter than `count * 4` bytes.
    pub fn copy_cmp_swap_32(self, dst: &mut [u8], src: &[u8], sentinel: u32, count: usize) {
        scalar::check_lengths(dst, src, count, 4);
        #[cfg(target_arch = "x86_64")]
        {
            if self == Backend::Ssse3 && ssse3_detected() {
                // Safety: SSSE3 support was detected and the lengths were checked above.
                unsafe { ssse3::copy_cmp_swap_32(dst, src, sentinel, count) };
                return;
            }
        }
        scalar::copy_cmp_swap_32(dst, src, sentinel, count);
    }
}

fn select_backend(disable_simd: bool) -> Backend {
    if !disable_simd && Backend::Ssse3.is_supported() {
        Backend::Ssse3
    } else {
        Backend::Scalar
    }
}

#[cfg(target_arch = "x86_64")]
fn ssse3_detected() -> bool {
    std::arch::is_x86_feature_detected!("ssse3")
}

#[cfg(not(target_arch = "x86_64"))]
fn ssse3_detected() -> bool {
    false
}

/// [`Backend::copy_and_swap_16`] on the active backend.
pub fn copy_and_swap_16(dst: &mut [u8], src: &[u8], count: usize) {
    Backend::active().copy_and_swap_16(dst, src, count);
}

/// [`Backend::copy_and_swap_32`] on the active backend.
pub fn copy_and_swap_32(dst: &mut [u8], src: &[u8], count: usize) {
    Backend::active().copy_and_swap_32(dst, src, count);
}

/// [`Backend::copy_and_swap_16_in_32`] on the active backend.
pub fn copy_and_swap_16_in_32(dst: &mut [u8], src: &[u8], count: usize) {
    Backend::active().copy_and_swap_16_in_32(dst, src, count);
}

/// [`Backend::copy_cmp_swap_16`] on the active backend.
pub fn copy_cmp_swap_16(dst: &mut [u8], src: &[u8], sentinel: u16, count: usize) {
    Backend::active().copy_cmp_swap_16(dst, src, sentinel, count);
}

/// [`Backend::copy_cmp_swap_32`] on the active backend.
pub fn copy_cmp_swap_32(dst: &mut [u8], src: &[u8], sentinel: u32, count: usize) {
    Backend::active().copy_cmp_swap_32(dst, src, sentinel, count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_is_always_supported() {
        assert!(Backend::Scalar.is_supported());
        assert_eq!(Backend::supported().next(), Some(Backend::Scalar));
    }

    #[test]
    fn simd_opt_out_selects_scalar() {
        assert_eq!(select_backend(true), Backend::Scalar);
    }

    #[test]
    fn selection_prefers_simd_when_available() {
        let expected = if Backend::Ssse3.is_supported() {
            Backend::Ssse3
        } else {
            Backend::Scalar
        };
        assert_eq!(select_backend(false), expected);
    }

    #[test]
    fn unsupported_backend_falls_back_to_scalar_output() {
        // Whatever the host supports, asking for SSSE3 must never produce different bytes.
        let src: Vec<u8> = (0u8..=37).collect();
        let mut a = vec![0u8; src.len()];
        let mut b = vec![0u8; src.len()];
        Backend::Ssse3.copy_and_swap_32(&mut a, &src, 9);
        Backend::Scalar.copy_and_swap_32(&mut b, &src, 9);
        assert_eq!(a, b);
    }

    #[test]
    fn env_var_truthy_accepts_common_spellings() {
        // Use a name nothing else in the test binary reads.
        let name = "XENOS_ENDIAN_TEST_TRUTHY";
        for v in ["1", "true", "YES", " on "] {
            std::env::set_var(name, v);
            assert!(env_var_truthy(name), "{v:?} should be truthy");
        }
        std::env::set_var(name, "0");
        assert!(!env_var_truthy(name));
        std::env::remove_var(name);
        assert!(!env_var_truthy(name));
    }
}
