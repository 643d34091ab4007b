//! GPU completion fences as seen by the transient allocator.
//!
//! The allocator never submits work; it only asks whether a fence handed to it by the caller has
//! signaled. Anything that can answer that question (a Vulkan fence wrapper, a timeline value
//! comparison, a test flag) implements [`Fence`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Fence {
    /// Non-blocking status query.
    fn is_signaled(&self) -> bool;

    /// Busy-wait until the fence signals or `timeout` elapses. Returns the final status.
    ///
    /// The default polls [`Fence::is_signaled`] without yielding the thread; backends with a
    /// native wait primitive should override it.
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_signaled() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::hint::spin_loop();
        }
    }
}

impl<F: Fence + ?Sized> Fence for Arc<F> {
    fn is_signaled(&self) -> bool {
        (**self).is_signaled()
    }

    fn wait(&self, timeout: Duration) -> bool {
        (**self).wait(timeout)
    }
}

impl<F: Fence + ?Sized> Fence for &F {
    fn is_signaled(&self) -> bool {
        (**self).is_signaled()
    }

    fn wait(&self, timeout: Duration) -> bool {
        (**self).wait(timeout)
    }
}

/// A fence signaled explicitly from host code.
///
/// Clones share state, so a caller can keep one handle and give the other to an upload. Useful
/// in tests, and as the pre-signaled stand-in required when recorded work is dropped without being
/// submitted.
#[derive(Debug, Clone, Default)]
pub struct ManualFence {
    signaled: Arc<AtomicBool>,
}

impl ManualFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fence that is already complete.
    pub fn signaled() -> Self {
        let fence = Self::new();
        fence.signal();
        fence
    }

    pub fn signal(&self) {
        self.signaled.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.signaled.store(false, Ordering::Release);
    }
}

impl Fence for ManualFence {
    fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = ManualFence::new();
        let b = a.clone();
        assert!(!b.is_signaled());
        a.signal();
        assert!(b.is_signaled());
        b.reset();
        assert!(!a.is_signaled());
    }

    #[test]
    fn wait_times_out_on_unsignaled_fence() {
        let fence = ManualFence::new();
        assert!(!fence.wait(Duration::from_millis(1)));
    }

    #[test]
    fn wait_observes_signal_from_another_thread() {
        let fence = ManualFence::new();
        let remote = fence.clone();
        let handle = std::thread::spawn(move || remote.signal());
        assert!(fence.wait(Duration::from_secs(5)));
        handle.join().unwrap();
    }

    #[test]
    fn pre_signaled_fence_completes_immediately() {
        assert!(ManualFence::signaled().wait(Duration::ZERO));
    }
}
