use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::waitqueue::AtomicWaker;
use portable_atomic::{AtomicBool, Ordering};

/// One-way NOT_READY -> READY flag. Set by the first message that reaches the cache and never
/// reset, so a consumer blocks on it at most once.
pub struct ReadinessLatch {
    ready: AtomicBool,
    waker: AtomicWaker,
}

impl ReadinessLatch {
    pub const fn new() -> Self {
        ReadinessLatch {
            ready: AtomicBool::new(false),
            waker: AtomicWaker::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Flips the latch without waking the waiter, so it can run inside a critical section.
    /// Returns true only for the call that performed the transition; that caller must `wake`.
    pub(crate) fn mark_ready(&self) -> bool {
        !self.ready.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn wake(&self) {
        self.waker.wake();
    }

    /// Resolves once the latch is ready; immediately on every call after that.
    ///
    /// Only one task may wait at a time (single consumer).
    pub async fn wait(&self) {
        poll_fn(|cx| {
            if self.is_ready() {
                return Poll::Ready(());
            }

            self.waker.register(cx.waker());

            // the writer may have flipped the latch between the check and the registration
            if self.is_ready() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }
}

impl Default for ReadinessLatch {
    fn default() -> Self {
        Self::new()
    }
}
