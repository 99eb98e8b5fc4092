//! The producer endpoint: owns a private tail cursor, a batch counter, and
//! a snapshot of the consumer's heartbeat. Never blocks.

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::atomic::Ordering;

use crate::atomics::prefetch_ahead_write;
use crate::control_block::{burst_amount, slot_ptr, ControlBlock};
use crate::error::{AttachError, PushError};

/// Process-local producer endpoint for an `N`-slot ring of `T`.
///
/// `cb` is an unowned reference into shared memory the caller guarantees
/// outlives this endpoint. `N` must be a power of two and must match the
/// capacity the control block was (or will be) initialized with.
pub struct Producer<T, const N: usize> {
    cb: NonNull<ControlBlock>,
    local_tail: u64,
    written_since_sync: u64,
    last_consumer_heartbeat: u64,
    _marker: PhantomData<*mut T>,
}

// SAFETY: a `Producer` may be created in one thread and handed to the
// thread that will drive it; it must not be used from two threads at
// once (enforced by `&mut self` on every mutating method), so `Sync` is
// not implemented.
unsafe impl<T: Send, const N: usize> Send for Producer<T, N> {}

impl<T: Copy, const N: usize> Producer<T, N> {
    const _CHECK_POWER_OF_TWO: () = assert!(N > 0 && (N & (N - 1)) == 0, "N must be a power of two");

    /// Attach to `cb`, initializing it if the region is freshly zeroed.
    ///
    /// # Safety
    /// `cb` must point to at least `ControlBlock::region_size::<T>(N)`
    /// bytes, 128-byte aligned, shared with the peer process, and must
    /// remain valid for the lifetime of the returned `Producer`.
    pub unsafe fn attach(cb: NonNull<ControlBlock>) -> Result<Self, AttachError> {
        let () = Self::_CHECK_POWER_OF_TWO;
        let (tail, heartbeat) = cb.as_ref().attach_producer(N as u64)?;
        Ok(Self {
            cb,
            local_tail: tail,
            written_since_sync: 0,
            last_consumer_heartbeat: heartbeat,
            _marker: PhantomData,
        })
    }

    #[inline]
    fn cb(&self) -> &ControlBlock {
        // SAFETY: caller established validity of `cb` for the lifetime of
        // `self` in `attach`.
        unsafe { self.cb.as_ref() }
    }

    /// Write `value` into the next slot, overwriting it if already
    /// publicly visible. Infallible, never blocks, and publishes in
    /// batches of `B(N)` so the common path only touches shared memory
    /// once per burst.
    #[inline]
    pub fn push(&mut self, value: T) {
        if self.written_since_sync == burst_amount(N as u64) {
            self.cb().tail().store(self.local_tail, Ordering::Release);
            self.written_since_sync = 0;
        }

        // SAFETY: index is masked into [0, N), the pointer is valid for
        // the lifetime of `self`, and this is the sole writer of the
        // slot (the consumer never writes slot contents).
        unsafe {
            let ptr = slot_ptr::<T>(self.cb.as_ptr(), N, self.local_tail);
            ptr.write(value);
            let next = slot_ptr::<T>(self.cb.as_ptr(), N, self.local_tail.wrapping_add(1));
            prefetch_ahead_write(next, 0);
        }

        self.local_tail = self.local_tail.wrapping_add(1);
        self.written_since_sync += 1;
    }

    /// Write `value` into the next slot unless the ring already holds `N`
    /// unconsumed entries. Does not auto-publish; call [`sync`](Self::sync)
    /// to make written values visible to the consumer.
    pub fn push_lossless(&mut self, value: T) -> Result<(), PushError> {
        let head = self.cb().head().load(Ordering::Acquire);
        if self.local_tail.wrapping_sub(head) == N as u64 {
            return Err(PushError::Full);
        }

        // SAFETY: same as `push`; the lossless discipline additionally
        // guarantees this slot has been consumed (head has passed it).
        unsafe {
            let ptr = slot_ptr::<T>(self.cb.as_ptr(), N, self.local_tail);
            ptr.write(value);
        }

        self.local_tail = self.local_tail.wrapping_add(1);
        self.written_since_sync += 1;
        Ok(())
    }

    /// Publish `local_tail` to the control block. Idempotent.
    #[inline]
    pub fn sync(&mut self) {
        self.cb().tail().store(self.local_tail, Ordering::Release);
        self.written_since_sync = 0;
    }

    /// Signal liveness to the consumer.
    #[inline]
    pub fn beat(&self) {
        self.cb().producer_heartbeat().fetch_add(1, Ordering::Release);
    }

    /// Returns `true` exactly once per distinct consumer `beat()` this
    /// producer has not yet observed.
    #[inline]
    pub fn consumer_heartbeat(&mut self) -> bool {
        let heartbeat = self.cb().consumer_heartbeat().load(Ordering::Acquire);
        if heartbeat != self.last_consumer_heartbeat {
            self.last_consumer_heartbeat = heartbeat;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_block::ControlBlock;
    use std::alloc::{alloc_zeroed, dealloc, Layout};

    struct Region {
        ptr: *mut u8,
        layout: Layout,
    }

    impl Region {
        fn new<T>(n: usize) -> Self {
            let size = ControlBlock::region_size::<T>(n);
            let layout = Layout::from_size_align(size, 128).unwrap();
            let ptr = unsafe { alloc_zeroed(layout) };
            assert!(!ptr.is_null());
            Self { ptr, layout }
        }

        fn cb(&self) -> NonNull<ControlBlock> {
            NonNull::new(self.ptr as *mut ControlBlock).unwrap()
        }
    }

    impl Drop for Region {
        fn drop(&mut self) {
            unsafe { dealloc(self.ptr, self.layout) };
        }
    }

    #[test]
    fn initializing_a_zeroed_region_sets_magic_and_capacity() {
        let region = Region::new::<u64>(4);
        let producer: Producer<u64, 4> = unsafe { Producer::attach(region.cb()).unwrap() };
        assert_eq!(producer.cb().capacity(), 4);
        drop(producer);
    }

    #[test]
    fn push_lossless_rejects_when_full_then_accepts_after_head_advances() {
        let region = Region::new::<u64>(4);
        let mut producer: Producer<u64, 4> = unsafe { Producer::attach(region.cb()).unwrap() };

        for i in 0..4u64 {
            producer.push_lossless(i).unwrap();
        }
        assert_eq!(producer.push_lossless(99).unwrap_err(), PushError::Full);

        // simulate the consumer publishing head after consuming one slot
        let cb = unsafe { region.cb().as_ref() };
        cb.head().store(1, Ordering::Release);

        producer.push_lossless(100).unwrap();
    }

    #[test]
    fn burst_publish_cadence() {
        let region = Region::new::<u64>(8);
        let mut producer: Producer<u64, 8> = unsafe { Producer::attach(region.cb()).unwrap() };
        let cb = unsafe { region.cb().as_ref() };

        producer.push(1);
        producer.push(2);
        assert_eq!(cb.tail().load(Ordering::Acquire), 0, "not yet published");

        producer.push(3);
        assert_eq!(cb.tail().load(Ordering::Acquire), 2, "burst of B(8)=2 just published");
    }
}
