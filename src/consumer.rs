//! The consumer endpoint: owns a private head cursor and a snapshot of the
//! producer's heartbeat.

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::atomic::Ordering;

use crate::atomics::prefetch_ahead;
use crate::control_block::{burst_amount, slot_ptr, ControlBlock};
use crate::error::{AttachError, PopError};

/// Bound on the lossy `pop` overrun-retry loop. A single reset always
/// makes forward progress (see the spec's bounded-retry design note); this
/// is a diagnostic backstop, not a normal exit path.
const MAX_POP_RETRIES: u32 = 8;

/// Process-local consumer endpoint for an `N`-slot ring of `T`.
pub struct Consumer<T, const N: usize> {
    cb: NonNull<ControlBlock>,
    local_head: u64,
    last_producer_heartbeat: u64,
    _marker: PhantomData<*const T>,
}

unsafe impl<T: Send, const N: usize> Send for Consumer<T, N> {}

impl<T: Copy, const N: usize> Consumer<T, N> {
    const _CHECK_POWER_OF_TWO: () = assert!(N > 0 && (N & (N - 1)) == 0, "N must be a power of two");

    /// Join an already-initialized control block.
    ///
    /// # Safety
    /// `cb` must point to at least `ControlBlock::region_size::<T>(N)`
    /// bytes, 128-byte aligned, shared with the peer process, and must
    /// remain valid for the lifetime of the returned `Consumer`.
    pub unsafe fn join(cb: NonNull<ControlBlock>) -> Result<Self, AttachError> {
        let () = Self::_CHECK_POWER_OF_TWO;
        let (head, heartbeat) = cb.as_ref().join_consumer(N as u64)?;
        Ok(Self {
            cb,
            local_head: head,
            last_producer_heartbeat: heartbeat,
            _marker: PhantomData,
        })
    }

    #[inline]
    fn cb(&self) -> &ControlBlock {
        unsafe { self.cb.as_ref() }
    }

    /// Bounded-retry lossy pop: speculatively reads a slot, then validates
    /// the read was neither stale nor overrun. Values overwritten before
    /// validation are silently skipped and the cursor jumps past them.
    pub fn pop(&mut self) -> Result<T, PopError> {
        for _ in 0..MAX_POP_RETRIES {
            // SAFETY: index is masked into [0, N); the slot may be torn by
            // a concurrent producer write, but that is exactly what the
            // overrun check below detects and discards.
            let value = unsafe {
                let ptr = slot_ptr::<T>(self.cb.as_ptr(), N, self.local_head);
                let next = slot_ptr::<T>(self.cb.as_ptr(), N, self.local_head.wrapping_add(1));
                prefetch_ahead(next, 0);
                ptr.read()
            };

            let tail = self.cb().tail().load(Ordering::Acquire);
            if tail <= self.local_head {
                return Err(PopError::Empty);
            }

            let window = N as u64 - burst_amount(N as u64);
            let overrun = tail > self.local_head + window;
            if overrun {
                self.local_head = tail - window;
                continue;
            }

            self.local_head = self.local_head.wrapping_add(1);
            return Ok(value);
        }

        // A reset always leaves `tail - local_head < N`, so further overrun
        // within the same call requires the producer to have advanced
        // another full burst in between retries: in the steady state this
        // loop exits on the first or second iteration. Reaching the retry
        // bound means the producer outpaced us by more than a burst on
        // every single retry, which should not happen under the intended
        // load; surface it so it doesn't pass silently as an ordinary
        // empty ring.
        debug_assert!(
            false,
            "pop: exceeded {MAX_POP_RETRIES} overrun retries without landing on a valid slot"
        );
        eprintln!(
            "temporal_ring: pop exceeded {MAX_POP_RETRIES} overrun retries, giving up as empty"
        );
        Err(PopError::Empty)
    }

    /// Lossless pop: valid only when paired with a lossless producer,
    /// which never overwrites a slot the consumer has not yet published
    /// `head` past. Publishes `local_head` back to the control block on
    /// every successful pop so the producer's fullness check stays live.
    pub fn lossless_pop(&mut self) -> Result<T, PopError> {
        // SAFETY: the lossless discipline guarantees the producer has not
        // overwritten this slot, so the speculative read is always safe.
        let value = unsafe {
            let ptr = slot_ptr::<T>(self.cb.as_ptr(), N, self.local_head);
            ptr.read()
        };

        let tail = self.cb().tail().load(Ordering::Acquire);
        if tail <= self.local_head {
            return Err(PopError::Empty);
        }

        self.local_head = self.local_head.wrapping_add(1);
        self.cb().head().store(self.local_head, Ordering::Release);
        Ok(value)
    }

    /// Signal liveness to the producer.
    #[inline]
    pub fn beat(&self) {
        self.cb().consumer_heartbeat().fetch_add(1, Ordering::Release);
    }

    /// Returns `true` exactly once per distinct producer `beat()` this
    /// consumer has not yet observed.
    #[inline]
    pub fn producer_heartbeat(&mut self) -> bool {
        let heartbeat = self.cb().producer_heartbeat().load(Ordering::Acquire);
        if heartbeat != self.last_producer_heartbeat {
            self.last_producer_heartbeat = heartbeat;
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
    use crate::producer::Producer;
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
    fn join_before_any_producer_fails_uninitialized() {
        let region = Region::new::<u64>(4);
        let err = unsafe { Consumer::<u64, 4>::join(region.cb()) }.unwrap_err();
        assert_eq!(err, AttachError::Uninitialized);
    }

    #[test]
    fn capacity_mismatch_is_detected() {
        let region = Region::new::<u64>(8);
        let _producer: Producer<u64, 8> = unsafe { Producer::attach(region.cb()).unwrap() };
        let err = unsafe { Consumer::<u64, 4>::join(region.cb()) }.unwrap_err();
        assert_eq!(
            err,
            AttachError::CapacityMismatch { expected: 4, found: 8 }
        );
    }

    #[test]
    fn corruption_is_detected() {
        let region = Region::new::<u64>(4);
        unsafe {
            region.cb().as_ref().tail().store(0, Ordering::Relaxed);
            // Poke an invalid magic directly.
            let magic_ptr = (region.ptr as usize + 0x2F0) as *mut u64;
            magic_ptr.write(0xDEAD_BEEF);
        }
        let err = unsafe { Consumer::<u64, 4>::join(region.cb()) }.unwrap_err();
        assert!(matches!(err, AttachError::Corruption { magic: 0xDEAD_BEEF }));
    }

    #[test]
    fn lossless_ordering_end_to_end() {
        let region = Region::new::<u64>(4);
        let mut producer: Producer<u64, 4> = unsafe { Producer::attach(region.cb()).unwrap() };
        for v in [10, 20, 30] {
            producer.push_lossless(v).unwrap();
        }
        producer.sync();

        let mut consumer: Consumer<u64, 4> = unsafe { Consumer::join(region.cb()).unwrap() };
        assert_eq!(consumer.lossless_pop().unwrap(), 10);
        assert_eq!(consumer.lossless_pop().unwrap(), 20);
        assert_eq!(consumer.lossless_pop().unwrap(), 30);
        assert_eq!(consumer.lossless_pop().unwrap_err(), PopError::Empty);
    }

    #[test]
    fn lossy_overrun_skip_n8() {
        let region = Region::new::<u64>(8);
        let mut producer: Producer<u64, 8> = unsafe { Producer::attach(region.cb()).unwrap() };
        let mut consumer: Consumer<u64, 8> = unsafe { Consumer::join(region.cb()).unwrap() };

        for v in 0..20u64 {
            producer.push(v);
            producer.sync();
        }

        // B(8) = 2, so the first pop should land on 20 - (8 - 2) = 14.
        assert_eq!(consumer.pop().unwrap(), 14);
        for expected in 15..20u64 {
            assert_eq!(consumer.pop().unwrap(), expected);
        }
        assert_eq!(consumer.pop().unwrap_err(), PopError::Empty);
    }
}
