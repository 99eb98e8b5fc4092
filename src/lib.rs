//! A lock-free, shared-memory, single-producer/single-consumer ring
//! channel for fixed-size messages.
//!
//! Two cooperating processes map the same backing region (see
//! [`shmem`]) and attach a [`Producer`] and a [`Consumer`] to the
//! [`ControlBlock`] living at its start. The channel supports two
//! delivery disciplines:
//!
//! - **lossy** ([`Producer::push`] / [`Consumer::pop`]): the producer
//!   never blocks and may overwrite unread slots; the consumer detects
//!   and skips past overruns.
//! - **lossless** ([`Producer::push_lossless`] / [`Consumer::lossless_pop`]):
//!   the producer refuses to overwrite unread slots and the consumer
//!   guarantees every returned value was written exactly once.
//!
//! Both endpoints also expose a [`beat`](Producer::beat)/heartbeat
//! predicate pair for liveness signalling independent of data flow.

pub mod atomics;
pub mod consumer;
pub mod control_block;
pub mod error;
pub mod producer;
pub mod shmem;

pub use consumer::Consumer;
pub use control_block::{field_offsets, ControlBlock, FieldOffsets, MAGIC};
pub use error::{AttachError, PopError, PushError};
pub use producer::Producer;
pub use shmem::{PageSize, ShmRegion, ShmemConfig};
