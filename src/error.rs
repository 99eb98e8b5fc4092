//! Error types surfaced by the control block attach protocol and the
//! producer/consumer push/pop paths.
//!
//! Misalignment of the backing pointer is a programmer error, not a runtime
//! condition, and is therefore enforced with `assert!` at the call site
//! rather than modeled here.

use thiserror::Error;

/// Failure modes of [`crate::producer::Producer::attach`] and
/// [`crate::consumer::Consumer::join`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// A consumer attached before any producer initialized the region.
    #[error("channel uninitialized: no producer has attached yet")]
    Uninitialized,

    /// The attacher's compile-time `N` does not match the capacity stored
    /// in the control block.
    #[error("capacity mismatch: control block has {found}, expected {expected}")]
    CapacityMismatch { expected: u64, found: u64 },

    /// `magic` is neither zero nor [`crate::control_block::MAGIC`].
    #[error("control block corrupted: magic = {magic:#018x}")]
    Corruption { magic: u64 },
}

/// Failure mode of [`crate::producer::Producer::push_lossless`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// The ring holds `N` unconsumed slots; the consumer has not published
    /// `head` far enough to admit another write.
    #[error("ring buffer is full")]
    Full,
}

/// Failure mode of [`crate::consumer::Consumer::pop`] and
/// [`crate::consumer::Consumer::lossless_pop`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// No value published by the producer has not already been consumed.
    #[error("ring buffer is empty")]
    Empty,
}
