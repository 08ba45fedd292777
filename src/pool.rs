//! Recycled scratch state for message emission.
//!
//! Each emission needs a header, a message, and an output buffer. Allocating
//! them per call churns the heap on the logging hot path, so a
//! [`MessagePool`] keeps released scratch objects on a free list and hands
//! them back out. A [`PooledScratch`] guard owns the scratch exclusively and
//! returns it to the pool when dropped, so every exit path releases it.

use std::{
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicU64, Ordering},
};

use log::trace;
use parking_lot::Mutex;

use crate::{
    frame::{FrameError, FrameLimits, marshal_frame},
    message::{Header, Message},
};

/// Default number of idle scratch objects kept by a pool.
pub const DEFAULT_POOL_MAX_IDLE: usize = 64;
/// Buffers with more capacity than this are not kept across releases.
pub const DEFAULT_MAX_RETAINED_CAPACITY: usize = 1024;

/// Mutable working memory for one emission.
#[derive(Debug, Default)]
pub struct Scratch {
    pub header: Header,
    pub message: Message,
    pub out: Vec<u8>,
}

impl Scratch {
    /// Encode the current header and message into the output buffer.
    ///
    /// The returned slice borrows the output buffer and must not outlive the
    /// scratch.
    pub fn encode_frame(&mut self, limits: FrameLimits) -> Result<&[u8], FrameError> {
        marshal_frame(&mut self.header, &self.message, &mut self.out, limits)
    }

    /// Clear all record state. Returns `true` when the output buffer was
    /// discarded for exceeding `max_retained_capacity`.
    fn reset(&mut self, max_retained_capacity: usize) -> bool {
        self.header.message_length = 0;
        self.message.reset();
        self.message.release_oversized(max_retained_capacity);
        if self.out.capacity() > max_retained_capacity {
            self.out = Vec::new();
            true
        } else {
            self.out.clear();
            false
        }
    }
}

/// Counters describing pool behaviour since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Scratch objects built because the free list was empty.
    pub created: u64,
    /// Acquisitions served from the free list.
    pub reused: u64,
    /// Output buffers dropped for exceeding the retained capacity.
    pub discarded_buffers: u64,
    /// Released scratch objects dropped because the free list was full.
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct PoolCounters {
    created: AtomicU64,
    reused: AtomicU64,
    discarded_buffers: AtomicU64,
    dropped: AtomicU64,
}

impl PoolCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded_buffers: self.discarded_buffers.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe free list of [`Scratch`] objects.
///
/// The pool is the only state shared between emitters. A scratch object is
/// held by at most one [`PooledScratch`] at a time; no ordering is
/// guaranteed between concurrent acquirers.
#[derive(Debug)]
pub struct MessagePool {
    idle: Mutex<Vec<Scratch>>,
    max_idle: usize,
    max_retained_capacity: usize,
    counters: PoolCounters,
}

impl Default for MessagePool {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagePool {
    /// Create an empty pool with the default limits.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_POOL_MAX_IDLE, DEFAULT_MAX_RETAINED_CAPACITY)
    }

    /// Create an empty pool keeping at most `max_idle` scratch objects and
    /// discarding output buffers larger than `max_retained_capacity` bytes.
    pub fn with_limits(max_idle: usize, max_retained_capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
            max_retained_capacity,
            counters: PoolCounters::default(),
        }
    }

    /// Check out an empty scratch object, building one if none are idle.
    pub fn acquire(&self) -> PooledScratch<'_> {
        let recycled = self.idle.lock().pop();
        let scratch = match recycled {
            Some(scratch) => {
                PoolCounters::bump(&self.counters.reused);
                scratch
            }
            None => {
                PoolCounters::bump(&self.counters.created);
                Scratch::default()
            }
        };
        PooledScratch {
            pool: self,
            scratch,
        }
    }

    fn release(&self, mut scratch: Scratch) {
        if scratch.reset(self.max_retained_capacity) {
            PoolCounters::bump(&self.counters.discarded_buffers);
            trace!(
                "MessagePool: discarded output buffer above {} bytes",
                self.max_retained_capacity
            );
        }
        let mut idle = self.idle.lock();
        if idle.len() >= self.max_idle {
            drop(idle);
            PoolCounters::bump(&self.counters.dropped);
            trace!("MessagePool: free list full; dropping scratch");
            return;
        }
        idle.push(scratch);
    }

    /// Number of scratch objects waiting on the free list.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }
}

/// Exclusive handle on a pooled [`Scratch`]; releases it on drop.
#[derive(Debug)]
pub struct PooledScratch<'a> {
    pool: &'a MessagePool,
    scratch: Scratch,
}

impl Deref for PooledScratch<'_> {
    type Target = Scratch;

    fn deref(&self) -> &Scratch {
        &self.scratch
    }
}

impl DerefMut for PooledScratch<'_> {
    fn deref_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }
}

impl Drop for PooledScratch<'_> {
    fn drop(&mut self) {
        // An empty `Scratch` owns no heap memory, so the swap is free.
        self.pool.release(std::mem::take(&mut self.scratch));
    }
}
