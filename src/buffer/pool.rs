//! Fixed-size byte buffer pool.
//!
//! # Responsibilities
//! - Hand out buffers that hold up to `buffer_size` bytes
//! - Fall back to a fresh allocation when the free list is empty
//! - Take buffers back on release or drop, up to `max_idle`
//!
//! # Design Decisions
//! - Buffers are `BytesMut`: a filled buffer is split off and frozen into the
//!   outgoing chunk, so chunks share the pooled storage instead of copying it
//! - Once every chunk split from a buffer has been dropped, the next fill
//!   reclaims the same storage; while chunks are still in flight a fresh
//!   region is allocated instead

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use bytes::{Buf, Bytes, BytesMut};

/// Size of each pooled buffer (32 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Free-list bound used when none is configured.
pub const DEFAULT_MAX_IDLE: usize = 1024;

/// A bounded free list of fixed-size buffers.
pub struct BufferPool {
    buffer_size: usize,
    max_idle: usize,
    free: Mutex<Vec<BytesMut>>,
}

impl BufferPool {
    /// Create an empty pool. Buffers are allocated lazily on first acquire.
    pub fn new(buffer_size: usize, max_idle: usize) -> Arc<Self> {
        Arc::new(Self {
            buffer_size,
            max_idle,
            free: Mutex::new(Vec::new()),
        })
    }

    /// Take an empty buffer from the pool, allocating one if none is idle.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let reused = self.lock_free_list().pop();
        let data = reused.unwrap_or_else(|| BytesMut::with_capacity(self.buffer_size));
        PooledBuffer {
            data: Some(data),
            pool: Arc::clone(self),
        }
    }

    /// Return a buffer to the pool. Equivalent to dropping it.
    pub fn release(&self, mut buffer: PooledBuffer) {
        if let Some(data) = buffer.data.take() {
            self.put(data);
        }
    }

    /// Most bytes any buffer from this pool holds before it counts as full.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers currently sitting in the free list.
    pub fn idle_count(&self) -> usize {
        self.lock_free_list().len()
    }

    fn put(&self, mut data: BytesMut) {
        data.clear();
        // Best effort: rewinds to the start of the storage when no chunk still
        // points into it. Otherwise the next fill sorts it out.
        let _ = data.try_reclaim(self.buffer_size);

        let mut free = self.lock_free_list();
        if free.len() < self.max_idle {
            free.push(data);
        }
    }

    fn lock_free_list(&self) -> std::sync::MutexGuard<'_, Vec<BytesMut>> {
        // The list holds plain byte buffers; a panic mid push/pop cannot leave it inconsistent.
        self.free.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_size", &self.buffer_size)
            .field("max_idle", &self.max_idle)
            .field("idle", &self.idle_count())
            .finish()
    }
}

/// A buffer on loan from a [`BufferPool`].
///
/// Dereferences to the bytes filled so far. Goes back to its pool when dropped.
pub struct PooledBuffer {
    data: Option<BytesMut>,
    pool: Arc<BufferPool>,
}

impl PooledBuffer {
    /// The pool's `buffer_size`.
    pub fn limit(&self) -> usize {
        self.pool.buffer_size()
    }

    /// Copy as much of `src` as fits, advancing it past the copied bytes.
    /// Returns true when the buffer is full.
    pub fn fill_from(&mut self, src: &mut Bytes) -> bool {
        let limit = self.pool.buffer_size;
        let Some(data) = self.data.as_mut() else {
            return false;
        };
        if data.is_empty() {
            // Reclaims the storage behind already-dropped chunks, or allocates.
            data.reserve(limit);
        }
        let n = src.len().min(limit.saturating_sub(data.len()));
        data.extend_from_slice(&src[..n]);
        src.advance(n);
        data.len() >= limit
    }

    /// Split the filled bytes off as a chunk backed by this buffer's storage.
    pub fn split_chunk(&mut self) -> Option<Bytes> {
        let data = self.data.as_mut()?;
        if data.is_empty() {
            return None;
        }
        Some(data.split().freeze())
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.len())
            .field("limit", &self.limit())
            .finish()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            self.pool.put(data);
        }
    }
}
