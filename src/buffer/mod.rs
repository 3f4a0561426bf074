//! Buffer reuse subsystem.
//!
//! # Data Flow
//! ```text
//! Backend response accepted
//!     → pool.rs (acquire fixed-size buffer, fresh allocation if empty)
//!     → http::body (copy backend frames through the buffer)
//!     → Body finished or dropped
//!     → pool.rs (buffer returned to the free list)
//! ```
//!
//! # Design Decisions
//! - Buffers have one fixed size; the copy loop never grows or shrinks them
//! - The free list is bounded; surplus buffers are simply freed
//! - Buffers are not zeroed on reuse

pub mod pool;

pub use pool::{BufferPool, PooledBuffer, DEFAULT_BUFFER_SIZE};
