//! Response body streaming through pooled buffers.
//!
//! # Responsibilities
//! - Copy backend body bytes into a pooled buffer
//! - Emit a chunk when the buffer fills, when the backend stalls, or at EOF
//! - Forward trailers after the last data chunk
//! - Return the buffer to its pool when the body ends or is dropped
//!
//! Emitted chunks are split off the pooled buffer, not copied out of it, so
//! a body streams through the same storage once each chunk has been written.
//!
//! # Design Decisions
//! - Emitting on backend stall is the flush: hyper writes out everything it
//!   holds as soon as the body returns `Pending`, so streamed responses are
//!   never parked in the proxy
//! - A client disconnect drops the body, which aborts the copy and releases
//!   the buffer

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::HeaderMap;
use bytes::Bytes;
use http_body::{Frame, SizeHint};

use crate::buffer::PooledBuffer;

/// Backend body re-chunked through a pooled buffer.
pub struct PooledBody {
    inner: Body,
    buffer: Option<PooledBuffer>,
    /// Remainder of the last backend frame that did not fit.
    pending: Bytes,
    trailers: Option<HeaderMap>,
    finished: bool,
}

impl PooledBody {
    pub fn new(inner: Body, buffer: PooledBuffer) -> Self {
        // A zero-limit buffer could never make progress; pass frames through instead.
        let buffer = if buffer.limit() == 0 { None } else { Some(buffer) };
        Self {
            inner,
            buffer,
            pending: Bytes::new(),
            trailers: None,
            finished: false,
        }
    }

    fn buffered(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.len())
    }

    /// Copy as much of `pending` as fits. Returns true when the buffer is full.
    fn fill_from_pending(&mut self) -> bool {
        match self.buffer.as_mut() {
            Some(buffer) => buffer.fill_from(&mut self.pending),
            None => false,
        }
    }

    fn take_filled(&mut self) -> Option<Bytes> {
        self.buffer.as_mut()?.split_chunk()
    }

    fn release(&mut self) {
        // Dropping the PooledBuffer hands it back to the pool.
        self.buffer = None;
    }
}

impl http_body::Body for PooledBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        loop {
            if !this.pending.is_empty() {
                if this.buffer.is_none() {
                    let data = std::mem::take(&mut this.pending);
                    return Poll::Ready(Some(Ok(Frame::data(data))));
                }
                if this.fill_from_pending() {
                    if let Some(chunk) = this.take_filled() {
                        return Poll::Ready(Some(Ok(Frame::data(chunk))));
                    }
                }
                continue;
            }

            if this.finished {
                if let Some(chunk) = this.take_filled() {
                    return Poll::Ready(Some(Ok(Frame::data(chunk))));
                }
                this.release();
                return Poll::Ready(this.trailers.take().map(|t| Ok(Frame::trailers(t))));
            }

            match Pin::new(&mut this.inner).poll_frame(cx) {
                Poll::Ready(Some(Ok(frame))) => match frame.into_data() {
                    Ok(data) => this.pending = data,
                    Err(frame) => {
                        if let Ok(trailers) = frame.into_trailers() {
                            this.trailers = Some(trailers);
                        }
                    }
                },
                Poll::Ready(Some(Err(e))) => {
                    this.release();
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => this.finished = true,
                Poll::Pending => {
                    // Backend is idle: flush whatever is buffered.
                    return match this.take_filled() {
                        Some(chunk) => Poll::Ready(Some(Ok(Frame::data(chunk)))),
                        None => Poll::Pending,
                    };
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.buffered() == 0
            && self.pending.is_empty()
            && self.trailers.is_none()
            && (self.finished || self.inner.is_end_stream())
    }

    fn size_hint(&self) -> SizeHint {
        let buffered = (self.buffered() + self.pending.len()) as u64;
        if self.finished {
            return SizeHint::with_exact(buffered);
        }
        let inner = self.inner.size_hint();
        let mut hint = SizeHint::new();
        hint.set_lower(inner.lower() + buffered);
        if let Some(upper) = inner.upper() {
            hint.set_upper(upper + buffered);
        }
        hint
    }
}
