use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Buf, Bytes};
use tokio::io::{AsyncRead, ReadBuf};

use crate::effects::fetcher::RangeFetch;
use crate::effects::stream::RangeStream;

/// [`AsyncRead`] over a [`RangeStream`].
///
/// The space left in each read buffer is passed on as the demand amount, so
/// with [`ChunkSize::Demand`](crate::ChunkSize::Demand) range sizes follow the
/// caller's buffer. Errors surface as [`io::Error`] with kind `NotFound` when
/// the object does not exist.
#[derive(Debug)]
pub struct RangeReader<F> {
    stream:   RangeStream<F>,
    leftover: Bytes,
}

impl<F: RangeFetch> RangeReader<F> {
    pub fn new(stream: RangeStream<F>) -> Self {
        Self {
            stream,
            leftover: Bytes::new(),
        }
    }

    pub fn get_ref(&self) -> &RangeStream<F> { &self.stream }

    pub fn into_inner(self) -> RangeStream<F> { self.stream }
}

impl<F: RangeFetch + Unpin> AsyncRead for RangeReader<F> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        if this.leftover.is_empty() {
            match ready!(this.stream.poll_demand(cx, buf.remaining() as u64)) {
                Some(Ok(chunk)) => this.leftover = chunk,
                Some(Err(e)) => return Poll::Ready(Err(e.into())),
                None => return Poll::Ready(Ok(())),
            }
        }

        let n = buf.remaining().min(this.leftover.len());
        buf.put_slice(&this.leftover[..n]);
        this.leftover.advance(n);
        Poll::Ready(Ok(()))
    }
}
