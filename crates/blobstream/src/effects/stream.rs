use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures_util::Stream;
use futures_util::stream::FusedStream;
use tracing::{debug, warn};

use crate::core::Session;
use crate::data::{ObjectLocator, RangeResult, StreamOptions, Termination};
use crate::effects::credentials::{CredentialGate, CredentialProvider};
use crate::effects::fetcher::{ChunkFetcher, RangeFetch};
use crate::effects::reader::RangeReader;
use crate::effects::scheduler::RangeScheduler;
use crate::effects::store::BlobStore;
use crate::error::Result;

/// A remote object as an ordered stream of byte chunks.
///
/// Each poll is a demand signal: the controller tops the scheduler up to the
/// concurrency ceiling, then yields the next chunk in byte order. The stream
/// ends after the end of the object, or after yielding exactly one error.
/// Dropping it cancels every outstanding range.
pub struct RangeStream<F> {
    session:     Session,
    scheduler:   RangeScheduler<F>,
    demand_size: u64,
    label:       String,
}

impl<S: BlobStore, P: CredentialProvider> RangeStream<ChunkFetcher<S, P>> {
    /// Opens a stream over the object at `locator`.
    ///
    /// Nothing is fetched until the stream is first polled.
    pub fn open(store: S, provider: P, locator: ObjectLocator, options: StreamOptions) -> Result<Self> {
        locator.validate()?;
        options.validate()?;

        let label = locator.to_string();
        let gate = Arc::new(CredentialGate::new(
            Arc::new(store),
            provider,
            locator,
            options.expiry_window,
        ));
        let fetcher = ChunkFetcher::new(gate, options.fetch_timeout);
        Self::build(fetcher, &options, label)
    }

    /// The credential gate shared by this stream's fetches.
    pub fn credentials(&self) -> &Arc<CredentialGate<S, P>> { self.scheduler.fetcher().gate() }
}

impl<F: RangeFetch> RangeStream<F> {
    /// Builds a stream over an arbitrary range fetcher.
    pub fn with_fetcher(fetcher: F, options: StreamOptions) -> Result<Self> {
        options.validate()?;
        Self::build(fetcher, &options, String::from("<custom>"))
    }

    fn build(fetcher: F, options: &StreamOptions, label: String) -> Result<Self> {
        debug!(
            key = %label,
            chunk_size = ?options.chunk_size,
            concurrency = options.concurrency,
            "opening range stream"
        );
        Ok(Self {
            session: Session::new(options.chunk_size, options.concurrency),
            scheduler: RangeScheduler::new(fetcher, options.concurrency),
            demand_size: options.demand_size,
            label,
        })
    }

    /// Demand signal: submits ranges until `concurrency` are outstanding.
    ///
    /// A no-op once the stream has terminated or a terminal range has
    /// completed.
    pub fn on_demand(&mut self, requested: u64) {
        if self.session.is_terminated() || self.scheduler.is_halted() {
            return;
        }

        let outstanding = self.scheduler.outstanding();
        let to_submit = self.session.concurrency().saturating_sub(outstanding);
        if to_submit == 0 {
            return;
        }

        let length = self.session.chunk_size().effective(requested);
        for _ in 0..to_submit {
            self.scheduler.submit(&mut self.session, length);
        }
        debug!(
            key = %self.label,
            submitted = to_submit,
            length,
            cursor = self.session.cursor(),
            in_flight = self.scheduler.in_flight(),
            queued = self.scheduler.queued(),
            held = self.scheduler.held(),
            "topped up range requests"
        );
    }

    /// Polls for the next chunk on behalf of a consumer that wants `requested`
    /// bytes.
    pub fn poll_demand(&mut self, cx: &mut Context<'_>, requested: u64) -> Poll<Option<Result<Bytes>>> {
        if self.session.is_terminated() {
            return Poll::Ready(None);
        }

        self.on_demand(requested);

        let next = ready!(self.scheduler.poll_ordered(cx));
        Poll::Ready(match next {
            Some(result) => self.on_result(result),
            None => {
                self.terminate(Termination::EndOfObject);
                None
            }
        })
    }

    /// Turns the next ordered result into stream output.
    fn on_result(&mut self, result: Result<RangeResult>) -> Option<Result<Bytes>> {
        match result {
            Ok(RangeResult { payload: Some(payload), request }) => {
                self.session.record_delivery(payload.len() as u64);
                debug!(
                    key = %self.label,
                    seq = request.seq,
                    offset = request.offset,
                    bytes = payload.len(),
                    "delivering range"
                );
                Some(Ok(payload))
            }
            Ok(RangeResult { payload: None, request }) => {
                debug!(
                    key = %self.label,
                    seq = request.seq,
                    total = self.session.bytes_delivered(),
                    "end of object"
                );
                self.terminate(Termination::EndOfObject);
                None
            }
            Err(e) => {
                warn!(key = %self.label, error = %e, not_found = e.is_not_found(), "range stream failed");
                self.terminate(Termination::Error);
                Some(Err(e))
            }
        }
    }

    fn terminate(&mut self, cause: Termination) {
        if self.session.terminate(cause) {
            self.scheduler.shutdown();
        }
    }

    pub fn is_terminated(&self) -> bool { self.session.is_terminated() }

    /// Why the stream stopped, once it has.
    pub fn termination(&self) -> Option<Termination> { self.session.termination() }

    /// Total payload bytes yielded so far.
    pub fn bytes_delivered(&self) -> u64 { self.session.bytes_delivered() }

    /// Ranges submitted but not yet resolved.
    pub fn outstanding(&self) -> usize { self.scheduler.outstanding() }

    /// Adapts the stream into an [`AsyncRead`](tokio::io::AsyncRead) whose
    /// read buffer size is the demand amount.
    pub fn into_reader(self) -> RangeReader<F> { RangeReader::new(self) }
}

impl<F: RangeFetch + Unpin> Stream for RangeStream<F> {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let demand = this.demand_size;
        this.poll_demand(cx, demand)
    }
}

impl<F: RangeFetch + Unpin> FusedStream for RangeStream<F> {
    fn is_terminated(&self) -> bool { self.session.is_terminated() }
}

impl<F> std::fmt::Debug for RangeStream<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeStream")
            .field("key", &self.label)
            .field("session", &self.session)
            .field("demand_size", &self.demand_size)
            .finish()
    }
}
