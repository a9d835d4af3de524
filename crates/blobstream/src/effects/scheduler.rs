use std::collections::VecDeque;
use std::task::{Context, Poll};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, trace};

use crate::core::{ReorderBuffer, Session};
use crate::data::{RangeRequest, RangeResult};
use crate::effects::fetcher::{FetchedRange, RangeFetch};
use crate::error::Result;

type InFlight = BoxFuture<'static, (RangeRequest, Result<FetchedRange>)>;

/// Assigns contiguous ranges, runs at most `concurrency` fetches at once and
/// hands results back strictly in submission order.
///
/// Completions that arrive ahead of an earlier, still pending range wait in a
/// [`ReorderBuffer`]. The first terminal result (end of object or error) in
/// sequence order halts the scheduler: queued ranges after it are dropped and
/// later completions are discarded as they arrive.
pub struct RangeScheduler<F> {
    fetcher:     F,
    concurrency: usize,
    queued:      VecDeque<RangeRequest>,
    in_flight:   FuturesUnordered<InFlight>,
    reorder:     ReorderBuffer<Result<RangeResult>>,
    halt_at:     Option<u64>,
}

impl<F: RangeFetch> RangeScheduler<F> {
    pub fn new(fetcher: F, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            queued: VecDeque::new(),
            in_flight: FuturesUnordered::new(),
            reorder: ReorderBuffer::new(),
            halt_at: None,
        }
    }

    pub fn fetcher(&self) -> &F { &self.fetcher }

    /// Queues the next `length` bytes of the session and returns the range's
    /// sequence number. Dispatch happens on the next poll, within the ceiling.
    pub fn submit(&mut self, session: &mut Session, length: u64) -> u64 {
        let request = session.assign(length);
        trace!(seq = request.seq, offset = request.offset, length, "range submitted");
        self.queued.push_back(request);
        request.seq
    }

    /// Ranges submitted but not yet dispatched.
    pub fn queued(&self) -> usize { self.queued.len() }

    /// Ranges dispatched but not yet resolved.
    pub fn in_flight(&self) -> usize { self.in_flight.len() }

    /// Completed ranges waiting behind an earlier, unresolved one.
    pub fn held(&self) -> usize { self.reorder.len() }

    /// Ranges submitted but not yet handed out: queued, in flight or held.
    /// Held results count: at most `concurrency` ranges are ever buffered.
    pub fn outstanding(&self) -> usize { self.queued.len() + self.in_flight.len() + self.reorder.len() }

    /// Whether a terminal result has completed, even if not yet deliverable.
    pub fn is_halted(&self) -> bool { self.halt_at.is_some() }

    /// Polls for the next result in sequence order.
    ///
    /// Returns `Ready(None)` only when nothing is queued, in flight or held.
    pub fn poll_ordered(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<RangeResult>>> {
        loop {
            if let Some(result) = self.reorder.pop_ready() {
                return Poll::Ready(Some(result));
            }

            self.dispatch();

            match self.in_flight.poll_next_unpin(cx) {
                Poll::Ready(Some((request, outcome))) => self.complete(request, outcome),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    /// Drops all queued, in-flight and held work.
    pub fn shutdown(&mut self) {
        let discarded = self.outstanding();
        if discarded > 0 {
            debug!(discarded, "discarding outstanding ranges");
        }
        self.queued.clear();
        self.in_flight = FuturesUnordered::new();
        self.reorder.clear();
        self.halt_at = Some(self.halt_at.unwrap_or(self.reorder.next_expected()));
    }

    fn dispatch(&mut self) {
        while self.in_flight.len() < self.concurrency {
            let Some(request) = self.queued.pop_front() else {
                break;
            };
            trace!(
                seq = request.seq,
                offset = request.offset,
                length = request.length,
                in_flight = self.in_flight.len() + 1,
                "range dispatched"
            );
            let fetch = self.fetcher.fetch(request.offset, request.length);
            self.in_flight.push(fetch.map(move |outcome| (request, outcome)).boxed());
        }
    }

    fn complete(&mut self, request: RangeRequest, outcome: Result<FetchedRange>) {
        if let Some(halt_at) = self.halt_at
            && request.seq > halt_at
        {
            trace!(seq = request.seq, halt_at, "discarding range after terminal result");
            return;
        }

        let result = outcome.map(|fetched| RangeResult {
            request,
            payload: fetched.payload,
        });
        let terminal = result.as_ref().map_or(true, RangeResult::is_end_of_object);
        if terminal {
            self.halt(request.seq);
        }
        self.reorder.insert(request.seq, result);
    }

    fn halt(&mut self, seq: u64) {
        let halt_at = self.halt_at.map_or(seq, |current| current.min(seq));
        self.halt_at = Some(halt_at);
        let before = self.queued.len();
        self.queued.retain(|request| request.seq < halt_at);
        debug!(halt_at, dropped = before - self.queued.len(), "terminal range completed");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Waker;

    use bytes::Bytes;
    use futures_util::future::poll_fn;
    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    use super::*;
    use crate::data::ChunkSize;
    use crate::error::Error;

    /// Fetcher whose ranges resolve only when the test releases them.
    #[derive(Clone, Default)]
    struct ManualFetcher {
        pending:     Arc<Mutex<HashMap<u64, oneshot::Sender<Result<FetchedRange>>>>>,
        dispatched:  Arc<Mutex<Vec<u64>>>,
        active:      Arc<AtomicUsize>,
        peak_active: Arc<AtomicUsize>,
    }

    impl ManualFetcher {
        fn release(&self, offset: u64, outcome: Result<FetchedRange>) {
            let sender = self.pending.lock().remove(&offset).expect("range was not dispatched");
            let _ = sender.send(outcome);
        }

        fn dispatched(&self) -> Vec<u64> { self.dispatched.lock().clone() }
    }

    impl RangeFetch for ManualFetcher {
        fn fetch(&self, offset: u64, _length: u64) -> BoxFuture<'static, Result<FetchedRange>> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().insert(offset, tx);
            self.dispatched.lock().push(offset);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_active.fetch_max(now, Ordering::SeqCst);
            let active = Arc::clone(&self.active);
            Box::pin(async move {
                let outcome = rx.await.unwrap_or_else(|_| Err(Error::Credential("dropped".into())));
                active.fetch_sub(1, Ordering::SeqCst);
                outcome
            })
        }
    }

    fn data(bytes: &'static [u8]) -> Result<FetchedRange> { Ok(FetchedRange::data(Bytes::from_static(bytes))) }

    fn poll_once<F: RangeFetch>(scheduler: &mut RangeScheduler<F>) -> Poll<Option<Result<RangeResult>>> {
        let mut cx = Context::from_waker(Waker::noop());
        scheduler.poll_ordered(&mut cx)
    }

    #[tokio::test]
    async fn reversed_completion_is_delivered_in_order() {
        let fetcher = ManualFetcher::default();
        let mut scheduler = RangeScheduler::new(fetcher.clone(), 3);
        let mut session = Session::new(ChunkSize::Fixed(10), 3);
        for _ in 0..3 {
            scheduler.submit(&mut session, 10);
        }

        assert!(poll_once(&mut scheduler).is_pending());
        assert_eq!(fetcher.dispatched(), vec![0, 10, 20]);

        fetcher.release(20, data(b"c"));
        fetcher.release(10, data(b"b"));
        assert!(poll_once(&mut scheduler).is_pending());

        fetcher.release(0, data(b"a"));
        let mut delivered = Vec::new();
        for _ in 0..3 {
            let result = poll_fn(|cx| scheduler.poll_ordered(cx)).await.unwrap().unwrap();
            delivered.push((result.seq(), result.payload.unwrap()));
        }
        assert_eq!(
            delivered,
            vec![
                (0, Bytes::from_static(b"a")),
                (1, Bytes::from_static(b"b")),
                (2, Bytes::from_static(b"c")),
            ]
        );
        assert!(matches!(poll_once(&mut scheduler), Poll::Ready(None)));
    }

    #[tokio::test]
    async fn concurrency_ceiling_is_respected() {
        let fetcher = ManualFetcher::default();
        let mut scheduler = RangeScheduler::new(fetcher.clone(), 2);
        let mut session = Session::new(ChunkSize::Fixed(5), 2);
        for _ in 0..5 {
            scheduler.submit(&mut session, 5);
        }

        assert!(poll_once(&mut scheduler).is_pending());
        assert_eq!(scheduler.in_flight(), 2);
        assert_eq!(scheduler.queued(), 3);

        for offset in [0, 5, 10, 15, 20] {
            fetcher.release(offset, data(b"xxxxx"));
            let result = poll_fn(|cx| scheduler.poll_ordered(cx)).await.unwrap().unwrap();
            assert_eq!(result.request.offset, offset);
        }
        assert_eq!(fetcher.peak_active.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn earliest_error_in_sequence_wins() {
        let fetcher = ManualFetcher::default();
        let mut scheduler = RangeScheduler::new(fetcher.clone(), 3);
        let mut session = Session::new(ChunkSize::Fixed(10), 3);
        for _ in 0..3 {
            scheduler.submit(&mut session, 10);
        }
        assert!(poll_once(&mut scheduler).is_pending());

        // The later range fails first in wall-clock time.
        fetcher.release(20, Err(Error::Status { status: 500, offset: 20, length: 10 }));
        assert!(poll_once(&mut scheduler).is_pending());
        assert!(scheduler.is_halted());

        fetcher.release(10, Err(Error::Status { status: 503, offset: 10, length: 10 }));
        fetcher.release(0, data(b"first"));

        let first = poll_fn(|cx| scheduler.poll_ordered(cx)).await.unwrap().unwrap();
        assert_eq!(first.seq(), 0);

        let err = poll_fn(|cx| scheduler.poll_ordered(cx)).await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn end_of_object_drops_later_queued_ranges() {
        let fetcher = ManualFetcher::default();
        let mut scheduler = RangeScheduler::new(fetcher.clone(), 1);
        let mut session = Session::new(ChunkSize::Fixed(10), 1);
        for _ in 0..3 {
            scheduler.submit(&mut session, 10);
        }

        assert!(poll_once(&mut scheduler).is_pending());
        fetcher.release(0, Ok(FetchedRange::end_of_object()));

        let eof = poll_fn(|cx| scheduler.poll_ordered(cx)).await.unwrap().unwrap();
        assert!(eof.is_end_of_object());
        assert_eq!(scheduler.queued(), 0);
        assert_eq!(fetcher.dispatched(), vec![0]);
    }

    #[tokio::test]
    async fn shutdown_discards_everything() {
        let fetcher = ManualFetcher::default();
        let mut scheduler = RangeScheduler::new(fetcher.clone(), 2);
        let mut session = Session::new(ChunkSize::Fixed(10), 2);
        for _ in 0..3 {
            scheduler.submit(&mut session, 10);
        }
        assert!(poll_once(&mut scheduler).is_pending());

        scheduler.shutdown();
        assert_eq!(scheduler.outstanding(), 0);
        assert!(scheduler.is_halted());
        assert!(matches!(poll_once(&mut scheduler), Poll::Ready(None)));
    }
}
