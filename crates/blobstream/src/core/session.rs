use crate::data::{ChunkSize, RangeRequest, Termination};

/// The live state of one download.
///
/// Owned by the stream controller. The cursor only moves forward, and the
/// termination cause is recorded at most once.
#[derive(Debug, Clone)]
pub struct Session {
    cursor:          u64,
    next_seq:        u64,
    chunk_size:      ChunkSize,
    concurrency:     usize,
    termination:     Option<Termination>,
    bytes_delivered: u64,
}

impl Session {
    pub fn new(chunk_size: ChunkSize, concurrency: usize) -> Self {
        Self {
            cursor: 0,
            next_seq: 0,
            chunk_size,
            concurrency,
            termination: None,
            bytes_delivered: 0,
        }
    }

    /// Next unassigned byte offset.
    pub fn cursor(&self) -> u64 { self.cursor }

    pub fn chunk_size(&self) -> ChunkSize { self.chunk_size }

    pub fn concurrency(&self) -> usize { self.concurrency }

    /// Carves the next `length` bytes off the cursor.
    pub fn assign(&mut self, length: u64) -> RangeRequest {
        let request = RangeRequest {
            seq: self.next_seq,
            offset: self.cursor,
            length,
        };
        self.next_seq += 1;
        self.cursor = self.cursor.saturating_add(length);
        request
    }

    /// Records the termination cause. Returns `false` if already terminated,
    /// in which case the first cause is kept.
    pub fn terminate(&mut self, cause: Termination) -> bool {
        if self.termination.is_some() {
            return false;
        }
        self.termination = Some(cause);
        true
    }

    pub fn is_terminated(&self) -> bool { self.termination.is_some() }

    pub fn termination(&self) -> Option<Termination> { self.termination }

    pub fn record_delivery(&mut self, bytes: u64) { self.bytes_delivered += bytes; }

    pub fn bytes_delivered(&self) -> u64 { self.bytes_delivered }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigned_ranges_are_contiguous() {
        let mut session = Session::new(ChunkSize::Fixed(10), 2);
        let lengths = [10, 10, 3, 7, 10];
        let requests: Vec<_> = lengths.iter().map(|&len| session.assign(len)).collect();

        assert_eq!(requests[0].offset, 0);
        for pair in requests.windows(2) {
            assert_eq!(pair[1].offset, pair[0].offset + pair[0].length);
            assert_eq!(pair[1].seq, pair[0].seq + 1);
        }
        assert_eq!(session.cursor(), 40);
    }

    #[test]
    fn termination_is_recorded_once() {
        let mut session = Session::new(ChunkSize::Demand, 1);
        assert!(!session.is_terminated());

        assert!(session.terminate(Termination::Error));
        assert!(!session.terminate(Termination::EndOfObject));
        assert_eq!(session.termination(), Some(Termination::Error));
    }
}
