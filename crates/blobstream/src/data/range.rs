use bytes::Bytes;

/// One contiguous span `[offset, offset + length)` of the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    /// Assigned at submission time; the sole ordering key.
    pub seq:    u64,
    pub offset: u64,
    pub length: u64,
}

impl RangeRequest {
    /// One past the last byte of the span.
    pub fn end(&self) -> u64 { self.offset.saturating_add(self.length) }

    /// `Range` header value, inclusive on both ends.
    ///
    /// ```
    /// use blobstream::RangeRequest;
    ///
    /// let request = RangeRequest { seq: 0, offset: 0, length: 500 };
    /// assert_eq!(request.header_value(), "bytes=0-499");
    /// ```
    pub fn header_value(&self) -> String { crate::core::range_header(self.offset, self.length) }
}

/// A completed range, ready for in-order delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResult {
    pub request: RangeRequest,
    /// `None` marks the end of the object.
    pub payload: Option<Bytes>,
}

impl RangeResult {
    pub fn seq(&self) -> u64 { self.request.seq }

    pub fn byte_length(&self) -> u64 { self.payload.as_ref().map_or(0, |p| p.len() as u64) }

    pub fn is_end_of_object(&self) -> bool { self.payload.is_none() }
}

/// Why a stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    EndOfObject,
    Error,
}
