use bytes::Bytes;

/// What a single range response means for the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Data(Bytes),
    EndOfObject,
    NotFound,
    /// The store answered with the whole object instead of the range.
    RangeIgnored,
    Failed(u16),
}

/// Requested range starts at or past the end of the object.
const RANGE_NOT_SATISFIABLE: u16 = 416;
const NOT_FOUND: u16 = 404;
const OK: u16 = 200;
const PARTIAL_CONTENT: u16 = 206;

/// Classifies the response to a request for `[offset, offset + length)`.
///
/// A 416 or an empty successful body both mean the object ended at or before
/// the requested offset. A short non-empty 206 body is ordinary data. A plain
/// 200 is only accepted when it can be the first range itself: at offset 0
/// and no longer than requested.
pub fn classify(status: u16, content_length: Option<u64>, body: Bytes, offset: u64, length: u64) -> Outcome {
    match status {
        RANGE_NOT_SATISFIABLE => Outcome::EndOfObject,
        NOT_FOUND => Outcome::NotFound,
        200..=299 if content_length == Some(0) || body.is_empty() => Outcome::EndOfObject,
        PARTIAL_CONTENT => Outcome::Data(body),
        OK if offset == 0 && body.len() as u64 <= length => Outcome::Data(body),
        OK => Outcome::RangeIgnored,
        other => Outcome::Failed(other),
    }
}

/// Whether a transport error message names a missing object.
pub fn is_not_found_message(message: &str) -> bool {
    message.contains("NoSuchKey") || message.contains("BlobNotFound")
}
