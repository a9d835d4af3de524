/// `Range` header value for `[offset, offset + length)`, inclusive on both ends.
pub fn range_header(offset: u64, length: u64) -> String {
    let last = offset.saturating_add(length).saturating_sub(1);
    format!("bytes={offset}-{last}")
}
