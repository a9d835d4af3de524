//! Pure state and transformations for range streaming.
//!
//! Nothing here performs I/O. The effectful layer drives these types from
//! its poll loops.

mod classify;
mod range;
mod reorder;
mod session;

pub use classify::{Outcome, classify, is_not_found_message};
pub use range::range_header;
pub use reorder::ReorderBuffer;
pub use session::Session;
