//! Immutable data types for range streaming.
//!
//! This module contains the configuration, locator, credential and range
//! value types shared by the pure core and the effectful layer. None of these
//! types perform I/O.

pub mod credentials;
pub mod locator;
pub mod options;
pub mod range;

pub use credentials::{Credentials, IssuedCredentials};
pub use locator::ObjectLocator;
pub use options::{ChunkSize, StreamOptions};
pub use range::{RangeRequest, RangeResult, Termination};
