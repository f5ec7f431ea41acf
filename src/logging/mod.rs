//! Structured logging setup and ndjson feed lines.

mod format;

pub use format::{FeedLine, StructuredLogger};
