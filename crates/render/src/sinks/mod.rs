//! Sink implementations
//!
//! Contains LogSink and PreviewSink.

mod log;
mod preview;

pub use self::log::LogSink;
pub use self::preview::{PreviewHandle, PreviewSink};
