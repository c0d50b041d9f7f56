//! Logging trait for lexichat client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to
//! observe the traffic passing through the [`LexiChat`](crate::LexiChat)
//! client: streamed updates, stream completion, and request failures.

use crate::error::Error;
use crate::types::StreamUpdate;

/// A trait for logging lexichat client operations.
///
/// Implement this trait to capture and record client activity. The client
/// holds an optional logger and calls these hooks as traffic flows.
///
/// # Example
///
/// ```rust,ignore
/// use lexichat::{ClientLogger, Error, StreamUpdate};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_stream_update(&self, update: &StreamUpdate) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "update: {} bytes", update.content.len()).unwrap();
///     }
///
///     fn log_stream_end(&self, update: &StreamUpdate) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "stream complete: {} bytes", update.content.len()).unwrap();
///     }
///
///     fn log_request_error(&self, error: &Error) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "request failed: {error}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log one in-progress update of a streamed chat response.
    ///
    /// Called for every non-terminal [`StreamUpdate`] a stream yields.
    fn log_stream_update(&self, update: &StreamUpdate);

    /// Log the terminal update of a completed stream.
    ///
    /// Called once per stream that runs to natural completion, with the
    /// `done: true` update.
    fn log_stream_end(&self, update: &StreamUpdate);

    /// Log a failed request or stream.
    ///
    /// Called for transport-level failures: connection errors, non-2xx
    /// statuses, and mid-stream read errors.
    fn log_request_error(&self, error: &Error);
}
