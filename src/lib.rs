// Public modules
pub mod client;
pub mod client_logger;
pub mod error;
pub mod stream;
pub mod types;

// Re-exports
pub use client::LexiChat;
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use stream::{ChatStream, demultiplex, process_chat_stream};
pub use types::*;
