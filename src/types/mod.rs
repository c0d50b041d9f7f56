// Public modules
pub mod chat_message;
pub mod chat_summary;
pub mod envelope;
pub mod message_payload;
pub mod model;
pub mod stream_update;

// Re-exports
pub use chat_message::{ChatMessage, ChatRecord, MessageRole};
pub use chat_summary::ChatSummary;
pub use envelope::Envelope;
pub use message_payload::MessagePayload;
pub use model::{KnownModel, Model};
pub use stream_update::StreamUpdate;

/// Deserializes an identifier that the server may send as either a JSON
/// number or a string, always yielding a `String`.
pub(crate) mod id_string {
    use serde::de::{Deserializer, Error as DeError, Unexpected, Visitor};
    use std::fmt;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = String;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer identifier")
            }

            fn visit_str<E: DeError>(self, v: &str) -> Result<String, E> {
                Ok(v.to_string())
            }

            fn visit_i64<E: DeError>(self, v: i64) -> Result<String, E> {
                Ok(v.to_string())
            }

            fn visit_u64<E: DeError>(self, v: u64) -> Result<String, E> {
                Ok(v.to_string())
            }

            fn visit_f64<E: DeError>(self, v: f64) -> Result<String, E> {
                Err(E::invalid_type(Unexpected::Float(v), &self))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}
