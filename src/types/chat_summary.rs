use serde::Deserialize;

/// One entry of the chat history listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatSummary {
    /// The chat's history identifier.
    #[serde(rename = "historyId", deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    /// Human-readable title.
    pub title: String,
}
