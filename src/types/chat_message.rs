use serde::Deserialize;

/// Who authored a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// The human asking questions.
    User,
    /// The model's answer.
    Assistant,
}

/// One message of a past conversation, as presented to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: MessageRole,
    /// The message text.
    pub content: String,
    /// Citation/source metadata, present on assistant messages that carried
    /// a reference.
    pub reference: Option<String>,
}

/// One stored exchange as the server returns it: a prompt and its answer,
/// with any reference the answer carried.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRecord {
    /// The user's prompt.
    #[serde(default)]
    pub prompt: String,
    /// The assistant's answer.
    #[serde(default)]
    pub answer: String,
    /// Reference payload attached to the answer, if any.
    #[serde(default)]
    pub reference: Option<String>,
}

impl ChatRecord {
    /// Expand the stored exchange into its user and assistant messages.
    pub fn into_messages(self) -> [ChatMessage; 2] {
        let reference = self.reference.filter(|r| !r.is_empty());
        [
            ChatMessage {
                role: MessageRole::User,
                content: self.prompt,
                reference: None,
            },
            ChatMessage {
                role: MessageRole::Assistant,
                content: self.answer,
                reference,
            },
        ]
    }
}
