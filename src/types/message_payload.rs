use reqwest::multipart::Form;

/// The body of an outbound chat message.
///
/// A plain prompt is sent form-urlencoded; a multipart form (for file
/// attachments) is sent as-is. Session id and model selector are merged
/// into whichever encoding the variant uses.
#[derive(Debug)]
pub enum MessagePayload {
    /// A plain prompt string, encoded as the `prompt` form field.
    Text(String),
    /// A pre-built multipart form, e.g. carrying a file attachment.
    Multipart(Form),
}

impl MessagePayload {
    /// Convenience constructor for a plain text prompt.
    pub fn text(prompt: impl Into<String>) -> Self {
        MessagePayload::Text(prompt.into())
    }
}

impl From<String> for MessagePayload {
    fn from(prompt: String) -> Self {
        MessagePayload::Text(prompt)
    }
}

impl From<&str> for MessagePayload {
    fn from(prompt: &str) -> Self {
        MessagePayload::Text(prompt.to_string())
    }
}

impl From<Form> for MessagePayload {
    fn from(form: Form) -> Self {
        MessagePayload::Multipart(form)
    }
}
