use serde::{Deserialize, Serialize};

/// One incremental notification produced while a chat response streams in.
///
/// Updates for a single stream form an ordered sequence: `content` only
/// ever grows, `reference_found` flips from false to true at most once and
/// stays true, and exactly one final update has `done: true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamUpdate {
    /// Cumulative visible text so far, with the reference marker stripped.
    pub content: String,
    /// True only on the final update of the stream.
    pub done: bool,
    /// Sticky flag: true once a reference marker has been extracted.
    pub reference_found: bool,
    /// The trimmed reference payload, once extracted.
    pub reference: Option<String>,
}

impl StreamUpdate {
    /// Create an in-progress update.
    pub fn partial(content: String, reference: Option<String>) -> Self {
        Self {
            done: false,
            reference_found: reference.is_some(),
            content,
            reference,
        }
    }

    /// Create the terminal update for a stream.
    pub fn finished(content: String, reference: Option<String>) -> Self {
        Self {
            done: true,
            reference_found: reference.is_some(),
            content,
            reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_found_tracks_reference() {
        let update = StreamUpdate::partial("hi".to_string(), None);
        assert!(!update.reference_found);
        let update = StreamUpdate::partial("hi".to_string(), Some("{}".to_string()));
        assert!(update.reference_found);
    }

    #[test]
    fn finished_sets_done() {
        let update = StreamUpdate::finished("hi".to_string(), None);
        assert!(update.done);
    }
}
