//! Streaming chat response demultiplexing.
//!
//! This module turns the raw byte stream of a `/ai/chat` response into an
//! ordered sequence of [`StreamUpdate`]s, splitting the embedded
//! `REFERENCE_DATA` marker out of the visible text as it arrives.

use std::fmt;
use std::pin::Pin;
use std::sync::LazyLock;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::StreamUpdate;

/// Opening sentinel of the reference marker.
const MARKER_OPEN: &str = "<!-- REFERENCE_DATA:";

/// Full marker pattern. Non-greedy; the payload may span lines.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!-- REFERENCE_DATA:(.*?) -->").expect("marker pattern is valid")
});

/// Process a response byte stream into a stream of [`StreamUpdate`]s.
///
/// This is the entry point used by the client: it converts transport
/// errors into [`Error::Streaming`] and hands the chunks to
/// [`demultiplex`].
pub fn process_chat_stream<S>(byte_stream: S) -> impl Stream<Item = Result<StreamUpdate>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + Send + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });
    demultiplex(stream)
}

/// Demultiplex a chunk stream into visible content and reference metadata.
///
/// Each chunk is decoded as UTF-8, appended to a rolling detection buffer,
/// and scanned for the reference marker. After every chunk at most one
/// update is emitted; consecutive identical updates are suppressed, so a
/// chunk that makes no visible progress is silent. When the transport
/// signals end-of-data one final update with `done: true` is emitted. A
/// chunk error ends the stream immediately, with no final update.
///
/// Transport chunking is byte-aligned, so both a marker delimiter and a
/// multi-byte character can straddle two physical chunks. The
/// demultiplexer carries both across iterations: an incomplete trailing
/// UTF-8 sequence waits in a byte carry buffer for the next chunk, and the
/// detection buffer retains text that could still become a marker. Only
/// genuinely invalid byte sequences surface as encoding errors. Holding
/// prospective marker text back from the visible content until
/// disambiguated keeps `content` growth monotonic.
pub fn demultiplex<S>(chunks: S) -> impl Stream<Item = Result<StreamUpdate>> + Send
where
    S: Stream<Item = Result<Bytes>> + Unpin + Send + 'static,
{
    stream::unfold(
        Some((chunks, Demux::new())),
        move |state| async move {
            let (mut chunks, mut demux) = state?;
            loop {
                match chunks.next().await {
                    Some(Ok(bytes)) => match demux.decode(&bytes) {
                        Ok(text) => {
                            demux.absorb(&text);
                            if let Some(update) = demux.emit() {
                                return Some((Ok(update), Some((chunks, demux))));
                            }
                            // No visible progress; keep reading.
                        }
                        Err(e) => {
                            return Some((Err(e), None));
                        }
                    },
                    Some(Err(e)) => {
                        return Some((Err(e), None));
                    }
                    None => {
                        return Some((demux.finish(), None));
                    }
                }
            }
        },
    )
}

/// Per-stream demultiplexer state.
struct Demux {
    /// Cumulative visible text, marker stripped.
    content: String,
    /// Unconsumed tail awaiting marker disambiguation.
    pending: String,
    /// Incomplete trailing UTF-8 sequence awaiting the next chunk.
    undecoded: Vec<u8>,
    /// Sticky reference slot; set at most once.
    reference: Option<String>,
    /// Snapshot of the last emitted update, for deduplication.
    last_emitted: Option<StreamUpdate>,
}

impl Demux {
    fn new() -> Self {
        Demux {
            content: String::new(),
            pending: String::new(),
            undecoded: Vec::new(),
            reference: None,
            last_emitted: None,
        }
    }

    /// Decode one transport chunk, carrying an incomplete trailing
    /// multi-byte sequence over to the next chunk. Only byte sequences no
    /// continuation could repair are an error.
    fn decode(&mut self, bytes: &[u8]) -> Result<String> {
        self.undecoded.extend_from_slice(bytes);
        let valid_up_to = match std::str::from_utf8(&self.undecoded) {
            Ok(_) => self.undecoded.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => {
                return Err(Error::encoding(
                    format!("Invalid UTF-8 in stream: {err}"),
                    Some(Box::new(err)),
                ));
            }
        };
        let mut buf = std::mem::take(&mut self.undecoded);
        self.undecoded = buf.split_off(valid_up_to);
        String::from_utf8(buf).map_err(|e| {
            Error::encoding(format!("Invalid UTF-8 in stream: {e}"), Some(Box::new(e)))
        })
    }

    /// Absorb one decoded chunk and advance the scan.
    fn absorb(&mut self, text: &str) {
        self.pending.push_str(text);
        self.scan();
    }

    fn scan(&mut self) {
        // The marker is recognized at most once; afterwards everything is
        // visible text, including any later duplicate of the pattern.
        if self.reference.is_some() {
            self.content.push_str(&self.pending);
            self.pending.clear();
            return;
        }

        let matched = MARKER_RE.captures(&self.pending).and_then(|caps| {
            match (caps.get(0), caps.get(1)) {
                (Some(whole), Some(payload)) => Some((
                    whole.start(),
                    whole.end(),
                    payload.as_str().trim().to_string(),
                )),
                _ => None,
            }
        });

        if let Some((start, end, payload)) = matched {
            self.content.push_str(&self.pending[..start]);
            self.content.push_str(&self.pending[end..]);
            self.pending.clear();
            self.reference = Some(payload);
            return;
        }

        // No complete marker. Hold back the tail that could still become
        // one and flush the rest.
        let keep = self.holdback();
        let flush_to = self.pending.len() - keep;
        self.content.push_str(&self.pending[..flush_to]);
        self.pending.drain(..flush_to);
    }

    /// Length in bytes of the pending tail that must be retained: an
    /// unterminated marker opener, or a trailing proper prefix of one.
    fn holdback(&self) -> usize {
        if let Some(pos) = self.pending.find(MARKER_OPEN) {
            return self.pending.len() - pos;
        }
        for k in (1..MARKER_OPEN.len()).rev() {
            if self.pending.ends_with(&MARKER_OPEN[..k]) {
                return k;
            }
        }
        0
    }

    /// Produce the update for the current chunk, unless it would repeat
    /// the previous one.
    fn emit(&mut self) -> Option<StreamUpdate> {
        let update = StreamUpdate::partial(self.content.clone(), self.reference.clone());
        if self.last_emitted.as_ref() == Some(&update) {
            return None;
        }
        self.last_emitted = Some(update.clone());
        Some(update)
    }

    /// Terminal update: any held-back tail is ordinary text after all. A
    /// multi-byte sequence still incomplete at end-of-data can no longer
    /// be repaired and surfaces as an encoding error instead.
    fn finish(&mut self) -> Result<StreamUpdate> {
        if !self.undecoded.is_empty() {
            return Err(Error::encoding(
                "Incomplete UTF-8 sequence at end of stream",
                None,
            ));
        }
        self.content.push_str(&self.pending);
        self.pending.clear();
        Ok(StreamUpdate::finished(
            self.content.clone(),
            self.reference.take(),
        ))
    }
}

/// Handle for one in-flight streamed chat response.
///
/// Yields [`StreamUpdate`]s as an asynchronous sequence, and also offers a
/// callback-driven [`read`](ChatStream::read) for consumers that want the
/// stream driven to completion in one call. Dropping the handle closes the
/// underlying transport.
pub struct ChatStream {
    inner: Pin<Box<dyn Stream<Item = Result<StreamUpdate>> + Send>>,
}

impl ChatStream {
    /// Wrap an update stream in a `ChatStream` handle.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StreamUpdate>> + Send + 'static,
    {
        ChatStream {
            inner: Box::pin(stream),
        }
    }

    /// Drive the stream to completion, invoking `callback` for every
    /// update in order, and return the final (`done: true`) update.
    ///
    /// A transport failure mid-stream surfaces as an error here without a
    /// final update having been delivered to the callback.
    pub async fn read<F>(mut self, mut callback: F) -> Result<StreamUpdate>
    where
        F: FnMut(&StreamUpdate),
    {
        let mut last = None;
        while let Some(update) = self.inner.next().await {
            let update = update?;
            callback(&update);
            last = Some(update);
        }
        last.ok_or_else(|| Error::streaming("stream ended without a final update", None))
    }
}

impl Stream for ChatStream {
    type Item = Result<StreamUpdate>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatStream").finish_non_exhaustive()
    }
}
