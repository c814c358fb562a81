use anyhow::{Context, Result};
use futures_util::{Stream, StreamExt};
use log::debug;
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;

const DATA_PREFIX: &str = "data: ";

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    delta: Option<EventDelta>,
}

#[derive(Deserialize)]
struct EventDelta {
    text: Option<String>,
}

/// Decodes the backend's chunked event stream into a growing text buffer.
///
/// Chunks arrive as opaque byte slices containing zero or more
/// newline-delimited records; a record contributes text only when it carries
/// the `data: ` prefix and parses as a content-delta event. Anything else
/// (pings, block-start events, malformed JSON, torn lines from a previous
/// chunk) is skipped without failing the stream. After each contributing
/// record the full accumulated text is emitted, so callers always hold a
/// complete prefix of the final response and can render it directly.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    line_buf: String,
    text: String,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk; returns one cumulative snapshot per content-delta
    /// record found in it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.line_buf.push_str(&String::from_utf8_lossy(chunk));

        let mut snapshots = Vec::new();
        while let Some(pos) = self.line_buf.find('\n') {
            let line: String = self.line_buf.drain(..=pos).collect();
            if let Some(snapshot) = self.decode_line(line.trim_end()) {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    /// Decode whatever is left in the line buffer. The backend is not
    /// required to terminate the last record with a newline.
    pub fn flush(&mut self) -> Vec<String> {
        if self.line_buf.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.line_buf);
        self.decode_line(line.trim_end()).into_iter().collect()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(mut self) -> String {
        self.flush();
        self.text
    }

    fn decode_line(&mut self, line: &str) -> Option<String> {
        let payload = line.strip_prefix(DATA_PREFIX)?;
        if payload.is_empty() || payload == "null" {
            return None;
        }

        // One corrupt event must not lose the rest of the response.
        let event: StreamEvent = match serde_json::from_str(payload) {
            Ok(event) => event,
            Err(e) => {
                debug!("Skipping malformed stream record: {}", e);
                return None;
            }
        };

        if event.kind != "content_block_delta" {
            return None;
        }
        let fragment = event.delta.and_then(|d| d.text)?;
        self.text.push_str(&fragment);
        Some(self.text.clone())
    }
}

/// Pull handle over a live streaming response: the transport byte stream plus
/// the decoder state. Dropping it mid-response closes the connection, so an
/// abandoned phase does not keep a generation call running.
pub struct CompletionStream {
    chunks: Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>,
    decoder: StreamDecoder,
    pending: VecDeque<String>,
    exhausted: bool,
}

impl CompletionStream {
    pub fn new(chunks: impl Stream<Item = Result<Vec<u8>>> + Send + 'static) -> Self {
        Self {
            chunks: Box::pin(chunks),
            decoder: StreamDecoder::new(),
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Next cumulative snapshot of the response text, or `Ok(None)` once the
    /// transport stream has closed.
    pub async fn next_snapshot(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(snapshot) = self.pending.pop_front() {
                return Ok(Some(snapshot));
            }
            if self.exhausted {
                return Ok(None);
            }
            match self.chunks.next().await {
                Some(chunk) => {
                    let chunk = chunk.context("Error reading response stream")?;
                    self.pending.extend(self.decoder.feed(&chunk));
                }
                None => {
                    self.exhausted = true;
                    self.pending.extend(self.decoder.flush());
                }
            }
        }
    }

    /// Final accumulated text. Only meaningful after `next_snapshot` has
    /// returned `Ok(None)`.
    pub fn into_text(self) -> String {
        self.decoder.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn delta_record(text: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({
                "type": "content_block_delta",
                "delta": { "type": "text_delta", "text": text }
            })
        )
    }

    #[test]
    fn test_deltas_accumulate_in_arrival_order() {
        let mut decoder = StreamDecoder::new();
        let mut snapshots = Vec::new();
        for fragment in ["Once ", "upon ", "a time"] {
            snapshots.extend(decoder.feed(delta_record(fragment).as_bytes()));
        }
        assert_eq!(snapshots, vec!["Once ", "Once upon ", "Once upon a time"]);
        assert_eq!(decoder.into_text(), "Once upon a time");
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let mut decoder = StreamDecoder::new();
        let chunk = format!(
            "{}data: {{not json at all\n{}data: \ndata: null\n{}",
            delta_record("Hello"),
            delta_record(", "),
            delta_record("world")
        );
        let snapshots = decoder.feed(chunk.as_bytes());
        assert_eq!(snapshots, vec!["Hello", "Hello, ", "Hello, world"]);
        assert_eq!(decoder.into_text(), "Hello, world");
    }

    #[test]
    fn test_non_delta_events_and_unprefixed_lines_are_ignored() {
        let mut decoder = StreamDecoder::new();
        let chunk = format!(
            "event: message_start\n\
             data: {{\"type\":\"message_start\"}}\n\
             data: {{\"type\":\"ping\"}}\n\
             {}data: {{\"type\":\"content_block_stop\",\"index\":0}}\n",
            delta_record("draft")
        );
        let snapshots = decoder.feed(chunk.as_bytes());
        assert_eq!(snapshots, vec!["draft"]);
    }

    #[test]
    fn test_record_split_across_chunk_boundary() {
        let record = delta_record("whole fragment");
        let (head, tail) = record.split_at(record.len() / 2);

        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(head.as_bytes()).is_empty());
        let snapshots = decoder.feed(tail.as_bytes());
        assert_eq!(snapshots, vec!["whole fragment"]);
    }

    #[test]
    fn test_final_record_without_trailing_newline() {
        let mut decoder = StreamDecoder::new();
        let record = delta_record("tail");
        decoder.feed(record.trim_end().as_bytes());
        assert_eq!(decoder.text(), "");
        assert_eq!(decoder.into_text(), "tail");
    }

    #[tokio::test]
    async fn test_completion_stream_emits_snapshots_then_final_text() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(delta_record("The ").into_bytes()),
            Ok(format!("{}{}", delta_record("quick "), delta_record("fox")).into_bytes()),
        ];
        let mut stream = CompletionStream::new(stream::iter(chunks));

        let mut snapshots = Vec::new();
        while let Some(snapshot) = stream.next_snapshot().await.unwrap() {
            snapshots.push(snapshot);
        }
        assert_eq!(snapshots, vec!["The ", "The quick ", "The quick fox"]);
        assert_eq!(stream.into_text(), "The quick fox");
    }

    #[tokio::test]
    async fn test_completion_stream_surfaces_transport_errors() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(delta_record("partial").into_bytes()),
            Err(anyhow::anyhow!("connection reset")),
        ];
        let mut stream = CompletionStream::new(stream::iter(chunks));

        assert_eq!(stream.next_snapshot().await.unwrap().unwrap(), "partial");
        assert!(stream.next_snapshot().await.is_err());
    }
}
