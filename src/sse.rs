//! Server-Sent Events (SSE) stream decoding.
//!
//! The gateway streams chat completions as line-delimited frames:
//! ```text
//! data: {"choices": [{"delta": {"content": "Hel"}}]}
//!
//! data: {"choices": [{"delta": {"content": "lo"}}]}
//!
//! data: [DONE]
//! ```
//!
//! [`StreamDecoder`] is the transport-agnostic core. Chunks of any size and
//! alignment are pushed in and JSON events are pulled out in order.
//! [`decode_chunks`], [`decode_stream`] and [`SseResponseExt`] drive the same
//! decoder from an iterator, an async byte stream and a `reqwest::Response`.

use std::marker::PhantomData;

use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::SentinelError;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Incremental decoder for one SSE response body.
///
/// A decoder is single use: once the `[DONE]` sentinel has been seen, a
/// payload failed to parse, or the input was closed and drained, it yields
/// nothing more.
///
/// # Example
/// ```
/// use sentinel_sdk::sse::StreamDecoder;
///
/// let mut decoder = StreamDecoder::new();
/// assert!(decoder.decode(b"data: {\"a\"").unwrap().is_empty());
///
/// let events = decoder.decode(b":1}\ndata: [DONE]\n").unwrap();
/// assert_eq!(events, vec![serde_json::json!({"a": 1})]);
/// assert!(decoder.is_done());
/// ```
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Decoded text; at most one unterminated line once complete lines are drained.
    buffer: String,
    /// Trailing bytes of a UTF-8 sequence split across chunks.
    pending: Vec<u8>,
    closed: bool,
    done: bool,
}

impl StreamDecoder {
    /// Create a decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the decoder has finished: sentinel seen, fatal parse error,
    /// or input closed and fully drained.
    pub fn is_done(&self) -> bool {
        self.done || (self.closed && self.buffer.is_empty())
    }

    /// Append a raw chunk to the buffer.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD. An incomplete
    /// sequence at the end of the chunk is held back until the next chunk.
    /// Callers drain complete lines with `next_event` before the next push.
    pub(crate) fn push(&mut self, chunk: &[u8]) {
        if self.done || self.closed {
            return;
        }

        self.pending.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.pending);
        let mut rest: &[u8] = &bytes;

        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    self.buffer.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Signal that no more chunks will arrive.
    ///
    /// Whatever remains in the buffer is treated as a final, possibly
    /// unterminated, line by the next call to `next_event`.
    pub(crate) fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            self.buffer.push_str(&String::from_utf8_lossy(&pending));
        }
    }

    /// Mark the decoder as abandoned, e.g. after a transport failure.
    pub(crate) fn abandon(&mut self) {
        self.done = true;
        self.buffer.clear();
        self.pending.clear();
    }

    /// Pull the next event out of the complete lines in the buffer.
    ///
    /// Returns `None` when more input is needed or the decoder is done. A
    /// malformed payload is returned once as an error and ends the decoder.
    pub(crate) fn next_event<T: DeserializeOwned>(&mut self) -> Option<Result<T, SentinelError>> {
        while !self.done {
            let line = match self.buffer.find('\n') {
                Some(pos) => {
                    let mut line: String = self.buffer.drain(..=pos).collect();
                    line.pop();
                    line
                }
                None if self.closed && !self.buffer.is_empty() => std::mem::take(&mut self.buffer),
                None => return None,
            };
            let line = line.strip_suffix('\r').unwrap_or(line.as_str());

            let Some(payload) = parse_sse_line(line) else {
                continue;
            };

            if is_done_marker(payload) {
                debug!("stream sentinel received");
                self.abandon();
                return None;
            }

            let event = serde_json::from_str(payload).map_err(|e| {
                self.abandon();
                SentinelError::malformed(payload, e)
            });
            trace!(ok = event.is_ok(), "decoded stream event");
            return Some(event);
        }
        None
    }

    /// Push a chunk and collect every event it completes.
    ///
    /// Every complete line is drained before returning, so the buffer keeps
    /// at most one unterminated line between calls. On a malformed payload,
    /// events decoded earlier in the same chunk are discarded along with it;
    /// [`decode_chunks`] and [`decode_stream`] yield them individually.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<Value>, SentinelError> {
        self.push(chunk);
        std::iter::from_fn(|| self.next_event::<Value>()).collect()
    }

    /// Close the input and decode the unterminated remainder, if any.
    pub fn finish(mut self) -> Result<Option<Value>, SentinelError> {
        self.close();
        self.next_event::<Value>().transpose()
    }
}

/// Pull-based decoding over an iterator of chunks.
///
/// Created by [`decode_chunks`].
#[derive(Debug)]
pub struct Events<I, T> {
    chunks: I,
    decoder: StreamDecoder,
    _event: PhantomData<fn() -> T>,
}

impl<I, T> Iterator for Events<I, T>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
    T: DeserializeOwned,
{
    type Item = Result<T, SentinelError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.decoder.next_event::<T>() {
                return Some(event);
            }
            if self.decoder.is_done() {
                return None;
            }
            match self.chunks.next() {
                Some(chunk) => self.decoder.push(chunk.as_ref()),
                None => self.decoder.close(),
            }
        }
    }
}

/// Decode events lazily from an iterator of chunks.
///
/// # Example
/// ```
/// use sentinel_sdk::sse::decode_chunks;
/// use serde_json::{json, Value};
///
/// let chunks = ["data: {\"a\"", ":1}\n", "data: {\"b\":2}"];
/// let events: Vec<Value> = decode_chunks::<_, Value>(chunks)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(events, vec![json!({"a": 1}), json!({"b": 2})]);
/// ```
pub fn decode_chunks<I, T>(chunks: I) -> Events<I::IntoIter, T>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
    T: DeserializeOwned,
{
    Events {
        chunks: chunks.into_iter(),
        decoder: StreamDecoder::new(),
        _event: PhantomData,
    }
}

/// Decode events from an async byte stream.
///
/// Transport errors are converted into [`SentinelError`], yielded once, and
/// end the stream. The underlying stream is not polled again after the
/// `[DONE]` sentinel.
pub fn decode_stream<S, B, E, T>(chunks: S) -> impl Stream<Item = Result<T, SentinelError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Into<SentinelError> + Send,
    T: DeserializeOwned + Send,
{
    stream::unfold(
        (Box::pin(chunks), StreamDecoder::new()),
        |(mut chunks, mut decoder)| async move {
            loop {
                if let Some(event) = decoder.next_event::<T>() {
                    return Some((event, (chunks, decoder)));
                }
                if decoder.is_done() {
                    return None;
                }

                match chunks.next().await {
                    Some(Ok(chunk)) => decoder.push(chunk.as_ref()),
                    Some(Err(e)) => {
                        decoder.abandon();
                        return Some((Err(e.into()), (chunks, decoder)));
                    }
                    None => {
                        debug!("stream transport closed");
                        decoder.close();
                    }
                }
            }
        },
    )
}

/// Extension trait for `reqwest::Response` to decode its body as SSE events.
///
/// # Example
/// ```ignore
/// use sentinel_sdk::sse::SseResponseExt;
///
/// let response = http.post(url).json(&body).send().await?;
/// let mut events = std::pin::pin!(response.sse_events());
/// while let Some(event) = events.next().await {
///     println!("{}", event?);
/// }
/// ```
pub trait SseResponseExt {
    /// Decode the body into a stream of JSON values.
    fn sse_events(self) -> impl Stream<Item = Result<Value, SentinelError>> + Send;

    /// Decode the body into a stream of `T`.
    fn sse_events_as<T>(self) -> impl Stream<Item = Result<T, SentinelError>> + Send
    where
        T: DeserializeOwned + Send;
}

impl SseResponseExt for reqwest::Response {
    fn sse_events(self) -> impl Stream<Item = Result<Value, SentinelError>> + Send {
        decode_stream(self.bytes_stream())
    }

    fn sse_events_as<T>(self) -> impl Stream<Item = Result<T, SentinelError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        decode_stream(self.bytes_stream())
    }
}

/// Extract the payload of a `data: ` line.
///
/// # Example
/// ```
/// use sentinel_sdk::sse::parse_sse_line;
///
/// assert_eq!(parse_sse_line("data: {\"a\":1}"), Some("{\"a\":1}"));
/// assert_eq!(parse_sse_line("event: message"), None);
/// assert_eq!(parse_sse_line("data:{}"), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

/// Check if an SSE payload is the end-of-stream sentinel.
pub fn is_done_marker(data: &str) -> bool {
    data == DONE_MARKER
}
