//! Incremental SSE frame decoder
//!
//! Turns arbitrary byte chunks into the `data:` strings of complete frames.
//! Chunk boundaries may fall anywhere, including inside a multi-byte UTF-8
//! sequence or between the two newlines of a frame delimiter.

use std::collections::VecDeque;

use futures_util::stream::{self, Stream, StreamExt};

/// Data value that marks the end of the stream; never delivered.
pub const DONE_SENTINEL: &str = "[DONE]";

const FRAME_DELIMITER: &str = "\n\n";
const DATA_PREFIX: &str = "data:";

/// Stateful decoder holding undecoded bytes and an incomplete frame.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of a multi-byte sequence split across chunks
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a blank line
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk and return the data strings of every frame
    /// it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.find(FRAME_DELIMITER) {
            let frame: String = self.buffer.drain(..pos + FRAME_DELIMITER.len()).collect();
            extract_data(&frame[..pos], &mut out);
        }
        out
    }

    /// Signal end-of-stream.
    ///
    /// Undecodable trailing bytes become U+FFFD and the unterminated last
    /// frame, if any, is processed as if a blank line had followed it.
    pub fn finish(&mut self) -> Vec<String> {
        if !self.pending.is_empty() {
            self.buffer
                .push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
        let mut out = Vec::new();
        let rest = std::mem::take(&mut self.buffer);
        extract_data(&rest, &mut out);
        out
    }

    /// Bytes and text still held back waiting for more input.
    pub fn buffered_len(&self) -> usize {
        self.pending.len() + self.buffer.len()
    }

    fn decode(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        // Incomplete sequence at the end; wait for the next chunk
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }
}

fn extract_data(frame: &str, out: &mut Vec<String>) {
    for line in frame.split('\n') {
        if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
            let data = rest.trim();
            if data == DONE_SENTINEL {
                continue;
            }
            out.push(data.to_string());
        }
    }
}

/// Wrap a byte stream into a lazy, finite stream of data strings.
///
/// Transport errors are yielded once and end the stream.
pub fn data_frames<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    stream::unfold(
        (bytes, FrameDecoder::new(), VecDeque::new(), false),
        |(mut bytes, mut decoder, mut ready, mut ended)| async move {
            loop {
                if let Some(data) = ready.pop_front() {
                    return Some((Ok(data), (bytes, decoder, ready, ended)));
                }
                if ended {
                    return None;
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => ready.extend(decoder.feed(chunk.as_ref())),
                    Some(Err(e)) => {
                        ended = true;
                        return Some((Err(e), (bytes, decoder, ready, ended)));
                    }
                    None => {
                        ended = true;
                        ready.extend(decoder.finish());
                    }
                }
            }
        },
    )
}
