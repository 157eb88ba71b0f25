use crate::api::logging::{emit_frame_decode_error, emit_frame_parse_error};
use crate::types::AskFragment;

const FRAME_MARKER: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// One line-delimited unit of the streaming ask response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text fragment to append to the in-progress assistant message.
    Text(String),
    /// The terminal sentinel; the turn is over and further bytes are noise.
    Done,
}

/// Incremental splitter for the chunked ask body. Bytes are buffered and cut
/// only at newline boundaries, so a multi-byte character split across two
/// reads is carried intact instead of decoding to replacement characters.
#[derive(Default)]
pub struct FrameParser {
    buffer: Vec<u8>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one transport chunk and return every frame completed by it.
    /// A chunk may complete zero, one, or many frames.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            if let Some(frame) = decode_line(&self.buffer[start..end]) {
                frames.push(frame);
            }
            start = end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        frames
    }

    /// Parse whatever is left after transport EOF as one unterminated line.
    pub fn finish(&mut self) -> Option<Frame> {
        if self.buffer.is_empty() {
            return None;
        }
        let remainder = std::mem::take(&mut self.buffer);
        decode_line(&remainder)
    }
}

fn decode_line(raw: &[u8]) -> Option<Frame> {
    match std::str::from_utf8(raw) {
        Ok(line) => parse_frame_line(line),
        Err(decode_error) => {
            emit_frame_decode_error(raw.len(), &decode_error);
            None
        }
    }
}

/// A line qualifies as a frame only if it carries the `data:` marker after
/// trimming; anything else is discarded silently. Malformed JSON payloads are
/// logged and skipped so one bad frame cannot abort the stream.
pub fn parse_frame_line(line: &str) -> Option<Frame> {
    let payload = line.trim().strip_prefix(FRAME_MARKER)?.trim_start();
    if payload == DONE_SENTINEL {
        return Some(Frame::Done);
    }

    match serde_json::from_str::<AskFragment>(payload) {
        Ok(fragment) => fragment.text.map(Frame::Text),
        Err(parse_error) => {
            emit_frame_parse_error(payload, &parse_error);
            None
        }
    }
}
