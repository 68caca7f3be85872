//! Incremental UTF-8 decoding for streamed response bodies.
//!
//! Chunk boundaries are set by the transport and routinely split multi-byte
//! characters. The decoder carries the incomplete tail of one chunk into the
//! next instead of decoding each chunk in isolation. Malformed bytes become
//! U+FFFD; decoding never fails.

use std::char::REPLACEMENT_CHARACTER;

#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    /// Incomplete trailing sequence from the previous chunk (at most 3 bytes).
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, returning every complete character it finishes.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);

        let mut out = String::with_capacity(buf.len());
        let mut rest = buf.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    if let Some(bad_len) = err.error_len() {
                        out.push(REPLACEMENT_CHARACTER);
                        rest = &tail[bad_len..];
                    } else {
                        // Truncated sequence at the end: wait for the next chunk.
                        self.pending = tail.to_vec();
                        break;
                    }
                }
            }
        }
        out
    }

    /// Flush at end of stream. A dangling partial sequence decodes to U+FFFD.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending.clear();
        Some(REPLACEMENT_CHARACTER.to_string())
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod tests;
