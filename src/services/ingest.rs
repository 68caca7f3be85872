//! Stream ingestion — response body → accumulated text → patches.
//!
//! The loop awaits each chunk before reading the next, so patches arrive in
//! order and each one extends the previous. It is the only writer of the
//! accumulated string for the length of an exchange and holds no lock.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::chat::decode::Utf8StreamDecoder;
use crate::chat::types::ChatError;

/// What one ingested stream produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Full decoded response text.
    pub text: String,
    /// Chunks received from the transport.
    pub chunks: usize,
    /// Raw bytes received from the transport.
    pub bytes: usize,
}

/// Drain `stream`, calling `on_patch` with the full accumulated text each
/// time it grows.
///
/// Chunks that only complete part of a character produce no patch. Malformed
/// bytes decode to U+FFFD instead of failing the exchange.
///
/// # Errors
///
/// Returns the transport error if the stream breaks mid-body. Text patched
/// before the break stays where the callback put it.
pub async fn ingest_stream<S, F>(mut stream: S, mut on_patch: F) -> Result<IngestSummary, ChatError>
where
    S: Stream<Item = Result<Bytes, ChatError>> + Unpin,
    F: FnMut(&str),
{
    let mut decoder = Utf8StreamDecoder::new();
    let mut summary = IngestSummary::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        summary.chunks += 1;
        summary.bytes += chunk.len();

        let decoded = decoder.decode(&chunk);
        if decoded.is_empty() {
            continue;
        }
        summary.text.push_str(&decoded);
        on_patch(&summary.text);
    }

    if let Some(tail) = decoder.finish() {
        summary.text.push_str(&tail);
        on_patch(&summary.text);
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "ingest_test.rs"]
mod tests;
