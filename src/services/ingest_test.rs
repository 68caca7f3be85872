use futures::stream;

use super::*;

fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, ChatError>> + Unpin {
    stream::iter(
        parts
            .iter()
            .map(|p| Ok(Bytes::from_static(p)))
            .collect::<Vec<_>>(),
    )
}

#[tokio::test]
async fn final_text_is_concatenation_of_chunks() {
    let mut patches = Vec::new();
    let summary = ingest_stream(chunks(&[b"He", b"llo", b", ", b"world"]), |text| patches.push(text.to_owned()))
        .await
        .unwrap();

    assert_eq!(summary.text, "Hello, world");
    assert_eq!(summary.chunks, 4);
    assert_eq!(summary.bytes, 12);
    assert_eq!(patches, vec!["He", "Hello", "Hello, ", "Hello, world"]);
}

#[tokio::test]
async fn each_patch_strictly_extends_the_previous() {
    let text = "streamed ✓ reply with 日本語 and emoji 😀";
    let bytes = text.as_bytes();
    // Three-byte chunks split most multi-byte characters.
    let parts: Vec<Result<Bytes, ChatError>> =
        bytes.chunks(3).map(|c| Ok(Bytes::copy_from_slice(c))).collect();

    let mut patches: Vec<String> = Vec::new();
    let summary = ingest_stream(stream::iter(parts), |t| patches.push(t.to_owned()))
        .await
        .unwrap();

    assert_eq!(summary.text, text);
    assert_eq!(patches.last().map(String::as_str), Some(text));
    for pair in patches.windows(2) {
        assert!(pair[1].len() > pair[0].len());
        assert!(pair[1].starts_with(&pair[0]));
    }
}

#[tokio::test]
async fn empty_stream_yields_no_patches() {
    let mut calls = 0;
    let summary = ingest_stream(chunks(&[]), |_| calls += 1).await.unwrap();
    assert_eq!(summary, IngestSummary::default());
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn malformed_bytes_degrade_to_replacement() {
    let summary = ingest_stream(chunks(&[b"ok \xFF", b" fine"]), |_| {}).await.unwrap();
    assert_eq!(summary.text, "ok \u{FFFD} fine");
}

#[tokio::test]
async fn truncated_tail_is_flushed_at_end() {
    let mut patches = Vec::new();
    let summary = ingest_stream(chunks(&[b"ok", b"\xE2\x9C"]), |t| patches.push(t.to_owned()))
        .await
        .unwrap();
    assert_eq!(summary.text, "ok\u{FFFD}");
    assert_eq!(patches, vec!["ok", "ok\u{FFFD}"]);
}

#[tokio::test]
async fn mid_stream_error_stops_the_loop() {
    let parts = vec![
        Ok(Bytes::from_static(b"partial")),
        Err(ChatError::Stream("connection reset".into())),
        Ok(Bytes::from_static(b"never seen")),
    ];
    let mut patches = Vec::new();
    let err = ingest_stream(stream::iter(parts), |t| patches.push(t.to_owned()))
        .await
        .unwrap_err();

    assert_eq!(err, ChatError::Stream("connection reset".into()));
    assert_eq!(patches, vec!["partial"]);
}
