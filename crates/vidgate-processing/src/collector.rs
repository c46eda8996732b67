//! Body collection.
//!
//! Uploaded bodies are fully materialized before inspection. No ceiling is applied
//! here: the size policy is checked against the store's declared content length.

use futures::{Stream, StreamExt};
use vidgate_core::{IngestError, IngestResult};

/// Number of leading bytes inspected by the signature matcher.
pub const HEADER_LEN: usize = 16;

/// Collect a chunked byte stream into one contiguous buffer.
///
/// `size_hint` pre-sizes the buffer (typically the declared content length) and is
/// capped so a bogus declaration cannot force a huge allocation up front.
pub async fn collect<S, B, E>(stream: S, size_hint: Option<u64>) -> IngestResult<Vec<u8>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

    let capacity = size_hint.unwrap_or(0).min(MAX_PREALLOC) as usize;
    let mut buffer = Vec::with_capacity(capacity);

    futures::pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| IngestError::Io(e.to_string()))?;
        buffer.extend_from_slice(chunk.as_ref());
    }

    Ok(buffer)
}

/// Leading bytes used for signature checks (fewer when the body is shorter).
pub fn header_of(data: &[u8]) -> &[u8] {
    &data[..data.len().min(HEADER_LEN)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    #[tokio::test]
    async fn test_collect_concatenates_chunks() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"")),
            Ok(Bytes::from_static(b"cde")),
        ];
        let data = collect(stream::iter(chunks), Some(5)).await.unwrap();
        assert_eq!(data, b"abcde");
    }

    #[tokio::test]
    async fn test_collect_empty_stream() {
        let chunks: Vec<Result<Bytes, String>> = vec![];
        let data = collect(stream::iter(chunks), None).await.unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_collect_fails_on_stream_error() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"ab")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"cd")),
        ];
        let result = collect(stream::iter(chunks), None).await;
        match result {
            Err(IngestError::Io(message)) => assert!(message.contains("connection reset")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_declared_length_does_not_cap_collection() {
        let chunks: Vec<Result<Bytes, String>> = vec![Ok(Bytes::from(vec![1u8; 100]))];
        let data = collect(stream::iter(chunks), Some(10)).await.unwrap();
        assert_eq!(data.len(), 100);
    }

    #[test]
    fn test_header_of() {
        assert_eq!(header_of(&[1, 2, 3]), &[1, 2, 3]);
        assert_eq!(header_of(&[0u8; 40]).len(), HEADER_LEN);
    }
}
