//! Byte stream helpers.

use std::io;

use bytes::Bytes;
use tokio_util::io::StreamReader;
use unifs::ByteReader;

/// A reader yielding `data` in chunks of at most `chunk` bytes.
pub fn chunked_reader(data: Vec<u8>, chunk: usize) -> ByteReader {
    let chunks: Vec<io::Result<Bytes>> = data
        .chunks(chunk.max(1))
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    Box::pin(StreamReader::new(tokio_stream::iter(chunks)))
}

/// A reader yielding `prefix`, then failing with `message`.
pub fn failing_reader(prefix: Vec<u8>, message: &str) -> ByteReader {
    let mut items: Vec<io::Result<Bytes>> = Vec::new();
    if !prefix.is_empty() {
        items.push(Ok(Bytes::from(prefix)));
    }
    items.push(Err(io::Error::new(
        io::ErrorKind::ConnectionReset,
        message.to_string(),
    )));
    Box::pin(StreamReader::new(tokio_stream::iter(items)))
}

/// Deterministic non-repeating-looking payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + i / 251) as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_chunked_reader_yields_everything() {
        let mut reader = chunked_reader(payload(10_000), 333);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, payload(10_000));
    }

    #[tokio::test]
    async fn test_failing_reader_errors_after_prefix() {
        let mut reader = failing_reader(b"abc".to_vec(), "boom");
        let mut buf = [0u8; 3];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"abc");

        let mut rest = Vec::new();
        let err = reader.read_to_end(&mut rest).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }
}
