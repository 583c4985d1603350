//! Newline-delimited JSON framing over the browser's standard streams.
//!
//! When the browser is launched in pipe mode it speaks the protocol over
//! its stdin/stdout: one JSON envelope per line in each direction. The
//! halves here are generic over any `AsyncRead`/`AsyncWrite`, so tests can
//! drive them with an in-memory duplex instead of a real process.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};

use super::{TransportRx, TransportTx};

// ============================================================================
// PipeTx
// ============================================================================

/// Write half of a pipe transport.
///
/// Appends a newline after each envelope and flushes, so the browser sees
/// one complete frame per write.
pub struct PipeTx<W> {
    writer: W,
}

#[async_trait]
impl<W> TransportTx for PipeTx<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: String) -> Result<()> {
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

// ============================================================================
// PipeRx
// ============================================================================

/// Read half of a pipe transport.
///
/// Yields one trimmed line per envelope; blank lines are skipped. EOF on
/// the read side (the process exited) ends the stream.
pub struct PipeRx<R> {
    reader: BufReader<R>,
}

#[async_trait]
impl<R> TransportRx for PipeRx<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn receive(&mut self) -> Option<Result<String>> {
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line).await {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(Ok(trimmed.to_string()));
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
    }
}

// ============================================================================
// Constructor
// ============================================================================

/// Wraps raw IO halves into a framed pipe transport pair.
pub fn pipe<W, R>(writer: W, reader: R) -> (PipeTx<W>, PipeRx<R>)
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncRead + Unpin + Send,
{
    (
        PipeTx { writer },
        PipeRx {
            reader: BufReader::new(reader),
        },
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_appends_newline() {
        let (client, server) = tokio::io::duplex(1024);
        let (mut tx, _rx) = pipe(client, tokio::io::empty());

        tx.send(r#"{"id":1}"#.to_string()).await.expect("send");
        drop(tx);

        let mut received = String::new();
        let mut reader = BufReader::new(server);
        reader.read_line(&mut received).await.expect("read");
        assert_eq!(received, "{\"id\":1}\n");
    }

    #[tokio::test]
    async fn test_receive_frames_lines() {
        let (client, server) = tokio::io::duplex(1024);
        let (mut tx, _) = pipe(client, tokio::io::empty());
        let (_, mut rx) = pipe(tokio::io::sink(), server);

        tx.send(r#"{"id":1}"#.to_string()).await.expect("send");
        tx.send(r#"{"id":2}"#.to_string()).await.expect("send");

        let first = rx.receive().await.expect("frame").expect("ok");
        let second = rx.receive().await.expect("frame").expect("ok");
        assert_eq!(first, r#"{"id":1}"#);
        assert_eq!(second, r#"{"id":2}"#);
    }

    #[tokio::test]
    async fn test_receive_skips_blank_lines() {
        let (mut client, server) = tokio::io::duplex(1024);
        let (_, mut rx) = pipe(tokio::io::sink(), server);

        client
            .write_all(b"\n\n{\"id\":3}\n")
            .await
            .expect("write");

        let frame = rx.receive().await.expect("frame").expect("ok");
        assert_eq!(frame, r#"{"id":3}"#);
    }

    #[tokio::test]
    async fn test_receive_ends_on_eof() {
        let (client, server) = tokio::io::duplex(64);
        let (_, mut rx) = pipe(tokio::io::sink(), server);
        drop(client);

        assert!(rx.receive().await.is_none());
    }

    #[tokio::test]
    async fn test_receive_surfaces_read_errors() {
        let mock = tokio_test::io::Builder::new()
            .read(b"{\"id\":9}\n")
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            ))
            .build();
        let (_, mut rx) = pipe(tokio::io::sink(), mock);

        let frame = rx.receive().await.expect("frame").expect("ok");
        assert_eq!(frame, r#"{"id":9}"#);

        let err = rx.receive().await.expect("result").expect_err("read error");
        assert!(matches!(err, Error::Io(_)));
    }
}
