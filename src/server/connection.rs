use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::SocketError;

/// A single-owner byte stream to one client.
///
/// Handing a connection to a worker moves it; there is no way to duplicate
/// one. The underlying stream is released exactly once, on [`close`] or when
/// the connection is dropped, whichever comes first.
///
/// [`close`]: Connection::close
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    stream: Option<S>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// Reads at most `buf.len()` bytes, waiting until at least one byte
    /// arrives. Returns 0 once the peer has closed its side.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SocketError> {
        let stream = self.stream.as_mut().ok_or_else(|| SocketError::Read(not_connected()))?;
        stream.read(buf).await.map_err(SocketError::Read)
    }

    /// Writes `bytes` in a single attempt.
    ///
    /// Fails with [`SocketError::PartialWrite`] if the transport accepts only
    /// part of the payload; the remainder is not retried.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), SocketError> {
        let stream = self.stream.as_mut().ok_or_else(|| SocketError::Write(not_connected()))?;
        let written = stream.write(bytes).await.map_err(SocketError::Write)?;
        if written != bytes.len() {
            return Err(SocketError::PartialWrite {
                written,
                expected: bytes.len(),
            });
        }
        stream.flush().await.map_err(SocketError::Write)
    }

    /// Shuts down the write half and releases the stream. Calling this on an
    /// already closed connection does nothing.
    pub async fn close(&mut self) -> Result<(), SocketError> {
        match self.stream.take() {
            Some(mut stream) => stream.shutdown().await.map_err(SocketError::Write),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

impl From<TcpStream> for Connection<TcpStream> {
    fn from(stream: TcpStream) -> Self {
        Self::new(stream)
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection already closed")
}
