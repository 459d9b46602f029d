#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// In-memory stream that replays scripted read chunks and records writes.
///
/// Each chunk is delivered by its own read (split further if the reader's
/// buffer is smaller). After the script runs out, reads return EOF.
#[derive(Debug, Default)]
pub struct ScriptedStream {
    chunks: VecDeque<Vec<u8>>,
    read_error: bool,
    max_write: Option<usize>,
    write_error: bool,
    written: Arc<Mutex<Vec<u8>>>,
    reads: Arc<Mutex<Vec<usize>>>,
}

impl ScriptedStream {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            ..Self::default()
        }
    }

    /// Delivers `message` in pieces of `size` bytes.
    pub fn chunked(message: &[u8], size: usize) -> Self {
        Self::new(message.chunks(size))
    }

    pub fn whole(message: &[u8]) -> Self {
        Self::new([message])
    }

    /// Fails the first read that happens after the script runs out.
    pub fn fail_reads_after_script(mut self) -> Self {
        self.read_error = true;
        self
    }

    /// Accepts at most `n` bytes per write call.
    pub fn max_write(mut self, n: usize) -> Self {
        self.max_write = Some(n);
        self
    }

    pub fn fail_writes(mut self) -> Self {
        self.write_error = true;
        self
    }

    /// Handle to everything written so far.
    pub fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.written)
    }

    /// Handle to the buffer sizes passed to each read call.
    pub fn reads(&self) -> Arc<Mutex<Vec<usize>>> {
        Arc::clone(&self.reads)
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.reads.lock().unwrap().push(buf.remaining());

        let Some(chunk) = self.chunks.front_mut() else {
            if self.read_error {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "scripted read failure",
                )));
            }
            return Poll::Ready(Ok(()));
        };

        let n = chunk.len().min(buf.remaining());
        buf.put_slice(&chunk[..n]);
        chunk.drain(..n);
        if chunk.is_empty() {
            self.chunks.pop_front();
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.write_error {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }
        let n = self.max_write.map_or(buf.len(), |max| max.min(buf.len()));
        self.written.lock().unwrap().extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
