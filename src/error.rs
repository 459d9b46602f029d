//! Error taxonomy for sockets and HTTP requests.

use std::io;
use thiserror::Error;

/// Failures of the socket layer: listening, accepting, reading and writing.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("failed to create listening socket: {0}")]
    Create(#[source] io::Error),

    #[error("failed to bind listening socket: {0}")]
    Bind(#[source] io::Error),

    #[error("failed to listen on socket: {0}")]
    Listen(#[source] io::Error),

    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// The transport took fewer bytes than requested in a single attempt.
    /// Writes are never retried.
    #[error("partial write: {written} of {expected} bytes sent")]
    PartialWrite { written: usize, expected: usize },
}

/// Failures while parsing a request or responding to it.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error(transparent)]
    Socket(#[from] SocketError),

    #[error("request has no body")]
    NoBody,

    #[error("a response was already sent on this connection")]
    DoubleResponse,

    #[error("connection closed after {received} bytes, before the request was complete")]
    IncompleteRequest { received: usize },
}
