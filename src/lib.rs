//! Courier - minimal HTTP-over-TCP building blocks
//!
//! Core library: a listening socket that yields raw connections, and an
//! incremental parser that turns a connection into an HTTP request.

pub mod config;
pub mod error;
pub mod http;
pub mod server;

pub use error::{HttpError, SocketError};
