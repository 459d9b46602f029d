//! HTTP request parsing and response sending.
//!
//! # Architecture
//!
//! - **`parser`**: Incremental request parser driven by a raw connection
//! - **`request`**: Parsed request and its headers
//! - **`connection`**: A parsed request bound to its connection, answerable once
//! - **`response`**: Status codes and a response builder
//! - **`writer`**: Serializes responses into wire bytes
//!
//! # Request lifecycle
//!
//! ```text
//!   ListeningSocket::accept ──▶ Connection
//!                                   │
//!                                   ▼
//!        RequestParser::parse (request line → headers → body)
//!                                   │
//!                                   ▼
//!        HttpRequestConnection ── send_response (once) ──▶ close
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use connection::HttpRequestConnection;
pub use parser::{HeaderObserver, ParseBuffer, RequestParser};
pub use request::{Headers, HttpRequest};
pub use response::{Response, ResponseBuilder, StatusCode};
