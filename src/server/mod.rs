//! TCP listening, raw connections and the accept loop.

pub mod connection;
pub mod handler;
pub mod listener;

pub use connection::Connection;
pub use listener::ListeningSocket;
