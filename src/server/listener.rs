use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, error, info, warn};

use crate::config::{Config, ServerConfig};
use crate::error::SocketError;
use crate::server::connection::Connection;
use crate::server::handler;

/// An IPv4 socket listening on all interfaces.
///
/// The socket is closed when this value is dropped.
#[derive(Debug)]
pub struct ListeningSocket {
    listener: TcpListener,
}

impl ListeningSocket {
    /// Creates a socket with address reuse enabled, binds it to `port` on
    /// every interface and starts listening with the given `backlog`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(port: u16, backlog: u32) -> Result<Self, SocketError> {
        let socket = TcpSocket::new_v4().map_err(SocketError::Create)?;
        socket.set_reuseaddr(true).map_err(SocketError::Create)?;
        socket
            .bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
            .map_err(SocketError::Bind)?;
        let listener = socket.listen(backlog).map_err(SocketError::Listen)?;
        Ok(Self { listener })
    }

    pub fn from_config(cfg: &ServerConfig) -> Result<Self, SocketError> {
        Self::create(cfg.port, cfg.backlog)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the next client and hands over its connection.
    pub async fn accept(&self) -> Result<Connection, SocketError> {
        self.accept_with_peer().await.map(|(conn, _)| conn)
    }

    /// Like [`accept`](Self::accept), also returning the client address.
    pub async fn accept_with_peer(&self) -> Result<(Connection, SocketAddr), SocketError> {
        let (stream, peer) = self.listener.accept().await.map_err(SocketError::Accept)?;
        Ok((Connection::new(stream), peer))
    }
}

/// Accepts clients forever, serving each one on its own task.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let socket = ListeningSocket::from_config(&cfg.server)?;
    info!(
        port = cfg.server.port,
        backlog = cfg.server.backlog,
        "Listening"
    );

    loop {
        let (conn, peer) = match socket.accept_with_peer().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Accept failed");
                continue;
            }
        };
        debug!(%peer, "Accepted connection");

        let parser_config = cfg.parser.clone();
        tokio::spawn(async move {
            if let Err(e) = handler::serve(conn, &parser_config).await {
                error!(%peer, error = %e, "Connection error");
            }
        });
    }
}
