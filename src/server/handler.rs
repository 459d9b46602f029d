use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::ParserConfig;
use crate::error::HttpError;
use crate::http::connection::HttpRequestConnection;
use crate::http::response::{ResponseBuilder, StatusCode};
use crate::server::connection::Connection;

/// Serves one request: replies with a plain-text echo of the method, URL
/// and body, then closes the connection.
pub async fn serve<S>(conn: Connection<S>, cfg: &ParserConfig) -> Result<(), HttpError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut http = HttpRequestConnection::new(conn, cfg).await?;

    let mut reply = format!("{} {}\n", http.method(), http.url());
    if let Ok(body) = http.body_string() {
        reply.push_str(&body);
        reply.push('\n');
    }

    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("Connection", "close")
        .body(reply)
        .build();
    http.send(response).await?;
    http.close().await?;
    Ok(())
}
