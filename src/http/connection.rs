use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::config::ParserConfig;
use crate::error::{HttpError, SocketError};
use crate::http::parser::{HeaderObserver, RequestParser};
use crate::http::request::{Headers, HttpRequest};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::serialize_response;
use crate::server::connection::Connection;

/// A connection whose request has been fully parsed and which can be
/// answered once.
///
/// ```ignore
/// let conn = socket.accept().await?;
/// let mut http = HttpRequestConnection::new(conn, &ParserConfig::default()).await?;
/// let reply = format!("{} {}\n", http.method(), http.url());
/// http.send_response(reply, StatusCode::Ok, &[("Content-Type", "text/plain")]).await?;
/// http.close().await?;
/// ```
#[derive(Debug)]
pub struct HttpRequestConnection<S = TcpStream, H = Headers> {
    connection: Connection<S>,
    request: HttpRequest<H>,
    responded: bool,
}

impl<S> HttpRequestConnection<S, Headers>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Takes ownership of `connection` and waits until its request has been
    /// read completely. On failure the connection is dropped, closing it.
    pub async fn new(connection: Connection<S>, config: &ParserConfig) -> Result<Self, HttpError> {
        Self::with_observer(connection, config, Headers::default()).await
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.request.header(key)
    }
}

impl<S, H> HttpRequestConnection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: HeaderObserver,
{
    /// Like [`new`](HttpRequestConnection::new), reporting headers to
    /// `observer`.
    pub async fn with_observer(
        mut connection: Connection<S>,
        config: &ParserConfig,
        observer: H,
    ) -> Result<Self, HttpError> {
        let request = RequestParser::with_observer(config, observer)
            .parse(&mut connection)
            .await?;
        Ok(Self {
            connection,
            request,
            responded: false,
        })
    }

    pub fn request(&self) -> &HttpRequest<H> {
        &self.request
    }

    pub fn method(&self) -> &str {
        self.request.method()
    }

    pub fn url(&self) -> &str {
        self.request.url()
    }

    pub fn headers(&self) -> &H {
        self.request.headers()
    }

    pub fn has_body(&self) -> bool {
        self.request.has_body()
    }

    pub fn body(&self) -> Result<&[u8], HttpError> {
        self.request.body()
    }

    pub fn body_bytes(&self) -> Result<Bytes, HttpError> {
        self.request.body_bytes()
    }

    pub fn body_string(&self) -> Result<String, HttpError> {
        self.request.body_string()
    }

    pub fn body_length(&self) -> Result<usize, HttpError> {
        self.request.body_length()
    }

    pub fn has_responded(&self) -> bool {
        self.responded
    }

    /// Sends `payload` as the body of a response with the given status and
    /// extra headers, in a single write.
    pub async fn send_response<K, V>(
        &mut self,
        payload: impl AsRef<[u8]>,
        status: StatusCode,
        extra_headers: &[(K, V)],
    ) -> Result<(), HttpError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.ensure_not_responded()?;
        let message = serialize_response(status, extra_headers, payload.as_ref());
        self.write_response(&message).await
    }

    pub async fn send(&mut self, response: Response) -> Result<(), HttpError> {
        self.send_response(&response.body, response.status, response.headers.as_slice())
            .await
    }

    /// Writes already formatted response bytes as they are.
    pub async fn send_raw(&mut self, bytes: impl AsRef<[u8]>) -> Result<(), HttpError> {
        self.ensure_not_responded()?;
        self.write_response(bytes.as_ref()).await
    }

    /// Closes the underlying connection.
    pub async fn close(mut self) -> Result<(), SocketError> {
        self.connection.close().await
    }

    /// Splits into the raw connection and the parsed request.
    pub fn into_parts(self) -> (Connection<S>, HttpRequest<H>) {
        (self.connection, self.request)
    }

    fn ensure_not_responded(&self) -> Result<(), HttpError> {
        if self.responded {
            return Err(HttpError::DoubleResponse);
        }
        Ok(())
    }

    async fn write_response(&mut self, bytes: &[u8]) -> Result<(), HttpError> {
        self.connection.write(bytes).await?;
        self.responded = true;
        Ok(())
    }
}
