use crate::http::response::{Response, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Renders a status line, headers and body into one buffer.
///
/// A `Content-Length` header matching `body` is appended unless `headers`
/// already carries one.
pub fn serialize_response<K, V>(status: StatusCode, headers: &[(K, V)], body: &[u8]) -> Vec<u8>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut buf = Vec::with_capacity(128 + body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    let mut has_length = false;
    for (k, v) in headers {
        let (k, v) = (k.as_ref(), v.as_ref());
        has_length |= k.eq_ignore_ascii_case("Content-Length");
        push_header(&mut buf, k, v);
    }
    if !has_length {
        push_header(&mut buf, "Content-Length", &body.len().to_string());
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(body);

    buf
}

pub fn serialize(resp: &Response) -> Vec<u8> {
    serialize_response(resp.status, &resp.headers, &resp.body)
}

fn push_header(buf: &mut Vec<u8>, key: &str, value: &str) {
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}
