use thiserror::Error;

use crate::http::request::{Headers, Method, Request};
use crate::http::response::{Response, StatusCode};

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Largest request head (request line plus headers) accepted.
pub const MAX_HEAD_SIZE: usize = 8 * 1024;
/// Largest declared `Content-Length` accepted.
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed start line")]
    InvalidRequest,
    #[error("unsupported method")]
    InvalidMethod,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("request head too large")]
    HeadTooLarge,
    #[error("request body too large")]
    BodyTooLarge,
    #[error("incomplete message")]
    Incomplete,
}

/// Parses one request from the front of `buf`.
///
/// Returns the request and the number of bytes it occupied. Fails with
/// `ParseError::Incomplete` until the head terminator has arrived and, when
/// the head declares `Content-Length`, until that many body bytes follow it.
/// Without `Content-Length` the body is every byte after the terminator.
///
/// A head longer than `MAX_HEAD_SIZE` or a declared body longer than
/// `MAX_BODY_SIZE` is rejected instead of buffered.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let headers_end = match find_headers_end(buf) {
        Some(end) if end > MAX_HEAD_SIZE => return Err(ParseError::HeadTooLarge),
        Some(end) => end,
        None if buf.len() > MAX_HEAD_SIZE + HEAD_TERMINATOR.len() => {
            return Err(ParseError::HeadTooLarge);
        }
        None => return Err(ParseError::Incomplete),
    };
    let body_start = headers_end + HEAD_TERMINATOR.len();

    let (method, target, version, headers) = parse_head(&buf[..headers_end])?;
    let body_bytes = &buf[body_start..];

    let content_length = declared_content_length(&headers)?;
    let body_len = match content_length {
        Some(len) if body_bytes.len() < len => return Err(ParseError::Incomplete),
        Some(len) => len,
        None => body_bytes.len(),
    };

    let request = Request {
        method,
        target,
        version,
        headers,
        body: body_bytes[..body_len].to_vec(),
    };

    Ok((request, body_start + body_len))
}

/// Parses whatever arrived before the peer closed its write half.
///
/// Used once the stream hit EOF: a missing head terminator or a short body
/// is no longer worth waiting for, so the head is taken as-is and the body
/// is whatever bytes followed it.
pub fn parse_truncated_request(buf: &[u8]) -> Result<Request, ParseError> {
    let (head, body) = match find_headers_end(buf) {
        Some(end) => (&buf[..end], &buf[end + HEAD_TERMINATOR.len()..]),
        None => (trim_trailing_crlf(buf), &[][..]),
    };

    let (method, target, version, headers) = parse_head(head)?;
    let body_len = match declared_content_length(&headers)? {
        Some(len) => len.min(body.len()),
        None => body.len(),
    };

    Ok(Request {
        method,
        target,
        version,
        headers,
        body: body[..body_len].to_vec(),
    })
}

/// Decodes a serialized response.
///
/// The body is every byte after the blank line, kept exactly as written,
/// so a gzip body stays compressed and `content_encoding` is left as
/// identity. Only the status codes this server emits are recognised.
pub fn parse_http_response(buf: &[u8]) -> Result<Response, ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let head = std::str::from_utf8(&buf[..headers_end]).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = head.split("\r\n");
    let status_line = lines.next().ok_or(ParseError::InvalidRequest)?;

    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;
    let code = parts
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .and_then(StatusCode::from_u16)
        .ok_or(ParseError::InvalidRequest)?;
    let reason = parts.next().ok_or(ParseError::InvalidRequest)?;
    if reason != code.reason_phrase() {
        return Err(ParseError::InvalidRequest);
    }

    let headers = parse_header_lines(lines)?;

    Ok(Response {
        version: version.to_string(),
        status: code,
        headers,
        body: buf[headers_end + HEAD_TERMINATOR.len()..].to_vec(),
        content_encoding: Default::default(),
    })
}

pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
}

fn parse_head(head: &[u8]) -> Result<(Method, String, String, Headers), ParseError> {
    let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidRequest)?;
    let mut lines = head.split("\r\n");

    // Request line: exactly METHOD SP TARGET SP VERSION
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let parts: Vec<&str> = request_line.split(' ').collect();
    let [method_str, target, version] = parts.as_slice() else {
        return Err(ParseError::InvalidRequest);
    };

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;
    if !target.starts_with('/') || version.is_empty() {
        return Err(ParseError::InvalidRequest);
    }

    let headers = parse_header_lines(lines)?;

    Ok((method, target.to_string(), version.to_string(), headers))
}

fn parse_header_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<Headers, ParseError> {
    let mut headers = Headers::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;

        headers.append(key.trim(), value.trim());
    }

    Ok(headers)
}

fn declared_content_length(headers: &Headers) -> Result<Option<usize>, ParseError> {
    headers
        .get("Content-Length")
        .map(|v| match v.parse::<usize>() {
            Ok(len) if len > MAX_BODY_SIZE => Err(ParseError::BodyTooLarge),
            Ok(len) => Ok(len),
            Err(_) => Err(ParseError::InvalidContentLength),
        })
        .transpose()
}

fn trim_trailing_crlf(mut buf: &[u8]) -> &[u8] {
    while let Some(rest) = buf.strip_suffix(b"\r\n") {
        buf = rest;
    }
    buf
}
