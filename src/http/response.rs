use crate::http::negotiation::ContentEncoding;
use crate::http::request::Headers;

/// HTTP version written on every status line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): Request successful
/// - `Created` (201): File created
/// - `BadRequest` (400): Malformed request
/// - `NotFound` (404): Unknown route or missing file
/// - `MethodNotAllowed` (405): Method not supported on `/files/`
/// - `Conflict` (409): File already exists
/// - `InternalServerError` (500): Filesystem failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 409 Conflict
    Conflict,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use courier::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Conflict.as_u16(), 409);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::Conflict => 409,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Maps a numeric code back to a known status.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            201 => Some(StatusCode::Created),
            400 => Some(StatusCode::BadRequest),
            404 => Some(StatusCode::NotFound),
            405 => Some(StatusCode::MethodNotAllowed),
            409 => Some(StatusCode::Conflict),
            500 => Some(StatusCode::InternalServerError),
            _ => None,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use courier::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::Conflict => "Conflict",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A complete HTTP response ready to be serialized.
///
/// When `content_encoding` is `Gzip`, the writer compresses `body` and
/// appends `Content-Encoding` and `Content-Length` after `headers`, so
/// handlers must not set `Content-Length` themselves in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Version written on the status line
    pub version: String,
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers in the order they are written
    pub headers: Headers,
    /// Uncompressed response body
    pub body: Vec<u8>,
    /// Encoding applied to `body` at serialization time
    pub content_encoding: ContentEncoding,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// Nothing is added implicitly: a response built without headers is
/// written with an empty header block.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .body(b"abc".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    version: String,
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
    content_encoding: ContentEncoding,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: HTTP_VERSION.to_string(),
            status,
            headers: Headers::new(),
            body: Vec::new(),
            content_encoding: ContentEncoding::Identity,
        }
    }

    /// Appends a header. Duplicates are kept in insertion order.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn content_encoding(mut self, encoding: ContentEncoding) -> Self {
        self.content_encoding = encoding;
        self
    }

    /// Builds the final Response.
    pub fn build(self) -> Response {
        Response {
            version: self.version,
            status: self.status,
            headers: self.headers,
            body: self.body,
            content_encoding: self.content_encoding,
        }
    }
}

impl Response {
    /// A bare response with the given status and no headers or body.
    pub fn empty(status: StatusCode) -> Self {
        ResponseBuilder::new(status).build()
    }

    /// A `text/plain` response.
    ///
    /// With `ContentEncoding::Identity` the `Content-Length` header carries
    /// the body's byte length; with `Gzip` the writer supplies it after
    /// compression.
    pub fn text(status: StatusCode, body: impl Into<String>, encoding: ContentEncoding) -> Self {
        let body = body.into().into_bytes();
        let mut builder = ResponseBuilder::new(status)
            .header("Content-Type", "text/plain")
            .content_encoding(encoding);
        if encoding == ContentEncoding::Identity {
            builder = builder.header("Content-Length", body.len().to_string());
        }
        builder.body(body).build()
    }

    /// An `application/octet-stream` response carrying raw bytes.
    pub fn octet_stream(body: Vec<u8>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Length", body.len().to_string())
            .body(body)
            .build()
    }

    /// Creates a bare 200 OK response.
    pub fn ok() -> Self {
        Self::empty(StatusCode::Ok)
    }

    /// Creates a bare 404 Not Found response.
    pub fn not_found() -> Self {
        Self::empty(StatusCode::NotFound)
    }

    /// Creates a bare 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::empty(StatusCode::InternalServerError)
    }
}
