use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::negotiation::ContentEncoding;
use crate::http::response::Response;

/// Serializes a response into wire bytes.
///
/// Layout is `"{version} {code} {reason}\r\n"`, each header as
/// `"Name: Value\r\n"`, a blank line, then the body. A gzip response has its
/// body compressed first and `Content-Encoding` / `Content-Length` appended
/// after the handler's headers, with the length taken from the compressed
/// bytes.
pub fn serialize_response(resp: &Response) -> std::io::Result<Vec<u8>> {
    let compressed;
    let body: &[u8] = match resp.content_encoding {
        ContentEncoding::Identity => &resp.body,
        ContentEncoding::Gzip => {
            compressed = gzip(&resp.body)?;
            &compressed
        }
    };

    let mut buf = Vec::with_capacity(128 + body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        resp.version,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in resp.headers.iter() {
        write_header(&mut buf, k, v);
    }

    if resp.content_encoding == ContentEncoding::Gzip {
        write_header(&mut buf, "Content-Encoding", ContentEncoding::Gzip.as_str());
        write_header(&mut buf, "Content-Length", &body.len().to_string());
    }

    // Header/body separator, written even with no headers
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(body);

    Ok(buf)
}

/// Gzip-compresses `data` at the default level.
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn write_header(buf: &mut Vec<u8>, key: &str, value: &str) {
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> std::io::Result<Self> {
        Ok(Self {
            buffer: serialize_response(response)?,
            written: 0,
        })
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;

        Ok(())
    }
}
