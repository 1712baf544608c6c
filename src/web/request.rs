//! Minimal HTTP request head reader.
//!
//! Every request gets the same response, so nothing past "is this a complete
//! request head" is interpreted: the request line is kept for logging and
//! header lines are counted and dropped.

use crate::error::{ExporterError, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Upper bound on the bytes read for one request head.
pub const MAX_REQUEST_HEAD_BYTES: u64 = 8 * 1024;

/// A consumed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// First line of the request, without its line ending
    pub request_line: String,
    /// Number of header lines that followed it
    pub header_count: usize,
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Read a request line and its headers up to the terminating empty line.
///
/// Blank lines before the request line are skipped. Fails with a connection
/// error if the peer closes early, the head exceeds
/// [`MAX_REQUEST_HEAD_BYTES`], or the read itself fails.
pub async fn read_request_head<R: AsyncRead + Unpin>(reader: R) -> Result<RequestHead> {
    let mut reader = BufReader::new(reader.take(MAX_REQUEST_HEAD_BYTES));
    let mut line = Vec::with_capacity(256);
    let mut consumed = 0u64;
    let mut request_line: Option<String> = None;
    let mut header_count = 0;

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(|e| ExporterError::connection_error(format!("Read failed: {}", e)))?;
        consumed += n as u64;

        if line.last() != Some(&b'\n') {
            let reason = if consumed >= MAX_REQUEST_HEAD_BYTES {
                format!("Request head exceeds {} bytes", MAX_REQUEST_HEAD_BYTES)
            } else {
                "Connection closed before end of request head".to_string()
            };
            return Err(ExporterError::connection_error(reason));
        }

        let content = trim_line_ending(&line);
        if request_line.is_none() {
            if !content.is_empty() {
                request_line = Some(String::from_utf8_lossy(content).into_owned());
            }
        } else if content.is_empty() {
            break;
        } else {
            header_count += 1;
        }
    }

    Ok(RequestHead {
        // The loop only breaks once a request line has been stored.
        request_line: request_line.unwrap_or_default(),
        header_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_reads_full_head() {
        let mock = Builder::new()
            .read(b"GET / HTTP/1.1\r\nHost: x\r\n")
            .read(b"Accept: */*\r\n\r\n")
            .build();

        let head = read_request_head(mock).await.unwrap();
        assert_eq!(head.request_line, "GET / HTTP/1.1");
        assert_eq!(head.header_count, 2);
    }

    #[tokio::test]
    async fn test_bare_line_feeds_and_leading_blank_lines() {
        let mock = Builder::new().read(b"\r\nGET /metrics HTTP/1.0\n\n").build();

        let head = read_request_head(mock).await.unwrap();
        assert_eq!(head.request_line, "GET /metrics HTTP/1.0");
        assert_eq!(head.header_count, 0);
    }

    #[tokio::test]
    async fn test_content_is_not_interpreted() {
        let mock = Builder::new().read(b"\xff\xfe garbage\r\n\r\n").build();
        assert!(read_request_head(mock).await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_before_terminator() {
        let mock = Builder::new().read(b"GET / HTTP/1.1\r\nHost: x\r\n").build();

        let err = read_request_head(mock).await.unwrap_err();
        assert!(matches!(err, ExporterError::Connection(_)));
        assert!(err.to_string().contains("closed before end"));
    }

    #[tokio::test]
    async fn test_empty_connection() {
        let mock = Builder::new().build();
        assert!(read_request_head(mock).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_head_rejected() {
        let mut request = b"GET / HTTP/1.1\r\n".to_vec();
        while request.len() as u64 <= MAX_REQUEST_HEAD_BYTES {
            request.extend_from_slice(b"X-Padding: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n");
        }
        request.extend_from_slice(b"\r\n");

        let err = read_request_head(&request[..]).await.unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }
}
