// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal HTTP/1.1 framing for the enhancer service.
//
// Only what the service needs: a request line, headers, a `Content-Length`
// delimited body, query strings, and `multipart/form-data` file uploads.
// Every response closes the connection, so there is no keep-alive or chunked
// transfer handling.

use enhancer_core::error::{EnhancerError, Result};
use enhancer_core::human_errors::humanize_error;
use serde::Serialize;
use serde_json::json;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request line and headers, parsed before the body has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Raw query string (after `?`), possibly empty.
    pub query: String,
    /// Header names keep their original case; lookups ignore it.
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    /// Value of the first header called `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Declared body length. Absent means no body.
    pub fn content_length(&self) -> Result<usize> {
        match self.header("content-length") {
            None => Ok(0),
            Some(value) => value.trim().parse().map_err(|_| {
                EnhancerError::BadRequest(format!("invalid Content-Length: {value}"))
            }),
        }
    }
}

/// A complete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub head: RequestHead,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn method(&self) -> &str {
        &self.head.method
    }

    pub fn path(&self) -> &str {
        &self.head.path
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.header(name)
    }

    /// Decoded query parameters in the order they appear.
    pub fn query_params(&self) -> Vec<(String, String)> {
        parse_query(&self.head.query)
    }
}

/// Parse the request line and headers at the start of `data`.
///
/// Returns `Ok(None)` while the header terminator has not arrived yet;
/// otherwise the head and the offset at which the body starts.
pub fn parse_head(data: &[u8]) -> Result<Option<(RequestHead, usize)>> {
    let Some(header_end) = find_subsequence(data, b"\r\n\r\n") else {
        return Ok(None);
    };
    let text = std::str::from_utf8(&data[..header_end])
        .map_err(|_| EnhancerError::BadRequest("request head is not valid UTF-8".into()))?;
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(EnhancerError::BadRequest(format!(
            "malformed request line: {request_line:?}"
        )));
    };
    if !version.starts_with("HTTP/1.") {
        return Err(EnhancerError::BadRequest(format!(
            "unsupported protocol version {version}"
        )));
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    };

    let mut headers = Vec::new();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| EnhancerError::BadRequest(format!("malformed header: {line:?}")))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    Ok(Some((
        RequestHead {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            query: query.to_string(),
            headers,
        },
        header_end + 4,
    )))
}

/// Parse a fully buffered request.
pub fn parse_request(data: &[u8]) -> Result<HttpRequest> {
    let (head, body_offset) = parse_head(data)?
        .ok_or_else(|| EnhancerError::BadRequest("incomplete request head".into()))?;
    let length = head.content_length()?;
    let available = data.len() - body_offset;
    if available < length {
        return Err(EnhancerError::BadRequest(format!(
            "body truncated: expected {length} bytes, got {available}"
        )));
    }
    let body = data[body_offset..body_offset + length].to_vec();
    Ok(HttpRequest { head, body })
}

/// Split a query string into decoded key/value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (percent_decode(key), percent_decode(value)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

/// Decode `%XX` escapes and `+` as space. Malformed escapes pass through.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Find the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// An uploaded image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Pull the uploaded file out of a request.
///
/// Accepts `multipart/form-data` with a part named `file`, or a raw body whose
/// `Content-Type` is `image/*` (file name taken from `X-Filename`, if sent).
/// Anything that is not declared as an image is rejected.
pub fn extract_upload(request: &HttpRequest) -> Result<Upload> {
    let content_type = request.header("content-type").unwrap_or_default();

    let upload = if content_type
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        let boundary = header_param(content_type, "boundary").ok_or_else(|| {
            EnhancerError::BadRequest("multipart request without a boundary".into())
        })?;
        multipart_file(&request.body, &boundary)?
    } else {
        Upload {
            filename: request
                .header("x-filename")
                .unwrap_or("image")
                .to_string(),
            content_type: content_type.to_string(),
            data: request.body.clone(),
        }
    };

    if !upload.content_type.to_ascii_lowercase().starts_with("image/") {
        return Err(EnhancerError::BadRequest("File must be an image".into()));
    }
    if upload.data.is_empty() {
        return Err(EnhancerError::BadRequest("uploaded file is empty".into()));
    }
    Ok(upload)
}

/// Value of a `; key=value` parameter in a header, unquoted.
fn header_param(header: &str, key: &str) -> Option<String> {
    header.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case(key)
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Find the `file` part of a multipart body.
fn multipart_file(body: &[u8], boundary: &str) -> Result<Upload> {
    // Every delimiter after the first is preceded by CRLF; the first may
    // start the body.
    let delimiter = format!("\r\n--{boundary}");
    let delimiter = delimiter.as_bytes();
    let first = &delimiter[2..];

    let mut rest = match find_subsequence(body, first) {
        Some(start) => &body[start + first.len()..],
        None => {
            return Err(EnhancerError::BadRequest(
                "multipart body does not contain the boundary".into(),
            ));
        }
    };

    // Each part: CRLF, headers, CRLF CRLF, content, CRLF delimiter.
    while !rest.starts_with(b"--") {
        let part_start = rest.strip_prefix(b"\r\n").unwrap_or(rest);
        let header_end = find_subsequence(part_start, b"\r\n\r\n")
            .ok_or_else(|| EnhancerError::BadRequest("malformed multipart part".into()))?;
        let headers = String::from_utf8_lossy(&part_start[..header_end]);
        let content = &part_start[header_end + 4..];
        let content_end = find_subsequence(content, delimiter)
            .ok_or_else(|| EnhancerError::BadRequest("unterminated multipart part".into()))?;
        let data = &content[..content_end];

        let mut disposition = "";
        let mut part_type = "";
        for line in headers.split("\r\n") {
            if let Some((name, value)) = line.split_once(':') {
                if name.trim().eq_ignore_ascii_case("content-disposition") {
                    disposition = value.trim();
                } else if name.trim().eq_ignore_ascii_case("content-type") {
                    part_type = value.trim();
                }
            }
        }

        if header_param(disposition, "name").as_deref() == Some("file") {
            return Ok(Upload {
                filename: header_param(disposition, "filename")
                    .unwrap_or_else(|| "image".to_string()),
                content_type: part_type.to_string(),
                data: data.to_vec(),
            });
        }

        rest = &content[content_end + delimiter.len()..];
    }

    Err(EnhancerError::BadRequest(
        "multipart body has no `file` field".into(),
    ))
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// `Retry-After` sent with errors worth retrying.
pub const RETRY_AFTER_SECS: u32 = 5;

/// An HTTP response waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// JSON body. Serialization failures become a 500.
    pub fn json(status: u16, value: &impl Serialize) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status)
                .with_header("Content-Type", "application/json")
                .with_body(body),
            Err(err) => Self::error(&EnhancerError::from(err)),
        }
    }

    /// PNG attachment download.
    pub fn png(data: Vec<u8>, filename: &str) -> Self {
        Self::new(200)
            .with_header("Content-Type", "image/png")
            .with_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", quote_filename(filename)),
            )
            .with_body(data)
    }

    /// `{"detail": ..., "suggestion": ...}` with the mapped status code.
    pub fn error(err: &EnhancerError) -> Self {
        let human = humanize_error(err);
        let body = json!({
            "detail": human.message,
            "suggestion": human.suggestion,
        });
        // json! values always serialize.
        let response = Self::new(human.status)
            .with_header("Content-Type", "application/json")
            .with_body(body.to_string().into_bytes());
        if human.retriable {
            response.with_header("Retry-After", RETRY_AFTER_SECS.to_string())
        } else {
            response
        }
    }

    /// Plain JSON error with an explicit status, for routing failures.
    pub fn detail(status: u16, detail: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(json!({ "detail": detail }).to_string().into_bytes())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Serialize status line, headers and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            self.body.len()
        ));

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// Make `filename` safe inside a quoted header parameter.
fn quote_filename(filename: &str) -> String {
    let mut quoted = String::with_capacity(filename.len());
    for c in filename.chars().filter(|c| !c.is_control()) {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
