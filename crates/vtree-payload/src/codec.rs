use vtree_types::attachment::DEFAULT_CONTENT_TYPE;
use vtree_types::BinaryAttachment;

use crate::assemble::{Part, PartBody, TransportPayload};
use crate::config::validate_boundary;
use crate::error::{PayloadError, PayloadResult};

const CRLF: &[u8] = b"\r\n";

/// Codec for `multipart/form-data` bodies (RFC 7578).
///
/// Text parts carry only a `Content-Disposition` header. Binary parts add a
/// `filename` (the attachment's own name, or the part name) and a
/// `Content-Type`. The boundary is supplied by the caller, so the same
/// payload always encodes to the same bytes.
pub struct MultipartCodec;

impl MultipartCodec {
    /// Value of the `Content-Type` request header for `boundary`.
    pub fn content_type(boundary: &str) -> String {
        format!("multipart/form-data; boundary={boundary}")
    }

    /// Encode all parts of `payload`.
    pub fn encode(payload: &TransportPayload, boundary: &str) -> PayloadResult<Vec<u8>> {
        validate_boundary(boundary).map_err(PayloadError::Framing)?;
        let delimiter = format!("--{boundary}");

        let body_len: usize = payload.parts().iter().map(|p| p.body_bytes().len()).sum();
        let mut buf = Vec::with_capacity(body_len + payload.len() * 128);

        for part in payload.parts() {
            let body = part.body_bytes();
            if contains(body, delimiter.as_bytes()) {
                return Err(PayloadError::BoundaryCollision {
                    part: part.name.clone(),
                });
            }

            buf.extend_from_slice(delimiter.as_bytes());
            buf.extend_from_slice(CRLF);
            let name = escape_quoted(&part.name);
            match &part.body {
                PartBody::Text(_) => {
                    buf.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"").as_bytes(),
                    );
                    buf.extend_from_slice(CRLF);
                }
                PartBody::Binary(binary) => {
                    let file_name = escape_quoted(binary.file_name.as_deref().unwrap_or(&part.name));
                    buf.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\""
                        )
                        .as_bytes(),
                    );
                    buf.extend_from_slice(CRLF);
                    buf.extend_from_slice(
                        format!("Content-Type: {}", binary.effective_content_type()).as_bytes(),
                    );
                    buf.extend_from_slice(CRLF);
                }
            }
            buf.extend_from_slice(CRLF);
            buf.extend_from_slice(body);
            buf.extend_from_slice(CRLF);
        }

        buf.extend_from_slice(delimiter.as_bytes());
        buf.extend_from_slice(b"--");
        buf.extend_from_slice(CRLF);
        Ok(buf)
    }

    /// Decode a body produced by [`encode`](Self::encode). Parts with a
    /// `filename` decode as binary, all others as UTF-8 text.
    pub fn decode(data: &[u8], boundary: &str) -> PayloadResult<Vec<Part>> {
        let delimiter = format!("--{boundary}");
        let delimiter = delimiter.as_bytes();
        let mut separator = CRLF.to_vec();
        separator.extend_from_slice(delimiter);

        if !data.starts_with(delimiter) {
            return Err(PayloadError::Framing("body does not start with boundary".into()));
        }

        let mut parts = Vec::new();
        let mut pos = delimiter.len();
        loop {
            let rest = &data[pos..];
            if rest.starts_with(b"--") {
                return Ok(parts);
            }
            if !rest.starts_with(CRLF) {
                return Err(PayloadError::Framing(format!("expected CRLF at offset {pos}")));
            }
            pos += CRLF.len();

            let headers_end = find(data, b"\r\n\r\n", pos)
                .ok_or_else(|| PayloadError::Framing("unterminated part headers".into()))?;
            let headers = std::str::from_utf8(&data[pos..headers_end])
                .map_err(|e| PayloadError::Framing(format!("part headers are not UTF-8: {e}")))?;
            let body_start = headers_end + 4;
            let body_end = find(data, &separator, body_start)
                .ok_or_else(|| PayloadError::Framing("missing closing boundary".into()))?;

            parts.push(parse_part(headers, &data[body_start..body_end])?);
            pos = body_end + separator.len();
        }
    }
}

fn parse_part(headers: &str, body: &[u8]) -> PayloadResult<Part> {
    let mut name = None;
    let mut file_name = None;
    let mut content_type = None;

    for line in headers.split("\r\n") {
        let Some((header, value)) = line.split_once(':') else {
            return Err(PayloadError::Framing(format!("malformed header line: {line}")));
        };
        if header.eq_ignore_ascii_case("content-disposition") {
            for param in split_params(value).into_iter().skip(1) {
                match param.trim().split_once('=') {
                    Some(("name", v)) => name = Some(unescape_quoted(v)),
                    Some(("filename", v)) => file_name = Some(unescape_quoted(v)),
                    _ => {}
                }
            }
        } else if header.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    let name = name.ok_or_else(|| PayloadError::Framing("part without name".into()))?;
    match file_name {
        Some(file_name) => {
            let mut binary = BinaryAttachment::new(body.to_vec());
            if file_name != name {
                binary = binary.with_file_name(file_name);
            }
            if let Some(content_type) = content_type.filter(|c| c != DEFAULT_CONTENT_TYPE) {
                binary = binary.with_content_type(content_type);
            }
            Ok(Part::binary(name, binary))
        }
        None => {
            let text = String::from_utf8(body.to_vec())
                .map_err(|e| PayloadError::Framing(format!("text part {name} is not UTF-8: {e}")))?;
            Ok(Part::text(name, text))
        }
    }
}

/// Split header parameters on `;`, ignoring separators inside quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

fn escape_quoted(s: &str) -> String {
    s.replace('%', "%25")
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn unescape_quoted(s: &str) -> String {
    let s = s.trim();
    let s = s.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(s);
    s.replace("%22", "\"")
        .replace("%0D", "\r")
        .replace("%0A", "\n")
        .replace("%25", "%")
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle, 0).is_some()
}
