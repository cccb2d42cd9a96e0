//! Response head parsing
//!
//! `parse()` works on a complete head block. `HeadReader` collects the
//! block from arbitrarily split reads and hands over whatever came after
//! it, which is the beginning of the body.
use crate::error::Error;
use crate::shared::Version;
use super::head::{Fields, ResponseHeader};


const CRLF: &[u8] = b"\r\n";
const END_OF_HEAD: &[u8] = b"\r\n\r\n";


fn find_substr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Reads `HTTP/1.x ` at `pos`
///
/// Returns the version and the position right after the following space.
/// Anything unrecognized yields HTTP/1.1 at position zero, so the caller
/// carries on parsing from the start of the line.
pub fn parse_version(line: &str, pos: usize) -> (Version, usize) {
    let rest = match line.get(pos..).and_then(|s| s.strip_prefix("HTTP/")) {
        Some(rest) => rest,
        None => return (Version::Http11, 0),
    };
    let space = match rest.find(' ') {
        Some(x) => x,
        None => return (Version::Http11, 0),
    };
    match Version::from_token(&rest[..space]) {
        Some(ver) => (ver, line.len() - rest.len() + space + 1),
        None => (Version::Http11, 0),
    }
}

/// Reads a three-digit status code at `pos`
///
/// The code ends at the next space or at the end of the line, so a bare
/// `HTTP/1.1 204` is accepted with an empty reason. Returns the code and
/// the position where the reason phrase starts.
pub fn parse_status_code(line: &str, pos: usize) -> Option<(u16, usize)> {
    let rest = line.get(pos..)?;
    let (token, next) = match rest.find(' ') {
        Some(x) => (&rest[..x], pos + x + 1),
        None => (rest, line.len()),
    };
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let code: u16 = token.parse().ok()?;
    if code < 100 || code >= 600 {
        return None;
    }
    Some((code, next))
}

/// Parses a complete response head
///
/// `data` starts with the status line. Every line must end with CRLF.
/// Parsing stops at the first empty line or at the end of `data`, so the
/// terminating blank line is optional. Field values lose exactly one
/// leading space.
///
/// Lines are split on raw bytes. The reason phrase and the fields are
/// decoded lossily, so obs-text (e.g. Latin-1) becomes U+FFFD instead of
/// failing the whole head.
pub fn parse(data: &[u8]) -> Result<ResponseHeader, Error> {
    let line_end = find_substr(data, CRLF).ok_or(Error::HeaderParse)?;
    let status_line = String::from_utf8_lossy(&data[..line_end]);

    let (version, pos) = parse_version(&status_line, 0);
    let (code, pos) = parse_status_code(&status_line, pos)
        .ok_or(Error::HeaderParse)?;
    let reason = &status_line[pos..];

    let mut fields = Fields::new();
    let mut rest = &data[line_end+CRLF.len()..];
    while !rest.is_empty() {
        let end = find_substr(rest, CRLF).ok_or(Error::HeaderParse)?;
        let line = &rest[..end];
        if line.is_empty() {
            break;
        }
        let colon = line.iter().position(|&b| b == b':')
            .ok_or(Error::HeaderParse)?;
        let value = &line[colon+1..];
        let value = value.strip_prefix(&b" "[..]).unwrap_or(value);
        fields.insert(String::from_utf8_lossy(&line[..colon]),
                      String::from_utf8_lossy(value));
        rest = &rest[end+CRLF.len()..];
    }
    Ok(ResponseHeader::new(version, code, reason, fields))
}


/// Accumulates the response head from pieces of input
#[derive(Debug)]
pub struct HeadReader {
    buf: Vec<u8>,
    limit: usize,
}

impl HeadReader {
    pub fn new(limit: usize) -> HeadReader {
        HeadReader {
            buf: Vec::new(),
            limit: limit,
        }
    }
    /// Number of bytes collected so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
    /// Adds received bytes
    ///
    /// Returns `Ok(None)` until the empty line is seen. Then returns the
    /// parsed head and the bytes that followed it. The reader must not be
    /// fed after that.
    pub fn feed(&mut self, data: &[u8])
        -> Result<Option<(ResponseHeader, Vec<u8>)>, Error>
    {
        // The delimiter may straddle the previous and the new piece
        let start = self.buf.len().saturating_sub(END_OF_HEAD.len() - 1);
        self.buf.extend_from_slice(data);
        match find_substr(&self.buf[start..], END_OF_HEAD) {
            Some(x) => {
                let head_len = start + x + END_OF_HEAD.len();
                if head_len > self.limit {
                    return Err(Error::HeaderTooLarge(self.limit));
                }
                let rest = self.buf.split_off(head_len);
                let header = parse(&self.buf)?;
                self.buf.clear();
                Ok(Some((header, rest)))
            }
            None if self.buf.len() > self.limit => {
                Err(Error::HeaderTooLarge(self.limit))
            }
            None => Ok(None),
        }
    }
}
