use std::cell::Cell;
use std::slice;

use crate::shared::Version;


/// Response header fields in the order they were received
///
/// Names are compared exactly as sent, no case folding. Inserting a name
/// that is already present replaces its value in place (last wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    items: Vec<(String, String)>,
}

impl Fields {
    pub fn new() -> Fields {
        Fields { items: Vec::new() }
    }
    pub fn insert<N, V>(&mut self, name: N, value: V)
        where N: Into<String>, V: Into<String>
    {
        let name = name.into();
        let value = value.into();
        match self.items.iter_mut().find(|(n, _)| *n == name) {
            Some(item) => item.1 = value,
            None => self.items.push((name, value)),
        }
    }
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| &v[..])
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn iter(&self) -> slice::Iter<(String, String)> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a (String, String);
    type IntoIter = slice::Iter<'a, (String, String)>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn parse_digits(value: &str) -> Option<u64> {
    let end = value.bytes().take_while(u8::is_ascii_digit).count();
    value[..end].parse().ok()
}

/// Parsed status line and header fields of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    pub version: Version,
    pub status_code: u16,
    pub reason: String,
    pub fields: Fields,
    content_length: Cell<Option<u64>>,
}

impl ResponseHeader {
    pub fn new(version: Version, status_code: u16, reason: &str,
        fields: Fields)
        -> ResponseHeader
    {
        ResponseHeader {
            version: version,
            status_code: status_code,
            reason: reason.to_string(),
            fields: fields,
            content_length: Cell::new(None),
        }
    }
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }
    /// Length of the body declared by `Content-Length`
    ///
    /// Only the `Content-Length` and `content-length` spellings are looked
    /// at. Only the leading digits of the trimmed value count, so `13abc`
    /// is 13. A missing value or one without leading digits means no body,
    /// i.e. zero. The value is computed on the first call and cached for
    /// the lifetime of this header.
    pub fn content_length(&self) -> u64 {
        if let Some(len) = self.content_length.get() {
            return len;
        }
        let len = self.get("Content-Length")
            .or_else(|| self.get("content-length"))
            .and_then(|v| parse_digits(v.trim()))
            .unwrap_or(0);
        self.content_length.set(Some(len));
        len
    }
}
