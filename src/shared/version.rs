use std::fmt::{self, Display};

/// Protocol version from the response status line
///
/// Only HTTP/1.x responses are understood. A status line with any other
/// version token is read as HTTP/1.1.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Version {
    /// HTTP/1.0 protocol version.
    Http10,
    /// HTTP/1.1, also the fallback for unknown tokens
    Http11,
}

impl Version {
    /// The text after `HTTP/` in a status line
    pub fn from_token(token: &str) -> Option<Version> {
        match token {
            "1.1" => Some(Version::Http11),
            "1.0" => Some(Version::Http10),
            _ => None,
        }
    }
}

impl Default for Version {
    fn default() -> Version {
        Version::Http11
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Version::*;
        f.write_str(match *self {
            Http10 => "HTTP/1.0",
            Http11 => "HTTP/1.1",
        })
    }
}
