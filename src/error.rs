use std::io;


quick_error!{
    /// Error type passed to every completion callback
    ///
    /// Each variant is a failure kind of a single in-flight request. There
    /// is no "ok" variant: success is the `Ok` arm of the `Result` handed
    /// to the callback. Use `ErrorKind::of` if you need the closed set
    /// including success.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        HostnameResolve(msg: String) {
            display("hostname resolve failed: {}", msg)
        }
        Connect(msg: String) {
            display("connect failed: {}", msg)
        }
        Read(msg: String) {
            display("read failed: {}", msg)
        }
        Write(msg: String) {
            display("write failed: {}", msg)
        }
        Eof {
            display("end of stream")
        }
        SocketInit(msg: String) {
            display("socket init failed: {}", msg)
        }
        FileInit(msg: String) {
            display("file init failed: {}", msg)
        }
        HeaderParse {
            display("error parsing response headers")
        }
        HeaderTooLarge(limit: usize) {
            display("response headers are larger than {} bytes", limit)
        }
        BodyTooLarge(limit: u64) {
            display("response body is larger than {} bytes", limit)
        }
        Undefined(msg: String) {
            display("undefined error: {}", msg)
        }
    }
}

/// Closed set of outcome kinds, success included
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Ok,
    HostnameResolve,
    Connect,
    Read,
    Write,
    Eof,
    SocketInit,
    FileInit,
    HeaderParse,
    HeaderTooLarge,
    BodyTooLarge,
    Undefined,
}

impl ErrorKind {
    pub fn of<T>(result: &Result<T, Error>) -> ErrorKind {
        match *result {
            Ok(_) => ErrorKind::Ok,
            Err(ref e) => e.kind(),
        }
    }
    pub fn is_failure(&self) -> bool {
        *self != ErrorKind::Ok
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use self::Error::*;
        match *self {
            HostnameResolve(..) => ErrorKind::HostnameResolve,
            Connect(..) => ErrorKind::Connect,
            Read(..) => ErrorKind::Read,
            Write(..) => ErrorKind::Write,
            Eof => ErrorKind::Eof,
            SocketInit(..) => ErrorKind::SocketInit,
            FileInit(..) => ErrorKind::FileInit,
            HeaderParse => ErrorKind::HeaderParse,
            HeaderTooLarge(..) => ErrorKind::HeaderTooLarge,
            BodyTooLarge(..) => ErrorKind::BodyTooLarge,
            Undefined(..) => ErrorKind::Undefined,
        }
    }
    /// Human-readable message, the same text `Display` produces
    pub fn message(&self) -> String {
        self.to_string()
    }
    pub(crate) fn connect(e: &io::Error) -> Error {
        Error::Connect(e.to_string())
    }
    pub(crate) fn read(e: &io::Error) -> Error {
        Error::Read(e.to_string())
    }
    pub(crate) fn write(e: &io::Error) -> Error {
        Error::Write(e.to_string())
    }
    pub(crate) fn socket_init(e: &io::Error) -> Error {
        Error::SocketInit(e.to_string())
    }
    pub(crate) fn file_init(e: &io::Error) -> Error {
        Error::FileInit(e.to_string())
    }
}


#[cfg(test)]
mod test {
    use super::{Error, ErrorKind};

    #[test]
    fn test_kind_of_result() {
        let ok: Result<usize, Error> = Ok(10);
        assert_eq!(ErrorKind::of(&ok), ErrorKind::Ok);
        assert!(!ErrorKind::of(&ok).is_failure());
        let err: Result<usize, Error> = Err(Error::Eof);
        assert_eq!(ErrorKind::of(&err), ErrorKind::Eof);
        assert!(ErrorKind::of(&err).is_failure());
    }

    #[test]
    fn test_message() {
        assert_eq!(Error::HeaderTooLarge(4096).message(),
            "response headers are larger than 4096 bytes");
        assert_eq!(Error::Connect("refused".into()).message(),
            "connect failed: refused");
        assert_eq!(Error::HeaderParse.kind(), ErrorKind::HeaderParse);
    }
}
