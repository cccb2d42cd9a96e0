//! Single-connection HTTP/1.1 downloader on a cooperative poll loop
//!
//! Nothing here blocks. The `Loop` is the only thing that runs: every
//! component posts polling tasks into it and reports results through
//! callbacks, once per operation.
//!
//! * `resolver` submits a lookup and polls for its completion
//! * `stream::TcpStream` owns a non-blocking socket and a mio `Poll`
//! * `file::OutFileStream` writes with POSIX AIO
//! * `client::HttpClient` ties them together for one GET request
//!
//! Linux only: the file writer uses the `aio_*` family.
#[macro_use] extern crate log;
#[macro_use] extern crate quick_error;

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod file;
pub mod http_url;
pub mod resolver;
pub mod scheduler;
pub mod stream;
mod shared;

pub use client::{HttpClient, ResponseHeader, State};
pub use config::{Config, MAX_HEADER_SIZE, MAX_BODY_SIZE, BUFFER_SIZE};
pub use endpoint::{Endpoint, TcpEndpoint};
pub use error::{Error, ErrorKind};
pub use file::OutFileStream;
pub use http_url::{HttpUrl, UrlError};
pub use scheduler::{Handle, Loop, Task};
pub use shared::{BodyProgress, Version};
pub use stream::TcpStream;
