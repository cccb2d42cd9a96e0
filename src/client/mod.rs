//! HTTP/1.1 client for a single request
//!
//! `HttpClient` resolves the host, connects, sends a GET request and
//! streams the response body to a sink as it arrives. Every step is
//! either completed right away or continued from a loop task, the client
//! never blocks.
//!
//! Only `Content-Length` framing is supported. A response without it is
//! treated as having no body, and the request ends right after the head.
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::endpoint::{Endpoint, TcpEndpoint};
use crate::error::Error;
use crate::http_url::HttpUrl;
use crate::resolver::resolve;
use crate::scheduler::Handle;
use crate::shared::BodyProgress;
use crate::stream::TcpStream;

mod head;
mod parser;
pub mod request;

pub use self::head::{Fields, ResponseHeader};
pub use self::parser::{parse, parse_status_code, parse_version, HeadReader};


/// Where the client currently is in the request/response cycle
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Idle,
    Resolving,
    Connecting,
    /// Connected, `connect()` alone was requested
    Connected,
    Sending,
    ReadingHeader,
    ReadingBody,
    Done,
    Failed,
}

type ConnectCallback = Box<dyn FnOnce(Result<(), Error>)>;
type Sink = Box<dyn FnMut(Result<&[u8], Error>)>;

struct Inner {
    handle: Handle,
    stream: TcpStream,
    url: HttpUrl,
    config: Config,
    state: Cell<State>,
    header: RefCell<Option<ResponseHeader>>,
    on_connect: RefCell<Option<ConnectCallback>>,
    connect_requested: Cell<bool>,
    sink: RefCell<Option<Sink>>,
}

/// A client that fetches one URL over one connection
///
/// Tasks of the client share ownership of its internals, so dropping the
/// `HttpClient` while a request is in flight is fine.
pub struct HttpClient {
    inner: Rc<Inner>,
}

impl HttpClient {
    pub fn new(handle: &Handle, url: HttpUrl, config: &Config)
        -> Result<HttpClient, Error>
    {
        let stream = TcpStream::new(handle, config)?;
        Ok(HttpClient {
            inner: Rc::new(Inner {
                handle: handle.clone(),
                stream: stream,
                url: url,
                config: config.clone(),
                state: Cell::new(State::Idle),
                header: RefCell::new(None),
                on_connect: RefCell::new(None),
                connect_requested: Cell::new(false),
                sink: RefCell::new(None),
            }),
        })
    }
    pub fn state(&self) -> State {
        self.inner.state.get()
    }
    pub fn url(&self) -> &HttpUrl {
        &self.inner.url
    }
    /// The response head, once it has been received
    pub fn header(&self) -> Option<ResponseHeader> {
        self.inner.header.borrow().clone()
    }
    /// Resolves the host and connects to the first IPv4 address
    ///
    /// The callback is invoked exactly once. Subsequent calls are ignored.
    pub fn connect<F>(&self, callback: F)
        where F: FnOnce(Result<(), Error>) + 'static
    {
        Inner::connect(&self.inner, Box::new(callback));
    }
    /// Fetches the URL, streaming the body into `sink`
    ///
    /// The sink receives each body fragment in arrival order, then an
    /// empty fragment once the whole `Content-Length` is received. A
    /// response without a body never invokes the sink. If the request
    /// fails the sink gets the error instead and is not invoked
    /// afterwards. Subsequent calls are ignored.
    pub fn load_stream<F>(&self, sink: F)
        where F: FnMut(Result<&[u8], Error>) + 'static
    {
        {
            let mut slot = self.inner.sink.borrow_mut();
            if slot.is_some() {
                warn!("load_stream() is already called for {}",
                    self.inner.url.host);
                return;
            }
            *slot = Some(Box::new(sink));
        }
        let inner = self.inner.clone();
        let on_connect = move |res: Result<(), Error>| match res {
            Ok(()) => Inner::send_request(&inner),
            Err(e) => inner.fail(e),
        };
        Inner::connect(&self.inner, Box::new(on_connect));
    }
}

impl Inner {
    fn set_state(&self, state: State) {
        debug!("{}: {:?} -> {:?}", self.url.host, self.state.get(), state);
        self.state.set(state);
    }
    fn emit(&self, data: Result<&[u8], Error>) {
        if let Some(ref mut sink) = *self.sink.borrow_mut() {
            sink(data);
        }
    }
    fn fail(&self, err: Error) {
        warn!("request to {} failed: {}", self.url.host, err);
        self.set_state(State::Failed);
        self.emit(Err(err));
    }

    fn connect(me: &Rc<Inner>, callback: ConnectCallback) {
        if me.connect_requested.replace(true) {
            warn!("connect() is already called for {}", me.url.host);
            return;
        }
        *me.on_connect.borrow_mut() = Some(callback);
        me.set_state(State::Resolving);
        let inner = me.clone();
        resolve(&me.handle, &me.url.host, move |res| {
            match res.map(|eps| eps.into_iter().next()) {
                Ok(Some(ep)) => Inner::connect_to(&inner, ep),
                Ok(None) => inner.connected(Err(Error::HostnameResolve(
                    format!("no IPv4 address for {}", inner.url.host)))),
                Err(e) => inner.connected(Err(e)),
            }
        });
    }
    fn connect_to(me: &Rc<Inner>, ep: Endpoint) {
        me.set_state(State::Connecting);
        let ep = TcpEndpoint::new(ep, me.url.port);
        let inner = me.clone();
        me.stream.connect(&ep, move |res| inner.connected(res));
    }
    fn connected(&self, res: Result<(), Error>) {
        self.set_state(match res {
            Ok(()) => State::Connected,
            Err(_) => State::Failed,
        });
        let callback = self.on_connect.borrow_mut().take();
        if let Some(cb) = callback {
            cb(res);
        }
    }

    fn send_request(me: &Rc<Inner>) {
        me.set_state(State::Sending);
        let req = request::build(&me.url, &me.config.user_agent);
        Inner::send(me, req);
    }
    /// Sends `data`, looping until the kernel accepted all of it
    fn send(me: &Rc<Inner>, mut data: Vec<u8>) {
        let inner = me.clone();
        me.stream.write(data.clone(), move |res| match res {
            Ok(n) if n < data.len() => {
                trace!("short write {} of {} bytes", n, data.len());
                data.drain(..n);
                Inner::send(&inner, data);
            }
            Ok(_) => {
                inner.set_state(State::ReadingHeader);
                let reader = HeadReader::new(inner.config.max_header_size);
                let buf = vec![0; inner.config.read_chunk_size];
                Inner::read_header(&inner, reader, buf);
            }
            Err(e) => inner.fail(e),
        });
    }

    fn read_header(me: &Rc<Inner>, mut reader: HeadReader, buf: Vec<u8>) {
        let inner = me.clone();
        me.stream.read_some(buf, move |buf, res| {
            let n = match res {
                Ok(n) => n,
                Err(e) => return inner.fail(e),
            };
            match reader.feed(&buf[..n]) {
                Ok(None) => Inner::read_header(&inner, reader, buf),
                Ok(Some((header, rest))) => {
                    Inner::start_body(&inner, header, rest, buf)
                }
                Err(e) => inner.fail(e),
            }
        });
    }

    fn start_body(me: &Rc<Inner>, header: ResponseHeader, rest: Vec<u8>,
        buf: Vec<u8>)
    {
        let length = header.content_length();
        debug!("{}: {} {} {}, content length {}", me.url.host,
            header.version, header.status_code, header.reason, length);
        *me.header.borrow_mut() = Some(header);
        let mut progress = BodyProgress::new(length,
                                             me.config.max_body_size);
        if length == 0 {
            // No body: the sink is not invoked at all
            return me.set_state(State::Done);
        }
        me.set_state(State::ReadingBody);
        if !rest.is_empty() && !me.deliver(&mut progress, &rest) {
            return;
        }
        if progress.is_complete() {
            return me.finish();
        }
        Inner::read_body(me, progress, buf);
    }
    fn read_body(me: &Rc<Inner>, mut progress: BodyProgress, buf: Vec<u8>) {
        let inner = me.clone();
        me.stream.read_some(buf, move |buf, res| {
            let n = match res {
                Ok(n) => n,
                Err(e) => return inner.fail(e),
            };
            if !inner.deliver(&mut progress, &buf[..n]) {
                return;
            }
            if progress.is_complete() {
                inner.finish();
            } else {
                Inner::read_body(&inner, progress, buf);
            }
        });
    }
    /// Hands body bytes to the sink, returns `false` if the request failed
    fn deliver(&self, progress: &mut BodyProgress, data: &[u8]) -> bool {
        match progress.accept(data) {
            Ok(part) => {
                trace!("{}: body {} of {} bytes", self.url.host,
                    progress.received(), progress.expected());
                self.emit(Ok(part));
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }
    fn finish(&self) {
        self.set_state(State::Done);
        self.emit(Ok(&[]));
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("url", &self.inner.url)
            .field("state", &self.inner.state.get())
            .finish()
    }
}
