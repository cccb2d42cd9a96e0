//! Non-blocking TCP socket driven by the run loop
//!
//! Every operation is tried right away. If the socket would block, a task
//! is posted which waits on the multiplexer for a bounded time and tries
//! again on the next pass. Registration is edge-triggered, so a task
//! always retries the operation itself rather than trusting a stale event.
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::net::TcpStream as StdTcpStream;
use std::rc::Rc;
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, SockAddr, SockRef, Socket, Type};

use crate::config::Config;
use crate::endpoint::TcpEndpoint;
use crate::error::Error;
use crate::scheduler::Handle;


const SOCKET: Token = Token(0);
/// The multiplexer only ever watches one socket
const EVENTS_CAPACITY: usize = 10;


struct Reactor {
    sock: mio::net::TcpStream,
    poll: Poll,
    events: Events,
}

/// One TCP socket plus its own multiplexer instance
///
/// The socket and the multiplexer are shared with pending tasks, so they
/// stay open until the last task touching them is finished, even if the
/// `TcpStream` itself is dropped.
pub struct TcpStream {
    reactor: Rc<RefCell<Reactor>>,
    handle: Handle,
    connect_wait: Duration,
    io_wait: Duration,
}

fn would_block(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
}

fn interrupted(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::Interrupted
}

fn create_socket() -> io::Result<StdTcpStream> {
    // Close-on-exec is set by socket2 itself
    let sock = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    sock.set_nonblocking(true)?;
    Ok(sock.into())
}

impl Reactor {
    fn new() -> io::Result<Reactor> {
        let mut sock = mio::net::TcpStream::from_std(create_socket()?);
        let poll = Poll::new()?;
        poll.registry().register(&mut sock, SOCKET,
            Interest::READABLE | Interest::WRITABLE)?;
        Ok(Reactor {
            sock: sock,
            poll: poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
        })
    }
    /// Waits for any event on the socket, at most `timeout`
    ///
    /// Returns `true` if something was reported.
    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => Ok(!self.events.is_empty()),
            Err(ref e) if interrupted(e) => Ok(false),
            Err(e) => Err(e),
        }
    }
    /// Starts a non-blocking connect
    ///
    /// Returns `true` if the connection was established right away.
    fn start_connect(&self, ep: &TcpEndpoint) -> io::Result<bool> {
        let addr = SockAddr::from(ep.socket_addr());
        match SockRef::from(&self.sock).connect(&addr) {
            Ok(()) => Ok(true),
            Err(ref e) if e.raw_os_error() == Some(libc::EINPROGRESS) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
    /// Checks whether a pending connect has finished
    ///
    /// A writable socket is not necessarily a connected one: a refused
    /// connect is reported through `SO_ERROR`.
    fn connected(&self) -> io::Result<bool> {
        if let Some(e) = self.sock.take_error()? {
            return Err(e);
        }
        match self.sock.peer_addr() {
            Ok(_) => Ok(true),
            Err(ref e) if e.kind() == io::ErrorKind::NotConnected => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl TcpStream {
    /// Creates the socket and the multiplexer and registers one in the other
    ///
    /// Any failure closes what was already opened.
    pub fn new(handle: &Handle, config: &Config) -> Result<TcpStream, Error> {
        let reactor = Reactor::new().map_err(|e| Error::socket_init(&e))?;
        Ok(TcpStream {
            reactor: Rc::new(RefCell::new(reactor)),
            handle: handle.clone(),
            connect_wait: config.connect_wait,
            io_wait: config.io_wait,
        })
    }

    pub fn connect<F>(&self, ep: &TcpEndpoint, callback: F)
        where F: FnOnce(Result<(), Error>) + 'static
    {
        let started = self.reactor.borrow().start_connect(ep);
        match started {
            Ok(true) => {
                debug!("connected to {} immediately", ep);
                return callback(Ok(()));
            }
            Ok(false) => {}
            Err(e) => {
                debug!("connect to {} failed: {}", ep, e);
                return callback(Err(Error::connect(&e)));
            }
        }
        let reactor = self.reactor.clone();
        let wait = self.connect_wait;
        let ep = ep.clone();
        let mut callback = Some(callback);
        self.handle.post(move || {
            let result = {
                let mut r = reactor.borrow_mut();
                match r.connected() {
                    Ok(true) => Ok(()),
                    Ok(false) => match r.wait(wait) {
                        Ok(_) => return false,
                        Err(e) => Err(Error::connect(&e)),
                    },
                    Err(e) => Err(Error::connect(&e)),
                }
            };
            match result {
                Ok(()) => debug!("connected to {}", ep),
                Err(ref e) => debug!("connect to {}: {}", ep, e),
            }
            if let Some(cb) = callback.take() {
                cb(result);
            }
            true
        });
    }

    /// Sends `data` with a single non-blocking send
    ///
    /// Completes with the number of bytes accepted by the kernel, which
    /// may be less than `data.len()`. Callers that need the whole buffer
    /// sent have to loop.
    pub fn write<F>(&self, data: Vec<u8>, callback: F)
        where F: FnOnce(Result<usize, Error>) + 'static
    {
        let first = (&self.reactor.borrow().sock).write(&data);
        match first {
            Ok(n) => {
                trace!("sent {} of {} bytes", n, data.len());
                return callback(Ok(n));
            }
            Err(ref e) if would_block(e) || interrupted(e) => {}
            Err(e) => return callback(Err(Error::write(&e))),
        }
        let reactor = self.reactor.clone();
        let wait = self.io_wait;
        let mut callback = Some(callback);
        self.handle.post(move || {
            let result = {
                let mut r = reactor.borrow_mut();
                let sent = (&r.sock).write(&data);
                match sent {
                    Ok(n) => Ok(n),
                    Err(ref e) if would_block(e) || interrupted(e) => {
                        if let Err(e) = r.wait(wait) {
                            Err(Error::write(&e))
                        } else {
                            return false;
                        }
                    }
                    Err(e) => Err(Error::write(&e)),
                }
            };
            if let Ok(n) = result {
                trace!("sent {} of {} bytes", n, data.len());
            }
            if let Some(cb) = callback.take() {
                cb(result);
            }
            true
        });
    }

    /// Receives once into `buf`, waiting for the socket to become readable
    ///
    /// The buffer is moved into the pending operation and handed back to
    /// the callback along with the number of bytes received. End of
    /// stream is reported as `Error::Eof`.
    pub fn read_some<F>(&self, buf: Vec<u8>, callback: F)
        where F: FnOnce(Vec<u8>, Result<usize, Error>) + 'static
    {
        let reactor = self.reactor.clone();
        let wait = self.io_wait;
        let mut pending = Some((buf, callback));
        self.handle.post(move || {
            let result = {
                let buf = match pending {
                    Some((ref mut buf, _)) => buf,
                    None => return true,
                };
                let mut r = reactor.borrow_mut();
                let received = (&r.sock).read(&mut buf[..]);
                match received {
                    Ok(0) => Err(Error::Eof),
                    Ok(n) => Ok(n),
                    Err(ref e) if would_block(e) || interrupted(e) => {
                        if let Err(e) = r.wait(wait) {
                            Err(Error::read(&e))
                        } else {
                            return false;
                        }
                    }
                    Err(e) => Err(Error::read(&e)),
                }
            };
            if let Ok(n) = result {
                trace!("received {} bytes", n);
            }
            if let Some((buf, cb)) = pending.take() {
                cb(buf, result);
            }
            true
        });
    }
}
