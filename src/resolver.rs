//! Non-blocking host name resolution
//!
//! A lookup is submitted once and then polled from a scheduler task until
//! it completes. The default `ThreadResolver` runs the system resolver on
//! a helper thread and hands the result back over a channel, so the loop
//! thread never blocks on DNS.
use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::scheduler::Handle;


/// Result of polling a submitted lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStatus {
    InProgress,
    Done(Vec<IpAddr>),
    Failed(String),
}

/// A submitted lookup, polled once per scheduler pass
pub trait Lookup {
    fn poll(&mut self) -> LookupStatus;
}

/// Something that can start a lookup without blocking
pub trait Resolver {
    type Lookup: Lookup + 'static;
    fn submit(&self, hostname: &str) -> io::Result<Self::Lookup>;
}

/// Runs `getaddrinfo` on a short-lived helper thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadResolver;

pub struct ThreadLookup {
    result: Receiver<io::Result<Vec<IpAddr>>>,
}

impl Resolver for ThreadResolver {
    type Lookup = ThreadLookup;
    fn submit(&self, hostname: &str) -> io::Result<ThreadLookup> {
        let (tx, rx) = mpsc::channel();
        let host = hostname.to_string();
        thread::Builder::new()
            .name(format!("resolve:{}", host))
            .spawn(move || {
                let res = (&host[..], 0).to_socket_addrs()
                    .map(|addrs| addrs.map(|a| a.ip()).collect());
                // Receiver is gone if the loop was dropped, nothing to do
                tx.send(res).ok();
            })?;
        Ok(ThreadLookup { result: rx })
    }
}

impl Lookup for ThreadLookup {
    fn poll(&mut self) -> LookupStatus {
        match self.result.try_recv() {
            Ok(Ok(addrs)) => LookupStatus::Done(addrs),
            Ok(Err(e)) => LookupStatus::Failed(e.to_string()),
            Err(TryRecvError::Empty) => LookupStatus::InProgress,
            Err(TryRecvError::Disconnected) => {
                LookupStatus::Failed("resolver thread exited".to_string())
            }
        }
    }
}

/// Only IPv4 records are kept, the reactor speaks IPv4 only
fn endpoints(addrs: Vec<IpAddr>) -> Vec<Endpoint> {
    addrs.into_iter().filter_map(|a| match a {
        IpAddr::V4(v4) => Some(Endpoint::new(v4)),
        IpAddr::V6(_) => None,
    }).collect()
}

/// Resolves `hostname` with the system resolver
///
/// The callback is invoked exactly once: synchronously if the lookup
/// can't even be submitted, otherwise from a scheduler task.
pub fn resolve<F>(handle: &Handle, hostname: &str, callback: F)
    where F: FnOnce(Result<Vec<Endpoint>, Error>) + 'static
{
    resolve_with(&ThreadResolver, handle, hostname, callback)
}

pub fn resolve_with<R, F>(resolver: &R, handle: &Handle, hostname: &str,
    callback: F)
    where R: Resolver,
          F: FnOnce(Result<Vec<Endpoint>, Error>) + 'static,
{
    let mut lookup = match resolver.submit(hostname) {
        Ok(lookup) => lookup,
        Err(e) => {
            debug!("can't submit lookup for {:?}: {}", hostname, e);
            callback(Err(Error::HostnameResolve(e.to_string())));
            return;
        }
    };
    let host = hostname.to_string();
    let mut callback = Some(callback);
    handle.post(move || {
        let result = match lookup.poll() {
            LookupStatus::InProgress => return false,
            LookupStatus::Done(addrs) => {
                let eps = endpoints(addrs);
                debug!("resolved {:?} to {} IPv4 address(es)",
                    host, eps.len());
                Ok(eps)
            }
            LookupStatus::Failed(msg) => {
                debug!("lookup for {:?} failed: {}", host, msg);
                Err(Error::HostnameResolve(msg))
            }
        };
        if let Some(cb) = callback.take() {
            cb(result);
        }
        true
    });
}
