//! Local one-shot HTTP server for driving the client end to end
#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::rc::Rc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pollfetch::{Config, Error, HttpClient, HttpUrl, Loop};


pub type Events = Rc<RefCell<Vec<Result<Vec<u8>, Error>>>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> Config {
    Config::new()
        .poll_interval(Duration::new(0, 0))
        .connect_wait(Duration::from_millis(20))
        .io_wait(Duration::from_millis(10))
}

/// Reads the request head, returns it as text
pub fn read_request(sock: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut byte = [0u8; 1];
    while !data.ends_with(b"\r\n\r\n") {
        match sock.read(&mut byte).unwrap() {
            0 => break,
            _ => data.push(byte[0]),
        }
    }
    String::from_utf8(data).unwrap()
}

/// Waits until the client closes the connection
pub fn wait_close(sock: &mut TcpStream) {
    let mut buf = [0u8; 1024];
    loop {
        match sock.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}

/// Accepts one connection and hands it over with the request text
pub fn serve<F>(handler: F) -> (u16, JoinHandle<()>)
    where F: FnOnce(TcpStream, String) + Send + 'static
{
    let lst = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = lst.local_addr().unwrap().port();
    let thread = thread::spawn(move || {
        let (mut sock, _) = lst.accept().unwrap();
        let req = read_request(&mut sock);
        handler(sock, req);
    });
    (port, thread)
}

/// Serves the given pieces with a pause between them
pub fn serve_pieces(pieces: Vec<Vec<u8>>) -> (u16, JoinHandle<()>) {
    serve(move |mut sock, _req| {
        for piece in pieces {
            sock.write_all(&piece).unwrap();
            sock.flush().unwrap();
            thread::sleep(Duration::from_millis(20));
        }
        wait_close(&mut sock);
    })
}

pub fn url(port: u16, target: &str) -> HttpUrl {
    HttpUrl::parse(&format!("http://127.0.0.1:{}{}", port, target)).unwrap()
}

/// Runs `load_stream` to completion, recording every sink invocation
pub fn fetch(url: HttpUrl, config: &Config) -> (HttpClient, Events) {
    let lp = Loop::new(config);
    let client = HttpClient::new(&lp.handle(), url, config).unwrap();
    let events = Events::default();
    let ev = events.clone();
    client.load_stream(move |res| {
        ev.borrow_mut().push(res.map(|part| part.to_vec()));
    });
    lp.run();
    (client, events)
}

/// Concatenation of all body fragments
pub fn body(events: &Events) -> Vec<u8> {
    let mut result = Vec::new();
    for ev in events.borrow().iter() {
        if let Ok(ref part) = *ev {
            result.extend_from_slice(part);
        }
    }
    result
}
