use std::cell::RefCell;
use std::io::Write;
use std::net::TcpListener;
use std::rc::Rc;

use pollfetch::{Error, ErrorKind, HttpClient, Loop, State, Version};

mod common;

use common::{body, config, fetch, init_logging, serve, serve_pieces, url};
use common::wait_close;


#[test]
fn test_body_split_across_reads() {
    init_logging();
    let (port, server) = serve(|mut sock, req| {
        assert!(req.starts_with("GET /some/path?x=1 HTTP/1.1\r\n"), "{}", req);
        assert!(req.contains("\r\nAccept: text/html\r\n"), "{}", req);
        assert!(req.contains("\r\nUser-Agent: "), "{}", req);
        for piece in &[&b"HTTP/1.1 200 OK\r\nContent-Le"[..],
                       &b"ngth: 11\r\nServer: t"[..],
                       &b"est\r\n\r"[..],
                       &b"\nhello"[..],
                       &b" world"[..]]
        {
            sock.write_all(piece).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        wait_close(&mut sock);
    });
    let (client, events) = fetch(url(port, "/some/path?x=1"), &config());
    assert_eq!(client.state(), State::Done);
    let header = client.header().unwrap();
    assert_eq!(header.version, Version::Http11);
    assert_eq!(header.status_code, 200);
    assert_eq!(header.get("Server"), Some("test"));
    assert_eq!(header.content_length(), 11);
    assert_eq!(body(&events), b"hello world");
    assert_eq!(events.borrow().last(), Some(&Ok(Vec::new())));
    let ends = events.borrow().iter()
        .filter(|e| matches!(e, Ok(p) if p.is_empty()))
        .count();
    assert_eq!(ends, 1);
    drop(client);
    server.join().unwrap();
}

#[test]
fn test_large_body_in_many_reads() {
    let data: Vec<u8> = (0..100_000u32).map(|x| (x % 251) as u8).collect();
    let mut head = format!("HTTP/1.0 200 OK\r\ncontent-length: {}\r\n\r\n",
                           data.len()).into_bytes();
    head.extend_from_slice(&data[..500]);
    let (port, server) = serve_pieces(vec![head, data[500..].to_vec()]);
    let (client, events) = fetch(url(port, "/"), &config());
    assert_eq!(client.state(), State::Done);
    assert_eq!(client.header().unwrap().version, Version::Http10);
    assert_eq!(body(&events), data);
    drop(client);
    server.join().unwrap();
}

#[test]
fn test_no_content_length() {
    let (port, server) = serve_pieces(vec![
        b"HTTP/1.1 204 No Content\r\nServer: test\r\n\r\nignored".to_vec(),
    ]);
    let (client, events) = fetch(url(port, "/"), &config());
    assert_eq!(client.state(), State::Done);
    assert!(events.borrow().is_empty());
    assert_eq!(client.header().unwrap().status_code, 204);
    drop(client);
    server.join().unwrap();
}

#[test]
fn test_zero_content_length() {
    let (port, server) = serve_pieces(vec![
        b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n".to_vec(),
    ]);
    let (client, events) = fetch(url(port, "/"), &config());
    assert_eq!(client.state(), State::Done);
    assert!(events.borrow().is_empty());
    assert_eq!(client.header().unwrap().content_length(), 0);
    drop(client);
    server.join().unwrap();
}

#[test]
fn test_header_too_large() {
    let mut head = b"HTTP/1.1 200 OK\r\n".to_vec();
    while head.len() < 5000 {
        head.extend_from_slice(b"X-Padding: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n");
    }
    let (port, server) = serve_pieces(vec![head]);
    let (client, events) = fetch(url(port, "/"), &config());
    assert_eq!(client.state(), State::Failed);
    assert_eq!(*events.borrow(), vec![Err(Error::HeaderTooLarge(4096))]);
    drop(client);
    server.join().unwrap();
}

#[test]
fn test_bad_status_line() {
    let (port, server) = serve_pieces(vec![
        b"GARBAGE 200 OK\r\nContent-Length: 2\r\n\r\nok".to_vec(),
    ]);
    let (client, events) = fetch(url(port, "/"), &config());
    assert_eq!(client.state(), State::Failed);
    assert_eq!(*events.borrow(), vec![Err(Error::HeaderParse)]);
    assert!(client.header().is_none());
    drop(client);
    server.join().unwrap();
}

#[test]
fn test_body_too_large() {
    let mut resp = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n".to_vec();
    resp.extend_from_slice(&[b'x'; 4]);
    let (port, server) = serve_pieces(vec![
        resp, vec![b'y'; 4], vec![b'z'; 4], vec![b'w'; 88],
    ]);
    let (client, events) = fetch(url(port, "/"), &config().max_body_size(10));
    assert_eq!(client.state(), State::Failed);
    assert!(body(&events).len() <= 10);
    assert_eq!(events.borrow().last(), Some(&Err(Error::BodyTooLarge(10))));
    drop(client);
    server.join().unwrap();
}

#[test]
fn test_premature_eof() {
    let (port, server) = serve(|mut sock, _req| {
        sock.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n\
                         0123456789").unwrap();
    });
    let (client, events) = fetch(url(port, "/"), &config());
    assert_eq!(client.state(), State::Failed);
    assert_eq!(body(&events), b"0123456789");
    assert_eq!(events.borrow().last(), Some(&Err(Error::Eof)));
    drop(client);
    server.join().unwrap();
}

#[test]
fn test_connect_only() {
    let lst = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = lst.local_addr().unwrap().port();
    let cfg = config();
    let lp = Loop::new(&cfg);
    let client = HttpClient::new(&lp.handle(), url(port, "/"), &cfg).unwrap();
    let result = Rc::new(RefCell::new(Vec::new()));
    let r = result.clone();
    client.connect(move |res| r.borrow_mut().push(res));
    // Second call is ignored
    client.connect(|_| panic!("second connect callback"));
    lp.run();
    assert_eq!(*result.borrow(), vec![Ok(())]);
    assert_eq!(client.state(), State::Connected);
}

#[test]
fn test_connect_refused() {
    let port = {
        let lst = TcpListener::bind("127.0.0.1:0").unwrap();
        lst.local_addr().unwrap().port()
    };
    let (client, events) = fetch(url(port, "/"), &config());
    assert_eq!(client.state(), State::Failed);
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(ErrorKind::of(&events[0]), ErrorKind::Connect);
}
