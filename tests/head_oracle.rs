//! Cross-checks the response head parser against httparse
use pollfetch::client::parse;

const HEADS: &[&[u8]] = &[
    b"HTTP/1.1 200 OK\r\n\r\n",
    b"HTTP/1.0 404 Not Found\r\nServer: test\r\n\r\n",
    b"HTTP/1.1 301 Moved Permanently\r\n\
      Location: http://example.com/\r\n\
      Content-Length: 0\r\n\r\n",
    b"HTTP/1.1 503 Service Unavailable\r\n\
      Retry-After: 10\r\n\
      Content-Type: text/html; charset=utf-8\r\n\
      Content-Length: 1234\r\n\r\n",
];

#[test]
fn test_agrees_with_httparse() {
    for raw in HEADS {
        let mut headers = [httparse::EMPTY_HEADER; 16];
        let mut expected = httparse::Response::new(&mut headers);
        let status = expected.parse(raw).unwrap();
        assert!(status.is_complete());

        let ours = parse(raw).unwrap();
        assert_eq!(Some(ours.status_code), expected.code);
        assert_eq!(Some(&ours.reason[..]), expected.reason);
        let minor = match ours.version {
            pollfetch::Version::Http10 => 0,
            pollfetch::Version::Http11 => 1,
        };
        assert_eq!(Some(minor), expected.version);
        assert_eq!(ours.fields.len(), expected.headers.len());
        for h in expected.headers.iter() {
            assert_eq!(ours.get(h.name).map(|v| v.as_bytes()), Some(h.value));
        }
    }
}

#[test]
fn test_content_length_matches() {
    let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\n\r\n";
    let mut headers = [httparse::EMPTY_HEADER; 4];
    let mut expected = httparse::Response::new(&mut headers);
    expected.parse(raw).unwrap();
    let value = std::str::from_utf8(expected.headers[0].value).unwrap();
    assert_eq!(parse(raw).unwrap().content_length(),
               value.parse::<u64>().unwrap());
}
