use crate::http_url::HttpUrl;


/// Serializes the GET request for `url`
///
/// The request is always the same template: request line, `Host`,
/// `Accept`, `User-Agent` and the empty line. The port is added to `Host`
/// only when it's not the default one.
pub fn build(url: &HttpUrl, user_agent: &str) -> Vec<u8> {
    let host = if url.port == 80 {
        url.host.clone()
    } else {
        format!("{}:{}", url.host, url.port)
    };
    format!("GET {} HTTP/1.1\r\n\
             Host: {}\r\n\
             Accept: text/html\r\n\
             User-Agent: {}\r\n\
             \r\n",
        url.target, host, user_agent).into_bytes()
}
