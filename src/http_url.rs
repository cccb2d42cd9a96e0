use std::str::FromStr;

use url::Url;


quick_error!{
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum UrlError {
        Parse(err: url::ParseError) {
            from()
            display("bad url: {}", err)
        }
        NoHost {
            display("url has no host")
        }
        NoPort(scheme: String) {
            display("no default port for scheme {:?}", scheme)
        }
    }
}

/// The parts of a URL the client needs to issue a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpUrl {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Path plus query, always starts with `/`
    pub target: String,
}

impl HttpUrl {
    pub fn parse(text: &str) -> Result<HttpUrl, UrlError> {
        let url = Url::parse(text)?;
        let host = url.host_str().ok_or(UrlError::NoHost)?.to_string();
        let port = url.port_or_known_default()
            .ok_or_else(|| UrlError::NoPort(url.scheme().to_string()))?;
        let mut target = url.path().to_string();
        if target.is_empty() {
            target.push('/');
        }
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }
        Ok(HttpUrl {
            scheme: url.scheme().to_string(),
            host: host,
            port: port,
            target: target,
        })
    }
    /// Plain http is the only scheme the client speaks
    pub fn is_http(&self) -> bool {
        self.scheme == "http"
    }
}

impl FromStr for HttpUrl {
    type Err = UrlError;
    fn from_str(s: &str) -> Result<HttpUrl, UrlError> {
        HttpUrl::parse(s)
    }
}
