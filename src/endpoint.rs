use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;


/// Resolved IPv4 address
///
/// Keeps both the numeric text it was built from and the binary form,
/// they always denote the same address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    text: String,
    addr: Ipv4Addr,
}

/// An `Endpoint` with a port, one per connection attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TcpEndpoint {
    endpoint: Endpoint,
    port: u16,
}

impl Endpoint {
    pub fn new(addr: Ipv4Addr) -> Endpoint {
        Endpoint {
            text: addr.to_string(),
            addr: addr,
        }
    }
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for Endpoint {
    type Err = std::net::AddrParseError;
    fn from_str(s: &str) -> Result<Endpoint, Self::Err> {
        s.parse().map(Endpoint::new)
    }
}

impl From<Ipv4Addr> for Endpoint {
    fn from(addr: Ipv4Addr) -> Endpoint {
        Endpoint::new(addr)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TcpEndpoint {
    pub fn new(endpoint: Endpoint, port: u16) -> TcpEndpoint {
        TcpEndpoint {
            endpoint: endpoint,
            port: port,
        }
    }
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.endpoint.addr, self.port))
    }
}

impl fmt::Display for TcpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.endpoint, self.port)
    }
}
