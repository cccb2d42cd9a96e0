use std::time::Duration;


/// Maximum size of the response header block
pub const MAX_HEADER_SIZE: usize = 4096;
/// Hard cap on the response body. Larger bodies are aborted.
pub const MAX_BODY_SIZE: u64 = 1024*1024*1024;
/// Size of a single body read
pub const BUFFER_SIZE: usize = 1024;
/// Wait passed to the multiplexer on each connect poll
pub const CONNECT_WAIT: Duration = Duration::from_millis(500);
/// Wait passed to the multiplexer on each read/write poll
pub const IO_WAIT: Duration = Duration::from_millis(100);
/// Pause between two scheduler passes
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);
pub const USER_AGENT: &str = concat!("pollfetch/", env!("CARGO_PKG_VERSION"));


/// Tuning knobs for the loop, the reactor and the client
///
/// None of these change the protocol. They only bound how much we buffer
/// and how long a single poll may sleep.
#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
    pub connect_wait: Duration,
    pub io_wait: Duration,
    pub max_header_size: usize,
    pub max_body_size: u64,
    pub read_chunk_size: usize,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            poll_interval: POLL_INTERVAL,
            connect_wait: CONNECT_WAIT,
            io_wait: IO_WAIT,
            max_header_size: MAX_HEADER_SIZE,
            max_body_size: MAX_BODY_SIZE,
            read_chunk_size: BUFFER_SIZE,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }
    /// Pause between scheduler passes. Zero only yields the thread.
    pub fn poll_interval(mut self, value: Duration) -> Config {
        self.poll_interval = value;
        self
    }
    pub fn connect_wait(mut self, value: Duration) -> Config {
        self.connect_wait = value;
        self
    }
    pub fn io_wait(mut self, value: Duration) -> Config {
        self.io_wait = value;
        self
    }
    pub fn max_header_size(mut self, value: usize) -> Config {
        self.max_header_size = value;
        self
    }
    pub fn max_body_size(mut self, value: u64) -> Config {
        self.max_body_size = value;
        self
    }
    /// Size of a single read. Zero can't make progress and is raised to 1.
    pub fn read_chunk_size(mut self, value: usize) -> Config {
        self.read_chunk_size = value.max(1);
        self
    }
    pub fn user_agent<S: Into<String>>(mut self, value: S) -> Config {
        self.user_agent = value.into();
        self
    }
}
