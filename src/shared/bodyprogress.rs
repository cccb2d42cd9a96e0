use std::cmp::min;

use crate::error::Error;


/// Progress of a fixed-size (`Content-Length`) body read in pieces
///
/// Tracks how many bytes are still expected and enforces the hard cap on
/// body size. Bytes past the declared length are cut off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyProgress {
    expected: u64,
    received: u64,
    limit: u64,
}

impl BodyProgress {
    pub fn new(expected: u64, limit: u64) -> BodyProgress {
        BodyProgress {
            expected: expected,
            received: 0,
            limit: limit,
        }
    }
    pub fn expected(&self) -> u64 {
        self.expected
    }
    pub fn received(&self) -> u64 {
        self.received
    }
    pub fn left(&self) -> u64 {
        self.expected - self.received
    }
    pub fn is_complete(&self) -> bool {
        self.received >= self.expected
    }
    /// Accounts for freshly received bytes
    ///
    /// Returns the part of `data` that belongs to the body. Fails without
    /// accounting anything if the running total would exceed the cap, so
    /// the excess never reaches the consumer.
    pub fn accept<'a>(&mut self, data: &'a [u8]) -> Result<&'a [u8], Error> {
        let take = min(self.left(), data.len() as u64);
        if self.received + take > self.limit {
            return Err(Error::BodyTooLarge(self.limit));
        }
        self.received += take;
        Ok(&data[..take as usize])
    }
}
