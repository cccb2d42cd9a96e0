//! Protocol pieces that don't depend on the client state machine

pub use self::bodyprogress::BodyProgress;
pub use self::version::Version;

mod bodyprogress;
mod version;
