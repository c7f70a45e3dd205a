#![doc = include_str!("../README.md")]

pub mod context;
pub mod credentials;
pub mod fallback;
pub mod transport;
pub mod wire;

pub use context::ChatContext;
pub use fallback::{reply_or_fallback, Reply, ReplyOrigin};
pub use transport::{ChatTransport, FetchError};
