//! The slice of the IRC protocol spoken by SphereIRC.
//!
//! This crate knows nothing about sockets or connection state. It turns raw bytes into lines
//! ([`LineCodec`]), lines into [`ParsedMessage`]s classified by [`IrcEvent`], and provides the
//! small helpers the client needs on top of that (sender prefixes, CTCP payloads and channel
//! names).

#![warn(missing_docs)]

pub mod chan;
pub mod ctcp;
pub mod error;
pub mod event;
pub mod line;
pub mod message;
pub mod prefix;

pub use self::chan::{validate_channel, ChannelExt};
pub use self::ctcp::Ctcp;
pub use self::event::IrcEvent;
pub use self::line::LineCodec;
pub use self::message::ParsedMessage;
pub use self::prefix::Prefix;
