//! A small, tick-driven IRC client core with multi-server support.
//!
//! # Example
//!
//! ```no_run
//! use sphereirc::client::prelude::*;
//!
//! # fn main() -> sphereirc::error::Result<()> {
//! let config = Config {
//!     nickname: Some("sphere_bot".to_owned()),
//!     username: Some("sphere".to_owned()),
//!     password: Some("hunter2".to_owned()),
//!     servers: vec![ServerConfig {
//!         hostname: Some("irc.example.com".to_owned()),
//!         channels: vec!["#test".to_owned()],
//!         ..ServerConfig::default()
//!     }],
//!     ..Config::default()
//! };
//!
//! let mut client = Client::from_config(&config)?;
//! client.add_event_handler(ALL_SERVERS, IrcEvent::Privmsg, |_, event| {
//!     println!("{:?} said {}", event.sender, event.payload);
//! }, false)?;
//! client.connect();
//! // No async runtime is needed to drive the client from a plain loop.
//! loop {
//!     client.poll();
//!     std::thread::sleep(std::time::Duration::from_millis(50));
//!     # break;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub use sphereirc_proto as proto;

pub mod client;
pub mod error;

/// The version of this crate, used in the default CTCP VERSION banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
