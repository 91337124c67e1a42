//! Data related to IRC functionality.

pub use crate::client::data::config::{Config, ServerConfig};
pub use crate::client::data::scrollback::{LogLine, Scrollback};

pub mod config;
pub mod scrollback;
