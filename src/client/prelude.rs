//! A client-side IRC prelude, re-exporting the complete high-level client API.
//!
//! # Structure
//! A [`Client`] is created from a [`Config`] that lists the servers to connect to, the identity to
//! register with and the channels to join. Each server gets its own [`ServerConnection`], which
//! owns its socket and the handlers registered for it. Handlers receive an [`Event`] describing
//! what happened, and can answer through the connection they are given.
//!
//! The `proto` types describe the small part of the protocol the client understands: lines are
//! parsed into [`ParsedMessage`]s classified by [`IrcEvent`], senders are read from a [`Prefix`]
//! and CTCP payloads are recognized by [`Ctcp`].

pub use crate::{
    client::{
        conn::{ConnectionState, ServerConnection},
        data::{Config, LogLine, Scrollback, ServerConfig},
        handler::{Event, EventFilter, EventHandler},
        transport::{Connector, Socket, TcpConnector},
        Client, ALL_SERVERS,
    },
    proto::{validate_channel, ChannelExt, Ctcp, IrcEvent, ParsedMessage, Prefix},
};
