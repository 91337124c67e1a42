//! Per-connection event handler registry.
use std::fmt;
use std::sync::Arc;

use crate::client::conn::ServerConnection;
use crate::proto::{IrcEvent, ParsedMessage};

/// The signature of an event handler.
pub type HandlerFn = dyn Fn(&mut ServerConnection, &Event) + Send + Sync;

/// Which events a handler is interested in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventFilter {
    /// Every dispatched event.
    Any,
    /// Only events of one kind.
    Only(IrcEvent),
}

impl EventFilter {
    /// Returns true if an event of the given kind passes this filter.
    pub fn matches(&self, kind: &IrcEvent) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Only(event) => event == kind,
        }
    }
}

impl From<IrcEvent> for EventFilter {
    fn from(event: IrcEvent) -> EventFilter {
        EventFilter::Only(event)
    }
}

/// What a handler is told about a dispatched event.
#[derive(Clone, Copy, Debug)]
pub struct Event<'a> {
    /// The kind of event.
    pub kind: &'a IrcEvent,
    /// The nickname of the sender, if the prefix had the `nick!user` shape.
    pub sender: Option<&'a str>,
    /// The channel the event concerns, if any.
    pub channel: Option<&'a str>,
    /// The interesting text of the event: the message body, the topic, the kicked nick...
    pub payload: &'a str,
    /// The full parsed line.
    pub message: &'a ParsedMessage,
}

/// A registered handler.
#[derive(Clone)]
pub struct EventHandler {
    filter: EventFilter,
    callback: Arc<HandlerFn>,
    override_default: bool,
}

impl EventHandler {
    /// Creates a handler from a filter and a callback.
    pub fn new<F>(filter: EventFilter, callback: F, override_default: bool) -> EventHandler
    where
        F: Fn(&mut ServerConnection, &Event) + Send + Sync + 'static,
    {
        EventHandler {
            filter,
            callback: Arc::new(callback),
            override_default,
        }
    }

    /// Gets the filter this handler was registered with.
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Gets the override flag. It is recorded for hosts to inspect; built-in handling always
    /// runs regardless.
    pub fn override_default(&self) -> bool {
        self.override_default
    }

    /// Invokes the callback.
    pub fn call(&self, conn: &mut ServerConnection, event: &Event) {
        (self.callback)(conn, event)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("filter", &self.filter)
            .field("override_default", &self.override_default)
            .finish()
    }
}

/// The ordered list of handlers owned by one connection.
#[derive(Clone, Debug, Default)]
pub struct HandlerRegistry {
    handlers: Vec<EventHandler>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> HandlerRegistry {
        HandlerRegistry::default()
    }

    /// Appends a handler. Handlers run in the order they were added.
    pub fn push(&mut self, handler: EventHandler) {
        self.handlers.push(handler);
    }

    /// Gets the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Snapshots the handlers matching `kind`, in registration order. Handlers are cheap to
    /// clone, and taking a snapshot lets them borrow the connection mutably while running.
    pub fn matching(&self, kind: &IrcEvent) -> Vec<EventHandler> {
        self.handlers
            .iter()
            .filter(|h| h.filter.matches(kind))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::{EventFilter, EventHandler, HandlerRegistry};
    use crate::proto::IrcEvent;

    fn handler(filter: EventFilter) -> EventHandler {
        EventHandler::new(filter, |_, _| {}, false)
    }

    #[test]
    fn filters() {
        assert!(EventFilter::Any.matches(&IrcEvent::Join));
        assert!(EventFilter::from(IrcEvent::Join).matches(&IrcEvent::Join));
        assert!(!EventFilter::from(IrcEvent::Join).matches(&IrcEvent::Part));
        assert!(EventFilter::from(IrcEvent::Unknown("WALLOPS".into()))
            .matches(&IrcEvent::Unknown("WALLOPS".into())));
    }

    #[test]
    fn matching_keeps_order() {
        let mut registry = HandlerRegistry::new();
        registry.push(handler(IrcEvent::Privmsg.into()));
        registry.push(handler(EventFilter::Any));
        registry.push(handler(IrcEvent::Notice.into()));
        registry.push(EventHandler::new(IrcEvent::Privmsg.into(), |_, _| {}, true));

        let matching = registry.matching(&IrcEvent::Privmsg);
        assert_eq!(matching.len(), 3);
        assert_eq!(matching[0].filter(), &EventFilter::Only(IrcEvent::Privmsg));
        assert_eq!(matching[1].filter(), &EventFilter::Any);
        assert!(matching[2].override_default());
        assert_eq!(registry.len(), 4);
    }
}
