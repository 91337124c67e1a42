//! A module providing a data structure for messages received from IRC servers.
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{MessageParseError, ProtocolError};
use crate::event::IrcEvent;
use crate::prefix::Prefix;

/// One line from the server, split into its source, its event key and its arguments.
///
/// The parser is deliberately simple: the line is split on single spaces, `params` holds every
/// token after the key (including the words of the trailing argument), and `trailing` holds the
/// text after the first ` :` that follows the key.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParsedMessage {
    /// The message prefix, e.g. `nick!user@host` or a server name.
    pub prefix: Option<Prefix>,
    /// The numeric or verb exactly as received.
    pub key: String,
    /// The classified event.
    pub event: IrcEvent,
    /// The space-separated tokens following the key.
    pub params: Vec<String>,
    /// The trailing argument, if any.
    pub trailing: Option<String>,
}

impl ParsedMessage {
    /// Parses a single trimmed line.
    ///
    /// # Example
    /// ```
    /// # use sphereirc_proto::{IrcEvent, ParsedMessage};
    /// let msg = ParsedMessage::parse(":alice!a@host PRIVMSG #chat :hello there").unwrap();
    /// assert_eq!(msg.event, IrcEvent::Privmsg);
    /// assert_eq!(msg.source_nickname(), Some("alice"));
    /// assert_eq!(msg.param(0), Some("#chat"));
    /// assert_eq!(msg.trailing.as_deref(), Some("hello there"));
    /// ```
    pub fn parse(line: &str) -> Result<ParsedMessage, ProtocolError> {
        let invalid = |cause| ProtocolError::InvalidMessage {
            string: line.to_owned(),
            cause,
        };

        if line.trim().is_empty() {
            return Err(invalid(MessageParseError::EmptyMessage));
        }

        let mut tokens = line.split(' ');
        let raw_prefix = if line.starts_with(':') {
            tokens.next()
        } else {
            None
        };

        let key = match tokens.next() {
            Some(key) if !key.is_empty() => key,
            _ => return Err(invalid(MessageParseError::InvalidCommand)),
        };

        let params: Vec<String> = tokens.map(|s| s.to_owned()).collect();

        // The trailing argument starts at the first " :" after the key.
        let skip = raw_prefix.map_or(0, |p| p.len() + 1) + key.len();
        let trailing = line[skip..]
            .find(" :")
            .map(|i| line[skip + i + 2..].to_owned());

        Ok(ParsedMessage {
            prefix: raw_prefix.map(Prefix::new_from_str),
            event: IrcEvent::from_key(key),
            key: key.to_owned(),
            params,
            trailing,
        })
    }

    /// Returns true if the line is a server keep-alive, which is answered before any parsing.
    pub fn is_ping(line: &str) -> bool {
        line.starts_with("PING")
    }

    /// Builds the reply to a keep-alive by swapping the first `PING` for `PONG`.
    ///
    /// # Example
    /// ```
    /// # use sphereirc_proto::ParsedMessage;
    /// assert_eq!(ParsedMessage::pong_for("PING :irc.example.com"), "PONG :irc.example.com");
    /// ```
    pub fn pong_for(line: &str) -> String {
        line.replacen("PING", "PONG", 1)
    }

    /// Gets the nickname of the message source if the prefix has the `nick!user` shape.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref()?.nickname()
    }

    /// Gets a positional parameter following the key.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(|s| &s[..])
    }

    /// Gets the text of the trailing argument, or an empty string.
    pub fn text(&self) -> &str {
        self.trailing.as_deref().unwrap_or("")
    }
}

impl FromStr for ParsedMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<ParsedMessage, Self::Err> {
        ParsedMessage::parse(s)
    }
}

impl Display for ParsedMessage {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.key)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::ParsedMessage;
    use crate::error::{MessageParseError, ProtocolError};
    use crate::event::IrcEvent;
    use crate::prefix::Prefix;

    #[test]
    fn welcome() {
        let msg = ParsedMessage::parse(":server.example 001 mynick :Welcome to IRC").unwrap();
        assert_eq!(msg.prefix, Some(Prefix::ServerName("server.example".into())));
        assert_eq!(msg.event, IrcEvent::Welcome);
        assert_eq!(msg.params, vec!["mynick", ":Welcome", "to", "IRC"]);
        assert_eq!(msg.text(), "Welcome to IRC");
        assert_eq!(msg.source_nickname(), None);
    }

    #[test]
    fn topic_fields() {
        let msg = ParsedMessage::parse(":srv 332 me #rust :Rust: the language").unwrap();
        assert_eq!(msg.event, IrcEvent::Topic);
        assert_eq!(msg.param(1), Some("#rust"));
        assert_eq!(msg.text(), "Rust: the language");
    }

    #[test]
    fn topic_timestamp_fields() {
        let msg = ParsedMessage::parse(":srv 333 me #rust alice 1554854400").unwrap();
        assert_eq!(msg.event, IrcEvent::TopicWhoTime);
        assert_eq!(msg.param(1), Some("#rust"));
        assert_eq!(msg.param(2), Some("alice"));
        assert_eq!(msg.param(3), Some("1554854400"));
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn names_fields() {
        let msg = ParsedMessage::parse(":srv 353 me = #bots :@alice +bob carol").unwrap();
        assert_eq!(msg.event, IrcEvent::NamReply);
        assert_eq!(msg.param(2), Some("#bots"));
        assert_eq!(msg.text(), "@alice +bob carol");
    }

    #[test]
    fn join_without_colon() {
        let msg = ParsedMessage::parse(":me!u@h JOIN #chat").unwrap();
        assert_eq!(msg.event, IrcEvent::Join);
        assert_eq!(msg.param(0), Some("#chat"));
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn no_prefix() {
        let msg = ParsedMessage::parse("NOTICE AUTH :*** Looking up your hostname").unwrap();
        assert_eq!(msg.prefix, None);
        assert_eq!(msg.event, IrcEvent::Notice);
        assert_eq!(msg.param(0), Some("AUTH"));
    }

    #[test]
    fn trailing_after_key_only() {
        // Only the first " :" starts the trailing argument.
        let msg = ParsedMessage::parse(":a!b@c PRIVMSG #x :one :two").unwrap();
        assert_eq!(msg.text(), "one :two");
    }

    #[test]
    fn unknown_key() {
        let msg = ParsedMessage::parse(":srv 433 * me :Nickname is already in use").unwrap();
        assert_eq!(msg.event, IrcEvent::Unknown("433".to_owned()));
        assert_eq!(msg.key, "433");
    }

    #[test]
    fn empty_and_prefix_only() {
        match ParsedMessage::parse("") {
            Err(ProtocolError::InvalidMessage { cause, .. }) => {
                assert_eq!(cause, MessageParseError::EmptyMessage)
            }
            other => panic!("unexpected {:?}", other),
        }
        match ParsedMessage::parse(":lonely.prefix") {
            Err(ProtocolError::InvalidMessage { cause, .. }) => {
                assert_eq!(cause, MessageParseError::InvalidCommand)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn sender_nickname() {
        let msg = ParsedMessage::parse(":alice!a@host MODE #chat +o bob").unwrap();
        assert_eq!(msg.source_nickname(), Some("alice"));
        assert_eq!(msg.prefix.as_ref().map(|p| p.name()), Some("alice"));
        let msg = ParsedMessage::parse(":alice PRIVMSG #chat :hi").unwrap();
        assert_eq!(msg.source_nickname(), None);
        let msg = ParsedMessage::parse(":alice! PRIVMSG #chat :hi").unwrap();
        assert_eq!(msg.source_nickname(), None);
    }

    #[test]
    fn ping() {
        assert!(ParsedMessage::is_ping("PING :server.example"));
        assert!(!ParsedMessage::is_ping(":x PING y"));
        assert_eq!(
            ParsedMessage::pong_for("PING :server.example"),
            "PONG :server.example"
        );
    }

    #[test]
    fn display() {
        let line = ":alice!a@host KICK #chat bob :bye now";
        assert_eq!(ParsedMessage::parse(line).unwrap().to_string(), line);
    }
}
