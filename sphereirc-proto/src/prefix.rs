//! A module providing an enum for a message prefix.
use std::fmt;
use std::str::FromStr;

/// The Prefix indicates where a message came from.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Prefix {
    /// Anything without a `!`, usually a server name such as `irc.libera.chat`.
    ServerName(String),
    /// nickname "!" username [ "@" hostname ]
    /// i.e. Nickname(nickname, username, hostname)
    /// Any of the strings may be ""
    Nickname(String, String, String),
}

impl Prefix {
    /// Creates a prefix by parsing a string. A leading `:` is ignored.
    ///
    /// # Example
    /// ```
    /// # use sphereirc_proto::Prefix;
    /// assert_eq!(
    ///     Prefix::new_from_str(":alice!a@host"),
    ///     Prefix::Nickname("alice".into(), "a".into(), "host".into())
    /// );
    /// assert_eq!(
    ///     Prefix::new_from_str("irc.example.com"),
    ///     Prefix::ServerName("irc.example.com".into())
    /// );
    /// ```
    pub fn new_from_str(s: &str) -> Prefix {
        let s = s.strip_prefix(':').unwrap_or(s);
        match s.find('!') {
            Some(i) => {
                let (name, rest) = (&s[..i], &s[i + 1..]);
                let (user, host) = match rest.find('@') {
                    Some(j) => (&rest[..j], &rest[j + 1..]),
                    None => (rest, ""),
                };
                Prefix::Nickname(name.to_owned(), user.to_owned(), host.to_owned())
            }
            None => Prefix::ServerName(s.to_owned()),
        }
    }

    /// Gets the server name or the nickname, whichever this prefix carries.
    pub fn name(&self) -> &str {
        match self {
            Prefix::ServerName(name) | Prefix::Nickname(name, _, _) => name,
        }
    }

    /// Gets the sender's nickname if this prefix has the `<nick>!<user>` shape with both sides
    /// present. Server names and half-formed prefixes yield `None`.
    pub fn nickname(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(name, user, host)
                if !name.is_empty() && !(user.is_empty() && host.is_empty()) =>
            {
                Some(name)
            }
            _ => None,
        }
    }
}

/// This implementation never returns an error.
impl FromStr for Prefix {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Prefix::new_from_str(s))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => write!(f, "{}", name),
            Prefix::Nickname(name, user, host) if host.is_empty() => write!(f, "{}!{}", name, user),
            Prefix::Nickname(name, user, host) => write!(f, "{}!{}@{}", name, user, host),
        }
    }
}

impl<'a> From<&'a str> for Prefix {
    fn from(s: &str) -> Self {
        Prefix::new_from_str(s)
    }
}
