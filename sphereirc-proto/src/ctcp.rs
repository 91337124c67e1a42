//! Detection of the CTCP payloads the client reacts to.
//!
//! CTCP messages ride inside `PRIVMSG` and `NOTICE` bodies, delimited by `\x01`. Only `ACTION`
//! (rendered as an emote) and `VERSION` (answered automatically) are understood.

const DELIM: char = '\u{001}';
const ACTION: &str = "\u{001}ACTION ";
const VERSION: &str = "\u{001}VERSION\u{001}";

/// A recognized CTCP payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ctcp<'a> {
    /// `\x01ACTION <text>\x01`, carrying the action text.
    Action(&'a str),
    /// A bare `\x01VERSION\x01` request.
    Version,
}

impl<'a> Ctcp<'a> {
    /// Looks for a CTCP payload in a message body.
    ///
    /// # Example
    /// ```
    /// # use sphereirc_proto::Ctcp;
    /// assert_eq!(Ctcp::parse("\u{001}ACTION waves\u{001}"), Some(Ctcp::Action("waves")));
    /// assert_eq!(Ctcp::parse("\u{001}VERSION\u{001}"), Some(Ctcp::Version));
    /// assert_eq!(Ctcp::parse("hello"), None);
    /// ```
    pub fn parse(body: &'a str) -> Option<Ctcp<'a>> {
        if body == VERSION {
            return Some(Ctcp::Version);
        }
        let start = body.find(ACTION)? + ACTION.len();
        let end = body.rfind(DELIM)?;
        if end <= start {
            return None;
        }
        Some(Ctcp::Action(&body[start..end]))
    }

    /// Wraps a CTCP body in its delimiters.
    pub fn quote(body: &str) -> String {
        format!("{}{}{}", DELIM, body, DELIM)
    }
}
