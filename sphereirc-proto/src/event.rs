//! Enumeration of the server replies and commands the client understands.
use std::fmt;
use std::str::FromStr;

macro_rules! make_event {
    ($($(#[$attr:meta])+ $variant:ident = $value:literal),+ $(,)?) => {
        /// The kind of an incoming IRC line, keyed by its numeric or verb.
        ///
        /// Numerics have the form `:<server> ### <client> ...`, verbs the form
        /// `:<nick>!<user>@<host> VERB ...`. See <https://defs.ircdocs.horse/defs/numerics.html>
        /// and RFC 1459. Anything else is kept as `Unknown` with its original key.
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub enum IrcEvent {
            $($(#[$attr])+ $variant,)+
            /// An unimplemented or unknown numeric or verb.
            Unknown(String),
        }

        impl IrcEvent {
            /// Classifies the given numeric or verb.
            pub fn from_key(key: &str) -> IrcEvent {
                match key {
                    $($value => IrcEvent::$variant,)+
                    other => IrcEvent::Unknown(other.to_owned()),
                }
            }

            /// Gets the numeric or verb as it appears on the wire.
            pub fn key(&self) -> &str {
                match self {
                    $(IrcEvent::$variant => $value,)+
                    IrcEvent::Unknown(key) => key,
                }
            }
        }
    }
}

make_event! {
    /// `001 <client> :Welcome to the network <nick>`
    Welcome = "001",
    /// `002 <client> :Your host is <host>, running version <version>`
    YourHost = "002",
    /// `003 <client> :This server was created <date>`
    Created = "003",
    /// `004 <client> <host> <version> <usermodes> <channelmodes>`
    MyInfo = "004",
    /// `005 <client> <tokens...> :are supported by this server`
    Bounce = "005",
    /// `042 <client> <id> :your unique ID`
    YourId = "042",
    /// `251 <client> :There are # users and # invisible on # servers`
    LuserClient = "251",
    /// `252 <client> # :operator(s) online`
    LuserOp = "252",
    /// `253 <client> # :unknown connection(s)`
    LuserUnknown = "253",
    /// `254 <client> # :channels formed`
    LuserChannels = "254",
    /// `255 <client> :I have # clients and # servers`
    LuserMe = "255",
    /// `265 <client> :Current Local Users: #  Max: #`
    LocalUsers = "265",
    /// `266 <client> :Current Global Users: #  Max: #`
    GlobalUsers = "266",
    /// `332 <client> <channel> :<topic>`
    Topic = "332",
    /// `333 <client> <channel> <setter> <timestamp>`
    TopicWhoTime = "333",
    /// `353 <client> <symbol> <channel> :<names...>`
    NamReply = "353",
    /// `366 <client> <channel> :End of /NAMES list.`
    EndOfNames = "366",
    /// `372 <client> :- <motd line>`
    Motd = "372",
    /// `375 <client> :- <host> Message of the day -`
    MotdStart = "375",
    /// `376 <client> :End of message of the day.`
    EndOfMotd = "376",
    /// `396 <client> <hostname> :is now your displayed host`
    DisplayedHost = "396",
    /// `:<nick>!<user>@<host> JOIN :<channel>`
    Join = "JOIN",
    /// `:<kicker>!<user>@<host> KICK <channel> <kicked> :<reason>`
    Kick = "KICK",
    /// `:<nick>!<user>@<host> MODE <target> <modes> <params...>`
    Mode = "MODE",
    /// `:<nick>!<user>@<host> NOTICE <target> :<text>`. Notices must never be answered
    /// automatically.
    Notice = "NOTICE",
    /// `:<nick>!<user>@<host> PRIVMSG <target> :<text>`, to a channel or to us.
    Privmsg = "PRIVMSG",
    /// `:<nick>!<user>@<host> PART <channel> :<message>`
    Part = "PART",
}

impl IrcEvent {
    /// Returns true for the welcome, LUSERS and MOTD boundary numerics after which the client
    /// is considered registered and may join its channels.
    pub fn is_registration_boundary(&self) -> bool {
        matches!(
            self,
            IrcEvent::Welcome
                | IrcEvent::YourHost
                | IrcEvent::Created
                | IrcEvent::MyInfo
                | IrcEvent::Bounce
                | IrcEvent::LuserClient
                | IrcEvent::LuserOp
                | IrcEvent::LuserUnknown
                | IrcEvent::LuserChannels
                | IrcEvent::LuserMe
                | IrcEvent::MotdStart
                | IrcEvent::EndOfMotd
        )
    }

    /// Returns true for replies the client receives but takes no action on.
    pub fn is_inert(&self) -> bool {
        matches!(
            self,
            IrcEvent::YourId
                | IrcEvent::LocalUsers
                | IrcEvent::GlobalUsers
                | IrcEvent::EndOfNames
                | IrcEvent::DisplayedHost
        )
    }

    /// Returns true if this is a three-digit numeric reply.
    pub fn is_numeric(&self) -> bool {
        let key = self.key();
        key.len() == 3 && key.bytes().all(|b| b.is_ascii_digit())
    }
}

impl FromStr for IrcEvent {
    type Err = ();

    fn from_str(s: &str) -> Result<IrcEvent, Self::Err> {
        Ok(IrcEvent::from_key(s))
    }
}

impl fmt::Display for IrcEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}
