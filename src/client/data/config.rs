//! Client configuration, optionally loaded from TOML, JSON or YAML using serde.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::prelude::*,
    path::{Path, PathBuf},
};

use crate::error::Error::InvalidConfig;
#[cfg(feature = "toml_config")]
use crate::error::TomlError;
use crate::error::{ConfigError, Result};

/// Configuration for an IRC client and the servers it talks to.
///
/// The top-level identity fields (`nickname`, `username`, `password`, `realname`, the quit and
/// part messages) act as defaults for every entry in `servers`, which may override any of them.
/// Empty strings are treated the same as missing values.
///
/// # Building a configuration programmatically
///
/// ```
/// use sphereirc::client::prelude::{Config, ServerConfig};
///
/// let config = Config {
///     nickname: Some("sphere".to_owned()),
///     username: Some("sphere".to_owned()),
///     password: Some("hunter2".to_owned()),
///     servers: vec![ServerConfig {
///         hostname: Some("irc.example.com".to_owned()),
///         channels: vec!["rust".to_owned()],
///         ..ServerConfig::default()
///     }],
///     ..Config::default()
/// };
/// ```
///
/// # Loading a configuration from a file
///
/// ## TOML (`config.toml`)
/// ```toml
/// nickname = "sphere"
/// username = "sphere"
/// password = "hunter2"
///
/// [[servers]]
/// hostname = "irc.example.com"
/// channels = ["#rust", "sphere"]
/// ```
///
/// ## Rust
/// ```no_run
/// use sphereirc::client::prelude::Config;
///
/// let config = Config::load("config.toml").unwrap();
/// ```
#[derive(Clone, Default, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Config {
    /// The client's nickname.
    #[cfg_attr(feature = "serde", serde(alias = "nick"))]
    pub nickname: Option<String>,
    /// The client's username.
    pub username: Option<String>,
    /// The password sent with `PASS` during registration.
    pub password: Option<String>,
    /// The client's real name.
    #[cfg_attr(feature = "serde", serde(alias = "realName"))]
    pub realname: Option<String>,
    /// The message sent with `QUIT`.
    #[cfg_attr(feature = "serde", serde(alias = "quitMessage"))]
    pub quit_message: Option<String>,
    /// The message sent with `PART`.
    #[cfg_attr(feature = "serde", serde(alias = "partMessage"))]
    pub part_message: Option<String>,
    /// The encoding type used for every connection.
    /// This is typically UTF-8, but could be something else.
    pub encoding: Option<String>,
    /// The text that'll be sent in response to CTCP VERSION requests.
    pub version: Option<String>,
    /// The engine name reported in the default CTCP VERSION reply.
    pub engine: Option<String>,
    /// The number of display lines kept per connection.
    pub scrollback: Option<usize>,
    /// The servers to connect to, in order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub servers: Vec<ServerConfig>,

    /// The path that this configuration was loaded from.
    ///
    /// This should not be specified in any configuration. It will automatically be handled by the library.
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    #[doc(hidden)]
    pub path: Option<PathBuf>,
}

/// Configuration for a single server. Unset fields fall back to the client-wide [`Config`].
#[derive(Clone, Default, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ServerConfig {
    /// The server to connect to.
    pub hostname: Option<String>,
    /// The port to connect on. This defaults to 6667.
    pub port: Option<u16>,
    /// Channels to join once registered. Names without a leading `#` gain one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub channels: Vec<String>,
    /// The nickname to use on this server.
    #[cfg_attr(feature = "serde", serde(alias = "nick"))]
    pub nickname: Option<String>,
    /// The username to use on this server.
    pub username: Option<String>,
    /// The password to use on this server.
    pub password: Option<String>,
    /// The real name to use on this server.
    #[cfg_attr(feature = "serde", serde(alias = "realName"))]
    pub realname: Option<String>,
    /// The quit message to use on this server.
    #[cfg_attr(feature = "serde", serde(alias = "quitMessage"))]
    pub quit_message: Option<String>,
    /// The part message to use on this server.
    #[cfg_attr(feature = "serde", serde(alias = "partMessage"))]
    pub part_message: Option<String>,
}

/// Treats empty strings as unset.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Config {
    fn with_path<P: AsRef<Path>>(mut self, path: P) -> Config {
        self.path = Some(path.as_ref().to_owned());
        self
    }

    fn path(&self) -> String {
        self.path
            .as_ref()
            .map(|buf| buf.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<none>".to_owned())
    }

    pub(crate) fn invalid(&self, cause: ConfigError) -> crate::error::Error {
        InvalidConfig {
            path: self.path(),
            cause,
        }
    }

    /// Loads a configuration from the desired path. This will use the file extension to detect
    /// which format to parse the file as (json, toml, or yaml). Using each format requires having
    /// its respective crate feature enabled. Only toml is available by default.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let mut file = File::open(&path)?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;

        let res = match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("json") => Config::load_json(&path, &data),
            Some("toml") => Config::load_toml(&path, &data),
            Some("yaml") | Some("yml") => Config::load_yaml(&path, &data),
            Some(ext) => Err(InvalidConfig {
                path: path.as_ref().to_string_lossy().into_owned(),
                cause: ConfigError::UnknownConfigFormat {
                    format: ext.to_owned(),
                },
            }),
            None => Err(InvalidConfig {
                path: path.as_ref().to_string_lossy().into_owned(),
                cause: ConfigError::MissingExtension,
            }),
        };

        res.map(|config| config.with_path(path))
    }

    #[cfg(feature = "json_config")]
    fn load_json<P: AsRef<Path>>(path: P, data: &str) -> Result<Config> {
        serde_json::from_str(data).map_err(|e| InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::InvalidJson(e),
        })
    }

    #[cfg(not(feature = "json_config"))]
    fn load_json<P: AsRef<Path>>(path: P, _: &str) -> Result<Config> {
        Err(InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::ConfigFormatDisabled { format: "JSON" },
        })
    }

    #[cfg(feature = "toml_config")]
    fn load_toml<P: AsRef<Path>>(path: P, data: &str) -> Result<Config> {
        toml::from_str(data).map_err(|e| InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::InvalidToml(TomlError::Read(e)),
        })
    }

    #[cfg(not(feature = "toml_config"))]
    fn load_toml<P: AsRef<Path>>(path: P, _: &str) -> Result<Config> {
        Err(InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::ConfigFormatDisabled { format: "TOML" },
        })
    }

    #[cfg(feature = "yaml_config")]
    fn load_yaml<P: AsRef<Path>>(path: P, data: &str) -> Result<Config> {
        serde_yaml::from_str(data).map_err(|e| InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::InvalidYaml(e),
        })
    }

    #[cfg(not(feature = "yaml_config"))]
    fn load_yaml<P: AsRef<Path>>(path: P, _: &str) -> Result<Config> {
        Err(InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::ConfigFormatDisabled { format: "YAML" },
        })
    }

    /// Saves a configuration to the desired path. This will use the file extension to detect
    /// which format to parse the file as (json, toml, or yaml). Using each format requires having
    /// its respective crate feature enabled. Only toml is available by default.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let _ = self.path.take();
        let data = match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("json") => self.save_json(&path)?,
            Some("toml") => self.save_toml(&path)?,
            Some("yaml") | Some("yml") => self.save_yaml(&path)?,
            Some(ext) => {
                return Err(InvalidConfig {
                    path: path.as_ref().to_string_lossy().into_owned(),
                    cause: ConfigError::UnknownConfigFormat {
                        format: ext.to_owned(),
                    },
                })
            }
            None => {
                return Err(InvalidConfig {
                    path: path.as_ref().to_string_lossy().into_owned(),
                    cause: ConfigError::MissingExtension,
                })
            }
        };
        let mut file = File::create(&path)?;
        file.write_all(data.as_bytes())?;
        self.path = Some(path.as_ref().to_owned());
        Ok(())
    }

    #[cfg(feature = "json_config")]
    fn save_json<P: AsRef<Path>>(&self, path: &P) -> Result<String> {
        serde_json::to_string(self).map_err(|e| InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::InvalidJson(e),
        })
    }

    #[cfg(not(feature = "json_config"))]
    fn save_json<P: AsRef<Path>>(&self, path: &P) -> Result<String> {
        Err(InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::ConfigFormatDisabled { format: "JSON" },
        })
    }

    #[cfg(feature = "toml_config")]
    fn save_toml<P: AsRef<Path>>(&self, path: &P) -> Result<String> {
        toml::to_string(self).map_err(|e| InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::InvalidToml(TomlError::Write(e)),
        })
    }

    #[cfg(not(feature = "toml_config"))]
    fn save_toml<P: AsRef<Path>>(&self, path: &P) -> Result<String> {
        Err(InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::ConfigFormatDisabled { format: "TOML" },
        })
    }

    #[cfg(feature = "yaml_config")]
    fn save_yaml<P: AsRef<Path>>(&self, path: &P) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::InvalidYaml(e),
        })
    }

    #[cfg(not(feature = "yaml_config"))]
    fn save_yaml<P: AsRef<Path>>(&self, path: &P) -> Result<String> {
        Err(InvalidConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            cause: ConfigError::ConfigFormatDisabled { format: "YAML" },
        })
    }

    /// Gets the nickname specified in the configuration.
    pub fn nickname(&self) -> Result<&str> {
        non_empty(&self.nickname).ok_or_else(|| self.invalid(ConfigError::NicknameNotSpecified))
    }

    /// Gets the username specified in the configuration.
    pub fn username(&self) -> Result<&str> {
        non_empty(&self.username).ok_or_else(|| self.invalid(ConfigError::UsernameNotSpecified))
    }

    /// Gets the server password specified in the configuration.
    pub fn password(&self) -> Result<&str> {
        non_empty(&self.password).ok_or_else(|| self.invalid(ConfigError::PasswordNotSpecified))
    }

    /// Gets the real name specified in the configuration.
    /// This defaults to an empty string when not specified.
    pub fn real_name(&self) -> &str {
        non_empty(&self.realname).unwrap_or("")
    }

    /// Gets the quit message specified in the configuration.
    /// This defaults to `Quit` when not specified.
    pub fn quit_message(&self) -> &str {
        non_empty(&self.quit_message).unwrap_or("Quit")
    }

    /// Gets the part message specified in the configuration.
    /// This defaults to `Leaving` when not specified.
    pub fn part_message(&self) -> &str {
        non_empty(&self.part_message).unwrap_or("Leaving")
    }

    /// Gets the encoding to use for every connection.
    /// This defaults to UTF-8 when not specified.
    pub fn encoding(&self) -> &str {
        non_empty(&self.encoding).unwrap_or("UTF-8")
    }

    /// Gets the string to be sent in response to CTCP VERSION requests.
    /// This defaults to `SphereIRC <version> / <engine>` when not specified.
    pub fn version(&self) -> String {
        non_empty(&self.version)
            .map(|s| s.to_owned())
            .unwrap_or_else(|| format!("SphereIRC {} / {}", crate::VERSION, self.engine()))
    }

    /// Gets the engine name used in the default CTCP VERSION reply.
    /// This defaults to `Rust` when not specified.
    pub fn engine(&self) -> &str {
        non_empty(&self.engine).unwrap_or("Rust")
    }

    /// Gets the number of display lines kept per connection.
    /// This defaults to 500 when not specified.
    pub fn scrollback(&self) -> usize {
        self.scrollback.unwrap_or(500)
    }

    /// Checks that the identity fields are present and that every server has a hostname.
    pub fn validate(&self) -> Result<()> {
        self.nickname()?;
        self.username()?;
        self.password()?;
        match self.servers.iter().position(|s| s.hostname().is_none()) {
            Some(index) => Err(self.invalid(ConfigError::HostnameNotSpecified { index })),
            None => Ok(()),
        }
    }
}

impl ServerConfig {
    /// Gets the hostname, if one was given.
    pub fn hostname(&self) -> Option<&str> {
        non_empty(&self.hostname)
    }

    /// Gets the port of the server specified in the configuration.
    /// This defaults to 6667 when not specified.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(6667)
    }

    /// Gets the nickname, falling back to the client-wide one.
    pub fn nickname<'a>(&'a self, parent: &'a Config) -> Result<&'a str> {
        non_empty(&self.nickname).map_or_else(|| parent.nickname(), Ok)
    }

    /// Gets the username, falling back to the client-wide one.
    pub fn username<'a>(&'a self, parent: &'a Config) -> Result<&'a str> {
        non_empty(&self.username).map_or_else(|| parent.username(), Ok)
    }

    /// Gets the password, falling back to the client-wide one.
    pub fn password<'a>(&'a self, parent: &'a Config) -> Result<&'a str> {
        non_empty(&self.password).map_or_else(|| parent.password(), Ok)
    }

    /// Gets the real name, falling back to the client-wide one.
    pub fn real_name<'a>(&'a self, parent: &'a Config) -> &'a str {
        non_empty(&self.realname).unwrap_or_else(|| parent.real_name())
    }

    /// Gets the quit message, falling back to the client-wide one.
    pub fn quit_message<'a>(&'a self, parent: &'a Config) -> &'a str {
        non_empty(&self.quit_message).unwrap_or_else(|| parent.quit_message())
    }

    /// Gets the part message, falling back to the client-wide one.
    pub fn part_message<'a>(&'a self, parent: &'a Config) -> &'a str {
        non_empty(&self.part_message).unwrap_or_else(|| parent.part_message())
    }
}
