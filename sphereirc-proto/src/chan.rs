//! Channel name helpers.

/// An extension trait giving strings a function to check if they are a channel.
pub trait ChannelExt {
    /// Returns true if the specified name is a channel name.
    fn is_channel_name(&self) -> bool;
}

impl<'a> ChannelExt for &'a str {
    fn is_channel_name(&self) -> bool {
        self.starts_with('#')
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        (&self[..]).is_channel_name()
    }
}

/// Normalizes a configured channel name into its canonical `#`-prefixed form.
///
/// Names shorter than two characters are rejected, everything else gains a leading `#` if it
/// does not already have one.
///
/// # Example
/// ```
/// # use sphereirc_proto::validate_channel;
/// assert_eq!(validate_channel("rust").as_deref(), Some("#rust"));
/// assert_eq!(validate_channel("#rust").as_deref(), Some("#rust"));
/// assert_eq!(validate_channel("x"), None);
/// ```
pub fn validate_channel(name: &str) -> Option<String> {
    if name.chars().count() < 2 {
        return None;
    }
    if name.is_channel_name() {
        Some(name.to_owned())
    } else {
        Some(format!("#{}", name))
    }
}
