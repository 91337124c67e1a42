//! A bounded log of the lines a connection has displayed.
use std::collections::{vec_deque, VecDeque};
use std::fmt;

use chrono::prelude::*;

/// One rendered line, e.g. `alice: hello` in `#chat` or `Topic for #chat: ...`.
#[derive(Clone, Debug, PartialEq)]
pub struct LogLine {
    /// When the line was logged.
    pub time: DateTime<Local>,
    /// The channel (or private conversation partner) the line belongs to, if any.
    pub channel: Option<String>,
    /// The rendered text.
    pub text: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.channel {
            Some(ref channel) => write!(f, "[{}]: {}", channel, self.text),
            None => write!(f, ": {}", self.text),
        }
    }
}

/// A ring buffer of [`LogLine`]s. Once full, the oldest line is dropped for every new one.
#[derive(Clone, Debug)]
pub struct Scrollback {
    lines: VecDeque<LogLine>,
    capacity: usize,
}

impl Scrollback {
    /// Creates an empty scrollback holding at most `capacity` lines.
    pub fn new(capacity: usize) -> Scrollback {
        Scrollback {
            lines: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Appends a line, evicting the oldest one if the buffer is full.
    pub fn push(&mut self, channel: Option<&str>, text: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(LogLine {
            time: Local::now(),
            channel: channel.map(|s| s.to_owned()),
            text,
        });
    }

    /// Iterates over the kept lines, oldest first.
    pub fn iter(&self) -> vec_deque::Iter<LogLine> {
        self.lines.iter()
    }

    /// Iterates over the lines logged for one channel.
    pub fn channel<'a>(&'a self, channel: &'a str) -> impl Iterator<Item = &'a LogLine> + 'a {
        self.lines
            .iter()
            .filter(move |line| line.channel.as_deref() == Some(channel))
    }

    /// Gets the most recent line.
    pub fn last(&self) -> Option<&LogLine> {
        self.lines.back()
    }

    /// Gets the number of kept lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
