//! User-facing notifications.
//!
//! Every message the tool shows about its own progress goes through a
//! [`Notifier`], so command logic can be exercised in tests with a
//! [`RecordingNotifier`] and asserted on message by message.

use crossterm::style::Stylize;
use std::sync::Mutex;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
    Party,
}

impl Level {
    /// Icon printed in front of the message
    pub fn icon(&self) -> &'static str {
        match self {
            Level::Info => "ℹ️",
            Level::Success => "✅",
            Level::Warning => "⚠️",
            Level::Error => "❌",
            Level::Party => "🎉",
        }
    }
}

/// Sink for severity-tagged user messages.
///
/// `error` only reports; aborting the command is the caller's job (return
/// [`crate::error::Aborted`]).
pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.notify(Level::Info, message);
    }

    fn success(&self, message: &str) {
        self.notify(Level::Success, message);
    }

    fn warning(&self, message: &str) {
        self.notify(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }

    fn party(&self, message: &str) {
        self.notify(Level::Party, message);
    }
}

/// Prints styled messages to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    fn render(level: Level, message: &str) -> String {
        let text = format!("{}  {}", level.icon(), message);
        match level {
            Level::Info => text.blue().to_string(),
            Level::Success => text.green().bold().to_string(),
            Level::Warning => text.yellow().to_string(),
            Level::Error => text.red().bold().to_string(),
            Level::Party => text.magenta().bold().to_string(),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        tracing::debug!(?level, message, "notify");
        let line = Self::render(level, message);
        if level == Level::Error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// Captures notifications in memory instead of printing them
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Level, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded notifications, in emission order
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.lock().unwrap().clone()
    }

    /// Recorded messages of one severity, in emission order
    pub fn at(&self, level: Level) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn count(&self, level: Level) -> usize {
        self.at(level).len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
