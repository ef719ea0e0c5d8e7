//! Transient user notifications (the dashboard's toasts).

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }
}

/// Routes notices to the tracing subscriber and to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier {
    pub quiet: bool,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => tracing::info!(target: "notice", "{message}"),
            NoticeLevel::Success => tracing::info!(target: "notice", success = true, "{message}"),
            NoticeLevel::Error => tracing::error!(target: "notice", "{message}"),
        }
        if !self.quiet {
            let marker = match level {
                NoticeLevel::Info => "…",
                NoticeLevel::Success => "✓",
                NoticeLevel::Error => "✗",
            };
            eprintln!("{marker} {message}");
        }
    }
}

/// Keeps every notice in memory; used by tests and batch callers.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut guard) = self.notices.lock() {
            guard.push((level, message.to_string()));
        }
    }
}
