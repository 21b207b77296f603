use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

pub(crate) const ALERT_AUTO_HIDE: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the toast shows right now. `sequence` counts notices shown so far,
/// so two identical messages in a row are still distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AlertState {
    pub(crate) open: bool,
    pub(crate) message: String,
    pub(crate) severity: Severity,
    pub(crate) sequence: u64,
}

impl AlertState {
    fn closed(sequence: u64) -> Self {
        Self { open: false, message: String::new(), severity: Severity::Info, sequence }
    }
}

#[derive(Debug, Clone)]
struct Notice {
    message: String,
    severity: Severity,
    shown_at: Instant,
}

/// Single-slot notification. A new notice replaces the current one; a notice
/// hides itself once `auto_hide` has elapsed.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
    current: Option<Notice>,
    auto_hide: Duration,
    sequence: u64,
}

impl Notifier {
    pub(crate) fn show(&mut self, severity: Severity, message: impl Into<String>) {
        self.sequence += 1;
        self.current = Some(Notice { message: message.into(), severity, shown_at: Instant::now() });
    }

    pub(crate) fn dismiss(&mut self) {
        self.current = None;
    }

    pub(crate) fn state(&self) -> AlertState {
        match &self.current {
            Some(notice) if notice.shown_at.elapsed() < self.auto_hide => AlertState {
                open: true,
                message: notice.message.clone(),
                severity: notice.severity,
                sequence: self.sequence,
            },
            _ => AlertState::closed(self.sequence),
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self { current: None, auto_hide: ALERT_AUTO_HIDE, sequence: 0 }
    }
}
