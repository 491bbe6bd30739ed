//! Seams for time and operator notices.
//!
//! The forecaster reads the clock twice: the UTC instant bounds the air-quality
//! window and the sites' local date drives the calendar features. Notices are
//! how the weather client reports failures without returning them.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};

// ==================== Clock Trait ====================

/// Source of "now" for the pipeline.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Today's date in the time zone the sites operate in.
    fn local_date(&self) -> NaiveDate;
}

/// Wall clock; the local date follows the process time zone (`TZ`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_date(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Settable clock with a fixed UTC offset, so tests do not depend on the host zone.
#[derive(Debug, Clone)]
pub struct MockClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
    offset: FixedOffset,
}

impl MockClock {
    /// Clock frozen at `time`, with local dates taken in UTC.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(time)),
            offset: Utc.fix(),
        }
    }

    /// Use `hours` east of UTC for local dates (-5 for Florida in winter).
    pub fn with_offset_hours(mut self, hours: i32) -> Self {
        self.offset = FixedOffset::east_opt(hours * 3600).expect("offset within a day");
        self
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut instant = self.instant.lock().unwrap();
        *instant += duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap()
    }

    fn local_date(&self) -> NaiveDate {
        self.now_utc().with_timezone(&self.offset).date_naive()
    }
}

// ==================== Notifier Trait ====================

/// Severity of a notice shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

/// Trait for abstracting the display layer's notification channel.
///
/// Every failure path in the pipeline reports through this trait so that
/// no failure is silent.
pub trait Notifier: Send + Sync {
    /// Report a notice with the given severity.
    fn notify(&self, level: NoticeLevel, message: &str);

    fn warn(&self, message: &str) {
        self.notify(NoticeLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }
}

/// Notifier that prints to stderr and mirrors the notice into the log.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Warning => tracing::warn!("{}", message),
            NoticeLevel::Error => tracing::error!("{}", message),
        }
        eprintln!("{}: {}", level, message);
    }
}

/// Mock notifier for testing that records all notices.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    notices: Arc<Mutex<Vec<(NoticeLevel, String)>>>,
}

impl MockNotifier {
    /// Create a new mock notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all notices that have been sent.
    pub fn get_notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap().clone()
    }

    /// Get the count of notices sent.
    pub fn notice_count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }

    /// Count notices of a given severity.
    pub fn count_level(&self, level: NoticeLevel) -> usize {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }

    /// Clear all recorded notices.
    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }

    /// Check if any notice was sent.
    pub fn was_called(&self) -> bool {
        !self.notices.lock().unwrap().is_empty()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
