//! Transient user-facing notices
//!
//! Every API operation reports its outcome as a [`Notice`]. Front-ends
//! decide how to show them; the library only hands them to a [`NoticeSink`].

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message meant for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            message: message.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Trait for surfacing notices
pub trait NoticeSink: Send + Sync + std::fmt::Debug {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the tracing log
#[derive(Debug, Default)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!("{}: {}", notice.title, notice.message),
            NoticeLevel::Error => tracing::error!("{}: {}", notice.title, notice.message),
        }
    }
}

/// Keeps the most recent notices in memory
#[derive(Debug)]
pub struct NoticeHistory {
    entries: Mutex<VecDeque<Notice>>,
    max_size: usize,
}

impl NoticeHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(max_size)),
            max_size,
        }
    }

    /// Snapshot of the retained notices, oldest first
    pub fn entries(&self) -> Vec<Notice> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn last(&self) -> Option<Notice> {
        self.entries().pop()
    }
}

impl Default for NoticeHistory {
    fn default() -> Self {
        Self::new(50)
    }
}

impl NoticeSink for NoticeHistory {
    fn notify(&self, notice: Notice) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.max_size == 0 {
            return;
        }
        if entries.len() >= self.max_size {
            entries.pop_front();
        }
        entries.push_back(notice);
    }
}

/// Forwards each notice to several sinks
#[derive(Debug, Default)]
pub struct FanoutNotices {
    sinks: Vec<std::sync::Arc<dyn NoticeSink>>,
}

impl FanoutNotices {
    pub fn new(sinks: Vec<std::sync::Arc<dyn NoticeSink>>) -> Self {
        Self { sinks }
    }
}

impl NoticeSink for FanoutNotices {
    fn notify(&self, notice: Notice) {
        for sink in &self.sinks {
            sink.notify(notice.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn history_respects_max_size() {
        let history = NoticeHistory::new(2);
        for i in 0..5 {
            history.notify(Notice::success(format!("msg{}", i)));
        }
        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "msg3");
        assert_eq!(entries[1].message, "msg4");
    }

    #[test]
    fn history_with_zero_size_keeps_nothing() {
        let history = NoticeHistory::new(0);
        history.notify(Notice::error("dropped"));
        assert!(history.entries().is_empty());
        assert_eq!(history.last(), None);
    }

    #[test]
    fn constructors_set_level_and_title() {
        let ok = Notice::success("Project created successfully");
        assert_eq!(ok.level, NoticeLevel::Success);
        assert_eq!(ok.title, "Success");

        let err = Notice::error("boom");
        assert_eq!(err.level, NoticeLevel::Error);
        assert_eq!(err.title, "Error");
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let a = Arc::new(NoticeHistory::new(5));
        let b = Arc::new(NoticeHistory::new(5));
        let fanout = FanoutNotices::new(vec![a.clone(), b.clone(), Arc::new(LogNotices)]);

        fanout.notify(Notice::success("saved"));

        assert_eq!(a.last(), Some(Notice::success("saved")));
        assert_eq!(b.last(), Some(Notice::success("saved")));
    }
}
