use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// One transient message at a time; a newer one replaces the older and
/// each disappears `ttl` after it was posted.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    posted: Option<(Notice, Instant)>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, posted: None }
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.post_at(NoticeKind::Success, text, Instant::now());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.post_at(NoticeKind::Error, text, Instant::now());
    }

    pub fn post_at(&mut self, kind: NoticeKind, text: impl Into<String>, at: Instant) {
        let notice = Notice {
            kind,
            text: text.into(),
        };
        self.posted = Some((notice, at));
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<&Notice> {
        match &self.posted {
            Some((notice, at)) if now.saturating_duration_since(*at) < self.ttl => Some(notice),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.posted = None;
    }
}
