//! Notification Sink
//!
//! One transient message per operation outcome. Notices share a key per
//! (resource, operation) so "Saving..." is replaced by "Saved" or the
//! failure instead of stacking up.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Load,
    Create,
    Update,
    Remove,
    Login,
    Register,
    VerifyEmail,
    RequestReset,
    ResetPassword,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Load => "load",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Remove => "remove",
            Operation::Login => "login",
            Operation::Register => "register",
            Operation::VerifyEmail => "verify-email",
            Operation::RequestReset => "request-password-reset",
            Operation::ResetPassword => "reset-password",
        }
    }
}

/// Identifies the operation a notice belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoticeKey {
    pub resource: String,
    pub operation: Operation,
}

impl NoticeKey {
    pub fn new(resource: &str, operation: Operation) -> Self {
        Self {
            resource: resource.to_string(),
            operation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub key: NoticeKey,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn loading(key: NoticeKey, message: impl Into<String>) -> Self {
        Self { key, level: NoticeLevel::Loading, message: message.into() }
    }

    pub fn success(key: NoticeKey, message: impl Into<String>) -> Self {
        Self { key, level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(key: NoticeKey, message: impl Into<String>) -> Self {
        Self { key, level: NoticeLevel::Error, message: message.into() }
    }
}

/// Where operation outcomes are reported
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Withdraw the notice for `key` without a replacement
    fn dismiss(&self, _key: &NoticeKey) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub notice: Notice,
    pub shown_at: Instant,
}

#[derive(Default)]
struct Board {
    toasts: Vec<Toast>,
    history: Vec<Notice>,
}

/// In-memory toast list with replace-by-key and auto-dismiss
pub struct ToastBoard {
    ttl: Duration,
    board: Mutex<Board>,
}

impl ToastBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            board: Mutex::new(Board::default()),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.toast_duration())
    }

    fn lock(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Post a notice as of `now`, replacing any toast with the same key
    pub fn post_at(&self, notice: Notice, now: Instant) {
        let mut board = self.lock();
        board.history.push(notice.clone());
        board.toasts.retain(|t| t.notice.key != notice.key);
        board.toasts.push(Toast { notice, shown_at: now });
    }

    /// Toasts still on screen at `now`; expired ones are dropped
    pub fn active_at(&self, now: Instant) -> Vec<Toast> {
        let ttl = self.ttl;
        let mut board = self.lock();
        board
            .toasts
            .retain(|t| now.saturating_duration_since(t.shown_at) < ttl);
        board.toasts.clone()
    }

    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Instant::now())
    }

    /// Every notice ever posted, oldest first
    pub fn history(&self) -> Vec<Notice> {
        self.lock().history.clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.lock().history.iter().filter(|n| n.level == level).count()
    }
}

impl NotificationSink for ToastBoard {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => log::warn!("[{}:{}] {}", notice.key.resource, notice.key.operation.as_str(), notice.message),
            _ => log::info!("[{}:{}] {}", notice.key.resource, notice.key.operation.as_str(), notice.message),
        }
        self.post_at(notice, Instant::now());
    }

    fn dismiss(&self, key: &NoticeKey) {
        self.lock().toasts.retain(|t| &t.notice.key != key);
    }
}
