//! Fire-and-forget user notifications.
//!
//! Mutations and request failures push notices into an unbounded channel;
//! whatever frontend sits on top drains them into its toast/status UI.
//! If the receiver is gone, notices are silently discarded.

use tokio::sync::mpsc;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Success,
  Error,
}

/// A single user-visible message.
#[derive(Debug, Clone)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

/// Cloneable sending half of the notification channel.
#[derive(Clone)]
pub struct Notifier {
  tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
  /// Create a notifier together with the receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  /// A notifier with no listener. Notices are dropped.
  pub fn disconnected() -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();
    Self { tx }
  }

  pub fn success(&self, message: impl Into<String>) {
    self.send(NoticeLevel::Success, message.into());
  }

  pub fn error(&self, message: impl Into<String>) {
    self.send(NoticeLevel::Error, message.into());
  }

  fn send(&self, level: NoticeLevel, message: String) {
    tracing::debug!(?level, %message, "notice");
    // Ignore send errors - receiver may have been dropped
    let _ = self.tx.send(Notice { level, message });
  }
}
