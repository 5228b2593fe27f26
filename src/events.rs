//! # Client Events
//!
//! Broadcast channel carrying user-facing notices and the forced re-login
//! signal. The gateway and the liveness monitor publish; whatever hosts the
//! client (a UI shell, the CLI) subscribes and renders. Publishing with no
//! subscribers is a no-op, so a headless embedder pays nothing.

use tokio::sync::broadcast;

/// Default buffer size for the event channel
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A transient, user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Events published by the request gateway and the liveness monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Show a transient notification to the user
    Notice(Notice),
    /// The session was invalidated by a 401; the host should route to login
    SessionExpired,
}

/// Clonable publishing handle over the shared event channel
///
/// # Examples
///
/// ```rust
/// use bigdataops_client::events::{ClientEvent, Notifier};
///
/// let notifier = Notifier::new();
/// let mut events = notifier.subscribe();
///
/// notifier.success("backend connection restored");
/// assert!(matches!(events.try_recv(), Ok(ClientEvent::Notice(_))));
/// ```
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<ClientEvent>,
}

impl Notifier {
    /// Create a notifier with the default channel capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a notifier with the specified channel capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Get a receiver for all published events
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Publish an event
    ///
    /// Send fails only when no receiver is subscribed; events are
    /// fire-and-forget, so that case is ignored.
    pub fn publish(&self, event: ClientEvent) {
        let _ = self.sender.send(event);
    }

    /// Publish a notice at the given level
    pub fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.publish(ClientEvent::Notice(Notice {
            level,
            message: message.into(),
        }));
    }

    /// Publish a success notice
    pub fn success(&self, message: impl Into<String>) {
        self.notice(NoticeLevel::Success, message);
    }

    /// Publish a warning notice
    pub fn warning(&self, message: impl Into<String>) {
        self.notice(NoticeLevel::Warning, message);
    }

    /// Publish an error notice
    pub fn error(&self, message: impl Into<String>) {
        self.notice(NoticeLevel::Error, message);
    }

    /// Publish the forced re-login signal
    pub fn session_expired(&self) {
        self.publish(ClientEvent::SessionExpired);
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
