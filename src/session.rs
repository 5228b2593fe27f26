//! # Session Context
//!
//! Explicitly owned session state: the bearer token, the username, and the
//! cached user profile. A [`SessionStore`] handle is injected into the request
//! gateway at construction; the gateway is the only writer on 401, and explicit
//! logout is the only other clearing path. Both clear the three fields
//! together, never partially.
//!
//! The store is purely in-memory by default. With a backing file it persists
//! the session as JSON so a CLI keeps its login across invocations.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Authenticated user state held for the application's lifetime
///
/// A present token implies the user is treated as authenticated everywhere;
/// absence of a session is the sole authority for routing to login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token attached to outbound requests
    pub token: String,
    /// Account name the token was issued for
    pub username: String,
    /// Cached profile payload from the identity endpoint, if fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<Value>,
}

impl Session {
    /// Create a session from login credentials, with no profile cached yet
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            user_info: None,
        }
    }
}

#[derive(Debug)]
struct SessionInner {
    current: RwLock<Option<Session>>,
    backing_file: Option<PathBuf>,
}

/// Cheaply clonable handle to the shared session state
///
/// All clones observe the same session. Lock scope is a single read or write;
/// no lock is held across await points.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("username", &self.username())
            .field("backing_file", &self.inner.backing_file)
            .finish()
    }
}

impl SessionStore {
    /// Create a store with no persistence
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                current: RwLock::new(None),
                backing_file: None,
            }),
        }
    }

    /// Create a store backed by a JSON file, loading any persisted session
    ///
    /// A missing file means no session. An unreadable or corrupt file is
    /// logged and treated the same way rather than failing construction.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Session>(&content) {
                Ok(session) => {
                    debug!(
                        username = %session.username,
                        path = %path.display(),
                        "Restored persisted session"
                    );
                    Some(session)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read session file");
                None
            }
        };

        Self {
            inner: Arc::new(SessionInner {
                current: RwLock::new(current),
                backing_file: Some(path),
            }),
        }
    }

    /// Replace the current session, persisting it when a backing file is set
    pub fn store(&self, session: Session) {
        debug!(username = %session.username, "Storing session");
        *self.inner.current.write() = Some(session);
        self.persist();
    }

    /// Update only the cached user profile; no-op when logged out
    pub fn set_user_info(&self, user_info: Value) {
        {
            let mut guard = self.inner.current.write();
            match guard.as_mut() {
                Some(session) => session.user_info = Some(user_info),
                None => return,
            }
        }
        self.persist();
    }

    /// Erase the session entirely: token, username, and profile together
    ///
    /// Idempotent; clearing an already-empty store (or a store whose backing
    /// file is already gone) succeeds silently.
    pub fn clear(&self) {
        let had_session = self.inner.current.write().take().is_some();
        if had_session {
            debug!("Cleared session");
        }

        if let Some(path) = &self.inner.backing_file {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove session file"),
            }
        }
    }

    /// Current bearer token, if authenticated
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.current.read().as_ref().map(|s| s.token.clone())
    }

    /// Current username, if authenticated
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.inner
            .current
            .read()
            .as_ref()
            .map(|s| s.username.clone())
    }

    /// Full copy of the current session, if any
    #[must_use]
    pub fn snapshot(&self) -> Option<Session> {
        self.inner.current.read().clone()
    }

    /// True when a token is present
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.current.read().is_some()
    }

    /// Write the current session to the backing file, if one is configured
    ///
    /// Persistence failures are logged, not surfaced: the in-memory session is
    /// authoritative for the running process either way.
    fn persist(&self) {
        let Some(path) = &self.inner.backing_file else {
            return;
        };

        let snapshot = self.inner.current.read().clone();
        let Some(session) = snapshot else {
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %path.display(), error = %e, "Failed to create session directory");
                return;
            }
        }

        match serde_json::to_string_pretty(&session) {
            Ok(content) => {
                if let Err(e) = std::fs::write(path, content) {
                    warn!(path = %path.display(), error = %e, "Failed to write session file");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize session"),
        }
    }
}
