//! Result Channel Error Types
//!
//! Every failure is local to one key's handoff; nothing here poisons a
//! registry or affects other keys.

use std::time::Duration;

/// Errors surfaced by result channel registration and waiting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// No result was delivered before the deadline
    #[error("no {namespace} result for {key} within {timeout:?}")]
    Timeout {
        /// Namespace the slot lived in
        namespace: &'static str,
        /// Key the waiter was registered on
        key: String,
        /// Wait budget that elapsed
        timeout: Duration,
    },

    /// A live slot already exists for this key
    #[error("{namespace} channel for {key} is already registered")]
    AlreadyRegistered {
        /// Namespace the slot lives in
        namespace: &'static str,
        /// Key with the outstanding waiter
        key: String,
    },

    /// The slot was dropped before a result arrived
    #[error("{namespace} channel for {key} was closed")]
    Closed {
        /// Namespace the slot lived in
        namespace: &'static str,
        /// Key the waiter was registered on
        key: String,
    },
}

/// Result channel result type
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

impl ChannelError {
    /// Create a timeout error
    pub fn timeout(namespace: &'static str, key: impl std::fmt::Debug, timeout: Duration) -> Self {
        Self::Timeout {
            namespace,
            key: format!("{key:?}"),
            timeout,
        }
    }

    /// Create an already-registered error
    pub fn already_registered(namespace: &'static str, key: impl std::fmt::Debug) -> Self {
        Self::AlreadyRegistered {
            namespace,
            key: format!("{key:?}"),
        }
    }

    /// Create a closed-channel error
    pub fn closed(namespace: &'static str, key: impl std::fmt::Debug) -> Self {
        Self::Closed {
            namespace,
            key: format!("{key:?}"),
        }
    }

    /// Whether the wait ran out its deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
