//! Per-connection session state.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client information received during initialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Log severity a client may request via `logging/setLevel`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Debug,
    #[default]
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

/// State of one client connection.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    protocol_version: Option<String>,
    client_info: Option<ClientInfo>,
    initialized: bool,
    log_level: LoggingLevel,
    subscriptions: IndexSet<String>,
}

impl Session {
    /// Creates a fresh, uninitialised session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            protocol_version: None,
            client_info: None,
            initialized: false,
            log_level: LoggingLevel::default(),
            subscriptions: IndexSet::new(),
        }
    }

    /// Unique session identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Records the outcome of `initialize`.
    pub fn begin(&mut self, protocol_version: String, client_info: Option<ClientInfo>) {
        self.protocol_version = Some(protocol_version);
        self.client_info = client_info;
    }

    /// Marks the session ready after `notifications/initialized`.
    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Whether `initialize` has been answered.
    #[must_use]
    pub const fn is_negotiated(&self) -> bool {
        self.protocol_version.is_some()
    }

    /// Whether the client confirmed initialisation.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The negotiated protocol version.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Information the client sent about itself.
    #[must_use]
    pub const fn client_info(&self) -> Option<&ClientInfo> {
        self.client_info.as_ref()
    }

    /// Minimum level the client wants log notifications for.
    #[must_use]
    pub const fn log_level(&self) -> LoggingLevel {
        self.log_level
    }

    pub fn set_log_level(&mut self, level: LoggingLevel) {
        self.log_level = level;
    }

    /// Adds a resource subscription. Returns `false` if already subscribed.
    pub fn subscribe(&mut self, uri: impl Into<String>) -> bool {
        self.subscriptions.insert(uri.into())
    }

    /// Removes a resource subscription. Returns `false` if not subscribed.
    pub fn unsubscribe(&mut self, uri: &str) -> bool {
        self.subscriptions.shift_remove(uri)
    }

    #[must_use]
    pub fn is_subscribed(&self, uri: &str) -> bool {
        self.subscriptions.contains(uri)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
