//! Per-adapter connection state.

use std::{fmt, sync::Arc};

use {dashmap::DashMap, serde::Serialize, switchyard_channels::EventData};

/// `Idle → Listening → (Connected | AuthFailed | Errored) → Listening* → Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Registered, not yet listening.
    Idle,
    /// Event stream open, no connection confirmed (or reconnecting).
    Listening,
    Connected,
    AuthFailed,
    Errored,
    /// The adapter's event stream ended.
    Closed,
}

impl ConnectionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Connected => "connected",
            Self::AuthFailed => "auth_failed",
            Self::Errored => "errored",
            Self::Closed => "closed",
        }
    }

    /// State after observing `event`.
    #[must_use]
    pub fn after(self, event: &EventData) -> Self {
        match event {
            EventData::Connected(_) => Self::Connected,
            EventData::Disconnected(_) => Self::Listening,
            EventData::AuthenticationError(_) => Self::AuthFailed,
            EventData::Error(_) => Self::Errored,
            _ => self,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared map of adapter name → state.
#[derive(Clone, Default)]
pub(crate) struct ConnectionStates {
    inner: Arc<DashMap<String, ConnectionState>>,
}

impl ConnectionStates {
    pub(crate) fn set(&self, adapter: &str, state: ConnectionState) {
        self.inner.insert(adapter.to_string(), state);
    }

    pub(crate) fn get(&self, adapter: &str) -> Option<ConnectionState> {
        self.inner.get(adapter).map(|s| *s)
    }

    pub(crate) fn observe(&self, adapter: &str, event: &EventData) {
        let mut state = self
            .inner
            .entry(adapter.to_string())
            .or_insert(ConnectionState::Listening);
        *state = state.after(event);
    }

    pub(crate) fn snapshot(&self) -> Vec<(String, ConnectionState)> {
        let mut states: Vec<_> = self
            .inner
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }
}
