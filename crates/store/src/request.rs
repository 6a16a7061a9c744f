use serde::Serialize;

use crate::{Error, Result, bundle::CommandEntry};

/// One user-triggered command invocation, handed to the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandRequest {
    pub entry: CommandEntry,
    /// Name of the adapter the message arrived on.
    pub adapter: String,
    pub channel_id: String,
    /// Tokenized arguments, command name excluded.
    pub parameters: Vec<String>,
    /// Provider user ID of the sender.
    pub user_id: String,
    /// Switchyard username of the sender.
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    request_id: i64,
}

impl CommandRequest {
    /// A request with no identifier yet (see [`RequestStore::request_begin`]).
    ///
    /// [`RequestStore::request_begin`]: crate::RequestStore::request_begin
    pub fn new(
        entry: CommandEntry,
        adapter: impl Into<String>,
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        parameters: Vec<String>,
    ) -> Self {
        Self {
            entry,
            adapter: adapter.into(),
            channel_id: channel_id.into(),
            parameters,
            user_id: user_id.into(),
            user_name: user_name.into(),
            user_email: None,
            timestamp: switchyard_common::now_ms(),
            request_id: 0,
        }
    }

    /// Zero until assigned.
    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    /// Assign the identifier. A request is assigned exactly once.
    pub fn assign_id(&mut self, id: i64) -> Result<()> {
        if self.request_id != 0 {
            return Err(Error::RequestAlreadyBegun(self.request_id));
        }
        self.request_id = id;
        Ok(())
    }
}

/// Result of executing a [`CommandRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    pub request: CommandRequest,
    pub status: i16,
    pub output: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn success(request: CommandRequest, output: Vec<String>) -> Self {
        Self {
            request,
            status: 0,
            output,
            title: None,
            error: None,
        }
    }

    pub fn failure(request: CommandRequest, status: i16, error: impl Into<String>) -> Self {
        Self {
            request,
            status,
            output: Vec::new(),
            title: None,
            error: Some(error.into()),
        }
    }

    /// Non-zero status or an error message.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status != 0 || self.error.is_some()
    }
}

/// Audit record kept for every begun request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub request: CommandRequest,
    pub status: Option<i16>,
    pub error: Option<String>,
    pub closed_at: Option<i64>,
}
