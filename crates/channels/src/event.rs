use serde::Serialize;

use crate::info::ProviderInfo;

/// One event relayed by an adapter connection.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderEvent {
    /// The connection that produced the event.
    pub provider: ProviderInfo,
    #[serde(flatten)]
    pub data: EventData,
}

/// Event payload, tagged by kind.
///
/// New kinds may be added; matches outside this crate need a fallback arm.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
#[non_exhaustive]
pub enum EventData {
    Connected(ConnectionEvent),
    Disconnected(DisconnectEvent),
    ChannelMessage(MessageEvent),
    DirectMessage(MessageEvent),
    AuthenticationError(AuthenticationErrorEvent),
    Error(ErrorEvent),
}

impl EventData {
    /// Short kind name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Disconnected(_) => "disconnected",
            Self::ChannelMessage(_) => "channel_message",
            Self::DirectMessage(_) => "direct_message",
            Self::AuthenticationError(_) => "authentication_error",
            Self::Error(_) => "error",
        }
    }
}

/// The connection is established. Carries the bot's own provider user ID.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionEvent {
    pub bot_user_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisconnectEvent {
    pub message: String,
}

/// A message posted in a channel or sent directly to the bot.
#[derive(Debug, Clone, Serialize)]
pub struct MessageEvent {
    pub channel_id: String,
    /// Provider user ID of the sender.
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationErrorEvent {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub message: String,
}

impl ProviderEvent {
    pub fn connected(provider: ProviderInfo, bot_user_id: impl Into<String>) -> Self {
        Self {
            provider,
            data: EventData::Connected(ConnectionEvent {
                bot_user_id: bot_user_id.into(),
                message: "connected".into(),
            }),
        }
    }

    pub fn disconnected(provider: ProviderInfo, message: impl Into<String>) -> Self {
        Self {
            provider,
            data: EventData::Disconnected(DisconnectEvent {
                message: message.into(),
            }),
        }
    }

    pub fn channel_message(
        provider: ProviderInfo,
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            data: EventData::ChannelMessage(MessageEvent {
                channel_id: channel_id.into(),
                user_id: user_id.into(),
                text: text.into(),
            }),
        }
    }

    pub fn direct_message(
        provider: ProviderInfo,
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            data: EventData::DirectMessage(MessageEvent {
                channel_id: channel_id.into(),
                user_id: user_id.into(),
                text: text.into(),
            }),
        }
    }

    pub fn authentication_error(provider: ProviderInfo, message: impl Into<String>) -> Self {
        Self {
            provider,
            data: EventData::AuthenticationError(AuthenticationErrorEvent {
                message: message.into(),
            }),
        }
    }

    pub fn error(provider: ProviderInfo, message: impl Into<String>) -> Self {
        Self {
            provider,
            data: EventData::Error(ErrorEvent {
                message: message.into(),
            }),
        }
    }
}
