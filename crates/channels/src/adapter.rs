use {async_trait::async_trait, tokio::sync::mpsc};

use crate::{
    Result,
    event::ProviderEvent,
    info::{ChannelInfo, ProviderInfo, UserInfo},
};

/// Receiver end of an adapter's event stream. Closes when the connection ends.
pub type EventReceiver = mpsc::Receiver<ProviderEvent>;

/// Sender end of an adapter's event stream.
pub type EventSender = mpsc::Sender<ProviderEvent>;

/// A live connection to one chat provider.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Registered adapter name; unique per process.
    fn name(&self) -> &str;

    /// Provider type and name, stamped on every event.
    fn provider_info(&self) -> ProviderInfo;

    /// Begin relaying provider events.
    async fn listen(&self) -> Result<EventReceiver>;

    async fn get_user_info(&self, user_id: &str) -> Result<UserInfo>;

    async fn get_channel_info(&self, channel_id: &str) -> Result<ChannelInfo>;

    /// Channels the given provider user is a member of.
    async fn get_present_channels(&self, user_id: &str) -> Result<Vec<ChannelInfo>>;

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()>;

    /// Send a message rendered as an error (e.g. a red attachment on Slack).
    async fn send_error_message(&self, channel_id: &str, title: &str, text: &str) -> Result<()>;
}
