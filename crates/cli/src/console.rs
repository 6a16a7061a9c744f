//! Terminal adapter: stdin lines become messages, replies go to stdout.

use {
    async_trait::async_trait,
    switchyard_channels::{
        Adapter, ChannelInfo, Error, EventReceiver, ProviderEvent, ProviderInfo, Result, UserInfo,
    },
    tokio::{
        io::{AsyncBufReadExt, BufReader},
        sync::mpsc,
    },
    tokio_util::sync::CancellationToken,
    tracing::debug,
};

pub const ADAPTER_NAME: &str = "console";
pub const CHANNEL_ID: &str = "console";
const BOT_USER_ID: &str = "switchyard";
const EVENT_BUFFER: usize = 32;

pub struct ConsoleAdapter {
    operator: UserInfo,
    cancel: CancellationToken,
}

impl ConsoleAdapter {
    /// Every line read from stdin is attributed to `operator`. Reading stops
    /// when `cancel` fires or stdin closes.
    pub fn new(operator: UserInfo, cancel: CancellationToken) -> Self {
        Self { operator, cancel }
    }

    fn bot(&self) -> UserInfo {
        UserInfo {
            id: BOT_USER_ID.into(),
            name: BOT_USER_ID.into(),
            display_name: Some("Switchyard".into()),
            ..Default::default()
        }
    }

    fn channel(&self) -> ChannelInfo {
        ChannelInfo {
            id: CHANNEL_ID.into(),
            name: CHANNEL_ID.into(),
            members: vec![self.operator.id.clone(), BOT_USER_ID.into()],
        }
    }
}

#[async_trait]
impl Adapter for ConsoleAdapter {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("console", ADAPTER_NAME)
    }

    async fn listen(&self) -> Result<EventReceiver> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let provider = self.provider_info();
        let user_id = self.operator.id.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            if tx
                .send(ProviderEvent::connected(provider.clone(), BOT_USER_ID))
                .await
                .is_err()
            {
                return;
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.next_line() => line,
                };
                let event = match line {
                    Ok(Some(text)) if text.trim().is_empty() => continue,
                    Ok(Some(text)) => {
                        ProviderEvent::direct_message(provider.clone(), CHANNEL_ID, &user_id, text)
                    },
                    Ok(None) => {
                        let _ = tx
                            .send(ProviderEvent::disconnected(provider, "end of input"))
                            .await;
                        break;
                    },
                    Err(e) => {
                        let _ = tx
                            .send(ProviderEvent::error(provider, format!("read stdin: {e}")))
                            .await;
                        break;
                    },
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            debug!("console reader stopped");
        });

        Ok(rx)
    }

    async fn get_user_info(&self, user_id: &str) -> Result<UserInfo> {
        if user_id == BOT_USER_ID {
            Ok(self.bot())
        } else if user_id == self.operator.id {
            Ok(self.operator.clone())
        } else {
            Err(Error::no_such_user(user_id))
        }
    }

    async fn get_channel_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        if channel_id == CHANNEL_ID {
            Ok(self.channel())
        } else {
            Err(Error::no_such_channel(channel_id))
        }
    }

    async fn get_present_channels(&self, _user_id: &str) -> Result<Vec<ChannelInfo>> {
        Ok(vec![self.channel()])
    }

    async fn send_message(&self, _channel_id: &str, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }

    async fn send_error_message(&self, _channel_id: &str, title: &str, text: &str) -> Result<()> {
        println!("[{title}]\n{text}");
        Ok(())
    }
}
