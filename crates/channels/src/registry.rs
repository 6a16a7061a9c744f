use std::{collections::HashMap, sync::Arc};

use tracing::debug;

#[cfg(feature = "metrics")]
use switchyard_metrics::{channels as ch_metrics, gauge};

use crate::{Error, Result, adapter::Adapter};

/// Name → live connection mapping, fixed at construction.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    /// Build the registry. Fails if two adapters share a name.
    pub fn new(adapters: impl IntoIterator<Item = Arc<dyn Adapter>>) -> Result<Self> {
        let mut map: HashMap<String, Arc<dyn Adapter>> = HashMap::new();
        for adapter in adapters {
            let name = adapter.name().to_string();
            if map.contains_key(&name) {
                return Err(Error::DuplicateAdapter { name });
            }
            debug!(adapter = %name, kind = %adapter.provider_info().kind, "registered adapter");
            map.insert(name, adapter);
        }
        #[cfg(feature = "metrics")]
        gauge!(ch_metrics::ACTIVE).set(map.len() as f64);
        Ok(Self { adapters: map })
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(name).cloned()
    }

    /// Like [`get`](Self::get), but unknown names are an error.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Adapter>> {
        self.get(name).ok_or_else(|| Error::unknown_adapter(name))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Adapter>> {
        self.adapters.values()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::*, async_trait::async_trait};

    struct Named(&'static str);

    #[async_trait]
    impl Adapter for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn provider_info(&self) -> ProviderInfo {
            ProviderInfo::new("test", self.0)
        }

        async fn listen(&self) -> Result<EventReceiver> {
            Err(Error::unavailable("not connected"))
        }

        async fn get_user_info(&self, user_id: &str) -> Result<UserInfo> {
            Err(Error::no_such_user(user_id))
        }

        async fn get_channel_info(&self, channel_id: &str) -> Result<ChannelInfo> {
            Err(Error::no_such_channel(channel_id))
        }

        async fn get_present_channels(&self, _user_id: &str) -> Result<Vec<ChannelInfo>> {
            Ok(Vec::new())
        }

        async fn send_message(&self, _channel_id: &str, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn send_error_message(
            &self,
            _channel_id: &str,
            _title: &str,
            _text: &str,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lookup_by_name() {
        let registry =
            AdapterRegistry::new([Arc::new(Named("b")) as Arc<dyn Adapter>, Arc::new(Named("a"))])
                .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(registry.get("a").is_some());
        assert!(matches!(
            registry.require("zzz"),
            Err(Error::UnknownAdapter { name }) if name == "zzz"
        ));
    }

    #[test]
    fn duplicate_names_rejected() {
        let result =
            AdapterRegistry::new([Arc::new(Named("a")) as Arc<dyn Adapter>, Arc::new(Named("a"))]);
        assert!(matches!(result, Err(Error::DuplicateAdapter { .. })));
    }
}
