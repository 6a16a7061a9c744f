use std::sync::Arc;

use {
    switchyard_store::{BundleStore, CommandEntry},
    tracing::debug,
};

use crate::{Error, Result, tokenizer::tokenize};

/// A resolved command plus the arguments it was invoked with.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub entry: CommandEntry,
    pub parameters: Vec<String>,
}

/// Finds exactly one enabled command for a message.
#[derive(Clone)]
pub struct CommandResolver {
    store: Arc<dyn BundleStore>,
}

impl CommandResolver {
    pub fn new(store: Arc<dyn BundleStore>) -> Self {
        Self { store }
    }

    /// Resolve explicit command text (trigger character already stripped).
    ///
    /// The first token names the command; the rest become its parameters.
    pub async fn resolve_command(&self, text: &str) -> Result<Resolution> {
        let mut tokens = tokenize(text);
        let entry = self.resolve_tokens(&tokens).await?;
        tokens.remove(0);
        Ok(Resolution {
            entry,
            parameters: tokens,
        })
    }

    /// Resolve free text against trigger patterns. The whole text is
    /// tokenized into parameters.
    ///
    /// `Ok(None)` when no trigger matches.
    pub async fn resolve_spoken(&self, text: &str) -> Result<Option<Resolution>> {
        Ok(self.resolve_trigger(text).await?.map(|entry| Resolution {
            entry,
            parameters: tokenize(text),
        }))
    }

    /// Look up the command named by the first token, either `bundle:command`
    /// or a bare `command` that must be unique across enabled bundles.
    pub async fn resolve_tokens(&self, tokens: &[String]) -> Result<CommandEntry> {
        let Some(name) = tokens.first() else {
            return Err(Error::no_such_command(""));
        };
        let (bundle, command) = match name.split_once(':') {
            Some((bundle, command)) if !bundle.is_empty() && !command.is_empty() => {
                (bundle, command)
            },
            Some(_) => return Err(Error::no_such_command(name.as_str())),
            None if name.is_empty() => return Err(Error::no_such_command("")),
            None => ("", name.as_str()),
        };

        let entries = self.store.find_command_entry(bundle, command).await?;
        let entry = single(entries)?.ok_or_else(|| Error::no_such_command(name.as_str()))?;
        debug!(command = %entry.qualified_name(), "resolved command by name");
        Ok(entry)
    }

    /// Match raw, untokenized text against every enabled trigger.
    pub async fn resolve_trigger(&self, text: &str) -> Result<Option<CommandEntry>> {
        let entries = self.store.find_command_entry_by_trigger(text).await?;
        let entry = single(entries)?;
        if let Some(entry) = &entry {
            debug!(command = %entry.qualified_name(), "resolved command by trigger");
        }
        Ok(entry)
    }
}

fn single(entries: Vec<CommandEntry>) -> Result<Option<CommandEntry>> {
    let mut entries = entries.into_iter();
    match (entries.next(), entries.next()) {
        (Some(first), Some(second)) => Err(Error::AmbiguousCommand {
            first: first.qualified_name(),
            second: second.qualified_name(),
        }),
        (first, _) => Ok(first),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        switchyard_store::{Bundle, BundleCommand, MemoryStore},
    };

    async fn store_with(bundles: &[(&str, &str, &[&str])]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (name, version, commands) in bundles {
            let bundle = commands.iter().fold(Bundle::new(*name, *version), |b, c| {
                b.with_command(BundleCommand::new(*c).with_rules(["allow"]))
            });
            store.bundle_create(bundle).await.unwrap();
            store.bundle_enable(name, version).await.unwrap();
        }
        store
    }

    fn tokens(text: &str) -> Vec<String> {
        tokenize(text)
    }

    #[tokio::test]
    async fn qualified_name_resolves() {
        let store = store_with(&[("test", "1", &["cmd"])]).await;
        let resolver = CommandResolver::new(store);
        let entry = resolver.resolve_tokens(&tokens("test:cmd a")).await.unwrap();
        assert_eq!(entry.qualified_name(), "test:cmd");
    }

    #[tokio::test]
    async fn bare_name_must_be_unique() {
        let store = store_with(&[("alpha", "1", &["cmd"]), ("beta", "1", &["cmd", "solo"])]).await;
        let resolver = CommandResolver::new(store);

        let err = resolver.resolve_tokens(&tokens("cmd")).await.unwrap_err();
        match err {
            Error::AmbiguousCommand { first, second } => {
                assert_eq!(first, "alpha:cmd");
                assert_eq!(second, "beta:cmd");
            },
            other => panic!("expected ambiguity, got {other:?}"),
        }

        let entry = resolver.resolve_tokens(&tokens("alpha:cmd")).await.unwrap();
        assert_eq!(entry.bundle().name, "alpha");
        let entry = resolver.resolve_tokens(&tokens("solo")).await.unwrap();
        assert_eq!(entry.qualified_name(), "beta:solo");
    }

    #[tokio::test]
    async fn unknown_names_fail_with_the_attempted_token() {
        let store = store_with(&[("test", "1", &["cmd"])]).await;
        let resolver = CommandResolver::new(store);

        for attempt in ["nope", "test:nope", "other:cmd", "test:", ":cmd"] {
            let err = resolver.resolve_tokens(&tokens(attempt)).await.unwrap_err();
            assert!(
                matches!(&err, Error::NoSuchCommand { name } if name == attempt),
                "{attempt}: {err:?}"
            );
        }
        assert!(matches!(
            resolver.resolve_tokens(&[]).await,
            Err(Error::NoSuchCommand { .. })
        ));
    }

    #[tokio::test]
    async fn disabled_versions_are_invisible() {
        let store = store_with(&[("test", "1", &["cmd"])]).await;
        store
            .bundle_create(Bundle::new("test", "2").with_command(BundleCommand::new("newcmd")))
            .await
            .unwrap();
        let resolver = CommandResolver::new(store.clone());
        assert!(resolver.resolve_tokens(&tokens("newcmd")).await.is_err());

        store.bundle_enable("test", "2").await.unwrap();
        assert!(resolver.resolve_tokens(&tokens("cmd")).await.is_err());
        let entry = resolver.resolve_tokens(&tokens("newcmd")).await.unwrap();
        assert_eq!(entry.bundle().version, "2");
    }

    #[tokio::test]
    async fn resolve_command_strips_the_name() {
        let store = store_with(&[("test", "1", &["cmd"])]).await;
        let resolver = CommandResolver::new(store);
        let resolution = resolver
            .resolve_command(r#"test:cmd arg1 "arg 2""#)
            .await
            .unwrap();
        assert_eq!(resolution.parameters, ["arg1", "arg 2"]);
    }

    #[tokio::test]
    async fn resolution_is_deterministic() {
        let store = store_with(&[("a", "1", &["x", "y"]), ("b", "1", &["x"])]).await;
        let resolver = CommandResolver::new(store);
        for input in ["y", "a:x", "b:x"] {
            let first = resolver.resolve_tokens(&tokens(input)).await.unwrap();
            let second = resolver.resolve_tokens(&tokens(input)).await.unwrap();
            assert_eq!(first, second);
        }
        for _ in 0..2 {
            assert!(matches!(
                resolver.resolve_tokens(&tokens("x")).await,
                Err(Error::AmbiguousCommand { .. })
            ));
        }
    }

    #[tokio::test]
    async fn spoken_triggers() {
        let store = Arc::new(MemoryStore::new());
        let mut bundle = Bundle::new("ship", "1").with_command(
            BundleCommand::new("it")
                .with_triggers([r"^ship it\b"])
                .with_rules(["allow"]),
        );
        bundle.enabled = true;
        store.bundle_create(bundle).await.unwrap();
        let resolver = CommandResolver::new(store.clone());

        let resolution = resolver.resolve_spoken("ship it now").await.unwrap().unwrap();
        assert_eq!(resolution.entry.qualified_name(), "ship:it");
        assert_eq!(resolution.parameters, ["ship", "it", "now"]);
        assert!(resolver.resolve_spoken("hello there").await.unwrap().is_none());

        let mut rival = Bundle::new("rival", "1").with_command(
            BundleCommand::new("go").with_triggers(["ship"]),
        );
        rival.enabled = true;
        store.bundle_create(rival).await.unwrap();
        assert!(matches!(
            resolver.resolve_spoken("ship it").await,
            Err(Error::AmbiguousCommand { .. })
        ));
    }
}
