use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result},
    secrecy::ExposeSecret,
    switchyard_auth::{AdminAccount, bootstrap},
    switchyard_channels::{Adapter, AdapterRegistry, UserInfo},
    switchyard_config::{Severity, SwitchyardConfig, validate},
    switchyard_dispatch::{DispatchSettings, Dispatcher, Pipeline},
    switchyard_metrics::{MetricsRecorderConfig, init_metrics},
    switchyard_store::{Bundle, BundleStore, MemoryStore, load_bundle_file},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use crate::{console::ConsoleAdapter, executor};

/// Installed and enabled on every start, before manifests from `bundles.dir`.
const BUILTIN_BUNDLE: &str = include_str!("../bundles/echo.yml");

/// The console operator signs in as the bootstrapped admin.
const OPERATOR_EMAIL: &str = "admin@localhost";

pub async fn run(config: SwitchyardConfig) -> Result<()> {
    let validation = validate(&config);
    for d in &validation.diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => info!(path = %d.path, "{}", d.message),
        }
    }
    if validation.has_errors() {
        anyhow::bail!("invalid configuration; run `switchyard config check` for details");
    }

    let metrics = init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: config.metrics.labels.clone().into_iter().collect(),
    })?;

    let store = Arc::new(MemoryStore::new());
    let password = bootstrap(store.as_ref(), AdminAccount {
        email: Some(OPERATOR_EMAIL.into()),
        ..Default::default()
    })
    .await?;
    eprintln!("admin password (shown once): {}", password.expose_secret());

    let installed = install_bundles(store.as_ref(), config.bundles.dir.as_deref()).await?;
    info!(bundles = installed, "bundles installed");

    let cancel = CancellationToken::new();
    let console: Arc<dyn Adapter> = Arc::new(ConsoleAdapter::new(operator(), cancel.clone()));
    let registry = AdapterRegistry::new([console])?;
    let dispatcher = Dispatcher::new(registry, store, DispatchSettings::from(&config));

    let Pipeline {
        requests,
        responses,
        mut errors,
        tasks,
    } = dispatcher.start().await;
    let executor = tokio::spawn(executor::run(requests, responses));
    // Errors are logged where they are raised; the host only counts them.
    let observer = tokio::spawn(async move {
        let mut seen = 0usize;
        while errors.recv().await.is_some() {
            seen += 1;
        }
        seen
    });

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            shutdown.cancel();
        }
    });

    tasks.join().await;
    executor.await.context("executor task")?;
    let errors_seen = observer.await.context("error observer task")?;
    info!(errors = errors_seen, "switchyard stopped");
    if config.metrics.report_on_exit
        && let Some(handle) = &metrics
    {
        eprint!("{}", handle.render());
    }
    Ok(())
}

fn operator() -> UserInfo {
    let name = std::env::var("USER")
        .ok()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "operator".into());
    UserInfo {
        id: "operator".into(),
        name,
        email: Some(OPERATOR_EMAIL.into()),
        ..Default::default()
    }
}

/// Install the built-in bundle plus every `*.yml`/`*.yaml` manifest in
/// `dir`, each enabled. Returns the number installed.
async fn install_bundles(store: &dyn BundleStore, dir: Option<&Path>) -> Result<usize> {
    let mut bundles = vec![Bundle::from_yaml(BUILTIN_BUNDLE).context("built-in bundle")?];

    if let Some(dir) = dir {
        let mut paths = std::fs::read_dir(dir)
            .with_context(|| format!("read bundle directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e == "yml" || e == "yaml")
            })
            .collect::<Vec<_>>();
        paths.sort();
        for path in paths {
            bundles.push(load_bundle_file(&path)?);
        }
    }

    let count = bundles.len();
    for mut bundle in bundles {
        bundle.enabled = true;
        info!(bundle = %bundle.name, version = %bundle.version, "installing bundle");
        store.bundle_create(bundle).await?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_bundle_is_enabled() {
        let store = MemoryStore::new();
        assert_eq!(install_bundles(&store, None).await.unwrap(), 1);
        assert_eq!(
            store.bundle_enabled_version("echo").await.unwrap().as_deref(),
            Some("1.0")
        );
        let entries = store.find_command_entry("echo", "audit").await.unwrap();
        assert_eq!(entries[0].command().rules, ["must have switchyard:manage_users"]);
    }

    #[tokio::test]
    async fn installs_manifests_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("deploy.yml"),
            "name: deploy\nversion: \"2\"\ncommands:\n  ship:\n    rules: [\"allow\"]\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "not a manifest").unwrap();

        let store = MemoryStore::new();
        assert_eq!(install_bundles(&store, Some(dir.path())).await.unwrap(), 2);
        assert_eq!(
            store.bundle_enabled_version("deploy").await.unwrap().as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn broken_manifest_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yml"), "name: ''\nversion: '1'\n").unwrap();
        let store = MemoryStore::new();
        assert!(install_bundles(&store, Some(dir.path())).await.is_err());
    }
}
