use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    error::Context,
    version::BundleVersion,
};

/// A named, versioned collection of commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Permissions this bundle defines; rules refer to them as `bundle:perm`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub commands: BTreeMap<String, BundleCommand>,
}

/// One invocable command within a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleCommand {
    /// Filled from the map key when loaded from a manifest.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Regular expressions matched against raw, untokenized message text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<String>,
    /// Authorization rules, e.g. `allow` or `must have deploy:prod`.
    #[serde(default)]
    pub rules: Vec<String>,
    /// Executable reference handed to the executor; opaque here.
    #[serde(default)]
    pub executable: Vec<String>,
}

impl BundleCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            triggers: Vec::new(),
            rules: Vec::new(),
            executable: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules = rules.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_executable<I, S>(mut self, executable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.executable = executable.into_iter().map(Into::into).collect();
        self
    }
}

impl Bundle {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            enabled: false,
            description: String::new(),
            author: None,
            permissions: Vec::new(),
            commands: BTreeMap::new(),
        }
    }

    /// Add a command, keyed by its name.
    #[must_use]
    pub fn with_command(mut self, command: BundleCommand) -> Self {
        self.commands.insert(command.name.clone(), command);
        self
    }

    /// Parse a YAML bundle manifest.
    ///
    /// ```yaml
    /// name: deploy
    /// version: "1.2"
    /// permissions: [prod]
    /// commands:
    ///   ship:
    ///     description: Deploy a service
    ///     triggers: ["^ship it$"]
    ///     rules: ["must have deploy:prod"]
    ///     executable: ["/bin/ship"]
    /// ```
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let mut bundle: Self = serde_yaml::from_str(raw)?;
        for (key, command) in &mut bundle.commands {
            command.name.clone_from(key);
        }
        bundle.validate()?;
        Ok(bundle)
    }

    /// Structural checks shared by manifest loading and `bundle_create`.
    pub fn validate(&self) -> Result<BundleVersion> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyBundleName);
        }
        if self.name.contains(':') {
            return Err(Error::InvalidBundleName {
                name: self.name.clone(),
            });
        }
        let version = BundleVersion::coerce(&self.version)?;
        for (key, command) in &self.commands {
            if key.trim().is_empty() || command.name.trim().is_empty() {
                return Err(Error::EmptyCommandName {
                    bundle: self.name.clone(),
                });
            }
        }
        Ok(version)
    }
}

/// Read and parse a bundle manifest file.
pub fn load_bundle_file(path: &Path) -> Result<Bundle> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read bundle manifest {}", path.display()))?;
    Bundle::from_yaml(&raw).with_context(|| format!("parse bundle manifest {}", path.display()))
}

/// A resolved (bundle, command) pair.
///
/// Only data-access lookups build these; the fields are read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandEntry {
    bundle: Bundle,
    command: BundleCommand,
}

impl CommandEntry {
    /// Pair a bundle with one of its commands. Intended for data-access
    /// implementations answering `find_command_entry*`.
    #[must_use]
    pub fn new(bundle: Bundle, command: BundleCommand) -> Self {
        Self { bundle, command }
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn command(&self) -> &BundleCommand {
        &self.command
    }

    /// `bundle:command`, as a user would type it.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.bundle.name, self.command.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
name: deploy
version: "1.2"
description: Ship things
permissions: [prod, staging]
commands:
  ship:
    description: Deploy a service
    triggers: ["^ship (\\w+)$"]
    rules: ["must have deploy:prod"]
    executable: ["/bin/ship"]
  status:
    rules: ["allow"]
"#;

    #[test]
    fn parses_manifest_and_names_commands() {
        let bundle = Bundle::from_yaml(MANIFEST).unwrap();
        assert_eq!(bundle.name, "deploy");
        assert_eq!(bundle.version, "1.2");
        assert!(!bundle.enabled);
        assert_eq!(bundle.permissions, vec!["prod", "staging"]);
        let ship = &bundle.commands["ship"];
        assert_eq!(ship.name, "ship");
        assert_eq!(ship.triggers, vec![r"^ship (\w+)$"]);
        assert_eq!(bundle.commands["status"].name, "status");
        assert!(bundle.commands["status"].executable.is_empty());
    }

    #[test]
    fn rejects_bad_version_in_manifest() {
        let err = Bundle::from_yaml("name: x\nversion: banana\n").unwrap_err();
        assert!(matches!(err, Error::InvalidBundleVersion { .. }));
    }

    #[test]
    fn rejects_colon_in_name() {
        let err = Bundle::new("a:b", "1").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidBundleName { .. }));
    }

    #[test]
    fn load_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yml");
        let err = load_bundle_file(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.yml"));

        let path = dir.path().join("deploy.yml");
        std::fs::write(&path, MANIFEST).unwrap();
        assert_eq!(load_bundle_file(&path).unwrap().commands.len(), 2);
    }

    #[test]
    fn entry_qualified_name() {
        let bundle = Bundle::new("test", "1").with_command(BundleCommand::new("cmd"));
        let command = bundle.commands["cmd"].clone();
        let entry = CommandEntry::new(bundle, command);
        assert_eq!(entry.qualified_name(), "test:cmd");
    }
}
