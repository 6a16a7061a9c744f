//! Semantic validation of a loaded configuration.

use crate::schema::SwitchyardConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "global.command_trigger"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Check a configuration for values the dispatcher cannot run with.
#[must_use]
pub fn validate(config: &SwitchyardConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    let global = &config.global;

    match global.trigger_char() {
        None => result.push(
            Severity::Error,
            "global.command_trigger",
            format!(
                "must be exactly one character, got {:?}",
                global.command_trigger
            ),
        ),
        Some(c) if c.is_whitespace() => result.push(
            Severity::Error,
            "global.command_trigger",
            "must not be whitespace",
        ),
        Some(_) => {},
    }

    if !global.enable_spoken_commands && !global.enable_explicit_commands {
        result.push(
            Severity::Warning,
            "global",
            "both spoken and explicit commands are disabled; no message will ever resolve",
        );
    }

    if global.allow_self_registration {
        result.push(
            Severity::Info,
            "global.allow_self_registration",
            "unknown chat users will get accounts on their first command",
        );
    }

    let buffers = [
        ("dispatch.event_buffer", config.dispatch.event_buffer),
        ("dispatch.request_buffer", config.dispatch.request_buffer),
        ("dispatch.response_buffer", config.dispatch.response_buffer),
        ("dispatch.error_buffer", config.dispatch.error_buffer),
    ];
    for (path, value) in buffers {
        if value == 0 {
            result.push(Severity::Error, path, "channel capacity must be > 0");
        }
    }

    if let Some(dir) = &config.bundles.dir
        && !dir.is_dir()
    {
        result.push(
            Severity::Warning,
            "bundles.dir",
            format!("{} is not a directory", dir.display()),
        );
    }

    result
}
