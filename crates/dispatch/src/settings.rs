use switchyard_config::SwitchyardConfig;

/// Runtime behaviour of a [`Dispatcher`](crate::Dispatcher), derived from
/// the host configuration.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// `None` disables explicit commands regardless of the flag below.
    pub command_trigger: Option<char>,
    pub enable_explicit_commands: bool,
    pub enable_spoken_commands: bool,
    pub allow_self_registration: bool,
    pub greeting: bool,
    pub event_buffer: usize,
    pub request_buffer: usize,
    pub response_buffer: usize,
    pub error_buffer: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&SwitchyardConfig::default())
    }
}

impl From<&SwitchyardConfig> for DispatchSettings {
    fn from(config: &SwitchyardConfig) -> Self {
        Self {
            command_trigger: config.global.trigger_char(),
            enable_explicit_commands: config.global.enable_explicit_commands,
            enable_spoken_commands: config.global.enable_spoken_commands,
            allow_self_registration: config.global.allow_self_registration,
            greeting: config.global.greeting,
            event_buffer: config.dispatch.event_buffer,
            request_buffer: config.dispatch.request_buffer,
            response_buffer: config.dispatch.response_buffer,
            error_buffer: config.dispatch.error_buffer,
        }
    }
}

/// How a message asks for a command.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Invocation<'a> {
    /// Trigger character stripped; resolve by name.
    Explicit(&'a str),
    /// Whole message; resolve by trigger pattern.
    Spoken(&'a str),
}

impl DispatchSettings {
    /// `None` when the message should be ignored.
    pub(crate) fn classify<'a>(&self, text: &'a str) -> Option<Invocation<'a>> {
        if self.enable_explicit_commands
            && let Some(trigger) = self.command_trigger
            && let Some(rest) = text.trim_start().strip_prefix(trigger)
        {
            return (!rest.trim().is_empty()).then_some(Invocation::Explicit(rest));
        }
        if self.enable_spoken_commands && !text.trim().is_empty() {
            return Some(Invocation::Spoken(text));
        }
        None
    }
}
