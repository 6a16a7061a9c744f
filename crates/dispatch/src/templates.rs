//! User-facing message text.

use switchyard_store::CommandResponse;

/// Title used for error messages without a more specific one.
pub const ERROR_TITLE: &str = "Error";

/// Reply for a message whose command could not be planned: resolution,
/// provisioning or authorization failed.
#[must_use]
pub fn planning_failure(command: &str, error: &str) -> String {
    format!(
        "The pipeline failed planning the invocation:\n```\n{command}\n```\nThe specific error was:\n```\n{error}\n```"
    )
}

/// Reply for a command that ran and failed.
#[must_use]
pub fn execution_failure(response: &CommandResponse) -> String {
    let request = &response.request;
    let mut invocation = request.entry.qualified_name();
    for parameter in &request.parameters {
        invocation.push(' ');
        invocation.push_str(parameter);
    }
    let error = match (&response.error, response.output.is_empty()) {
        (Some(error), _) => error.clone(),
        (None, false) => response.output.join("\n"),
        (None, true) => format!("exit status {}", response.status),
    };
    format!(
        "The pipeline failed executing the command:\n```\n{invocation}\n```\nThe specific error was:\n```\n{error}\n```"
    )
}

/// Successful output, one line per output entry.
#[must_use]
pub fn command_output(response: &CommandResponse) -> String {
    response.output.join("\n")
}

/// Announcement sent to each channel on connect. `trigger` is `None` when
/// explicit commands are off; `example` names an installed command.
#[must_use]
pub fn greeting(bot_name: &str, trigger: Option<char>, example: Option<&str>) -> String {
    match (trigger, example) {
        (Some(t), Some(example)) => {
            format!("{bot_name} is online. Commands start with `{t}`, e.g. `{t}{example}`.")
        },
        (Some(t), None) => format!("{bot_name} is online. Commands start with `{t}`."),
        (None, _) => format!("{bot_name} is online."),
    }
}
