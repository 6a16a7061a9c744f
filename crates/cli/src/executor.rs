//! Stand-in executor that answers every request by echoing its parameters.

use {
    switchyard_store::{CommandRequest, CommandResponse},
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

/// Drain `requests` until the pipeline closes it.
pub async fn run(
    mut requests: mpsc::Receiver<CommandRequest>,
    responses: mpsc::Sender<CommandResponse>,
) {
    while let Some(request) = requests.recv().await {
        debug!(
            request_id = request.request_id(),
            command = %request.entry.qualified_name(),
            "executing"
        );
        if responses.send(execute(request)).await.is_err() {
            warn!("response channel closed; stopping executor");
            break;
        }
    }
}

fn execute(request: CommandRequest) -> CommandResponse {
    let output = if request.parameters.is_empty() {
        format!("{} (no arguments)", request.entry.qualified_name())
    } else {
        request.parameters.join(" ")
    };
    CommandResponse::success(request, vec![output])
}
