use std::sync::Arc;

use {
    switchyard_auth::{PermissionEvaluator, Provisioner},
    switchyard_channels::{
        Adapter, AdapterRegistry, EventData, EventReceiver, MessageEvent, ProviderEvent,
    },
    switchyard_commands::{CommandResolver, Resolution},
    switchyard_store::{CommandRequest, CommandResponse, DataAccess},
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use switchyard_metrics::{
    channels as ch_metrics, counter, dispatch as dispatch_metrics, histogram, labels,
};

use crate::{
    error::PipelineError,
    settings::{DispatchSettings, Invocation},
    state::{ConnectionState, ConnectionStates},
    templates,
};

/// An event paired with the connection it came from.
type Routed = (Arc<dyn Adapter>, ProviderEvent);

/// Owns the adapter registry and the collaborators the pipeline consults.
pub struct Dispatcher {
    shared: Arc<Shared>,
}

struct Shared {
    registry: AdapterRegistry,
    store: Arc<dyn DataAccess>,
    resolver: CommandResolver,
    provisioner: Provisioner,
    evaluator: PermissionEvaluator,
    settings: DispatchSettings,
    states: ConnectionStates,
}

/// Channels of a running pipeline.
///
/// Dropping `responses` (and every clone of it) lets the response router
/// finish; the event side finishes once every adapter's stream has closed.
pub struct Pipeline {
    /// Command requests for the executor.
    pub requests: mpsc::Receiver<CommandRequest>,
    /// Where the executor reports results.
    pub responses: mpsc::Sender<CommandResponse>,
    /// Operator-facing failures, already logged when raised. Holds up to
    /// `error_buffer` undrained errors; further ones are dropped, so a host
    /// may also drop this receiver.
    pub errors: mpsc::Receiver<PipelineError>,
    pub tasks: PipelineTasks,
}

/// Background tasks of a running pipeline.
pub struct PipelineTasks {
    handles: Vec<JoinHandle<()>>,
}

impl PipelineTasks {
    /// Wait for every pipeline task to finish.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await
                && e.is_panic()
            {
                error!(error = %e, "pipeline task panicked");
            }
        }
    }

    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl Dispatcher {
    pub fn new(
        registry: AdapterRegistry,
        store: Arc<dyn DataAccess>,
        settings: DispatchSettings,
    ) -> Self {
        let states = ConnectionStates::default();
        for name in registry.names() {
            states.set(name, ConnectionState::Idle);
        }
        let shared = Shared {
            resolver: CommandResolver::new(store.clone()),
            provisioner: Provisioner::new(store.clone(), settings.allow_self_registration),
            evaluator: PermissionEvaluator::new(store.clone()),
            registry,
            store,
            settings,
            states,
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Current state of the named adapter's connection.
    pub fn connection_state(&self, adapter: &str) -> Option<ConnectionState> {
        self.shared.states.get(adapter)
    }

    /// Every adapter's state, sorted by name.
    pub fn connection_states(&self) -> Vec<(String, ConnectionState)> {
        self.shared.states.snapshot()
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.shared.registry
    }

    /// Start listening on every adapter and spawn the pipeline tasks.
    ///
    /// An adapter that fails to listen is reported on the error channel and
    /// left out; the others still run.
    pub async fn start(&self) -> Pipeline {
        let settings = &self.shared.settings;
        let (event_tx, event_rx) = mpsc::channel::<Routed>(settings.event_buffer.max(1));
        let (request_tx, request_rx) = mpsc::channel(settings.request_buffer.max(1));
        let (response_tx, response_rx) = mpsc::channel(settings.response_buffer.max(1));
        let (error_tx, error_rx) = mpsc::channel(settings.error_buffer.max(1));
        let errors = ErrorSink(error_tx);

        let mut handles = Vec::new();
        for adapter in self.shared.registry.iter() {
            let name = adapter.name().to_string();
            match adapter.listen().await {
                Ok(events) => {
                    info!(adapter = %name, "listening");
                    self.shared.states.set(&name, ConnectionState::Listening);
                    handles.push(tokio::spawn(forward_events(
                        Arc::clone(adapter),
                        events,
                        event_tx.clone(),
                        self.shared.states.clone(),
                    )));
                },
                Err(source) => {
                    self.shared.states.set(&name, ConnectionState::Errored);
                    errors.push(PipelineError::Listen {
                        adapter: name,
                        source,
                    });
                },
            }
        }
        drop(event_tx);

        let events = EventLoop {
            shared: Arc::clone(&self.shared),
            requests: request_tx,
            errors: errors.clone(),
        };
        handles.push(tokio::spawn(events.run(event_rx)));

        let responses = ResponseRouter {
            shared: Arc::clone(&self.shared),
            errors,
        };
        handles.push(tokio::spawn(responses.run(response_rx)));

        Pipeline {
            requests: request_rx,
            responses: response_tx,
            errors: error_rx,
            tasks: PipelineTasks { handles },
        }
    }
}

/// Relay one connection's events into the merged stream, in order.
async fn forward_events(
    adapter: Arc<dyn Adapter>,
    mut events: EventReceiver,
    merged: mpsc::Sender<Routed>,
    states: ConnectionStates,
) {
    let name = adapter.name().to_string();
    while let Some(event) = events.recv().await {
        states.observe(&name, &event.data);
        if merged.send((Arc::clone(&adapter), event)).await.is_err() {
            debug!(adapter = %name, "merged stream closed");
            break;
        }
    }
    states.set(&name, ConnectionState::Closed);
    info!(adapter = %name, "event stream closed");
}

#[derive(Clone)]
struct ErrorSink(mpsc::Sender<PipelineError>);

impl ErrorSink {
    fn push(&self, err: PipelineError) {
        match &err {
            PipelineError::Authentication { .. }
            | PipelineError::UnknownAdapter { .. }
            | PipelineError::NotBootstrapped { .. }
            | PipelineError::Store { .. }
            | PipelineError::Internal { .. } => {
                error!(kind = err.kind(), error = %err, "pipeline error");
            },
            _ => warn!(kind = err.kind(), error = %err, "pipeline error"),
        }
        #[cfg(feature = "metrics")]
        counter!(dispatch_metrics::PIPELINE_ERRORS_TOTAL, labels::REASON => err.kind()).increment(1);
        if let Err(mpsc::error::TrySendError::Full(err)) = self.0.try_send(err) {
            debug!(kind = err.kind(), "error channel full; dropped");
        }
    }
}

// ── Event side ──────────────────────────────────────────────────────────────

struct EventLoop {
    shared: Arc<Shared>,
    requests: mpsc::Sender<CommandRequest>,
    errors: ErrorSink,
}

impl EventLoop {
    async fn run(self, mut events: mpsc::Receiver<Routed>) {
        while let Some((adapter, event)) = events.recv().await {
            #[cfg(feature = "metrics")]
            counter!(dispatch_metrics::EVENTS_RECEIVED_TOTAL, labels::ADAPTER => adapter.name().to_string())
                .increment(1);
            self.handle(adapter, event).await;
        }
        debug!("all event streams closed");
    }

    async fn handle(&self, adapter: Arc<dyn Adapter>, event: ProviderEvent) {
        let name = adapter.name().to_string();
        match event.data {
            EventData::Connected(connected) => {
                info!(adapter = %name, bot = %connected.bot_user_id, "connected");
                if self.shared.settings.greeting {
                    self.greet(adapter.as_ref(), &connected.bot_user_id).await;
                }
            },
            EventData::Disconnected(disconnected) => {
                info!(adapter = %name, message = %disconnected.message, "disconnected");
            },
            EventData::ChannelMessage(message) | EventData::DirectMessage(message) => {
                self.handle_message(adapter.as_ref(), message).await;
            },
            EventData::AuthenticationError(failure) => {
                self.errors.push(PipelineError::Authentication {
                    adapter: name,
                    message: failure.message,
                });
            },
            EventData::Error(failure) => {
                self.errors.push(PipelineError::Adapter {
                    adapter: name,
                    message: failure.message,
                });
            },
            other => {
                self.errors.push(PipelineError::Adapter {
                    adapter: name,
                    message: format!("unhandled event kind {}", other.kind()),
                });
            },
        }
    }

    /// Announce the bot in each channel it is present in. Best effort.
    async fn greet(&self, adapter: &dyn Adapter, bot_user_id: &str) {
        let bot = match adapter.get_user_info(bot_user_id).await {
            Ok(bot) => bot,
            Err(source) => {
                self.errors.push(PipelineError::adapter_call(
                    adapter.name(),
                    "look up bot user",
                    source,
                ));
                return;
            },
        };
        let channels = match adapter.get_present_channels(bot_user_id).await {
            Ok(channels) => channels,
            Err(source) => {
                self.errors.push(PipelineError::adapter_call(
                    adapter.name(),
                    "list present channels",
                    source,
                ));
                return;
            },
        };
        let settings = &self.shared.settings;
        let trigger = settings
            .command_trigger
            .filter(|_| settings.enable_explicit_commands);
        let example = match trigger {
            Some(_) => self.example_command().await,
            None => None,
        };
        let text = templates::greeting(bot.preferred_name(), trigger, example.as_deref());
        for channel in channels {
            if let Err(source) = adapter.send_message(&channel.id, &text).await {
                self.errors
                    .push(PipelineError::send(adapter.name(), channel.id, source));
            }
        }
    }

    /// First enabled command, by bundle then command name.
    async fn example_command(&self) -> Option<String> {
        match self.shared.store.find_command_entry("", "").await {
            Ok(entries) => entries.first().map(|e| e.qualified_name()),
            Err(e) => {
                debug!(error = %e, "no example command for greeting");
                None
            },
        }
    }

    async fn handle_message(&self, adapter: &dyn Adapter, message: MessageEvent) {
        let Some(invocation) = self.shared.settings.classify(&message.text) else {
            debug!(adapter = adapter.name(), channel = %message.channel_id, "ignoring message");
            return;
        };

        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let resolved = match invocation {
            Invocation::Explicit(text) => {
                self.shared.resolver.resolve_command(text).await.map(Some)
            },
            Invocation::Spoken(text) => self.shared.resolver.resolve_spoken(text).await,
        };
        let resolution = match resolved {
            Ok(Some(resolution)) => resolution,
            Ok(None) => {
                debug!(
                    adapter = adapter.name(),
                    channel = %message.channel_id,
                    "no trigger matched"
                );
                return;
            },
            Err(e) if e.is_user_facing() => {
                warn!(
                    adapter = adapter.name(),
                    channel = %message.channel_id,
                    error = %e,
                    "command resolution failed"
                );
                #[cfg(feature = "metrics")]
                counter!(dispatch_metrics::RESOLUTION_FAILURES_TOTAL, labels::ADAPTER => adapter.name().to_string())
                    .increment(1);
                self.reply_failure(adapter, &message, &e.to_string()).await;
                return;
            },
            Err(e) => {
                self.errors.push(PipelineError::Internal {
                    context: "resolve command".into(),
                    message: e.to_string(),
                });
                self.reply_failure(adapter, &message, &e.to_string()).await;
                return;
            },
        };
        #[cfg(feature = "metrics")]
        counter!(
            dispatch_metrics::COMMANDS_RESOLVED_TOTAL,
            labels::ADAPTER => adapter.name().to_string(),
            labels::BUNDLE => resolution.entry.bundle().name.clone()
        )
        .increment(1);

        let Some(request) = self.plan(adapter, &message, resolution).await else {
            return;
        };

        #[cfg(feature = "metrics")]
        histogram!(dispatch_metrics::RESOLUTION_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        self.emit(adapter, request).await;
    }

    /// Identify and authorize the sender, then record the request.
    async fn plan(
        &self,
        adapter: &dyn Adapter,
        message: &MessageEvent,
        resolution: Resolution,
    ) -> Option<CommandRequest> {
        let identity = match adapter.get_user_info(&message.user_id).await {
            Ok(identity) => identity,
            Err(source) => {
                let text = source.to_string();
                self.errors.push(PipelineError::adapter_call(
                    adapter.name(),
                    "look up sender",
                    source,
                ));
                self.reply_failure(adapter, message, &text).await;
                return None;
            },
        };

        let user = match self
            .shared
            .provisioner
            .resolve_or_create_user(adapter.name(), &identity)
            .await
        {
            Ok((user, _created)) => user,
            Err(e) => {
                self.report_auth_failure(adapter, message, e).await;
                return None;
            },
        };

        if let Err(e) = self
            .shared
            .evaluator
            .authorize(&user.username, &resolution.entry)
            .await
        {
            self.report_auth_failure(adapter, message, e).await;
            return None;
        }

        let mut request = CommandRequest::new(
            resolution.entry,
            adapter.name(),
            message.channel_id.as_str(),
            message.user_id.as_str(),
            user.username,
            resolution.parameters,
        );
        request.user_email = user.email;
        if let Err(source) = self.shared.store.request_begin(&mut request).await {
            let text = source.to_string();
            self.errors.push(PipelineError::store("begin request", source));
            self.reply_failure(adapter, message, &text).await;
            return None;
        }
        Some(request)
    }

    async fn emit(&self, adapter: &dyn Adapter, request: CommandRequest) {
        let request_id = request.request_id();
        info!(
            adapter = adapter.name(),
            channel = %request.channel_id,
            request_id,
            command = %request.entry.qualified_name(),
            user = %request.user_name,
            "emitting command request"
        );
        if self.requests.send(request).await.is_err() {
            self.errors
                .push(PipelineError::RequestChannelClosed { request_id });
            return;
        }
        #[cfg(feature = "metrics")]
        counter!(dispatch_metrics::REQUESTS_EMITTED_TOTAL, labels::ADAPTER => adapter.name().to_string())
            .increment(1);
    }

    async fn report_auth_failure(
        &self,
        adapter: &dyn Adapter,
        message: &MessageEvent,
        err: switchyard_auth::Error,
    ) {
        let text = err.to_string();
        match err {
            switchyard_auth::Error::NotBootstrapped => {
                self.errors.push(PipelineError::NotBootstrapped {
                    adapter: adapter.name().to_string(),
                    user_id: message.user_id.clone(),
                });
            },
            switchyard_auth::Error::SelfRegistrationOff
            | switchyard_auth::Error::Unauthorized { .. } => {
                warn!(
                    adapter = adapter.name(),
                    user = %message.user_id,
                    error = %text,
                    "command refused"
                );
                #[cfg(feature = "metrics")]
                counter!(dispatch_metrics::AUTHORIZATION_DENIED_TOTAL, labels::ADAPTER => adapter.name().to_string())
                    .increment(1);
            },
            other => {
                self.errors
                    .push(PipelineError::from_auth("authorize sender", other));
            },
        }
        self.reply_failure(adapter, message, &text).await;
    }

    async fn reply_failure(&self, adapter: &dyn Adapter, message: &MessageEvent, error: &str) {
        let text = templates::planning_failure(message.text.trim(), error);
        if let Err(source) = adapter
            .send_error_message(&message.channel_id, templates::ERROR_TITLE, &text)
            .await
        {
            self.errors.push(PipelineError::send(
                adapter.name(),
                message.channel_id.as_str(),
                source,
            ));
        }
    }
}

// ── Response side ───────────────────────────────────────────────────────────

struct ResponseRouter {
    shared: Arc<Shared>,
    errors: ErrorSink,
}

impl ResponseRouter {
    async fn run(self, mut responses: mpsc::Receiver<CommandResponse>) {
        while let Some(response) = responses.recv().await {
            self.route(response).await;
        }
        debug!("response channel closed");
    }

    async fn route(&self, response: CommandResponse) {
        let request = &response.request;
        let request_id = request.request_id();
        let Some(adapter) = self.shared.registry.get(&request.adapter) else {
            self.errors.push(PipelineError::UnknownAdapter {
                adapter: request.adapter.clone(),
                request_id,
            });
            self.close(request_id, &response, Some("unknown adapter")).await;
            return;
        };

        let sent = if response.is_error() {
            let title = response.title.as_deref().unwrap_or(templates::ERROR_TITLE);
            adapter
                .send_error_message(
                    &request.channel_id,
                    title,
                    &templates::execution_failure(&response),
                )
                .await
        } else if response.output.is_empty() {
            debug!(adapter = adapter.name(), request_id, "empty output, nothing to send");
            Ok(())
        } else {
            adapter
                .send_message(&request.channel_id, &templates::command_output(&response))
                .await
        };

        match sent {
            Ok(()) => {
                debug!(adapter = adapter.name(), request_id, "response routed");
                #[cfg(feature = "metrics")]
                {
                    counter!(dispatch_metrics::RESPONSES_ROUTED_TOTAL, labels::ADAPTER => adapter.name().to_string())
                        .increment(1);
                    counter!(ch_metrics::MESSAGES_SENT_TOTAL, labels::ADAPTER => adapter.name().to_string())
                        .increment(1);
                }
            },
            Err(source) => {
                self.errors.push(PipelineError::send(
                    adapter.name(),
                    request.channel_id.as_str(),
                    source,
                ));
            },
        }
        self.close(request_id, &response, None).await;
    }

    async fn close(&self, request_id: i64, response: &CommandResponse, fallback: Option<&str>) {
        let error = response.error.as_deref().or(fallback);
        if let Err(source) = self
            .shared
            .store
            .request_close(request_id, response.status, error)
            .await
        {
            self.errors.push(PipelineError::store(
                format!("close request {request_id}"),
                source,
            ));
        }
    }
}
