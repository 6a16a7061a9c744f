//! The event dispatch pipeline.
//!
//! A [`Dispatcher`] fans in events from every registered adapter, resolves
//! and authorizes commands, and emits [`CommandRequest`]s for an external
//! executor. Responses sent back on [`Pipeline::responses`] are routed to the
//! channel the command came from. Operator-level failures surface on
//! [`Pipeline::errors`].
//!
//! [`CommandRequest`]: switchyard_store::CommandRequest

pub mod error;
pub mod pipeline;
pub mod settings;
pub mod state;
pub mod templates;

pub use {
    error::{PipelineError, Result},
    pipeline::{Dispatcher, Pipeline, PipelineTasks},
    settings::DispatchSettings,
    state::ConnectionState,
};
