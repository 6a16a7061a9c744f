//! Turning message text into a single resolved command.
//!
//! [`tokenize`] splits command text into arguments; [`CommandResolver`]
//! looks the command up among enabled bundles, either by name
//! (`bundle:command` or a bare `command`) or by trigger pattern.

pub mod error;
pub mod resolver;
pub mod tokenizer;

pub use {
    error::{Error, Result},
    resolver::{CommandResolver, Resolution},
    tokenizer::tokenize,
};
