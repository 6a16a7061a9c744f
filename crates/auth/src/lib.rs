//! Authorization and identity.
//!
//! This crate provides:
//! - `PermissionEvaluator`: effective permissions over the user → group → role graph
//! - `rules`: the boolean gate applied to a command's rule strings
//! - `Provisioner`: mapping provider identities to users, with self-registration
//! - `bootstrap`: one-time creation of the `admin` account
//! - `credentials`: random passwords and argon2 hashes

pub mod bootstrap;
pub mod credentials;
pub mod error;
pub mod evaluator;
pub mod provisioning;
pub mod rules;

pub use {
    bootstrap::{ADMIN_PERMISSIONS, AdminAccount, SYSTEM_BUNDLE, bootstrap, is_bootstrapped},
    credentials::{generate_password, hash_password, verify_password},
    error::{Error, Result},
    evaluator::PermissionEvaluator,
    provisioning::Provisioner,
    rules::{Decision, evaluate_rules},
};
