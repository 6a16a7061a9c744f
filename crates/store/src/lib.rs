//! Data model and data-access contract.
//!
//! The dispatch core reads bundles and the RBAC graph through the traits in
//! [`access`]; durable backends implement them outside this workspace.
//! [`MemoryStore`] is the in-process reference implementation used by the
//! host binary and by tests.

pub mod access;
pub mod bundle;
pub mod dynamic;
pub mod error;
pub mod memory;
pub mod rbac;
pub mod request;
pub mod version;

pub use {
    access::{
        BundleStore, DataAccess, DynamicConfigurationStore, GroupStore, RequestStore, RoleStore,
        UserStore,
    },
    bundle::{Bundle, BundleCommand, CommandEntry, load_bundle_file},
    dynamic::{ConfigurationLayer, DynamicConfiguration},
    error::{Error, Result},
    memory::MemoryStore,
    rbac::{ADMIN_GROUP, ADMIN_ROLE, ADMIN_USER, Group, Role, RolePermission, User},
    request::{CommandRequest, CommandResponse, RequestRecord},
    version::BundleVersion,
};
