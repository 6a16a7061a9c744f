//! Chat provider adapter contract.
//!
//! Each provider integration (Slack, Discord, ...) implements [`Adapter`]:
//! it relays [`ProviderEvent`]s from its connection and answers metadata and
//! send calls. Live connections are collected once at startup into an
//! [`AdapterRegistry`] that is read-only afterwards.

pub mod adapter;
pub mod error;
pub mod event;
pub mod info;
pub mod registry;

pub use {
    adapter::{Adapter, EventReceiver, EventSender},
    error::{Error, Result},
    event::{
        AuthenticationErrorEvent, ConnectionEvent, DisconnectEvent, ErrorEvent, EventData,
        MessageEvent, ProviderEvent,
    },
    info::{ChannelInfo, ProviderInfo, UserInfo},
    registry::AdapterRegistry,
};
