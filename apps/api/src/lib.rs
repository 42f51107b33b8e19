//! OmniDash API Library
//!
//! This library provides the real-time sync layer of the OmniDash agent
//! dashboard: the broadcast server and collaborator endpoints, and the
//! client side (state store, reconnecting channel, offline simulation).

pub mod agents;
pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;
