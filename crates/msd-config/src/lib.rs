//! Configuration for multicast service discovery nodes.
//!
//! This crate provides the configuration file model, its HJSON/JSON parsing,
//! and the protocol defaults shared by every node.

mod config;
mod defaults;

pub use config::{ConfigError, HostConfig, NodeConfig};
pub use defaults::{DEFAULT_GROUP_ID, Defaults, MULTICAST_INTERFACE_ENV, get_defaults};
