//! SSNTP Test Harness Result Channels
//!
//! A simulated SSNTP agent handles frames on its own tasks; tests need to
//! learn the outcome of a specific frame without sharing anything else with
//! the agent. This crate provides the rendezvous between the two: keyed,
//! single-use, deadline-bounded result channels split into error, event and
//! command namespaces.
//!
//! - [`ResultRegistry`]: one namespace, generic over key and payload
//! - [`ResultChannels`]: the three namespaces a simulated agent exposes
//! - [`ChannelConfig`]: default wait budget, loadable from TOML
//!
//! The registry is an explicit object: build one per harness and clone it into
//! the agent and the tests. There is no process-wide state.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod channels;
pub mod config;
pub mod error;
pub mod frame;
pub mod registry;
pub mod result;

pub use channels::{CmdReceiver, ErrorReceiver, EventReceiver, ResultChannels};
pub use config::ChannelConfig;
pub use error::{ChannelError, ChannelResult};
pub use frame::{Command, ErrorType, EventType};
pub use registry::{Delivery, RegistryKey, ResultReceiver, ResultRegistry};
pub use result::FrameResult;

/// Install a `tracing` subscriber for tests
///
/// Honours `RUST_LOG`; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
