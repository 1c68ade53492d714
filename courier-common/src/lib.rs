//! Shared types for the courier notification pipeline
//!
//! This crate holds the pieces every other courier crate needs:
//! - Transport and sender configuration resolved from the environment
//! - The registration record consumed by the content builders
//! - Logging initialization

pub mod config;
pub mod logging;
pub mod registration;

pub use tracing;

pub use config::{
    Credentials, ExecutionMode, ResolvedTransport, SenderIdentity, TransportConfig,
    resolve_transport_config,
};
pub use registration::Registration;
