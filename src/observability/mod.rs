//! # Observability Infrastructure
//!
//! Structured logging through the `tracing` ecosystem. Secret store calls are
//! additionally wrapped in `secrets_store` spans when `datadog.tracing` is
//! enabled (see [`NamespacedSecretsManager`](crate::secrets::NamespacedSecretsManager)).

pub mod logging;

pub use logging::{env_filter, init_logging, try_init_logging};
