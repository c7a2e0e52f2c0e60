//! # Error Handling
//!
//! Error types for servicekit, built with `thiserror`.

pub mod types;

pub use types::{Error, ErrorKind, Result};
