//! # remote-build-core
//!
//! Core types for Remote Build.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other remote-build crates. It provides:
//!
//! - Error taxonomy shared by the whole pipeline
//! - Configuration loaded from YAML
//! - The compiled log filter
//! - Fold regions over log rows
//! - Token extraction from semi-structured log lines
//! - Session identifiers
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other remote-build crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod filter;
pub mod region;
pub mod session;
pub mod token;

// Re-export commonly used types
pub use config::{
    LoggingSettings, RemoteBuildConfig, RemoteSettings, TransportSettings, ViewSettings,
};
pub use error::{Error, Result};
pub use filter::LogFilter;
pub use region::FoldRegion;
pub use session::SessionId;
pub use token::{extract_token, LogToken, TokenKind};
