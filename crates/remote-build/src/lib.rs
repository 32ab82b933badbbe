//! # remote-build
//!
//! Remote Build front end.
//!
//! This crate provides:
//! - [`RemoteBuild`], the session-and-pipeline object behind every user action
//! - Command line parsing with per-launch configuration overrides
//! - The console command parser used by the binary
//! - A display sink that prints the visible log to a writer
//!
//! ## Architecture
//!
//! This is Layer 3 - it ties together:
//! - remote-build-core: Errors, configuration, filters and tokens
//! - remote-build-view: Coalescer, render queue and fold state
//! - remote-build-session: Transport and session driver

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod cli;
pub mod console;
pub mod stdout;

// Re-export commonly used types
pub use app::RemoteBuild;
pub use cli::CliArgs;
pub use console::{ConsoleCommand, ConsoleError};
pub use stdout::StdoutSink;
