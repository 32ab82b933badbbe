//! # remote-build-session
//!
//! Remote session driving for Remote Build.
//!
//! This crate provides:
//! - Transport process spawning on a pseudo-terminal
//! - The session driver with its steady-state read loop
//! - Prompt-synchronised request/response reads
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on remote-build-core
//! and remote-build-view, and feeds remote output into the log pipeline.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod driver;
pub mod prompt;
pub mod transport;

// Re-export commonly used types
pub use driver::{SessionDriver, SessionStatus};
pub use prompt::PROMPT_SENTINEL;
pub use transport::{Transport, TransportCommand};
