//! # remote-build-view
//!
//! Streaming log pipeline for Remote Build.
//!
//! This crate provides:
//! - Line coalescing of raw output fragments with a debounce timer
//! - A FIFO render queue drained by a single render loop
//! - The filter-driven fold-state engine
//! - A bounded log document with head eviction
//! - The display sink interface and an in-memory buffer sink
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on remote-build-core
//! and sits between the session driver and the display.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coalescer;
pub mod deferred;
pub mod document;
pub mod fold;
pub mod queue;
pub mod render;
pub mod sink;

// Re-export commonly used types
pub use coalescer::LineCoalescer;
pub use deferred::DeferredTask;
pub use document::LogDocument;
pub use fold::{FoldEngine, FoldUpdate};
pub use queue::{render_channel, RenderCommand, RenderQueue, RenderReceiver};
pub use render::RenderLoop;
pub use sink::{is_remote_build_scope, BufferSink, DisplaySink, ViewportPosition, REMOTE_BUILD_SCOPE};
