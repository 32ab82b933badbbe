//! # Remote Build
//!
//! Drives a build on a remote host over an SSH-like transport and follows its
//! output as a filterable, foldable log.
//!
//! ## Overview
//!
//! - Launches the transport, changes into the remote directory and runs the
//!   setup and build commands
//! - Prints the visible part of the log to stdout as it streams in
//! - Reads view actions (`:filter`, `:clear`, `:pid`, ...) and remote input
//!   from stdin
//!
//! Usage: `remote-build [--config <file>] [--override <yaml>]...`
//!
//! ## Architecture
//!
//! The render loop runs on the main thread and owns stdout. Console input is
//! handled on its own thread, and coalescer timers run on a tokio runtime.

use std::io::{self, BufRead};
use std::thread;

use anyhow::Context;
use tokio::runtime::Runtime;

use remote_build::{CliArgs, ConsoleCommand, RemoteBuild, StdoutSink};
use remote_build_view::{DisplaySink, RenderLoop};

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = CliArgs::parse(std::env::args())?;
    let config = args
        .load_config()
        .context("Failed to load configuration")?;

    // Initialize logging; stdout is the display
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    tracing::info!(
        "Remote Build v{} starting for {}",
        env!("CARGO_PKG_VERSION"),
        config.remote.host
    );

    let runtime = Runtime::new().context("Failed to start runtime")?;
    let view_settings = config.view.clone();
    let (mut app, receiver) = RemoteBuild::new(config, runtime.handle().clone())?;
    app.launch()?;

    let sink = StdoutSink::new(io::stdout());
    let scope = sink.scope_at_selection();

    let console = thread::Builder::new()
        .name("remote-build-console".to_string())
        .spawn(move || run_console(app, scope))?;

    let mut render = RenderLoop::new(receiver, sink, &view_settings)?;
    render.run();

    if console.join().is_err() {
        tracing::error!("Console thread panicked");
    }

    tracing::info!("Remote Build shutting down");
    Ok(())
}

fn run_console(mut app: RemoteBuild, scope: Option<String>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read console input: {}", e);
                break;
            }
        };

        let command = match ConsoleCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match command.execute(&mut app, scope.as_deref()) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => eprintln!("{e}"),
        }
    }
    app.close();
}
