//! The session-and-pipeline object.
//!
//! One [`RemoteBuild`] owns the configuration, the producer side of the log
//! pipeline and at most one remote session. Every user-facing action goes
//! through it; the render loop consuming its queue runs elsewhere.

use tokio::runtime::Handle;
use tracing::{info, warn};

use remote_build_core::{
    extract_token, Error, LogFilter, RemoteBuildConfig, Result, SessionId, TokenKind,
};
use remote_build_session::{SessionDriver, SessionStatus, TransportCommand};
use remote_build_view::{
    is_remote_build_scope, render_channel, LineCoalescer, RenderQueue, RenderReceiver,
    ViewportPosition,
};

/// A remote build view and its session.
#[derive(Debug)]
pub struct RemoteBuild {
    config: RemoteBuildConfig,
    transport: TransportCommand,
    queue: RenderQueue,
    coalescer: LineCoalescer,
    filter: LogFilter,
    driver: Option<SessionDriver>,
}

impl RemoteBuild {
    /// Create the pipeline for `config`.
    ///
    /// Returns the receiver the render loop must consume. Coalescer timers run
    /// on `runtime`.
    pub fn new(config: RemoteBuildConfig, runtime: Handle) -> Result<(Self, RenderReceiver)> {
        config.validate()?;
        let filter = LogFilter::new(&config.view.filter)?;
        let (queue, receiver) = render_channel();
        let coalescer = LineCoalescer::new(queue.clone(), runtime, &config.view);

        let app = Self {
            transport: TransportCommand::from_config(&config),
            config,
            queue,
            coalescer,
            filter,
            driver: None,
        };
        Ok((app, receiver))
    }

    /// Use `transport` instead of the configured transport invocation.
    pub fn with_transport(mut self, transport: TransportCommand) -> Self {
        self.transport = transport;
        self
    }

    /// The configuration the view was opened with.
    pub fn config(&self) -> &RemoteBuildConfig {
        &self.config
    }

    /// The coalescer remote output is fed into.
    pub fn coalescer(&self) -> &LineCoalescer {
        &self.coalescer
    }

    /// Whether the view still accepts render commands.
    pub fn is_open(&self) -> bool {
        self.queue.is_open()
    }

    /// Launch the remote session, killing a previous one first.
    pub fn launch(&mut self) -> Result<SessionId> {
        if !self.is_open() {
            return Err(Error::Launch("view is closed".to_string()));
        }
        self.kill_session();

        let driver =
            SessionDriver::launch_with(&self.transport, &self.config, self.coalescer.clone())?;
        let id = driver.id();
        info!("Session {} launched", id);
        self.driver = Some(driver);
        Ok(id)
    }

    /// Current session, if one was launched.
    pub fn session_id(&self) -> Option<SessionId> {
        self.driver.as_ref().map(SessionDriver::id)
    }

    /// Status of the current session.
    pub fn session_status(&self) -> Option<SessionStatus> {
        self.driver.as_ref().map(SessionDriver::status)
    }

    /// Send a line to the remote session.
    pub fn send(&self, line: &str) -> Result<()> {
        match &self.driver {
            Some(driver) => driver.send(line),
            None => Err(Error::Write("no session running".to_string())),
        }
    }

    /// Install a new filter and re-derive every fold.
    ///
    /// An invalid pattern is rejected with [`Error::FilterCompile`] and the
    /// previous filter stays active.
    pub fn set_filter(&mut self, pattern: &str) -> Result<()> {
        let filter = LogFilter::new(pattern)?;
        info!("Filter set to '{}'", pattern);
        self.filter = filter.clone();
        self.queue.set_filter(filter);
        Ok(())
    }

    /// The active filter pattern, for pre-filling a filter prompt.
    pub fn filter_pattern(&self) -> &str {
        self.filter.pattern()
    }

    /// Filter on a token parsed out of `line`.
    ///
    /// Fails with [`Error::Extraction`] naming the token if `line` does not
    /// carry one; the filter is left unchanged.
    pub fn filter_by_token(&mut self, kind: TokenKind, line: &str) -> Result<()> {
        let token = extract_token(kind, line)?;
        self.set_filter(&token.filter_pattern())
    }

    /// Empty the view and run the build command again.
    pub fn clear_view(&self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        self.queue.clear();

        let build = &self.config.remote.build_command;
        match &self.driver {
            Some(driver) if !build.is_empty() => driver.send(build),
            _ => Ok(()),
        }
    }

    /// Collapse the whole view.
    pub fn fold_all(&self) {
        if self.is_open() {
            self.queue.fold_all();
        }
    }

    /// Move to `row`.
    pub fn scroll_to(&self, row: usize) {
        self.queue.scroll_to(row);
    }

    /// Set the viewport position.
    pub fn set_viewport_position(&self, position: ViewportPosition) {
        self.queue.set_viewport_position(position);
    }

    /// Whether actions apply to the surface reporting `scope`.
    ///
    /// True on this tool's own view, or anywhere while the view is open.
    pub fn is_enabled_for(&self, scope: Option<&str>) -> bool {
        scope.is_some_and(is_remote_build_scope) || self.is_open()
    }

    /// Close the view and tear down the session.
    ///
    /// Buffered output is flushed first; later feeds and commands are dropped.
    pub fn close(&mut self) {
        info!("Closing view");
        self.coalescer.flush();
        self.queue.close();
        self.kill_session();
    }

    fn kill_session(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            if driver.is_alive() {
                if let Err(e) = driver.kill() {
                    warn!("Failed to kill session {}: {}", driver.id(), e);
                }
            }
        }
    }
}

impl Drop for RemoteBuild {
    fn drop(&mut self) {
        self.kill_session();
    }
}
