//! Session driver: owns the remote process and pumps its output into the log pipeline.

use std::io::{BufRead, BufReader, Read};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use remote_build_core::{Error, RemoteBuildConfig, Result, SessionId};
use remote_build_view::LineCoalescer;

use crate::prompt::read_until_prompt;
use crate::transport::{Transport, TransportCommand};

/// Status of a remote session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Session is running
    Running,
    /// Remote process exited or its output stream failed
    Exited,
    /// Session was killed
    Terminated,
}

/// A running remote session.
///
/// Output is consumed in one of two modes: the steady-state read loop, which
/// streams whole lines into the coalescer on a background thread, or
/// prompt-synchronised reads driven by the caller. Once the read loop is
/// running it owns the output stream for the rest of the session.
#[derive(Debug)]
pub struct SessionDriver {
    /// Session identifier
    id: SessionId,

    /// Transport process
    transport: Arc<Transport>,

    /// Destination for remote output
    coalescer: LineCoalescer,

    /// Steady-state read loop, once started
    reader_thread: Option<JoinHandle<()>>,

    /// Current session status
    status: Arc<Mutex<SessionStatus>>,
}

impl SessionDriver {
    /// Start the transport process without sending anything.
    pub fn spawn(command: &TransportCommand, coalescer: LineCoalescer) -> Result<Self> {
        let id = SessionId::new();
        info!("Starting session {}", id);

        let transport = Transport::spawn(command)?;
        Ok(Self {
            id,
            transport: Arc::new(transport),
            coalescer,
            reader_thread: None,
            status: Arc::new(Mutex::new(SessionStatus::Running)),
        })
    }

    /// Launch the configured transport, send the initial commands and start
    /// the steady-state read loop.
    pub fn launch(config: &RemoteBuildConfig, coalescer: LineCoalescer) -> Result<Self> {
        Self::launch_with(&TransportCommand::from_config(config), config, coalescer)
    }

    /// Like [`SessionDriver::launch`] with an explicit transport command.
    pub fn launch_with(
        command: &TransportCommand,
        config: &RemoteBuildConfig,
        coalescer: LineCoalescer,
    ) -> Result<Self> {
        let mut driver = Self::spawn(command, coalescer)?;
        driver.send_initial_commands(config)?;
        driver.run_steady_state()?;
        Ok(driver)
    }

    /// Send the change-directory, setup and build commands, in that order.
    ///
    /// Fire-and-forget: nothing waits for the remote side to answer. Commands
    /// left empty in the configuration are skipped.
    pub fn send_initial_commands(&self, config: &RemoteBuildConfig) -> Result<()> {
        if !config.remote.directory.is_empty() {
            self.send(&config.cd_command())?;
        }
        for command in [&config.remote.setup_command, &config.remote.build_command] {
            if !command.is_empty() {
                self.send(command)?;
            }
        }
        Ok(())
    }

    /// Write a command line followed by a newline.
    pub fn send(&self, line: &str) -> Result<()> {
        debug!("Session {}: sending command", self.id);
        self.transport.write_line(line)
    }

    /// Start the background read loop.
    ///
    /// Every complete non-blank line is fed to the coalescer with trailing
    /// whitespace removed. The loop ends when the process exits or a read
    /// fails, and is never restarted.
    pub fn run_steady_state(&mut self) -> Result<()> {
        let reader = self.transport.take_reader()?;
        let coalescer = self.coalescer.clone();
        let status = Arc::clone(&self.status);
        let id = self.id;

        let handle = thread::Builder::new()
            .name("remote-build-reader".to_string())
            .spawn(move || {
                let lines = pump_lines(reader, &coalescer);
                info!("Session {}: {} after {} lines", id, Error::StreamEnded, lines);
                let mut status = lock(&status);
                if *status == SessionStatus::Running {
                    *status = SessionStatus::Exited;
                }
            })?;

        self.reader_thread = Some(handle);
        Ok(())
    }

    /// Optionally send a command, then read until the remote prompt appears.
    ///
    /// Returns everything read, prompt included. Only available before the
    /// steady-state loop takes the output stream; afterwards fails with
    /// [`Error::ReaderAttached`].
    pub fn send_and_await_prompt(&self, command: Option<&str>) -> Result<String> {
        if let Some(command) = command {
            self.send(command)?;
        }
        let coalescer = &self.coalescer;
        self.transport
            .with_reader(|reader| read_until_prompt(reader, coalescer))
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        *lock(&self.status)
    }

    /// Whether the remote process is still running.
    pub fn is_alive(&self) -> bool {
        self.transport.is_alive()
    }

    /// Forcefully terminate the remote process.
    ///
    /// The read loop is not joined; it ends on its own once the stream closes.
    pub fn kill(&mut self) -> Result<()> {
        info!("Killing session {}", self.id);
        self.transport.kill()?;
        *lock(&self.status) = SessionStatus::Terminated;
        // Detach
        self.reader_thread.take();
        Ok(())
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        if self.transport.is_alive() {
            if let Err(e) = self.kill() {
                warn!("Failed to kill session {} on drop: {}", self.id, e);
            }
        }
    }
}

/// Feed every non-blank line from `reader` to the coalescer until end of stream.
///
/// Returns the number of lines forwarded.
pub fn pump_lines<R: Read>(reader: R, coalescer: &LineCoalescer) -> usize {
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();
    let mut forwarded = 0;

    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&raw);
                let line = text.trim_end();
                if line.trim().is_empty() {
                    continue;
                }
                coalescer.feed(&format!("{line}\n"));
                forwarded += 1;
            }
            Err(e) => {
                // A closed PTY reports EIO rather than end of file
                debug!("Read loop stopped: {}", e);
                break;
            }
        }
    }
    forwarded
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
