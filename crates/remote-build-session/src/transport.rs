//! Transport process handling with portable-pty.

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use remote_build_core::{Error, RemoteBuildConfig, Result};

/// Rows of the pseudo-terminal the transport runs on.
const PTY_ROWS: u16 = 50;
/// Columns; wide enough that the remote side does not wrap build output.
const PTY_COLS: u16 = 400;

/// How to start the transport process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportCommand {
    /// Executable
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
}

impl TransportCommand {
    /// Command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// `<command> <user>@<host> -pw <password>` from configuration.
    pub fn from_config(config: &RemoteBuildConfig) -> Self {
        Self {
            program: config.transport.command.clone(),
            args: config.transport_args(),
            env: Vec::new(),
        }
    }

    /// Command line for logging, with the password masked.
    pub fn display_masked(&self) -> String {
        let mut parts = vec![self.program.clone()];
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                parts.push("****".to_string());
            } else {
                parts.push(arg.clone());
            }
            mask_next = arg == "-pw";
        }
        parts.join(" ")
    }
}

/// Handle to a running transport process.
pub struct Transport {
    /// Kept alive so the pseudo-terminal stays open
    _master: Mutex<Box<dyn MasterPty + Send>>,
    child: Mutex<Box<dyn Child + Send + Sync>>,
    writer: Mutex<Box<dyn Write + Send>>,
    /// None once handed to the steady-state read loop
    reader: Mutex<Option<Box<dyn Read + Send>>>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

impl Transport {
    /// Spawn the transport process on a new pseudo-terminal.
    ///
    /// Fails with [`Error::Launch`] if the process cannot be started.
    pub fn spawn(command: &TransportCommand) -> Result<Self> {
        info!("Spawning transport: {}", command.display_masked());

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: PTY_ROWS,
                cols: PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| {
                error!("Failed to open PTY: {}", e);
                Error::Launch(format!("Failed to open PTY: {e}"))
            })?;

        // Sent commands must not come back as output
        #[cfg(unix)]
        disable_echo(pair.master.as_ref());

        let mut cmd = CommandBuilder::new(&command.program);
        for arg in &command.args {
            cmd.arg(arg);
        }
        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            error!("Failed to spawn '{}': {}", command.program, e);
            Error::Launch(format!("Failed to spawn '{}': {e}", command.program))
        })?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::Launch(format!("Failed to take writer: {e}")))?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::Launch(format!("Failed to clone reader: {e}")))?;

        debug!("Transport spawned: {}", command.program);

        Ok(Self {
            _master: Mutex::new(pair.master),
            child: Mutex::new(child),
            writer: Mutex::new(writer),
            reader: Mutex::new(Some(reader)),
        })
    }

    /// Write `line` followed by a newline and flush.
    ///
    /// Fails with [`Error::Write`] if the process has exited or the stream is broken.
    pub fn write_line(&self, line: &str) -> Result<()> {
        if !self.is_alive() {
            return Err(Error::Write("session has exited".to_string()));
        }
        debug!("Sending {} bytes", line.len() + 1);

        let mut writer = lock(&self.writer);
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        writer
            .write_all(&data)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::Write(e.to_string()))
    }

    /// Hand the output reader to a long-running consumer.
    pub fn take_reader(&self) -> Result<Box<dyn Read + Send>> {
        lock(&self.reader).take().ok_or(Error::ReaderAttached)
    }

    /// Run `f` on the output reader while it is still owned by the transport.
    pub fn with_reader<T>(&self, f: impl FnOnce(&mut (dyn Read + Send)) -> Result<T>) -> Result<T> {
        let mut reader = lock(&self.reader);
        let reader = reader.as_mut().ok_or(Error::ReaderAttached)?;
        f(&mut **reader)
    }

    /// Check if the process is still running.
    pub fn is_alive(&self) -> bool {
        lock(&self.child).try_wait().ok().flatten().is_none()
    }

    /// Kill the process.
    pub fn kill(&self) -> Result<()> {
        info!("Killing transport process");
        let mut child = lock(&self.child);
        if child.try_wait().ok().flatten().is_some() {
            return Ok(());
        }
        child.kill().map_err(Error::Io)?;
        // Reap so the read side sees end-of-stream
        let _ = child.wait();
        Ok(())
    }
}

/// Clear `ECHO` on the pseudo-terminal so written lines are not read back.
#[cfg(unix)]
fn disable_echo(master: &dyn MasterPty) {
    let Some(fd) = master.as_raw_fd() else {
        warn!("PTY master has no file descriptor, leaving echo on");
        return;
    };
    unsafe {
        let mut termios: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut termios) != 0 {
            warn!(
                "Failed to read PTY attributes: {}",
                std::io::Error::last_os_error()
            );
            return;
        }
        termios.c_lflag &= !(libc::ECHO | libc::ECHONL);
        if libc::tcsetattr(fd, libc::TCSANOW, &termios) != 0 {
            warn!(
                "Failed to turn off PTY echo: {}",
                std::io::Error::last_os_error()
            );
        } else {
            debug!("Turned off echo on PTY master {}", fd);
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
