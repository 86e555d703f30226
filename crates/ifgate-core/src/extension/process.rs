//! Child process handling for extension commands
//!
//! Commands run as `<shell> -c <command>` with extra environment entries
//! applied on top of the inherited environment. The caller blocks until
//! the child has really terminated; there is no timeout and no
//! cancellation at this layer.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};

use tracing::{debug, warn};

/// A resolved command ready to be spawned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    /// Command string handed to the shell
    pub command: String,
    /// `NAME=value` entries, applied in order
    pub environment: Vec<String>,
}

/// How a child terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with a status code
    Exited(i32),
    /// Terminated by a signal
    Signaled(i32),
    /// Terminated in a way the platform cannot describe
    Unknown,
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled(signal);
            }
        }
        ExitOutcome::Unknown
    }
}

/// Handle to a spawned child
pub trait ChildProcess: Send {
    /// OS process id
    fn id(&self) -> u32;

    /// Block until the child has terminated
    ///
    /// Interrupted waits are retried; stop/continue notifications are not
    /// reported as termination.
    fn wait(&mut self) -> std::io::Result<ExitOutcome>;
}

/// Spawns extension commands
pub trait ProcessLauncher: Send + Sync {
    fn spawn(&self, command: &ShellCommand) -> std::io::Result<Box<dyn ChildProcess>>;
}

/// Production launcher: runs commands through a POSIX shell
#[derive(Debug, Clone)]
pub struct ShellLauncher {
    shell: PathBuf,
}

impl ShellLauncher {
    /// Launcher using `shell` (normally `/bin/sh`)
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &Path {
        &self.shell
    }
}

impl Default for ShellLauncher {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

impl ProcessLauncher for ShellLauncher {
    fn spawn(&self, command: &ShellCommand) -> std::io::Result<Box<dyn ChildProcess>> {
        restore_sigchld_default();

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(&command.command);

        for entry in &command.environment {
            match entry.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    cmd.env(name, value);
                }
                Some(_) => {
                    warn!("ignoring environment entry with empty name: {:?}", entry);
                }
                // putenv semantics: a bare name unsets the variable
                None => {
                    cmd.env_remove(OsString::from(entry));
                }
            }
        }

        let child = cmd.spawn()?;
        debug!("spawned {} -c {:?} as pid {}", self.shell.display(), command.command, child.id());
        Ok(Box::new(ShellChild { child }))
    }
}

struct ShellChild {
    child: Child,
}

impl ChildProcess for ShellChild {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn wait(&mut self) -> std::io::Result<ExitOutcome> {
        loop {
            match self.child.wait() {
                Ok(status) => return Ok(status.into()),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Make sure child exit statuses can be collected
///
/// If something in the process set SIGCHLD to SIG_IGN, the kernel reaps
/// children on its own and waiting for them fails. Reset an ignored
/// disposition to the default; any other disposition is put back as it was.
#[cfg(unix)]
fn restore_sigchld_default() {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    // SAFETY: SIG_DFL runs no code in this process.
    let previous = match unsafe { sigaction(Signal::SIGCHLD, &default) } {
        Ok(previous) => previous,
        Err(e) => {
            warn!("unable to inspect SIGCHLD disposition: {}", e);
            return;
        }
    };

    if previous.handler() == SigHandler::SigIgn {
        debug!("SIGCHLD was ignored, restoring default disposition");
        return;
    }
    // SAFETY: reinstalls the exact action that was in place a moment ago.
    if let Err(e) = unsafe { sigaction(Signal::SIGCHLD, &previous) } {
        warn!("unable to restore SIGCHLD disposition: {}", e);
    }
}

#[cfg(not(unix))]
fn restore_sigchld_default() {}
