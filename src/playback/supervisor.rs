use super::PlaybackTarget;
use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::runtime::RuntimeFlavor;
use tracing::{debug, info, warn};

/// External player invocation: argv prefix, target appended last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    program: String,
    args: Vec<String>,
}

impl PlayerCommand {
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv.split_first().ok_or(Error::EmptyPlayerCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// The one running player, identified by its process group
#[derive(Debug)]
pub struct PlaybackHandle {
    pgid: libc::pid_t,
    target: PlaybackTarget,
    child: Child,
}

impl PlaybackHandle {
    pub fn pgid(&self) -> libc::pid_t {
        self.pgid
    }

    pub fn target(&self) -> &PlaybackTarget {
        &self.target
    }
}

/// Owns the session's playback handle. Idle when `current` is empty, Playing otherwise.
pub struct ProcessSupervisor {
    file_player: PlayerCommand,
    stream_player: PlayerCommand,
    stop_grace: Duration,
    quiet: bool,
    current: Option<PlaybackHandle>,
}

impl ProcessSupervisor {
    pub fn new(file_player: PlayerCommand, stream_player: PlayerCommand) -> Self {
        Self {
            file_player,
            stream_player,
            stop_grace: Duration::ZERO,
            quiet: false,
            current: None,
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Result<Self> {
        let mut supervisor = Self::new(
            PlayerCommand::from_argv(&config.file_command)?,
            PlayerCommand::from_argv(&config.stream_command)?,
        );
        supervisor.stop_grace = config.stop_grace();
        supervisor.quiet = config.quiet;
        Ok(supervisor)
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn current(&self) -> Option<&PlaybackHandle> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// Start the player as leader of a fresh process group. Replaces the
    /// handle without stopping the old one - call `stop` first.
    pub fn spawn(&mut self, target: PlaybackTarget) -> Result<libc::pid_t> {
        let player = match &target {
            PlaybackTarget::LocalFile(_) => &self.file_player,
            PlaybackTarget::StreamUrl(_) => &self.stream_player,
        };

        let mut command = Command::new(&player.program);
        command.args(&player.args).stdin(Stdio::null()).process_group(0);
        match &target {
            PlaybackTarget::LocalFile(path) => command.arg(path),
            PlaybackTarget::StreamUrl(url) => command.arg(url),
        };
        if self.quiet {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let child = command.spawn().map_err(|source| Error::PlayerSpawn {
            program: player.program.clone(),
            source,
        })?;

        // process_group(0) makes the child its own group leader
        let pgid = child.id() as libc::pid_t;
        info!("Started {} (pgid {}) on {}", player.program, pgid, target);

        if let Some(previous) = self.current.replace(PlaybackHandle { pgid, target, child }) {
            warn!("Replaced handle for pgid {} without stopping it", previous.pgid);
        }

        Ok(pgid)
    }

    /// Tear down the whole player group: SIGTERM, then SIGKILL.
    /// Returns `false` when there was nothing left to stop.
    ///
    /// The grace pause and the reap block the calling thread. On a multi-thread
    /// runtime they run under `block_in_place` so other tasks keep moving.
    pub fn stop(&mut self) -> Result<bool> {
        let Some(handle) = self.current.take() else {
            return Ok(false);
        };
        let grace = self.stop_grace;

        match tokio::runtime::Handle::try_current() {
            Ok(rt) if rt.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| teardown(handle, grace))
            }
            _ => teardown(handle, grace),
        }
    }
}

fn teardown(mut handle: PlaybackHandle, grace: Duration) -> Result<bool> {
    let pgid = handle.pgid;

    // reap a leader that already quit so its zombie does not count as alive
    let leader_exited = matches!(handle.child.try_wait(), Ok(Some(_)));

    let stopped = match signal_group(pgid, libc::SIGTERM) {
        Ok(()) => true,
        Err(e) if e.raw_os_error() == Some(libc::ESRCH) => false,
        Err(source) => return Err(Error::Signal { pgid, source }),
    };

    if stopped {
        if !grace.is_zero() {
            std::thread::sleep(grace);
        }
        if let Err(e) = signal_group(pgid, libc::SIGKILL) {
            if e.raw_os_error() != Some(libc::ESRCH) {
                warn!("SIGKILL to pgid {} failed: {}", pgid, e);
            }
        }
    }

    if !leader_exited {
        // SIGKILL was delivered to the leader, so this returns promptly
        if let Err(e) = handle.child.wait() {
            debug!("Could not reap player {}: {}", pgid, e);
        }
    }

    if stopped {
        info!("Stopped player group {}", pgid);
    } else {
        debug!("Player group {} was already gone", pgid);
    }
    Ok(stopped)
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop player on shutdown: {}", e);
        }
    }
}

fn signal_group(pgid: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    // SAFETY: killpg only takes plain integers
    let rc = unsafe { libc::killpg(pgid, signal) };
    if rc == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
