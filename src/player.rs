use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::Stdio;
use tokio::{
  io::BufReader as TokioBufReader,
  io::AsyncBufReadExt,
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::gallery::PlayerCommand;

/// Drives an external media player process (mpv by default).
pub struct VideoPlayer {
  /// Program and leading arguments, e.g. `["mpv", "--fs"]`.
  command: Vec<String>,
  current_process: Option<TokioChild>,
  current_url: Option<String>,
  monitor_handle: Option<JoinHandle<()>>,
  status_rx: Option<mpsc::Receiver<String>>,
  last_status: Option<String>,
  ipc_socket_path: Option<String>,
  pub paused: bool,
}

impl VideoPlayer {
  pub fn new(command_line: &str) -> Self {
    Self {
      command: command_line.split_whitespace().map(str::to_string).collect(),
      current_process: None,
      current_url: None,
      monitor_handle: None,
      status_rx: None,
      last_status: None,
      ipc_socket_path: None,
      paused: false,
    }
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  pub fn current_url(&self) -> Option<&str> {
    self.current_url.as_deref()
  }

  /// Pausing goes through mpv's IPC socket, so only an mpv session started by us can pause.
  pub fn can_pause(&self) -> bool {
    cfg!(unix) && self.is_playing() && self.ipc_socket_path.is_some()
  }

  /// Whether the configured program is mpv, which gets status output and an IPC socket.
  fn is_mpv(&self) -> bool {
    self
      .command
      .first()
      .and_then(|program| Path::new(program).file_stem())
      .is_some_and(|stem| stem.eq_ignore_ascii_case("mpv"))
  }

  /// Drain status lines from the player and notice when it exits on its own.
  pub fn check_status(&mut self) {
    if let Some(rx) = &mut self.status_rx {
      while let Ok(status) = rx.try_recv() {
        self.last_status = Some(status);
      }
    }
    if let Some(child) = &mut self.current_process
      && let Ok(Some(exit)) = child.try_wait()
    {
      debug!(status = %exit, "player: process exited");
      self.current_process = None;
      self.current_url = None;
      self.paused = false;
      if let Some(path) = self.ipc_socket_path.take() {
        let _ = std::fs::remove_file(&path);
      }
    }
  }

  pub fn last_status(&self) -> Option<&str> {
    self.last_status.as_deref()
  }

  /// Carry out a gallery command. Failures are logged and returned as a message, never raised.
  ///
  /// Playback start is fire-and-forget: a missing player binary or a refused start leaves
  /// the gallery state as it is.
  pub async fn apply(&mut self, command: PlayerCommand) -> Option<String> {
    let result = match command {
      PlayerCommand::Play { url } => self.play(&url).await,
      PlayerCommand::Clear => self.stop().await,
    };
    match result {
      Ok(()) => None,
      Err(e) => {
        warn!(err = %format!("{:#}", e), "player: command failed");
        Some(format!("{:#}", e))
      }
    }
  }

  /// Build the player invocation. `ipc_socket` is only passed for mpv.
  fn command_for(&self, url: &str, ipc_socket: Option<&str>) -> Result<Command> {
    let (program, base_args) = self.command.split_first().ok_or_else(|| anyhow!("No player command configured"))?;
    let mut cmd = Command::new(program);
    cmd.args(base_args);
    if let Some(path) = ipc_socket {
      cmd.args([
        "--force-window=immediate",
        "--term-status-msg=${time-pos/full} / ${duration/full} | ${media-title} | ${pause} ${percent-pos}%",
        &format!("--input-ipc-server={}", path),
      ]);
    }
    // Manifest URLs are untrusted; never let one be read as an option.
    cmd.arg("--").arg(url);
    Ok(cmd)
  }

  pub async fn play(&mut self, url: &str) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;

    let mpv = self.is_mpv();
    let mut socket_path_str = None;
    if mpv {
      let socket_path = std::env::temp_dir().join(format!("vgal-mpv-{}.sock", std::process::id()));
      let path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
      // Remove stale socket if it exists from a previous crash.
      let _ = std::fs::remove_file(&socket_path);
      socket_path_str = Some(path_str);
    }
    let mut cmd = self.command_for(url, socket_path_str.as_deref())?;
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null());
    cmd.stdout(if mpv { Stdio::piped() } else { Stdio::null() });
    // Send stderr to null; if piped but never drained, the pipe buffer fills and the player blocks.
    cmd.stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("{} not found. Install it (e.g. brew install mpv or apt install mpv) or pass --player", program)
      } else {
        anyhow!(e).context(format!("Failed to spawn {}", program))
      }
    })?;

    if let Some(stdout) = child.stdout.take() {
      let (tx, rx) = mpsc::channel::<String>(10);
      self.status_rx = Some(rx);
      self.monitor_handle = Some(tokio::spawn(async move {
        let reader = TokioBufReader::new(stdout);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
          if tx.send(line).await.is_err() {
            break;
          }
        }
      }));
    }

    info!(url = %url, player = %program, "player: started");
    self.current_process = Some(child);
    self.current_url = Some(url.to_string());
    self.ipc_socket_path = socket_path_str;
    Ok(())
  }

  #[cfg(unix)]
  pub async fn toggle_pause(&mut self) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    let stream = tokio::net::UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
    stream.writable().await.context("mpv IPC socket not writable")?;
    let cmd = b"{\"command\":[\"cycle\",\"pause\"]}\n";
    let written = stream.try_write(cmd).context("Failed to send pause command to mpv")?;
    if written < cmd.len() {
      return Err(anyhow!("Partial write to mpv IPC socket: wrote {} of {} bytes", written, cmd.len()));
    }
    self.paused = !self.paused;
    Ok(())
  }

  #[cfg(not(unix))]
  pub async fn toggle_pause(&mut self) -> Result<()> {
    Err(anyhow!("Pause is not supported on this platform"))
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(handle) = self.monitor_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    self.status_rx = None;
    self.last_status = None;

    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill player process")?;
      let _ = child.wait().await;
      debug!("player: stopped");
    }

    self.current_url = None;
    self.paused = false;

    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_mpv_by_program_name() {
    assert!(VideoPlayer::new("mpv").is_mpv());
    assert!(VideoPlayer::new("/usr/local/bin/mpv --fs").is_mpv());
    assert!(!VideoPlayer::new("vlc").is_mpv());
    assert!(!VideoPlayer::new("").is_mpv());
  }

  fn args_of(cmd: &Command) -> Vec<String> {
    cmd.as_std().get_args().map(|a| a.to_string_lossy().into_owned()).collect()
  }

  #[test]
  fn url_is_never_read_as_an_option() {
    let player = VideoPlayer::new("vlc --fullscreen");
    let args = args_of(&player.command_for("--play-and-exit", None).unwrap());
    assert_eq!(args, ["--fullscreen", "--", "--play-and-exit"]);
  }

  #[test]
  fn mpv_gets_ipc_socket_before_separator() {
    let player = VideoPlayer::new("mpv");
    let args = args_of(&player.command_for("https://example.com/a.mp4", Some("/tmp/vgal.sock")).unwrap());
    assert!(args.contains(&"--input-ipc-server=/tmp/vgal.sock".to_string()));
    assert_eq!(&args[args.len() - 2..], ["--", "https://example.com/a.mp4"]);
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn clear_stops_running_player() {
    let mut player = VideoPlayer::new("sleep");
    assert_eq!(player.apply(PlayerCommand::Play { url: "30".into() }).await, None);
    assert!(player.is_playing());
    assert_eq!(player.current_url(), Some("30"));
    assert!(!player.can_pause());

    assert_eq!(player.apply(PlayerCommand::Clear).await, None);
    assert!(!player.is_playing());
    assert!(player.current_url().is_none());
  }

  #[tokio::test]
  async fn clear_when_idle_is_quiet() {
    let mut player = VideoPlayer::new("mpv");
    assert_eq!(player.apply(PlayerCommand::Clear).await, None);
    assert!(!player.is_playing());
    assert!(player.current_url().is_none());
  }

  #[tokio::test]
  async fn missing_player_is_swallowed() {
    let mut player = VideoPlayer::new("vgal-no-such-player-binary");
    let msg = player.apply(PlayerCommand::Play { url: "https://example.com/a.mp4".into() }).await;
    assert!(msg.is_some_and(|m| m.contains("not found")));
    assert!(!player.is_playing());
  }

  #[tokio::test]
  async fn empty_command_is_swallowed() {
    let mut player = VideoPlayer::new("   ");
    let msg = player.apply(PlayerCommand::Play { url: "x".into() }).await;
    assert!(msg.is_some());
  }

  #[tokio::test]
  async fn pause_without_player_is_noop() {
    let mut player = VideoPlayer::new("mpv");
    if cfg!(unix) {
      assert!(player.toggle_pause().await.is_ok());
      assert!(!player.paused);
    }
  }
}
