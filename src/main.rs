mod app;
mod config;
mod constants;
mod gallery;
mod input;
mod logging;
mod manifest;
mod player;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
  },
};
use std::time::Duration;
use tracing::info;

use app::App;
use config::Config;
use constants::constants;
use input::{handle_key_event, handle_mouse_event};
use manifest::ManifestSource;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None, args_conflicts_with_subcommands = true)]
struct Args {
  /// Manifest location: an http(s) URL or a local JSON file (default: data_upload.json)
  #[arg(value_name = "URL|PATH", conflicts_with = "manifest")]
  source: Option<String>,

  /// Same as the positional argument
  #[arg(short, long, value_name = "URL|PATH")]
  manifest: Option<String>,

  /// Player command line, e.g. "mpv --fs" (default: mpv)
  #[arg(short, long, value_name = "CMD")]
  player: Option<String>,

  /// Log filter directive, e.g. "vgal=debug" (overrides RUST_LOG)
  #[arg(long, value_name = "FILTER")]
  log_level: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print a shell completion script to stdout
  Completions {
    #[arg(value_enum)]
    shell: Shell,
  },
}

/// Resolve a setting: command line, then prefs.toml, then the built-in default.
fn resolve(cli: Option<String>, prefs: Option<&str>, default: &str) -> String {
  cli.or_else(|| prefs.map(str::to_string)).unwrap_or_else(|| default.to_string())
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(Command::Completions { shell }) = args.command {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = logging::init(args.log_level.as_deref())?;

  let config = Config::load();
  let location = resolve(args.source.or(args.manifest), config.manifest.as_deref(), &constants().default_manifest);
  let player = resolve(args.player, config.player.as_deref(), &constants().player_command);
  let source = ManifestSource::parse(&location)?;
  let client = manifest::http_client()?;
  info!(manifest = %source, player = %player, "starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  execute!(std::io::stdout(), EnableMouseCapture).context("Failed to enable mouse capture")?;
  let mut app = App::new(source, &player, client, config);
  let result = run(&mut terminal, &mut app).await;
  let shutdown = app.shutdown().await;
  let _ = execute!(std::io::stdout(), DisableMouseCapture);
  ratatui::restore();
  info!("exiting");
  result.and(shutdown)
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  app.trigger_load();

  loop {
    app.check_pending().await;
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(constants().poll_interval_ms))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          handle_key_event(app, key).await?;
        }
        Event::Mouse(mouse) => {
          handle_mouse_event(app, mouse).await;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  Ok(())
}
