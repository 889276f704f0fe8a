mod app;
mod config;
mod constants;
mod display;
mod error;
mod graphics;
mod input;
mod logging;
mod model;
mod notify;
mod orchestrator;
mod pagination;
mod search_input;
mod theme;
mod tmdb;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::{error, info};

use app::{App, PosterKey};
use config::{Config, Settings};
use display::{CliDisplayMode, DisplayMode};
use graphics::{kitty_delete_placement, kitty_render_image};
use tmdb::{PosterSize, TmdbClient};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Search The Movie Database from the terminal", long_about = None)]
struct Args {
  /// TMDB API read access token (v4 bearer token)
  #[arg(long, env = "TMDB_TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// Override the TMDB API base URL
  #[arg(long, env = "TMDB_API_BASE_URL")]
  api_base_url: Option<String>,

  /// Display mode: 'auto', 'kitty', 'direct', or 'ascii' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// Clear the search field after each submitted search
  #[arg(long)]
  clear_on_submit: bool,

  /// Log level for the log file (RUST_LOG overrides)
  #[arg(long, default_value = "info")]
  log_level: String,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<clap_complete::Shell>,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "reel", &mut std::io::stdout());
    return Ok(());
  }

  // Configuration problems are reported before the terminal is taken over.
  let settings = Settings::resolve(args.token.as_deref(), args.api_base_url.as_deref())
    .context("Invalid configuration")?;
  let client = TmdbClient::new(&settings).context("Failed to build TMDB client")?;

  let _log_guard = logging::init_logging(&args.log_level);
  let display_mode = display::resolve_display_mode(args.display_mode);
  info!(
    version = env!("CARGO_PKG_VERSION"),
    api_base_url = %settings.api_base_url,
    display_mode = display_mode.label(),
    "reel starting"
  );

  let config = Config::load();
  let app = App::new(client, &config, display_mode, args.clear_on_submit);

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, app).await;
  ratatui::restore();
  if let Err(ref e) = result {
    error!(err = %e, "reel exited with an error");
  }
  result
}

async fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  let uses_graphics_protocol = app.display_mode.uses_graphics_protocol();

  loop {
    app.check_pending();

    terminal.draw(|frame| ui::ui(frame, &mut app)).context("Failed to draw frame")?;

    if uses_graphics_protocol {
      sync_overlay_poster(&mut app)?;
    }

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key_event(&mut app, key),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.log_summary();
  if app.display_mode == DisplayMode::Kitty && app.gfx.last_sent.is_some() {
    kitty_delete_placement()?;
  }
  Ok(())
}

/// Place, replace or remove the overlay poster to match what the renderer
/// laid out this frame.
fn sync_overlay_poster(app: &mut App) -> Result<()> {
  let wanted = app.gfx.poster_area.and_then(|area| {
    let path = app.orchestrator.selection()?.poster_path.clone()?;
    Some((path, area))
  });

  match wanted {
    Some(key) => {
      if app.gfx.last_sent.as_ref() != Some(&key)
        && let Some(image) = app.posters.get(&PosterKey { path: key.0.clone(), size: PosterSize::Detail })
      {
        kitty_render_image(image, key.1)?;
        app.gfx.last_sent = Some(key);
      }
    }
    None => {
      if app.gfx.last_sent.take().is_some() {
        kitty_delete_placement()?;
      }
    }
  }
  Ok(())
}
