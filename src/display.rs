use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Kitty,
  Direct,
  Ascii,
}

/// How posters are drawn.
///
/// Grid cards are always drawn into the ratatui buffer (half-block or ASCII);
/// Kitty only changes how the detail overlay poster is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  Ascii,
  Direct,
  Kitty,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
      DisplayMode::Kitty => "Kitty",
    }
  }

  /// Whether the overlay poster is sent with an out-of-band graphics protocol.
  pub fn uses_graphics_protocol(self) -> bool {
    matches!(self, DisplayMode::Kitty)
  }

  /// Mode used for in-buffer rendering (grid cards, overlay fallback).
  pub fn cell_mode(self) -> DisplayMode {
    match self {
      DisplayMode::Kitty => DisplayMode::Direct,
      other => other,
    }
  }
}

/// Pick a display mode from terminal environment values.
///
/// Probe order: Kitty graphics > true-color half-block > ASCII
///
/// - Kitty: `TERM=xterm-kitty`, or `TERM_PROGRAM` is kitty/WezTerm/ghostty
/// - Direct: `COLORTERM` is `truecolor` or `24bit`
/// - Ascii: fallback
pub fn detect_from(term: &str, term_program: &str, colorterm: &str) -> DisplayMode {
  let term_program = term_program.to_lowercase();
  if term == "xterm-kitty" || matches!(term_program.as_str(), "kitty" | "wezterm" | "ghostty") {
    return DisplayMode::Kitty;
  }

  let colorterm = colorterm.to_lowercase();
  if colorterm == "truecolor" || colorterm == "24bit" {
    return DisplayMode::Direct;
  }

  DisplayMode::Ascii
}

/// Detect the best display mode the terminal supports.
pub fn detect_display_mode() -> DisplayMode {
  let var = |name: &str| std::env::var(name).unwrap_or_default();
  detect_from(&var("TERM"), &var("TERM_PROGRAM"), &var("COLORTERM"))
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Kitty => DisplayMode::Kitty,
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
  }
}
