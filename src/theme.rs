use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub card_bg: Color,
  pub rating: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 4] = [
  Theme {
    name: "Marquee",
    bg: Color::Rgb(18, 18, 24),
    fg: Color::Rgb(226, 226, 232),
    accent: Color::Rgb(1, 180, 228),
    muted: Color::Rgb(128, 128, 144),
    border: Color::Rgb(60, 60, 76),
    highlight_fg: Color::Rgb(18, 18, 24),
    highlight_bg: Color::Rgb(144, 206, 161),
    card_bg: Color::Rgb(28, 28, 38),
    rating: Color::Rgb(245, 197, 24),
    status: Color::Rgb(1, 180, 228),
    error: Color::Rgb(239, 83, 80),
    key_fg: Color::Rgb(18, 18, 24),
    key_bg: Color::Rgb(128, 128, 144),
  },
  Theme {
    name: "Nord",
    bg: Color::Rgb(46, 52, 64),
    fg: Color::Rgb(216, 222, 233),
    accent: Color::Rgb(136, 192, 208),
    muted: Color::Rgb(127, 138, 158),
    border: Color::Rgb(76, 86, 106),
    highlight_fg: Color::Rgb(46, 52, 64),
    highlight_bg: Color::Rgb(163, 190, 140),
    card_bg: Color::Rgb(59, 66, 82),
    rating: Color::Rgb(235, 203, 139),
    status: Color::Rgb(129, 161, 193),
    error: Color::Rgb(191, 97, 106),
    key_fg: Color::Rgb(46, 52, 64),
    key_bg: Color::Rgb(129, 161, 193),
  },
  Theme {
    name: "Matinee",
    bg: Color::Rgb(250, 247, 240),
    fg: Color::Rgb(40, 38, 34),
    accent: Color::Rgb(176, 58, 46),
    muted: Color::Rgb(130, 122, 110),
    border: Color::Rgb(210, 200, 184),
    highlight_fg: Color::Rgb(250, 247, 240),
    highlight_bg: Color::Rgb(176, 58, 46),
    card_bg: Color::Rgb(240, 234, 222),
    rating: Color::Rgb(184, 134, 11),
    status: Color::Rgb(46, 110, 142),
    error: Color::Rgb(176, 58, 46),
    key_fg: Color::Rgb(250, 247, 240),
    key_bg: Color::Rgb(130, 122, 110),
  },
  Theme {
    name: "Mono",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::White,
    muted: Color::DarkGray,
    border: Color::Gray,
    highlight_fg: Color::Black,
    highlight_bg: Color::White,
    card_bg: Color::Reset,
    rating: Color::White,
    status: Color::Gray,
    error: Color::White,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme called `name`, falling back to the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}
