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
  pub stripe_bg: Color,
  /// Marker colour for the card that is currently playing.
  pub active: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "Dusk",
    bg: Color::Rgb(24, 24, 32),
    fg: Color::Rgb(220, 220, 230),
    accent: Color::Rgb(255, 140, 105),
    muted: Color::Rgb(120, 120, 140),
    border: Color::Rgb(70, 70, 90),
    highlight_fg: Color::Rgb(24, 24, 32),
    highlight_bg: Color::Rgb(255, 140, 105),
    stripe_bg: Color::Rgb(30, 30, 40),
    active: Color::Rgb(140, 220, 160),
    status: Color::Rgb(130, 200, 255),
    error: Color::Rgb(255, 95, 95),
    key_fg: Color::Rgb(24, 24, 32),
    key_bg: Color::Rgb(120, 120, 140),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 240),
    fg: Color::Rgb(40, 40, 40),
    accent: Color::Rgb(0, 110, 160),
    muted: Color::Rgb(130, 130, 120),
    border: Color::Rgb(200, 196, 180),
    highlight_fg: Color::Rgb(250, 248, 240),
    highlight_bg: Color::Rgb(0, 110, 160),
    stripe_bg: Color::Rgb(242, 239, 228),
    active: Color::Rgb(30, 140, 70),
    status: Color::Rgb(0, 110, 160),
    error: Color::Rgb(190, 30, 30),
    key_fg: Color::Rgb(250, 248, 240),
    key_bg: Color::Rgb(130, 130, 120),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Cyan,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    stripe_bg: Color::Reset,
    active: Color::Green,
    status: Color::Blue,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Position of the theme called `name`, ignoring case.
pub fn index_of(name: &str) -> Option<usize> {
  THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(name))
}
