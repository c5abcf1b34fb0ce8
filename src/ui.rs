use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph},
};

use crate::app::{App, AppMode};
use crate::constants::constants;
use crate::gallery::CardView;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn bordered(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(Span::styled(" ▶ vgal ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let stats = app.gallery.stats();
  let right_text = format!("{} · {}  v{} ", stats.count_label(), stats.size_label(), env!("CARGO_PKG_VERSION"));
  let width = right_text.chars().count() as u16;
  let right = Line::from(Span::styled(right_text, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  let [list_area, player_area] =
    Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(area);
  render_cards(frame, app, list_area);
  render_now_playing(frame, app, player_area);
}

fn card_item<'a>(card: &CardView, index: usize, theme: &Theme, inner_w: usize) -> ListItem<'a> {
  let bg = if index % 2 == 1 { theme.stripe_bg } else { theme.bg };
  let (marker, title_style) = if card.active {
    ("● ", Style::default().fg(theme.active).add_modifier(Modifier::BOLD))
  } else {
    ("  ", Style::default().fg(theme.fg))
  };
  let title = Line::from(vec![
    Span::styled(marker, Style::default().fg(theme.active)),
    Span::styled(truncate_str(&card.title, inner_w.saturating_sub(2)), title_style),
  ]);
  let meta = Line::from(Span::styled(
    truncate_str(&format!("  {}  ·  {}", card.size, card.date), inner_w),
    Style::default().fg(theme.muted),
  ));
  ListItem::new(vec![title, meta]).bg(bg)
}

fn render_cards(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let cards = app.gallery.cards();
  let border_color = if app.mode == AppMode::Browse { theme.accent } else { theme.border };
  let block = bordered(theme)
    .border_style(Style::default().fg(border_color))
    .title(format!(" Videos ({}) ", cards.len()))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));

  if cards.is_empty() {
    app.list_area = None;
    let message = if app.gallery.is_empty() { &constants().empty_state } else { &constants().no_match_title };
    let text = vec![Line::from(""), Line::from(Span::styled(message.as_str(), Style::default().fg(theme.muted)))];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol.
  let inner_w = area.width.saturating_sub(4) as usize;
  let items: Vec<ListItem> = cards.iter().enumerate().map(|(i, card)| card_item(card, i, theme, inner_w)).collect();

  let mut list = List::new(items).block(block).highlight_symbol("▶ ");
  if app.mode == AppMode::Browse {
    list = list.highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg));
  }

  app.list_area = Some(area);
  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_now_playing(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let info_title =
    Line::from(Span::styled(" Now Playing ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  let block = bordered(theme).title(info_title).padding(Padding::horizontal(1));

  let now = app.gallery.now_playing();
  let inner_w = area.width.saturating_sub(4) as usize;
  let title = if now.title.is_empty() { "Nothing playing" } else { now.title.as_str() };

  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(truncate_str(title, inner_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
  ];
  if !now.size.is_empty() {
    lines.push(Line::from(vec![
      Span::styled("Size      ", Style::default().fg(theme.muted)),
      Span::styled(now.size.as_str(), Style::default().fg(theme.fg)),
    ]));
  }
  if !now.date.is_empty() {
    lines.push(Line::from(Span::styled(truncate_str(&now.date, inner_w), Style::default().fg(theme.fg))));
  }
  if let Some(url) = app.player.current_url() {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      truncate_str(url, inner_w),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )));
  }
  if let Some(status) = app.player.last_status() {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(truncate_str(status, inner_w), Style::default().fg(theme.status))));
  }

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(theme.muted))
  } else if app.player.is_playing() {
    let state = if app.player.paused { "Paused" } else { "Playing" };
    (format!(" ♪ {}", state), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Search { theme.accent } else { theme.border };
  let input_block = bordered(theme)
    .title(" Search ")
    .title_style(Style::default().fg(border_color))
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  // At least one column so the cursor always has a cell, even on a tiny terminal.
  let inner_w = area.width.saturating_sub(4).max(1) as usize;
  let cursor_col = display_width(&app.query, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .query
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Search {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  let is_playing = app.player.is_playing();
  let mut keys = match app.mode {
    AppMode::Search => {
      let mut k = vec![("type", "Filter")];
      if app.gallery.visible_len() > 0 {
        k.push(("Tab", "List"));
      }
      k.push(("Esc", if app.query.is_empty() { "Quit" } else { "Clear" }));
      k
    }
    AppMode::Browse => {
      let mut k = vec![("Enter", "Play"), ("j/k", "Navigate")];
      if app.player.can_pause() {
        k.push(("Space", if app.player.paused { "Resume" } else { "Pause" }));
      }
      k.push(("/", "Search"));
      k.push(("q", "Quit"));
      k
    }
  };
  if is_playing {
    keys.push(("^s", "Stop"));
  }
  keys.push(("^r", "Reload"));
  keys.push(("^t", "Theme"));
  keys
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let label_w = theme_label.len() as u16;
  let right_area = Rect { x: area.x + area.width.saturating_sub(label_w), width: label_w.min(area.width), ..area };
  frame.render_widget(right, right_area);
}
