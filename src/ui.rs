use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Flex, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode, PosterKey};
use crate::constants::constants;
use crate::graphics::PosterWidget;
use crate::model::Movie;
use crate::orchestrator::FetchState;
use crate::pagination::{PageSlot, page_slots};
use crate::theme::Theme;
use crate::tmdb::PosterSize;

/// Border plus title and meta lines around each card poster.
const CARD_CHROME: u16 = 4;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// --- Helpers ---

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn spinner_frame(app: &App) -> &'static str {
  let tick = app.started_at.elapsed().as_millis() / 100;
  SPINNER[(tick % SPINNER.len() as u128) as usize]
}

/// Render `text` flush against the right edge of `area`.
fn render_right(frame: &mut Frame, area: Rect, text: &str, style: Style) {
  let width = (text.chars().count() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width, ..area };
  frame.render_widget(Line::from(Span::styled(text.to_string(), style)), right_area);
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  app.gfx.poster_area = None;

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, pager_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_main(frame, app, main_area);
  render_page_bar(frame, app, pager_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);

  if app.mode == AppMode::Detail {
    render_detail(frame, app);
  }
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▶ reel ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let right = format!("Powered by TMDB  v{} ", env!("CARGO_PKG_VERSION"));
  render_right(frame, area, &right, Style::default().fg(theme.muted));
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  if !app.results().is_empty() {
    render_grid(frame, app, area);
    return;
  }
  match app.orchestrator.state() {
    FetchState::Idle => render_welcome(frame, app.theme(), area),
    FetchState::Loading => render_loader(frame, app, area),
    // Empty and failed results leave the area blank; the toast says why.
    FetchState::Loaded(_) | FetchState::Failed(_) => {}
  }
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▶  Welcome to reel", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Search The Movie Database from your terminal.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Type a title below and press Enter.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

fn render_loader(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let query = app.orchestrator.query().map_or("", |q| q.as_str());
  let [row] = Layout::vertical([Constraint::Length(1)]).flex(Flex::Center).areas(area);
  let line = Line::from(vec![
    Span::styled(format!("{} ", spinner_frame(app)), Style::default().fg(theme.accent)),
    Span::styled(format!("Searching for '{}'…", query), Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), row);
}

fn render_grid(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let c = constants();
  let card_w = c.card_width.max(CARD_CHROME);
  let poster_rows = c.card_poster_rows.min(area.height.saturating_sub(CARD_CHROME));
  let card_h = poster_rows + CARD_CHROME;

  let columns = usize::from((area.width / card_w).max(1));
  let visible_rows = usize::from((area.height / card_h).max(1));
  app.grid_columns = columns;

  let results = app.orchestrator.visible_results();
  let cursor = app.grid_cursor.min(results.len().saturating_sub(1));
  let cursor_row = cursor / columns;
  if cursor_row < app.grid_scroll {
    app.grid_scroll = cursor_row;
  } else if cursor_row >= app.grid_scroll + visible_rows {
    app.grid_scroll = cursor_row + 1 - visible_rows;
  }

  let used_w = card_w.saturating_mul(columns as u16).min(area.width);
  let x0 = area.x + (area.width - used_w) / 2;
  let highlight = app.mode != AppMode::Input;

  let first = app.grid_scroll * columns;
  let last = ((app.grid_scroll + visible_rows) * columns).min(results.len());
  for (offset, movie) in results[first.min(last)..last].iter().enumerate() {
    let index = first + offset;
    let row = (offset / columns) as u16;
    let col = (offset % columns) as u16;
    let card = Rect { x: x0 + col * card_w, y: area.y + row * card_h, width: card_w.min(area.width), height: card_h }
      .intersection(area);
    if card.is_empty() {
      continue;
    }

    let selected = highlight && index == cursor;
    let border = if selected { theme.highlight_bg } else { theme.border };
    let block = Block::bordered()
      .border_type(BorderType::Rounded)
      .border_style(Style::default().fg(border))
      .style(Style::default().bg(theme.card_bg));
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let [poster_area, title_area, meta_area] =
      Layout::vertical([Constraint::Length(poster_rows), Constraint::Length(1), Constraint::Length(1)]).areas(inner);

    let key = movie.poster_path.as_ref().map(|path| PosterKey { path: path.clone(), size: PosterSize::Grid });
    let image = match &key {
      Some(key) => app.posters.fitted(key, poster_area, app.display_mode),
      None => None,
    };
    let widget = PosterWidget { image, mode: app.display_mode, placeholder: Style::default().fg(theme.border) };
    frame.render_widget(widget, poster_area);

    let width = usize::from(inner.width);
    let title_style = if selected {
      Style::default().fg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)
    };
    frame.render_widget(Span::styled(truncate_str(movie.display_title(), width), title_style), title_area);
    frame.render_widget(card_meta_line(movie, width, theme), meta_area);
  }
}

/// "1999        ★ 8.7", with the rating pushed to the right edge.
fn card_meta_line(movie: &Movie, width: usize, theme: &Theme) -> Line<'static> {
  let year = movie.year().map(|y| y.to_string()).unwrap_or_default();
  let rating = movie.rating_short().unwrap_or_default();
  let gap = width.saturating_sub(year.chars().count() + rating.chars().count());
  Line::from(vec![
    Span::styled(year, Style::default().fg(theme.muted)),
    Span::raw(" ".repeat(gap)),
    Span::styled(rating, Style::default().fg(theme.rating)),
  ])
}

/// "← 1 … 8 9 [10] 11 12 … 20 →"
fn page_bar_spans(current: u32, total: u32, theme: &Theme) -> Vec<Span<'static>> {
  let arrow = |enabled: bool| Style::default().fg(if enabled { theme.fg } else { theme.muted });
  let mut spans = vec![Span::styled("←", arrow(current > 1))];
  for slot in page_slots(current, total) {
    spans.push(Span::raw(" "));
    match slot {
      PageSlot::Page(n) if n == current => spans.push(Span::styled(
        format!("[{}]", n),
        Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD),
      )),
      PageSlot::Page(n) => spans.push(Span::styled(n.to_string(), Style::default().fg(theme.fg))),
      PageSlot::Gap => spans.push(Span::styled("…", Style::default().fg(theme.muted))),
    }
  }
  spans.push(Span::raw(" "));
  spans.push(Span::styled("→", arrow(current < total)));
  spans
}

fn render_page_bar(frame: &mut Frame, app: &App, area: Rect) {
  if !app.orchestrator.can_paginate() {
    return;
  }
  let Some(page) = app.orchestrator.visible_page() else { return };
  let theme = app.theme();
  let current = app.orchestrator.page().get();

  let mut spans = vec![Span::raw(" ")];
  spans.extend(page_bar_spans(current, page.total_pages, theme));
  frame.render_widget(Line::from(spans), area);

  let summary = format!("page {} of {} · {} results ", current, page.total_pages, page.total_results);
  render_right(frame, area, &summary, Style::default().fg(theme.muted));
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let line = if let Some(toast) = app.toasts.latest() {
    let mut spans = vec![Span::styled(format!(" ⚠  {}", toast.notice.message()), Style::default().fg(theme.error))];
    for older in app.toasts.iter().skip(1) {
      spans.push(Span::styled(format!("  · {}", older.notice.message()), Style::default().fg(theme.muted)));
    }
    Line::from(spans)
  } else if let Some(status) = app.status_text() {
    let prefix = if app.orchestrator.is_loading() { spinner_frame(app) } else { "✓" };
    Line::from(Span::styled(format!(" {} {}", prefix, status), Style::default().fg(theme.status)))
  } else {
    Line::from(Span::styled(" Ready", Style::default().fg(theme.muted)))
  };
  frame.render_widget(line, area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search movies ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = usize::from(area.width.saturating_sub(4));
  let (visible, cursor_col) = app.input.viewport(inner_w);

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + cursor_col as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  let has_results = !app.results().is_empty();
  let failed = matches!(app.orchestrator.state(), FetchState::Failed(_));
  match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Search"), ("^t", "Theme")];
      if failed {
        k.push(("^r", "Retry"));
      }
      if has_results {
        k.push(("↓", "Results"));
      } else {
        k.push(("Esc", "Quit"));
      }
      k
    }
    AppMode::Grid => {
      let mut k = vec![("Enter", "Details"), ("←↑↓→", "Move")];
      if app.orchestrator.can_paginate() {
        k.push(("n/p", "Page"));
        k.push(("g/G", "First/Last"));
      }
      k.push(("r", "Reload"));
      k.push(("/", "Search"));
      k.push(("q", "Quit"));
      k
    }
    AppMode::Detail => vec![("Esc", "Close"), ("^t", "Theme")],
  }
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
  render_right(frame, area, &format!("{} ", theme.name), Style::default().fg(theme.muted));
}

// --- Detail Overlay ---

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center).areas(area);
  let [cell] = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center).areas(row);
  cell
}

fn render_detail(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  let Some(movie) = app.orchestrator.selection().cloned() else { return };

  let area = centered(frame.area(), 80, 80);
  frame.render_widget(Clear, area);
  let block = Block::bordered()
    .title(Span::styled(
      format!(" {} ", movie.display_title()),
      Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
    ))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.highlight_bg))
    .style(Style::default().bg(theme.bg));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  // Posters are 2:3 and a cell is roughly twice as tall as it is wide.
  let poster_w = (inner.height.saturating_mul(4) / 3).min(inner.width / 2);
  let [poster_area, info_area] =
    Layout::horizontal([Constraint::Length(poster_w), Constraint::Min(10)]).areas(inner);

  render_detail_poster(frame, app, &movie, poster_area);

  let info = Paragraph::new(detail_lines(&movie, theme))
    .wrap(Wrap { trim: true })
    .block(Block::default().padding(Padding::new(2, 1, 1, 0)));
  frame.render_widget(info, info_area);
}

fn render_detail_poster(frame: &mut Frame, app: &mut App, movie: &Movie, area: Rect) {
  let theme = app.theme();
  let placeholder = Style::default().fg(theme.border);
  let Some(path) = movie.poster_path.clone() else {
    frame.render_widget(PosterWidget { image: None, mode: app.display_mode, placeholder }, area);
    return;
  };

  let detail = PosterKey { path: path.clone(), size: PosterSize::Detail };
  if app.display_mode.uses_graphics_protocol() && app.posters.contains(&detail) {
    // Drawn out of band after the frame is flushed.
    app.gfx.poster_area = Some(area);
    return;
  }

  let grid = PosterKey { path, size: PosterSize::Grid };
  let key = if app.posters.contains(&detail) { detail } else { grid };
  let image = app.posters.fitted(&key, area, app.display_mode);
  frame.render_widget(PosterWidget { image, mode: app.display_mode, placeholder }, area);
}

fn detail_lines(movie: &Movie, theme: &Theme) -> Vec<Line<'static>> {
  let label = |s: &'static str| Span::styled(s, Style::default().fg(theme.muted));
  let value = |s: String| Span::styled(s, Style::default().fg(theme.fg));

  let mut lines = vec![Line::from(Span::styled(
    movie.display_title().to_string(),
    Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
  ))];
  if let Some(alt) = movie.alternate_title() {
    lines.push(Line::from(Span::styled(
      alt.to_string(),
      Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
    )));
  }
  lines.push(Line::from(""));

  lines.push(Line::from(vec![
    label("Released  "),
    value(movie.release_date_long().unwrap_or_else(|| "Unknown".to_string())),
  ]));
  let rating = match movie.rating_long() {
    Some(r) => Span::styled(r, Style::default().fg(theme.rating)),
    None => Span::styled("Not rated", Style::default().fg(theme.muted)),
  };
  lines.push(Line::from(vec![label("Rating    "), rating]));
  if let Some(lang) = &movie.original_language {
    lines.push(Line::from(vec![label("Language  "), value(lang.to_uppercase())]));
  }
  lines.push(Line::from(""));

  match &movie.overview {
    Some(overview) => lines.push(Line::from(value(overview.clone()))),
    None => lines.push(Line::from(Span::styled(
      "No overview available.",
      Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
    ))),
  }
  lines
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::SearchOutcome;
  use crate::config::{Config, Settings};
  use crate::display::DisplayMode;
  use crate::error::FetchError;
  use crate::model::{Query, ResultPage};
  use crate::theme::THEMES;
  use crate::tmdb::TmdbClient;
  use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};
  use std::time::Duration;

  fn app() -> App {
    let settings = Settings {
      api_base_url: "http://127.0.0.1:9".to_string(),
      image_base_url: "http://127.0.0.1:9".to_string(),
      token: "t".to_string(),
      timeout: Duration::from_millis(200),
    };
    App::new(TmdbClient::new(&settings).unwrap(), &Config::default(), DisplayMode::Ascii, false)
  }

  fn movie(id: u64, title: &str) -> Movie {
    Movie {
      id,
      title: Some(title.to_string()),
      original_title: None,
      original_language: Some("en".to_string()),
      poster_path: None,
      overview: None,
      release_date: Some("1979-05-25".to_string()),
      vote_average: Some(8.2),
      vote_count: Some(14000),
    }
  }

  fn load(app: &mut App, results: Vec<Movie>, total_pages: u32) {
    let ticket = app.orchestrator.submit(Query::parse("alien").unwrap());
    let total_results = results.len() as u64;
    let page = ResultPage { page: 1, results, total_pages, total_results };
    app.apply_search_outcome(SearchOutcome { generation: ticket.generation, result: Ok(page) });
  }

  fn draw(app: &mut App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
    terminal.draw(|frame| ui(frame, app)).unwrap();
    buffer_text(terminal.backend().buffer())
  }

  fn buffer_text(buf: &Buffer) -> String {
    let area = buf.area;
    (area.top()..area.bottom())
      .map(|y| (area.left()..area.right()).map(|x| buf[(x, y)].symbol()).collect::<String>())
      .collect::<Vec<_>>()
      .join("\n")
  }

  fn plain(spans: &[Span]) -> String {
    spans.iter().map(|s| s.content.as_ref()).collect()
  }

  #[test]
  fn truncate_appends_ellipsis() {
    assert_eq!(truncate_str("Alien", 10), "Alien");
    assert_eq!(truncate_str("The Empire Strikes Back", 10), "The Empir…");
  }

  #[test]
  fn page_bar_brackets_current_page() {
    let text = plain(&page_bar_spans(10, 20, &THEMES[0]));
    assert_eq!(text, "← 1 … 8 9 [10] 11 12 … 20 →");
  }

  #[test]
  fn card_meta_pushes_rating_right() {
    let line = card_meta_line(&movie(1, "Alien"), 16, &THEMES[0]);
    let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
    assert_eq!(text, "1979       ★ 8.2");
  }

  #[test]
  fn idle_screen_shows_welcome() {
    let mut app = app();
    let screen = draw(&mut app);
    assert!(screen.contains("Welcome to reel"));
    assert!(screen.contains("Search movies"));
    assert!(screen.contains("Ready"));
  }

  #[test]
  fn loaded_page_draws_cards_and_page_bar() {
    let mut app = app();
    load(&mut app, vec![movie(1, "Alien"), movie(2, "Aliens")], 3);
    let screen = draw(&mut app);
    assert!(screen.contains("Alien"));
    assert!(screen.contains("Aliens"));
    assert!(screen.contains("[1]"));
    assert!(screen.contains("page 1 of 3 · 2 results"));
    assert!(app.grid_columns >= 2);
  }

  #[test]
  fn single_page_hides_page_bar() {
    let mut app = app();
    load(&mut app, vec![movie(1, "Alien")], 1);
    let screen = draw(&mut app);
    assert!(!screen.contains("page 1 of 1"));
  }

  #[test]
  fn failure_shows_toast_and_no_cards() {
    let mut app = app();
    let ticket = app.orchestrator.submit(Query::parse("alien").unwrap());
    app.apply_search_outcome(SearchOutcome { generation: ticket.generation, result: Err(FetchError::new("HTTP 500")) });
    let screen = draw(&mut app);
    assert!(screen.contains("Something went wrong - try again later"));
    assert!(!screen.contains("Welcome to reel"));
    assert!(screen.contains("Retry"));
  }

  #[test]
  fn detail_overlay_lists_movie_facts() {
    let mut app = app();
    load(&mut app, vec![movie(1, "Alien")], 1);
    app.open_detail();
    let screen = draw(&mut app);
    assert!(screen.contains("May 25, 1979"));
    assert!(screen.contains("8.2/10 · 14,000 votes"));
    assert!(screen.contains("No overview available."));
    assert!(app.gfx.poster_area.is_none());
  }
}
