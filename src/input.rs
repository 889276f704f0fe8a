use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppMode};

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Grid => handle_grid_key(app, key),
    AppMode::Detail => handle_detail_key(app, key),
  }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('w') | KeyCode::Backspace => app.input.delete_word(),
      KeyCode::Char('u') => app.input.clear(),
      KeyCode::Char('a') => app.input.home(),
      KeyCode::Char('e') => app.input.end(),
      KeyCode::Char('r') => app.reload(),
      _ => {}
    }
    return;
  }

  match key.code {
    KeyCode::Enter => app.submit_search(),
    KeyCode::Char(c) => app.input.insert(c),
    KeyCode::Backspace => app.input.backspace(),
    KeyCode::Delete => app.input.delete(),
    KeyCode::Left => app.input.left(),
    KeyCode::Right => app.input.right(),
    KeyCode::Home => app.input.home(),
    KeyCode::End => app.input.end(),
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
      } else if !app.results().is_empty() {
        app.enter_grid();
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down | KeyCode::Tab => app.enter_grid(),
    _ => {}
  }
}

fn handle_grid_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Enter => app.open_detail(),
    KeyCode::Left | KeyCode::Char('h') => app.move_cursor(-1, 0),
    KeyCode::Right | KeyCode::Char('l') => app.move_cursor(1, 0),
    KeyCode::Up | KeyCode::Char('k') => app.move_cursor(0, -1),
    KeyCode::Down | KeyCode::Char('j') => app.move_cursor(0, 1),
    KeyCode::Char('n') | KeyCode::Char(']') | KeyCode::PageDown => app.next_page(),
    KeyCode::Char('p') | KeyCode::Char('[') | KeyCode::PageUp => app.prev_page(),
    KeyCode::Char('g') | KeyCode::Home => app.first_page(),
    KeyCode::Char('G') | KeyCode::End => app.last_page(),
    KeyCode::Char('r') => app.reload(),
    KeyCode::Char('x') => app.toasts.dismiss_all(),
    KeyCode::Char('/') | KeyCode::Esc | KeyCode::Tab => app.mode = AppMode::Input,
    KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Backspace => app.close_detail(),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::SearchOutcome;
  use crate::config::{Config, Settings};
  use crate::display::DisplayMode;
  use crate::model::{Movie, Query, ResultPage};
  use crate::notify::Notice;
  use crate::tmdb::TmdbClient;
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

  fn press(app: &mut App, code: KeyCode) {
    handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
  }

  fn type_str(app: &mut App, s: &str) {
    for c in s.chars() {
      press(app, KeyCode::Char(c));
    }
  }

  fn loaded(app: &mut App, count: u64, total_pages: u32) {
    let ticket = app.orchestrator.submit(Query::parse("batman").unwrap());
    let results = (0..count)
      .map(|id| Movie {
        id,
        title: Some(format!("Batman {}", id)),
        original_title: None,
        original_language: None,
        poster_path: None,
        overview: None,
        release_date: None,
        vote_average: None,
        vote_count: None,
      })
      .collect();
    let page = ResultPage { page: 1, results, total_pages, total_results: count };
    app.apply_search_outcome(SearchOutcome { generation: ticket.generation, result: Ok(page) });
  }

  #[test]
  fn typing_edits_the_search_field() {
    let mut app = app();
    type_str(&mut app, "alien");
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Home);
    press(&mut app, KeyCode::Delete);
    assert_eq!(app.input.text(), "lie");
  }

  #[test]
  fn ctrl_w_deletes_previous_word() {
    let mut app = app();
    type_str(&mut app, "the dark knight");
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL));
    assert_eq!(app.input.text(), "the dark ");
  }

  #[test]
  fn enter_on_blank_field_shows_validation_notice() {
    let mut app = app();
    type_str(&mut app, "   ");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.toasts.latest().map(|t| t.notice), Some(Notice::EmptyQuery));
    assert_eq!(app.orchestrator.generation(), 0);
  }

  #[tokio::test]
  async fn enter_submits_trimmed_query() {
    let mut app = app();
    type_str(&mut app, "  batman ");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.orchestrator.query().map(|q| q.as_str()), Some("batman"));
    assert!(app.orchestrator.is_loading());
    assert_eq!(app.input.text(), "  batman ");
  }

  #[test]
  fn esc_clears_then_quits() {
    let mut app = app();
    type_str(&mut app, "x");
    press(&mut app, KeyCode::Esc);
    assert!(app.input.is_empty());
    assert!(!app.should_quit);
    press(&mut app, KeyCode::Esc);
    assert!(app.should_quit);
  }

  #[test]
  fn ctrl_c_quits_from_any_mode() {
    let mut app = app();
    app.mode = AppMode::Detail;
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn grid_keys_move_and_open_detail() {
    let mut app = app();
    loaded(&mut app, 6, 1);
    assert_eq!(app.mode, AppMode::Grid);
    app.grid_columns = 3;

    press(&mut app, KeyCode::Char('l'));
    press(&mut app, KeyCode::Char('j'));
    assert_eq!(app.grid_cursor, 4);

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.mode, AppMode::Detail);
    assert_eq!(app.orchestrator.selection().map(|m| m.id), Some(4));

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, AppMode::Grid);
    assert!(app.orchestrator.selection().is_none());
  }

  #[tokio::test]
  async fn page_keys_request_neighbouring_pages() {
    let mut app = app();
    loaded(&mut app, 20, 5);
    let before = app.orchestrator.generation();

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.orchestrator.page().get(), 2);
    assert_eq!(app.orchestrator.generation(), before + 1);
    // Page 1 stays on screen while page 2 loads.
    assert_eq!(app.results().len(), 20);

    press(&mut app, KeyCode::Char('G'));
    assert_eq!(app.orchestrator.page().get(), 5);
  }

  #[tokio::test]
  async fn single_page_results_ignore_page_keys() {
    let mut app = app();
    loaded(&mut app, 3, 1);
    let before = app.orchestrator.generation();
    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::Char('p'));
    assert_eq!(app.orchestrator.generation(), before);
    assert_eq!(app.orchestrator.page().get(), 1);
  }

  #[tokio::test]
  async fn slash_returns_to_search_field() {
    let mut app = app();
    loaded(&mut app, 2, 1);
    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.mode, AppMode::Input);
    press(&mut app, KeyCode::Down);
    assert_eq!(app.mode, AppMode::Grid);
  }
}
