use image::DynamicImage;
use ratatui::layout::Rect;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::display::DisplayMode;
use crate::error::FetchError;
use crate::graphics::fit_poster;
use crate::model::{Movie, ResultPage};
use crate::notify::Toasts;
use crate::orchestrator::{FetchState, FetchTicket, Orchestrator};
use crate::search_input::SearchInput;
use crate::theme::{THEMES, Theme, theme_index};
use crate::tmdb::{PosterImage, PosterSize, TmdbClient, fetch_posters};

// --- Types ---

/// Completion of a search task, tagged with the ticket generation it was
/// issued under.
#[derive(Debug)]
pub struct SearchOutcome {
  pub generation: u64,
  pub result: Result<ResultPage, FetchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Typing in the search field.
  Input,
  /// Moving the cursor over result cards / paging.
  Grid,
  /// Detail overlay for the selected movie.
  Detail,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PosterKey {
  pub path: String,
  pub size: PosterSize,
}

/// Decoded posters for what's on screen, plus resized variants per cell area.
#[derive(Default)]
pub struct PosterCache {
  images: HashMap<PosterKey, DynamicImage>,
  fitted: HashMap<(PosterKey, u16, u16, bool), DynamicImage>,
}

impl PosterCache {
  pub fn insert(&mut self, key: PosterKey, image: DynamicImage) {
    self.fitted.retain(|(k, ..), _| *k != key);
    self.images.insert(key, image);
  }

  pub fn contains(&self, key: &PosterKey) -> bool {
    self.images.contains_key(key)
  }

  pub fn get(&self, key: &PosterKey) -> Option<&DynamicImage> {
    self.images.get(key)
  }

  /// Poster resized to cover `area` in `mode`; computed once per size.
  pub fn fitted(&mut self, key: &PosterKey, area: Rect, mode: DisplayMode) -> Option<&DynamicImage> {
    let ascii = mode.cell_mode() == DisplayMode::Ascii;
    let fitted_key = (key.clone(), area.width, area.height, ascii);
    if !self.fitted.contains_key(&fitted_key) {
      let original = self.images.get(key)?;
      self.fitted.insert(fitted_key.clone(), fit_poster(original, area, mode));
    }
    self.fitted.get(&fitted_key)
  }

  /// Keep only posters whose key is in `keep`. Posters are never held beyond
  /// the page and selection on screen.
  pub fn retain(&mut self, keep: &HashSet<PosterKey>) {
    self.images.retain(|k, _| keep.contains(k));
    self.fitted.retain(|(k, ..), _| keep.contains(k));
  }

  pub fn len(&self) -> usize {
    self.images.len()
  }
}

/// Kitty overlay placement state.
#[derive(Default)]
pub struct GraphicsState {
  /// Where the overlay poster was laid out this frame (set by the renderer).
  pub poster_area: Option<Rect>,
  /// Last (poster path, area) transmitted, to avoid re-sending every frame.
  pub last_sent: Option<(String, Rect)>,
}

/// In-flight async task receivers and handles.
pub(crate) struct AsyncTasks {
  search_tx: mpsc::UnboundedSender<SearchOutcome>,
  search_rx: mpsc::UnboundedReceiver<SearchOutcome>,
  poster_rx: Option<mpsc::Receiver<PosterImage>>,
  poster_handle: Option<JoinHandle<()>>,
  detail_rx: Option<oneshot::Receiver<Option<PosterImage>>>,
}

impl AsyncTasks {
  fn new() -> Self {
    let (search_tx, search_rx) = mpsc::unbounded_channel();
    Self { search_tx, search_rx, poster_rx: None, poster_handle: None, detail_rx: None }
  }
}

pub struct App {
  pub input: SearchInput,
  pub orchestrator: Orchestrator,
  pub toasts: Toasts,
  pub mode: AppMode,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  /// Index of the highlighted card within the visible results.
  pub grid_cursor: usize,
  /// First card row drawn; maintained by the renderer.
  pub grid_scroll: usize,
  /// Cards per row in the last frame; used for up/down navigation.
  pub grid_columns: usize,
  pub posters: PosterCache,
  pub gfx: GraphicsState,
  pub should_quit: bool,
  /// App start instant, drives the loading spinner.
  pub started_at: Instant,
  client: TmdbClient,
  pub(crate) tasks: AsyncTasks,
}

impl App {
  pub fn new(client: TmdbClient, config: &Config, display_mode: DisplayMode, clear_on_submit: bool) -> Self {
    Self {
      input: SearchInput::new(clear_on_submit || config.clear_on_submit.unwrap_or(false)),
      orchestrator: Orchestrator::new(),
      toasts: Toasts::default(),
      mode: AppMode::Input,
      theme_index: theme_index(config.theme_name.as_deref()),
      display_mode,
      grid_cursor: 0,
      grid_scroll: 0,
      grid_columns: 1,
      posters: PosterCache::default(),
      gfx: GraphicsState::default(),
      should_quit: false,
      started_at: Instant::now(),
      client,
      tasks: AsyncTasks::new(),
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index comes from theme_index() or modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    let mut config = Config::load();
    config.theme_name = Some(self.theme().name.to_string());
    config.save();
  }

  pub fn results(&self) -> &[Movie] {
    self.orchestrator.visible_results()
  }

  // --- Search ---

  /// Validate the search field and, if it holds a query, start page 1.
  pub fn submit_search(&mut self) {
    match self.input.submit() {
      Err(notice) => self.toasts.push(notice),
      Ok(query) => {
        let ticket = self.orchestrator.submit(query);
        self.grid_cursor = 0;
        self.grid_scroll = 0;
        self.spawn_search(ticket);
      }
    }
  }

  pub fn next_page(&mut self) {
    if let Some(ticket) = self.orchestrator.next_page() {
      self.spawn_search(ticket);
    }
  }

  pub fn prev_page(&mut self) {
    if let Some(ticket) = self.orchestrator.prev_page() {
      self.spawn_search(ticket);
    }
  }

  pub fn first_page(&mut self) {
    if let Some(ticket) = self.orchestrator.first_page() {
      self.spawn_search(ticket);
    }
  }

  pub fn last_page(&mut self) {
    if let Some(ticket) = self.orchestrator.last_page() {
      self.spawn_search(ticket);
    }
  }

  pub fn reload(&mut self) {
    if let Some(ticket) = self.orchestrator.reload() {
      self.spawn_search(ticket);
    }
  }

  fn spawn_search(&mut self, ticket: FetchTicket) {
    let client = self.client.clone();
    let tx = self.tasks.search_tx.clone();
    tokio::spawn(async move {
      let result = client.search_movies(&ticket.query, ticket.page).await;
      let _ = tx.send(SearchOutcome { generation: ticket.generation, result });
    });
  }

  /// Hand a finished search to the orchestrator and react to what it did.
  pub fn apply_search_outcome(&mut self, outcome: SearchOutcome) {
    let current = outcome.generation == self.orchestrator.generation() && self.orchestrator.is_loading();
    if let Some(notice) = self.orchestrator.resolve(outcome.generation, outcome.result) {
      self.toasts.push(notice);
    }
    if !current {
      return;
    }

    self.grid_cursor = 0;
    self.grid_scroll = 0;
    let has_results = matches!(self.orchestrator.state(), FetchState::Loaded(page) if !page.is_empty());
    if has_results {
      if self.mode == AppMode::Input {
        self.mode = AppMode::Grid;
      }
      self.retain_visible_posters();
      self.trigger_poster_prefetch();
    } else {
      self.cancel_poster_prefetch();
      self.retain_visible_posters();
      if self.mode == AppMode::Grid {
        self.mode = AppMode::Input;
      }
    }
  }

  // --- Posters ---

  fn cancel_poster_prefetch(&mut self) {
    if let Some(handle) = self.tasks.poster_handle.take() {
      handle.abort();
    }
    self.tasks.poster_rx = None;
  }

  fn visible_poster_keys(&self) -> HashSet<PosterKey> {
    let mut keys: HashSet<PosterKey> = self
      .results()
      .iter()
      .filter_map(|m| m.poster_path.clone())
      .map(|path| PosterKey { path, size: PosterSize::Grid })
      .collect();
    if let Some(path) = self.orchestrator.selection().and_then(|m| m.poster_path.clone()) {
      keys.insert(PosterKey { path: path.clone(), size: PosterSize::Detail });
      keys.insert(PosterKey { path, size: PosterSize::Grid });
    }
    keys
  }

  fn retain_visible_posters(&mut self) {
    let keep = self.visible_poster_keys();
    self.posters.retain(&keep);
  }

  /// Download grid posters for the page on screen in the background.
  fn trigger_poster_prefetch(&mut self) {
    self.cancel_poster_prefetch();

    let paths: Vec<String> = self
      .results()
      .iter()
      .filter_map(|m| m.poster_path.clone())
      .filter(|path| !self.posters.contains(&PosterKey { path: path.clone(), size: PosterSize::Grid }))
      .collect();
    if paths.is_empty() {
      return;
    }

    debug!(count = paths.len(), "posters: prefetching grid posters");
    let client = self.client.clone();
    let (tx, rx) = mpsc::channel(32);
    let handle = tokio::spawn(async move {
      fetch_posters(&client, paths, PosterSize::Grid, tx).await;
    });
    self.tasks.poster_rx = Some(rx);
    self.tasks.poster_handle = Some(handle);
  }

  fn trigger_detail_poster(&mut self) {
    self.tasks.detail_rx = None;
    let Some(path) = self.orchestrator.selection().and_then(|m| m.poster_path.clone()) else { return };
    if self.posters.contains(&PosterKey { path: path.clone(), size: PosterSize::Detail }) {
      return;
    }

    let client = self.client.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let image = match client.fetch_poster(&path, PosterSize::Detail).await {
        Ok(image) => Some(PosterImage { path, size: PosterSize::Detail, image }),
        Err(e) => {
          warn!(err = %e, "posters: detail poster unavailable");
          None
        }
      };
      let _ = tx.send(image);
    });
    self.tasks.detail_rx = Some(rx);
  }

  fn store_poster(&mut self, poster: PosterImage) {
    let key = PosterKey { path: poster.path, size: poster.size };
    if self.visible_poster_keys().contains(&key) {
      self.posters.insert(key, poster.image);
    }
  }

  // --- Selection ---

  pub fn open_detail(&mut self) {
    if self.orchestrator.select_index(self.grid_cursor) {
      self.mode = AppMode::Detail;
      self.trigger_detail_poster();
    }
  }

  pub fn close_detail(&mut self) {
    self.orchestrator.close();
    self.tasks.detail_rx = None;
    self.gfx.poster_area = None;
    self.mode = if self.results().is_empty() { AppMode::Input } else { AppMode::Grid };
  }

  /// Move the card cursor by `dx` columns and `dy` rows, clamped to the results.
  pub fn move_cursor(&mut self, dx: isize, dy: isize) {
    let count = self.results().len();
    if count == 0 {
      return;
    }
    let cols = self.grid_columns.max(1) as isize;
    let target = self.grid_cursor as isize + dx + dy * cols;
    self.grid_cursor = target.clamp(0, count as isize - 1) as usize;
  }

  pub fn enter_grid(&mut self) {
    if !self.results().is_empty() {
      self.grid_cursor = self.grid_cursor.min(self.results().len() - 1);
      self.mode = AppMode::Grid;
    }
  }

  // --- Polling ---

  /// Drain finished background work and expire toasts. Called once per tick.
  pub fn check_pending(&mut self) {
    while let Ok(outcome) = self.tasks.search_rx.try_recv() {
      self.apply_search_outcome(outcome);
    }

    let mut arrived = Vec::new();
    if let Some(ref mut rx) = self.tasks.poster_rx {
      while let Ok(poster) = rx.try_recv() {
        arrived.push(poster);
      }
    }

    if let Some(mut rx) = self.tasks.detail_rx.take() {
      match rx.try_recv() {
        Ok(Some(poster)) => arrived.push(poster),
        Ok(None) => {}
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.detail_rx = Some(rx),
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }

    for poster in arrived {
      self.store_poster(poster);
    }

    if !self.toasts.is_empty() {
      self.toasts.expire();
    }
  }

  /// One-line status for the area above the input.
  pub fn status_text(&self) -> Option<String> {
    let query = self.orchestrator.query()?;
    match self.orchestrator.state() {
      FetchState::Loading if self.orchestrator.page().get() > 1 => {
        Some(format!("Searching '{}' (page {})…", query, self.orchestrator.page()))
      }
      FetchState::Loading => Some(format!("Searching '{}'…", query)),
      FetchState::Loaded(page) if !page.is_empty() => {
        let noun = if page.total_results == 1 { "result" } else { "results" };
        Some(format!("{} {} for '{}'", page.total_results, noun, query))
      }
      _ => None,
    }
  }

  pub fn log_summary(&self) {
    let failure = match self.orchestrator.state() {
      FetchState::Failed(reason) => Some(reason.as_str()),
      _ => None,
    };
    info!(
      failure = ?failure,
      query = ?self.orchestrator.query().map(|q| q.as_str().to_string()),
      page = self.orchestrator.page().get(),
      cached_posters = self.posters.len(),
      pending_toasts = self.toasts.len(),
      "session ended"
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Settings;
  use crate::model::Query;
  use crate::notify::Notice;
  use std::time::Duration;

  fn app() -> App {
    let settings = Settings {
      api_base_url: "http://127.0.0.1:9".to_string(),
      image_base_url: "http://127.0.0.1:9".to_string(),
      token: "t".to_string(),
      timeout: Duration::from_millis(200),
    };
    let client = TmdbClient::new(&settings).unwrap();
    App::new(client, &Config::default(), DisplayMode::Ascii, false)
  }

  fn movies(n: usize) -> Vec<Movie> {
    (0..n)
      .map(|i| Movie {
        id: i as u64,
        title: Some(format!("Movie {}", i)),
        original_title: None,
        original_language: None,
        poster_path: None,
        overview: None,
        release_date: None,
        vote_average: None,
        vote_count: None,
      })
      .collect()
  }

  fn page(n: usize, total_pages: u32) -> ResultPage {
    ResultPage { page: 1, results: movies(n), total_pages, total_results: n as u64 }
  }

  fn notices(app: &App) -> Vec<Notice> {
    app.toasts.iter().map(|t| t.notice).collect()
  }

  #[test]
  fn blank_submit_toasts_and_issues_nothing() {
    let mut app = app();
    app.input.insert(' ');
    app.submit_search();
    assert_eq!(notices(&app), vec![Notice::EmptyQuery]);
    assert_eq!(app.orchestrator.generation(), 0);
    assert_eq!(app.orchestrator.state(), &FetchState::Idle);
  }

  #[tokio::test]
  async fn current_empty_outcome_toasts_no_results_once() {
    let mut app = app();
    let ticket = app.orchestrator.submit(Query::parse("xyzzynotamovie").unwrap());
    app.apply_search_outcome(SearchOutcome { generation: ticket.generation, result: Ok(page(0, 0)) });
    assert_eq!(notices(&app), vec![Notice::NoResults]);
    assert!(app.results().is_empty());
  }

  #[tokio::test]
  async fn stale_outcome_changes_nothing() {
    let mut app = app();
    let old = app.orchestrator.submit(Query::parse("batman").unwrap());
    let new = app.orchestrator.submit(Query::parse("superman").unwrap());
    app.apply_search_outcome(SearchOutcome { generation: new.generation, result: Ok(page(3, 1)) });
    app.apply_search_outcome(SearchOutcome { generation: old.generation, result: Err(FetchError::new("late")) });
    assert!(notices(&app).is_empty());
    assert_eq!(app.results().len(), 3);
  }

  #[tokio::test]
  async fn failure_toasts_and_leaves_grid_mode() {
    let mut app = app();
    let ticket = app.orchestrator.submit(Query::parse("batman").unwrap());
    app.mode = AppMode::Grid;
    app.apply_search_outcome(SearchOutcome { generation: ticket.generation, result: Err(FetchError::new("503")) });
    assert_eq!(notices(&app), vec![Notice::FetchFailed]);
    assert_eq!(app.mode, AppMode::Input);
  }

  #[tokio::test]
  async fn cursor_moves_within_results() {
    let mut app = app();
    let ticket = app.orchestrator.submit(Query::parse("batman").unwrap());
    app.apply_search_outcome(SearchOutcome { generation: ticket.generation, result: Ok(page(7, 1)) });
    app.grid_columns = 3;

    app.move_cursor(1, 0);
    assert_eq!(app.grid_cursor, 1);
    app.move_cursor(0, 1);
    assert_eq!(app.grid_cursor, 4);
    app.move_cursor(0, 1);
    assert_eq!(app.grid_cursor, 6);
    app.move_cursor(-10, 0);
    assert_eq!(app.grid_cursor, 0);
  }

  #[tokio::test]
  async fn detail_open_and_close_keep_results() {
    let mut app = app();
    let ticket = app.orchestrator.submit(Query::parse("batman").unwrap());
    app.apply_search_outcome(SearchOutcome { generation: ticket.generation, result: Ok(page(4, 1)) });
    app.enter_grid();
    app.move_cursor(2, 0);

    app.open_detail();
    assert_eq!(app.mode, AppMode::Detail);
    assert_eq!(app.orchestrator.selection().map(|m| m.id), Some(2));

    app.close_detail();
    assert_eq!(app.mode, AppMode::Grid);
    assert!(app.orchestrator.selection().is_none());
    assert_eq!(app.results().len(), 4);
  }

  #[test]
  fn status_text_follows_state() {
    let mut app = app();
    assert_eq!(app.status_text(), None);
    let ticket = app.orchestrator.submit(Query::parse("alien").unwrap());
    assert_eq!(app.status_text().as_deref(), Some("Searching 'alien'…"));
    app.orchestrator.resolve(ticket.generation, Ok(page(1, 1)));
    assert_eq!(app.status_text().as_deref(), Some("1 result for 'alien'"));
  }

  #[test]
  fn poster_cache_keeps_only_requested_keys() {
    let mut cache = PosterCache::default();
    let a = PosterKey { path: "/a.jpg".into(), size: PosterSize::Grid };
    let b = PosterKey { path: "/b.jpg".into(), size: PosterSize::Grid };
    cache.insert(a.clone(), DynamicImage::new_rgb8(10, 15));
    cache.insert(b.clone(), DynamicImage::new_rgb8(10, 15));

    let fitted = cache.fitted(&a, Rect::new(0, 0, 4, 3), DisplayMode::Direct).unwrap();
    assert_eq!((fitted.width(), fitted.height()), (4, 6));

    cache.retain(&HashSet::from([a.clone()]));
    assert!(cache.contains(&a));
    assert!(!cache.contains(&b));
    assert_eq!(cache.len(), 1);
  }
}
