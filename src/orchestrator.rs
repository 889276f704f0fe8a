//! Search orchestration: owns the active query, the current page, the
//! selection and the fetch lifecycle.
//!
//! The orchestrator never performs I/O. Every state change that needs a
//! request returns a [`FetchTicket`]; the caller runs the request and hands
//! the outcome back through [`Orchestrator::resolve`] together with the
//! ticket's generation. Outcomes whose generation is not the latest issued
//! are stale and are dropped without touching state, so a slow response for
//! an abandoned (query, page) pair can never overwrite a newer one.

use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::model::{Movie, PageNumber, Query, ResultPage};
use crate::notify::Notice;

/// Fetch lifecycle as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
  /// No active query.
  #[default]
  Idle,
  /// A request for the current (query, page) is in flight.
  Loading,
  /// The latest request succeeded (possibly with zero results).
  Loaded(ResultPage),
  /// The latest request failed; holds a short reason for logs and status.
  Failed(String),
}

/// One request the caller must run on the orchestrator's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
  pub generation: u64,
  pub query: Query,
  pub page: PageNumber,
}

#[derive(Debug, Default)]
pub struct Orchestrator {
  query: Option<Query>,
  page: PageNumber,
  state: FetchState,
  /// Last successful page of the *current* query, shown while the next page
  /// loads. Cleared when the query changes.
  previous: Option<ResultPage>,
  selection: Option<Movie>,
  generation: u64,
}

impl Orchestrator {
  pub fn new() -> Self {
    Self::default()
  }

  // --- Accessors ---

  pub fn query(&self) -> Option<&Query> {
    self.query.as_ref()
  }

  pub fn page(&self) -> PageNumber {
    self.page
  }

  pub fn state(&self) -> &FetchState {
    &self.state
  }

  pub fn selection(&self) -> Option<&Movie> {
    self.selection.as_ref()
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn is_loading(&self) -> bool {
    matches!(self.state, FetchState::Loading)
  }

  /// The page currently on screen: the loaded one, or while loading, the
  /// previous page of the same query.
  pub fn visible_page(&self) -> Option<&ResultPage> {
    match &self.state {
      FetchState::Loaded(page) => Some(page),
      FetchState::Loading => self.previous.as_ref(),
      FetchState::Idle | FetchState::Failed(_) => None,
    }
  }

  pub fn visible_results(&self) -> &[Movie] {
    self.visible_page().map_or(&[], |p| p.results.as_slice())
  }

  /// Total pages known for the current query, if a page is on screen.
  pub fn total_pages(&self) -> Option<u32> {
    self.visible_page().map(|p| p.total_pages)
  }

  /// Whether the page bar should be shown at all.
  pub fn can_paginate(&self) -> bool {
    self.total_pages().is_some_and(|t| t > 1)
  }

  // --- Transitions ---

  fn issue(&mut self) -> Option<FetchTicket> {
    let query = self.query.clone()?;
    Some(self.ticket_for(query))
  }

  /// Every ticket goes through here: bump the generation and start loading.
  fn ticket_for(&mut self, query: Query) -> FetchTicket {
    self.generation += 1;
    self.state = FetchState::Loading;
    let ticket = FetchTicket { generation: self.generation, query, page: self.page };
    debug!(generation = ticket.generation, query = %ticket.query, page = ticket.page.get(), "fetch issued");
    ticket
  }

  /// A new search. Resets the page to 1 before the ticket is issued.
  pub fn submit(&mut self, query: Query) -> FetchTicket {
    info!(query = %query, "search submitted");
    if self.query.as_ref() != Some(&query) {
      self.previous = None;
    } else if let FetchState::Loaded(page) = &self.state {
      self.previous = Some(page.clone());
    }
    self.query = Some(query.clone());
    self.page = PageNumber::FIRST;
    self.ticket_for(query)
  }

  /// Jump to page `n` of the current query. Ignored unless a page of the
  /// current query is on screen, there is more than one page, and `n` is in
  /// range.
  pub fn change_page(&mut self, n: u32) -> Option<FetchTicket> {
    let total = self.total_pages()?;
    if total <= 1 {
      return None;
    }
    let page = PageNumber::new(n).filter(|p| p.get() <= total)?;
    if page == self.page && !self.is_loading() {
      return None;
    }
    if let FetchState::Loaded(current) = &self.state {
      self.previous = Some(current.clone());
    }
    self.page = page;
    info!(page = page.get(), total, "page changed");
    self.issue()
  }

  pub fn next_page(&mut self) -> Option<FetchTicket> {
    self.change_page(self.page.get().saturating_add(1))
  }

  pub fn prev_page(&mut self) -> Option<FetchTicket> {
    self.change_page(self.page.get().saturating_sub(1))
  }

  pub fn first_page(&mut self) -> Option<FetchTicket> {
    self.change_page(1)
  }

  pub fn last_page(&mut self) -> Option<FetchTicket> {
    let total = self.total_pages()?;
    self.change_page(total)
  }

  /// Re-issue the current (query, page). Only ever user-triggered.
  pub fn reload(&mut self) -> Option<FetchTicket> {
    if let FetchState::Loaded(current) = &self.state {
      self.previous = Some(current.clone());
    }
    self.issue()
  }

  /// Apply a fetch outcome. Returns the notice to show, if any. Outcomes for
  /// anything but the latest ticket are discarded.
  pub fn resolve(&mut self, generation: u64, outcome: Result<ResultPage, FetchError>) -> Option<Notice> {
    if generation != self.generation || !self.is_loading() {
      debug!(generation, latest = self.generation, "stale fetch outcome discarded");
      return None;
    }

    match outcome {
      Ok(page) if page.is_empty() => {
        info!(query = ?self.query.as_ref().map(Query::as_str), page = self.page.get(), "search returned no results");
        self.previous = None;
        self.state = FetchState::Loaded(page);
        Some(Notice::NoResults)
      }
      Ok(page) => {
        info!(
          query = ?self.query.as_ref().map(Query::as_str),
          page = self.page.get(),
          results = page.results.len(),
          total_pages = page.total_pages,
          "search loaded"
        );
        self.previous = None;
        self.state = FetchState::Loaded(page);
        None
      }
      Err(e) => {
        warn!(err = %e, source = ?std::error::Error::source(&e), "search failed");
        self.previous = None;
        self.state = FetchState::Failed(e.reason().to_string());
        Some(Notice::FetchFailed)
      }
    }
  }

  // --- Selection ---

  pub fn select(&mut self, movie: Movie) {
    debug!(id = movie.id, title = movie.display_title(), "movie selected");
    self.selection = Some(movie);
  }

  /// Select the `index`-th visible result.
  pub fn select_index(&mut self, index: usize) -> bool {
    match self.visible_results().get(index).cloned() {
      Some(movie) => {
        self.select(movie);
        true
      }
      None => false,
    }
  }

  pub fn close(&mut self) {
    self.selection = None;
  }
}
