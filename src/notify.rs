use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::constants::constants;

/// The only user-facing notifications the client ever shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
  /// Local validation: the search field was blank on submit.
  EmptyQuery,
  /// A search succeeded but matched nothing.
  NoResults,
  /// A search failed for any reason.
  FetchFailed,
}

impl Notice {
  pub fn message(self) -> &'static str {
    match self {
      Notice::EmptyQuery => "Please enter your search query.",
      Notice::NoResults => "No movies found for your request.",
      Notice::FetchFailed => "Something went wrong - try again later",
    }
  }
}

#[derive(Debug, Clone)]
pub struct Toast {
  pub notice: Notice,
  pub shown_at: Instant,
}

/// Auto-dismissing notification queue. Non-blocking: toasts never take focus
/// and expire on their own.
#[derive(Debug)]
pub struct Toasts {
  queue: VecDeque<Toast>,
  ttl: Duration,
  capacity: usize,
}

impl Default for Toasts {
  fn default() -> Self {
    Self::new(Duration::from_secs(constants().toast_secs), constants().max_toasts)
  }
}

impl Toasts {
  pub fn new(ttl: Duration, capacity: usize) -> Self {
    Self { queue: VecDeque::new(), ttl, capacity: capacity.max(1) }
  }

  pub fn push(&mut self, notice: Notice) {
    self.push_at(notice, Instant::now());
  }

  pub fn push_at(&mut self, notice: Notice, now: Instant) {
    tracing::info!(notice = ?notice, "toast");
    self.queue.push_front(Toast { notice, shown_at: now });
    self.queue.truncate(self.capacity);
  }

  /// Drop toasts older than the configured lifetime.
  pub fn expire(&mut self) {
    self.expire_at(Instant::now());
  }

  pub fn expire_at(&mut self, now: Instant) {
    let ttl = self.ttl;
    self.queue.retain(|t| now.saturating_duration_since(t.shown_at) < ttl);
  }

  /// Newest first.
  pub fn iter(&self) -> impl Iterator<Item = &Toast> {
    self.queue.iter()
  }

  pub fn latest(&self) -> Option<&Toast> {
    self.queue.front()
  }

  pub fn is_empty(&self) -> bool {
    self.queue.is_empty()
  }

  pub fn len(&self) -> usize {
    self.queue.len()
  }

  pub fn dismiss_all(&mut self) {
    self.queue.clear();
  }
}
