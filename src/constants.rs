//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so endpoints and layout sizes
//! never depend on runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // TMDB endpoints
  pub api_base_url: String,
  pub image_base_url: String,
  pub search_language: String,
  pub include_adult: bool,
  pub request_timeout_secs: u64,

  // Posters
  pub grid_poster_size: String,
  pub detail_poster_size: String,
  pub poster_concurrency: usize,

  // Grid cards
  pub card_width: u16,
  pub card_poster_rows: u16,

  // Page bar
  pub page_range_displayed: u32,
  pub margin_pages_displayed: u32,

  // Toasts
  pub toast_secs: u64,
  pub max_toasts: usize,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed the first test run catches it.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
