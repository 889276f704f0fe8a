use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::fmt;
use tracing::warn;

// --- Query / PageNumber ---

/// A trimmed, non-empty search query. The "no active search" state is
/// represented by the absence of a `Query`, never by an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
  /// Trim `raw` and wrap it, or return `None` if nothing is left.
  pub fn parse(raw: &str) -> Option<Self> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(Self(trimmed.to_string())) }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Query {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageNumber(u32);

impl PageNumber {
  pub const FIRST: PageNumber = PageNumber(1);

  pub fn new(n: u32) -> Option<Self> {
    if n == 0 { None } else { Some(Self(n)) }
  }

  pub fn get(self) -> u32 {
    self.0
  }
}

impl Default for PageNumber {
  fn default() -> Self {
    Self::FIRST
  }
}

impl fmt::Display for PageNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// --- TMDB envelope ---

/// Treat `null`, a missing key and `""` alike: TMDB uses all three for "unknown".
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<String>::deserialize(deserializer)?;
  Ok(value.filter(|s| !s.trim().is_empty()))
}

/// A single movie summary from `/search/movie`.
///
/// Only `id` is guaranteed; upstream data is incomplete for many titles, so
/// everything else is optional and passed through unrepaired.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Movie {
  pub id: u64,
  #[serde(default, deserialize_with = "non_empty")]
  pub title: Option<String>,
  #[serde(default, deserialize_with = "non_empty")]
  pub original_title: Option<String>,
  #[serde(default, deserialize_with = "non_empty")]
  pub original_language: Option<String>,
  #[serde(default, deserialize_with = "non_empty")]
  pub poster_path: Option<String>,
  #[serde(default, deserialize_with = "non_empty")]
  pub overview: Option<String>,
  #[serde(default, deserialize_with = "non_empty")]
  pub release_date: Option<String>,
  #[serde(default)]
  pub vote_average: Option<f64>,
  #[serde(default)]
  pub vote_count: Option<u64>,
}

/// Decode `results` one item at a time. An item that isn't a usable movie
/// (no `id`, or a field of the wrong type) is logged and skipped; the rest of
/// the page survives.
fn lenient_results<'de, D>(deserializer: D) -> Result<Vec<Movie>, D::Error>
where
  D: Deserializer<'de>,
{
  let items = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
  Ok(
    items
      .into_iter()
      .enumerate()
      .filter_map(|(index, item)| match Movie::deserialize(item) {
        Ok(movie) => Some(movie),
        Err(e) => {
          warn!(index, err = %e, "tmdb: skipping malformed result item");
          None
        }
      })
      .collect(),
  )
}

/// One page of search results plus the pagination metadata TMDB reports.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ResultPage {
  #[serde(default)]
  pub page: u32,
  #[serde(default, deserialize_with = "lenient_results")]
  pub results: Vec<Movie>,
  #[serde(default)]
  pub total_pages: u32,
  #[serde(default)]
  pub total_results: u64,
}

impl ResultPage {
  pub fn is_empty(&self) -> bool {
    self.results.is_empty()
  }
}

// --- Display helpers ---

impl Movie {
  pub fn display_title(&self) -> &str {
    self.title.as_deref().or(self.original_title.as_deref()).unwrap_or("Untitled")
  }

  /// The original title, only when it differs from the displayed one.
  pub fn alternate_title(&self) -> Option<&str> {
    let original = self.original_title.as_deref()?;
    if original == self.display_title() { None } else { Some(original) }
  }

  fn parsed_release_date(&self) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(self.release_date.as_deref()?, "%Y-%m-%d").ok()
  }

  pub fn year(&self) -> Option<i32> {
    self.parsed_release_date().map(|d| d.year())
  }

  /// Long-form release date ("March 3, 2022"). Falls back to the raw string
  /// when TMDB sends something that isn't a calendar date.
  pub fn release_date_long(&self) -> Option<String> {
    match self.parsed_release_date() {
      Some(d) => Some(d.format("%B %-d, %Y").to_string()),
      None => self.release_date.clone(),
    }
  }

  /// TMDB reports 0.0 for titles nobody has voted on; treat that as unrated.
  pub fn rating(&self) -> Option<f64> {
    let votes = self.vote_count.unwrap_or(0);
    self.vote_average.filter(|v| *v > 0.0 && (votes > 0 || self.vote_count.is_none()))
  }

  pub fn rating_short(&self) -> Option<String> {
    self.rating().map(|r| format!("★ {:.1}", r))
  }

  pub fn rating_long(&self) -> Option<String> {
    let rating = self.rating()?;
    match self.vote_count {
      Some(1) => Some(format!("{:.1}/10 · 1 vote", rating)),
      Some(n) => Some(format!("{:.1}/10 · {} votes", rating, group_thousands(n))),
      None => Some(format!("{:.1}/10", rating)),
    }
  }
}

/// `1204` → `1,204`.
fn group_thousands(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}
