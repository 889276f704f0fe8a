use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::{Client, Request, Url, header};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::constants::constants;
use crate::error::{ConfigError, FetchError};
use crate::model::{PageNumber, Query, ResultPage};

/// Poster resolutions we ask TMDB's image CDN for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosterSize {
  /// Small poster for grid cards.
  Grid,
  /// Larger poster for the detail overlay.
  Detail,
}

impl PosterSize {
  pub fn segment(self) -> &'static str {
    match self {
      PosterSize::Grid => &constants().grid_poster_size,
      PosterSize::Detail => &constants().detail_poster_size,
    }
  }
}

/// Thin client for the TMDB v3 API. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct TmdbClient {
  http: Client,
  api_base_url: String,
  image_base_url: String,
  token: String,
}

impl TmdbClient {
  pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
    // Validate the token as a header value up front so a bad credential
    // surfaces at startup instead of on the first search.
    header::HeaderValue::from_str(&format!("Bearer {}", settings.token)).map_err(|_| ConfigError::InvalidToken)?;

    let http = Client::builder()
      .timeout(settings.timeout)
      .user_agent(concat!("reel/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      api_base_url: settings.api_base_url.clone(),
      image_base_url: settings.image_base_url.clone(),
      token: settings.token.clone(),
    })
  }

  /// Build the `/search/movie` request for `(query, page)` without sending it.
  pub fn search_request(&self, query: &Query, page: PageNumber) -> Result<Request, FetchError> {
    let c = constants();
    let page = page.get().to_string();
    let include_adult = c.include_adult.to_string();
    let url = Url::parse_with_params(
      &format!("{}/search/movie", self.api_base_url),
      [
        ("query", query.as_str()),
        ("page", page.as_str()),
        ("include_adult", include_adult.as_str()),
        ("language", c.search_language.as_str()),
      ],
    )
    .map_err(|e| FetchError::new(format!("invalid search URL: {}", e)))?;

    let request = self
      .http
      .get(url)
      .header(header::ACCEPT, "application/json")
      .bearer_auth(&self.token)
      .build()?;
    Ok(request)
  }

  /// Run one search. Exactly one HTTP request, no retry.
  pub async fn search_movies(&self, query: &Query, page: PageNumber) -> Result<ResultPage, FetchError> {
    let request = self.search_request(query, page)?;
    debug!(query = %query, page = page.get(), "tmdb: GET /search/movie");

    let response = self.http.execute(request).await?.error_for_status()?;
    let result: ResultPage = response.json().await?;

    debug!(
      query = %query,
      page = result.page,
      results = result.results.len(),
      total_pages = result.total_pages,
      total_results = result.total_results,
      "tmdb: search complete"
    );
    Ok(result)
  }

  pub fn poster_url(&self, poster_path: &str, size: PosterSize) -> String {
    let path = if poster_path.starts_with('/') { poster_path.to_string() } else { format!("/{}", poster_path) };
    format!("{}/{}{}", self.image_base_url, size.segment(), path)
  }

  /// Download and decode a poster image.
  pub async fn fetch_poster(&self, poster_path: &str, size: PosterSize) -> Result<DynamicImage> {
    let url = self.poster_url(poster_path, size);
    let response = self.http.get(&url).send().await.with_context(|| format!("Failed to request poster {}", url))?;
    if !response.status().is_success() {
      warn!(url = %url, status = %response.status(), "tmdb: poster request rejected");
      return Err(anyhow!("Poster request returned {} ({})", response.status(), url));
    }
    let bytes = response.bytes().await.with_context(|| format!("Failed to read poster bytes from {}", url))?;
    let image =
      image::load_from_memory(&bytes).with_context(|| format!("Failed to decode poster image (URL: {})", url))?;
    Ok(image)
  }
}

/// A decoded poster delivered by [`fetch_posters`].
#[derive(Debug, Clone)]
pub struct PosterImage {
  pub path: String,
  pub size: PosterSize,
  pub image: DynamicImage,
}

/// Download posters for `paths`, at most `poster_concurrency` at a time.
/// Each poster is sent through `tx` as soon as it decodes; failures are
/// logged and skipped. Returns early once the receiver is gone.
pub async fn fetch_posters(client: &TmdbClient, paths: Vec<String>, size: PosterSize, tx: mpsc::Sender<PosterImage>) {
  use futures::stream::{self, StreamExt};

  stream::iter(paths)
    .map(|path| {
      let tx = tx.clone();
      async move {
        if tx.is_closed() {
          return;
        }
        match client.fetch_poster(&path, size).await {
          Ok(image) => {
            let _ = tx.send(PosterImage { path, size, image }).await;
          }
          Err(e) => debug!(err = %e, path = %path, "tmdb: poster skipped"),
        }
      }
    })
    .buffer_unordered(constants().poster_concurrency.max(1))
    .collect::<()>()
    .await;
}
