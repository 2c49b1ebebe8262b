//! Xtream player API client.
//!
//! Metadata calls go through `player_api.php` with credentials passed as
//! query parameters. Episode files are served from
//! `<base>/series/<user>/<pass>/<episode_id>.<ext>`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{Category, Episode, SeriesInfo, SeriesSummary};
use super::{CatalogError, CatalogSource, EpisodeBody};
use crate::config::{CatalogConfig, RetryConfig};
use crate::metrics;

/// Statuses worth another attempt.
fn should_retry_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Delay before retry number `attempt` (1-based).
fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let millis = retry.initial_delay_ms as f64 * retry.backoff_multiplier.powi(exponent);
    let capped = millis.min(retry.max_delay_ms as f64).max(0.0);
    Duration::from_millis(capped as u64)
}

/// Xtream player API client.
pub struct XtreamClient {
    /// Client for metadata calls (connect + request timeout).
    client: Client,
    /// Client for episode bodies (connect timeout only).
    download_client: Client,
    base_url: String,
    username: String,
    password: String,
    retry: RetryConfig,
}

impl XtreamClient {
    /// Create a new client from catalog configuration.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        let download_client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            download_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Source URL of an episode file.
    pub fn episode_url(&self, episode: &Episode) -> String {
        format!(
            "{}/series/{}/{}/{}.{}",
            self.base_url,
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
            urlencoding::encode(&episode.id),
            episode.container_extension
        )
    }

    /// Send a GET built by `build`, retrying transient failures.
    async fn send_with_retry<F>(&self, action: &str, build: F) -> Result<Response, CatalogError>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if should_retry_status(status) && attempt < attempts {
                        let delay = backoff_delay(&self.retry, attempt);
                        warn!(
                            "Catalog {} returned {}, retrying in {:?} (attempt {}/{})",
                            action, status, delay, attempt, attempts
                        );
                        metrics::CATALOG_REQUESTS
                            .with_label_values(&[action, "retry"])
                            .inc();
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(Self::status_error(action, status, response).await);
                }
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < attempts => {
                    let delay = backoff_delay(&self.retry, attempt);
                    warn!(
                        "Catalog {} transport error: {}, retrying in {:?} (attempt {}/{})",
                        action, e, delay, attempt, attempts
                    );
                    metrics::CATALOG_REQUESTS
                        .with_label_values(&[action, "retry"])
                        .inc();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn status_error(action: &str, status: StatusCode, response: Response) -> CatalogError {
        match status {
            StatusCode::NOT_FOUND => CatalogError::NotFound(action.to_string()),
            StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimitExceeded,
            _ => {
                let body = response.text().await.unwrap_or_default();
                CatalogError::ApiError {
                    status: status.as_u16(),
                    message: body.chars().take(240).collect(),
                }
            }
        }
    }

    /// Call `player_api.php` with an action and extra query parameters.
    async fn player_api<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/player_api.php", self.base_url);
        let started = Instant::now();

        debug!("Catalog request: action={}, params={:?}", action, params);

        let result = async {
            let response = self
                .send_with_retry(action, || {
                    self.client
                        .get(&url)
                        .query(&[
                            ("username", self.username.as_str()),
                            ("password", self.password.as_str()),
                            ("action", action),
                        ])
                        .query(params)
                })
                .await?;

            response.json::<T>().await.map_err(|e| {
                CatalogError::ParseError(format!("Failed to parse {} response: {}", action, e))
            })
        }
        .await;

        metrics::CATALOG_REQUEST_DURATION
            .with_label_values(&[action])
            .observe(started.elapsed().as_secs_f64());
        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::CATALOG_REQUESTS
            .with_label_values(&[action, outcome])
            .inc();

        result
    }
}

#[async_trait]
impl CatalogSource for XtreamClient {
    async fn get_series_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let categories: Vec<Category> = self.player_api("get_series_categories", &[]).await?;
        debug!("Retrieved {} categories", categories.len());
        Ok(categories)
    }

    async fn get_series(&self, category_id: &str) -> Result<Vec<SeriesSummary>, CatalogError> {
        self.player_api("get_series", &[("category_id", category_id)])
            .await
    }

    async fn get_series_info(&self, series_id: &str) -> Result<SeriesInfo, CatalogError> {
        self.player_api("get_series_info", &[("series_id", series_id)])
            .await
    }

    async fn open_episode(&self, episode: &Episode) -> Result<EpisodeBody, CatalogError> {
        if episode.container_extension.is_empty() {
            return Err(CatalogError::ParseError(format!(
                "episode {} has no container extension",
                episode.id
            )));
        }

        let url = self.episode_url(episode);
        debug!("Opening episode {} ({})", episode.id, episode.title);

        let response = self
            .send_with_retry("episode", || self.download_client.get(&url))
            .await?;

        let content_length = response.content_length();
        debug!("Episode {} size: {:?} bytes", episode.id, content_length);

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(CatalogError::from))
            .boxed();

        Ok(EpisodeBody {
            content_length,
            stream,
        })
    }
}
