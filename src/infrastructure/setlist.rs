//! # Setlist Client
//!
//! Fetches show records from the setlist HTTP API. `HttpSetlistApi` is the
//! raw wire adapter (one request, classified failures); `SetlistClient`
//! layers the TTL cache and the bounded retry policy on top of the
//! `SetlistApi` seam.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::config::SetlistConfig;
use crate::domain::error::{ApiError, ApiResult};
use crate::domain::traits::SetlistApi;
use crate::domain::types::{CacheKey, SetlistRecord};
use crate::infrastructure::cache::SetlistCache;
use crate::infrastructure::http::{failure_from_response, transport};
use crate::infrastructure::retry::RetryPolicy;

pub struct HttpSetlistApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSetlistApi {
    pub fn new(config: &SetlistConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build setlist HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url_for(&self, key: &CacheKey) -> String {
        match key {
            CacheKey::Latest => format!("{}/latest", self.base_url),
            CacheKey::Date(date) => format!("{}/byDate?date={date}", self.base_url),
        }
    }
}

#[async_trait]
impl SetlistApi for HttpSetlistApi {
    async fn fetch(&self, key: &CacheKey) -> ApiResult<SetlistRecord> {
        let response = self
            .http
            .get(self.url_for(key))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let body = response.text().await.map_err(transport)?;
        parse_record(&body)
    }
}

/// Wire shape of a show payload.
#[derive(Debug, Deserialize)]
struct SetlistPayload {
    venue: String,
    date: String,
    songs: Vec<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// A missing required field or an unparseable date is `MalformedResponse`,
/// never a partially-populated record.
fn parse_record(body: &str) -> ApiResult<SetlistRecord> {
    let payload: SetlistPayload =
        serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
    let date = NaiveDate::parse_from_str(&payload.date, "%Y-%m-%d").map_err(|e| {
        ApiError::MalformedResponse(format!("unparseable date {:?}: {e}", payload.date))
    })?;

    Ok(SetlistRecord {
        venue: payload.venue,
        date,
        songs: payload.songs,
        notes: payload.notes,
    })
}

pub struct SetlistClient {
    api: Arc<dyn SetlistApi>,
    cache: Arc<SetlistCache>,
    retry: RetryPolicy,
}

impl SetlistClient {
    pub fn new(api: Arc<dyn SetlistApi>, cache: Arc<SetlistCache>, retry: RetryPolicy) -> Self {
        Self { api, cache, retry }
    }

    pub async fn fetch_latest(&self) -> ApiResult<SetlistRecord> {
        self.fetch(CacheKey::Latest).await
    }

    pub async fn fetch_by_date(&self, date: NaiveDate) -> ApiResult<SetlistRecord> {
        self.fetch(CacheKey::Date(date)).await
    }

    async fn fetch(&self, key: CacheKey) -> ApiResult<SetlistRecord> {
        if let Some(record) = self.cache.fresh(&key).await {
            tracing::debug!("setlist cache hit for {key}");
            return Ok(record);
        }

        let record = self.retry.run("setlist", || self.api.fetch(&key)).await?;
        self.cache.store(key, record.clone()).await;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct FakeSetlistApi {
        calls: AtomicUsize,
        responses: Mutex<VecDeque<ApiResult<SetlistRecord>>>,
    }

    impl FakeSetlistApi {
        fn scripted(responses: Vec<ApiResult<SetlistRecord>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(responses.into()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SetlistApi for FakeSetlistApi {
        async fn fetch(&self, _key: &CacheKey) -> ApiResult<SetlistRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .await
                .pop_front()
                .expect("unexpected network call")
        }
    }

    fn msg_record() -> SetlistRecord {
        SetlistRecord {
            venue: "Madison Square Garden".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            songs: vec!["Tweezer".to_string(), "Harry Hood".to_string()],
            notes: None,
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(4))
    }

    fn client(api: Arc<FakeSetlistApi>, ttl: Duration) -> SetlistClient {
        SetlistClient::new(api, Arc::new(SetlistCache::new(ttl)), fast_retry())
    }

    #[tokio::test]
    async fn test_fresh_cache_hit_skips_network() {
        let api = FakeSetlistApi::scripted(vec![Ok(msg_record())]);
        let client = client(api.clone(), Duration::from_secs(300));

        let first = client.fetch_latest().await.unwrap();
        let second = client.fetch_latest().await.unwrap();

        assert_eq!(api.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_stale_entry_triggers_refresh() {
        let mut refreshed = msg_record();
        refreshed.venue = "Deer Creek".to_string();
        let api = FakeSetlistApi::scripted(vec![Ok(msg_record()), Ok(refreshed.clone())]);
        let client = client(api.clone(), Duration::ZERO);

        client.fetch_latest().await.unwrap();
        let second = client.fetch_latest().await.unwrap();

        assert_eq!(api.calls(), 2);
        assert_eq!(second, refreshed);
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_separately() {
        let api = FakeSetlistApi::scripted(vec![Ok(msg_record()), Ok(msg_record())]);
        let client = client(api.clone(), Duration::from_secs(300));

        client.fetch_latest().await.unwrap();
        client
            .fetch_by_date(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
            .await
            .unwrap();

        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_repeated_server_errors_exhaust_retries() {
        let unavailable = || Err(ApiError::Transport("HTTP 503 Service Unavailable".into()));
        let api = FakeSetlistApi::scripted(vec![unavailable(), unavailable(), unavailable()]);
        let client = client(api.clone(), Duration::from_secs(300));

        let result = client.fetch_latest().await;

        assert_eq!(result, Err(ApiError::ServiceUnavailable));
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let api =
            FakeSetlistApi::scripted(vec![Err(ApiError::Client("HTTP 404: no show".into()))]);
        let client = client(api.clone(), Duration::from_secs(300));

        let result = client.fetch_latest().await;

        assert!(matches!(result, Err(ApiError::Client(_))));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_empty() {
        let api = FakeSetlistApi::scripted(vec![
            Err(ApiError::Client("HTTP 404".into())),
            Ok(msg_record()),
        ]);
        let client = client(api.clone(), Duration::from_secs(300));

        assert!(client.fetch_latest().await.is_err());
        assert!(client.fetch_latest().await.is_ok());
        assert_eq!(api.calls(), 2);
    }

    #[test]
    fn test_parse_record_happy_path() {
        let body = r#"{
            "venue": "Madison Square Garden",
            "date": "2023-12-31",
            "songs": ["Tweezer", "Harry Hood"],
            "notes": "NYE run night four"
        }"#;
        let record = parse_record(body).unwrap();
        assert_eq!(record.venue, "Madison Square Garden");
        assert_eq!(record.songs, vec!["Tweezer", "Harry Hood"]);
        assert_eq!(record.notes.as_deref(), Some("NYE run night four"));
    }

    #[test]
    fn test_parse_record_missing_songs_is_malformed() {
        let body = r#"{"venue": "MSG", "date": "2023-12-31"}"#;
        assert!(matches!(
            parse_record(body),
            Err(ApiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_record_bad_date_is_malformed() {
        let body = r#"{"venue": "MSG", "date": "12/31/2023", "songs": ["Tweezer"]}"#;
        assert!(matches!(
            parse_record(body),
            Err(ApiError::MalformedResponse(_))
        ));
    }
}
