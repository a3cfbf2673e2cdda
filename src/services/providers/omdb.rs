/// OMDb API provider
///
/// Provides title search (`?s=`) and full-record lookup (`?i=`). OMDb
/// reports misses in-band: `{"Response": "False", "Error": "..."}` with
/// HTTP 200, so absence is detected from the payload, not the status.
///
/// Responses are cached in Redis (searches briefly, lookups for a week,
/// records are immutable once published). Cache failures degrade to a
/// miss and are only logged.
use redis::{AsyncCommands, Client as RedisClient};
use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{MovieRecord, OmdbMovie, OmdbSearchResponse},
    services::providers::MovieProvider,
};

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const LOOKUP_CACHE_TTL: u64 = 604_800; // 1 week

pub struct OmdbProvider {
    http_client: HttpClient,
    redis_client: RedisClient,
    api_key: String,
    api_url: String,
}

impl OmdbProvider {
    pub fn new(redis_client: RedisClient, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            redis_client,
            api_key,
            api_url,
        }
    }

    fn search_cache_key(query: &str) -> String {
        format!("omdb:search:{}", query.to_lowercase())
    }

    fn lookup_cache_key(imdb_id: &str) -> String {
        format!("omdb:movie:{}", imdb_id)
    }

    /// Cache read; any Redis failure is logged and treated as a miss
    async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = match self.redis_client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Redis connection failed, skipping cache");
                return None;
            }
        };

        let cached: Option<String> = match conn.get(key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Redis get failed");
                return None;
            }
        };

        cached.and_then(|json| match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache deserialization failed");
                None
            }
        })
    }

    /// Cache write; failures are logged and otherwise ignored
    async fn cache_put<T: Serialize>(&self, key: &str, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        match self.redis_client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: Result<(), _> = conn.set_ex(key, json, ttl).await;
                if let Err(e) = result {
                    tracing::warn!(error = %e, key = %key, "Redis set failed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis connection failed, skipping cache write");
            }
        }
    }

    async fn call_api(&self, params: &[(&str, &str)]) -> AppResult<serde_json::Value> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl MovieProvider for OmdbProvider {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieRecord>> {
        // Malformed queries are an empty result, not an error
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let cache_key = Self::search_cache_key(query);
        if let Some(cached) = self.cache_get::<Vec<MovieRecord>>(&cache_key).await {
            tracing::debug!(query = %query, "Search cache hit");
            return Ok(cached);
        }

        let value = self.call_api(&[("s", query)]).await?;
        let response: OmdbSearchResponse = serde_json::from_value(value)
            .map_err(|e| AppError::ExternalApi(format!("Invalid OMDb response format: {}", e)))?;

        let movies: Vec<MovieRecord> = response.search.into_iter().map(MovieRecord::from).collect();

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = "omdb",
            "Movie search completed"
        );

        self.cache_put(&cache_key, &movies, SEARCH_CACHE_TTL).await;

        Ok(movies)
    }

    async fn lookup_movie(&self, imdb_id: &str) -> AppResult<Option<MovieRecord>> {
        let cache_key = Self::lookup_cache_key(imdb_id);
        if let Some(cached) = self.cache_get::<MovieRecord>(&cache_key).await {
            tracing::debug!(imdb_id = %imdb_id, "Lookup cache hit");
            return Ok(Some(cached));
        }

        let value = self.call_api(&[("i", imdb_id), ("plot", "full")]).await?;

        if value.get("Response").and_then(|r| r.as_str()) == Some("False") {
            tracing::debug!(imdb_id = %imdb_id, "Movie not found at provider");
            return Ok(None);
        }

        let raw: OmdbMovie = serde_json::from_value(value)
            .map_err(|e| AppError::ExternalApi(format!("Invalid OMDb response format: {}", e)))?;
        let movie = MovieRecord::from(raw);

        tracing::info!(
            imdb_id = %imdb_id,
            title = %movie.title,
            provider = "omdb",
            "Movie lookup completed"
        );

        self.cache_put(&cache_key, &movie, LOOKUP_CACHE_TTL).await;

        Ok(Some(movie))
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
