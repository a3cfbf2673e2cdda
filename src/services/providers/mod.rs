/// Movie metadata provider abstraction
///
/// The catalog lives behind an external metadata API. Both operations the
/// rest of the system needs, search and lookup, hide behind this trait so
/// handlers and tests never depend on a concrete provider.
use crate::{error::AppResult, models::MovieRecord};

pub mod omdb;

/// Trait for movie metadata providers
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Search for movies by title.
    ///
    /// A provider with no matches returns an empty list, never an error.
    /// A blank query short-circuits to an empty list without a network
    /// call.
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieRecord>>;

    /// Fetch full metadata for one movie by its catalog identifier.
    ///
    /// A miss is an absence, not an error.
    async fn lookup_movie(&self, imdb_id: &str) -> AppResult<Option<MovieRecord>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
