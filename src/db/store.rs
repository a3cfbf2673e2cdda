use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Favorite, RatingAggregate, UserRating},
};

/// A rating aggregate together with its storage version.
///
/// The version is a storage concern only: it exists so that writers can
/// detect that the aggregate changed underneath them. It is not part of
/// the rating sufficient statistic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VersionedAggregate {
    pub aggregate: RatingAggregate,
    pub version: u64,
}

/// Access to the per-movie rating aggregate and per-user rating records.
///
/// Every operation may fail with `StoreUnavailable`. There is no
/// transactional guarantee across operations: `put_aggregate` is the
/// unconditional overwrite of the original design and is unsafe under
/// concurrent raters; `put_aggregate_checked` is the conditional write
/// that concurrent raters compose through.
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// Returns the aggregate for a movie, implicitly creating a zeroed
    /// record when none exists.
    async fn get_aggregate(&self, movie_id: &str) -> AppResult<VersionedAggregate>;

    /// Returns the caller's own rating of the movie, if any
    async fn get_user_rating(&self, movie_id: &str, user_id: Uuid)
        -> AppResult<Option<UserRating>>;

    /// Unconditional full overwrite of the aggregate
    async fn put_aggregate(&self, movie_id: &str, aggregate: RatingAggregate) -> AppResult<()>;

    /// Writes the aggregate only if the stored version still equals
    /// `expected_version`, bumping the version on success.
    ///
    /// Returns whether the write happened. A missing record reports a
    /// conflict; records are created by `get_aggregate`, which callers
    /// are expected to have gone through.
    async fn put_aggregate_checked(
        &self,
        movie_id: &str,
        expected_version: u64,
        aggregate: RatingAggregate,
    ) -> AppResult<bool>;

    /// Creates or overwrites the caller's rating of the movie
    async fn put_user_rating(
        &self,
        movie_id: &str,
        user_id: Uuid,
        rating: UserRating,
    ) -> AppResult<()>;
}

/// Access to the per-user favorite records, keyed by (user, movie)
#[async_trait::async_trait]
pub trait FavoriteStore: Send + Sync {
    /// All favorites of one user, oldest first
    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Favorite>>;

    /// Creates or overwrites a favorite
    async fn put_favorite(&self, user_id: Uuid, favorite: &Favorite) -> AppResult<()>;

    /// Deletes a favorite; deleting a missing record is not an error
    async fn delete_favorite(&self, user_id: Uuid, movie_id: &str) -> AppResult<()>;
}
