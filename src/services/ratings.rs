use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::store::RatingStore,
    error::{AppError, AppResult},
    models::{RatingAggregate, UserRating},
};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Computes the next aggregate from the prior aggregate, the caller's
/// previously known rating, and the newly submitted value.
///
/// A first-time rating grows the count; a changed rating keeps the count
/// and swaps the old value out of the sum. A recorded prior rating with a
/// zero count is inconsistent state and is treated as a first-time
/// rating, which avoids the division by zero.
///
/// Preserves the invariant that `average_rating * ratings_count` equals
/// the sum of all recorded rating values.
pub fn apply_rating(
    aggregate: RatingAggregate,
    prior: Option<u8>,
    new_value: u8,
) -> RatingAggregate {
    let count = aggregate.ratings_count;
    match prior {
        Some(old_value) if count > 0 => RatingAggregate {
            average_rating: (aggregate.average_rating * count as f64 - old_value as f64
                + new_value as f64)
                / count as f64,
            ratings_count: count,
        },
        _ => RatingAggregate {
            average_rating: (aggregate.average_rating * count as f64 + new_value as f64)
                / (count + 1) as f64,
            ratings_count: count + 1,
        },
    }
}

/// Aggregate plus the caller's own rating, as shown on a detail page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub ratings_count: u32,
    pub user_rating: Option<u8>,
}

/// Orchestrates rating reads and writes against the store.
///
/// Writes go through the version-checked aggregate update, so two raters
/// hitting the same movie concurrently both land in the aggregate: the
/// loser of the race re-reads and recomputes instead of silently
/// clobbering the winner.
pub struct RatingService {
    store: Arc<dyn RatingStore>,
}

impl RatingService {
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self { store }
    }

    /// Records one user's rating of a movie and folds it into the
    /// aggregate, returning the updated aggregate.
    pub async fn rate(
        &self,
        movie_id: &str,
        user_id: Uuid,
        value: u8,
    ) -> AppResult<RatingAggregate> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(AppError::InvalidInput(format!(
                "Rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, value
            )));
        }

        let prior = self
            .store
            .get_user_rating(movie_id, user_id)
            .await?
            .map(|r| r.value);

        self.store
            .put_user_rating(movie_id, user_id, UserRating { value })
            .await?;

        loop {
            let current = self.store.get_aggregate(movie_id).await?;
            let next = apply_rating(current.aggregate, prior, value);

            if self
                .store
                .put_aggregate_checked(movie_id, current.version, next)
                .await?
            {
                tracing::info!(
                    movie_id = %movie_id,
                    average = next.average_rating,
                    count = next.ratings_count,
                    "Rating recorded"
                );
                return Ok(next);
            }

            tracing::debug!(movie_id = %movie_id, "Aggregate changed underneath us, recomputing");
        }
    }

    /// Aggregate and own-rating view for a movie.
    ///
    /// Store failures are logged and degrade to a zeroed aggregate and an
    /// absent user rating rather than propagating.
    pub async fn summary(&self, movie_id: &str, user_id: Option<Uuid>) -> RatingSummary {
        let aggregate = match self.store.get_aggregate(movie_id).await {
            Ok(versioned) => versioned.aggregate,
            Err(e) => {
                tracing::warn!(movie_id = %movie_id, error = %e, "Aggregate fetch failed");
                RatingAggregate::zero()
            }
        };

        let user_rating = match user_id {
            Some(user_id) => match self.store.get_user_rating(movie_id, user_id).await {
                Ok(rating) => rating.map(|r| r.value),
                Err(e) => {
                    tracing::warn!(movie_id = %movie_id, error = %e, "User rating fetch failed");
                    None
                }
            },
            None => None,
        };

        RatingSummary {
            average_rating: aggregate.average_rating,
            ratings_count: aggregate.ratings_count,
            user_rating,
        }
    }
}
