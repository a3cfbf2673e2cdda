use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::store::{FavoriteStore, RatingStore, VersionedAggregate},
    error::AppResult,
    models::{Favorite, RatingAggregate, UserRating},
};

/// In-memory rating and favorite store.
///
/// Backs tests and local development without a database. Each operation
/// takes the lock once, so the read and write halves of a rating update
/// remain separate round trips, exactly like the real store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    aggregates: HashMap<String, VersionedAggregate>,
    user_ratings: HashMap<(String, Uuid), UserRating>,
    favorites: HashMap<Uuid, BTreeMap<String, Favorite>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RatingStore for MemoryStore {
    async fn get_aggregate(&self, movie_id: &str) -> AppResult<VersionedAggregate> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .aggregates
            .entry(movie_id.to_string())
            .or_insert(VersionedAggregate {
                aggregate: RatingAggregate::zero(),
                version: 0,
            });
        Ok(*entry)
    }

    async fn get_user_rating(
        &self,
        movie_id: &str,
        user_id: Uuid,
    ) -> AppResult<Option<UserRating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .user_ratings
            .get(&(movie_id.to_string(), user_id))
            .copied())
    }

    async fn put_aggregate(&self, movie_id: &str, aggregate: RatingAggregate) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .aggregates
            .entry(movie_id.to_string())
            .or_insert(VersionedAggregate {
                aggregate: RatingAggregate::zero(),
                version: 0,
            });
        entry.aggregate = aggregate;
        entry.version += 1;
        Ok(())
    }

    async fn put_aggregate_checked(
        &self,
        movie_id: &str,
        expected_version: u64,
        aggregate: RatingAggregate,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.aggregates.get_mut(movie_id) {
            Some(entry) if entry.version == expected_version => {
                entry.aggregate = aggregate;
                entry.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn put_user_rating(
        &self,
        movie_id: &str,
        user_id: Uuid,
        rating: UserRating,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .user_ratings
            .insert((movie_id.to_string(), user_id), rating);
        Ok(())
    }
}

#[async_trait::async_trait]
impl FavoriteStore for MemoryStore {
    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Favorite>> {
        let inner = self.inner.read().await;
        let mut favorites: Vec<Favorite> = inner
            .favorites
            .get(&user_id)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default();
        favorites.sort_by_key(|f| f.added_at);
        Ok(favorites)
    }

    async fn put_favorite(&self, user_id: Uuid, favorite: &Favorite) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .favorites
            .entry(user_id)
            .or_default()
            .insert(favorite.movie.imdb_id.clone(), favorite.clone());
        Ok(())
    }

    async fn delete_favorite(&self, user_id: Uuid, movie_id: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(entries) = inner.favorites.get_mut(&user_id) {
            entries.remove(movie_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieKind;
    use chrono::Utc;

    fn movie(id: &str) -> crate::models::MovieRecord {
        crate::models::MovieRecord {
            imdb_id: id.to_string(),
            title: id.to_string(),
            year: "2020".to_string(),
            poster: String::new(),
            kind: MovieKind::Movie,
            genre: None,
            plot: None,
            director: None,
            actors: None,
        }
    }

    #[tokio::test]
    async fn test_get_aggregate_creates_zeroed_record() {
        let store = MemoryStore::new();
        let agg = store.get_aggregate("tt0000001").await.unwrap();
        assert_eq!(agg.aggregate, RatingAggregate::zero());
        assert_eq!(agg.version, 0);
    }

    #[tokio::test]
    async fn test_put_aggregate_bumps_version() {
        let store = MemoryStore::new();
        store.get_aggregate("tt0000001").await.unwrap();
        store
            .put_aggregate(
                "tt0000001",
                RatingAggregate {
                    average_rating: 4.0,
                    ratings_count: 1,
                },
            )
            .await
            .unwrap();

        let agg = store.get_aggregate("tt0000001").await.unwrap();
        assert_eq!(agg.aggregate.ratings_count, 1);
        assert_eq!(agg.version, 1);
    }

    #[tokio::test]
    async fn test_checked_put_rejects_stale_version() {
        let store = MemoryStore::new();
        let read = store.get_aggregate("tt0000001").await.unwrap();

        let fresh = RatingAggregate {
            average_rating: 4.0,
            ratings_count: 1,
        };
        assert!(store
            .put_aggregate_checked("tt0000001", read.version, fresh)
            .await
            .unwrap());

        // A writer still holding the old version must be turned away
        assert!(!store
            .put_aggregate_checked("tt0000001", read.version, fresh)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_user_rating_round_trip() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        assert_eq!(store.get_user_rating("tt1", user).await.unwrap(), None);
        store
            .put_user_rating("tt1", user, UserRating { value: 4 })
            .await
            .unwrap();
        assert_eq!(
            store.get_user_rating("tt1", user).await.unwrap(),
            Some(UserRating { value: 4 })
        );
    }

    #[tokio::test]
    async fn test_favorites_listed_oldest_first() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        let first = Favorite::new(movie("tt1"), Utc::now());
        let second = Favorite::new(movie("tt2"), Utc::now() + chrono::Duration::seconds(1));
        store.put_favorite(user, &second).await.unwrap();
        store.put_favorite(user, &first).await.unwrap();

        let listed = store.list_favorites(user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].movie.imdb_id, "tt1");

        store.delete_favorite(user, "tt1").await.unwrap();
        let listed = store.list_favorites(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].movie.imdb_id, "tt2");
    }
}
