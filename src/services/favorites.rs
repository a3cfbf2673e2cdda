use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::{
    db::store::FavoriteStore,
    error::AppResult,
    models::{Favorite, MovieRecord},
};

/// Manages a user's favorite set and pushes changes to observers.
///
/// Observation is full-snapshot: every value a subscriber receives is the
/// complete, current favorite set, superseding anything received before.
/// There is no delta contract. A subscription ends when the receiver is
/// dropped; senders nobody listens to are pruned on the next change.
pub struct FavoritesService {
    store: Arc<dyn FavoriteStore>,
    watchers: Mutex<HashMap<Uuid, watch::Sender<Arc<Vec<Favorite>>>>>,
}

impl FavoritesService {
    pub fn new(store: Arc<dyn FavoriteStore>) -> Self {
        Self {
            store,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    /// The user's current favorite set, oldest first
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Favorite>> {
        self.store.list_favorites(user_id).await
    }

    /// Bookmarks a movie for the user, timestamped now.
    ///
    /// Favoriting an already-favorited movie refreshes the stored record.
    pub async fn add(&self, user_id: Uuid, movie: MovieRecord) -> AppResult<Favorite> {
        let favorite = Favorite::new(movie, Utc::now());
        self.store.put_favorite(user_id, &favorite).await?;

        tracing::info!(
            user_id = %user_id,
            movie_id = %favorite.movie.imdb_id,
            "Favorite added"
        );

        self.broadcast(user_id).await;
        Ok(favorite)
    }

    /// Removes a bookmark; removing a movie that is not favorited is a
    /// no-op.
    pub async fn remove(&self, user_id: Uuid, movie_id: &str) -> AppResult<()> {
        self.store.delete_favorite(user_id, movie_id).await?;

        tracing::info!(user_id = %user_id, movie_id = %movie_id, "Favorite removed");

        self.broadcast(user_id).await;
        Ok(())
    }

    /// Subscribes to the user's favorite set.
    ///
    /// The receiver starts out holding the current set and is notified
    /// with a fresh full snapshot on every subsequent change. Dropping
    /// the receiver unsubscribes.
    pub async fn subscribe(&self, user_id: Uuid) -> watch::Receiver<Arc<Vec<Favorite>>> {
        let snapshot = match self.store.list_favorites(user_id).await {
            Ok(favorites) => favorites,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Favorites fetch failed");
                vec![]
            }
        };
        let snapshot = Arc::new(snapshot);

        let mut watchers = self.watchers.lock().await;
        if let Some(tx) = watchers.get(&user_id) {
            if !tx.is_closed() {
                tx.send_replace(snapshot);
                return tx.subscribe();
            }
        }

        let (tx, rx) = watch::channel(snapshot);
        watchers.insert(user_id, tx);
        rx
    }

    /// Pushes the current favorite set to the user's subscribers.
    ///
    /// A failed snapshot read is logged and the push skipped; the store
    /// stays the source of truth for the next one.
    async fn broadcast(&self, user_id: Uuid) {
        {
            let mut watchers = self.watchers.lock().await;
            let closed = match watchers.get(&user_id) {
                None => return,
                Some(tx) => tx.is_closed(),
            };
            if closed {
                watchers.remove(&user_id);
                return;
            }
        }

        let favorites = match self.store.list_favorites(user_id).await {
            Ok(favorites) => favorites,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Snapshot broadcast skipped");
                return;
            }
        };

        let watchers = self.watchers.lock().await;
        if let Some(tx) = watchers.get(&user_id) {
            let _ = tx.send(Arc::new(favorites));
        }
    }
}
