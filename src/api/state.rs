use std::sync::Arc;

use crate::{
    db::store::{FavoriteStore, RatingStore},
    services::{
        providers::MovieProvider, recommendations::RecommendationParams, FavoritesService,
        RatingService,
    },
};

/// Shared application state, passed explicitly to every handler.
///
/// All collaborators hang off this context object; nothing is reached
/// through globals.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MovieProvider>,
    pub favorites: Arc<FavoritesService>,
    pub ratings: Arc<RatingService>,
    pub params: RecommendationParams,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn MovieProvider>,
        rating_store: Arc<dyn RatingStore>,
        favorite_store: Arc<dyn FavoriteStore>,
        params: RecommendationParams,
    ) -> Self {
        Self {
            provider,
            favorites: Arc::new(FavoritesService::new(favorite_store)),
            ratings: Arc::new(RatingService::new(rating_store)),
            params,
        }
    }
}
