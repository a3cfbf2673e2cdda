use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/movies/search", get(handlers::search_movies))
        .route("/movies/:id", get(handlers::get_movie))
        // Ratings
        .route("/movies/:id/rating", get(handlers::get_rating))
        .route("/movies/:id/rating", put(handlers::put_rating))
        // Favorites
        .route("/users/:user_id/favorites", get(handlers::list_favorites))
        .route(
            "/users/:user_id/favorites/:movie_id",
            put(handlers::add_favorite),
        )
        .route(
            "/users/:user_id/favorites/:movie_id",
            axum::routing::delete(handlers::remove_favorite),
        )
        // Recommendations
        .route(
            "/users/:user_id/recommendations",
            post(handlers::recommend),
        )
}
