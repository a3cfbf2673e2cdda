use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Favorite, MovieRecord},
    services::{ratings::RatingSummary, recommendations},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct RatingQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub user_id: Uuid,
    pub value: u8,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    /// Candidate pool the caller has accumulated, typically its session's
    /// search results
    pub candidates: Vec<MovieRecord>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Search the movie catalog.
///
/// Provider failures degrade to an empty result list.
pub async fn search_movies(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<MovieRecord>> {
    let movies = match state.provider.search_movies(&params.query).await {
        Ok(movies) => movies,
        Err(e) => {
            tracing::warn!(query = %params.query, error = %e, "Search failed");
            vec![]
        }
    };
    Json(movies)
}

/// Fetch one movie's full metadata; a provider miss is a 404
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MovieRecord>> {
    let movie = match state.provider.lookup_movie(&id).await {
        Ok(movie) => movie,
        Err(e) => {
            tracing::warn!(imdb_id = %id, error = %e, "Lookup failed");
            None
        }
    };

    movie
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No movie with id {}", id)))
}

/// Aggregate rating plus the caller's own rating, if a user is given
pub async fn get_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<RatingQuery>,
) -> Json<RatingSummary> {
    Json(state.ratings.summary(&id, params.user_id).await)
}

/// Record a user's rating of a movie
pub async fn put_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RateRequest>,
) -> AppResult<Json<RatingSummary>> {
    let aggregate = state
        .ratings
        .rate(&id, request.user_id, request.value)
        .await?;

    Ok(Json(RatingSummary {
        average_rating: aggregate.average_rating,
        ratings_count: aggregate.ratings_count,
        user_rating: Some(request.value),
    }))
}

/// The user's favorite set.
///
/// Store failures degrade to an empty list.
pub async fn list_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Json<Vec<Favorite>> {
    let favorites = match state.favorites.list(user_id).await {
        Ok(favorites) => favorites,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Favorites fetch failed");
            vec![]
        }
    };
    Json(favorites)
}

/// Bookmark a movie for the user
pub async fn add_favorite(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(Uuid, String)>,
    Json(movie): Json<MovieRecord>,
) -> AppResult<(StatusCode, Json<Favorite>)> {
    if movie.imdb_id != movie_id {
        return Err(AppError::InvalidInput(format!(
            "Path id {} does not match record id {}",
            movie_id, movie.imdb_id
        )));
    }

    let favorite = state.favorites.add(user_id, movie).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// Remove a bookmark
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(Uuid, String)>,
) -> AppResult<StatusCode> {
    state.favorites.remove(user_id, &movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rank the supplied candidate pool against the user's favorites.
///
/// Store failures degrade to an empty favorite set and therefore an
/// empty recommendation list.
pub async fn recommend(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<RecommendationRequest>,
) -> Json<Vec<MovieRecord>> {
    let favorites = match state.favorites.list(user_id).await {
        Ok(favorites) => favorites,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Favorites fetch failed");
            vec![]
        }
    };

    let current_year = Utc::now().year();
    let mut rng = StdRng::from_entropy();
    let recommendations = recommendations::recommend(
        &favorites,
        &request.candidates,
        current_year,
        &state.params,
        &mut rng,
    );

    Json(recommendations)
}
