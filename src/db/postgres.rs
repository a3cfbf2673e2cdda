use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use uuid::Uuid;

use crate::{
    db::store::{FavoriteStore, RatingStore, VersionedAggregate},
    error::AppResult,
    models::{Favorite, MovieKind, MovieRecord, RatingAggregate, UserRating},
};

/// Creates a PostgreSQL connection pool and applies pending migrations
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// PostgreSQL-backed rating and favorite store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RatingStore for PgStore {
    async fn get_aggregate(&self, movie_id: &str) -> AppResult<VersionedAggregate> {
        sqlx::query("INSERT INTO movie_ratings (movie_id) VALUES ($1) ON CONFLICT (movie_id) DO NOTHING")
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query(
            "SELECT average_rating, ratings_count, version FROM movie_ratings WHERE movie_id = $1",
        )
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(VersionedAggregate {
            aggregate: RatingAggregate {
                average_rating: row.get::<f64, _>("average_rating"),
                ratings_count: row.get::<i64, _>("ratings_count") as u32,
            },
            version: row.get::<i64, _>("version") as u64,
        })
    }

    async fn get_user_rating(
        &self,
        movie_id: &str,
        user_id: Uuid,
    ) -> AppResult<Option<UserRating>> {
        let row = sqlx::query("SELECT value FROM user_ratings WHERE movie_id = $1 AND user_id = $2")
            .bind(movie_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| UserRating {
            value: r.get::<i16, _>("value") as u8,
        }))
    }

    async fn put_aggregate(&self, movie_id: &str, aggregate: RatingAggregate) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO movie_ratings (movie_id, average_rating, ratings_count, version)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (movie_id) DO UPDATE
            SET average_rating = $2, ratings_count = $3, version = movie_ratings.version + 1
            "#,
        )
        .bind(movie_id)
        .bind(aggregate.average_rating)
        .bind(aggregate.ratings_count as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn put_aggregate_checked(
        &self,
        movie_id: &str,
        expected_version: u64,
        aggregate: RatingAggregate,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE movie_ratings
            SET average_rating = $3, ratings_count = $4, version = version + 1
            WHERE movie_id = $1 AND version = $2
            "#,
        )
        .bind(movie_id)
        .bind(expected_version as i64)
        .bind(aggregate.average_rating)
        .bind(aggregate.ratings_count as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn put_user_rating(
        &self,
        movie_id: &str,
        user_id: Uuid,
        rating: UserRating,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_ratings (movie_id, user_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (movie_id, user_id) DO UPDATE SET value = $3
            "#,
        )
        .bind(movie_id)
        .bind(user_id)
        .bind(rating.value as i16)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl FavoriteStore for PgStore {
    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Favorite>> {
        let rows = sqlx::query(
            r#"
            SELECT movie_id, title, year, poster, kind, genre, added_at
            FROM favorites
            WHERE user_id = $1
            ORDER BY added_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let favorites = rows
            .into_iter()
            .map(|row| Favorite {
                movie: MovieRecord {
                    imdb_id: row.get("movie_id"),
                    title: row.get("title"),
                    year: row.get("year"),
                    poster: row.get("poster"),
                    kind: MovieKind::parse(row.get::<&str, _>("kind")),
                    genre: row.get("genre"),
                    plot: None,
                    director: None,
                    actors: None,
                },
                added_at: row.get::<DateTime<Utc>, _>("added_at"),
            })
            .collect();

        Ok(favorites)
    }

    async fn put_favorite(&self, user_id: Uuid, favorite: &Favorite) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO favorites (user_id, movie_id, title, year, poster, kind, genre, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, movie_id) DO UPDATE
            SET title = $3, year = $4, poster = $5, kind = $6, genre = $7, added_at = $8
            "#,
        )
        .bind(user_id)
        .bind(&favorite.movie.imdb_id)
        .bind(&favorite.movie.title)
        .bind(&favorite.movie.year)
        .bind(&favorite.movie.poster)
        .bind(favorite.movie.kind.as_str())
        .bind(&favorite.movie.genre)
        .bind(favorite.added_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_favorite(&self, user_id: Uuid, movie_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
