use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator used by the metadata provider for multi-valued fields
/// such as `Genre` ("Action, Adventure, Sci-Fi").
pub const GENRE_SEPARATOR: &str = ", ";

/// A normalized catalog item, immutable once fetched from the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub imdb_id: String,
    pub title: String,
    /// Release year as reported by the provider; may be a range like
    /// "2010–2015" for series, so it stays a string
    pub year: String,
    pub poster: String,
    pub kind: MovieKind,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub actors: Option<String>,
}

impl MovieRecord {
    /// Individual genre tags, empty when the provider reported none
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre
            .as_deref()
            .unwrap_or("")
            .split(GENRE_SEPARATOR)
            .filter(|tag| !tag.is_empty())
    }

    /// Leading numeric portion of the year field, if any.
    ///
    /// "2010" parses to 2010 and so does the series range "2010–2015";
    /// anything without a leading digit yields None.
    pub fn release_year(&self) -> Option<i32> {
        let end = self
            .year
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.year.len());
        self.year[..end].parse().ok()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovieKind {
    Movie,
    Series,
    Episode,
}

impl MovieKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieKind::Movie => "movie",
            MovieKind::Series => "series",
            MovieKind::Episode => "episode",
        }
    }

    /// Anything the provider reports outside the known kinds maps to Movie
    pub fn parse(s: &str) -> Self {
        match s {
            "series" => MovieKind::Series,
            "episode" => MovieKind::Episode,
            _ => MovieKind::Movie,
        }
    }
}

/// A user-scoped bookmark of a movie, timestamped.
///
/// The persisted record keeps only the catalog fields needed to list and
/// score favorites; detail metadata is dropped on creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Favorite {
    pub movie: MovieRecord,
    pub added_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(movie: MovieRecord, added_at: DateTime<Utc>) -> Self {
        Self {
            movie: MovieRecord {
                plot: None,
                director: None,
                actors: None,
                ..movie
            },
            added_at,
        }
    }
}

/// Persisted running average and count of all user ratings for one movie.
///
/// Invariant: `average_rating * ratings_count` equals the sum of all
/// currently-recorded user rating values. `average_rating` is 0.0 exactly
/// when `ratings_count` is 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingAggregate {
    pub average_rating: f64,
    pub ratings_count: u32,
}

impl RatingAggregate {
    pub fn zero() -> Self {
        Self {
            average_rating: 0.0,
            ratings_count: 0,
        }
    }
}

/// A single user's rating of one movie, an integer from 1 to 5
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRating {
    pub value: u8,
}

// ============================================================================
// OMDb API Types
// ============================================================================

/// Raw movie payload from the OMDb API.
///
/// Search results carry only the short fields; lookups add genre and the
/// detail metadata. Absent and "N/A" fields normalize to None.
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbMovie {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
    #[serde(rename = "Genre", default)]
    pub genre: Option<String>,
    #[serde(rename = "Plot", default)]
    pub plot: Option<String>,
    #[serde(rename = "Director", default)]
    pub director: Option<String>,
    #[serde(rename = "Actors", default)]
    pub actors: Option<String>,
}

/// OMDb uses the literal string "N/A" for missing fields
fn scrub(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty() && v != "N/A")
}

impl From<OmdbMovie> for MovieRecord {
    fn from(raw: OmdbMovie) -> Self {
        let kind = MovieKind::parse(raw.kind.as_deref().unwrap_or("movie"));

        MovieRecord {
            imdb_id: raw.imdb_id,
            title: raw.title,
            year: raw.year,
            poster: scrub(raw.poster).unwrap_or_default(),
            kind,
            genre: scrub(raw.genre),
            plot: scrub(raw.plot),
            director: scrub(raw.director),
            actors: scrub(raw.actors),
        }
    }
}

/// Response envelope from the OMDb search endpoint (`?s=`).
///
/// On "no results" OMDb answers `{"Response": "False", "Error": ...}` with
/// no `Search` array at all, which the default covers.
#[derive(Debug, Deserialize)]
pub struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    pub search: Vec<OmdbMovie>,
    #[serde(rename = "Response")]
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: &str, genre: Option<&str>) -> MovieRecord {
        MovieRecord {
            imdb_id: "tt1375666".to_string(),
            title: "Inception".to_string(),
            year: year.to_string(),
            poster: String::new(),
            kind: MovieKind::Movie,
            genre: genre.map(str::to_string),
            plot: None,
            director: None,
            actors: None,
        }
    }

    #[test]
    fn test_genres_split() {
        let movie = record("2010", Some("Action, Adventure, Sci-Fi"));
        let genres: Vec<&str> = movie.genres().collect();
        assert_eq!(genres, vec!["Action", "Adventure", "Sci-Fi"]);
    }

    #[test]
    fn test_genres_missing() {
        let movie = record("2010", None);
        assert_eq!(movie.genres().count(), 0);
    }

    #[test]
    fn test_release_year_plain() {
        assert_eq!(record("2010", None).release_year(), Some(2010));
    }

    #[test]
    fn test_release_year_series_range() {
        assert_eq!(record("2010–2015", None).release_year(), Some(2010));
    }

    #[test]
    fn test_release_year_unparsable() {
        assert_eq!(record("N/A", None).release_year(), None);
        assert_eq!(record("", None).release_year(), None);
    }

    #[test]
    fn test_movie_kind_parse_unknown_defaults_to_movie() {
        assert_eq!(MovieKind::parse("game"), MovieKind::Movie);
        assert_eq!(MovieKind::parse("series"), MovieKind::Series);
    }

    #[test]
    fn test_favorite_drops_detail_metadata() {
        let mut movie = record("2010", Some("Action"));
        movie.plot = Some("A thief who steals corporate secrets".to_string());
        movie.director = Some("Christopher Nolan".to_string());

        let favorite = Favorite::new(movie, Utc::now());
        assert_eq!(favorite.movie.plot, None);
        assert_eq!(favorite.movie.director, None);
        assert_eq!(favorite.movie.genre, Some("Action".to_string()));
    }

    #[test]
    fn test_omdb_movie_normalization() {
        let json = r#"{
            "imdbID": "tt1375666",
            "Title": "Inception",
            "Year": "2010",
            "Poster": "https://example.com/poster.jpg",
            "Type": "movie",
            "Genre": "Action, Sci-Fi",
            "Plot": "N/A",
            "Director": "Christopher Nolan",
            "Actors": "N/A"
        }"#;

        let raw: OmdbMovie = serde_json::from_str(json).unwrap();
        let movie: MovieRecord = raw.into();
        assert_eq!(movie.imdb_id, "tt1375666");
        assert_eq!(movie.kind, MovieKind::Movie);
        assert_eq!(movie.genre, Some("Action, Sci-Fi".to_string()));
        assert_eq!(movie.plot, None);
        assert_eq!(movie.director, Some("Christopher Nolan".to_string()));
        assert_eq!(movie.actors, None);
    }

    #[test]
    fn test_omdb_search_result_minimal_fields() {
        let json = r#"{
            "Search": [
                {"imdbID": "tt0133093", "Title": "The Matrix", "Year": "1999",
                 "Poster": "https://example.com/matrix.jpg", "Type": "movie"}
            ],
            "totalResults": "1",
            "Response": "True"
        }"#;

        let response: OmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.search.len(), 1);

        let movie: MovieRecord = response.search[0].clone().into();
        assert_eq!(movie.title, "The Matrix");
        assert_eq!(movie.genre, None);
    }

    #[test]
    fn test_omdb_search_no_results() {
        let json = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        let response: OmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.search.is_empty());
        assert_eq!(response.response, "False");
    }
}
