use std::collections::HashMap;

use rand::{seq::SliceRandom, Rng};

use crate::models::{Favorite, MovieRecord};

/// Genre tag mapped to how many favorites carry it.
///
/// Derived from the favorite set on every pass and never persisted.
pub type PreferenceModel = HashMap<String, u32>;

/// Scoring knobs for the recommendation engine.
///
/// The recency window and bonus are tuning constants with no recorded
/// rationale, so they stay configurable rather than hard-coded.
#[derive(Debug, Clone)]
pub struct RecommendationParams {
    /// How far back a release year still counts as recent, in years
    pub recency_window_years: i32,
    /// Flat score bonus applied to recent releases
    pub recency_bonus: u32,
    /// Maximum number of recommendations returned
    pub max_results: usize,
}

impl Default for RecommendationParams {
    fn default() -> Self {
        Self {
            recency_window_years: 10,
            recency_bonus: 1,
            max_results: 10,
        }
    }
}

/// A candidate movie with its computed score; lives for one ranking pass
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub movie: MovieRecord,
    pub score: u32,
}

/// Derives the genre-weight mapping from a user's favorite set.
///
/// Each favorite contributes one count per genre tag it carries; a
/// favorite without genres contributes nothing.
pub fn build_preference_model(favorites: &[Favorite]) -> PreferenceModel {
    let mut model = PreferenceModel::new();

    for favorite in favorites {
        for tag in favorite.movie.genres() {
            *model.entry(tag.to_string()).or_insert(0) += 1;
        }
    }

    model
}

/// Scores every candidate that is not already a favorite.
///
/// Score = sum of the preference weights of the candidate's genre tags,
/// plus a flat bonus when the release year falls within the recency
/// window ending at `current_year`. An unparsable year simply earns no
/// bonus.
pub fn score_candidates(
    model: &PreferenceModel,
    favorites: &[Favorite],
    pool: &[MovieRecord],
    current_year: i32,
    params: &RecommendationParams,
) -> Vec<ScoredCandidate> {
    pool.iter()
        .filter(|movie| {
            !favorites
                .iter()
                .any(|favorite| favorite.movie.imdb_id == movie.imdb_id)
        })
        .map(|movie| {
            let genre_score: u32 = movie
                .genres()
                .map(|tag| model.get(tag).copied().unwrap_or(0))
                .sum();

            let recency = match movie.release_year() {
                Some(year) if year >= current_year - params.recency_window_years => {
                    params.recency_bonus
                }
                _ => 0,
            };

            ScoredCandidate {
                movie: movie.clone(),
                score: genre_score + recency,
            }
        })
        .collect()
}

/// Orders scored candidates and truncates to a bounded list.
///
/// Primary order is descending score with the catalog identifier as a
/// stable secondary key, then candidates within each equal-score run are
/// shuffled with the supplied RNG. A fixed seed therefore yields a fully
/// deterministic order.
pub fn rank<R: Rng>(
    mut scored: Vec<ScoredCandidate>,
    max_results: usize,
    rng: &mut R,
) -> Vec<MovieRecord> {
    scored.sort_unstable_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.movie.imdb_id.cmp(&b.movie.imdb_id))
    });

    let mut start = 0;
    while start < scored.len() {
        let score = scored[start].score;
        let run = scored[start..].iter().take_while(|c| c.score == score).count();
        scored[start..start + run].shuffle(rng);
        start += run;
    }

    scored.truncate(max_results);
    scored.into_iter().map(|c| c.movie).collect()
}

/// Full recommendation pass: favorites and a candidate pool in, a ranked
/// list of at most `params.max_results` movies out.
///
/// An empty favorite set or candidate pool yields an empty list without
/// invoking scoring.
pub fn recommend<R: Rng>(
    favorites: &[Favorite],
    pool: &[MovieRecord],
    current_year: i32,
    params: &RecommendationParams,
    rng: &mut R,
) -> Vec<MovieRecord> {
    if favorites.is_empty() || pool.is_empty() {
        return vec![];
    }

    let model = build_preference_model(favorites);
    let scored = score_candidates(&model, favorites, pool, current_year, params);
    rank(scored, params.max_results, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieKind;
    use chrono::Utc;
    use rand::{rngs::StdRng, SeedableRng};

    const CURRENT_YEAR: i32 = 2026;

    fn movie(id: &str, year: &str, genre: Option<&str>) -> MovieRecord {
        MovieRecord {
            imdb_id: id.to_string(),
            title: id.to_string(),
            year: year.to_string(),
            poster: String::new(),
            kind: MovieKind::Movie,
            genre: genre.map(str::to_string),
            plot: None,
            director: None,
            actors: None,
        }
    }

    fn favorite(id: &str, genre: Option<&str>) -> Favorite {
        Favorite::new(movie(id, "2015", genre), Utc::now())
    }

    #[test]
    fn test_preference_model_counts_genre_occurrences() {
        let favorites = vec![
            favorite("tt1", Some("Action, Sci-Fi")),
            favorite("tt2", Some("Action, Drama")),
            favorite("tt3", None),
        ];

        let model = build_preference_model(&favorites);
        assert_eq!(model.get("Action"), Some(&2));
        assert_eq!(model.get("Sci-Fi"), Some(&1));
        assert_eq!(model.get("Drama"), Some(&1));
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn test_scorer_excludes_favorites_entirely() {
        let favorites = vec![favorite("tt1", Some("Action"))];
        let pool = vec![
            movie("tt1", "2020", Some("Action")),
            movie("tt2", "2020", Some("Action")),
        ];

        let model = build_preference_model(&favorites);
        let scored = score_candidates(
            &model,
            &favorites,
            &pool,
            CURRENT_YEAR,
            &RecommendationParams::default(),
        );

        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].movie.imdb_id, "tt2");
    }

    #[test]
    fn test_genre_overlap_scoring() {
        let favorites = vec![
            favorite("tt1", Some("Action, Sci-Fi")),
            favorite("tt2", Some("Action")),
        ];
        let pool = vec![movie("tt3", "1990", Some("Action, Sci-Fi, Romance"))];

        let model = build_preference_model(&favorites);
        let scored = score_candidates(
            &model,
            &favorites,
            &pool,
            CURRENT_YEAR,
            &RecommendationParams::default(),
        );

        // Action weighs 2, Sci-Fi 1, Romance 0; 1990 earns no recency bonus
        assert_eq!(scored[0].score, 3);
    }

    #[test]
    fn test_recency_bonus_boundaries() {
        let favorites = vec![favorite("tt1", Some("Action"))];
        let params = RecommendationParams::default();
        let model = build_preference_model(&favorites);

        let cases = [
            (CURRENT_YEAR.to_string(), 1),
            ((CURRENT_YEAR - 10).to_string(), 1),
            ((CURRENT_YEAR - 11).to_string(), 0),
            ("N/A".to_string(), 0),
        ];

        for (year, expected_bonus) in cases {
            let pool = vec![movie("tt2", &year, None)];
            let scored = score_candidates(&model, &favorites, &pool, CURRENT_YEAR, &params);
            assert_eq!(scored[0].score, expected_bonus, "year {}", year);
        }
    }

    #[test]
    fn test_recommend_empty_inputs() {
        let mut rng = StdRng::seed_from_u64(7);
        let params = RecommendationParams::default();

        let pool = vec![movie("tt2", "2020", Some("Action"))];
        assert!(recommend(&[], &pool, CURRENT_YEAR, &params, &mut rng).is_empty());

        let favorites = vec![favorite("tt1", Some("Action"))];
        assert!(recommend(&favorites, &[], CURRENT_YEAR, &params, &mut rng).is_empty());
    }

    #[test]
    fn test_recommend_empty_when_pool_is_all_favorites() {
        let mut rng = StdRng::seed_from_u64(7);
        let favorites = vec![favorite("tt1", Some("Action"))];
        let pool = vec![movie("tt1", "2020", Some("Action"))];

        let result = recommend(
            &favorites,
            &pool,
            CURRENT_YEAR,
            &RecommendationParams::default(),
            &mut rng,
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_rank_truncates_to_max_results() {
        let mut rng = StdRng::seed_from_u64(7);
        let favorites = vec![favorite("tt0", Some("Action"))];
        let pool: Vec<MovieRecord> = (1..=25)
            .map(|i| movie(&format!("tt{:07}", i), "2020", Some("Action")))
            .collect();

        let result = recommend(
            &favorites,
            &pool,
            CURRENT_YEAR,
            &RecommendationParams::default(),
            &mut rng,
        );
        assert_eq!(result.len(), 10);
    }

    #[test]
    fn test_rank_orders_by_descending_score() {
        let mut rng = StdRng::seed_from_u64(7);
        let favorites = vec![favorite("tt0", Some("Action, Sci-Fi"))];
        let pool = vec![
            movie("tt1", "1990", None),                   // 0
            movie("tt2", "1990", Some("Action, Sci-Fi")), // 2
            movie("tt3", "1990", Some("Action")),         // 1
        ];

        let result = recommend(
            &favorites,
            &pool,
            CURRENT_YEAR,
            &RecommendationParams::default(),
            &mut rng,
        );
        let ids: Vec<&str> = result.iter().map(|m| m.imdb_id.as_str()).collect();
        assert_eq!(ids, vec!["tt2", "tt3", "tt1"]);
    }

    #[test]
    fn test_rank_is_deterministic_for_a_fixed_seed() {
        let favorites = vec![favorite("tt0", Some("Action"))];
        let pool: Vec<MovieRecord> = (1..=15)
            .map(|i| movie(&format!("tt{:07}", i), "2020", Some("Action")))
            .collect();
        let params = RecommendationParams::default();

        let mut first_rng = StdRng::seed_from_u64(42);
        let first = recommend(&favorites, &pool, CURRENT_YEAR, &params, &mut first_rng);

        let mut second_rng = StdRng::seed_from_u64(42);
        let second = recommend(&favorites, &pool, CURRENT_YEAR, &params, &mut second_rng);

        assert_eq!(first, second);
    }

    #[test]
    fn test_tie_shuffle_stays_within_score_runs() {
        let mut rng = StdRng::seed_from_u64(42);
        let favorites = vec![favorite("tt0", Some("Action"))];
        // Two tied high scorers, one clear loser
        let pool = vec![
            movie("tt1", "2020", Some("Action")),
            movie("tt2", "2020", Some("Action")),
            movie("tt3", "1990", None),
        ];

        let result = recommend(
            &favorites,
            &pool,
            CURRENT_YEAR,
            &RecommendationParams::default(),
            &mut rng,
        );

        // The loser never escapes last place regardless of the shuffle
        assert_eq!(result[2].imdb_id, "tt3");
        let mut leaders: Vec<&str> = result[..2].iter().map(|m| m.imdb_id.as_str()).collect();
        leaders.sort_unstable();
        assert_eq!(leaders, vec!["tt1", "tt2"]);
    }
}
