pub mod favorites;
pub mod providers;
pub mod ratings;
pub mod recommendations;

pub use favorites::FavoritesService;
pub use ratings::RatingService;
