//! theater-core
//!
//! Pure matchmaking logic:
//! - region catalog
//! - request parameters
//! - matches and participants
//! - concurrent match registry
//! - favorites scoring

pub mod region;
pub mod parameter;
pub mod player;
pub mod game;
pub mod matchmaker;
pub mod favorites;
pub mod error;

pub use region::{Region, CATALOG};
pub use parameter::Parameter;
pub use player::Participant;
pub use game::{Match, MatchId};
pub use matchmaker::MatchRegistry;
pub use favorites::FavoriteScore;
pub use error::MatchError;
