//! Favorites scoring.
//!
//! Clients send `FAV-GAME` and `FAV-PLAYER` as `;`-separated substring
//! lists. Matches are scored, never filtered:
//! - a match counts once if any favorite-game substring occurs in its name,
//! - every participant whose name contains any favorite-player substring
//!   counts once.
//!
//! Both keys must be present; otherwise nothing is scored.

use crate::game::Match;
use crate::parameter::{split_favorites, Parameter};

pub const FAV_GAME: &str = "FAV-GAME";
pub const FAV_PLAYER: &str = "FAV-PLAYER";

/// Running totals, accumulated across one or more matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FavoriteScore {
    pub games: u32,
    pub players: u32,
}

/// Favorite substrings decoded from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favorites {
    games: Vec<String>,
    players: Vec<String>,
}

impl Favorites {
    /// `None` unless both `FAV-GAME` and `FAV-PLAYER` are present.
    pub fn from_parameter(parameter: &Parameter) -> Option<Self> {
        let games = parameter.get(FAV_GAME)?;
        let players = parameter.get(FAV_PLAYER)?;

        Some(Favorites {
            games: split_favorites(games),
            players: split_favorites(players),
        })
    }

    /// Add one match's contribution to `score`.
    pub fn score(&self, game: &Match, score: &mut FavoriteScore) {
        // Case-sensitive; the first hit is enough for the match.
        if self.games.iter().any(|fav| game.name.contains(fav.as_str())) {
            score.games += 1;
        }

        score.players += game
            .players
            .iter()
            .filter(|p| self.players.iter().any(|fav| p.name.contains(fav.as_str())))
            .count() as u32;
    }
}

/// Score a single match into caller-supplied accumulators.
pub fn score_match(parameter: &Parameter, game: &Match, score: &mut FavoriteScore) {
    if let Some(favorites) = Favorites::from_parameter(parameter) {
        favorites.score(game, score);
    }
}

/// Score every match in `games` into caller-supplied accumulators.
pub fn score_matches<'a, I>(parameter: &Parameter, games: I, score: &mut FavoriteScore)
where
    I: IntoIterator<Item = &'a Match>,
{
    if let Some(favorites) = Favorites::from_parameter(parameter) {
        for game in games {
            favorites.score(game, score);
        }
    }
}
