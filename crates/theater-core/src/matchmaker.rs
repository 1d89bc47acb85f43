//! Concurrent registry of advertised matches.
//!
//! Locking discipline: one readers-writer lock over the whole list.
//! - `find_by_region`, `region_summary`, `get_all`: shared
//! - `create`, `update`, `remove`: exclusive
//!
//! Matches are keyed by their owner (`ip:port` of the creating session).
//! Nothing stops one owner from creating several matches; `remove`
//! drops all of them.

use std::net::SocketAddr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::MatchError;
use crate::favorites::{FavoriteScore, Favorites};
use crate::game::{Match, MatchId, DEFAULT_PUBLIC_IP};
use crate::parameter::Parameter;
use crate::player::Participant;
use crate::region::Region;

pub const HOST_PLAYER: &str = "HOST-PLAYER";
pub const NAME: &str = "NAME";
pub const REGION_ID: &str = "REGION-ID";
pub const MAX_PLAYERS: &str = "MAX-PLAYERS";
pub const NUM_PLAYERS: &str = "NUM-PLAYERS";

/// Highest indexed `PLAYER-NAME.i` / `TICKET.i` slot read on update.
pub const MAX_PLAYER_SLOTS: usize = 8;

/// Thread-safe collection of active matches.
#[derive(Debug)]
pub struct MatchRegistry {
    games: RwLock<Vec<Match>>,

    /// Address advertised for peers behind the private NAT prefix.
    public_ip: String,
}

impl Default for MatchRegistry {
    fn default() -> Self {
        MatchRegistry::new()
    }
}

impl MatchRegistry {
    pub fn new() -> Self {
        MatchRegistry::with_public_ip(DEFAULT_PUBLIC_IP)
    }

    pub fn with_public_ip(public_ip: impl Into<String>) -> Self {
        MatchRegistry {
            games: RwLock::new(Vec::new()),
            public_ip: public_ip.into(),
        }
    }

    /// Create a match owned by `owner` from a CGAM request.
    ///
    /// Requires `HOST-PLAYER`, `NAME`, `REGION-ID` and `MAX-PLAYERS`;
    /// if any is missing nothing is recorded. An out-of-catalog region is
    /// still accepted as [`Region::Unknown`]. The id is assigned and the
    /// match appended inside the same exclusive section.
    pub fn create(&self, owner: SocketAddr, parameter: &Parameter) -> Result<Match, MatchError> {
        let host_player = require(parameter, HOST_PLAYER)?;
        let name = require(parameter, NAME)?;
        let region = require(parameter, REGION_ID)?;
        let max_players = require(parameter, MAX_PLAYERS)?;

        let mut game = Match::new();
        game.set_name(name);
        game.set_region(region);
        game.set_max_players(max_players);
        game.set_host_player(host_player);
        game.num_players = 1;
        game.set_ip(&owner.ip().to_string(), &self.public_ip);
        game.owner = owner.to_string();
        game.add_player(Participant::host(host_player));

        let mut games = self.write();
        game.id = next_id(&games);
        games.push(game.clone());

        Ok(game)
    }

    /// Replace the participant list of the match owned by `owner`.
    ///
    /// `NUM-PLAYERS` defaults to `"1"` when absent, in which case no
    /// participant slots are read at all. Slots are read from 1 upward
    /// and collection stops at the first slot missing its name or ticket.
    ///
    /// Returns `false` when `owner` has no match.
    pub fn update(&self, owner: SocketAddr, parameter: &Parameter) -> bool {
        let (num_players, players) = match parameter.get(NUM_PLAYERS) {
            Some(num_players) => (num_players, read_player_slots(parameter)),
            None => ("1", Vec::new()),
        };

        let owner = owner.to_string();
        let mut games = self.write();

        match games.iter_mut().find(|g| g.owner == owner) {
            Some(game) => {
                game.set_num_players(num_players);
                game.set_players(players);
                true
            }
            None => false,
        }
    }

    /// Remove every match owned by `owner`. Always succeeds.
    pub fn remove(&self, owner: &str) -> bool {
        self.write().retain(|g| g.owner != owner);
        true
    }

    /// Copies of all matches in `region`, in registry order.
    pub fn find_by_region(&self, region: Region) -> Vec<Match> {
        self.read()
            .iter()
            .filter(|g| g.region == region)
            .cloned()
            .collect()
    }

    /// Match count and favorites score for one region, under one shared lock.
    pub fn region_summary(&self, region: Region, parameter: &Parameter) -> (usize, FavoriteScore) {
        let favorites = Favorites::from_parameter(parameter);
        let mut score = FavoriteScore::default();
        let mut count = 0;

        for game in self.read().iter().filter(|g| g.region == region) {
            count += 1;
            if let Some(favorites) = &favorites {
                favorites.score(game, &mut score);
            }
        }

        (count, score)
    }

    /// Point-in-time copy of every active match.
    pub fn get_all(&self) -> Vec<Match> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    // Lock poisoning is ignored: every write leaves the list consistent.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Match>> {
        self.games.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Match>> {
        self.games.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn require<'a>(parameter: &'a Parameter, key: &'static str) -> Result<&'a str, MatchError> {
    parameter.get(key).ok_or(MatchError::MissingParameter(key))
}

/// One past the highest live id, or 1 for an empty registry.
///
/// Not a counter: removing the highest match frees its id for reuse.
fn next_id(games: &[Match]) -> MatchId {
    games.iter().map(|g| g.id).max().map_or(1, |max| max + 1)
}

fn read_player_slots(parameter: &Parameter) -> Vec<Participant> {
    let mut players = Vec::new();

    for i in 1..=MAX_PLAYER_SLOTS {
        let name = parameter.get(&format!("PLAYER-NAME.{}", i));
        let ticket = parameter.get(&format!("TICKET.{}", i));

        match (name, ticket) {
            (Some(name), Some(ticket)) => players.push(Participant::new(name, ticket)),
            _ => break,
        }
    }

    players
}
