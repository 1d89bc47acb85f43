//! Hosted match representation.
//!
//! A [`Match`] is owned by the [`MatchRegistry`](crate::MatchRegistry);
//! handlers only ever see copies. Setters take raw wire values and
//! apply the same normalization the protocol expects:
//! - display strings lose their surrounding quotes,
//! - numeric fields parse as a byte and keep their old value on failure,
//! - the advertised IP goes through the NAT rewrite.

use serde::Serialize;

use crate::parameter::{parse_byte, remove_quote};
use crate::player::Participant;
use crate::region::Region;

/// Identifier of an active match. Unique among live matches only.
pub type MatchId = u32;

/// Private prefix reported by consoles that sit behind the host's NAT.
pub const NAT_PRIVATE_PREFIX: &str = "10.10.10.";

/// Public address advertised in place of a [`NAT_PRIVATE_PREFIX`] peer.
pub const DEFAULT_PUBLIC_IP: &str = "86.87.139.235";

/// Participant cap when the client never sends a usable one.
pub const DEFAULT_MAX_PLAYERS: u8 = 8;

/// A hosted game advertised for others to join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub id: MatchId,

    /// Advertised IP (possibly rewritten).
    pub ip: String,

    /// Display name, quotes stripped.
    pub name: String,

    pub region: Region,

    pub num_players: u8,
    pub max_players: u8,

    /// Host display name, quotes stripped.
    pub host_player: String,

    /// Participants in join order.
    pub players: Vec<Participant>,

    /// `ip:port` of the session that created the match.
    pub owner: String,
}

impl Default for Match {
    fn default() -> Self {
        Match {
            id: 0,
            ip: String::new(),
            name: String::new(),
            region: Region::Unknown,
            num_players: 0,
            max_players: DEFAULT_MAX_PLAYERS,
            host_player: String::new(),
            players: Vec::new(),
            owner: String::new(),
        }
    }
}

impl Match {
    pub fn new() -> Self {
        Match::default()
    }

    pub fn set_name(&mut self, raw: &str) {
        self.name = remove_quote(raw);
    }

    pub fn set_host_player(&mut self, raw: &str) {
        self.host_player = remove_quote(raw);
    }

    /// Out-of-catalog and unparseable values become [`Region::Unknown`].
    pub fn set_region(&mut self, raw: &str) {
        self.region = Region::parse(raw);
    }

    /// Returns `false` and leaves the count untouched if `raw` does not
    /// start with a number. Trailing text is ignored.
    pub fn set_num_players(&mut self, raw: &str) -> bool {
        match parse_byte(raw) {
            Some(n) => {
                self.num_players = n;
                true
            }
            None => false,
        }
    }

    /// Returns `false` and leaves the cap untouched if `raw` is not a number.
    pub fn set_max_players(&mut self, raw: &str) -> bool {
        match parse_byte(raw) {
            Some(n) => {
                self.max_players = n;
                true
            }
            None => false,
        }
    }

    /// Set the advertised IP from the owning session's peer IP.
    ///
    /// Peers inside [`NAT_PRIVATE_PREFIX`] are advertised as `public_ip`.
    pub fn set_ip(&mut self, peer_ip: &str, public_ip: &str) {
        self.ip = rewrite_nat(peer_ip, public_ip);
    }

    pub fn set_players(&mut self, players: Vec<Participant>) {
        self.players = players;
    }

    pub fn add_player(&mut self, player: Participant) {
        self.players.push(player);
    }
}

/// Apply the NAT rule: a `10.10.10.*` address becomes `public_ip`.
pub fn rewrite_nat(peer_ip: &str, public_ip: &str) -> String {
    if peer_ip.starts_with(NAT_PRIVATE_PREFIX) {
        public_ip.to_string()
    } else {
        peer_ip.to_string()
    }
}

/// Parse an unsigned number and truncate it to a byte (`300` becomes `44`).
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nat_rewrite_only_applies_to_private_prefix() {
        assert_eq!(rewrite_nat("10.10.10.7", DEFAULT_PUBLIC_IP), DEFAULT_PUBLIC_IP);
        assert_eq!(rewrite_nat("203.0.113.9", DEFAULT_PUBLIC_IP), "203.0.113.9");
        assert_eq!(rewrite_nat("10.10.1.7", DEFAULT_PUBLIC_IP), "10.10.1.7");
    }

    #[test]
    fn numeric_setters_keep_old_value_on_garbage() {
        let mut game = Match::new();
        assert_eq!(game.max_players, DEFAULT_MAX_PLAYERS);

        assert!(!game.set_max_players("\"8\""));
        assert_eq!(game.max_players, DEFAULT_MAX_PLAYERS);

        assert!(game.set_max_players("16"));
        assert_eq!(game.max_players, 16);

        assert!(game.set_num_players("300"));
        assert_eq!(game.num_players, 44);

        assert!(!game.set_num_players("lots"));
        assert_eq!(game.num_players, 44);

        assert!(game.set_max_players("12 slots"));
        assert_eq!(game.max_players, 12);

        assert!(game.set_num_players("-1"));
        assert_eq!(game.num_players, 255);
    }

    #[test]
    fn display_setters_strip_quotes() {
        let mut game = Match::new();
        game.set_name("\"Awesome Server\"");
        game.set_host_player("\"Alice\"");
        assert_eq!(game.name, "Awesome Server");
        assert_eq!(game.host_player, "Alice");
    }
}
