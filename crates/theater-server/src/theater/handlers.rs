//! Theater action handlers and the dispatch table.
//!
//! Handlers are plain synchronous functions: they read the request
//! parameters, touch the match registry under its own lock, and return
//! the frames to send. A handler that cannot proceed (missing key,
//! unknown owner) returns an empty [`Reply`]; nothing propagates past it.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use theater_core::favorites::score_match;
use theater_core::parameter::add_quote;
use theater_core::{FavoriteScore, Parameter, Region, CATALOG};
use theater_protocol::wire_types::action;
use tracing::debug;

use super::TheaterContext;

/// Port every advertised match listens on.
pub const GAME_PORT: u16 = 28500;

/// Seconds between client-side match updates, sent after CGAM.
pub const QUENCH_SECS: u32 = 20;

/// Free-text `IMPORTANT` value carried by the first CONN reply.
pub const CONN_NOTICE: &str = "Elon_Musk_Wants_to_Embed_AI-on-a-Chip_Into_Every_Human_Brain";

/// Ticket handed to every authenticated user.
pub const SESSION_TICKET: &str = "\"1111\"";

// Request keys
const TID: &str = "TID";
const TEXT: &str = "TEXT";
const LOBBY_ID: &str = "LOBBY-ID";
const TYPE: &str = "TYPE";

/// Whether the session keeps reading after a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Disconnect,
}

/// Frames to send, in order, and what to do afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub frames: Vec<(&'static str, Parameter)>,
    pub flow: Flow,
}

impl Reply {
    /// Nothing to send; keep reading.
    pub fn none() -> Self {
        Reply {
            frames: Vec::new(),
            flow: Flow::Continue,
        }
    }

    pub fn frame(action: &'static str, parameter: Parameter) -> Self {
        let mut reply = Reply::none();
        reply.push(action, parameter);
        reply
    }

    /// Nothing to send; end the session.
    pub fn disconnect() -> Self {
        Reply {
            frames: Vec::new(),
            flow: Flow::Disconnect,
        }
    }

    pub fn push(&mut self, action: &'static str, parameter: Parameter) {
        self.frames.push((action, parameter));
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Everything a handler may look at for one request.
pub struct RequestContext<'a> {
    pub peer: SocketAddr,
    pub context: &'a TheaterContext,
    pub parameter: &'a Parameter,
}

impl RequestContext<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.parameter.get(key)
    }
}

pub type Handler = fn(&RequestContext<'_>) -> Reply;

/// Action code to handler.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, Handler>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<_> = self.handlers.keys().collect();
        actions.sort();
        f.debug_struct("Dispatcher").field("actions", &actions).finish()
    }
}

impl Dispatcher {
    /// Table for the theater protocol.
    pub fn theater() -> Self {
        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();

        handlers.insert(action::CONN, on_conn);
        handlers.insert(action::USER, on_user);
        handlers.insert(action::PROF, on_prof);
        handlers.insert(action::LLST, on_llst);
        handlers.insert(action::GLST, on_glst);
        handlers.insert(action::RLST, on_rlst);
        handlers.insert(action::CGAM, on_cgam);
        handlers.insert(action::UGAM, on_ugam);
        handlers.insert(action::RGAM, on_rgam);
        handlers.insert(action::FILE, on_file);

        Dispatcher { handlers }
    }

    pub fn get(&self, action: &str) -> Option<Handler> {
        self.handlers.get(action).copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// ============================================================================
// Session setup
// ============================================================================

/// Two frames: the notice-carrying one first, then the bare capability set.
fn on_conn(_req: &RequestContext<'_>) -> Reply {
    let mut notice = Parameter::new();
    notice.insert("NUM-CHALLENGES", "0");
    notice.insert("IMPORTANT", CONN_NOTICE);
    let mut reply = Reply::frame(action::CONN, notice);

    let mut response = Parameter::new();
    response.insert("NUM-CHALLENGES", "0");
    reply.push(action::CONN, response);

    reply
}

fn on_user(_req: &RequestContext<'_>) -> Reply {
    let mut response = Parameter::new();
    response.insert("TICKET", SESSION_TICKET);

    Reply::frame(action::USER, response)
}

/// Profanity filter that filters nothing.
fn on_prof(req: &RequestContext<'_>) -> Reply {
    let Some(text) = req.get(TEXT) else {
        debug!(server = "theater", "PROF without {}", TEXT);
        return Reply::none();
    };

    let mut response = Parameter::new();
    response.insert("CLEAN-TEXT", text);

    Reply::frame(action::PROF, response)
}

// ============================================================================
// Lobby browsing
// ============================================================================

fn on_llst(req: &RequestContext<'_>) -> Reply {
    let Some(tid) = req.get(TID) else {
        debug!(server = "theater", "LLST without {}", TID);
        return Reply::none();
    };

    let mut summary = Parameter::new();
    summary.insert(TID, tid);
    summary.insert("NUM-LOBBIES", CATALOG.len().to_string());
    let mut reply = Reply::frame(action::LLST, summary);

    for region in CATALOG {
        let (num_games, score) = req.context.matchmaker.region_summary(region, req.parameter);

        let mut lobby = Parameter::new();
        lobby.insert(TID, tid);
        lobby.insert(LOBBY_ID, region.id().to_string());
        lobby.insert("NAME", add_quote(region.name()));
        lobby.insert("LOCALE", "1");
        lobby.insert("NUM-GAMES", num_games.to_string());
        lobby.insert("FAVORITE-GAMES", score.games.to_string());
        lobby.insert("FAVORITE-PLAYERS", score.players.to_string());
        reply.push(action::LDAT, lobby);
    }

    reply
}

fn on_glst(req: &RequestContext<'_>) -> Reply {
    let (Some(tid), Some(lobby_id)) = (req.get(TID), req.get(LOBBY_ID)) else {
        debug!(server = "theater", "GLST without {} or {}", TID, LOBBY_ID);
        return Reply::none();
    };

    let games = req.context.matchmaker.find_by_region(Region::parse(lobby_id));

    let mut summary = Parameter::new();
    summary.insert(TID, tid);
    summary.insert(LOBBY_ID, lobby_id);
    summary.insert("NUM-GAMES", games.len().to_string());
    let mut reply = Reply::frame(action::GLST, summary);

    for game in &games {
        let mut score = FavoriteScore::default();
        score_match(req.parameter, game, &mut score);

        let mut entry = Parameter::new();
        entry.insert(TID, tid);
        entry.insert("IP", add_quote(&game.ip));
        entry.insert("PORT", GAME_PORT.to_string());
        entry.insert("GAME-ID", game.id.to_string());
        entry.insert("FAVORITE", score.games.to_string());
        entry.insert("NUM-FAV-PLAYERS", score.players.to_string());
        entry.insert("NUM-PLAYERS", game.num_players.to_string());
        entry.insert("MAX-PLAYERS", game.max_players.to_string());
        entry.insert("NAME", add_quote(&game.name));
        reply.push(action::GDAT, entry);
    }

    reply
}

fn on_rlst(req: &RequestContext<'_>) -> Reply {
    let Some(tid) = req.get(TID) else {
        debug!(server = "theater", "RLST without {}", TID);
        return Reply::none();
    };

    let mut summary = Parameter::new();
    summary.insert(TID, tid);
    summary.insert("NUM-REGIONS", CATALOG.len().to_string());
    let mut reply = Reply::frame(action::RLST, summary);

    for region in CATALOG {
        let num_games = req.context.matchmaker.find_by_region(region).len();

        let mut entry = Parameter::new();
        entry.insert(TID, tid);
        entry.insert("REGION-ID", region.id().to_string());
        entry.insert("NAME", add_quote(region.name()));
        entry.insert("LOCALE", "0");
        entry.insert("NUM-GAMES", num_games.to_string());
        entry.insert("NUM-PLAYERS", "0");
        reply.push(action::RDAT, entry);
    }

    reply
}

// ============================================================================
// Hosting
// ============================================================================

fn on_cgam(req: &RequestContext<'_>) -> Reply {
    let game = match req.context.matchmaker.create(req.peer, req.parameter) {
        Ok(game) => game,
        Err(e) => {
            debug!(server = "theater", "CGAM from {} rejected: {}", req.peer, e);
            return Reply::none();
        }
    };

    debug!(
        server = "theater",
        "Match {} created by {} in {}",
        game.id,
        req.peer,
        game.region.name()
    );

    // Region id as an unsigned byte: Unknown (-1) goes out as 255.
    let mut created = Parameter::new();
    created.insert(LOBBY_ID, (game.region.id() as u8).to_string());
    created.insert("GAME-ID", game.id.to_string());
    let mut reply = Reply::frame(action::CGAM, created);

    let mut quench = Parameter::new();
    quench.insert("QUENCH", QUENCH_SECS.to_string());
    reply.push(action::UGAM, quench);

    reply
}

fn on_ugam(req: &RequestContext<'_>) -> Reply {
    if !req.context.matchmaker.update(req.peer, req.parameter) {
        debug!(server = "theater", "UGAM from {}: no match owned", req.peer);
    }

    Reply::none()
}

fn on_rgam(req: &RequestContext<'_>) -> Reply {
    req.context.matchmaker.remove(&req.peer.to_string());

    Reply::none()
}

/// File transfer is not served; the lookup is logged and the session ends.
fn on_file(req: &RequestContext<'_>) -> Reply {
    match req.get(TYPE) {
        Some(kind) => match req.context.files.get(kind) {
            Some(data) => debug!(server = "theater", "FILE {} cached ({} bytes)", kind, data.len()),
            None => debug!(server = "theater", "FILE {} not cached", kind),
        },
        None => debug!(server = "theater", "FILE without {}", TYPE),
    }

    Reply::disconnect()
}
