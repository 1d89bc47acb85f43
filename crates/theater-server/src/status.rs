//! Point-in-time status report.
//!
//! Built from the match registry and a listener snapshot; neither is
//! locked while the report is serialized.

use chrono::{DateTime, Utc};
use serde::Serialize;
use theater_core::{Match, MatchRegistry};

use crate::listener::Listener;
use crate::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub ip: String,
    pub port: u16,
    pub last_received: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub matches: Vec<Match>,
    pub theater: Vec<SessionInfo>,
}

impl StatusReport {
    pub async fn collect<S: Session>(matchmaker: &MatchRegistry, theater: &Listener<S>) -> Self {
        let theater = theater
            .snapshot()
            .await
            .iter()
            .map(|session| {
                let connection = session.connection();
                SessionInfo {
                    ip: connection.ip().to_string(),
                    port: connection.port(),
                    last_received: connection.last_activity_wall(),
                }
            })
            .collect();

        StatusReport {
            matches: matchmaker.get_all(),
            theater,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
