//! Participants listed inside a match.

use serde::Serialize;

use crate::parameter::remove_quote;

/// One player slot of a [`Match`](crate::Match).
///
/// Participants only exist inside a match's participant list and are
/// replaced wholesale on every update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Participant {
    /// Display name, quotes stripped.
    pub name: String,

    /// Opaque ticket echoed back without validation, quotes stripped.
    pub ticket: String,
}

impl Participant {
    /// Build from raw wire values (quotes are removed here).
    pub fn new(name: &str, ticket: &str) -> Self {
        Participant {
            name: remove_quote(name),
            ticket: remove_quote(ticket),
        }
    }

    /// A host slot: name only, empty ticket.
    pub fn host(name: &str) -> Self {
        Participant::new(name, "")
    }
}
