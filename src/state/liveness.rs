//! Liveness reconciliation.
//!
//! The transport hands over the set of connection ids it currently
//! considers live; every registered player whose connection is gone gets
//! removed from the session. Pure sweep, no timers; grace periods and
//! heartbeats belong to the transport.

use std::collections::HashSet;

use crate::state::player::ConnectionId;
use crate::state::session::SessionState;

/// Result of a reconciliation sweep.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Display names of the players removed by this sweep
    pub removed: Vec<String>,
}

impl ReconcileOutcome {
    /// Check if any player was removed.
    pub fn changed(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Remove players whose connection has disappeared.
///
/// Every registered connection other than `acting` that is absent from
/// `live` is removed via [`SessionState::leave`]. The acting connection
/// is exempt: it is communicating right now even if the live set has not
/// caught up to it yet, so checking it would invite self-eviction races.
pub fn reconcile(
    session: &mut SessionState,
    acting: ConnectionId,
    live: &HashSet<ConnectionId>,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    for connection_id in session.connections() {
        if connection_id != acting && !live.contains(&connection_id) {
            if let Ok(player) = session.leave(connection_id) {
                outcome.removed.push(player.display_name);
            }
        }
    }

    if outcome.changed() {
        tracing::info!(
            removed = outcome.removed.len(),
            players = session.player_count(),
            "reconciled dead connections"
        );
    }
    outcome
}
