//! State management module for Mia.
//!
//! This module provides the core state types:
//!
//! - `player` - connection-bound identity and the uniqueness registry
//! - `cycle` - the sorted circular turn ring with the current pointer
//! - `session` - shared game facts, mutations, per-viewer snapshots
//! - `liveness` - reconciliation against the transport's live set
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        SessionState                        │
//! │                                                            │
//! │  ┌──────────────────┐      ┌────────────────────────────┐  │
//! │  │  PlayerRegistry  │      │         TurnCycle          │  │
//! │  │                  │      │                            │  │
//! │  │ connection_id →  │      │   min ─▶ … ─▶ max ──┐      │  │
//! │  │   Player         │      │    ▲                │      │  │
//! │  │                  │      │    └────────────────┘      │  │
//! │  │ display_name →   │      │                            │  │
//! │  │   connection_id  │      │   current ─▶ one node      │  │
//! │  └──────────────────┘      └────────────────────────────┘  │
//! │                                                            │
//! │   dice · roll_count · last roller/peeker · visibility      │
//! └────────────────────────────────────────────────────────────┘
//!            ▲                                ▲
//!            │ join/leave/roll/pass/          │ snapshot_for(viewer),
//!            │ peek/reveal                    │ one per connected client
//!            │                                │
//!     external dispatcher ───▶ liveness::reconcile(acting, live set)
//! ```
//!
//! The dispatcher, transport, and broadcast fan-out live outside this
//! crate. They call one mutating operation per incoming action, then
//! reconcile liveness, then (if anything changed) request one snapshot
//! per connected viewer. The snapshots differ per viewer because dice
//! visibility is privacy-scoped.

pub mod cycle;
pub mod liveness;
pub mod player;
pub mod session;

// Re-export commonly used types
pub use cycle::TurnCycle;
pub use liveness::{reconcile, ReconcileOutcome};
pub use player::{order_key, ConnectionId, Player, PlayerRegistry, RegisterError};
pub use session::{
    DiceVisibility, SessionError, SessionState, StateSummary, EVERYONE, INITIAL_DICE,
};
