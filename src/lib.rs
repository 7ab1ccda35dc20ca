//! Mia State Library
//!
//! This crate provides turn-order and session state management for Mia
//! dice game logic.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Player Registry** - Binds each connection to a chosen display name,
//!   enforcing uniqueness of both.
//!
//! - **Turn Cycle** - A circular sequence of players sorted by a CRC-32
//!   key of their name, with a current-turn pointer that survives joins
//!   and leaves.
//!
//! - **Session State** - Dice values, roll counters, and last-actor labels,
//!   mutated through turn-gated operations and projected into per-viewer
//!   snapshots. Dice values are private to the current player until peeked
//!   or revealed.
//!
//! - **Liveness Reconciliation** - Removes players whose connection has
//!   vanished from the transport's live set.
//!
//! # Design Principles
//!
//! 1. **Turn gating over game rules** - The engine decides *who may act*,
//!    never whether an action is a good play.
//!
//! 2. **Expected failures are outcomes** - Duplicate names, out-of-turn
//!    rolls, and double leaves are reported results, not panics.
//!
//! 3. **No networking** - This crate is pure state; transport, dispatch,
//!    and broadcast live in the consuming server.
//!
//! 4. **Serialization-ready** - Snapshots convert to the wire JSON shape
//!    with privacy-scoped dice visibility.
//!
//! # Example
//!
//! ```rust
//! use mia_state::state::{ConnectionId, SessionState};
//!
//! let mut session = SessionState::with_seed(7);
//! session.join(ConnectionId(1), "Alice").unwrap();
//! session.join(ConnectionId(2), "Bob").unwrap();
//!
//! // Alice joined first and holds the turn.
//! let (first, second) = session.roll_dice(ConnectionId(1)).unwrap();
//! assert!((1..=6).contains(&first) && (1..=6).contains(&second));
//!
//! // Dice stay hidden until the current player peeks or reveals.
//! assert!(session.snapshot_for(ConnectionId(2)).dice.is_none());
//! let peek = session.peek_dice(ConnectionId(1));
//! assert_eq!(peek.dice, Some(session.dice()));
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
