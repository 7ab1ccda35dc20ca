//! Session state and per-viewer snapshots.
//!
//! One `SessionState` per process-lifetime game session. It exclusively
//! owns the player registry and the turn cycle, applies the mutating
//! operations (join, leave, roll, pass, peek, reveal), and derives the
//! viewer-scoped summary handed to the broadcast layer.
//!
//! All operations are synchronous and in-memory. A concurrent transport
//! must serialize access, one lock or one owning task around the whole
//! session.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::state::cycle::TurnCycle;
use crate::state::player::{ConnectionId, Player, PlayerRegistry, RegisterError};

/// Dice shown before the first roll of a session.
pub const INITIAL_DICE: (u8, u8) = (3, 1);

/// Name recorded as the last peeker after a reveal.
pub const EVERYONE: &str = "Everyone!";

/// Who may see the dice on their next snapshot.
///
/// Set by the most recent successful mutating operation: peek and reveal
/// grant visibility, everything else hides the dice again. Failed
/// operations leave it untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiceVisibility {
    /// Face down, nobody sees the values
    #[default]
    Hidden,

    /// Only the player who peeked
    PeekedBy(ConnectionId),

    /// Everybody, after a reveal
    Revealed,
}

impl DiceVisibility {
    /// Check whether a viewer may see the dice.
    pub fn permits(&self, viewer: ConnectionId) -> bool {
        match self {
            Self::Hidden => false,
            Self::PeekedBy(peeker) => *peeker == viewer,
            Self::Revealed => true,
        }
    }
}

/// Session operation errors.
///
/// All of these are expected outcomes, reported and state-preserving.
/// None are fatal; the dispatcher simply skips the broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The connection already has a registered player
    DuplicateConnection,
    /// The display name is already taken
    DuplicateName,
    /// The acting player does not hold the current turn
    NotCurrentTurn,
    /// A turn-gated operation was attempted with no players present
    EmptyCycle,
    /// Leave for a connection that has no registered player
    AlreadyAbsent,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateConnection => write!(f, "Connection already registered"),
            Self::DuplicateName => write!(f, "Display name already taken"),
            Self::NotCurrentTurn => write!(f, "It's not your turn"),
            Self::EmptyCycle => write!(f, "No players in the session"),
            Self::AlreadyAbsent => write!(f, "No player for this connection"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<RegisterError> for SessionError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::DuplicateConnection => Self::DuplicateConnection,
            RegisterError::DuplicateName => Self::DuplicateName,
        }
    }
}

/// Per-viewer projection of the shared session state.
///
/// Every field except `dice` is identical for all viewers. The dice pair
/// is attached only under the privacy rule, see [`SessionState::snapshot_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSummary {
    /// Display names in ring order, starting at the minimum order key
    pub players: Vec<String>,

    /// Current player's name, empty if the cycle is empty
    pub current_player: String,

    /// Name of the last roller, empty until the first roll
    pub last_person_to_roll_dice: String,

    /// Name of the last peeker, `"Everyone!"` after a reveal
    pub last_person_to_peek_at_dice: String,

    /// The viewer's own name, empty if unregistered
    pub player_name_for_client: String,

    /// Total rolls across the session's life
    pub dice_roll_count: u64,

    /// Dice values, present only when visible to this viewer
    pub dice: Option<(u8, u8)>,
}

impl StateSummary {
    /// Convert to the wire JSON shape.
    ///
    /// The `dice` key is only present when the viewer may see the values.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "players": self.players,
            "current_player": self.current_player,
            "last_person_to_roll_dice": self.last_person_to_roll_dice,
            "last_person_to_peek_at_dice": self.last_person_to_peek_at_dice,
            "player_name_for_client": self.player_name_for_client,
            "dice_roll_count": self.dice_roll_count,
        });
        if let Some((first, second)) = self.dice {
            obj["dice"] = serde_json::json!([first, second]);
        }
        obj
    }
}

/// Shared state of one game session.
#[derive(Debug)]
pub struct SessionState {
    /// Player identity and uniqueness indexes
    registry: PlayerRegistry,

    /// Sorted circular turn order
    cycle: TurnCycle,

    /// Most recent roll
    dice: (u8, u8),

    /// Total rolls across the session's life
    roll_count: u64,

    /// Last roller's name, empty until the first roll
    last_roller: String,

    /// Last peeker's name, empty until the first peek
    last_peeker: String,

    /// Current dice visibility
    visibility: DiceVisibility,

    /// Dice randomness source
    rng: StdRng,

    /// When the session was created
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Create a session with entropy-seeded dice.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a session with a deterministic dice stream.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: PlayerRegistry::new(),
            cycle: TurnCycle::new(),
            dice: INITIAL_DICE,
            roll_count: 0,
            last_roller: String::new(),
            last_peeker: String::new(),
            visibility: DiceVisibility::Hidden,
            rng,
            created_at: chrono::Utc::now(),
        }
    }

    /// Register a player and weave them into the turn cycle.
    ///
    /// The first player into an empty session takes the current turn.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        display_name: &str,
    ) -> Result<(), SessionError> {
        let player = self.registry.register(connection_id, display_name)?;
        self.cycle.insert(player);
        self.visibility = DiceVisibility::Hidden;

        tracing::info!(
            %connection_id,
            name = display_name,
            players = self.cycle.len(),
            "player joined"
        );
        self.check_invariants();
        Ok(())
    }

    /// Remove a player from the registry and the turn cycle.
    ///
    /// The current turn advances to the successor when the current player
    /// leaves. Returns the removed player.
    pub fn leave(&mut self, connection_id: ConnectionId) -> Result<Player, SessionError> {
        let player = self
            .registry
            .unregister(connection_id)
            .ok_or(SessionError::AlreadyAbsent)?;
        self.cycle.remove(connection_id);
        self.visibility = DiceVisibility::Hidden;

        tracing::info!(
            %connection_id,
            name = %player.display_name,
            players = self.cycle.len(),
            "player left"
        );
        self.check_invariants();
        Ok(player)
    }

    /// Roll both dice. Gated on the current turn.
    pub fn roll_dice(&mut self, connection_id: ConnectionId) -> Result<(u8, u8), SessionError> {
        let name = self.require_current(connection_id)?.display_name.clone();

        self.dice = (self.roll_die(), self.roll_die());
        self.roll_count += 1;
        self.last_roller = name;
        self.visibility = DiceVisibility::Hidden;

        tracing::debug!(%connection_id, roll_count = self.roll_count, "dice rolled");
        Ok(self.dice)
    }

    /// Pass the turn to the predecessor in the ring. Gated on the current turn.
    pub fn pass_left(&mut self, connection_id: ConnectionId) -> Result<(), SessionError> {
        self.require_current(connection_id)?;
        self.cycle.rotate_left();
        self.visibility = DiceVisibility::Hidden;

        tracing::debug!(%connection_id, "turn passed left");
        Ok(())
    }

    /// Pass the turn to the successor in the ring. Gated on the current turn.
    pub fn pass_right(&mut self, connection_id: ConnectionId) -> Result<(), SessionError> {
        self.require_current(connection_id)?;
        self.cycle.rotate_right();
        self.visibility = DiceVisibility::Hidden;

        tracing::debug!(%connection_id, "turn passed right");
        Ok(())
    }

    /// Look at the dice without showing anyone else.
    ///
    /// Silent degrade: a viewer who does not hold the current turn gets a
    /// summary without dice and nothing is recorded. For the current
    /// player the returned summary carries the dice, the peek is recorded
    /// as `last_person_to_peek_at_dice`, and the dice stay visible to that
    /// player until the next successful mutation.
    pub fn peek_dice(&mut self, connection_id: ConnectionId) -> StateSummary {
        let peeker = self
            .require_current(connection_id)
            .map(|player| player.display_name.clone());

        match peeker {
            Ok(name) => {
                self.last_peeker = name;
                self.visibility = DiceVisibility::PeekedBy(connection_id);
                tracing::debug!(%connection_id, "dice peeked");
            }
            Err(_) => {
                tracing::debug!(%connection_id, "peek degraded, dice withheld");
            }
        }
        self.snapshot_for(connection_id)
    }

    /// Show the dice to everyone.
    ///
    /// Like peek, but the peeker is recorded as [`EVERYONE`] and every
    /// viewer's next snapshot carries the dice. Same silent-degrade rule
    /// for a non-current caller.
    pub fn reveal_dice(&mut self, connection_id: ConnectionId) -> StateSummary {
        if self.require_current(connection_id).is_ok() {
            self.last_peeker = EVERYONE.to_string();
            self.visibility = DiceVisibility::Revealed;
            tracing::debug!(%connection_id, "dice revealed to everyone");
        } else {
            tracing::debug!(%connection_id, "reveal degraded, dice withheld");
        }
        self.snapshot_for(connection_id)
    }

    /// Derive the viewer-scoped summary. Pure, read-only.
    ///
    /// The dice pair is attached only if the most recent successful
    /// mutation was this viewer's own peek, or a reveal.
    pub fn snapshot_for(&self, connection_id: ConnectionId) -> StateSummary {
        let dice = if self.visibility.permits(connection_id) {
            Some(self.dice)
        } else {
            None
        };

        StateSummary {
            players: self.cycle.names_in_order(),
            current_player: self
                .cycle
                .current()
                .map(|player| player.display_name.clone())
                .unwrap_or_default(),
            last_person_to_roll_dice: self.last_roller.clone(),
            last_person_to_peek_at_dice: self.last_peeker.clone(),
            player_name_for_client: self
                .registry
                .lookup_by_connection(connection_id)
                .map(|player| player.display_name.clone())
                .unwrap_or_default(),
            dice_roll_count: self.roll_count,
            dice,
        }
    }

    /// The player holding the current turn, if any.
    pub fn current_player(&self) -> Option<&Player> {
        self.cycle.current()
    }

    /// Check if a connection holds the current turn.
    pub fn is_current(&self, connection_id: ConnectionId) -> bool {
        self.cycle
            .current()
            .map(|player| player.connection_id == connection_id)
            .unwrap_or(false)
    }

    /// Most recent dice values.
    pub fn dice(&self) -> (u8, u8) {
        self.dice
    }

    /// Total rolls across the session's life.
    pub fn roll_count(&self) -> u64 {
        self.roll_count
    }

    /// Current dice visibility.
    pub fn visibility(&self) -> DiceVisibility {
        self.visibility
    }

    /// Number of players in the session.
    pub fn player_count(&self) -> usize {
        self.registry.len()
    }

    /// All registered connection ids.
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.registry.connection_ids()
    }

    /// Check that the acting connection holds the current turn.
    fn require_current(&self, connection_id: ConnectionId) -> Result<&Player, SessionError> {
        let current = self.cycle.current().ok_or(SessionError::EmptyCycle)?;
        if current.connection_id != connection_id {
            return Err(SessionError::NotCurrentTurn);
        }
        Ok(current)
    }

    fn roll_die(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }

    /// Structural invariants that must hold after every mutation.
    ///
    /// A mismatch here is a programming error, not a reportable outcome.
    fn check_invariants(&self) {
        debug_assert_eq!(self.cycle.len(), self.registry.len());
        debug_assert_eq!(self.cycle.current().is_none(), self.cycle.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // CRC-32 ascending: Mallory < Trent < Dave < Carol < Bob < Alice.

    const ALICE: ConnectionId = ConnectionId(1);
    const BOB: ConnectionId = ConnectionId(2);
    const CAROL: ConnectionId = ConnectionId(3);

    fn make_session() -> SessionState {
        SessionState::with_seed(42)
    }

    /// Alice and Bob joined, Alice holds the turn.
    fn make_table() -> SessionState {
        let mut session = make_session();
        session.join(ALICE, "Alice").unwrap();
        session.join(BOB, "Bob").unwrap();
        session
    }

    #[test]
    fn test_initial_state() {
        let session = make_session();

        assert_eq!(session.dice(), INITIAL_DICE);
        assert_eq!(session.roll_count(), 0);
        assert_eq!(session.player_count(), 0);
        assert!(session.current_player().is_none());

        let summary = session.snapshot_for(ALICE);
        assert_eq!(summary.players, Vec::<String>::new());
        assert_eq!(summary.current_player, "");
        assert_eq!(summary.last_person_to_roll_dice, "");
        assert_eq!(summary.last_person_to_peek_at_dice, "");
        assert_eq!(summary.player_name_for_client, "");
        assert_eq!(summary.dice_roll_count, 0);
        assert_eq!(summary.dice, None);
    }

    #[test]
    fn test_first_joiner_holds_turn() {
        let session = make_table();

        // Bob's order key is smaller, so the listing leads with Bob, but
        // the turn stays with the first joiner.
        assert_eq!(session.current_player().unwrap().display_name, "Alice");
        assert_eq!(session.snapshot_for(ALICE).players, vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_join_duplicate_connection() {
        let mut session = make_table();

        let result = session.join(ALICE, "Carol");
        assert_eq!(result, Err(SessionError::DuplicateConnection));
        assert_eq!(session.player_count(), 2);
    }

    #[test]
    fn test_join_duplicate_name() {
        let mut session = make_table();

        let result = session.join(CAROL, "Alice");
        assert_eq!(result, Err(SessionError::DuplicateName));
        assert_eq!(session.player_count(), 2);
        assert_eq!(session.snapshot_for(CAROL).player_name_for_client, "");
    }

    #[test]
    fn test_roll_by_current() {
        let mut session = make_table();

        let (first, second) = session.roll_dice(ALICE).unwrap();
        assert!((1..=6).contains(&first));
        assert!((1..=6).contains(&second));
        assert_eq!(session.roll_count(), 1);

        let summary = session.snapshot_for(BOB);
        assert_eq!(summary.last_person_to_roll_dice, "Alice");
        assert_eq!(summary.dice_roll_count, 1);
    }

    #[test]
    fn test_roll_by_non_current_rejected() {
        let mut session = make_table();
        let dice_before = session.dice();

        let result = session.roll_dice(BOB);
        assert_eq!(result, Err(SessionError::NotCurrentTurn));
        assert_eq!(session.roll_count(), 0);
        assert_eq!(session.dice(), dice_before);
        assert_eq!(session.snapshot_for(BOB).last_person_to_roll_dice, "");
    }

    #[test]
    fn test_turn_gated_ops_on_empty_session() {
        let mut session = make_session();

        assert_eq!(session.roll_dice(ALICE), Err(SessionError::EmptyCycle));
        assert_eq!(session.pass_left(ALICE), Err(SessionError::EmptyCycle));
        assert_eq!(session.pass_right(ALICE), Err(SessionError::EmptyCycle));
        assert_eq!(session.roll_count(), 0);
    }

    #[test]
    fn test_pass_right_and_left() {
        let mut session = make_table();

        session.pass_right(ALICE).unwrap();
        assert_eq!(session.current_player().unwrap().display_name, "Bob");

        session.pass_left(BOB).unwrap();
        assert_eq!(session.current_player().unwrap().display_name, "Alice");
    }

    #[test]
    fn test_pass_by_non_current_rejected() {
        let mut session = make_table();

        assert_eq!(session.pass_left(BOB), Err(SessionError::NotCurrentTurn));
        assert_eq!(session.pass_right(BOB), Err(SessionError::NotCurrentTurn));
        assert_eq!(session.current_player().unwrap().display_name, "Alice");
    }

    #[test]
    fn test_rotation_round_trip() {
        let mut session = make_table();
        session.join(CAROL, "Carol").unwrap();
        let start = session.current_player().unwrap().connection_id;

        for _ in 0..session.player_count() {
            let holder = session.current_player().unwrap().connection_id;
            session.pass_right(holder).unwrap();
        }
        assert_eq!(session.current_player().unwrap().connection_id, start);

        for _ in 0..session.player_count() {
            let holder = session.current_player().unwrap().connection_id;
            session.pass_left(holder).unwrap();
        }
        assert_eq!(session.current_player().unwrap().connection_id, start);
    }

    #[test]
    fn test_peek_by_current() {
        let mut session = make_table();
        session.roll_dice(ALICE).unwrap();

        let summary = session.peek_dice(ALICE);
        assert_eq!(summary.dice, Some(session.dice()));
        assert_eq!(summary.last_person_to_peek_at_dice, "Alice");

        // The peek sticks for Alice until the next mutation; Bob never
        // sees the values.
        assert_eq!(session.snapshot_for(ALICE).dice, Some(session.dice()));
        assert_eq!(session.snapshot_for(BOB).dice, None);
    }

    #[test]
    fn test_peek_by_non_current_degrades() {
        let mut session = make_table();

        let summary = session.peek_dice(BOB);
        assert_eq!(summary.dice, None);
        assert_eq!(summary.last_person_to_peek_at_dice, "");
        assert_eq!(session.visibility(), DiceVisibility::Hidden);
    }

    #[test]
    fn test_reveal_shows_everyone() {
        let mut session = make_table();
        session.roll_dice(ALICE).unwrap();

        let summary = session.reveal_dice(ALICE);
        assert_eq!(summary.dice, Some(session.dice()));
        assert_eq!(summary.last_person_to_peek_at_dice, EVERYONE);

        assert_eq!(session.snapshot_for(ALICE).dice, Some(session.dice()));
        assert_eq!(session.snapshot_for(BOB).dice, Some(session.dice()));
    }

    #[test]
    fn test_reveal_by_non_current_degrades() {
        let mut session = make_table();

        let summary = session.reveal_dice(BOB);
        assert_eq!(summary.dice, None);
        assert_eq!(session.snapshot_for(CAROL).dice, None);
    }

    #[test]
    fn test_roll_resets_visibility() {
        let mut session = make_table();

        session.peek_dice(ALICE);
        session.roll_dice(ALICE).unwrap();
        assert_eq!(session.snapshot_for(ALICE).dice, None);
    }

    #[test]
    fn test_pass_resets_visibility() {
        let mut session = make_table();

        session.reveal_dice(ALICE);
        session.pass_right(ALICE).unwrap();
        assert_eq!(session.snapshot_for(ALICE).dice, None);
        assert_eq!(session.snapshot_for(BOB).dice, None);
    }

    #[test]
    fn test_failed_peek_keeps_standing_reveal() {
        let mut session = make_table();
        session.reveal_dice(ALICE);

        // Bob's degraded peek is a no-op; the reveal still stands.
        session.peek_dice(BOB);
        assert_eq!(session.visibility(), DiceVisibility::Revealed);
        assert_eq!(session.snapshot_for(BOB).dice, Some(session.dice()));
    }

    #[test]
    fn test_leave_advances_turn() {
        let mut session = make_table();

        let player = session.leave(ALICE).unwrap();
        assert_eq!(player.display_name, "Alice");
        assert_eq!(session.current_player().unwrap().display_name, "Bob");
        assert_eq!(session.player_count(), 1);
    }

    #[test]
    fn test_leave_is_idempotent() {
        let mut session = make_table();

        session.leave(BOB).unwrap();
        assert_eq!(session.leave(BOB), Err(SessionError::AlreadyAbsent));

        // The second leave changed nothing for the survivor.
        assert_eq!(session.current_player().unwrap().display_name, "Alice");
        assert_eq!(session.snapshot_for(ALICE).players, vec!["Alice"]);
    }

    #[test]
    fn test_leave_last_player_empties_session() {
        let mut session = make_session();
        session.join(ALICE, "Alice").unwrap();

        session.leave(ALICE).unwrap();
        assert!(session.current_player().is_none());
        assert_eq!(session.snapshot_for(ALICE).current_player, "");
    }

    #[test]
    fn test_deterministic_with_seed() {
        let mut one = SessionState::with_seed(7);
        let mut two = SessionState::with_seed(7);
        one.join(ALICE, "Alice").unwrap();
        two.join(ALICE, "Alice").unwrap();

        assert_eq!(one.roll_dice(ALICE).unwrap(), two.roll_dice(ALICE).unwrap());
        assert_eq!(one.roll_dice(ALICE).unwrap(), two.roll_dice(ALICE).unwrap());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut session = make_table();
        session.roll_dice(ALICE).unwrap();

        let hidden = session.snapshot_for(BOB).to_json();
        assert_eq!(
            hidden,
            serde_json::json!({
                "players": ["Bob", "Alice"],
                "current_player": "Alice",
                "last_person_to_roll_dice": "Alice",
                "last_person_to_peek_at_dice": "",
                "player_name_for_client": "Bob",
                "dice_roll_count": 1,
            })
        );

        let revealed = session.reveal_dice(ALICE).to_json();
        let (first, second) = session.dice();
        assert_eq!(revealed["dice"], serde_json::json!([first, second]));
        assert_eq!(revealed["last_person_to_peek_at_dice"], EVERYONE);
    }
}
