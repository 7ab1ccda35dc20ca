//! Player identity and registry.
//!
//! Binds a stable connection identifier and a chosen display name to a
//! `Player`, enforcing uniqueness of both. The registry only maintains its
//! own index maps; keeping the turn cycle in sync is the session's job.

use std::collections::HashMap;
use std::fmt;

/// Stable, opaque identifier for one client connection.
///
/// Assigned by the transport layer when a connection is accepted and used
/// as the authorization token for every engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Compute the ring ordering key for a display name.
///
/// CRC-32 of the UTF-8 bytes. Used only to fix a player's position in the
/// turn cycle, never for turn legality.
pub fn order_key(display_name: &str) -> u32 {
    crc32fast::hash(display_name.as_bytes())
}

/// A registered player, bound to one connection for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Connection this player is bound to
    pub connection_id: ConnectionId,

    /// Chosen display name, immutable after registration
    pub display_name: String,

    /// CRC-32 of the display name, fixes turn-cycle position
    pub order_key: u32,

    /// When the player joined the session
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl Player {
    /// Create a new player for a connection.
    pub fn new(connection_id: ConnectionId, display_name: String) -> Self {
        let order_key = order_key(&display_name);
        Self {
            connection_id,
            display_name,
            order_key,
            joined_at: chrono::Utc::now(),
        }
    }
}

/// Error when registration is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// The connection already has a registered player
    DuplicateConnection,
    /// The display name is already taken by another connection
    DuplicateName,
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateConnection => write!(f, "Connection already registered"),
            Self::DuplicateName => write!(f, "Display name already taken"),
        }
    }
}

impl std::error::Error for RegisterError {}

/// Player registry - tracks all registered players.
///
/// Two indexes: connection id and display name, both unique at any instant.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    /// Players by connection id
    by_connection: HashMap<ConnectionId, Player>,

    /// Display name to connection id mapping
    by_name: HashMap<String, ConnectionId>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new player.
    ///
    /// Fails without mutating if either the connection or the name is
    /// already registered. Returns a copy of the stored player.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        display_name: &str,
    ) -> Result<Player, RegisterError> {
        if self.by_connection.contains_key(&connection_id) {
            return Err(RegisterError::DuplicateConnection);
        }
        if self.by_name.contains_key(display_name) {
            return Err(RegisterError::DuplicateName);
        }

        let player = Player::new(connection_id, display_name.to_string());
        self.by_name
            .insert(player.display_name.clone(), connection_id);
        self.by_connection.insert(connection_id, player.clone());
        Ok(player)
    }

    /// Unregister a player, removing both index entries.
    ///
    /// Returns `None` if the connection was not registered (no mutation).
    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<Player> {
        let player = self.by_connection.remove(&connection_id)?;
        self.by_name.remove(&player.display_name);
        Some(player)
    }

    /// Look up a player by connection id.
    pub fn lookup_by_connection(&self, connection_id: ConnectionId) -> Option<&Player> {
        self.by_connection.get(&connection_id)
    }

    /// Look up a player by display name.
    pub fn lookup_by_name(&self, display_name: &str) -> Option<&Player> {
        self.by_name
            .get(display_name)
            .and_then(|id| self.by_connection.get(id))
    }

    /// Check if a connection is registered.
    pub fn contains_connection(&self, connection_id: ConnectionId) -> bool {
        self.by_connection.contains_key(&connection_id)
    }

    /// Check if a display name is taken.
    pub fn contains_name(&self, display_name: &str) -> bool {
        self.by_name.contains_key(display_name)
    }

    /// All registered connection ids.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.by_connection.keys().copied().collect()
    }

    /// Registered player count.
    pub fn len(&self) -> usize {
        self.by_connection.len()
    }

    /// Check if no players are registered.
    pub fn is_empty(&self) -> bool {
        self.by_connection.is_empty()
    }
}
