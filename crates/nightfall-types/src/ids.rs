//! Type-safe identifiers.
//!
//! Participants are identified by their seat number, a small integer that
//! is stable for the whole game and defines every deterministic ordering in
//! the engine (speaking order, ballot application, tie-breaks). Games use a
//! UUID v7 so concurrent games in one process never share an identifier.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for one game instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameId(pub Uuid);

impl GameId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for GameId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seat number of a participant, assigned once at setup.
///
/// Ordering on this type is the engine's canonical participant order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    /// Return the raw seat number.
    pub const fn seat(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ParticipantId {
    fn from(seat: u32) -> Self {
        Self(seat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_ids_are_unique() {
        let a = GameId::new();
        let b = GameId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
        assert_eq!(a.to_string(), a.into_inner().to_string());
    }

    #[test]
    fn participant_order_follows_seat_number() {
        let mut seats = vec![ParticipantId(3), ParticipantId(1), ParticipantId(2)];
        seats.sort();
        assert_eq!(seats, vec![ParticipantId(1), ParticipantId(2), ParticipantId(3)]);
    }

    #[test]
    fn participant_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ParticipantId(7)).ok();
        assert_eq!(json.as_deref(), Some("7"));
    }
}
