//! Read-only views handed to decision sources.
//!
//! A decision source never touches the engine's state. For each call it
//! receives an owned snapshot containing exactly what the asking
//! participant may know: the public table, the public part of the event
//! log, its own role, and role-specific private context. If something is
//! not in the request, the participant does not know it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Phase, Role, SpeechKind};
use crate::events::GameEvent;
use crate::ids::ParticipantId;

/// A participant as seen by everyone at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PublicParticipant {
    /// Seat number.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Whether the participant is alive.
    pub alive: bool,
    /// Role, only for dead participants when roles are revealed on death.
    pub revealed_role: Option<Role>,
}

/// Public snapshot of the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameView {
    /// Current round, starting at 1.
    pub round: u32,
    /// Current phase.
    pub phase: Phase,
    /// Every participant in seat order.
    pub participants: Vec<PublicParticipant>,
    /// Public events so far, in log order.
    pub public_events: Vec<GameEvent>,
}

impl GameView {
    /// Seats of alive participants, ascending.
    pub fn alive_ids(&self) -> Vec<ParticipantId> {
        self.participants
            .iter()
            .filter(|p| p.alive)
            .map(|p| p.id)
            .collect()
    }
}

/// A werewolf's view of one pack member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PackMember {
    /// Seat of the werewolf.
    pub id: ParticipantId,
    /// Whether that werewolf is alive.
    pub alive: bool,
}

/// A divination result the seer already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct KnownAlignment {
    /// Round of the divination.
    pub round: u32,
    /// Who was checked.
    pub target_id: ParticipantId,
    /// Whether the target is a werewolf.
    pub is_werewolf: bool,
}

/// Role-specific private context for a night decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum NightContext {
    /// Werewolves see every pack member and whether they are alive.
    Werewolf {
        /// All werewolves, alive or dead, in seat order.
        pack: Vec<PackMember>,
    },
    /// The seer sees every result she has obtained so far.
    Seer {
        /// Past divinations, oldest first.
        known: Vec<KnownAlignment>,
    },
    /// The witch sees her potions and, while she still holds the
    /// antidote, the werewolves' chosen victim.
    Witch {
        /// Participant pending death from the werewolf kill.
        pending_death: Option<ParticipantId>,
        /// Whether the antidote is unspent.
        antidote_available: bool,
        /// Whether the poison is unspent.
        poison_available: bool,
        /// Whether the rules let the witch save herself.
        self_save_allowed: bool,
    },
}

/// Input for a night decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NightRequest {
    /// The participant being asked.
    pub actor_id: ParticipantId,
    /// The actor's role.
    pub role: Role,
    /// Public snapshot.
    pub view: GameView,
    /// Private context for the actor's role.
    pub context: NightContext,
}

/// A speech already given, as passed to later speakers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HeardSpeech {
    /// The speaker.
    pub speaker_id: ParticipantId,
    /// Context of the speech.
    pub kind: SpeechKind,
    /// What was said.
    pub content: String,
}

/// Input for a speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpeechRequest {
    /// The participant being asked to speak.
    pub speaker_id: ParticipantId,
    /// The speaker's role.
    pub role: Role,
    /// Why the participant is speaking.
    pub kind: SpeechKind,
    /// Public snapshot.
    pub view: GameView,
    /// Speeches already given this round, in order.
    pub earlier_speeches: Vec<HeardSpeech>,
}

/// Input for a ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BallotRequest {
    /// The voter.
    pub voter_id: ParticipantId,
    /// The voter's role.
    pub role: Role,
    /// Participants the voter may vote against, ascending.
    pub candidates: Vec<ParticipantId>,
    /// Whether this is the tie-break re-vote.
    pub revote: bool,
    /// Public snapshot.
    pub view: GameView,
}
