//! Game event types.
//!
//! The event log is the source of truth for a game: every state change the
//! engine makes is recorded here, in order, and every summary (who died,
//! who won, what the seer knows) is derived from it. Given the same
//! configuration and the same decision responses, two runs produce
//! identical logs, so events carry no wall-clock timestamps.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::actions::{Ballot, NightIntent};
use crate::enums::{DeathCause, DecisionKind, Faction, Phase, Potion, Role, SpeechKind, Verdict};
use crate::ids::ParticipantId;

/// Why a submitted intent or ballot was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The payload names a different participant as its author.
    ActorMismatch,
    /// The role cannot perform this kind of action.
    AbilityMismatch,
    /// A targeted action came without a target, or a pass came with one.
    MalformedTarget,
    /// The target does not exist.
    UnknownTarget,
    /// The target is already dead.
    DeadTarget,
    /// The actor targeted themselves where that is not allowed.
    SelfTarget,
    /// The target is excluded for this action (e.g. a werewolf kill on a
    /// fellow werewolf, an antidote on someone not pending death).
    TargetNotAllowed,
    /// The one-use resource needed for the action is already spent.
    ResourceSpent,
    /// The ballot names someone outside the candidate list.
    NotACandidate,
}

/// Why a decision was replaced with its fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum DegradeReason {
    /// The call exceeded its deadline.
    Timeout {
        /// The deadline that was exceeded, in milliseconds.
        deadline_ms: u64,
    },
    /// The decision source reported an error.
    SourceError {
        /// Error description from the source.
        message: String,
    },
    /// The returned value failed validation.
    Rejected {
        /// The validation failure.
        rejection: Rejection,
    },
}

/// A death as announced at daybreak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AnnouncedDeath {
    /// Who died.
    pub participant_id: ParticipantId,
    /// How they died.
    pub cause: DeathCause,
    /// Their role, only when the rules reveal roles on death.
    pub revealed_role: Option<Role>,
}

/// Why the day ended without an elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Every ballot was an abstention.
    NoVotes,
    /// The re-vote tied again.
    TiedAfterRevote,
}

/// One entry of the append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GameEvent {
    /// The state machine moved to a new phase.
    PhaseTransitioned {
        /// Round in which the transition happened.
        round: u32,
        /// Previous phase.
        from: Phase,
        /// New phase.
        to: Phase,
    },
    /// A night intent was accepted (possibly after falling back to pass).
    NightActionSubmitted {
        /// Night round.
        round: u32,
        /// The effective intent.
        intent: NightIntent,
    },
    /// A decision call timed out, failed, or returned something invalid.
    DecisionDegraded {
        /// Round of the call.
        round: u32,
        /// The participant whose decision was replaced.
        participant_id: ParticipantId,
        /// Which kind of call degraded.
        call: DecisionKind,
        /// What went wrong.
        reason: DegradeReason,
    },
    /// The seer learned a participant's faction.
    DivinationPerformed {
        /// Night round.
        round: u32,
        /// The seer.
        seer_id: ParticipantId,
        /// The checked participant.
        target_id: ParticipantId,
        /// Whether the target belongs to the werewolf faction.
        is_werewolf: bool,
    },
    /// A witch spent a potion.
    PotionUsed {
        /// Night round.
        round: u32,
        /// The witch.
        witch_id: ParticipantId,
        /// Which potion.
        potion: Potion,
        /// Who it was used on.
        target_id: ParticipantId,
    },
    /// A participant died.
    DeathOccurred {
        /// Round of the death.
        round: u32,
        /// Who died.
        participant_id: ParticipantId,
        /// How.
        cause: DeathCause,
    },
    /// The night's deaths were made public.
    DayAnnounced {
        /// Day round.
        round: u32,
        /// Deaths from the preceding night, in commit order.
        deaths: Vec<AnnouncedDeath>,
    },
    /// A participant spoke. The content is opaque to the engine.
    SpeechGiven {
        /// Day round.
        round: u32,
        /// The speaker.
        speaker_id: ParticipantId,
        /// Context of the speech.
        kind: SpeechKind,
        /// What was said.
        content: String,
    },
    /// A ballot was counted.
    VoteCast {
        /// Day round.
        round: u32,
        /// The effective ballot.
        ballot: Ballot,
        /// Whether this ballot belongs to the re-vote.
        revote: bool,
    },
    /// The first vote tied and a re-vote was called.
    RevoteTriggered {
        /// Day round.
        round: u32,
        /// The tied candidates, ascending.
        candidates: Vec<ParticipantId>,
    },
    /// The vote eliminated a participant.
    EliminationOccurred {
        /// Day round.
        round: u32,
        /// The eliminated participant.
        participant_id: ParticipantId,
        /// Ballots received in the deciding vote.
        votes: u32,
    },
    /// The day ended without an elimination.
    EliminationSkipped {
        /// Day round.
        round: u32,
        /// Why no one was eliminated.
        reason: SkipReason,
    },
    /// The game finished.
    GameEnded {
        /// Round in which the game ended.
        round: u32,
        /// Final verdict.
        verdict: Verdict,
        /// Winning faction, absent for a draw.
        winning_faction: Option<Faction>,
    },
}

impl GameEvent {
    /// The round the event belongs to.
    pub const fn round(&self) -> u32 {
        match self {
            Self::PhaseTransitioned { round, .. }
            | Self::NightActionSubmitted { round, .. }
            | Self::DecisionDegraded { round, .. }
            | Self::DivinationPerformed { round, .. }
            | Self::PotionUsed { round, .. }
            | Self::DeathOccurred { round, .. }
            | Self::DayAnnounced { round, .. }
            | Self::SpeechGiven { round, .. }
            | Self::VoteCast { round, .. }
            | Self::RevoteTriggered { round, .. }
            | Self::EliminationOccurred { round, .. }
            | Self::EliminationSkipped { round, .. }
            | Self::GameEnded { round, .. } => *round,
        }
    }

    /// Whether every participant may see this event.
    ///
    /// Night intents, divinations, potion use and degraded decisions are
    /// private; deaths are public but only through the day announcement
    /// for night deaths, which is what decision sources receive.
    pub const fn is_public(&self) -> bool {
        matches!(
            self,
            Self::PhaseTransitioned { .. }
                | Self::DayAnnounced { .. }
                | Self::SpeechGiven { .. }
                | Self::VoteCast { .. }
                | Self::RevoteTriggered { .. }
                | Self::EliminationOccurred { .. }
                | Self::EliminationSkipped { .. }
                | Self::GameEnded { .. }
        )
    }
}
