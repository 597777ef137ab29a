//! Decision payloads returned by decision sources.
//!
//! These are the only values the engine accepts from outside. Every one of
//! them is validated against the current game state before it is applied;
//! anything that fails validation is replaced with the fallback for its
//! call (`pass` at night, `abstain` for ballots).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::NightActionKind;
use crate::ids::ParticipantId;

/// A night action submitted by one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NightIntent {
    /// The participant submitting the intent.
    pub actor_id: ParticipantId,
    /// What the participant wants to do.
    pub kind: NightActionKind,
    /// Target of the action; `None` only for [`NightActionKind::Pass`].
    pub target_id: Option<ParticipantId>,
}

impl NightIntent {
    /// The fallback intent: do nothing.
    pub const fn pass(actor_id: ParticipantId) -> Self {
        Self {
            actor_id,
            kind: NightActionKind::Pass,
            target_id: None,
        }
    }

    /// A targeted intent.
    pub const fn targeting(
        actor_id: ParticipantId,
        kind: NightActionKind,
        target_id: ParticipantId,
    ) -> Self {
        Self {
            actor_id,
            kind,
            target_id: Some(target_id),
        }
    }

    /// Whether this intent is a pass.
    pub const fn is_pass(&self) -> bool {
        matches!(self.kind, NightActionKind::Pass)
    }
}

/// What a voter chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case", tag = "choice", content = "target_id")]
pub enum BallotChoice {
    /// A vote against the given participant.
    Vote(ParticipantId),
    /// No vote. Does not count toward any target.
    Abstain,
}

/// One participant's day ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Ballot {
    /// The participant casting the ballot.
    pub voter_id: ParticipantId,
    /// The voter's choice.
    pub choice: BallotChoice,
}

impl Ballot {
    /// A vote against `target_id`.
    pub const fn vote(voter_id: ParticipantId, target_id: ParticipantId) -> Self {
        Self {
            voter_id,
            choice: BallotChoice::Vote(target_id),
        }
    }

    /// The fallback ballot.
    pub const fn abstain(voter_id: ParticipantId) -> Self {
        Self {
            voter_id,
            choice: BallotChoice::Abstain,
        }
    }

    /// The voted target, or `None` for an abstention.
    pub const fn target(&self) -> Option<ParticipantId> {
        match self.choice {
            BallotChoice::Vote(target) => Some(target),
            BallotChoice::Abstain => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pass_has_no_target() {
        let intent = NightIntent::pass(ParticipantId(2));
        assert!(intent.is_pass());
        assert_eq!(intent.target_id, None);
        assert!(!intent.kind.needs_target());
    }

    #[test]
    fn ballot_target() {
        assert_eq!(
            Ballot::vote(ParticipantId(1), ParticipantId(4)).target(),
            Some(ParticipantId(4))
        );
        assert_eq!(Ballot::abstain(ParticipantId(1)).target(), None);
    }

    #[test]
    fn ballot_json_shape() {
        let json = serde_json::to_value(Ballot::vote(ParticipantId(1), ParticipantId(3))).unwrap();
        assert_eq!(json["voter_id"], 1);
        assert_eq!(json["choice"]["choice"], "vote");
        assert_eq!(json["choice"]["target_id"], 3);

        let back: Ballot = serde_json::from_value(json).unwrap();
        assert_eq!(back.target(), Some(ParticipantId(3)));
    }
}
