//! The authoritative game state and its append-only event log.
//!
//! [`GameState`] is owned by the engine and is the only place alive/dead
//! status, potion stocks and the round counter change. Decision sources
//! never see it directly; they receive [`GameView`] snapshots built by
//! [`GameState::view`].

use std::collections::{BTreeMap, BTreeSet};

use nightfall_types::{
    DecisionKind, DeathCause, DegradeReason, Faction, GameEvent, GameView, HeardSpeech,
    KnownAlignment, PackMember, ParticipantId, Phase, Potion, PublicParticipant, Role,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{ConfigError, RulesConfig};

/// Fatal errors that abort a game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The configuration or participant list was rejected before the game began.
    #[error("invalid configuration: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A consistency check on the game state failed.
    #[error("invariant violation: {detail}")]
    InvariantViolation {
        /// What was found to be inconsistent.
        detail: String,
    },

    /// The phase controller attempted a transition the state machine forbids.
    #[error("illegal phase transition from {from:?} to {to:?}")]
    IllegalTransition {
        /// Current phase.
        from: Phase,
        /// Requested phase.
        to: Phase,
    },

    /// An operation referenced a participant that is not at the table.
    #[error("unknown participant {participant_id}")]
    UnknownParticipant {
        /// The unknown seat.
        participant_id: ParticipantId,
    },

    /// A one-use resource was spent a second time.
    #[error("witch {witch_id} already spent the {potion:?}")]
    ResourceAlreadySpent {
        /// The witch.
        witch_id: ParticipantId,
        /// The potion.
        potion: Potion,
    },

    /// No participant is alive, so neither side can be declared the winner.
    #[error("victory is ambiguous in round {round}: no participant is alive")]
    VictoryAmbiguity {
        /// Round of the check.
        round: u32,
    },
}

/// A seat at the table. Role and name never change after setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    /// Stable seat number.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Assigned role.
    pub role: Role,
    alive: bool,
}

impl Participant {
    /// A living participant.
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            alive: true,
        }
    }

    /// Faction derived from the role.
    pub const fn faction(&self) -> Faction {
        self.role.faction()
    }

    /// Whether the participant is alive.
    pub const fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Append-only sequence of game events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    /// Append an event.
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// All events in order.
    pub fn as_slice(&self) -> &[GameEvent] {
        &self.events
    }

    /// Events every participant may see.
    pub fn public(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(|e| e.is_public())
    }

    /// Consume the log.
    pub fn into_vec(self) -> Vec<GameEvent> {
        self.events
    }
}

/// A witch's two one-use potions. Each flag only ever goes from `true` to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PotionStock {
    antidote: bool,
    poison: bool,
}

impl PotionStock {
    /// Both potions unspent.
    pub const fn full() -> Self {
        Self {
            antidote: true,
            poison: true,
        }
    }

    /// Whether the given potion is still available.
    pub const fn has(&self, potion: Potion) -> bool {
        match potion {
            Potion::Antidote => self.antidote,
            Potion::Poison => self.poison,
        }
    }

    const fn take(&mut self, potion: Potion) -> bool {
        let slot = match potion {
            Potion::Antidote => &mut self.antidote,
            Potion::Poison => &mut self.poison,
        };
        let had = *slot;
        *slot = false;
        had
    }
}

/// The single mutable record of one game.
#[derive(Debug, Clone)]
pub struct GameState {
    round: u32,
    phase: Phase,
    participants: Vec<Participant>,
    alive: BTreeSet<ParticipantId>,
    dead: BTreeSet<ParticipantId>,
    potions: BTreeMap<ParticipantId, PotionStock>,
    rules: RulesConfig,
    log: EventLog,
}

impl GameState {
    /// Create the state for a new game in round 1, phase [`Phase::Setup`].
    ///
    /// Participants are kept in ascending seat order. Every witch starts
    /// with a full [`PotionStock`].
    pub fn new(mut participants: Vec<Participant>, rules: RulesConfig) -> Self {
        participants.sort_by_key(|p| p.id);
        let alive = participants
            .iter()
            .filter(|p| p.alive)
            .map(|p| p.id)
            .collect();
        let dead = participants
            .iter()
            .filter(|p| !p.alive)
            .map(|p| p.id)
            .collect();
        let potions = participants
            .iter()
            .filter(|p| !p.role.capability().potions.is_empty())
            .map(|p| (p.id, PotionStock::full()))
            .collect();

        Self {
            round: 1,
            phase: Phase::Setup,
            participants,
            alive,
            dead,
            potions,
            rules,
            log: EventLog::default(),
        }
    }

    /// Current round, starting at 1.
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Rule variants in force.
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// All participants in seat order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Look up a participant.
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .and_then(|idx| self.participants.get(idx))
    }

    /// Role of a participant.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownParticipant`] for an unknown seat.
    pub fn role_of(&self, id: ParticipantId) -> Result<Role, GameError> {
        self.participant(id)
            .map(|p| p.role)
            .ok_or(GameError::UnknownParticipant { participant_id: id })
    }

    /// Whether the participant exists and is alive.
    pub fn is_alive(&self, id: ParticipantId) -> bool {
        self.alive.contains(&id)
    }

    /// Alive seats, ascending.
    pub fn alive_ids(&self) -> Vec<ParticipantId> {
        self.alive.iter().copied().collect()
    }

    /// Dead seats, ascending.
    pub fn dead_ids(&self) -> Vec<ParticipantId> {
        self.dead.iter().copied().collect()
    }

    /// Number of alive participants holding `role`.
    pub fn count_alive(&self, role: Role) -> usize {
        self.participants
            .iter()
            .filter(|p| p.alive && p.role == role)
            .count()
    }

    /// Whether a witch still holds a potion.
    pub fn potion_available(&self, witch_id: ParticipantId, potion: Potion) -> bool {
        self.potions
            .get(&witch_id)
            .is_some_and(|stock| stock.has(potion))
    }

    /// Recorded events.
    pub fn events(&self) -> &[GameEvent] {
        self.log.as_slice()
    }

    /// Consume the state, keeping only the log.
    pub fn into_log(self) -> EventLog {
        self.log
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append an event to the log.
    pub fn record(&mut self, event: GameEvent) {
        self.log.push(event);
    }

    /// Record a decision that was replaced by its fallback.
    pub fn record_degraded(
        &mut self,
        participant_id: ParticipantId,
        call: DecisionKind,
        reason: DegradeReason,
    ) {
        warn!(
            round = self.round,
            participant_id = %participant_id,
            call = ?call,
            reason = ?reason,
            "decision degraded, using fallback"
        );
        self.record(GameEvent::DecisionDegraded {
            round: self.round,
            participant_id,
            call,
            reason,
        });
    }

    /// Move the state machine to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::IllegalTransition`] if the state machine does
    /// not allow the move.
    pub fn transition(&mut self, to: Phase) -> Result<(), GameError> {
        let from = self.phase;
        if !from.can_transition_to(to) {
            error!(round = self.round, from = ?from, to = ?to, "illegal phase transition");
            return Err(GameError::IllegalTransition { from, to });
        }
        self.phase = to;
        info!(round = self.round, from = ?from, to = ?to, "phase transition");
        self.record(GameEvent::PhaseTransitioned {
            round: self.round,
            from,
            to,
        });
        Ok(())
    }

    /// Start the next round.
    pub const fn advance_round(&mut self) {
        self.round = self.round.saturating_add(1);
    }

    /// Mark a living participant dead and record the death.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownParticipant`] for an unknown seat, or
    /// [`GameError::InvariantViolation`] if the participant is already dead.
    pub fn kill(&mut self, id: ParticipantId, cause: DeathCause) -> Result<(), GameError> {
        let round = self.round;
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GameError::UnknownParticipant { participant_id: id })?;
        if !participant.alive || !self.alive.remove(&id) {
            return Err(GameError::InvariantViolation {
                detail: format!("participant {id} died twice"),
            });
        }
        participant.alive = false;
        self.dead.insert(id);

        info!(round, participant_id = %id, role = %participant.role, cause = ?cause, "participant died");
        self.record(GameEvent::DeathOccurred {
            round,
            participant_id: id,
            cause,
        });
        Ok(())
    }

    /// Consume a witch's potion.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ResourceAlreadySpent`] if the potion is gone,
    /// or [`GameError::UnknownParticipant`] if `witch_id` holds no potions.
    pub fn spend_potion(&mut self, witch_id: ParticipantId, potion: Potion) -> Result<(), GameError> {
        let stock = self
            .potions
            .get_mut(&witch_id)
            .ok_or(GameError::UnknownParticipant {
                participant_id: witch_id,
            })?;
        if !stock.take(potion) {
            error!(witch_id = %witch_id, potion = ?potion, "potion spent twice");
            return Err(GameError::ResourceAlreadySpent { witch_id, potion });
        }
        Ok(())
    }

    /// Verify that the alive and dead sets partition the participants and
    /// agree with every participant's flag, and that no potion was spent twice.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvariantViolation`] describing the first
    /// inconsistency found.
    pub fn check_invariants(&self) -> Result<(), GameError> {
        if self.alive.len().saturating_add(self.dead.len()) != self.participants.len() {
            return Err(GameError::InvariantViolation {
                detail: format!(
                    "{} alive + {} dead does not cover {} participants",
                    self.alive.len(),
                    self.dead.len(),
                    self.participants.len()
                ),
            });
        }
        for p in &self.participants {
            let in_alive = self.alive.contains(&p.id);
            let in_dead = self.dead.contains(&p.id);
            if in_alive == in_dead || in_alive != p.alive {
                return Err(GameError::InvariantViolation {
                    detail: format!("participant {} is not in exactly one of alive/dead", p.id),
                });
            }
        }

        for potion in [Potion::Antidote, Potion::Poison] {
            for (witch_id, stock) in &self.potions {
                let uses = self
                    .events()
                    .iter()
                    .filter(|e| {
                        matches!(e, GameEvent::PotionUsed { witch_id: w, potion: p, .. }
                            if w == witch_id && *p == potion)
                    })
                    .count();
                if uses > 1 || (uses == 1) == stock.has(potion) {
                    return Err(GameError::InvariantViolation {
                        detail: format!("witch {witch_id} {potion:?} used {uses} times"),
                    });
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read-only projections
    // -----------------------------------------------------------------------

    /// Public snapshot for decision sources.
    pub fn view(&self) -> GameView {
        let reveal = self.rules.reveal_roles_on_death;
        GameView {
            round: self.round,
            phase: self.phase,
            participants: self
                .participants
                .iter()
                .map(|p| PublicParticipant {
                    id: p.id,
                    name: p.name.clone(),
                    alive: p.alive,
                    revealed_role: (reveal && !p.alive).then_some(p.role),
                })
                .collect(),
            public_events: self.log.public().cloned().collect(),
        }
    }

    /// Every werewolf and whether they are alive.
    pub fn pack(&self) -> Vec<PackMember> {
        self.participants
            .iter()
            .filter(|p| p.role.capability().coordinates)
            .map(|p| PackMember {
                id: p.id,
                alive: p.alive,
            })
            .collect()
    }

    /// Divination results a seer has gathered, oldest first.
    pub fn known_alignments(&self, seer: ParticipantId) -> Vec<KnownAlignment> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                GameEvent::DivinationPerformed {
                    round,
                    seer_id,
                    target_id,
                    is_werewolf,
                } if *seer_id == seer => Some(KnownAlignment {
                    round: *round,
                    target_id: *target_id,
                    is_werewolf: *is_werewolf,
                }),
                _ => None,
            })
            .collect()
    }

    /// Speeches given so far in the current round.
    pub fn speeches_this_round(&self) -> Vec<HeardSpeech> {
        let round = self.round;
        self.events()
            .iter()
            .filter_map(|e| match e {
                GameEvent::SpeechGiven {
                    round: r,
                    speaker_id,
                    kind,
                    content,
                } if *r == round => Some(HeardSpeech {
                    speaker_id: *speaker_id,
                    kind: *kind,
                    content: content.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}
