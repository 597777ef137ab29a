//! Seeded random bots.
//!
//! [`RandomBots`] plays every seat at the table. It only ever looks at the
//! request it was handed, so it knows exactly what that participant would
//! know, and it draws from a single [`StdRng`] so a run with the same seed
//! makes the same choices. Choices are random but legal: werewolves never
//! target the pack, the seer does not re-check someone she already knows,
//! and the witch respects her potions.

use std::future::Future;
use std::sync::Mutex;

use nightfall_core::DecisionError;
use nightfall_core::DecisionSource;
use nightfall_types::{
    Ballot, BallotRequest, NightActionKind, NightContext, NightIntent, NightRequest,
    ParticipantId, SpeechKind, SpeechRequest,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chance the witch saves the werewolves' victim when she can.
const SAVE_PROBABILITY: f64 = 0.6;

/// Chance the witch throws her poison on a night she did not save anyone.
const POISON_PROBABILITY: f64 = 0.25;

/// Chance a voter abstains.
const ABSTAIN_PROBABILITY: f64 = 0.1;

const ACCUSATIONS: &[&str] = &[
    "I have been watching seat {target}. Too quiet for my liking.",
    "Seat {target} changed their story twice. I do not trust it.",
    "Nothing solid yet, but seat {target} is where I would look first.",
    "Seat {target} was very quick to agree last round.",
];

const DEFENSES: &[&str] = &[
    "I am not a werewolf. Look at who pushed this vote.",
    "You are wasting a vote on me. Seat {target} is the one to watch.",
];

const LAST_WORDS: &[&str] = &[
    "Remember who voted for me.",
    "Check seat {target} tomorrow. That is all I ask.",
];

/// A [`DecisionSource`] that plays legal random moves from a seed.
#[derive(Debug)]
pub struct RandomBots {
    rng: Mutex<StdRng>,
}

impl RandomBots {
    /// Create bots drawing from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, draw: impl FnOnce(&mut StdRng) -> T) -> Result<T, DecisionError> {
        let mut rng = self.rng.lock().map_err(|_poisoned| DecisionError::Internal {
            message: String::from("bot rng lock poisoned"),
        })?;
        Ok(draw(&mut rng))
    }

    fn choose_night(&self, request: &NightRequest) -> Result<NightIntent, DecisionError> {
        let actor = request.actor_id;
        let others: Vec<ParticipantId> = request
            .view
            .alive_ids()
            .into_iter()
            .filter(|&id| id != actor)
            .collect();

        self.with_rng(|rng| match &request.context {
            NightContext::Werewolf { pack } => {
                let prey: Vec<ParticipantId> = others
                    .iter()
                    .copied()
                    .filter(|id| !pack.iter().any(|m| m.id == *id))
                    .collect();
                pick(rng, &prey).map_or_else(
                    || NightIntent::pass(actor),
                    |target| NightIntent::targeting(actor, NightActionKind::Kill, target),
                )
            }
            NightContext::Seer { known } => {
                let unchecked: Vec<ParticipantId> = others
                    .iter()
                    .copied()
                    .filter(|id| !known.iter().any(|k| k.target_id == *id))
                    .collect();
                pick(rng, &unchecked).map_or_else(
                    || NightIntent::pass(actor),
                    |target| NightIntent::targeting(actor, NightActionKind::Divine, target),
                )
            }
            NightContext::Witch {
                pending_death,
                antidote_available,
                poison_available,
                self_save_allowed,
            } => {
                let savable = pending_death
                    .filter(|&victim| *antidote_available && (victim != actor || *self_save_allowed));
                if let Some(victim) = savable.filter(|_| rng.random_bool(SAVE_PROBABILITY)) {
                    return NightIntent::targeting(actor, NightActionKind::Antidote, victim);
                }
                if *poison_available && rng.random_bool(POISON_PROBABILITY) {
                    let spared: Vec<ParticipantId> = others
                        .iter()
                        .copied()
                        .filter(|&id| Some(id) != *pending_death)
                        .collect();
                    if let Some(target) = pick(rng, &spared) {
                        return NightIntent::targeting(actor, NightActionKind::Poison, target);
                    }
                }
                NightIntent::pass(actor)
            }
        })
    }

    fn compose_speech(&self, request: &SpeechRequest) -> Result<String, DecisionError> {
        let others: Vec<ParticipantId> = request
            .view
            .alive_ids()
            .into_iter()
            .filter(|&id| id != request.speaker_id)
            .collect();
        let lines = match request.kind {
            SpeechKind::Discussion => ACCUSATIONS,
            SpeechKind::Defense => DEFENSES,
            SpeechKind::LastWords => LAST_WORDS,
        };

        self.with_rng(|rng| {
            let line = lines
                .get(rng.random_range(0..lines.len()))
                .copied()
                .unwrap_or_default();
            match pick(rng, &others) {
                Some(target) => line.replace("{target}", &target.to_string()),
                None => String::from("I have nothing more to say."),
            }
        })
    }

    fn cast_ballot(&self, request: &BallotRequest) -> Result<Ballot, DecisionError> {
        let voter = request.voter_id;
        self.with_rng(|rng| {
            if rng.random_bool(ABSTAIN_PROBABILITY) {
                return Ballot::abstain(voter);
            }
            pick(rng, &request.candidates)
                .map_or_else(|| Ballot::abstain(voter), |target| Ballot::vote(voter, target))
        })
    }
}

impl DecisionSource for RandomBots {
    fn night_intent(
        &self,
        request: &NightRequest,
    ) -> impl Future<Output = Result<NightIntent, DecisionError>> {
        std::future::ready(self.choose_night(request))
    }

    fn speak(&self, request: &SpeechRequest) -> impl Future<Output = Result<String, DecisionError>> {
        std::future::ready(self.compose_speech(request))
    }

    fn ballot(&self, request: &BallotRequest) -> impl Future<Output = Result<Ballot, DecisionError>> {
        std::future::ready(self.cast_ballot(request))
    }
}

/// Pick one entry uniformly, or `None` if there is nothing to pick.
fn pick(rng: &mut StdRng, from: &[ParticipantId]) -> Option<ParticipantId> {
    if from.is_empty() {
        return None;
    }
    from.get(rng.random_range(0..from.len())).copied()
}
