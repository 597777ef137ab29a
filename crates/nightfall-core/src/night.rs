//! Night intent collection, validation, and resolution.
//!
//! Resolution order is fixed:
//!
//! 1. Werewolf kill: majority of valid kill intents, ties to the lowest
//!    seat. Produces a *pending* death.
//! 2. Seer divination: read-only, never blocked.
//! 3. Witch antidote: cancels the pending death if aimed at it.
//! 4. Witch poison: an extra death, independent of the kill.
//! 5. Commit: werewolf kill first, then poison deaths in seat order. A
//!    participant named by both dies once, to the werewolves.
//!
//! A witch acts at most once per night: her single intent is either the
//! antidote, the poison, or a pass.

use std::collections::BTreeMap;

use nightfall_types::{
    DeathCause, DecisionKind, DegradeReason, Faction, GameEvent, NightActionKind, NightContext, NightIntent,
    NightRequest, ParticipantId, Potion, Rejection, Role,
};
use tracing::{debug, info};

use crate::decision::{DecisionError, DecisionSource, Dispatcher};
use crate::state::{GameError, GameState};

/// The effective intents of one night, each list in seat order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightIntents {
    /// Werewolf intents, including passes.
    pub werewolves: Vec<NightIntent>,
    /// Seer intents, including passes.
    pub seers: Vec<NightIntent>,
    /// Witch intents, including passes.
    pub witches: Vec<NightIntent>,
}

impl NightIntents {
    /// The werewolves' agreed victim, if any.
    pub fn kill_target(&self) -> Option<ParticipantId> {
        pick_kill_target(&self.werewolves)
    }
}

/// What a resolved night did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightReport {
    /// Committed deaths in commit order.
    pub deaths: Vec<(ParticipantId, DeathCause)>,
    /// The participant saved by an antidote, if any.
    pub saved: Option<ParticipantId>,
}

/// Majority target of the kill intents; ties go to the lowest seat.
pub fn pick_kill_target(intents: &[NightIntent]) -> Option<ParticipantId> {
    let mut tally: BTreeMap<ParticipantId, u32> = BTreeMap::new();
    for target in intents
        .iter()
        .filter(|i| i.kind == NightActionKind::Kill)
        .filter_map(|i| i.target_id)
    {
        let votes = tally.entry(target).or_insert(0);
        *votes = votes.saturating_add(1);
    }
    // BTreeMap iterates ascending, so the first maximum is the lowest seat.
    tally
        .into_iter()
        .fold(None, |best: Option<(ParticipantId, u32)>, (target, votes)| match best {
            Some((_, top)) if top >= votes => best,
            _ => Some((target, votes)),
        })
        .map(|(target, _)| target)
}

/// Check an intent against the current state.
///
/// `pending_kill` is the werewolves' current victim; it only matters for
/// antidote intents.
///
/// # Errors
///
/// Returns the [`Rejection`] explaining why the intent cannot be applied.
pub fn validate_intent(
    state: &GameState,
    actor_id: ParticipantId,
    role: Role,
    intent: &NightIntent,
    pending_kill: Option<ParticipantId>,
) -> Result<NightIntent, Rejection> {
    if intent.actor_id != actor_id {
        return Err(Rejection::ActorMismatch);
    }
    if !role.allows(intent.kind) {
        return Err(Rejection::AbilityMismatch);
    }

    let target = match (intent.kind.needs_target(), intent.target_id) {
        (false, None) => return Ok(*intent),
        (true, Some(target)) => target,
        (false, Some(_)) | (true, None) => return Err(Rejection::MalformedTarget),
    };
    let target_role = state
        .participant(target)
        .map(|p| p.role)
        .ok_or(Rejection::UnknownTarget)?;
    if !state.is_alive(target) {
        return Err(Rejection::DeadTarget);
    }

    let potion_spent = intent
        .kind
        .potion()
        .is_some_and(|potion| !state.potion_available(actor_id, potion));

    match intent.kind {
        NightActionKind::Kill if target_role.faction() == role.faction() => {
            return Err(Rejection::TargetNotAllowed);
        }
        NightActionKind::Divine | NightActionKind::Poison if target == actor_id => {
            return Err(Rejection::SelfTarget);
        }
        NightActionKind::Antidote => {
            if potion_spent {
                return Err(Rejection::ResourceSpent);
            }
            if pending_kill != Some(target) {
                return Err(Rejection::TargetNotAllowed);
            }
            if target == actor_id && !state.rules().witch_self_save {
                return Err(Rejection::SelfTarget);
            }
        }
        NightActionKind::Poison if potion_spent => {
            return Err(Rejection::ResourceSpent);
        }
        NightActionKind::Kill
        | NightActionKind::Divine
        | NightActionKind::Poison
        | NightActionKind::Pass => {}
    }
    Ok(*intent)
}

/// Private night context for an actor.
pub fn context_for(
    state: &GameState,
    actor_id: ParticipantId,
    role: Role,
    pending_kill: Option<ParticipantId>,
) -> Option<NightContext> {
    match role {
        Role::Werewolf => Some(NightContext::Werewolf { pack: state.pack() }),
        Role::Seer => Some(NightContext::Seer {
            known: state.known_alignments(actor_id),
        }),
        Role::Witch => {
            let antidote_available = state.potion_available(actor_id, Potion::Antidote);
            Some(NightContext::Witch {
                pending_death: pending_kill.filter(|_| antidote_available),
                antidote_available,
                poison_available: state.potion_available(actor_id, Potion::Poison),
                self_save_allowed: state.rules().witch_self_save,
            })
        }
        Role::Villager => None,
    }
}

/// Ask every alive night actor for an intent and record the effective ones.
///
/// Werewolves and seers are asked together. Witches are asked afterwards,
/// once the pending kill is known, so they can be told about it. Every
/// call that fails or returns an invalid intent is recorded as degraded
/// and replaced with `pass`.
pub async fn collect_intents<S: DecisionSource>(
    state: &mut GameState,
    dispatcher: &Dispatcher<'_, S>,
) -> NightIntents {
    let mut intents = NightIntents::default();

    let first_wave = actors(state, &[Role::Werewolf, Role::Seer]);
    let accepted = ask(state, dispatcher, &first_wave, None).await;
    for (role, intent) in accepted {
        if role == Role::Werewolf {
            intents.werewolves.push(intent);
        } else {
            intents.seers.push(intent);
        }
    }

    let pending = intents.kill_target();
    let witches = actors(state, &[Role::Witch]);
    intents.witches = ask(state, dispatcher, &witches, pending)
        .await
        .into_iter()
        .map(|(_, intent)| intent)
        .collect();

    intents
}

fn actors(state: &GameState, roles: &[Role]) -> Vec<(ParticipantId, Role)> {
    state
        .participants()
        .iter()
        .filter(|p| p.is_alive() && roles.contains(&p.role) && p.role.acts_at_night())
        .map(|p| (p.id, p.role))
        .collect()
}

async fn ask<S: DecisionSource>(
    state: &mut GameState,
    dispatcher: &Dispatcher<'_, S>,
    actors: &[(ParticipantId, Role)],
    pending_kill: Option<ParticipantId>,
) -> Vec<(Role, NightIntent)> {
    let view = state.view();
    let requests: Vec<NightRequest> = actors
        .iter()
        .filter_map(|&(actor_id, role)| {
            context_for(state, actor_id, role, pending_kill).map(|context| NightRequest {
                actor_id,
                role,
                view: view.clone(),
                context,
            })
        })
        .collect();

    let results = dispatcher.night_intents(&requests).await;

    let mut accepted = Vec::with_capacity(requests.len());
    for (request, result) in requests.iter().zip(results) {
        let intent = accept(state, request, result, pending_kill);
        state.record(GameEvent::NightActionSubmitted {
            round: state.round(),
            intent,
        });
        accepted.push((request.role, intent));
    }
    accepted
}

fn accept(
    state: &mut GameState,
    request: &NightRequest,
    result: Result<NightIntent, DecisionError>,
    pending_kill: Option<ParticipantId>,
) -> NightIntent {
    let actor_id = request.actor_id;
    let reason = match result {
        Ok(intent) => match validate_intent(state, actor_id, request.role, &intent, pending_kill) {
            Ok(valid) => {
                debug!(round = state.round(), actor_id = %actor_id, kind = ?valid.kind, "night intent accepted");
                return valid;
            }
            Err(rejection) => DegradeReason::Rejected { rejection },
        },
        Err(err) => err.degrade_reason(),
    };
    state.record_degraded(actor_id, DecisionKind::NightAction, reason);
    NightIntent::pass(actor_id)
}

/// Applies a night's intents to the game state in precedence order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NightActionResolver;

impl NightActionResolver {
    /// Resolve the night and commit its deaths.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ResourceAlreadySpent`] if a potion is used
    /// twice, or [`GameError::InvariantViolation`] if the alive/dead
    /// partition breaks.
    pub fn resolve(state: &mut GameState, intents: &NightIntents) -> Result<NightReport, GameError> {
        let round = state.round();

        // 1. Werewolf kill. Stale targets are ignored.
        let mut pending = if state.count_alive(Role::Werewolf) == 0 {
            None
        } else {
            intents.kill_target().filter(|target| state.is_alive(*target))
        };

        // 2. Divination.
        for intent in intents.seers.iter().filter(|i| i.kind == NightActionKind::Divine) {
            if let Some(target_id) = intent.target_id {
                let is_werewolf = state.role_of(target_id)?.faction() == Faction::Werewolves;
                debug!(round, seer_id = %intent.actor_id, target_id = %target_id, is_werewolf, "divination");
                state.record(GameEvent::DivinationPerformed {
                    round,
                    seer_id: intent.actor_id,
                    target_id,
                    is_werewolf,
                });
            }
        }

        // 3. Antidote.
        let mut saved = None;
        for intent in intents.witches.iter().filter(|i| i.kind == NightActionKind::Antidote) {
            let Some(target_id) = intent.target_id else {
                continue;
            };
            if pending != Some(target_id) {
                debug!(round, witch_id = %intent.actor_id, "antidote has nothing to cancel");
                continue;
            }
            spend(state, intent, target_id)?;
            info!(round, witch_id = %intent.actor_id, target_id = %target_id, "werewolf kill cancelled");
            pending = None;
            saved = Some(target_id);
        }

        // 4. Poison.
        let mut poisoned = Vec::new();
        for intent in intents.witches.iter().filter(|i| i.kind == NightActionKind::Poison) {
            let Some(target_id) = intent.target_id else {
                continue;
            };
            spend(state, intent, target_id)?;
            if state.is_alive(target_id) && !poisoned.contains(&target_id) {
                poisoned.push(target_id);
            }
        }
        poisoned.sort_unstable();

        // 5. Commit.
        let mut deaths = Vec::new();
        if let Some(victim) = pending {
            deaths.push((victim, DeathCause::WerewolfKill));
        }
        for target in poisoned {
            if pending != Some(target) {
                deaths.push((target, DeathCause::Poison));
            }
        }
        for &(id, cause) in &deaths {
            state.kill(id, cause)?;
        }
        state.check_invariants()?;

        info!(round, deaths = deaths.len(), "night resolved");
        Ok(NightReport { deaths, saved })
    }
}

fn spend(
    state: &mut GameState,
    intent: &NightIntent,
    target_id: ParticipantId,
) -> Result<(), GameError> {
    let witch_id = intent.actor_id;
    let potion = intent.kind.potion().ok_or_else(|| GameError::InvariantViolation {
        detail: format!("{:?} intent from {witch_id} spends no potion", intent.kind),
    })?;
    state.spend_potion(witch_id, potion)?;
    state.record(GameEvent::PotionUsed {
        round: state.round(),
        witch_id,
        potion,
        target_id,
    });
    Ok(())
}
