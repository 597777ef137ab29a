//! Day vote: ballot collection, tally, and the tie-break re-vote.
//!
//! Every alive participant casts one ballot. Abstentions count for no one
//! and do not raise the bar for a plurality. A tie among the top targets
//! gives each tied candidate a defense speech, then exactly one re-vote
//! restricted to them with the same voters. A second tie eliminates nobody.

use std::collections::BTreeMap;

use nightfall_types::{
    Ballot, BallotChoice, BallotRequest, DecisionKind, DegradeReason, GameEvent, ParticipantId,
    Rejection, SkipReason, SpeechKind,
};
use tracing::{debug, info};

use crate::decision::{DecisionSource, Dispatcher};
use crate::state::{GameError, GameState};

/// Result of counting one round of ballots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TallyResult {
    /// One target has a strict plurality.
    Winner {
        /// The target.
        target: ParticipantId,
        /// Ballots it received.
        votes: u32,
    },
    /// Several targets share the top count.
    Tie {
        /// The tied targets, ascending.
        candidates: Vec<ParticipantId>,
        /// Ballots each of them received.
        votes: u32,
    },
    /// Every ballot was an abstention.
    NoVotes,
}

/// What the day's vote decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Eliminate `target`.
    Eliminate {
        /// The participant to eliminate.
        target: ParticipantId,
        /// Ballots received in the deciding vote.
        votes: u32,
    },
    /// Nobody is eliminated.
    Skip(SkipReason),
}

/// Count ballots per target.
pub fn tally(ballots: &[Ballot]) -> TallyResult {
    let mut counts: BTreeMap<ParticipantId, u32> = BTreeMap::new();
    for target in ballots.iter().filter_map(Ballot::target) {
        let votes = counts.entry(target).or_insert(0);
        *votes = votes.saturating_add(1);
    }

    let Some(top) = counts.values().copied().max() else {
        return TallyResult::NoVotes;
    };
    let leaders: Vec<ParticipantId> = counts
        .into_iter()
        .filter(|&(_, votes)| votes == top)
        .map(|(target, _)| target)
        .collect();

    if let [target] = *leaders.as_slice() {
        return TallyResult::Winner { target, votes: top };
    }
    TallyResult::Tie {
        candidates: leaders,
        votes: top,
    }
}

/// Check a ballot against the current state and the voter's candidates.
///
/// # Errors
///
/// Returns the [`Rejection`] explaining why the ballot cannot be counted.
pub fn validate_ballot(
    state: &GameState,
    voter_id: ParticipantId,
    candidates: &[ParticipantId],
    ballot: &Ballot,
) -> Result<Ballot, Rejection> {
    if ballot.voter_id != voter_id {
        return Err(Rejection::ActorMismatch);
    }
    let BallotChoice::Vote(target) = ballot.choice else {
        return Ok(*ballot);
    };
    if state.participant(target).is_none() {
        return Err(Rejection::UnknownTarget);
    }
    if !state.is_alive(target) {
        return Err(Rejection::DeadTarget);
    }
    if target == voter_id {
        return Err(Rejection::SelfTarget);
    }
    if !candidates.contains(&target) {
        return Err(Rejection::NotACandidate);
    }
    Ok(*ballot)
}

/// Runs the day vote.
#[derive(Debug, Clone, Copy, Default)]
pub struct VotingSystem;

impl VotingSystem {
    /// Collect ballots from every alive participant and decide the elimination.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] if a defense speech references an unknown participant.
    pub async fn collect_and_resolve<S: DecisionSource>(
        state: &mut GameState,
        dispatcher: &Dispatcher<'_, S>,
    ) -> Result<VoteOutcome, GameError> {
        let voters = state.alive_ids();

        let first = collect(state, dispatcher, &voters, &voters, false).await;
        let tied = match tally(&first) {
            TallyResult::Winner { target, votes } => {
                return Ok(VoteOutcome::Eliminate { target, votes });
            }
            TallyResult::NoVotes => return Ok(VoteOutcome::Skip(SkipReason::NoVotes)),
            TallyResult::Tie { candidates, votes } => {
                info!(round = state.round(), votes, candidates = ?candidates, "vote tied, calling re-vote");
                candidates
            }
        };

        state.record(GameEvent::RevoteTriggered {
            round: state.round(),
            candidates: tied.clone(),
        });
        for &candidate in &tied {
            dispatcher
                .deliver_speech(state, candidate, SpeechKind::Defense)
                .await?;
        }

        let second = collect(state, dispatcher, &voters, &tied, true).await;
        Ok(match tally(&second) {
            TallyResult::Winner { target, votes } => VoteOutcome::Eliminate { target, votes },
            TallyResult::Tie { .. } => VoteOutcome::Skip(SkipReason::TiedAfterRevote),
            TallyResult::NoVotes => VoteOutcome::Skip(SkipReason::NoVotes),
        })
    }
}

async fn collect<S: DecisionSource>(
    state: &mut GameState,
    dispatcher: &Dispatcher<'_, S>,
    voters: &[ParticipantId],
    candidates: &[ParticipantId],
    revote: bool,
) -> Vec<Ballot> {
    let view = state.view();
    let requests: Vec<BallotRequest> = voters
        .iter()
        .filter_map(|&voter_id| {
            let role = state.participant(voter_id)?.role;
            Some(BallotRequest {
                voter_id,
                role,
                candidates: candidates.iter().copied().filter(|c| *c != voter_id).collect(),
                revote,
                view: view.clone(),
            })
        })
        .collect();

    let results = dispatcher.ballots(&requests).await;

    let mut ballots = Vec::with_capacity(requests.len());
    for (request, result) in requests.iter().zip(results) {
        let voter_id = request.voter_id;
        let checked = result
            .map_err(|err| err.degrade_reason())
            .and_then(|ballot| {
                validate_ballot(state, voter_id, &request.candidates, &ballot)
                    .map_err(|rejection| DegradeReason::Rejected { rejection })
            });
        let ballot = match checked {
            Ok(ballot) => {
                debug!(round = state.round(), voter_id = %voter_id, choice = ?ballot.choice, revote, "ballot accepted");
                ballot
            }
            Err(reason) => {
                state.record_degraded(voter_id, DecisionKind::Ballot, reason);
                Ballot::abstain(voter_id)
            }
        };
        state.record(GameEvent::VoteCast {
            round: state.round(),
            ballot,
            revote,
        });
        ballots.push(ballot);
    }
    ballots
}
