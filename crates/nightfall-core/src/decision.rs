//! Decision source trait, bounded dispatch, and built-in sources.
//!
//! Whenever a participant has to act (a night intent, a speech, a ballot)
//! the engine builds a read-only request and asks a [`DecisionSource`].
//! The source could be a language-model backend, a scripted bot, a human
//! at a terminal, or a test double. The engine never trusts it: every call
//! runs under its own deadline, and a timeout or error is replaced with
//! the call's fallback (`pass`, an empty speech, `abstain`).
//!
//! Calls for one phase are started together and awaited with
//! [`futures::future::join_all`], which yields results in request order.
//! Requests are built in ascending seat order, so results are applied in
//! that order no matter which call finished first.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use nightfall_types::{
    Ballot, BallotRequest, DecisionKind, DegradeReason, GameEvent, NightIntent, NightRequest,
    ParticipantId, SpeechKind, SpeechRequest,
};
use tokio::time::timeout;
use tracing::debug;

use crate::config::TimingConfig;
use crate::state::{GameError, GameState};

/// Errors a single decision call can produce. Always recoverable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    /// The participant did not answer within the deadline.
    #[error("participant {participant_id} timed out (deadline: {deadline_ms}ms)")]
    Timeout {
        /// The participant that timed out.
        participant_id: ParticipantId,
        /// The deadline in milliseconds.
        deadline_ms: u64,
    },

    /// An internal error in the decision source.
    #[error("decision source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

impl DecisionError {
    /// How the failure is recorded in the event log.
    pub fn degrade_reason(&self) -> DegradeReason {
        match self {
            Self::Timeout { deadline_ms, .. } => DegradeReason::Timeout {
                deadline_ms: *deadline_ms,
            },
            Self::Internal { message } => DegradeReason::SourceError {
                message: message.clone(),
            },
        }
    }
}

/// A source of participant decisions.
///
/// Implementations receive owned snapshots and return futures; they must
/// not assume they will be polled to completion, since calls that miss
/// their deadline are dropped.
pub trait DecisionSource {
    /// Choose a night intent for `request.actor_id`.
    fn night_intent(
        &self,
        request: &NightRequest,
    ) -> impl Future<Output = Result<NightIntent, DecisionError>>;

    /// Produce a speech for `request.speaker_id`. The content is opaque.
    fn speak(&self, request: &SpeechRequest) -> impl Future<Output = Result<String, DecisionError>>;

    /// Cast a ballot for `request.voter_id`.
    fn ballot(&self, request: &BallotRequest) -> impl Future<Output = Result<Ballot, DecisionError>>;
}

impl<T: DecisionSource + ?Sized> DecisionSource for &T {
    fn night_intent(
        &self,
        request: &NightRequest,
    ) -> impl Future<Output = Result<NightIntent, DecisionError>> {
        (**self).night_intent(request)
    }

    fn speak(&self, request: &SpeechRequest) -> impl Future<Output = Result<String, DecisionError>> {
        (**self).speak(request)
    }

    fn ballot(&self, request: &BallotRequest) -> impl Future<Output = Result<Ballot, DecisionError>> {
        (**self).ballot(request)
    }
}

/// Run one decision call under a deadline.
///
/// # Errors
///
/// Returns [`DecisionError::Timeout`] if `call` does not finish within
/// `deadline`, or whatever error `call` itself produced.
pub async fn bounded<T>(
    participant_id: ParticipantId,
    deadline: Duration,
    call: impl Future<Output = Result<T, DecisionError>>,
) -> Result<T, DecisionError> {
    timeout(deadline, call)
        .await
        .unwrap_or_else(|_elapsed| {
            Err(DecisionError::Timeout {
                participant_id,
                deadline_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            })
        })
}

/// Issues bounded calls against a [`DecisionSource`] with the configured deadlines.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a, S> {
    source: &'a S,
    timing: TimingConfig,
}

impl<'a, S: DecisionSource> Dispatcher<'a, S> {
    /// Wrap a source.
    pub const fn new(source: &'a S, timing: TimingConfig) -> Self {
        Self { source, timing }
    }

    /// Ask every requester for a night intent at once. Results come back in request order.
    pub async fn night_intents(
        &self,
        requests: &[NightRequest],
    ) -> Vec<Result<NightIntent, DecisionError>> {
        let deadline = self.timing.night_action_timeout();
        join_all(
            requests
                .iter()
                .map(|r| bounded(r.actor_id, deadline, self.source.night_intent(r))),
        )
        .await
    }

    /// Ask every voter for a ballot at once. Results come back in request order.
    pub async fn ballots(&self, requests: &[BallotRequest]) -> Vec<Result<Ballot, DecisionError>> {
        let deadline = self.timing.vote_timeout();
        join_all(
            requests
                .iter()
                .map(|r| bounded(r.voter_id, deadline, self.source.ballot(r))),
        )
        .await
    }

    /// Ask one participant to speak and record the speech.
    ///
    /// The speaker sees every speech already given this round. A failed
    /// call is recorded as degraded and the speech is recorded empty.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownParticipant`] if `speaker_id` is not at the table.
    pub async fn deliver_speech(
        &self,
        state: &mut GameState,
        speaker_id: ParticipantId,
        kind: SpeechKind,
    ) -> Result<(), GameError> {
        let request = SpeechRequest {
            speaker_id,
            role: state.role_of(speaker_id)?,
            kind,
            view: state.view(),
            earlier_speeches: state.speeches_this_round(),
        };
        let deadline = self.timing.speech_timeout();
        let content = match bounded(speaker_id, deadline, self.source.speak(&request)).await {
            Ok(content) => {
                debug!(round = state.round(), speaker_id = %speaker_id, kind = ?kind, "speech received");
                content
            }
            Err(err) => {
                state.record_degraded(speaker_id, DecisionKind::Speech, err.degrade_reason());
                String::new()
            }
        };
        state.record(GameEvent::SpeechGiven {
            round: state.round(),
            speaker_id,
            kind,
            content,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Built-in sources
// ---------------------------------------------------------------------------

/// A decision source that always answers with the fallback.
///
/// Every participant passes at night, says nothing, and abstains.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDecisionSource;

impl StubDecisionSource {
    /// Create a new stub decision source.
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionSource for StubDecisionSource {
    fn night_intent(
        &self,
        request: &NightRequest,
    ) -> impl Future<Output = Result<NightIntent, DecisionError>> {
        std::future::ready(Ok(NightIntent::pass(request.actor_id)))
    }

    fn speak(&self, _request: &SpeechRequest) -> impl Future<Output = Result<String, DecisionError>> {
        std::future::ready(Ok(String::new()))
    }

    fn ballot(&self, request: &BallotRequest) -> impl Future<Output = Result<Ballot, DecisionError>> {
        std::future::ready(Ok(Ballot::abstain(request.voter_id)))
    }
}

/// A scripted answer, optionally delayed or replaced by a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted<T> {
    /// Answer with the value immediately.
    Answer(T),
    /// Answer with the value after sleeping.
    Delayed(T, Duration),
    /// Report a source error.
    Fail(String),
}

impl<T: Clone> Scripted<T> {
    async fn play(&self) -> Result<T, DecisionError> {
        match self {
            Self::Answer(value) => Ok(value.clone()),
            Self::Delayed(value, delay) => {
                tokio::time::sleep(*delay).await;
                Ok(value.clone())
            }
            Self::Fail(message) => Err(DecisionError::Internal {
                message: message.clone(),
            }),
        }
    }
}

/// A decision source that replays answers keyed by round and seat.
///
/// Unscripted night calls pass, unscripted speeches are empty, and
/// unscripted ballots abstain, so a script only needs to name the
/// decisions a scenario depends on. Re-vote ballots are keyed separately
/// from first-vote ballots. Two games driven by equal scripts produce
/// equal event logs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisionSource {
    night: BTreeMap<(u32, ParticipantId), Scripted<NightIntent>>,
    speeches: BTreeMap<(u32, ParticipantId, SpeechKind), Scripted<String>>,
    ballots: BTreeMap<(u32, ParticipantId, bool), Scripted<Ballot>>,
}

impl ScriptedDecisionSource {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a night intent for `round`.
    #[must_use]
    pub fn night(mut self, round: u32, intent: NightIntent) -> Self {
        self.night
            .insert((round, intent.actor_id), Scripted::Answer(intent));
        self
    }

    /// Script any night answer for `actor` in `round`.
    #[must_use]
    pub fn night_with(
        mut self,
        round: u32,
        actor: ParticipantId,
        answer: Scripted<NightIntent>,
    ) -> Self {
        self.night.insert((round, actor), answer);
        self
    }

    /// Script a speech.
    #[must_use]
    pub fn speech(
        mut self,
        round: u32,
        speaker: ParticipantId,
        kind: SpeechKind,
        answer: Scripted<String>,
    ) -> Self {
        self.speeches.insert((round, speaker, kind), answer);
        self
    }

    /// Script a first-vote ballot for `round`.
    #[must_use]
    pub fn vote(mut self, round: u32, ballot: Ballot) -> Self {
        self.ballots
            .insert((round, ballot.voter_id, false), Scripted::Answer(ballot));
        self
    }

    /// Script a re-vote ballot for `round`.
    #[must_use]
    pub fn revote(mut self, round: u32, ballot: Ballot) -> Self {
        self.ballots
            .insert((round, ballot.voter_id, true), Scripted::Answer(ballot));
        self
    }

    /// Script any ballot answer for `voter`.
    #[must_use]
    pub fn ballot_with(
        mut self,
        round: u32,
        voter: ParticipantId,
        revote: bool,
        answer: Scripted<Ballot>,
    ) -> Self {
        self.ballots.insert((round, voter, revote), answer);
        self
    }
}

impl DecisionSource for ScriptedDecisionSource {
    async fn night_intent(&self, request: &NightRequest) -> Result<NightIntent, DecisionError> {
        match self.night.get(&(request.view.round, request.actor_id)) {
            Some(answer) => answer.play().await,
            None => Ok(NightIntent::pass(request.actor_id)),
        }
    }

    async fn speak(&self, request: &SpeechRequest) -> Result<String, DecisionError> {
        let key = (request.view.round, request.speaker_id, request.kind);
        match self.speeches.get(&key) {
            Some(answer) => answer.play().await,
            None => Ok(String::new()),
        }
    }

    async fn ballot(&self, request: &BallotRequest) -> Result<Ballot, DecisionError> {
        let key = (request.view.round, request.voter_id, request.revote);
        match self.ballots.get(&key) {
            Some(answer) => answer.play().await,
            None => Ok(Ballot::abstain(request.voter_id)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nightfall_types::{NightActionKind, NightContext, Phase, Role};

    use super::*;
    use crate::state::tests::classic_state;

    fn night_request(state: &GameState, actor: u32) -> NightRequest {
        NightRequest {
            actor_id: ParticipantId(actor),
            role: Role::Werewolf,
            view: state.view(),
            context: NightContext::Werewolf { pack: state.pack() },
        }
    }

    fn timing(ms: u64) -> TimingConfig {
        TimingConfig {
            night_action_timeout_ms: ms,
            speech_timeout_ms: ms,
            vote_timeout_ms: ms,
        }
    }

    #[tokio::test]
    async fn stub_always_falls_back() {
        let state = classic_state();
        let source = StubDecisionSource::new();
        let intent = source.night_intent(&night_request(&state, 4)).await.unwrap();
        assert!(intent.is_pass());
        assert_eq!(intent.actor_id, ParticipantId(4));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let result = bounded(ParticipantId(3), Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, DecisionError>(())
        })
        .await;
        assert_eq!(
            result,
            Err(DecisionError::Timeout {
                participant_id: ParticipantId(3),
                deadline_ms: 50
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn results_keep_request_order() {
        let state = classic_state();
        let source = ScriptedDecisionSource::new()
            .night_with(
                1,
                ParticipantId(4),
                Scripted::Delayed(
                    NightIntent::targeting(ParticipantId(4), NightActionKind::Kill, ParticipantId(1)),
                    Duration::from_millis(40),
                ),
            )
            .night_with(
                1,
                ParticipantId(5),
                Scripted::Delayed(
                    NightIntent::targeting(ParticipantId(5), NightActionKind::Kill, ParticipantId(2)),
                    Duration::from_millis(500),
                ),
            );
        let dispatcher = Dispatcher::new(&source, timing(100));
        let requests = [night_request(&state, 4), night_request(&state, 5)];

        let results = dispatcher.night_intents(&requests).await;
        assert_eq!(results.len(), 2);
        assert_eq!(
            results.first().unwrap().as_ref().unwrap().target_id,
            Some(ParticipantId(1))
        );
        assert!(matches!(
            results.get(1).unwrap(),
            Err(DecisionError::Timeout { deadline_ms: 100, .. })
        ));
    }

    #[tokio::test]
    async fn failed_speech_is_recorded_empty() {
        let mut state = classic_state();
        state.transition(Phase::NightAction).unwrap();
        let source = ScriptedDecisionSource::new().speech(
            1,
            ParticipantId(2),
            SpeechKind::Discussion,
            Scripted::Fail(String::from("backend down")),
        );
        let dispatcher = Dispatcher::new(&source, timing(1000));
        dispatcher
            .deliver_speech(&mut state, ParticipantId(2), SpeechKind::Discussion)
            .await
            .unwrap();

        let tail: Vec<&GameEvent> = state.events().iter().rev().take(2).collect();
        assert!(matches!(
            tail.first(),
            Some(GameEvent::SpeechGiven { content, .. }) if content.is_empty()
        ));
        assert!(matches!(
            tail.get(1),
            Some(GameEvent::DecisionDegraded {
                call: DecisionKind::Speech,
                reason: DegradeReason::SourceError { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn speakers_hear_earlier_speeches() {
        let mut state = classic_state();
        let source = ScriptedDecisionSource::new().speech(
            1,
            ParticipantId(1),
            SpeechKind::Discussion,
            Scripted::Answer(String::from("I suspect seat 4")),
        );
        let dispatcher = Dispatcher::new(&source, timing(1000));
        dispatcher
            .deliver_speech(&mut state, ParticipantId(1), SpeechKind::Discussion)
            .await
            .unwrap();

        let heard = state.speeches_this_round();
        assert_eq!(heard.len(), 1);
        assert_eq!(heard.first().unwrap().content, "I suspect seat 4");
    }
}
