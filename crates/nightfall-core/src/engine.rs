//! The phase controller.
//!
//! [`Engine`] owns the [`GameState`] and drives it round by round:
//!
//! ```text
//! Setup -> NightAction -> NightResolution -> VictoryCheck
//!       -> DayAnnouncement -> Discussion -> Voting -> Elimination
//!       -> VictoryCheck -> (next round | GameOver)
//! ```
//!
//! All mutation happens on the engine's task. Decision calls for a phase
//! may run concurrently, but their results are applied one at a time in
//! ascending seat order. The round limit is enforced at the top of each
//! round; win conditions are checked after the night commits and after
//! the elimination, so a night that kills the last werewolf ends the game
//! before anyone speaks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nightfall_types::{
    AnnouncedDeath, DeathCause, Faction, GameEvent, GameId, ParticipantId, Phase, Role,
    SpeechKind, Verdict,
};
use serde::Serialize;
use tracing::{error, info};

use crate::config::GameConfig;
use crate::decision::{DecisionSource, Dispatcher};
use crate::night::{self, NightActionResolver, NightReport};
use crate::setup;
use crate::state::{GameError, GameState, Participant};
use crate::victory::VictoryChecker;
use crate::voting::{VoteOutcome, VotingSystem};

/// The result of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    /// Identifier of this run.
    pub game_id: GameId,
    /// Final verdict.
    pub verdict: Verdict,
    /// Winning faction, absent for a draw.
    pub winning_faction: Option<Faction>,
    /// Number of rounds that were played.
    pub rounds_played: u32,
    /// The table, with final alive status.
    pub participants: Vec<Participant>,
    /// The complete event log.
    pub events: Vec<GameEvent>,
    /// When the engine started running.
    pub started_at: DateTime<Utc>,
    /// When the game ended.
    pub finished_at: DateTime<Utc>,
}

/// Per-role head count at the end of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    /// Participants of the role still alive.
    pub alive: u32,
    /// Participants of the role who died.
    pub dead: u32,
}

/// One death, as read back from the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeathRecord {
    /// Round of the death.
    pub round: u32,
    /// Who died.
    pub participant_id: ParticipantId,
    /// Their role.
    pub role: Role,
    /// How they died.
    pub cause: DeathCause,
}

/// Post-game summary derived from the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    /// Final verdict.
    pub verdict: Verdict,
    /// Number of rounds that were played.
    pub rounds_played: u32,
    /// Head count per role.
    pub roles: BTreeMap<Role, RoleCount>,
    /// Deaths in the order they happened.
    pub deaths: Vec<DeathRecord>,
}

impl GameOutcome {
    /// Summarize the game from its event log.
    pub fn summary(&self) -> GameSummary {
        let role_of: BTreeMap<ParticipantId, Role> =
            self.participants.iter().map(|p| (p.id, p.role)).collect();

        let deaths: Vec<DeathRecord> = self
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::DeathOccurred {
                    round,
                    participant_id,
                    cause,
                } => role_of.get(participant_id).map(|&role| DeathRecord {
                    round: *round,
                    participant_id: *participant_id,
                    role,
                    cause: *cause,
                }),
                _ => None,
            })
            .collect();

        let mut roles: BTreeMap<Role, RoleCount> = BTreeMap::new();
        for p in &self.participants {
            let count = roles.entry(p.role).or_default();
            if deaths.iter().any(|d| d.participant_id == p.id) {
                count.dead = count.dead.saturating_add(1);
            } else {
                count.alive = count.alive.saturating_add(1);
            }
        }

        GameSummary {
            verdict: self.verdict,
            rounds_played: self.rounds_played,
            roles,
            deaths,
        }
    }
}

/// Runs one game.
#[derive(Debug)]
pub struct Engine<S> {
    game_id: GameId,
    config: GameConfig,
    state: GameState,
    source: S,
    victory: VictoryChecker,
}

impl<S: DecisionSource> Engine<S> {
    /// Prepare a game with a caller-supplied table.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] if the configuration is invalid or the
    /// participants do not match its role counts.
    pub fn new(
        config: GameConfig,
        participants: Vec<Participant>,
        source: S,
    ) -> Result<Self, GameError> {
        config.validate()?;
        setup::check_participants(&config, &participants)?;

        let state = GameState::new(participants, config.rules);
        Ok(Self {
            game_id: GameId::new(),
            victory: VictoryChecker::new(config.game.max_rounds),
            config,
            state,
            source,
        })
    }

    /// Prepare a game seated from the configuration's seed.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] if the configuration is invalid.
    pub fn from_config(config: GameConfig, source: S) -> Result<Self, GameError> {
        config.validate()?;
        let participants = setup::assign_roles(&config)?;
        Self::new(config, participants, source)
    }

    /// Identifier of this run.
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// The current state.
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Play the game to the end.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] if an invariant breaks. The game is abandoned
    /// at that point.
    pub async fn run(mut self) -> Result<GameOutcome, GameError> {
        let started_at = Utc::now();
        info!(
            game_id = %self.game_id,
            name = %self.config.game.name,
            participants = self.state.participants().len(),
            max_rounds = ?self.config.game.max_rounds,
            "game starting"
        );

        let (verdict, rounds_played) = match self.play().await {
            Ok(result) => result,
            Err(err) => {
                error!(game_id = %self.game_id, round = self.state.round(), error = %err, "game aborted");
                return Err(err);
            }
        };

        let winning_faction = verdict.winning_faction();
        info!(
            game_id = %self.game_id,
            verdict = ?verdict,
            winning_faction = ?winning_faction,
            rounds_played,
            "game over"
        );

        let participants = self.state.participants().to_vec();
        Ok(GameOutcome {
            game_id: self.game_id,
            verdict,
            winning_faction,
            rounds_played,
            participants,
            events: self.state.into_log().into_vec(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn play(&mut self) -> Result<(Verdict, u32), GameError> {
        let dispatcher = Dispatcher::new(&self.source, self.config.timing);
        let victory = self.victory;
        let state = &mut self.state;
        let mut rounds_played: u32 = 0;

        // The limit is checked for a round before it starts. A refused round
        // is never entered, so the terminal events carry the last round played.
        let mut next_round = state.round();
        let verdict = loop {
            let limit = victory.at_round_start(next_round);
            if limit.is_terminal() {
                info!(round = state.round(), refused_round = next_round, "round limit exceeded");
                break limit;
            }
            if next_round != state.round() {
                state.advance_round();
            }

            state.transition(Phase::NightAction)?;
            rounds_played = rounds_played.saturating_add(1);
            let verdict = play_round(state, &dispatcher).await?;
            if verdict.is_terminal() {
                break verdict;
            }
            next_round = state.round().saturating_add(1);
        };

        state.transition(Phase::GameOver)?;
        state.record(GameEvent::GameEnded {
            round: state.round(),
            verdict,
            winning_faction: verdict.winning_faction(),
        });
        Ok((verdict, rounds_played))
    }
}

/// Validate the configuration, seat the table, and play one game.
///
/// # Errors
///
/// Returns [`GameError::Config`] before any state exists if the
/// configuration is invalid, or another [`GameError`] if the game aborts.
pub async fn start<S: DecisionSource>(
    config: GameConfig,
    source: S,
) -> Result<GameOutcome, GameError> {
    Engine::from_config(config, source)?.run().await
}

async fn play_round<S: DecisionSource>(
    state: &mut GameState,
    dispatcher: &Dispatcher<'_, S>,
) -> Result<Verdict, GameError> {
    // Night
    let intents = night::collect_intents(state, dispatcher).await;
    state.transition(Phase::NightResolution)?;
    let report = NightActionResolver::resolve(state, &intents)?;

    state.transition(Phase::VictoryCheck)?;
    let verdict = VictoryChecker::evaluate(state)?;
    if verdict.is_terminal() {
        return Ok(verdict);
    }

    // Day
    state.transition(Phase::DayAnnouncement)?;
    announce(state, &report)?;

    state.transition(Phase::Discussion)?;
    for speaker in state.alive_ids() {
        dispatcher
            .deliver_speech(state, speaker, SpeechKind::Discussion)
            .await?;
    }

    state.transition(Phase::Voting)?;
    let outcome = VotingSystem::collect_and_resolve(state, dispatcher).await?;

    state.transition(Phase::Elimination)?;
    eliminate(state, dispatcher, outcome).await?;

    state.transition(Phase::VictoryCheck)?;
    VictoryChecker::evaluate(state)
}

fn announce(state: &mut GameState, report: &NightReport) -> Result<(), GameError> {
    let reveal = state.rules().reveal_roles_on_death;
    let mut deaths = Vec::with_capacity(report.deaths.len());
    for &(participant_id, cause) in &report.deaths {
        let role = state.role_of(participant_id)?;
        deaths.push(AnnouncedDeath {
            participant_id,
            cause,
            revealed_role: reveal.then_some(role),
        });
    }

    info!(round = state.round(), deaths = deaths.len(), "day announced");
    state.record(GameEvent::DayAnnounced {
        round: state.round(),
        deaths,
    });
    Ok(())
}

async fn eliminate<S: DecisionSource>(
    state: &mut GameState,
    dispatcher: &Dispatcher<'_, S>,
    outcome: VoteOutcome,
) -> Result<(), GameError> {
    match outcome {
        VoteOutcome::Eliminate { target, votes } => {
            dispatcher
                .deliver_speech(state, target, SpeechKind::LastWords)
                .await?;
            info!(round = state.round(), participant_id = %target, votes, "participant eliminated");
            state.record(GameEvent::EliminationOccurred {
                round: state.round(),
                participant_id: target,
                votes,
            });
            state.kill(target, DeathCause::Elimination)?;
        }
        VoteOutcome::Skip(reason) => {
            info!(round = state.round(), reason = ?reason, "no elimination");
            state.record(GameEvent::EliminationSkipped {
                round: state.round(),
                reason,
            });
        }
    }
    state.check_invariants()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nightfall_types::{Ballot, NightActionKind, NightIntent};

    use super::*;
    use crate::config::ConfigError;
    use crate::decision::{ScriptedDecisionSource, StubDecisionSource};
    use crate::state::tests::classic_table;

    #[tokio::test]
    async fn invalid_config_never_starts() {
        let mut config = GameConfig::default();
        config.roles.werewolf = 0;
        let result = start(config, StubDecisionSource::new()).await;
        assert!(matches!(
            result,
            Err(GameError::Config {
                source: ConfigError::RoleCountMismatch { .. }
            })
        ));
    }

    #[test]
    fn mismatched_table_is_rejected() {
        let mut table = classic_table();
        table.pop();
        let result = Engine::new(GameConfig::default(), table, StubDecisionSource::new());
        assert!(matches!(
            result,
            Err(GameError::Config {
                source: ConfigError::ParticipantMismatch { .. }
            })
        ));
    }

    #[tokio::test]
    async fn passive_game_hits_the_round_limit() {
        let mut config = GameConfig::default();
        config.game.max_rounds = Some(2);
        let engine = Engine::new(config, classic_table(), StubDecisionSource::new()).unwrap();
        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome.verdict, Verdict::Draw);
        assert_eq!(outcome.winning_faction, None);
        assert_eq!(outcome.rounds_played, 2);
        assert!(matches!(
            outcome.events.last(),
            Some(GameEvent::GameEnded {
                round: 2,
                verdict: Verdict::Draw,
                ..
            })
        ));
        assert!(outcome.events.iter().all(|e| e.round() <= 2));
    }

    #[tokio::test]
    async fn killing_the_last_werewolf_at_night_ends_the_game() {
        let mut config = GameConfig::default();
        config.roles.werewolf = 1;
        config.roles.villager = 4;
        let mut table = classic_table();
        if let Some(p) = table.iter_mut().find(|p| p.id == ParticipantId(5)) {
            p.role = Role::Villager;
        }
        let source = ScriptedDecisionSource::new()
            .night(1, NightIntent::targeting(ParticipantId(4), NightActionKind::Kill, ParticipantId(1)))
            .night(1, NightIntent::targeting(ParticipantId(7), NightActionKind::Poison, ParticipantId(4)));

        let outcome = Engine::new(config, table, source).unwrap().run().await.unwrap();
        assert_eq!(outcome.verdict, Verdict::VillagersWin);
        assert_eq!(outcome.rounds_played, 1);
        assert!(!outcome
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::DayAnnounced { .. })));
    }

    #[tokio::test]
    async fn summary_counts_the_dead() {
        let source = ScriptedDecisionSource::new()
            .night(1, NightIntent::targeting(ParticipantId(4), NightActionKind::Kill, ParticipantId(1)))
            .vote(1, Ballot::vote(ParticipantId(2), ParticipantId(5)));
        let mut config = GameConfig::default();
        config.game.max_rounds = Some(1);

        let outcome = Engine::new(config, classic_table(), source).unwrap().run().await.unwrap();
        let summary = outcome.summary();
        assert_eq!(summary.verdict, Verdict::Draw);
        assert_eq!(summary.deaths.len(), 2);
        assert_eq!(
            summary.roles.get(&Role::Villager),
            Some(&RoleCount { alive: 2, dead: 1 })
        );
        assert_eq!(
            summary.roles.get(&Role::Werewolf),
            Some(&RoleCount { alive: 1, dead: 1 })
        );
        assert_eq!(summary.deaths.first().map(|d| d.cause), Some(DeathCause::WerewolfKill));
        assert_eq!(summary.deaths.get(1).map(|d| d.cause), Some(DeathCause::Elimination));
    }

    #[tokio::test]
    async fn outcome_serializes_with_its_event_log() {
        let mut config = GameConfig::default();
        config.game.max_rounds = Some(1);
        let outcome = Engine::new(config, classic_table(), StubDecisionSource::new())
            .unwrap()
            .run()
            .await
            .unwrap();

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["verdict"], "draw");
        assert_eq!(json["rounds_played"], 1);
        assert_eq!(
            json["events"].as_array().map(Vec::len),
            Some(outcome.events.len())
        );
        assert_eq!(json["participants"].as_array().map(Vec::len), Some(7));
    }
}
