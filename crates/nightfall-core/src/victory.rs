//! Win-condition evaluation.
//!
//! The checker is a pure function of [`GameState`]. The werewolves win when
//! no *plain* villager is left alive; a surviving seer or witch does not
//! keep the village in the game.

use nightfall_types::{Role, Verdict};

use crate::state::{GameError, GameState};

/// Evaluates win conditions and the optional round limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VictoryChecker {
    max_rounds: Option<u32>,
}

impl VictoryChecker {
    /// A checker enforcing `max_rounds`, if any.
    pub const fn new(max_rounds: Option<u32>) -> Self {
        Self { max_rounds }
    }

    /// Faction verdict for the current state.
    ///
    /// A village win is checked before a werewolf win, so a night in which
    /// the last werewolf and the last plain villager both die goes to the
    /// village.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::VictoryAmbiguity`] when nobody is alive.
    pub fn evaluate(state: &GameState) -> Result<Verdict, GameError> {
        if state.alive_ids().is_empty() {
            return Err(GameError::VictoryAmbiguity {
                round: state.round(),
            });
        }
        if state.count_alive(Role::Werewolf) == 0 {
            return Ok(Verdict::VillagersWin);
        }
        if state.count_alive(Role::Villager) == 0 {
            return Ok(Verdict::WerewolvesWin);
        }
        Ok(Verdict::Ongoing)
    }

    /// Verdict at the top of `round`: a draw once the limit is exceeded.
    pub const fn at_round_start(&self, round: u32) -> Verdict {
        match self.max_rounds {
            Some(limit) if round > limit => Verdict::Draw,
            _ => Verdict::Ongoing,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nightfall_types::{DeathCause, ParticipantId};

    use super::*;
    use crate::state::tests::classic_state;

    #[test]
    fn fresh_table_is_ongoing() {
        let state = classic_state();
        assert_eq!(VictoryChecker::evaluate(&state).unwrap(), Verdict::Ongoing);
    }

    #[test]
    fn werewolves_win_when_plain_villagers_are_gone() {
        let mut state = classic_state();
        for seat in 1..=3 {
            state.kill(ParticipantId(seat), DeathCause::WerewolfKill).unwrap();
        }
        // Seer and witch are still alive.
        assert!(state.is_alive(ParticipantId(6)));
        assert!(state.is_alive(ParticipantId(7)));
        assert_eq!(
            VictoryChecker::evaluate(&state).unwrap(),
            Verdict::WerewolvesWin
        );
    }

    #[test]
    fn village_wins_when_no_werewolf_is_left() {
        let mut state = classic_state();
        state.kill(ParticipantId(4), DeathCause::Elimination).unwrap();
        state.kill(ParticipantId(5), DeathCause::Poison).unwrap();
        assert_eq!(
            VictoryChecker::evaluate(&state).unwrap(),
            Verdict::VillagersWin
        );
    }

    #[test]
    fn village_win_takes_precedence() {
        let mut state = classic_state();
        for seat in [1, 2, 3, 4, 5] {
            state.kill(ParticipantId(seat), DeathCause::Poison).unwrap();
        }
        assert_eq!(
            VictoryChecker::evaluate(&state).unwrap(),
            Verdict::VillagersWin
        );
    }

    #[test]
    fn empty_table_is_ambiguous() {
        let mut state = classic_state();
        for seat in 1..=7 {
            state.kill(ParticipantId(seat), DeathCause::Poison).unwrap();
        }
        assert!(matches!(
            VictoryChecker::evaluate(&state),
            Err(GameError::VictoryAmbiguity { round: 1 })
        ));
    }

    #[test]
    fn round_limit() {
        let checker = VictoryChecker::new(Some(3));
        assert_eq!(checker.at_round_start(3), Verdict::Ongoing);
        assert_eq!(checker.at_round_start(4), Verdict::Draw);
        assert_eq!(VictoryChecker::new(None).at_round_start(u32::MAX), Verdict::Ongoing);
    }
}
