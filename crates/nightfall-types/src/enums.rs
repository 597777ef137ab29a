//! Enumeration types for the Nightfall engine.
//!
//! Roles are a closed tagged variant. Everything a role can do at night is
//! described by its [`Capability`] entry; the resolver dispatches on the
//! tag and consults the table instead of relying on per-role overrides.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Roles and factions
// ---------------------------------------------------------------------------

/// The two competing sides of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Plain villagers plus every villager-aligned special role.
    Villagers,
    /// The werewolves.
    Werewolves,
}

/// A participant's role, assigned once at setup and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A villager with no special ability.
    Villager,
    /// Member of the werewolf pack; kills collectively at night.
    Werewolf,
    /// Learns one participant's faction each night.
    Seer,
    /// Holds one antidote and one poison for the whole game.
    Witch,
}

/// One-use witch resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Potion {
    /// Cancels the werewolves' pending kill.
    Antidote,
    /// Kills its target outright.
    Poison,
}

/// The kind of a night intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum NightActionKind {
    /// Werewolf vote for the night's victim.
    Kill,
    /// Witch saves the pending victim.
    Antidote,
    /// Witch poisons a participant.
    Poison,
    /// Seer checks a participant's faction.
    Divine,
    /// No action this night. Also the fallback for failed decisions.
    Pass,
}

impl NightActionKind {
    /// Whether this kind requires a target.
    pub const fn needs_target(self) -> bool {
        !matches!(self, Self::Pass)
    }

    /// The potion spent by this action, if any.
    pub const fn potion(self) -> Option<Potion> {
        match self {
            Self::Antidote => Some(Potion::Antidote),
            Self::Poison => Some(Potion::Poison),
            Self::Kill | Self::Divine | Self::Pass => None,
        }
    }
}

/// Static description of what a role may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// Faction the role belongs to.
    pub faction: Faction,
    /// Night action kinds the role may submit. Empty means no night turn.
    pub night_actions: &'static [NightActionKind],
    /// Whether same-role actors see each other during the night.
    pub coordinates: bool,
    /// One-use resources granted at setup.
    pub potions: &'static [Potion],
}

impl Role {
    /// Every role, in canonical order.
    pub const ALL: [Self; 4] = [Self::Villager, Self::Werewolf, Self::Seer, Self::Witch];

    /// The capability table entry for this role.
    pub const fn capability(self) -> Capability {
        match self {
            Self::Villager => Capability {
                faction: Faction::Villagers,
                night_actions: &[],
                coordinates: false,
                potions: &[],
            },
            Self::Werewolf => Capability {
                faction: Faction::Werewolves,
                night_actions: &[NightActionKind::Kill, NightActionKind::Pass],
                coordinates: true,
                potions: &[],
            },
            Self::Seer => Capability {
                faction: Faction::Villagers,
                night_actions: &[NightActionKind::Divine, NightActionKind::Pass],
                coordinates: false,
                potions: &[],
            },
            Self::Witch => Capability {
                faction: Faction::Villagers,
                night_actions: &[
                    NightActionKind::Antidote,
                    NightActionKind::Poison,
                    NightActionKind::Pass,
                ],
                coordinates: false,
                potions: &[Potion::Antidote, Potion::Poison],
            },
        }
    }

    /// Faction derived from the role.
    pub const fn faction(self) -> Faction {
        self.capability().faction
    }

    /// Whether the role takes a turn during the night.
    pub const fn acts_at_night(self) -> bool {
        !self.capability().night_actions.is_empty()
    }

    /// Whether the role may submit the given night action kind.
    pub fn allows(self, kind: NightActionKind) -> bool {
        self.capability().night_actions.contains(&kind)
    }

    /// Configuration key for this role (`villager`, `werewolf`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Villager => "villager",
            Self::Werewolf => "werewolf",
            Self::Seer => "seer",
            Self::Witch => "witch",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// States of the phase controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Initial state before the first night.
    Setup,
    /// Night intents are being collected.
    NightAction,
    /// Night intents are applied in precedence order.
    NightResolution,
    /// The previous night's deaths are made public.
    DayAnnouncement,
    /// Alive participants speak in seat order.
    Discussion,
    /// Ballots are collected and tallied.
    Voting,
    /// The voting result, if any, is carried out.
    Elimination,
    /// Win conditions are evaluated.
    VictoryCheck,
    /// Terminal state.
    GameOver,
}

impl Phase {
    /// Whether the state machine permits moving from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Setup, Self::NightAction)
                | (Self::NightAction, Self::NightResolution)
                | (Self::NightResolution | Self::Elimination, Self::VictoryCheck)
                | (
                    Self::VictoryCheck,
                    Self::DayAnnouncement | Self::NightAction | Self::GameOver
                )
                | (Self::DayAnnouncement, Self::Discussion)
                | (Self::Discussion, Self::Voting)
                | (Self::Voting, Self::Elimination)
        )
    }

    /// Whether this is the terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver)
    }
}

// ---------------------------------------------------------------------------
// Deaths, speeches, verdicts
// ---------------------------------------------------------------------------

/// Why a participant died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Killed by the werewolves at night.
    WerewolfKill,
    /// Poisoned by the witch.
    Poison,
    /// Eliminated by the day vote.
    Elimination,
}

/// The context in which a speech was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SpeechKind {
    /// Regular turn in the day discussion.
    Discussion,
    /// A tied candidate speaking before the re-vote.
    Defense,
    /// Final words of a participant eliminated by vote.
    LastWords,
}

/// The category of an external decision call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// A night intent.
    NightAction,
    /// A speech of any kind.
    Speech,
    /// A day ballot.
    Ballot,
}

/// Result of a victory evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Neither side has won yet.
    Ongoing,
    /// No werewolf is alive.
    VillagersWin,
    /// No plain villager is alive.
    WerewolvesWin,
    /// The round limit was exceeded with no winner.
    Draw,
}

impl Verdict {
    /// Whether the verdict ends the game.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Ongoing)
    }

    /// The faction that won, if any.
    pub const fn winning_faction(self) -> Option<Faction> {
        match self {
            Self::VillagersWin => Some(Faction::Villagers),
            Self::WerewolvesWin => Some(Faction::Werewolves),
            Self::Ongoing | Self::Draw => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factions_follow_roles() {
        assert_eq!(Role::Villager.faction(), Faction::Villagers);
        assert_eq!(Role::Seer.faction(), Faction::Villagers);
        assert_eq!(Role::Witch.faction(), Faction::Villagers);
        assert_eq!(Role::Werewolf.faction(), Faction::Werewolves);
    }

    #[test]
    fn only_special_roles_act_at_night() {
        assert!(!Role::Villager.acts_at_night());
        assert!(Role::Werewolf.acts_at_night());
        assert!(Role::Seer.acts_at_night());
        assert!(Role::Witch.acts_at_night());
    }

    #[test]
    fn capability_table_restricts_actions() {
        assert!(Role::Werewolf.allows(NightActionKind::Kill));
        assert!(!Role::Werewolf.allows(NightActionKind::Divine));
        assert!(Role::Witch.allows(NightActionKind::Poison));
        assert!(!Role::Seer.allows(NightActionKind::Antidote));
        assert!(Role::Seer.allows(NightActionKind::Pass));
        assert!(!Role::Villager.allows(NightActionKind::Pass));
    }

    #[test]
    fn only_witch_actions_spend_potions() {
        assert_eq!(NightActionKind::Antidote.potion(), Some(Potion::Antidote));
        assert_eq!(NightActionKind::Poison.potion(), Some(Potion::Poison));
        for kind in [NightActionKind::Kill, NightActionKind::Divine, NightActionKind::Pass] {
            assert_eq!(kind.potion(), None);
        }
    }

    #[test]
    fn only_werewolves_coordinate() {
        for role in Role::ALL {
            assert_eq!(role.capability().coordinates, role == Role::Werewolf);
        }
    }

    #[test]
    fn game_over_has_no_outgoing_transitions() {
        let all = [
            Phase::Setup,
            Phase::NightAction,
            Phase::NightResolution,
            Phase::DayAnnouncement,
            Phase::Discussion,
            Phase::Voting,
            Phase::Elimination,
            Phase::VictoryCheck,
            Phase::GameOver,
        ];
        for next in all {
            assert!(!Phase::GameOver.can_transition_to(next));
            assert!(!next.can_transition_to(Phase::Setup));
        }
    }

    #[test]
    fn round_cycle_is_permitted() {
        let cycle = [
            Phase::Setup,
            Phase::NightAction,
            Phase::NightResolution,
            Phase::VictoryCheck,
            Phase::DayAnnouncement,
            Phase::Discussion,
            Phase::Voting,
            Phase::Elimination,
            Phase::VictoryCheck,
            Phase::NightAction,
        ];
        for pair in cycle.windows(2) {
            if let [from, to] = pair {
                assert!(from.can_transition_to(*to), "{from:?} -> {to:?}");
            }
        }
        assert!(!Phase::Voting.can_transition_to(Phase::NightAction));
    }

    #[test]
    fn verdict_factions() {
        assert_eq!(Verdict::VillagersWin.winning_faction(), Some(Faction::Villagers));
        assert_eq!(Verdict::WerewolvesWin.winning_faction(), Some(Faction::Werewolves));
        assert_eq!(Verdict::Draw.winning_faction(), None);
        assert!(!Verdict::Ongoing.is_terminal());
        assert!(Verdict::Draw.is_terminal());
    }
}
