//! Seating and role assignment.
//!
//! Roles are expanded from the configured counts and shuffled with a
//! [`StdRng`] seeded from `game.seed`, so the same configuration always
//! seats the same table. Seats are numbered from 1.

use std::collections::{BTreeMap, BTreeSet};

use nightfall_types::Role;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::config::{ConfigError, GameConfig};
use crate::state::Participant;

/// Display names handed out at setup.
const NAME_POOL: &[&str] = &[
    "Alder", "Briar", "Corvin", "Dell", "Elsbeth", "Fenn", "Garrick", "Hollis", "Isolde", "Jory",
    "Kestrel", "Linnea", "Marek", "Nell", "Osric", "Perrin", "Quenby", "Rowan", "Sabine", "Tamsin",
];

/// Build the participant list for a game.
///
/// # Errors
///
/// Returns [`ConfigError::PlayerCountOutOfRange`] if the table is larger
/// than the name pool.
pub fn assign_roles(config: &GameConfig) -> Result<Vec<Participant>, ConfigError> {
    let total = config.game.total_players;
    let seats = usize::try_from(total).unwrap_or(usize::MAX);
    if seats > NAME_POOL.len() {
        return Err(ConfigError::PlayerCountOutOfRange { total });
    }

    let mut rng = StdRng::seed_from_u64(config.game.seed);

    let mut roles: Vec<Role> = Role::ALL
        .iter()
        .flat_map(|&role| {
            let count = usize::try_from(config.roles.count(role)).unwrap_or(0);
            std::iter::repeat_n(role, count)
        })
        .collect();
    roles.shuffle(&mut rng);

    let mut names: Vec<&str> = NAME_POOL.to_vec();
    names.shuffle(&mut rng);

    let participants: Vec<Participant> = (1_u32..)
        .zip(roles.into_iter().zip(names))
        .map(|(seat, (role, name))| Participant::new(seat, name, role))
        .collect();

    for p in &participants {
        debug!(participant_id = %p.id, name = %p.name, role = %p.role, "seat assigned");
    }
    Ok(participants)
}

/// Check a caller-supplied participant list against the configuration.
///
/// # Errors
///
/// Returns [`ConfigError::DuplicateParticipant`] if a seat repeats, or
/// [`ConfigError::ParticipantMismatch`] if a role count differs from the
/// configuration.
pub fn check_participants(
    config: &GameConfig,
    participants: &[Participant],
) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    let mut supplied: BTreeMap<Role, u32> = BTreeMap::new();
    for p in participants {
        if !seen.insert(p.id) {
            return Err(ConfigError::DuplicateParticipant { seat: p.id.seat() });
        }
        let count = supplied.entry(p.role).or_insert(0);
        *count = count.saturating_add(1);
    }

    for role in Role::ALL {
        let configured = config.roles.count(role);
        let supplied = supplied.get(&role).copied().unwrap_or(0);
        if configured != supplied {
            return Err(ConfigError::ParticipantMismatch {
                role,
                configured,
                supplied,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn assignment_matches_role_counts() {
        let config = GameConfig::default();
        let participants = assign_roles(&config).unwrap();
        assert_eq!(participants.len(), 7);
        assert!(check_participants(&config, &participants).is_ok());

        let seats: Vec<u32> = participants.iter().map(|p| p.id.seat()).collect();
        assert_eq!(seats, (1..=7).collect::<Vec<_>>());
        let names: BTreeSet<&str> = participants.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn same_seed_same_table() {
        let config = GameConfig::default();
        assert_eq!(assign_roles(&config).unwrap(), assign_roles(&config).unwrap());
    }

    #[test]
    fn different_seeds_shuffle_differently() {
        let mut config = GameConfig::default();
        let tables: BTreeSet<Vec<Role>> = (0..16)
            .map(|seed| {
                config.game.seed = seed;
                assign_roles(&config).unwrap().iter().map(|p| p.role).collect()
            })
            .collect();
        assert!(tables.len() > 1);
    }

    #[test]
    fn mismatched_participants_are_rejected() {
        let config = GameConfig::default();
        let mut participants = assign_roles(&config).unwrap();
        participants.pop();
        assert!(matches!(
            check_participants(&config, &participants),
            Err(ConfigError::ParticipantMismatch { .. })
        ));

        let mut participants = assign_roles(&config).unwrap();
        let first = participants.first().unwrap().id;
        if let Some(last) = participants.last_mut() {
            last.id = first;
        }
        assert!(matches!(
            check_participants(&config, &participants),
            Err(ConfigError::DuplicateParticipant { seat: 1 })
        ));
    }
}
