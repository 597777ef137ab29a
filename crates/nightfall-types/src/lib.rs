//! Shared type definitions for the Nightfall engine.
//!
//! This crate holds every type that crosses the boundary between the game
//! engine and its collaborators: decision sources read the views and
//! return actions, presentation layers read the event log. Types defined
//! here flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Seat numbers and game identifiers
//! - [`enums`] -- Roles, the role capability table, phases, verdicts
//! - [`actions`] -- Night intents and ballots returned by decision sources
//! - [`events`] -- The typed, append-only game event log
//! - [`view`] -- Read-only snapshots and request payloads for decisions

pub mod actions;
pub mod enums;
pub mod events;
pub mod ids;
pub mod view;

// Re-export all public types at crate root for convenience.
pub use actions::{Ballot, BallotChoice, NightIntent};
pub use enums::{
    Capability, DeathCause, DecisionKind, Faction, NightActionKind, Phase, Potion, Role,
    SpeechKind, Verdict,
};
pub use events::{AnnouncedDeath, DegradeReason, GameEvent, Rejection, SkipReason};
pub use ids::{GameId, ParticipantId};
pub use view::{
    BallotRequest, GameView, HeardSpeech, KnownAlignment, NightContext, NightRequest,
    PackMember, PublicParticipant, SpeechRequest,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the exported contracts.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. The files are written to the `bindings/`
        // directory relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::GameId::export_all();
        let _ = crate::ids::ParticipantId::export_all();

        let _ = crate::enums::Faction::export_all();
        let _ = crate::enums::Role::export_all();
        let _ = crate::enums::Potion::export_all();
        let _ = crate::enums::NightActionKind::export_all();
        let _ = crate::enums::Phase::export_all();
        let _ = crate::enums::DeathCause::export_all();
        let _ = crate::enums::SpeechKind::export_all();
        let _ = crate::enums::DecisionKind::export_all();
        let _ = crate::enums::Verdict::export_all();

        let _ = crate::actions::NightIntent::export_all();
        let _ = crate::actions::BallotChoice::export_all();
        let _ = crate::actions::Ballot::export_all();

        let _ = crate::events::GameEvent::export_all();

        let _ = crate::view::GameView::export_all();
        let _ = crate::view::NightRequest::export_all();
        let _ = crate::view::SpeechRequest::export_all();
        let _ = crate::view::BallotRequest::export_all();
    }
}
