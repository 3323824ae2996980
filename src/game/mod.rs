//! Game Logic Module
//!
//! All match logic. Synchronous and free of I/O; the network layer owns
//! every socket and channel.
//!
//! ## Module Structure
//!
//! - `rules`: pure turn resolution (picks + timeout flags -> outcome)
//! - `scoreboard`: per-room totals and innings/game transitions
//! - `room`: two-participant state machine, exactly-once ball pairing
//! - `matchmaker`: room registry, first-fit pairing, disconnect teardown

pub mod matchmaker;
pub mod room;
pub mod rules;
pub mod scoreboard;

// Re-export key types
pub use matchmaker::{Departure, MatchDecision, Matchmaker, SubmitResult};
pub use room::{ParticipantId, Room, RoomId, RoomPhase, SubmitOutcome, TurnResolution};
pub use rules::{resolve_turn, TurnOutcome};
pub use scoreboard::{Innings, InningsTransition, MatchWinner, Role, Scoreboard};
