//! # Hand Cricket Server
//!
//! Real-time matchmaking and round-resolution engine for two-player hand
//! cricket over a persistent bidirectional connection.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   HAND CRICKET SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Match logic (synchronous, no I/O)         │
//! │  ├── rules.rs    - Pure turn resolution                      │
//! │  ├── scoreboard.rs - Innings totals and transitions          │
//! │  ├── room.rs     - Two-participant state machine             │
//! │  └── matchmaker.rs - Room registry and first-fit pairing     │
//! │                                                              │
//! │  network/        - Networking (async)                        │
//! │  ├── protocol.rs - Message types                             │
//! │  └── server.rs   - WebSocket gateway                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! The `game/` modules are plain synchronous state machines. The gateway
//! serializes every externally triggered operation (find-match, pick
//! submission, disconnect) behind a single async mutex, so each one runs to
//! completion before the next is taken. Event delivery to clients happens
//! after the lock is released, over per-connection channels.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::matchmaker::{MatchDecision, Matchmaker, SubmitResult};
pub use game::room::{ParticipantId, Room, RoomId, TurnResolution};
pub use game::rules::{resolve_turn, TurnOutcome};
pub use game::scoreboard::{Innings, MatchWinner, Role, Scoreboard};
pub use network::protocol::{ClientMessage, ServerMessage};
pub use network::server::{Gateway, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Balls per innings (one over).
pub const BALLS_PER_INNINGS: u8 = 6;

/// Seconds a participant has to pick each ball. The countdown runs on the
/// presentation side; the server only advertises it at game start.
pub const PICK_TIMEOUT_SECS: u32 = 5;
