//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are serialized as JSON, tagged by a `type` field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::room::{ParticipantId, RoomId};
use crate::game::scoreboard::{MatchWinner, Role};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
///
/// Disconnecting is not a message; it is the socket closing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask to be paired into a room.
    FindMatch,

    /// Submit a pick for the current ball.
    SubmitSelection(SelectionRequest),
}

/// One side's pick for the current ball.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// Room the pick is for.
    pub room_id: RoomId,
    /// Pick value; 0 is reserved for a batsman timeout.
    pub pick: u8,
    /// Set when the presentation layer submitted on the participant's
    /// behalf after the countdown elapsed. Distinguishes a bowler timeout
    /// from a genuine pick of 4.
    #[serde(default)]
    pub timed_out: bool,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Alone in a newly opened room; an opponent will arrive.
    Waiting {
        /// The opened room.
        room_id: RoomId,
    },

    /// Paired; the match starts now.
    GameStart {
        /// The shared room.
        room_id: RoomId,
        /// This participant's first-innings role.
        role: Role,
        /// Always 1 at the start.
        current_innings: u8,
        /// Seconds the client has to pick each ball.
        pick_timeout_secs: u32,
    },

    /// One ball resolved; the innings continues.
    TurnResult {
        /// Running score after this ball.
        score: u32,
        /// Balls bowled after this ball.
        balls: u8,
        /// Whether the batsman was dismissed.
        is_out: bool,
        /// The batsman's pick.
        batsman_pick: u8,
        /// The bowler's pick.
        bowler_pick: u8,
        /// Innings in progress.
        current_innings: u8,
    },

    /// Innings 1 over; roles have flipped.
    InningsComplete {
        /// The total the chase must beat.
        first_innings_score: u32,
        /// Every participant's role for innings 2.
        new_roles: BTreeMap<ParticipantId, Role>,
    },

    /// The match is decided and the room is gone.
    GameOver {
        /// Innings 1 total.
        first_innings_score: u32,
        /// Innings 2 total.
        second_innings_score: u32,
        /// Winning side, or a tie.
        winner: MatchWinner,
        /// The winner's identity; absent on a tie.
        #[serde(skip_serializing_if = "Option::is_none")]
        winning_participant: Option<ParticipantId>,
    },

    /// The opponent's connection dropped; the room is gone.
    PlayerDisconnected,

    /// Live connection count changed.
    PlayersUpdate {
        /// Participants currently connected to this server.
        total: usize,
    },

    /// Transport-level failure (unparseable frame). Game-rule violations
    /// are silently ignored, never errored.
    Error {
        /// Human-readable description.
        message: String,
    },
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
