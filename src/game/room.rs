//! Room State Machine
//!
//! One room pairs exactly two participants for one complete match and
//! serializes their submissions into well-formed balls, pairing each pick
//! exactly once. The room returns outcome data for the gateway to deliver;
//! nothing in here touches a socket or a channel.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::rules::{
    is_legal_pick, resolve_turn, BOWLER_TIMEOUT_PICK, TIMEOUT_SENTINEL,
};
use crate::game::scoreboard::{
    Innings, InningsTransition, MatchWinner, Role, RoleAssignment, Scoreboard,
};

/// Opaque participant identity, assigned by the gateway at connection time.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    /// Mint a fresh identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Unique room identity, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Mint a fresh identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Room lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomPhase {
    /// One participant, waiting for a second.
    AwaitingOpponent,
    /// Both participants present, match running.
    Playing,
    /// Terminal; the registry removes the room on sight.
    Closed,
}

/// A pick held in a pending slot until the opposite side submits.
#[derive(Clone, Copy, Debug)]
struct PendingPick {
    pick: u8,
    timed_out: bool,
}

/// What a submission did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored; waiting on the opposite side.
    Pending,
    /// Ignored (see [`SubmitRejection`]); the room is unchanged.
    Rejected(SubmitRejection),
    /// Both picks were present; exactly one ball resolved.
    Resolved(TurnResolution),
}

/// Why a submission was ignored. Never surfaced to the submitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Room has no match running (waiting, or already terminal).
    NotPlaying,
    /// Submitter is not a member of this room.
    NotAMember,
    /// Pick outside the legal set.
    MalformedPick,
}

/// Outcome of a resolved ball, ready for the gateway to broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnResolution {
    /// Innings continues.
    TurnResult {
        /// Running score after this ball.
        score: u32,
        /// Balls bowled after this ball.
        balls: u8,
        /// Whether the batsman was dismissed.
        is_out: bool,
        /// The batsman's pick (timeout sentinel 0 included).
        batsman_pick: u8,
        /// The bowler's pick (forced 4 on timeout included).
        bowler_pick: u8,
        /// Innings in progress.
        innings: Innings,
    },
    /// Innings 1 ended; roles have flipped.
    InningsComplete {
        /// The total the second innings must now beat.
        first_innings_score: u32,
        /// Every participant's role for innings 2.
        new_roles: BTreeMap<ParticipantId, Role>,
    },
    /// The match is decided; the room is now terminal.
    GameOver {
        /// Winning side, or a tie.
        winner: MatchWinner,
        /// Innings 1 total.
        first_innings_score: u32,
        /// Innings 2 total.
        second_innings_score: u32,
        /// The winner's identity; `None` on a tie.
        winning_participant: Option<ParticipantId>,
    },
}

/// A two-participant match room.
pub struct Room {
    /// Unique room identity.
    pub id: RoomId,
    phase: RoomPhase,
    participants: Vec<ParticipantId>,
    roles: BTreeMap<ParticipantId, RoleAssignment>,
    scoreboard: Scoreboard,
    pending_batsman: Option<PendingPick>,
    pending_bowler: Option<PendingPick>,
}

impl Room {
    /// Open a new room holding only its first participant.
    pub fn open(id: RoomId, first: ParticipantId) -> Self {
        Self {
            id,
            phase: RoomPhase::AwaitingOpponent,
            participants: vec![first],
            roles: BTreeMap::new(),
            scoreboard: Scoreboard::new(),
            pending_batsman: None,
            pending_bowler: None,
        }
    }

    /// Whether the room can accept a second participant.
    pub fn is_open(&self) -> bool {
        self.phase == RoomPhase::AwaitingOpponent && self.participants.len() == 1
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Whether this participant belongs to the room.
    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }

    /// Both members, in join order.
    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    /// The other member of the room, if there is one.
    pub fn peer_of(&self, participant: &ParticipantId) -> Option<ParticipantId> {
        self.participants
            .iter()
            .find(|p| *p != participant)
            .copied()
    }

    /// A participant's current role.
    pub fn current_role_of(&self, participant: &ParticipantId) -> Option<Role> {
        self.roles.get(participant).map(|r| r.current)
    }

    /// Join the second participant and deal out first-innings roles.
    ///
    /// `first_joiner_bats` is the matchmaker's coin flip. Returns each
    /// participant's assignment, or `None` if the room cannot accept a join.
    pub fn join(
        &mut self,
        second: ParticipantId,
        first_joiner_bats: bool,
    ) -> Option<[(ParticipantId, RoleAssignment); 2]> {
        if !self.is_open() || self.contains(&second) {
            return None;
        }

        let first = self.participants[0];
        self.participants.push(second);

        let (first_role, second_role) = if first_joiner_bats {
            (Role::Batsman, Role::Bowler)
        } else {
            (Role::Bowler, Role::Batsman)
        };

        let assignments = [
            (first, RoleAssignment::new(first_role)),
            (second, RoleAssignment::new(second_role)),
        ];
        for (id, assignment) in assignments {
            self.roles.insert(id, assignment);
        }
        self.phase = RoomPhase::Playing;

        Some(assignments)
    }

    /// Mark the room terminal (game over or a participant left).
    pub fn close(&mut self) {
        self.phase = RoomPhase::Closed;
    }

    /// Submit one side's pick for the current ball.
    ///
    /// A resubmission before the opposite side has answered overwrites the
    /// previous pending value. Once both slots are filled the ball resolves
    /// exactly once and both slots are cleared unconditionally, so a stale
    /// pick can never leak into the next ball.
    pub fn submit_selection(
        &mut self,
        participant: ParticipantId,
        pick: u8,
        timed_out: bool,
    ) -> SubmitOutcome {
        if self.phase != RoomPhase::Playing {
            return SubmitOutcome::Rejected(SubmitRejection::NotPlaying);
        }

        let role = match self.current_role_of(&participant) {
            Some(role) => role,
            None => return SubmitOutcome::Rejected(SubmitRejection::NotAMember),
        };

        let pending = match role {
            Role::Batsman => {
                // The sentinel 0 is the documented batsman timeout signal,
                // with or without the explicit flag.
                let timed_out = timed_out || pick == TIMEOUT_SENTINEL;
                if timed_out {
                    PendingPick {
                        pick: TIMEOUT_SENTINEL,
                        timed_out: true,
                    }
                } else if is_legal_pick(pick) {
                    PendingPick {
                        pick,
                        timed_out: false,
                    }
                } else {
                    return SubmitOutcome::Rejected(SubmitRejection::MalformedPick);
                }
            }
            Role::Bowler => {
                if timed_out {
                    PendingPick {
                        pick: BOWLER_TIMEOUT_PICK,
                        timed_out: true,
                    }
                } else if is_legal_pick(pick) {
                    PendingPick {
                        pick,
                        timed_out: false,
                    }
                } else {
                    return SubmitOutcome::Rejected(SubmitRejection::MalformedPick);
                }
            }
        };

        match role {
            Role::Batsman => self.pending_batsman = Some(pending),
            Role::Bowler => self.pending_bowler = Some(pending),
        }

        let (batsman, bowler) = match (self.pending_batsman, self.pending_bowler) {
            (Some(b), Some(w)) => (b, w),
            _ => return SubmitOutcome::Pending,
        };

        // Read-and-clear before resolving: the pair is consumed atomically.
        self.pending_batsman = None;
        self.pending_bowler = None;

        let outcome = resolve_turn(
            batsman.pick,
            bowler.pick,
            batsman.timed_out,
            bowler.timed_out,
        );

        let resolution = match self.scoreboard.apply_turn(outcome) {
            InningsTransition::Continue { score, balls } => TurnResolution::TurnResult {
                score,
                balls,
                is_out: outcome.is_out,
                batsman_pick: batsman.pick,
                bowler_pick: bowler.pick,
                innings: self.scoreboard.innings,
            },
            InningsTransition::FirstInningsComplete {
                first_innings_score,
            } => {
                for assignment in self.roles.values_mut() {
                    assignment.flip_current();
                }
                TurnResolution::InningsComplete {
                    first_innings_score,
                    new_roles: self
                        .roles
                        .iter()
                        .map(|(id, assignment)| (*id, assignment.current))
                        .collect(),
                }
            }
            InningsTransition::GameOver {
                winner,
                first_innings_score,
                second_innings_score,
            } => {
                self.phase = RoomPhase::Closed;
                TurnResolution::GameOver {
                    winner,
                    first_innings_score,
                    second_innings_score,
                    winning_participant: self.winning_participant(winner),
                }
            }
        };

        SubmitOutcome::Resolved(resolution)
    }

    /// The participant whose first-innings role matches the side that batted
    /// in the winning innings.
    fn winning_participant(&self, winner: MatchWinner) -> Option<ParticipantId> {
        let batted_first_innings = match winner {
            MatchWinner::First => Role::Batsman,
            MatchWinner::Second => Role::Bowler,
            MatchWinner::Tie => return None,
        };
        self.roles
            .iter()
            .find(|(_, assignment)| assignment.first_innings == batted_first_innings)
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_room() -> (Room, ParticipantId, ParticipantId) {
        let batsman = ParticipantId::generate();
        let bowler = ParticipantId::generate();
        let mut room = Room::open(RoomId::generate(), batsman);
        room.join(bowler, true).unwrap();
        (room, batsman, bowler)
    }

    #[test]
    fn join_deals_opposite_roles() {
        let (room, batsman, bowler) = playing_room();
        assert_eq!(room.current_role_of(&batsman), Some(Role::Batsman));
        assert_eq!(room.current_role_of(&bowler), Some(Role::Bowler));
        assert_eq!(room.phase(), RoomPhase::Playing);
        assert_eq!(room.peer_of(&batsman), Some(bowler));
    }

    #[test]
    fn join_rejected_when_not_open() {
        let (mut room, _, _) = playing_room();
        assert!(room.join(ParticipantId::generate(), true).is_none());
    }

    #[test]
    fn lone_pick_is_pending() {
        let (mut room, batsman, _) = playing_room();
        assert_eq!(
            room.submit_selection(batsman, 4, false),
            SubmitOutcome::Pending
        );
    }

    #[test]
    fn resubmission_overwrites_instead_of_queueing() {
        let (mut room, batsman, bowler) = playing_room();
        room.submit_selection(batsman, 4, false);
        room.submit_selection(batsman, 6, false);

        let outcome = room.submit_selection(bowler, 2, false);
        match outcome {
            SubmitOutcome::Resolved(TurnResolution::TurnResult {
                score,
                balls,
                batsman_pick,
                ..
            }) => {
                assert_eq!(batsman_pick, 6);
                assert_eq!(score, 6);
                assert_eq!(balls, 1);
            }
            other => panic!("expected resolved turn, got {other:?}"),
        }
    }

    #[test]
    fn exactly_one_turn_per_pair() {
        let (mut room, batsman, bowler) = playing_room();
        room.submit_selection(batsman, 4, false);
        room.submit_selection(bowler, 2, false);

        // Pending slots were cleared; a lone follow-up pick must wait again.
        assert_eq!(
            room.submit_selection(bowler, 3, false),
            SubmitOutcome::Pending
        );
    }

    #[test]
    fn malformed_pick_is_rejected() {
        let (mut room, batsman, bowler) = playing_room();
        assert_eq!(
            room.submit_selection(batsman, 5, false),
            SubmitOutcome::Rejected(SubmitRejection::MalformedPick)
        );
        // Bowler has no timeout sentinel; a bare 0 is malformed.
        assert_eq!(
            room.submit_selection(bowler, 0, false),
            SubmitOutcome::Rejected(SubmitRejection::MalformedPick)
        );
    }

    #[test]
    fn outsider_is_rejected() {
        let (mut room, _, _) = playing_room();
        assert_eq!(
            room.submit_selection(ParticipantId::generate(), 4, false),
            SubmitOutcome::Rejected(SubmitRejection::NotAMember)
        );
    }

    #[test]
    fn closed_room_ignores_submissions() {
        let (mut room, batsman, _) = playing_room();
        room.close();
        assert_eq!(
            room.submit_selection(batsman, 4, false),
            SubmitOutcome::Rejected(SubmitRejection::NotPlaying)
        );
    }

    #[test]
    fn batsman_sentinel_zero_is_a_timeout() {
        let (mut room, batsman, bowler) = playing_room();
        room.submit_selection(batsman, 0, false);
        let outcome = room.submit_selection(bowler, 2, false);

        match outcome {
            SubmitOutcome::Resolved(TurnResolution::InningsComplete {
                first_innings_score,
                ..
            }) => assert_eq!(first_innings_score, 0),
            other => panic!("expected innings end on dismissal, got {other:?}"),
        }
    }

    #[test]
    fn bowler_timeout_flag_forces_reward_pick() {
        let (mut room, batsman, bowler) = playing_room();
        room.submit_selection(batsman, 4, false);
        // Submitted value is irrelevant once the timeout flag is set.
        let outcome = room.submit_selection(bowler, 1, true);

        match outcome {
            SubmitOutcome::Resolved(TurnResolution::TurnResult {
                score,
                is_out,
                bowler_pick,
                ..
            }) => {
                assert_eq!(bowler_pick, BOWLER_TIMEOUT_PICK);
                assert_eq!(score, 4);
                assert!(!is_out);
            }
            other => panic!("expected resolved turn, got {other:?}"),
        }
    }

    #[test]
    fn dismissal_flips_roles_for_second_innings() {
        let (mut room, batsman, bowler) = playing_room();
        room.submit_selection(batsman, 4, false);
        let outcome = room.submit_selection(bowler, 4, false);

        match outcome {
            SubmitOutcome::Resolved(TurnResolution::InningsComplete { new_roles, .. }) => {
                assert_eq!(new_roles[&batsman], Role::Bowler);
                assert_eq!(new_roles[&bowler], Role::Batsman);
            }
            other => panic!("expected innings switch, got {other:?}"),
        }

        assert_eq!(room.current_role_of(&batsman), Some(Role::Bowler));
        assert_eq!(room.current_role_of(&bowler), Some(Role::Batsman));
    }

    #[test]
    fn chase_win_closes_room_and_names_second_innings_batsman() {
        let (mut room, p1, p2) = playing_room();

        // Innings 1: p1 bats a single 4, then is dismissed.
        room.submit_selection(p1, 4, false);
        room.submit_selection(p2, 2, false);
        room.submit_selection(p1, 3, false);
        room.submit_selection(p2, 3, false);

        // Innings 2: p2 bats and clears the target of 4.
        room.submit_selection(p2, 6, false);
        let outcome = room.submit_selection(p1, 2, false);

        match outcome {
            SubmitOutcome::Resolved(TurnResolution::GameOver {
                winner,
                first_innings_score,
                second_innings_score,
                winning_participant,
            }) => {
                assert_eq!(winner, MatchWinner::Second);
                assert_eq!(first_innings_score, 4);
                assert_eq!(second_innings_score, 6);
                assert_eq!(winning_participant, Some(p2));
            }
            other => panic!("expected game over, got {other:?}"),
        }

        assert_eq!(room.phase(), RoomPhase::Closed);
    }

    #[test]
    fn tie_has_no_winning_participant() {
        let (mut room, p1, p2) = playing_room();

        // Innings 1: 4, then out. Target to beat: 4.
        room.submit_selection(p1, 4, false);
        room.submit_selection(p2, 2, false);
        room.submit_selection(p1, 3, false);
        room.submit_selection(p2, 3, false);

        // Innings 2: p2 scores exactly 4, then is dismissed.
        room.submit_selection(p2, 4, false);
        room.submit_selection(p1, 1, false);
        room.submit_selection(p2, 2, false);
        let outcome = room.submit_selection(p1, 2, false);

        match outcome {
            SubmitOutcome::Resolved(TurnResolution::GameOver {
                winner,
                winning_participant,
                ..
            }) => {
                assert_eq!(winner, MatchWinner::Tie);
                assert_eq!(winning_participant, None);
            }
            other => panic!("expected game over, got {other:?}"),
        }
    }
}
