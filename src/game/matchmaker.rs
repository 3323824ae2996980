//! Matchmaking Registry
//!
//! Owns every live room and pairs idle participants into them, first-fit:
//! the earliest-opened room with a free seat is joined first. The registry
//! is plain owned state handed to the gateway; it is never a process
//! global. All methods run to completion synchronously; the gateway
//! serializes access, so a room is never observed mid-mutation.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::room::{
    ParticipantId, Room, RoomId, RoomPhase, SubmitOutcome, SubmitRejection, TurnResolution,
};
use crate::game::scoreboard::RoleAssignment;

/// What `find_match` did for the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchDecision {
    /// Opened a fresh room; the caller waits for an opponent.
    Waiting {
        /// The newly opened room.
        room_id: RoomId,
    },
    /// Joined the earliest open room; the match starts immediately.
    Matched {
        /// The joined room.
        room_id: RoomId,
        /// Coin-flipped first-innings roles for both participants.
        assignments: [(ParticipantId, RoleAssignment); 2],
    },
}

/// What a routed submission did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitResult {
    /// Room id absent from the registry (completed or never existed).
    /// Silently ignored: the room may have been legitimately torn down by
    /// the other participant's disconnect.
    UnknownRoom,
    /// Pick stored; waiting on the opposite side.
    Pending,
    /// Ignored per room rules (stale participant, malformed pick, terminal
    /// room).
    Rejected(SubmitRejection),
    /// Exactly one ball resolved; deliver to every recipient. If the ball
    /// ended the match the room is already gone from the registry.
    Resolved {
        /// The resolved outcome.
        resolution: TurnResolution,
        /// Both room members, in join order.
        recipients: Vec<ParticipantId>,
    },
}

/// A room torn down by a disconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Departure {
    /// The destroyed room.
    pub room_id: RoomId,
    /// The abandoned peer to notify, if the room had one.
    pub peer: Option<ParticipantId>,
}

/// Process-wide room registry and pairing policy.
///
/// Rooms are keyed by a monotonically increasing sequence number, so
/// BTreeMap iteration order is creation order and first-fit is simply the
/// first open entry.
pub struct Matchmaker {
    rooms: BTreeMap<u64, Room>,
    room_index: BTreeMap<RoomId, u64>,
    next_seq: u64,
    rng: StdRng,
}

impl Matchmaker {
    /// Registry with an entropy-seeded coin flip.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Registry with a fixed seed, for reproducible tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rooms: BTreeMap::new(),
            room_index: BTreeMap::new(),
            next_seq: 0,
            rng,
        }
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Pair the caller into the earliest open room, or open a new one.
    ///
    /// On pairing, a coin flip decides who bats the first innings.
    pub fn find_match(&mut self, participant: ParticipantId) -> MatchDecision {
        let open_seq = self
            .rooms
            .iter()
            .find(|(_, room)| room.is_open() && !room.contains(&participant))
            .map(|(seq, _)| *seq);

        if let Some(seq) = open_seq {
            let first_joiner_bats = self.rng.gen::<bool>();
            // The seat was checked above; join cannot refuse.
            if let Some(room) = self.rooms.get_mut(&seq) {
                if let Some(assignments) = room.join(participant, first_joiner_bats) {
                    return MatchDecision::Matched {
                        room_id: room.id,
                        assignments,
                    };
                }
            }
        }

        let room_id = RoomId::generate();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.rooms.insert(seq, Room::open(room_id, participant));
        self.room_index.insert(room_id, seq);

        MatchDecision::Waiting { room_id }
    }

    /// Route a submission to its room.
    ///
    /// Destroys the room when the ball decides the match, so the registry
    /// never holds a terminal room.
    pub fn submit_selection(
        &mut self,
        room_id: RoomId,
        participant: ParticipantId,
        pick: u8,
        timed_out: bool,
    ) -> SubmitResult {
        let seq = match self.room_index.get(&room_id) {
            Some(seq) => *seq,
            None => return SubmitResult::UnknownRoom,
        };
        let room = match self.rooms.get_mut(&seq) {
            Some(room) => room,
            None => return SubmitResult::UnknownRoom,
        };

        match room.submit_selection(participant, pick, timed_out) {
            SubmitOutcome::Pending => SubmitResult::Pending,
            SubmitOutcome::Rejected(rejection) => SubmitResult::Rejected(rejection),
            SubmitOutcome::Resolved(resolution) => {
                let recipients = room.participants().to_vec();
                if room.phase() == RoomPhase::Closed {
                    self.destroy(room_id);
                }
                SubmitResult::Resolved {
                    resolution,
                    recipients,
                }
            }
        }
    }

    /// Tear down every room containing the participant.
    ///
    /// No grace period, no reconnection: the room is destroyed immediately
    /// and each abandoned peer is returned for notification. A later
    /// submission naming a destroyed room is a no-op forever after.
    pub fn disconnect(&mut self, participant: ParticipantId) -> Vec<Departure> {
        let affected: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| room.contains(&participant))
            .map(|room| room.id)
            .collect();

        affected
            .into_iter()
            .map(|room_id| {
                let peer = self
                    .room_index
                    .get(&room_id)
                    .and_then(|seq| self.rooms.get(seq))
                    .and_then(|room| room.peer_of(&participant));
                self.destroy(room_id);
                Departure { room_id, peer }
            })
            .collect()
    }

    fn destroy(&mut self, room_id: RoomId) {
        if let Some(seq) = self.room_index.remove(&room_id) {
            self.rooms.remove(&seq);
        }
    }
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new()
    }
}
