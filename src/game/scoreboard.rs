//! Scoreboard and Innings Progression
//!
//! Mutable per-room match state: the role assignment and the running
//! totals. Applies one resolved ball and decides whether the innings or
//! the whole match ends.

use serde::{Deserialize, Serialize};

use crate::game::rules::TurnOutcome;
use crate::BALLS_PER_INNINGS;

/// The two sides of a ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Scores runs by picking a number.
    Batsman,
    /// Dismisses by matching the batsman's number.
    Bowler,
}

impl Role {
    /// The opposite role.
    #[inline]
    pub fn flipped(self) -> Role {
        match self {
            Role::Batsman => Role::Bowler,
            Role::Bowler => Role::Batsman,
        }
    }
}

/// A participant's role pair: where they started, and where they are now.
///
/// `first_innings` is fixed at room formation and decides the final winner;
/// `current` flips at the innings switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Role held during innings 1. Never changes.
    pub first_innings: Role,
    /// Role held right now.
    pub current: Role,
}

impl RoleAssignment {
    /// Assignment at room formation: both fields start equal.
    pub fn new(role: Role) -> Self {
        Self {
            first_innings: role,
            current: role,
        }
    }

    /// Flip the current role for the second innings.
    pub fn flip_current(&mut self) {
        self.current = self.current.flipped();
    }
}

/// Which innings is being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Innings {
    /// Innings 1: sets the target.
    First,
    /// Innings 2: the chase.
    Second,
}

impl Innings {
    /// Wire representation (1 or 2).
    pub fn number(self) -> u8 {
        match self {
            Innings::First => 1,
            Innings::Second => 2,
        }
    }
}

/// Which side won the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchWinner {
    /// The side that batted in innings 1.
    First,
    /// The side that batted in innings 2.
    Second,
    /// Both innings ended on the same score.
    Tie,
}

/// Macro-state decision after applying one ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InningsTransition {
    /// Innings not yet complete; totals updated.
    Continue {
        /// Running score after this ball.
        score: u32,
        /// Balls bowled after this ball.
        balls: u8,
    },
    /// Innings 1 ended (out or over bowled); roles must flip.
    FirstInningsComplete {
        /// Final score of innings 1, now the defended total.
        first_innings_score: u32,
    },
    /// The match is decided.
    GameOver {
        /// Winning side, or a tie.
        winner: MatchWinner,
        /// Innings 1 total.
        first_innings_score: u32,
        /// Innings 2 total.
        second_innings_score: u32,
    },
}

/// Per-room running totals.
///
/// Created with the room; score and balls reset (target retained) at the
/// innings switch; discarded with the room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scoreboard {
    /// Innings currently being played.
    pub innings: Innings,
    /// Innings 1 total; 0 until innings 1 ends.
    pub first_innings_score: u32,
    /// Current innings running score.
    pub score: u32,
    /// Balls bowled in the current innings (0..=6).
    pub balls_bowled: u8,
}

impl Scoreboard {
    /// Fresh scoreboard for a newly formed room.
    pub fn new() -> Self {
        Self {
            innings: Innings::First,
            first_innings_score: 0,
            score: 0,
            balls_bowled: 0,
        }
    }

    /// Apply one resolved ball and decide the next macro-state.
    ///
    /// An innings ends on a dismissal or the sixth ball. The second innings
    /// additionally ends the moment the running score STRICTLY exceeds the
    /// first-innings total; merely equalling it plays on (a chase that
    /// finishes level is a tie, as in the real game).
    pub fn apply_turn(&mut self, outcome: TurnOutcome) -> InningsTransition {
        let balls = self.balls_bowled + 1;
        let score = self.score + outcome.runs;
        let over_complete = outcome.is_out || balls >= BALLS_PER_INNINGS;

        match self.innings {
            Innings::First => {
                if over_complete {
                    self.first_innings_score = score;
                    self.innings = Innings::Second;
                    self.score = 0;
                    self.balls_bowled = 0;
                    InningsTransition::FirstInningsComplete {
                        first_innings_score: score,
                    }
                } else {
                    self.score = score;
                    self.balls_bowled = balls;
                    InningsTransition::Continue { score, balls }
                }
            }
            Innings::Second => {
                let target_exceeded = score > self.first_innings_score;
                if over_complete || target_exceeded {
                    self.score = score;
                    self.balls_bowled = balls;
                    let winner = if target_exceeded {
                        MatchWinner::Second
                    } else if score == self.first_innings_score {
                        MatchWinner::Tie
                    } else {
                        MatchWinner::First
                    };
                    InningsTransition::GameOver {
                        winner,
                        first_innings_score: self.first_innings_score,
                        second_innings_score: score,
                    }
                } else {
                    self.score = score;
                    self.balls_bowled = balls;
                    InningsTransition::Continue { score, balls }
                }
            }
        }
    }
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(n: u32) -> TurnOutcome {
        TurnOutcome {
            runs: n,
            is_out: false,
        }
    }

    const OUT: TurnOutcome = TurnOutcome {
        runs: 0,
        is_out: true,
    };

    #[test]
    fn continue_accumulates() {
        let mut board = Scoreboard::new();
        assert_eq!(
            board.apply_turn(runs(4)),
            InningsTransition::Continue { score: 4, balls: 1 }
        );
        assert_eq!(
            board.apply_turn(runs(6)),
            InningsTransition::Continue { score: 10, balls: 2 }
        );
        assert_eq!(board.innings, Innings::First);
    }

    #[test]
    fn out_ends_first_innings_and_resets() {
        let mut board = Scoreboard::new();
        board.apply_turn(runs(3));
        let transition = board.apply_turn(OUT);

        assert_eq!(
            transition,
            InningsTransition::FirstInningsComplete {
                first_innings_score: 3
            }
        );
        assert_eq!(board.innings, Innings::Second);
        assert_eq!(board.first_innings_score, 3);
        assert_eq!(board.score, 0);
        assert_eq!(board.balls_bowled, 0);
    }

    #[test]
    fn sixth_ball_ends_first_innings() {
        let mut board = Scoreboard::new();
        for _ in 0..5 {
            board.apply_turn(runs(2));
        }
        assert_eq!(board.balls_bowled, 5);

        let transition = board.apply_turn(runs(2));
        assert_eq!(
            transition,
            InningsTransition::FirstInningsComplete {
                first_innings_score: 12
            }
        );
    }

    #[test]
    fn chase_ends_immediately_on_strict_excess() {
        let mut board = Scoreboard {
            innings: Innings::Second,
            first_innings_score: 30,
            score: 28,
            balls_bowled: 3,
        };

        let transition = board.apply_turn(runs(4));
        assert_eq!(
            transition,
            InningsTransition::GameOver {
                winner: MatchWinner::Second,
                first_innings_score: 30,
                second_innings_score: 32,
            }
        );
    }

    #[test]
    fn equalling_the_target_plays_on() {
        let mut board = Scoreboard {
            innings: Innings::Second,
            first_innings_score: 30,
            score: 26,
            balls_bowled: 2,
        };

        // Exactly level: not over by the target rule.
        assert_eq!(
            board.apply_turn(runs(4)),
            InningsTransition::Continue { score: 30, balls: 3 }
        );
    }

    #[test]
    fn level_score_at_completion_is_a_tie() {
        let mut board = Scoreboard {
            innings: Innings::Second,
            first_innings_score: 30,
            score: 26,
            balls_bowled: 5,
        };

        let transition = board.apply_turn(runs(4));
        assert_eq!(
            transition,
            InningsTransition::GameOver {
                winner: MatchWinner::Tie,
                first_innings_score: 30,
                second_innings_score: 30,
            }
        );
    }

    #[test]
    fn falling_short_loses_the_chase() {
        let mut board = Scoreboard {
            innings: Innings::Second,
            first_innings_score: 30,
            score: 10,
            balls_bowled: 4,
        };

        let transition = board.apply_turn(OUT);
        assert_eq!(
            transition,
            InningsTransition::GameOver {
                winner: MatchWinner::First,
                first_innings_score: 30,
                second_innings_score: 10,
            }
        );
    }

    #[test]
    fn role_assignment_flips_current_only() {
        let mut assignment = RoleAssignment::new(Role::Batsman);
        assignment.flip_current();
        assert_eq!(assignment.first_innings, Role::Batsman);
        assert_eq!(assignment.current, Role::Bowler);
    }
}
