//! Selection Rules
//!
//! Pure turn resolution: a batting pick against a bowling pick, with
//! timeout flags, decides runs scored and dismissal. No state, no I/O.

/// Pick values a participant may legally choose.
pub const LEGAL_PICKS: [u8; 5] = [1, 2, 3, 4, 6];

/// Reserved pick value meaning "batsman timed out".
///
/// The presentation layer submits this on the batsman's behalf when the
/// pick countdown elapses; it is never a legal deliberate choice.
pub const TIMEOUT_SENTINEL: u8 = 0;

/// Pick value forced onto a bowler who timed out. The batsman is credited
/// with exactly this many runs for the ball.
pub const BOWLER_TIMEOUT_PICK: u8 = 4;

/// Whether a pick is in the legal deliberate range.
#[inline]
pub fn is_legal_pick(pick: u8) -> bool {
    LEGAL_PICKS.contains(&pick)
}

/// Result of resolving one ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Runs credited to the batting side for this ball.
    pub runs: u32,
    /// Whether the batsman was dismissed.
    pub is_out: bool,
}

/// Resolve one ball.
///
/// The batsman is out iff they timed out, or (absent a bowler timeout) the
/// two picks match: a matching number means the bowler "catches" the
/// batsman. A bowler timeout rewards the batting side with a fixed
/// [`BOWLER_TIMEOUT_PICK`] runs and can never dismiss.
///
/// Range validation happens at submission, not here.
pub fn resolve_turn(
    batsman_pick: u8,
    bowler_pick: u8,
    batsman_timed_out: bool,
    bowler_timed_out: bool,
) -> TurnOutcome {
    let is_out =
        batsman_timed_out || (!bowler_timed_out && batsman_pick == bowler_pick);

    let runs = if is_out {
        0
    } else if bowler_timed_out {
        BOWLER_TIMEOUT_PICK as u32
    } else {
        batsman_pick as u32
    };

    TurnOutcome { runs, is_out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn legal_pick() -> impl Strategy<Value = u8> {
        prop::sample::select(LEGAL_PICKS.to_vec())
    }

    proptest! {
        #[test]
        fn distinct_picks_score_the_batsman_pick(b in legal_pick(), w in legal_pick()) {
            prop_assume!(b != w);
            let outcome = resolve_turn(b, w, false, false);
            prop_assert!(!outcome.is_out);
            prop_assert_eq!(outcome.runs, b as u32);
        }

        #[test]
        fn equal_picks_dismiss(b in legal_pick()) {
            let outcome = resolve_turn(b, b, false, false);
            prop_assert!(outcome.is_out);
            prop_assert_eq!(outcome.runs, 0);
        }

        #[test]
        fn batsman_timeout_dismisses_against_any_bowler_pick(w in legal_pick()) {
            let outcome = resolve_turn(TIMEOUT_SENTINEL, w, true, false);
            prop_assert!(outcome.is_out);
            prop_assert_eq!(outcome.runs, 0);
        }

        #[test]
        fn bowler_timeout_rewards_four(b in legal_pick()) {
            let outcome = resolve_turn(b, BOWLER_TIMEOUT_PICK, false, true);
            prop_assert!(!outcome.is_out);
            prop_assert_eq!(outcome.runs, 4);
        }
    }

    #[test]
    fn bowler_timeout_beats_matching_picks() {
        // A timed-out bowler cannot dismiss, even when the forced pick of 4
        // happens to match the batsman's genuine 4.
        let outcome = resolve_turn(4, BOWLER_TIMEOUT_PICK, false, true);
        assert!(!outcome.is_out);
        assert_eq!(outcome.runs, 4);
    }

    #[test]
    fn both_timeouts_dismiss() {
        let outcome = resolve_turn(TIMEOUT_SENTINEL, BOWLER_TIMEOUT_PICK, true, true);
        assert!(outcome.is_out);
        assert_eq!(outcome.runs, 0);
    }

    #[test]
    fn legal_pick_range() {
        for pick in [1, 2, 3, 4, 6] {
            assert!(is_legal_pick(pick));
        }
        for pick in [0, 5, 7, 255] {
            assert!(!is_legal_pick(pick));
        }
    }
}
