//! Points awarded for an answer.

/// Points for any correct answer.
pub const BASE_POINTS: u32 = 100;
/// Largest speed bonus, earned by an instant answer.
pub const MAX_TIME_BONUS: u32 = 100;
/// Milliseconds per bonus point lost.
pub const BONUS_DECAY_MS: i64 = 150;

/// Points for one answer. Wrong answers score nothing. Correct answers earn
/// the base plus a bonus that shrinks by one point every 150 ms.
#[must_use]
pub fn points_for(correct: bool, elapsed_ms: i64) -> u32 {
    if !correct {
        return 0;
    }
    let lost = elapsed_ms.max(0) / BONUS_DECAY_MS;
    let bonus = i64::from(MAX_TIME_BONUS).saturating_sub(lost).max(0);
    BASE_POINTS + u32::try_from(bonus).unwrap_or(0)
}
