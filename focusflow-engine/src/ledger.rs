//! XP and level ledger.
//!
//! XP is a cumulative, non-negative counter. The level is never stored: it is
//! derived from XP on demand so the two cannot drift apart.
use serde::{Deserialize, Serialize};

use crate::constants::{LEVEL_CURVE_DIVISOR, LOG_TARGET_LEDGER, SCORE_PER_XP};
use crate::numbers::{floor_f64_to_i64, i64_to_f64, round_to};

/// XP earned for a scored activity. Non-positive scores earn nothing.
#[must_use]
pub fn xp_gain(score: f64) -> i64 {
    if score <= 0.0 || !score.is_finite() {
        return 0;
    }
    floor_f64_to_i64(score / SCORE_PER_XP).max(1)
}

/// Level reached with the given XP: `floor(sqrt(xp) * 0.2) + 1`.
///
/// Evaluated with an integer square root so that perfect-square thresholds
/// are never lost to floating point error.
#[must_use]
pub fn level_for_xp(xp: i64) -> u32 {
    let Ok(xp) = u64::try_from(xp) else {
        return 1;
    };
    if xp == 0 {
        return 1;
    }
    let steps = xp.isqrt() / LEVEL_CURVE_DIVISOR;
    u32::try_from(steps).map_or(u32::MAX, |steps| steps.saturating_add(1))
}

/// Total XP required to reach `level`: `((level - 1) / 0.2)^2`, exactly.
#[must_use]
pub fn xp_for_level(level: u32) -> i64 {
    if level <= 1 {
        return 0;
    }
    let span = i64::from(level - 1) * i64::try_from(LEVEL_CURVE_DIVISOR).unwrap_or(5);
    span.saturating_mul(span)
}

/// Result of applying an XP delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    pub xp_awarded: i64,
    pub total_xp: i64,
    pub old_level: u32,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// Apply `delta` to `xp`, clamping at zero, and report the level transition.
///
/// No deduplication happens here; callers must apply each event once.
pub fn award(xp: &mut i64, delta: i64) -> XpAward {
    let old_level = level_for_xp(*xp);
    *xp = xp.saturating_add(delta).max(0);
    let new_level = level_for_xp(*xp);
    let leveled_up = new_level > old_level;
    if leveled_up {
        log::info!(target: LOG_TARGET_LEDGER, "level up {old_level} -> {new_level} at {xp} xp");
    }
    XpAward {
        xp_awarded: delta,
        total_xp: *xp,
        old_level,
        new_level,
        leveled_up,
    }
}

/// Progress within the current level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp: i64,
    pub xp_in_level: i64,
    pub xp_for_next_level: i64,
    pub progress_percent: f64,
    pub next_level: u32,
}

#[must_use]
pub fn level_progress(xp: i64) -> LevelProgress {
    let xp = xp.max(0);
    let level = level_for_xp(xp);
    let floor = xp_for_level(level);
    let next_level = level.saturating_add(1);
    let span = xp_for_level(next_level) - floor;
    let xp_in_level = xp - floor;
    let progress = if span > 0 {
        i64_to_f64(xp_in_level) / i64_to_f64(span) * 100.0
    } else {
        100.0
    };
    LevelProgress {
        level,
        xp,
        xp_in_level,
        xp_for_next_level: span,
        progress_percent: round_to(progress, 1),
        next_level,
    }
}
