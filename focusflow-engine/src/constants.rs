//! Centralized balance and tuning constants for FocusFlow progression logic.
//!
//! These values define the deterministic math for scoring, levelling and the
//! loot economy. Keeping them together ensures that balance can only be
//! adjusted via code changes reviewed in version control, rather than through
//! external JSON assets.

// Scoring ------------------------------------------------------------------
pub(crate) const DEFAULT_DURATION_MINUTES: u32 = 30;
pub(crate) const SCORE_DURATION_CAP_HOURS: f64 = 4.0;
pub(crate) const FOCUS_MULTIPLIER: f64 = 1.2;
pub(crate) const WEIGHT_CAREER: f64 = 10.0;
pub(crate) const WEIGHT_HEALTH: f64 = 8.0;
pub(crate) const WEIGHT_SOCIAL: f64 = 5.0;
pub(crate) const WEIGHT_CHORES: f64 = 4.0;
pub(crate) const WEIGHT_LEISURE: f64 = -5.0;
pub(crate) const EDIT_DURATION_MIN: u32 = 1;
pub(crate) const EDIT_DURATION_MAX: u32 = 1_440;

// Experience ---------------------------------------------------------------
/// Productivity points per XP point.
pub(crate) const SCORE_PER_XP: f64 = 10.0;
/// `Level(xp) = floor(sqrt(xp) / LEVEL_CURVE_DIVISOR) + 1`, i.e. `sqrt(xp) * 0.2`.
pub(crate) const LEVEL_CURVE_DIVISOR: u64 = 5;

// Badges -------------------------------------------------------------------
pub(crate) const NIGHT_OWL_START_HOUR: u32 = 22;
pub(crate) const NIGHT_OWL_END_HOUR: u32 = 4;
pub(crate) const EARLY_BIRD_END_HOUR: u32 = 7;
pub(crate) const WEEKEND_WARRIOR_MINUTES: u32 = 300;
pub(crate) const IRON_STREAK_DAYS: u64 = 7;
pub(crate) const CENTURION_ACTIVITIES: usize = 100;
pub(crate) const FOCUSED_MIND_SESSIONS: usize = 10;
pub(crate) const CAREER_CHAMPION_MINUTES: u32 = 3_000;
pub(crate) const HEALTH_HERO_MINUTES: u32 = 1_800;
pub(crate) const SOCIAL_BUTTERFLY_MINUTES: u32 = 1_200;

// Goals --------------------------------------------------------------------
pub(crate) const GOAL_TITLE_DIRECTIVES: &[&str] = &[
    "limit ", "reduce ", "avoid ", "stop ", "less ", "target ", "achieve ",
];
pub(crate) const GOAL_TOKEN_MIN_CHARS: usize = 4;
pub(crate) const LIMIT_FIRST_BREACH_PENALTY: i64 = 50;
pub(crate) const LIMIT_CONTINUED_BREACH_PENALTY: i64 = 10;
pub(crate) const TARGET_COMPLETION_BONUS: i64 = 25;
pub(crate) const LIMIT_ON_TRACK_RATIO: f64 = 0.5;
pub(crate) const LIMIT_SLIGHTLY_BEHIND_RATIO: f64 = 0.8;
pub(crate) const TARGET_SLIGHTLY_BEHIND_RATIO: f64 = 0.7;
pub(crate) const TARGET_EARLY_DAYS: u32 = 4;
pub(crate) const TARGET_NOT_STARTED_PERCENT: f64 = 10.0;
pub(crate) const TARGET_AT_RISK_PERCENT: f64 = 50.0;

// Loot economy -------------------------------------------------------------
pub(crate) const MINUTES_PER_CREDIT: u32 = 120;
pub(crate) const CHEST_COST: i64 = 1;
pub(crate) const REPAIR_COST: i64 = 5;
pub(crate) const RARITY_WEIGHT_COMMON: u32 = 60;
pub(crate) const RARITY_WEIGHT_RARE: u32 = 25;
pub(crate) const RARITY_WEIGHT_LEGENDARY: u32 = 10;
pub(crate) const RARITY_WEIGHT_MYTHIC: u32 = 5;

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_BADGES: &str = "focusflow::badges";
pub(crate) const LOG_TARGET_GOALS: &str = "focusflow::goals";
pub(crate) const LOG_TARGET_LOOT: &str = "focusflow::loot";
pub(crate) const LOG_TARGET_LEDGER: &str = "focusflow::ledger";

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f64 = 1e-9;
