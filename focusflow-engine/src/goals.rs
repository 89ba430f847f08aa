//! User goals: pacing reports and XP adjustments on threshold crossings.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::activity::{ActivityRecord, Category};
use crate::constants::{
    LIMIT_CONTINUED_BREACH_PENALTY, LIMIT_FIRST_BREACH_PENALTY, LIMIT_ON_TRACK_RATIO,
    LIMIT_SLIGHTLY_BEHIND_RATIO, LOG_TARGET_GOALS, TARGET_AT_RISK_PERCENT,
    TARGET_COMPLETION_BONUS, TARGET_EARLY_DAYS, TARGET_NOT_STARTED_PERCENT,
    TARGET_SLIGHTLY_BEHIND_RATIO,
};
use crate::numbers::{minutes_to_hours, round_to};
use crate::state::ProgressionState;

mod matching;
mod window;

pub use matching::{GoalMatcher, goal_keyword};
pub use window::GoalWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    /// Hours to reach.
    #[default]
    Target,
    /// Hours not to exceed.
    Limit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GoalError {
    #[error("goal target must be a positive number of hours, got {0}")]
    NonPositiveTarget(i64),
}

/// A validated user goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GoalRecord")]
pub struct Goal {
    pub id: u64,
    pub owner_id: u64,
    pub title: Option<String>,
    pub category: Option<Category>,
    target_hours: u32,
    pub timeframe: Timeframe,
    pub kind: GoalKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct GoalRecord {
    id: u64,
    #[serde(default)]
    owner_id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    category: Option<Category>,
    target_hours: i64,
    timeframe: Timeframe,
    #[serde(default, alias = "goal_type")]
    kind: GoalKind,
    created_at: DateTime<Utc>,
}

impl TryFrom<GoalRecord> for Goal {
    type Error = GoalError;

    fn try_from(raw: GoalRecord) -> Result<Self, Self::Error> {
        let mut goal = Self::new(
            raw.id,
            raw.kind,
            raw.timeframe,
            raw.target_hours,
            raw.created_at,
        )?;
        goal.owner_id = raw.owner_id;
        goal.title = raw.title;
        goal.category = raw.category;
        Ok(goal)
    }
}

impl Goal {
    /// Create a goal without title or category.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveTarget` unless `target_hours` is at least one.
    pub fn new(
        id: u64,
        kind: GoalKind,
        timeframe: Timeframe,
        target_hours: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GoalError> {
        let target_hours = u32::try_from(target_hours)
            .ok()
            .filter(|hours| *hours > 0)
            .ok_or(GoalError::NonPositiveTarget(target_hours))?;
        Ok(Self {
            id,
            owner_id: 0,
            title: None,
            category: None,
            target_hours,
            timeframe,
            kind,
            created_at,
        })
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = (!title.trim().is_empty()).then(|| title.trim().to_string());
        self
    }

    #[must_use]
    pub const fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub const fn target_hours(&self) -> u32 {
        self.target_hours
    }

    fn target_minutes(&self) -> u64 {
        u64::from(self.target_hours) * 60
    }

    /// Category the goal tracks; uncategorised limits watch Leisure and
    /// uncategorised targets watch Career.
    #[must_use]
    pub fn effective_category(&self) -> Category {
        self.category.unwrap_or(match self.kind {
            GoalKind::Limit => Category::Leisure,
            GoalKind::Target => Category::Career,
        })
    }

    #[must_use]
    pub fn matcher(&self) -> GoalMatcher {
        GoalMatcher::new(self.effective_category(), self.title.as_deref())
    }

    /// Title for reports, generated from the category when absent.
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        let category = self.effective_category();
        match self.kind {
            GoalKind::Limit => format!("Limit {category}"),
            GoalKind::Target => format!("{category} Goal"),
        }
    }

    #[must_use]
    pub fn window(&self, now: DateTime<Utc>, tz_offset_minutes: i32) -> GoalWindow {
        GoalWindow::for_timeframe(self.timeframe, now, tz_offset_minutes)
    }
}

fn matched_minutes<'a>(
    history: impl Iterator<Item = &'a ActivityRecord>,
    matcher: &GoalMatcher,
    window: &GoalWindow,
) -> u64 {
    history
        .filter(|a| window.contains(a.timestamp) && matcher.matches(a))
        .map(|a| u64::from(a.minutes()))
        .sum()
}

/// Hours logged toward a goal inside its current window.
#[must_use]
pub fn hours_logged(
    goal: &Goal,
    history: &[ActivityRecord],
    now: DateTime<Utc>,
    tz_offset_minutes: i32,
) -> f64 {
    let window = goal.window(now, tz_offset_minutes);
    minutes_to_hours(matched_minutes(history.iter(), &goal.matcher(), &window))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStatus {
    Complete,
    OnTrack,
    SlightlyBehind,
    NotStarted,
    AtRisk,
    OverLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_id: u64,
    pub title: String,
    pub hours_logged: f64,
    pub progress_percent: f64,
    pub expected_hours: Option<f64>,
    pub expected_percent: Option<f64>,
    pub budget_remaining: Option<f64>,
    pub status: PacingStatus,
    pub days_passed: u32,
    pub total_days: u32,
}

fn classify_target(hours: f64, target: f64, expected: f64, days_passed: u32) -> PacingStatus {
    let progress = (hours / target * 100.0).min(100.0);
    if progress >= 100.0 {
        PacingStatus::Complete
    } else if hours >= expected {
        PacingStatus::OnTrack
    } else if hours >= expected * TARGET_SLIGHTLY_BEHIND_RATIO {
        PacingStatus::SlightlyBehind
    } else if days_passed < TARGET_EARLY_DAYS && progress < TARGET_NOT_STARTED_PERCENT {
        PacingStatus::NotStarted
    } else if days_passed >= TARGET_EARLY_DAYS && progress < TARGET_AT_RISK_PERCENT {
        PacingStatus::AtRisk
    } else {
        PacingStatus::SlightlyBehind
    }
}

fn classify_limit(hours: f64, target: f64) -> PacingStatus {
    if hours <= target * LIMIT_ON_TRACK_RATIO {
        PacingStatus::OnTrack
    } else if hours <= target * LIMIT_SLIGHTLY_BEHIND_RATIO {
        PacingStatus::SlightlyBehind
    } else if hours <= target {
        PacingStatus::AtRisk
    } else {
        PacingStatus::OverLimit
    }
}

/// Pacing report for a goal at `now`.
#[must_use]
pub fn goal_progress(
    goal: &Goal,
    history: &[ActivityRecord],
    now: DateTime<Utc>,
    tz_offset_minutes: i32,
) -> GoalProgress {
    let window = goal.window(now, tz_offset_minutes);
    let hours = minutes_to_hours(matched_minutes(history.iter(), &goal.matcher(), &window));
    let target = f64::from(goal.target_hours);

    let (progress_percent, expected_hours, expected_percent, budget_remaining, status) =
        match goal.kind {
            GoalKind::Limit => (
                hours / target * 100.0,
                None,
                None,
                Some(round_to((target - hours).max(0.0), 1)),
                classify_limit(hours, target),
            ),
            GoalKind::Target => {
                let expected =
                    target * f64::from(window.days_passed) / f64::from(window.total_days);
                (
                    (hours / target * 100.0).min(100.0),
                    Some(round_to(expected, 1)),
                    Some(round_to((expected / target * 100.0).min(100.0), 1)),
                    None,
                    classify_target(hours, target, expected, window.days_passed),
                )
            }
        };

    GoalProgress {
        goal_id: goal.id,
        title: goal.label(),
        hours_logged: round_to(hours, 1),
        progress_percent: round_to(progress_percent, 1),
        expected_hours,
        expected_percent,
        budget_remaining,
        status,
        days_passed: window.days_passed,
        total_days: window.total_days,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    ExceededLimit,
    ContinuedOverLimit,
    GoalCompleted,
}

impl AdjustmentReason {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::ExceededLimit => "Exceeded limit",
            Self::ContinuedOverLimit => "Continued over limit",
            Self::GoalCompleted => "Goal completed!",
        }
    }
}

/// XP change triggered by one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalAdjustment {
    pub goal_id: u64,
    pub goal_title: String,
    pub points: i64,
    pub reason: AdjustmentReason,
    /// Hours over the limit, one decimal; limit goals only.
    pub hours_over: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalAdjustments {
    pub penalties: SmallVec<[GoalAdjustment; 2]>,
    pub bonuses: SmallVec<[GoalAdjustment; 2]>,
}

impl GoalAdjustments {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.penalties.is_empty() && self.bonuses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GoalAdjustment> {
        self.penalties.iter().chain(self.bonuses.iter())
    }

    /// Apply every adjustment to XP in turn, clamping after each one.
    /// Returns the net XP change actually applied.
    pub fn apply(&self, state: &mut ProgressionState) -> i64 {
        let before = state.xp();
        for adjustment in self.iter() {
            state.apply_xp(adjustment.points);
        }
        state.xp() - before
    }
}

/// Detect limit breaches and target completions after logging `activity`.
///
/// Every goal is checked, and each yields at most one adjustment. A goal the
/// activity does not count toward keeps its total, so a limit that is
/// already exceeded charges the continued-breach penalty again. `history`
/// may or may not already contain `activity`.
#[must_use]
pub fn threshold_adjustments(
    goals: &[Goal],
    activity: &ActivityRecord,
    history: &[ActivityRecord],
    now: DateTime<Utc>,
    tz_offset_minutes: i32,
) -> GoalAdjustments {
    let mut adjustments = GoalAdjustments::default();
    for goal in goals {
        let matcher = goal.matcher();
        let window = goal.window(now, tz_offset_minutes);
        let previous = matched_minutes(
            history.iter().filter(|a| a.id != activity.id),
            &matcher,
            &window,
        );
        let counted = window.contains(activity.timestamp) && matcher.matches(activity);
        let total = if counted {
            previous + u64::from(activity.minutes())
        } else {
            previous
        };
        let limit = goal.target_minutes();

        match goal.kind {
            GoalKind::Limit if total > limit => {
                let (points, reason) = if previous <= limit {
                    (-LIMIT_FIRST_BREACH_PENALTY, AdjustmentReason::ExceededLimit)
                } else {
                    (-LIMIT_CONTINUED_BREACH_PENALTY, AdjustmentReason::ContinuedOverLimit)
                };
                let hours_over = round_to(minutes_to_hours(total - limit), 1);
                log::debug!(
                    target: LOG_TARGET_GOALS,
                    "goal {} over limit by {hours_over}h: {points} xp",
                    goal.id
                );
                adjustments.penalties.push(GoalAdjustment {
                    goal_id: goal.id,
                    goal_title: goal.label(),
                    points,
                    reason,
                    hours_over: Some(hours_over),
                });
            }
            GoalKind::Target if total >= limit && previous < limit => {
                log::debug!(target: LOG_TARGET_GOALS, "goal {} completed", goal.id);
                adjustments.bonuses.push(GoalAdjustment {
                    goal_id: goal.id,
                    goal_title: goal.label(),
                    points: TARGET_COMPLETION_BONUS,
                    reason: AdjustmentReason::GoalCompleted,
                    hours_over: None,
                });
            }
            GoalKind::Limit | GoalKind::Target => {}
        }
    }
    adjustments
}
