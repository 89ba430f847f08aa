//! Activity records and the productivity score formula.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_DURATION_MINUTES, EDIT_DURATION_MAX, EDIT_DURATION_MIN, FOCUS_MULTIPLIER,
    SCORE_DURATION_CAP_HOURS, WEIGHT_CAREER, WEIGHT_CHORES, WEIGHT_HEALTH, WEIGHT_LEISURE,
    WEIGHT_SOCIAL,
};
use crate::numbers::{minutes_to_hours, round_to};
use crate::time::local_date;

/// Life area an activity was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Career,
    Health,
    Leisure,
    Chores,
    Social,
    /// Any label the categorizer produced that this engine does not recognise.
    #[serde(other)]
    Unknown,
}

impl Category {
    pub const ALL: &'static [Self] = &[
        Self::Career,
        Self::Health,
        Self::Leisure,
        Self::Chores,
        Self::Social,
    ];

    /// Base productivity weight per hour.
    #[must_use]
    pub const fn base_weight(self) -> f64 {
        match self {
            Self::Career => WEIGHT_CAREER,
            Self::Health => WEIGHT_HEALTH,
            Self::Social => WEIGHT_SOCIAL,
            Self::Chores => WEIGHT_CHORES,
            Self::Leisure => WEIGHT_LEISURE,
            Self::Unknown => 0.0,
        }
    }

    /// Whether a focus session in this category earns the focus multiplier.
    #[must_use]
    pub const fn rewards_focus(self) -> bool {
        matches!(self, Self::Career | Self::Health)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Career => "Career",
            Self::Health => "Health",
            Self::Leisure => "Leisure",
            Self::Chores => "Chores",
            Self::Social => "Social",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(Self::ALL
            .iter()
            .copied()
            .find(|category| category.label().eq_ignore_ascii_case(trimmed))
            .unwrap_or(Self::Unknown))
    }
}

/// Minutes credited for an activity, substituting the default when absent.
#[must_use]
pub fn effective_minutes(duration_minutes: Option<u32>) -> u32 {
    duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
}

/// Weighted productivity score for one activity, rounded to 2 decimals.
#[must_use]
pub fn productivity_score(category: Category, duration_minutes: Option<u32>, focus: bool) -> f64 {
    let hours = minutes_to_hours(u64::from(effective_minutes(duration_minutes)));
    let mut score = category.base_weight() * hours.min(SCORE_DURATION_CAP_HOURS);
    if focus && category.rewards_focus() {
        score *= FOCUS_MULTIPLIER;
    }
    round_to(score, 2)
}

/// A logged, scored activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: u64,
    #[serde(default)]
    pub owner_id: u64,
    /// Activity name extracted by the categorizer, used for goal keyword matching.
    #[serde(default)]
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub productivity_score: f64,
    #[serde(default, alias = "is_focus_session")]
    pub focus: bool,
    pub timestamp: DateTime<Utc>,
}

impl ActivityRecord {
    /// Build a record and derive its productivity score.
    #[must_use]
    pub fn scored(
        id: u64,
        owner_id: u64,
        name: impl Into<String>,
        category: Category,
        duration_minutes: Option<u32>,
        focus: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            name: name.into(),
            category,
            duration_minutes,
            productivity_score: productivity_score(category, duration_minutes, focus),
            focus,
            timestamp,
        }
    }

    /// Recompute the stored score from category, duration and focus flag.
    pub fn rescore(&mut self) {
        self.productivity_score =
            productivity_score(self.category, self.duration_minutes, self.focus);
    }

    #[must_use]
    pub fn minutes(&self) -> u32 {
        effective_minutes(self.duration_minutes)
    }

    #[must_use]
    pub fn hours(&self) -> f64 {
        minutes_to_hours(u64::from(self.minutes()))
    }

    #[must_use]
    pub fn utc_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Calendar date of this activity in the caller's timezone.
    #[must_use]
    pub fn local_date(&self, tz_offset_minutes: i32) -> NaiveDate {
        local_date(self.timestamp, tz_offset_minutes)
    }

    #[must_use]
    pub fn is_productive(&self) -> bool {
        self.productivity_score > 0.0
    }
}

/// User edit to an existing activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl ActivityEdit {
    /// Apply the edit, rescoring only when category or duration changed.
    /// Returns true when the score was recomputed.
    pub fn apply(&self, record: &mut ActivityRecord) -> bool {
        let mut needs_rescore = false;

        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }

        if let Some(duration) = self
            .duration_minutes
            .map(|minutes| minutes.clamp(EDIT_DURATION_MIN, EDIT_DURATION_MAX))
            && record.duration_minutes != Some(duration)
        {
            record.duration_minutes = Some(duration);
            needs_rescore = true;
        }

        if let Some(category) = self.category
            && category != Category::Unknown
            && category != record.category
        {
            record.category = category;
            needs_rescore = true;
        }

        if needs_rescore {
            record.rescore();
        }
        needs_rescore
    }
}
