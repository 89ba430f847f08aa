//! Per-user progression state and the profile snapshot the reducer works on.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::badges::EarnedBadges;
use crate::constants::{LOG_TARGET_LOOT, MINUTES_PER_CREDIT};
use crate::ledger::{LevelProgress, XpAward, award, level_for_xp, level_progress};
use crate::loot::Collection;

/// Counters persisted per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    #[serde(default)]
    xp: i64,
    #[serde(default)]
    chest_credits: i64,
    #[serde(default)]
    productive_minutes: u32,
    /// Distraction minutes recorded for `distraction_date`.
    #[serde(default)]
    pub today_distraction_minutes: u32,
    #[serde(default)]
    pub distraction_date: Option<NaiveDate>,
    #[serde(default = "ProgressionState::default_allowance")]
    pub daily_distraction_allowance: u32,
    #[serde(default)]
    pub birth_year: Option<i32>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            xp: 0,
            chest_credits: 0,
            productive_minutes: 0,
            today_distraction_minutes: 0,
            distraction_date: None,
            daily_distraction_allowance: Self::default_allowance(),
            birth_year: None,
        }
    }
}

/// Credits earned from one productive activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAccrual {
    pub minutes_added: u32,
    pub credits_earned: i64,
    pub total_credits: i64,
    /// Minutes carried toward the next credit.
    pub productive_minutes: u32,
}

impl ProgressionState {
    const fn default_allowance() -> u32 {
        60
    }

    /// Restore persisted counters, clamping anything out of range.
    #[must_use]
    pub fn from_counters(xp: i64, chest_credits: i64, productive_minutes: u32) -> Self {
        Self {
            xp: xp.max(0),
            chest_credits: chest_credits.max(0),
            productive_minutes: productive_minutes % MINUTES_PER_CREDIT,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn xp(&self) -> i64 {
        self.xp
    }

    /// Level derived from XP.
    #[must_use]
    pub fn level(&self) -> u32 {
        level_for_xp(self.xp)
    }

    #[must_use]
    pub fn level_progress(&self) -> LevelProgress {
        level_progress(self.xp)
    }

    #[must_use]
    pub const fn chest_credits(&self) -> i64 {
        self.chest_credits
    }

    #[must_use]
    pub const fn productive_minutes(&self) -> u32 {
        self.productive_minutes
    }

    /// Apply an XP delta, clamping at zero.
    pub fn apply_xp(&mut self, delta: i64) -> XpAward {
        award(&mut self.xp, delta)
    }

    /// Add (or remove) credits, clamping at zero. Returns the new balance.
    pub fn adjust_credits(&mut self, delta: i64) -> i64 {
        self.chest_credits = self.chest_credits.saturating_add(delta).max(0);
        self.chest_credits
    }

    /// Accumulate productive minutes and convert every full block into a credit.
    pub fn accrue_productive_minutes(&mut self, minutes: u32) -> CreditAccrual {
        let total = u64::from(self.productive_minutes) + u64::from(minutes);
        let block = u64::from(MINUTES_PER_CREDIT);
        let credits_earned = i64::try_from(total / block).unwrap_or(i64::MAX);
        self.productive_minutes = u32::try_from(total % block).unwrap_or(0);
        if credits_earned > 0 {
            self.adjust_credits(credits_earned);
            log::debug!(
                target: LOG_TARGET_LOOT,
                "earned {credits_earned} chest credit(s), balance {}",
                self.chest_credits
            );
        }
        CreditAccrual {
            minutes_added: minutes,
            credits_earned,
            total_credits: self.chest_credits,
            productive_minutes: self.productive_minutes,
        }
    }

    /// Distraction minutes that count for `today`; stale days read as zero.
    #[must_use]
    pub fn distraction_minutes_on(&self, today: NaiveDate) -> u32 {
        if self.distraction_date == Some(today) {
            self.today_distraction_minutes
        } else {
            0
        }
    }

    /// Whether today's distraction minutes exceed the allowance.
    #[must_use]
    pub fn over_distraction_allowance(&self, today: NaiveDate) -> bool {
        self.distraction_minutes_on(today) > self.daily_distraction_allowance
    }
}

/// Everything the ingestion reducer mutates for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub state: ProgressionState,
    #[serde(default)]
    pub badges: EarnedBadges,
    #[serde(default)]
    pub collection: Collection,
}

impl Profile {
    #[must_use]
    pub fn new(state: ProgressionState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }
}
