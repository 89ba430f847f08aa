//! The activity ingestion reducer.
//!
//! `ingest` is a pure function of the previous profile, the new activity and
//! an injected context. Callers persist the returned profile; nothing here
//! reads a clock or touches storage.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::activity::ActivityRecord;
use crate::badges::{BadgeCatalog, BadgeContext, BadgePredicate, BadgeRegistry, BadgeRule, EarnedBadge};
use crate::config::EconomyConfig;
use crate::goals::{Goal, GoalAdjustments, threshold_adjustments};
use crate::ledger::{XpAward, xp_gain};
use crate::loot::{ChestEligibility, DecayReport, chest_eligibility, check_decay};
use crate::state::{CreditAccrual, Profile};
use crate::time::local_date;

/// Everything the reducer needs besides the profile and the activity.
#[derive(Debug, Clone, Copy)]
pub struct IngestContext<'a, P = BadgeRule> {
    pub now: DateTime<Utc>,
    pub tz_offset_minutes: i32,
    pub local_hour: Option<u32>,
    /// Prior history; the new activity is appended when absent.
    pub history: &'a [ActivityRecord],
    pub goals: &'a [Goal],
    pub badge_catalog: &'a BadgeCatalog,
    pub registry: &'a BadgeRegistry<P>,
    pub economy: &'a EconomyConfig,
}

/// Side effects of one ingested activity, for the caller to persist or show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub activity_id: u64,
    pub productivity_score: f64,
    pub xp: XpAward,
    pub new_badges: Vec<EarnedBadge>,
    pub goal_adjustments: GoalAdjustments,
    /// Net XP applied by goal adjustments after clamping.
    pub goal_xp_delta: i64,
    pub credits: Option<CreditAccrual>,
    pub decay: Option<DecayReport>,
    pub chest_eligibility: ChestEligibility,
    pub total_xp: i64,
    pub level: u32,
    pub chest_credits: i64,
}

/// Apply one activity to a profile.
///
/// Order: XP award, badges, goal adjustments, credit accrual (positive
/// scores only), decay check.
#[must_use]
pub fn ingest<P: BadgePredicate>(
    profile: &Profile,
    activity: &ActivityRecord,
    ctx: &IngestContext<'_, P>,
) -> (Profile, IngestOutcome) {
    let mut next = profile.clone();
    let history: Cow<'_, [ActivityRecord]> = if ctx.history.iter().any(|a| a.id == activity.id) {
        Cow::Borrowed(ctx.history)
    } else {
        let mut owned = ctx.history.to_vec();
        owned.push(activity.clone());
        Cow::Owned(owned)
    };

    let xp = next.state.apply_xp(xp_gain(activity.productivity_score));

    let badge_ctx = BadgeContext {
        activity,
        history: &history,
        local_hour: ctx.local_hour,
        now: ctx.now,
    };
    let new_badges = ctx
        .registry
        .evaluate(&mut next.badges, ctx.badge_catalog, &badge_ctx);

    let goal_adjustments =
        threshold_adjustments(ctx.goals, activity, &history, ctx.now, ctx.tz_offset_minutes);
    let goal_xp_delta = goal_adjustments.apply(&mut next.state);

    let credits = activity
        .is_productive()
        .then(|| next.state.accrue_productive_minutes(activity.minutes()));

    let today = local_date(ctx.now, ctx.tz_offset_minutes);
    let decay = check_decay(&next.state, &mut next.collection, today);
    let chest_eligibility =
        chest_eligibility(&history, today, ctx.tz_offset_minutes, &ctx.economy.eligibility);

    let outcome = IngestOutcome {
        activity_id: activity.id,
        productivity_score: activity.productivity_score,
        xp,
        new_badges,
        goal_adjustments,
        goal_xp_delta,
        credits,
        decay,
        chest_eligibility,
        total_xp: next.state.xp(),
        level: next.state.level(),
        chest_credits: next.state.chest_credits(),
    };
    (next, outcome)
}
