use anyhow::{Result, ensure};
use chrono::{TimeZone, Utc};
use focusflow_engine::{
    AdjustmentReason, Category, Goal, GoalKind, ItemCatalog, Rarity, Timeframe,
};

use crate::common::scenario::TestScenario;
use crate::logic::simulation::{ActivityMix, SimulationPlan, SimulationSummary};

const LOOT_SAMPLE: i64 = 4_000;
const LOOT_TOLERANCE: f64 = 0.03;
const MINUTES_PER_CREDIT: u64 = 120;
const REPAIR_COST: i64 = 5;

pub struct CatalogEntry {
    pub key: &'static str,
    pub title: &'static str,
    build: fn() -> SimulationPlan,
}

const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        key: "smoke",
        title: "Smoke Test",
        build: smoke_plan,
    },
    CatalogEntry {
        key: "credit-accrual",
        title: "Credit Accrual",
        build: credit_accrual_plan,
    },
    CatalogEntry {
        key: "limit-breach",
        title: "Limit Goal Breach",
        build: limit_breach_plan,
    },
    CatalogEntry {
        key: "target-bonus",
        title: "Target Goal Bonus",
        build: target_bonus_plan,
    },
    CatalogEntry {
        key: "loot-distribution",
        title: "Loot Distribution",
        build: loot_distribution_plan,
    },
    CatalogEntry {
        key: "decay-repair",
        title: "Decay and Repair",
        build: decay_repair_plan,
    },
    CatalogEntry {
        key: "determinism",
        title: "Deterministic Replay",
        build: determinism_plan,
    },
    CatalogEntry {
        key: "timezone",
        title: "Timezone Day Boundaries",
        build: timezone_plan,
    },
];

pub const fn catalog_entries() -> &'static [CatalogEntry] {
    ENTRIES
}

pub fn catalog_scenarios() -> Vec<TestScenario> {
    ENTRIES
        .iter()
        .map(|entry| TestScenario::simulation(entry.title, (entry.build)()))
        .collect()
}

pub fn find_catalog_scenario(key: &str) -> Option<TestScenario> {
    ENTRIES
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| TestScenario::simulation(entry.title, (entry.build)()))
}

fn goal_epoch() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(chrono::DateTime::<Utc>::UNIX_EPOCH)
}

fn smoke_plan() -> SimulationPlan {
    SimulationPlan::new(ActivityMix::Balanced)
        .with_days(7)
        .with_expectation(smoke_expectation)
}

fn credit_accrual_plan() -> SimulationPlan {
    SimulationPlan::new(ActivityMix::Grinder)
        .with_days(10)
        .with_expectation(credit_ledger_expectation)
}

fn limit_breach_plan() -> SimulationPlan {
    let mut plan = SimulationPlan::new(ActivityMix::Slacker).with_days(10);
    if let Ok(goal) = Goal::new(1, GoalKind::Limit, Timeframe::Daily, 1, goal_epoch()) {
        plan = plan.with_goal(goal.with_category(Category::Leisure));
    }
    plan.with_expectation(limit_breach_expectation)
}

fn target_bonus_plan() -> SimulationPlan {
    let mut plan = SimulationPlan::new(ActivityMix::Grinder).with_days(7);
    if let Ok(goal) = Goal::new(2, GoalKind::Target, Timeframe::Daily, 1, goal_epoch()) {
        plan = plan.with_goal(goal.with_title("Target coding").with_category(Category::Career));
    }
    plan.with_expectation(target_bonus_expectation)
}

fn loot_distribution_plan() -> SimulationPlan {
    SimulationPlan::new(ActivityMix::Balanced)
        .with_days(0)
        .with_starting_credits(LOOT_SAMPLE)
        .with_expectation(loot_distribution_expectation)
}

fn decay_repair_plan() -> SimulationPlan {
    SimulationPlan::new(ActivityMix::Slacker)
        .with_days(14)
        .with_starting_credits(40)
        .with_auto_repair()
        .with_expectation(decay_expectation)
        .with_expectation(credit_ledger_expectation)
}

fn determinism_plan() -> SimulationPlan {
    SimulationPlan::new(ActivityMix::Balanced)
        .with_days(14)
        .with_starting_credits(5)
        .with_determinism_check()
        .with_expectation(smoke_expectation)
}

fn timezone_plan() -> SimulationPlan {
    SimulationPlan::new(ActivityMix::Balanced)
        .with_days(7)
        .with_tz_offset(300)
        .with_expectation(streak_expectation)
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.activities_logged > 0, "no activity was logged");
    ensure!(summary.xp > 0, "a balanced week should earn XP");
    ensure!(
        summary.badges.iter().any(|name| name == "First Steps"),
        "First Steps badge missing"
    );
    Ok(())
}

fn credit_ledger_expectation(summary: &SimulationSummary) -> Result<()> {
    let expected_credits = i64::try_from(summary.productive_minutes_logged / MINUTES_PER_CREDIT)?;
    ensure!(
        summary.credits_earned == expected_credits,
        "earned {} credits for {} productive minutes",
        summary.credits_earned,
        summary.productive_minutes_logged
    );
    ensure!(
        u64::from(summary.productive_minutes_carry)
            == summary.productive_minutes_logged % MINUTES_PER_CREDIT,
        "carry {} does not match logged minutes",
        summary.productive_minutes_carry
    );
    let spent = i64::from(summary.chests_opened) + REPAIR_COST * i64::from(summary.repairs);
    ensure!(
        summary.credits_remaining == summary.starting_credits + summary.credits_earned - spent,
        "credit balance {} does not reconcile",
        summary.credits_remaining
    );
    Ok(())
}

fn limit_breach_expectation(summary: &SimulationSummary) -> Result<()> {
    let first = summary
        .adjustments
        .first()
        .ok_or_else(|| anyhow::anyhow!("no limit breach recorded"))?;
    ensure!(
        first.reason == AdjustmentReason::ExceededLimit,
        "first adjustment was {:?}",
        first.reason
    );
    for adjustment in &summary.adjustments {
        let expected = match adjustment.reason {
            AdjustmentReason::ExceededLimit => -50,
            AdjustmentReason::ContinuedOverLimit => -10,
            AdjustmentReason::GoalCompleted => anyhow::bail!("limit goal completed"),
        };
        ensure!(adjustment.points == expected, "unexpected penalty {}", adjustment.points);
        ensure!(adjustment.hours_over.is_some(), "breach without hours over");
    }
    let breaches = summary
        .adjustments
        .iter()
        .filter(|a| a.reason == AdjustmentReason::ExceededLimit)
        .count();
    ensure!(
        breaches <= usize::try_from(summary.days)?,
        "{breaches} first breaches over {} days",
        summary.days
    );
    ensure!(summary.xp >= 0, "xp went negative");
    Ok(())
}

fn target_bonus_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(!summary.adjustments.is_empty(), "target never completed");
    ensure!(
        summary
            .adjustments
            .iter()
            .all(|a| a.reason == AdjustmentReason::GoalCompleted && a.points == 25),
        "unexpected adjustment on a target goal"
    );
    ensure!(
        summary.adjustments.len() <= usize::try_from(summary.days)?,
        "bonus fired more than once a day"
    );
    Ok(())
}

fn loot_distribution_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        i64::from(summary.chests_opened) == LOOT_SAMPLE,
        "opened {} of {LOOT_SAMPLE} chests",
        summary.chests_opened
    );
    ensure!(summary.credits_remaining == 0, "credits left unspent");
    let total_weight: u32 = Rarity::ALL.iter().map(|rarity| rarity.weight()).sum();
    for rarity in Rarity::ALL {
        let expected = f64::from(rarity.weight()) / f64::from(total_weight);
        let observed = summary.rarity_share(rarity);
        ensure!(
            (observed - expected).abs() <= LOOT_TOLERANCE,
            "{rarity} share {observed:.4} outside {expected:.2} ± {LOOT_TOLERANCE}"
        );
    }
    ensure!(
        summary.owned_items == ItemCatalog::load_from_static().len(),
        "collection incomplete after {LOOT_SAMPLE} chests"
    );
    Ok(())
}

fn decay_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(!summary.decays.is_empty(), "a slacker fortnight should break something");
    let repairs = usize::try_from(summary.repairs)?;
    ensure!(
        summary.broken_items + repairs == summary.decays.len(),
        "{} broken + {repairs} repaired != {} decays",
        summary.broken_items,
        summary.decays.len()
    );
    ensure!(
        summary
            .decays
            .iter()
            .all(|d| d.broken && d.message.contains(&d.item_name)),
        "malformed decay report"
    );
    Ok(())
}

fn streak_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.streaks.longest_streak == summary.days,
        "longest streak {} over {} active days",
        summary.streaks.longest_streak,
        summary.days
    );
    ensure!(
        summary.streaks.current_streak == summary.days,
        "current streak {} should run through today",
        summary.streaks.current_streak
    );
    Ok(())
}
