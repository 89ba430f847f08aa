use anyhow::{Context, Result};
use chrono::{DateTime, Days, Duration, TimeZone, Utc};
use focusflow_engine::loot::weighted_pick;
use focusflow_engine::time::local_hour;
use focusflow_engine::{
    ActivityRecord, CallContext, Category, DecayReport, Goal, GoalAdjustment, Profile,
    ProgressionEngine, ProgressionState, Rarity, RngStreams, StaticCatalogs, Streaks,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::common::snapshot_digest;
use crate::logic::memory::MemoryStorage;

pub const SIM_OWNER_ID: u64 = 1;
pub const DEFAULT_SIM_DAYS: u32 = 14;
const REPAIR_COST: i64 = 5;

/// Monday 2025-01-06, 00:00 UTC.
fn sim_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// How a simulated user spends their day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityMix {
    Balanced,
    Grinder,
    Slacker,
}

impl ActivityMix {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Grinder => "grinder",
            Self::Slacker => "slacker",
        }
    }

    fn weights(self) -> [(Category, u32); 5] {
        match self {
            Self::Balanced => [
                (Category::Career, 35),
                (Category::Health, 20),
                (Category::Leisure, 20),
                (Category::Chores, 15),
                (Category::Social, 10),
            ],
            Self::Grinder => [
                (Category::Career, 70),
                (Category::Health, 20),
                (Category::Leisure, 0),
                (Category::Chores, 10),
                (Category::Social, 0),
            ],
            Self::Slacker => [
                (Category::Career, 10),
                (Category::Health, 5),
                (Category::Leisure, 70),
                (Category::Chores, 5),
                (Category::Social, 10),
            ],
        }
    }

    fn distraction_minutes<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        match self {
            Self::Balanced => rng.gen_range(0..=50),
            Self::Grinder => rng.gen_range(0..=20),
            Self::Slacker => rng.gen_range(45..=150),
        }
    }
}

fn activity_name(category: Category) -> &'static str {
    match category {
        Category::Career => "coding",
        Category::Health => "running",
        Category::Leisure => "gaming",
        Category::Chores => "laundry",
        Category::Social => "dinner with friends",
        Category::Unknown => "misc",
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// # Errors
    ///
    /// Returns the expectation's failure.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// Everything needed to drive one seeded simulation.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub mix: ActivityMix,
    pub days: u32,
    pub tz_offset_minutes: i32,
    pub starting_credits: i64,
    pub goals: Vec<Goal>,
    pub auto_repair: bool,
    pub check_determinism: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(mix: ActivityMix) -> Self {
        Self {
            mix,
            days: DEFAULT_SIM_DAYS,
            tz_offset_minutes: 0,
            starting_credits: 0,
            goals: Vec::new(),
            auto_repair: false,
            check_determinism: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    #[must_use]
    pub const fn with_tz_offset(mut self, tz_offset_minutes: i32) -> Self {
        self.tz_offset_minutes = tz_offset_minutes;
        self
    }

    #[must_use]
    pub const fn with_starting_credits(mut self, credits: i64) -> Self {
        self.starting_credits = credits;
        self
    }

    #[must_use]
    pub fn with_goal(mut self, mut goal: Goal) -> Self {
        goal.owner_id = SIM_OWNER_ID;
        self.goals.push(goal);
        self
    }

    #[must_use]
    pub const fn with_auto_repair(mut self) -> Self {
        self.auto_repair = true;
        self
    }

    #[must_use]
    pub const fn with_determinism_check(mut self) -> Self {
        self.check_determinism = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// What happened over one simulated run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub mix: ActivityMix,
    pub days: u32,
    pub activities_logged: usize,
    /// Minutes of positively scored activity.
    pub productive_minutes_logged: u64,
    pub starting_credits: i64,
    pub credits_earned: i64,
    pub credits_remaining: i64,
    pub productive_minutes_carry: u32,
    pub xp: i64,
    pub level: u32,
    pub chests_opened: u32,
    pub rarity_counts: BTreeMap<Rarity, u32>,
    pub owned_items: usize,
    pub broken_items: usize,
    pub decays: Vec<DecayReport>,
    pub repairs: u32,
    pub badges: Vec<String>,
    pub adjustments: Vec<GoalAdjustment>,
    pub streaks: Streaks,
    pub digest: u64,
    pub log: Vec<String>,
}

impl SimulationSummary {
    /// Share of opened chests that drew `rarity`.
    #[must_use]
    pub fn rarity_share(&self, rarity: Rarity) -> f64 {
        if self.chests_opened == 0 {
            return 0.0;
        }
        f64::from(self.rarity_counts.get(&rarity).copied().unwrap_or_default())
            / f64::from(self.chests_opened)
    }
}

type SimEngine = ProgressionEngine<StaticCatalogs, MemoryStorage>;

/// Headless deterministic runner for the progression engine.
#[derive(Debug, Clone, Copy)]
pub struct Simulator {
    verbose: bool,
}

impl Simulator {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Run `plan` with streams derived from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects an operation the simulator
    /// expected to succeed.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let streams = RngStreams::from_user_seed(seed);
        let state = ProgressionState::from_counters(0, plan.starting_credits, 0);
        let storage =
            MemoryStorage::new(plan.goals.clone()).with_profile(SIM_OWNER_ID, Profile::new(state));
        let mut engine = ProgressionEngine::new(StaticCatalogs, storage);
        let mut run = Run::new(plan, seed);

        for day in 0..plan.days {
            let day_start = sim_epoch()
                .checked_add_days(Days::new(u64::from(day)))
                .context("simulation calendar overflow")?
                + Duration::minutes(i64::from(plan.tz_offset_minutes));
            run.log_day(&mut engine, &streams, day, day_start)?;
            if plan.auto_repair {
                run.repair_broken(&mut engine, day)?;
            }
            run.open_chests(&mut engine, &streams, day)?;
            run.record_distraction(&mut engine, &streams, day, day_start)?;
        }

        if plan.days == 0 {
            run.open_chests(&mut engine, &streams, 0)?;
        }

        let summary = run.finish(&engine)?;
        if self.verbose {
            log::info!(
                "seed {seed} ({}): level {} xp {} chests {} decays {}",
                plan.mix.label(),
                summary.level,
                summary.xp,
                summary.chests_opened,
                summary.decays.len()
            );
        }
        Ok(summary)
    }
}

struct Run<'p> {
    plan: &'p SimulationPlan,
    seed: u64,
    next_activity_id: u64,
    productive_minutes_logged: u64,
    credits_earned: i64,
    chests_opened: u32,
    rarity_counts: BTreeMap<Rarity, u32>,
    decays: Vec<DecayReport>,
    repairs: u32,
    adjustments: Vec<GoalAdjustment>,
    last_now: DateTime<Utc>,
    log: Vec<String>,
}

impl<'p> Run<'p> {
    fn new(plan: &'p SimulationPlan, seed: u64) -> Self {
        Self {
            plan,
            seed,
            next_activity_id: 1,
            productive_minutes_logged: 0,
            credits_earned: 0,
            chests_opened: 0,
            rarity_counts: BTreeMap::new(),
            decays: Vec::new(),
            repairs: 0,
            adjustments: Vec::new(),
            last_now: sim_epoch(),
            log: Vec::new(),
        }
    }

    fn call(&self, now: DateTime<Utc>) -> CallContext {
        CallContext {
            owner_id: SIM_OWNER_ID,
            now,
            tz_offset_minutes: self.plan.tz_offset_minutes,
        }
    }

    fn log_day(
        &mut self,
        engine: &mut SimEngine,
        streams: &RngStreams,
        day: u32,
        day_start: DateTime<Utc>,
    ) -> Result<()> {
        let weights = self.plan.mix.weights();
        let mut rng = streams.activity();
        let count: u32 = rng.gen_range(2..=5);
        for slot in 0..count {
            let category = weighted_pick(&weights, &mut *rng).unwrap_or(Category::Career);
            let minutes = rng.gen_range(15..=120);
            let focus = rng.gen_bool(0.3);
            let at = day_start
                + Duration::hours(8 + 2 * i64::from(slot))
                + Duration::minutes(rng.gen_range(0..60));
            let activity = ActivityRecord::scored(
                self.next_activity_id,
                SIM_OWNER_ID,
                activity_name(category),
                category,
                Some(minutes),
                focus,
                at,
            );
            self.next_activity_id += 1;

            let outcome = engine.log_activity(
                &activity,
                at,
                self.plan.tz_offset_minutes,
                Some(local_hour(at, self.plan.tz_offset_minutes)),
            )?;
            if let Some(credits) = outcome.credits {
                self.productive_minutes_logged += u64::from(credits.minutes_added);
                self.credits_earned += credits.credits_earned;
            }
            for badge in &outcome.new_badges {
                self.log
                    .push(format!("day {day}: earned badge {}", badge.badge.name));
            }
            for adjustment in outcome.goal_adjustments.iter() {
                self.log.push(format!(
                    "day {day}: {} {} ({:+} xp)",
                    adjustment.goal_title,
                    adjustment.reason.describe(),
                    adjustment.points
                ));
                self.adjustments.push(adjustment.clone());
            }
            if let Some(decay) = outcome.decay {
                self.log.push(format!("day {day}: {}", decay.message));
                self.decays.push(decay);
            }
            self.last_now = at;
        }
        Ok(())
    }

    fn open_chests(&mut self, engine: &mut SimEngine, streams: &RngStreams, day: u32) -> Result<()> {
        let credits = engine.collection_summary(SIM_OWNER_ID)?.credits;
        let spendable = if self.plan.auto_repair {
            (credits - REPAIR_COST).max(0)
        } else {
            credits
        };
        for _ in 0..spendable {
            let opened = engine.open_chest(SIM_OWNER_ID, &mut *streams.loot())?;
            *self.rarity_counts.entry(opened.rarity).or_default() += 1;
            self.chests_opened += 1;
            if opened.is_new {
                self.log.push(format!(
                    "day {day}: chest -> {} ({})",
                    opened.item.name, opened.rarity
                ));
            }
        }
        Ok(())
    }

    fn repair_broken(&mut self, engine: &mut SimEngine, day: u32) -> Result<()> {
        let summary = engine.collection_summary(SIM_OWNER_ID)?;
        let mut credits = summary.credits;
        for entry in summary.entries.iter().filter(|entry| entry.broken) {
            if credits < REPAIR_COST {
                break;
            }
            let receipt = engine.repair_item(SIM_OWNER_ID, &entry.name)?;
            credits = receipt.remaining_credits;
            self.repairs += 1;
            self.log.push(format!("day {day}: {}", receipt.message));
        }
        Ok(())
    }

    fn record_distraction(
        &mut self,
        engine: &mut SimEngine,
        streams: &RngStreams,
        day: u32,
        day_start: DateTime<Utc>,
    ) -> Result<()> {
        let minutes = self.plan.mix.distraction_minutes(&mut *streams.activity());
        let now = day_start + Duration::hours(22);
        let (status, decay) = engine.record_distraction(self.call(now), minutes)?;
        log::debug!(
            "day {day}: distraction {}/{} min ({:?})",
            status.minutes,
            status.allowance,
            status.status
        );
        if let Some(decay) = decay {
            self.log.push(format!("day {day}: {}", decay.message));
            self.decays.push(decay);
        }
        self.last_now = now;
        Ok(())
    }

    fn finish(self, engine: &SimEngine) -> Result<SimulationSummary> {
        let profile = engine
            .storage()
            .profile(SIM_OWNER_ID)
            .context("simulated profile missing")?;
        let collection = engine.collection_summary(SIM_OWNER_ID)?;
        let streaks = engine.streaks(self.call(self.last_now))?;
        let digest = snapshot_digest(&(&profile, &self.log));

        Ok(SimulationSummary {
            seed: self.seed,
            mix: self.plan.mix,
            days: self.plan.days,
            activities_logged: engine.storage().activity_count(),
            productive_minutes_logged: self.productive_minutes_logged,
            starting_credits: self.plan.starting_credits,
            credits_earned: self.credits_earned,
            credits_remaining: profile.state.chest_credits(),
            productive_minutes_carry: profile.state.productive_minutes(),
            xp: profile.state.xp(),
            level: profile.state.level(),
            chests_opened: self.chests_opened,
            rarity_counts: self.rarity_counts,
            owned_items: collection.owned_count,
            broken_items: collection.broken_count,
            decays: self.decays,
            repairs: self.repairs,
            badges: profile.badges.iter().map(|(name, _)| name.to_string()).collect(),
            adjustments: self.adjustments,
            streaks,
            digest,
            log: self.log,
        })
    }
}
