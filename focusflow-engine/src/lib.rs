//! FocusFlow Progression Engine
//!
//! Platform-agnostic core of the FocusFlow productivity economy: activity
//! scoring, XP and levels, badges, goal pacing, streaks and the loot chest
//! economy. The crate holds no clock, storage or network code; callers inject
//! "now", the timezone offset and a random source.

pub mod activity;
pub mod badges;
pub mod config;
pub mod constants;
pub mod data;
pub mod goals;
pub mod ingest;
pub mod ledger;
pub mod loot;
pub mod numbers;
pub mod projection;
pub mod rng;
pub mod state;
pub mod streak;
pub mod time;

use chrono::{DateTime, Utc};
use rand::Rng;

// Re-export commonly used types
pub use activity::{ActivityEdit, ActivityRecord, Category, productivity_score};
pub use badges::{
    BadgeCatalog, BadgeCheckError, BadgeContext, BadgeDefinition, BadgePredicate, BadgeRegistry,
    BadgeRule, EarnedBadge, EarnedBadges,
};
pub use config::{DistractionCfg, EconomyConfig, EligibilityCfg, ProjectionCfg};
pub use data::{CatalogError, Catalogs, StaticCatalogs};
pub use goals::{
    AdjustmentReason, Goal, GoalAdjustment, GoalAdjustments, GoalError, GoalKind, GoalProgress,
    GoalWindow, PacingStatus, Timeframe, goal_progress, hours_logged, threshold_adjustments,
};
pub use ingest::{IngestContext, IngestOutcome, ingest};
pub use ledger::{LevelProgress, XpAward, level_for_xp, xp_for_level, xp_gain};
pub use loot::{
    ChestEligibility, ChestOpen, Collection, CollectionSummary, DecayReport, DistractionLevel,
    DistractionStatus, ItemCatalog, ItemDefinition, LootError, OwnedItem, Rarity, RepairReceipt,
};
pub use projection::{LeisureProjection, WarningLevel, leisure_projection};
pub use rng::{CountingRng, RngStreams};
pub use state::{CreditAccrual, Profile, ProgressionState};
pub use streak::{Streaks, streaks};

/// Source of the static catalogs (items, badges, economy tunables).
/// Platform-specific implementations should provide this
pub trait CatalogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if a catalog cannot be loaded or is invalid.
    fn load_catalogs(&self) -> Result<Catalogs, Self::Error>;
}

/// Per-user persistence the engine reads and writes around each call.
pub trait ProfileStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a user's profile, or `None` for a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be read.
    fn load_profile(&self, owner_id: u64) -> Result<Option<Profile>, Self::Error>;

    /// Persist a user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be written.
    fn save_profile(&self, owner_id: u64, profile: &Profile) -> Result<(), Self::Error>;

    /// Every activity the user has logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read.
    fn load_history(&self, owner_id: u64) -> Result<Vec<ActivityRecord>, Self::Error>;

    /// Insert or replace an activity by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the activity cannot be written.
    fn store_activity(&self, activity: &ActivityRecord) -> Result<(), Self::Error>;

    /// The user's goals.
    ///
    /// # Errors
    ///
    /// Returns an error if the goals cannot be read.
    fn load_goals(&self, owner_id: u64) -> Result<Vec<Goal>, Self::Error>;
}

/// Inputs that identify one user call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub owner_id: u64,
    pub now: DateTime<Utc>,
    pub tz_offset_minutes: i32,
}

/// Engine binding catalogs and storage for per-user progression calls.
///
/// Every mutating call takes `&mut self`, so events on one engine are applied
/// one at a time.
pub struct ProgressionEngine<C, S>
where
    C: CatalogSource,
    S: ProfileStorage,
{
    catalogs: C,
    storage: S,
    registry: BadgeRegistry,
}

impl<C, S> ProgressionEngine<C, S>
where
    C: CatalogSource,
    S: ProfileStorage,
    C::Error: Into<anyhow::Error>,
    S::Error: Into<anyhow::Error>,
{
    /// Create a new engine with the standard badge rules
    pub fn new(catalogs: C, storage: S) -> Self {
        Self {
            catalogs,
            storage,
            registry: BadgeRegistry::standard(),
        }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    fn profile(&self, owner_id: u64) -> anyhow::Result<Profile> {
        if let Some(profile) = self.storage.load_profile(owner_id).map_err(Into::into)? {
            return Ok(profile);
        }
        let catalogs = self.catalogs()?;
        let mut state = ProgressionState::default();
        state.daily_distraction_allowance = catalogs.economy.distraction.default_allowance_minutes;
        Ok(Profile::new(state))
    }

    fn save(&self, owner_id: u64, profile: &Profile) -> anyhow::Result<()> {
        self.storage.save_profile(owner_id, profile).map_err(Into::into)
    }

    fn history(&self, owner_id: u64) -> anyhow::Result<Vec<ActivityRecord>> {
        self.storage.load_history(owner_id).map_err(Into::into)
    }

    fn catalogs(&self) -> anyhow::Result<Catalogs> {
        self.catalogs.load_catalogs().map_err(Into::into)
    }

    /// Record a scored activity and apply its progression effects.
    ///
    /// # Errors
    ///
    /// Returns an error if catalogs or storage fail.
    pub fn log_activity(
        &mut self,
        activity: &ActivityRecord,
        now: DateTime<Utc>,
        tz_offset_minutes: i32,
        local_hour: Option<u32>,
    ) -> anyhow::Result<IngestOutcome> {
        let owner_id = activity.owner_id;
        let catalogs = self.catalogs()?;
        let profile = self.profile(owner_id)?;
        let history = self.history(owner_id)?;
        let goals = self.storage.load_goals(owner_id).map_err(Into::into)?;
        let ctx = IngestContext {
            now,
            tz_offset_minutes,
            local_hour,
            history: &history,
            goals: &goals,
            badge_catalog: &catalogs.badges,
            registry: &self.registry,
            economy: &catalogs.economy,
        };
        let (next, outcome) = ingest(&profile, activity, &ctx);
        self.storage.store_activity(activity).map_err(Into::into)?;
        self.save(owner_id, &next)?;
        Ok(outcome)
    }

    /// Apply an edit to a stored activity, rescoring it when needed.
    /// Progression already granted for the activity is not revisited.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn edit_activity(
        &mut self,
        owner_id: u64,
        activity_id: u64,
        edit: &ActivityEdit,
    ) -> anyhow::Result<Option<ActivityRecord>> {
        let history = self.history(owner_id)?;
        let Some(mut activity) = history.into_iter().find(|a| a.id == activity_id) else {
            return Ok(None);
        };
        if edit.apply(&mut activity) || edit.name.is_some() {
            self.storage.store_activity(&activity).map_err(Into::into)?;
        }
        Ok(Some(activity))
    }

    /// Spend a credit on a chest.
    ///
    /// # Errors
    ///
    /// Returns a [`LootError`] when the chest cannot be opened, or an error
    /// if catalogs or storage fail.
    pub fn open_chest<R: Rng + ?Sized>(
        &mut self,
        owner_id: u64,
        rng: &mut R,
    ) -> anyhow::Result<ChestOpen> {
        let catalogs = self.catalogs()?;
        let mut profile = self.profile(owner_id)?;
        let opened = loot::open_chest(
            &mut profile.state,
            &mut profile.collection,
            &catalogs.items,
            rng,
        )?;
        self.save(owner_id, &profile)?;
        Ok(opened)
    }

    /// Spend credits to repair a broken item.
    ///
    /// # Errors
    ///
    /// Returns a [`LootError`] when the repair is not possible, or an error
    /// if storage fails.
    pub fn repair_item(&mut self, owner_id: u64, item_name: &str) -> anyhow::Result<RepairReceipt> {
        let mut profile = self.profile(owner_id)?;
        let receipt = loot::repair(&mut profile.state, &mut profile.collection, item_name)?;
        self.save(owner_id, &profile)?;
        Ok(receipt)
    }

    /// Add distraction minutes reported for the caller's local day, then run
    /// the decay check.
    ///
    /// # Errors
    ///
    /// Returns an error if catalogs or storage fail.
    pub fn record_distraction(
        &mut self,
        call: CallContext,
        minutes: u32,
    ) -> anyhow::Result<(DistractionStatus, Option<DecayReport>)> {
        let catalogs = self.catalogs()?;
        let mut profile = self.profile(call.owner_id)?;
        let today = time::local_date(call.now, call.tz_offset_minutes);
        let status = loot::record_distraction(
            &mut profile.state,
            minutes,
            today,
            &catalogs.economy.distraction,
        );
        let decay = loot::check_decay(&profile.state, &mut profile.collection, today);
        self.save(call.owner_id, &profile)?;
        Ok((status, decay))
    }

    /// Pacing report for each of the user's goals.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn goal_progress(&self, call: CallContext) -> anyhow::Result<Vec<GoalProgress>> {
        let history = self.history(call.owner_id)?;
        let goals = self.storage.load_goals(call.owner_id).map_err(Into::into)?;
        Ok(goals
            .iter()
            .map(|goal| goal_progress(goal, &history, call.now, call.tz_offset_minutes))
            .collect())
    }

    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn streaks(&self, call: CallContext) -> anyhow::Result<Streaks> {
        let history = self.history(call.owner_id)?;
        Ok(streaks(&history, call.now, call.tz_offset_minutes))
    }

    /// # Errors
    ///
    /// Returns an error if storage fails, or if catalogs fail for a new user.
    pub fn level_progress(&self, owner_id: u64) -> anyhow::Result<LevelProgress> {
        Ok(self.profile(owner_id)?.state.level_progress())
    }

    /// # Errors
    ///
    /// Returns an error if catalogs or storage fail.
    pub fn collection_summary(&self, owner_id: u64) -> anyhow::Result<CollectionSummary> {
        let catalogs = self.catalogs()?;
        let profile = self.profile(owner_id)?;
        Ok(loot::collection_summary(
            &profile.state,
            &profile.collection,
            &catalogs.items,
        ))
    }

    /// Advisory only: opening a chest never checks this.
    ///
    /// # Errors
    ///
    /// Returns an error if catalogs or storage fail.
    pub fn chest_eligibility(&self, call: CallContext) -> anyhow::Result<ChestEligibility> {
        let catalogs = self.catalogs()?;
        let history = self.history(call.owner_id)?;
        let today = time::local_date(call.now, call.tz_offset_minutes);
        Ok(loot::chest_eligibility(
            &history,
            today,
            call.tz_offset_minutes,
            &catalogs.economy.eligibility,
        ))
    }

    /// # Errors
    ///
    /// Returns an error if catalogs or storage fail.
    pub fn leisure_projection(&self, call: CallContext) -> anyhow::Result<LeisureProjection> {
        let catalogs = self.catalogs()?;
        let profile = self.profile(call.owner_id)?;
        let history = self.history(call.owner_id)?;
        Ok(leisure_projection(
            &history,
            profile.state.birth_year,
            call.now,
            call.tz_offset_minutes,
            &catalogs.economy.projection,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::mock::StepRng;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        profiles: Rc<RefCell<HashMap<u64, Profile>>>,
        activities: Rc<RefCell<Vec<ActivityRecord>>>,
        goals: Rc<RefCell<Vec<Goal>>>,
    }

    impl ProfileStorage for MemoryStorage {
        type Error = Infallible;

        fn load_profile(&self, owner_id: u64) -> Result<Option<Profile>, Self::Error> {
            Ok(self.profiles.borrow().get(&owner_id).cloned())
        }

        fn save_profile(&self, owner_id: u64, profile: &Profile) -> Result<(), Self::Error> {
            self.profiles.borrow_mut().insert(owner_id, profile.clone());
            Ok(())
        }

        fn load_history(&self, owner_id: u64) -> Result<Vec<ActivityRecord>, Self::Error> {
            Ok(self
                .activities
                .borrow()
                .iter()
                .filter(|a| a.owner_id == owner_id)
                .cloned()
                .collect())
        }

        fn store_activity(&self, activity: &ActivityRecord) -> Result<(), Self::Error> {
            let mut activities = self.activities.borrow_mut();
            activities.retain(|a| a.id != activity.id);
            activities.push(activity.clone());
            Ok(())
        }

        fn load_goals(&self, owner_id: u64) -> Result<Vec<Goal>, Self::Error> {
            Ok(self
                .goals
                .borrow()
                .iter()
                .filter(|g| g.owner_id == owner_id)
                .cloned()
                .collect())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 15, 0, 0).unwrap()
    }

    fn call() -> CallContext {
        CallContext {
            owner_id: 1,
            now: now(),
            tz_offset_minutes: 0,
        }
    }

    #[test]
    fn engine_logs_activity_and_persists_profile() {
        let storage = MemoryStorage::default();
        let mut engine = ProgressionEngine::new(StaticCatalogs, storage.clone());
        for id in 1..=3 {
            let activity =
                ActivityRecord::scored(id, 1, "coding", Category::Career, Some(40), false, now());
            engine.log_activity(&activity, now(), 0, None).unwrap();
        }
        let profile = storage.profiles.borrow().get(&1).cloned().unwrap();
        assert_eq!(profile.state.chest_credits(), 1);
        assert_eq!(profile.state.productive_minutes(), 0);
        assert!(profile.badges.contains("First Steps"));
        assert_eq!(engine.storage().activities.borrow().len(), 3);

        let opened = engine.open_chest(1, &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(opened.rarity, Rarity::Common);
        assert_eq!(engine.collection_summary(1).unwrap().owned_count, 1);
        assert_eq!(engine.collection_summary(1).unwrap().credits, 0);
    }

    #[test]
    fn loot_errors_surface_through_anyhow() {
        let mut engine = ProgressionEngine::new(StaticCatalogs, MemoryStorage::default());
        let err = engine.open_chest(9, &mut StepRng::new(0, 0)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LootError>(),
            Some(&LootError::InsufficientCredits {
                required: 1,
                available: 0
            })
        );
        let err = engine.repair_item(9, "GPU Core").unwrap_err();
        assert!(matches!(err.downcast_ref::<LootError>(), Some(LootError::ItemNotOwned(_))));
    }

    struct BrokenCatalogs;

    impl CatalogSource for BrokenCatalogs {
        type Error = CatalogError;

        fn load_catalogs(&self) -> Result<Catalogs, Self::Error> {
            Err(CatalogError::BlankName)
        }
    }

    #[test]
    fn new_profile_surfaces_catalog_errors() {
        let engine = ProgressionEngine::new(BrokenCatalogs, MemoryStorage::default());
        let err = engine.level_progress(1).unwrap_err();
        assert!(matches!(err.downcast_ref::<CatalogError>(), Some(CatalogError::BlankName)));

        let storage = MemoryStorage::default();
        storage.profiles.borrow_mut().insert(2, Profile::new(ProgressionState::from_counters(30, 0, 0)));
        let engine = ProgressionEngine::new(BrokenCatalogs, storage);
        assert_eq!(engine.level_progress(2).unwrap().xp, 30);
    }

    #[test]
    fn distraction_and_goal_reports() {
        let storage = MemoryStorage::default();
        let mut goal = Goal::new(5, GoalKind::Limit, Timeframe::Daily, 1, now())
            .unwrap()
            .with_title("Limit gaming");
        goal.owner_id = 1;
        storage.goals.borrow_mut().push(goal);
        let mut engine = ProgressionEngine::new(StaticCatalogs, storage);

        let gaming = ActivityRecord::scored(1, 1, "gaming", Category::Leisure, Some(45), false, now());
        engine.log_activity(&gaming, now(), 0, Some(15)).unwrap();
        let progress = engine.goal_progress(call()).unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].status, PacingStatus::SlightlyBehind);

        let (status, decay) = engine.record_distraction(call(), 75).unwrap();
        assert_eq!(status.status, DistractionLevel::Critical);
        assert!(decay.is_none());
        assert_eq!(engine.streaks(call()).unwrap().current_streak, 1);
        assert!(!engine.chest_eligibility(call()).unwrap().eligible);
        let projection = engine.leisure_projection(call()).unwrap();
        assert!((projection.today_leisure_hours - 0.8).abs() < 1e-9);
    }

    #[test]
    fn edit_activity_rescores_stored_record() {
        let storage = MemoryStorage::default();
        let mut engine = ProgressionEngine::new(StaticCatalogs, storage.clone());
        let activity = ActivityRecord::scored(4, 1, "walk", Category::Health, Some(30), false, now());
        engine.log_activity(&activity, now(), 0, None).unwrap();
        let edit = ActivityEdit {
            duration_minutes: Some(60),
            ..ActivityEdit::default()
        };
        let edited = engine.edit_activity(1, 4, &edit).unwrap().unwrap();
        assert!((edited.productivity_score - 8.0).abs() < 1e-9);
        assert!(
            (storage.activities.borrow()[0].productivity_score - 8.0).abs() < 1e-9
        );
        assert!(engine.edit_activity(1, 99, &edit).unwrap().is_none());
        assert_eq!(engine.level_progress(1).unwrap().level, 1);
    }
}
