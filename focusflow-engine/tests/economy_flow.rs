use chrono::{DateTime, Duration, TimeZone, Utc};
use focusflow_engine::loot::{check_decay, open_chest, repair};
use focusflow_engine::{
    ActivityRecord, AdjustmentReason, BadgeCatalog, BadgeContext, BadgeRegistry, Category,
    EarnedBadges, EconomyConfig, Goal, GoalKind, IngestContext, IngestOutcome, ItemCatalog,
    LootError, Profile, ProgressionState, Rarity, RngStreams, Timeframe, ingest, level_for_xp,
    productivity_score, xp_for_level, xp_gain,
};

fn now() -> DateTime<Utc> {
    // Wednesday evening, UTC.
    Utc.with_ymd_and_hms(2025, 1, 8, 18, 0, 0).unwrap()
}

struct Session {
    catalog: BadgeCatalog,
    registry: BadgeRegistry,
    economy: EconomyConfig,
    goals: Vec<Goal>,
    history: Vec<ActivityRecord>,
    profile: Profile,
    next_id: u64,
}

impl Session {
    fn new(state: ProgressionState) -> Self {
        Self {
            catalog: BadgeCatalog::load_from_static(),
            registry: BadgeRegistry::standard(),
            economy: EconomyConfig::default_config(),
            goals: Vec::new(),
            history: Vec::new(),
            profile: Profile::new(state),
            next_id: 1,
        }
    }

    fn with_goal(mut self, goal: Goal) -> Self {
        self.goals.push(goal);
        self
    }

    fn log(&mut self, name: &str, category: Category, minutes: u32, at: DateTime<Utc>) -> IngestOutcome {
        let activity =
            ActivityRecord::scored(self.next_id, 1, name, category, Some(minutes), false, at);
        self.next_id += 1;
        let ctx = IngestContext {
            now: now(),
            tz_offset_minutes: 0,
            local_hour: Some(12),
            history: &self.history,
            goals: &self.goals,
            badge_catalog: &self.catalog,
            registry: &self.registry,
            economy: &self.economy,
        };
        let (profile, outcome) = ingest(&self.profile, &activity, &ctx);
        self.profile = profile;
        self.history.push(activity);
        outcome
    }
}

fn hours_ago(hours: i64) -> DateTime<Utc> {
    now() - Duration::hours(hours)
}

#[test]
fn career_scores_follow_focus_multiplier() {
    assert!((productivity_score(Category::Career, Some(120), false) - 20.0).abs() < 1e-9);
    assert!((productivity_score(Category::Career, Some(120), true) - 24.0).abs() < 1e-9);
}

#[test]
fn small_award_keeps_first_level() {
    assert_eq!(xp_gain(24.0), 2);
    assert_eq!(level_for_xp(2), 1);
    let mut session = Session::new(ProgressionState::default());
    let outcome = session.log("deep work", Category::Career, 120, hours_ago(2));
    assert_eq!(outcome.xp.xp_awarded, 2);
    assert_eq!(outcome.level, 1);
    assert!(!outcome.xp.leveled_up);
}

#[test]
fn three_short_sessions_match_one_long_session() {
    let mut split = Session::new(ProgressionState::default());
    let counters: Vec<u32> = (0..3)
        .map(|i| {
            let outcome = split.log("coding", Category::Career, 40, hours_ago(6 - i));
            outcome.credits.unwrap().productive_minutes
        })
        .collect();
    assert_eq!(counters, [40, 80, 0]);
    assert_eq!(split.profile.state.chest_credits(), 1);
    assert_eq!(split.profile.state.productive_minutes(), 0);

    let mut single = Session::new(ProgressionState::default());
    single.log("coding", Category::Career, 120, hours_ago(6));
    assert_eq!(single.profile.state.chest_credits(), 1);
    assert_eq!(single.profile.state.productive_minutes(), 0);
}

#[test]
fn leisure_never_accrues_credits() {
    let mut session = Session::new(ProgressionState::default());
    let outcome = session.log("tv", Category::Leisure, 240, hours_ago(5));
    assert!(outcome.credits.is_none());
    assert_eq!(session.profile.state.chest_credits(), 0);
    assert_eq!(outcome.total_xp, 0);
}

#[test]
fn limit_breach_penalizes_once_then_continues_smaller() {
    let goal = Goal::new(1, GoalKind::Limit, Timeframe::Daily, 2, now() - Duration::days(3))
        .unwrap()
        .with_category(Category::Leisure);
    let mut session = Session::new(ProgressionState::from_counters(100, 0, 0)).with_goal(goal);

    let first = session.log("gaming", Category::Leisure, 114, hours_ago(8));
    assert!(first.goal_adjustments.is_empty());

    let breach = session.log("gaming", Category::Leisure, 20, hours_ago(4));
    let penalty: Vec<_> = breach.goal_adjustments.iter().collect();
    assert_eq!(penalty.len(), 1);
    assert_eq!(penalty[0].points, -50);
    assert_eq!(penalty[0].reason, AdjustmentReason::ExceededLimit);
    assert_eq!(penalty[0].hours_over, Some(0.2));
    assert_eq!(breach.total_xp, 50);

    let continued = session.log("gaming", Category::Leisure, 10, hours_ago(2));
    let penalty: Vec<_> = continued.goal_adjustments.iter().collect();
    assert_eq!(penalty[0].points, -10);
    assert_eq!(penalty[0].reason, AdjustmentReason::ContinuedOverLimit);
    assert_eq!(continued.total_xp, 40);
}

#[test]
fn unrelated_activity_still_pays_for_an_exceeded_limit() {
    let goal = Goal::new(1, GoalKind::Limit, Timeframe::Daily, 1, now() - Duration::days(3))
        .unwrap()
        .with_category(Category::Leisure);
    let mut session = Session::new(ProgressionState::from_counters(100, 0, 0)).with_goal(goal);

    let breach = session.log("gaming", Category::Leisure, 120, hours_ago(6));
    assert_eq!(breach.goal_adjustments.iter().next().map(|a| a.points), Some(-50));

    let work = session.log("coding", Category::Career, 30, hours_ago(2));
    let penalty: Vec<_> = work.goal_adjustments.iter().collect();
    assert_eq!(penalty.len(), 1);
    assert_eq!(penalty[0].points, -10);
    assert_eq!(penalty[0].reason, AdjustmentReason::ContinuedOverLimit);
    assert_eq!(penalty[0].hours_over, Some(1.0));
    assert_eq!(work.goal_xp_delta, -10);
    assert_eq!(work.xp.xp_awarded, 1);
}

#[test]
fn penalties_never_push_xp_below_zero() {
    let goal = Goal::new(1, GoalKind::Limit, Timeframe::Weekly, 1, now())
        .unwrap()
        .with_category(Category::Leisure);
    let mut session = Session::new(ProgressionState::from_counters(5, 0, 0)).with_goal(goal);
    let outcome = session.log("gaming", Category::Leisure, 90, hours_ago(1));
    assert_eq!(outcome.goal_xp_delta, -5);
    assert_eq!(outcome.total_xp, 0);
    let outcome = session.log("gaming", Category::Leisure, 30, hours_ago(1));
    assert_eq!(outcome.total_xp, 0);
    assert_eq!(session.profile.state.level(), 1);
}

#[test]
fn target_bonus_fires_exactly_once() {
    let goal = Goal::new(2, GoalKind::Target, Timeframe::Daily, 1, now())
        .unwrap()
        .with_category(Category::Career);
    let mut session = Session::new(ProgressionState::default()).with_goal(goal);

    let bonuses: Vec<i64> = (0..3)
        .map(|i| {
            session
                .log("report", Category::Career, 30, hours_ago(6 - i))
                .goal_adjustments
                .iter()
                .map(|a| a.points)
                .sum()
        })
        .collect();
    assert_eq!(bonuses, [0, 25, 0]);
    assert_eq!(session.profile.state.xp(), 28);
}

#[test]
fn chest_with_one_credit_always_opens() {
    let catalog = ItemCatalog::load_from_static();
    for seed in 0..50 {
        let mut state = ProgressionState::from_counters(0, 1, 0);
        let mut profile = Profile::new(state.clone());
        let streams = RngStreams::from_user_seed(seed);
        let opened = open_chest(
            &mut state,
            &mut profile.collection,
            &catalog,
            &mut *streams.loot(),
        )
        .unwrap();
        assert_eq!(state.chest_credits(), 0);
        assert!(opened.is_new);
        assert_eq!(opened.count, 1);
        assert_eq!(opened.item.rarity, opened.rarity);
    }
}

#[test]
fn empty_wallet_cannot_open_a_chest() {
    let mut state = ProgressionState::default();
    let mut profile = Profile::new(state.clone());
    let err = open_chest(
        &mut state,
        &mut profile.collection,
        &ItemCatalog::load_from_static(),
        &mut *RngStreams::from_user_seed(7).loot(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        LootError::InsufficientCredits {
            required: 1,
            available: 0
        }
    );
    assert!(profile.collection.is_empty());
}

#[test]
fn decay_walks_down_the_tiers_and_repair_restores_one_item() {
    let catalog = ItemCatalog::load_from_static();
    let mut profile = Profile::new(ProgressionState::from_counters(0, 6, 0));
    for name in ["Coffee Cup", "GPU Core", "The Singularity", "Quantum Core"] {
        profile.collection.grant(catalog.find(name).unwrap());
    }
    let today = now().date_naive();
    profile.state.distraction_date = Some(today);
    profile.state.today_distraction_minutes = 61;

    let broken: Vec<(String, Rarity)> = std::iter::from_fn(|| {
        check_decay(&profile.state, &mut profile.collection, today)
            .map(|report| (report.item_name, report.rarity))
    })
    .collect();
    assert_eq!(
        broken,
        [
            ("Quantum Core".to_string(), Rarity::Mythic),
            ("The Singularity".to_string(), Rarity::Mythic),
            ("GPU Core".to_string(), Rarity::Legendary),
            ("Coffee Cup".to_string(), Rarity::Common),
        ]
    );
    assert_eq!(profile.collection.broken_count(), 4);

    let receipt = repair(&mut profile.state, &mut profile.collection, "GPU Core").unwrap();
    assert_eq!(receipt.credits_spent, 5);
    assert_eq!(receipt.remaining_credits, 1);
    assert_eq!(profile.collection.broken_count(), 3);
    assert!(!profile.collection.get("GPU Core").unwrap().broken);

    let err = repair(&mut profile.state, &mut profile.collection, "Quantum Core").unwrap_err();
    assert!(matches!(err, LootError::InsufficientCredits { required: 5, available: 1 }));
    assert_eq!(profile.collection.broken_count(), 3);

    let report = check_decay(&profile.state, &mut profile.collection, today).unwrap();
    assert_eq!(report.item_name, "GPU Core");
}

#[test]
fn score_sign_follows_category_weight() {
    for &category in Category::ALL {
        for minutes in (1..=600).step_by(17) {
            for focus in [false, true] {
                let score = productivity_score(category, Some(minutes), focus);
                match category {
                    Category::Leisure => assert!(score < 0.0, "{category} {minutes}"),
                    _ => assert!(score > 0.0, "{category} {minutes}"),
                }
            }
        }
    }
    assert!(productivity_score(Category::Unknown, Some(90), true).abs() < 1e-9);
}

#[test]
fn levels_are_monotonic_and_invert_exactly() {
    let mut previous = level_for_xp(0);
    for xp in 0..20_000 {
        let level = level_for_xp(xp);
        assert!(level >= previous);
        previous = level;
    }
    for level in 1..500 {
        assert_eq!(level_for_xp(xp_for_level(level)), level);
        if level > 1 {
            assert_eq!(level_for_xp(xp_for_level(level) - 1), level - 1);
        }
    }
}

#[test]
fn badges_are_never_earned_twice() {
    let catalog = BadgeCatalog::load_from_static();
    let registry = BadgeRegistry::standard();
    let activity = ActivityRecord::scored(1, 1, "run", Category::Health, Some(45), true, now());
    let history = [activity.clone()];
    let ctx = BadgeContext {
        activity: &activity,
        history: &history,
        local_hour: Some(23),
        now: now(),
    };
    let mut earned = EarnedBadges::default();
    let first = registry.evaluate(&mut earned, &catalog, &ctx);
    let names: Vec<_> = first.iter().map(|b| b.badge.name.as_str()).collect();
    assert_eq!(names, ["Night Owl", "First Steps"]);
    assert!(registry.evaluate(&mut earned, &catalog, &ctx).is_empty());
    assert_eq!(earned.len(), 2);
}
