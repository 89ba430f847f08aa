//! Achievement badges: catalog, predicate registry and evaluator.
use chrono::{DateTime, Datelike, Days, NaiveDate, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::activity::{ActivityRecord, Category};
use crate::constants::{
    CAREER_CHAMPION_MINUTES, CENTURION_ACTIVITIES, EARLY_BIRD_END_HOUR, FOCUSED_MIND_SESSIONS,
    HEALTH_HERO_MINUTES, IRON_STREAK_DAYS, LOG_TARGET_BADGES, NIGHT_OWL_END_HOUR,
    NIGHT_OWL_START_HOUR, SOCIAL_BUTTERFLY_MINUTES, WEEKEND_WARRIOR_MINUTES,
};

const DEFAULT_BADGE_DATA: &str = include_str!("../assets/badges.json");

/// Immutable catalog entry for a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub icon_name: String,
}

/// All badges a user can earn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BadgeCatalog {
    #[serde(default)]
    pub badges: Vec<BadgeDefinition>,
}

impl BadgeCatalog {
    /// Load the catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a badge catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_BADGE_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&BadgeDefinition> {
        self.badges.iter().find(|badge| badge.name == name)
    }
}

/// A badge awarded to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedBadge {
    pub badge: BadgeDefinition,
    pub earned_at: DateTime<Utc>,
}

/// Set of badges a user owns, keyed by badge name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EarnedBadges(BTreeMap<String, DateTime<Utc>>);

impl EarnedBadges {
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Record a badge. Returns false when it was already owned, leaving the
    /// original timestamp untouched.
    pub fn insert(&mut self, name: &str, earned_at: DateTime<Utc>) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.insert(name.to_string(), earned_at);
        true
    }

    #[must_use]
    pub fn earned_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.0.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DateTime<Utc>)> {
        self.0.iter().map(|(name, at)| (name.as_str(), *at))
    }
}

/// Inputs shared by every badge predicate.
#[derive(Debug, Clone, Copy)]
pub struct BadgeContext<'a> {
    /// The activity that triggered evaluation.
    pub activity: &'a ActivityRecord,
    /// Full history, including `activity`.
    pub history: &'a [ActivityRecord],
    /// Caller-supplied local hour of the activity.
    pub local_hour: Option<u32>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BadgeCheckError {
    #[error("local hour {0} is outside 0-23")]
    InvalidLocalHour(u32),
    #[error("{category} minutes overflowed while summing history")]
    MinutesOverflow { category: &'static str },
    #[error("date arithmetic left the calendar range from {from}")]
    DateOutOfRange { from: NaiveDate },
}

/// A single achievement rule.
pub trait BadgePredicate {
    /// Catalog name of the badge this rule unlocks.
    fn badge_name(&self) -> &str;

    /// Whether the badge condition holds.
    ///
    /// # Errors
    ///
    /// Returns an error when the inputs cannot be evaluated; the evaluator
    /// logs and skips the rule.
    fn evaluate(&self, ctx: &BadgeContext<'_>) -> Result<bool, BadgeCheckError>;
}

/// The standard badge rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeRule {
    NightOwl,
    EarlyBird,
    WeekendWarrior,
    IronStreak,
    Centurion,
    FirstSteps,
    FocusedMind,
    CareerChampion,
    HealthHero,
    SocialButterfly,
}

impl BadgeRule {
    pub const ALL: &'static [Self] = &[
        Self::NightOwl,
        Self::EarlyBird,
        Self::WeekendWarrior,
        Self::IronStreak,
        Self::Centurion,
        Self::FirstSteps,
        Self::FocusedMind,
        Self::CareerChampion,
        Self::HealthHero,
        Self::SocialButterfly,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NightOwl => "Night Owl",
            Self::EarlyBird => "Early Bird",
            Self::WeekendWarrior => "Weekend Warrior",
            Self::IronStreak => "Iron Streak",
            Self::Centurion => "Centurion",
            Self::FirstSteps => "First Steps",
            Self::FocusedMind => "Focused Mind",
            Self::CareerChampion => "Career Champion",
            Self::HealthHero => "Health Hero",
            Self::SocialButterfly => "Social Butterfly",
        }
    }
}

impl BadgePredicate for BadgeRule {
    fn badge_name(&self) -> &str {
        self.name()
    }

    fn evaluate(&self, ctx: &BadgeContext<'_>) -> Result<bool, BadgeCheckError> {
        match self {
            Self::NightOwl => {
                let hour = effective_hour(ctx)?;
                Ok(hour >= NIGHT_OWL_START_HOUR || hour < NIGHT_OWL_END_HOUR)
            }
            Self::EarlyBird => Ok(effective_hour(ctx)? < EARLY_BIRD_END_HOUR),
            Self::WeekendWarrior => weekend_warrior(ctx),
            Self::IronStreak => iron_streak(ctx),
            Self::Centurion => Ok(ctx.history.len() >= CENTURION_ACTIVITIES),
            Self::FirstSteps => Ok(ctx.history.len() == 1),
            Self::FocusedMind => {
                Ok(ctx.history.iter().filter(|a| a.focus).count() >= FOCUSED_MIND_SESSIONS)
            }
            Self::CareerChampion => {
                Ok(category_minutes(ctx.history, Category::Career)? >= CAREER_CHAMPION_MINUTES)
            }
            Self::HealthHero => {
                Ok(category_minutes(ctx.history, Category::Health)? >= HEALTH_HERO_MINUTES)
            }
            Self::SocialButterfly => {
                Ok(category_minutes(ctx.history, Category::Social)? >= SOCIAL_BUTTERFLY_MINUTES)
            }
        }
    }
}

fn effective_hour(ctx: &BadgeContext<'_>) -> Result<u32, BadgeCheckError> {
    match ctx.local_hour {
        Some(hour) if hour > 23 => Err(BadgeCheckError::InvalidLocalHour(hour)),
        Some(hour) => Ok(hour),
        None => Ok(ctx.activity.timestamp.hour()),
    }
}

fn sum_minutes<'a>(
    mut activities: impl Iterator<Item = &'a ActivityRecord>,
    category: &'static str,
) -> Result<u32, BadgeCheckError> {
    activities.try_fold(0u32, |total, activity| {
        total
            .checked_add(activity.minutes())
            .ok_or(BadgeCheckError::MinutesOverflow { category })
    })
}

fn category_minutes(history: &[ActivityRecord], category: Category) -> Result<u32, BadgeCheckError> {
    sum_minutes(
        history.iter().filter(|a| a.category == category),
        category.label(),
    )
}

fn weekend_warrior(ctx: &BadgeContext<'_>) -> Result<bool, BadgeCheckError> {
    if !matches!(ctx.activity.timestamp.weekday(), Weekday::Sat | Weekday::Sun) {
        return Ok(false);
    }
    let day = ctx.activity.utc_date();
    let minutes = sum_minutes(ctx.history.iter().filter(|a| a.utc_date() == day), "same-day")?;
    Ok(minutes >= WEEKEND_WARRIOR_MINUTES)
}

fn iron_streak(ctx: &BadgeContext<'_>) -> Result<bool, BadgeCheckError> {
    if ctx.history.len() < 7 {
        return Ok(false);
    }
    let dates: HashSet<NaiveDate> = ctx.history.iter().map(ActivityRecord::utc_date).collect();
    let today = ctx.now.date_naive();
    for back in 0..IRON_STREAK_DAYS {
        let day = today
            .checked_sub_days(Days::new(back))
            .ok_or(BadgeCheckError::DateOutOfRange { from: today })?;
        if !dates.contains(&day) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Ordered list of badge rules.
#[derive(Debug, Clone)]
pub struct BadgeRegistry<P = BadgeRule> {
    rules: Vec<P>,
}

impl BadgeRegistry<BadgeRule> {
    /// The ten standard rules, in catalog order.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_rules(BadgeRule::ALL.to_vec())
    }
}

impl Default for BadgeRegistry<BadgeRule> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<P: BadgePredicate> BadgeRegistry<P> {
    #[must_use]
    pub const fn from_rules(rules: Vec<P>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[P] {
        &self.rules
    }

    /// Evaluate every rule the user has not yet earned and record new badges.
    ///
    /// Rules whose badge is missing from the catalog are skipped. A rule that
    /// fails is logged and skipped without affecting the others.
    pub fn evaluate(
        &self,
        earned: &mut EarnedBadges,
        catalog: &BadgeCatalog,
        ctx: &BadgeContext<'_>,
    ) -> Vec<EarnedBadge> {
        let mut newly_earned = Vec::new();
        for rule in &self.rules {
            let name = rule.badge_name();
            if earned.contains(name) {
                continue;
            }
            let Some(definition) = catalog.find(name) else {
                continue;
            };
            match rule.evaluate(ctx) {
                Ok(true) => {
                    if earned.insert(name, ctx.now) {
                        log::info!(target: LOG_TARGET_BADGES, "badge earned: {name}");
                        newly_earned.push(EarnedBadge {
                            badge: definition.clone(),
                            earned_at: ctx.now,
                        });
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    log::warn!(target: LOG_TARGET_BADGES, "skipping badge check {name}: {err}");
                }
            }
        }
        newly_earned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn activity(id: u64, category: Category, minutes: u32, at: DateTime<Utc>) -> ActivityRecord {
        ActivityRecord::scored(id, 1, "session", category, Some(minutes), false, at)
    }

    fn ctx<'a>(
        activity: &'a ActivityRecord,
        history: &'a [ActivityRecord],
        local_hour: Option<u32>,
        now: DateTime<Utc>,
    ) -> BadgeContext<'a> {
        BadgeContext {
            activity,
            history,
            local_hour,
            now,
        }
    }

    fn wednesday(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, hour, 0, 0).unwrap()
    }

    #[test]
    fn static_catalog_covers_every_rule() {
        let catalog = BadgeCatalog::load_from_static();
        assert_eq!(catalog.badges.len(), BadgeRule::ALL.len());
        for rule in BadgeRule::ALL {
            assert!(catalog.find(rule.name()).is_some(), "{}", rule.name());
        }
    }

    #[test]
    fn night_owl_prefers_local_hour() {
        let late = activity(1, Category::Career, 30, wednesday(12));
        let history = [late.clone()];
        assert!(!BadgeRule::NightOwl.evaluate(&ctx(&late, &history, None, wednesday(12))).unwrap());
        assert!(BadgeRule::NightOwl.evaluate(&ctx(&late, &history, Some(23), wednesday(12))).unwrap());
        assert!(BadgeRule::NightOwl.evaluate(&ctx(&late, &history, Some(3), wednesday(12))).unwrap());
        assert!(!BadgeRule::NightOwl.evaluate(&ctx(&late, &history, Some(4), wednesday(12))).unwrap());
    }

    #[test]
    fn early_bird_uses_utc_hour_without_local_hour() {
        let early = activity(1, Category::Health, 30, wednesday(6));
        let history = [early.clone()];
        assert!(BadgeRule::EarlyBird.evaluate(&ctx(&early, &history, None, wednesday(6))).unwrap());
        assert!(!BadgeRule::EarlyBird.evaluate(&ctx(&early, &history, Some(7), wednesday(6))).unwrap());
    }

    #[test]
    fn weekend_warrior_needs_five_hours_on_weekend() {
        let saturday = Utc.with_ymd_and_hms(2025, 1, 11, 10, 0, 0).unwrap();
        let history = vec![
            activity(1, Category::Chores, 120, saturday),
            activity(2, Category::Leisure, 120, saturday + Duration::hours(3)),
            activity(3, Category::Social, 59, saturday + Duration::hours(6)),
        ];
        let trigger = history[2].clone();
        assert!(!BadgeRule::WeekendWarrior.evaluate(&ctx(&trigger, &history, None, saturday)).unwrap());

        let mut longer = history.clone();
        longer[2].duration_minutes = Some(60);
        let trigger = longer[2].clone();
        assert!(BadgeRule::WeekendWarrior.evaluate(&ctx(&trigger, &longer, None, saturday)).unwrap());

        let weekday = activity(4, Category::Career, 400, wednesday(10));
        let history = [weekday.clone()];
        assert!(!BadgeRule::WeekendWarrior.evaluate(&ctx(&weekday, &history, None, wednesday(10))).unwrap());
    }

    #[test]
    fn iron_streak_requires_seven_days_ending_today() {
        let now = wednesday(20);
        let history: Vec<_> = (0..7)
            .map(|back| activity(back, Category::Career, 30, now - Duration::days(i64::try_from(back).unwrap())))
            .collect();
        let trigger = history[0].clone();
        assert!(BadgeRule::IronStreak.evaluate(&ctx(&trigger, &history, None, now)).unwrap());

        let tomorrow = now + Duration::days(1);
        assert!(!BadgeRule::IronStreak.evaluate(&ctx(&trigger, &history, None, tomorrow)).unwrap());

        let gappy: Vec<_> = history.iter().filter(|a| a.id != 3).cloned().collect();
        assert!(!BadgeRule::IronStreak.evaluate(&ctx(&trigger, &gappy, None, now)).unwrap());
    }

    #[test]
    fn count_based_rules() {
        let now = wednesday(9);
        let first = activity(1, Category::Career, 30, now);
        let one = [first.clone()];
        assert!(BadgeRule::FirstSteps.evaluate(&ctx(&first, &one, None, now)).unwrap());
        assert!(!BadgeRule::Centurion.evaluate(&ctx(&first, &one, None, now)).unwrap());

        let many: Vec<_> = (0..100)
            .map(|id| {
                let mut a = activity(id, Category::Career, 30, now);
                a.focus = id < 10;
                a
            })
            .collect();
        assert!(!BadgeRule::FirstSteps.evaluate(&ctx(&first, &many, None, now)).unwrap());
        assert!(BadgeRule::Centurion.evaluate(&ctx(&first, &many, None, now)).unwrap());
        assert!(BadgeRule::FocusedMind.evaluate(&ctx(&first, &many, None, now)).unwrap());
        assert!(!BadgeRule::FocusedMind.evaluate(&ctx(&first, &many[..50][5..], None, now)).unwrap());
    }

    #[test]
    fn category_hour_rules_use_default_duration() {
        let now = wednesday(9);
        let mut history: Vec<_> = (0..40)
            .map(|id| activity(id, Category::Social, 30, now))
            .collect();
        let trigger = history[0].clone();
        assert!(BadgeRule::SocialButterfly.evaluate(&ctx(&trigger, &history, None, now)).unwrap());
        history.truncate(39);
        history.push(ActivityRecord::scored(99, 1, "chat", Category::Social, None, false, now));
        assert!(BadgeRule::SocialButterfly.evaluate(&ctx(&trigger, &history, None, now)).unwrap());
        assert!(!BadgeRule::HealthHero.evaluate(&ctx(&trigger, &history, None, now)).unwrap());
        assert!(!BadgeRule::CareerChampion.evaluate(&ctx(&trigger, &history, None, now)).unwrap());
    }

    #[test]
    fn evaluator_awards_once_and_skips_owned() {
        let catalog = BadgeCatalog::load_from_static();
        let registry = BadgeRegistry::standard();
        let now = wednesday(23);
        let first = activity(1, Category::Career, 30, now);
        let history = [first.clone()];
        let mut earned = EarnedBadges::default();

        let awarded = registry.evaluate(&mut earned, &catalog, &ctx(&first, &history, None, now));
        let names: Vec<_> = awarded.iter().map(|b| b.badge.name.as_str()).collect();
        assert_eq!(names, ["Night Owl", "First Steps"]);
        assert_eq!(earned.len(), 2);

        let later = now + Duration::hours(1);
        let again = registry.evaluate(&mut earned, &catalog, &ctx(&first, &history, None, later));
        assert!(again.is_empty());
        assert_eq!(earned.len(), 2);
        assert_eq!(earned.earned_at("Night Owl"), Some(now));
        assert!(!earned.insert("Night Owl", later));
    }

    #[derive(Debug, Clone, Copy)]
    enum Probe {
        Fails(&'static str),
        Holds(&'static str),
    }

    impl BadgePredicate for Probe {
        fn badge_name(&self) -> &str {
            match self {
                Self::Fails(name) | Self::Holds(name) => name,
            }
        }

        fn evaluate(&self, _ctx: &BadgeContext<'_>) -> Result<bool, BadgeCheckError> {
            match self {
                Self::Fails(_) => Err(BadgeCheckError::InvalidLocalHour(99)),
                Self::Holds(_) => Ok(true),
            }
        }
    }

    #[test]
    fn failing_rule_does_not_block_others() {
        let catalog = BadgeCatalog::load_from_static();
        let registry = BadgeRegistry::from_rules(vec![
            Probe::Holds("Centurion"),
            Probe::Fails("Night Owl"),
            Probe::Holds("Early Bird"),
            Probe::Holds("Not In Catalog"),
        ]);
        let now = wednesday(12);
        let first = activity(1, Category::Career, 30, now);
        let history = [first.clone()];
        let mut earned = EarnedBadges::default();
        let awarded = registry.evaluate(&mut earned, &catalog, &ctx(&first, &history, None, now));
        let names: Vec<_> = awarded.iter().map(|b| b.badge.name.as_str()).collect();
        assert_eq!(names, ["Centurion", "Early Bird"]);
        assert!(!earned.contains("Night Owl"));
    }

    #[test]
    fn invalid_local_hour_is_reported_as_error() {
        let now = wednesday(12);
        let first = activity(1, Category::Career, 30, now);
        let history = [first.clone()];
        assert_eq!(
            BadgeRule::NightOwl.evaluate(&ctx(&first, &history, Some(24), now)),
            Err(BadgeCheckError::InvalidLocalHour(24))
        );
    }
}
