//! Replay of recorded activity logs against a fresh engine.
use anyhow::Context;
use chrono::{DateTime, Utc};
use focusflow_engine::time::local_hour;
use focusflow_engine::{
    ActivityEdit, ActivityRecord, CallContext, Category, CollectionSummary, Goal, GoalProgress,
    LeisureProjection, LevelProgress, LootError, Profile, ProgressionEngine, ProgressionState,
    RngStreams, StaticCatalogs, Streaks,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::common::snapshot_digest;
use crate::logic::memory::MemoryStorage;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay log {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed replay log")]
    Parse(#[from] serde_json::Error),
    #[error("replay log has no events")]
    Empty,
}

const fn default_owner() -> u64 {
    1
}

/// A recorded session: who, where, and what happened in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    #[serde(default = "default_owner")]
    pub owner_id: u64,
    #[serde(default)]
    pub tz_offset_minutes: i32,
    /// Seed for chest draws; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub daily_distraction_allowance: Option<u32>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    pub events: Vec<ReplayEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Activity {
        at: DateTime<Utc>,
        #[serde(default)]
        name: String,
        category: Category,
        #[serde(default)]
        duration_minutes: Option<u32>,
        #[serde(default)]
        focus: bool,
    },
    /// Edit of the n-th logged activity (1-based).
    Edit {
        at: DateTime<Utc>,
        activity: u64,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        duration_minutes: Option<u32>,
        #[serde(default)]
        category: Option<Category>,
    },
    Distraction {
        at: DateTime<Utc>,
        minutes: u32,
    },
    OpenChest {
        at: DateTime<Utc>,
    },
    Repair {
        at: DateTime<Utc>,
        item: String,
    },
}

impl ReplayEvent {
    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Activity { at, .. }
            | Self::Edit { at, .. }
            | Self::Distraction { at, .. }
            | Self::OpenChest { at }
            | Self::Repair { at, .. } => *at,
        }
    }
}

impl ReplayLog {
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or holds no events.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let log: Self = serde_json::from_str(json)?;
        if log.events.is_empty() {
            return Err(ReplayError::Empty);
        }
        Ok(log)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Final state and per-event trail of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub owner_id: u64,
    pub seed: Option<u64>,
    pub events_applied: usize,
    /// Events the engine refused, with the reason.
    pub rejected: Vec<String>,
    pub steps: Vec<String>,
    pub level: LevelProgress,
    pub badges: Vec<String>,
    pub collection: CollectionSummary,
    pub streaks: Streaks,
    pub goals: Vec<GoalProgress>,
    pub projection: LeisureProjection,
    pub digest: u64,
}

/// Apply every event of `log` in order.
///
/// Loot errors (no credits, nothing to repair) are recorded and skipped.
///
/// # Errors
///
/// Returns an error if the log is empty or the engine fails.
pub fn replay(log: &ReplayLog) -> anyhow::Result<ReplayReport> {
    let last_at = log.events.last().map(ReplayEvent::at).ok_or(ReplayError::Empty)?;

    let mut state = ProgressionState::default();
    state.birth_year = log.birth_year;
    if let Some(allowance) = log.daily_distraction_allowance {
        state.daily_distraction_allowance = allowance;
    }
    let goals = log
        .goals
        .iter()
        .cloned()
        .map(|mut goal| {
            goal.owner_id = log.owner_id;
            goal
        })
        .collect();
    let storage = MemoryStorage::new(goals).with_profile(log.owner_id, Profile::new(state));
    let mut engine = ProgressionEngine::new(StaticCatalogs, storage);
    let streams = log
        .seed
        .map_or_else(RngStreams::from_entropy, RngStreams::from_user_seed);

    let tz = log.tz_offset_minutes;
    let call = |now| CallContext {
        owner_id: log.owner_id,
        now,
        tz_offset_minutes: tz,
    };
    let mut next_id = 1;
    let mut steps = Vec::with_capacity(log.events.len());
    let mut rejected = Vec::new();

    for (index, event) in log.events.iter().enumerate() {
        let step = index + 1;
        match event {
            ReplayEvent::Activity {
                at,
                name,
                category,
                duration_minutes,
                focus,
            } => {
                let activity = ActivityRecord::scored(
                    next_id,
                    log.owner_id,
                    name.as_str(),
                    *category,
                    *duration_minutes,
                    *focus,
                    *at,
                );
                next_id += 1;
                let outcome = engine
                    .log_activity(&activity, *at, tz, Some(local_hour(*at, tz)))
                    .with_context(|| format!("event {step}: logging activity"))?;
                steps.push(format!(
                    "{step}: {} {} ({:+.2}) -> +{} xp, level {}, credits {}",
                    category,
                    activity.name,
                    outcome.productivity_score,
                    outcome.xp.xp_awarded,
                    outcome.level,
                    outcome.chest_credits
                ));
                for badge in &outcome.new_badges {
                    steps.push(format!("{step}: badge {}", badge.badge.name));
                }
                for adjustment in outcome.goal_adjustments.iter() {
                    steps.push(format!(
                        "{step}: {} {} ({:+} xp)",
                        adjustment.goal_title,
                        adjustment.reason.describe(),
                        adjustment.points
                    ));
                }
                if let Some(decay) = outcome.decay {
                    steps.push(format!("{step}: {}", decay.message));
                }
            }
            ReplayEvent::Edit {
                activity,
                name,
                duration_minutes,
                category,
                ..
            } => {
                let edit = ActivityEdit {
                    name: name.clone(),
                    duration_minutes: *duration_minutes,
                    category: *category,
                };
                match engine.edit_activity(log.owner_id, *activity, &edit)? {
                    Some(edited) => steps.push(format!(
                        "{step}: edited activity {activity}, score {:.2}",
                        edited.productivity_score
                    )),
                    None => rejected.push(format!("{step}: no activity {activity} to edit")),
                }
            }
            ReplayEvent::Distraction { at, minutes } => {
                let (status, decay) = engine.record_distraction(call(*at), *minutes)?;
                steps.push(format!(
                    "{step}: distraction {}/{} min {:?}",
                    status.minutes, status.allowance, status.status
                ));
                if let Some(decay) = decay {
                    steps.push(format!("{step}: {}", decay.message));
                }
            }
            ReplayEvent::OpenChest { .. } => {
                match engine.open_chest(log.owner_id, &mut *streams.loot()) {
                    Ok(opened) => steps.push(format!(
                        "{step}: chest -> {} ({}){}",
                        opened.item.name,
                        opened.rarity,
                        if opened.is_new { " new" } else { "" }
                    )),
                    Err(err) => rejected.push(loot_rejection(step, err)?),
                }
            }
            ReplayEvent::Repair { item, .. } => match engine.repair_item(log.owner_id, item) {
                Ok(receipt) => steps.push(format!("{step}: {}", receipt.message)),
                Err(err) => rejected.push(loot_rejection(step, err)?),
            },
        }
    }

    let profile = engine
        .storage()
        .profile(log.owner_id)
        .context("replayed profile missing")?;
    let final_call = call(last_at);
    Ok(ReplayReport {
        owner_id: log.owner_id,
        seed: log.seed,
        events_applied: log.events.len() - rejected.len(),
        rejected,
        steps,
        level: engine.level_progress(log.owner_id)?,
        badges: profile.badges.iter().map(|(name, _)| name.to_string()).collect(),
        collection: engine.collection_summary(log.owner_id)?,
        streaks: engine.streaks(final_call)?,
        goals: engine.goal_progress(final_call)?,
        projection: engine.leisure_projection(final_call)?,
        digest: snapshot_digest(&profile),
    })
}

fn loot_rejection(step: usize, err: anyhow::Error) -> anyhow::Result<String> {
    match err.downcast::<LootError>() {
        Ok(loot) => Ok(format!("{step}: {loot}")),
        Err(other) => Err(other),
    }
}
