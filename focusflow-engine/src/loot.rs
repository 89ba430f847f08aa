//! Chest credits, weighted chest draws, item decay and repair.
use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::activity::{ActivityRecord, Category};
use crate::config::{DistractionCfg, EligibilityCfg};
use crate::constants::{
    CHEST_COST, LOG_TARGET_LOOT, RARITY_WEIGHT_COMMON, RARITY_WEIGHT_LEGENDARY,
    RARITY_WEIGHT_MYTHIC, RARITY_WEIGHT_RARE, REPAIR_COST,
};
use crate::numbers::{minutes_to_hours, round_to};
use crate::state::ProgressionState;

const DEFAULT_ITEM_DATA: &str = include_str!("../assets/items.json");

/// Collectible rarity tier, ordered from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
    Mythic,
}

impl Rarity {
    pub const ALL: [Self; 4] = [Self::Common, Self::Rare, Self::Legendary, Self::Mythic];

    /// Order in which decay looks for a victim.
    pub const DECAY_PRIORITY: [Self; 4] = [Self::Mythic, Self::Legendary, Self::Rare, Self::Common];

    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Common => RARITY_WEIGHT_COMMON,
            Self::Rare => RARITY_WEIGHT_RARE,
            Self::Legendary => RARITY_WEIGHT_LEGENDARY,
            Self::Mythic => RARITY_WEIGHT_MYTHIC,
        }
    }

    #[must_use]
    pub fn draw_table() -> [(Self, u32); 4] {
        Self::ALL.map(|rarity| (rarity, rarity.weight()))
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Rare => "Rare",
            Self::Legendary => "Legendary",
            Self::Mythic => "Mythic",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub name: String,
    pub rarity: Rarity,
    #[serde(default)]
    pub icon_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ItemCatalog {
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
}

impl ItemCatalog {
    /// Load the catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into an item catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_ITEM_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ItemDefinition> {
        self.items.iter().find(|item| item.name == name)
    }

    #[must_use]
    pub fn of_rarity(&self, rarity: Rarity) -> Vec<&ItemDefinition> {
        self.items.iter().filter(|item| item.rarity == rarity).collect()
    }
}

/// A user's stack of one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedItem {
    pub name: String,
    pub rarity: Rarity,
    pub count: u32,
    #[serde(default)]
    pub broken: bool,
}

/// Items a user owns, keyed by item name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(BTreeMap<String, OwnedItem>);

impl Collection {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OwnedItem> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OwnedItem> {
        self.0.values()
    }

    #[must_use]
    pub fn broken_count(&self) -> usize {
        self.0.values().filter(|owned| owned.broken).count()
    }

    /// Add one copy of `item`. Returns whether it was new and the new count.
    pub fn grant(&mut self, item: &ItemDefinition) -> (bool, u32) {
        if let Some(owned) = self.0.get_mut(&item.name) {
            owned.count = owned.count.saturating_add(1);
            return (false, owned.count);
        }
        self.0.insert(
            item.name.clone(),
            OwnedItem {
                name: item.name.clone(),
                rarity: item.rarity,
                count: 1,
                broken: false,
            },
        );
        (true, 1)
    }

    fn first_unbroken(&mut self, rarity: Rarity) -> Option<&mut OwnedItem> {
        self.0
            .values_mut()
            .find(|owned| owned.rarity == rarity && !owned.broken)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LootError {
    #[error("not enough credits: need {required}, have {available}")]
    InsufficientCredits { required: i64, available: i64 },
    #[error("the item catalog is empty")]
    EmptyCatalog,
    #[error("item {0} is not in the collection")]
    ItemNotOwned(String),
    #[error("item {0} is not broken")]
    ItemNotBroken(String),
}

/// Weighted random selection from a list of options.
pub fn weighted_pick<T, R>(options: &[(T, u32)], rng: &mut R) -> Option<T>
where
    R: Rng + ?Sized,
    T: Clone,
{
    let total_weight: u32 = options.iter().map(|(_, weight)| *weight).sum();
    if total_weight == 0 {
        return None;
    }

    let roll = rng.gen_range(0..total_weight);
    let mut current_weight = 0;
    for (item, weight) in options {
        current_weight += weight;
        if roll < current_weight {
            return Some(item.clone());
        }
    }
    options.first().map(|(item, _)| item.clone())
}

/// Result of opening a chest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestOpen {
    pub item: ItemDefinition,
    pub is_new: bool,
    pub count: u32,
    /// Tier that was drawn.
    pub rarity: Rarity,
}

/// Spend one credit and draw an item.
///
/// # Errors
///
/// `InsufficientCredits` when no credit is available (nothing changes) and
/// `EmptyCatalog` when there is nothing to draw (the credit is refunded).
pub fn open_chest<R: Rng + ?Sized>(
    state: &mut ProgressionState,
    collection: &mut Collection,
    catalog: &ItemCatalog,
    rng: &mut R,
) -> Result<ChestOpen, LootError> {
    let available = state.chest_credits();
    if available < CHEST_COST {
        return Err(LootError::InsufficientCredits {
            required: CHEST_COST,
            available,
        });
    }
    state.adjust_credits(-CHEST_COST);

    let rarity = weighted_pick(&Rarity::draw_table(), rng).unwrap_or(Rarity::Common);
    let mut pool = catalog.of_rarity(rarity);
    if pool.is_empty() {
        pool = catalog.items.iter().collect();
    }
    let Some(item) = pool.choose(rng).copied() else {
        state.adjust_credits(CHEST_COST);
        log::warn!(target: LOG_TARGET_LOOT, "chest opened against an empty catalog; credit refunded");
        return Err(LootError::EmptyCatalog);
    };

    let (is_new, count) = collection.grant(item);
    log::debug!(
        target: LOG_TARGET_LOOT,
        "chest drew {rarity} tier: {} (count {count})",
        item.name
    );
    Ok(ChestOpen {
        item: item.clone(),
        is_new,
        count,
        rarity,
    })
}

/// Advisory check of today's productive work against the chest requirement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChestEligibility {
    pub eligible: bool,
    pub productive_hours: f64,
    pub required_hours: f64,
    pub remaining_hours: f64,
}

/// Career and Health minutes on the local day `today` decide eligibility.
#[must_use]
pub fn chest_eligibility(
    history: &[ActivityRecord],
    today: NaiveDate,
    tz_offset_minutes: i32,
    cfg: &EligibilityCfg,
) -> ChestEligibility {
    let productive_minutes: u64 = history
        .iter()
        .filter(|a| matches!(a.category, Category::Career | Category::Health))
        .filter(|a| a.local_date(tz_offset_minutes) == today)
        .map(|a| u64::from(a.minutes()))
        .sum();
    let required = u64::from(cfg.productive_minutes_required);
    let productive_hours = minutes_to_hours(productive_minutes);
    let required_hours = minutes_to_hours(required);
    ChestEligibility {
        eligible: productive_minutes >= required,
        productive_hours: round_to(productive_hours, 1),
        required_hours,
        remaining_hours: round_to((required_hours - productive_hours).max(0.0), 1),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayReport {
    pub broken: bool,
    pub item_name: String,
    pub rarity: Rarity,
    pub message: String,
}

/// Break the rarest unbroken item when today's distraction is over allowance.
pub fn check_decay(
    state: &ProgressionState,
    collection: &mut Collection,
    today: NaiveDate,
) -> Option<DecayReport> {
    if !state.over_distraction_allowance(today) {
        return None;
    }
    let victim = Rarity::DECAY_PRIORITY
        .into_iter()
        .find_map(|rarity| collection.first_unbroken(rarity).map(|owned| owned.name.clone()))?;
    let owned = collection.0.get_mut(&victim)?;
    owned.broken = true;
    log::info!(
        target: LOG_TARGET_LOOT,
        "distraction {} > {} min: {} broke",
        state.distraction_minutes_on(today),
        state.daily_distraction_allowance,
        owned.name
    );
    Some(DecayReport {
        broken: true,
        item_name: owned.name.clone(),
        rarity: owned.rarity,
        message: format!("Limit Exceeded: Your {} has broken!", owned.name),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReceipt {
    pub item_name: String,
    pub credits_spent: i64,
    pub remaining_credits: i64,
    pub message: String,
}

/// Spend credits to clear an item's broken flag.
///
/// # Errors
///
/// Fails without mutating anything when the item is not owned, is not broken,
/// or the user cannot afford the repair.
pub fn repair(
    state: &mut ProgressionState,
    collection: &mut Collection,
    item_name: &str,
) -> Result<RepairReceipt, LootError> {
    let owned = collection
        .0
        .get_mut(item_name)
        .ok_or_else(|| LootError::ItemNotOwned(item_name.to_string()))?;
    if !owned.broken {
        return Err(LootError::ItemNotBroken(item_name.to_string()));
    }
    let available = state.chest_credits();
    if available < REPAIR_COST {
        return Err(LootError::InsufficientCredits {
            required: REPAIR_COST,
            available,
        });
    }
    let remaining_credits = state.adjust_credits(-REPAIR_COST);
    owned.broken = false;
    log::debug!(target: LOG_TARGET_LOOT, "repaired {item_name}, {remaining_credits} credits left");
    Ok(RepairReceipt {
        item_name: item_name.to_string(),
        credits_spent: REPAIR_COST,
        remaining_credits,
        message: format!("{item_name} has been repaired!"),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DistractionLevel {
    Ok,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistractionStatus {
    pub minutes: u32,
    pub allowance: u32,
    pub status: DistractionLevel,
}

/// Add distraction minutes for the local day, resetting the counter when the
/// day has rolled over.
pub fn record_distraction(
    state: &mut ProgressionState,
    minutes: u32,
    today: NaiveDate,
    cfg: &DistractionCfg,
) -> DistractionStatus {
    if state.distraction_date != Some(today) {
        state.today_distraction_minutes = 0;
        state.distraction_date = Some(today);
    }
    state.today_distraction_minutes = state.today_distraction_minutes.saturating_add(minutes);
    distraction_status(state, today, cfg)
}

#[must_use]
pub fn distraction_status(
    state: &ProgressionState,
    today: NaiveDate,
    cfg: &DistractionCfg,
) -> DistractionStatus {
    let minutes = state.distraction_minutes_on(today);
    let allowance = state.daily_distraction_allowance;
    let status = if minutes > allowance {
        DistractionLevel::Critical
    } else if f64::from(minutes) >= f64::from(allowance) * cfg.warning_ratio {
        DistractionLevel::Warning
    } else {
        DistractionLevel::Ok
    };
    DistractionStatus {
        minutes,
        allowance,
        status,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub name: String,
    pub rarity: Rarity,
    pub icon_name: String,
    pub owned: bool,
    pub count: u32,
    pub broken: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub owned_count: usize,
    pub broken_count: usize,
    pub catalog_size: usize,
    pub credits: i64,
    pub entries: Vec<CollectionEntry>,
}

#[must_use]
pub fn collection_summary(
    state: &ProgressionState,
    collection: &Collection,
    catalog: &ItemCatalog,
) -> CollectionSummary {
    let entries = catalog
        .items
        .iter()
        .map(|item| {
            let owned = collection.get(&item.name);
            CollectionEntry {
                name: item.name.clone(),
                rarity: item.rarity,
                icon_name: item.icon_name.clone(),
                owned: owned.is_some(),
                count: owned.map_or(0, |o| o.count),
                broken: owned.is_some_and(|o| o.broken),
            }
        })
        .collect();
    CollectionSummary {
        owned_count: collection.len(),
        broken_count: collection.broken_count(),
        catalog_size: catalog.len(),
        credits: state.chest_credits(),
        entries,
    }
}
