use focusflow_engine::{ActivityRecord, Goal, Profile, ProfileStorage};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;

/// In-process profile storage backing simulations and replays.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    profiles: RefCell<HashMap<u64, Profile>>,
    activities: RefCell<Vec<ActivityRecord>>,
    goals: Vec<Goal>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new(goals: Vec<Goal>) -> Self {
        Self {
            goals,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_profile(self, owner_id: u64, profile: Profile) -> Self {
        self.profiles.borrow_mut().insert(owner_id, profile);
        self
    }

    #[must_use]
    pub fn profile(&self, owner_id: u64) -> Option<Profile> {
        self.profiles.borrow().get(&owner_id).cloned()
    }

    #[must_use]
    pub fn activity_count(&self) -> usize {
        self.activities.borrow().len()
    }
}

impl ProfileStorage for MemoryStorage {
    type Error = Infallible;

    fn load_profile(&self, owner_id: u64) -> Result<Option<Profile>, Self::Error> {
        Ok(self.profile(owner_id))
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
        if let Some(existing) = activities.iter_mut().find(|a| a.id == activity.id) {
            *existing = activity.clone();
        } else {
            activities.push(activity.clone());
        }
        Ok(())
    }

    fn load_goals(&self, owner_id: u64) -> Result<Vec<Goal>, Self::Error> {
        Ok(self
            .goals
            .iter()
            .filter(|g| g.owner_id == owner_id)
            .cloned()
            .collect())
    }
}
