pub mod catalog;

use crate::logic::SimulationPlan;

/// A named simulation plan with its expectations.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = match name.to_lowercase().as_str() {
        "smoke" => "smoke",
        "credit-accrual" | "credits" => "credit-accrual",
        "limit-breach" | "limits" => "limit-breach",
        "target-bonus" | "targets" => "target-bonus",
        "loot-distribution" | "loot" => "loot-distribution",
        "decay-repair" | "decay" => "decay-repair",
        "determinism" | "deterministic" => "determinism",
        "timezone" | "tz" => "timezone",
        _ => return None,
    };
    catalog::find_catalog_scenario(key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog::catalog_entries()
        .iter()
        .map(|entry| (entry.key, entry.title))
        .collect()
}
