use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::simulation::{SimulationPlan, SimulationSummary, Simulator};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
}

impl LogicTester {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (mix: {} seed: {})",
                        scenario.name.bright_white(),
                        scenario.plan.mix.label(),
                        seed
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(&scenario.plan, seed, iterations);

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let simulator = Simulator::new(self.verbose);

        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = simulator
                .run_plan(plan, iteration_seed)
                .and_then(|summary| check_determinism(&simulator, plan, summary))
                .map_err(|err| format!("{err:#}"))
                .and_then(|summary| {
                    evaluate_expectations(plan, &summary).map_or(Ok(summary), Err)
                });

            match outcome {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);

                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) level:{} xp:{} chests:{} decays:{}",
                            i + 1,
                            iterations,
                            summary.level,
                            summary.xp,
                            summary.chests_opened,
                            summary.decays.len()
                        );
                    }
                }
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} (mix {}, seed {}): {}",
                        i + 1,
                        plan.mix.label(),
                        iteration_seed,
                        err
                    ));

                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            err.red()
                        );
                    }
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn check_determinism(
    simulator: &Simulator,
    plan: &SimulationPlan,
    summary: SimulationSummary,
) -> anyhow::Result<SimulationSummary> {
    if !plan.check_determinism {
        return Ok(summary);
    }
    let replay = simulator.run_plan(plan, summary.seed)?;
    anyhow::ensure!(
        replay.digest == summary.digest,
        "replay of seed {} diverged: digest {:016x} != {:016x}",
        summary.seed,
        replay.digest,
        summary.digest
    );
    Ok(summary)
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    plan.expectations
        .iter()
        .find_map(|expectation| expectation.evaluate(summary).err())
        .map(|err| summarize_failure(&err, summary))
}

fn summarize_failure(err: &anyhow::Error, summary: &SimulationSummary) -> String {
    let recent = summary
        .log
        .iter()
        .rev()
        .take(3)
        .map(String::as_str)
        .collect::<Vec<_>>();
    let context = if recent.is_empty() {
        "no events recorded".to_string()
    } else {
        recent.join(" | ")
    };
    format!(
        "{err} | level {} xp {} credits {} | {context}",
        summary.level, summary.xp, summary.credits_remaining
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u64>::deserialize(deserializer)?;
        Ok(millis.into_iter().map(Duration::from_millis).collect())
    }
}
