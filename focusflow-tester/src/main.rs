mod common;
mod logic;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use common::scenario::{catalog::catalog_entries, get_scenario, list_scenarios};
use common::split_csv;
use logic::{LogicTester, ReplayLog, ScenarioResult, resolve_seed_inputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "focusflow-tester", version)]
#[command(about = "Seeded simulation and replay harness for the FocusFlow progression engine")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; decimal, 0x-hex, or "random")
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Replay a recorded JSON event log instead of running scenarios
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    if let Some(path) = &args.replay {
        return run_replay(&args, path);
    }

    if args.report == ReportFormat::Console {
        announce_banner();
    }

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let results = run_logic_scenarios(&args, &scenarios, &seeds);

    write_reports(&args, &results, start_time.elapsed())?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎯 FocusFlow Progression Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        scenarios.extend(catalog_entries().iter().map(|entry| entry.key.to_string()));
    }
    scenarios
}

fn run_logic_scenarios(args: &Args, scenarios: &[String], seeds: &[u64]) -> Vec<ScenarioResult> {
    let console = args.report == ReportFormat::Console;
    if console {
        println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
        println!("{}", "-".repeat(30).yellow());
    }

    let tester = LogicTester::new(args.verbose);
    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            log::warn!("unknown scenario: {scenario_name}");
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

fn run_replay(args: &Args, path: &Path) -> Result<()> {
    let log = ReplayLog::load(path)?;
    let report = logic::replay(&log)
        .with_context(|| format!("replay of {} failed", path.display()))?;
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => logic::reports::generate_replay_json(&mut output_target, &report)?,
        ReportFormat::Markdown => {
            logic::reports::generate_replay_markdown(&mut output_target, &report)?;
        }
        ReportFormat::Console => {
            logic::reports::generate_replay_console(&mut output_target, &report)?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

fn write_reports(args: &Args, results: &[ScenarioResult], duration: Duration) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        ReportFormat::Markdown => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# FocusFlow Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        ReportFormat::Console => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: ReportFormat::Json,
            verbose: false,
            output: None,
            replay: None,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("focusflow-{}-{name}", std::process::id()))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 1337,
            passed,
            iterations_run: 1,
            successful_iterations: usize::from(passed),
            failures: Vec::new(),
            average_duration: Duration::ZERO,
            performance_data: Vec::new(),
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let scenarios = expand_scenarios("all");
        assert_eq!(scenarios.len(), catalog_entries().len());
        assert!(scenarios.contains(&"loot-distribution".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        assert_eq!(expand_scenarios("timezone, smoke"), ["timezone", "smoke"]);
    }

    #[test]
    fn run_logic_scenarios_skips_unknown_names() {
        let results = run_logic_scenarios(&base_args(), &["nope".to_string()], &[1]);
        assert!(results.is_empty());
    }

    #[test]
    fn run_logic_scenarios_runs_each_seed() {
        let results = run_logic_scenarios(&base_args(), &["smoke".to_string()], &[1, 2]);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_path("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("decay-repair"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_emits_empty_json_array() {
        let temp = temp_path("empty.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Duration::ZERO).unwrap();
        assert_eq!(std::fs::read_to_string(temp).unwrap().trim(), "[]");
    }

    #[test]
    fn write_reports_emits_parseable_json() {
        let temp = temp_path("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], Duration::ZERO).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(temp).unwrap()).unwrap();
        assert_eq!(parsed[0]["scenario_name"], "Smoke Test");
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_path("empty.md");
        let args = Args {
            report: ReportFormat::Markdown,
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Duration::ZERO).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No scenarios executed"));
    }

    #[test]
    fn write_reports_console_appends_total_time() {
        let temp = temp_path("report.txt");
        let args = Args {
            report: ReportFormat::Console,
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(false)], Duration::from_millis(5)).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Logic Test Results Summary"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn run_replay_writes_json_report() {
        let log_path = temp_path("replay-log.json");
        std::fs::write(
            &log_path,
            r#"{"seed": 3, "events": [
                {"type": "activity", "at": "2025-03-03T14:00:00Z", "name": "coding",
                 "category": "Career", "duration_minutes": 120}
            ]}"#,
        )
        .unwrap();
        let out = temp_path("replay-report.json");
        let args = Args {
            output: Some(out.clone()),
            ..base_args()
        };
        run_replay(&args, &log_path).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(parsed["events_applied"], 1);
        assert_eq!(parsed["collection"]["credits"], 1);
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
