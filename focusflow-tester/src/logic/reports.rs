use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::{ReplayReport, ScenarioResult};

fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    #[allow(clippy::cast_precision_loss)]
    let rate = passed as f64 / results.len() as f64 * 100.0;
    rate
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(writer, "Total scenario runs: {total_tests}")?;
    writeln!(writer, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(writer, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(writer, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            writer,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            writer,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(writer, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(writer, "   Failures:")?;
            for failure in &result.failures {
                writeln!(writer, "     • {}", failure.red())?;
            }
        }
        writeln!(writer)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(writer, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(writer, "{}", "=====================".yellow())?;
        writeln!(
            writer,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            writer,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, results)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(writer, "# FocusFlow Logic Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();

    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total scenario runs**: {total_tests}")?;
    writeln!(writer, "- **Passed**: {passed_tests}")?;
    writeln!(writer, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(writer, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(writer, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            writer,
            "### {} {} (seed {})\n",
            status, result.scenario_name, result.seed
        )?;
        writeln!(
            writer,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(writer, "- **Average time**: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(writer, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(writer, "  - {failure}")?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn generate_replay_console<W: Write + ?Sized>(
    writer: &mut W,
    report: &ReplayReport,
) -> Result<()> {
    writeln!(writer, "{}", "🔁 Replay Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "=================".cyan())?;
    writeln!(
        writer,
        "Events applied: {} (rejected {})",
        report.events_applied,
        report.rejected.len()
    )?;
    writeln!(
        writer,
        "Level {} | {} XP | {:.0}% to level {}",
        report.level.level, report.level.xp, report.level.progress_percent, report.level.next_level
    )?;
    writeln!(
        writer,
        "Credits: {} | Items: {}/{} ({} broken)",
        report.collection.credits,
        report.collection.owned_count,
        report.collection.catalog_size,
        report.collection.broken_count
    )?;
    writeln!(
        writer,
        "Streak: {} current, {} longest",
        report.streaks.current_streak, report.streaks.longest_streak
    )?;
    if !report.badges.is_empty() {
        writeln!(writer, "Badges: {}", report.badges.join(", ").green())?;
    }
    for goal in &report.goals {
        writeln!(
            writer,
            "Goal {}: {:.1} h, {:.0}% ({:?})",
            goal.title, goal.hours_logged, goal.progress_percent, goal.status
        )?;
    }
    writeln!(
        writer,
        "Leisure: {:.1} h today, {:.1}% of remaining life",
        report.projection.today_leisure_hours, report.projection.percent_of_life
    )?;
    writeln!(writer)?;
    for step in &report.steps {
        writeln!(writer, "  {step}")?;
    }
    for rejected in &report.rejected {
        writeln!(writer, "  {} {}", "rejected".yellow(), rejected)?;
    }
    writeln!(writer, "Digest: {:016x}", report.digest)?;
    Ok(())
}

pub fn generate_replay_json<W: Write + ?Sized>(writer: &mut W, report: &ReplayReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_replay_markdown<W: Write + ?Sized>(
    writer: &mut W,
    report: &ReplayReport,
) -> Result<()> {
    writeln!(writer, "# FocusFlow Replay\n")?;
    writeln!(writer, "| Metric | Value |")?;
    writeln!(writer, "| --- | --- |")?;
    writeln!(writer, "| Events applied | {} |", report.events_applied)?;
    writeln!(writer, "| Rejected | {} |", report.rejected.len())?;
    writeln!(writer, "| Level | {} |", report.level.level)?;
    writeln!(writer, "| XP | {} |", report.level.xp)?;
    writeln!(writer, "| Credits | {} |", report.collection.credits)?;
    writeln!(
        writer,
        "| Items | {}/{} |",
        report.collection.owned_count, report.collection.catalog_size
    )?;
    writeln!(writer, "| Longest streak | {} |", report.streaks.longest_streak)?;
    writeln!(writer, "| Digest | `{:016x}` |\n", report.digest)?;
    if !report.steps.is_empty() {
        writeln!(writer, "## Events\n")?;
        for step in &report.steps {
            writeln!(writer, "- {step}")?;
        }
        writeln!(writer)?;
    }
    if !report.rejected.is_empty() {
        writeln!(writer, "## Rejected\n")?;
        for rejected in &report.rejected {
            writeln!(writer, "- {rejected}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 1337,
            passed,
            iterations_run: 2,
            successful_iterations: usize::from(passed) * 2,
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 1: no activity was logged".to_string()]
            },
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
        }
    }

    fn render(
        f: impl Fn(&mut Vec<u8>, &[ScenarioResult]) -> Result<()>,
        results: &[ScenarioResult],
    ) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        f(&mut buffer, results).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_lists_failures_and_timings() {
        let text = render(
            |w, r| generate_console_report(w, r, Duration::from_secs(1)),
            &[sample_result(true), sample_result(false)],
        );
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("no activity was logged"));
        assert!(text.contains("Performance Summary"));
    }

    #[test]
    fn console_report_handles_no_results() {
        let text = render(
            |w, r| generate_console_report(w, r, Duration::ZERO),
            &[],
        );
        assert!(text.contains("Success rate: 0.0%"));
        assert!(!text.contains("Performance Summary"));
    }

    #[test]
    fn json_report_is_parseable() {
        let text = render(|w, r| generate_json_report(w, r), &[sample_result(true)]);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["scenario_name"], "Smoke Test");
        assert_eq!(parsed[0]["seed"], 1337);
    }

    #[test]
    fn markdown_report_has_heading_and_details() {
        let text = render(|w, r| generate_markdown_report(w, r), &[sample_result(false)]);
        assert!(text.starts_with("# FocusFlow Logic Test Results"));
        assert!(text.contains("### ❌ Smoke Test (seed 1337)"));
        assert!(text.contains("- **Failed**: 1"));
    }
}
