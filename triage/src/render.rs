//! Report rendering.
//!
//! Markdown for humans, JSON for machines. The Markdown layout: one section
//! per failing stage, one bullet per failing step with its single-line
//! summary, and the full excerpt folded into a `<details>` block so long
//! logs do not swamp the report.

use drone_triage_core::{FailureReport, StageOutcome};

/// Renders one build's failure report as Markdown.
pub fn render_markdown(report: &FailureReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "# Build {} — {} ({} on {})\n\n",
        report.build, report.status, report.event, report.source
    ));
    let counts = report.step_counts;
    out.push_str(&format!(
        "Steps: {} succeeded, {} failed, {} cancelled\n\n",
        counts.success, counts.failure, counts.cancelled
    ));

    if report.is_empty() {
        out.push_str("Nothing needed attention.\n");
        return out;
    }

    for stage in &report.stages {
        out.push_str(&format!("## {} — {}\n\n", stage.name, stage.status));

        match &stage.outcome {
            StageOutcome::TimedOut { elapsed_secs } => {
                out.push_str(&format!(
                    "Cancelled after {elapsed_secs}s, over the wall-clock budget; steps were not inspected.\n\n"
                ));
            }
            StageOutcome::Steps(steps) if steps.is_empty() => {
                out.push_str("Every step was skipped or cancelled.\n\n");
            }
            StageOutcome::Steps(steps) => {
                for step in steps {
                    out.push_str(&format!(
                        "- **{}** ({}) — {}\n",
                        step.name,
                        step.status,
                        step.outcome.summary()
                    ));
                }
                out.push('\n');

                for step in steps {
                    let detail = step.outcome.detail();
                    if detail.trim().is_empty() {
                        continue;
                    }
                    out.push_str(&format!(
                        "<details><summary>{}: full excerpt</summary>\n\n",
                        step.name
                    ));
                    out.push_str("```text\n");
                    out.push_str(detail.trim_end_matches('\n'));
                    out.push_str("\n```\n\n</details>\n\n");
                }
            }
        }
    }

    out
}

/// Renders one build's failure report as pretty JSON.
pub fn render_json(report: &FailureReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
