//! Output stage rendering (SPEC_FULL.md §4.G "Output", §6.2): a JSON shape
//! for machine/agent consumption and a human shape using `colored`,
//! grounded on the corpus's `rule_tester.rs` use of `colored::Colorize`
//! for pass/fail glyphs. Format auto-detection prefers JSON whenever
//! stdout isn't a terminal, since that's the situation an AI agent or a
//! CI log collector is in.

use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::pipeline::PipelineOutcome;
use crate::violation::{Severity, SuggestedFix, Violation};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Human,
    Json,
}

/// Environment variable name fragments observed on AI coding agents'
/// subprocess invocations; matching is a heuristic, not a closed list.
const AGENT_ENV_MARKERS: &[&str] = &["AGENT", "CLAUDECODE", "CURSOR_TRACE_ID"];

fn invoked_by_agent() -> bool {
    std::env::vars().any(|(key, _)| {
        let upper = key.to_ascii_uppercase();
        AGENT_ENV_MARKERS.iter().any(|marker| upper.contains(marker))
    })
}

/// `None` defers to environment detection: an AI agent's subprocess
/// invocation or a non-terminal stdout (a pipe, a file redirect) gets
/// JSON; an interactive terminal gets the human shape.
pub fn detect_format(explicit: Option<ReportFormat>) -> ReportFormat {
    explicit.unwrap_or_else(|| {
        if invoked_by_agent() || !std::io::stdout().is_terminal() {
            ReportFormat::Json
        } else {
            ReportFormat::Human
        }
    })
}

#[derive(Serialize)]
struct JsonSuggestedFix {
    description: String,
    replacement: String,
}

impl From<&SuggestedFix> for JsonSuggestedFix {
    fn from(f: &SuggestedFix) -> Self {
        Self { description: f.description.clone(), replacement: f.replacement.clone() }
    }
}

#[derive(Serialize)]
struct JsonViolation {
    rule_id: String,
    severity: String,
    message: String,
    line: u32,
    column: u32,
    start: u32,
    end: u32,
    suggested_fixes: Vec<JsonSuggestedFix>,
}

impl From<&Violation> for JsonViolation {
    fn from(v: &Violation) -> Self {
        Self {
            rule_id: v.rule_id.clone(),
            severity: severity_label(v.severity).to_string(),
            message: v.message.clone(),
            line: v.line,
            column: v.column,
            start: v.start,
            end: v.end,
            suggested_fixes: v.suggested_fixes.iter().map(JsonSuggestedFix::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonFileReport {
    file: PathBuf,
    violations: Vec<JsonViolation>,
    counts: HashMap<String, usize>,
    changed: bool,
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

fn counts_by_rule(violations: &[Violation]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for v in violations {
        *counts.entry(v.rule_id.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn render_file_report(outcome: &PipelineOutcome, format: ReportFormat) -> String {
    match format {
        ReportFormat::Json => render_json(outcome),
        ReportFormat::Human => render_human(outcome),
    }
}

fn render_json(outcome: &PipelineOutcome) -> String {
    let report = JsonFileReport {
        file: outcome.path.clone(),
        violations: outcome.violations.iter().map(JsonViolation::from).collect(),
        counts: counts_by_rule(&outcome.violations),
        changed: outcome.format.as_ref().is_some_and(|f| f.changed),
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

fn render_human(outcome: &PipelineOutcome) -> String {
    let mut lines = Vec::with_capacity(outcome.violations.len());
    for v in &outcome.violations {
        let location = format!("{}:{}:{}", outcome.path.display(), v.line, v.column);
        let severity = match v.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".cyan().bold(),
        };
        lines.push(format!("{location} {severity} [{}] {}", v.rule_id, v.message));
    }
    if lines.is_empty() {
        format!("{} {}", "✔".green(), outcome.path.display())
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StageLog;
    use std::path::Path;

    fn outcome_with(violations: Vec<Violation>) -> PipelineOutcome {
        PipelineOutcome {
            path: Path::new("Foo.java").to_path_buf(),
            violations,
            format: None,
            stages: StageLog { read: true, parse: true, analyze: true, format: false },
            overall_success: true,
        }
    }

    #[test]
    fn json_report_includes_counts() {
        let violation = Violation::builder()
            .rule_id("indentation")
            .severity(Severity::Warning)
            .message("bad indent")
            .file_path(PathBuf::from("Foo.java"))
            .start(0u32)
            .end(1u32)
            .line(1u32)
            .column(1u32)
            .build()
            .unwrap();
        let rendered = render_json(&outcome_with(vec![violation]));
        assert!(rendered.contains("\"indentation\": 1") || rendered.contains("\"indentation\":1"));
    }

    #[test]
    fn human_report_is_clean_checkmark_when_no_violations() {
        let rendered = render_human(&outcome_with(Vec::new()));
        assert!(rendered.contains("Foo.java"));
    }
}
