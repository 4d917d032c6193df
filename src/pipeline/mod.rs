//! The per-file pipeline (SPEC_FULL.md §4.G): Read → Parse → Analyze →
//! Format → Output, each stage consuming the accumulated prior outputs
//! and producing `Success`/`Skipped`/`Failure`. Grounded on the corpus's
//! `run`/`run_per_file` split (`lib.rs`): one `#[instrument]`-annotated
//! entry point per file, with `tracing` spans marking stage boundaries
//! rather than a hand-rolled timing harness.
//!
//! `Output` (rendering the violation/format report) is left to the
//! `report` module rather than folded into `Pipeline::run_file`, since its
//! shape (JSON vs. human) is a batch/CLI-level choice, not per-file state;
//! `run_file` covers Read through Format.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::instrument;

use crate::arena::{Arena, NodeId};
use crate::errors::StylerError;
use crate::parser::{self, ParseOutcome};
use crate::position_index::PositionIndex;
use crate::rule::{RuleConfiguration, RuleEngine, TypeResolutionConfig};
use crate::security::{Deadline, SecurityConfig};
use crate::violation::Violation;

/// A stage's outcome: normal output, a deliberate skip (not a failure), or
/// a typed failure that the recovery strategy decides how to handle.
pub enum StageOutcome<T> {
    Success(T),
    Skipped(String),
    Failure(StylerError),
}

#[derive(Clone, Debug)]
pub enum RecoveryStrategy {
    FailFast,
    Retry { attempts: u32, backoff: Duration },
    Skip,
}

impl Default for RecoveryStrategy {
    fn default() -> Self {
        RecoveryStrategy::FailFast
    }
}

pub struct Source {
    pub path: PathBuf,
    pub text: String,
}

pub struct Parsed {
    pub arena: Arena,
    pub root: NodeId,
    pub position_index: PositionIndex,
}

pub struct FormatResult {
    pub new_source: String,
    pub changed: bool,
    pub skipped_rules: Vec<&'static str>,
}

/// What each stage actually did, kept for diagnostics (§9: "the pipeline
/// records each stage's result").
pub struct StageLog {
    pub read: bool,
    pub parse: bool,
    pub analyze: bool,
    pub format: bool,
}

pub struct PipelineOutcome {
    pub path: PathBuf,
    pub violations: Vec<Violation>,
    pub format: Option<FormatResult>,
    pub stages: StageLog,
    pub overall_success: bool,
}

pub struct Pipeline {
    pub rule_engine: RuleEngine,
    pub security: SecurityConfig,
    pub type_resolution: TypeResolutionConfig,
    pub recovery: RecoveryStrategy,
    pub validation_only: bool,
}

impl Pipeline {
    pub fn new(
        rule_engine: RuleEngine,
        security: SecurityConfig,
        type_resolution: TypeResolutionConfig,
        recovery: RecoveryStrategy,
        validation_only: bool,
    ) -> Self {
        Self { rule_engine, security, type_resolution, recovery, validation_only }
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn run_file(&self, path: &Path, configurations: &[RuleConfiguration]) -> PipelineOutcome {
        let mut stages = StageLog { read: false, parse: false, analyze: false, format: false };

        let source = match self.read_stage(path) {
            StageOutcome::Success(s) => {
                stages.read = true;
                s
            }
            StageOutcome::Skipped(_) | StageOutcome::Failure(_) => {
                return PipelineOutcome {
                    path: path.to_path_buf(),
                    violations: Vec::new(),
                    format: None,
                    stages,
                    overall_success: false,
                };
            }
        };

        let deadline = Deadline::starting_now(self.security.wall_clock_budget);
        let parsed = match self.parse_stage(&source, &deadline) {
            StageOutcome::Success(p) => {
                stages.parse = true;
                p
            }
            StageOutcome::Skipped(_) => {
                return PipelineOutcome {
                    path: path.to_path_buf(),
                    violations: Vec::new(),
                    format: None,
                    stages,
                    overall_success: true,
                };
            }
            StageOutcome::Failure(_) => {
                return PipelineOutcome {
                    path: path.to_path_buf(),
                    violations: Vec::new(),
                    format: None,
                    stages,
                    overall_success: false,
                };
            }
        };

        let violations = match self.analyze_stage(&source, &parsed, &deadline, configurations) {
            StageOutcome::Success(v) => {
                stages.analyze = true;
                v
            }
            StageOutcome::Skipped(_) => Vec::new(),
            StageOutcome::Failure(_) => {
                return PipelineOutcome {
                    path: path.to_path_buf(),
                    violations: Vec::new(),
                    format: None,
                    stages,
                    overall_success: false,
                };
            }
        };

        let format = if self.validation_only {
            None
        } else {
            match self.format_stage(&source, configurations) {
                StageOutcome::Success(f) => {
                    stages.format = true;
                    Some(f)
                }
                StageOutcome::Skipped(_) => None,
                StageOutcome::Failure(_) => {
                    return PipelineOutcome {
                        path: path.to_path_buf(),
                        violations,
                        format: None,
                        stages,
                        overall_success: false,
                    };
                }
            }
        };

        PipelineOutcome { path: path.to_path_buf(), violations, format, stages, overall_success: true }
    }

    #[instrument(level = "debug", skip_all)]
    fn read_stage(&self, path: &Path) -> StageOutcome<Source> {
        let attempts = match self.recovery {
            RecoveryStrategy::Retry { attempts, .. } => attempts.max(1),
            _ => 1,
        };
        let backoff = match self.recovery {
            RecoveryStrategy::Retry { backoff, .. } => backoff,
            _ => Duration::ZERO,
        };

        let mut last_err = None;
        for attempt in 0..attempts {
            match fs::read_to_string(path) {
                Ok(text) => return StageOutcome::Success(Source { path: path.to_path_buf(), text }),
                Err(source) => {
                    last_err = Some(source);
                    if attempt + 1 < attempts {
                        std::thread::sleep(backoff);
                    }
                }
            }
        }
        StageOutcome::Failure(StylerError::Io {
            path: path.to_path_buf(),
            source: last_err.expect("at least one read attempt was made"),
        })
    }

    #[instrument(level = "debug", skip_all)]
    fn parse_stage(&self, source: &Source, deadline: &Deadline) -> StageOutcome<Parsed> {
        let (arena, outcome) = parser::parse(&source.text, &self.security, deadline);
        match outcome {
            ParseOutcome::Success { root } => {
                let position_index = PositionIndex::build(&arena, root, &source.text);
                StageOutcome::Success(Parsed { arena, root, position_index })
            }
            ParseOutcome::Failure { errors, root: _ } => {
                if matches!(self.recovery, RecoveryStrategy::Skip) {
                    StageOutcome::Skipped(format!("parse failed with {} error(s)", errors.len()))
                } else {
                    StageOutcome::Failure(StylerError::Parse { path: source.path.clone(), errors })
                }
            }
        }
    }

    #[instrument(level = "debug", skip_all)]
    fn analyze_stage(
        &self,
        source: &Source,
        parsed: &Parsed,
        deadline: &Deadline,
        configurations: &[RuleConfiguration],
    ) -> StageOutcome<Vec<Violation>> {
        let ctx = crate::rule::TransformationContext::new(
            &parsed.arena,
            parsed.root,
            &source.text,
            &source.path,
            &parsed.position_index,
            &self.security,
            deadline,
            &self.type_resolution,
        );
        StageOutcome::Success(self.rule_engine.analyze(&ctx, configurations))
    }

    #[instrument(level = "debug", skip_all)]
    fn format_stage(&self, source: &Source, configurations: &[RuleConfiguration]) -> StageOutcome<FormatResult> {
        let outcome = self.rule_engine.format(
            &source.text,
            &source.path,
            &self.security,
            &self.type_resolution,
            configurations,
        );
        StageOutcome::Success(FormatResult {
            new_source: outcome.new_source,
            changed: outcome.changed,
            skipped_rules: outcome.skipped_rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleEngine;
    use std::io::Write;

    fn pipeline(validation_only: bool) -> Pipeline {
        Pipeline::new(
            RuleEngine::with_defaults(),
            SecurityConfig::default(),
            TypeResolutionConfig::default(),
            RecoveryStrategy::FailFast,
            validation_only,
        )
    }

    #[test]
    fn read_failure_short_circuits_remaining_stages() {
        let pipeline = pipeline(false);
        let outcome = pipeline.run_file(Path::new("/does/not/exist.java"), &[]);
        assert!(!outcome.overall_success);
        assert!(!outcome.stages.read);
    }

    #[test]
    fn clean_file_runs_all_stages() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "class Foo {{\n    void bar() {{\n    }}\n}}").unwrap();
        let pipeline = pipeline(false);
        let outcome = pipeline.run_file(file.path(), &[]);
        assert!(outcome.overall_success);
        assert!(outcome.stages.read && outcome.stages.parse && outcome.stages.analyze);
        assert!(outcome.format.is_some());
    }

    #[test]
    fn validation_only_skips_format_stage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "class Foo {{}}").unwrap();
        let pipeline = pipeline(true);
        let outcome = pipeline.run_file(file.path(), &[]);
        assert!(outcome.overall_success);
        assert!(!outcome.stages.format);
        assert!(outcome.format.is_none());
    }
}
