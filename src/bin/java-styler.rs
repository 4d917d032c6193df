use std::path::{Path, PathBuf};
use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;

use clap::Parser;
use java_styler_core::batch::{resolve_classpath_list, BatchConfig, BatchProcessor, CancellationToken};
use java_styler_core::config::{find_config_file, load_config_file, resolve_rule_configurations};
use java_styler_core::errors::ExitCode;
use java_styler_core::pipeline::{Pipeline, RecoveryStrategy};
use java_styler_core::report::{detect_format, render_file_report};
use java_styler_core::rule::{BuiltinRule, RuleConfiguration, RuleEngine, TypeResolutionConfig};
use java_styler_core::security::SecurityConfig;
use tracing_subscriber::EnvFilter;

/// java-styler: a Java source-code formatter and style linter.
#[derive(Parser)]
#[command(name = "java-styler", version)]
struct Args {
    /// One or more Java source files to process.
    files: Vec<PathBuf>,

    /// Classpath roots, platform path-separator-delimited.
    #[arg(long = "classpath", visible_alias = "cp")]
    classpath: Option<String>,

    /// Module-path roots, platform path-separator-delimited.
    #[arg(short = 'p', long = "module-path")]
    module_path: Option<String>,

    /// Run stages 1-3 only; never write anything back to disk.
    #[arg(long)]
    validation_only: bool,

    /// Write the formatted output back to disk when it differs.
    #[arg(long)]
    fix: bool,

    /// Explicit config file path, bypassing discovery.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity; repeatable.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn load_configurations(args: &Args) -> Result<Vec<RuleConfiguration>, ExitCode> {
    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(&std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))),
    };

    let Some(config_path) = config_path else {
        return Ok(Vec::new());
    };

    let parsed = load_config_file(&config_path).map_err(|e| {
        eprintln!("{e}");
        ExitCode::ConfigError
    })?;

    resolve_rule_configurations(&parsed.content, &BuiltinRule::all_default()).map_err(|e| {
        eprintln!("{e}");
        ExitCode::ConfigError
    })
}

#[tokio::main]
async fn main() -> ProcessExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.files.is_empty() {
        eprintln!("usage: java-styler [OPTIONS] <FILES>...");
        return exit_code(ExitCode::UsageError);
    }

    let configurations = match load_configurations(&args) {
        Ok(c) => c,
        Err(code) => return exit_code(code),
    };

    let type_resolution = TypeResolutionConfig {
        classpath: resolve_classpath_list(args.classpath.as_deref()),
        module_path: resolve_classpath_list(args.module_path.as_deref()),
    };

    let pipeline = Pipeline::new(
        RuleEngine::with_defaults(),
        SecurityConfig::default(),
        type_resolution,
        RecoveryStrategy::FailFast,
        args.validation_only,
    );

    let processor = BatchProcessor::new(pipeline, BatchConfig::default());
    let result = processor
        .run(&args.files, Arc::new(configurations), CancellationToken::new())
        .await;

    let format = detect_format(None);
    let mut any_violations = false;
    for (_path, outcome) in &result.per_file_results {
        if !outcome.violations.is_empty() {
            any_violations = true;
        }
        println!("{}", render_file_report(outcome, format));

        if args.fix {
            if let Some(fmt) = &outcome.format {
                if fmt.changed {
                    if let Err(e) = write_fixed(&outcome.path, &fmt.new_source) {
                        eprintln!("failed to write {}: {e}", outcome.path.display());
                    }
                }
            }
        }
    }

    for (path, message) in &result.errors {
        eprintln!("{}: {}", path.display(), message);
    }

    if result.failure_count > 0 {
        exit_code(ExitCode::IoError)
    } else if any_violations {
        exit_code(ExitCode::ViolationsFound)
    } else {
        exit_code(ExitCode::Success)
    }
}

fn write_fixed(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

fn exit_code(code: ExitCode) -> ProcessExitCode {
    ProcessExitCode::from(code as i32 as u8)
}
