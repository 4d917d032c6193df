//! Cross-cutting end-to-end scenarios, separate from the inline
//! `#[cfg(test)]` unit tests beside each module. Mirrors the corpus's split
//! between per-rule unit tests and top-level `tests/fixing.rs`/`tests/rules.rs`
//! integration suites.

use std::io::Write;
use std::sync::Arc;

use java_styler_core::arena::{Arena, NodeAttribute, NodeKind, TypeNameAttribute};
use java_styler_core::batch::{BatchConfig, BatchProcessor, CancellationToken, ErrorStrategy};
use java_styler_core::parser::{self, ParseOutcome};
use java_styler_core::pipeline::{Pipeline, RecoveryStrategy};
use java_styler_core::rule::{RuleEngine, TypeResolutionConfig};
use java_styler_core::security::{Deadline, SecurityConfig};

fn parse_ok(source: &str) -> (Arena, java_styler_core::arena::NodeId) {
    let security = SecurityConfig::default();
    let deadline = Deadline::starting_now(security.wall_clock_budget);
    let (arena, outcome) = parser::parse(source, &security, &deadline);
    match outcome {
        ParseOutcome::Success { root } => (arena, root),
        ParseOutcome::Failure { errors, .. } => panic!("unexpected parse failure: {errors:?}"),
    }
}

#[test]
fn scenario_1_minimal_parse() {
    let source = "class T {}";
    let (arena, root) = parse_ok(source);
    assert_eq!(arena.kind(root), NodeKind::CompilationUnit);
    assert_eq!(arena.start(root), 0);
    assert_eq!(arena.end(root), 10);

    let children = arena.children(root);
    assert_eq!(children.len(), 1);
    let class_decl = children[0];
    assert_eq!(arena.kind(class_decl), NodeKind::ClassDeclaration);
    assert_eq!(arena.start(class_decl), 0);
    assert_eq!(arena.end(class_decl), 10);

    let type_name: &TypeNameAttribute = arena
        .attribute(class_decl)
        .expect("class declarations carry a TypeNameAttribute");
    assert_eq!(type_name.simple_name, "T");

    let ctx_security = SecurityConfig::default();
    let deadline = Deadline::starting_now(ctx_security.wall_clock_budget);
    let position_index = java_styler_core::position_index::PositionIndex::build(&arena, root, source);
    let ctx = java_styler_core::rule::TransformationContext::new(
        &arena,
        root,
        source,
        std::path::Path::new("T.java"),
        &position_index,
        &ctx_security,
        &deadline,
        &TypeResolutionConfig::default(),
    );
    let violations = RuleEngine::with_defaults().analyze(&ctx, &[]);
    assert!(violations.is_empty(), "expected no violations under default config, got {violations:?}");
}

#[test]
fn scenario_2_mixed_tab_indentation_fix() {
    let source = "class T {\n\tint x = 1;\n}";
    let engine = RuleEngine::with_defaults();
    let outcome = engine.format(
        source,
        std::path::Path::new("T.java"),
        &SecurityConfig::default(),
        &TypeResolutionConfig::default(),
        &[],
    );
    assert_eq!(outcome.new_source, "class T {\n    int x = 1;\n}");
    assert!(outcome.changed);
}

#[test]
fn scenario_3_braces_in_strings_are_not_depth() {
    let source = "class Test {\n    String s = \"{ braces } in string\";\n    int x = 1;\n}";
    let engine = RuleEngine::with_defaults();
    let outcome = engine.format(
        source,
        std::path::Path::new("Test.java"),
        &SecurityConfig::default(),
        &TypeResolutionConfig::default(),
        &[],
    );
    assert_eq!(outcome.new_source, source);
    assert!(!outcome.changed);
}

#[test]
fn scenario_4_import_sort() {
    let source = "import org.apache.commons.io.IOUtils;\nimport java.util.List;\nimport java.io.File;\n\nclass T {\n    File f;\n    List l;\n    IOUtils u;\n}\n";
    let engine = RuleEngine::with_defaults();
    let outcome = engine.format(
        source,
        std::path::Path::new("T.java"),
        &SecurityConfig::default(),
        &TypeResolutionConfig::default(),
        &[],
    );
    let file_pos = outcome.new_source.find("java.io.File").unwrap();
    let list_pos = outcome.new_source.find("java.util.List").unwrap();
    let ioutils_pos = outcome.new_source.find("org.apache.commons.io.IOUtils").unwrap();
    assert!(file_pos < list_pos);
    assert!(list_pos < ioutils_pos);
}

#[test]
fn scenario_5_enhanced_for_disambiguation() {
    let source = "class T {\n  void m() {\n    for (String s : list) { }\n  }\n}";
    let (arena, root) = parse_ok(source);
    let mut found_enhanced = false;
    arena.walk_preorder(root, |id| {
        if arena.kind(id) == NodeKind::EnhancedForStatement {
            found_enhanced = true;
        }
        assert_ne!(arena.kind(id), NodeKind::ForStatement, "classic for should not appear here");
    });
    assert!(found_enhanced, "expected an EnhancedForStatement node");

    let engine = RuleEngine::with_defaults();
    let outcome = engine.format(
        source,
        std::path::Path::new("T.java"),
        &SecurityConfig::default(),
        &TypeResolutionConfig::default(),
        &[],
    );
    assert!(outcome.new_source.contains("for (String s : list)"));
}

#[test]
fn scenario_6_split_right_shift_in_generics() {
    let source = "class T {\n  Map<String,List<Integer>> m;\n}";
    let (_, _root) = parse_ok(source);
}

#[tokio::test]
async fn scenario_7_batch_partial_failure() {
    let mut handles = Vec::new();
    let mut paths = Vec::new();
    for i in 0..10 {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        if i == 2 {
            writeln!(f, "class Bad {{ void m() {{ ").unwrap();
        } else {
            writeln!(f, "class Good{i} {{}}").unwrap();
        }
        paths.push(f.path().to_path_buf());
        handles.push(f);
    }

    let pipeline = Pipeline::new(
        RuleEngine::with_defaults(),
        SecurityConfig::default(),
        TypeResolutionConfig::default(),
        RecoveryStrategy::FailFast,
        true,
    );
    let processor = BatchProcessor::new(
        pipeline,
        BatchConfig::with_available_memory(64 * 1024 * 1024, ErrorStrategy::Continue),
    );

    let result = processor.run(&paths, Arc::new(Vec::new()), CancellationToken::new()).await;

    assert_eq!(result.total, 10);
    assert_eq!(result.success_count, 9);
    assert_eq!(result.failure_count, 1);
    assert_eq!(result.success_count + result.failure_count, result.total);
    assert!(result.throughput_files_per_second >= 0.0);
}

#[test]
fn config_loading_rejects_unknown_rule() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".java-styler.toml"),
        "[rules.not-a-real-rule]\nlevel = \"error\"\n",
    )
    .unwrap();

    let found = java_styler_core::config::find_config_file(dir.path()).unwrap();
    let parsed = java_styler_core::config::load_config_file(&found).unwrap();
    let err = java_styler_core::config::resolve_rule_configurations(
        &parsed.content,
        &java_styler_core::rule::BuiltinRule::all_default(),
    )
    .unwrap_err();
    assert!(matches!(err, java_styler_core::errors::ConfigError::UnknownRule(_)));
}

#[test]
fn config_loading_accepts_known_rule_and_applies_off() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".java-styler.toml"), "[rules.indentation]\nlevel = \"off\"\n").unwrap();

    let found = java_styler_core::config::find_config_file(dir.path()).unwrap();
    let parsed = java_styler_core::config::load_config_file(&found).unwrap();
    let configurations = java_styler_core::config::resolve_rule_configurations(
        &parsed.content,
        &java_styler_core::rule::BuiltinRule::all_default(),
    )
    .unwrap();

    let source = "class T {\n\tint x = 1;\n}";
    let engine = RuleEngine::with_defaults();
    let outcome = engine.format(
        source,
        std::path::Path::new("T.java"),
        &SecurityConfig::default(),
        &TypeResolutionConfig::default(),
        &configurations,
    );
    assert_eq!(outcome.new_source, source, "indentation rule should be disabled");
}
