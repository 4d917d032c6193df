//! Import organizer rule (SPEC_FULL.md §4.F "Import Organizer" and
//! "Symbol resolution"): groups, sorts, and re-blank-lines a compilation
//! unit's imports, and expands a wildcard import into explicit names only
//! when every uppercase identifier the file actually uses can be resolved
//! (fails closed otherwise, per the preserves-set invariant in §8).
//!
//! Extraction is AST-based (`ImportDeclaration`/`ModuleImportDeclaration`
//! children of the compilation unit, read via `ImportAttribute`/
//! `ModuleImportAttribute`) since the same literal text can appear inside
//! a string or comment; a regex-based extraction is never used here.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use regex::Regex;
use serde::Deserialize;

use crate::arena::{NodeId, NodeKind};
use crate::classpath::{ClasspathScanner, DirectoryClasspathScanner};
use crate::lexer::Lexer;
use crate::rule::{Rule, RuleConfiguration, RuleMeta, RuleOptions};
use crate::rule::context::TransformationContext;
use crate::rules::resolve_options;
use crate::token::TokenType;
use crate::violation::{Severity, Violation};

/// `java.lang` types assumed resolvable without a JDK classpath listing;
/// a conservative, small allowlist rather than a full JDK index.
const JAVA_LANG_TYPES: &[&str] = &[
    "String", "Object", "Integer", "Long", "Double", "Float", "Boolean", "Character", "Byte",
    "Short", "Void", "Math", "System", "Thread", "Runnable", "Exception", "RuntimeException",
    "Error", "Throwable", "Comparable", "Iterable", "CharSequence", "StringBuilder",
    "StringBuffer", "Class", "Enum", "Record", "Override", "Deprecated", "SuppressWarnings",
    "FunctionalInterface", "SafeVarargs", "AutoCloseable", "Cloneable", "Number",
];

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ImportOrganizerConfig {
    pub static_imports_first: bool,
    /// Ordered regex patterns; the first pattern a qualified name matches
    /// decides its group. Anything matching nothing falls into a trailing
    /// implicit "everything else" group.
    pub group_patterns: Vec<String>,
    /// A package contributing at least this many explicit imports is
    /// collapsed to a single wildcard import. `None` disables collapsing.
    pub wildcard_collapse_threshold: Option<usize>,
}

impl Default for ImportOrganizerConfig {
    fn default() -> Self {
        Self {
            static_imports_first: true,
            group_patterns: vec![r"^java\.".to_string(), r"^javax\.".to_string()],
            wildcard_collapse_threshold: None,
        }
    }
}

impl ImportOrganizerConfig {
    fn validate(&self) -> Vec<String> {
        self.group_patterns
            .iter()
            .filter_map(|p| Regex::new(p).err().map(|e| format!("invalid group pattern {p:?}: {e}")))
            .collect()
    }

    fn compiled_groups(&self) -> Vec<Regex> {
        self.group_patterns
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    }
}

#[derive(Clone, Debug)]
struct ImportEntry {
    range: Range<u32>,
    is_static: bool,
    is_wildcard: bool,
    is_module: bool,
    /// Full text of what follows `import [static] `, e.g. `java.util.List`,
    /// `java.util.*`, or (for a module import) the module name.
    qualified_name: String,
}

fn package_name(ctx: &TransformationContext) -> Option<String> {
    let pkg = ctx
        .arena()
        .children(ctx.root_node())
        .iter()
        .find(|&&id| ctx.arena().kind(id) == NodeKind::PackageDeclaration)?;
    let text = ctx.source_text_of(*pkg);
    let body = text.trim_start_matches("package").trim().trim_end_matches(';').trim();
    Some(body.to_string())
}

fn collect_imports(ctx: &TransformationContext) -> Vec<ImportEntry> {
    let arena = ctx.arena();
    let mut entries = Vec::new();
    for &id in arena.children(ctx.root_node()) {
        match arena.kind(id) {
            NodeKind::ImportDeclaration => {
                if let Some(attr) = arena.attribute::<crate::arena::ImportAttribute>(id) {
                    entries.push(ImportEntry {
                        range: arena.start(id)..arena.end(id),
                        is_static: attr.is_static,
                        is_wildcard: attr.is_wildcard,
                        is_module: false,
                        qualified_name: attr.qualified_name.clone(),
                    });
                }
            }
            NodeKind::ModuleImportDeclaration => {
                if let Some(attr) = arena.attribute::<crate::arena::ModuleImportAttribute>(id) {
                    entries.push(ImportEntry {
                        range: arena.start(id)..arena.end(id),
                        is_static: false,
                        is_wildcard: false,
                        is_module: true,
                        qualified_name: attr.module_name.clone(),
                    });
                }
            }
            _ => {}
        }
    }
    entries
}

fn simple_name(qualified: &str) -> &str {
    qualified.trim_end_matches(".*").rsplit('.').next().unwrap_or(qualified)
}

/// Uppercase identifiers used anywhere after the import block, excluding
/// ones immediately following a `.` (already-qualified member access, not
/// a fresh type reference that would need its own import).
fn used_simple_names(ctx: &TransformationContext, after: u32) -> HashSet<String> {
    let source = ctx.source_code();
    let (tokens, _errors) = Lexer::new(source).tokenize();
    let mut out = HashSet::new();
    let mut prev_significant: Option<TokenType> = None;
    for tok in &tokens {
        if tok.kind.is_trivia() {
            continue;
        }
        if tok.start >= after && tok.kind == TokenType::Identifier {
            let text = tok.text(source);
            if text.chars().next().is_some_and(|c| c.is_uppercase())
                && prev_significant != Some(TokenType::Dot)
            {
                out.insert(text.to_string());
            }
        }
        prev_significant = Some(tok.kind);
    }
    out
}

fn locally_declared_names(ctx: &TransformationContext) -> HashSet<String> {
    let mut names = HashSet::new();
    ctx.arena().walk_preorder(ctx.root_node(), |id| {
        if matches!(
            ctx.arena().kind(id),
            NodeKind::ClassDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::EnumDeclaration
                | NodeKind::RecordDeclaration
                | NodeKind::AnnotationDeclaration
        ) {
            if let Some(attr) = ctx.arena().attribute::<crate::arena::TypeNameAttribute>(id) {
                names.insert(attr.simple_name.clone());
            }
        }
    });
    names
}

/// Whether every uppercase identifier the file uses can be resolved,
/// through explicit imports, wildcard package members, `java.lang`, a
/// locally-declared type, or a same-package type. `scanner` backs the
/// wildcard-package and same-package lookups.
fn classpath_is_complete(
    ctx: &TransformationContext,
    entries: &[ImportEntry],
    scanner: &dyn ClasspathScanner,
) -> bool {
    let explicit: HashSet<&str> = entries
        .iter()
        .filter(|e| !e.is_wildcard && !e.is_module)
        .map(|e| simple_name(&e.qualified_name))
        .collect();
    let local = locally_declared_names(ctx);
    let same_package_members = package_name(ctx)
        .map(|pkg| scanner.list_package_classes(&pkg))
        .unwrap_or_default();
    let same_package: HashSet<&str> = same_package_members.iter().map(|s| simple_name(s)).collect();

    let mut wildcard_members: HashSet<String> = HashSet::new();
    for entry in entries.iter().filter(|e| e.is_wildcard) {
        let pkg = entry.qualified_name.trim_end_matches(".*");
        wildcard_members.extend(scanner.list_package_classes(pkg));
    }
    let wildcard: HashSet<&str> = wildcard_members.iter().map(|s| simple_name(s)).collect();

    let first_import_offset = entries.iter().map(|e| e.range.start).min().unwrap_or(0);
    let used = used_simple_names(ctx, first_import_offset.max(ctx.arena().end(ctx.root_node())));
    for name in &used {
        let resolved = explicit.contains(name.as_str())
            || wildcard.contains(name.as_str())
            || JAVA_LANG_TYPES.contains(&name.as_str())
            || local.contains(name.as_str())
            || same_package.contains(name.as_str());
        if !resolved {
            return false;
        }
    }
    true
}

fn group_index(qualified: &str, groups: &[Regex]) -> usize {
    groups
        .iter()
        .position(|re| re.is_match(qualified))
        .unwrap_or(groups.len())
}

fn render_import_line(entry: &ImportEntry) -> String {
    if entry.is_module {
        format!("import module {};", entry.qualified_name)
    } else if entry.is_static {
        format!("import static {};", entry.qualified_name)
    } else {
        format!("import {};", entry.qualified_name)
    }
}

fn organize(
    entries: &[ImportEntry],
    config: &ImportOrganizerConfig,
    expand_wildcards: bool,
    scanner: &dyn ClasspathScanner,
    used: &HashSet<String>,
) -> String {
    let groups = config.compiled_groups();
    let mut expanded: Vec<ImportEntry> = Vec::new();
    for entry in entries {
        if expand_wildcards && entry.is_wildcard {
            let pkg = entry.qualified_name.trim_end_matches(".*");
            let members = scanner.list_package_classes(pkg);
            let mut any = false;
            for member in members {
                if used.contains(simple_name(&member)) {
                    any = true;
                    expanded.push(ImportEntry {
                        range: entry.range.clone(),
                        is_static: entry.is_static,
                        is_wildcard: false,
                        is_module: false,
                        qualified_name: member,
                    });
                }
            }
            if !any {
                expanded.push(entry.clone());
            }
        } else {
            expanded.push(entry.clone());
        }
    }

    if let Some(threshold) = config.wildcard_collapse_threshold {
        let mut by_package: HashMap<String, Vec<&ImportEntry>> = HashMap::new();
        for entry in expanded.iter().filter(|e| !e.is_wildcard && !e.is_module) {
            if let Some((pkg, _)) = entry.qualified_name.rsplit_once('.') {
                by_package.entry(pkg.to_string()).or_default().push(entry);
            }
        }
        let collapse_packages: HashSet<String> = by_package
            .into_iter()
            .filter(|(_, members)| members.len() >= threshold)
            .map(|(pkg, _)| pkg)
            .collect();
        if !collapse_packages.is_empty() {
            let mut collapsed = Vec::new();
            let mut seen_wildcard: HashSet<(bool, String)> = HashSet::new();
            for entry in expanded {
                if entry.is_module {
                    collapsed.push(entry);
                    continue;
                }
                let pkg = entry
                    .qualified_name
                    .trim_end_matches(".*")
                    .rsplit_once('.')
                    .map(|(p, _)| p.to_string());
                if let Some(pkg) = pkg.filter(|p| collapse_packages.contains(p)) {
                    let key = (entry.is_static, pkg.clone());
                    if seen_wildcard.insert(key) {
                        collapsed.push(ImportEntry {
                            range: entry.range.clone(),
                            is_static: entry.is_static,
                            is_wildcard: true,
                            is_module: false,
                            qualified_name: format!("{pkg}.*"),
                        });
                    }
                } else {
                    collapsed.push(entry);
                }
            }
            expanded = collapsed;
        }
    }

    let (mut statics, mut regular): (Vec<ImportEntry>, Vec<ImportEntry>) =
        expanded.into_iter().partition(|e| e.is_static);
    statics.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
    regular.sort_by(|a, b| {
        let ga = group_index(&a.qualified_name, &groups);
        let gb = group_index(&b.qualified_name, &groups);
        ga.cmp(&gb).then_with(|| a.qualified_name.cmp(&b.qualified_name))
    });

    let mut lines: Vec<Vec<String>> = Vec::new();
    if config.static_imports_first && !statics.is_empty() {
        lines.push(statics.iter().map(render_import_line).collect());
    }
    let mut current_group = usize::MAX;
    let mut block: Vec<String> = Vec::new();
    for entry in &regular {
        let g = group_index(&entry.qualified_name, &groups);
        if g != current_group && !block.is_empty() {
            lines.push(std::mem::take(&mut block));
            current_group = g;
        } else {
            current_group = g;
        }
        block.push(render_import_line(entry));
    }
    if !block.is_empty() {
        lines.push(block);
    }
    if !config.static_imports_first && !statics.is_empty() {
        lines.push(statics.iter().map(render_import_line).collect());
    }

    lines
        .into_iter()
        .map(|group| group.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Default)]
pub struct ImportOrganizerRule;

impl Rule for ImportOrganizerRule {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id: "import-organizer",
            name: "import-organizer",
            description: "Groups, sorts, and wildcard-expands imports where classpath resolution is complete",
            default_severity: Severity::Warning,
        }
    }

    fn analyze(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        let config: ImportOrganizerConfig = resolve_options(config);
        let entries = collect_imports(ctx);
        if entries.is_empty() {
            return;
        }
        let roots = ctx.type_resolution_config();
        let scanner = DirectoryClasspathScanner::new(
            roots.classpath.iter().chain(&roots.module_path).cloned().collect(),
        );
        let used = used_simple_names(ctx, entries.iter().map(|e| e.range.end).max().unwrap_or(0));
        let complete = classpath_is_complete(ctx, &entries, &scanner);
        let organized = organize(&entries, &config, complete, &scanner, &used);

        let start = entries.iter().map(|e| e.range.start).min().unwrap();
        let end = entries.iter().map(|e| e.range.end).max().unwrap();
        let original = &ctx.source_code()[start as usize..end as usize];
        if original.trim() != organized.trim() {
            ctx.report(
                Violation::builder()
                    .rule_id("import-organizer")
                    .severity(Severity::Warning)
                    .message("import block is not grouped/sorted as configured")
                    .file_path(ctx.file_path().to_path_buf())
                    .start(start)
                    .end(end)
                    .line(ctx.line_of(start))
                    .column(ctx.column_of(start))
                    .build()
                    .expect("well-formed violation"),
            );
        }
    }

    fn format(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        let config: ImportOrganizerConfig = resolve_options(config);
        let entries = collect_imports(ctx);
        if entries.is_empty() {
            return;
        }
        let roots = ctx.type_resolution_config();
        let scanner = DirectoryClasspathScanner::new(
            roots.classpath.iter().chain(&roots.module_path).cloned().collect(),
        );
        let used = used_simple_names(ctx, entries.iter().map(|e| e.range.end).max().unwrap_or(0));
        let complete = classpath_is_complete(ctx, &entries, &scanner);
        let organized = organize(&entries, &config, complete, &scanner, &used);

        let start = entries.iter().map(|e| e.range.start).min().unwrap();
        let end = entries.iter().map(|e| e.range.end).max().unwrap();
        ctx.with_fixer(|fixer| {
            fixer.replace_range(start..end, organized);
        });
    }

    fn validate_configuration(&self, options: &RuleOptions) -> Vec<String> {
        match serde_json::from_value::<ImportOrganizerConfig>(options.clone()) {
            Ok(cfg) => cfg.validate(),
            Err(e) => vec![format!("invalid import-organizer config: {e}")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::EmptyClasspathScanner;

    fn entry(q: &str, is_static: bool, is_wildcard: bool) -> ImportEntry {
        ImportEntry {
            range: 0..0,
            is_static,
            is_wildcard,
            is_module: false,
            qualified_name: q.to_string(),
        }
    }

    #[test]
    fn groups_java_before_third_party_and_sorts_within_group() {
        let entries = vec![
            entry("com.acme.Widget", false, false),
            entry("java.util.List", false, false),
            entry("java.util.ArrayList", false, false),
        ];
        let config = ImportOrganizerConfig::default();
        let scanner = EmptyClasspathScanner;
        let rendered = organize(&entries, &config, false, &scanner, &HashSet::new());
        let java_pos = rendered.find("java.util.ArrayList").unwrap();
        let acme_pos = rendered.find("com.acme.Widget").unwrap();
        assert!(java_pos < acme_pos);
        assert!(rendered.find("ArrayList").unwrap() < rendered.find("java.util.List").unwrap());
    }

    #[test]
    fn static_imports_grouped_first_by_default() {
        let entries = vec![
            entry("com.acme.Widget", false, false),
            entry("org.junit.Assert.assertEquals", true, false),
        ];
        let config = ImportOrganizerConfig::default();
        let scanner = EmptyClasspathScanner;
        let rendered = organize(&entries, &config, false, &scanner, &HashSet::new());
        assert!(rendered.find("static").unwrap() < rendered.find("com.acme").unwrap());
    }

    #[test]
    fn leaves_wildcard_untouched_when_not_expanding() {
        let entries = vec![entry("java.util.*", false, true)];
        let config = ImportOrganizerConfig::default();
        let scanner = EmptyClasspathScanner;
        let rendered = organize(&entries, &config, false, &scanner, &HashSet::new());
        assert!(rendered.contains("java.util.*"));
    }
}
