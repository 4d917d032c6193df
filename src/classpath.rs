//! Classpath/module-path scanning (SPEC_FULL.md §4.F "Symbol resolution",
//! §6 "ClasspathScanner"), kept behind a trait so the import organizer's
//! resolution algorithm is independent of how class names are actually
//! discovered. The only shipped implementation walks directory roots
//! looking for `.class`/`.java` files; jar scanning is not implemented
//! (see DESIGN.md) so a jar-only classpath root behaves as empty rather
//! than as an error.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolves whether a fully-qualified class name exists on some classpath,
/// and lists the members of a package for wildcard-import expansion.
pub trait ClasspathScanner: Send + Sync {
    fn class_exists(&self, qualified_name: &str) -> bool;

    /// All classes directly in `package` (not recursively), as
    /// fully-qualified names with nested classes normalized to `Outer.Inner`
    /// rather than `Outer$Inner`.
    fn list_package_classes(&self, package: &str) -> HashSet<String>;
}

/// Scans a fixed list of classpath/module-path directory roots for
/// `.class` and `.java` files, inferring a class's package from its path
/// relative to the root it was found under.
#[derive(Debug, Clone, Default)]
pub struct DirectoryClasspathScanner {
    roots: Vec<PathBuf>,
}

impl DirectoryClasspathScanner {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    fn qualified_names(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        for root in &self.roots {
            collect_classes(root, root, &mut names);
        }
        names
    }
}

fn collect_classes(root: &Path, dir: &Path, out: &mut HashSet<String>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_classes(root, &path, out);
            continue;
        }
        let Some(stem) = class_stem(&path) else { continue };
        let Ok(relative) = path.strip_prefix(root) else { continue };
        let mut segments: Vec<String> = relative
            .parent()
            .into_iter()
            .flat_map(|p| p.components())
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        segments.push(stem.replace('$', "."));
        out.insert(segments.join("."));
    }
}

fn class_stem(path: &Path) -> Option<String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("class") | Some("java") => {
            path.file_stem().map(|s| s.to_string_lossy().into_owned())
        }
        _ => None,
    }
}

impl ClasspathScanner for DirectoryClasspathScanner {
    fn class_exists(&self, qualified_name: &str) -> bool {
        self.qualified_names().contains(qualified_name)
    }

    fn list_package_classes(&self, package: &str) -> HashSet<String> {
        self.qualified_names()
            .into_iter()
            .filter(|name| {
                name.rsplit_once('.')
                    .map(|(pkg, _)| pkg == package)
                    .unwrap_or(package.is_empty())
            })
            .collect()
    }
}

/// A scanner with no roots; every lookup resolves to nothing. Used when no
/// `-cp`/`-p` was supplied so the import organizer still runs, just
/// conservatively (wildcard expansion stays suppressed, see
/// `ImportOrganizerRule`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyClasspathScanner;

impl ClasspathScanner for EmptyClasspathScanner {
    fn class_exists(&self, _qualified_name: &str) -> bool {
        false
    }

    fn list_package_classes(&self, _package: &str) -> HashSet<String> {
        HashSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn finds_classes_under_package_directories() {
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = dir.path().join("com").join("example");
        fs::create_dir_all(&pkg_dir).unwrap();
        let mut f = fs::File::create(pkg_dir.join("Widget.class")).unwrap();
        f.write_all(b"").unwrap();

        let scanner = DirectoryClasspathScanner::new(vec![dir.path().to_path_buf()]);
        assert!(scanner.class_exists("com.example.Widget"));
        let members = scanner.list_package_classes("com.example");
        assert!(members.contains("com.example.Widget"));
    }

    #[test]
    fn nested_class_dollar_is_normalized_to_dot() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::File::create(dir.path().join("pkg").join("Outer$Inner.class")).unwrap();

        let scanner = DirectoryClasspathScanner::new(vec![dir.path().to_path_buf()]);
        assert!(scanner.class_exists("pkg.Outer.Inner"));
    }

    #[test]
    fn empty_scanner_resolves_nothing() {
        let scanner = EmptyClasspathScanner;
        assert!(!scanner.class_exists("java.util.List"));
        assert!(scanner.list_package_classes("java.util").is_empty());
    }
}
