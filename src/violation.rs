//! The output unit of rule analysis (SPEC_FULL.md §3.5).

use derive_builder::Builder;

use crate::arena::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single ordered text-edit suggestion a rule can offer for a violation.
/// `format` doesn't have to honor these directly (it rewrites the whole
/// file), but the human/JSON report renders them for `--fix`-less runs.
#[derive(Debug, Clone, Builder, PartialEq, Eq)]
#[builder(setter(into))]
pub struct SuggestedFix {
    pub description: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub file_path: std::path::PathBuf,
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,

    #[builder(default)]
    pub node_id: Option<NodeId>,

    #[builder(default)]
    pub suggested_fixes: Vec<SuggestedFix>,
}

impl ViolationBuilder {
    fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(format!("violation start {start} > end {end}"));
            }
        }
        if matches!(&self.rule_id, Some(id) if id.trim().is_empty()) {
            return Err("rule_id must not be empty".into());
        }
        if matches!(&self.message, Some(m) if m.trim().is_empty()) {
            return Err("message must not be empty".into());
        }
        Ok(())
    }
}

impl Violation {
    pub fn builder() -> ViolationBuilder {
        ViolationBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_trims_are_enforced() {
        let err = Violation::builder()
            .rule_id("  ")
            .severity(Severity::Warning)
            .message("x")
            .file_path(std::path::PathBuf::from("F.java"))
            .start(0u32)
            .end(1u32)
            .line(1u32)
            .column(1u32)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn builder_rejects_inverted_range() {
        let err = Violation::builder()
            .rule_id("indentation")
            .severity(Severity::Warning)
            .message("bad indent")
            .file_path(std::path::PathBuf::from("F.java"))
            .start(10u32)
            .end(2u32)
            .line(1u32)
            .column(1u32)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn builder_succeeds_with_required_fields() {
        let v = Violation::builder()
            .rule_id("indentation")
            .severity(Severity::Warning)
            .message("bad indent")
            .file_path(std::path::PathBuf::from("F.java"))
            .start(0u32)
            .end(4u32)
            .line(1u32)
            .column(1u32)
            .build()
            .unwrap();
        assert_eq!(v.rule_id, "indentation");
        assert!(v.suggested_fixes.is_empty());
    }
}
