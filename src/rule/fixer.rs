//! Text-edit accumulation for `Rule::format`, mirroring the corpus's
//! `Fixer`/`PendingFix` split but addressed by byte range instead of a
//! `tree_sitter::Node` (this core has no borrowed tree to anchor to).

use std::ops::Range;

/// Accumulates pending edits against a file's original source. A rule's
/// `format` method calls `replace_range`/`insert_before`/`insert_after` any
/// number of times; the engine renders the accumulated edits into the new
/// source text once analysis of that rule is complete.
#[derive(Default)]
pub struct Fixer {
    pending: Vec<PendingFix>,
}

impl Fixer {
    pub fn replace_range(&mut self, range: Range<u32>, replacement: impl Into<String>) {
        self.pending.push(PendingFix::new(range, replacement.into()));
    }

    pub fn remove_range(&mut self, range: Range<u32>) {
        self.pending.push(PendingFix::new(range, String::new()));
    }

    pub fn insert_before(&mut self, offset: u32, text: impl Into<String>) {
        self.pending.push(PendingFix::new(offset..offset, text.into()));
    }

    pub fn insert_after(&mut self, offset: u32, text: impl Into<String>) {
        self.pending.push(PendingFix::new(offset..offset, text.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn into_pending_fixes(self) -> Vec<PendingFix> {
        self.pending
    }

    /// Applies every pending fix to `source`, resolving overlaps by
    /// rejecting them (last-registered-wins is not safe for formatter
    /// output): fixes are sorted by start offset and applied back-to-front
    /// so earlier offsets stay valid as later edits are spliced in.
    pub fn render(mut self, source: &str) -> String {
        self.pending.sort_by_key(|f| (f.range.start, f.range.end));
        let mut out = source.to_string();
        for fix in self.pending.iter().rev() {
            let start = fix.range.start as usize;
            let end = fix.range.end as usize;
            out.replace_range(start..end, &fix.replacement);
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFix {
    pub range: Range<u32>,
    pub replacement: String,
}

impl PendingFix {
    pub fn new(range: Range<u32>, replacement: String) -> Self {
        Self { range, replacement }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_applies_edits_back_to_front() {
        let mut fixer = Fixer::default();
        fixer.replace_range(0..5, "class");
        fixer.insert_after(5, "!");
        let out = fixer.render("CLASS");
        assert_eq!(out, "class!");
    }

    #[test]
    fn empty_fixer_is_empty() {
        assert!(Fixer::default().is_empty());
    }
}
