//! The per-file context handed to every rule's `analyze`/`format`, mirroring
//! the corpus's `QueryMatchContext`/`FileRunContext` split: read-only AST
//! and security/config access plus a `RefCell`-guarded report sink and
//! fixer, since rules only ever hold `&TransformationContext`.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::arena::{Arena, NodeId};
use crate::position_index::PositionIndex;
use crate::rule::fixer::Fixer;
use crate::security::{Deadline, SecurityConfig};
use crate::violation::Violation;

/// Classpath/module-path roots available for type resolution (§6.4); may
/// be empty, in which case rules that need it (the import organizer's
/// wildcard-expansion check) must fail closed.
#[derive(Clone, Debug, Default)]
pub struct TypeResolutionConfig {
    pub classpath: Vec<PathBuf>,
    pub module_path: Vec<PathBuf>,
}

pub struct TransformationContext<'a> {
    arena: &'a Arena,
    root: NodeId,
    source: &'a str,
    file_path: &'a Path,
    position_index: &'a PositionIndex,
    security: &'a SecurityConfig,
    deadline: &'a Deadline,
    type_resolution: &'a TypeResolutionConfig,
    violations: RefCell<Vec<Violation>>,
    fixer: RefCell<Fixer>,
}

impl<'a> TransformationContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arena: &'a Arena,
        root: NodeId,
        source: &'a str,
        file_path: &'a Path,
        position_index: &'a PositionIndex,
        security: &'a SecurityConfig,
        deadline: &'a Deadline,
        type_resolution: &'a TypeResolutionConfig,
    ) -> Self {
        Self {
            arena,
            root,
            source,
            file_path,
            position_index,
            security,
            deadline,
            type_resolution,
            violations: RefCell::new(Vec::new()),
            fixer: RefCell::new(Fixer::default()),
        }
    }

    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    pub fn root_node(&self) -> NodeId {
        self.root
    }

    pub fn source_code(&self) -> &'a str {
        self.source
    }

    pub fn file_path(&self) -> &'a Path {
        self.file_path
    }

    pub fn position_index(&self) -> &'a PositionIndex {
        self.position_index
    }

    pub fn source_text_of(&self, node: NodeId) -> &'a str {
        let start = self.arena.start(node) as usize;
        let end = self.arena.end(node) as usize;
        &self.source[start..end]
    }

    pub fn line_of(&self, offset: u32) -> u32 {
        self.position_index.line_of(offset)
    }

    pub fn column_of(&self, offset: u32) -> u32 {
        self.position_index.column_of(offset)
    }

    pub fn security_config(&self) -> &'a SecurityConfig {
        self.security
    }

    pub fn type_resolution_config(&self) -> &'a TypeResolutionConfig {
        self.type_resolution
    }

    /// Rules must call this inside any loop that visits O(N) nodes;
    /// returns `true` once the per-file wall-clock budget has elapsed.
    pub fn check_deadline(&self) -> bool {
        self.deadline.has_expired()
    }

    pub fn report(&self, violation: Violation) {
        self.violations.borrow_mut().push(violation);
    }

    /// Drains the accumulated violations without consuming the context, so
    /// the engine can inspect them between rules while `ctx` is still
    /// borrowed by the caller.
    pub fn take_violations(&self) -> Vec<Violation> {
        std::mem::take(&mut self.violations.borrow_mut())
    }

    /// Runs `body` with exclusive access to this file's accumulated text
    /// edits. Exposed as a closure (rather than handing out a `RefMut`
    /// directly) so call sites can't accidentally hold the borrow across a
    /// `report` call.
    pub fn with_fixer<R>(&self, body: impl FnOnce(&mut Fixer) -> R) -> R {
        body(&mut self.fixer.borrow_mut())
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations.into_inner()
    }

    pub fn into_fixer(self) -> Fixer {
        self.fixer.into_inner()
    }
}
