//! Spatial/type indexes over a completed `Arena` (SPEC_FULL.md §3.3, §4.D).

use std::collections::HashMap;

use crate::arena::{Arena, NodeId, NodeKind};

pub struct PositionIndex {
    by_kind: HashMap<NodeKindKey, Vec<NodeId>>,
    /// Sorted byte offsets of line starts; `line_offsets[0] == 0`.
    line_offsets: Vec<u32>,
    /// Per-node `(start, end)` range, indexed by `NodeId.0`, used for
    /// `node_at` without re-walking the arena.
    ranges: Vec<(u32, u32)>,
}

/// `NodeKind` doesn't derive `Hash`/`Eq` intentionally thin; we key the map
/// on its discriminant via `std::mem::discriminant` wrapped in a newtype so
/// adding node kinds never requires touching this module.
#[derive(PartialEq, Eq, Hash)]
struct NodeKindKey(std::mem::Discriminant<NodeKind>);

impl PositionIndex {
    /// Builds the index in a single O(N) walk of `arena`, rooted at `root`.
    pub fn build(arena: &Arena, root: NodeId, source: &str) -> Self {
        let mut by_kind: HashMap<NodeKindKey, Vec<NodeId>> = HashMap::new();
        let mut ranges = vec![(0u32, 0u32); arena.len()];

        arena.walk_preorder(root, |id| {
            let key = NodeKindKey(std::mem::discriminant(&arena.kind(id)));
            by_kind.entry(key).or_default().push(id);
            ranges[id.index()] = (arena.start(id), arena.end(id));
        });

        let mut line_offsets = vec![0u32];
        let bytes = source.as_bytes();
        let mut i = 0usize;
        while i < bytes.len() {
            if bytes[i] == b'\n' {
                line_offsets.push((i + 1) as u32);
            }
            i += 1;
        }

        Self {
            by_kind,
            line_offsets,
            ranges,
        }
    }

    pub fn find_nodes_by_type(&self, kind: NodeKind) -> &[NodeId] {
        let key = NodeKindKey(std::mem::discriminant(&kind));
        self.by_kind.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the deepest node whose `[start, end)` range contains `offset`.
    /// O(N) in the number of nodes reachable from root in the worst case (no
    /// spatial tree is built by default); callers that need this repeatedly
    /// over a hot path should use `find_nodes_by_type` plus their own filter
    /// instead.
    pub fn node_at(&self, offset: u32) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None; // (node, width), narrowest wins
        for (idx, &(start, end)) in self.ranges.iter().enumerate() {
            if start <= offset && offset < end {
                let width = end - start;
                if best.map_or(true, |(_, best_width)| width < best_width) {
                    best = Some((NodeId(idx as u32), width));
                }
            }
        }
        best.map(|(id, _)| id)
    }

    /// 1-based line number containing `offset`, via binary search over
    /// precomputed line-start offsets.
    pub fn line_of(&self, offset: u32) -> u32 {
        match self.line_offsets.binary_search(&offset) {
            Ok(idx) => (idx + 1) as u32,
            Err(idx) => idx as u32, // idx is the insertion point; line = idx (1-based of idx-1'th start)
        }
    }

    /// 1-based byte column within its line.
    pub fn column_of(&self, offset: u32) -> u32 {
        let line = self.line_of(offset);
        let line_start = self.line_offsets[(line - 1) as usize];
        offset - line_start + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::NodeKind;

    fn small_arena() -> (Arena, NodeId) {
        let mut arena = Arena::new();
        let root = arena.allocate(NodeKind::CompilationUnit, 0, 20).unwrap();
        let class = arena.allocate(NodeKind::ClassDeclaration, 0, 20).unwrap();
        let field = arena.allocate(NodeKind::FieldDeclaration, 5, 15).unwrap();
        arena.append_child(class, field);
        arena.append_child(root, class);
        arena.finish(root);
        (arena, root)
    }

    #[test]
    fn find_nodes_by_type_returns_matching_nodes() {
        let (arena, root) = small_arena();
        let index = PositionIndex::build(&arena, root, "class T { int x; }0");
        assert_eq!(index.find_nodes_by_type(NodeKind::FieldDeclaration).len(), 1);
        assert_eq!(index.find_nodes_by_type(NodeKind::MethodDeclaration).len(), 0);
    }

    #[test]
    fn node_at_returns_deepest_containing_node() {
        let (arena, root) = small_arena();
        let index = PositionIndex::build(&arena, root, "class T { int x; }0");
        let found = index.node_at(7).unwrap();
        assert_eq!(arena.kind(found), NodeKind::FieldDeclaration);
    }

    #[test]
    fn line_and_column_tracking() {
        let source = "line1\nline2\nline3";
        let mut arena = Arena::new();
        let root = arena
            .allocate(NodeKind::CompilationUnit, 0, source.len() as u32)
            .unwrap();
        let index = PositionIndex::build(&arena, root, source);

        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.column_of(0), 1);
        // 'l' of "line2" is at offset 6
        assert_eq!(index.line_of(6), 2);
        assert_eq!(index.column_of(6), 1);
        // 'i' of "line2" at offset 7
        assert_eq!(index.column_of(7), 2);
    }

    #[test]
    fn crlf_treated_atomically() {
        let source = "a\r\nb";
        let mut arena = Arena::new();
        let root = arena
            .allocate(NodeKind::CompilationUnit, 0, source.len() as u32)
            .unwrap();
        let index = PositionIndex::build(&arena, root, source);
        // line starts: offset 0 ("a"), offset 3 ("b", right after \r\n)
        assert_eq!(index.line_of(3), 2);
        assert_eq!(index.column_of(3), 1);
    }
}
