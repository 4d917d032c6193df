//! Side-table attribute payloads, keyed by `NodeId`, as named in
//! SPEC_FULL.md §3.2 / §4.C "Attribute attachment".

use super::{Arena, NodeAttribute, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAttribute {
    pub qualified_name: String,
    pub is_static: bool,
    pub is_wildcard: bool,
}

impl NodeAttribute for ImportAttribute {
    fn store(arena: &mut Arena, id: NodeId, value: Self) {
        arena.import_attrs.insert(id, value);
    }

    fn fetch(arena: &Arena, id: NodeId) -> Option<&Self> {
        arena.import_attrs.get(&id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleImportAttribute {
    pub module_name: String,
}

impl NodeAttribute for ModuleImportAttribute {
    fn store(arena: &mut Arena, id: NodeId, value: Self) {
        arena.module_import_attrs.insert(id, value);
    }

    fn fetch(arena: &Arena, id: NodeId) -> Option<&Self> {
        arena.module_import_attrs.get(&id)
    }
}

/// Decoded literal payload, stored only when decoding is cheap at parse
/// time (integers, booleans, `null`); string/text-block/char literals are
/// decoded on demand by callers from the source bytes instead.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralAttribute {
    Int(i64),
    Long(i64),
    Float(f64),
    Double(f64),
    Boolean(bool),
    Null,
}

impl NodeAttribute for LiteralAttribute {
    fn store(arena: &mut Arena, id: NodeId, value: Self) {
        arena.literal_attrs.insert(id, value);
    }

    fn fetch(arena: &Arena, id: NodeId) -> Option<&Self> {
        arena.literal_attrs.get(&id)
    }
}

/// The simple name of a type declaration (substring of source), attached so
/// rules don't need to re-slice the source for the common "what's this
/// type's name" query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNameAttribute {
    pub simple_name: String,
}

impl NodeAttribute for TypeNameAttribute {
    fn store(arena: &mut Arena, id: NodeId, value: Self) {
        arena.type_name_attrs.insert(id, value);
    }

    fn fetch(arena: &Arena, id: NodeId) -> Option<&Self> {
        arena.type_name_attrs.get(&id)
    }
}
