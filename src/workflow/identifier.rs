//! Dotted feature identifiers and the taxonomy relations derived from them.
//!
//! `paper.experiments.conditions.name` is a leaf value; its containing group is
//! `paper.experiments.conditions.parent`, whose group is `paper.experiments.parent`,
//! and so on up to the top-level group `paper.parent`.

use std::collections::HashSet;

const SEPARATOR: char = '.';
const GROUP_MARKER: &str = "parent";

/// Whether the identifier names a containment group (`*.parent`).
pub fn is_group(identifier: &str) -> bool {
    identifier
        .rsplit(SEPARATOR)
        .next()
        .is_some_and(|last| last == GROUP_MARKER)
}

/// The identifier of the group directly containing `identifier`.
///
/// A leaf `a.b.c` maps to `a.b.parent`; a group `a.b.parent` maps to `a.parent`.
/// Single-segment identifiers and top-level groups (`a.parent`) have no parent.
/// Returns `None` when the derived parent would equal the input.
pub fn parent_of(identifier: &str) -> Option<String> {
    let mut parts: Vec<&str> = identifier.split(SEPARATOR).collect();
    if parts.len() <= 1 {
        return None;
    }

    let last = parts.pop()?;
    if last == GROUP_MARKER {
        parts.pop()?;
        if parts.is_empty() {
            return None;
        }
    }
    parts.push(GROUP_MARKER);

    let parent = parts.join(".");
    (parent != identifier).then_some(parent)
}

/// All ancestors of `identifier`, nearest first. Never contains `identifier`
/// itself and never repeats an entry.
pub fn ancestor_chain(identifier: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([identifier.to_string()]);
    let mut current = identifier.to_string();

    while let Some(parent) = parent_of(&current) {
        if !seen.insert(parent.clone()) {
            break;
        }
        chain.push(parent.clone());
        current = parent;
    }

    chain
}

/// Leaf-first breadcrumb: `paper.experiments.name` becomes `name ← experiments ← paper`.
pub fn trail(identifier: &str) -> String {
    let path = identifier
        .strip_suffix(".parent")
        .unwrap_or(identifier);
    path.rsplit(SEPARATOR).collect::<Vec<_>>().join(" ← ")
}
