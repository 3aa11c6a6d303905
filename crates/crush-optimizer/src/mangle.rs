//! Identifier mangling: every identifier is rewritten to a short generated
//! name, assigned in first-encounter order during a single traversal.
//!
//! The renaming table is keyed by original name alone. There is no scope
//! analysis: two unrelated bindings that happen to share a spelling collapse
//! onto the same generated name, and names bound elsewhere (globals,
//! built-ins) are renamed too. The pass is only sound for self-contained
//! programs and is off by default.

use crush_ast::{Node, NodeArena, NodeId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Digits of the generated-name encoding, in value order.
const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyzABCDEF";

/// Encode ordinal `n` as a `$`-prefixed bijective base-32 name.
///
/// The first 32 ordinals map to the single digits (`0` is `"$a"`, `31` is
/// `"$F"`), then two-digit names follow (`32` is `"$aa"`), so distinct
/// ordinals always get distinct names.
pub fn generate_name(n: u32) -> String {
    // 7 bijective base-32 digits cover the whole u32 range.
    let mut digits = [0u8; 7];
    let mut len = 0;
    // Bijective numbering has no zero digit; shift to one-based first.
    let mut m = u64::from(n) + 1;
    while m > 0 {
        let d = ((m - 1) % 32) as usize;
        digits[len] = ALPHABET[d];
        len += 1;
        m = (m - 1) / 32;
    }
    let mut name = String::with_capacity(len + 1);
    name.push('$');
    for &b in digits[..len].iter().rev() {
        name.push(b as char);
    }
    name
}

pub struct Mangler {
    table: FxHashMap<String, String>,
    next: u32,
    /// Replacement identifier nodes minted during this pass.
    fresh: FxHashSet<NodeId>,
}

impl Mangler {
    pub fn new() -> Mangler {
        Mangler {
            table: FxHashMap::default(),
            next: 0,
            fresh: FxHashSet::default(),
        }
    }

    /// Rewrite every identifier under `root` (inclusive) to its generated
    /// name. Returns the id now occupying the root position.
    pub fn mangle(&mut self, arena: &mut NodeArena, root: NodeId) -> NodeId {
        self.visit(arena, root)
    }

    fn visit(&mut self, arena: &mut NodeArena, id: NodeId) -> NodeId {
        if self.fresh.contains(&id) {
            return id;
        }
        if let Node::Identifier { name } = arena.get(id) {
            let replacement = self.replacement_for(name.clone());
            let new = arena.add_identifier(replacement);
            self.fresh.insert(new);
            arena.replace_in_parent(id, new);
            return new;
        }
        for child in arena.children(id) {
            self.visit(arena, child);
        }
        id
    }

    fn replacement_for(&mut self, original: String) -> String {
        if let Some(existing) = self.table.get(&original) {
            return existing.clone();
        }
        let generated = generate_name(self.next);
        tracing::trace!(target: "mangle", %original, %generated, "assigned name");
        self.next += 1;
        self.table.insert(original, generated.clone());
        generated
    }
}

impl Default for Mangler {
    fn default() -> Mangler {
        Mangler::new()
    }
}
