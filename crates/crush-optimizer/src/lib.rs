//! Optimization passes over the [`crush_ast`] arena.
//!
//! The crate exposes one entry point, [`optimize`], which runs the rewrite
//! engine (constant folding, branch collapsing, dead-code trimming, arrow
//! conversion, optional production substitution) and then, when asked, the
//! identifier mangler. Both passes mutate the arena in place and are
//! infallible: a tree that offers nothing to optimize comes back unchanged.
//!
//! Module layout:
//! - [`value`]: pure coercion semantics of the subject language
//! - [`fold`]: operator-level folding decisions
//! - [`simplify`]: the tree-rewriting engine
//! - [`mangle`]: identifier renaming

pub mod fold;
pub mod mangle;
pub mod simplify;
pub mod value;

use crush_ast::{NodeArena, NodeId};

pub use mangle::Mangler;

/// Knobs for a single [`optimize`] run.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeOptions {
    /// Replace `process.env.NODE_ENV` with the string `"production"` before
    /// folding, so environment-gated branches collapse.
    pub production: bool,
    /// Rename every identifier to a short generated name after
    /// simplification. Scope-unaware; see [`mangle`].
    pub mangle: bool,
}

/// Run the configured passes over the tree rooted at `root`.
///
/// Returns the id now occupying the root position (the root itself unless a
/// bare expression root was folded away).
pub fn optimize(arena: &mut NodeArena, root: NodeId, options: &OptimizeOptions) -> NodeId {
    let root = simplify::rewrite(arena, root, options);
    if options.mangle {
        let mut mangler = Mangler::new();
        mangler.mangle(arena, root)
    } else {
        root
    }
}
