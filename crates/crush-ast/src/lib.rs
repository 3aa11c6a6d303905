//! Arena-based AST for the crush optimizer.
//!
//! This crate provides the tree the optimizer core operates on:
//! - Node variants for a C-family dynamic scripting language (`node`)
//! - The owning arena with parent links and mutation primitives (`arena`)
//! - An ESTree-flavored JSON bridge used as the parser/printer boundary
//!   (`estree`)
//!
//! The arena is the single owner of every node. Nodes reference each other
//! through stable `NodeId` indices, never through pointers, so replacing a
//! subtree is an index swap in the parent's child slot.

pub mod arena;
pub mod estree;
pub mod node;

pub use arena::NodeArena;
pub use node::{
    BinaryOp, FnFlavor, LitValue, LogicalOp, Node, NodeId, PropertyKind, UnaryOp, VarKind,
};
