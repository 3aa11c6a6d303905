//! Constant folding decisions.
//!
//! Given an operator and already-simplified operand nodes, decide whether a
//! replacement literal exists. `None` always means "leave the node alone";
//! folding has no error path.

use crate::value::{
    add_values, constant_value, is_truthy, loose_eq, relational, strict_eq, to_number,
};
use crush_ast::{BinaryOp, LitValue, Node, NodeArena, NodeId, UnaryOp};
use std::cmp::Ordering;

/// Fold a binary expression over constant operands into a literal payload.
pub fn fold_binary(
    arena: &NodeArena,
    op: BinaryOp,
    left: NodeId,
    right: NodeId,
) -> Option<LitValue> {
    // A template string may substitute at runtime; `+` over one is never
    // constant even when every interpolation is.
    if op == BinaryOp::Add && (is_template(arena, left) || is_template(arena, right)) {
        return None;
    }
    let lv = constant_value(arena, left)?;
    let rv = constant_value(arena, right)?;

    Some(match op {
        BinaryOp::Add => add_values(&lv, &rv),
        BinaryOp::Sub => LitValue::Num(to_number(&lv) - to_number(&rv)),
        BinaryOp::Mul => LitValue::Num(to_number(&lv) * to_number(&rv)),
        BinaryOp::Div => LitValue::Num(to_number(&lv) / to_number(&rv)),
        BinaryOp::Rem => LitValue::Num(to_number(&lv) % to_number(&rv)),
        BinaryOp::EqEq => LitValue::Bool(loose_eq(&lv, &rv)),
        BinaryOp::NotEq => LitValue::Bool(!loose_eq(&lv, &rv)),
        BinaryOp::EqEqEq => LitValue::Bool(strict_eq(&lv, &rv)),
        BinaryOp::NotEqEq => LitValue::Bool(!strict_eq(&lv, &rv)),
        BinaryOp::Gt => LitValue::Bool(matches!(
            relational(&lv, &rv),
            Some(Ordering::Greater)
        )),
        BinaryOp::Ge => LitValue::Bool(matches!(
            relational(&lv, &rv),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Lt => LitValue::Bool(matches!(relational(&lv, &rv), Some(Ordering::Less))),
        BinaryOp::Le => LitValue::Bool(matches!(
            relational(&lv, &rv),
            Some(Ordering::Less | Ordering::Equal)
        )),
        // Everything else passes through unchanged.
        _ => return None,
    })
}

/// Fold `+x` and `!x` over a constant operand. Other unary operators are
/// left alone; in particular `-x` is only recognized as part of a constant
/// *operand* (see `constant_value`), not folded here.
pub fn fold_unary(arena: &NodeArena, op: UnaryOp, argument: NodeId) -> Option<LitValue> {
    let value = constant_value(arena, argument)?;
    match op {
        UnaryOp::Plus => Some(LitValue::Num(to_number(&value))),
        UnaryOp::Not => Some(LitValue::Bool(!is_truthy(&value))),
        _ => None,
    }
}

fn is_template(arena: &NodeArena, id: NodeId) -> bool {
    matches!(arena.get(id), Node::TemplateLiteral { .. })
}
