//! The rewrite engine: per-node-kind simplification, branch collapsing and
//! block-level dead-code trimming.
//!
//! # Architecture
//!
//! One top-down traversal drives everything. Each node kind has one rule;
//! rules simplify children first, then act on the already-simplified shape.
//! Unrecognized kinds are an identity fallback, never an error.
//!
//! Statement-granularity mutations (a statement replaced, removed or spliced)
//! immediately re-run the enclosing block's trimming rules, so cascades like
//! "removing a no-op exposes a terminator with trailing statements" reach a
//! local fixpoint without a second whole-tree pass. The overall pass is
//! idempotent: running it on its own output changes nothing, because every
//! rule's post-condition is a fixed point of that same rule.
//!
//! Freshly synthesized replacement nodes are tracked in a pass-scoped set so
//! the traversal never re-enters them.

use crate::OptimizeOptions;
use crate::fold::{fold_binary, fold_unary};
use crate::value::{constant_value, is_truthy};
use crush_ast::{FnFlavor, LitValue, Node, NodeArena, NodeId};
use rustc_hash::FxHashSet;

/// The member access pattern replaced by `"production"` when production
/// substitution is enabled.
const ENV_CHECK_PATH: [&str; 3] = ["process", "env", "NODE_ENV"];

/// Run the rewrite pass over the tree rooted at `root`.
///
/// Returns the id now occupying the root position; for a `Program` root that
/// is always `root` itself, a bare expression root may have been replaced.
pub fn rewrite(arena: &mut NodeArena, root: NodeId, options: &OptimizeOptions) -> NodeId {
    let mut rewriter = Rewriter {
        arena,
        production: options.production,
        fresh: FxHashSet::default(),
    };
    rewriter.run(root)
}

/// What happened to a statement under simplification, from its container's
/// point of view.
enum StmtAction {
    Unchanged,
    /// The statement was replaced by a single new statement.
    Replaced(NodeId),
    /// The statement dissolved into a sequence (if-collapse into block body).
    Spliced(Vec<NodeId>),
    Removed,
}

struct Rewriter<'a> {
    arena: &'a mut NodeArena,
    production: bool,
    /// Nodes synthesized as replacements during this pass; never re-entered.
    fresh: FxHashSet<NodeId>,
}

impl Rewriter<'_> {
    fn run(&mut self, root: NodeId) -> NodeId {
        match self.arena.get(root) {
            Node::Program { .. } | Node::Block { .. } => {
                self.simplify_block(root);
                root
            }
            Node::ExpressionStatement { .. }
            | Node::If { .. }
            | Node::Return { .. }
            | Node::Throw { .. }
            | Node::Break { .. }
            | Node::Continue { .. }
            | Node::VariableDeclaration { .. }
            | Node::While { .. }
            | Node::For { .. }
            | Node::Empty => {
                // A statement root cannot be removed or spliced; apply what
                // is applicable and keep the rest.
                match self.simplify_statement(root) {
                    StmtAction::Replaced(new) => new,
                    _ => root,
                }
            }
            _ => self.simplify_expr(root),
        }
    }

    // ====================================================================
    // Expressions
    // ====================================================================

    /// Simplify an expression in place. Returns the id now occupying the
    /// slot (the original, or its replacement).
    fn simplify_expr(&mut self, id: NodeId) -> NodeId {
        if self.fresh.contains(&id) {
            return id;
        }
        match self.arena.get(id) {
            Node::Literal(_) | Node::Identifier { .. } | Node::This => id,

            Node::TemplateLiteral { expressions, .. } => {
                let expressions = expressions.clone();
                for expr in expressions {
                    self.simplify_expr(expr);
                }
                id
            }

            Node::Unary { op, argument } => {
                let (op, argument) = (*op, *argument);
                let argument = self.simplify_expr(argument);
                match fold_unary(self.arena, op, argument) {
                    Some(lit) => self.replace_with_literal(id, lit),
                    None => id,
                }
            }

            Node::Binary { op, left, right } => {
                let (op, left, right) = (*op, *left, *right);
                let left = self.simplify_expr(left);
                let right = self.simplify_expr(right);
                match fold_binary(self.arena, op, left, right) {
                    Some(lit) => {
                        tracing::debug!(
                            target: "simplify",
                            op = op.as_str(),
                            "folded binary expression"
                        );
                        self.replace_with_literal(id, lit)
                    }
                    None => id,
                }
            }

            Node::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let (test, consequent, alternate) = (*test, *consequent, *alternate);
                let test = self.simplify_expr(test);
                match constant_value(self.arena, test) {
                    Some(value) => {
                        let branch = if is_truthy(&value) { consequent } else { alternate };
                        let branch = self.simplify_expr(branch);
                        tracing::debug!(target: "simplify", "collapsed constant conditional");
                        self.arena.replace_in_parent(id, branch);
                        branch
                    }
                    None => {
                        self.simplify_expr(consequent);
                        self.simplify_expr(alternate);
                        id
                    }
                }
            }

            Node::Member {
                object,
                property,
                computed,
            } => {
                let (object, property, computed) = (*object, *property, *computed);
                if self.production && matches_member_path(self.arena, id, &ENV_CHECK_PATH) {
                    tracing::debug!(target: "simplify", "substituted production environment check");
                    return self.replace_with_literal(id, LitValue::Str("production".to_string()));
                }
                self.simplify_expr(object);
                if computed {
                    self.simplify_expr(property);
                }
                id
            }

            Node::Logical { left, right, .. } | Node::Assignment { left, right, .. } => {
                let (left, right) = (*left, *right);
                self.simplify_expr(left);
                self.simplify_expr(right);
                id
            }

            Node::Call { callee, arguments } | Node::New { callee, arguments } => {
                let callee = *callee;
                let arguments = arguments.clone();
                self.simplify_expr(callee);
                for argument in arguments {
                    self.simplify_expr(argument);
                }
                id
            }

            Node::Sequence { expressions } => {
                let expressions = expressions.clone();
                for expr in expressions {
                    self.simplify_expr(expr);
                }
                id
            }

            Node::Array { elements } => {
                let elements = elements.clone();
                for element in elements.into_iter().flatten() {
                    self.simplify_expr(element);
                }
                id
            }

            Node::Object { properties } => {
                let properties = properties.clone();
                for property in properties {
                    if let Node::Property { key, value, computed, .. } = self.arena.get(property) {
                        let (key, value, computed) = (*key, *value, *computed);
                        if computed {
                            self.simplify_expr(key);
                        }
                        self.simplify_expr(value);
                    }
                }
                id
            }

            Node::Function { .. } => self.simplify_function(id),

            // Identity fallback: anything else is left exactly as it is.
            _ => id,
        }
    }

    /// Simplify a function's body, then convert an eligible anonymous
    /// function expression into an arrow function.
    fn simplify_function(&mut self, id: NodeId) -> NodeId {
        let Node::Function {
            flavor,
            name,
            params,
            body,
            is_async,
            is_generator,
        } = self.arena.get(id).clone()
        else {
            return id;
        };

        if matches!(self.arena.get(body), Node::Block { .. }) {
            self.simplify_block(body);
        } else {
            self.simplify_expr(body);
        }

        let convertible = flavor == FnFlavor::Expression
            && name.is_none()
            && !is_generator
            && !self.is_member_object(id)
            && !contains_this(self.arena, body);
        if !convertible {
            return id;
        }

        tracing::debug!(target: "simplify", "converted function expression to arrow");
        let arrow = self
            .arena
            .add_function(FnFlavor::Arrow, None, params, body, is_async, false);
        self.fresh.insert(arrow);
        self.arena.replace_in_parent(id, arrow);
        arrow
    }

    /// Whether `id` sits in the object position of a member access.
    /// Converting those would be ambiguous with call-on-function-literal
    /// syntax, so they are left alone.
    fn is_member_object(&self, id: NodeId) -> bool {
        match self.arena.parent(id) {
            Some(parent) => {
                matches!(self.arena.get(parent), Node::Member { object, .. } if *object == id)
            }
            None => false,
        }
    }

    fn replace_with_literal(&mut self, old: NodeId, lit: LitValue) -> NodeId {
        let new = self.arena.add_literal(lit);
        self.fresh.insert(new);
        self.arena.replace_in_parent(old, new);
        new
    }

    // ====================================================================
    // Statements and blocks
    // ====================================================================

    fn simplify_statement(&mut self, id: NodeId) -> StmtAction {
        if self.fresh.contains(&id) {
            return StmtAction::Unchanged;
        }
        match self.arena.get(id) {
            Node::ExpressionStatement { expression } => {
                let expression = *expression;
                let current = self.simplify_expr(expression);
                // A bare value directly under a block has no effect.
                let under_block = self
                    .arena
                    .parent(id)
                    .is_some_and(|p| self.arena.get(p).is_block_like());
                if under_block && self.arena.get(current).is_bare_value() {
                    tracing::debug!(target: "simplify", "removed effect-free statement");
                    StmtAction::Removed
                } else {
                    StmtAction::Unchanged
                }
            }

            Node::Block { .. } => {
                self.simplify_block(id);
                StmtAction::Unchanged
            }

            Node::If { .. } => self.simplify_if(id),

            Node::Return { argument } => {
                if let Some(argument) = *argument {
                    self.simplify_expr(argument);
                }
                StmtAction::Unchanged
            }

            Node::Throw { argument } => {
                let argument = *argument;
                self.simplify_expr(argument);
                StmtAction::Unchanged
            }

            Node::VariableDeclaration { declarations, .. } => {
                let declarations = declarations.clone();
                for declarator in declarations {
                    if let Node::VariableDeclarator {
                        init: Some(init), ..
                    } = self.arena.get(declarator)
                    {
                        let init = *init;
                        self.simplify_expr(init);
                    }
                }
                StmtAction::Unchanged
            }

            Node::While { test, body } => {
                let (test, body) = (*test, *body);
                self.simplify_expr(test);
                self.simplify_required_slot(body);
                StmtAction::Unchanged
            }

            Node::For {
                init,
                test,
                update,
                body,
            } => {
                let (init, test, update, body) = (*init, *test, *update, *body);
                if let Some(init) = init {
                    if matches!(self.arena.get(init), Node::VariableDeclaration { .. }) {
                        self.simplify_statement(init);
                    } else {
                        self.simplify_expr(init);
                    }
                }
                if let Some(test) = test {
                    self.simplify_expr(test);
                }
                if let Some(update) = update {
                    self.simplify_expr(update);
                }
                self.simplify_required_slot(body);
                StmtAction::Unchanged
            }

            Node::Function { .. } => {
                // Function declaration in statement position.
                self.simplify_function(id);
                StmtAction::Unchanged
            }

            Node::Break { .. } | Node::Continue { .. } | Node::Empty => StmtAction::Unchanged,

            // Identity fallback.
            _ => StmtAction::Unchanged,
        }
    }

    fn simplify_if(&mut self, id: NodeId) -> StmtAction {
        let (test, consequent, alternate) = match self.arena.get(id) {
            Node::If {
                test,
                consequent,
                alternate,
            } => (*test, *consequent, *alternate),
            _ => return StmtAction::Unchanged,
        };

        let test = self.simplify_expr(test);
        let Some(value) = constant_value(self.arena, test) else {
            // Test is not constant: simplify both branch slots in place.
            self.simplify_branch_slot(id, consequent, false);
            if let Some(alternate) = alternate {
                self.simplify_branch_slot(id, alternate, true);
            }
            return StmtAction::Unchanged;
        };

        let branch = if is_truthy(&value) {
            Some(consequent)
        } else {
            alternate
        };
        tracing::debug!(
            target: "simplify",
            truthy = is_truthy(&value),
            "collapsed constant if statement"
        );
        let Some(branch) = branch else {
            return StmtAction::Removed;
        };

        let statements = self.resolve_branch(branch);
        match statements.len() {
            0 => StmtAction::Removed,
            1 => StmtAction::Replaced(statements[0]),
            _ => StmtAction::Spliced(statements),
        }
    }

    /// Simplify a surviving if-branch and flatten it to the statement
    /// sequence that should take the if's place. A block branch dissolves
    /// into (a copy of) its statement list instead of keeping the wrapper.
    fn resolve_branch(&mut self, branch: NodeId) -> Vec<NodeId> {
        let statements = match self.simplify_statement(branch) {
            StmtAction::Unchanged => vec![branch],
            StmtAction::Replaced(new) => vec![new],
            StmtAction::Spliced(list) => list,
            StmtAction::Removed => Vec::new(),
        };
        if statements.len() == 1 {
            if let Node::Block { body } = self.arena.get(statements[0]) {
                return body.clone();
            }
        }
        statements
    }

    /// Simplify a branch statement that stays attached to a kept if.
    fn simplify_branch_slot(&mut self, if_id: NodeId, branch: NodeId, is_alternate: bool) {
        match self.simplify_statement(branch) {
            StmtAction::Unchanged => {}
            StmtAction::Replaced(new) => {
                self.arena.replace_in_parent(branch, new);
            }
            StmtAction::Spliced(statements) => {
                let block = self.arena.add_block(statements);
                self.arena.replace_in_parent(branch, block);
            }
            StmtAction::Removed => {
                if is_alternate {
                    if let Node::If { alternate, .. } = self.arena.get_mut(if_id) {
                        *alternate = None;
                    }
                    self.arena.set_parent(branch, None);
                } else {
                    let empty = self.arena.add_empty();
                    self.arena.replace_in_parent(branch, empty);
                }
            }
        }
    }

    /// Simplify a single-statement slot that must keep holding a statement
    /// (loop bodies). A removed statement leaves an empty statement behind.
    fn simplify_required_slot(&mut self, child: NodeId) {
        match self.simplify_statement(child) {
            StmtAction::Unchanged => {}
            StmtAction::Replaced(new) => {
                self.arena.replace_in_parent(child, new);
            }
            StmtAction::Spliced(statements) => {
                let block = self.arena.add_block(statements);
                self.arena.replace_in_parent(child, block);
            }
            StmtAction::Removed => {
                let empty = self.arena.add_empty();
                self.arena.replace_in_parent(child, empty);
            }
        }
    }

    /// Simplify a block (or program) body to a local fixpoint.
    ///
    /// Any statement-level mutation immediately re-applies the dead-code
    /// trim, then the affected slot is re-examined, so cascades settle
    /// before the traversal moves on.
    fn simplify_block(&mut self, block: NodeId) {
        self.trim_after_terminator(block);
        let mut index = 0;
        loop {
            let Some(&stmt) = self
                .arena
                .block_body(block)
                .and_then(|body| body.get(index))
            else {
                break;
            };
            match self.simplify_statement(stmt) {
                StmtAction::Unchanged => index += 1,
                StmtAction::Replaced(new) => {
                    self.arena.splice_statements(block, index, &[new]);
                    self.trim_after_terminator(block);
                }
                StmtAction::Spliced(statements) => {
                    self.arena.splice_statements(block, index, &statements);
                    self.trim_after_terminator(block);
                }
                StmtAction::Removed => {
                    self.arena.remove_statement(block, index);
                    self.trim_after_terminator(block);
                }
            }
        }
    }

    /// Truncate everything after the first terminator statement in a block
    /// body. One cut is enough per invocation; mutation re-entry covers the
    /// cascading cases.
    fn trim_after_terminator(&mut self, block: NodeId) {
        let Some(body) = self.arena.block_body(block) else {
            return;
        };
        let cut = body
            .iter()
            .position(|&stmt| self.arena.get(stmt).is_terminator());
        if let Some(index) = cut {
            if index + 1 < body.len() {
                tracing::debug!(
                    target: "simplify",
                    dropped = body.len() - index - 1,
                    "trimmed unreachable statements"
                );
                self.arena.truncate_block(block, index + 1);
            }
        }
    }
}

/// Whether `id` is a non-computed/string-keyed member chain spelling exactly
/// `path` (e.g. `process.env.NODE_ENV`, including `process.env["NODE_ENV"]`).
fn matches_member_path(arena: &NodeArena, id: NodeId, path: &[&str]) -> bool {
    let Some((last, prefix)) = path.split_last() else {
        return false;
    };
    let Node::Member {
        object,
        property,
        computed,
    } = arena.get(id)
    else {
        return false;
    };
    if !segment_matches(arena, *property, *computed, last) {
        return false;
    }
    match prefix {
        [root] => matches!(arena.get(*object), Node::Identifier { name } if name == root),
        _ => matches_member_path(arena, *object, prefix),
    }
}

fn segment_matches(arena: &NodeArena, id: NodeId, computed: bool, expected: &str) -> bool {
    match arena.get(id) {
        Node::Identifier { name } if !computed => name == expected,
        Node::Literal(LitValue::Str(s)) if computed => s == expected,
        _ => false,
    }
}

/// Whether a subtree references the enclosing execution context.
///
/// The search does not descend into ordinary (non-arrow) function bodies,
/// which bind their own context, but does descend into arrows, which
/// inherit the outer one.
pub(crate) fn contains_this(arena: &NodeArena, id: NodeId) -> bool {
    match arena.get(id) {
        Node::This => true,
        Node::Function { flavor, .. } if *flavor != FnFlavor::Arrow => false,
        _ => arena
            .children(id)
            .into_iter()
            .any(|child| contains_this(arena, child)),
    }
}
