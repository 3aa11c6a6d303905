//! The owning node arena.
//!
//! All nodes of one compilation unit live in a single `Vec`, addressed by
//! [`NodeId`]. A parallel table tracks each node's parent slot, so the tree
//! invariant (every node except the root has exactly one parent) is cheap to
//! maintain across mutation.
//!
//! Three mutation primitives cover everything the optimizer does:
//! - [`NodeArena::replace_in_parent`] swaps one child slot for a new node
//! - [`NodeArena::remove_statement`] drops a statement from a block body
//! - [`NodeArena::splice_statements`] replaces a statement with a copied
//!   sequence of statements (if/block collapsing)
//!
//! Replaced nodes stay in the arena as detached orphans; ids are never
//! reused, so a stale id can never alias a different node.

use crate::node::{
    BinaryOp, FnFlavor, LitValue, LogicalOp, Node, NodeId, PropertyKind, UnaryOp, VarKind,
};

#[derive(Debug, Default, Clone)]
pub struct NodeArena {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    /// Create an arena with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
            parents: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node. Ids are only minted by this arena and the arena never
    /// shrinks, so every id handed out stays valid for its lifetime.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// The parent slot holding `id`, or `None` for the root and for detached
    /// orphans.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.index()]
    }

    #[inline]
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) {
        self.parents[child.index()] = parent;
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.parents.push(None);
        id
    }

    fn adopt(&mut self, child: NodeId, parent: NodeId) {
        self.parents[child.index()] = Some(parent);
    }

    fn adopt_all(&mut self, children: &[NodeId], parent: NodeId) {
        for &child in children {
            self.adopt(child, parent);
        }
    }

    fn adopt_opt(&mut self, child: Option<NodeId>, parent: NodeId) {
        if let Some(child) = child {
            self.adopt(child, parent);
        }
    }

    // ========================================================================
    // Node creation
    // ========================================================================

    pub fn add_program(&mut self, body: Vec<NodeId>) -> NodeId {
        self.add_program_with_source_type(body, "script")
    }

    pub fn add_program_with_source_type(
        &mut self,
        body: Vec<NodeId>,
        source_type: impl Into<String>,
    ) -> NodeId {
        let id = self.push(Node::Program {
            body: body.clone(),
            source_type: source_type.into(),
        });
        self.adopt_all(&body, id);
        id
    }

    pub fn add_literal(&mut self, value: LitValue) -> NodeId {
        self.push(Node::Literal(value))
    }

    pub fn add_number(&mut self, value: f64) -> NodeId {
        self.push(Node::Literal(LitValue::Num(value)))
    }

    pub fn add_string(&mut self, value: impl Into<String>) -> NodeId {
        self.push(Node::Literal(LitValue::Str(value.into())))
    }

    pub fn add_bool(&mut self, value: bool) -> NodeId {
        self.push(Node::Literal(LitValue::Bool(value)))
    }

    pub fn add_regex(&mut self, pattern: impl Into<String>, flags: impl Into<String>) -> NodeId {
        self.push(Node::Literal(LitValue::Regex {
            pattern: pattern.into(),
            flags: flags.into(),
        }))
    }

    pub fn add_identifier(&mut self, name: impl Into<String>) -> NodeId {
        self.push(Node::Identifier { name: name.into() })
    }

    pub fn add_this(&mut self) -> NodeId {
        self.push(Node::This)
    }

    pub fn add_template(&mut self, quasis: Vec<String>, expressions: Vec<NodeId>) -> NodeId {
        let id = self.push(Node::TemplateLiteral {
            quasis,
            expressions: expressions.clone(),
        });
        self.adopt_all(&expressions, id);
        id
    }

    pub fn add_unary(&mut self, op: UnaryOp, argument: NodeId) -> NodeId {
        let id = self.push(Node::Unary { op, argument });
        self.adopt(argument, id);
        id
    }

    pub fn add_binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        let id = self.push(Node::Binary { op, left, right });
        self.adopt(left, id);
        self.adopt(right, id);
        id
    }

    pub fn add_logical(&mut self, op: LogicalOp, left: NodeId, right: NodeId) -> NodeId {
        let id = self.push(Node::Logical { op, left, right });
        self.adopt(left, id);
        self.adopt(right, id);
        id
    }

    pub fn add_assignment(&mut self, op: impl Into<String>, left: NodeId, right: NodeId) -> NodeId {
        let id = self.push(Node::Assignment {
            op: op.into(),
            left,
            right,
        });
        self.adopt(left, id);
        self.adopt(right, id);
        id
    }

    pub fn add_conditional(&mut self, test: NodeId, consequent: NodeId, alternate: NodeId) -> NodeId {
        let id = self.push(Node::Conditional {
            test,
            consequent,
            alternate,
        });
        self.adopt(test, id);
        self.adopt(consequent, id);
        self.adopt(alternate, id);
        id
    }

    pub fn add_member(&mut self, object: NodeId, property: NodeId, computed: bool) -> NodeId {
        let id = self.push(Node::Member {
            object,
            property,
            computed,
        });
        self.adopt(object, id);
        self.adopt(property, id);
        id
    }

    pub fn add_call(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        let id = self.push(Node::Call {
            callee,
            arguments: arguments.clone(),
        });
        self.adopt(callee, id);
        self.adopt_all(&arguments, id);
        id
    }

    pub fn add_new(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        let id = self.push(Node::New {
            callee,
            arguments: arguments.clone(),
        });
        self.adopt(callee, id);
        self.adopt_all(&arguments, id);
        id
    }

    pub fn add_sequence(&mut self, expressions: Vec<NodeId>) -> NodeId {
        let id = self.push(Node::Sequence {
            expressions: expressions.clone(),
        });
        self.adopt_all(&expressions, id);
        id
    }

    pub fn add_array(&mut self, elements: Vec<Option<NodeId>>) -> NodeId {
        let id = self.push(Node::Array {
            elements: elements.clone(),
        });
        for element in elements.into_iter().flatten() {
            self.adopt(element, id);
        }
        id
    }

    pub fn add_object(&mut self, properties: Vec<NodeId>) -> NodeId {
        let id = self.push(Node::Object {
            properties: properties.clone(),
        });
        self.adopt_all(&properties, id);
        id
    }

    pub fn add_property(
        &mut self,
        key: NodeId,
        value: NodeId,
        kind: PropertyKind,
        computed: bool,
        shorthand: bool,
    ) -> NodeId {
        let id = self.push(Node::Property {
            key,
            value,
            kind,
            computed,
            shorthand,
        });
        self.adopt(key, id);
        self.adopt(value, id);
        id
    }

    pub fn add_function(
        &mut self,
        flavor: FnFlavor,
        name: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
        is_async: bool,
        is_generator: bool,
    ) -> NodeId {
        let id = self.push(Node::Function {
            flavor,
            name,
            params: params.clone(),
            body,
            is_async,
            is_generator,
        });
        self.adopt_opt(name, id);
        self.adopt_all(&params, id);
        self.adopt(body, id);
        id
    }

    pub fn add_expression_statement(&mut self, expression: NodeId) -> NodeId {
        let id = self.push(Node::ExpressionStatement { expression });
        self.adopt(expression, id);
        id
    }

    pub fn add_block(&mut self, body: Vec<NodeId>) -> NodeId {
        let id = self.push(Node::Block { body: body.clone() });
        self.adopt_all(&body, id);
        id
    }

    pub fn add_if(&mut self, test: NodeId, consequent: NodeId, alternate: Option<NodeId>) -> NodeId {
        let id = self.push(Node::If {
            test,
            consequent,
            alternate,
        });
        self.adopt(test, id);
        self.adopt(consequent, id);
        self.adopt_opt(alternate, id);
        id
    }

    pub fn add_return(&mut self, argument: Option<NodeId>) -> NodeId {
        let id = self.push(Node::Return { argument });
        self.adopt_opt(argument, id);
        id
    }

    pub fn add_throw(&mut self, argument: NodeId) -> NodeId {
        let id = self.push(Node::Throw { argument });
        self.adopt(argument, id);
        id
    }

    pub fn add_break(&mut self, label: Option<String>) -> NodeId {
        self.push(Node::Break { label })
    }

    pub fn add_continue(&mut self, label: Option<String>) -> NodeId {
        self.push(Node::Continue { label })
    }

    pub fn add_variable_declaration(&mut self, kind: VarKind, declarations: Vec<NodeId>) -> NodeId {
        let id = self.push(Node::VariableDeclaration {
            kind,
            declarations: declarations.clone(),
        });
        self.adopt_all(&declarations, id);
        id
    }

    pub fn add_variable_declarator(&mut self, name: NodeId, init: Option<NodeId>) -> NodeId {
        let id = self.push(Node::VariableDeclarator { name, init });
        self.adopt(name, id);
        self.adopt_opt(init, id);
        id
    }

    pub fn add_while(&mut self, test: NodeId, body: NodeId) -> NodeId {
        let id = self.push(Node::While { test, body });
        self.adopt(test, id);
        self.adopt(body, id);
        id
    }

    pub fn add_for(
        &mut self,
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let id = self.push(Node::For {
            init,
            test,
            update,
            body,
        });
        self.adopt_opt(init, id);
        self.adopt_opt(test, id);
        self.adopt_opt(update, id);
        self.adopt(body, id);
        id
    }

    pub fn add_empty(&mut self) -> NodeId {
        self.push(Node::Empty)
    }

    // ========================================================================
    // Child enumeration
    // ========================================================================

    /// All direct children of `id`, in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self.get(id) {
            Node::Program { body, .. } | Node::Block { body } => out.extend_from_slice(body),
            Node::Literal(_)
            | Node::Identifier { .. }
            | Node::This
            | Node::Break { .. }
            | Node::Continue { .. }
            | Node::Empty => {}
            Node::TemplateLiteral { expressions, .. } => out.extend_from_slice(expressions),
            Node::Unary { argument, .. } => out.push(*argument),
            Node::Binary { left, right, .. }
            | Node::Logical { left, right, .. }
            | Node::Assignment { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            Node::Conditional {
                test,
                consequent,
                alternate,
            } => {
                out.push(*test);
                out.push(*consequent);
                out.push(*alternate);
            }
            Node::Member {
                object, property, ..
            } => {
                out.push(*object);
                out.push(*property);
            }
            Node::Call { callee, arguments } | Node::New { callee, arguments } => {
                out.push(*callee);
                out.extend_from_slice(arguments);
            }
            Node::Sequence { expressions } => out.extend_from_slice(expressions),
            Node::Array { elements } => out.extend(elements.iter().flatten().copied()),
            Node::Object { properties } => out.extend_from_slice(properties),
            Node::Property { key, value, .. } => {
                out.push(*key);
                out.push(*value);
            }
            Node::Function {
                name, params, body, ..
            } => {
                out.extend(name.iter().copied());
                out.extend_from_slice(params);
                out.push(*body);
            }
            Node::ExpressionStatement { expression } => out.push(*expression),
            Node::If {
                test,
                consequent,
                alternate,
            } => {
                out.push(*test);
                out.push(*consequent);
                out.extend(alternate.iter().copied());
            }
            Node::Return { argument } => out.extend(argument.iter().copied()),
            Node::Throw { argument } => out.push(*argument),
            Node::VariableDeclaration { declarations, .. } => out.extend_from_slice(declarations),
            Node::VariableDeclarator { name, init } => {
                out.push(*name);
                out.extend(init.iter().copied());
            }
            Node::While { test, body } => {
                out.push(*test);
                out.push(*body);
            }
            Node::For {
                init,
                test,
                update,
                body,
            } => {
                out.extend(init.iter().copied());
                out.extend(test.iter().copied());
                out.extend(update.iter().copied());
                out.push(*body);
            }
        }
        out
    }

    // ========================================================================
    // Mutation primitives
    // ========================================================================

    /// Replace `old` with `new` in `old`'s parent slot.
    ///
    /// `old` becomes a detached orphan; `new` inherits the parent link.
    /// Returns `false` if `old` has no parent (root) or the parent does not
    /// actually reference it (already detached).
    pub fn replace_in_parent(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        let replaced = replace_id_in_node(&mut self.nodes[parent.index()], old, new);
        if replaced {
            self.set_parent(new, Some(parent));
            self.set_parent(old, None);
        }
        replaced
    }

    /// Statement body of a `Program` or `Block`, if `id` is one.
    pub fn block_body(&self, id: NodeId) -> Option<&[NodeId]> {
        match self.get(id) {
            Node::Program { body, .. } | Node::Block { body } => Some(body),
            _ => None,
        }
    }

    /// Remove the statement at `index` from a block body. The removed
    /// statement is detached.
    pub fn remove_statement(&mut self, block: NodeId, index: usize) {
        let removed = match self.get_mut(block) {
            Node::Program { body, .. } | Node::Block { body } => body.remove(index),
            _ => return,
        };
        self.set_parent(removed, None);
    }

    /// Replace the statement at `index` of a block body with a copied
    /// sequence of statements. The sequence is always copied, never aliased
    /// from another block's body.
    pub fn splice_statements(&mut self, block: NodeId, index: usize, replacement: &[NodeId]) {
        let old = match self.get_mut(block) {
            Node::Program { body, .. } | Node::Block { body } => {
                let old = body[index];
                body.splice(index..=index, replacement.iter().copied());
                old
            }
            _ => return,
        };
        self.set_parent(old, None);
        for &stmt in replacement {
            self.set_parent(stmt, Some(block));
        }
    }

    /// Truncate a block body to `keep` statements, detaching the rest.
    pub fn truncate_block(&mut self, block: NodeId, keep: usize) {
        let dropped: Vec<NodeId> = match self.get_mut(block) {
            Node::Program { body, .. } | Node::Block { body } => {
                if keep >= body.len() {
                    return;
                }
                body.split_off(keep)
            }
            _ => return,
        };
        for stmt in dropped {
            self.set_parent(stmt, None);
        }
    }
}

/// Swap `old` for `new` in whichever child slot of `node` holds it.
fn replace_id_in_node(node: &mut Node, old: NodeId, new: NodeId) -> bool {
    let swap = |slot: &mut NodeId| -> bool {
        if *slot == old {
            *slot = new;
            true
        } else {
            false
        }
    };
    let swap_opt = |slot: &mut Option<NodeId>| -> bool {
        if *slot == Some(old) {
            *slot = Some(new);
            true
        } else {
            false
        }
    };
    let swap_list = |list: &mut Vec<NodeId>| -> bool {
        for slot in list.iter_mut() {
            if *slot == old {
                *slot = new;
                return true;
            }
        }
        false
    };

    match node {
        Node::Program { body, .. } | Node::Block { body } => swap_list(body),
        Node::Literal(_)
        | Node::Identifier { .. }
        | Node::This
        | Node::Break { .. }
        | Node::Continue { .. }
        | Node::Empty => false,
        Node::TemplateLiteral { expressions, .. } => swap_list(expressions),
        Node::Unary { argument, .. } => swap(argument),
        Node::Binary { left, right, .. }
        | Node::Logical { left, right, .. }
        | Node::Assignment { left, right, .. } => swap(left) || swap(right),
        Node::Conditional {
            test,
            consequent,
            alternate,
        } => swap(test) || swap(consequent) || swap(alternate),
        Node::Member {
            object, property, ..
        } => swap(object) || swap(property),
        Node::Call { callee, arguments } | Node::New { callee, arguments } => {
            swap(callee) || swap_list(arguments)
        }
        Node::Sequence { expressions } => swap_list(expressions),
        Node::Array { elements } => {
            for slot in elements.iter_mut() {
                if *slot == Some(old) {
                    *slot = Some(new);
                    return true;
                }
            }
            false
        }
        Node::Object { properties } => swap_list(properties),
        Node::Property { key, value, .. } => swap(key) || swap(value),
        Node::Function {
            name, params, body, ..
        } => swap_opt(name) || swap_list(params) || swap(body),
        Node::ExpressionStatement { expression } => swap(expression),
        Node::If {
            test,
            consequent,
            alternate,
        } => swap(test) || swap(consequent) || swap_opt(alternate),
        Node::Return { argument } => swap_opt(argument),
        Node::Throw { argument } => swap(argument),
        Node::VariableDeclaration { declarations, .. } => swap_list(declarations),
        Node::VariableDeclarator { name, init } => swap(name) || swap_opt(init),
        Node::While { test, body } => swap(test) || swap(body),
        Node::For {
            init,
            test,
            update,
            body,
        } => swap_opt(init) || swap_opt(test) || swap_opt(update) || swap(body),
    }
}
