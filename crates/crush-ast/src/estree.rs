//! ESTree JSON bridge.
//!
//! The optimizer does not parse source text and does not print it back; a
//! parsing collaborator hands us a tree and a printing collaborator takes one
//! away. The interchange format is ESTree-shaped JSON: [`from_json`] builds an
//! arena tree from it, [`to_json`] serializes any tree the optimizer produces,
//! including freshly synthesized literal, arrow-function and identifier nodes.
//!
//! Both the standard ESTree literal node (`Literal`) and the split literal
//! kinds some parsers emit (`NumericLiteral`, `StringLiteral`, ...) are
//! accepted on input; output always uses the standard shape.
//!
//! The core optimizer has no failure modes, but this boundary does: an
//! interchange node type or operator we do not model is an [`EstreeError`].

use crate::arena::NodeArena;
use crate::node::{
    BinaryOp, FnFlavor, LitValue, LogicalOp, Node, NodeId, PropertyKind, UnaryOp, VarKind,
};
use serde_json::{Map, Value, json};
use std::fmt;

#[derive(Debug)]
pub enum EstreeError {
    /// The input is not valid JSON at all.
    InvalidJson(String),
    /// A node `type` tag the tree model does not cover.
    UnsupportedNodeType(String),
    /// An operator string outside the modeled operator set.
    UnsupportedOperator { node_type: String, op: String },
    /// A required field is absent or has the wrong JSON type.
    MissingField { node_type: String, field: &'static str },
}

impl fmt::Display for EstreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstreeError::InvalidJson(msg) => write!(f, "invalid JSON input: {msg}"),
            EstreeError::UnsupportedNodeType(ty) => {
                write!(f, "unsupported ESTree node type `{ty}`")
            }
            EstreeError::UnsupportedOperator { node_type, op } => {
                write!(f, "unsupported operator `{op}` on `{node_type}`")
            }
            EstreeError::MissingField { node_type, field } => {
                write!(f, "`{node_type}` node is missing field `{field}`")
            }
        }
    }
}

impl std::error::Error for EstreeError {}

pub type Result<T> = std::result::Result<T, EstreeError>;

/// Deserialize an ESTree JSON string into a fresh subtree of `arena`.
pub fn from_json_str(source: &str, arena: &mut NodeArena) -> Result<NodeId> {
    let value: Value =
        serde_json::from_str(source).map_err(|e| EstreeError::InvalidJson(e.to_string()))?;
    from_json(&value, arena)
}

/// Build an arena subtree from one ESTree JSON node.
pub fn from_json(value: &Value, arena: &mut NodeArena) -> Result<NodeId> {
    let ty = node_type(value)?;
    let id = match ty {
        // ---------------------------------------------------------------
        // Literals
        // ---------------------------------------------------------------
        "Literal" => {
            if let Some(regex) = value.get("regex").and_then(Value::as_object) {
                let pattern = regex.get("pattern").and_then(Value::as_str).unwrap_or("");
                let flags = regex.get("flags").and_then(Value::as_str).unwrap_or("");
                arena.add_regex(pattern, flags)
            } else {
                let lit = match field(value, ty, "value")? {
                    Value::Null => LitValue::Null,
                    Value::Bool(b) => LitValue::Bool(*b),
                    Value::Number(n) => LitValue::Num(n.as_f64().unwrap_or(f64::NAN)),
                    Value::String(s) => LitValue::Str(s.clone()),
                    _ => return Err(EstreeError::MissingField {
                        node_type: ty.to_string(),
                        field: "value",
                    }),
                };
                arena.add_literal(lit)
            }
        }
        "NumericLiteral" => {
            let n = field(value, ty, "value")?
                .as_f64()
                .ok_or(EstreeError::MissingField {
                    node_type: ty.to_string(),
                    field: "value",
                })?;
            arena.add_number(n)
        }
        "StringLiteral" => arena.add_string(str_field(value, ty, "value")?),
        "BooleanLiteral" => {
            let b = field(value, ty, "value")?
                .as_bool()
                .ok_or(EstreeError::MissingField {
                    node_type: ty.to_string(),
                    field: "value",
                })?;
            arena.add_bool(b)
        }
        "NullLiteral" => arena.add_literal(LitValue::Null),
        "RegExpLiteral" => {
            let pattern = str_field(value, ty, "pattern")?;
            let flags = value.get("flags").and_then(Value::as_str).unwrap_or("");
            arena.add_regex(pattern, flags)
        }

        // ---------------------------------------------------------------
        // Expressions
        // ---------------------------------------------------------------
        "Identifier" => arena.add_identifier(str_field(value, ty, "name")?),
        "ThisExpression" => arena.add_this(),
        "TemplateLiteral" => {
            let quasi_values = field(value, ty, "quasis")?
                .as_array()
                .ok_or(EstreeError::MissingField {
                    node_type: ty.to_string(),
                    field: "quasis",
                })?;
            let mut quasis = Vec::with_capacity(quasi_values.len());
            for quasi in quasi_values {
                let cooked = quasi
                    .pointer("/value/cooked")
                    .or_else(|| quasi.pointer("/value/raw"))
                    .and_then(Value::as_str)
                    .unwrap_or("");
                quasis.push(cooked.to_string());
            }
            let expressions = child_list(value, arena, ty, "expressions")?;
            arena.add_template(quasis, expressions)
        }
        "UnaryExpression" => {
            let op_str = str_field(value, ty, "operator")?;
            let op = UnaryOp::from_str(op_str).ok_or_else(|| EstreeError::UnsupportedOperator {
                node_type: ty.to_string(),
                op: op_str.to_string(),
            })?;
            let argument = child(value, arena, ty, "argument")?;
            arena.add_unary(op, argument)
        }
        "BinaryExpression" => {
            let op_str = str_field(value, ty, "operator")?;
            let op = BinaryOp::from_str(op_str).ok_or_else(|| EstreeError::UnsupportedOperator {
                node_type: ty.to_string(),
                op: op_str.to_string(),
            })?;
            let left = child(value, arena, ty, "left")?;
            let right = child(value, arena, ty, "right")?;
            arena.add_binary(op, left, right)
        }
        "LogicalExpression" => {
            let op_str = str_field(value, ty, "operator")?;
            let op = LogicalOp::from_str(op_str).ok_or_else(|| EstreeError::UnsupportedOperator {
                node_type: ty.to_string(),
                op: op_str.to_string(),
            })?;
            let left = child(value, arena, ty, "left")?;
            let right = child(value, arena, ty, "right")?;
            arena.add_logical(op, left, right)
        }
        "AssignmentExpression" => {
            let op = str_field(value, ty, "operator")?.to_string();
            let left = child(value, arena, ty, "left")?;
            let right = child(value, arena, ty, "right")?;
            arena.add_assignment(op, left, right)
        }
        "ConditionalExpression" => {
            let test = child(value, arena, ty, "test")?;
            let consequent = child(value, arena, ty, "consequent")?;
            let alternate = child(value, arena, ty, "alternate")?;
            arena.add_conditional(test, consequent, alternate)
        }
        "MemberExpression" => {
            let object = child(value, arena, ty, "object")?;
            let property = child(value, arena, ty, "property")?;
            let computed = bool_field(value, "computed");
            arena.add_member(object, property, computed)
        }
        "CallExpression" => {
            let callee = child(value, arena, ty, "callee")?;
            let arguments = child_list(value, arena, ty, "arguments")?;
            arena.add_call(callee, arguments)
        }
        "NewExpression" => {
            let callee = child(value, arena, ty, "callee")?;
            let arguments = match value.get("arguments") {
                Some(Value::Array(_)) => child_list(value, arena, ty, "arguments")?,
                _ => Vec::new(),
            };
            arena.add_new(callee, arguments)
        }
        "SequenceExpression" => {
            let expressions = child_list(value, arena, ty, "expressions")?;
            arena.add_sequence(expressions)
        }
        "ArrayExpression" => {
            let raw = field(value, ty, "elements")?
                .as_array()
                .ok_or(EstreeError::MissingField {
                    node_type: ty.to_string(),
                    field: "elements",
                })?
                .clone();
            let mut elements = Vec::with_capacity(raw.len());
            for element in &raw {
                if element.is_null() {
                    elements.push(None);
                } else {
                    elements.push(Some(from_json(element, arena)?));
                }
            }
            arena.add_array(elements)
        }
        "ObjectExpression" => {
            let properties = child_list(value, arena, ty, "properties")?;
            arena.add_object(properties)
        }
        "Property" | "ObjectProperty" => {
            let key = child(value, arena, ty, "key")?;
            let prop_value = child(value, arena, ty, "value")?;
            let kind = value
                .get("kind")
                .and_then(Value::as_str)
                .and_then(PropertyKind::from_str)
                .unwrap_or(PropertyKind::Init);
            let computed = bool_field(value, "computed");
            let shorthand = bool_field(value, "shorthand");
            arena.add_property(key, prop_value, kind, computed, shorthand)
        }
        "FunctionExpression" | "FunctionDeclaration" | "ArrowFunctionExpression" => {
            let flavor = match ty {
                "FunctionDeclaration" => FnFlavor::Declaration,
                "ArrowFunctionExpression" => FnFlavor::Arrow,
                _ => FnFlavor::Expression,
            };
            let name = opt_child(value, arena, "id")?;
            let params = child_list(value, arena, ty, "params")?;
            let body = child(value, arena, ty, "body")?;
            let is_async = bool_field(value, "async");
            let is_generator = bool_field(value, "generator");
            arena.add_function(flavor, name, params, body, is_async, is_generator)
        }

        // ---------------------------------------------------------------
        // Statements
        // ---------------------------------------------------------------
        "Program" => {
            let source_type = value
                .get("sourceType")
                .and_then(Value::as_str)
                .unwrap_or("script")
                .to_string();
            let body = child_list(value, arena, ty, "body")?;
            arena.add_program_with_source_type(body, source_type)
        }
        "ExpressionStatement" => {
            let expression = child(value, arena, ty, "expression")?;
            arena.add_expression_statement(expression)
        }
        "BlockStatement" => {
            let body = child_list(value, arena, ty, "body")?;
            arena.add_block(body)
        }
        "IfStatement" => {
            let test = child(value, arena, ty, "test")?;
            let consequent = child(value, arena, ty, "consequent")?;
            let alternate = opt_child(value, arena, "alternate")?;
            arena.add_if(test, consequent, alternate)
        }
        "ReturnStatement" => {
            let argument = opt_child(value, arena, "argument")?;
            arena.add_return(argument)
        }
        "ThrowStatement" => {
            let argument = child(value, arena, ty, "argument")?;
            arena.add_throw(argument)
        }
        "BreakStatement" => arena.add_break(label_name(value)),
        "ContinueStatement" => arena.add_continue(label_name(value)),
        "EmptyStatement" => arena.add_empty(),
        "VariableDeclaration" => {
            let kind = VarKind::from_str(str_field(value, ty, "kind")?).ok_or_else(|| {
                EstreeError::MissingField {
                    node_type: ty.to_string(),
                    field: "kind",
                }
            })?;
            let declarations = child_list(value, arena, ty, "declarations")?;
            arena.add_variable_declaration(kind, declarations)
        }
        "VariableDeclarator" => {
            let name = child(value, arena, ty, "id")?;
            let init = opt_child(value, arena, "init")?;
            arena.add_variable_declarator(name, init)
        }
        "WhileStatement" => {
            let test = child(value, arena, ty, "test")?;
            let body = child(value, arena, ty, "body")?;
            arena.add_while(test, body)
        }
        "ForStatement" => {
            let init = opt_child(value, arena, "init")?;
            let test = opt_child(value, arena, "test")?;
            let update = opt_child(value, arena, "update")?;
            let body = child(value, arena, ty, "body")?;
            arena.add_for(init, test, update, body)
        }

        other => return Err(EstreeError::UnsupportedNodeType(other.to_string())),
    };
    Ok(id)
}

/// Serialize an arena subtree back into ESTree JSON.
pub fn to_json(arena: &NodeArena, id: NodeId) -> Value {
    match arena.get(id) {
        Node::Program { body, source_type } => json!({
            "type": "Program",
            "sourceType": source_type,
            "body": list(arena, body),
        }),
        Node::Literal(lit) => literal_to_json(lit),
        Node::Identifier { name } => json!({ "type": "Identifier", "name": name }),
        Node::This => json!({ "type": "ThisExpression" }),
        Node::TemplateLiteral {
            quasis,
            expressions,
        } => {
            let last = quasis.len().saturating_sub(1);
            let elements: Vec<Value> = quasis
                .iter()
                .enumerate()
                .map(|(i, cooked)| {
                    json!({
                        "type": "TemplateElement",
                        "value": { "cooked": cooked, "raw": cooked },
                        "tail": i == last,
                    })
                })
                .collect();
            json!({
                "type": "TemplateLiteral",
                "quasis": elements,
                "expressions": list(arena, expressions),
            })
        }
        Node::Unary { op, argument } => json!({
            "type": "UnaryExpression",
            "operator": op.as_str(),
            "prefix": true,
            "argument": to_json(arena, *argument),
        }),
        Node::Binary { op, left, right } => json!({
            "type": "BinaryExpression",
            "operator": op.as_str(),
            "left": to_json(arena, *left),
            "right": to_json(arena, *right),
        }),
        Node::Logical { op, left, right } => json!({
            "type": "LogicalExpression",
            "operator": op.as_str(),
            "left": to_json(arena, *left),
            "right": to_json(arena, *right),
        }),
        Node::Assignment { op, left, right } => json!({
            "type": "AssignmentExpression",
            "operator": op,
            "left": to_json(arena, *left),
            "right": to_json(arena, *right),
        }),
        Node::Conditional {
            test,
            consequent,
            alternate,
        } => json!({
            "type": "ConditionalExpression",
            "test": to_json(arena, *test),
            "consequent": to_json(arena, *consequent),
            "alternate": to_json(arena, *alternate),
        }),
        Node::Member {
            object,
            property,
            computed,
        } => json!({
            "type": "MemberExpression",
            "object": to_json(arena, *object),
            "property": to_json(arena, *property),
            "computed": computed,
        }),
        Node::Call { callee, arguments } => json!({
            "type": "CallExpression",
            "callee": to_json(arena, *callee),
            "arguments": list(arena, arguments),
        }),
        Node::New { callee, arguments } => json!({
            "type": "NewExpression",
            "callee": to_json(arena, *callee),
            "arguments": list(arena, arguments),
        }),
        Node::Sequence { expressions } => json!({
            "type": "SequenceExpression",
            "expressions": list(arena, expressions),
        }),
        Node::Array { elements } => {
            let out: Vec<Value> = elements
                .iter()
                .map(|e| match e {
                    Some(id) => to_json(arena, *id),
                    None => Value::Null,
                })
                .collect();
            json!({ "type": "ArrayExpression", "elements": out })
        }
        Node::Object { properties } => json!({
            "type": "ObjectExpression",
            "properties": list(arena, properties),
        }),
        Node::Property {
            key,
            value,
            kind,
            computed,
            shorthand,
        } => json!({
            "type": "Property",
            "key": to_json(arena, *key),
            "value": to_json(arena, *value),
            "kind": kind.as_str(),
            "computed": computed,
            "shorthand": shorthand,
        }),
        Node::Function {
            flavor,
            name,
            params,
            body,
            is_async,
            is_generator,
        } => {
            let ty = match flavor {
                FnFlavor::Declaration => "FunctionDeclaration",
                FnFlavor::Expression => "FunctionExpression",
                FnFlavor::Arrow => "ArrowFunctionExpression",
            };
            let mut obj = Map::new();
            obj.insert("type".into(), json!(ty));
            obj.insert(
                "id".into(),
                match name {
                    Some(n) => to_json(arena, *n),
                    None => Value::Null,
                },
            );
            obj.insert("params".into(), Value::Array(list(arena, params)));
            obj.insert("body".into(), to_json(arena, *body));
            obj.insert("async".into(), json!(is_async));
            obj.insert("generator".into(), json!(is_generator));
            if *flavor == FnFlavor::Arrow {
                let expression = !matches!(arena.get(*body), Node::Block { .. });
                obj.insert("expression".into(), json!(expression));
            }
            Value::Object(obj)
        }
        Node::ExpressionStatement { expression } => json!({
            "type": "ExpressionStatement",
            "expression": to_json(arena, *expression),
        }),
        Node::Block { body } => json!({
            "type": "BlockStatement",
            "body": list(arena, body),
        }),
        Node::If {
            test,
            consequent,
            alternate,
        } => json!({
            "type": "IfStatement",
            "test": to_json(arena, *test),
            "consequent": to_json(arena, *consequent),
            "alternate": match alternate {
                Some(a) => to_json(arena, *a),
                None => Value::Null,
            },
        }),
        Node::Return { argument } => json!({
            "type": "ReturnStatement",
            "argument": match argument {
                Some(a) => to_json(arena, *a),
                None => Value::Null,
            },
        }),
        Node::Throw { argument } => json!({
            "type": "ThrowStatement",
            "argument": to_json(arena, *argument),
        }),
        Node::Break { label } => json!({
            "type": "BreakStatement",
            "label": label_to_json(label),
        }),
        Node::Continue { label } => json!({
            "type": "ContinueStatement",
            "label": label_to_json(label),
        }),
        Node::VariableDeclaration { kind, declarations } => json!({
            "type": "VariableDeclaration",
            "kind": kind.as_str(),
            "declarations": list(arena, declarations),
        }),
        Node::VariableDeclarator { name, init } => json!({
            "type": "VariableDeclarator",
            "id": to_json(arena, *name),
            "init": match init {
                Some(i) => to_json(arena, *i),
                None => Value::Null,
            },
        }),
        Node::While { test, body } => json!({
            "type": "WhileStatement",
            "test": to_json(arena, *test),
            "body": to_json(arena, *body),
        }),
        Node::For {
            init,
            test,
            update,
            body,
        } => {
            let opt = |slot: &Option<NodeId>| match slot {
                Some(id) => to_json(arena, *id),
                None => Value::Null,
            };
            json!({
                "type": "ForStatement",
                "init": opt(init),
                "test": opt(test),
                "update": opt(update),
                "body": to_json(arena, *body),
            })
        }
        Node::Empty => json!({ "type": "EmptyStatement" }),
    }
}

fn literal_to_json(lit: &LitValue) -> Value {
    match lit {
        LitValue::Num(n) => {
            // Non-finite numbers have no JSON representation; they round-trip
            // as the global identifiers a parser would have produced anyway.
            if n.is_nan() {
                json!({ "type": "Identifier", "name": "NaN" })
            } else if n.is_infinite() {
                let infinity = json!({ "type": "Identifier", "name": "Infinity" });
                if *n < 0.0 {
                    json!({
                        "type": "UnaryExpression",
                        "operator": "-",
                        "prefix": true,
                        "argument": infinity,
                    })
                } else {
                    infinity
                }
            } else {
                json!({ "type": "Literal", "value": n })
            }
        }
        LitValue::Str(s) => json!({ "type": "Literal", "value": s }),
        LitValue::Bool(b) => json!({ "type": "Literal", "value": b }),
        LitValue::Null => json!({ "type": "Literal", "value": Value::Null }),
        LitValue::Regex { pattern, flags } => json!({
            "type": "Literal",
            "value": {},
            "regex": { "pattern": pattern, "flags": flags },
        }),
        LitValue::Undefined => json!({ "type": "Identifier", "name": "undefined" }),
    }
}

fn label_to_json(label: &Option<String>) -> Value {
    match label {
        Some(name) => json!({ "type": "Identifier", "name": name }),
        None => Value::Null,
    }
}

fn node_type(value: &Value) -> Result<&str> {
    value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| EstreeError::MissingField {
            node_type: "<unknown>".to_string(),
            field: "type",
        })
}

fn field<'a>(value: &'a Value, node_type: &str, name: &'static str) -> Result<&'a Value> {
    value.get(name).ok_or_else(|| EstreeError::MissingField {
        node_type: node_type.to_string(),
        field: name,
    })
}

fn str_field<'a>(value: &'a Value, node_type: &str, name: &'static str) -> Result<&'a str> {
    field(value, node_type, name)?
        .as_str()
        .ok_or_else(|| EstreeError::MissingField {
            node_type: node_type.to_string(),
            field: name,
        })
}

fn bool_field(value: &Value, name: &str) -> bool {
    value.get(name).and_then(Value::as_bool).unwrap_or(false)
}

fn child(value: &Value, arena: &mut NodeArena, node_type: &str, name: &'static str) -> Result<NodeId> {
    from_json(field(value, node_type, name)?, arena)
}

fn opt_child(value: &Value, arena: &mut NodeArena, name: &str) -> Result<Option<NodeId>> {
    match value.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Ok(Some(from_json(v, arena)?)),
    }
}

fn child_list(
    value: &Value,
    arena: &mut NodeArena,
    node_type: &str,
    name: &'static str,
) -> Result<Vec<NodeId>> {
    let raw = field(value, node_type, name)?
        .as_array()
        .ok_or_else(|| EstreeError::MissingField {
            node_type: node_type.to_string(),
            field: name,
        })?
        .clone();
    let mut out = Vec::with_capacity(raw.len());
    for item in &raw {
        out.push(from_json(item, arena)?);
    }
    Ok(out)
}

fn label_name(value: &Value) -> Option<String> {
    value
        .pointer("/label/name")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn list(arena: &NodeArena, ids: &[NodeId]) -> Vec<Value> {
    ids.iter().map(|&id| to_json(arena, id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_program() {
        let source = json!({
            "type": "Program",
            "sourceType": "script",
            "body": [{
                "type": "ExpressionStatement",
                "expression": {
                    "type": "BinaryExpression",
                    "operator": "*",
                    "left": { "type": "Literal", "value": 3.0 },
                    "right": { "type": "Literal", "value": 4.0 },
                },
            }],
        });
        let mut arena = NodeArena::new();
        let root = from_json(&source, &mut arena).unwrap();
        assert_eq!(to_json(&arena, root), source);
    }

    #[test]
    fn module_source_type_round_trips() {
        let source = json!({
            "type": "Program",
            "sourceType": "module",
            "body": [],
        });
        let mut arena = NodeArena::new();
        let root = from_json(&source, &mut arena).unwrap();
        assert_eq!(to_json(&arena, root), source);

        // absent sourceType defaults to a script
        let bare = json!({ "type": "Program", "body": [] });
        let root = from_json(&bare, &mut arena).unwrap();
        assert_eq!(to_json(&arena, root)["sourceType"], "script");
    }

    #[test]
    fn accepts_split_literal_kinds() {
        let mut arena = NodeArena::new();
        let id = from_json(&json!({ "type": "NumericLiteral", "value": 7.0 }), &mut arena).unwrap();
        assert_eq!(arena.get(id), &Node::Literal(LitValue::Num(7.0)));

        let id = from_json(
            &json!({ "type": "RegExpLiteral", "pattern": "ab+", "flags": "gi" }),
            &mut arena,
        )
        .unwrap();
        let Node::Literal(LitValue::Regex { pattern, flags }) = arena.get(id) else {
            panic!("expected regex literal");
        };
        assert_eq!(pattern, "ab+");
        assert_eq!(flags, "gi");
    }

    #[test]
    fn infinity_serializes_as_identifier() {
        let mut arena = NodeArena::new();
        let id = arena.add_number(f64::INFINITY);
        assert_eq!(
            to_json(&arena, id),
            json!({ "type": "Identifier", "name": "Infinity" })
        );

        let id = arena.add_number(f64::NEG_INFINITY);
        let out = to_json(&arena, id);
        assert_eq!(out["type"], "UnaryExpression");
        assert_eq!(out["operator"], "-");
    }

    #[test]
    fn unknown_node_type_is_an_error() {
        let mut arena = NodeArena::new();
        let err = from_json(&json!({ "type": "WithStatement" }), &mut arena).unwrap_err();
        assert!(matches!(err, EstreeError::UnsupportedNodeType(ty) if ty == "WithStatement"));
    }

    #[test]
    fn function_round_trip_keeps_flags() {
        let source = json!({
            "type": "FunctionExpression",
            "id": Value::Null,
            "params": [{ "type": "Identifier", "name": "x" }],
            "body": { "type": "BlockStatement", "body": [] },
            "async": true,
            "generator": false,
        });
        let mut arena = NodeArena::new();
        let id = from_json(&source, &mut arena).unwrap();
        assert_eq!(to_json(&arena, id), source);
    }
}
