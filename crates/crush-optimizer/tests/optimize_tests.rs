//! End-to-end coverage of the optimizer pipeline: build a tree, run
//! [`optimize`], and assert on the serialized result.

use crush_ast::{BinaryOp, FnFlavor, NodeArena, NodeId, VarKind, estree};
use crush_optimizer::{OptimizeOptions, optimize};
use serde_json::{Value, json};

fn run(arena: &mut NodeArena, root: NodeId, options: OptimizeOptions) -> Value {
    let root = optimize(arena, root, &options);
    estree::to_json(arena, root)
}

fn call_stmt(arena: &mut NodeArena, name: &str) -> NodeId {
    let callee = arena.add_identifier(name);
    let call = arena.add_call(callee, vec![]);
    arena.add_expression_statement(call)
}

#[test]
fn folds_arithmetic_inside_initializers() {
    // var x = 3 * 4 + 1;
    let mut arena = NodeArena::new();
    let three = arena.add_number(3.0);
    let four = arena.add_number(4.0);
    let product = arena.add_binary(BinaryOp::Mul, three, four);
    let one = arena.add_number(1.0);
    let sum = arena.add_binary(BinaryOp::Add, product, one);
    let name = arena.add_identifier("x");
    let decl = arena.add_variable_declarator(name, Some(sum));
    let stmt = arena.add_variable_declaration(VarKind::Var, vec![decl]);
    let program = arena.add_program(vec![stmt]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    assert_eq!(
        out["body"][0]["declarations"][0]["init"],
        json!({ "type": "Literal", "value": 13.0 })
    );
}

#[test]
fn collapses_constant_conditional_expression() {
    // var x = "" ? a : b;  ->  var x = b;
    let mut arena = NodeArena::new();
    let test = arena.add_string("");
    let a = arena.add_identifier("a");
    let b = arena.add_identifier("b");
    let cond = arena.add_conditional(test, a, b);
    let name = arena.add_identifier("x");
    let decl = arena.add_variable_declarator(name, Some(cond));
    let stmt = arena.add_variable_declaration(VarKind::Var, vec![decl]);
    let program = arena.add_program(vec![stmt]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    assert_eq!(
        out["body"][0]["declarations"][0]["init"],
        json!({ "type": "Identifier", "name": "b" })
    );
}

#[test]
fn true_branch_block_splices_into_parent() {
    // if (true) { f(); g(); } h();  ->  f(); g(); h();
    let mut arena = NodeArena::new();
    let test = arena.add_bool(true);
    let f = call_stmt(&mut arena, "f");
    let g = call_stmt(&mut arena, "g");
    let block = arena.add_block(vec![f, g]);
    let if_stmt = arena.add_if(test, block, None);
    let h = call_stmt(&mut arena, "h");
    let program = arena.add_program(vec![if_stmt, h]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let body = out["body"].as_array().unwrap();
    assert_eq!(body.len(), 3);
    for (stmt, name) in body.iter().zip(["f", "g", "h"]) {
        assert_eq!(stmt["expression"]["callee"]["name"], name);
    }
}

#[test]
fn false_test_without_alternate_removes_the_if() {
    let mut arena = NodeArena::new();
    let test = arena.add_number(0.0);
    let f = call_stmt(&mut arena, "f");
    let block = arena.add_block(vec![f]);
    let if_stmt = arena.add_if(test, block, None);
    let after = call_stmt(&mut arena, "after");
    let program = arena.add_program(vec![if_stmt, after]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let body = out["body"].as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["expression"]["callee"]["name"], "after");
}

#[test]
fn false_test_keeps_the_alternate() {
    // if (0) f(); else g();  ->  g();
    let mut arena = NodeArena::new();
    let test = arena.add_number(0.0);
    let f = call_stmt(&mut arena, "f");
    let g = call_stmt(&mut arena, "g");
    let if_stmt = arena.add_if(test, f, Some(g));
    let program = arena.add_program(vec![if_stmt]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let body = out["body"].as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["expression"]["callee"]["name"], "g");
}

#[test]
fn non_constant_test_leaves_the_if_but_simplifies_branches() {
    // if (x) { 1 + 2; f(); }  ->  if (x) { f(); }  (folded 3 is then useless)
    let mut arena = NodeArena::new();
    let test = arena.add_identifier("x");
    let one = arena.add_number(1.0);
    let two = arena.add_number(2.0);
    let sum = arena.add_binary(BinaryOp::Add, one, two);
    let sum_stmt = arena.add_expression_statement(sum);
    let f = call_stmt(&mut arena, "f");
    let block = arena.add_block(vec![sum_stmt, f]);
    let if_stmt = arena.add_if(test, block, None);
    let program = arena.add_program(vec![if_stmt]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let body = out["body"].as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["type"], "IfStatement");
    let branch = body[0]["consequent"]["body"].as_array().unwrap();
    assert_eq!(branch.len(), 1);
    assert_eq!(branch[0]["expression"]["callee"]["name"], "f");
}

#[test]
fn statements_after_a_terminator_are_dropped() {
    // function f() { return 1; g(); h(); }
    let mut arena = NodeArena::new();
    let one = arena.add_number(1.0);
    let ret = arena.add_return(Some(one));
    let g = call_stmt(&mut arena, "g");
    let h = call_stmt(&mut arena, "h");
    let body = arena.add_block(vec![ret, g, h]);
    let name = arena.add_identifier("f");
    let func = arena.add_function(FnFlavor::Declaration, Some(name), vec![], body, false, false);
    let program = arena.add_program(vec![func]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let body = out["body"][0]["body"]["body"].as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["type"], "ReturnStatement");
}

#[test]
fn collapsed_branch_exposes_dead_code() {
    // { if (true) { return x; } g(); }  ->  { return x; }
    let mut arena = NodeArena::new();
    let test = arena.add_bool(true);
    let x = arena.add_identifier("x");
    let ret = arena.add_return(Some(x));
    let inner = arena.add_block(vec![ret]);
    let if_stmt = arena.add_if(test, inner, None);
    let g = call_stmt(&mut arena, "g");
    let block = arena.add_block(vec![if_stmt, g]);
    let fname = arena.add_identifier("f");
    let func = arena.add_function(FnFlavor::Declaration, Some(fname), vec![], block, false, false);
    let program = arena.add_program(vec![func]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let body = out["body"][0]["body"]["body"].as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["type"], "ReturnStatement");
}

#[test]
fn bare_values_under_a_block_are_removed() {
    // 5; x; f();  ->  f();
    let mut arena = NodeArena::new();
    let five = arena.add_number(5.0);
    let five_stmt = arena.add_expression_statement(five);
    let x = arena.add_identifier("x");
    let x_stmt = arena.add_expression_statement(x);
    let f = call_stmt(&mut arena, "f");
    let program = arena.add_program(vec![five_stmt, x_stmt, f]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let body = out["body"].as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["expression"]["callee"]["name"], "f");
}

#[test]
fn folding_a_statement_expression_makes_it_removable() {
    // "a" + "b";  ->  (folds to "ab", then the bare string goes away)
    let mut arena = NodeArena::new();
    let a = arena.add_string("a");
    let b = arena.add_string("b");
    let sum = arena.add_binary(BinaryOp::Add, a, b);
    let stmt = arena.add_expression_statement(sum);
    let program = arena.add_program(vec![stmt]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    assert_eq!(out["body"].as_array().unwrap().len(), 0);
}

fn env_check_program(arena: &mut NodeArena) -> NodeId {
    // if (process.env.NODE_ENV === "production") { prod(); } else { dev(); }
    let process = arena.add_identifier("process");
    let env = arena.add_identifier("env");
    let node_env = arena.add_identifier("NODE_ENV");
    let inner = arena.add_member(process, env, false);
    let member = arena.add_member(inner, node_env, false);
    let production = arena.add_string("production");
    let test = arena.add_binary(BinaryOp::EqEqEq, member, production);
    let prod = call_stmt(arena, "prod");
    let consequent = arena.add_block(vec![prod]);
    let dev = call_stmt(arena, "dev");
    let alternate = arena.add_block(vec![dev]);
    let if_stmt = arena.add_if(test, consequent, Some(alternate));
    arena.add_program(vec![if_stmt])
}

#[test]
fn production_mode_resolves_environment_checks() {
    let mut arena = NodeArena::new();
    let program = env_check_program(&mut arena);
    let out = run(
        &mut arena,
        program,
        OptimizeOptions {
            production: true,
            ..Default::default()
        },
    );
    let body = out["body"].as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["expression"]["callee"]["name"], "prod");
}

#[test]
fn environment_checks_survive_without_production_mode() {
    let mut arena = NodeArena::new();
    let program = env_check_program(&mut arena);
    let out = run(&mut arena, program, OptimizeOptions::default());
    let body = out["body"].as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["type"], "IfStatement");
    assert_eq!(body[0]["test"]["left"]["type"], "MemberExpression");
}

fn anonymous_function_declaration(arena: &mut NodeArena, body_stmts: Vec<NodeId>) -> NodeId {
    // var f = function (a) { ... };
    let param = arena.add_identifier("a");
    let body = arena.add_block(body_stmts);
    let func = arena.add_function(FnFlavor::Expression, None, vec![param], body, false, false);
    let name = arena.add_identifier("f");
    let decl = arena.add_variable_declarator(name, Some(func));
    let stmt = arena.add_variable_declaration(VarKind::Var, vec![decl]);
    arena.add_program(vec![stmt])
}

#[test]
fn anonymous_function_expression_becomes_arrow() {
    let mut arena = NodeArena::new();
    let a = arena.add_identifier("a");
    let ret = arena.add_return(Some(a));
    let program = anonymous_function_declaration(&mut arena, vec![ret]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let init = &out["body"][0]["declarations"][0]["init"];
    assert_eq!(init["type"], "ArrowFunctionExpression");
    assert_eq!(init["expression"], json!(false));
    assert_eq!(init["params"][0]["name"], "a");
}

#[test]
fn functions_referencing_this_stay_functions() {
    let mut arena = NodeArena::new();
    let this = arena.add_this();
    let ret = arena.add_return(Some(this));
    let program = anonymous_function_declaration(&mut arena, vec![ret]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let init = &out["body"][0]["declarations"][0]["init"];
    assert_eq!(init["type"], "FunctionExpression");
}

#[test]
fn named_and_generator_functions_stay_functions() {
    // var f = function self() {};
    let mut arena = NodeArena::new();
    let self_name = arena.add_identifier("self");
    let body = arena.add_block(vec![]);
    let named = arena.add_function(FnFlavor::Expression, Some(self_name), vec![], body, false, false);
    let f = arena.add_identifier("f");
    let decl_f = arena.add_variable_declarator(f, Some(named));
    let stmt_f = arena.add_variable_declaration(VarKind::Var, vec![decl_f]);
    // var g = function* () {};
    let body = arena.add_block(vec![]);
    let generator = arena.add_function(FnFlavor::Expression, None, vec![], body, false, true);
    let g = arena.add_identifier("g");
    let decl_g = arena.add_variable_declarator(g, Some(generator));
    let stmt_g = arena.add_variable_declaration(VarKind::Var, vec![decl_g]);
    let program = arena.add_program(vec![stmt_f, stmt_g]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    assert_eq!(
        out["body"][0]["declarations"][0]["init"]["type"],
        "FunctionExpression"
    );
    assert_eq!(
        out["body"][1]["declarations"][0]["init"]["type"],
        "FunctionExpression"
    );
}

#[test]
fn function_in_member_object_position_is_not_converted() {
    // (function () {}).call;
    let mut arena = NodeArena::new();
    let body = arena.add_block(vec![]);
    let func = arena.add_function(FnFlavor::Expression, None, vec![], body, false, false);
    let call_prop = arena.add_identifier("call");
    let member = arena.add_member(func, call_prop, false);
    let callee_call = arena.add_call(member, vec![]);
    let stmt = arena.add_expression_statement(callee_call);
    let program = arena.add_program(vec![stmt]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    assert_eq!(
        out["body"][0]["expression"]["callee"]["object"]["type"],
        "FunctionExpression"
    );
}

#[test]
fn nested_ordinary_function_hides_this_from_the_outer_one() {
    // var f = function () { return function () { return this; }; };
    // The outer function has no `this` of its own and converts; the inner
    // one keeps it and stays a function expression.
    let mut arena = NodeArena::new();
    let this = arena.add_this();
    let inner_ret = arena.add_return(Some(this));
    let inner_body = arena.add_block(vec![inner_ret]);
    let inner = arena.add_function(FnFlavor::Expression, None, vec![], inner_body, false, false);
    let outer_ret = arena.add_return(Some(inner));
    let program = anonymous_function_declaration(&mut arena, vec![outer_ret]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    let outer = &out["body"][0]["declarations"][0]["init"];
    assert_eq!(outer["type"], "ArrowFunctionExpression");
    assert_eq!(
        outer["body"]["body"][0]["argument"]["type"],
        "FunctionExpression"
    );
}

#[test]
fn mangling_renames_identifiers_consistently() {
    // var total = count + count;
    let mut arena = NodeArena::new();
    let left = arena.add_identifier("count");
    let right = arena.add_identifier("count");
    let sum = arena.add_binary(BinaryOp::Add, left, right);
    let name = arena.add_identifier("total");
    let decl = arena.add_variable_declarator(name, Some(sum));
    let stmt = arena.add_variable_declaration(VarKind::Var, vec![decl]);
    let program = arena.add_program(vec![stmt]);

    let out = run(
        &mut arena,
        program,
        OptimizeOptions {
            mangle: true,
            ..Default::default()
        },
    );
    let decl = &out["body"][0]["declarations"][0];
    assert_eq!(decl["id"]["name"], "$a");
    assert_eq!(decl["init"]["left"]["name"], "$b");
    assert_eq!(decl["init"]["right"]["name"], "$b");
}

#[test]
fn optimization_is_idempotent() {
    let mut arena = NodeArena::new();
    // A program that exercises folding, branch collapse, trimming and arrow
    // conversion at once.
    let test = arena.add_bool(true);
    let one = arena.add_number(1.0);
    let two = arena.add_number(2.0);
    let sum = arena.add_binary(BinaryOp::Add, one, two);
    let ret = arena.add_return(Some(sum));
    let dead = call_stmt(&mut arena, "dead");
    let inner = arena.add_block(vec![ret, dead]);
    let if_stmt = arena.add_if(test, inner, None);
    let body = arena.add_block(vec![if_stmt]);
    let func = arena.add_function(FnFlavor::Expression, None, vec![], body, false, false);
    let name = arena.add_identifier("f");
    let decl = arena.add_variable_declarator(name, Some(func));
    let stmt = arena.add_variable_declaration(VarKind::Var, vec![decl]);
    let program = arena.add_program(vec![stmt]);

    let options = OptimizeOptions::default();
    let root = optimize(&mut arena, program, &options);
    let first = estree::to_json(&arena, root);
    let root = optimize(&mut arena, root, &options);
    let second = estree::to_json(&arena, root);
    assert_eq!(first, second);

    // and the single pass did the whole job
    let init = &first["body"][0]["declarations"][0]["init"];
    assert_eq!(init["type"], "ArrowFunctionExpression");
    let inner_body = init["body"]["body"].as_array().unwrap();
    assert_eq!(inner_body.len(), 1);
    assert_eq!(
        inner_body[0],
        json!({
            "type": "ReturnStatement",
            "argument": { "type": "Literal", "value": 3.0 },
        })
    );
}

#[test]
fn json_pipeline_round_trip() {
    // Feed ESTree JSON through parse -> optimize -> serialize, the way the
    // command-line front end does.
    let source = json!({
        "type": "Program",
        "sourceType": "script",
        "body": [{
            "type": "IfStatement",
            "test": { "type": "Literal", "value": false },
            "consequent": {
                "type": "BlockStatement",
                "body": [{
                    "type": "ExpressionStatement",
                    "expression": {
                        "type": "CallExpression",
                        "callee": { "type": "Identifier", "name": "debug" },
                        "arguments": [],
                    },
                }],
            },
            "alternate": Value::Null,
        }],
    });
    let mut arena = NodeArena::new();
    let root = estree::from_json(&source, &mut arena).unwrap();
    let out = run(&mut arena, root, OptimizeOptions::default());
    assert_eq!(
        out,
        json!({ "type": "Program", "sourceType": "script", "body": [] })
    );
}

#[test]
fn unknown_constructs_pass_through_unchanged() {
    // while (x) { y(); }  offers nothing to optimize
    let mut arena = NodeArena::new();
    let x = arena.add_identifier("x");
    let y = call_stmt(&mut arena, "y");
    let body = arena.add_block(vec![y]);
    let loop_stmt = arena.add_while(x, body);
    let program = arena.add_program(vec![loop_stmt]);

    let before = estree::to_json(&arena, program);
    let out = run(&mut arena, program, OptimizeOptions::default());
    assert_eq!(before, out);
}

#[test]
fn regex_literals_compare_as_objects() {
    // var a = /x/g === /x/g;  ->  var a = false;
    let mut arena = NodeArena::new();
    let left = arena.add_regex("x", "g");
    let right = arena.add_regex("x", "g");
    let eq = arena.add_binary(BinaryOp::EqEqEq, left, right);
    let name = arena.add_identifier("a");
    let decl = arena.add_variable_declarator(name, Some(eq));
    let stmt = arena.add_variable_declaration(VarKind::Var, vec![decl]);

    // var b = /x/g == "/x/g";  ->  var b = true;
    let re = arena.add_regex("x", "g");
    let s = arena.add_string("/x/g");
    let eq2 = arena.add_binary(BinaryOp::EqEq, re, s);
    let name_b = arena.add_identifier("b");
    let decl_b = arena.add_variable_declarator(name_b, Some(eq2));
    let stmt_b = arena.add_variable_declaration(VarKind::Var, vec![decl_b]);
    let program = arena.add_program(vec![stmt, stmt_b]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    assert_eq!(
        out["body"][0]["declarations"][0]["init"],
        json!({ "type": "Literal", "value": false })
    );
    assert_eq!(
        out["body"][1]["declarations"][0]["init"],
        json!({ "type": "Literal", "value": true })
    );
}

#[test]
fn template_literals_block_concatenation_folding() {
    // var s = `a` + "b";  stays unfolded
    let mut arena = NodeArena::new();
    let template = arena.add_template(vec!["a".into()], vec![]);
    let b = arena.add_string("b");
    let sum = arena.add_binary(BinaryOp::Add, template, b);
    let name = arena.add_identifier("s");
    let decl = arena.add_variable_declarator(name, Some(sum));
    let stmt = arena.add_variable_declaration(VarKind::Var, vec![decl]);
    let program = arena.add_program(vec![stmt]);

    let out = run(&mut arena, program, OptimizeOptions::default());
    assert_eq!(
        out["body"][0]["declarations"][0]["init"]["type"],
        "BinaryExpression"
    );
}
