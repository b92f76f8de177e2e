//! End-to-end name analysis over trees handed over as JSON, the way the
//! external parser delivers them.

use std::path::Path;

use egg_common::{DiagnosticSink, Position};
use egg_compiler::ast::Program;
use egg_compiler::semantic::annotations::{self, Role};
use egg_compiler::semantic::{self, NameAnalyzer, NameError, ScopeTable};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn id(name: &str, line: u32, column: u32) -> Value {
    json!({ "name": name, "pos": { "line": line, "column": column } })
}

fn use_of(name: &str, line: u32, column: u32) -> Value {
    json!({ "expr": "id", "name": name, "pos": { "line": line, "column": column } })
}

fn program(declarations: Value) -> Program {
    serde_json::from_value(json!({ "declarations": declarations }))
        .unwrap_or_else(|err| panic!("invalid tree: {}", err))
}

/// Analyze and return diagnostics rendered the way the sink reports them.
fn reports(program: &Program) -> Vec<String> {
    semantic::analyze(program)
        .expect("internal analysis failure")
        .into_diagnostics()
        .into_iter()
        .map(|d| d.to_string())
        .collect()
}

fn fatal(line: u32, column: u32, error: NameError) -> String {
    format!("fatal at line {}, col {}: {}", line, column, error)
}

#[test]
fn every_node_kind_resolves_in_a_well_formed_program() {
    let program = program(json!([
        { "decl": "variable", "ty": { "type": "int" }, "name": id("total", 1, 5) },
        { "decl": "variable", "ty": { "type": "bool" }, "name": id("done", 2, 6), "size": 1 },
        { "decl": "function", "return_type": { "type": "int" }, "name": id("inc", 3, 5),
          "params": [ { "ty": { "type": "int" }, "name": id("n", 3, 13) } ],
          "body": { "statements": [
              { "stmt": "return", "value": { "expr": "binary", "op": "add",
                  "lhs": use_of("n", 3, 31),
                  "rhs": { "expr": "int_lit", "value": 1, "pos": { "line": 3, "column": 35 } } } }
          ]}},
        { "decl": "function", "return_type": { "type": "void" }, "name": id("main", 5, 6),
          "body": {
            "declarations": [
              { "decl": "variable", "ty": { "type": "int" }, "name": id("i", 6, 9) }
            ],
            "statements": [
              { "stmt": "read", "target": use_of("i", 7, 12) },
              { "stmt": "assign", "target": use_of("total", 8, 5),
                "value": { "expr": "call", "callee": id("inc", 8, 13), "args": [ use_of("i", 8, 17) ] } },
              { "stmt": "post_inc", "target": use_of("i", 9, 5) },
              { "stmt": "post_dec", "target": use_of("total", 10, 5) },
              { "stmt": "if", "cond": { "expr": "unary", "op": "not", "operand": use_of("done", 11, 10) },
                "body": { "statements": [
                    { "stmt": "write", "value": { "expr": "str_lit", "value": "\"no\"", "pos": { "line": 12, "column": 17 } } }
                ]}},
              { "stmt": "if_else",
                "cond": { "expr": "binary", "op": "lt_eq", "lhs": use_of("i", 14, 9), "rhs": use_of("total", 14, 14) },
                "then_body": { "statements": [
                    { "stmt": "assign", "target": use_of("done", 15, 9), "value": { "expr": "true", "pos": { "line": 15, "column": 16 } } }
                ]},
                "else_body": { "statements": [
                    { "stmt": "assign", "target": use_of("done", 17, 9), "value": { "expr": "false", "pos": { "line": 17, "column": 16 } } }
                ]}},
              { "stmt": "while",
                "cond": { "expr": "binary", "op": "and",
                          "lhs": { "expr": "binary", "op": "gt", "lhs": use_of("i", 19, 12),
                                   "rhs": { "expr": "unary", "op": "negate", "operand": use_of("total", 19, 17) } },
                          "rhs": { "expr": "binary", "op": "not_eq", "lhs": use_of("done", 19, 26), "rhs": use_of("done", 19, 34) } },
                "body": {
                  "declarations": [ { "decl": "variable", "ty": { "type": "int" }, "name": id("k", 20, 13) } ],
                  "statements": [
                    { "stmt": "write", "value": { "expr": "assign", "target": use_of("k", 21, 18),
                        "value": { "expr": "binary", "op": "mul", "lhs": use_of("i", 21, 22), "rhs": use_of("k", 21, 26) } } }
                  ]}},
              { "stmt": "repeat", "count": { "expr": "binary", "op": "div", "lhs": use_of("total", 23, 12),
                                              "rhs": { "expr": "int_lit", "value": 2, "pos": { "line": 23, "column": 20 } } },
                "body": { "statements": [
                    { "stmt": "call", "callee": id("inc", 24, 9), "args": [
                        { "expr": "binary", "op": "sub", "lhs": use_of("i", 24, 13), "rhs": use_of("total", 24, 17) } ] }
                ]}},
              { "stmt": "write", "value": { "expr": "binary", "op": "or",
                  "lhs": { "expr": "binary", "op": "eq", "lhs": use_of("i", 26, 14), "rhs": use_of("i", 26, 19) },
                  "rhs": { "expr": "binary", "op": "gt_eq", "lhs": use_of("i", 26, 24), "rhs": use_of("total", 26, 29) } } },
              { "stmt": "return" }
            ]
          }}
    ]));

    assert_eq!(reports(&program), Vec::<String>::new());

    let annotations = annotations::collect(&program);
    assert!(annotations.len() > 20);
    for annotation in &annotations {
        assert!(
            annotation.resolved.is_some(),
            "unresolved name {:?}",
            annotation
        );
    }
    let calls: Vec<String> = annotations
        .iter()
        .filter(|a| a.role == Role::Call)
        .map(|a| a.to_string())
        .collect();
    assert_eq!(calls, vec!["inc(int -> int)", "inc(int -> int)"]);
}

#[test]
fn nested_struct_chains_from_fixture() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("structs.ast.json");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {:?}: {}", path, err));
    let program: Program = serde_json::from_str(&text).unwrap();

    // o.f.x is fine, o.f.y names no field of Inner, o.z names no field of
    // Outer and the trailing .x stays quiet.
    assert_eq!(
        reports(&program),
        vec![
            fatal(13, 17, NameError::InvalidStructField),
            fatal(14, 15, NameError::InvalidStructField),
        ]
    );

    let fields: Vec<String> = annotations::collect(&program)
        .into_iter()
        .filter(|a| a.role == Role::Field && a.line == 12)
        .map(|a| a.to_string())
        .collect();
    assert_eq!(fields, vec!["f(struct Inner)", "x"]);
}

#[test]
fn independent_errors_are_all_reported_in_one_run() {
    let program = program(json!([
        { "decl": "variable", "ty": { "type": "void" }, "name": id("v", 1, 6) },
        { "decl": "variable", "ty": { "type": "int" }, "name": id("a", 2, 5) },
        { "decl": "variable", "ty": { "type": "int" }, "name": id("a", 3, 5) },
        { "decl": "variable", "ty": { "type": "struct", "name": "Ghost", "pos": { "line": 4, "column": 8 } },
          "name": id("g", 4, 14) },
        { "decl": "function", "return_type": { "type": "void" }, "name": id("main", 5, 6),
          "body": { "statements": [
              { "stmt": "write", "value": use_of("nobody", 6, 13) },
              { "stmt": "write", "value": { "expr": "field_access", "loc": use_of("a", 7, 13), "field": id("x", 7, 15) } },
              { "stmt": "write", "value": { "expr": "field_access", "loc": use_of("g", 8, 13), "field": id("x", 8, 15) } }
          ]}}
    ]));

    assert_eq!(
        reports(&program),
        vec![
            fatal(1, 6, NameError::NonFunctionVoid),
            fatal(3, 5, NameError::MultiplyDeclared),
            fatal(4, 8, NameError::InvalidStructType),
            fatal(6, 13, NameError::Undeclared),
            fatal(7, 13, NameError::DotAccessOfNonStruct),
            // `g` was never declared: its struct type did not resolve.
            fatal(8, 13, NameError::Undeclared),
        ]
    );
}

#[test]
fn shadowing_across_function_and_block_scopes() {
    let program = program(json!([
        { "decl": "variable", "ty": { "type": "int" }, "name": id("x", 1, 5) },
        { "decl": "function", "return_type": { "type": "void" }, "name": id("f", 2, 6),
          "params": [ { "ty": { "type": "bool" }, "name": id("x", 2, 13) } ],
          "body": { "statements": [
              { "stmt": "while", "cond": use_of("x", 3, 12), "body": {
                  "declarations": [ { "decl": "variable", "ty": { "type": "int" }, "name": id("x", 4, 13) } ],
                  "statements": [ { "stmt": "post_inc", "target": use_of("x", 5, 9) } ] } }
          ]}},
        { "decl": "function", "return_type": { "type": "void" }, "name": id("g", 8, 6),
          "params": [ { "ty": { "type": "int" }, "name": id("x", 8, 12) } ],
          "body": { "statements": [] } }
    ]));

    assert_eq!(reports(&program), Vec::<String>::new());
    let uses: Vec<String> = annotations::collect(&program)
        .into_iter()
        .filter(|a| a.role == Role::Use)
        .map(|a| a.to_string())
        .collect();
    assert_eq!(uses, vec!["x(bool)", "x(int)"]);
}

/// Sink that keeps the raw (line, column, message) reports.
#[derive(Default)]
struct RecordingSink {
    fatals: Vec<(u32, u32, String)>,
    warnings: usize,
}

impl DiagnosticSink for RecordingSink {
    fn fatal(&mut self, position: Position, message: &str) {
        self.fatals
            .push((position.line, position.column, message.to_string()));
    }

    fn warning(&mut self, _position: Position, _message: &str) {
        self.warnings += 1;
    }
}

#[test]
fn reports_go_through_the_sink_interface() {
    let program = program(json!([
        { "decl": "variable", "ty": { "type": "int" }, "name": id("x", 1, 5) },
        { "decl": "variable", "ty": { "type": "int" }, "name": id("x", 2, 5) }
    ]));

    let mut sink = RecordingSink::default();
    semantic::analyze_program(&program, &mut sink).unwrap();
    assert_eq!(
        sink.fatals,
        vec![(2, 5, "Multiply declared identifier".to_string())]
    );
    assert_eq!(sink.warnings, 0);
}

#[test]
fn scope_table_depth_is_restored() {
    let program = program(json!([
        { "decl": "function", "return_type": { "type": "void" }, "name": id("f", 1, 6),
          "body": { "statements": [
              { "stmt": "if_else", "cond": use_of("nope", 2, 9),
                "then_body": { "statements": [ { "stmt": "write", "value": use_of("nope", 3, 15) } ] },
                "else_body": { "declarations": [
                    { "decl": "variable", "ty": { "type": "void" }, "name": id("w", 5, 14) } ] } }
          ]}}
    ]));

    let mut sink = RecordingSink::default();
    let mut table = ScopeTable::new();
    NameAnalyzer::new(&mut sink)
        .analyze_program_in(&program, &mut table)
        .unwrap();
    assert_eq!(table.depth(), 1);
    assert_eq!(sink.fatals.len(), 3);
}

#[test]
fn unknown_node_kinds_are_rejected_at_load_time() {
    let result: Result<Program, _> = serde_json::from_value(json!({
        "declarations": [
            { "decl": "variable", "ty": { "type": "float" }, "name": id("f", 1, 7) }
        ]
    }));
    assert!(result.is_err());
}
