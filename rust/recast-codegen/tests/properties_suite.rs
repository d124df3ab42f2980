//! Cross-cutting pipeline properties: determinism, bifurcation ordering,
//! mask closure, naming stability, and warning accumulation.

use recast_codegen::{transpile, Transpiled};
use recast_core::diag::Severity;
use recast_core::naming::{to_pascal_case, to_snake_case};
use recast_core::options::{Dialect, TargetOptions};
use recast_core::source::*;
use recast_core::span::Span;

fn span() -> Span {
    Span::dummy()
}

fn ident(name: &str) -> SourceExpr {
    SourceExpr::Ident(name.to_string(), span())
}

fn num(n: f64) -> SourceExpr {
    SourceExpr::Num(n, span())
}

fn expr_stmt(expr: SourceExpr) -> SourceStmt {
    SourceStmt::Expr { expr, span: span() }
}

fn assign_ident(name: &str, value: SourceExpr) -> SourceExpr {
    SourceExpr::Assign {
        op: SourceAssignOp::Assign,
        target: AssignTarget::Pattern(SourcePattern::Ident(name.to_string(), span())),
        value: Box::new(value),
        span: span(),
    }
}

fn binary(op: SourceBinaryOp, left: SourceExpr, right: SourceExpr) -> SourceExpr {
    SourceExpr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span: span(),
    }
}

fn call(callee: SourceExpr, args: Vec<SourceExpr>) -> SourceExpr {
    SourceExpr::Call {
        callee: Box::new(callee),
        args,
        span: span(),
    }
}

fn member(object: SourceExpr, property: &str) -> SourceExpr {
    SourceExpr::Member {
        object: Box::new(object),
        property: property.to_string(),
        span: span(),
    }
}

/// A module exercising most lowering paths at once.
fn kitchen_sink() -> SourceModule {
    let rot = binary(
        SourceBinaryOp::BitOr,
        binary(SourceBinaryOp::Shl, ident("x"), num(7.0)),
        binary(SourceBinaryOp::UShr, ident("x"), num(25.0)),
    );
    SourceModule {
        name: "sink".to_string(),
        body: vec![
            expr_stmt(assign_ident("y", rot)),
            expr_stmt(assign_ident(
                "z",
                call(member(ident("Math"), "floor"), vec![num(2.5)]),
            )),
            expr_stmt(assign_ident(
                "w",
                binary(SourceBinaryOp::UShr, ident("y"), num(5.0)),
            )),
            SourceStmt::Throw {
                value: SourceExpr::Null(span()),
                span: span(),
            },
        ],
        span: span(),
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn output_is_byte_identical_across_runs() {
    let module = kitchen_sink();
    let options = TargetOptions::default();
    let first = transpile(&module, &options);
    for _ in 0..3 {
        let again = transpile(&module, &options);
        assert_eq!(first.text, again.text);
        assert_eq!(first.warnings.len(), again.warnings.len());
    }
}

#[test]
fn basic_output_is_deterministic_too() {
    let module = kitchen_sink();
    let options = TargetOptions {
        dialect: Dialect::FreeBasic,
        ..TargetOptions::default()
    };
    let first = transpile(&module, &options);
    let again = transpile(&module, &options);
    assert_eq!(first.text, again.text);
}

// ============================================================================
// Case conversion idempotence
// ============================================================================

#[test]
fn case_conversion_is_idempotent_over_realistic_names() {
    for name in [
        "encryptBlock",
        "OutputSize",
        "SHA256Init",
        "_privateState",
        "already_snake",
        "Pack32BE",
        "keySchedule",
    ] {
        let snake = to_snake_case(name);
        assert_eq!(to_snake_case(&snake), snake, "snake({})", name);
        let pascal = to_pascal_case(name);
        assert_eq!(to_pascal_case(&pascal), pascal, "pascal({})", name);
    }
}

// ============================================================================
// Integer mask closure
// ============================================================================

#[test]
fn emitted_32_bit_primitives_carry_the_mask() {
    let module = SourceModule {
        name: "masks".to_string(),
        body: vec![
            expr_stmt(assign_ident(
                "a",
                binary(SourceBinaryOp::UShr, ident("x"), num(5.0)),
            )),
            expr_stmt(assign_ident(
                "b",
                call(member(ident("OpCodes"), "Unpack32LE"), vec![ident("v")]),
            )),
            expr_stmt(assign_ident(
                "c",
                call(member(ident("Math"), "imul"), vec![ident("p"), ident("q")]),
            )),
        ],
        span: span(),
    };
    let out = transpile(&module, &TargetOptions::default());
    for line in out.text.lines().filter(|l| {
        l.starts_with("a = ") || l.starts_with("b = ") || l.starts_with("c = ")
    }) {
        assert!(
            line.contains("0xFFFFFFFF"),
            "mask missing from {:?}",
            line
        );
    }
}

// ============================================================================
// Pre/post statement discipline
// ============================================================================

#[test]
fn pre_statements_precede_and_post_statements_follow() {
    // target[p -= 1] = fetch(q++) mixes one pre and one post effect.
    let stmt = expr_stmt(SourceExpr::Assign {
        op: SourceAssignOp::Assign,
        target: AssignTarget::Expr(Box::new(SourceExpr::Index {
            object: Box::new(ident("target")),
            index: Box::new(SourceExpr::Assign {
                op: SourceAssignOp::Sub,
                target: AssignTarget::Pattern(SourcePattern::Ident("p".to_string(), span())),
                value: Box::new(num(1.0)),
                span: span(),
            }),
            span: span(),
        })),
        value: Box::new(call(
            ident("fetch"),
            vec![SourceExpr::Update {
                op: UpdateOp::Incr,
                prefix: false,
                target: Box::new(ident("q")),
                span: span(),
            }],
        )),
        span: span(),
    });
    let module = SourceModule {
        name: "order".to_string(),
        body: vec![stmt],
        span: span(),
    };
    let out = transpile(&module, &TargetOptions::default());
    let lines: Vec<&str> = out
        .text
        .lines()
        .filter(|l| !l.starts_with('#') && !l.is_empty())
        .collect();
    assert_eq!(
        lines,
        vec!["p -= 1", "target[p] = fetch(q)", "q += 1"]
    );
}

// ============================================================================
// Options surface
// ============================================================================

#[test]
fn unknown_option_keys_are_ignored() {
    let options = TargetOptions::from_json(
        r#"{"dialect": "FreeBasic", "useClasses": true, "experimentalKnob": [1, 2, 3]}"#,
    )
    .expect("forward-compatible parse");
    assert_eq!(options.dialect, Dialect::FreeBasic);
}

#[test]
fn type_hints_toggle_changes_declarations() {
    let module = SourceModule {
        name: "hints".to_string(),
        body: vec![SourceStmt::VarDecl {
            kind: VarKind::Let,
            decls: vec![VarDeclarator {
                target: SourcePattern::Ident("count".to_string(), span()),
                init: Some(num(3.0)),
                type_annotation: None,
                span: span(),
            }],
            span: span(),
        }],
        span: span(),
    };
    let with_hints = transpile(&module, &TargetOptions::default());
    assert!(with_hints.text.contains("count: int = 3"), "{}", with_hints.text);

    let without = transpile(
        &module,
        &TargetOptions {
            add_type_hints: false,
            ..TargetOptions::default()
        },
    );
    assert!(without.text.contains("count = 3"), "{}", without.text);
}

// ============================================================================
// Warnings
// ============================================================================

#[test]
fn placeholder_warnings_carry_node_kind_and_never_abort() {
    let module = SourceModule {
        name: "mystery".to_string(),
        body: vec![
            SourceStmt::Unknown {
                kind: "WithStatement".to_string(),
                detail: serde_json::json!({"object": "env"}),
                span: span(),
            },
            expr_stmt(assign_ident("x", num(1.0))),
        ],
        span: span(),
    };
    let out: Transpiled = transpile(&module, &TargetOptions::default());
    assert!(out.text.contains("# Unknown node type: WithStatement"));
    assert!(out.text.contains("x = 1"));
    let placeholder = out
        .warnings
        .iter()
        .find(|w| w.severity == Severity::Placeholder)
        .expect("placeholder warning");
    assert_eq!(placeholder.node_kind.as_deref(), Some("WithStatement"));
    assert!(placeholder.message.contains("WithStatement"));
}

#[test]
fn freeze_is_a_noop_with_a_note() {
    let module = SourceModule {
        name: "frozen".to_string(),
        body: vec![expr_stmt(assign_ident(
            "table",
            call(
                member(ident("Object"), "freeze"),
                vec![SourceExpr::Array(vec![num(1.0), num(2.0)], span())],
            ),
        ))],
        span: span(),
    };
    let out = transpile(&module, &TargetOptions::default());
    assert!(out.text.contains("table = [1, 2]"), "{}", out.text);
    assert!(out
        .warnings
        .iter()
        .any(|w| w.severity == Severity::Note && w.message.contains("no-op")));
}
