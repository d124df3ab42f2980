//! BASIC backend tests across the dialect matrix.

use recast_codegen::transpile;
use recast_core::options::{Dialect, TargetOptions};
use recast_core::source::*;
use recast_core::span::Span;

fn span() -> Span {
    Span::dummy()
}

fn module(body: Vec<SourceStmt>) -> SourceModule {
    SourceModule {
        name: "basic_golden".to_string(),
        body,
        span: span(),
    }
}

fn options(dialect: Dialect) -> TargetOptions {
    TargetOptions {
        dialect,
        add_type_hints: false,
        ..TargetOptions::default()
    }
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

// ============================================================================
// Width discipline and rotation
// ============================================================================

#[test]
fn rotate_expands_inline_with_mask() {
    let rot = binary(
        SourceBinaryOp::BitOr,
        binary(SourceBinaryOp::Shl, ident("v"), ident("n")),
        binary(
            SourceBinaryOp::UShr,
            ident("v"),
            binary(SourceBinaryOp::Sub, num(32.0), ident("n")),
        ),
    );
    let out = transpile(
        &module(vec![expr_stmt(assign_ident("y", rot))]),
        &options(Dialect::FreeBasic),
    );
    // Arithmetic binds tighter than shifts, so the complement stays bare.
    assert!(
        out.text
            .contains("y = (v Shl n Or v Shr 32 - n) And &HFFFFFFFF"),
        "{}",
        out.text
    );
}

#[test]
fn ushr_masks_with_hex_literal() {
    let out = transpile(
        &module(vec![expr_stmt(assign_ident(
            "y",
            binary(SourceBinaryOp::UShr, ident("x"), num(3.0)),
        ))]),
        &options(Dialect::VbNet),
    );
    assert!(out.text.contains("y = x >> 3 And &HFFFFFFFF"), "{}", out.text);
}

#[test]
fn imul_casts_through_clng() {
    let out = transpile(
        &module(vec![expr_stmt(assign_ident(
            "y",
            call(member(ident("Math"), "imul"), vec![ident("a"), ident("b")]),
        ))]),
        &options(Dialect::FreeBasic),
    );
    assert!(
        out.text.contains("y = CLng(a * b And &HFFFFFFFF)"),
        "{}",
        out.text
    );
}

#[test]
fn pack_goes_through_prelude_helper() {
    let pack = call(
        member(ident("OpCodes"), "Pack32BE"),
        vec![ident("b0"), ident("b1"), ident("b2"), ident("b3")],
    );
    let out = transpile(
        &module(vec![expr_stmt(assign_ident("w", pack))]),
        &options(Dialect::FreeBasic),
    );
    assert!(out.text.contains("w = Pack32BE(b0, b1, b2, b3)"), "{}", out.text);
    assert!(out.text.contains("' Requires prelude helpers: Pack32BE"));
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn switch_becomes_select_case() {
    let case = |test: Option<SourceExpr>, body: Vec<SourceStmt>| SwitchCase {
        test,
        body,
        span: span(),
    };
    let stmt = SourceStmt::Switch {
        discriminant: ident("mode"),
        cases: vec![
            case(
                Some(num(1.0)),
                vec![
                    expr_stmt(assign_ident("x", num(10.0))),
                    SourceStmt::Break { span: span() },
                ],
            ),
            case(None, vec![expr_stmt(assign_ident("x", num(0.0)))]),
        ],
        span: span(),
    };
    let out = transpile(&module(vec![stmt]), &options(Dialect::FreeBasic));
    let expected = [
        "Select Case mode",
        "    Case 1",
        "        x = 10",
        "    Case Else",
        "        x = 0",
        "End Select",
    ];
    for line in expected {
        assert!(out.text.contains(line), "missing {:?} in {}", line, out.text);
    }
}

#[test]
fn counting_loop_becomes_for_to_with_inclusive_bound() {
    let stmt = SourceStmt::For {
        init: Some(Box::new(SourceStmt::VarDecl {
            kind: VarKind::Let,
            decls: vec![VarDeclarator {
                target: SourcePattern::Ident("i".to_string(), span()),
                init: Some(num(0.0)),
                type_annotation: None,
                span: span(),
            }],
            span: span(),
        })),
        test: Some(binary(SourceBinaryOp::Lt, ident("i"), ident("rounds"))),
        update: Some(SourceExpr::Update {
            op: UpdateOp::Incr,
            prefix: false,
            target: Box::new(ident("i")),
            span: span(),
        }),
        body: Box::new(SourceStmt::Block(
            vec![expr_stmt(call(ident("mix"), vec![ident("i")]))],
            span(),
        )),
        span: span(),
    };
    let out = transpile(&module(vec![stmt]), &options(Dialect::FreeBasic));
    assert!(out.text.contains("For i = 0 To rounds - 1"), "{}", out.text);
    assert!(out.text.contains("Next"), "{}", out.text);
}

#[test]
fn do_while_keeps_bottom_test() {
    let stmt = SourceStmt::DoWhile {
        body: Box::new(SourceStmt::Block(
            vec![expr_stmt(call(ident("step"), vec![]))],
            span(),
        )),
        test: binary(SourceBinaryOp::Gt, ident("n"), num(0.0)),
        span: span(),
    };
    let out = transpile(&module(vec![stmt]), &options(Dialect::FreeBasic));
    assert!(out.text.contains("Do\n"), "{}", out.text);
    assert!(out.text.contains("Loop While n > 0"), "{}", out.text);
}

// ============================================================================
// Exception flow
// ============================================================================

fn try_stmt() -> SourceStmt {
    SourceStmt::Try {
        block: vec![expr_stmt(call(ident("risky"), vec![]))],
        handler: Some(CatchClause {
            param: Some("e".to_string()),
            body: vec![expr_stmt(call(ident("recover"), vec![]))],
            span: span(),
        }),
        finalizer: None,
        span: span(),
    }
}

#[test]
fn structured_dialect_uses_try_catch() {
    let out = transpile(&module(vec![try_stmt()]), &options(Dialect::VbNet));
    assert!(out.text.contains("Try"), "{}", out.text);
    assert!(out.text.contains("Catch e As Exception"), "{}", out.text);
    assert!(out.text.contains("End Try"), "{}", out.text);
}

#[test]
fn classic_dialect_uses_on_error() {
    let out = transpile(&module(vec![try_stmt()]), &options(Dialect::VbScript));
    assert!(out.text.contains("On Error Resume Next"), "{}", out.text);
    assert!(out.text.contains("On Error GoTo 0"), "{}", out.text);
    assert!(out.text.contains("If Err.Number <> 0 Then"), "{}", out.text);
}

#[test]
fn throw_null_raises_generic_exception() {
    let out = transpile(
        &module(vec![SourceStmt::Throw {
            value: SourceExpr::Null(span()),
            span: span(),
        }]),
        &options(Dialect::VbNet),
    );
    assert!(
        out.text
            .contains("Throw New Exception(\"Verification failed\")"),
        "{}",
        out.text
    );
}

// ============================================================================
// Class shapes
// ============================================================================

fn cipher_class() -> SourceStmt {
    let ctor_body = vec![
        expr_stmt(SourceExpr::Assign {
            op: SourceAssignOp::Assign,
            target: AssignTarget::Expr(Box::new(member(SourceExpr::This(span()), "rounds"))),
            value: Box::new(num(16.0)),
            span: span(),
        }),
        expr_stmt(SourceExpr::Assign {
            op: SourceAssignOp::Assign,
            target: AssignTarget::Expr(Box::new(member(SourceExpr::This(span()), "category"))),
            value: Box::new(SourceExpr::Str("block".to_string(), span())),
            span: span(),
        }),
    ];
    SourceStmt::ClassDecl(ClassDef {
        name: "Anubis".to_string(),
        superclass: Some(ident("BlockCipherAlgorithm")),
        members: vec![
            ClassMember {
                kind: MemberKind::Constructor,
                key: "constructor".to_string(),
                is_static: false,
                function: Some(FunctionDef {
                    name: None,
                    params: vec![],
                    body: ctor_body,
                    is_arrow: false,
                    span: span(),
                }),
                value: None,
                span: span(),
            },
            ClassMember {
                kind: MemberKind::Method,
                key: "encryptBlock".to_string(),
                is_static: false,
                function: Some(FunctionDef {
                    name: None,
                    params: vec![SourceParam {
                        pattern: SourcePattern::Ident("block".to_string(), span()),
                        default_value: None,
                        span: span(),
                    }],
                    body: vec![SourceStmt::Return {
                        value: Some(ident("block")),
                        span: span(),
                    }],
                    is_arrow: false,
                    span: span(),
                }),
                value: None,
                span: span(),
            },
        ],
        span: span(),
    })
}

#[test]
fn class_mode_emits_class_with_inherits() {
    let out = transpile(&module(vec![cipher_class()]), &options(Dialect::VbNet));
    assert!(out.text.contains("Class Anubis"), "{}", out.text);
    assert!(
        out.text.contains("Inherits BlockCipherAlgorithm"),
        "{}",
        out.text
    );
    assert!(out.text.contains("Public Sub New()"), "{}", out.text);
    assert!(
        out.text.contains("Public Function EncryptBlock("),
        "{}",
        out.text
    );
}

#[test]
fn freebasic_class_extends_base() {
    let out = transpile(&module(vec![cipher_class()]), &options(Dialect::FreeBasic));
    assert!(
        out.text.contains("Extends BlockCipherAlgorithm"),
        "{}",
        out.text
    );
}

#[test]
fn type_mode_drops_framework_metadata() {
    let opts = TargetOptions {
        dialect: Dialect::FreeBasic,
        use_classes: false,
        add_type_hints: false,
        ..TargetOptions::default()
    };
    let out = transpile(&module(vec![cipher_class()]), &opts);
    assert!(out.text.contains("Type Anubis"), "{}", out.text);
    assert!(out.text.contains("End Type"), "{}", out.text);
    // Functions carry the record as an explicit self parameter.
    assert!(
        out.text
            .contains("Function Anubis_EncryptBlock(self As Anubis, block"),
        "{}",
        out.text
    );
    // The category metadata write disappears; the real field stays.
    assert!(!out.text.contains("Category = \"block\""), "{}", out.text);
    assert!(out.text.contains("self.Rounds = 16"), "{}", out.text);
    assert!(out
        .warnings
        .iter()
        .any(|w| w.message.contains("framework metadata")));
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn bigint_literal_warns_about_precision() {
    let out = transpile(
        &module(vec![expr_stmt(assign_ident(
            "k",
            SourceExpr::BigInt("340282366920938463463374607431768211455".to_string(), span()),
        ))]),
        &options(Dialect::FreeBasic),
    );
    assert!(out
        .warnings
        .iter()
        .any(|w| w.message.contains("LongLong")));
}

#[test]
fn string_interpolation_concatenates() {
    let template = SourceExpr::Template {
        quasis: vec!["n=".to_string(), String::new()],
        exprs: vec![ident("n")],
        span: span(),
    };
    let out = transpile(
        &module(vec![expr_stmt(assign_ident("msg", template))]),
        &options(Dialect::FreeBasic),
    );
    assert!(out.text.contains("msg = \"n=\" & CStr(n)"), "{}", out.text);
}
