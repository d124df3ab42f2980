//! End-to-end normalization tests: Source AST in, IL out.

use recast_compiler::normalize;
use recast_core::il::*;
use recast_core::source::*;
use recast_core::span::Span;
use recast_core::types::{ElemType, IlType};

fn span() -> Span {
    Span::dummy()
}

fn module(body: Vec<SourceStmt>) -> SourceModule {
    SourceModule {
        name: "test".to_string(),
        body,
        span: span(),
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

fn let_decl(name: &str, init: SourceExpr) -> SourceStmt {
    SourceStmt::VarDecl {
        kind: VarKind::Let,
        decls: vec![VarDeclarator {
            target: SourcePattern::Ident(name.to_string(), span()),
            init: Some(init),
            type_annotation: None,
            span: span(),
        }],
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

fn binary(op: SourceBinaryOp, left: SourceExpr, right: SourceExpr) -> SourceExpr {
    SourceExpr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span: span(),
    }
}

fn first_var_init(il: &IlModule) -> &IlExpr {
    for decl in &il.decls {
        if let IlDecl::Var(var) = decl {
            return var.init.as_ref().expect("initializer");
        }
    }
    panic!("no var decl in module");
}

// ============================================================================
// Platform builtin mapping
// ============================================================================

#[test]
fn math_floor_becomes_il_op() {
    let src = module(vec![let_decl(
        "x",
        call(member(ident("Math"), "floor"), vec![num(2.5)]),
    )]);
    let (il, warnings) = normalize(&src);
    assert!(warnings.is_empty(), "{:?}", warnings);
    match &first_var_init(&il).kind {
        IlExprKind::MathOp { op, args } => {
            assert_eq!(*op, MathOp::Floor);
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected MathOp, got {:?}", other),
    }
}

#[test]
fn unknown_platform_call_degrades_to_placeholder() {
    let src = module(vec![let_decl(
        "x",
        call(member(ident("Math"), "frobnicate"), vec![]),
    )]);
    let (il, warnings) = normalize(&src);
    assert!(matches!(
        first_var_init(&il).kind,
        IlExprKind::Unknown { .. }
    ));
    assert_eq!(warnings.len(), 1);
}

#[test]
fn object_keys_and_string_from_char_code() {
    let src = module(vec![
        let_decl("k", call(member(ident("Object"), "keys"), vec![ident("o")])),
        let_decl(
            "s",
            call(
                member(ident("String"), "fromCharCode"),
                vec![num(65.0), num(66.0)],
            ),
        ),
    ]);
    let (il, _) = normalize(&src);
    let inits: Vec<&IlExpr> = il
        .decls
        .iter()
        .filter_map(|d| match d {
            IlDecl::Var(v) => v.init.as_ref(),
            _ => None,
        })
        .collect();
    assert!(matches!(
        inits[0].kind,
        IlExprKind::ObjectOp {
            op: ObjectOp::Keys,
            ..
        }
    ));
    assert!(matches!(
        inits[1].kind,
        IlExprKind::StringOp {
            op: StringOp::FromCharCodes,
            ..
        }
    ));
}

#[test]
fn array_method_dispatch_by_receiver_type() {
    // Untyped receiver: slice reads as the array operation.
    let src = module(vec![
        let_decl("s", SourceExpr::Str("abc".to_string(), span())),
        let_decl("t", call(member(ident("s"), "slice"), vec![num(1.0)])),
    ]);
    let (il, _) = normalize(&src);
    let slice = il
        .decls
        .iter()
        .filter_map(|d| match d {
            IlDecl::Var(v) if v.name == "t" => v.init.as_ref(),
            _ => None,
        })
        .next()
        .expect("t");
    assert!(matches!(
        slice.kind,
        IlExprKind::StringOp {
            op: StringOp::Substring,
            ..
        }
    ));
}

// ============================================================================
// Idiom recognition
// ============================================================================

#[test]
fn rotation_idiom_recognized_through_source_shape() {
    // (x << 7) | (x >>> 25)
    let rot = binary(
        SourceBinaryOp::BitOr,
        binary(SourceBinaryOp::Shl, ident("x"), num(7.0)),
        binary(SourceBinaryOp::UShr, ident("x"), num(25.0)),
    );
    let src = module(vec![let_decl("y", rot)]);
    let (il, _) = normalize(&src);
    match &first_var_init(&il).kind {
        IlExprKind::Rotate { dir, bits, amount, .. } => {
            assert_eq!(*dir, RotateDir::Left);
            assert_eq!(*bits, 32);
            assert_eq!(amount.as_int_literal(), Some(7));
        }
        other => panic!("expected Rotate, got {:?}", other),
    }
}

#[test]
fn shift_by_zero_survives_normalization() {
    // The >>> 0 rewrite is a target decision, not an IL one.
    let src = module(vec![let_decl(
        "y",
        binary(SourceBinaryOp::UShr, ident("x"), num(0.0)),
    )]);
    let (il, _) = normalize(&src);
    assert!(matches!(
        first_var_init(&il).kind,
        IlExprKind::Binary {
            op: IlBinaryOp::UShr,
            ..
        }
    ));
}

// ============================================================================
// Type inference
// ============================================================================

#[test]
fn literals_tag_themselves() {
    let src = module(vec![
        let_decl("i", num(3.0)),
        let_decl("f", num(2.5)),
        let_decl("s", SourceExpr::Str("x".to_string(), span())),
    ]);
    let (il, _) = normalize(&src);
    let types: Vec<IlType> = il
        .decls
        .iter()
        .filter_map(|d| match d {
            IlDecl::Var(v) => Some(v.ty.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(types, vec![IlType::Int, IlType::Float, IlType::Str]);
}

#[test]
fn bitwise_results_are_int32() {
    let src = module(vec![let_decl(
        "m",
        binary(SourceBinaryOp::BitAnd, ident("a"), ident("b")),
    )]);
    let (il, _) = normalize(&src);
    assert_eq!(first_var_init(&il).ty, IlType::Int32);
}

#[test]
fn annotation_overrides_initializer() {
    let src = module(vec![SourceStmt::VarDecl {
        kind: VarKind::Let,
        decls: vec![VarDeclarator {
            target: SourcePattern::Ident("w".to_string(), span()),
            init: Some(num(0.0)),
            type_annotation: Some("uint32".to_string()),
            span: span(),
        }],
        span: span(),
    }]);
    let (il, _) = normalize(&src);
    match &il.decls[0] {
        IlDecl::Var(v) => assert_eq!(v.ty, IlType::Int32),
        other => panic!("expected var, got {:?}", other),
    }
}

// ============================================================================
// Constructions
// ============================================================================

#[test]
fn typed_array_and_buffer_constructions() {
    let src = module(vec![
        let_decl(
            "a",
            SourceExpr::New {
                callee: Box::new(ident("Uint32Array")),
                args: vec![num(16.0)],
                span: span(),
            },
        ),
        let_decl(
            "dv",
            SourceExpr::New {
                callee: Box::new(ident("DataView")),
                args: vec![member(ident("a"), "buffer")],
                span: span(),
            },
        ),
    ]);
    let (il, _) = normalize(&src);
    let inits: Vec<&IlExpr> = il
        .decls
        .iter()
        .filter_map(|d| match d {
            IlDecl::Var(v) => v.init.as_ref(),
            _ => None,
        })
        .collect();
    assert!(matches!(
        inits[0].kind,
        IlExprKind::TypedArrayCreation {
            elem: ElemType::Uint32,
            ..
        }
    ));
    // `.buffer` on a typed array is the identity.
    match &inits[1].kind {
        IlExprKind::DataViewCreation { buffer } => {
            assert!(matches!(buffer.kind, IlExprKind::Ident(ref n) if n == "a"));
        }
        other => panic!("expected DataViewCreation, got {:?}", other),
    }
}

#[test]
fn dataview_store_becomes_slice_assignment() {
    let store = call(
        member(ident("dv"), "setUint32"),
        vec![num(4.0), ident("word"), SourceExpr::Bool(true, span())],
    );
    let src = module(vec![
        let_decl(
            "dv",
            SourceExpr::New {
                callee: Box::new(ident("DataView")),
                args: vec![ident("buf")],
                span: span(),
            },
        ),
        expr_stmt(store),
    ]);
    let (il, _) = normalize(&src);
    let stmt = il
        .decls
        .iter()
        .filter_map(|d| match d {
            IlDecl::Stmt(s) => Some(s),
            _ => None,
        })
        .next()
        .expect("statement");
    match stmt {
        IlStmt::Assign { target, value, .. } => {
            assert!(matches!(target.kind, IlExprKind::Slice { .. }));
            assert!(matches!(
                value.kind,
                IlExprKind::UnpackBytes {
                    bits: 32,
                    endian: Endianness::Little,
                    ..
                }
            ));
        }
        other => panic!("expected assign, got {:?}", other),
    }
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn for_in_iterates_object_keys() {
    let src = module(vec![SourceStmt::ForIn {
        decl_kind: Some(VarKind::Let),
        target: SourcePattern::Ident("k".to_string(), span()),
        iter: ident("table"),
        body: Box::new(SourceStmt::Block(vec![], span())),
        span: span(),
    }]);
    let (il, _) = normalize(&src);
    match &il.decls[0] {
        IlDecl::Stmt(IlStmt::ForEach { var, iter, .. }) => {
            assert_eq!(var, "k");
            assert!(matches!(
                iter.kind,
                IlExprKind::ObjectOp {
                    op: ObjectOp::Keys,
                    ..
                }
            ));
        }
        other => panic!("expected foreach, got {:?}", other),
    }
}

#[test]
fn switch_folds_fallthrough_labels() {
    let case = |test: Option<SourceExpr>, body: Vec<SourceStmt>| SwitchCase {
        test,
        body,
        span: span(),
    };
    let src = module(vec![SourceStmt::Switch {
        discriminant: ident("mode"),
        cases: vec![
            case(Some(num(1.0)), vec![]),
            case(Some(num(2.0)), vec![SourceStmt::Break { span: span() }]),
            case(None, vec![expr_stmt(call(ident("fallback"), vec![]))]),
        ],
        span: span(),
    }]);
    let (il, _) = normalize(&src);
    match &il.decls[0] {
        IlDecl::Stmt(IlStmt::Switch { cases, default, .. }) => {
            assert_eq!(cases.len(), 1);
            assert_eq!(cases[0].tests.len(), 2);
            assert!(default.is_some());
        }
        other => panic!("expected switch, got {:?}", other),
    }
}

#[test]
fn destructuring_goes_through_a_hidden_temporary() {
    let src = module(vec![SourceStmt::VarDecl {
        kind: VarKind::Let,
        decls: vec![VarDeclarator {
            target: SourcePattern::Array(
                vec![
                    SourcePattern::Ident("hi".to_string(), span()),
                    SourcePattern::Ident("lo".to_string(), span()),
                ],
                span(),
            ),
            init: Some(ident("pair")),
            type_annotation: None,
            span: span(),
        }],
        span: span(),
    }]);
    let (il, _) = normalize(&src);
    let names: Vec<&str> = il
        .decls
        .iter()
        .filter_map(|d| match d {
            IlDecl::Var(v) => Some(v.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names[0].starts_with("_tmp"));
    assert_eq!(&names[1..], &["hi", "lo"]);
}

#[test]
fn unknown_statement_never_aborts() {
    let src = module(vec![
        SourceStmt::Unknown {
            kind: "LabeledStatement".to_string(),
            detail: serde_json::json!({"label": "outer"}),
            span: span(),
        },
        let_decl("x", num(1.0)),
    ]);
    let (il, warnings) = normalize(&src);
    assert_eq!(il.decls.len(), 2);
    assert!(matches!(
        il.decls[0],
        IlDecl::Stmt(IlStmt::Unknown { .. })
    ));
    assert_eq!(warnings.len(), 1);
}

// ============================================================================
// Module shape
// ============================================================================

#[test]
fn fingerprint_is_stable_sha256() {
    let src = module(vec![let_decl("x", num(1.0))]);
    let (a, _) = normalize(&src);
    let (b, _) = normalize(&src);
    assert_eq!(a.fingerprint, b.fingerprint);
    assert!(a.fingerprint.starts_with("sha256:"));
    assert_eq!(a.fingerprint.len(), "sha256:".len() + 64);
}

#[test]
fn iife_wrapper_registration_calls_are_dropped() {
    let inner = vec![
        SourceStmt::ClassDecl(ClassDef {
            name: "Cipher".to_string(),
            superclass: None,
            members: vec![],
            span: span(),
        }),
        expr_stmt(call(
            member(ident("AlgorithmFramework"), "RegisterAlgorithm"),
            vec![ident("Cipher")],
        )),
    ];
    let wrapper = expr_stmt(call(
        SourceExpr::Function(FunctionDef {
            name: None,
            params: vec![],
            body: inner,
            is_arrow: false,
            span: span(),
        }),
        vec![],
    ));
    let src = module(vec![wrapper]);
    let (il, warnings) = normalize(&src);
    assert_eq!(il.decls.len(), 1);
    assert!(matches!(il.decls[0], IlDecl::Class(_)));
    // One note for the unwrap, one for the discarded registration call.
    assert_eq!(warnings.len(), 2);
}
