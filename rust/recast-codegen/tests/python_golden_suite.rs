//! Golden-text tests for the Python backend: exact emitted output for the
//! canonical lowering scenarios, end to end through the normalizer.

use pretty_assertions::assert_eq;
use recast_codegen::transpile;
use recast_core::options::TargetOptions;
use recast_core::source::*;
use recast_core::span::Span;

fn span() -> Span {
    Span::dummy()
}

fn module(body: Vec<SourceStmt>) -> SourceModule {
    SourceModule {
        name: "golden".to_string(),
        body,
        span: span(),
    }
}

fn plain_options() -> TargetOptions {
    TargetOptions {
        add_type_hints: false,
        add_docstrings: false,
        ..TargetOptions::default()
    }
}

/// Emit and strip the banner/import preamble down to code lines.
fn emit(body: Vec<SourceStmt>) -> Vec<String> {
    let out = transpile(&module(body), &plain_options());
    out.text
        .lines()
        .skip_while(|line| line.starts_with('#') || line.is_empty() || line.starts_with("import"))
        .map(str::to_string)
        .collect()
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

fn postincr(name: &str) -> SourceExpr {
    SourceExpr::Update {
        op: UpdateOp::Incr,
        prefix: false,
        target: Box::new(ident(name)),
        span: span(),
    }
}

fn method_def(key: &str, kind: MemberKind, params: Vec<&str>, body: Vec<SourceStmt>) -> ClassMember {
    ClassMember {
        kind,
        key: key.to_string(),
        is_static: false,
        function: Some(FunctionDef {
            name: None,
            params: params
                .into_iter()
                .map(|p| SourceParam {
                    pattern: SourcePattern::Ident(p.to_string(), span()),
                    default_value: None,
                    span: span(),
                })
                .collect(),
            body,
            is_arrow: false,
            span: span(),
        }),
        value: None,
        span: span(),
    }
}

// ============================================================================
// Post-increment in a call argument
// ============================================================================

#[test]
fn post_increment_in_call_argument() {
    let body = vec![
        method_def(
            "step",
            MemberKind::Method,
            vec!["temp", "n"],
            vec![expr_stmt(assign_ident(
                "t",
                call(
                    member(SourceExpr::This(span()), "_fo"),
                    vec![ident("temp"), postincr("n")],
                ),
            ))],
        ),
    ];
    let class = SourceStmt::ClassDecl(ClassDef {
        name: "C".to_string(),
        superclass: None,
        members: body,
        span: span(),
    });
    let lines = emit(vec![class]);
    assert_eq!(
        lines,
        vec![
            "class C:",
            "    def step(self, temp, n):",
            "        t = self._fo(temp, n)",
            "        n += 1",
        ]
    );
}

// ============================================================================
// Chained assignment
// ============================================================================

#[test]
fn chained_assignment_unrolls_inner_first() {
    let chained = assign_ident("a", assign_ident("b", assign_ident("c", num(5.0))));
    let lines = emit(vec![expr_stmt(chained)]);
    assert_eq!(lines, vec!["c = 5", "b = 5", "a = 5"]);
}

// ============================================================================
// Compound assignment inside an index expression
// ============================================================================

#[test]
fn compound_assignment_index_hoists_update() {
    let target = SourceExpr::Index {
        object: Box::new(ident("key")),
        index: Box::new(SourceExpr::Assign {
            op: SourceAssignOp::Sub,
            target: AssignTarget::Pattern(SourcePattern::Ident("p".to_string(), span())),
            value: Box::new(num(1.0)),
            span: span(),
        }),
        span: span(),
    };
    let stmt = expr_stmt(SourceExpr::Assign {
        op: SourceAssignOp::Assign,
        target: AssignTarget::Expr(Box::new(target)),
        value: Box::new(ident("t4")),
        span: span(),
    });
    let lines = emit(vec![stmt]);
    assert_eq!(lines, vec!["p -= 1", "key[p] = t4"]);
}

// ============================================================================
// Rotate-left idiom, width 32
// ============================================================================

#[test]
fn rotate_left_idiom_uses_prelude_helper() {
    let rot = binary(
        SourceBinaryOp::BitOr,
        binary(SourceBinaryOp::Shl, ident("x"), num(7.0)),
        binary(SourceBinaryOp::UShr, ident("x"), num(25.0)),
    );
    let lines = emit(vec![expr_stmt(assign_ident("y", rot))]);
    assert_eq!(lines, vec!["y = _rotl32(x, 7)"]);
}

// ============================================================================
// Unsigned right shift by zero
// ============================================================================

#[test]
fn ushr_zero_is_identity() {
    let stmt = expr_stmt(assign_ident(
        "y",
        binary(SourceBinaryOp::UShr, ident("x"), num(0.0)),
    ));
    let lines = emit(vec![stmt]);
    assert_eq!(lines, vec!["y = x"]);
}

// ============================================================================
// Typed-array construction heuristic
// ============================================================================

#[test]
fn typed_array_copy_vs_size() {
    let copy = SourceStmt::VarDecl {
        kind: VarKind::Const,
        decls: vec![VarDeclarator {
            target: SourcePattern::Ident("a".to_string(), span()),
            init: Some(SourceExpr::New {
                callee: Box::new(ident("Uint32Array")),
                args: vec![ident("IV")],
                span: span(),
            }),
            type_annotation: None,
            span: span(),
        }],
        span: span(),
    };
    let sized = SourceStmt::VarDecl {
        kind: VarKind::Const,
        decls: vec![VarDeclarator {
            target: SourcePattern::Ident("b".to_string(), span()),
            init: Some(SourceExpr::New {
                callee: Box::new(ident("Uint32Array")),
                args: vec![num(16.0)],
                span: span(),
            }),
            type_annotation: None,
            span: span(),
        }],
        span: span(),
    };
    let lines = emit(vec![copy, sized]);
    assert_eq!(lines, vec!["a = list(IV)", "b = [0] * 16"]);
}

// ============================================================================
// Static literal getter becomes a class variable
// ============================================================================

#[test]
fn static_getter_to_class_variable() {
    let getter = ClassMember {
        is_static: true,
        ..method_def(
            "BlockSize",
            MemberKind::Getter,
            vec![],
            vec![SourceStmt::Return {
                value: Some(num(16.0)),
                span: span(),
            }],
        )
    };
    let class = SourceStmt::ClassDecl(ClassDef {
        name: "C".to_string(),
        superclass: None,
        members: vec![getter],
        span: span(),
    });
    let lines = emit(vec![class]);
    assert_eq!(lines, vec!["class C:", "    block_size = 16"]);
}

// ============================================================================
// Backing-field substitution prevents accessor recursion
// ============================================================================

#[test]
fn property_backing_field() {
    let getter = method_def(
        "outputSize",
        MemberKind::Getter,
        vec![],
        vec![SourceStmt::Return {
            value: Some(member(SourceExpr::This(span()), "OutputSize")),
            span: span(),
        }],
    );
    let setter = method_def(
        "outputSize",
        MemberKind::Setter,
        vec!["v"],
        vec![expr_stmt(SourceExpr::Assign {
            op: SourceAssignOp::Assign,
            target: AssignTarget::Expr(Box::new(member(SourceExpr::This(span()), "OutputSize"))),
            value: Box::new(ident("v")),
            span: span(),
        })],
    );
    let class = SourceStmt::ClassDecl(ClassDef {
        name: "Digest".to_string(),
        superclass: None,
        members: vec![getter, setter],
        span: span(),
    });
    let lines = emit(vec![class]);
    assert_eq!(
        lines,
        vec![
            "class Digest:",
            "    @property",
            "    def output_size(self):",
            "        return self._output_size_backing",
            "",
            "    @output_size.setter",
            "    def output_size(self, v):",
            "        self._output_size_backing = v",
        ]
    );
}

// ============================================================================
// Counting loops
// ============================================================================

fn counting_loop(test: SourceExpr) -> SourceStmt {
    SourceStmt::For {
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
        test: Some(test),
        update: Some(postincr("i")),
        body: Box::new(SourceStmt::Block(
            vec![expr_stmt(call(ident("work"), vec![ident("i")]))],
            span(),
        )),
        span: span(),
    }
}

#[test]
fn unit_counting_loop_becomes_range() {
    let lines = emit(vec![counting_loop(binary(
        SourceBinaryOp::Lt,
        ident("i"),
        ident("n"),
    ))]);
    assert_eq!(lines, vec!["for i in range(0, n):", "    work(i)"]);
}

#[test]
fn complex_test_falls_back_to_while() {
    let lines = emit(vec![counting_loop(binary(
        SourceBinaryOp::Lt,
        call(ident("probe"), vec![ident("i")]),
        ident("n"),
    ))]);
    assert_eq!(
        lines,
        vec![
            "i = 0",
            "while probe(i) < n:",
            "    work(i)",
            "    i += 1",
        ]
    );
}

// ============================================================================
// Width discipline
// ============================================================================

#[test]
fn ushr_masks_to_32_bits() {
    let stmt = expr_stmt(assign_ident(
        "y",
        binary(SourceBinaryOp::UShr, ident("x"), num(3.0)),
    ));
    let lines = emit(vec![stmt]);
    assert_eq!(lines, vec!["y = x >> 3 & 0xFFFFFFFF"]);
}

#[test]
fn bitnot_pins_to_32_bits() {
    let stmt = expr_stmt(assign_ident(
        "y",
        SourceExpr::Unary {
            op: SourceUnaryOp::BitNot,
            arg: Box::new(ident("x")),
            span: span(),
        },
    ));
    let lines = emit(vec![stmt]);
    assert_eq!(lines, vec!["y = ~int(x) & 0xFFFFFFFF"]);
}

#[test]
fn imul_masks_product() {
    let stmt = expr_stmt(assign_ident(
        "y",
        call(member(ident("Math"), "imul"), vec![ident("a"), ident("b")]),
    ));
    let lines = emit(vec![stmt]);
    assert_eq!(lines, vec!["y = a * b & 0xFFFFFFFF"]);
}

#[test]
fn integer_literal_division_floors() {
    let stmt = expr_stmt(assign_ident(
        "h",
        binary(SourceBinaryOp::Div, num(128.0), num(2.0)),
    ));
    let lines = emit(vec![stmt]);
    assert_eq!(lines, vec!["h = 128 // 2"]);
}

// ============================================================================
// Control flow and errors
// ============================================================================

#[test]
fn do_while_lowers_to_guarded_break() {
    let stmt = SourceStmt::DoWhile {
        body: Box::new(SourceStmt::Block(
            vec![expr_stmt(call(ident("round"), vec![]))],
            span(),
        )),
        test: binary(SourceBinaryOp::Gt, ident("n"), num(0.0)),
        span: span(),
    };
    let lines = emit(vec![stmt]);
    assert_eq!(
        lines,
        vec![
            "while True:",
            "    round_()",
            "    if not (n > 0):",
            "        break",
        ]
    );
}

#[test]
fn throw_null_becomes_verification_error() {
    let stmt = SourceStmt::Throw {
        value: SourceExpr::Null(span()),
        span: span(),
    };
    let lines = emit(vec![stmt]);
    assert_eq!(lines, vec!["raise ValueError(\"Verification failed\")"]);
}

#[test]
fn empty_catch_receives_pass() {
    let stmt = SourceStmt::Try {
        block: vec![expr_stmt(call(ident("risky"), vec![]))],
        handler: Some(CatchClause {
            param: Some("e".to_string()),
            body: vec![],
            span: span(),
        }),
        finalizer: None,
        span: span(),
    };
    let lines = emit(vec![stmt]);
    assert_eq!(
        lines,
        vec![
            "try:",
            "    risky()",
            "except Exception as e:",
            "    pass",
        ]
    );
}

#[test]
fn switch_lowers_to_elif_chain_without_breaks() {
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
            case(
                Some(num(2.0)),
                vec![
                    expr_stmt(assign_ident("x", num(20.0))),
                    SourceStmt::Break { span: span() },
                ],
            ),
            case(None, vec![expr_stmt(assign_ident("x", num(0.0)))]),
        ],
        span: span(),
    };
    let lines = emit(vec![stmt]);
    assert_eq!(
        lines,
        vec![
            "if mode == 1:",
            "    x = 10",
            "elif mode == 2:",
            "    x = 20",
            "else:",
            "    x = 0",
        ]
    );
}

// ============================================================================
// Library mappings
// ============================================================================

#[test]
fn string_replace_goes_through_safe_replace() {
    let stmt = expr_stmt(assign_ident(
        "t",
        call(
            member(ident("s"), "replace"),
            vec![
                SourceExpr::Str("a".to_string(), span()),
                SourceExpr::Str("b".to_string(), span()),
            ],
        ),
    ));
    let out = transpile(&module(vec![stmt]), &plain_options());
    assert!(out.text.contains("t = safe_replace(s, \"a\", \"b\")"));
    assert!(out
        .text
        .contains("# Requires prelude helpers: safe_replace"));
}

#[test]
fn template_literal_becomes_fstring() {
    let template = SourceExpr::Template {
        quasis: vec!["size=".to_string(), String::new()],
        exprs: vec![ident("n")],
        span: span(),
    };
    let lines = emit(vec![expr_stmt(assign_ident("msg", template))]);
    assert_eq!(lines, vec!["msg = f\"size={n}\""]);
}

#[test]
fn map_with_index_callback_uses_enumerate() {
    let callback = SourceExpr::Function(FunctionDef {
        name: None,
        params: vec![
            SourceParam {
                pattern: SourcePattern::Ident("x".to_string(), span()),
                default_value: None,
                span: span(),
            },
            SourceParam {
                pattern: SourcePattern::Ident("i".to_string(), span()),
                default_value: None,
                span: span(),
            },
        ],
        body: vec![SourceStmt::Return {
            value: Some(binary(SourceBinaryOp::Add, ident("x"), ident("i"))),
            span: span(),
        }],
        is_arrow: true,
        span: span(),
    });
    let stmt = expr_stmt(assign_ident(
        "out",
        call(member(ident("words"), "map"), vec![callback]),
    ));
    let lines = emit(vec![stmt]);
    assert_eq!(lines, vec!["out = [x + i for i, x in enumerate(words)]"]);
}

#[test]
fn instanceof_and_framework_stub_collection() {
    let stmt = expr_stmt(assign_ident(
        "ok",
        binary(
            SourceBinaryOp::InstanceOf,
            ident("algo"),
            ident("BlockCipherAlgorithm"),
        ),
    ));
    let out = transpile(&module(vec![stmt]), &plain_options());
    assert!(out.text.contains("ok = isinstance(algo, BlockCipherAlgorithm)"));
    assert!(out.text.contains("class BlockCipherAlgorithm:"));
}

#[test]
fn pack_and_unpack_byte_forms() {
    let pack = call(
        member(ident("OpCodes"), "Pack32BE"),
        vec![ident("b0"), ident("b1"), ident("b2"), ident("b3")],
    );
    let unpack = call(member(ident("OpCodes"), "Unpack32LE"), vec![ident("w")]);
    let lines = emit(vec![
        expr_stmt(assign_ident("word", pack)),
        expr_stmt(assign_ident("bytes_out", unpack)),
    ]);
    assert_eq!(
        lines,
        vec![
            "word = int.from_bytes([b0, b1, b2, b3], \"big\")",
            "bytes_out = list((w & 0xFFFFFFFF).to_bytes(4, \"little\"))",
        ]
    );
}
