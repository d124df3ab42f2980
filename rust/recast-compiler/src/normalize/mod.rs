//! Source AST → IL AST normalization. One bottom-up pass with a top-level
//! recognizer for module wrappers.

pub mod builtins;
mod classes;
mod destructure;
pub mod idioms;
pub mod infer;
pub mod wrapper;

use recast_core::diag::Warnings;
use recast_core::il::{
    AssignKind, IlBinaryOp, IlCatch, IlDecl, IlExpr, IlExprKind, IlFunction, IlLiteral, IlModule,
    IlParam, IlStmt, IlSwitchCase, IlUnaryOp, IlVarDecl, InterpPart, LambdaBody, ObjectOp,
};
use recast_core::source::{
    AssignTarget, FunctionDef, PropKey, SourceAssignOp, SourceBinaryOp, SourceExpr,
    SourceLogicalOp, SourceModule, SourcePattern, SourceStmt, SourceUnaryOp, UpdateOp, VarKind,
};
use recast_core::span::Span;
use recast_core::types::{ElemType, IlType};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use infer::TypeEnv;

/// Normalize a Source module into IL. Never fails: unrecognized subtrees
/// degrade to `Unknown` placeholders recorded in the returned warnings.
pub fn normalize(module: &SourceModule) -> (IlModule, Warnings) {
    let fingerprint = fingerprint(module);
    let mut n = Normalizer::new();
    let top = wrapper::unwrap_top_level(&module.body, &mut n.warnings);
    let unwrapped = !std::ptr::eq(top.as_ptr(), module.body.as_ptr());

    // Pre-register class names so forward references type as instances.
    for stmt in top {
        if let SourceStmt::ClassDecl(c) = stmt {
            n.class_names.insert(c.name.clone());
        }
    }

    let mut decls = Vec::new();
    for stmt in top {
        match stmt {
            SourceStmt::FunctionDecl(f) => {
                let func = n.function(f);
                n.env.declare(&func.name, IlType::Func);
                decls.push(IlDecl::Function(func));
            }
            SourceStmt::ClassDecl(c) => decls.push(IlDecl::Class(n.class(c))),
            SourceStmt::VarDecl { .. } => {
                for lowered in n.stmt(stmt) {
                    match lowered {
                        IlStmt::VarDecl(d) => decls.push(IlDecl::Var(d)),
                        other => decls.push(IlDecl::Stmt(other)),
                    }
                }
            }
            other if unwrapped && !wrapper::is_kept_declaration(other) => {
                // Registration side effects and feature detection inside the
                // wrapper are not part of the module.
                n.warnings
                    .note("discarded wrapper statement", Some(other.span()));
            }
            other => {
                for lowered in n.stmt(other) {
                    decls.push(IlDecl::Stmt(lowered));
                }
            }
        }
    }

    let il = IlModule {
        name: module.name.clone(),
        fingerprint,
        decls,
        span: module.span,
    };
    (il, n.warnings)
}

fn fingerprint(module: &SourceModule) -> String {
    let bytes = serde_json::to_vec(module).unwrap_or_default();
    format!("sha256:{:x}", Sha256::digest(&bytes))
}

pub(crate) struct Normalizer {
    pub(crate) warnings: Warnings,
    pub(crate) env: TypeEnv,
    pub(crate) class_names: HashSet<String>,
    temp_counter: usize,
}

impl Normalizer {
    pub(crate) fn new() -> Self {
        Self {
            warnings: Warnings::new(),
            env: TypeEnv::new(),
            class_names: HashSet::new(),
            temp_counter: 0,
        }
    }

    pub(crate) fn fresh_temp(&mut self) -> String {
        let name = format!("_tmp{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    // ── Statements ──

    pub(crate) fn block(&mut self, body: &[SourceStmt]) -> Vec<IlStmt> {
        body.iter().flat_map(|s| self.stmt(s)).collect()
    }

    /// Lower a statement used as a loop or branch body into a statement list.
    pub(crate) fn body_of(&mut self, stmt: &SourceStmt) -> Vec<IlStmt> {
        match stmt {
            SourceStmt::Block(body, _) => {
                self.env.push();
                let lowered = self.block(body);
                self.env.pop();
                lowered
            }
            other => self.stmt(other),
        }
    }

    pub(crate) fn stmt(&mut self, stmt: &SourceStmt) -> Vec<IlStmt> {
        match stmt {
            SourceStmt::VarDecl { kind, decls, .. } => {
                let is_const = *kind == VarKind::Const;
                decls
                    .iter()
                    .flat_map(|d| self.var_declarator(&d.target, &d.init, &d.type_annotation, is_const, d.span))
                    .collect()
            }
            SourceStmt::Expr { expr, span } => self.expr_stmt(expr, *span),
            SourceStmt::Return { value, span } => vec![IlStmt::Return {
                value: value.as_ref().map(|v| self.expr(v)),
                span: *span,
            }],
            SourceStmt::If {
                test,
                consequent,
                alternate,
                span,
            } => vec![IlStmt::If {
                test: self.expr(test),
                then_body: self.body_of(consequent),
                else_body: alternate.as_ref().map(|a| self.body_of(a)),
                span: *span,
            }],
            SourceStmt::For {
                init,
                test,
                update,
                body,
                span,
            } => {
                self.env.push();
                let mut init_stmts = match init {
                    Some(init) => self.stmt(init),
                    None => vec![],
                };
                let loop_init = init_stmts.pop().map(Box::new);
                let lowered = IlStmt::For {
                    init: loop_init,
                    test: test.as_ref().map(|t| self.expr(t)),
                    update: update.as_ref().map(|u| self.expr(u)),
                    body: self.body_of(body),
                    span: *span,
                };
                self.env.pop();
                init_stmts.push(lowered);
                init_stmts
            }
            SourceStmt::ForOf {
                target, iter, body, ..
            } => self.for_of(target, iter, body, stmt.span()),
            SourceStmt::ForIn {
                target, iter, body, ..
            } => {
                let span = stmt.span();
                let keys = {
                    let obj = self.expr(iter);
                    IlExpr::new(
                        IlExprKind::ObjectOp {
                            op: ObjectOp::Keys,
                            args: vec![obj],
                        },
                        IlType::List(Box::new(IlType::Str)),
                        span,
                    )
                };
                self.env.push();
                let var = match target {
                    SourcePattern::Ident(name, _) => {
                        self.env.declare(name, IlType::Str);
                        name.clone()
                    }
                    other => {
                        self.warnings
                            .warn("destructuring for-in target unsupported", Some(other.span()));
                        self.fresh_temp()
                    }
                };
                let body = self.body_of(body);
                self.env.pop();
                vec![IlStmt::ForEach {
                    var,
                    iter: keys,
                    body,
                    span,
                }]
            }
            SourceStmt::While { test, body, span } => vec![IlStmt::While {
                test: self.expr(test),
                body: self.body_of(body),
                span: *span,
            }],
            SourceStmt::DoWhile { body, test, span } => vec![IlStmt::DoWhile {
                body: self.body_of(body),
                test: self.expr(test),
                span: *span,
            }],
            SourceStmt::Switch {
                discriminant,
                cases,
                span,
            } => vec![self.switch(discriminant, cases, *span)],
            SourceStmt::Try {
                block,
                handler,
                finalizer,
                span,
            } => {
                let body = {
                    self.env.push();
                    let b = self.block(block);
                    self.env.pop();
                    b
                };
                let catch = handler.as_ref().map(|h| {
                    self.env.push();
                    if let Some(param) = &h.param {
                        self.env.declare(param, IlType::Any);
                    }
                    let catch_body = self.block(&h.body);
                    self.env.pop();
                    IlCatch {
                        param: h.param.clone(),
                        body: catch_body,
                        span: h.span,
                    }
                });
                let finally = finalizer.as_ref().map(|f| self.block(f));
                vec![IlStmt::Try {
                    body,
                    catch,
                    finally,
                    span: *span,
                }]
            }
            SourceStmt::Throw { value, span } => vec![IlStmt::Throw {
                value: self.expr(value),
                span: *span,
            }],
            SourceStmt::Break { span } => vec![IlStmt::Break(*span)],
            SourceStmt::Continue { span } => vec![IlStmt::Continue(*span)],
            SourceStmt::Block(body, span) => {
                self.env.push();
                let lowered = self.block(body);
                self.env.pop();
                vec![IlStmt::Block(lowered, *span)]
            }
            SourceStmt::Empty(_) => vec![],
            SourceStmt::FunctionDecl(f) => {
                // Nested function declarations become lambda-initialized locals.
                let func = self.function(f);
                let name = func.name.clone();
                self.env.declare(&name, IlType::Func);
                let span = func.span;
                let lambda = IlExpr::new(
                    IlExprKind::Lambda {
                        params: func.params,
                        body: LambdaBody::Block(func.body),
                    },
                    IlType::Func,
                    span,
                );
                vec![IlStmt::VarDecl(IlVarDecl {
                    name,
                    ty: IlType::Func,
                    init: Some(lambda),
                    is_const: true,
                    span,
                })]
            }
            SourceStmt::ClassDecl(c) => {
                self.warnings
                    .warn("nested class declaration unsupported", Some(c.span));
                vec![IlStmt::Unknown {
                    kind: "NestedClass".to_string(),
                    snapshot: c.name.clone(),
                    span: c.span,
                }]
            }
            SourceStmt::Unknown { kind, detail, span } => {
                self.warnings.placeholder(kind, detail, Some(*span));
                vec![IlStmt::Unknown {
                    kind: kind.clone(),
                    snapshot: recast_core::diag::snapshot(detail, 160),
                    span: *span,
                }]
            }
        }
    }

    fn var_declarator(
        &mut self,
        target: &SourcePattern,
        init: &Option<SourceExpr>,
        annotation: &Option<String>,
        is_const: bool,
        span: Span,
    ) -> Vec<IlStmt> {
        let init_il = init.as_ref().map(|e| self.expr(e));
        match target {
            SourcePattern::Ident(name, _) => {
                let ty = annotation
                    .as_ref()
                    .map(|a| infer::parse_annotation(a))
                    .filter(|t| *t != IlType::Any)
                    .or_else(|| init_il.as_ref().map(|e| e.ty.clone()))
                    .unwrap_or(IlType::Any);
                self.env.declare(name, ty.clone());
                vec![IlStmt::VarDecl(IlVarDecl {
                    name: name.clone(),
                    ty,
                    init: init_il,
                    is_const,
                    span,
                })]
            }
            pattern => match init_il {
                Some(init_il) => self.expand_decl_pattern(pattern, init_il, is_const, span),
                None => {
                    self.warnings
                        .warn("destructuring declaration without initializer", Some(span));
                    vec![]
                }
            },
        }
    }

    fn expr_stmt(&mut self, expr: &SourceExpr, span: Span) -> Vec<IlStmt> {
        match expr {
            SourceExpr::Assign {
                op, target, value, ..
            } => self.assign_stmt(*op, target, value, span),
            SourceExpr::Update {
                op, target, ..
            } => {
                let target_il = self.expr(target);
                let assign_op = match op {
                    UpdateOp::Incr => AssignKind::Add,
                    UpdateOp::Decr => AssignKind::Sub,
                };
                vec![IlStmt::Assign {
                    target: target_il,
                    op: assign_op,
                    value: IlExpr::int(1, span),
                    span,
                }]
            }
            SourceExpr::Sequence(parts, _) => parts
                .iter()
                .flat_map(|p| self.expr_stmt(p, p.span()))
                .collect(),
            SourceExpr::Call {
                callee, args, ..
            } => {
                // DataView writes only make sense as statements.
                if let SourceExpr::Member { object, property, .. } = callee.as_ref() {
                    if property.starts_with("set") {
                        let recv = self.expr(object);
                        if matches!(recv.ty, IlType::DataView) {
                            let il_args: Vec<IlExpr> =
                                args.iter().map(|a| self.expr(a)).collect();
                            match builtins::dataview_set(recv, property, il_args, span) {
                                Ok((target, value)) => {
                                    return vec![IlStmt::Assign {
                                        target,
                                        op: AssignKind::Simple,
                                        value,
                                        span,
                                    }];
                                }
                                Err(_) => {
                                    // Not a recognized accessor; fall through
                                    // to the generic path below.
                                }
                            }
                        }
                    }
                }
                vec![IlStmt::Expr {
                    expr: self.expr(expr),
                    span,
                }]
            }
            other => vec![IlStmt::Expr {
                expr: self.expr(other),
                span,
            }],
        }
    }

    fn assign_stmt(
        &mut self,
        op: SourceAssignOp,
        target: &AssignTarget,
        value: &SourceExpr,
        span: Span,
    ) -> Vec<IlStmt> {
        match target {
            AssignTarget::Pattern(SourcePattern::Ident(name, name_span)) => {
                let value_il = self.expr(value);
                if self.env.lookup(name) == IlType::Any {
                    self.env.declare(name, value_il.ty.clone());
                }
                let target_il = IlExpr::ident(name.clone(), self.env.lookup(name), *name_span);
                vec![IlStmt::Assign {
                    target: target_il,
                    op: assign_kind(op),
                    value: value_il,
                    span,
                }]
            }
            AssignTarget::Pattern(pattern) => {
                let value_il = self.expr(value);
                self.expand_assign_pattern(pattern, value_il, span)
            }
            AssignTarget::Expr(te) => {
                // `arr.length = 0` is the Source's clear-in-place idiom.
                if let (SourceAssignOp::Assign, SourceExpr::Member { object, property, .. }) =
                    (op, te.as_ref())
                {
                    if property == "length" && matches!(value, SourceExpr::Num(n, _) if *n == 0.0) {
                        let recv = self.expr(object);
                        return vec![IlStmt::Expr {
                            expr: IlExpr::new(
                                IlExprKind::ArrayOp {
                                    op: recast_core::il::ArrayOp::Clear,
                                    recv: Box::new(recv),
                                    args: vec![],
                                },
                                IlType::Void,
                                span,
                            ),
                            span,
                        }];
                    }
                }
                let target_il = self.expr(te);
                let value_il = self.expr(value);
                vec![IlStmt::Assign {
                    target: target_il,
                    op: assign_kind(op),
                    value: value_il,
                    span,
                }]
            }
        }
    }

    fn for_of(
        &mut self,
        target: &SourcePattern,
        iter: &SourceExpr,
        body: &SourceStmt,
        span: Span,
    ) -> Vec<IlStmt> {
        let iter_il = self.expr(iter);
        let elem_ty = iter_il.ty.element().unwrap_or(IlType::Any);
        self.env.push();
        let (var, mut prologue) = match target {
            SourcePattern::Ident(name, _) => {
                self.env.declare(name, elem_ty);
                (name.clone(), vec![])
            }
            pattern => {
                let temp = self.fresh_temp();
                self.env.declare(&temp, elem_ty);
                let temp_ref = IlExpr::ident(temp.clone(), IlType::Any, span);
                let prologue = self.expand_decl_pattern(pattern, temp_ref, false, span);
                (temp, prologue)
            }
        };
        let mut lowered_body = self.body_of(body);
        self.env.pop();
        prologue.append(&mut lowered_body);
        vec![IlStmt::ForEach {
            var,
            iter: iter_il,
            body: prologue,
            span,
        }]
    }

    fn switch(
        &mut self,
        discriminant: &SourceExpr,
        cases: &[recast_core::source::SwitchCase],
        span: Span,
    ) -> IlStmt {
        let disc = self.expr(discriminant);
        let mut lowered_cases = Vec::new();
        let mut default = None;
        let mut pending_tests: Vec<IlExpr> = Vec::new();
        for case in cases {
            match &case.test {
                Some(test) => {
                    let test_il = self.expr(test);
                    if case.body.is_empty() {
                        // Fall-through label sharing the next body.
                        pending_tests.push(test_il);
                    } else {
                        let mut tests = std::mem::take(&mut pending_tests);
                        tests.push(test_il);
                        lowered_cases.push(IlSwitchCase {
                            tests,
                            body: self.block(&case.body),
                            span: case.span,
                        });
                    }
                }
                None => {
                    default = Some(self.block(&case.body));
                }
            }
        }
        if !pending_tests.is_empty() {
            // Trailing labels with no body behave like the default arm.
            self.warnings
                .note("trailing switch labels without a body dropped", Some(span));
        }
        IlStmt::Switch {
            discriminant: disc,
            cases: lowered_cases,
            default,
            span,
        }
    }

    // ── Functions ──

    pub(crate) fn function(&mut self, f: &FunctionDef) -> IlFunction {
        self.env.push();
        let params = self.params(&f.params);
        let body = self.block(&f.body);
        self.env.pop();
        let return_type = infer::infer_return_type(&body);
        IlFunction {
            name: f.name.clone().unwrap_or_default(),
            params,
            return_type,
            body,
            doc: None,
            span: f.span,
        }
    }

    fn params(&mut self, params: &[recast_core::source::SourceParam]) -> Vec<IlParam> {
        params
            .iter()
            .map(|p| {
                let default_value = p.default_value.as_ref().map(|d| self.expr(d));
                let name = match &p.pattern {
                    SourcePattern::Ident(name, _) => name.clone(),
                    other => {
                        self.warnings
                            .warn("destructuring parameter unsupported", Some(other.span()));
                        self.fresh_temp()
                    }
                };
                let ty = default_value
                    .as_ref()
                    .map(|d| d.ty.clone())
                    .unwrap_or(IlType::Any);
                self.env.declare(&name, ty.clone());
                IlParam {
                    name,
                    ty,
                    default_value,
                    span: p.span,
                }
            })
            .collect()
    }

    // ── Expressions ──

    pub(crate) fn expr(&mut self, expr: &SourceExpr) -> IlExpr {
        let span = expr.span();
        match expr {
            SourceExpr::Num(n, _) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 9_007_199_254_740_992.0 {
                    IlExpr::int(*n as i64, span)
                } else {
                    IlExpr::literal(IlLiteral::Float(*n), span)
                }
            }
            SourceExpr::Str(s, _) => IlExpr::literal(IlLiteral::Str(s.clone()), span),
            SourceExpr::Bool(b, _) => IlExpr::literal(IlLiteral::Bool(*b), span),
            SourceExpr::Null(_) => IlExpr::literal(IlLiteral::Null, span),
            SourceExpr::Regex { pattern, flags, .. } => IlExpr::literal(
                IlLiteral::Regex {
                    pattern: pattern.clone(),
                    flags: flags.clone(),
                },
                span,
            ),
            SourceExpr::BigInt(digits, _) => {
                match num_bigint::BigInt::parse_bytes(digits.as_bytes(), 10) {
                    Some(value) => IlExpr::literal(IlLiteral::BigInt(value), span),
                    None => {
                        self.warnings
                            .warn(format!("unparseable bigint literal: {}", digits), Some(span));
                        IlExpr::int(0, span)
                    }
                }
            }
            SourceExpr::Template { quasis, exprs, .. } => {
                let mut parts = Vec::new();
                for (i, quasi) in quasis.iter().enumerate() {
                    if !quasi.is_empty() {
                        parts.push(InterpPart::Lit(quasi.clone()));
                    }
                    if i < exprs.len() {
                        parts.push(InterpPart::Expr(self.expr(&exprs[i])));
                    }
                }
                IlExpr::new(IlExprKind::StringInterp(parts), IlType::Str, span)
            }
            SourceExpr::Ident(name, _) => match name.as_str() {
                "undefined" => IlExpr::literal(IlLiteral::Null, span),
                "NaN" => IlExpr::new(
                    IlExprKind::NumberConstant(recast_core::il::NumberConst::NaN),
                    IlType::Float,
                    span,
                ),
                "Infinity" => IlExpr::new(
                    IlExprKind::NumberConstant(recast_core::il::NumberConst::PositiveInfinity),
                    IlType::Float,
                    span,
                ),
                _ => {
                    let ty = if self.class_names.contains(name) {
                        IlType::Func
                    } else {
                        self.env.lookup(name)
                    };
                    IlExpr::ident(name.clone(), ty, span)
                }
            },
            SourceExpr::This(_) => IlExpr::new(IlExprKind::ThisRef, IlType::Any, span),
            SourceExpr::Super(_) => {
                self.warnings
                    .warn("super outside call or member position", Some(span));
                IlExpr::new(
                    IlExprKind::Unknown {
                        kind: "Super".to_string(),
                        snapshot: String::new(),
                    },
                    IlType::Any,
                    span,
                )
            }
            SourceExpr::Array(items, _) => {
                let lowered: Vec<IlExpr> = items.iter().map(|e| self.expr(e)).collect();
                let elem = unified_element_type(&lowered);
                IlExpr::new(
                    IlExprKind::ListLit(lowered),
                    IlType::List(Box::new(elem)),
                    span,
                )
            }
            SourceExpr::Object(props, _) => {
                let entries = props
                    .iter()
                    .map(|p| {
                        let key = match &p.key {
                            PropKey::Ident(name) | PropKey::Str(name) => {
                                IlExpr::literal(IlLiteral::Str(name.clone()), p.span)
                            }
                            PropKey::Computed(e) => self.expr(e),
                        };
                        (key, self.expr(&p.value))
                    })
                    .collect();
                IlExpr::new(
                    IlExprKind::DictLit(entries),
                    IlType::Map(Box::new(IlType::Str), Box::new(IlType::Any)),
                    span,
                )
            }
            SourceExpr::Function(f) => self.lambda(f),
            SourceExpr::Unary { op, arg, .. } => self.unary(*op, arg, span),
            SourceExpr::Update {
                op,
                prefix,
                target,
                ..
            } => {
                let target_il = self.expr(target);
                let ty = if target_il.ty.is_numeric() {
                    target_il.ty.clone()
                } else {
                    IlType::Int
                };
                IlExpr::new(
                    IlExprKind::UpdateExpr {
                        incr: *op == UpdateOp::Incr,
                        prefix: *prefix,
                        target: Box::new(target_il),
                    },
                    ty,
                    span,
                )
            }
            SourceExpr::Binary {
                op, left, right, ..
            } => self.binary(*op, left, right, span),
            SourceExpr::Logical {
                op, left, right, ..
            } => {
                let left_il = self.expr(left);
                let right_il = self.expr(right);
                let il_op = match op {
                    SourceLogicalOp::And => IlBinaryOp::And,
                    SourceLogicalOp::Or => IlBinaryOp::Or,
                    SourceLogicalOp::Nullish => {
                        self.warnings
                            .note("nullish coalescing lowered to logical or", Some(span));
                        IlBinaryOp::Or
                    }
                };
                let ty = if left_il.ty == IlType::Bool && right_il.ty == IlType::Bool {
                    IlType::Bool
                } else {
                    infer::unify(&left_il.ty, &right_il.ty)
                };
                IlExpr::new(
                    IlExprKind::Binary {
                        op: il_op,
                        left: Box::new(left_il),
                        right: Box::new(right_il),
                    },
                    ty,
                    span,
                )
            }
            SourceExpr::Assign {
                op, target, value, ..
            } => match target {
                AssignTarget::Expr(te) => {
                    let target_il = self.expr(te);
                    let value_il = self.expr(value);
                    let ty = value_il.ty.clone();
                    IlExpr::new(
                        IlExprKind::AssignExpr {
                            target: Box::new(target_il),
                            op: assign_kind(*op),
                            value: Box::new(value_il),
                        },
                        ty,
                        span,
                    )
                }
                AssignTarget::Pattern(SourcePattern::Ident(name, name_span)) => {
                    let value_il = self.expr(value);
                    let ty = value_il.ty.clone();
                    let target_il = IlExpr::ident(name.clone(), self.env.lookup(name), *name_span);
                    IlExpr::new(
                        IlExprKind::AssignExpr {
                            target: Box::new(target_il),
                            op: assign_kind(*op),
                            value: Box::new(value_il),
                        },
                        ty,
                        span,
                    )
                }
                AssignTarget::Pattern(p) => {
                    self.warnings.warn(
                        "destructuring assignment in expression position unsupported",
                        Some(p.span()),
                    );
                    IlExpr::new(
                        IlExprKind::Unknown {
                            kind: "DestructuringAssignExpr".to_string(),
                            snapshot: String::new(),
                        },
                        IlType::Any,
                        span,
                    )
                }
            },
            SourceExpr::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                let test_il = self.expr(test);
                let then_il = self.expr(consequent);
                let else_il = self.expr(alternate);
                let ty = infer::unify(&then_il.ty, &else_il.ty);
                IlExpr::new(
                    IlExprKind::Conditional {
                        test: Box::new(test_il),
                        then_val: Box::new(then_il),
                        else_val: Box::new(else_il),
                    },
                    ty,
                    span,
                )
            }
            SourceExpr::Call { callee, args, .. } => self.call(callee, args, span),
            SourceExpr::New { callee, args, .. } => self.new_expr(callee, args, span),
            SourceExpr::Member {
                object, property, ..
            } => self.member(object, property, span),
            SourceExpr::Index { object, index, .. } => {
                let object_il = self.expr(object);
                let index_il = self.expr(index);
                let ty = object_il.ty.element().unwrap_or(IlType::Any);
                IlExpr::new(
                    IlExprKind::Subscript {
                        object: Box::new(object_il),
                        index: Box::new(index_il),
                    },
                    ty,
                    span,
                )
            }
            SourceExpr::Sequence(parts, _) => {
                let lowered: Vec<IlExpr> = parts.iter().map(|p| self.expr(p)).collect();
                let ty = lowered.last().map(|e| e.ty.clone()).unwrap_or(IlType::Any);
                IlExpr::new(IlExprKind::Sequence(lowered), ty, span)
            }
            SourceExpr::Spread(inner, _) => {
                let inner_il = self.expr(inner);
                let ty = inner_il.ty.clone();
                IlExpr::new(IlExprKind::Spread(Box::new(inner_il)), ty, span)
            }
            SourceExpr::Unknown { kind, detail, .. } => {
                self.warnings.placeholder(kind, detail, Some(span));
                IlExpr::new(
                    IlExprKind::Unknown {
                        kind: kind.clone(),
                        snapshot: recast_core::diag::snapshot(detail, 160),
                    },
                    IlType::Any,
                    span,
                )
            }
        }
    }

    fn lambda(&mut self, f: &FunctionDef) -> IlExpr {
        self.env.push();
        let params = self.params(&f.params);
        let body = self.block(&f.body);
        self.env.pop();
        // Single-return arrow bodies stay expression lambdas so targets with
        // expression-only lambdas can take them unchanged.
        let body = if f.is_arrow && body.len() == 1 {
            match body.into_iter().next() {
                Some(IlStmt::Return {
                    value: Some(value), ..
                }) => LambdaBody::Expr(Box::new(value)),
                Some(other) => LambdaBody::Block(vec![other]),
                None => LambdaBody::Block(vec![]),
            }
        } else {
            LambdaBody::Block(body)
        };
        IlExpr::new(IlExprKind::Lambda { params, body }, IlType::Func, f.span)
    }

    fn unary(&mut self, op: SourceUnaryOp, arg: &SourceExpr, span: Span) -> IlExpr {
        match op {
            SourceUnaryOp::TypeOf => {
                let arg_il = self.expr(arg);
                return IlExpr::new(
                    IlExprKind::TypeOfExpr(Box::new(arg_il)),
                    IlType::Str,
                    span,
                );
            }
            SourceUnaryOp::Void => {
                self.warnings.note("void expression lowered to null", Some(span));
                return IlExpr::literal(IlLiteral::Null, span);
            }
            SourceUnaryOp::Delete => {
                self.warnings.warn("delete expression unsupported", Some(span));
                return IlExpr::new(
                    IlExprKind::Unknown {
                        kind: "Delete".to_string(),
                        snapshot: String::new(),
                    },
                    IlType::Any,
                    span,
                );
            }
            _ => {}
        }
        let arg_il = self.expr(arg);
        // Fold numeric negation into the literal for cleaner emission.
        if op == SourceUnaryOp::Minus {
            if let IlExprKind::Literal(IlLiteral::Int(n)) = &arg_il.kind {
                return IlExpr::int(-n, span);
            }
            if let IlExprKind::Literal(IlLiteral::Float(v)) = &arg_il.kind {
                return IlExpr::literal(IlLiteral::Float(-v), span);
            }
        }
        let (il_op, ty) = match op {
            SourceUnaryOp::Minus => (IlUnaryOp::Neg, arg_il.ty.clone()),
            SourceUnaryOp::Plus => (IlUnaryOp::Pos, arg_il.ty.clone()),
            SourceUnaryOp::Not => (IlUnaryOp::Not, IlType::Bool),
            SourceUnaryOp::BitNot => (IlUnaryOp::BitNot, IlType::Int32),
            SourceUnaryOp::TypeOf | SourceUnaryOp::Void | SourceUnaryOp::Delete => {
                unreachable!("handled above")
            }
        };
        IlExpr::new(
            IlExprKind::Unary {
                op: il_op,
                operand: Box::new(arg_il),
            },
            ty,
            span,
        )
    }

    fn binary(
        &mut self,
        op: SourceBinaryOp,
        left: &SourceExpr,
        right: &SourceExpr,
        span: Span,
    ) -> IlExpr {
        let left_il = self.expr(left);
        let right_il = self.expr(right);

        if op == SourceBinaryOp::BitOr {
            if let Some(rotate) = idioms::match_rotate(&left_il, &right_il, span) {
                return rotate;
            }
            if let Some(packed) = idioms::match_pack(&left_il, &right_il, span) {
                return packed;
            }
        }
        if op == SourceBinaryOp::InstanceOf {
            if let Some(class_name) = right.as_ident() {
                return IlExpr::new(
                    IlExprKind::InstanceOfCheck {
                        value: Box::new(left_il),
                        class_name: class_name.to_string(),
                    },
                    IlType::Bool,
                    span,
                );
            }
        }

        let il_op = match op {
            SourceBinaryOp::Add => IlBinaryOp::Add,
            SourceBinaryOp::Sub => IlBinaryOp::Sub,
            SourceBinaryOp::Mul => IlBinaryOp::Mul,
            SourceBinaryOp::Div => IlBinaryOp::Div,
            SourceBinaryOp::Mod => IlBinaryOp::Mod,
            SourceBinaryOp::Pow => IlBinaryOp::Pow,
            SourceBinaryOp::Eq | SourceBinaryOp::StrictEq => IlBinaryOp::Eq,
            SourceBinaryOp::NotEq | SourceBinaryOp::StrictNotEq => IlBinaryOp::NotEq,
            SourceBinaryOp::Lt => IlBinaryOp::Lt,
            SourceBinaryOp::LtEq => IlBinaryOp::LtEq,
            SourceBinaryOp::Gt => IlBinaryOp::Gt,
            SourceBinaryOp::GtEq => IlBinaryOp::GtEq,
            SourceBinaryOp::Shl => IlBinaryOp::Shl,
            SourceBinaryOp::Shr => IlBinaryOp::Shr,
            SourceBinaryOp::UShr => IlBinaryOp::UShr,
            SourceBinaryOp::BitAnd => IlBinaryOp::BitAnd,
            SourceBinaryOp::BitOr => IlBinaryOp::BitOr,
            SourceBinaryOp::BitXor => IlBinaryOp::BitXor,
            SourceBinaryOp::In => IlBinaryOp::In,
            SourceBinaryOp::InstanceOf => {
                self.warnings
                    .warn("instanceof against a non-identifier type", Some(span));
                IlBinaryOp::Eq
            }
        };
        let ty = binary_result_type(il_op, &left_il, &right_il);
        IlExpr::new(
            IlExprKind::Binary {
                op: il_op,
                left: Box::new(left_il),
                right: Box::new(right_il),
            },
            ty,
            span,
        )
    }

    fn call(&mut self, callee: &SourceExpr, args: &[SourceExpr], span: Span) -> IlExpr {
        match callee {
            SourceExpr::Super(_) => {
                let args = args.iter().map(|a| self.expr(a)).collect();
                return IlExpr::new(
                    IlExprKind::ParentConstructorCall { args },
                    IlType::Void,
                    span,
                );
            }
            SourceExpr::Member {
                object, property, ..
            } => match object.as_ref() {
                SourceExpr::Super(_) => {
                    let args = args.iter().map(|a| self.expr(a)).collect();
                    return IlExpr::new(
                        IlExprKind::ParentMethodCall {
                            method: property.clone(),
                            args,
                        },
                        IlType::Any,
                        span,
                    );
                }
                SourceExpr::This(_) => {
                    let args = args.iter().map(|a| self.expr(a)).collect();
                    return IlExpr::new(
                        IlExprKind::ThisMethodCall {
                            method: property.clone(),
                            args,
                        },
                        IlType::Any,
                        span,
                    );
                }
                SourceExpr::Ident(ns, _)
                    if builtins::PLATFORM_NAMESPACES.contains(&ns.as_str()) =>
                {
                    let il_args: Vec<IlExpr> = args.iter().map(|a| self.expr(a)).collect();
                    return match builtins::namespace_call(ns, property, il_args, span) {
                        Ok(mapped) => mapped,
                        Err(_) => {
                            let kind = format!("{}.{}", ns, property);
                            self.warnings.warn(
                                format!("unrecognized platform call: {}", kind),
                                Some(span),
                            );
                            IlExpr::new(
                                IlExprKind::Unknown {
                                    kind,
                                    snapshot: String::new(),
                                },
                                IlType::Any,
                                span,
                            )
                        }
                    };
                }
                SourceExpr::Ident(ns, _) if ns == "OpCodes" => {
                    let il_args: Vec<IlExpr> = args.iter().map(|a| self.expr(a)).collect();
                    return match builtins::opcodes_call(property, il_args, span) {
                        Ok(mapped) => mapped,
                        Err(il_args) => {
                            // Helper without an IL equivalent; the prelude
                            // carries it as a bare function.
                            self.warnings.note(
                                format!("helper call kept for the prelude: {}", property),
                                Some(span),
                            );
                            IlExpr::new(
                                IlExprKind::Call {
                                    callee: Box::new(IlExpr::ident(
                                        property.clone(),
                                        IlType::Func,
                                        span,
                                    )),
                                    args: il_args,
                                },
                                IlType::Any,
                                span,
                            )
                        }
                    };
                }
                _ => {
                    let recv = self.expr(object);
                    let il_args: Vec<IlExpr> = args.iter().map(|a| self.expr(a)).collect();
                    return match builtins::method_call(recv, property, il_args, span) {
                        Ok(mapped) => mapped,
                        Err((recv, il_args)) => IlExpr::new(
                            IlExprKind::Call {
                                callee: Box::new(IlExpr::new(
                                    IlExprKind::Member {
                                        object: Box::new(recv),
                                        name: property.clone(),
                                    },
                                    IlType::Func,
                                    span,
                                )),
                                args: il_args,
                            },
                            IlType::Any,
                            span,
                        ),
                    };
                }
            },
            SourceExpr::Ident(name, _) => {
                if let Some(cast) = self.global_cast(name, args, span) {
                    return cast;
                }
                let il_args = args.iter().map(|a| self.expr(a)).collect();
                IlExpr::new(
                    IlExprKind::Call {
                        callee: Box::new(IlExpr::ident(name.clone(), IlType::Func, span)),
                        args: il_args,
                    },
                    IlType::Any,
                    span,
                )
            }
            other => {
                let callee_il = self.expr(other);
                let il_args = args.iter().map(|a| self.expr(a)).collect();
                IlExpr::new(
                    IlExprKind::Call {
                        callee: Box::new(callee_il),
                        args: il_args,
                    },
                    IlType::Any,
                    span,
                )
            }
        }
    }

    /// Global conversion functions (`parseInt`, `Number`, …) become casts.
    fn global_cast(&mut self, name: &str, args: &[SourceExpr], span: Span) -> Option<IlExpr> {
        let target = match name {
            "parseInt" => IlType::Int,
            "parseFloat" | "Number" => IlType::Float,
            "String" => IlType::Str,
            "Boolean" => IlType::Bool,
            "BigInt" => IlType::BigInt,
            _ => return None,
        };
        let value = self.expr(args.first()?);
        if name == "parseInt" && args.len() == 2 {
            let radix = self.expr(&args[1]);
            if radix.as_int_literal() != Some(10) {
                self.warnings
                    .warn("parseInt radix argument dropped", Some(span));
            }
        }
        Some(IlExpr::new(
            IlExprKind::Cast {
                value: Box::new(value),
                target: target.clone(),
            },
            target,
            span,
        ))
    }

    fn new_expr(&mut self, callee: &SourceExpr, args: &[SourceExpr], span: Span) -> IlExpr {
        let name = match callee.as_ident() {
            Some(name) => name.to_string(),
            None => {
                let callee_il = self.expr(callee);
                let il_args = args.iter().map(|a| self.expr(a)).collect();
                return IlExpr::new(
                    IlExprKind::New {
                        callee: Box::new(callee_il),
                        args: il_args,
                    },
                    IlType::Any,
                    span,
                );
            }
        };
        if let Some(elem) = typed_array_elem(&name) {
            let mut il_args: Vec<IlExpr> = args.iter().map(|a| self.expr(a)).collect();
            if il_args.len() > 1 {
                self.warnings.warn(
                    "typed array constructed with extra arguments; keeping the first",
                    Some(span),
                );
                il_args.truncate(1);
            }
            return IlExpr::new(
                IlExprKind::TypedArrayCreation {
                    elem,
                    arg: il_args.pop().map(Box::new),
                },
                IlType::TypedArray(elem),
                span,
            );
        }
        match name.as_str() {
            "Array" => {
                let mut il_args: Vec<IlExpr> = args.iter().map(|a| self.expr(a)).collect();
                if il_args.len() > 1 {
                    // `new Array(a, b, c)` is just a list literal.
                    let elem = unified_element_type(&il_args);
                    return IlExpr::new(
                        IlExprKind::ListLit(il_args),
                        IlType::List(Box::new(elem)),
                        span,
                    );
                }
                IlExpr::new(
                    IlExprKind::ArrayCreation {
                        size: il_args.pop().map(Box::new),
                    },
                    IlType::List(Box::new(IlType::Any)),
                    span,
                )
            }
            "ArrayBuffer" => {
                let size = args
                    .first()
                    .map(|a| self.expr(a))
                    .unwrap_or_else(|| IlExpr::int(0, span));
                IlExpr::new(
                    IlExprKind::BufferCreation {
                        size: Box::new(size),
                    },
                    IlType::Buffer,
                    span,
                )
            }
            "DataView" => {
                let buffer = args
                    .first()
                    .map(|a| self.expr(a))
                    .unwrap_or_else(|| IlExpr::literal(IlLiteral::Null, span));
                IlExpr::new(
                    IlExprKind::DataViewCreation {
                        buffer: Box::new(buffer),
                    },
                    IlType::DataView,
                    span,
                )
            }
            "Map" => {
                let entries = self.literal_pairs(args, span);
                IlExpr::new(
                    IlExprKind::MapCreation { entries },
                    IlType::Map(Box::new(IlType::Any), Box::new(IlType::Any)),
                    span,
                )
            }
            "Set" => {
                let values = match args.first() {
                    Some(SourceExpr::Array(items, _)) => {
                        items.iter().map(|e| self.expr(e)).collect()
                    }
                    Some(other) => {
                        self.warnings
                            .warn("set constructed from a non-literal source", Some(span));
                        vec![self.expr(other)]
                    }
                    None => vec![],
                };
                IlExpr::new(
                    IlExprKind::SetCreation { values },
                    IlType::Set(Box::new(IlType::Any)),
                    span,
                )
            }
            "Error" | "TypeError" | "RangeError" | "SyntaxError" | "EvalError" => {
                let message = args.first().map(|a| Box::new(self.expr(a)));
                IlExpr::new(
                    IlExprKind::ErrorCreation {
                        kind: name.clone(),
                        message,
                    },
                    IlType::Any,
                    span,
                )
            }
            "RegExp" => match args.first() {
                Some(SourceExpr::Str(pattern, _)) => {
                    let flags = match args.get(1) {
                        Some(SourceExpr::Str(flags, _)) => flags.clone(),
                        _ => String::new(),
                    };
                    IlExpr::literal(
                        IlLiteral::Regex {
                            pattern: pattern.clone(),
                            flags,
                        },
                        span,
                    )
                }
                _ => {
                    self.warnings
                        .warn("dynamic RegExp construction unsupported", Some(span));
                    IlExpr::new(
                        IlExprKind::Unknown {
                            kind: "RegExp".to_string(),
                            snapshot: String::new(),
                        },
                        IlType::Regex,
                        span,
                    )
                }
            },
            _ => {
                let il_args = args.iter().map(|a| self.expr(a)).collect();
                IlExpr::new(
                    IlExprKind::New {
                        callee: Box::new(IlExpr::ident(name.clone(), IlType::Func, span)),
                        args: il_args,
                    },
                    IlType::Class(name.clone()),
                    span,
                )
            }
        }
    }

    fn literal_pairs(&mut self, args: &[SourceExpr], span: Span) -> Vec<(IlExpr, IlExpr)> {
        match args.first() {
            None => vec![],
            Some(SourceExpr::Array(pairs, _)) => pairs
                .iter()
                .filter_map(|pair| match pair {
                    SourceExpr::Array(kv, _) if kv.len() == 2 => {
                        Some((self.expr(&kv[0]), self.expr(&kv[1])))
                    }
                    other => {
                        self.warnings
                            .warn("non-pair entry in map constructor", Some(other.span()));
                        None
                    }
                })
                .collect(),
            Some(other) => {
                self.warnings
                    .warn("map constructed from a non-literal source", Some(other.span()));
                vec![]
            }
        }
    }

    fn member(&mut self, object: &SourceExpr, property: &str, span: Span) -> IlExpr {
        if let SourceExpr::Ident(ns, _) = object {
            if builtins::PLATFORM_NAMESPACES.contains(&ns.as_str()) {
                if let Some(mapped) = builtins::namespace_member(ns, property, span) {
                    return mapped;
                }
                let kind = format!("{}.{}", ns, property);
                self.warnings
                    .warn(format!("unrecognized platform member: {}", kind), Some(span));
                return IlExpr::new(
                    IlExprKind::Unknown {
                        kind,
                        snapshot: String::new(),
                    },
                    IlType::Any,
                    span,
                );
            }
        }
        if let SourceExpr::This(_) = object {
            return IlExpr::new(
                IlExprKind::ThisPropertyAccess {
                    property: property.to_string(),
                },
                IlType::Any,
                span,
            );
        }
        let object_il = self.expr(object);
        if property == "length" {
            return IlExpr::new(
                IlExprKind::ArrayOp {
                    op: recast_core::il::ArrayOp::Length,
                    recv: Box::new(object_il),
                    args: vec![],
                },
                IlType::Int,
                span,
            );
        }
        // A typed array is its own backing storage in every target, so
        // `.buffer` is the identity.
        if property == "buffer" && matches!(object_il.ty, IlType::TypedArray(_)) {
            let mut buffer = object_il;
            buffer.ty = IlType::Buffer;
            return buffer;
        }
        IlExpr::new(
            IlExprKind::Member {
                object: Box::new(object_il),
                name: property.to_string(),
            },
            IlType::Any,
            span,
        )
    }
}

fn assign_kind(op: SourceAssignOp) -> AssignKind {
    match op {
        SourceAssignOp::Assign => AssignKind::Simple,
        SourceAssignOp::Add => AssignKind::Add,
        SourceAssignOp::Sub => AssignKind::Sub,
        SourceAssignOp::Mul => AssignKind::Mul,
        SourceAssignOp::Div => AssignKind::Div,
        SourceAssignOp::Mod => AssignKind::Mod,
        SourceAssignOp::Shl => AssignKind::Shl,
        SourceAssignOp::Shr => AssignKind::Shr,
        SourceAssignOp::UShr => AssignKind::UShr,
        SourceAssignOp::BitAnd => AssignKind::BitAnd,
        SourceAssignOp::BitOr => AssignKind::BitOr,
        SourceAssignOp::BitXor => AssignKind::BitXor,
    }
}

fn binary_result_type(op: IlBinaryOp, left: &IlExpr, right: &IlExpr) -> IlType {
    if op.is_bitwise() {
        return IlType::bitwise_join();
    }
    if op.is_comparison() || op == IlBinaryOp::In {
        return IlType::Bool;
    }
    match op {
        IlBinaryOp::And | IlBinaryOp::Or => infer::unify(&left.ty, &right.ty),
        IlBinaryOp::Add => {
            if left.ty == IlType::Str || right.ty == IlType::Str {
                IlType::Str
            } else {
                left.ty.arithmetic_join(&right.ty)
            }
        }
        IlBinaryOp::Div => {
            if left.as_int_literal().is_some() && right.as_int_literal().is_some() {
                IlType::Int
            } else if left.ty.is_numeric() && right.ty.is_numeric() {
                IlType::Float
            } else {
                IlType::Any
            }
        }
        IlBinaryOp::Pow => {
            if left.ty.is_integer() && right.ty.is_integer() {
                IlType::Int
            } else {
                IlType::Float
            }
        }
        _ => left.ty.arithmetic_join(&right.ty),
    }
}

fn unified_element_type(items: &[IlExpr]) -> IlType {
    let mut iter = items.iter();
    let first = match iter.next() {
        Some(e) => e.ty.clone(),
        None => return IlType::Any,
    };
    iter.fold(first, |acc, e| infer::unify(&acc, &e.ty))
}

fn typed_array_elem(name: &str) -> Option<ElemType> {
    Some(match name {
        "Uint8Array" | "Uint8ClampedArray" => ElemType::Uint8,
        "Int8Array" => ElemType::Int8,
        "Uint16Array" => ElemType::Uint16,
        "Int16Array" => ElemType::Int16,
        "Uint32Array" => ElemType::Uint32,
        "Int32Array" => ElemType::Int32,
        "Float32Array" => ElemType::Float32,
        "Float64Array" => ElemType::Float64,
        "BigUint64Array" => ElemType::BigUint64,
        "BigInt64Array" => ElemType::BigInt64,
        _ => return None,
    })
}
