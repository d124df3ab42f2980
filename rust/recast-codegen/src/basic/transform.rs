//! IL → BASIC AST transformation.
//!
//! Resolves the BASIC side of the dialect matrix: PascalCase for types and
//! procedures with camelCase locals, `Select Case` lowering, `Do…Loop`
//! shapes, class-vs-Type emission, property-vs-method pairs, structured
//! exceptions vs `On Error` flow, and 32-bit masking with `And &HFFFFFFFF`.

use crate::heuristics::{classify_typed_array_arg, TypedArrayArg};
use crate::basic::ast::*;
use crate::session::{StmtCollector, TranspileSession};
use crate::stubs;
use recast_core::il::*;
use recast_core::naming::{to_camel_case, to_pascal_case};
use recast_core::types::{ElemType, IlType};

type Collector = StmtCollector<BasicStmt>;

/// Framework-metadata assignments dropped in Type+functions mode; the BASIC
/// record has no room for registry bookkeeping.
const DROPPED_METADATA: &[&str] = &[
    "category",
    "subCategory",
    "securityStatus",
    "complexity",
    "documentation",
    "references",
    "knownVulnerabilities",
    "tests",
    "description",
    "inventor",
    "year",
    "country",
];

pub fn transform(module: &IlModule, session: &mut TranspileSession) -> BasicModule {
    let mut t = BasicTransformer {
        session,
        current_type: None,
        loop_stack: Vec::new(),
    };
    for decl in &module.decls {
        if let IlDecl::Class(class) = decl {
            t.session.defined_classes.insert(class.name.clone());
        }
    }
    let mut decls = Vec::new();
    for decl in &module.decls {
        match decl {
            IlDecl::Class(class) => decls.extend(t.class(class)),
            IlDecl::Function(func) => {
                let lowered = t.function(func, false);
                decls.push(BasicDecl::Function(lowered));
            }
            IlDecl::Var(var) => decls.push(t.top_var(var)),
            IlDecl::Stmt(stmt) => {
                for lowered in t.stmt(stmt) {
                    decls.push(BasicDecl::Stmt(lowered));
                }
            }
        }
    }
    BasicModule {
        name: module.name.clone(),
        fingerprint: module.fingerprint.clone(),
        decls,
    }
}

struct BasicTransformer<'a> {
    session: &'a mut TranspileSession,
    /// Set in Type+functions mode: `this.x` rewrites to `self.x`.
    current_type: Option<String>,
    /// Innermost-first loop keywords, for `Exit For` vs `Exit Do`.
    loop_stack: Vec<&'static str>,
}

impl<'a> BasicTransformer<'a> {
    // ── Naming and types ──

    fn proc_name(&self, name: &str) -> String {
        to_pascal_case(name)
    }

    fn local_name(&self, name: &str) -> String {
        to_camel_case(name)
    }

    fn basic_type(&self, ty: &IlType) -> Option<String> {
        if !self.session.options.add_type_hints && *ty == IlType::Any {
            return None;
        }
        Some(match ty {
            IlType::Bool => "Boolean".to_string(),
            IlType::Int | IlType::Int32 => "Long".to_string(),
            IlType::BigInt => "LongLong".to_string(),
            IlType::Float => "Double".to_string(),
            IlType::Str => "String".to_string(),
            IlType::Bytes | IlType::Buffer | IlType::TypedArray(ElemType::Uint8) => {
                "Byte()".to_string()
            }
            IlType::TypedArray(elem) if elem.is_float() => "Double()".to_string(),
            IlType::TypedArray(_) => "Long()".to_string(),
            IlType::List(_) | IlType::Tuple(_) | IlType::Set(_) => "Variant()".to_string(),
            IlType::Map(_, _) => "Object".to_string(),
            IlType::Class(name) => name.clone(),
            _ => {
                if self.session.options.strict_types {
                    "Variant".to_string()
                } else {
                    return None;
                }
            }
        })
    }

    // ── Declarations ──

    fn top_var(&mut self, var: &IlVarDecl) -> BasicDecl {
        let mut c = Collector::new();
        let init = var.init.as_ref().map(|e| self.expr(e, &mut c));
        if !c.is_empty() {
            self.session.warnings.warn(
                "side effect in top-level initializer dropped",
                Some(var.span),
            );
        }
        BasicDecl::Var {
            name: self.proc_name(&var.name),
            ty: self.basic_type(&var.ty),
            init,
            is_const: var.is_const,
        }
    }

    fn function(&mut self, func: &IlFunction, as_method: bool) -> BasicFunc {
        let mut params: Vec<BasicParam> = Vec::new();
        if let Some(type_name) = self.current_type.clone() {
            if as_method {
                params.push(BasicParam {
                    name: "self".to_string(),
                    ty: Some(type_name),
                    default: None,
                });
            }
        }
        for p in &func.params {
            let mut c = Collector::new();
            let default = p.default_value.as_ref().map(|d| self.expr(d, &mut c));
            params.push(BasicParam {
                name: self.local_name(&p.name),
                ty: self.basic_type(&p.ty),
                default,
            });
        }
        let ret = match func.return_type {
            IlType::Void => None,
            ref ty => self.basic_type(ty).or(Some("Variant".to_string())),
        };
        let body = self.stmts(&func.body);
        BasicFunc {
            name: self.proc_name(&func.name),
            params,
            ret,
            body,
            shared: false,
        }
    }

    fn class(&mut self, class: &IlClass) -> Vec<BasicDecl> {
        if self.session.options.use_classes {
            vec![BasicDecl::Class(self.class_block(class))]
        } else {
            self.type_and_functions(class)
        }
    }

    fn class_block(&mut self, class: &IlClass) -> BasicClass {
        if let Some(base) = &class.superclass {
            if stubs::is_framework_type(base) {
                self.session.require_framework(base);
            }
        }
        let fields = class
            .fields
            .iter()
            .map(|f| {
                let mut c = Collector::new();
                let init = f.init.as_ref().map(|e| self.expr(e, &mut c));
                BasicField {
                    name: self.proc_name(&f.name),
                    ty: self.basic_type(&f.ty),
                    init,
                    shared: f.is_static,
                }
            })
            .collect();

        let mut members = Vec::new();
        for method in &class.methods {
            match method.kind {
                MethodKind::Constructor => {
                    let func = self.function(&method.func, false);
                    members.push(BasicMember::Constructor(func));
                }
                MethodKind::Getter | MethodKind::Setter => {
                    members.push(self.accessor(method));
                }
                MethodKind::Method => {
                    let mut func = self.function(&method.func, false);
                    func.shared = method.is_static;
                    if func.ret.is_none() {
                        members.push(BasicMember::Sub(func));
                    } else {
                        members.push(BasicMember::Function(func));
                    }
                }
            }
        }
        if class.static_block.is_some() {
            self.session.warnings.warn(
                "static block dropped; BASIC targets have no type initializer",
                Some(class.span),
            );
        }
        BasicClass {
            name: to_pascal_case(&class.name),
            inherits: class.superclass.clone(),
            fields,
            members,
        }
    }

    fn accessor(&mut self, method: &IlMethod) -> BasicMember {
        let name = self.proc_name(&method.name);
        let ty = self.basic_type(&method.func.return_type);
        if self.session.options.use_properties {
            match method.kind {
                MethodKind::Getter => BasicMember::PropertyGet {
                    name,
                    ty,
                    body: self.stmts(&method.func.body),
                },
                _ => {
                    let param = method
                        .func
                        .params
                        .first()
                        .map(|p| self.local_name(&p.name))
                        .unwrap_or_else(|| "value".to_string());
                    let ty = method
                        .func
                        .params
                        .first()
                        .and_then(|p| self.basic_type(&p.ty));
                    BasicMember::PropertySet {
                        name,
                        param,
                        ty,
                        body: self.stmts(&method.func.body),
                    }
                }
            }
        } else {
            // Paired accessor methods instead of properties.
            let mut func = self.function(&method.func, false);
            match method.kind {
                MethodKind::Getter => {
                    func.name = format!("Get{}", name);
                    BasicMember::Function(func)
                }
                _ => {
                    func.name = format!("Set{}", name);
                    func.ret = None;
                    BasicMember::Sub(func)
                }
            }
        }
    }

    /// `Type` record plus standalone `self`-first functions, the shape used
    /// when classes are disabled.
    fn type_and_functions(&mut self, class: &IlClass) -> Vec<BasicDecl> {
        let type_name = to_pascal_case(&class.name);
        let fields: Vec<BasicField> = class
            .fields
            .iter()
            .filter(|f| !f.is_static && !DROPPED_METADATA.contains(&f.name.as_str()))
            .map(|f| BasicField {
                name: self.proc_name(&f.name),
                ty: self.basic_type(&f.ty).or(Some("Variant".to_string())),
                init: None,
                shared: false,
            })
            .collect();
        let mut out = vec![BasicDecl::TypeDecl {
            name: type_name.clone(),
            fields,
        }];

        self.current_type = Some(type_name.clone());
        for method in &class.methods {
            let mut func = match method.kind {
                MethodKind::Constructor => {
                    let mut f = self.function_with_metadata_filter(&method.func);
                    f.name = format!("{}_Init", type_name);
                    f.ret = None;
                    f
                }
                _ => {
                    let mut f = self.function(&method.func, true);
                    f.name = format!("{}_{}", type_name, self.proc_name(&method.name));
                    f
                }
            };
            func.shared = false;
            out.push(BasicDecl::Function(func));
        }
        self.current_type = None;
        out
    }

    fn function_with_metadata_filter(&mut self, func: &IlFunction) -> BasicFunc {
        // Constructor bodies in Type mode drop framework-metadata writes.
        let filtered: Vec<IlStmt> = func
            .body
            .iter()
            .filter(|stmt| match stmt {
                IlStmt::Assign { target, .. } => match &target.kind {
                    IlExprKind::ThisPropertyAccess { property } => {
                        if DROPPED_METADATA.contains(&property.as_str()) {
                            return false;
                        }
                        true
                    }
                    _ => true,
                },
                _ => true,
            })
            .cloned()
            .collect();
        if filtered.len() != func.body.len() {
            self.session.warnings.warn(
                "framework metadata assignments dropped",
                Some(func.span),
            );
        }
        let trimmed = IlFunction {
            body: filtered,
            ..func.clone()
        };
        self.function(&trimmed, true)
    }

    // ── Statements ──

    fn stmts(&mut self, body: &[IlStmt]) -> Vec<BasicStmt> {
        body.iter().flat_map(|s| self.stmt(s)).collect()
    }

    fn stmt(&mut self, stmt: &IlStmt) -> Vec<BasicStmt> {
        let mut c = Collector::new();
        let main = self.stmt_with(stmt, &mut c);
        c.wrap(main)
    }

    fn stmt_with(&mut self, stmt: &IlStmt, c: &mut Collector) -> Vec<BasicStmt> {
        match stmt {
            IlStmt::VarDecl(decl) => self.var_decl(decl, c),
            IlStmt::Assign {
                target, op, value, ..
            } => {
                let target_b = self.expr(target, c);
                let value_b = self.expr(value, c);
                vec![self.make_assign(target_b, *op, value_b)]
            }
            IlStmt::Expr { expr, .. } => {
                if let IlExprKind::DebugOutput(args) = &expr.kind {
                    let args_b = self.exprs(args, c);
                    return vec![BasicStmt::ExprStmt(self.debug_call(args_b))];
                }
                let lowered = self.expr(expr, c);
                if matches!(lowered, BasicExpr::Name(_)) && !c.is_empty() {
                    return vec![];
                }
                vec![BasicStmt::ExprStmt(lowered)]
            }
            IlStmt::Return { value, .. } => {
                let value = value.as_ref().map(|v| self.expr(v, c));
                vec![BasicStmt::Return(value)]
            }
            IlStmt::If {
                test,
                then_body,
                else_body,
                ..
            } => {
                let mut tc = Collector::new();
                let test_b = self.expr(test, &mut tc);
                for extracted in tc.drain() {
                    c.push_pre(extracted);
                }
                vec![BasicStmt::If {
                    test: test_b,
                    body: self.stmts(then_body),
                    elifs: vec![],
                    orelse: else_body
                        .as_ref()
                        .map(|b| self.stmts(b))
                        .unwrap_or_default(),
                }]
            }
            IlStmt::While { test, body, .. } => {
                let mut tc = Collector::new();
                let test_b = self.expr(test, &mut tc);
                let extracted = tc.drain();
                for stmt in &extracted {
                    c.push_pre(stmt.clone());
                }
                self.loop_stack.push("Do");
                let mut body_b = self.stmts(body);
                self.loop_stack.pop();
                body_b.extend(extracted);
                vec![BasicStmt::DoLoop {
                    test: test_b,
                    body: body_b,
                    test_at_top: true,
                }]
            }
            IlStmt::DoWhile { body, test, .. } => {
                self.loop_stack.push("Do");
                let mut body_b = self.stmts(body);
                self.loop_stack.pop();
                let mut tc = Collector::new();
                let test_b = self.expr(test, &mut tc);
                body_b.extend(tc.drain());
                vec![BasicStmt::DoLoop {
                    test: test_b,
                    body: body_b,
                    test_at_top: false,
                }]
            }
            IlStmt::For {
                init,
                test,
                update,
                body,
                ..
            } => self.for_loop(init, test, update, body, c),
            IlStmt::ForEach {
                var, iter, body, ..
            } => {
                let iter_b = self.expr(iter, c);
                self.loop_stack.push("For");
                let body_b = self.stmts(body);
                self.loop_stack.pop();
                vec![BasicStmt::ForEach {
                    var: self.local_name(var),
                    iter: iter_b,
                    body: body_b,
                }]
            }
            IlStmt::Switch {
                discriminant,
                cases,
                default,
                ..
            } => {
                let subject = self.expr(discriminant, c);
                let cases_b = cases
                    .iter()
                    .map(|case| {
                        let tests = self.exprs(&case.tests, c);
                        let body: Vec<IlStmt> = case
                            .body
                            .iter()
                            .filter(|s| !matches!(s, IlStmt::Break(_)))
                            .cloned()
                            .collect();
                        (tests, self.stmts(&body))
                    })
                    .collect();
                let default_b = default
                    .as_ref()
                    .map(|d| {
                        let body: Vec<IlStmt> = d
                            .iter()
                            .filter(|s| !matches!(s, IlStmt::Break(_)))
                            .cloned()
                            .collect();
                        self.stmts(&body)
                    })
                    .unwrap_or_default();
                vec![BasicStmt::Select {
                    subject,
                    cases: cases_b,
                    default: default_b,
                }]
            }
            IlStmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                let body_b = self.stmts(body);
                let (catch_var, catch_body) = match catch {
                    Some(catch) => (
                        catch.param.as_ref().map(|p| self.local_name(p)),
                        self.stmts(&catch.body),
                    ),
                    None => (None, vec![]),
                };
                let finally_b = finally.as_ref().map(|f| self.stmts(f)).unwrap_or_default();
                if self.session.options.use_exceptions
                    && self.session.options.dialect.has_structured_exceptions()
                {
                    vec![BasicStmt::TryCatch {
                        body: body_b,
                        catch_var,
                        catch_body,
                        finally: finally_b,
                    }]
                } else {
                    if !finally_b.is_empty() {
                        self.session.warnings.warn(
                            "finally block appended after On Error recovery",
                            Some(stmt.span()),
                        );
                    }
                    let mut out = vec![BasicStmt::OnErrorBlock {
                        body: body_b,
                        recovery: catch_body,
                    }];
                    out.extend(finally_b);
                    out
                }
            }
            IlStmt::Throw { value, .. } => vec![self.throw(value, c)],
            IlStmt::Break(_) => {
                let keyword = self.loop_stack.last().copied().unwrap_or("Do");
                vec![BasicStmt::Exit(keyword)]
            }
            IlStmt::Continue(_) => {
                let keyword = self.loop_stack.last().copied().unwrap_or("Do");
                if self.session.options.dialect != recast_core::options::Dialect::VbNet {
                    self.session.warnings.note(
                        "continue statement requires a modern dialect",
                        Some(stmt.span()),
                    );
                }
                vec![BasicStmt::ContinueLoop(keyword)]
            }
            IlStmt::Pass(_) => vec![],
            IlStmt::Block(body, _) => self.stmts(body),
            IlStmt::Unknown { kind, .. } => {
                vec![BasicStmt::Comment(format!("Unknown node type: {}", kind))]
            }
        }
    }

    fn var_decl(&mut self, decl: &IlVarDecl, c: &mut Collector) -> Vec<BasicStmt> {
        // `Dim arr(n - 1) As Byte` is the idiomatic sized-array declaration;
        // catch typed-array construction in initializer position.
        if let Some(init) = &decl.init {
            if let IlExprKind::TypedArrayCreation { elem, arg: Some(arg) } = &init.kind {
                if classify_typed_array_arg(arg, None) == TypedArrayArg::Size {
                    let size = self.expr(arg, c);
                    let upper = BasicExpr::bin(BasicBinOp::Sub, size, BasicExpr::Int(1));
                    return vec![BasicStmt::Dim {
                        name: format!(
                            "{}({}) As {}",
                            self.local_name(&decl.name),
                            dim_bound_text(&upper, self),
                            elem_type_name(*elem)
                        ),
                        ty: None,
                        init: None,
                    }];
                }
            }
        }
        let init = decl.init.as_ref().map(|e| self.expr(e, c));
        vec![BasicStmt::Dim {
            name: self.local_name(&decl.name),
            ty: self.basic_type(&decl.ty),
            init,
        }]
    }

    fn make_assign(&mut self, target: BasicExpr, op: AssignKind, value: BasicExpr) -> BasicStmt {
        let value = match op {
            AssignKind::Simple => value,
            AssignKind::UShr => {
                BasicExpr::bin(BasicBinOp::Shr, target.clone(), value).mask32()
            }
            other => {
                let bin_op = match other {
                    AssignKind::Add => BasicBinOp::Add,
                    AssignKind::Sub => BasicBinOp::Sub,
                    AssignKind::Mul => BasicBinOp::Mult,
                    AssignKind::Div => BasicBinOp::Div,
                    AssignKind::Mod => BasicBinOp::Mod,
                    AssignKind::Shl => BasicBinOp::Shl,
                    AssignKind::Shr => BasicBinOp::Shr,
                    AssignKind::BitAnd => BasicBinOp::And,
                    AssignKind::BitOr => BasicBinOp::Or,
                    AssignKind::BitXor => BasicBinOp::Xor,
                    AssignKind::Simple | AssignKind::UShr => unreachable!("handled above"),
                };
                BasicExpr::bin(bin_op, target.clone(), value)
            }
        };
        BasicStmt::Assign { target, value }
    }

    fn for_loop(
        &mut self,
        init: &Option<Box<IlStmt>>,
        test: &Option<IlExpr>,
        update: &Option<IlExpr>,
        body: &[IlStmt],
        c: &mut Collector,
    ) -> Vec<BasicStmt> {
        if let Some((var, start, end_inclusive)) = self.range_loop(init, test, update) {
            let start_b = self.expr(&start, c);
            let end_b = self.expr(&end_inclusive, c);
            self.loop_stack.push("For");
            let body_b = self.stmts(body);
            self.loop_stack.pop();
            return vec![BasicStmt::ForTo {
                var: self.local_name(&var),
                start: start_b,
                end: end_b,
                step: None,
                body: body_b,
            }];
        }
        let mut out = Vec::new();
        if let Some(init) = init {
            out.extend(self.stmt(init));
        }
        let (test_b, extracted) = match test {
            Some(test) => {
                let mut tc = Collector::new();
                let b = self.expr(test, &mut tc);
                (b, tc.drain())
            }
            None => (BasicExpr::Bool(true), vec![]),
        };
        out.extend(extracted.iter().cloned());
        self.loop_stack.push("Do");
        let mut body_b = self.stmts(body);
        self.loop_stack.pop();
        if let Some(update) = update {
            let mut uc = Collector::new();
            let lowered = self.expr(update, &mut uc);
            let main = if matches!(lowered, BasicExpr::Name(_)) {
                vec![]
            } else {
                vec![BasicStmt::ExprStmt(lowered)]
            };
            body_b.extend(uc.wrap(main));
        }
        body_b.extend(extracted);
        out.push(BasicStmt::DoLoop {
            test: test_b,
            body: body_b,
            test_at_top: true,
        });
        out
    }

    /// `For var = start To end` needs an inclusive upper bound; exclusive
    /// `<` tests subtract one.
    fn range_loop(
        &mut self,
        init: &Option<Box<IlStmt>>,
        test: &Option<IlExpr>,
        update: &Option<IlExpr>,
    ) -> Option<(String, IlExpr, IlExpr)> {
        let init = init.as_deref()?;
        let (var, start) = match init {
            IlStmt::VarDecl(decl) => (decl.name.clone(), decl.init.clone()?),
            IlStmt::Assign {
                target,
                op: AssignKind::Simple,
                value,
                ..
            } => match &target.kind {
                IlExprKind::Ident(name) => (name.clone(), value.clone()),
                _ => return None,
            },
            _ => return None,
        };
        let test = test.as_ref()?;
        let (op, end) = match &test.kind {
            IlExprKind::Binary { op, left, right }
                if matches!(op, IlBinaryOp::Lt | IlBinaryOp::LtEq) =>
            {
                match &left.kind {
                    IlExprKind::Ident(name) if *name == var => (*op, right.as_ref().clone()),
                    _ => return None,
                }
            }
            _ => return None,
        };
        let update = update.as_ref()?;
        let unit = match &update.kind {
            IlExprKind::UpdateExpr {
                incr: true, target, ..
            } => matches!(&target.kind, IlExprKind::Ident(name) if *name == var),
            IlExprKind::AssignExpr {
                target,
                op: AssignKind::Add,
                value,
            } => {
                matches!(&target.kind, IlExprKind::Ident(name) if *name == var)
                    && value.as_int_literal() == Some(1)
            }
            _ => false,
        };
        if !unit || !start.is_pure() || !end.is_pure() {
            return None;
        }
        let end_inclusive = if op == IlBinaryOp::Lt {
            match end.as_int_literal() {
                Some(n) => IlExpr::int(n - 1, end.span),
                None => IlExpr::new(
                    IlExprKind::Binary {
                        op: IlBinaryOp::Sub,
                        left: Box::new(end.clone()),
                        right: Box::new(IlExpr::int(1, end.span)),
                    },
                    end.ty.clone(),
                    end.span,
                ),
            }
        } else {
            end
        };
        Some((var, start, end_inclusive))
    }

    fn throw(&mut self, value: &IlExpr, c: &mut Collector) -> BasicStmt {
        match &value.kind {
            IlExprKind::Literal(IlLiteral::Null) => BasicStmt::Throw(BasicExpr::New {
                name: "Exception".to_string(),
                args: vec![BasicExpr::Str("Verification failed".to_string())],
            }),
            IlExprKind::ErrorCreation { kind: _, message } => {
                let args = match message {
                    Some(message) => vec![self.expr(message, c)],
                    None => vec![],
                };
                BasicStmt::Throw(BasicExpr::New {
                    name: "Exception".to_string(),
                    args,
                })
            }
            _ => {
                let lowered = self.expr(value, c);
                BasicStmt::Throw(lowered)
            }
        }
    }

    // ── Expressions ──

    fn exprs(&mut self, items: &[IlExpr], c: &mut Collector) -> Vec<BasicExpr> {
        items.iter().map(|e| self.expr(e, c)).collect()
    }

    fn expr(&mut self, expr: &IlExpr, c: &mut Collector) -> BasicExpr {
        match &expr.kind {
            IlExprKind::Literal(lit) => self.literal(lit, expr),
            IlExprKind::Ident(name) => {
                if self.session.defined_classes.contains(name)
                    || stubs::is_framework_type(name)
                {
                    if stubs::is_framework_type(name) {
                        self.session.require_framework(name);
                    }
                    BasicExpr::name(name.clone())
                } else {
                    BasicExpr::name(self.local_name(name))
                }
            }
            IlExprKind::Binary { op, left, right } => self.binary(expr, *op, left, right, c),
            IlExprKind::Unary { op, operand } => {
                let operand_b = self.expr(operand, c);
                match op {
                    IlUnaryOp::Not => BasicExpr::Unary {
                        op: BasicUnaryOp::Not,
                        operand: Box::new(operand_b),
                    },
                    IlUnaryOp::Neg => BasicExpr::Unary {
                        op: BasicUnaryOp::Neg,
                        operand: Box::new(operand_b),
                    },
                    IlUnaryOp::Pos => operand_b,
                    IlUnaryOp::BitNot => BasicExpr::Unary {
                        op: BasicUnaryOp::Not,
                        operand: Box::new(operand_b),
                    }
                    .mask32(),
                }
            }
            IlExprKind::Conditional {
                test,
                then_val,
                else_val,
            } => {
                let test_b = self.expr(test, c);
                let then_b = self.expr(then_val, c);
                let else_b = self.expr(else_val, c);
                BasicExpr::Iif {
                    test: Box::new(test_b),
                    then_val: Box::new(then_b),
                    else_val: Box::new(else_b),
                }
            }
            IlExprKind::Call { callee, args } => {
                let func = self.expr(callee, c);
                let args_b = self.exprs(args, c);
                BasicExpr::Call {
                    func: Box::new(func),
                    args: args_b,
                }
            }
            IlExprKind::New { callee, args } => {
                let name = match &callee.kind {
                    IlExprKind::Ident(name) => {
                        if stubs::is_framework_type(name) {
                            self.session.require_framework(name);
                        }
                        to_pascal_case(name)
                    }
                    _ => "Object".to_string(),
                };
                let args_b = self.exprs(args, c);
                BasicExpr::New { name, args: args_b }
            }
            IlExprKind::Member { object, name } => {
                if let IlExprKind::Ident(obj_name) = &object.kind {
                    if stubs::is_framework_type(obj_name) {
                        self.session.require_framework(obj_name);
                        return BasicExpr::Member {
                            value: Box::new(BasicExpr::name(obj_name.clone())),
                            name: name.clone(),
                        };
                    }
                }
                let object_b = self.expr(object, c);
                BasicExpr::Member {
                    value: Box::new(object_b),
                    name: self.proc_name(name),
                }
            }
            IlExprKind::Subscript { object, index } => {
                let object_b = self.expr(object, c);
                let index_b = self.expr(index, c);
                BasicExpr::index(object_b, index_b)
            }
            IlExprKind::Slice { object, start, end } => {
                // No slice syntax; the prelude's CopyArray takes bounds.
                self.session.require_prelude("CopyArray");
                let object_b = self.expr(object, c);
                let mut args = vec![object_b];
                if let Some(start) = start {
                    args.push(self.expr(start, c));
                }
                if let Some(end) = end {
                    args.push(self.expr(end, c));
                }
                BasicExpr::call_name("CopyArray", args)
            }
            IlExprKind::Lambda { params, body } => self.lambda(params, body, expr, c),
            IlExprKind::ListLit(items) => BasicExpr::ArrayLit(self.exprs(items, c)),
            IlExprKind::TupleLit(items) => BasicExpr::ArrayLit(self.exprs(items, c)),
            IlExprKind::DictLit(_) | IlExprKind::MapCreation { .. } => {
                self.session.warnings.warn(
                    "dictionary literal requires a collection object",
                    Some(expr.span),
                );
                BasicExpr::New {
                    name: "Collection".to_string(),
                    args: vec![],
                }
            }
            IlExprKind::SetCreation { values } => {
                self.session.warnings.warn(
                    "set literal lowered to an array",
                    Some(expr.span),
                );
                BasicExpr::ArrayLit(self.exprs(values, c))
            }
            IlExprKind::Spread(inner) => {
                self.session
                    .warnings
                    .warn("spread has no BASIC equivalent", Some(expr.span));
                self.expr(inner, c)
            }
            IlExprKind::StringInterp(parts) => self.string_interp(parts, c),

            IlExprKind::AssignExpr { target, op, value } => {
                let target_b = self.expr(target, c);
                let value_b = self.expr(value, c);
                let stmt = self.make_assign(target_b.clone(), *op, value_b);
                c.push_pre(stmt);
                target_b
            }
            IlExprKind::UpdateExpr {
                incr,
                prefix,
                target,
            } => {
                let target_b = self.expr(target, c);
                let op = if *incr { BasicBinOp::Add } else { BasicBinOp::Sub };
                let stmt = BasicStmt::Assign {
                    target: target_b.clone(),
                    value: BasicExpr::bin(op, target_b.clone(), BasicExpr::Int(1)),
                };
                if *prefix {
                    c.push_pre(stmt);
                } else {
                    c.push_post(stmt);
                }
                target_b
            }
            IlExprKind::Sequence(parts) => {
                let Some((last, rest)) = parts.split_last() else {
                    return BasicExpr::Nothing;
                };
                for part in rest {
                    let lowered = self.expr(part, c);
                    if !matches!(lowered, BasicExpr::Name(_)) {
                        c.push_pre(BasicStmt::ExprStmt(lowered));
                    }
                }
                self.expr(last, c)
            }

            IlExprKind::Rotate {
                dir,
                value,
                amount,
                bits,
            } => self.rotate(*dir, value, amount, *bits, c),
            IlExprKind::PackBytes {
                parts,
                bits,
                endian,
            } => {
                let helper = match (bits, endian) {
                    (16, Endianness::Big) => "Pack16BE",
                    (16, Endianness::Little) => "Pack16LE",
                    (_, Endianness::Big) => "Pack32BE",
                    (_, Endianness::Little) => "Pack32LE",
                };
                self.session.require_prelude(helper);
                let parts_b = self.exprs(parts, c);
                BasicExpr::call_name(helper, parts_b)
            }
            IlExprKind::UnpackBytes {
                value,
                bits,
                endian,
            } => {
                let helper = match (bits, endian) {
                    (16, Endianness::Big) => "Unpack16BE",
                    (16, Endianness::Little) => "Unpack16LE",
                    (_, Endianness::Big) => "Unpack32BE",
                    (_, Endianness::Little) => "Unpack32LE",
                };
                self.session.require_prelude(helper);
                let value_b = self.expr(value, c);
                BasicExpr::call_name(helper, vec![value_b])
            }
            IlExprKind::Cast { value, target } => {
                let value_b = self.expr(value, c);
                let kind = match target {
                    IlType::Int | IlType::Int32 | IlType::BigInt => CastKind::CLng,
                    IlType::Float => CastKind::CDbl,
                    IlType::Str => CastKind::CStr,
                    IlType::Bool => CastKind::CBool,
                    _ => return value_b,
                };
                BasicExpr::Cast {
                    kind,
                    value: Box::new(value_b),
                }
            }
            IlExprKind::ArrayOp { op, recv, args } => self.array_op(*op, recv, args, c),
            IlExprKind::StringOp { op, recv, args } => self.string_op(*op, recv, args, c),
            IlExprKind::MathOp { op, args } => self.math_op(*op, args, c),
            IlExprKind::MathConstant(constant) => math_constant(*constant),
            IlExprKind::NumberConstant(constant) => number_constant(*constant),
            IlExprKind::ConvertOp { op, args } => {
                let helper = match op {
                    ConvertOp::HexDecode => "Hex8ToBytes",
                    ConvertOp::HexEncode => "BytesToHex8",
                    ConvertOp::StringToBytes => "StringToBytes",
                    ConvertOp::BytesToString => "BytesToString",
                };
                self.session.require_prelude(helper);
                let args_b = self.exprs(args, c);
                BasicExpr::call_name(helper, args_b)
            }
            IlExprKind::JsonOp { op, args } => {
                let helper = match op {
                    JsonOp::Stringify => "JsonStringify",
                    JsonOp::Parse => "JsonParse",
                };
                self.session.require_prelude(helper);
                self.session.warnings.warn(
                    "JSON support requires a prelude helper",
                    Some(expr.span),
                );
                let args_b = self.exprs(args, c);
                BasicExpr::call_name(helper, args_b)
            }
            IlExprKind::DateNow => BasicExpr::call_name(
                "CLng",
                vec![BasicExpr::bin(
                    BasicBinOp::Mult,
                    BasicExpr::name("Timer"),
                    BasicExpr::Int(1000),
                )],
            ),

            IlExprKind::ParentConstructorCall { args } => {
                let args_b = self.exprs(args, c);
                BasicExpr::method(BasicExpr::name("MyBase"), "New", args_b)
            }
            IlExprKind::ParentMethodCall { method, args } => {
                let args_b = self.exprs(args, c);
                let name = self.proc_name(method);
                BasicExpr::method(BasicExpr::name("MyBase"), &name, args_b)
            }
            IlExprKind::ThisMethodCall { method, args } => {
                let args_b = self.exprs(args, c);
                let name = match &self.current_type {
                    Some(type_name) => format!("{}_{}", type_name, self.proc_name(method)),
                    None => self.proc_name(method),
                };
                match &self.current_type {
                    Some(_) => {
                        // Standalone function style: Type_Method(self, …).
                        let mut call_args = vec![BasicExpr::name("self")];
                        call_args.extend(args_b);
                        BasicExpr::call_name(&name, call_args)
                    }
                    None => BasicExpr::method(BasicExpr::name("Me"), &name, args_b),
                }
            }
            IlExprKind::ThisPropertyAccess { property } => {
                let recv = if self.current_type.is_some() {
                    "self"
                } else {
                    "Me"
                };
                BasicExpr::Member {
                    value: Box::new(BasicExpr::name(recv)),
                    name: self.proc_name(property),
                }
            }
            IlExprKind::ThisRef => {
                if self.current_type.is_some() {
                    BasicExpr::name("self")
                } else {
                    BasicExpr::name("Me")
                }
            }

            IlExprKind::ArrayCreation { size } => match size {
                Some(size) => {
                    let size_b = self.expr(size, c);
                    self.session.require_prelude("NewArray");
                    BasicExpr::call_name("NewArray", vec![size_b])
                }
                None => BasicExpr::ArrayLit(vec![]),
            },
            IlExprKind::TypedArrayCreation { elem, arg } => {
                match arg {
                    None => BasicExpr::ArrayLit(vec![]),
                    Some(arg) => match classify_typed_array_arg(arg, None) {
                        TypedArrayArg::Copy => {
                            self.session.require_prelude("CopyArray");
                            let arg_b = self.expr(arg, c);
                            BasicExpr::call_name("CopyArray", vec![arg_b])
                        }
                        TypedArrayArg::Size => {
                            // Expression position; declaration position is
                            // rewritten to a sized Dim upstream.
                            let arg_b = self.expr(arg, c);
                            let helper = if *elem == ElemType::Uint8 {
                                "NewByteArray"
                            } else {
                                "NewArray"
                            };
                            self.session.require_prelude(helper);
                            BasicExpr::call_name(helper, vec![arg_b])
                        }
                    },
                }
            }
            IlExprKind::BufferCreation { size } => {
                self.session.require_prelude("NewByteArray");
                let size_b = self.expr(size, c);
                BasicExpr::call_name("NewByteArray", vec![size_b])
            }
            IlExprKind::DataViewCreation { buffer } => {
                self.session.warnings.warn(
                    "data view lowered to its backing array",
                    Some(expr.span),
                );
                self.expr(buffer, c)
            }

            IlExprKind::InstanceOfCheck { value, class_name } => {
                if stubs::is_framework_type(class_name) {
                    self.session.require_framework(class_name);
                }
                let value_b = self.expr(value, c);
                BasicExpr::TypeOfIs {
                    value: Box::new(value_b),
                    ty: to_pascal_case(class_name),
                }
            }
            IlExprKind::IsArrayCheck(value) => {
                let value_b = self.expr(value, c);
                BasicExpr::call_name("IsArray", vec![value_b])
            }
            IlExprKind::IsIntegerCheck(value) => {
                let value_b = self.expr(value, c);
                BasicExpr::call_name("IsNumeric", vec![value_b])
            }
            IlExprKind::TypeOfExpr(value) => {
                let value_b = self.expr(value, c);
                BasicExpr::call_name("TypeName", vec![value_b])
            }
            IlExprKind::ErrorCreation { message, .. } => {
                let args = match message {
                    Some(message) => vec![self.expr(message, c)],
                    None => vec![],
                };
                BasicExpr::New {
                    name: "Exception".to_string(),
                    args,
                }
            }
            IlExprKind::DebugOutput(args) => {
                let args_b = self.exprs(args, c);
                self.debug_call(args_b)
            }
            IlExprKind::ObjectOp { op, args } => {
                match op {
                    ObjectOp::Freeze | ObjectOp::Create => args
                        .first()
                        .map(|a| self.expr(a, c))
                        .unwrap_or(BasicExpr::Nothing),
                    _ => {
                        self.session.warnings.warn(
                            format!("object {} has no BASIC lowering", op.as_ref()),
                            Some(expr.span),
                        );
                        BasicExpr::Nothing
                    }
                }
            }
            IlExprKind::ArrayFrom { source, mapper } => {
                if mapper.is_some() {
                    self.session.warnings.warn(
                        "array-from mapper dropped",
                        Some(expr.span),
                    );
                }
                self.session.require_prelude("CopyArray");
                let source_b = self.expr(source, c);
                BasicExpr::call_name("CopyArray", vec![source_b])
            }
            IlExprKind::Unknown { kind, .. } => {
                c.push_pre(BasicStmt::Comment(format!("Unknown node type: {}", kind)));
                BasicExpr::Nothing
            }
        }
    }

    fn debug_call(&mut self, args: Vec<BasicExpr>) -> BasicExpr {
        if self.session.options.dialect.has_structured_exceptions() {
            BasicExpr::method(BasicExpr::name("Console"), "WriteLine", args)
        } else {
            BasicExpr::method(BasicExpr::name("Debug"), "Print", args)
        }
    }

    fn literal(&mut self, lit: &IlLiteral, whole: &IlExpr) -> BasicExpr {
        match lit {
            IlLiteral::Int(n) => BasicExpr::Int(*n),
            IlLiteral::Float(v) => BasicExpr::Float(*v),
            IlLiteral::Bool(b) => BasicExpr::Bool(*b),
            IlLiteral::Str(s) => BasicExpr::Str(s.clone()),
            IlLiteral::Null => BasicExpr::Nothing,
            IlLiteral::Bytes(bytes) => {
                BasicExpr::ArrayLit(bytes.iter().map(|b| BasicExpr::Int(*b as i64)).collect())
            }
            IlLiteral::BigInt(n) => {
                // LongLong caps at 64 bits; larger constants lose precision.
                self.session.warnings.warn(
                    "bigint literal truncated to LongLong range",
                    Some(whole.span),
                );
                BasicExpr::Big(n.clone())
            }
            IlLiteral::Regex { .. } => {
                self.session.warnings.warn(
                    "regex literals are not supported by BASIC targets",
                    Some(whole.span),
                );
                BasicExpr::Nothing
            }
        }
    }

    fn string_interp(&mut self, parts: &[InterpPart], c: &mut Collector) -> BasicExpr {
        let mut out: Option<BasicExpr> = None;
        for part in parts {
            let piece = match part {
                InterpPart::Lit(text) => BasicExpr::Str(text.clone()),
                InterpPart::Expr(e) => {
                    let lowered = self.expr(e, c);
                    BasicExpr::Cast {
                        kind: CastKind::CStr,
                        value: Box::new(lowered),
                    }
                }
            };
            out = Some(match out.take() {
                None => piece,
                Some(prev) => BasicExpr::bin(BasicBinOp::Concat, prev, piece),
            });
        }
        out.unwrap_or(BasicExpr::Str(String::new()))
    }

    fn binary(
        &mut self,
        whole: &IlExpr,
        op: IlBinaryOp,
        left: &IlExpr,
        right: &IlExpr,
        c: &mut Collector,
    ) -> BasicExpr {
        if op == IlBinaryOp::UShr && right.as_int_literal() == Some(0) {
            return self.expr(left, c);
        }
        let left_b = self.expr(left, c);
        let right_b = self.expr(right, c);
        match op {
            IlBinaryOp::UShr => BasicExpr::bin(BasicBinOp::Shr, left_b, right_b).mask32(),
            IlBinaryOp::Shl if whole.ty == IlType::Int32 => {
                BasicExpr::bin(BasicBinOp::Shl, left_b, right_b).mask32()
            }
            IlBinaryOp::Div => {
                if left.as_int_literal().is_some() && right.as_int_literal().is_some() {
                    BasicExpr::bin(BasicBinOp::IntDiv, left_b, right_b)
                } else if whole.ty.is_integer() {
                    BasicExpr::Cast {
                        kind: CastKind::CLng,
                        value: Box::new(BasicExpr::bin(BasicBinOp::Div, left_b, right_b)),
                    }
                } else {
                    BasicExpr::bin(BasicBinOp::Div, left_b, right_b)
                }
            }
            IlBinaryOp::Add if whole.ty == IlType::Str => {
                BasicExpr::bin(BasicBinOp::Concat, left_b, right_b)
            }
            IlBinaryOp::In => {
                self.session.require_prelude("IndexOf");
                BasicExpr::bin(
                    BasicBinOp::GtE,
                    BasicExpr::call_name("IndexOf", vec![right_b, left_b]),
                    BasicExpr::Int(0),
                )
            }
            _ => BasicExpr::bin(basic_bin_op(op), left_b, right_b),
        }
    }

    fn rotate(
        &mut self,
        dir: RotateDir,
        value: &IlExpr,
        amount: &IlExpr,
        bits: u32,
        c: &mut Collector,
    ) -> BasicExpr {
        // Inline expansion with the width mask applied:
        // ((v Shl n) Or (v Shr (W - n))) And &HFFFFFFFF.
        let value_b = self.expr(value, c);
        let amount_b = self.expr(amount, c);
        let complement = BasicExpr::bin(
            BasicBinOp::Sub,
            BasicExpr::Int(bits as i64),
            amount_b.clone(),
        );
        let (first, second) = match dir {
            RotateDir::Left => (
                BasicExpr::bin(BasicBinOp::Shl, value_b.clone(), amount_b),
                BasicExpr::bin(BasicBinOp::Shr, value_b, complement),
            ),
            RotateDir::Right => (
                BasicExpr::bin(BasicBinOp::Shr, value_b.clone(), amount_b),
                BasicExpr::bin(BasicBinOp::Shl, value_b, complement),
            ),
        };
        let combined = BasicExpr::bin(BasicBinOp::Or, first, second);
        BasicExpr::bin(BasicBinOp::And, combined, width_mask(bits))
    }

    fn lambda(
        &mut self,
        params: &[IlParam],
        body: &LambdaBody,
        whole: &IlExpr,
        c: &mut Collector,
    ) -> BasicExpr {
        if self.session.options.dialect == recast_core::options::Dialect::VbNet {
            let names: Vec<String> = params.iter().map(|p| self.local_name(&p.name)).collect();
            let body_b = match body {
                LambdaBody::Expr(e) => self.expr(e, c),
                LambdaBody::Block(stmts) => {
                    self.session.warnings.warn(
                        "block-bodied lambda collapsed to its final return expression",
                        Some(whole.span),
                    );
                    match last_return(stmts) {
                        Some(e) => self.expr(e, c),
                        None => BasicExpr::Nothing,
                    }
                }
            };
            BasicExpr::LambdaExpr {
                params: names,
                body: Box::new(body_b),
            }
        } else {
            self.session.warnings.warn(
                "inline lambda unsupported in this dialect",
                Some(whole.span),
            );
            BasicExpr::Nothing
        }
    }

    fn array_op(
        &mut self,
        op: ArrayOp,
        recv: &IlExpr,
        args: &[IlExpr],
        c: &mut Collector,
    ) -> BasicExpr {
        let recv_b = self.expr(recv, c);
        match op {
            ArrayOp::Length => BasicExpr::bin(
                BasicBinOp::Add,
                BasicExpr::call_name("UBound", vec![recv_b]),
                BasicExpr::Int(1),
            ),
            ArrayOp::IndexOf => {
                self.session.require_prelude("IndexOf");
                let mut call_args = vec![recv_b];
                call_args.extend(self.exprs(args, c));
                BasicExpr::call_name("IndexOf", call_args)
            }
            ArrayOp::Includes => {
                self.session.require_prelude("IndexOf");
                let mut call_args = vec![recv_b];
                call_args.extend(self.exprs(args, c));
                BasicExpr::bin(
                    BasicBinOp::GtE,
                    BasicExpr::call_name("IndexOf", call_args),
                    BasicExpr::Int(0),
                )
            }
            ArrayOp::Join => {
                let sep = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Str(",".to_string()));
                BasicExpr::call_name("Join", vec![recv_b, sep])
            }
            ArrayOp::Slice => {
                self.session.require_prelude("CopyArray");
                let mut call_args = vec![recv_b];
                call_args.extend(self.exprs(args, c));
                BasicExpr::call_name("CopyArray", call_args)
            }
            ArrayOp::Concat => {
                self.session.require_prelude("ConcatArrays");
                let mut call_args = vec![recv_b];
                call_args.extend(self.exprs(args, c));
                BasicExpr::call_name("ConcatArrays", call_args)
            }
            ArrayOp::Append => {
                self.session.require_prelude("AppendArray");
                let mut call_args = vec![recv_b];
                call_args.extend(self.exprs(args, c));
                BasicExpr::call_name("AppendArray", call_args)
            }
            _ => {
                // Remaining higher-order and mutating forms go through
                // prelude helpers named after the operation.
                let helper = format!("Array{}", op.as_ref());
                self.session.require_prelude(&helper);
                self.session.warnings.note(
                    format!("array {} lowered to a prelude helper", op.as_ref()),
                    Some(recv.span),
                );
                let mut call_args = vec![recv_b];
                call_args.extend(self.exprs(args, c));
                BasicExpr::call_name(&helper, call_args)
            }
        }
    }

    fn string_op(
        &mut self,
        op: StringOp,
        recv: &Option<Box<IlExpr>>,
        args: &[IlExpr],
        c: &mut Collector,
    ) -> BasicExpr {
        if op == StringOp::FromCharCodes {
            // Chr(a) & Chr(b) & Chr(c).
            let mut out: Option<BasicExpr> = None;
            for arg in args {
                let code = self.expr(arg, c);
                let piece = BasicExpr::call_name("Chr", vec![code]);
                out = Some(match out.take() {
                    None => piece,
                    Some(prev) => BasicExpr::bin(BasicBinOp::Concat, prev, piece),
                });
            }
            return out.unwrap_or(BasicExpr::Str(String::new()));
        }
        let recv_b = match recv {
            Some(recv) => self.expr(recv, c),
            None => BasicExpr::Str(String::new()),
        };
        let one_based = |e: BasicExpr| BasicExpr::bin(BasicBinOp::Add, e, BasicExpr::Int(1));
        match op {
            StringOp::Replace => {
                let mut call_args = vec![recv_b];
                call_args.extend(self.exprs(args, c));
                BasicExpr::call_name("Replace", call_args)
            }
            StringOp::Repeat => {
                let count = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Int(0));
                BasicExpr::call_name("String", vec![count, recv_b])
            }
            StringOp::IndexOf => {
                let needle = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Str(String::new()));
                BasicExpr::bin(
                    BasicBinOp::Sub,
                    BasicExpr::call_name("InStr", vec![recv_b, needle]),
                    BasicExpr::Int(1),
                )
            }
            StringOp::Split => {
                let sep = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Str(String::new()));
                BasicExpr::call_name("Split", vec![recv_b, sep])
            }
            StringOp::Substring => {
                let start = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Int(0));
                match args.get(1) {
                    Some(end) => {
                        let end_b = self.expr(end, c);
                        let length = BasicExpr::bin(BasicBinOp::Sub, end_b, start.clone());
                        BasicExpr::call_name("Mid", vec![recv_b, one_based(start), length])
                    }
                    None => BasicExpr::call_name("Mid", vec![recv_b, one_based(start)]),
                }
            }
            StringOp::CharAt => {
                let index = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Int(0));
                BasicExpr::call_name("Mid", vec![recv_b, one_based(index), BasicExpr::Int(1)])
            }
            StringOp::CharCodeAt => {
                let index = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Int(0));
                BasicExpr::call_name(
                    "Asc",
                    vec![BasicExpr::call_name(
                        "Mid",
                        vec![recv_b, one_based(index), BasicExpr::Int(1)],
                    )],
                )
            }
            StringOp::ToUpper => BasicExpr::call_name("UCase", vec![recv_b]),
            StringOp::ToLower => BasicExpr::call_name("LCase", vec![recv_b]),
            StringOp::Trim => BasicExpr::call_name("Trim", vec![recv_b]),
            StringOp::StartsWith => {
                let needle = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Str(String::new()));
                BasicExpr::bin(
                    BasicBinOp::Eq,
                    BasicExpr::call_name(
                        "Left",
                        vec![
                            recv_b,
                            BasicExpr::call_name("Len", vec![needle.clone()]),
                        ],
                    ),
                    needle,
                )
            }
            StringOp::EndsWith => {
                let needle = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Str(String::new()));
                BasicExpr::bin(
                    BasicBinOp::Eq,
                    BasicExpr::call_name(
                        "Right",
                        vec![
                            recv_b,
                            BasicExpr::call_name("Len", vec![needle.clone()]),
                        ],
                    ),
                    needle,
                )
            }
            StringOp::Includes => {
                let needle = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(BasicExpr::Str(String::new()));
                BasicExpr::bin(
                    BasicBinOp::Gt,
                    BasicExpr::call_name("InStr", vec![recv_b, needle]),
                    BasicExpr::Int(0),
                )
            }
            StringOp::Concat => {
                let mut out = recv_b;
                for arg in args {
                    let arg_b = self.expr(arg, c);
                    out = BasicExpr::bin(BasicBinOp::Concat, out, arg_b);
                }
                out
            }
            StringOp::FromCharCodes => unreachable!("handled above"),
        }
    }

    fn math_op(&mut self, op: MathOp, args: &[IlExpr], c: &mut Collector) -> BasicExpr {
        let args_b = self.exprs(args, c);
        let native = |name: &str, args_b: Vec<BasicExpr>| BasicExpr::call_name(name, args_b);
        match op {
            MathOp::Sin => native("Sin", args_b),
            MathOp::Cos => native("Cos", args_b),
            MathOp::Tan => native("Tan", args_b),
            MathOp::Atan => native("Atn", args_b),
            MathOp::Exp => native("Exp", args_b),
            MathOp::Log => native("Log", args_b),
            MathOp::Sqrt => native("Sqr", args_b),
            MathOp::Abs => native("Abs", args_b),
            MathOp::Sign => native("Sgn", args_b),
            MathOp::Floor => native("Int", args_b),
            MathOp::Trunc => native("Fix", args_b),
            MathOp::Random => native("Rnd", args_b),
            MathOp::Pow => {
                let mut it = args_b.into_iter();
                match (it.next(), it.next()) {
                    (Some(base), Some(exp)) => BasicExpr::bin(BasicBinOp::Pow, base, exp),
                    (Some(base), None) => base,
                    _ => BasicExpr::Int(1),
                }
            }
            MathOp::Imul => {
                // CLng((a * b) And &HFFFFFFFF).
                let mut it = args_b.into_iter();
                match (it.next(), it.next()) {
                    (Some(a), Some(b)) => BasicExpr::Cast {
                        kind: CastKind::CLng,
                        value: Box::new(BasicExpr::bin(BasicBinOp::Mult, a, b).mask32()),
                    },
                    _ => BasicExpr::Int(0),
                }
            }
            MathOp::Min | MathOp::Max => {
                let helper = if op == MathOp::Min { "MinOf" } else { "MaxOf" };
                self.session.require_prelude(helper);
                BasicExpr::call_name(helper, args_b)
            }
            _ => {
                // No native spelling; the prelude carries the long tail.
                let helper = format!("Math{}", op.as_ref());
                self.session.require_prelude(&helper);
                BasicExpr::call_name(&helper, args_b)
            }
        }
    }
}

// ── Free helpers ──

fn basic_bin_op(op: IlBinaryOp) -> BasicBinOp {
    match op {
        IlBinaryOp::Add => BasicBinOp::Add,
        IlBinaryOp::Sub => BasicBinOp::Sub,
        IlBinaryOp::Mul => BasicBinOp::Mult,
        IlBinaryOp::Div => BasicBinOp::Div,
        IlBinaryOp::Mod => BasicBinOp::Mod,
        IlBinaryOp::Pow => BasicBinOp::Pow,
        IlBinaryOp::Eq => BasicBinOp::Eq,
        IlBinaryOp::NotEq => BasicBinOp::NotEq,
        IlBinaryOp::Lt => BasicBinOp::Lt,
        IlBinaryOp::LtEq => BasicBinOp::LtE,
        IlBinaryOp::Gt => BasicBinOp::Gt,
        IlBinaryOp::GtEq => BasicBinOp::GtE,
        IlBinaryOp::And | IlBinaryOp::BitAnd => BasicBinOp::And,
        IlBinaryOp::Or | IlBinaryOp::BitOr => BasicBinOp::Or,
        IlBinaryOp::BitXor => BasicBinOp::Xor,
        IlBinaryOp::Shl => BasicBinOp::Shl,
        IlBinaryOp::Shr | IlBinaryOp::UShr => BasicBinOp::Shr,
        IlBinaryOp::In => BasicBinOp::Eq,
    }
}

fn width_mask(bits: u32) -> BasicExpr {
    match bits {
        8 => BasicExpr::Hex(0xFF),
        16 => BasicExpr::Hex(0xFFFF),
        64 => BasicExpr::Hex(0xFFFF_FFFF_FFFF_FFFF),
        _ => BasicExpr::Hex(0xFFFF_FFFF),
    }
}

fn elem_type_name(elem: ElemType) -> &'static str {
    match elem {
        ElemType::Uint8 | ElemType::Int8 => "Byte",
        ElemType::Uint16 | ElemType::Int16 => "Integer",
        ElemType::Float32 | ElemType::Float64 => "Double",
        ElemType::BigUint64 | ElemType::BigInt64 => "LongLong",
        _ => "Long",
    }
}

fn math_constant(constant: MathConst) -> BasicExpr {
    match constant {
        MathConst::Pi => BasicExpr::Float(std::f64::consts::PI),
        MathConst::E => BasicExpr::Float(std::f64::consts::E),
        MathConst::Ln2 => BasicExpr::Float(std::f64::consts::LN_2),
        MathConst::Ln10 => BasicExpr::Float(std::f64::consts::LN_10),
        MathConst::Log2E => BasicExpr::Float(std::f64::consts::LOG2_E),
        MathConst::Log10E => BasicExpr::Float(std::f64::consts::LOG10_E),
        MathConst::Sqrt2 => BasicExpr::Float(std::f64::consts::SQRT_2),
        MathConst::Sqrt1_2 => BasicExpr::Float(std::f64::consts::FRAC_1_SQRT_2),
    }
}

fn number_constant(constant: NumberConst) -> BasicExpr {
    match constant {
        NumberConst::MaxSafeInteger => BasicExpr::Int(9_007_199_254_740_991),
        NumberConst::MinSafeInteger => BasicExpr::Int(-9_007_199_254_740_991),
        NumberConst::MaxValue => BasicExpr::Float(f64::MAX),
        NumberConst::MinValue => BasicExpr::Float(5e-324),
        NumberConst::Epsilon => BasicExpr::Float(f64::EPSILON),
        NumberConst::PositiveInfinity => BasicExpr::Float(f64::INFINITY),
        NumberConst::NegativeInfinity => BasicExpr::Float(f64::NEG_INFINITY),
        NumberConst::NaN => BasicExpr::Float(f64::NAN),
    }
}

fn last_return(stmts: &[IlStmt]) -> Option<&IlExpr> {
    for stmt in stmts.iter().rev() {
        if let IlStmt::Return {
            value: Some(value), ..
        } = stmt
        {
            return Some(value);
        }
    }
    None
}

/// Render a Dim upper-bound expression to text for the sized-array form.
fn dim_bound_text(expr: &BasicExpr, t: &BasicTransformer<'_>) -> String {
    let emitter = super::emit::BasicEmitter::new(t.session);
    emitter.expr(expr)
}
