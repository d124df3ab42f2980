//! IL → Python AST transformation.
//!
//! Owns the Python side of the non-trivial choices: snake_case naming with
//! reserved-word escaping, statement/expression bifurcation through the
//! pre/post collector, 32-bit width discipline, control-flow lowering, and
//! the library mapping table.

use crate::heuristics::{classify_typed_array_arg, TypedArrayArg};
use crate::python::ast::*;
use crate::session::{StmtCollector, TranspileSession};
use crate::stubs;
use recast_core::il::*;
use recast_core::naming::{backing_field_name, collision_field_name, escape_python_ident, to_snake_case};
use recast_core::types::{ElemType, IlType};
use std::collections::{BTreeMap, BTreeSet};

type Collector = StmtCollector<PyStmt>;

/// Transform an IL module into a Python module, accumulating imports,
/// prelude requirements, framework references, and warnings in the session.
pub fn transform(module: &IlModule, session: &mut TranspileSession) -> PyModule {
    let mut t = PyTransformer {
        session,
        class_ctx: None,
    };
    for decl in &module.decls {
        if let IlDecl::Class(class) = decl {
            t.session.defined_classes.insert(class.name.clone());
        }
    }
    let mut body = Vec::new();
    for decl in &module.decls {
        match decl {
            IlDecl::Class(class) => body.extend(t.class(class)),
            IlDecl::Function(func) => body.push(t.function(func, false, vec![])),
            IlDecl::Var(var) => body.extend(t.stmt(&IlStmt::VarDecl(var.clone()))),
            IlDecl::Stmt(stmt) => body.extend(t.stmt(stmt)),
        }
    }
    PyModule {
        name: module.name.clone(),
        fingerprint: module.fingerprint.clone(),
        body,
    }
}

/// Per-class naming state: properties needing backing-field substitution,
/// fields renamed away from method collisions.
struct ClassCtx {
    field_renames: BTreeMap<String, String>,
    /// Snake name of the property whose accessor body is being lowered.
    in_accessor: Option<String>,
}

struct PyTransformer<'a> {
    session: &'a mut TranspileSession,
    class_ctx: Option<ClassCtx>,
}

impl<'a> PyTransformer<'a> {
    // ── Naming ──

    fn py_name(&self, name: &str) -> String {
        if self.session.defined_classes.contains(name) || stubs::is_framework_type(name) {
            return name.to_string();
        }
        if is_screaming_case(name) {
            return escape_python_ident(name);
        }
        escape_python_ident(&to_snake_case(name))
    }

    fn py_attr(&self, name: &str) -> String {
        if is_screaming_case(name) {
            name.to_string()
        } else {
            to_snake_case(name)
        }
    }

    fn hint(&mut self, ty: &IlType) -> Option<String> {
        if !self.session.options.add_type_hints {
            return None;
        }
        if *ty == IlType::Any && !self.session.options.strict_types {
            return None;
        }
        Some(self.hint_text(ty))
    }

    fn hint_text(&mut self, ty: &IlType) -> String {
        match ty {
            IlType::Bool => "bool".to_string(),
            IlType::Int | IlType::Int32 | IlType::BigInt => "int".to_string(),
            IlType::Float => "float".to_string(),
            IlType::Str => "str".to_string(),
            IlType::Bytes => "bytearray".to_string(),
            IlType::Null | IlType::Void => "None".to_string(),
            IlType::List(elem) | IlType::Set(elem) => {
                format!("list[{}]", self.hint_text(elem))
            }
            IlType::Tuple(_) => "tuple".to_string(),
            IlType::Map(k, v) => format!("dict[{}, {}]", self.hint_text(k), self.hint_text(v)),
            IlType::TypedArray(ElemType::Uint8) | IlType::Buffer => "bytearray".to_string(),
            IlType::TypedArray(elem) if elem.is_float() => "list[float]".to_string(),
            IlType::TypedArray(_) => "list[int]".to_string(),
            IlType::DataView => "DataView".to_string(),
            IlType::Class(name) => name.clone(),
            IlType::Regex | IlType::Func | IlType::Any => {
                self.session.require_import("typing");
                "typing.Any".to_string()
            }
        }
    }

    // ── Declarations ──

    fn function(&mut self, func: &IlFunction, is_method: bool, decorators: Vec<String>) -> PyStmt {
        let mut params: Vec<PyParam> = Vec::new();
        if is_method {
            params.push(PyParam {
                name: "self".to_string(),
                annotation: None,
                default: None,
            });
        }
        for p in &func.params {
            let annotation = self.hint(&p.ty);
            let default = p.default_value.as_ref().map(|d| {
                let mut c = Collector::new();
                let py = self.expr(d, &mut c);
                if !c.is_empty() {
                    self.session
                        .warnings
                        .warn("side effect in parameter default dropped", Some(d.span));
                }
                py
            });
            params.push(PyParam {
                name: self.py_name(&p.name),
                annotation,
                default,
            });
        }
        let returns = self.hint(&func.return_type);
        let body = self.stmts(&func.body);
        let docstring = if self.session.options.add_docstrings {
            func.doc.clone()
        } else {
            None
        };
        PyStmt::FunctionDef {
            name: self.py_name(&func.name),
            params,
            returns,
            body,
            decorators,
            docstring,
        }
    }

    fn class(&mut self, class: &IlClass) -> Vec<PyStmt> {
        let bases = match &class.superclass {
            Some(base) => {
                if stubs::is_framework_type(base) {
                    self.session.require_framework(base);
                }
                vec![base.clone()]
            }
            None => vec![],
        };

        // Methods kept after de-duplication and wrapper dropping, in source
        // order, indexed for the getter/setter ordering pass.
        let mut methods: Vec<&IlMethod> = Vec::new();
        let mut seen: BTreeSet<(String, MethodKind, bool)> = BTreeSet::new();
        for method in &class.methods {
            let snake = to_snake_case(&method.name);
            let key = (snake.clone(), method.kind, method.is_static);
            if seen.contains(&key) {
                // Distinct Source spellings collapsing to one snake_case
                // name; the first definition wins.
                self.session.warnings.warn(
                    format!("duplicate method after case conversion: {}", snake),
                    Some(method.span),
                );
                continue;
            }
            if method.kind == MethodKind::Method && is_self_wrapper(method, &snake) {
                // A wrapper that only forwards to the same converted name
                // would recurse forever; drop it.
                self.session.warnings.note(
                    format!("wrapper method dropped: {}", method.name),
                    Some(method.span),
                );
                continue;
            }
            seen.insert(key);
            methods.push(method);
        }

        // Stable getter-before-setter ordering per property.
        order_accessors(&mut methods);

        let method_names: BTreeSet<String> = methods
            .iter()
            .filter(|m| m.kind == MethodKind::Method)
            .map(|m| to_snake_case(&m.name))
            .collect();
        let mut field_renames = BTreeMap::new();
        for field in &class.fields {
            let snake = to_snake_case(&field.name);
            if method_names.contains(&snake) {
                field_renames.insert(snake.clone(), collision_field_name(&snake));
            }
        }

        let parent_ctx = self.class_ctx.replace(ClassCtx {
            field_renames,
            in_accessor: None,
        });

        let mut body: Vec<PyStmt> = Vec::new();

        // Static fields and static literal getters become class variables.
        for field in &class.fields {
            if field.is_static {
                let value = match &field.init {
                    Some(init) => {
                        let mut c = Collector::new();
                        self.expr(init, &mut c)
                    }
                    None => PyExpr::None_,
                };
                body.push(PyStmt::Assign {
                    target: PyExpr::name(self.field_name(&field.name)),
                    value,
                });
            }
        }

        let mut synthesized_getters: BTreeSet<String> = BTreeSet::new();
        let getter_names: BTreeSet<String> = methods
            .iter()
            .filter(|m| m.kind == MethodKind::Getter)
            .map(|m| to_snake_case(&m.name))
            .collect();

        let instance_field_inits: Vec<&IlField> = class
            .fields
            .iter()
            .filter(|f| !f.is_static && f.init.is_some())
            .collect();
        let has_constructor = methods.iter().any(|m| m.kind == MethodKind::Constructor);

        for method in &methods {
            match method.kind {
                MethodKind::Constructor => {
                    let mut py = self.function(&method.func, true, vec![]);
                    if let PyStmt::FunctionDef { name, body: fn_body, .. } = &mut py {
                        *name = "__init__".to_string();
                        let mut prologue = self.field_init_stmts(&instance_field_inits);
                        prologue.append(fn_body);
                        *fn_body = prologue;
                    }
                    body.push(py);
                }
                MethodKind::Getter => {
                    if method.is_static {
                        // A static getter returning a literal is really a
                        // class constant; Python cannot stack @staticmethod
                        // with @property anyway.
                        if let Some(value) = literal_getter_value(&method.func) {
                            let mut c = Collector::new();
                            let py_value = self.expr(value, &mut c);
                            body.push(PyStmt::Assign {
                                target: PyExpr::name(to_snake_case(&method.name)),
                                value: py_value,
                            });
                        } else {
                            body.push(self.accessor(method, vec!["staticmethod".to_string()]));
                        }
                        continue;
                    }
                    body.push(self.accessor(method, vec!["property".to_string()]));
                }
                MethodKind::Setter => {
                    let snake = to_snake_case(&method.name);
                    if !getter_names.contains(&snake) && !synthesized_getters.contains(&snake) {
                        // Python's @<name>.setter needs a getter to attach
                        // to; synthesize one over the backing field.
                        synthesized_getters.insert(snake.clone());
                        body.push(PyStmt::FunctionDef {
                            name: snake.clone(),
                            params: vec![PyParam {
                                name: "self".to_string(),
                                annotation: None,
                                default: None,
                            }],
                            returns: None,
                            body: vec![PyStmt::Return(Some(PyExpr::attr(
                                PyExpr::name("self"),
                                format!("_{}", snake),
                            )))],
                            decorators: vec!["property".to_string()],
                            docstring: None,
                        });
                    }
                    body.push(self.accessor(method, vec![format!("{}.setter", snake)]));
                }
                MethodKind::Method => {
                    let decorators = if method.is_static {
                        vec!["staticmethod".to_string()]
                    } else {
                        vec![]
                    };
                    body.push(self.function(&method.func, !method.is_static, decorators));
                }
            }
        }

        if !has_constructor && !instance_field_inits.is_empty() {
            let fn_body = self.field_init_stmts(&instance_field_inits);
            body.insert(
                0,
                PyStmt::FunctionDef {
                    name: "__init__".to_string(),
                    params: vec![PyParam {
                        name: "self".to_string(),
                        annotation: None,
                        default: None,
                    }],
                    returns: None,
                    body: fn_body,
                    decorators: vec![],
                    docstring: None,
                },
            );
        }

        // Python has no static blocks; the statements run at module scope
        // right after the class body.
        let trailing = match &class.static_block {
            Some(static_block) => {
                self.session.warnings.note(
                    "static block lowered to module-level statements",
                    Some(class.span),
                );
                self.stmts(static_block)
            }
            None => vec![],
        };

        self.class_ctx = parent_ctx;
        let docstring = if self.session.options.add_docstrings {
            class.doc.clone()
        } else {
            None
        };
        let mut out = vec![PyStmt::ClassDef {
            name: class.name.clone(),
            bases,
            body,
            docstring,
        }];
        out.extend(trailing);
        out
    }

    fn field_init_stmts(&mut self, fields: &[&IlField]) -> Vec<PyStmt> {
        fields
            .iter()
            .map(|field| {
                let mut c = Collector::new();
                let value = match &field.init {
                    Some(init) => self.expr(init, &mut c),
                    None => PyExpr::None_,
                };
                PyStmt::Assign {
                    target: PyExpr::attr(PyExpr::name("self"), self.field_name(&field.name)),
                    value,
                }
            })
            .collect()
    }

    fn field_name(&self, name: &str) -> String {
        let snake = to_snake_case(name);
        if let Some(ctx) = &self.class_ctx {
            if let Some(renamed) = ctx.field_renames.get(&snake) {
                return renamed.clone();
            }
        }
        snake
    }

    fn accessor(&mut self, method: &IlMethod, decorators: Vec<String>) -> PyStmt {
        let snake = to_snake_case(&method.name);
        if let Some(ctx) = &mut self.class_ctx {
            ctx.in_accessor = Some(snake.clone());
        }
        let mut py = self.function(&method.func, !method.is_static, decorators);
        if let PyStmt::FunctionDef { name, .. } = &mut py {
            *name = snake;
        }
        if let Some(ctx) = &mut self.class_ctx {
            ctx.in_accessor = None;
        }
        py
    }

    // ── Statements ──

    fn stmts(&mut self, body: &[IlStmt]) -> Vec<PyStmt> {
        body.iter().flat_map(|s| self.stmt(s)).collect()
    }

    fn stmt(&mut self, stmt: &IlStmt) -> Vec<PyStmt> {
        let mut c = Collector::new();
        let main = self.stmt_with(stmt, &mut c);
        c.wrap(main)
    }

    fn stmt_with(&mut self, stmt: &IlStmt, c: &mut Collector) -> Vec<PyStmt> {
        match stmt {
            IlStmt::VarDecl(decl) => {
                let target = PyExpr::name(self.py_name(&decl.name));
                let value = match &decl.init {
                    Some(init) => self.expr(init, c),
                    None => PyExpr::None_,
                };
                match self.hint(&decl.ty) {
                    Some(annotation) if decl.init.is_some() => vec![PyStmt::AnnAssign {
                        target,
                        annotation,
                        value: Some(value),
                    }],
                    _ => vec![PyStmt::Assign { target, value }],
                }
            }
            IlStmt::Assign {
                target, op, value, ..
            } => self.assign(target, *op, value, c),
            IlStmt::Expr { expr, .. } => self.expr_stmt(expr, c),
            IlStmt::Return { value, .. } => {
                let value = value.as_ref().map(|v| self.expr(v, c));
                vec![PyStmt::Return(value)]
            }
            IlStmt::If {
                test,
                then_body,
                else_body,
                ..
            } => {
                // Side effects in the condition move into the surrounding
                // block, ahead of the `if`.
                let mut tc = Collector::new();
                let test_py = self.expr(test, &mut tc);
                for extracted in tc.drain() {
                    c.push_pre(extracted);
                }
                let body = self.stmts(then_body);
                let orelse = match else_body {
                    Some(else_body) => self.stmts(else_body),
                    None => vec![],
                };
                vec![PyStmt::If {
                    test: test_py,
                    body,
                    orelse,
                }]
            }
            IlStmt::While { test, body, .. } => self.while_loop(test, body, c),
            IlStmt::DoWhile { body, test, .. } => {
                let mut out = self.stmts(body);
                let mut tc = Collector::new();
                let test_py = self.expr(test, &mut tc);
                out.extend(tc.drain());
                out.push(PyStmt::If {
                    test: PyExpr::Unary {
                        op: PyUnaryOp::Not,
                        operand: Box::new(test_py),
                    },
                    body: vec![PyStmt::Break],
                    orelse: vec![],
                });
                vec![PyStmt::While {
                    test: PyExpr::Bool(true),
                    body: out,
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
                let iter_py = self.expr(iter, c);
                let body_py = self.stmts(body);
                vec![PyStmt::For {
                    target: PyExpr::name(self.py_name(var)),
                    iter: iter_py,
                    body: body_py,
                }]
            }
            IlStmt::Switch {
                discriminant,
                cases,
                default,
                ..
            } => self.switch(discriminant, cases, default, c),
            IlStmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                let body_py = self.stmts(body);
                let handlers = match catch {
                    Some(catch) => vec![ExceptClause {
                        exc_type: "Exception".to_string(),
                        name: catch.param.as_ref().map(|p| self.py_name(p)),
                        body: self.stmts(&catch.body),
                    }],
                    None => vec![],
                };
                let finalbody = match finally {
                    Some(finally) => self.stmts(finally),
                    None => vec![],
                };
                vec![PyStmt::Try {
                    body: body_py,
                    handlers,
                    finalbody,
                }]
            }
            IlStmt::Throw { value, .. } => vec![self.throw(value, c)],
            IlStmt::Break(_) => vec![PyStmt::Break],
            IlStmt::Continue(_) => vec![PyStmt::Continue],
            IlStmt::Pass(_) => vec![PyStmt::Pass],
            IlStmt::Block(body, _) => self.stmts(body),
            IlStmt::Unknown { kind, .. } => {
                vec![PyStmt::Comment(format!("Unknown node type: {}", kind))]
            }
        }
    }

    fn assign(
        &mut self,
        target: &IlExpr,
        op: AssignKind,
        value: &IlExpr,
        c: &mut Collector,
    ) -> Vec<PyStmt> {
        // Chained simple assignment: a = b = c = v.
        if op == AssignKind::Simple {
            if let IlExprKind::AssignExpr { .. } = &value.kind {
                if let Some(out) = self.chained_assign(target, value, c) {
                    return out;
                }
            }
        }
        let target_py = self.expr(target, c);
        let value_py = self.expr(value, c);
        vec![self.make_assign(target_py, op, value_py)]
    }

    fn make_assign(&mut self, target: PyExpr, op: AssignKind, value: PyExpr) -> PyStmt {
        match assign_bin_op(op) {
            None => PyStmt::Assign { target, value },
            Some(PyBinOp::RShift) if op == AssignKind::UShr => {
                // x >>>= n has no Python operator; re-expressed with the
                // 32-bit mask applied.
                let shifted = PyExpr::bin(PyBinOp::RShift, target.clone(), value).mask32();
                PyStmt::Assign {
                    target,
                    value: shifted,
                }
            }
            Some(py_op) => PyStmt::AugAssign {
                target,
                op: py_op,
                value,
            },
        }
    }

    /// `a = b = c = v` lowers inner assignments as pre-statements, outermost
    /// last (the main statement).
    fn chained_assign(
        &mut self,
        outer_target: &IlExpr,
        value: &IlExpr,
        c: &mut Collector,
    ) -> Option<Vec<PyStmt>> {
        let mut targets: Vec<&IlExpr> = vec![outer_target];
        let mut tail = value;
        while let IlExprKind::AssignExpr {
            target,
            op: AssignKind::Simple,
            value,
        } = &tail.kind
        {
            targets.push(target);
            tail = value;
        }
        if targets.len() < 2 {
            return None;
        }
        let tail_py = self.expr(tail, c);
        let mut main = None;
        if tail.is_pure() {
            // Innermost target assigned first, every level reusing the value.
            for target in targets.iter().skip(1).rev() {
                let target_py = self.expr(target, c);
                c.push_pre(PyStmt::Assign {
                    target: target_py,
                    value: tail_py.clone(),
                });
            }
            main = Some(PyStmt::Assign {
                target: self.expr(targets[0], c),
                value: tail_py,
            });
        } else {
            // Evaluate once into the innermost target, then copy outward.
            let mut prev = None;
            for target in targets.iter().rev() {
                let target_py = self.expr(target, c);
                let value_py = match prev.take() {
                    None => tail_py.clone(),
                    Some(prev_target) => prev_target,
                };
                let assign = PyStmt::Assign {
                    target: target_py.clone(),
                    value: value_py,
                };
                if std::ptr::eq(*target, targets[0]) {
                    main = Some(assign);
                } else {
                    c.push_pre(assign);
                }
                prev = Some(target_py);
            }
        }
        main.map(|m| vec![m])
    }

    fn expr_stmt(&mut self, expr: &IlExpr, c: &mut Collector) -> Vec<PyStmt> {
        // Mutating array primitives read better in their statement forms.
        if let IlExprKind::ArrayOp { op, recv, args } = &expr.kind {
            match op {
                ArrayOp::Fill => {
                    let recv_py = self.expr(recv, c);
                    let value = args
                        .first()
                        .map(|a| self.expr(a, c))
                        .unwrap_or(PyExpr::Int(0));
                    // recv[:] = [v] * len(recv)
                    let filled = PyExpr::bin(
                        PyBinOp::Mult,
                        PyExpr::List(vec![value]),
                        PyExpr::call_name("len", vec![recv_py.clone()]),
                    );
                    return vec![PyStmt::Assign {
                        target: PyExpr::SliceExpr {
                            value: Box::new(recv_py),
                            lower: None,
                            upper: None,
                        },
                        value: filled,
                    }];
                }
                ArrayOp::Clear => {
                    let recv_py = self.expr(recv, c);
                    return vec![PyStmt::Delete(PyExpr::SliceExpr {
                        value: Box::new(recv_py),
                        lower: None,
                        upper: None,
                    })];
                }
                ArrayOp::ForEach => {
                    if let Some(lowered) = self.foreach_stmt(recv, args, c) {
                        return lowered;
                    }
                }
                ArrayOp::Reverse if args.is_empty() => {
                    let recv_py = self.expr(recv, c);
                    return vec![PyStmt::Expr(PyExpr::method(recv_py, "reverse", vec![]))];
                }
                ArrayOp::Sort => {
                    let recv_py = self.expr(recv, c);
                    let args_py = self.sort_args(args, c);
                    return vec![PyStmt::Expr(PyExpr::Call {
                        func: Box::new(PyExpr::attr(recv_py, "sort")),
                        args: vec![],
                        kwargs: args_py,
                    })];
                }
                _ => {}
            }
        }
        let py = self.expr(expr, c);
        // Bifurcated side effects can leave a bare name behind; drop it.
        if matches!(py, PyExpr::Name(_)) && !c.is_empty() {
            return vec![];
        }
        vec![PyStmt::Expr(py)]
    }

    fn foreach_stmt(
        &mut self,
        recv: &IlExpr,
        args: &[IlExpr],
        c: &mut Collector,
    ) -> Option<Vec<PyStmt>> {
        let callback = args.first()?;
        let IlExprKind::Lambda { params, body } = &callback.kind else {
            return None;
        };
        let recv_py = self.expr(recv, c);
        let var = params
            .first()
            .map(|p| self.py_name(&p.name))
            .unwrap_or_else(|| "_".to_string());
        let body_py = match body {
            LambdaBody::Block(stmts) => self.stmts(stmts),
            LambdaBody::Expr(e) => {
                let mut bc = Collector::new();
                let value = self.expr(e, &mut bc);
                bc.wrap(vec![PyStmt::Expr(value)])
            }
        };
        Some(vec![PyStmt::For {
            target: PyExpr::name(var),
            iter: recv_py,
            body: body_py,
        }])
    }

    fn sort_args(&mut self, args: &[IlExpr], c: &mut Collector) -> Vec<(String, PyExpr)> {
        match args.first() {
            None => vec![],
            Some(comparator) => {
                self.session.require_import("functools");
                let comparator_py = self.expr(comparator, c);
                vec![(
                    "key".to_string(),
                    PyExpr::call(
                        PyExpr::attr(PyExpr::name("functools"), "cmp_to_key"),
                        vec![comparator_py],
                    ),
                )]
            }
        }
    }

    fn while_loop(&mut self, test: &IlExpr, body: &[IlStmt], c: &mut Collector) -> Vec<PyStmt> {
        let mut tc = Collector::new();
        let test_py = self.expr(test, &mut tc);
        let extracted = tc.drain();
        for stmt in &extracted {
            c.push_pre(stmt.clone());
        }
        let mut body_py = self.stmts(body);
        // The update must run again before the next test evaluation.
        body_py.extend(extracted);
        vec![PyStmt::While {
            test: test_py,
            body: body_py,
        }]
    }

    fn for_loop(
        &mut self,
        init: &Option<Box<IlStmt>>,
        test: &Option<IlExpr>,
        update: &Option<IlExpr>,
        body: &[IlStmt],
        c: &mut Collector,
    ) -> Vec<PyStmt> {
        if let Some((var, start, end)) = self.range_loop(init, test, update) {
            let start_py = self.expr(&start, c);
            let end_py = self.expr(&end, c);
            let body_py = self.stmts(body);
            return vec![PyStmt::For {
                target: PyExpr::name(self.py_name(&var)),
                iter: PyExpr::call_name("range", vec![start_py, end_py]),
                body: body_py,
            }];
        }

        // General shape: init; while test: body; update.
        let mut out = Vec::new();
        if let Some(init) = init {
            out.extend(self.stmt(init));
        }
        let (test_py, extracted) = match test {
            Some(test) => {
                let mut tc = Collector::new();
                let py = self.expr(test, &mut tc);
                (py, tc.drain())
            }
            None => (PyExpr::Bool(true), vec![]),
        };
        out.extend(extracted.iter().cloned());
        let mut body_py = self.stmts(body);
        if let Some(update) = update {
            body_py.extend(self.update_stmt(update));
        }
        body_py.extend(extracted);
        out.push(PyStmt::While {
            test: test_py,
            body: body_py,
        });
        out
    }

    /// Lower a loop-update expression (`i++`, `i += 2`) into statements.
    fn update_stmt(&mut self, update: &IlExpr) -> Vec<PyStmt> {
        let mut c = Collector::new();
        let py = self.expr(update, &mut c);
        let main = if matches!(py, PyExpr::Name(_)) {
            vec![]
        } else {
            vec![PyStmt::Expr(py)]
        };
        c.wrap(main)
    }

    /// Classic counting loop: `for (let i = s; i < e; i++)` becomes
    /// `for i in range(s, e)`. Inclusive tests extend the end by one.
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
        if !is_unit_increment(update.as_ref()?, &var) {
            return None;
        }
        let end = if op == IlBinaryOp::LtEq {
            match end.as_int_literal() {
                Some(n) => IlExpr::int(n + 1, end.span),
                None => IlExpr::new(
                    IlExprKind::Binary {
                        op: IlBinaryOp::Add,
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
        if !end.is_pure() || !start.is_pure() {
            return None;
        }
        Some((var, start, end))
    }

    fn switch(
        &mut self,
        discriminant: &IlExpr,
        cases: &[IlSwitchCase],
        default: &Option<Vec<IlStmt>>,
        c: &mut Collector,
    ) -> Vec<PyStmt> {
        let disc_py = if discriminant.is_pure() {
            self.expr(discriminant, c)
        } else {
            let temp = self.session.fresh_temp();
            let value = self.expr(discriminant, c);
            c.push_pre(PyStmt::Assign {
                target: PyExpr::name(temp.clone()),
                value,
            });
            PyExpr::name(temp)
        };

        let default_body = match default {
            Some(default) => self.stmts(&strip_breaks(default)),
            None => vec![],
        };
        let mut chain: Vec<PyStmt> = default_body;
        for case in cases.iter().rev() {
            let mut test: Option<PyExpr> = None;
            for t in &case.tests {
                let t_py = self.expr(t, c);
                let compare = PyExpr::bin(PyBinOp::Eq, disc_py.clone(), t_py);
                test = Some(match test.take() {
                    None => compare,
                    Some(prev) => PyExpr::bin(PyBinOp::Or, prev, compare),
                });
            }
            let Some(test) = test else { continue };
            // The chained structure already prevents fall-through, so the
            // case-terminating breaks are dropped.
            let body = self.stmts(&strip_breaks(&case.body));
            chain = vec![PyStmt::If {
                test,
                body,
                orelse: chain,
            }];
        }
        chain
    }

    fn throw(&mut self, value: &IlExpr, c: &mut Collector) -> PyStmt {
        match &value.kind {
            IlExprKind::Literal(IlLiteral::Null) => PyStmt::Raise(Some(PyExpr::call_name(
                "ValueError",
                vec![PyExpr::Str("Verification failed".to_string())],
            ))),
            IlExprKind::ErrorCreation { kind, message } => {
                let exc = python_exception(kind);
                let args = match message {
                    Some(message) => vec![self.expr(message, c)],
                    None => vec![],
                };
                PyStmt::Raise(Some(PyExpr::call_name(exc, args)))
            }
            IlExprKind::Literal(IlLiteral::Str(text)) => PyStmt::Raise(Some(PyExpr::call_name(
                "Exception",
                vec![PyExpr::Str(text.clone())],
            ))),
            _ => {
                let py = self.expr(value, c);
                PyStmt::Raise(Some(py))
            }
        }
    }

    // ── Expressions ──

    fn expr(&mut self, expr: &IlExpr, c: &mut Collector) -> PyExpr {
        match &expr.kind {
            IlExprKind::Literal(lit) => self.literal(lit),
            IlExprKind::Ident(name) => PyExpr::name(self.ident_name(name)),
            IlExprKind::Binary { op, left, right } => self.binary(expr, *op, left, right, c),
            IlExprKind::Unary { op, operand } => self.unary(*op, operand, c),
            IlExprKind::Conditional {
                test,
                then_val,
                else_val,
            } => {
                let test_py = self.expr(test, c);
                let then_py = self.expr(then_val, c);
                let else_py = self.expr(else_val, c);
                PyExpr::Conditional {
                    body: Box::new(then_py),
                    test: Box::new(test_py),
                    orelse: Box::new(else_py),
                }
            }
            IlExprKind::Call { callee, args } => {
                let func = self.expr(callee, c);
                let args = self.exprs(args, c);
                PyExpr::Call {
                    func: Box::new(func),
                    args,
                    kwargs: vec![],
                }
            }
            IlExprKind::New { callee, args } => {
                if let IlExprKind::Ident(name) = &callee.kind {
                    if stubs::is_framework_type(name) {
                        self.session.require_framework(name);
                    }
                }
                let func = self.expr(callee, c);
                let args = self.exprs(args, c);
                PyExpr::Call {
                    func: Box::new(func),
                    args,
                    kwargs: vec![],
                }
            }
            IlExprKind::Member { object, name } => {
                if let IlExprKind::Ident(obj_name) = &object.kind {
                    if stubs::is_framework_type(obj_name) {
                        self.session.require_framework(obj_name);
                        return PyExpr::attr(PyExpr::name(obj_name.clone()), name.clone());
                    }
                }
                let object_py = self.expr(object, c);
                PyExpr::attr(object_py, self.py_attr(name))
            }
            IlExprKind::Subscript { object, index } => {
                let object_py = self.expr(object, c);
                let index_py = self.expr(index, c);
                PyExpr::subscript(object_py, index_py)
            }
            IlExprKind::Slice { object, start, end } => {
                let object_py = self.expr(object, c);
                let lower = start.as_ref().map(|e| Box::new(self.expr(e, c)));
                let upper = end.as_ref().map(|e| Box::new(self.expr(e, c)));
                PyExpr::SliceExpr {
                    value: Box::new(object_py),
                    lower,
                    upper,
                }
            }
            IlExprKind::Lambda { params, body } => self.lambda(params, body, expr, c),
            IlExprKind::ListLit(items) => PyExpr::List(self.exprs(items, c)),
            IlExprKind::DictLit(entries) => {
                let entries = entries
                    .iter()
                    .map(|(k, v)| (self.expr(k, c), self.expr(v, c)))
                    .collect();
                PyExpr::Dict(entries)
            }
            IlExprKind::TupleLit(items) => PyExpr::Tuple(self.exprs(items, c)),
            IlExprKind::Spread(inner) => {
                let inner_py = self.expr(inner, c);
                PyExpr::Starred(Box::new(inner_py))
            }
            IlExprKind::StringInterp(parts) => {
                let parts = parts
                    .iter()
                    .map(|part| match part {
                        InterpPart::Lit(text) => FStringPart::Lit(text.clone()),
                        InterpPart::Expr(e) => FStringPart::Expr(self.expr(e, c)),
                    })
                    .collect();
                PyExpr::FString(parts)
            }

            IlExprKind::AssignExpr { target, op, value } => {
                // Hoisted ahead of the statement; the target identifier (or
                // its freshly computed value) stands in.
                let target_py = self.expr(target, c);
                let value_py = self.expr(value, c);
                let stmt = self.make_assign(target_py.clone(), *op, value_py);
                c.push_pre(stmt);
                target_py
            }
            IlExprKind::UpdateExpr {
                incr,
                prefix,
                target,
            } => {
                let target_py = self.expr(target, c);
                let op = if *incr { PyBinOp::Add } else { PyBinOp::Sub };
                let stmt = PyStmt::AugAssign {
                    target: target_py.clone(),
                    op,
                    value: PyExpr::Int(1),
                };
                if *prefix {
                    c.push_pre(stmt);
                } else {
                    c.push_post(stmt);
                }
                target_py
            }
            IlExprKind::Sequence(parts) => {
                let Some((last, rest)) = parts.split_last() else {
                    return PyExpr::None_;
                };
                for part in rest {
                    let py = self.expr(part, c);
                    if !matches!(py, PyExpr::Name(_)) {
                        c.push_pre(PyStmt::Expr(py));
                    }
                }
                self.expr(last, c)
            }

            IlExprKind::Rotate {
                dir,
                value,
                amount,
                bits,
            } => {
                let helper = match (dir, bits) {
                    (RotateDir::Left, 8) => "_rotl8",
                    (RotateDir::Right, 8) => "_rotr8",
                    (RotateDir::Left, 16) => "_rotl16",
                    (RotateDir::Right, 16) => "_rotr16",
                    (RotateDir::Left, 64) => "_rotl64",
                    (RotateDir::Right, 64) => "_rotr64",
                    (RotateDir::Left, _) => "_rotl32",
                    (RotateDir::Right, _) => "_rotr32",
                };
                self.session.require_prelude(helper);
                let value_py = self.expr(value, c);
                let amount_py = self.expr(amount, c);
                PyExpr::call_name(helper, vec![value_py, amount_py])
            }
            IlExprKind::PackBytes {
                parts,
                bits: _,
                endian,
            } => {
                let parts_py = self.exprs(parts, c);
                PyExpr::call(
                    PyExpr::attr(PyExpr::name("int"), "from_bytes"),
                    vec![PyExpr::List(parts_py), PyExpr::Str(endian_name(*endian))],
                )
            }
            IlExprKind::UnpackBytes {
                value,
                bits,
                endian,
            } => {
                let value_py = self.expr(value, c);
                let masked = PyExpr::bin(PyBinOp::BitAnd, value_py, width_mask(*bits));
                let to_bytes = PyExpr::method(
                    masked,
                    "to_bytes",
                    vec![
                        PyExpr::Int((*bits / 8) as i64),
                        PyExpr::Str(endian_name(*endian)),
                    ],
                );
                PyExpr::call_name("list", vec![to_bytes])
            }
            IlExprKind::Cast { value, target } => self.cast(value, target, c),
            IlExprKind::ArrayOp { op, recv, args } => self.array_op(*op, recv, args, c),
            IlExprKind::StringOp { op, recv, args } => self.string_op(*op, recv, args, c),
            IlExprKind::MathOp { op, args } => self.math_op(*op, args, c),
            IlExprKind::MathConstant(constant) => self.math_constant(*constant),
            IlExprKind::NumberConstant(constant) => number_constant(*constant),
            IlExprKind::ConvertOp { op, args } => self.convert_op(*op, args, c),
            IlExprKind::JsonOp { op, args } => {
                self.session.require_import("json");
                let func = match op {
                    JsonOp::Stringify => "dumps",
                    JsonOp::Parse => "loads",
                };
                let args = self.exprs(args, c);
                PyExpr::call(PyExpr::attr(PyExpr::name("json"), func), args)
            }
            IlExprKind::DateNow => {
                self.session.require_import("time");
                let seconds = PyExpr::call(PyExpr::attr(PyExpr::name("time"), "time"), vec![]);
                PyExpr::call_name(
                    "int",
                    vec![PyExpr::bin(PyBinOp::Mult, seconds, PyExpr::Int(1000))],
                )
            }

            IlExprKind::ParentConstructorCall { args } => {
                let args = self.exprs(args, c);
                PyExpr::call(
                    PyExpr::attr(PyExpr::call_name("super", vec![]), "__init__"),
                    args,
                )
            }
            IlExprKind::ParentMethodCall { method, args } => {
                let args = self.exprs(args, c);
                PyExpr::call(
                    PyExpr::attr(PyExpr::call_name("super", vec![]), self.py_attr(method)),
                    args,
                )
            }
            IlExprKind::ThisMethodCall { method, args } => {
                let args = self.exprs(args, c);
                PyExpr::call(
                    PyExpr::attr(PyExpr::name("self"), self.py_attr(method)),
                    args,
                )
            }
            IlExprKind::ThisPropertyAccess { property } => {
                PyExpr::attr(PyExpr::name("self"), self.this_property(property))
            }
            IlExprKind::ThisRef => PyExpr::name("self"),

            IlExprKind::ArrayCreation { size } => match size {
                Some(size) => {
                    let size_py = self.expr(size, c);
                    PyExpr::bin(PyBinOp::Mult, PyExpr::List(vec![PyExpr::None_]), size_py)
                }
                None => PyExpr::List(vec![]),
            },
            IlExprKind::TypedArrayCreation { elem, arg } => {
                self.typed_array(*elem, arg.as_deref(), c)
            }
            IlExprKind::BufferCreation { size } => {
                let size_py = self.expr(size, c);
                PyExpr::call_name("bytearray", vec![size_py])
            }
            IlExprKind::DataViewCreation { buffer } => {
                self.session.require_prelude("DataView");
                let buffer_py = self.expr(buffer, c);
                PyExpr::call_name("DataView", vec![buffer_py])
            }
            IlExprKind::MapCreation { entries } => {
                let entries = entries
                    .iter()
                    .map(|(k, v)| (self.expr(k, c), self.expr(v, c)))
                    .collect();
                PyExpr::Dict(entries)
            }
            IlExprKind::SetCreation { values } => PyExpr::Set(self.exprs(values, c)),

            IlExprKind::InstanceOfCheck { value, class_name } => {
                if stubs::is_framework_type(class_name) {
                    self.session.require_framework(class_name);
                }
                let value_py = self.expr(value, c);
                PyExpr::call_name("isinstance", vec![value_py, PyExpr::name(class_name.clone())])
            }
            IlExprKind::IsArrayCheck(value) => {
                let value_py = self.expr(value, c);
                PyExpr::call_name("isinstance", vec![value_py, PyExpr::name("list")])
            }
            IlExprKind::IsIntegerCheck(value) => {
                let value_py = self.expr(value, c);
                PyExpr::call_name("isinstance", vec![value_py, PyExpr::name("int")])
            }
            IlExprKind::TypeOfExpr(value) => {
                self.session
                    .warnings
                    .note("typeof lowered to type(...).__name__", Some(expr.span));
                let value_py = self.expr(value, c);
                PyExpr::attr(PyExpr::call_name("type", vec![value_py]), "__name__")
            }
            IlExprKind::ErrorCreation { kind, message } => {
                let args = match message {
                    Some(message) => vec![self.expr(message, c)],
                    None => vec![],
                };
                PyExpr::call_name(python_exception(kind), args)
            }
            IlExprKind::DebugOutput(args) => {
                let args = self.exprs(args, c);
                PyExpr::call_name("print", args)
            }
            IlExprKind::ObjectOp { op, args } => self.object_op(*op, args, expr, c),
            IlExprKind::ArrayFrom { source, mapper } => self.array_from(source, mapper, c),
            IlExprKind::Unknown { kind, .. } => {
                c.push_pre(PyStmt::Comment(format!("Unknown node type: {}", kind)));
                PyExpr::None_
            }
        }
    }

    fn exprs(&mut self, items: &[IlExpr], c: &mut Collector) -> Vec<PyExpr> {
        items.iter().map(|e| self.expr(e, c)).collect()
    }

    fn ident_name(&self, name: &str) -> String {
        self.py_name(name)
    }

    fn this_property(&self, property: &str) -> String {
        let snake = to_snake_case(property);
        if let Some(ctx) = &self.class_ctx {
            // An accessor body reading the property it implements (under any
            // Source spelling) must go through the backing field.
            if ctx.in_accessor.as_deref() == Some(snake.as_str()) {
                return backing_field_name(property);
            }
            if let Some(renamed) = ctx.field_renames.get(&snake) {
                return renamed.clone();
            }
        }
        snake
    }

    fn literal(&mut self, lit: &IlLiteral) -> PyExpr {
        match lit {
            IlLiteral::Int(n) => PyExpr::Int(*n),
            IlLiteral::Float(v) => PyExpr::Float(*v),
            IlLiteral::Bool(b) => PyExpr::Bool(*b),
            IlLiteral::Str(s) => PyExpr::Str(s.clone()),
            IlLiteral::Bytes(bytes) => PyExpr::Bytes(bytes.clone()),
            IlLiteral::Null => PyExpr::None_,
            IlLiteral::BigInt(n) => PyExpr::Big(n.clone()),
            IlLiteral::Regex { pattern, flags } => {
                self.session.require_import("re");
                let mut args = vec![PyExpr::Str(pattern.clone())];
                let mut flag_expr: Option<PyExpr> = None;
                for flag in flags.chars() {
                    let name = match flag {
                        'i' => Some("re.IGNORECASE"),
                        'm' => Some("re.MULTILINE"),
                        's' => Some("re.DOTALL"),
                        _ => None,
                    };
                    if let Some(name) = name {
                        let part = PyExpr::name(name);
                        flag_expr = Some(match flag_expr.take() {
                            None => part,
                            Some(prev) => PyExpr::bin(PyBinOp::BitOr, prev, part),
                        });
                    }
                }
                if let Some(flag_expr) = flag_expr {
                    args.push(flag_expr);
                }
                PyExpr::call(PyExpr::attr(PyExpr::name("re"), "compile"), args)
            }
        }
    }

    fn binary(
        &mut self,
        whole: &IlExpr,
        op: IlBinaryOp,
        left: &IlExpr,
        right: &IlExpr,
        c: &mut Collector,
    ) -> PyExpr {
        // x >>> 0 is a no-op truncation idiom.
        if op == IlBinaryOp::UShr && right.as_int_literal() == Some(0) {
            return self.expr(left, c);
        }
        let left_py = self.expr(left, c);
        let right_py = self.expr(right, c);

        match op {
            IlBinaryOp::UShr => {
                PyExpr::bin(PyBinOp::RShift, left_py, right_py).mask32()
            }
            IlBinaryOp::Shl if whole.ty == IlType::Int32 => {
                PyExpr::bin(PyBinOp::LShift, left_py, right_py).mask32()
            }
            IlBinaryOp::Div => {
                if left.as_int_literal().is_some() && right.as_int_literal().is_some() {
                    PyExpr::bin(PyBinOp::FloorDiv, left_py, right_py)
                } else if whole.ty.is_integer() {
                    PyExpr::call_name(
                        "int",
                        vec![PyExpr::bin(PyBinOp::Div, left_py, right_py)],
                    )
                } else {
                    PyExpr::bin(PyBinOp::Div, left_py, right_py)
                }
            }
            IlBinaryOp::Eq if is_null_literal(right) => {
                PyExpr::bin(PyBinOp::Is, left_py, PyExpr::None_)
            }
            IlBinaryOp::NotEq if is_null_literal(right) => {
                PyExpr::bin(PyBinOp::IsNot, left_py, PyExpr::None_)
            }
            _ => PyExpr::bin(python_bin_op(op), left_py, right_py),
        }
    }

    fn unary(&mut self, op: IlUnaryOp, operand: &IlExpr, c: &mut Collector) -> PyExpr {
        let operand_py = self.expr(operand, c);
        match op {
            IlUnaryOp::Not => PyExpr::Unary {
                op: PyUnaryOp::Not,
                operand: Box::new(operand_py),
            },
            IlUnaryOp::Neg => PyExpr::Unary {
                op: PyUnaryOp::USub,
                operand: Box::new(operand_py),
            },
            IlUnaryOp::Pos => PyExpr::Unary {
                op: PyUnaryOp::UAdd,
                operand: Box::new(operand_py),
            },
            // Python's ~ is unbounded; pin it to 32 bits.
            IlUnaryOp::BitNot => PyExpr::Unary {
                op: PyUnaryOp::Invert,
                operand: Box::new(PyExpr::call_name("int", vec![operand_py])),
            }
            .mask32(),
        }
    }

    fn cast(&mut self, value: &IlExpr, target: &IlType, c: &mut Collector) -> PyExpr {
        let value_py = self.expr(value, c);
        match target {
            IlType::Int | IlType::BigInt => PyExpr::call_name("int", vec![value_py]),
            IlType::Int32 => PyExpr::call_name("int", vec![value_py]).mask32(),
            IlType::Float => PyExpr::call_name("float", vec![value_py]),
            IlType::Str => PyExpr::call_name("str", vec![value_py]),
            IlType::Bool => PyExpr::call_name("bool", vec![value_py]),
            IlType::List(_) => PyExpr::call_name("list", vec![value_py]),
            IlType::Bytes => PyExpr::call_name("bytearray", vec![value_py]),
            _ => value_py,
        }
    }

    fn typed_array(
        &mut self,
        elem: ElemType,
        arg: Option<&IlExpr>,
        c: &mut Collector,
    ) -> PyExpr {
        let Some(arg) = arg else {
            return if elem == ElemType::Uint8 {
                PyExpr::call_name("bytearray", vec![])
            } else {
                PyExpr::List(vec![])
            };
        };
        let decision = classify_typed_array_arg(arg, None);
        let arg_py = self.expr(arg, c);
        match decision {
            TypedArrayArg::Copy => {
                if elem == ElemType::Uint8 {
                    PyExpr::call_name("bytearray", vec![arg_py])
                } else {
                    PyExpr::call_name("list", vec![arg_py])
                }
            }
            TypedArrayArg::Size => {
                if elem == ElemType::Uint8 {
                    PyExpr::call_name("bytearray", vec![arg_py])
                } else {
                    let zero = if elem.is_float() {
                        PyExpr::Float(0.0)
                    } else {
                        PyExpr::Int(0)
                    };
                    PyExpr::bin(PyBinOp::Mult, PyExpr::List(vec![zero]), arg_py)
                }
            }
        }
    }

    fn array_op(
        &mut self,
        op: ArrayOp,
        recv: &IlExpr,
        args: &[IlExpr],
        c: &mut Collector,
    ) -> PyExpr {
        let recv_py = self.expr(recv, c);
        match op {
            ArrayOp::Length => PyExpr::call_name("len", vec![recv_py]),
            ArrayOp::Append => {
                if args.len() > 1 {
                    let args_py = self.exprs(args, c);
                    PyExpr::method(recv_py, "extend", vec![PyExpr::List(args_py)])
                } else {
                    let args_py = self.exprs(args, c);
                    PyExpr::method(recv_py, "append", args_py)
                }
            }
            ArrayOp::Pop => PyExpr::method(recv_py, "pop", vec![]),
            ArrayOp::Shift => PyExpr::method(recv_py, "pop", vec![PyExpr::Int(0)]),
            ArrayOp::Unshift => {
                let mut call_args = vec![PyExpr::Int(0)];
                call_args.extend(self.exprs(args, c));
                PyExpr::method(recv_py, "insert", call_args)
            }
            ArrayOp::Slice => {
                if args.is_empty() {
                    PyExpr::call_name("list", vec![recv_py])
                } else {
                    let lower = args.first().map(|a| Box::new(self.expr(a, c)));
                    let upper = args.get(1).map(|a| Box::new(self.expr(a, c)));
                    PyExpr::SliceExpr {
                        value: Box::new(recv_py),
                        lower,
                        upper,
                    }
                }
            }
            ArrayOp::Fill => {
                // Expression position; the statement form handles the
                // in-place write.
                self.session.warnings.warn(
                    "array fill in expression position copies instead of mutating",
                    Some(recv.span),
                );
                let value = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::Int(0));
                PyExpr::bin(
                    PyBinOp::Mult,
                    PyExpr::List(vec![value]),
                    PyExpr::call_name("len", vec![recv_py]),
                )
            }
            ArrayOp::Concat => {
                let mut out = recv_py;
                for arg in args {
                    let arg_py = self.expr(arg, c);
                    out = PyExpr::bin(PyBinOp::Add, out, arg_py);
                }
                out
            }
            ArrayOp::Join => {
                let sep = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::Str(",".to_string()));
                let elements = PyExpr::GeneratorExp {
                    elt: Box::new(PyExpr::call_name("str", vec![PyExpr::name("_x")])),
                    target: "_x".to_string(),
                    iter: Box::new(recv_py),
                    condition: None,
                };
                PyExpr::call(PyExpr::attr(sep, "join"), vec![elements])
            }
            ArrayOp::Reverse => {
                PyExpr::call_name("list", vec![PyExpr::call_name("reversed", vec![recv_py])])
            }
            ArrayOp::IndexOf => {
                let needle = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::None_);
                // JS indexOf returns -1 on a miss; .index raises instead.
                PyExpr::Conditional {
                    body: Box::new(PyExpr::method(
                        recv_py.clone(),
                        "index",
                        vec![needle.clone()],
                    )),
                    test: Box::new(PyExpr::bin(PyBinOp::In, needle, recv_py)),
                    orelse: Box::new(PyExpr::Int(-1)),
                }
            }
            ArrayOp::Includes => {
                let needle = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::None_);
                PyExpr::bin(PyBinOp::In, needle, recv_py)
            }
            ArrayOp::Sort => {
                let kwargs = self.sort_args(args, c);
                PyExpr::Call {
                    func: Box::new(PyExpr::attr(recv_py, "sort")),
                    args: vec![],
                    kwargs,
                }
            }
            ArrayOp::Splice => {
                self.session.require_prelude("splice_array");
                let mut call_args = vec![recv_py];
                call_args.extend(self.exprs(args, c));
                PyExpr::call_name("splice_array", call_args)
            }
            ArrayOp::Clear => {
                self.session.warnings.warn(
                    "array clear in expression position has no value",
                    Some(recv.span),
                );
                PyExpr::method(recv_py, "clear", vec![])
            }
            ArrayOp::Map => self.comprehension_op(op, recv_py, args, c),
            ArrayOp::Filter => self.comprehension_op(op, recv_py, args, c),
            ArrayOp::Some | ArrayOp::Every | ArrayOp::Find | ArrayOp::FindIndex => {
                self.comprehension_op(op, recv_py, args, c)
            }
            ArrayOp::Reduce => {
                self.session.require_import("functools");
                let mut call_args = Vec::new();
                if let Some(f) = args.first() {
                    call_args.push(self.lambda_value(f, 2, c));
                }
                call_args.push(recv_py);
                if let Some(init) = args.get(1) {
                    call_args.push(self.expr(init, c));
                }
                PyExpr::call(
                    PyExpr::attr(PyExpr::name("functools"), "reduce"),
                    call_args,
                )
            }
            ArrayOp::ForEach => {
                self.session.warnings.warn(
                    "forEach in expression position lowered to a comprehension",
                    Some(recv.span),
                );
                self.comprehension_op(ArrayOp::Map, recv_py, args, c)
            }
        }
    }

    /// Map/filter/quantifier callbacks become comprehensions. The callback's
    /// first parameter names the loop variable; a second parameter indexes
    /// through `enumerate`.
    fn comprehension_op(
        &mut self,
        op: ArrayOp,
        recv_py: PyExpr,
        args: &[IlExpr],
        c: &mut Collector,
    ) -> PyExpr {
        let Some(callback) = args.first() else {
            return recv_py;
        };
        let (params, body_py) = self.open_lambda(callback, c);
        let var = params.first().cloned().unwrap_or_else(|| "_x".to_string());
        let (target, iter) = if params.len() >= 2 {
            (
                format!("{}, {}", params[1], var),
                PyExpr::call_name("enumerate", vec![recv_py]),
            )
        } else {
            (var.clone(), recv_py)
        };
        match op {
            ArrayOp::Map => PyExpr::ListComp {
                elt: Box::new(body_py),
                target,
                iter: Box::new(iter),
                condition: None,
            },
            ArrayOp::Filter => PyExpr::ListComp {
                elt: Box::new(PyExpr::name(var)),
                target,
                iter: Box::new(iter),
                condition: Some(Box::new(body_py)),
            },
            ArrayOp::Some => PyExpr::call_name(
                "any",
                vec![PyExpr::GeneratorExp {
                    elt: Box::new(body_py),
                    target,
                    iter: Box::new(iter),
                    condition: None,
                }],
            ),
            ArrayOp::Every => PyExpr::call_name(
                "all",
                vec![PyExpr::GeneratorExp {
                    elt: Box::new(body_py),
                    target,
                    iter: Box::new(iter),
                    condition: None,
                }],
            ),
            ArrayOp::Find => PyExpr::call_name(
                "next",
                vec![
                    PyExpr::GeneratorExp {
                        elt: Box::new(PyExpr::name(var)),
                        target,
                        iter: Box::new(iter),
                        condition: Some(Box::new(body_py)),
                    },
                    PyExpr::None_,
                ],
            ),
            ArrayOp::FindIndex => {
                // A two-parameter callback already iterates enumerate(); a
                // one-parameter callback gets an index threaded in here.
                let (index_name, target, iter) = if params.len() >= 2 {
                    (params[1].clone(), target, iter)
                } else {
                    (
                        "_i".to_string(),
                        format!("_i, {}", var),
                        PyExpr::call_name("enumerate", vec![iter]),
                    )
                };
                PyExpr::call_name(
                    "next",
                    vec![
                        PyExpr::GeneratorExp {
                            elt: Box::new(PyExpr::name(index_name)),
                            target,
                            iter: Box::new(iter),
                            condition: Some(Box::new(body_py)),
                        },
                        PyExpr::Int(-1),
                    ],
                )
            }
            _ => body_py,
        }
    }

    /// Open a callback into (parameter names, body expression), collapsing
    /// block bodies to their final return expression.
    fn open_lambda(&mut self, callback: &IlExpr, c: &mut Collector) -> (Vec<String>, PyExpr) {
        match &callback.kind {
            IlExprKind::Lambda { params, body } => {
                let names: Vec<String> = params.iter().map(|p| self.py_name(&p.name)).collect();
                let body_py = match body {
                    LambdaBody::Expr(e) => self.expr(e, c),
                    LambdaBody::Block(stmts) => {
                        self.session.warnings.warn(
                            "block-bodied lambda collapsed to its final return expression",
                            Some(callback.span),
                        );
                        match final_return(stmts) {
                            Some(e) => self.expr(e, c),
                            None => PyExpr::None_,
                        }
                    }
                };
                (names, body_py)
            }
            _ => {
                // A function reference: apply it to the loop variable.
                let func = self.expr(callback, c);
                (
                    vec!["_x".to_string()],
                    PyExpr::call(func, vec![PyExpr::name("_x")]),
                )
            }
        }
    }

    /// A callback in value position (reduce) stays a lambda.
    fn lambda_value(&mut self, callback: &IlExpr, arity: usize, c: &mut Collector) -> PyExpr {
        match &callback.kind {
            IlExprKind::Lambda { params, body } => {
                let mut names: Vec<String> =
                    params.iter().map(|p| self.py_name(&p.name)).collect();
                while names.len() < arity {
                    names.push(format!("_a{}", names.len()));
                }
                let body_py = match body {
                    LambdaBody::Expr(e) => self.expr(e, c),
                    LambdaBody::Block(stmts) => {
                        self.session.warnings.warn(
                            "block-bodied lambda collapsed to its final return expression",
                            Some(callback.span),
                        );
                        match final_return(stmts) {
                            Some(e) => self.expr(e, c),
                            None => PyExpr::None_,
                        }
                    }
                };
                PyExpr::Lambda {
                    params: names,
                    body: Box::new(body_py),
                }
            }
            _ => self.expr(callback, c),
        }
    }

    fn lambda(
        &mut self,
        params: &[IlParam],
        body: &LambdaBody,
        whole: &IlExpr,
        c: &mut Collector,
    ) -> PyExpr {
        let names: Vec<String> = params.iter().map(|p| self.py_name(&p.name)).collect();
        let body_py = match body {
            LambdaBody::Expr(e) => self.expr(e, c),
            LambdaBody::Block(stmts) => {
                self.session.warnings.warn(
                    "block-bodied lambda collapsed to its final return expression",
                    Some(whole.span),
                );
                match final_return(stmts) {
                    Some(e) => self.expr(e, c),
                    None => PyExpr::None_,
                }
            }
        };
        PyExpr::Lambda {
            params: names,
            body: Box::new(body_py),
        }
    }

    fn string_op(
        &mut self,
        op: StringOp,
        recv: &Option<Box<IlExpr>>,
        args: &[IlExpr],
        c: &mut Collector,
    ) -> PyExpr {
        if op == StringOp::FromCharCodes {
            let args_py = self.exprs(args, c);
            return match args_py.len() {
                1 => PyExpr::call_name("chr", args_py),
                _ => {
                    let codes = PyExpr::List(args_py);
                    let joined = PyExpr::GeneratorExp {
                        elt: Box::new(PyExpr::call_name("chr", vec![PyExpr::name("_c")])),
                        target: "_c".to_string(),
                        iter: Box::new(codes),
                        condition: None,
                    };
                    PyExpr::call(
                        PyExpr::attr(PyExpr::Str(String::new()), "join"),
                        vec![joined],
                    )
                }
            };
        }
        let recv_py = match recv {
            Some(recv) => self.expr(recv, c),
            None => PyExpr::Str(String::new()),
        };
        match op {
            StringOp::Replace => {
                // Null-tolerant replace from the prelude.
                self.session.require_prelude("safe_replace");
                let mut call_args = vec![recv_py];
                call_args.extend(self.exprs(args, c));
                PyExpr::call_name("safe_replace", call_args)
            }
            StringOp::Repeat => {
                let count = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::Int(0));
                PyExpr::bin(PyBinOp::Mult, recv_py, count)
            }
            StringOp::IndexOf => {
                let args_py = self.exprs(args, c);
                PyExpr::method(recv_py, "find", args_py)
            }
            StringOp::Split => {
                let args_py = self.exprs(args, c);
                PyExpr::method(recv_py, "split", args_py)
            }
            StringOp::Substring => {
                let lower = args.first().map(|a| Box::new(self.expr(a, c)));
                let upper = args.get(1).map(|a| Box::new(self.expr(a, c)));
                PyExpr::SliceExpr {
                    value: Box::new(recv_py),
                    lower,
                    upper,
                }
            }
            StringOp::CharAt => {
                let index = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::Int(0));
                PyExpr::subscript(recv_py, index)
            }
            StringOp::CharCodeAt => {
                let index = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::Int(0));
                PyExpr::call_name("ord", vec![PyExpr::subscript(recv_py, index)])
            }
            StringOp::ToUpper => PyExpr::method(recv_py, "upper", vec![]),
            StringOp::ToLower => PyExpr::method(recv_py, "lower", vec![]),
            StringOp::Trim => PyExpr::method(recv_py, "strip", vec![]),
            StringOp::StartsWith => {
                let args_py = self.exprs(args, c);
                PyExpr::method(recv_py, "startswith", args_py)
            }
            StringOp::EndsWith => {
                let args_py = self.exprs(args, c);
                PyExpr::method(recv_py, "endswith", args_py)
            }
            StringOp::Includes => {
                let needle = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::Str(String::new()));
                PyExpr::bin(PyBinOp::In, needle, recv_py)
            }
            StringOp::Concat => {
                let mut out = recv_py;
                for arg in args {
                    let arg_py = self.expr(arg, c);
                    out = PyExpr::bin(PyBinOp::Add, out, arg_py);
                }
                out
            }
            StringOp::FromCharCodes => unreachable!("handled above"),
        }
    }

    fn math_op(&mut self, op: MathOp, args: &[IlExpr], c: &mut Collector) -> PyExpr {
        let math_name = |t: &mut Self, name: &str, args_py: Vec<PyExpr>| {
            t.session.require_import("math");
            PyExpr::call(PyExpr::attr(PyExpr::name("math"), name), args_py)
        };
        let args_py = self.exprs(args, c);
        match op {
            MathOp::Sin => math_name(self, "sin", args_py),
            MathOp::Cos => math_name(self, "cos", args_py),
            MathOp::Tan => math_name(self, "tan", args_py),
            MathOp::Asin => math_name(self, "asin", args_py),
            MathOp::Acos => math_name(self, "acos", args_py),
            MathOp::Atan => math_name(self, "atan", args_py),
            MathOp::Atan2 => math_name(self, "atan2", args_py),
            MathOp::Sinh => math_name(self, "sinh", args_py),
            MathOp::Cosh => math_name(self, "cosh", args_py),
            MathOp::Tanh => math_name(self, "tanh", args_py),
            MathOp::Exp => math_name(self, "exp", args_py),
            MathOp::Log => math_name(self, "log", args_py),
            MathOp::Log2 => math_name(self, "log2", args_py),
            MathOp::Log10 => math_name(self, "log10", args_py),
            MathOp::Sqrt => math_name(self, "sqrt", args_py),
            MathOp::Hypot => math_name(self, "hypot", args_py),
            MathOp::Floor => math_name(self, "floor", args_py),
            MathOp::Ceil => math_name(self, "ceil", args_py),
            MathOp::Trunc => math_name(self, "trunc", args_py),
            MathOp::Round => PyExpr::call_name("round", args_py),
            MathOp::Abs => PyExpr::call_name("abs", args_py),
            MathOp::Min => PyExpr::call_name("min", args_py),
            MathOp::Max => PyExpr::call_name("max", args_py),
            MathOp::Pow => {
                let mut it = args_py.into_iter();
                match (it.next(), it.next()) {
                    (Some(base), Some(exp)) => PyExpr::bin(PyBinOp::Pow, base, exp),
                    (Some(base), None) => base,
                    _ => PyExpr::Int(1),
                }
            }
            MathOp::Cbrt => {
                let base = args_py.into_iter().next().unwrap_or(PyExpr::Int(0));
                PyExpr::bin(
                    PyBinOp::Pow,
                    base,
                    PyExpr::bin(PyBinOp::Div, PyExpr::Float(1.0), PyExpr::Float(3.0)),
                )
            }
            MathOp::Sign => {
                let value = args_py.into_iter().next().unwrap_or(PyExpr::Int(0));
                PyExpr::Conditional {
                    body: Box::new(PyExpr::Int(1)),
                    test: Box::new(PyExpr::bin(PyBinOp::Gt, value.clone(), PyExpr::Int(0))),
                    orelse: Box::new(PyExpr::Conditional {
                        body: Box::new(PyExpr::Int(-1)),
                        test: Box::new(PyExpr::bin(PyBinOp::Lt, value, PyExpr::Int(0))),
                        orelse: Box::new(PyExpr::Int(0)),
                    }),
                }
            }
            MathOp::Random => {
                self.session.require_import("random");
                PyExpr::call(PyExpr::attr(PyExpr::name("random"), "random"), vec![])
            }
            MathOp::Imul => {
                let mut it = args_py.into_iter();
                match (it.next(), it.next()) {
                    (Some(a), Some(b)) => PyExpr::bin(PyBinOp::Mult, a, b).mask32(),
                    _ => PyExpr::Int(0),
                }
            }
            MathOp::Clz32 => {
                let value = args_py.into_iter().next().unwrap_or(PyExpr::Int(0));
                let masked = value.mask32();
                PyExpr::bin(
                    PyBinOp::Sub,
                    PyExpr::Int(32),
                    PyExpr::method(masked, "bit_length", vec![]),
                )
            }
        }
    }

    fn math_constant(&mut self, constant: MathConst) -> PyExpr {
        self.session.require_import("math");
        let math = |name: &str| PyExpr::attr(PyExpr::name("math"), name);
        match constant {
            MathConst::Pi => math("pi"),
            MathConst::E => math("e"),
            MathConst::Ln2 => PyExpr::call(math("log"), vec![PyExpr::Int(2)]),
            MathConst::Ln10 => PyExpr::call(math("log"), vec![PyExpr::Int(10)]),
            MathConst::Log2E => PyExpr::call(math("log2"), vec![math("e")]),
            MathConst::Log10E => PyExpr::call(math("log10"), vec![math("e")]),
            MathConst::Sqrt2 => PyExpr::call(math("sqrt"), vec![PyExpr::Int(2)]),
            MathConst::Sqrt1_2 => PyExpr::call(math("sqrt"), vec![PyExpr::Float(0.5)]),
        }
    }

    fn convert_op(&mut self, op: ConvertOp, args: &[IlExpr], c: &mut Collector) -> PyExpr {
        let arg = args
            .first()
            .map(|a| self.expr(a, c))
            .unwrap_or(PyExpr::None_);
        match op {
            ConvertOp::HexDecode => PyExpr::call_name(
                "list",
                vec![PyExpr::call(
                    PyExpr::attr(PyExpr::name("bytes"), "fromhex"),
                    vec![arg],
                )],
            ),
            ConvertOp::HexEncode => {
                PyExpr::method(PyExpr::call_name("bytes", vec![arg]), "hex", vec![])
            }
            ConvertOp::StringToBytes => PyExpr::call_name(
                "list",
                vec![PyExpr::method(
                    arg,
                    "encode",
                    vec![PyExpr::Str("latin-1".to_string())],
                )],
            ),
            ConvertOp::BytesToString => PyExpr::method(
                PyExpr::call_name("bytes", vec![arg]),
                "decode",
                vec![PyExpr::Str("latin-1".to_string())],
            ),
        }
    }

    fn object_op(
        &mut self,
        op: ObjectOp,
        args: &[IlExpr],
        whole: &IlExpr,
        c: &mut Collector,
    ) -> PyExpr {
        match op {
            ObjectOp::Freeze => {
                // Deliberately a no-op; a proxy wrapper would break callers
                // that mutate the result.
                self.session
                    .warnings
                    .note("freeze is a no-op in this target", Some(whole.span));
                args.first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::None_)
            }
            ObjectOp::Keys => {
                let arg = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::None_);
                PyExpr::call_name("list", vec![PyExpr::method(arg, "keys", vec![])])
            }
            ObjectOp::Values => {
                let arg = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::None_);
                PyExpr::call_name("list", vec![PyExpr::method(arg, "values", vec![])])
            }
            ObjectOp::Entries => {
                let arg = args
                    .first()
                    .map(|a| self.expr(a, c))
                    .unwrap_or(PyExpr::None_);
                PyExpr::call_name("list", vec![PyExpr::method(arg, "items", vec![])])
            }
            ObjectOp::Create => match args.first() {
                Some(arg) if is_null_literal(arg) => PyExpr::Dict(vec![]),
                Some(arg) => {
                    let arg_py = self.expr(arg, c);
                    PyExpr::call_name("dict", vec![arg_py])
                }
                None => PyExpr::Dict(vec![]),
            },
        }
    }

    fn array_from(
        &mut self,
        source: &IlExpr,
        mapper: &Option<Box<IlExpr>>,
        c: &mut Collector,
    ) -> PyExpr {
        let source_py = self.expr(source, c);
        match mapper {
            None => PyExpr::call_name("list", vec![source_py]),
            Some(mapper) => {
                let (params, body_py) = self.open_lambda(mapper, c);
                let var = params.first().cloned().unwrap_or_else(|| "_x".to_string());
                PyExpr::ListComp {
                    elt: Box::new(body_py),
                    target: var,
                    iter: Box::new(source_py),
                    condition: None,
                }
            }
        }
    }
}

// ── Free helpers ──

fn is_screaming_case(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn is_null_literal(expr: &IlExpr) -> bool {
    matches!(expr.kind, IlExprKind::Literal(IlLiteral::Null))
}

fn python_bin_op(op: IlBinaryOp) -> PyBinOp {
    match op {
        IlBinaryOp::Add => PyBinOp::Add,
        IlBinaryOp::Sub => PyBinOp::Sub,
        IlBinaryOp::Mul => PyBinOp::Mult,
        IlBinaryOp::Div => PyBinOp::Div,
        IlBinaryOp::Mod => PyBinOp::Mod,
        IlBinaryOp::Pow => PyBinOp::Pow,
        IlBinaryOp::Eq => PyBinOp::Eq,
        IlBinaryOp::NotEq => PyBinOp::NotEq,
        IlBinaryOp::Lt => PyBinOp::Lt,
        IlBinaryOp::LtEq => PyBinOp::LtE,
        IlBinaryOp::Gt => PyBinOp::Gt,
        IlBinaryOp::GtEq => PyBinOp::GtE,
        IlBinaryOp::And => PyBinOp::And,
        IlBinaryOp::Or => PyBinOp::Or,
        IlBinaryOp::BitAnd => PyBinOp::BitAnd,
        IlBinaryOp::BitOr => PyBinOp::BitOr,
        IlBinaryOp::BitXor => PyBinOp::BitXor,
        IlBinaryOp::Shl => PyBinOp::LShift,
        IlBinaryOp::Shr | IlBinaryOp::UShr => PyBinOp::RShift,
        IlBinaryOp::In => PyBinOp::In,
    }
}

fn assign_bin_op(op: AssignKind) -> Option<PyBinOp> {
    match op {
        AssignKind::Simple => None,
        AssignKind::Add => Some(PyBinOp::Add),
        AssignKind::Sub => Some(PyBinOp::Sub),
        AssignKind::Mul => Some(PyBinOp::Mult),
        AssignKind::Div => Some(PyBinOp::Div),
        AssignKind::Mod => Some(PyBinOp::Mod),
        AssignKind::Shl => Some(PyBinOp::LShift),
        AssignKind::Shr | AssignKind::UShr => Some(PyBinOp::RShift),
        AssignKind::BitAnd => Some(PyBinOp::BitAnd),
        AssignKind::BitOr => Some(PyBinOp::BitOr),
        AssignKind::BitXor => Some(PyBinOp::BitXor),
    }
}

fn number_constant(constant: NumberConst) -> PyExpr {
    match constant {
        NumberConst::MaxSafeInteger => PyExpr::Int(9_007_199_254_740_991),
        NumberConst::MinSafeInteger => PyExpr::Int(-9_007_199_254_740_991),
        NumberConst::MaxValue => PyExpr::Float(f64::MAX),
        NumberConst::MinValue => PyExpr::Float(5e-324),
        NumberConst::Epsilon => PyExpr::Float(f64::EPSILON),
        NumberConst::PositiveInfinity => PyExpr::Float(f64::INFINITY),
        NumberConst::NegativeInfinity => PyExpr::Float(f64::NEG_INFINITY),
        NumberConst::NaN => PyExpr::Float(f64::NAN),
    }
}

fn python_exception(kind: &str) -> &'static str {
    match kind {
        "TypeError" => "TypeError",
        "RangeError" => "ValueError",
        "SyntaxError" => "SyntaxError",
        _ => "Exception",
    }
}

fn endian_name(endian: Endianness) -> String {
    match endian {
        Endianness::Big => "big".to_string(),
        Endianness::Little => "little".to_string(),
    }
}

fn width_mask(bits: u32) -> PyExpr {
    match bits {
        8 => PyExpr::HexInt(0xFF),
        16 => PyExpr::HexInt(0xFFFF),
        64 => PyExpr::HexInt(0xFFFF_FFFF_FFFF_FFFF),
        _ => PyExpr::HexInt(0xFFFF_FFFF),
    }
}

fn final_return(stmts: &[IlStmt]) -> Option<&IlExpr> {
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

fn strip_breaks(body: &[IlStmt]) -> Vec<IlStmt> {
    body.iter()
        .filter(|s| !matches!(s, IlStmt::Break(_)))
        .cloned()
        .collect()
}

fn literal_getter_value(func: &IlFunction) -> Option<&IlExpr> {
    match func.body.as_slice() {
        [IlStmt::Return {
            value: Some(value), ..
        }] => match value.kind {
            IlExprKind::Literal(_) => Some(value),
            _ => None,
        },
        _ => None,
    }
}

/// True when a method body is exactly `return this.<same snake name>(…)`,
/// which would self-recurse after case conversion.
fn is_self_wrapper(method: &IlMethod, snake: &str) -> bool {
    match method.func.body.as_slice() {
        [IlStmt::Return {
            value: Some(value), ..
        }] => match &value.kind {
            IlExprKind::ThisMethodCall { method: callee, .. } => to_snake_case(callee) == snake,
            _ => false,
        },
        _ => false,
    }
}

/// Stable-sort accessors so each getter precedes its matching setter.
fn order_accessors(methods: &mut Vec<&IlMethod>) {
    let mut i = 0;
    while i < methods.len() {
        if methods[i].kind == MethodKind::Setter {
            let snake = to_snake_case(&methods[i].name);
            if let Some(j) = methods.iter().skip(i + 1).position(|m| {
                m.kind == MethodKind::Getter && to_snake_case(&m.name) == snake
            }) {
                let j = i + 1 + j;
                let getter = methods.remove(j);
                methods.insert(i, getter);
            }
        }
        i += 1;
    }
}

/// A range loop must own its induction variable; reject shapes the caller
/// could not re-derive (non-unit steps handled by the while fallback).
fn is_unit_increment(update: &IlExpr, var: &str) -> bool {
    match &update.kind {
        IlExprKind::UpdateExpr { incr: true, target, .. } => {
            matches!(&target.kind, IlExprKind::Ident(name) if name == var)
        }
        IlExprKind::AssignExpr {
            target,
            op: AssignKind::Add,
            value,
        } => {
            matches!(&target.kind, IlExprKind::Ident(name) if name == var)
                && value.as_int_literal() == Some(1)
        }
        _ => false,
    }
}

