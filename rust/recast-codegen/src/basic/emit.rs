//! BASIC emission. One precedence table covers the operator set; dialect
//! differences surface in the shift spelling, the inheritance keyword, and
//! the `Return` vs `Name = value` function-result convention.

use super::ast::*;
use crate::session::TranspileSession;
use crate::stubs;
use recast_core::options::Dialect;

/// Operator precedence, higher binds tighter. The VB family is uniformly
/// left-associative, exponentiation included.
pub fn precedence(op: BasicBinOp) -> u8 {
    match op {
        BasicBinOp::Pow => 13,
        BasicBinOp::Mult | BasicBinOp::Div => 11,
        BasicBinOp::IntDiv => 10,
        BasicBinOp::Mod => 9,
        BasicBinOp::Add | BasicBinOp::Sub => 8,
        BasicBinOp::Concat => 7,
        BasicBinOp::Shl | BasicBinOp::Shr => 6,
        BasicBinOp::Eq
        | BasicBinOp::NotEq
        | BasicBinOp::Lt
        | BasicBinOp::LtE
        | BasicBinOp::Gt
        | BasicBinOp::GtE => 5,
        BasicBinOp::And => 3,
        BasicBinOp::Or | BasicBinOp::Xor => 2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

pub fn needs_parens(parent: BasicBinOp, child: &BasicExpr, side: Side) -> bool {
    let parent_prec = precedence(parent);
    match child {
        BasicExpr::Bin { op: child_op, .. } => {
            let child_prec = precedence(*child_op);
            if child_prec < parent_prec {
                return true;
            }
            if child_prec > parent_prec {
                return false;
            }
            match side {
                Side::Left => *child_op != parent,
                Side::Right => true,
            }
        }
        BasicExpr::Iif { .. } => false,
        _ => false,
    }
}

pub struct BasicEmitter<'a> {
    session: &'a TranspileSession,
    /// Name and value-returning flag of the function being emitted; drives
    /// the `Return`-vs-assignment result convention.
    current_function: Option<(String, bool)>,
}

impl<'a> BasicEmitter<'a> {
    pub fn new(session: &'a TranspileSession) -> Self {
        Self {
            session,
            current_function: None,
        }
    }

    fn dialect(&self) -> Dialect {
        self.session.options.dialect
    }

    fn indent_unit(&self) -> &str {
        &self.session.options.indent
    }

    fn structured(&self) -> bool {
        self.dialect().has_structured_exceptions()
    }

    // ── Module ──

    pub fn emit_module(&mut self, module: &BasicModule) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push(format!("' {} (generated by recast)", module.name));
        lines.push(format!("' Source fingerprint: {}", module.fingerprint));
        if !self.session.preludes.is_empty() {
            let names: Vec<&str> = self.session.preludes.iter().map(String::as_str).collect();
            lines.push(format!("' Requires prelude helpers: {}", names.join(", ")));
        }
        lines.push(String::new());

        for name in &self.session.framework {
            if let Some(stub) = stubs::basic_stub(name, self.dialect()) {
                lines.extend(stub.lines().map(str::to_string));
                lines.push(String::new());
            }
        }

        let mut first = true;
        for decl in &module.decls {
            if !first {
                lines.push(String::new());
            }
            self.decl(decl, &mut lines);
            first = false;
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let ending = self.session.options.line_ending.as_str();
        let mut out = lines.join(ending);
        out.push_str(ending);
        out
    }

    fn line(&self, level: usize, text: &str, lines: &mut Vec<String>) {
        lines.push(format!("{}{}", self.indent_unit().repeat(level), text));
    }

    fn decl(&mut self, decl: &BasicDecl, lines: &mut Vec<String>) {
        match decl {
            BasicDecl::Class(class) => self.class(class, lines),
            BasicDecl::TypeDecl { name, fields } => {
                self.line(0, &format!("Type {}", name), lines);
                for field in fields {
                    let ty = field.ty.as_deref().unwrap_or("Variant");
                    self.line(1, &format!("{} As {}", field.name, ty), lines);
                }
                self.line(0, "End Type", lines);
            }
            BasicDecl::Function(func) => self.function(func, 0, "Public", lines),
            BasicDecl::Var {
                name,
                ty,
                init,
                is_const,
            } => {
                let keyword = if *is_const { "Const" } else { "Dim" };
                let mut text = format!("{} {}", keyword, name);
                if let Some(ty) = ty {
                    text.push_str(&format!(" As {}", ty));
                }
                if let Some(init) = init {
                    text.push_str(&format!(" = {}", self.expr(init)));
                }
                self.line(0, &text, lines);
            }
            BasicDecl::Stmt(stmt) => self.stmt(stmt, 0, lines),
        }
    }

    fn class(&mut self, class: &BasicClass, lines: &mut Vec<String>) {
        self.line(0, &format!("Class {}", class.name), lines);
        if let Some(base) = &class.inherits {
            self.line(
                1,
                &format!("{} {}", self.dialect().inherits_keyword(), base),
                lines,
            );
        }
        for field in &class.fields {
            let shared = if field.shared { "Shared " } else { "" };
            let ty = field.ty.as_deref().unwrap_or("Variant");
            let mut text = format!("Public {}{} As {}", shared, field.name, ty);
            if let Some(init) = &field.init {
                text.push_str(&format!(" = {}", self.expr(init)));
            }
            self.line(1, &text, lines);
        }
        if !class.fields.is_empty() && !class.members.is_empty() {
            lines.push(String::new());
        }
        let mut first = true;
        for member in &class.members {
            if !first {
                lines.push(String::new());
            }
            self.member(member, lines);
            first = false;
        }
        self.line(0, "End Class", lines);
    }

    fn member(&mut self, member: &BasicMember, lines: &mut Vec<String>) {
        match member {
            BasicMember::Constructor(func) => {
                let params = self.params(&func.params);
                self.line(1, &format!("Public Sub New({})", params), lines);
                self.current_function = None;
                for stmt in &func.body {
                    self.stmt(stmt, 2, lines);
                }
                self.line(1, "End Sub", lines);
            }
            BasicMember::Sub(func) => self.function_like(func, false, lines),
            BasicMember::Function(func) => self.function_like(func, true, lines),
            BasicMember::PropertyGet { name, ty, body } => {
                let ty = ty.as_deref().unwrap_or("Variant");
                self.line(
                    1,
                    &format!("Public Property Get {}() As {}", name, ty),
                    lines,
                );
                self.current_function = Some((name.clone(), true));
                for stmt in body {
                    self.stmt(stmt, 2, lines);
                }
                self.current_function = None;
                self.line(1, "End Property", lines);
            }
            BasicMember::PropertySet {
                name,
                param,
                ty,
                body,
            } => {
                let ty = ty.as_deref().unwrap_or("Variant");
                self.line(
                    1,
                    &format!("Public Property Set {}(ByVal {} As {})", name, param, ty),
                    lines,
                );
                self.current_function = None;
                for stmt in body {
                    self.stmt(stmt, 2, lines);
                }
                self.current_function = None;
                self.line(1, "End Property", lines);
            }
        }
    }

    fn function_like(&mut self, func: &BasicFunc, returns_value: bool, lines: &mut Vec<String>) {
        let shared = if func.shared { "Shared " } else { "" };
        let params = self.params(&func.params);
        if returns_value {
            let ret = func.ret.as_deref().unwrap_or("Variant");
            self.line(
                1,
                &format!(
                    "Public {}Function {}({}) As {}",
                    shared, func.name, params, ret
                ),
                lines,
            );
            self.current_function = Some((func.name.clone(), true));
        } else {
            self.line(
                1,
                &format!("Public {}Sub {}({})", shared, func.name, params),
                lines,
            );
            self.current_function = Some((func.name.clone(), false));
        }
        for stmt in &func.body {
            self.stmt(stmt, 2, lines);
        }
        self.current_function = None;
        self.line(1, if returns_value { "End Function" } else { "End Sub" }, lines);
    }

    fn function(&mut self, func: &BasicFunc, level: usize, access: &str, lines: &mut Vec<String>) {
        let params = self.params(&func.params);
        let returns_value = func.ret.is_some();
        if returns_value {
            let ret = func.ret.as_deref().unwrap_or("Variant");
            self.line(
                level,
                &format!("{} Function {}({}) As {}", access, func.name, params, ret),
                lines,
            );
        } else {
            self.line(
                level,
                &format!("{} Sub {}({})", access, func.name, params),
                lines,
            );
        }
        self.current_function = Some((func.name.clone(), returns_value));
        for stmt in &func.body {
            self.stmt(stmt, level + 1, lines);
        }
        self.current_function = None;
        self.line(
            level,
            if returns_value { "End Function" } else { "End Sub" },
            lines,
        );
    }

    fn params(&self, params: &[BasicParam]) -> String {
        params
            .iter()
            .map(|p| {
                let mut text = p.name.clone();
                if let Some(ty) = &p.ty {
                    text.push_str(&format!(" As {}", ty));
                }
                if let Some(default) = &p.default {
                    text = format!("Optional {} = {}", text, self.expr(default));
                }
                text
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ── Statements ──

    pub fn stmt(&mut self, stmt: &BasicStmt, level: usize, lines: &mut Vec<String>) {
        match stmt {
            BasicStmt::Dim { name, ty, init } => {
                let mut text = format!("Dim {}", name);
                if let Some(ty) = ty {
                    text.push_str(&format!(" As {}", ty));
                }
                if let Some(init) = init {
                    text.push_str(&format!(" = {}", self.expr(init)));
                }
                self.line(level, &text, lines);
            }
            BasicStmt::Const { name, init } => {
                self.line(level, &format!("Const {} = {}", name, self.expr(init)), lines);
            }
            BasicStmt::Assign { target, value } => {
                self.line(
                    level,
                    &format!("{} = {}", self.expr(target), self.expr(value)),
                    lines,
                );
            }
            BasicStmt::ExprStmt(expr) => {
                // Bare call statements drop the argument parentheses when
                // using classic Call-less syntax; keep Call for clarity.
                self.line(level, &format!("Call {}", self.expr(expr)), lines);
            }
            BasicStmt::Return(value) => match (&self.current_function, value) {
                (Some((name, true)), Some(value)) if !self.structured() => {
                    // Classic dialects assign the function name then bail.
                    self.line(level, &format!("{} = {}", name, self.expr(value)), lines);
                    self.line(level, "Exit Function", lines);
                }
                (_, Some(value)) => {
                    self.line(level, &format!("Return {}", self.expr(value)), lines)
                }
                (Some((_, false)), None) if !self.structured() => {
                    self.line(level, "Exit Sub", lines)
                }
                (_, None) => self.line(level, "Return", lines),
            },
            BasicStmt::If {
                test,
                body,
                elifs,
                orelse,
            } => {
                self.line(level, &format!("If {} Then", self.expr(test)), lines);
                for stmt in body {
                    self.stmt(stmt, level + 1, lines);
                }
                for (elif_test, elif_body) in elifs {
                    self.line(level, &format!("ElseIf {} Then", self.expr(elif_test)), lines);
                    for stmt in elif_body {
                        self.stmt(stmt, level + 1, lines);
                    }
                }
                if !orelse.is_empty() {
                    self.line(level, "Else", lines);
                    for stmt in orelse {
                        self.stmt(stmt, level + 1, lines);
                    }
                }
                self.line(level, "End If", lines);
            }
            BasicStmt::DoLoop {
                test,
                body,
                test_at_top,
            } => {
                if *test_at_top {
                    self.line(level, &format!("Do While {}", self.expr(test)), lines);
                } else {
                    self.line(level, "Do", lines);
                }
                for stmt in body {
                    self.stmt(stmt, level + 1, lines);
                }
                if *test_at_top {
                    self.line(level, "Loop", lines);
                } else {
                    self.line(level, &format!("Loop While {}", self.expr(test)), lines);
                }
            }
            BasicStmt::ForTo {
                var,
                start,
                end,
                step,
                body,
            } => {
                let mut head = format!(
                    "For {} = {} To {}",
                    var,
                    self.expr(start),
                    self.expr(end)
                );
                if let Some(step) = step {
                    head.push_str(&format!(" Step {}", self.expr(step)));
                }
                self.line(level, &head, lines);
                for stmt in body {
                    self.stmt(stmt, level + 1, lines);
                }
                self.line(level, "Next", lines);
            }
            BasicStmt::ForEach { var, iter, body } => {
                self.line(
                    level,
                    &format!("For Each {} In {}", var, self.expr(iter)),
                    lines,
                );
                for stmt in body {
                    self.stmt(stmt, level + 1, lines);
                }
                self.line(level, "Next", lines);
            }
            BasicStmt::Select {
                subject,
                cases,
                default,
            } => {
                self.line(level, &format!("Select Case {}", self.expr(subject)), lines);
                for (tests, body) in cases {
                    let labels: Vec<String> = tests.iter().map(|t| self.expr(t)).collect();
                    self.line(level + 1, &format!("Case {}", labels.join(", ")), lines);
                    for stmt in body {
                        self.stmt(stmt, level + 2, lines);
                    }
                }
                if !default.is_empty() {
                    self.line(level + 1, "Case Else", lines);
                    for stmt in default {
                        self.stmt(stmt, level + 2, lines);
                    }
                }
                self.line(level, "End Select", lines);
            }
            BasicStmt::TryCatch {
                body,
                catch_var,
                catch_body,
                finally,
            } => {
                self.line(level, "Try", lines);
                for stmt in body {
                    self.stmt(stmt, level + 1, lines);
                }
                let catch_head = match catch_var {
                    Some(var) => format!("Catch {} As Exception", var),
                    None => "Catch".to_string(),
                };
                self.line(level, &catch_head, lines);
                for stmt in catch_body {
                    self.stmt(stmt, level + 1, lines);
                }
                if !finally.is_empty() {
                    self.line(level, "Finally", lines);
                    for stmt in finally {
                        self.stmt(stmt, level + 1, lines);
                    }
                }
                self.line(level, "End Try", lines);
            }
            BasicStmt::OnErrorBlock { body, recovery } => {
                self.line(level, "On Error Resume Next", lines);
                for stmt in body {
                    self.stmt(stmt, level, lines);
                }
                self.line(level, "On Error GoTo 0", lines);
                if !recovery.is_empty() {
                    self.line(level, "If Err.Number <> 0 Then", lines);
                    for stmt in recovery {
                        self.stmt(stmt, level + 1, lines);
                    }
                    self.line(level, "End If", lines);
                }
            }
            BasicStmt::Throw(expr) => {
                if self.structured() {
                    self.line(level, &format!("Throw {}", self.expr(expr)), lines);
                } else {
                    self.line(
                        level,
                        &format!("Err.Raise 5 ' {}", self.expr(expr)),
                        lines,
                    );
                }
            }
            BasicStmt::Exit(keyword) => self.line(level, &format!("Exit {}", keyword), lines),
            BasicStmt::ContinueLoop(keyword) => {
                self.line(level, &format!("Continue {}", keyword), lines)
            }
            BasicStmt::Comment(text) => self.line(level, &format!("' {}", text), lines),
        }
    }

    // ── Expressions ──

    pub fn expr(&self, expr: &BasicExpr) -> String {
        match expr {
            BasicExpr::Name(name) => name.clone(),
            BasicExpr::Int(n) => n.to_string(),
            BasicExpr::Big(n) => n.to_string(),
            BasicExpr::Hex(n) => format!("&H{:X}", n),
            BasicExpr::Float(v) => {
                let text = format!("{}", v);
                if text.contains('.') || text.contains('e') {
                    text
                } else {
                    format!("{}.0", text)
                }
            }
            BasicExpr::Str(s) => quote_basic(s),
            BasicExpr::Bool(true) => "True".to_string(),
            BasicExpr::Bool(false) => "False".to_string(),
            BasicExpr::Nothing => "Nothing".to_string(),
            BasicExpr::ArrayLit(items) => {
                let parts: Vec<String> = items.iter().map(|e| self.expr(e)).collect();
                format!("{{{}}}", parts.join(", "))
            }
            BasicExpr::Unary { op, operand } => {
                let operand_text = match operand.as_ref() {
                    BasicExpr::Bin { .. } | BasicExpr::Iif { .. } => {
                        format!("({})", self.expr(operand))
                    }
                    _ => self.expr(operand),
                };
                match op {
                    BasicUnaryOp::Neg => format!("-{}", operand_text),
                    BasicUnaryOp::Not => format!("Not {}", operand_text),
                }
            }
            BasicExpr::Bin { op, left, right } => {
                let left_text = self.child(left, *op, Side::Left);
                let right_text = self.child(right, *op, Side::Right);
                format!("{} {} {}", left_text, self.op_symbol(*op), right_text)
            }
            BasicExpr::Call { func, args } => {
                let args_text: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                format!("{}({})", self.expr(func), args_text.join(", "))
            }
            BasicExpr::Member { value, name } => format!("{}.{}", self.expr(value), name),
            BasicExpr::Index { value, index } => {
                format!("{}({})", self.expr(value), self.expr(index))
            }
            BasicExpr::New { name, args } => {
                if args.is_empty() {
                    format!("New {}()", name)
                } else {
                    let args_text: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                    format!("New {}({})", name, args_text.join(", "))
                }
            }
            BasicExpr::Cast { kind, value } => {
                format!("{}({})", kind.keyword(), self.expr(value))
            }
            BasicExpr::TypeOfIs { value, ty } => {
                format!("TypeOf {} Is {}", self.expr(value), ty)
            }
            BasicExpr::Iif {
                test,
                then_val,
                else_val,
            } => format!(
                "IIf({}, {}, {})",
                self.expr(test),
                self.expr(then_val),
                self.expr(else_val)
            ),
            BasicExpr::LambdaExpr { params, body } => {
                format!("Function({}) {}", params.join(", "), self.expr(body))
            }
            BasicExpr::AddressOf(name) => format!("AddressOf {}", name),
        }
    }

    fn child(&self, child: &BasicExpr, parent: BasicBinOp, side: Side) -> String {
        if needs_parens(parent, child, side) {
            format!("({})", self.expr(child))
        } else {
            self.expr(child)
        }
    }

    fn op_symbol(&self, op: BasicBinOp) -> &'static str {
        match op {
            BasicBinOp::Pow => "^",
            BasicBinOp::Mult => "*",
            BasicBinOp::Div => "/",
            BasicBinOp::IntDiv => "\\",
            BasicBinOp::Mod => "Mod",
            BasicBinOp::Add => "+",
            BasicBinOp::Sub => "-",
            BasicBinOp::Concat => "&",
            BasicBinOp::Shl => {
                if self.dialect() == Dialect::VbNet {
                    "<<"
                } else {
                    "Shl"
                }
            }
            BasicBinOp::Shr => {
                if self.dialect() == Dialect::VbNet {
                    ">>"
                } else {
                    "Shr"
                }
            }
            BasicBinOp::Eq => "=",
            BasicBinOp::NotEq => "<>",
            BasicBinOp::Lt => "<",
            BasicBinOp::LtE => "<=",
            BasicBinOp::Gt => ">",
            BasicBinOp::GtE => ">=",
            BasicBinOp::And => "And",
            BasicBinOp::Or => "Or",
            BasicBinOp::Xor => "Xor",
        }
    }
}

/// BASIC string literal: doubled quotes, no backslash escapes.
pub fn quote_basic(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' {
            out.push_str("\"\"");
        } else {
            out.push(c);
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::options::TargetOptions;

    fn session(dialect: Dialect) -> TranspileSession {
        let options = TargetOptions {
            dialect,
            ..TargetOptions::default()
        };
        TranspileSession::new(options)
    }

    fn name(s: &str) -> BasicExpr {
        BasicExpr::name(s)
    }

    #[test]
    fn shift_spelling_tracks_dialect() {
        let vbnet = session(Dialect::VbNet);
        let emitter = BasicEmitter::new(&vbnet);
        let e = BasicExpr::bin(BasicBinOp::Shl, name("x"), BasicExpr::Int(4));
        assert_eq!(emitter.expr(&e), "x << 4");

        let freebasic = session(Dialect::FreeBasic);
        let emitter = BasicEmitter::new(&freebasic);
        assert_eq!(emitter.expr(&e), "x Shl 4");
    }

    #[test]
    fn concat_and_hex_render() {
        let s = session(Dialect::FreeBasic);
        let emitter = BasicEmitter::new(&s);
        let e = BasicExpr::bin(
            BasicBinOp::Concat,
            BasicExpr::Str("a\"b".to_string()),
            BasicExpr::Hex(0xFF),
        );
        assert_eq!(emitter.expr(&e), "\"a\"\"b\" & &HFF");
    }

    #[test]
    fn equal_precedence_right_child_wrapped() {
        let s = session(Dialect::FreeBasic);
        let emitter = BasicEmitter::new(&s);
        let e = BasicExpr::bin(
            BasicBinOp::Sub,
            name("a"),
            BasicExpr::bin(BasicBinOp::Sub, name("b"), name("c")),
        );
        assert_eq!(emitter.expr(&e), "a - (b - c)");
    }

    #[test]
    fn classic_dialect_returns_by_assignment() {
        let s = session(Dialect::VbScript);
        let mut emitter = BasicEmitter::new(&s);
        let func = BasicFunc {
            name: "Square".to_string(),
            params: vec![BasicParam {
                name: "x".to_string(),
                ty: Some("Long".to_string()),
                default: None,
            }],
            ret: Some("Long".to_string()),
            body: vec![BasicStmt::Return(Some(BasicExpr::bin(
                BasicBinOp::Mult,
                name("x"),
                name("x"),
            )))],
            shared: false,
        };
        let mut lines = Vec::new();
        emitter.function(&func, 0, "Public", &mut lines);
        assert_eq!(
            lines,
            vec![
                "Public Function Square(x As Long) As Long",
                "    Square = x * x",
                "    Exit Function",
                "End Function"
            ]
        );
    }

    #[test]
    fn select_case_layout() {
        let s = session(Dialect::VbNet);
        let mut emitter = BasicEmitter::new(&s);
        let stmt = BasicStmt::Select {
            subject: name("mode"),
            cases: vec![(
                vec![BasicExpr::Int(1), BasicExpr::Int(2)],
                vec![BasicStmt::Assign {
                    target: name("x"),
                    value: BasicExpr::Int(0),
                }],
            )],
            default: vec![BasicStmt::Comment("none".to_string())],
        };
        let mut lines = Vec::new();
        emitter.stmt(&stmt, 0, &mut lines);
        assert_eq!(
            lines,
            vec![
                "Select Case mode",
                "    Case 1, 2",
                "        x = 0",
                "    Case Else",
                "        ' none",
                "End Select"
            ]
        );
    }
}
