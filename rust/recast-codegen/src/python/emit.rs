//! Python emission: precedence-driven expression rendering plus
//! indentation-based statement layout.

use super::ast::*;
use crate::session::TranspileSession;
use crate::stubs;

/// Operator precedence; higher binds tighter. Mirrors the Python grammar.
pub fn precedence(op: PyBinOp) -> u8 {
    match op {
        PyBinOp::Pow => 14,
        PyBinOp::Mult | PyBinOp::Div | PyBinOp::FloorDiv | PyBinOp::Mod => 12,
        PyBinOp::Add | PyBinOp::Sub => 11,
        PyBinOp::LShift | PyBinOp::RShift => 10,
        PyBinOp::BitAnd => 9,
        PyBinOp::BitXor => 8,
        PyBinOp::BitOr => 7,
        op if op.is_comparison() => 6,
        PyBinOp::And => 4,
        PyBinOp::Or => 3,
        _ => 6,
    }
}

fn is_right_assoc(op: PyBinOp) -> bool {
    matches!(op, PyBinOp::Pow)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// One place decides parenthesization for the whole emitter.
///
/// A left child is wrapped when it binds looser than the parent, or at equal
/// precedence under a different operator (reader ambiguity). A right child
/// is wrapped at equal precedence too, preserving left-to-right evaluation;
/// only the right-associative `**` leaves its right child bare. Unary
/// operators and atoms (names, calls, subscripts) never need parentheses.
pub fn needs_parens(parent: PyBinOp, child: &PyExpr, side: Side) -> bool {
    let parent_prec = precedence(parent);
    match child {
        PyExpr::Bin { op: child_op, .. } => {
            let child_prec = precedence(*child_op);
            if child_prec < parent_prec {
                return true;
            }
            if child_prec > parent_prec {
                return false;
            }
            match side {
                Side::Left => {
                    if is_right_assoc(parent) {
                        true
                    } else {
                        *child_op != parent
                    }
                }
                Side::Right => !is_right_assoc(parent),
            }
        }
        PyExpr::Conditional { .. } | PyExpr::Lambda { .. } => true,
        _ => false,
    }
}

pub struct PyEmitter<'a> {
    session: &'a TranspileSession,
}

impl<'a> PyEmitter<'a> {
    pub fn new(session: &'a TranspileSession) -> Self {
        Self { session }
    }

    fn indent_unit(&self) -> &str {
        &self.session.options.indent
    }

    // ── Module layout ──

    pub fn emit_module(&self, module: &PyModule) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push(format!("# {} (generated by recast)", module.name));
        lines.push(format!("# Source fingerprint: {}", module.fingerprint));
        if !self.session.preludes.is_empty() {
            let names: Vec<&str> = self.session.preludes.iter().map(String::as_str).collect();
            lines.push(format!("# Requires prelude helpers: {}", names.join(", ")));
        }
        lines.push(String::new());

        for import in &self.session.imports {
            lines.push(format!("import {}", import));
        }
        if !self.session.imports.is_empty() {
            lines.push(String::new());
        }

        for name in &self.session.framework {
            if let Some(stub) = stubs::render_python_stub(name) {
                lines.extend(stub.lines().map(str::to_string));
                lines.push(String::new());
                lines.push(String::new());
            }
        }

        let mut first = true;
        for stmt in &module.body {
            if !first && is_top_level_def(stmt) {
                // Two blank lines separate successive top-level definitions.
                lines.push(String::new());
                lines.push(String::new());
            }
            self.stmt(stmt, 0, &mut lines);
            first = false;
        }

        // Normalize trailing blanks to a single final newline.
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let ending = self.session.options.line_ending.as_str();
        let mut out = lines.join(ending);
        out.push_str(ending);
        out
    }

    // ── Statements ──

    fn line(&self, level: usize, text: &str, lines: &mut Vec<String>) {
        lines.push(format!("{}{}", self.indent_unit().repeat(level), text));
    }

    fn block(&self, body: &[PyStmt], level: usize, lines: &mut Vec<String>) {
        if body.is_empty() {
            self.line(level, "pass", lines);
            return;
        }
        for stmt in body {
            self.stmt(stmt, level, lines);
        }
    }

    pub fn stmt(&self, stmt: &PyStmt, level: usize, lines: &mut Vec<String>) {
        match stmt {
            PyStmt::Assign { target, value } => {
                self.line(
                    level,
                    &format!("{} = {}", self.expr(target), self.expr(value)),
                    lines,
                );
            }
            PyStmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let head = format!("{}: {}", self.expr(target), annotation);
                match value {
                    Some(value) => {
                        self.line(level, &format!("{} = {}", head, self.expr(value)), lines)
                    }
                    None => self.line(level, &head, lines),
                }
            }
            PyStmt::AugAssign { target, op, value } => {
                self.line(
                    level,
                    &format!(
                        "{} {}= {}",
                        self.expr(target),
                        op.symbol(),
                        self.expr(value)
                    ),
                    lines,
                );
            }
            PyStmt::Expr(expr) => self.line(level, &self.expr(expr), lines),
            PyStmt::Return(value) => match value {
                Some(value) => self.line(level, &format!("return {}", self.expr(value)), lines),
                None => self.line(level, "return", lines),
            },
            PyStmt::Pass => self.line(level, "pass", lines),
            PyStmt::Break => self.line(level, "break", lines),
            PyStmt::Continue => self.line(level, "continue", lines),
            PyStmt::If { test, body, orelse } => {
                self.if_chain("if", test, body, orelse, level, lines);
            }
            PyStmt::While { test, body } => {
                self.line(level, &format!("while {}:", self.expr(test)), lines);
                self.block(body, level + 1, lines);
            }
            PyStmt::For { target, iter, body } => {
                self.line(
                    level,
                    &format!("for {} in {}:", self.expr(target), self.expr(iter)),
                    lines,
                );
                self.block(body, level + 1, lines);
            }
            PyStmt::Raise(value) => match value {
                Some(value) => self.line(level, &format!("raise {}", self.expr(value)), lines),
                None => self.line(level, "raise", lines),
            },
            PyStmt::Try {
                body,
                handlers,
                finalbody,
            } => {
                self.line(level, "try:", lines);
                self.block(body, level + 1, lines);
                for handler in handlers {
                    let head = match &handler.name {
                        Some(name) => format!("except {} as {}:", handler.exc_type, name),
                        None => format!("except {}:", handler.exc_type),
                    };
                    self.line(level, &head, lines);
                    self.block(&handler.body, level + 1, lines);
                }
                if !finalbody.is_empty() {
                    self.line(level, "finally:", lines);
                    self.block(finalbody, level + 1, lines);
                }
            }
            PyStmt::FunctionDef {
                name,
                params,
                returns,
                body,
                decorators,
                docstring,
            } => {
                for decorator in decorators {
                    self.line(level, &format!("@{}", decorator), lines);
                }
                let params_text: Vec<String> = params.iter().map(|p| self.param(p)).collect();
                let returns_text = match returns {
                    Some(r) => format!(" -> {}", r),
                    None => String::new(),
                };
                self.line(
                    level,
                    &format!("def {}({}){}:", name, params_text.join(", "), returns_text),
                    lines,
                );
                if let Some(doc) = docstring {
                    self.line(level + 1, &format!("\"\"\"{}\"\"\"", doc), lines);
                }
                if body.is_empty() && docstring.is_none() {
                    self.line(level + 1, "pass", lines);
                } else {
                    for stmt in body {
                        self.stmt(stmt, level + 1, lines);
                    }
                }
            }
            PyStmt::ClassDef {
                name,
                bases,
                body,
                docstring,
            } => {
                let head = if bases.is_empty() {
                    format!("class {}:", name)
                } else {
                    format!("class {}({}):", name, bases.join(", "))
                };
                self.line(level, &head, lines);
                if let Some(doc) = docstring {
                    self.line(level + 1, &format!("\"\"\"{}\"\"\"", doc), lines);
                }
                if body.is_empty() && docstring.is_none() {
                    self.line(level + 1, "pass", lines);
                } else {
                    let mut first = true;
                    for stmt in body {
                        if !first && matches!(stmt, PyStmt::FunctionDef { .. }) {
                            lines.push(String::new());
                        }
                        self.stmt(stmt, level + 1, lines);
                        first = false;
                    }
                }
            }
            PyStmt::Comment(text) => self.line(level, &format!("# {}", text), lines),
            PyStmt::Delete(target) => {
                self.line(level, &format!("del {}", self.expr(target)), lines)
            }
        }
    }

    fn if_chain(
        &self,
        keyword: &str,
        test: &PyExpr,
        body: &[PyStmt],
        orelse: &[PyStmt],
        level: usize,
        lines: &mut Vec<String>,
    ) {
        self.line(level, &format!("{} {}:", keyword, self.expr(test)), lines);
        self.block(body, level + 1, lines);
        match orelse {
            [] => {}
            [PyStmt::If {
                test: inner_test,
                body: inner_body,
                orelse: inner_orelse,
            }] => {
                self.if_chain("elif", inner_test, inner_body, inner_orelse, level, lines);
            }
            rest => {
                self.line(level, "else:", lines);
                self.block(rest, level + 1, lines);
            }
        }
    }

    fn param(&self, param: &PyParam) -> String {
        let mut out = param.name.clone();
        if let Some(annotation) = &param.annotation {
            out.push_str(": ");
            out.push_str(annotation);
        }
        if let Some(default) = &param.default {
            if param.annotation.is_some() {
                out.push_str(" = ");
            } else {
                out.push('=');
            }
            out.push_str(&self.expr(default));
        }
        out
    }

    // ── Expressions ──

    pub fn expr(&self, expr: &PyExpr) -> String {
        match expr {
            PyExpr::Name(name) => name.clone(),
            PyExpr::Int(n) => n.to_string(),
            PyExpr::Big(n) => n.to_string(),
            PyExpr::HexInt(n) => format!("0x{:X}", n),
            PyExpr::Float(v) => format_float(*v),
            PyExpr::Str(s) => quote_str(s),
            PyExpr::FString(parts) => self.fstring(parts),
            PyExpr::Bytes(bytes) => quote_bytes(bytes),
            PyExpr::Bool(true) => "True".to_string(),
            PyExpr::Bool(false) => "False".to_string(),
            PyExpr::None_ => "None".to_string(),
            PyExpr::Tuple(items) => match items.len() {
                1 => format!("({},)", self.expr(&items[0])),
                _ => format!("({})", self.comma_list(items)),
            },
            PyExpr::List(items) => format!("[{}]", self.comma_list(items)),
            PyExpr::Dict(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", self.expr(k), self.expr(v)))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            PyExpr::Set(items) => {
                if items.is_empty() {
                    "set()".to_string()
                } else {
                    format!("{{{}}}", self.comma_list(items))
                }
            }
            PyExpr::Unary { op, operand } => {
                let symbol = match op {
                    PyUnaryOp::Not => "not ",
                    PyUnaryOp::USub => "-",
                    PyUnaryOp::UAdd => "+",
                    PyUnaryOp::Invert => "~",
                };
                let operand_text = if unary_operand_needs_parens(operand) {
                    format!("({})", self.expr(operand))
                } else {
                    self.expr(operand)
                };
                format!("{}{}", symbol, operand_text)
            }
            PyExpr::Bin { op, left, right } => {
                let left_text = self.child(left, *op, Side::Left);
                let right_text = self.child(right, *op, Side::Right);
                format!("{} {} {}", left_text, op.symbol(), right_text)
            }
            PyExpr::Call { func, args, kwargs } => {
                let func_text = self.callee(func);
                let mut parts: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                parts.extend(
                    kwargs
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, self.expr(v))),
                );
                format!("{}({})", func_text, parts.join(", "))
            }
            PyExpr::Attribute { value, attr } => {
                format!("{}.{}", self.callee(value), attr)
            }
            PyExpr::Subscript { value, index } => {
                format!("{}[{}]", self.callee(value), self.expr(index))
            }
            PyExpr::SliceExpr {
                value,
                lower,
                upper,
            } => {
                let lower_text = lower.as_ref().map(|e| self.expr(e)).unwrap_or_default();
                let upper_text = upper.as_ref().map(|e| self.expr(e)).unwrap_or_default();
                format!("{}[{}:{}]", self.callee(value), lower_text, upper_text)
            }
            PyExpr::Conditional { body, test, orelse } => {
                format!(
                    "{} if {} else {}",
                    self.conditional_part(body),
                    self.conditional_part(test),
                    self.expr(orelse)
                )
            }
            PyExpr::Lambda { params, body } => {
                if params.is_empty() {
                    format!("lambda: {}", self.expr(body))
                } else {
                    format!("lambda {}: {}", params.join(", "), self.expr(body))
                }
            }
            PyExpr::ListComp {
                elt,
                target,
                iter,
                condition,
            } => {
                let mut out = format!(
                    "[{} for {} in {}",
                    self.expr(elt),
                    target,
                    self.expr(iter)
                );
                if let Some(condition) = condition {
                    out.push_str(&format!(" if {}", self.expr(condition)));
                }
                out.push(']');
                out
            }
            PyExpr::GeneratorExp {
                elt,
                target,
                iter,
                condition,
            } => {
                let mut out = format!(
                    "({} for {} in {}",
                    self.expr(elt),
                    target,
                    self.expr(iter)
                );
                if let Some(condition) = condition {
                    out.push_str(&format!(" if {}", self.expr(condition)));
                }
                out.push(')');
                out
            }
            PyExpr::Starred(inner) => format!("*{}", self.expr(inner)),
        }
    }

    fn comma_list(&self, items: &[PyExpr]) -> String {
        items
            .iter()
            .map(|e| self.expr(e))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn child(&self, child: &PyExpr, parent: PyBinOp, side: Side) -> String {
        if needs_parens(parent, child, side) {
            format!("({})", self.expr(child))
        } else {
            self.expr(child)
        }
    }

    /// Callee / attribute-base / subscript-base position: anything that is
    /// not an atom needs wrapping (`(a + b).foo` etc.).
    fn callee(&self, expr: &PyExpr) -> String {
        match expr {
            PyExpr::Name(_)
            | PyExpr::Attribute { .. }
            | PyExpr::Subscript { .. }
            | PyExpr::SliceExpr { .. }
            | PyExpr::Call { .. }
            | PyExpr::Str(_)
            | PyExpr::FString(_)
            | PyExpr::Bytes(_)
            | PyExpr::List(_)
            | PyExpr::Tuple(_)
            | PyExpr::Dict(_)
            | PyExpr::Set(_)
            | PyExpr::ListComp { .. } => self.expr(expr),
            PyExpr::Int(_) | PyExpr::HexInt(_) | PyExpr::Big(_) => self.expr(expr),
            _ => format!("({})", self.expr(expr)),
        }
    }

    /// Branch operands of a conditional expression: nested conditionals and
    /// lambdas are wrapped so the chain reads unambiguously.
    fn conditional_part(&self, expr: &PyExpr) -> String {
        match expr {
            PyExpr::Conditional { .. } | PyExpr::Lambda { .. } => {
                format!("({})", self.expr(expr))
            }
            _ => self.expr(expr),
        }
    }

    // ── F-strings ──

    fn fstring(&self, parts: &[FStringPart]) -> String {
        // Scan the interpolated expressions first; flip to single quotes
        // only when an expression drags in a double quote and no single.
        let rendered: Vec<(bool, String)> = parts
            .iter()
            .map(|part| match part {
                FStringPart::Lit(text) => (false, text.clone()),
                FStringPart::Expr(expr) => (true, self.expr(expr)),
            })
            .collect();
        let exprs_have_double = rendered
            .iter()
            .any(|(is_expr, text)| *is_expr && text.contains('"'));
        let exprs_have_single = rendered
            .iter()
            .any(|(is_expr, text)| *is_expr && text.contains('\''));
        let quote = if exprs_have_double && !exprs_have_single {
            '\''
        } else {
            '"'
        };

        let mut out = String::from("f");
        out.push(quote);
        for (is_expr, text) in &rendered {
            if *is_expr {
                out.push('{');
                out.push_str(text);
                out.push('}');
            } else {
                out.push_str(&escape_fstring_literal(text, quote));
            }
        }
        out.push(quote);
        out
    }
}

fn is_top_level_def(stmt: &PyStmt) -> bool {
    matches!(
        stmt,
        PyStmt::FunctionDef { .. } | PyStmt::ClassDef { .. }
    )
}

fn unary_operand_needs_parens(operand: &PyExpr) -> bool {
    matches!(
        operand,
        PyExpr::Bin { .. } | PyExpr::Conditional { .. } | PyExpr::Lambda { .. }
    )
}

/// Render a float so it round-trips and always looks like a float.
fn format_float(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 {
            "float(\"inf\")".to_string()
        } else {
            "float(\"-inf\")".to_string()
        };
    }
    if value.is_nan() {
        return "float(\"nan\")".to_string();
    }
    let text = format!("{}", value);
    if text.contains('.') || text.contains('e') || text.contains('E') {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Double-quoted Python string literal with the escape set the targets share.
pub fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\x00"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::from("b\"");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push('"');
    out
}

fn escape_fstring_literal(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::options::TargetOptions;

    fn emitter_fixture() -> TranspileSession {
        TranspileSession::new(TargetOptions::default())
    }

    fn text(expr: &PyExpr) -> String {
        let session = emitter_fixture();
        PyEmitter::new(&session).expr(expr)
    }

    fn bin(op: PyBinOp, left: PyExpr, right: PyExpr) -> PyExpr {
        PyExpr::bin(op, left, right)
    }

    fn name(s: &str) -> PyExpr {
        PyExpr::name(s)
    }

    #[test]
    fn left_assoc_right_child_parenthesized() {
        // a - (b - c) must keep its parens.
        let e = bin(
            PyBinOp::Sub,
            name("a"),
            bin(PyBinOp::Sub, name("b"), name("c")),
        );
        assert_eq!(text(&e), "a - (b - c)");
    }

    #[test]
    fn left_assoc_left_child_flat() {
        // (a - b) - c needs no parens.
        let e = bin(
            PyBinOp::Sub,
            bin(PyBinOp::Sub, name("a"), name("b")),
            name("c"),
        );
        assert_eq!(text(&e), "a - b - c");
    }

    #[test]
    fn mixed_precedence_wraps_looser_child() {
        // (a | b) & c: | binds looser than &.
        let e = bin(
            PyBinOp::BitAnd,
            bin(PyBinOp::BitOr, name("a"), name("b")),
            name("c"),
        );
        assert_eq!(text(&e), "(a | b) & c");
    }

    #[test]
    fn equal_precedence_different_op_wrapped_for_readability() {
        // (a * b) // c at equal precedence but different operators.
        let e = bin(
            PyBinOp::FloorDiv,
            bin(PyBinOp::Mult, name("a"), name("b")),
            name("c"),
        );
        assert_eq!(text(&e), "(a * b) // c");
    }

    #[test]
    fn pow_is_right_associative() {
        let e = bin(
            PyBinOp::Pow,
            name("a"),
            bin(PyBinOp::Pow, name("b"), name("c")),
        );
        assert_eq!(text(&e), "a ** b ** c");
        let e = bin(
            PyBinOp::Pow,
            bin(PyBinOp::Pow, name("a"), name("b")),
            name("c"),
        );
        assert_eq!(text(&e), "(a ** b) ** c");
    }

    #[test]
    fn string_escapes() {
        assert_eq!(quote_str("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(quote_str("nul\0"), "\"nul\\x00\"");
    }

    #[test]
    fn fstring_quote_selection_flips_on_double_quotes() {
        // f-string whose expression contains a double-quoted literal.
        let parts = vec![
            FStringPart::Lit("value: ".to_string()),
            FStringPart::Expr(PyExpr::subscript(name("d"), PyExpr::Str("k".into()))),
        ];
        let session = emitter_fixture();
        let out = PyEmitter::new(&session).fstring(&parts);
        assert_eq!(out, "f'value: {d[\"k\"]}'");
    }

    #[test]
    fn fstring_escapes_braces() {
        let parts = vec![FStringPart::Lit("{x}".to_string())];
        let session = emitter_fixture();
        let out = PyEmitter::new(&session).fstring(&parts);
        assert_eq!(out, "f\"{{x}}\"");
    }

    #[test]
    fn hex_renders_uppercase() {
        assert_eq!(text(&PyExpr::HexInt(0xFFFF_FFFF)), "0xFFFFFFFF");
    }

    #[test]
    fn elif_chain_collapses() {
        let session = emitter_fixture();
        let emitter = PyEmitter::new(&session);
        let stmt = PyStmt::If {
            test: name("a"),
            body: vec![PyStmt::Pass],
            orelse: vec![PyStmt::If {
                test: name("b"),
                body: vec![PyStmt::Pass],
                orelse: vec![PyStmt::Break],
            }],
        };
        let mut lines = Vec::new();
        emitter.stmt(&stmt, 0, &mut lines);
        assert_eq!(
            lines,
            vec!["if a:", "    pass", "elif b:", "    pass", "else:", "    break"]
        );
    }
}
