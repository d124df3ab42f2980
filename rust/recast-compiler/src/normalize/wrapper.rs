//! Module-wrapper recognition.
//!
//! The Source commonly ships as an immediately-invoked function expression,
//! sometimes in the two-argument universal-module-definition shape. The
//! declarations inside the wrapper are the real module; feature-detection
//! branches and registration side effects around them are dropped.

use recast_core::diag::Warnings;
use recast_core::source::{FunctionDef, SourceExpr, SourceStmt};

/// Peel a module wrapper, returning the statement list that should be
/// treated as the module top level. Returns the input untouched when no
/// wrapper is recognized.
pub fn unwrap_top_level<'a>(body: &'a [SourceStmt], warnings: &mut Warnings) -> &'a [SourceStmt] {
    // A wrapped module is a single expression statement (an optional leading
    // directive like 'use strict' is tolerated).
    let meaningful: Vec<&SourceStmt> = body
        .iter()
        .filter(|s| !is_directive_stmt(s))
        .collect();
    if meaningful.len() != 1 {
        return body;
    }
    let expr = match meaningful[0] {
        SourceStmt::Expr { expr, .. } => expr,
        _ => return body,
    };
    let call = match strip_unary(expr) {
        SourceExpr::Call { callee, args, .. } => Some((callee.as_ref(), args)),
        _ => None,
    };
    let Some((callee, args)) = call else {
        return body;
    };

    // IIFE: (function() { ... })() : the callee body is the module.
    if let SourceExpr::Function(f) = callee {
        if let Some(factory) = umd_factory(f, args) {
            warnings.note("unwrapped UMD module wrapper", Some(f.span));
            return &factory.body;
        }
        warnings.note("unwrapped IIFE module wrapper", Some(f.span));
        return &f.body;
    }
    body
}

/// Two-argument UMD shape: `(function(root, factory) { ... })(this, function() { ... })`.
/// The factory argument carries the declarations.
fn umd_factory<'a>(wrapper: &FunctionDef, args: &'a [SourceExpr]) -> Option<&'a FunctionDef> {
    if wrapper.params.len() != 2 || args.len() != 2 {
        return None;
    }
    match &args[1] {
        SourceExpr::Function(f) => Some(f),
        _ => None,
    }
}

/// Negation/void prefixes used to force expression position: `!function(){}()`.
fn strip_unary(expr: &SourceExpr) -> &SourceExpr {
    match expr {
        SourceExpr::Unary { arg, .. } => strip_unary(arg),
        _ => expr,
    }
}

fn is_directive_stmt(stmt: &SourceStmt) -> bool {
    matches!(
        stmt,
        SourceStmt::Expr {
            expr: SourceExpr::Str(_, _),
            ..
        } | SourceStmt::Empty(_)
    )
}

/// True for statements the wrapper unwrap keeps: declarations only.
pub fn is_kept_declaration(stmt: &SourceStmt) -> bool {
    matches!(
        stmt,
        SourceStmt::FunctionDecl(_) | SourceStmt::ClassDecl(_) | SourceStmt::VarDecl { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::source::{ClassDef, FunctionDef, SourceParam, SourcePattern};
    use recast_core::span::Span;

    fn class_stmt(name: &str) -> SourceStmt {
        SourceStmt::ClassDecl(ClassDef {
            name: name.to_string(),
            superclass: None,
            members: vec![],
            span: Span::dummy(),
        })
    }

    fn iife(body: Vec<SourceStmt>) -> SourceStmt {
        SourceStmt::Expr {
            expr: SourceExpr::Call {
                callee: Box::new(SourceExpr::Function(FunctionDef {
                    name: None,
                    params: vec![],
                    body,
                    is_arrow: false,
                    span: Span::dummy(),
                })),
                args: vec![],
                span: Span::dummy(),
            },
            span: Span::dummy(),
        }
    }

    #[test]
    fn unwraps_plain_iife() {
        let module = vec![iife(vec![class_stmt("Cipher")])];
        let mut warnings = Warnings::new();
        let top = unwrap_top_level(&module, &mut warnings);
        assert_eq!(top.len(), 1);
        assert!(matches!(top[0], SourceStmt::ClassDecl(_)));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn unwraps_umd_factory() {
        let factory = FunctionDef {
            name: None,
            params: vec![],
            body: vec![class_stmt("Hash")],
            is_arrow: false,
            span: Span::dummy(),
        };
        let wrapper = FunctionDef {
            name: None,
            params: vec![
                SourceParam {
                    pattern: SourcePattern::Ident("root".into(), Span::dummy()),
                    default_value: None,
                    span: Span::dummy(),
                },
                SourceParam {
                    pattern: SourcePattern::Ident("factory".into(), Span::dummy()),
                    default_value: None,
                    span: Span::dummy(),
                },
            ],
            body: vec![],
            is_arrow: false,
            span: Span::dummy(),
        };
        let module = vec![SourceStmt::Expr {
            expr: SourceExpr::Call {
                callee: Box::new(SourceExpr::Function(wrapper)),
                args: vec![
                    SourceExpr::This(Span::dummy()),
                    SourceExpr::Function(factory),
                ],
                span: Span::dummy(),
            },
            span: Span::dummy(),
        }];
        let mut warnings = Warnings::new();
        let top = unwrap_top_level(&module, &mut warnings);
        assert!(matches!(top[0], SourceStmt::ClassDecl(_)));
    }

    #[test]
    fn leaves_unwrapped_modules_alone() {
        let module = vec![class_stmt("A"), class_stmt("B")];
        let mut warnings = Warnings::new();
        let top = unwrap_top_level(&module, &mut warnings);
        assert_eq!(top.len(), 2);
        assert!(warnings.is_empty());
    }
}
