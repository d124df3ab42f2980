//! Destructuring expansion.
//!
//! Array patterns become indexed reads and object patterns keyed reads,
//! both through a freshly introduced hidden temporary so the right-hand
//! side is evaluated exactly once.

use super::Normalizer;
use recast_core::il::{AssignKind, IlExpr, IlExprKind, IlLiteral, IlStmt, IlVarDecl};
use recast_core::source::SourcePattern;
use recast_core::span::Span;
use recast_core::types::IlType;

impl Normalizer {
    /// Expand a destructuring declaration (`let [a, b] = rhs`).
    pub(crate) fn expand_decl_pattern(
        &mut self,
        pattern: &SourcePattern,
        init: IlExpr,
        is_const: bool,
        span: Span,
    ) -> Vec<IlStmt> {
        let temp = self.fresh_temp();
        let temp_ty = init.ty.clone();
        self.env.declare(&temp, temp_ty.clone());
        let mut stmts = vec![IlStmt::VarDecl(IlVarDecl {
            name: temp.clone(),
            ty: temp_ty.clone(),
            init: Some(init),
            is_const: true,
            span,
        })];
        let temp_ref = IlExpr::ident(temp, temp_ty, span);
        self.bind_pattern(pattern, &temp_ref, is_const, true, span, &mut stmts);
        stmts
    }

    /// Expand a destructuring assignment (`[a, b] = rhs` as a statement).
    pub(crate) fn expand_assign_pattern(
        &mut self,
        pattern: &SourcePattern,
        value: IlExpr,
        span: Span,
    ) -> Vec<IlStmt> {
        let temp = self.fresh_temp();
        let temp_ty = value.ty.clone();
        self.env.declare(&temp, temp_ty.clone());
        let mut stmts = vec![IlStmt::VarDecl(IlVarDecl {
            name: temp.clone(),
            ty: temp_ty.clone(),
            init: Some(value),
            is_const: true,
            span,
        })];
        let temp_ref = IlExpr::ident(temp, temp_ty, span);
        self.bind_pattern(pattern, &temp_ref, false, false, span, &mut stmts);
        stmts
    }

    /// Emit one read per bound name. `declare` selects between variable
    /// declarations (let/const position) and plain assignments.
    fn bind_pattern(
        &mut self,
        pattern: &SourcePattern,
        source: &IlExpr,
        is_const: bool,
        declare: bool,
        span: Span,
        out: &mut Vec<IlStmt>,
    ) {
        match pattern {
            SourcePattern::Ident(name, name_span) => {
                let ty = source.ty.element().unwrap_or(IlType::Any);
                self.env.declare(name, ty.clone());
                if declare {
                    out.push(IlStmt::VarDecl(IlVarDecl {
                        name: name.clone(),
                        ty,
                        init: Some(source.clone()),
                        is_const,
                        span: *name_span,
                    }));
                } else {
                    out.push(IlStmt::Assign {
                        target: IlExpr::ident(name.clone(), ty, *name_span),
                        op: AssignKind::Simple,
                        value: source.clone(),
                        span: *name_span,
                    });
                }
            }
            SourcePattern::Array(elements, _) => {
                for (i, element) in elements.iter().enumerate() {
                    let read = IlExpr::new(
                        IlExprKind::Subscript {
                            object: Box::new(source.clone()),
                            index: Box::new(IlExpr::int(i as i64, span)),
                        },
                        source.ty.element().unwrap_or(IlType::Any),
                        span,
                    );
                    self.bind_leaf(element, read, is_const, declare, span, out);
                }
            }
            SourcePattern::Object(entries, _) => {
                for (key, binding) in entries {
                    let read = IlExpr::new(
                        IlExprKind::Subscript {
                            object: Box::new(source.clone()),
                            index: Box::new(IlExpr::literal(
                                IlLiteral::Str(key.clone()),
                                span,
                            )),
                        },
                        IlType::Any,
                        span,
                    );
                    self.bind_leaf(binding, read, is_const, declare, span, out);
                }
            }
        }
    }

    // One level of nesting goes through a fresh temporary; deeper shapes
    // recurse through the same machinery.
    fn bind_leaf(
        &mut self,
        pattern: &SourcePattern,
        read: IlExpr,
        is_const: bool,
        declare: bool,
        span: Span,
        out: &mut Vec<IlStmt>,
    ) {
        match pattern {
            SourcePattern::Ident(name, name_span) => {
                let ty = read.ty.clone();
                self.env.declare(name, ty.clone());
                if declare {
                    out.push(IlStmt::VarDecl(IlVarDecl {
                        name: name.clone(),
                        ty,
                        init: Some(read),
                        is_const,
                        span: *name_span,
                    }));
                } else {
                    out.push(IlStmt::Assign {
                        target: IlExpr::ident(name.clone(), ty, *name_span),
                        op: AssignKind::Simple,
                        value: read,
                        span: *name_span,
                    });
                }
            }
            nested => {
                let temp = self.fresh_temp();
                self.env.declare(&temp, read.ty.clone());
                let temp_ty = read.ty.clone();
                out.push(IlStmt::VarDecl(IlVarDecl {
                    name: temp.clone(),
                    ty: temp_ty.clone(),
                    init: Some(read),
                    is_const: true,
                    span,
                }));
                let temp_ref = IlExpr::ident(temp, temp_ty, span);
                self.bind_pattern(nested, &temp_ref, is_const, declare, span, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::source::{SourceExpr, SourceStmt, VarDeclarator, VarKind};

    fn span() -> Span {
        Span::dummy()
    }

    #[test]
    fn array_pattern_expands_to_indexed_reads() {
        let mut n = Normalizer::new();
        let stmt = SourceStmt::VarDecl {
            kind: VarKind::Let,
            decls: vec![VarDeclarator {
                target: SourcePattern::Array(
                    vec![
                        SourcePattern::Ident("a".into(), span()),
                        SourcePattern::Ident("b".into(), span()),
                    ],
                    span(),
                ),
                init: Some(SourceExpr::Ident("rhs".into(), span())),
                type_annotation: None,
                span: span(),
            }],
            span: span(),
        };
        let lowered = n.stmt(&stmt);
        // temp decl + two element decls
        assert_eq!(lowered.len(), 3);
        match &lowered[1] {
            IlStmt::VarDecl(d) => {
                assert_eq!(d.name, "a");
                assert!(matches!(
                    d.init.as_ref().map(|e| &e.kind),
                    Some(IlExprKind::Subscript { .. })
                ));
            }
            other => panic!("expected var decl, got {:?}", other),
        }
    }

    #[test]
    fn object_pattern_reads_by_key() {
        let mut n = Normalizer::new();
        let stmt = SourceStmt::VarDecl {
            kind: VarKind::Const,
            decls: vec![VarDeclarator {
                target: SourcePattern::Object(
                    vec![("key".to_string(), SourcePattern::Ident("k".into(), span()))],
                    span(),
                ),
                init: Some(SourceExpr::Ident("opts".into(), span())),
                type_annotation: None,
                span: span(),
            }],
            span: span(),
        };
        let lowered = n.stmt(&stmt);
        assert_eq!(lowered.len(), 2);
        match &lowered[1] {
            IlStmt::VarDecl(d) => assert_eq!(d.name, "k"),
            other => panic!("expected var decl, got {:?}", other),
        }
    }
}
