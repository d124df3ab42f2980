//! Class normalization: member lowering plus constructor field discovery.

use super::Normalizer;
use recast_core::il::{
    AssignKind, IlClass, IlExprKind, IlField, IlLiteral, IlMethod, IlStmt, MethodKind,
};
use recast_core::source::{ClassDef, ClassMember, MemberKind, SourceExpr};
use recast_core::types::IlType;

impl Normalizer {
    pub(crate) fn class(&mut self, class: &ClassDef) -> IlClass {
        self.class_names.insert(class.name.clone());
        let superclass = match &class.superclass {
            Some(SourceExpr::Ident(name, _)) => Some(name.clone()),
            Some(other) => {
                self.warnings
                    .warn("non-identifier superclass expression", Some(other.span()));
                None
            }
            None => None,
        };

        let mut fields: Vec<IlField> = Vec::new();
        let mut methods: Vec<IlMethod> = Vec::new();
        let mut static_block = None;
        let mut doc = None;

        for member in &class.members {
            match member.kind {
                MemberKind::Field => {
                    let init = member.value.as_ref().map(|v| self.expr(v));
                    let ty = init.as_ref().map(|e| e.ty.clone()).unwrap_or(IlType::Any);
                    fields.push(IlField {
                        name: member.key.clone(),
                        ty,
                        init,
                        is_static: member.is_static,
                        span: member.span,
                    });
                }
                MemberKind::StaticBlock => {
                    if let Some(f) = &member.function {
                        static_block = Some(self.block(&f.body));
                    }
                }
                MemberKind::Constructor
                | MemberKind::Method
                | MemberKind::Getter
                | MemberKind::Setter => {
                    if let Some(method) = self.method(member, &mut fields, &mut doc) {
                        methods.push(method);
                    }
                }
            }
        }

        IlClass {
            name: class.name.clone(),
            superclass,
            fields,
            methods,
            static_block,
            doc,
            span: class.span,
        }
    }

    fn method(
        &mut self,
        member: &ClassMember,
        fields: &mut Vec<IlField>,
        doc: &mut Option<String>,
    ) -> Option<IlMethod> {
        let function = match &member.function {
            Some(f) => f,
            None => {
                self.warnings
                    .warn("class member without a body", Some(member.span));
                return None;
            }
        };
        let kind = match member.kind {
            MemberKind::Constructor => MethodKind::Constructor,
            MemberKind::Getter => MethodKind::Getter,
            MemberKind::Setter => MethodKind::Setter,
            _ => MethodKind::Method,
        };
        let mut func = self.function(function);
        func.name = member.key.clone();

        // Constructor assignments of the form `this.x = …` declare the
        // instance fields; the assignment itself stays in the body.
        if kind == MethodKind::Constructor {
            for stmt in &func.body {
                if let IlStmt::Assign {
                    target,
                    op: AssignKind::Simple,
                    value,
                    ..
                } = stmt
                {
                    if let IlExprKind::ThisPropertyAccess { property } = &target.kind {
                        if property == "description" {
                            if let IlExprKind::Literal(IlLiteral::Str(text)) = &value.kind {
                                *doc = Some(text.clone());
                            }
                        }
                        if !fields.iter().any(|f| f.name == *property) {
                            fields.push(IlField {
                                name: property.clone(),
                                ty: value.ty.clone(),
                                init: None,
                                is_static: false,
                                span: target.span,
                            });
                        }
                    }
                }
            }
        }

        Some(IlMethod {
            name: member.key.clone(),
            kind,
            is_static: member.is_static,
            func,
            span: member.span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::source::{
        AssignTarget, FunctionDef, SourceAssignOp, SourceStmt,
    };
    use recast_core::span::Span;
    use recast_core::types::IlType;

    fn span() -> Span {
        Span::dummy()
    }

    fn ctor_assign(prop: &str, value: SourceExpr) -> SourceStmt {
        SourceStmt::Expr {
            expr: SourceExpr::Assign {
                op: SourceAssignOp::Assign,
                target: AssignTarget::Expr(Box::new(SourceExpr::Member {
                    object: Box::new(SourceExpr::This(span())),
                    property: prop.to_string(),
                    span: span(),
                })),
                value: Box::new(value),
                span: span(),
            },
            span: span(),
        }
    }

    #[test]
    fn constructor_assignments_declare_fields() {
        let class = ClassDef {
            name: "Cipher".to_string(),
            superclass: None,
            members: vec![ClassMember {
                kind: MemberKind::Constructor,
                key: "constructor".to_string(),
                is_static: false,
                function: Some(FunctionDef {
                    name: None,
                    params: vec![],
                    body: vec![
                        ctor_assign("rounds", SourceExpr::Num(16.0, span())),
                        ctor_assign("description", SourceExpr::Str("A cipher.".into(), span())),
                    ],
                    is_arrow: false,
                    span: span(),
                }),
                value: None,
                span: span(),
            }],
            span: span(),
        };
        let mut n = Normalizer::new();
        let il = n.class(&class);
        assert_eq!(il.fields.len(), 2);
        assert_eq!(il.fields[0].name, "rounds");
        assert_eq!(il.fields[0].ty, IlType::Int);
        assert_eq!(il.doc.as_deref(), Some("A cipher."));
        // The assignments stay in the constructor body.
        let ctor = &il.methods[0];
        assert_eq!(ctor.kind, MethodKind::Constructor);
        assert_eq!(ctor.func.body.len(), 2);
    }
}
