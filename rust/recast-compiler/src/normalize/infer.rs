//! Identifier type tracking and annotation parsing.

use recast_core::il::{IlExpr, IlStmt};
use recast_core::types::{ElemType, IlType};
use std::collections::HashMap;

/// Lexically scoped identifier → type map. Pushed per function body and per
/// block that introduces bindings; lookup walks outward.
#[derive(Debug, Default)]
pub struct TypeEnv {
    scopes: Vec<HashMap<String, IlType>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
        if self.scopes.is_empty() {
            self.scopes.push(HashMap::new());
        }
    }

    pub fn declare(&mut self, name: &str, ty: IlType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    pub fn lookup(&self, name: &str) -> IlType {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.get(name) {
                return ty.clone();
            }
        }
        IlType::Any
    }
}

/// Parse a parser-supplied annotation string into an IL type. The annotation
/// vocabulary is the loose one found in Source doc comments, so unknown
/// spellings fall back to `Any`.
pub fn parse_annotation(text: &str) -> IlType {
    match text.trim().to_ascii_lowercase().as_str() {
        "number" | "float" | "double" => IlType::Float,
        "int" | "integer" => IlType::Int,
        "uint32" | "u32" | "int32" | "i32" | "dword" => IlType::Int32,
        "string" | "str" => IlType::Str,
        "bool" | "boolean" => IlType::Bool,
        "bigint" => IlType::BigInt,
        "bytes" | "bytearray" | "uint8array" => IlType::TypedArray(ElemType::Uint8),
        "uint16array" => IlType::TypedArray(ElemType::Uint16),
        "uint32array" => IlType::TypedArray(ElemType::Uint32),
        "array" | "list" => IlType::List(Box::new(IlType::Any)),
        "object" | "map" | "dict" => IlType::Map(Box::new(IlType::Str), Box::new(IlType::Any)),
        "null" | "void" => IlType::Null,
        _ => IlType::Any,
    }
}

/// Unify two branch types: equal types stand, everything else decays to
/// `Any` (inference never guesses across control flow).
pub fn unify(a: &IlType, b: &IlType) -> IlType {
    if a == b {
        a.clone()
    } else if a.is_numeric() && b.is_numeric() {
        a.arithmetic_join(b)
    } else {
        IlType::Any
    }
}

/// Shallow return-type inference: unify the types of every `return` value in
/// a body. Bodies that never return a value infer `Void`.
pub fn infer_return_type(body: &[IlStmt]) -> IlType {
    let mut found: Option<IlType> = None;
    collect_returns(body, &mut found);
    found.unwrap_or(IlType::Void)
}

fn collect_returns(body: &[IlStmt], found: &mut Option<IlType>) {
    for stmt in body {
        match stmt {
            IlStmt::Return {
                value: Some(expr), ..
            } => {
                merge_return(found, expr);
            }
            IlStmt::Return { value: None, .. } => {
                merge_type(found, IlType::Null);
            }
            IlStmt::If {
                then_body,
                else_body,
                ..
            } => {
                collect_returns(then_body, found);
                if let Some(else_body) = else_body {
                    collect_returns(else_body, found);
                }
            }
            IlStmt::For { body, .. }
            | IlStmt::ForEach { body, .. }
            | IlStmt::While { body, .. }
            | IlStmt::DoWhile { body, .. }
            | IlStmt::Block(body, _) => collect_returns(body, found),
            IlStmt::Switch { cases, default, .. } => {
                for case in cases {
                    collect_returns(&case.body, found);
                }
                if let Some(default) = default {
                    collect_returns(default, found);
                }
            }
            IlStmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                collect_returns(body, found);
                if let Some(c) = catch {
                    collect_returns(&c.body, found);
                }
                if let Some(f) = finally {
                    collect_returns(f, found);
                }
            }
            _ => {}
        }
    }
}

fn merge_return(found: &mut Option<IlType>, expr: &IlExpr) {
    merge_type(found, expr.ty.clone());
}

fn merge_type(found: &mut Option<IlType>, ty: IlType) {
    *found = Some(match found.take() {
        Some(prev) => unify(&prev, &ty),
        None => ty,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotations_cover_width_spellings() {
        assert_eq!(parse_annotation("uint32"), IlType::Int32);
        assert_eq!(parse_annotation("Number"), IlType::Float);
        assert_eq!(parse_annotation("mystery"), IlType::Any);
    }

    #[test]
    fn env_scoping_shadows_and_restores() {
        let mut env = TypeEnv::new();
        env.declare("x", IlType::Int);
        env.push();
        env.declare("x", IlType::Str);
        assert_eq!(env.lookup("x"), IlType::Str);
        env.pop();
        assert_eq!(env.lookup("x"), IlType::Int);
    }

    #[test]
    fn unify_mixed_numeric() {
        assert_eq!(unify(&IlType::Int, &IlType::Float), IlType::Float);
        assert_eq!(unify(&IlType::Str, &IlType::Int), IlType::Any);
    }
}
