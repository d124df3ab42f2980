//! The array-vs-size decision for single-argument typed array construction.
//!
//! `new Uint32Array(x)` either copies an array-like `x` or allocates `x`
//! zeroed elements, and the Source does not mark which. The decision is a
//! priority cascade:
//!
//! 1. IL type annotations (a list-typed argument copies, an int-typed one
//!    sizes): top precedence.
//! 2. Literal shape (an integer literal sizes, a list literal copies).
//! 3. A caller-supplied type oracle, when configured.
//! 4. Identifier-name evidence: size-suggesting name segments, then
//!    array-suggesting suffixes, then array-suggesting segments.
//! 5. Ambiguity defaults to size-based construction.

use recast_core::il::{IlExpr, IlExprKind};
use recast_core::naming::to_snake_case;
use recast_core::types::IlType;

/// How a single typed-array constructor argument should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedArrayArg {
    /// Allocate that many zeroed elements.
    Size,
    /// Copy the elements of an existing array-like.
    Copy,
}

/// Hook for callers that know the real types (tests, annotated pipelines).
pub trait TypeOracle {
    fn classify(&self, identifier: &str) -> Option<TypedArrayArg>;
}

const SIZE_SEGMENTS: &[&str] = &[
    "size", "len", "length", "count", "n", "num", "index", "offset", "bits",
];

const ARRAY_SEGMENTS: &[&str] = &[
    "iv", "key", "keys", "state", "block", "data", "buffer", "bytes", "array", "input", "output",
    "sbox", "constants", "schedule",
];

const ARRAY_SUFFIXES: &[&str] = &["values", "keys", "data"];

pub fn classify_typed_array_arg(
    arg: &IlExpr,
    oracle: Option<&dyn TypeOracle>,
) -> TypedArrayArg {
    // 1. IL annotations outrank every name-based guess.
    match &arg.ty {
        IlType::List(_)
        | IlType::TypedArray(_)
        | IlType::Bytes
        | IlType::Tuple(_)
        | IlType::Set(_) => return TypedArrayArg::Copy,
        IlType::Int | IlType::Int32 => return TypedArrayArg::Size,
        _ => {}
    }
    // 2. Literal shape.
    match &arg.kind {
        IlExprKind::Literal(_) => return TypedArrayArg::Size,
        IlExprKind::ListLit(_) | IlExprKind::TypedArrayCreation { .. } => {
            return TypedArrayArg::Copy
        }
        _ => {}
    }
    let name = match &arg.kind {
        IlExprKind::Ident(name) => name.as_str(),
        IlExprKind::ThisPropertyAccess { property } => property.as_str(),
        IlExprKind::Member { name, .. } => name.as_str(),
        _ => return TypedArrayArg::Size,
    };
    // 3. Oracle.
    if let Some(oracle) = oracle {
        if let Some(answer) = oracle.classify(name) {
            return answer;
        }
    }
    // 4. Name evidence on snake segments.
    let snake = to_snake_case(name);
    let segments: Vec<&str> = snake.split('_').filter(|s| !s.is_empty()).collect();
    if segments
        .iter()
        .any(|segment| SIZE_SEGMENTS.contains(segment))
    {
        return TypedArrayArg::Size;
    }
    if let Some(last) = segments.last() {
        if ARRAY_SUFFIXES.contains(last) {
            return TypedArrayArg::Copy;
        }
    }
    if segments
        .iter()
        .any(|segment| ARRAY_SEGMENTS.contains(segment) || segment.starts_with("round"))
    {
        return TypedArrayArg::Copy;
    }
    // 5. Default.
    TypedArrayArg::Size
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::span::Span;

    fn ident(name: &str, ty: IlType) -> IlExpr {
        IlExpr::ident(name, ty, Span::dummy())
    }

    #[test]
    fn annotations_take_precedence() {
        let typed = ident("mystery", IlType::List(Box::new(IlType::Int)));
        assert_eq!(classify_typed_array_arg(&typed, None), TypedArrayArg::Copy);
        let sized = ident("IV", IlType::Int);
        assert_eq!(classify_typed_array_arg(&sized, None), TypedArrayArg::Size);
    }

    #[test]
    fn literals_are_sizes() {
        let lit = IlExpr::int(16, Span::dummy());
        assert_eq!(classify_typed_array_arg(&lit, None), TypedArrayArg::Size);
    }

    #[test]
    fn array_names_copy() {
        for name in ["IV", "roundKeys", "sbox", "inputData", "keySchedule"] {
            let e = ident(name, IlType::Any);
            assert_eq!(
                classify_typed_array_arg(&e, None),
                TypedArrayArg::Copy,
                "{} should copy",
                name
            );
        }
    }

    #[test]
    fn size_names_win_over_array_substrings() {
        for name in ["keySize", "blockLength", "byteCount", "outputOffset"] {
            let e = ident(name, IlType::Any);
            assert_eq!(
                classify_typed_array_arg(&e, None),
                TypedArrayArg::Size,
                "{} should size",
                name
            );
        }
    }

    #[test]
    fn ambiguity_defaults_to_size() {
        let e = ident("thing", IlType::Any);
        assert_eq!(classify_typed_array_arg(&e, None), TypedArrayArg::Size);
    }

    #[test]
    fn oracle_overrides_names() {
        struct Always(TypedArrayArg);
        impl TypeOracle for Always {
            fn classify(&self, _identifier: &str) -> Option<TypedArrayArg> {
                Some(self.0)
            }
        }
        let e = ident("keySize", IlType::Any);
        assert_eq!(
            classify_typed_array_arg(&e, Some(&Always(TypedArrayArg::Copy))),
            TypedArrayArg::Copy
        );
    }
}
