//! The IL type lattice and the numeric join rules used during inference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a typed array / buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum ElemType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Float32,
    Float64,
    BigUint64,
    BigInt64,
}

impl ElemType {
    /// Bit width of one element.
    pub fn bits(&self) -> u32 {
        match self {
            ElemType::Uint8 | ElemType::Int8 => 8,
            ElemType::Uint16 | ElemType::Int16 => 16,
            ElemType::Uint32 | ElemType::Int32 | ElemType::Float32 => 32,
            ElemType::Float64 | ElemType::BigUint64 | ElemType::BigInt64 => 64,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ElemType::Float32 | ElemType::Float64)
    }

    pub fn is_big(&self) -> bool {
        matches!(self, ElemType::BigUint64 | ElemType::BigInt64)
    }
}

/// Result type carried by every IL expression.
///
/// `Any` is the universal fallback; inference only narrows when the Source
/// gives it something to work with (literals, annotations, initializers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IlType {
    Any,
    Bool,
    /// Integer with no declared width (the Source's exact-up-to-2^53 range).
    Int,
    /// Integer masked to 32 bits by a bitwise operation.
    Int32,
    Float,
    Str,
    Bytes,
    BigInt,
    Null,
    Regex,
    List(Box<IlType>),
    Map(Box<IlType>, Box<IlType>),
    Set(Box<IlType>),
    Tuple(Vec<IlType>),
    TypedArray(ElemType),
    Buffer,
    DataView,
    /// Instance of a user-defined class.
    Class(String),
    Func,
    Void,
}

impl IlType {
    pub fn is_integer(&self) -> bool {
        matches!(self, IlType::Int | IlType::Int32 | IlType::BigInt)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            IlType::Int | IlType::Int32 | IlType::Float | IlType::BigInt
        )
    }

    /// Join of two numeric operand types for an arithmetic operator.
    ///
    /// Mixed int/float widens to float; anything involving `Any` stays `Any`
    /// so downstream stages do not over-commit.
    pub fn arithmetic_join(&self, other: &IlType) -> IlType {
        match (self, other) {
            (IlType::BigInt, _) | (_, IlType::BigInt) => IlType::BigInt,
            (IlType::Float, t) | (t, IlType::Float) if t.is_numeric() => IlType::Float,
            (IlType::Int32, IlType::Int32) => IlType::Int32,
            (IlType::Int, t) | (t, IlType::Int) if t.is_integer() => IlType::Int,
            (IlType::Any, _) | (_, IlType::Any) => IlType::Any,
            (a, b) if a == b => a.clone(),
            _ => IlType::Any,
        }
    }

    /// Result type of a 32-bit bitwise operation: always a masked int32,
    /// regardless of operand types.
    pub fn bitwise_join() -> IlType {
        IlType::Int32
    }

    /// Element type, if this is a container with a known element.
    pub fn element(&self) -> Option<IlType> {
        match self {
            IlType::List(e) | IlType::Set(e) => Some((**e).clone()),
            IlType::TypedArray(e) if e.is_float() => Some(IlType::Float),
            IlType::TypedArray(e) if e.is_big() => Some(IlType::BigInt),
            IlType::TypedArray(_) => Some(IlType::Int32),
            IlType::Str => Some(IlType::Str),
            IlType::Bytes => Some(IlType::Int),
            _ => None,
        }
    }
}

impl fmt::Display for IlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IlType::Any => write!(f, "any"),
            IlType::Bool => write!(f, "bool"),
            IlType::Int => write!(f, "int"),
            IlType::Int32 => write!(f, "int32"),
            IlType::Float => write!(f, "float"),
            IlType::Str => write!(f, "str"),
            IlType::Bytes => write!(f, "bytes"),
            IlType::BigInt => write!(f, "bigint"),
            IlType::Null => write!(f, "null"),
            IlType::Regex => write!(f, "regex"),
            IlType::List(e) => write!(f, "list[{}]", e),
            IlType::Map(k, v) => write!(f, "map[{}, {}]", k, v),
            IlType::Set(e) => write!(f, "set[{}]", e),
            IlType::Tuple(ts) => {
                write!(f, "tuple[")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, "]")
            }
            IlType::TypedArray(e) => write!(f, "typedarray[{}]", e.as_ref()),
            IlType::Buffer => write!(f, "buffer"),
            IlType::DataView => write!(f, "dataview"),
            IlType::Class(name) => write!(f, "{}", name),
            IlType::Func => write!(f, "func"),
            IlType::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_int_int_is_int() {
        assert_eq!(IlType::Int.arithmetic_join(&IlType::Int), IlType::Int);
    }

    #[test]
    fn join_mixed_widens_to_float() {
        assert_eq!(IlType::Int.arithmetic_join(&IlType::Float), IlType::Float);
        assert_eq!(IlType::Float.arithmetic_join(&IlType::Int32), IlType::Float);
    }

    #[test]
    fn join_bigint_dominates() {
        assert_eq!(
            IlType::BigInt.arithmetic_join(&IlType::Float),
            IlType::BigInt
        );
    }

    #[test]
    fn typed_array_elements() {
        assert_eq!(
            IlType::TypedArray(ElemType::Uint32).element(),
            Some(IlType::Int32)
        );
        assert_eq!(
            IlType::TypedArray(ElemType::Float64).element(),
            Some(IlType::Float)
        );
    }
}
