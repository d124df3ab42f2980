//! Platform-library call mapping.
//!
//! Every call against the host platform's library (`Math.*`, `Array.*`,
//! `Object.*`, `String.*`, `Number.*`, `JSON.*`, `Date.*`), the Source's
//! bit-twiddling helper namespace, and the recognized instance methods must
//! land on a closed IL op here; nothing passes through as a generic call
//! against a platform name.

use recast_core::il::{
    ArrayOp, ConvertOp, Endianness, IlBinaryOp, IlExpr, IlExprKind, IlLiteral, JsonOp, MathConst,
    MathOp, NumberConst, ObjectOp, RotateDir, StringOp,
};
use recast_core::span::Span;
use recast_core::types::IlType;

/// Namespaces whose members must never survive into IL.
pub const PLATFORM_NAMESPACES: &[&str] = &[
    "Math", "Array", "Object", "String", "Number", "JSON", "Date",
];

fn expr(kind: IlExprKind, ty: IlType, span: Span) -> IlExpr {
    IlExpr::new(kind, ty, span)
}

// ── Namespace calls: Math.floor(x), Object.keys(o), … ──

/// Map `Namespace.method(args)`. Returns the args on failure so the caller
/// can degrade to a placeholder.
pub fn namespace_call(
    ns: &str,
    method: &str,
    args: Vec<IlExpr>,
    span: Span,
) -> Result<IlExpr, Vec<IlExpr>> {
    match ns {
        "Math" => math_call(method, args, span),
        "Array" => match method {
            "isArray" => {
                let mut args = args;
                if args.len() == 1 {
                    Ok(expr(
                        IlExprKind::IsArrayCheck(Box::new(args.remove(0))),
                        IlType::Bool,
                        span,
                    ))
                } else {
                    Err(args)
                }
            }
            "from" => {
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (Some(source), mapper) => Ok(expr(
                        IlExprKind::ArrayFrom {
                            source: Box::new(source),
                            mapper: mapper.map(Box::new),
                        },
                        IlType::List(Box::new(IlType::Any)),
                        span,
                    )),
                    _ => Err(vec![]),
                }
            }
            "of" => Ok(expr(
                IlExprKind::ListLit(args),
                IlType::List(Box::new(IlType::Any)),
                span,
            )),
            _ => Err(args),
        },
        "Object" => {
            let op = match method {
                "freeze" => ObjectOp::Freeze,
                "keys" => ObjectOp::Keys,
                "values" => ObjectOp::Values,
                "entries" => ObjectOp::Entries,
                "create" => ObjectOp::Create,
                _ => return Err(args),
            };
            let ty = match op {
                ObjectOp::Freeze | ObjectOp::Create => {
                    args.first().map(|a| a.ty.clone()).unwrap_or(IlType::Any)
                }
                _ => IlType::List(Box::new(IlType::Any)),
            };
            Ok(expr(IlExprKind::ObjectOp { op, args }, ty, span))
        }
        "String" => match method {
            "fromCharCode" | "fromCodePoint" => Ok(expr(
                IlExprKind::StringOp {
                    op: StringOp::FromCharCodes,
                    recv: None,
                    args,
                },
                IlType::Str,
                span,
            )),
            _ => Err(args),
        },
        "Number" => match method {
            "isInteger" | "isSafeInteger" => {
                let mut args = args;
                if args.len() == 1 {
                    Ok(expr(
                        IlExprKind::IsIntegerCheck(Box::new(args.remove(0))),
                        IlType::Bool,
                        span,
                    ))
                } else {
                    Err(args)
                }
            }
            // NaN is the only value that differs from itself.
            "isNaN" => {
                let mut args = args;
                if args.len() == 1 {
                    let arg = args.remove(0);
                    Ok(expr(
                        IlExprKind::Binary {
                            op: IlBinaryOp::NotEq,
                            left: Box::new(arg.clone()),
                            right: Box::new(arg),
                        },
                        IlType::Bool,
                        span,
                    ))
                } else {
                    Err(args)
                }
            }
            _ => Err(args),
        },
        "JSON" => {
            let op = match method {
                "stringify" => JsonOp::Stringify,
                "parse" => JsonOp::Parse,
                _ => return Err(args),
            };
            let ty = match op {
                JsonOp::Stringify => IlType::Str,
                JsonOp::Parse => IlType::Any,
            };
            Ok(expr(IlExprKind::JsonOp { op, args }, ty, span))
        }
        "Date" => match method {
            "now" => Ok(expr(IlExprKind::DateNow, IlType::Int, span)),
            _ => Err(args),
        },
        _ => Err(args),
    }
}

fn math_call(method: &str, args: Vec<IlExpr>, span: Span) -> Result<IlExpr, Vec<IlExpr>> {
    let op = match method {
        "sin" => MathOp::Sin,
        "cos" => MathOp::Cos,
        "tan" => MathOp::Tan,
        "asin" => MathOp::Asin,
        "acos" => MathOp::Acos,
        "atan" => MathOp::Atan,
        "atan2" => MathOp::Atan2,
        "sinh" => MathOp::Sinh,
        "cosh" => MathOp::Cosh,
        "tanh" => MathOp::Tanh,
        "exp" => MathOp::Exp,
        "log" => MathOp::Log,
        "log2" => MathOp::Log2,
        "log10" => MathOp::Log10,
        "pow" => MathOp::Pow,
        "floor" => MathOp::Floor,
        "ceil" => MathOp::Ceil,
        "round" => MathOp::Round,
        "abs" => MathOp::Abs,
        "sqrt" => MathOp::Sqrt,
        "cbrt" => MathOp::Cbrt,
        "hypot" => MathOp::Hypot,
        "min" => MathOp::Min,
        "max" => MathOp::Max,
        "sign" => MathOp::Sign,
        "trunc" => MathOp::Trunc,
        "random" => MathOp::Random,
        "imul" => MathOp::Imul,
        "clz32" => MathOp::Clz32,
        _ => return Err(args),
    };
    let ty = math_result_type(op, &args);
    Ok(expr(IlExprKind::MathOp { op, args }, ty, span))
}

fn math_result_type(op: MathOp, args: &[IlExpr]) -> IlType {
    match op {
        MathOp::Floor | MathOp::Ceil | MathOp::Round | MathOp::Trunc | MathOp::Sign => IlType::Int,
        MathOp::Imul | MathOp::Clz32 => IlType::Int32,
        MathOp::Abs | MathOp::Min | MathOp::Max | MathOp::Pow => {
            if args.iter().all(|a| a.ty.is_integer()) && !args.is_empty() {
                args.iter()
                    .fold(IlType::Int, |acc, a| acc.arithmetic_join(&a.ty))
            } else {
                IlType::Float
            }
        }
        _ => IlType::Float,
    }
}

// ── Namespace members: Math.PI, Number.MAX_SAFE_INTEGER ──

pub fn namespace_member(ns: &str, prop: &str, span: Span) -> Option<IlExpr> {
    match ns {
        "Math" => {
            let c = match prop {
                "PI" => MathConst::Pi,
                "E" => MathConst::E,
                "LN2" => MathConst::Ln2,
                "LN10" => MathConst::Ln10,
                "LOG2E" => MathConst::Log2E,
                "LOG10E" => MathConst::Log10E,
                "SQRT2" => MathConst::Sqrt2,
                "SQRT1_2" => MathConst::Sqrt1_2,
                _ => return None,
            };
            Some(expr(IlExprKind::MathConstant(c), IlType::Float, span))
        }
        "Number" => {
            let c = match prop {
                "MAX_SAFE_INTEGER" => NumberConst::MaxSafeInteger,
                "MIN_SAFE_INTEGER" => NumberConst::MinSafeInteger,
                "MAX_VALUE" => NumberConst::MaxValue,
                "MIN_VALUE" => NumberConst::MinValue,
                "EPSILON" => NumberConst::Epsilon,
                "POSITIVE_INFINITY" => NumberConst::PositiveInfinity,
                "NEGATIVE_INFINITY" => NumberConst::NegativeInfinity,
                "NaN" => NumberConst::NaN,
                _ => return None,
            };
            let ty = match c {
                NumberConst::MaxSafeInteger | NumberConst::MinSafeInteger => IlType::Int,
                _ => IlType::Float,
            };
            Some(expr(IlExprKind::NumberConstant(c), ty, span))
        }
        _ => None,
    }
}

// ── The Source's helper namespace (rotation/packing intrinsics) ──

/// Map `OpCodes.RotL32(x, n)`-style helper calls onto IL primitives. The
/// names left unmapped (array copy, xor) stay as plain calls; the prelude
/// carries them verbatim.
pub fn opcodes_call(method: &str, args: Vec<IlExpr>, span: Span) -> Result<IlExpr, Vec<IlExpr>> {
    let rotate = |dir: RotateDir, bits: u32, args: Vec<IlExpr>| -> Result<IlExpr, Vec<IlExpr>> {
        let [value, amount] = <[IlExpr; 2]>::try_from(args)?;
        Ok(expr(
            IlExprKind::Rotate {
                dir,
                value: Box::new(value),
                amount: Box::new(amount),
                bits,
            },
            if bits == 64 { IlType::BigInt } else { IlType::Int32 },
            span,
        ))
    };
    let pack = |bits: u32, endian: Endianness, args: Vec<IlExpr>| -> Result<IlExpr, Vec<IlExpr>> {
        if args.len() as u32 != bits / 8 {
            return Err(args);
        }
        Ok(expr(
            IlExprKind::PackBytes {
                parts: args,
                bits,
                endian,
            },
            IlType::Int32,
            span,
        ))
    };
    let unpack = |bits: u32, endian: Endianness, args: Vec<IlExpr>| -> Result<IlExpr, Vec<IlExpr>> {
        let [value] = <[IlExpr; 1]>::try_from(args)?;
        Ok(expr(
            IlExprKind::UnpackBytes {
                value: Box::new(value),
                bits,
                endian,
            },
            IlType::List(Box::new(IlType::Int)),
            span,
        ))
    };
    let convert = |op: ConvertOp, args: Vec<IlExpr>, ty: IlType| -> Result<IlExpr, Vec<IlExpr>> {
        if args.len() != 1 {
            return Err(args);
        }
        Ok(expr(IlExprKind::ConvertOp { op, args }, ty, span))
    };

    match method {
        "RotL8" => rotate(RotateDir::Left, 8, args),
        "RotR8" => rotate(RotateDir::Right, 8, args),
        "RotL16" => rotate(RotateDir::Left, 16, args),
        "RotR16" => rotate(RotateDir::Right, 16, args),
        "RotL32" => rotate(RotateDir::Left, 32, args),
        "RotR32" => rotate(RotateDir::Right, 32, args),
        "RotL64" => rotate(RotateDir::Left, 64, args),
        "RotR64" => rotate(RotateDir::Right, 64, args),
        "Pack16BE" => pack(16, Endianness::Big, args),
        "Pack16LE" => pack(16, Endianness::Little, args),
        "Pack32BE" => pack(32, Endianness::Big, args),
        "Pack32LE" => pack(32, Endianness::Little, args),
        "Unpack16BE" => unpack(16, Endianness::Big, args),
        "Unpack16LE" => unpack(16, Endianness::Little, args),
        "Unpack32BE" => unpack(32, Endianness::Big, args),
        "Unpack32LE" => unpack(32, Endianness::Little, args),
        "Hex8ToBytes" => convert(ConvertOp::HexDecode, args, IlType::Bytes),
        "BytesToHex8" => convert(ConvertOp::HexEncode, args, IlType::Str),
        "StringToBytes" | "AnsiToBytes" => convert(ConvertOp::StringToBytes, args, IlType::Bytes),
        "BytesToString" => convert(ConvertOp::BytesToString, args, IlType::Str),
        _ => Err(args),
    }
}

// ── Instance method calls ──

fn array_method(name: &str) -> Option<ArrayOp> {
    Some(match name {
        "push" => ArrayOp::Append,
        "pop" => ArrayOp::Pop,
        "shift" => ArrayOp::Shift,
        "unshift" => ArrayOp::Unshift,
        "fill" => ArrayOp::Fill,
        "join" => ArrayOp::Join,
        "reverse" => ArrayOp::Reverse,
        "sort" => ArrayOp::Sort,
        "splice" => ArrayOp::Splice,
        "map" => ArrayOp::Map,
        "filter" => ArrayOp::Filter,
        "reduce" => ArrayOp::Reduce,
        "forEach" => ArrayOp::ForEach,
        "some" => ArrayOp::Some,
        "every" => ArrayOp::Every,
        "find" => ArrayOp::Find,
        "findIndex" => ArrayOp::FindIndex,
        _ => return None,
    })
}

fn string_method(name: &str) -> Option<StringOp> {
    Some(match name {
        "replace" | "replaceAll" => StringOp::Replace,
        "repeat" => StringOp::Repeat,
        "split" => StringOp::Split,
        "substring" | "substr" => StringOp::Substring,
        "charAt" => StringOp::CharAt,
        "charCodeAt" | "codePointAt" => StringOp::CharCodeAt,
        "toUpperCase" => StringOp::ToUpper,
        "toLowerCase" => StringOp::ToLower,
        "trim" => StringOp::Trim,
        "startsWith" => StringOp::StartsWith,
        "endsWith" => StringOp::EndsWith,
        _ => return None,
    })
}

/// Methods whose name exists on both strings and arrays; the receiver type
/// breaks the tie, `Any` defaulting to the array reading.
fn shared_method(name: &str, string_like: bool) -> Option<MethodOp> {
    Some(match (name, string_like) {
        ("indexOf", true) => MethodOp::Str(StringOp::IndexOf),
        ("indexOf", false) => MethodOp::Arr(ArrayOp::IndexOf),
        ("includes", true) => MethodOp::Str(StringOp::Includes),
        ("includes", false) => MethodOp::Arr(ArrayOp::Includes),
        ("concat", true) => MethodOp::Str(StringOp::Concat),
        ("concat", false) => MethodOp::Arr(ArrayOp::Concat),
        ("slice", true) => MethodOp::Str(StringOp::Substring),
        ("slice", false) => MethodOp::Arr(ArrayOp::Slice),
        _ => return None,
    })
}

enum MethodOp {
    Arr(ArrayOp),
    Str(StringOp),
}

fn is_string_like(ty: &IlType) -> bool {
    matches!(ty, IlType::Str)
}

fn array_result_type(op: ArrayOp, recv: &IlExpr) -> IlType {
    let elem = recv.ty.element().unwrap_or(IlType::Any);
    match op {
        ArrayOp::Length | ArrayOp::Append | ArrayOp::Unshift | ArrayOp::IndexOf
        | ArrayOp::FindIndex => IlType::Int,
        ArrayOp::Pop | ArrayOp::Shift | ArrayOp::Find => elem,
        ArrayOp::Includes | ArrayOp::Some | ArrayOp::Every => IlType::Bool,
        ArrayOp::Join => IlType::Str,
        ArrayOp::ForEach | ArrayOp::Clear => IlType::Void,
        ArrayOp::Reduce => IlType::Any,
        ArrayOp::Map | ArrayOp::Filter | ArrayOp::Slice | ArrayOp::Concat | ArrayOp::Splice => {
            IlType::List(Box::new(elem))
        }
        ArrayOp::Fill | ArrayOp::Reverse | ArrayOp::Sort => recv.ty.clone(),
    }
}

fn string_result_type(op: StringOp) -> IlType {
    match op {
        StringOp::IndexOf | StringOp::CharCodeAt => IlType::Int,
        StringOp::StartsWith | StringOp::EndsWith | StringOp::Includes => IlType::Bool,
        StringOp::Split => IlType::List(Box::new(IlType::Str)),
        _ => IlType::Str,
    }
}

/// Map a recognized instance method call; returns receiver and args back
/// when the name is not in any table.
pub fn method_call(
    recv: IlExpr,
    method: &str,
    args: Vec<IlExpr>,
    span: Span,
) -> Result<IlExpr, (IlExpr, Vec<IlExpr>)> {
    if matches!(recv.ty, IlType::DataView) {
        if let Some(read) = dataview_get(&recv, method, &args, span) {
            return Ok(read);
        }
    }
    let string_like = is_string_like(&recv.ty);
    if let Some(op) = string_method(method) {
        let ty = string_result_type(op);
        return Ok(expr(
            IlExprKind::StringOp {
                op,
                recv: Some(Box::new(recv)),
                args,
            },
            ty,
            span,
        ));
    }
    if let Some(op) = array_method(method) {
        let ty = array_result_type(op, &recv);
        return Ok(expr(
            IlExprKind::ArrayOp {
                op,
                recv: Box::new(recv),
                args,
            },
            ty,
            span,
        ));
    }
    if let Some(shared) = shared_method(method, string_like) {
        return Ok(match shared {
            MethodOp::Arr(op) => {
                let ty = array_result_type(op, &recv);
                expr(
                    IlExprKind::ArrayOp {
                        op,
                        recv: Box::new(recv),
                        args,
                    },
                    ty,
                    span,
                )
            }
            MethodOp::Str(op) => {
                let ty = string_result_type(op);
                expr(
                    IlExprKind::StringOp {
                        op,
                        recv: Some(Box::new(recv)),
                        args,
                    },
                    ty,
                    span,
                )
            }
        });
    }
    Err((recv, args))
}

// ── DataView accessors ──

fn dataview_endian(args: &[IlExpr], flag_index: usize) -> Endianness {
    match args.get(flag_index).map(|a| &a.kind) {
        Some(IlExprKind::Literal(IlLiteral::Bool(true))) => Endianness::Little,
        _ => Endianness::Big,
    }
}

fn offset_plus(offset: &IlExpr, delta: i64, span: Span) -> IlExpr {
    if delta == 0 {
        return offset.clone();
    }
    if let Some(base) = offset.as_int_literal() {
        return IlExpr::int(base + delta, span);
    }
    expr(
        IlExprKind::Binary {
            op: IlBinaryOp::Add,
            left: Box::new(offset.clone()),
            right: Box::new(IlExpr::int(delta, span)),
        },
        IlType::Int,
        span,
    )
}

/// `dv.getUint32(off, le)` reads bytes into an integer: `PackBytes` over the
/// view's bytes at `off`.
fn dataview_get(recv: &IlExpr, method: &str, args: &[IlExpr], span: Span) -> Option<IlExpr> {
    let bits: u32 = match method {
        "getUint8" | "getInt8" => 8,
        "getUint16" | "getInt16" => 16,
        "getUint32" | "getInt32" => 32,
        "getBigUint64" | "getBigInt64" => 64,
        _ => return None,
    };
    let offset = args.first()?;
    if bits == 8 {
        return Some(expr(
            IlExprKind::Subscript {
                object: Box::new(recv.clone()),
                index: Box::new(offset.clone()),
            },
            IlType::Int,
            span,
        ));
    }
    let endian = dataview_endian(args, 1);
    let parts = (0..(bits / 8) as i64)
        .map(|i| {
            expr(
                IlExprKind::Subscript {
                    object: Box::new(recv.clone()),
                    index: Box::new(offset_plus(offset, i, span)),
                },
                IlType::Int,
                span,
            )
        })
        .collect();
    let ty = if bits == 64 { IlType::BigInt } else { IlType::Int32 };
    Some(expr(
        IlExprKind::PackBytes {
            parts,
            bits,
            endian,
        },
        ty,
        span,
    ))
}

/// `dv.setUint32(off, v, le)` writes an integer's bytes: an assignment of
/// `UnpackBytes` into the view slice. Only meaningful in statement position.
pub fn dataview_set(
    recv: IlExpr,
    method: &str,
    args: Vec<IlExpr>,
    span: Span,
) -> Result<(IlExpr, IlExpr), Vec<IlExpr>> {
    let bits: u32 = match method {
        "setUint8" | "setInt8" => 8,
        "setUint16" | "setInt16" => 16,
        "setUint32" | "setInt32" => 32,
        "setBigUint64" | "setBigInt64" => 64,
        _ => return Err(args),
    };
    if args.len() < 2 {
        return Err(args);
    }
    let endian = dataview_endian(&args, 2);
    let mut args = args;
    let value = args.remove(1);
    let offset = args.remove(0);
    if bits == 8 {
        let target = expr(
            IlExprKind::Subscript {
                object: Box::new(recv),
                index: Box::new(offset),
            },
            IlType::Int,
            span,
        );
        return Ok((target, value));
    }
    let width = (bits / 8) as i64;
    let end = offset_plus(&offset, width, span);
    let target = expr(
        IlExprKind::Slice {
            object: Box::new(recv),
            start: Some(Box::new(offset)),
            end: Some(Box::new(end)),
        },
        IlType::Bytes,
        span,
    );
    let value = expr(
        IlExprKind::UnpackBytes {
            value: Box::new(value),
            bits,
            endian,
        },
        IlType::Bytes,
        span,
    );
    Ok((target, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, ty: IlType) -> IlExpr {
        IlExpr::ident(name, ty, Span::dummy())
    }

    #[test]
    fn math_floor_maps_to_int_typed_op() {
        let mapped = namespace_call(
            "Math",
            "floor",
            vec![ident("x", IlType::Float)],
            Span::dummy(),
        )
        .expect("mapped");
        assert!(matches!(
            mapped.kind,
            IlExprKind::MathOp {
                op: MathOp::Floor,
                ..
            }
        ));
        assert_eq!(mapped.ty, IlType::Int);
    }

    #[test]
    fn unknown_math_name_returns_args() {
        let err = namespace_call("Math", "frobnicate", vec![], Span::dummy());
        assert!(err.is_err());
    }

    #[test]
    fn shared_methods_split_on_receiver_type() {
        let on_str = method_call(
            ident("s", IlType::Str),
            "slice",
            vec![IlExpr::int(1, Span::dummy())],
            Span::dummy(),
        )
        .expect("string slice");
        assert!(matches!(
            on_str.kind,
            IlExprKind::StringOp {
                op: StringOp::Substring,
                ..
            }
        ));

        let on_any = method_call(
            ident("a", IlType::Any),
            "slice",
            vec![],
            Span::dummy(),
        )
        .expect("array slice");
        assert!(matches!(
            on_any.kind,
            IlExprKind::ArrayOp {
                op: ArrayOp::Slice,
                ..
            }
        ));
    }

    #[test]
    fn opcodes_rotl_becomes_rotate() {
        let mapped = opcodes_call(
            "RotL32",
            vec![ident("x", IlType::Int32), IlExpr::int(7, Span::dummy())],
            Span::dummy(),
        )
        .expect("rotate");
        assert!(matches!(
            mapped.kind,
            IlExprKind::Rotate {
                dir: RotateDir::Left,
                bits: 32,
                ..
            }
        ));
    }

    #[test]
    fn dataview_set_produces_slice_target() {
        let dv = ident("view", IlType::DataView);
        let (target, value) = dataview_set(
            dv,
            "setUint32",
            vec![
                IlExpr::int(4, Span::dummy()),
                ident("word", IlType::Int32),
                IlExpr::literal(IlLiteral::Bool(true), Span::dummy()),
            ],
            Span::dummy(),
        )
        .expect("set");
        assert!(matches!(target.kind, IlExprKind::Slice { .. }));
        assert!(matches!(
            value.kind,
            IlExprKind::UnpackBytes {
                bits: 32,
                endian: Endianness::Little,
                ..
            }
        ));
    }
}
