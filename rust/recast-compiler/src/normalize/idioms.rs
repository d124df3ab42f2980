//! Bit-twiddling idiom recognition.
//!
//! Rotation and byte-packing expressions are folded into single IL
//! primitives here so every backend gets the width and endianness for free
//! instead of re-deriving them from shift arithmetic.

use recast_core::il::{Endianness, IlBinaryOp, IlExpr, IlExprKind, RotateDir};
use recast_core::span::Span;
use recast_core::types::IlType;

/// Widths a rotation idiom may target.
const ROTATE_WIDTHS: [i64; 4] = [8, 16, 32, 64];

/// Recognize `(x << n) | (x >>> (W - n))` and its mirror as a rotation.
///
/// Accepts both the subtraction form (`W - n`) and the pre-computed literal
/// complement (`x << 7 | x >>> 25`), and tolerates `>>` in place of `>>>`
/// for widths below 32 where the sign bit cannot bite.
pub fn match_rotate(left: &IlExpr, right: &IlExpr, span: Span) -> Option<IlExpr> {
    let (shl_side, shr_side) = if split_shift(left, IlBinaryOp::Shl).is_some() {
        (left, right)
    } else {
        (right, left)
    };
    let (shl_value, shl_amount) = split_shift(shl_side, IlBinaryOp::Shl)?;
    let (shr_value, shr_amount) = split_right_shift(shr_side)?;
    if strip_width_mask(shl_value) != strip_width_mask(shr_value) {
        return None;
    }
    let value = strip_width_mask(shl_value);

    // Left rotate: the right-shift amount is `W - n` for the shift amount n.
    if let Some(width) = complement_width(shr_amount, shl_amount) {
        return Some(make_rotate(RotateDir::Left, value, shl_amount, width, span));
    }
    // Right rotate: the left-shift amount is the complement instead.
    if let Some(width) = complement_width(shl_amount, shr_amount) {
        return Some(make_rotate(RotateDir::Right, value, shr_amount, width, span));
    }
    // Literal complement: canonicalize on the left-shift amount.
    if let (Some(n), Some(m)) = (shl_amount.as_int_literal(), shr_amount.as_int_literal()) {
        let width = n + m;
        if ROTATE_WIDTHS.contains(&width) {
            return Some(make_rotate(
                RotateDir::Left,
                value,
                shl_amount,
                width as u32,
                span,
            ));
        }
    }
    None
}

/// If `candidate` is `W - amount` for a rotation width W, return W.
fn complement_width(candidate: &IlExpr, amount: &IlExpr) -> Option<u32> {
    if let IlExprKind::Binary {
        op: IlBinaryOp::Sub,
        left,
        right,
    } = &candidate.kind
    {
        if let Some(width) = left.as_int_literal() {
            if ROTATE_WIDTHS.contains(&width) && right.as_ref() == amount {
                return Some(width as u32);
            }
        }
    }
    None
}

fn make_rotate(dir: RotateDir, value: &IlExpr, amount: &IlExpr, bits: u32, span: Span) -> IlExpr {
    IlExpr::new(
        IlExprKind::Rotate {
            dir,
            value: Box::new(value.clone()),
            amount: Box::new(amount.clone()),
            bits,
        },
        IlType::Int32,
        span,
    )
}

fn split_shift<'a>(expr: &'a IlExpr, op: IlBinaryOp) -> Option<(&'a IlExpr, &'a IlExpr)> {
    match &expr.kind {
        IlExprKind::Binary {
            op: actual,
            left,
            right,
        } if *actual == op => Some((left, right)),
        _ => None,
    }
}

fn split_right_shift(expr: &IlExpr) -> Option<(&IlExpr, &IlExpr)> {
    split_shift(expr, IlBinaryOp::UShr).or_else(|| split_shift(expr, IlBinaryOp::Shr))
}

/// Strip a `& 0xFF`-style width mask so masked and unmasked spellings of
/// the same operand compare equal.
fn strip_width_mask(expr: &IlExpr) -> &IlExpr {
    if let IlExprKind::Binary {
        op: IlBinaryOp::BitAnd,
        left,
        right,
    } = &expr.kind
    {
        if let Some(mask) = right.as_int_literal() {
            if mask == 0xFF || mask == 0xFFFF || mask == 0xFFFF_FFFF {
                return left;
            }
        }
    }
    expr
}

/// Recognize an OR-chain of byte shifts as `PackBytes`.
///
/// `(b0 << 24) | (b1 << 16) | (b2 << 8) | b3` is the big-endian 32-bit
/// form; the ascending-shift spelling is little-endian. Two-term chains
/// cover the 16-bit variants.
pub fn match_pack(left: &IlExpr, right: &IlExpr, span: Span) -> Option<IlExpr> {
    let mut terms = Vec::new();
    collect_or_terms(left, &mut terms);
    collect_or_terms(right, &mut terms);

    let mut parts = Vec::with_capacity(terms.len());
    let mut shifts = Vec::with_capacity(terms.len());
    for term in &terms {
        let (value, shift) = match split_shift(term, IlBinaryOp::Shl) {
            Some((value, amount)) => (value, amount.as_int_literal()?),
            None => (*term, 0),
        };
        parts.push(strip_width_mask(value).clone());
        shifts.push(shift);
    }

    let (bits, endian) = match shifts.as_slice() {
        [24, 16, 8, 0] => (32, Endianness::Big),
        [0, 8, 16, 24] => (32, Endianness::Little),
        [8, 0] => (16, Endianness::Big),
        [0, 8] => (16, Endianness::Little),
        _ => return None,
    };
    Some(IlExpr::new(
        IlExprKind::PackBytes {
            parts,
            bits,
            endian,
        },
        IlType::Int32,
        span,
    ))
}

fn collect_or_terms<'a>(expr: &'a IlExpr, out: &mut Vec<&'a IlExpr>) {
    match &expr.kind {
        IlExprKind::Binary {
            op: IlBinaryOp::BitOr,
            left,
            right,
        } => {
            collect_or_terms(left, out);
            collect_or_terms(right, out);
        }
        _ => out.push(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::il::IlLiteral;

    fn ident(name: &str) -> IlExpr {
        IlExpr::ident(name, IlType::Int32, Span::dummy())
    }

    fn lit(n: i64) -> IlExpr {
        IlExpr::literal(IlLiteral::Int(n), Span::dummy())
    }

    fn bin(op: IlBinaryOp, left: IlExpr, right: IlExpr) -> IlExpr {
        IlExpr::new(
            IlExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            IlType::Int32,
            Span::dummy(),
        )
    }

    #[test]
    fn recognizes_rotl32_subtraction_form() {
        // (x << n) | (x >>> (32 - n))
        let left = bin(IlBinaryOp::Shl, ident("x"), ident("n"));
        let right = bin(
            IlBinaryOp::UShr,
            ident("x"),
            bin(IlBinaryOp::Sub, lit(32), ident("n")),
        );
        let rotated = match_rotate(&left, &right, Span::dummy()).expect("rotate");
        match rotated.kind {
            IlExprKind::Rotate { dir, bits, .. } => {
                assert_eq!(dir, RotateDir::Left);
                assert_eq!(bits, 32);
            }
            other => panic!("expected Rotate, got {:?}", other),
        }
    }

    #[test]
    fn recognizes_rotr_subtraction_form() {
        // (x >>> n) | (x << (32 - n)): a right rotate by n.
        let left = bin(IlBinaryOp::UShr, ident("x"), ident("n"));
        let right = bin(
            IlBinaryOp::Shl,
            ident("x"),
            bin(IlBinaryOp::Sub, lit(32), ident("n")),
        );
        let rotated = match_rotate(&left, &right, Span::dummy()).expect("rotate");
        match rotated.kind {
            IlExprKind::Rotate { dir, bits, .. } => {
                assert_eq!(dir, RotateDir::Right);
                assert_eq!(bits, 32);
            }
            other => panic!("expected Rotate, got {:?}", other),
        }
    }

    #[test]
    fn literal_complement_canonicalizes_left() {
        // (x >>> 7) | (x << 25) ≡ rotate left by 25.
        let left = bin(IlBinaryOp::UShr, ident("x"), lit(7));
        let right = bin(IlBinaryOp::Shl, ident("x"), lit(25));
        let rotated = match_rotate(&left, &right, Span::dummy()).expect("rotate");
        match rotated.kind {
            IlExprKind::Rotate { dir, amount, .. } => {
                assert_eq!(dir, RotateDir::Left);
                assert_eq!(amount.as_int_literal(), Some(25));
            }
            other => panic!("expected Rotate, got {:?}", other),
        }
    }

    #[test]
    fn rejects_mismatched_operands() {
        let left = bin(IlBinaryOp::Shl, ident("x"), ident("n"));
        let right = bin(
            IlBinaryOp::UShr,
            ident("y"),
            bin(IlBinaryOp::Sub, lit(32), ident("n")),
        );
        assert!(match_rotate(&left, &right, Span::dummy()).is_none());
    }

    #[test]
    fn recognizes_big_endian_pack() {
        // (b0 << 24) | (b1 << 16) | (b2 << 8) | b3
        let chain = bin(
            IlBinaryOp::BitOr,
            bin(
                IlBinaryOp::BitOr,
                bin(IlBinaryOp::Shl, ident("b0"), lit(24)),
                bin(IlBinaryOp::Shl, ident("b1"), lit(16)),
            ),
            bin(IlBinaryOp::Shl, ident("b2"), lit(8)),
        );
        let packed = match_pack(&chain, &ident("b3"), Span::dummy()).expect("pack");
        match packed.kind {
            IlExprKind::PackBytes {
                parts,
                bits,
                endian,
            } => {
                assert_eq!(bits, 32);
                assert_eq!(endian, Endianness::Big);
                assert_eq!(parts.len(), 4);
            }
            other => panic!("expected PackBytes, got {:?}", other),
        }
    }

    #[test]
    fn rejects_irregular_shift_chain() {
        let left = bin(IlBinaryOp::Shl, ident("b0"), lit(12));
        assert!(match_pack(&left, &ident("b1"), Span::dummy()).is_none());
    }
}
