//! The IL AST: the canonical, type-tagged, library-agnostic intermediate tree.
//!
//! The normalizer produces this vocabulary and nothing outside it; no Source
//! library names (`Math.floor`, `Array.prototype.map`, `Object.keys`) survive
//! into IL. Every expression carries a resolved `IlType` (possibly `Any`) so
//! the backends never re-derive widths.

use crate::span::Span;
use crate::types::{ElemType, IlType};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

// ── Module and declarations ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlModule {
    pub name: String,
    /// Content hash of the input tree, stamped into the emitted banner.
    pub fingerprint: String,
    pub decls: Vec<IlDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IlDecl {
    Class(IlClass),
    Function(IlFunction),
    Var(IlVarDecl),
    /// A stray top-level statement the wrapper unwrap chose to keep.
    Stmt(IlStmt),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlClass {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<IlField>,
    pub methods: Vec<IlMethod>,
    pub static_block: Option<Vec<IlStmt>>,
    pub doc: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlField {
    pub name: String,
    pub ty: IlType,
    pub init: Option<IlExpr>,
    pub is_static: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MethodKind {
    Constructor,
    Method,
    Getter,
    Setter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlMethod {
    pub name: String,
    pub kind: MethodKind,
    pub is_static: bool,
    pub func: IlFunction,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlFunction {
    pub name: String,
    pub params: Vec<IlParam>,
    pub return_type: IlType,
    pub body: Vec<IlStmt>,
    pub doc: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlParam {
    pub name: String,
    pub ty: IlType,
    pub default_value: Option<IlExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlVarDecl {
    pub name: String,
    pub ty: IlType,
    pub init: Option<IlExpr>,
    pub is_const: bool,
    pub span: Span,
}

// ── Statements ──

/// Assignment operator on statements and assign-expressions; `Simple` is
/// plain `=`, the rest are compound forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignKind {
    Simple,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IlStmt {
    VarDecl(IlVarDecl),
    Assign {
        target: IlExpr,
        op: AssignKind,
        value: IlExpr,
        span: Span,
    },
    Expr {
        expr: IlExpr,
        span: Span,
    },
    Return {
        value: Option<IlExpr>,
        span: Span,
    },
    If {
        test: IlExpr,
        then_body: Vec<IlStmt>,
        else_body: Option<Vec<IlStmt>>,
        span: Span,
    },
    For {
        init: Option<Box<IlStmt>>,
        test: Option<IlExpr>,
        update: Option<IlExpr>,
        body: Vec<IlStmt>,
        span: Span,
    },
    ForEach {
        var: String,
        iter: IlExpr,
        body: Vec<IlStmt>,
        span: Span,
    },
    While {
        test: IlExpr,
        body: Vec<IlStmt>,
        span: Span,
    },
    DoWhile {
        body: Vec<IlStmt>,
        test: IlExpr,
        span: Span,
    },
    Switch {
        discriminant: IlExpr,
        cases: Vec<IlSwitchCase>,
        default: Option<Vec<IlStmt>>,
        span: Span,
    },
    Try {
        body: Vec<IlStmt>,
        catch: Option<IlCatch>,
        finally: Option<Vec<IlStmt>>,
        span: Span,
    },
    Throw {
        value: IlExpr,
        span: Span,
    },
    Break(Span),
    Continue(Span),
    Pass(Span),
    Block(Vec<IlStmt>, Span),
    Unknown {
        kind: String,
        snapshot: String,
        span: Span,
    },
}

impl IlStmt {
    pub fn span(&self) -> Span {
        match self {
            IlStmt::VarDecl(d) => d.span,
            IlStmt::Assign { span, .. }
            | IlStmt::Expr { span, .. }
            | IlStmt::Return { span, .. }
            | IlStmt::If { span, .. }
            | IlStmt::For { span, .. }
            | IlStmt::ForEach { span, .. }
            | IlStmt::While { span, .. }
            | IlStmt::DoWhile { span, .. }
            | IlStmt::Switch { span, .. }
            | IlStmt::Try { span, .. }
            | IlStmt::Throw { span, .. }
            | IlStmt::Unknown { span, .. } => *span,
            IlStmt::Break(s) | IlStmt::Continue(s) | IlStmt::Pass(s) | IlStmt::Block(_, s) => *s,
        }
    }
}

/// One `case` arm; several consecutive Source labels sharing a body fold
/// into a single arm with multiple tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlSwitchCase {
    pub tests: Vec<IlExpr>,
    pub body: Vec<IlStmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlCatch {
    pub param: Option<String>,
    pub body: Vec<IlStmt>,
    pub span: Span,
}

// ── Expressions ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IlLiteral {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    Null,
    Regex { pattern: String, flags: String },
    BigInt(BigInt),
}

impl IlLiteral {
    /// The type tag this literal carries into the tree.
    pub fn ty(&self) -> IlType {
        match self {
            IlLiteral::Int(_) => IlType::Int,
            IlLiteral::Float(_) => IlType::Float,
            IlLiteral::Bool(_) => IlType::Bool,
            IlLiteral::Str(_) => IlType::Str,
            IlLiteral::Bytes(_) => IlType::Bytes,
            IlLiteral::Null => IlType::Null,
            IlLiteral::Regex { .. } => IlType::Regex,
            IlLiteral::BigInt(_) => IlType::BigInt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum IlBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    In,
}

impl IlBinaryOp {
    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            IlBinaryOp::BitAnd
                | IlBinaryOp::BitOr
                | IlBinaryOp::BitXor
                | IlBinaryOp::Shl
                | IlBinaryOp::Shr
                | IlBinaryOp::UShr
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            IlBinaryOp::Eq
                | IlBinaryOp::NotEq
                | IlBinaryOp::Lt
                | IlBinaryOp::LtEq
                | IlBinaryOp::Gt
                | IlBinaryOp::GtEq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IlUnaryOp {
    Neg,
    Pos,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotateDir {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endianness {
    Big,
    Little,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum ArrayOp {
    Length,
    Append,
    Pop,
    Shift,
    Unshift,
    Slice,
    Fill,
    Concat,
    Join,
    Reverse,
    IndexOf,
    Includes,
    Sort,
    Splice,
    Clear,
    Map,
    Filter,
    Reduce,
    ForEach,
    Some,
    Every,
    Find,
    FindIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum StringOp {
    Replace,
    Repeat,
    IndexOf,
    Split,
    Substring,
    CharAt,
    CharCodeAt,
    ToUpper,
    ToLower,
    Trim,
    StartsWith,
    EndsWith,
    Includes,
    Concat,
    FromCharCodes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum MathOp {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Log,
    Log2,
    Log10,
    Pow,
    Floor,
    Ceil,
    Round,
    Abs,
    Sqrt,
    Cbrt,
    Hypot,
    Min,
    Max,
    Sign,
    Trunc,
    Random,
    Imul,
    Clz32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum MathConst {
    Pi,
    E,
    Ln2,
    Ln10,
    Log2E,
    Log10E,
    Sqrt2,
    Sqrt1_2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum NumberConst {
    MaxSafeInteger,
    MinSafeInteger,
    MaxValue,
    MinValue,
    Epsilon,
    PositiveInfinity,
    NegativeInfinity,
    NaN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum ConvertOp {
    HexDecode,
    HexEncode,
    StringToBytes,
    BytesToString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum JsonOp {
    Stringify,
    Parse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum ObjectOp {
    Freeze,
    Keys,
    Values,
    Entries,
    Create,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterpPart {
    Lit(String),
    Expr(IlExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LambdaBody {
    Expr(Box<IlExpr>),
    Block(Vec<IlStmt>),
}

/// An IL expression: a kind, a resolved result type, and a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlExpr {
    pub kind: IlExprKind,
    pub ty: IlType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IlExprKind {
    // General shapes
    Literal(IlLiteral),
    Ident(String),
    Binary {
        op: IlBinaryOp,
        left: Box<IlExpr>,
        right: Box<IlExpr>,
    },
    Unary {
        op: IlUnaryOp,
        operand: Box<IlExpr>,
    },
    Conditional {
        test: Box<IlExpr>,
        then_val: Box<IlExpr>,
        else_val: Box<IlExpr>,
    },
    Call {
        callee: Box<IlExpr>,
        args: Vec<IlExpr>,
    },
    New {
        callee: Box<IlExpr>,
        args: Vec<IlExpr>,
    },
    Member {
        object: Box<IlExpr>,
        name: String,
    },
    Subscript {
        object: Box<IlExpr>,
        index: Box<IlExpr>,
    },
    Lambda {
        params: Vec<IlParam>,
        body: LambdaBody,
    },
    ListLit(Vec<IlExpr>),
    DictLit(Vec<(IlExpr, IlExpr)>),
    TupleLit(Vec<IlExpr>),
    Spread(Box<IlExpr>),
    Slice {
        object: Box<IlExpr>,
        start: Option<Box<IlExpr>>,
        end: Option<Box<IlExpr>>,
    },
    StringInterp(Vec<InterpPart>),

    // Side effects in expression position; the target transformer
    // bifurcates these into pre/post statements.
    AssignExpr {
        target: Box<IlExpr>,
        op: AssignKind,
        value: Box<IlExpr>,
    },
    UpdateExpr {
        incr: bool,
        prefix: bool,
        target: Box<IlExpr>,
    },
    Sequence(Vec<IlExpr>),

    // Lowered primitives
    Rotate {
        dir: RotateDir,
        value: Box<IlExpr>,
        amount: Box<IlExpr>,
        bits: u32,
    },
    PackBytes {
        parts: Vec<IlExpr>,
        bits: u32,
        endian: Endianness,
    },
    UnpackBytes {
        value: Box<IlExpr>,
        bits: u32,
        endian: Endianness,
    },
    Cast {
        value: Box<IlExpr>,
        target: IlType,
    },
    ArrayOp {
        op: ArrayOp,
        recv: Box<IlExpr>,
        args: Vec<IlExpr>,
    },
    StringOp {
        op: StringOp,
        recv: Option<Box<IlExpr>>,
        args: Vec<IlExpr>,
    },
    MathOp {
        op: MathOp,
        args: Vec<IlExpr>,
    },
    MathConstant(MathConst),
    NumberConstant(NumberConst),
    ConvertOp {
        op: ConvertOp,
        args: Vec<IlExpr>,
    },
    JsonOp {
        op: JsonOp,
        args: Vec<IlExpr>,
    },
    /// Milliseconds since the epoch (`Date.now()` in the Source).
    DateNow,

    // Object and class plumbing
    ParentConstructorCall {
        args: Vec<IlExpr>,
    },
    ParentMethodCall {
        method: String,
        args: Vec<IlExpr>,
    },
    ThisMethodCall {
        method: String,
        args: Vec<IlExpr>,
    },
    ThisPropertyAccess {
        property: String,
    },
    ThisRef,

    // Construction
    ArrayCreation {
        size: Option<Box<IlExpr>>,
    },
    TypedArrayCreation {
        elem: ElemType,
        arg: Option<Box<IlExpr>>,
    },
    BufferCreation {
        size: Box<IlExpr>,
    },
    DataViewCreation {
        buffer: Box<IlExpr>,
    },
    MapCreation {
        entries: Vec<(IlExpr, IlExpr)>,
    },
    SetCreation {
        values: Vec<IlExpr>,
    },

    // Checks and misc
    InstanceOfCheck {
        value: Box<IlExpr>,
        class_name: String,
    },
    IsArrayCheck(Box<IlExpr>),
    IsIntegerCheck(Box<IlExpr>),
    TypeOfExpr(Box<IlExpr>),
    ErrorCreation {
        kind: String,
        message: Option<Box<IlExpr>>,
    },
    DebugOutput(Vec<IlExpr>),
    ObjectOp {
        op: ObjectOp,
        args: Vec<IlExpr>,
    },
    ArrayFrom {
        source: Box<IlExpr>,
        mapper: Option<Box<IlExpr>>,
    },
    Unknown {
        kind: String,
        snapshot: String,
    },
}

impl IlExpr {
    pub fn new(kind: IlExprKind, ty: IlType, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn literal(lit: IlLiteral, span: Span) -> Self {
        let ty = lit.ty();
        Self {
            kind: IlExprKind::Literal(lit),
            ty,
            span,
        }
    }

    pub fn int(value: i64, span: Span) -> Self {
        Self::literal(IlLiteral::Int(value), span)
    }

    pub fn ident(name: impl Into<String>, ty: IlType, span: Span) -> Self {
        Self {
            kind: IlExprKind::Ident(name.into()),
            ty,
            span,
        }
    }

    /// True for literal integer expressions, used by the division and
    /// range-loop rules.
    pub fn as_int_literal(&self) -> Option<i64> {
        match &self.kind {
            IlExprKind::Literal(IlLiteral::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// True when evaluating this expression twice is observationally safe
    /// (no assignments, updates, or calls anywhere inside).
    pub fn is_pure(&self) -> bool {
        match &self.kind {
            IlExprKind::Literal(_)
            | IlExprKind::Ident(_)
            | IlExprKind::MathConstant(_)
            | IlExprKind::NumberConstant(_)
            | IlExprKind::ThisRef
            | IlExprKind::ThisPropertyAccess { .. } => true,
            IlExprKind::Binary { left, right, .. } => left.is_pure() && right.is_pure(),
            IlExprKind::Unary { operand, .. } => operand.is_pure(),
            IlExprKind::Member { object, .. } => object.is_pure(),
            IlExprKind::Subscript { object, index } => object.is_pure() && index.is_pure(),
            IlExprKind::Conditional {
                test,
                then_val,
                else_val,
            } => test.is_pure() && then_val.is_pure() && else_val.is_pure(),
            IlExprKind::ArrayOp {
                op: ArrayOp::Length,
                recv,
                ..
            } => recv.is_pure(),
            _ => false,
        }
    }

    /// True when this subtree contains an assignment or update expression
    /// that bifurcation must lift out.
    pub fn has_side_effect(&self) -> bool {
        match &self.kind {
            IlExprKind::AssignExpr { .. } | IlExprKind::UpdateExpr { .. } => true,
            IlExprKind::Binary { left, right, .. } => {
                left.has_side_effect() || right.has_side_effect()
            }
            IlExprKind::Unary { operand, .. } => operand.has_side_effect(),
            IlExprKind::Conditional {
                test,
                then_val,
                else_val,
            } => test.has_side_effect() || then_val.has_side_effect() || else_val.has_side_effect(),
            IlExprKind::Call { callee, args } => {
                callee.has_side_effect() || args.iter().any(IlExpr::has_side_effect)
            }
            IlExprKind::Member { object, .. } => object.has_side_effect(),
            IlExprKind::Subscript { object, index } => {
                object.has_side_effect() || index.has_side_effect()
            }
            IlExprKind::Sequence(parts) => parts.iter().any(IlExpr::has_side_effect),
            IlExprKind::ListLit(items) | IlExprKind::TupleLit(items) => {
                items.iter().any(IlExpr::has_side_effect)
            }
            _ => false,
        }
    }
}
