//! The Python target AST. Structurally parallel to IL but carrying Python
//! semantics: f-strings, decorators, comprehensions, except clauses.
//!
//! Strict parent-owns-children ownership; the transformer rebuilds subtrees
//! and never shares a node between two parents.

use num_bigint::BigInt;

#[derive(Debug, Clone, PartialEq)]
pub struct PyModule {
    pub name: String,
    pub fingerprint: String,
    pub body: Vec<PyStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PyParam {
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<PyExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptClause {
    /// Exception type expression text (`Exception`, `ValueError`).
    pub exc_type: String,
    /// Binding name (`except Exception as e`).
    pub name: Option<String>,
    pub body: Vec<PyStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PyStmt {
    Assign {
        target: PyExpr,
        value: PyExpr,
    },
    /// Annotated assignment: `x: int = 0`.
    AnnAssign {
        target: PyExpr,
        annotation: String,
        value: Option<PyExpr>,
    },
    AugAssign {
        target: PyExpr,
        op: PyBinOp,
        value: PyExpr,
    },
    Expr(PyExpr),
    Return(Option<PyExpr>),
    Pass,
    Break,
    Continue,
    If {
        test: PyExpr,
        body: Vec<PyStmt>,
        orelse: Vec<PyStmt>,
    },
    While {
        test: PyExpr,
        body: Vec<PyStmt>,
    },
    For {
        target: PyExpr,
        iter: PyExpr,
        body: Vec<PyStmt>,
    },
    Raise(Option<PyExpr>),
    Try {
        body: Vec<PyStmt>,
        handlers: Vec<ExceptClause>,
        finalbody: Vec<PyStmt>,
    },
    FunctionDef {
        name: String,
        params: Vec<PyParam>,
        returns: Option<String>,
        body: Vec<PyStmt>,
        decorators: Vec<String>,
        docstring: Option<String>,
    },
    ClassDef {
        name: String,
        bases: Vec<String>,
        body: Vec<PyStmt>,
        docstring: Option<String>,
    },
    /// Single-line `# …` comment (diagnostic output for unknown nodes).
    Comment(String),
    /// `del target[:]`-style deletions are not needed; a plain marker for
    /// deleting a subscript/slice target.
    Delete(PyExpr),
}

/// One interpolation segment of an f-string.
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Lit(String),
    Expr(PyExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PyExpr {
    Name(String),
    Int(i64),
    Big(BigInt),
    /// Integer rendered as uppercase hex (`0xFFFFFFFF`).
    HexInt(u64),
    Float(f64),
    Str(String),
    FString(Vec<FStringPart>),
    Bytes(Vec<u8>),
    Bool(bool),
    None_,
    Tuple(Vec<PyExpr>),
    List(Vec<PyExpr>),
    Dict(Vec<(PyExpr, PyExpr)>),
    Set(Vec<PyExpr>),
    Unary {
        op: PyUnaryOp,
        operand: Box<PyExpr>,
    },
    Bin {
        op: PyBinOp,
        left: Box<PyExpr>,
        right: Box<PyExpr>,
    },
    Call {
        func: Box<PyExpr>,
        args: Vec<PyExpr>,
        kwargs: Vec<(String, PyExpr)>,
    },
    Attribute {
        value: Box<PyExpr>,
        attr: String,
    },
    Subscript {
        value: Box<PyExpr>,
        index: Box<PyExpr>,
    },
    SliceExpr {
        value: Box<PyExpr>,
        lower: Option<Box<PyExpr>>,
        upper: Option<Box<PyExpr>>,
    },
    /// `body if test else orelse`.
    Conditional {
        body: Box<PyExpr>,
        test: Box<PyExpr>,
        orelse: Box<PyExpr>,
    },
    Lambda {
        params: Vec<String>,
        body: Box<PyExpr>,
    },
    /// `[elt for target in iter if condition]`.
    ListComp {
        elt: Box<PyExpr>,
        target: String,
        iter: Box<PyExpr>,
        condition: Option<Box<PyExpr>>,
    },
    /// `(elt for target in iter if condition)`.
    GeneratorExp {
        elt: Box<PyExpr>,
        target: String,
        iter: Box<PyExpr>,
        condition: Option<Box<PyExpr>>,
    },
    Starred(Box<PyExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyUnaryOp {
    Not,
    USub,
    UAdd,
    Invert,
}

/// Binary and boolean operators, including comparisons; one enum so a single
/// precedence table drives all parenthesization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
pub enum PyBinOp {
    Pow,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Add,
    Sub,
    LShift,
    RShift,
    BitAnd,
    BitXor,
    BitOr,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
    And,
    Or,
}

impl PyBinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            PyBinOp::Pow => "**",
            PyBinOp::Mult => "*",
            PyBinOp::Div => "/",
            PyBinOp::FloorDiv => "//",
            PyBinOp::Mod => "%",
            PyBinOp::Add => "+",
            PyBinOp::Sub => "-",
            PyBinOp::LShift => "<<",
            PyBinOp::RShift => ">>",
            PyBinOp::BitAnd => "&",
            PyBinOp::BitXor => "^",
            PyBinOp::BitOr => "|",
            PyBinOp::Eq => "==",
            PyBinOp::NotEq => "!=",
            PyBinOp::Lt => "<",
            PyBinOp::LtE => "<=",
            PyBinOp::Gt => ">",
            PyBinOp::GtE => ">=",
            PyBinOp::In => "in",
            PyBinOp::NotIn => "not in",
            PyBinOp::Is => "is",
            PyBinOp::IsNot => "is not",
            PyBinOp::And => "and",
            PyBinOp::Or => "or",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            PyBinOp::Eq
                | PyBinOp::NotEq
                | PyBinOp::Lt
                | PyBinOp::LtE
                | PyBinOp::Gt
                | PyBinOp::GtE
                | PyBinOp::In
                | PyBinOp::NotIn
                | PyBinOp::Is
                | PyBinOp::IsNot
        )
    }
}

// ── Construction helpers the transformer leans on ──

impl PyExpr {
    pub fn name(s: impl Into<String>) -> Self {
        PyExpr::Name(s.into())
    }

    pub fn call(func: PyExpr, args: Vec<PyExpr>) -> Self {
        PyExpr::Call {
            func: Box::new(func),
            args,
            kwargs: vec![],
        }
    }

    pub fn call_name(name: &str, args: Vec<PyExpr>) -> Self {
        Self::call(PyExpr::name(name), args)
    }

    pub fn attr(value: PyExpr, attr: impl Into<String>) -> Self {
        PyExpr::Attribute {
            value: Box::new(value),
            attr: attr.into(),
        }
    }

    pub fn method(recv: PyExpr, name: &str, args: Vec<PyExpr>) -> Self {
        Self::call(Self::attr(recv, name), args)
    }

    pub fn bin(op: PyBinOp, left: PyExpr, right: PyExpr) -> Self {
        PyExpr::Bin {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn subscript(value: PyExpr, index: PyExpr) -> Self {
        PyExpr::Subscript {
            value: Box::new(value),
            index: Box::new(index),
        }
    }

    /// `(expr) & 0xFFFFFFFF`: the 32-bit width mask.
    pub fn mask32(self) -> Self {
        Self::bin(PyBinOp::BitAnd, self, PyExpr::HexInt(0xFFFF_FFFF))
    }
}
