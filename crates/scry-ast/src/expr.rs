//! Expression nodes.
//!
//! Names inside expressions (`new Foo`, `Foo::bar()`, `foo()`) are kept as
//! written; the engine resolves them through the import table of the file
//! that contains the expression.

use crate::decl::{Param, TypeHint};
use crate::stmt::Stmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
    /// `"Hello {$name}"` - the parts are only visited, the result is a string.
    InterpolatedString(Vec<Expr>),
    /// `[1, 'a' => 2, ...$rest]`
    Array(Vec<ArrayItem>),
    /// A local variable, stored without the leading `$`. `$this` is `Variable("this")`.
    Variable(String),
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// `$a['key']`, or `$a[]` when `dim` is `None` (only valid as an assignment target).
    ArrayDimFetch {
        target: Box<Expr>,
        dim: Option<Box<Expr>>,
    },
    PropertyFetch {
        target: Box<Expr>,
        name: String,
        nullsafe: bool,
    },
    /// `Foo::BAR`, or `Foo::class` when `name == "class"`.
    ClassConstFetch {
        class: ClassRef,
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `a ? b : c`, or the short form `a ?: c` when `then` is `None`.
    Ternary {
        condition: Box<Expr>,
        then: Option<Box<Expr>>,
        otherwise: Box<Expr>,
    },
    Cast {
        kind: CastKind,
        expr: Box<Expr>,
    },
    New {
        class: ClassRef,
        args: Vec<Arg>,
    },
    FuncCall {
        name: String,
        args: Vec<Arg>,
    },
    MethodCall {
        target: Box<Expr>,
        name: String,
        args: Vec<Arg>,
        nullsafe: bool,
    },
    StaticCall {
        class: ClassRef,
        name: String,
        args: Vec<Arg>,
    },
    Closure(Box<ClosureExpr>),
    ArrowFunction(Box<ArrowFunctionExpr>),
    Match {
        subject: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    Isset(Vec<Expr>),
    Empty(Box<Expr>),
    Instanceof {
        expr: Box<Expr>,
        class: ClassRef,
    },
    /// PHP 8 throw expression; also used for `throw` statements.
    Throw(Box<Expr>),
    /// A construct the front end produced but the engine does not model
    /// (`include`, `eval`, backticks, ...). `kind` names it for reporting.
    Unsupported {
        kind: String,
    },
}

/// The class operand of `new`, `::` and `instanceof`.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassRef {
    Named(String),
    SelfRef,
    Static,
    Parent,
    Dynamic(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Arg {
    pub value: Expr,
    pub name: Option<String>,
    pub unpack: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayItem {
    pub key: Option<Expr>,
    pub value: Expr,
    pub unpack: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchArm {
    /// Empty for the `default` arm.
    pub conditions: Vec<Expr>,
    pub body: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClosureExpr {
    pub params: Vec<Param>,
    /// Variables captured with `use (...)`.
    pub uses: Vec<String>,
    pub return_hint: Option<TypeHint>,
    pub body: Vec<Stmt>,
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrowFunctionExpr {
    pub params: Vec<Param>,
    pub return_hint: Option<TypeHint>,
    pub body: Expr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Spaceship,
    And,
    Or,
    Xor,
    Coalesce,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
}

impl BinaryOp {
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Pow)
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Identical
                | Self::NotIdentical
                | Self::Less
                | Self::LessOrEqual
                | Self::Greater
                | Self::GreaterOrEqual
        )
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Xor)
    }

    pub const fn is_bitwise(self) -> bool {
        matches!(
            self,
            Self::BitAnd | Self::BitOr | Self::BitXor | Self::ShiftLeft | Self::ShiftRight
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    BitNot,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CastKind {
    Int,
    Float,
    String,
    Bool,
    Array,
    Object,
}

// =============================================================================
// Construction helpers
// =============================================================================

impl Expr {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    pub fn this() -> Self {
        Self::Variable("this".to_string())
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::FuncCall {
            name: name.into(),
            args: args.into_iter().map(Arg::positional).collect(),
        }
    }

    pub fn method_call(target: Expr, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::MethodCall {
            target: Box::new(target),
            name: name.into(),
            args: args.into_iter().map(Arg::positional).collect(),
            nullsafe: false,
        }
    }

    pub fn static_call(class: ClassRef, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::StaticCall {
            class,
            name: name.into(),
            args: args.into_iter().map(Arg::positional).collect(),
        }
    }

    pub fn new_object(class: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::New {
            class: ClassRef::Named(class.into()),
            args: args.into_iter().map(Arg::positional).collect(),
        }
    }

    pub fn property(target: Expr, name: impl Into<String>) -> Self {
        Self::PropertyFetch {
            target: Box::new(target),
            name: name.into(),
            nullsafe: false,
        }
    }

    pub fn dim(target: Expr, dim: Expr) -> Self {
        Self::ArrayDimFetch {
            target: Box::new(target),
            dim: Some(Box::new(dim)),
        }
    }

    pub fn throw(value: Expr) -> Self {
        Self::Throw(Box::new(value))
    }

    /// A list literal with positional items only.
    pub fn list(values: Vec<Expr>) -> Self {
        Self::Array(values.into_iter().map(ArrayItem::positional).collect())
    }
}

impl Arg {
    pub fn positional(value: Expr) -> Self {
        Self {
            value,
            name: None,
            unpack: false,
        }
    }
}

impl ArrayItem {
    pub fn positional(value: Expr) -> Self {
        Self {
            key: None,
            value,
            unpack: false,
        }
    }

    pub fn keyed(key: Expr, value: Expr) -> Self {
        Self {
            key: Some(key),
            value,
            unpack: false,
        }
    }

    pub fn spread(value: Expr) -> Self {
        Self {
            key: None,
            value,
            unpack: true,
        }
    }
}
