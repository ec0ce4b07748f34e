//! Statement nodes of a function or closure body.

use crate::expr::Expr;

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then: Vec<Stmt>,
        else_ifs: Vec<ElseIf>,
        otherwise: Option<Vec<Stmt>>,
    },
    Foreach {
        subject: Expr,
        key: Option<String>,
        value: String,
        body: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    TryCatch {
        body: Vec<Stmt>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },
    Block(Vec<Stmt>),
    Nop,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElseIf {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    /// Class names as written, e.g. `["InvalidArgumentException", "\\TypeError"]`.
    pub types: Vec<String>,
    pub var: Option<String>,
    pub body: Vec<Stmt>,
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Self::Expr(expr)
    }

    pub fn ret(expr: Expr) -> Self {
        Self::Return(Some(expr))
    }

    pub fn throw(expr: Expr) -> Self {
        Self::Expr(Expr::throw(expr))
    }

    /// `$name = value;`
    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Self::Expr(Expr::assign(Expr::var(name), value))
    }

    /// True for statements after which the rest of the block is unreachable.
    pub fn terminates(&self) -> bool {
        match self {
            Self::Return(_) | Self::Expr(Expr::Throw(_)) => true,
            Self::Block(body) => body.iter().any(Stmt::terminates),
            Self::If {
                then,
                else_ifs,
                otherwise: Some(otherwise),
                ..
            } => {
                then.iter().any(Stmt::terminates)
                    && else_ifs
                        .iter()
                        .all(|branch| branch.body.iter().any(Stmt::terminates))
                    && otherwise.iter().any(Stmt::terminates)
            }
            _ => false,
        }
    }
}
