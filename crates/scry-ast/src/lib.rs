//! Parsed source model for the scry inference engine.
//!
//! The engine never parses PHP itself. An external front end hands it
//! already-parsed units, and this crate defines the shape of that input:
//! - `source` - `SourceFile`, `ImportTable` and the `SourceIndex` lookup
//! - `decl` - class/trait/function/method declarations and signature hints
//! - `stmt` - executable statements of a function body
//! - `expr` - expressions, including closures and calls

pub mod decl;
pub mod expr;
pub mod source;
pub mod stmt;

pub use decl::{
    ClassDecl, ClassKind, DocComment, FunctionDecl, MemberFlags, Param, PropertyDecl, TypeHint,
};
pub use expr::{
    Arg, ArrayItem, ArrowFunctionExpr, BinaryOp, CastKind, ClassRef, ClosureExpr, Expr, MatchArm,
    UnaryOp,
};
pub use source::{ClassHandle, FunctionHandle, ImportTable, SourceFile, SourceIndex};
pub use stmt::{CatchClause, ElseIf, Stmt};
