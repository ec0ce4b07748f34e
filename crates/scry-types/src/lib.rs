//! Structural Type Model
//!
//! Immutable, structurally comparable types produced by the inference engine
//! and consumed by schema generators:
//!
//! - **`Type`**: scalar, literal, array, keyed-array, object, generic,
//!   template, function and union types
//! - **`Union::wrap`**: the canonical union constructor (dedup, collapse)
//! - **Relations**: `accepts` / `accepted_by` / `is_same`
//! - **Widening**: literal types generalise to their base type
//! - **Parsing**: one type-expression grammar for signatures and doc tags
//!
//! Every type renders to a stable canonical string (`Display`) which the
//! parser reads back.
mod format;
pub mod instantiate;
pub mod keyed_array;
pub mod parser;
pub mod relation;
pub mod types;
pub mod union;
mod widening;

pub use instantiate::{TemplateSubstitution, instantiate_type};
pub use keyed_array::{ArrayKey, KeyedArrayBuilder, KeyedArrayType, KeyedItem};
pub use parser::{
    PlainNames, TypeNameContext, TypeParseError, parse_type, parse_type_prefix, parse_type_with,
};
pub use relation::{ClassHierarchy, NoHierarchy, same_class_name};
pub use types::{
    ArrayType, FunctionParam, FunctionType, Generic, LiteralType, ObjectType, TemplateType, Type,
};
pub use union::Union;
