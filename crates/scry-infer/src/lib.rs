//! Static type inference for PHP units
//!
//! Computes parameter, return and exception types for functions and
//! methods without executing them:
//!
//! - **Reflector**: finds a unit's declaration across traits and parents
//! - **Scope**: local bindings and name resolution for one unit
//! - **Index**: memoized definitions, `Shallow` while a body is analysed
//! - **Builders**: declaration, body dataflow and built-in tables
//! - **Precedence**: override tag > declared type (on mismatch) > inferred
//! - **Broker**: pluggable expression and definition hooks
//!
//! The caller owns a [`Context`] per generation run and drives an
//! [`Engine`] over a [`scry_ast::SourceIndex`].

pub mod broker;
pub mod builders;
pub mod config;
pub mod context;
pub mod definition;
pub mod docblock;
pub mod engine;
pub mod error;
pub mod index;
pub mod precedence;
pub mod recursion;
pub mod reflector;
pub mod report;
pub mod scope;

pub use broker::{DefinitionHook, Extension, ExpressionTypeHook, ExtensionBroker};
pub use config::{InferConfig, LiteralWidening};
pub use context::Context;
pub use definition::{ClassDefinition, FunctionLikeDefinition, ParamDefinition, UnitId};
pub use engine::Engine;
pub use error::{ConfigError, InferError};
pub use index::{DefinitionIndex, IndexEntry, Maturity};
pub use precedence::{ReturnSignals, ReturnSource, Selection, select_return};
pub use reflector::SourceReflector;
pub use report::AnalysisReport;
pub use scope::{NameResolver, Scope};
