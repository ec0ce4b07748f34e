//! Core type representation.
//!
//! `Type` is a plain immutable tree. There is no interning: types are small,
//! cloned freely, and compared structurally with `is_same` (or by their
//! canonical rendering when deduplicating).
//!
//! ## Special types
//!
//! | Type | Rendering | Role |
//! |------|-----------|------|
//! | `Unknown` | `unknown` | top: anything the engine cannot model |
//! | `Mixed` | `mixed` | an explicitly declared "any value" |
//! | `Void` | `void` | bottom: empty union, no return value |

use serde::{Serialize, Serializer};

use crate::keyed_array::KeyedArrayType;
use crate::union::Union;

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Unknown,
    Mixed,
    Void,
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Literal(LiteralType),
    Array(ArrayType),
    KeyedArray(KeyedArrayType),
    Object(ObjectType),
    Generic(Generic),
    Template(TemplateType),
    Function(FunctionType),
    Union(Union),
}

/// An exact scalar value refining its base type (`int(1)` refines `int`).
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralType {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl LiteralType {
    /// The declared base type this literal refines.
    pub fn base(&self) -> Type {
        match self {
            Self::Integer(_) => Type::Integer,
            Self::Float(_) => Type::Float,
            Self::String(_) => Type::String,
            Self::Boolean(_) => Type::Boolean,
        }
    }
}

/// `array<K, V>` / `list<V>` with unknown shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayType {
    pub key: Box<Type>,
    pub value: Box<Type>,
    pub is_list: bool,
}

impl ArrayType {
    pub fn new(key: Type, value: Type) -> Self {
        Self {
            key: Box::new(key),
            value: Box::new(value),
            is_list: false,
        }
    }

    /// `array<V>`: the key is any array key.
    pub fn of(value: Type) -> Self {
        Self::new(Self::default_key(), value)
    }

    pub fn list(value: Type) -> Self {
        Self {
            key: Box::new(Type::Integer),
            value: Box::new(value),
            is_list: true,
        }
    }

    /// `int|string`, the key type of an array nothing is known about.
    pub fn default_key() -> Type {
        Union::wrap([Type::Integer, Type::String])
    }

    pub fn has_default_key(&self) -> bool {
        matches!(*self.key, Type::Mixed) || self.key.is_same(&Self::default_key())
    }
}

/// A reference to a class by canonical name.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectType {
    pub name: String,
}

/// A base name applied to ordered template arguments: `Collection<int, User>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Generic {
    pub name: String,
    pub args: Vec<Type>,
}

/// A named type variable, meaningful only inside the generic context
/// (class or function) that introduced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound: Option<Box<Type>>,
}

impl TemplateType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: None,
        }
    }

    pub fn with_bound(mut self, bound: Type) -> Self {
        self.bound = Some(Box::new(bound));
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionParam {
    pub name: String,
    pub ty: Type,
    pub has_default: bool,
    pub variadic: bool,
}

impl FunctionParam {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            has_default: false,
            variadic: false,
        }
    }

    pub fn is_required(&self) -> bool {
        !self.has_default && !self.variadic
    }
}

/// A callable signature: ordered parameters, return type and the set of
/// exceptions the callable may throw.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    pub params: Vec<FunctionParam>,
    pub return_type: Box<Type>,
    pub exceptions: Vec<Type>,
}

impl FunctionType {
    pub fn new(params: Vec<FunctionParam>, return_type: Type) -> Self {
        Self {
            params,
            return_type: Box::new(return_type),
            exceptions: Vec::new(),
        }
    }

    pub fn with_exceptions(mut self, exceptions: Vec<Type>) -> Self {
        self.exceptions = exceptions;
        self
    }
}

// =============================================================================
// Constructors and queries
// =============================================================================

impl Type {
    pub fn int_literal(value: i64) -> Self {
        Self::Literal(LiteralType::Integer(value))
    }

    pub fn float_literal(value: f64) -> Self {
        Self::Literal(LiteralType::Float(value))
    }

    pub fn string_literal(value: impl Into<String>) -> Self {
        Self::Literal(LiteralType::String(value.into()))
    }

    pub fn bool_literal(value: bool) -> Self {
        Self::Literal(LiteralType::Boolean(value))
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(ObjectType {
            name: name.into().trim_start_matches('\\').to_string(),
        })
    }

    pub fn generic(name: impl Into<String>, args: Vec<Type>) -> Self {
        Self::Generic(Generic {
            name: name.into().trim_start_matches('\\').to_string(),
            args,
        })
    }

    pub fn template(name: impl Into<String>) -> Self {
        Self::Template(TemplateType::new(name))
    }

    pub fn array_of(value: Type) -> Self {
        Self::Array(ArrayType::of(value))
    }

    pub fn list_of(value: Type) -> Self {
        Self::Array(ArrayType::list(value))
    }

    pub fn function(params: Vec<FunctionParam>, return_type: Type) -> Self {
        Self::Function(FunctionType::new(params, return_type))
    }

    /// `T|null`
    pub fn nullable(inner: Type) -> Self {
        Union::wrap([inner, Self::Null])
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Self::Union(_))
    }

    /// Union members, or the type itself for non-unions.
    pub fn members(&self) -> &[Type] {
        match self {
            Self::Union(union) => union.members(),
            other => std::slice::from_ref(other),
        }
    }

    /// The class name of object and generic types.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Object(object) => Some(&object.name),
            Self::Generic(generic) => Some(&generic.name),
            _ => None,
        }
    }

    /// Drop `null` from a union (`?T` -> `T`); used by `??` and `?->`.
    pub fn without_null(&self) -> Type {
        match self {
            Self::Union(union) => Union::wrap(
                union
                    .members()
                    .iter()
                    .filter(|member| !matches!(member, Self::Null))
                    .cloned(),
            ),
            other => other.clone(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.members().iter().any(|member| matches!(member, Self::Null))
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
