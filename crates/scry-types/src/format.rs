//! Canonical rendering.
//!
//! The output of `Display` is the stable string form consumed by schema
//! generators and read back by `parse_type`. Union deduplication also keys
//! on it, so two types that render identically are treated as the same
//! union member.
//!
//! String values that would not read back verbatim are single-quoted with
//! backslash escapes: literal values containing parentheses, quotes or
//! backslashes, and array keys that are not bare identifiers.

use std::fmt;

use crate::keyed_array::KeyedArrayType;
use crate::types::{ArrayType, FunctionParam, FunctionType, LiteralType, Type};

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => f.write_str("unknown"),
            Type::Mixed => f.write_str("mixed"),
            Type::Void => f.write_str("void"),
            Type::Null => f.write_str("null"),
            Type::Boolean => f.write_str("boolean"),
            Type::Integer => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::String => f.write_str("string"),
            Type::Literal(literal) => literal.fmt(f),
            Type::Array(array) => array.fmt(f),
            Type::KeyedArray(shape) => shape.fmt(f),
            Type::Object(object) => f.write_str(&object.name),
            Type::Generic(generic) => {
                write!(f, "{}<", generic.name)?;
                write_joined(f, &generic.args)?;
                f.write_str(">")
            }
            Type::Template(template) => f.write_str(&template.name),
            Type::Function(function) => function.fmt(f),
            Type::Union(union) => {
                for (i, member) in union.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    // `(int): a|b` would otherwise read as a union of a
                    // callable and `b`.
                    if matches!(member, Type::Function(_)) {
                        write!(f, "({member})")?;
                    } else {
                        member.fmt(f)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralType::Integer(value) => write!(f, "int({value})"),
            LiteralType::Float(value) => write!(f, "float({value})"),
            LiteralType::String(value) if needs_quotes_in_literal(value) => {
                f.write_str("string(")?;
                write_quoted(f, value)?;
                f.write_str(")")
            }
            LiteralType::String(value) => write!(f, "string({value})"),
            LiteralType::Boolean(value) => write!(f, "boolean({value})"),
        }
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_list {
            write!(f, "list<{}>", self.value)
        } else if self.has_default_key() {
            write!(f, "array<{}>", self.value)
        } else {
            write!(f, "array<{}, {}>", self.key, self.value)
        }
    }
}

impl fmt::Display for KeyedArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_list() {
            f.write_str("list{")?;
            for (i, item) in self.items().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                item.value.fmt(f)?;
            }
            return f.write_str("}");
        }

        f.write_str("array{")?;
        for (i, item) in self.items().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let marker = if item.optional { "?" } else { "" };
            write!(f, "{}{marker}: {}", item.key, item.value)?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for FunctionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variadic {
            f.write_str("...")?;
        }
        self.ty.fmt(f)?;
        if self.has_default {
            f.write_str("=")?;
        }
        Ok(())
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_joined(f, &self.params)?;
        write!(f, "): {}", self.return_type)
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.fmt(f)?;
    }
    Ok(())
}

fn needs_quotes_in_literal(value: &str) -> bool {
    value.contains(['(', ')', '\'', '"', '\\'])
}

/// Whether `key` reads back as the same bare shape key.
pub(crate) fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// `value` in single quotes, with `'` and `\` escaped.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in value.chars() {
        if matches!(c, '\'' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("'")
}
