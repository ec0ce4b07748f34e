//! Keyed array shapes and their construction.
//!
//! A `KeyedArrayType` is an ordered mapping from `int`/`string` keys to
//! types. It is a *list* when its keys are exactly `0, 1, 2, ...` in order.
//!
//! `KeyedArrayBuilder` reproduces PHP array-literal semantics:
//!
//! | Item | Effect |
//! |------|--------|
//! | `v` | appended under the next positional index |
//! | `'k' => v` | overwrites `k` in place, or appends it |
//! | `5 => v` | like a string key; the next positional index becomes at least 6 |
//! | `...$spread` | string keys overwrite/append, int keys are renumbered |
//!
//! When a key or a spread source has no statically known shape, the result
//! degrades to a plain `ArrayType` over the union of all keys and values.

use std::fmt;

use crate::format;
use crate::types::{ArrayType, LiteralType, Type};
use crate::union::Union;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl ArrayKey {
    /// Normalise a string key the way PHP does: decimal integer strings
    /// (`"7"`, `"-3"`, but not `"07"` or `"+1"`) become int keys.
    pub fn from_string(key: impl Into<String>) -> Self {
        let key = key.into();
        if is_canonical_int(&key) {
            if let Ok(value) = key.parse::<i64>() {
                return Self::Int(value);
            }
        }
        Self::Str(key)
    }

    /// The literal type of the key itself.
    pub fn key_type(&self) -> Type {
        match self {
            Self::Int(value) => Type::int_literal(*value),
            Self::Str(value) => Type::string_literal(value.clone()),
        }
    }

    /// Key denoted by a literal type, if the literal can be an array key.
    pub fn from_literal(literal: &LiteralType) -> Option<Self> {
        match literal {
            LiteralType::Integer(value) => Some(Self::Int(*value)),
            LiteralType::String(value) => Some(Self::from_string(value.clone())),
            LiteralType::Boolean(value) => Some(Self::Int(i64::from(*value))),
            LiteralType::Float(value) if value.is_finite() => Some(Self::Int(value.trunc() as i64)),
            LiteralType::Float(_) => None,
        }
    }
}

fn is_canonical_int(key: &str) -> bool {
    let digits = key.strip_prefix('-').unwrap_or(key);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    // "0" is fine, "00"/"01" are not, and "-0" stays a string in PHP.
    if digits.len() > 1 && digits.starts_with('0') {
        return false;
    }
    !(key.starts_with('-') && digits == "0")
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) if format::is_bare_key(value) => f.write_str(value),
            Self::Str(value) => format::write_quoted(f, value),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyedItem {
    pub key: ArrayKey,
    pub value: Type,
    pub optional: bool,
}

impl KeyedItem {
    pub fn new(key: ArrayKey, value: Type) -> Self {
        Self {
            key,
            value,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyedArrayType {
    items: Vec<KeyedItem>,
    is_list: bool,
}

impl KeyedArrayType {
    pub fn new(items: Vec<KeyedItem>) -> Self {
        let is_list = items
            .iter()
            .enumerate()
            .all(|(i, item)| item.key == ArrayKey::Int(i as i64));
        Self { items, is_list }
    }

    /// A list of positional values.
    pub fn list(values: Vec<Type>) -> Self {
        Self::new(
            values
                .into_iter()
                .enumerate()
                .map(|(i, value)| KeyedItem::new(ArrayKey::Int(i as i64), value))
                .collect(),
        )
    }

    pub fn items(&self) -> &[KeyedItem] {
        &self.items
    }

    pub fn is_list(&self) -> bool {
        self.is_list
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&KeyedItem> {
        self.items.iter().find(|item| &item.key == key)
    }

    /// Copy with `key` set to `value`, in place if the key already exists.
    pub fn with_item(&self, key: ArrayKey, value: Type) -> Self {
        let mut items = self.items.clone();
        match items.iter_mut().find(|item| item.key == key) {
            Some(existing) => {
                existing.value = value;
                existing.optional = false;
            }
            None => items.push(KeyedItem::new(key, value)),
        }
        Self::new(items)
    }

    /// Copy with `value` appended under the next positional index (`$a[] = v`).
    pub fn with_pushed(&self, value: Type) -> Self {
        self.with_item(ArrayKey::Int(self.next_index()), value)
    }

    /// One past the largest int key, or 0.
    pub fn next_index(&self) -> i64 {
        self.items
            .iter()
            .filter_map(|item| match item.key {
                ArrayKey::Int(value) => Some(value.saturating_add(1)),
                ArrayKey::Str(_) => None,
            })
            .max()
            .unwrap_or(0)
            .max(0)
    }

    /// Union of the key literals.
    pub fn key_type(&self) -> Type {
        Union::wrap(self.items.iter().map(|item| item.key.key_type()))
    }

    /// Union of the item types.
    pub fn value_type(&self) -> Type {
        Union::wrap(self.items.iter().map(|item| item.value.clone()))
    }

    /// Forget the shape: `array<K, V>` (or `list<V>`) over the widened
    /// keys and values.
    pub fn to_array_type(&self) -> ArrayType {
        let value = if self.items.is_empty() {
            Type::Mixed
        } else {
            self.value_type().widen()
        };
        if self.is_list {
            ArrayType::list(value)
        } else {
            ArrayType::new(self.key_type().widen(), value)
        }
    }
}

// =============================================================================
// KeyedArrayBuilder - array literal construction
// =============================================================================

#[derive(Debug, Default)]
pub struct KeyedArrayBuilder {
    items: Vec<KeyedItem>,
    next_index: i64,
    /// Extra key/value types once the shape is no longer statically known.
    degraded: Option<(Vec<Type>, Vec<Type>)>,
}

impl KeyedArrayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `[..., value]`
    pub fn push_positional(&mut self, value: Type) {
        let key = ArrayKey::Int(self.next_index);
        self.next_index = self.next_index.saturating_add(1);
        self.insert(key, value);
    }

    /// `[..., key => value]`
    pub fn push_keyed(&mut self, key: ArrayKey, value: Type) {
        if let ArrayKey::Int(index) = key {
            self.next_index = self.next_index.max(index.saturating_add(1));
        }
        self.insert(key, value);
    }

    /// `[..., $key => value]` where the key type is only known by type.
    pub fn push_dynamic(&mut self, key: Type, value: Type) {
        if let Type::Literal(literal) = &key {
            if let Some(array_key) = ArrayKey::from_literal(literal) {
                self.push_keyed(array_key, value);
                return;
            }
        }
        let (keys, values) = self.degraded.get_or_insert_with(Default::default);
        keys.push(key);
        values.push(value);
    }

    /// `[..., ...$source]`
    pub fn spread(&mut self, source: &Type) {
        match source {
            Type::KeyedArray(shape) => {
                for item in shape.items() {
                    match &item.key {
                        ArrayKey::Int(_) => self.push_positional(item.value.clone()),
                        ArrayKey::Str(_) => self.push_keyed(item.key.clone(), item.value.clone()),
                    }
                }
            }
            Type::Array(array) => {
                let (keys, values) = self.degraded.get_or_insert_with(Default::default);
                keys.push((*array.key).clone());
                values.push((*array.value).clone());
            }
            other => {
                let (keys, values) = self.degraded.get_or_insert_with(Default::default);
                keys.push(crate::types::ArrayType::default_key());
                values.push(if other.is_unknown() {
                    Type::Unknown
                } else {
                    Type::Mixed
                });
            }
        }
    }

    pub fn finish(self) -> Type {
        match self.degraded {
            None => Type::KeyedArray(KeyedArrayType::new(self.items)),
            Some((mut keys, mut values)) => {
                for item in &self.items {
                    keys.push(item.key.key_type().widen());
                    values.push(item.value.clone());
                }
                Type::Array(ArrayType::new(Union::wrap(keys), Union::wrap(values)))
            }
        }
    }

    fn insert(&mut self, key: ArrayKey, value: Type) {
        match self.items.iter_mut().find(|item| item.key == key) {
            Some(existing) => existing.value = value,
            None => self.items.push(KeyedItem::new(key, value)),
        }
    }
}

#[cfg(test)]
#[path = "../tests/keyed_array_tests.rs"]
mod tests;
