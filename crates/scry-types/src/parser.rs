//! Type-expression parser.
//!
//! One grammar serves declared signature types, `@param`/`@return`/`@var`/
//! `@throws` doc tags and the vendor override tag. It reads back everything
//! `Display` renders:
//!
//! ```text
//! union    := postfix ('|' postfix)*
//! postfix  := atom ('[]')*
//! atom     := '?' postfix
//!           | '(' params ')' ':' union          callable signature
//!           | '(' union ')'
//!           | number | quoted-string            literal
//!           | keyword ['(' literal ')']         int(1), string(foo), ...
//!           | ('array' | 'list') ('<' args '>' | '{' shape '}')?
//!           | ('callable' | 'Closure') ['(' params ')' [':' union]]
//!           | name ['<' args '>']               template or class
//! shape    := (key ['?'] ':' union | union) (',' ...)* [',']
//! ```
//!
//! Names go through a `TypeNameContext`: template names first, then class
//! name canonicalisation. `self`, `static` and `$this` resolve to the
//! context's self type when it has one.

use thiserror::Error;

use crate::keyed_array::{ArrayKey, KeyedArrayType, KeyedItem};
use crate::types::{ArrayType, FunctionParam, FunctionType, Type};
use crate::union::Union;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("unexpected `{found}` at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: char,
        offset: usize,
        expected: &'static str,
    },
    #[error("unexpected end of type expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("invalid number `{text}` at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
    #[error("unexpected trailing input `{rest}` at offset {offset}")]
    TrailingInput { rest: String, offset: usize },
}

/// Name resolution hooks used while parsing.
pub trait TypeNameContext {
    /// The template type a bare name refers to, if any.
    fn template(&self, name: &str) -> Option<Type> {
        let _ = name;
        None
    }

    /// Canonical class name for a name as written.
    fn resolve_class(&self, name: &str) -> String {
        name.trim_start_matches('\\').to_string()
    }

    /// Type of `self`/`static`/`$this`.
    fn self_type(&self) -> Option<Type> {
        None
    }
}

/// Context with no templates, no imports and no enclosing class.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainNames;

impl TypeNameContext for PlainNames {}

pub fn parse_type(src: &str) -> Result<Type, TypeParseError> {
    parse_type_with(src, &PlainNames)
}

/// Parse a complete type expression; trailing input is an error.
pub fn parse_type_with(src: &str, ctx: &dyn TypeNameContext) -> Result<Type, TypeParseError> {
    let mut parser = Parser::new(src, ctx);
    let ty = parser.parse_union()?;
    parser.skip_ws();
    if parser.pos < src.len() {
        return Err(TypeParseError::TrailingInput {
            rest: src[parser.pos..].to_string(),
            offset: parser.pos,
        });
    }
    Ok(ty)
}

/// Parse the leading type expression of `src` and return the rest, with
/// leading whitespace removed. Used for doc tags (`@param int $x ...`).
pub fn parse_type_prefix<'s>(
    src: &'s str,
    ctx: &dyn TypeNameContext,
) -> Result<(Type, &'s str), TypeParseError> {
    let mut parser = Parser::new(src, ctx);
    let ty = parser.parse_union()?;
    Ok((ty, src[parser.pos..].trim_start()))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    ctx: &'a dyn TypeNameContext,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, ctx: &'a dyn TypeNameContext) -> Self {
        Self { src, pos: 0, ctx }
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Skip whitespace, then consume `c` if it is next.
    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char, expected: &'static str) -> Result<(), TypeParseError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &'static str) -> TypeParseError {
        match self.peek() {
            Some(found) => TypeParseError::UnexpectedToken {
                found,
                offset: self.pos,
                expected,
            },
            None => TypeParseError::UnexpectedEnd { expected },
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn read_ident(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let continues = c.is_alphanumeric()
                || c == '_'
                || c == '\\'
                || (c == '-' && self.peek_nth(1).is_some_and(char::is_alphabetic));
            if !continues {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn parse_union(&mut self) -> Result<Type, TypeParseError> {
        let mut members = vec![self.parse_postfix()?];
        while self.eat('|') {
            members.push(self.parse_postfix()?);
        }
        Ok(Union::wrap(members))
    }

    fn parse_postfix(&mut self) -> Result<Type, TypeParseError> {
        let mut ty = self.parse_atom()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            if self.rest().starts_with("[]") {
                self.pos += 2;
                ty = Type::array_of(ty);
            } else {
                self.pos = save;
                return Ok(ty);
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Type, TypeParseError> {
        self.skip_ws();
        let Some(c) = self.peek() else {
            return Err(TypeParseError::UnexpectedEnd { expected: "a type" });
        };
        match c {
            '?' => {
                self.bump();
                Ok(Type::nullable(self.parse_postfix()?))
            }
            '(' => self.parse_parenthesized(),
            '\'' | '"' => Ok(Type::string_literal(self.parse_quoted()?)),
            '-' | '0'..='9' => self.parse_number(),
            '$' => {
                self.bump();
                let name = self.read_ident();
                if name == "this" {
                    Ok(self.self_type("$this"))
                } else {
                    Err(TypeParseError::UnexpectedToken {
                        found: '$',
                        offset: self.pos - name.len() - 1,
                        expected: "a type",
                    })
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '\\' => self.parse_named(),
            _ => Err(self.unexpected("a type")),
        }
    }

    /// `( ... )` is either a grouped type or a callable signature.
    fn parse_parenthesized(&mut self) -> Result<Type, TypeParseError> {
        self.bump();
        let params = self.parse_params()?;
        if self.eat(':') {
            let return_type = self.parse_union()?;
            return Ok(Type::Function(FunctionType::new(params, return_type)));
        }
        match <[FunctionParam; 1]>::try_from(params) {
            Ok([param]) if !param.variadic && !param.has_default => Ok(param.ty),
            _ => Err(self.unexpected("`:` after callable parameters")),
        }
    }

    /// Parameter list after `(`, through the closing `)`.
    fn parse_params(&mut self) -> Result<Vec<FunctionParam>, TypeParseError> {
        let mut params = Vec::new();
        if self.eat(')') {
            return Ok(params);
        }
        loop {
            self.skip_ws();
            let variadic = self.rest().starts_with("...");
            if variadic {
                self.pos += 3;
            }
            let ty = self.parse_union()?;
            let has_default = self.eat('=');
            params.push(FunctionParam {
                name: String::new(),
                ty,
                has_default,
                variadic,
            });
            if self.eat(',') {
                continue;
            }
            self.expect(')', "`,` or `)`")?;
            return Ok(params);
        }
    }

    fn parse_quoted(&mut self) -> Result<String, TypeParseError> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(TypeParseError::UnexpectedEnd { expected: "a string" });
        };
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(TypeParseError::UnterminatedString { offset: start }),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(TypeParseError::UnterminatedString { offset: start }),
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Type, TypeParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        self.read_while(|c| c.is_ascii_digit());
        let is_float = self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.bump();
            self.read_while(|c| c.is_ascii_digit());
        }
        let text = &self.src[start..self.pos];
        number_literal(text, is_float).ok_or_else(|| TypeParseError::InvalidNumber {
            text: text.to_string(),
            offset: start,
        })
    }

    fn parse_named(&mut self) -> Result<Type, TypeParseError> {
        let start = self.pos;
        let name = self.read_ident();
        let lower = name.to_ascii_lowercase();

        // `int(1)`, `string(foo)`, ... directly attached to the keyword.
        if self.peek() == Some('(') {
            if let Some(literal) = self.parse_literal_form(&lower, start)? {
                return Ok(literal);
            }
        }

        let ty = match lower.as_str() {
            "int" | "integer" | "positive-int" | "negative-int" | "non-negative-int" => {
                self.skip_refinement()?;
                Type::Integer
            }
            "float" | "double" => Type::Float,
            "string" | "non-empty-string" | "class-string" | "numeric-string" => {
                // `class-string<T>` and friends refine a plain string.
                self.skip_refinement()?;
                Type::String
            }
            "bool" | "boolean" => Type::Boolean,
            "true" => Type::bool_literal(true),
            "false" => Type::bool_literal(false),
            "null" => Type::Null,
            "void" | "never" => Type::Void,
            "mixed" => Type::Mixed,
            "unknown" => Type::Unknown,
            "array-key" => ArrayType::default_key(),
            "numeric" => Union::wrap([Type::Integer, Type::Float]),
            "scalar" => Union::wrap([Type::Integer, Type::Float, Type::String, Type::Boolean]),
            "array" | "iterable" | "non-empty-array" => self.parse_array(false)?,
            "list" | "non-empty-list" => self.parse_array(true)?,
            "callable" | "closure" => self.parse_callable(name)?,
            "self" | "static" => self.self_type(name),
            _ => self.parse_class_like(name)?,
        };
        Ok(ty)
    }

    /// Literal forms such as `int(1)`. `None` when the keyword has none.
    fn parse_literal_form(
        &mut self,
        keyword: &str,
        start: usize,
    ) -> Result<Option<Type>, TypeParseError> {
        if !matches!(keyword, "int" | "float" | "string" | "bool" | "boolean") {
            return Ok(None);
        }
        self.bump();
        if keyword == "string" && matches!(self.peek(), Some('\'' | '"')) {
            let value = self.parse_quoted()?;
            self.expect(')', "`)`")?;
            return Ok(Some(Type::string_literal(value)));
        }
        let raw = self.read_balanced()?;
        let literal = match keyword {
            "int" => number_literal(raw.trim(), false),
            "float" => number_literal(raw.trim(), true),
            "string" => Some(Type::string_literal(raw)),
            _ => match raw.trim() {
                "true" => Some(Type::bool_literal(true)),
                "false" => Some(Type::bool_literal(false)),
                _ => None,
            },
        };
        literal
            .map(Some)
            .ok_or_else(|| TypeParseError::InvalidNumber {
                text: raw.to_string(),
                offset: start,
            })
    }

    /// Raw text up to the `)` that closes an already consumed `(`.
    fn read_balanced(&mut self) -> Result<&'a str, TypeParseError> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.bump() {
                None => return Err(TypeParseError::UnexpectedEnd { expected: "`)`" }),
                Some('(') => depth += 1,
                Some(')') if depth == 0 => return Ok(&self.src[start..self.pos - 1]),
                Some(')') => depth -= 1,
                Some(_) => {}
            }
        }
    }

    fn parse_array(&mut self, is_list: bool) -> Result<Type, TypeParseError> {
        match self.peek() {
            Some('<') => {
                self.bump();
                let mut args = self.parse_args()?;
                let array = match (is_list, args.len()) {
                    (_, 1) => {
                        let value = args.pop().unwrap_or(Type::Mixed);
                        if is_list {
                            ArrayType::list(value)
                        } else {
                            ArrayType::of(value)
                        }
                    }
                    (false, 2) => {
                        let value = args.pop().unwrap_or(Type::Mixed);
                        let key = args.pop().unwrap_or_else(ArrayType::default_key);
                        ArrayType::new(key, value)
                    }
                    _ => {
                        return Err(TypeParseError::UnexpectedToken {
                            found: '>',
                            offset: self.pos.saturating_sub(1),
                            expected: "one or two array type arguments",
                        });
                    }
                };
                Ok(Type::Array(array))
            }
            Some('{') => {
                self.bump();
                self.parse_shape()
            }
            _ if is_list => Ok(Type::list_of(Type::Mixed)),
            _ => Ok(Type::array_of(Type::Mixed)),
        }
    }

    /// Consume `<...>` after a scalar keyword (`int<0, max>`), if present.
    fn skip_refinement(&mut self) -> Result<(), TypeParseError> {
        if self.peek() == Some('<') {
            self.bump();
            self.parse_args()?;
        }
        Ok(())
    }

    /// Generic arguments after `<`, through the closing `>`.
    fn parse_args(&mut self) -> Result<Vec<Type>, TypeParseError> {
        let mut args = vec![self.parse_union()?];
        while self.eat(',') {
            args.push(self.parse_union()?);
        }
        self.expect('>', "`,` or `>`")?;
        Ok(args)
    }

    /// Shape items after `{`, through the closing `}`.
    fn parse_shape(&mut self) -> Result<Type, TypeParseError> {
        let mut items: Vec<KeyedItem> = Vec::new();
        let mut next_index: i64 = 0;
        loop {
            if self.eat('}') {
                break;
            }
            let (key, optional) = match self.try_shape_key()? {
                Some(keyed) => keyed,
                None => (ArrayKey::Int(next_index), false),
            };
            if let ArrayKey::Int(index) = key {
                next_index = next_index.max(index.saturating_add(1));
            }
            let value = self.parse_union()?;
            let item = KeyedItem {
                key,
                value,
                optional,
            };
            match items.iter_mut().find(|existing| existing.key == item.key) {
                Some(existing) => *existing = item,
                None => items.push(item),
            }
            if self.eat(',') {
                continue;
            }
            self.expect('}', "`,` or `}`")?;
            break;
        }
        Ok(Type::KeyedArray(KeyedArrayType::new(items)))
    }

    /// `key:` or `key?:` at the cursor. Restores the cursor when there is
    /// no key, so the item is parsed as a positional value.
    fn try_shape_key(&mut self) -> Result<Option<(ArrayKey, bool)>, TypeParseError> {
        let save = self.pos;
        self.skip_ws();
        let key = match self.peek() {
            Some('\'' | '"') => Some(ArrayKey::from_string(self.parse_quoted()?)),
            Some(c) if c.is_ascii_digit() || c == '-' => {
                let text = self.read_while(|c| c.is_ascii_digit() || c == '-');
                text.parse::<i64>().ok().map(ArrayKey::Int)
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let ident = self.read_while(|c| c.is_alphanumeric() || c == '_' || c == '-');
                Some(ArrayKey::from_string(ident))
            }
            _ => None,
        };
        let Some(key) = key else {
            self.pos = save;
            return Ok(None);
        };

        self.skip_ws();
        let optional = self.rest().starts_with("?:");
        if optional {
            self.pos += 2;
            return Ok(Some((key, true)));
        }
        if self.peek() == Some(':') && self.peek_nth(1) != Some(':') {
            self.bump();
            return Ok(Some((key, false)));
        }
        self.pos = save;
        Ok(None)
    }

    fn parse_callable(&mut self, name: &str) -> Result<Type, TypeParseError> {
        if self.peek() != Some('(') {
            let class = if name.eq_ignore_ascii_case("callable") {
                "callable"
            } else {
                "Closure"
            };
            return Ok(Type::object(class));
        }
        self.bump();
        let params = self.parse_params()?;
        let return_type = if self.eat(':') {
            self.parse_union()?
        } else {
            Type::Mixed
        };
        Ok(Type::Function(FunctionType::new(params, return_type)))
    }

    fn parse_class_like(&mut self, name: &str) -> Result<Type, TypeParseError> {
        if let Some(template) = self.ctx.template(name) {
            return Ok(template);
        }
        let canonical = self.ctx.resolve_class(name);
        if self.peek() == Some('<') {
            self.bump();
            let args = self.parse_args()?;
            return Ok(Type::generic(canonical, args));
        }
        Ok(Type::object(canonical))
    }

    fn self_type(&self, written: &str) -> Type {
        self.ctx
            .self_type()
            .unwrap_or_else(|| Type::object(written))
    }
}

fn number_literal(text: &str, is_float: bool) -> Option<Type> {
    if is_float {
        text.parse::<f64>().ok().map(Type::float_literal)
    } else {
        text.parse::<i64>().ok().map(Type::int_literal)
    }
}

#[cfg(test)]
#[path = "../tests/parser_tests.rs"]
mod tests;
