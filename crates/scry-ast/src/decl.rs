//! Declarations: classes, traits, functions, methods and their signatures.

use bitflags::bitflags;
use std::fmt;

use crate::expr::Expr;
use crate::stmt::Stmt;

bitflags! {
    /// Modifiers on methods and properties.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        const STATIC = 1 << 0;
        const ABSTRACT = 1 << 1;
        const FINAL = 1 << 2;
        const PRIVATE = 1 << 3;
        const PROTECTED = 1 << 4;
        const READONLY = 1 << 5;
    }
}

/// A native signature type as written in the source (`?int`, `int|string`, `Foo`).
///
/// Hints render back to the same text, which the type-expression parser
/// turns into a `Type`; doc tags and hints therefore share one grammar.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeHint {
    Named(String),
    Nullable(Box<TypeHint>),
    Union(Vec<TypeHint>),
}

impl TypeHint {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn nullable(inner: TypeHint) -> Self {
        Self::Nullable(Box::new(inner))
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Nullable(inner) => write!(f, "?{inner}"),
            Self::Union(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

/// Raw text of a `/** ... */` block attached to a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocComment(pub String);

impl DocComment {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    /// Name without the leading `$`.
    pub name: String,
    pub hint: Option<TypeHint>,
    pub default: Option<Expr>,
    pub variadic: bool,
    pub by_ref: bool,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint: None,
            default: None,
            variadic: false,
            by_ref: false,
        }
    }

    pub fn with_hint(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// A free function or a method.
///
/// `body` is `None` for abstract methods, interface members and stubs.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    /// Canonical name for free functions (`App\helpers\format`), plain
    /// member name for methods.
    pub name: String,
    pub params: Vec<Param>,
    pub return_hint: Option<TypeHint>,
    pub doc: Option<DocComment>,
    pub body: Option<Vec<Stmt>>,
    pub flags: MemberFlags,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_hint: None,
            doc: None,
            body: None,
            flags: MemberFlags::empty(),
        }
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn with_return_hint(mut self, hint: TypeHint) -> Self {
        self.return_hint = Some(hint);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(DocComment::new(doc));
        self
    }

    pub fn with_body(mut self, body: Vec<Stmt>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub hint: Option<TypeHint>,
    pub doc: Option<DocComment>,
    pub default: Option<Expr>,
    pub flags: MemberFlags,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint: None,
            doc: None,
            default: None,
            flags: MemberFlags::empty(),
        }
    }

    pub fn with_hint(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(DocComment::new(doc));
        self
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

/// A class-like declaration.
///
/// `name` is canonical; `parent`, `interfaces` and `traits` are kept as
/// written and resolved through the declaring file's import table.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub kind: ClassKind,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub traits: Vec<String>,
    pub doc: Option<DocComment>,
    pub properties: Vec<PropertyDecl>,
    pub methods: Vec<FunctionDecl>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            parent: None,
            interfaces: Vec::new(),
            traits: Vec::new(),
            doc: None,
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_traits(mut self, traits: Vec<String>) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(DocComment::new(doc));
        self
    }

    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_method(mut self, method: FunctionDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Own method by name (PHP method names are case-insensitive).
    pub fn method(&self, name: &str) -> Option<&FunctionDecl> {
        self.methods
            .iter()
            .find(|method| method.name.eq_ignore_ascii_case(name))
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.iter().find(|property| property.name == name)
    }
}
