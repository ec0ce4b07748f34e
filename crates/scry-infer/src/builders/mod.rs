//! Definition builders.
//!
//! Three strategies produce a `FunctionLikeDefinition` for a unit:
//!
//! | Builder | Reads | Used for |
//! |---------|-------|----------|
//! | [`declaration`] | signature hints and doc tags | `Shallow` entries, bodiless units |
//! | [`body`] (+ [`expr`]) | executable statements | `Full` entries |
//! | [`reflection`] | static tables | built-in functions and classes |
//!
//! `crate::precedence` combines their return types into the final one.

pub mod body;
pub mod declaration;
mod expr;
pub mod reflection;

use scry_ast::{ClassHandle, SourceIndex};
use scry_types::{TemplateType, Type, TypeNameContext};

use crate::docblock::DocBlock;
use crate::reflector::{ResolvedUnit, SourceReflector};
use crate::scope::NameResolver;

/// Name context of one unit: its imports, enclosing class and the
/// templates in scope (the unit's own first, then the class's).
#[derive(Clone, Debug)]
pub struct UnitEnv<'a> {
    resolver: NameResolver<'a>,
    source: &'a SourceIndex,
    templates: Vec<TemplateType>,
    self_type: Option<Type>,
}

impl<'a> UnitEnv<'a> {
    pub fn new(resolver: NameResolver<'a>, source: &'a SourceIndex) -> Self {
        Self {
            resolver,
            source,
            templates: Vec::new(),
            self_type: None,
        }
    }

    /// Environment of a class body: class templates and `self` type.
    pub fn for_class(reflector: &SourceReflector<'a>, class: ClassHandle<'a>) -> Self {
        let mut env = Self::new(reflector.resolver_for(class), reflector.source());
        if let Some(doc) = &class.decl.doc {
            let templates = DocBlock::parse(doc.text()).templates(&env);
            env.templates = templates;
        }
        env.self_type = Some(class_type(&class.decl.name, &env.templates));
        env
    }

    /// Environment of a resolved unit, including its own `@template`s.
    pub fn for_unit(reflector: &SourceReflector<'a>, unit: &ResolvedUnit<'a>) -> Self {
        let mut env = match unit.class {
            Some(class) => Self::for_class(reflector, class),
            None => Self::new(NameResolver::new(&unit.file.imports), reflector.source()),
        };
        if let Some(doc) = &unit.decl.doc {
            let own = DocBlock::parse(doc.text()).templates(&env);
            env.push_templates(own);
        }
        env
    }

    /// Add templates in front, shadowing templates of the same name.
    pub fn push_templates(&mut self, templates: Vec<TemplateType>) {
        self.templates.retain(|known| !templates.iter().any(|new| new.name == known.name));
        let mut merged = templates;
        merged.append(&mut self.templates);
        self.templates = merged;
    }

    pub fn resolver(&self) -> &NameResolver<'a> {
        &self.resolver
    }

    pub fn templates(&self) -> &[TemplateType] {
        &self.templates
    }

    pub fn self_class_type(&self) -> Option<&Type> {
        self.self_type.as_ref()
    }

    /// Canonical class name for a name as written.
    ///
    /// An unqualified name that is not declared in the current namespace
    /// but names a built-in class refers to the built-in.
    pub fn resolve_class(&self, name: &str) -> String {
        let resolved = self.resolver.resolve(name);
        if !name.contains('\\')
            && self.source.class(&resolved).is_none()
            && reflection::is_builtin_class(name)
        {
            return name.to_string();
        }
        resolved
    }
}

impl TypeNameContext for UnitEnv<'_> {
    fn template(&self, name: &str) -> Option<Type> {
        self.templates
            .iter()
            .find(|template| template.name == name)
            .map(|template| Type::Template(template.clone()))
    }

    fn resolve_class(&self, name: &str) -> String {
        UnitEnv::resolve_class(self, name)
    }

    fn self_type(&self) -> Option<Type> {
        self.self_type.clone()
    }
}

/// `Name<T1, T2>` for a templated class, `Name` otherwise.
pub fn class_type(name: &str, templates: &[TemplateType]) -> Type {
    if templates.is_empty() {
        Type::object(name)
    } else {
        Type::generic(
            name,
            templates
                .iter()
                .map(|template| Type::Template(template.clone()))
                .collect(),
        )
    }
}
