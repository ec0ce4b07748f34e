//! Local bindings and name resolution for one analysis unit.
//!
//! A `Scope` maps local variable names to their current types. Closures and
//! arrow functions get a `child` scope: lookups fall through to the parent,
//! writes stay local. The `NameResolver` turns names as written into
//! canonical class and function names using the import table of the file
//! being analysed; it is fixed for the whole unit.

use rustc_hash::FxHashMap;
use scry_ast::ImportTable;
use scry_types::Type;

use crate::index::DefinitionIndex;

/// Resolves short and aliased names against one file's `namespace`/`use`
/// statements and the enclosing class.
#[derive(Clone, Debug)]
pub struct NameResolver<'a> {
    imports: &'a ImportTable,
    self_class: Option<String>,
    parent_class: Option<String>,
}

impl<'a> NameResolver<'a> {
    pub fn new(imports: &'a ImportTable) -> Self {
        Self {
            imports,
            self_class: None,
            parent_class: None,
        }
    }

    /// Resolve `self`/`static` to `class` and `parent` to `parent` (both
    /// canonical).
    pub fn with_class(mut self, class: &str, parent: Option<String>) -> Self {
        self.self_class = Some(class.trim_start_matches('\\').to_string());
        self.parent_class = parent;
        self
    }

    pub fn imports(&self) -> &'a ImportTable {
        self.imports
    }

    pub fn self_class(&self) -> Option<&str> {
        self.self_class.as_deref()
    }

    pub fn parent_class(&self) -> Option<&str> {
        self.parent_class.as_deref()
    }

    /// Canonical class name for a name as written.
    ///
    /// - `\Foo\Bar` is already fully qualified
    /// - `self`, `static` and `parent` refer to the enclosing class
    /// - the first segment is looked up among the `use` aliases
    /// - anything else is relative to the current namespace
    pub fn resolve(&self, name: &str) -> String {
        if let Some(qualified) = name.strip_prefix('\\') {
            return qualified.to_string();
        }
        match name.to_ascii_lowercase().as_str() {
            "self" | "static" => {
                if let Some(class) = &self.self_class {
                    return class.clone();
                }
            }
            "parent" => {
                if let Some(parent) = &self.parent_class {
                    return parent.clone();
                }
            }
            _ => {}
        }

        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };
        if let Some(target) = self.imports.alias(first) {
            return match rest {
                Some(rest) => format!("{target}\\{rest}"),
                None => target.to_string(),
            };
        }
        self.in_namespace(name)
    }

    /// Candidate canonical names for a function call, most specific first.
    ///
    /// Unqualified function names fall back to the global namespace.
    pub fn function_candidates(&self, name: &str) -> Vec<String> {
        if let Some(qualified) = name.strip_prefix('\\') {
            return vec![qualified.to_string()];
        }
        if name.contains('\\') {
            return vec![self.resolve(name)];
        }
        let local = self.in_namespace(name);
        if local == name {
            vec![local]
        } else {
            vec![local, name.to_string()]
        }
    }

    fn in_namespace(&self, name: &str) -> String {
        match &self.imports.namespace {
            Some(namespace) => format!("{namespace}\\{name}"),
            None => name.to_string(),
        }
    }
}

/// Variable bindings of one unit (or closure), plus what expression hooks
/// need to look things up.
#[derive(Debug)]
pub struct Scope<'a> {
    bindings: FxHashMap<String, Type>,
    resolver: NameResolver<'a>,
    parent: Option<&'a Scope<'a>>,
    index: &'a DefinitionIndex,
    this_type: Option<Type>,
}

/// A copy of a scope's own bindings, taken before a branch.
pub type Bindings = FxHashMap<String, Type>;

impl<'a> Scope<'a> {
    pub fn new(resolver: NameResolver<'a>, index: &'a DefinitionIndex) -> Self {
        Self {
            bindings: FxHashMap::default(),
            resolver,
            parent: None,
            index,
            this_type: None,
        }
    }

    /// Type of `$this` inside the scope.
    pub fn with_this(mut self, this_type: Type) -> Self {
        self.this_type = Some(this_type);
        self
    }

    /// A nested scope that sees this scope's bindings but writes locally.
    pub fn child(&self) -> Scope<'_> {
        Scope {
            bindings: FxHashMap::default(),
            resolver: self.resolver.clone(),
            parent: Some(self),
            index: self.index,
            this_type: self.this_type.clone(),
        }
    }

    /// Like `child`, without `$this` (static closures).
    pub fn static_child(&self) -> Scope<'_> {
        let mut child = self.child();
        child.this_type = None;
        child
    }

    pub fn bind(&mut self, name: impl Into<String>, ty: Type) {
        self.bindings.insert(name.into(), ty);
    }

    pub fn lookup(&self, name: &str) -> Option<Type> {
        if name == "this" {
            return self.this_type.clone();
        }
        match self.bindings.get(name) {
            Some(ty) => Some(ty.clone()),
            None => self.parent.and_then(|parent| parent.lookup(name)),
        }
    }

    pub fn resolve(&self, name: &str) -> String {
        self.resolver.resolve(name)
    }

    pub fn resolver(&self) -> &NameResolver<'a> {
        &self.resolver
    }

    pub fn index(&self) -> &'a DefinitionIndex {
        self.index
    }

    pub fn this_type(&self) -> Option<&Type> {
        self.this_type.as_ref()
    }

    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    pub fn snapshot(&self) -> Bindings {
        self.bindings.clone()
    }

    pub fn restore(&mut self, bindings: Bindings) {
        self.bindings = bindings;
    }
}

/// Merge the bindings at the end of alternative branches.
///
/// A variable bound in several branches gets the union of its types, in
/// branch order. With no live branch the result is empty.
pub fn merge_bindings(branches: &[Bindings]) -> Bindings {
    let mut names: Vec<&String> = Vec::new();
    for branch in branches {
        for name in branch.keys() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let types = branches
                .iter()
                .filter_map(|branch| branch.get(name).cloned());
            (name.clone(), scry_types::Union::wrap(types))
        })
        .collect()
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod tests;
