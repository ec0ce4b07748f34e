//! Source reflector: finds the declaration behind a unit identifier.
//!
//! Method lookup follows an explicit resolution order instead of virtual
//! dispatch:
//!
//! 1. the class's own declaration
//! 2. the traits it uses, in declared order (each trait's own traits
//!    right after it)
//! 3. the parent chain, each ancestor expanded the same way
//! 4. implemented interfaces (signature-only members)
//!
//! The first class in that order declaring the member wins. A missing
//! declaration is a `NotFound` error, which callers treat as "no static
//! information" rather than a failure. Resolutions are cached for the
//! lifetime of the reflector.

use std::cell::RefCell;
use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use scry_ast::{ClassHandle, FunctionDecl, SourceFile, SourceIndex};
use scry_types::{ClassHierarchy, same_class_name};
use tracing::trace;

use crate::builders::reflection;
use crate::definition::UnitId;
use crate::error::InferError;
use crate::scope::NameResolver;

/// The declaration a unit resolved to.
#[derive(Clone, Debug)]
pub struct ResolvedUnit<'s> {
    pub decl: &'s FunctionDecl,
    pub file: &'s SourceFile,
    /// Declaring class or trait, `None` for free functions.
    pub class: Option<ClassHandle<'s>>,
    /// The unit that actually declares the member (`Parent::method` for an
    /// inherited method).
    pub declaring: UnitId,
}

pub struct SourceReflector<'s> {
    source: &'s SourceIndex,
    cache: RefCell<FxHashMap<UnitId, Option<ResolvedUnit<'s>>>>,
}

impl<'s> SourceReflector<'s> {
    pub fn new(source: &'s SourceIndex) -> Self {
        Self {
            source,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn source(&self) -> &'s SourceIndex {
        self.source
    }

    pub fn class(&self, name: &str) -> Option<ClassHandle<'s>> {
        self.source.class(name)
    }

    pub fn resolve(&self, unit: &UnitId) -> Result<ResolvedUnit<'s>, InferError> {
        let key = unit.normalized();
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone().ok_or_else(|| InferError::NotFound { unit: unit.clone() });
        }

        let resolved = match unit {
            UnitId::Function(name) => self.source.function(name).map(|handle| ResolvedUnit {
                decl: handle.decl,
                file: handle.file,
                class: None,
                declaring: UnitId::function(&handle.decl.name),
            }),
            UnitId::Method { class, name } => self.find_method(class, name),
            UnitId::Script => None,
        };
        trace!(unit = %unit, found = resolved.is_some(), "reflector: resolve");

        self.cache.borrow_mut().insert(key, resolved.clone());
        resolved.ok_or_else(|| InferError::NotFound { unit: unit.clone() })
    }

    fn find_method(&self, class: &str, name: &str) -> Option<ResolvedUnit<'s>> {
        self.resolution_order(class).into_iter().find_map(|handle| {
            handle.decl.method(name).map(|decl| ResolvedUnit {
                decl,
                file: handle.file,
                class: Some(handle),
                declaring: UnitId::method(&handle.decl.name, &decl.name),
            })
        })
    }

    /// Resolver for names written inside `class`.
    pub fn resolver_for(&self, class: ClassHandle<'s>) -> NameResolver<'s> {
        let plain = NameResolver::new(&class.file.imports);
        let parent = class.decl.parent.as_deref().map(|parent| plain.resolve(parent));
        plain.with_class(&class.decl.name, parent)
    }

    /// Canonical parent name of `class`, whether or not it is in the index.
    pub fn parent_name(&self, class: ClassHandle<'s>) -> Option<String> {
        let resolver = NameResolver::new(&class.file.imports);
        class.decl.parent.as_deref().map(|parent| resolver.resolve(parent))
    }

    /// Classes and traits searched for members of `class`, in order.
    pub fn resolution_order(&self, class: &str) -> Vec<ClassHandle<'s>> {
        let mut order = Vec::new();
        let mut visited = FxHashSet::default();
        let mut interfaces = VecDeque::new();

        let mut current = self.source.class(class);
        while let Some(handle) = current {
            if !visited.insert(handle.decl.name.to_ascii_lowercase()) {
                break;
            }
            order.push(handle);
            self.push_traits(handle, &mut order, &mut visited);
            let resolver = NameResolver::new(&handle.file.imports);
            interfaces.extend(
                handle
                    .decl
                    .interfaces
                    .iter()
                    .map(|interface| resolver.resolve(interface)),
            );
            current = self
                .parent_name(handle)
                .and_then(|parent| self.source.class(&parent));
        }

        // Interfaces come last, breadth first, each level in declared order.
        while let Some(interface) = interfaces.pop_front() {
            let Some(handle) = self.source.class(&interface) else {
                continue;
            };
            if !visited.insert(handle.decl.name.to_ascii_lowercase()) {
                continue;
            }
            order.push(handle);
            let resolver = NameResolver::new(&handle.file.imports);
            // Interfaces list the interfaces they extend.
            interfaces.extend(
                handle
                    .decl
                    .interfaces
                    .iter()
                    .map(|parent| resolver.resolve(parent)),
            );
        }
        order
    }

    fn push_traits(
        &self,
        class: ClassHandle<'s>,
        order: &mut Vec<ClassHandle<'s>>,
        visited: &mut FxHashSet<String>,
    ) {
        let resolver = NameResolver::new(&class.file.imports);
        for name in &class.decl.traits {
            let Some(handle) = self.source.class(&resolver.resolve(name)) else {
                continue;
            };
            if visited.insert(handle.decl.name.to_ascii_lowercase()) {
                order.push(handle);
                self.push_traits(handle, order, visited);
            }
        }
    }

    /// Every ancestor name of `class`: indexed classes, the first external
    /// parent and its built-in ancestors.
    pub fn ancestor_names(&self, class: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut pending = vec![class.trim_start_matches('\\').to_string()];
        let mut visited = FxHashSet::default();

        while let Some(name) = pending.pop() {
            if !visited.insert(name.to_ascii_lowercase()) {
                continue;
            }
            match self.source.class(&name) {
                Some(handle) => {
                    let resolver = NameResolver::new(&handle.file.imports);
                    let parents = handle
                        .decl
                        .parent
                        .iter()
                        .chain(&handle.decl.interfaces)
                        .chain(&handle.decl.traits)
                        .map(|parent| resolver.resolve(parent));
                    let mut parents: Vec<String> = parents.collect();
                    parents.reverse();
                    pending.extend(parents);
                    names.push(handle.decl.name.clone());
                }
                None => {
                    if let Some(parent) = reflection::builtin_parent(&name) {
                        pending.push(parent.to_string());
                    }
                    names.push(name);
                }
            }
        }
        names
    }
}

impl ClassHierarchy for SourceReflector<'_> {
    fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool {
        if same_class_name(child, ancestor) {
            return true;
        }
        self.ancestor_names(child)
            .iter()
            .any(|name| same_class_name(name, ancestor))
    }
}

#[cfg(test)]
#[path = "../tests/reflector_tests.rs"]
mod tests;
