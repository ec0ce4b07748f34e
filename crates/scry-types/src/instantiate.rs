//! Template substitution.
//!
//! Replaces `TemplateType` occurrences with concrete arguments, e.g. reading
//! `get(): T` through a `Collection<User>` receiver yields `get(): User`.

use rustc_hash::FxHashMap;

use crate::keyed_array::{KeyedArrayType, KeyedItem};
use crate::types::{ArrayType, FunctionParam, FunctionType, Generic, TemplateType, Type};
use crate::union::Union;

/// Mapping from template name to the type it stands for.
#[derive(Clone, Debug, Default)]
pub struct TemplateSubstitution {
    map: FxHashMap<String, Type>,
}

impl TemplateSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair declared templates with supplied arguments.
    ///
    /// Templates without a matching argument are bound to `void`.
    pub fn from_pairs(templates: &[TemplateType], args: &[Type]) -> Self {
        let mut subst = Self::new();
        for (i, template) in templates.iter().enumerate() {
            let arg = args.get(i).cloned().unwrap_or(Type::Void);
            subst.insert(template.name.clone(), arg);
        }
        subst
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: Type) {
        self.map.insert(name.into(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.map.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Apply `subst` to every template reachable from `ty`.
pub fn instantiate_type(ty: &Type, subst: &TemplateSubstitution) -> Type {
    if subst.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::Template(template) => match subst.get(&template.name) {
            Some(replacement) => replacement.clone(),
            None => Type::Template(TemplateType {
                name: template.name.clone(),
                bound: template
                    .bound
                    .as_ref()
                    .map(|bound| Box::new(instantiate_type(bound, subst))),
            }),
        },
        Type::Array(array) => Type::Array(ArrayType {
            key: Box::new(instantiate_type(&array.key, subst)),
            value: Box::new(instantiate_type(&array.value, subst)),
            is_list: array.is_list,
        }),
        Type::KeyedArray(shape) => Type::KeyedArray(KeyedArrayType::new(
            shape
                .items()
                .iter()
                .map(|item| KeyedItem {
                    key: item.key.clone(),
                    value: instantiate_type(&item.value, subst),
                    optional: item.optional,
                })
                .collect(),
        )),
        Type::Generic(generic) => Type::Generic(Generic {
            name: generic.name.clone(),
            args: generic
                .args
                .iter()
                .map(|arg| instantiate_type(arg, subst))
                .collect(),
        }),
        Type::Function(function) => Type::Function(FunctionType {
            params: function
                .params
                .iter()
                .map(|param| FunctionParam {
                    ty: instantiate_type(&param.ty, subst),
                    ..param.clone()
                })
                .collect(),
            return_type: Box::new(instantiate_type(&function.return_type, subst)),
            exceptions: function
                .exceptions
                .iter()
                .map(|exception| instantiate_type(exception, subst))
                .collect(),
        }),
        Type::Union(union) => Union::wrap(union.iter().map(|member| instantiate_type(member, subst))),
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
