//! Built definitions handed to schema generators.

use std::fmt;

use indexmap::IndexMap;
use scry_types::{FunctionParam, FunctionType, TemplateType, Type};
use serde::{Serialize, Serializer};

/// Identifies an analysis unit: a free function or a class member.
///
/// Names are canonical (no leading `\`). Equality is exact; callers that
/// start from user input go through `UnitId::function`/`UnitId::method`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitId {
    Function(String),
    Method { class: String, name: String },
    /// Top-level code analysed outside any function.
    Script,
}

impl UnitId {
    pub fn function(name: &str) -> Self {
        Self::Function(name.trim_start_matches('\\').to_string())
    }

    pub fn method(class: &str, name: &str) -> Self {
        Self::Method {
            class: class.trim_start_matches('\\').to_string(),
            name: name.to_string(),
        }
    }

    /// Lower-cased form used as the identity of index entries, since PHP
    /// function, class and method names are case-insensitive.
    pub fn normalized(&self) -> Self {
        match self {
            Self::Function(name) => Self::Function(name.to_ascii_lowercase()),
            Self::Method { class, name } => Self::Method {
                class: class.to_ascii_lowercase(),
                name: name.to_ascii_lowercase(),
            },
            Self::Script => Self::Script,
        }
    }

    pub fn class(&self) -> Option<&str> {
        match self {
            Self::Method { class, .. } => Some(class),
            _ => None,
        }
    }

    pub fn member_name(&self) -> &str {
        match self {
            Self::Function(name) | Self::Method { name, .. } => name,
            Self::Script => "{main}",
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(name) => f.write_str(name),
            Self::Method { class, name } => write!(f, "{class}::{name}"),
            Self::Script => f.write_str("{main}"),
        }
    }
}

impl Serialize for UnitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParamDefinition {
    pub name: String,
    pub ty: Type,
    /// Type of the default value expression, when there is one.
    pub default: Option<Type>,
    pub variadic: bool,
}

impl ParamDefinition {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            variadic: false,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some() || self.variadic
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionLikeDefinition {
    pub name: String,
    pub params: Vec<ParamDefinition>,
    pub return_type: Type,
    exceptions: Vec<Type>,
    /// The unit whose declaration this was built from. For inherited
    /// methods this is the ancestor or trait member.
    pub defining_unit: UnitId,
    pub templates: Vec<TemplateType>,
    pub is_static: bool,
    /// The unit returns its late-static receiver (`static`, `$this`,
    /// `new static`); call sites read the declaring class as the receiver.
    pub returns_receiver: bool,
}

impl FunctionLikeDefinition {
    pub fn new(name: impl Into<String>, defining_unit: UnitId) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: Type::Unknown,
            exceptions: Vec::new(),
            defining_unit,
            templates: Vec::new(),
            is_static: false,
            returns_receiver: false,
        }
    }

    pub fn with_params(mut self, params: Vec<ParamDefinition>) -> Self {
        self.params = params;
        self
    }

    pub fn with_return_type(mut self, return_type: Type) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn exceptions(&self) -> &[Type] {
        &self.exceptions
    }

    /// Add a thrown type. The set only grows; structurally equal
    /// duplicates are ignored.
    pub fn add_exception(&mut self, exception: Type) {
        for member in exception.members() {
            if !self.exceptions.iter().any(|known| known.is_same(member)) {
                self.exceptions.push(member.clone());
            }
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamDefinition> {
        self.params.iter().find(|param| param.name == name)
    }

    /// The callable signature of this definition.
    pub fn to_function_type(&self) -> FunctionType {
        let params = self
            .params
            .iter()
            .map(|param| FunctionParam {
                name: param.name.clone(),
                ty: param.ty.clone(),
                has_default: param.default.is_some(),
                variadic: param.variadic,
            })
            .collect();
        FunctionType::new(params, self.return_type.clone()).with_exceptions(self.exceptions.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassDefinition {
    pub name: String,
    pub parent: Option<String>,
    pub templates: Vec<TemplateType>,
    pub properties: IndexMap<String, Type>,
    /// Every method visible on the class, keyed by lower-cased name, in
    /// resolution order.
    pub methods: IndexMap<String, FunctionLikeDefinition>,
}

impl ClassDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            templates: Vec::new(),
            properties: IndexMap::new(),
            methods: IndexMap::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&FunctionLikeDefinition> {
        self.methods.get(&name.to_ascii_lowercase())
    }

    pub fn property(&self, name: &str) -> Option<&Type> {
        self.properties.get(name)
    }

    /// `Name<T1, T2>` for templated classes, `Name` otherwise.
    pub fn self_type(&self) -> Type {
        crate::builders::class_type(&self.name, &self.templates)
    }
}
