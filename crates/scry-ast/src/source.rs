//! Loaded source files and the index the engine looks declarations up in.
//!
//! Class and function names are case-insensitive in PHP, so the index keys
//! are lower-cased canonical names without a leading `\`.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::decl::{ClassDecl, FunctionDecl};

/// The `namespace` and `use` statements of one file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportTable {
    pub namespace: Option<String>,
    /// Lower-cased alias -> canonical target (`"carbon"` -> `"Carbon\\Carbon"`).
    aliases: IndexMap<String, String>,
}

impl ImportTable {
    pub fn new(namespace: Option<&str>) -> Self {
        Self {
            namespace: namespace
                .map(|ns| ns.trim_matches('\\').to_string())
                .filter(|ns| !ns.is_empty()),
            aliases: IndexMap::new(),
        }
    }

    /// Record `use Target;` or `use Target as Alias;`.
    pub fn add_use(&mut self, target: &str, alias: Option<&str>) {
        let target = target.trim_start_matches('\\');
        let alias = match alias {
            Some(alias) => alias,
            None => target.rsplit('\\').next().unwrap_or(target),
        };
        self.aliases
            .insert(alias.to_ascii_lowercase(), target.to_string());
    }

    pub fn with_use(mut self, target: &str, alias: Option<&str>) -> Self {
        self.add_use(target, alias);
        self
    }

    pub fn alias(&self, alias: &str) -> Option<&str> {
        self.aliases
            .get(&alias.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceFile {
    pub path: String,
    pub imports: ImportTable,
    pub classes: Vec<ClassDecl>,
    pub functions: Vec<FunctionDecl>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, imports: ImportTable) -> Self {
        Self {
            path: path.into(),
            imports,
            classes: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: ClassDecl) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_function(mut self, function: FunctionDecl) -> Self {
        self.functions.push(function);
        self
    }
}

/// A class declaration together with the file that declares it.
#[derive(Copy, Clone, Debug)]
pub struct ClassHandle<'a> {
    pub decl: &'a ClassDecl,
    pub file: &'a SourceFile,
}

/// A free function declaration together with the file that declares it.
#[derive(Copy, Clone, Debug)]
pub struct FunctionHandle<'a> {
    pub decl: &'a FunctionDecl,
    pub file: &'a SourceFile,
}

/// All source files of one generation run, indexed by canonical name.
#[derive(Debug, Default)]
pub struct SourceIndex {
    files: Vec<SourceFile>,
    /// Lower-cased canonical name -> (file index, class index).
    classes: FxHashMap<String, (usize, usize)>,
    /// Lower-cased canonical name -> (file index, function index).
    functions: FxHashMap<String, (usize, usize)>,
}

/// Lower-cased lookup key for a canonical class or function name.
pub fn index_key(name: &str) -> String {
    name.trim_start_matches('\\').to_ascii_lowercase()
}

impl SourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. A later declaration of an already indexed name replaces
    /// the earlier one.
    pub fn add_file(&mut self, file: SourceFile) {
        let file_idx = self.files.len();
        for (i, class) in file.classes.iter().enumerate() {
            self.classes.insert(index_key(&class.name), (file_idx, i));
        }
        for (i, function) in file.functions.iter().enumerate() {
            self.functions
                .insert(index_key(&function.name), (file_idx, i));
        }
        self.files.push(file);
    }

    pub fn with_file(mut self, file: SourceFile) -> Self {
        self.add_file(file);
        self
    }

    pub fn class(&self, name: &str) -> Option<ClassHandle<'_>> {
        let &(file_idx, class_idx) = self.classes.get(&index_key(name))?;
        let file = self.files.get(file_idx)?;
        Some(ClassHandle {
            decl: file.classes.get(class_idx)?,
            file,
        })
    }

    pub fn function(&self, name: &str) -> Option<FunctionHandle<'_>> {
        let &(file_idx, fn_idx) = self.functions.get(&index_key(name))?;
        let file = self.files.get(file_idx)?;
        Some(FunctionHandle {
            decl: file.functions.get(fn_idx)?,
            file,
        })
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn classes(&self) -> impl Iterator<Item = ClassHandle<'_>> {
        self.files.iter().flat_map(|file| {
            file.classes
                .iter()
                .map(move |decl| ClassHandle { decl, file })
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = FunctionHandle<'_>> {
        self.files.iter().flat_map(|file| {
            file.functions
                .iter()
                .map(move |decl| FunctionHandle { decl, file })
        })
    }
}

#[cfg(test)]
#[path = "../tests/source_tests.rs"]
mod tests;
