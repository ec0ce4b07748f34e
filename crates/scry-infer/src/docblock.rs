//! Doc block tags.
//!
//! Tag bodies are kept as raw text and parsed on demand with the type
//! grammar of `scry-types`, because the types depend on the unit's
//! templates and imports. Lines that do not start a tag continue the body
//! of the previous tag, so multi-line shapes work:
//!
//! ```text
//! /**
//!  * @template T of Model
//!  * @param class-string<T> $class
//!  * @return array{
//!  *   id: int,
//!  *   model: T,
//!  * }
//!  * @throws ModelNotFoundException
//!  */
//! ```

use scry_types::{TemplateType, Type, TypeNameContext, TypeParseError, parse_type_prefix};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocTag {
    /// Tag name without `@`, lower-cased.
    pub name: String,
    pub body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocBlock {
    tags: Vec<DocTag>,
}

/// Tool-specific spellings checked before the plain tag.
const RETURN_TAGS: &[&str] = &["phpstan-return", "psalm-return", "return"];
const PARAM_TAGS: &[&str] = &["phpstan-param", "psalm-param", "param"];
const VAR_TAGS: &[&str] = &["phpstan-var", "psalm-var", "var"];
const TEMPLATE_TAGS: &[&str] = &[
    "template",
    "template-covariant",
    "phpstan-template",
    "psalm-template",
];

impl DocBlock {
    pub fn parse(text: &str) -> Self {
        let mut tags: Vec<DocTag> = Vec::new();
        for raw in text.lines() {
            let line = clean_line(raw);
            if let Some(tagged) = line.strip_prefix('@') {
                let name_len = tagged
                    .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
                    .unwrap_or(tagged.len());
                let (name, body) = tagged.split_at(name_len);
                tags.push(DocTag {
                    name: name.to_ascii_lowercase(),
                    body: body.trim().to_string(),
                });
            } else if let Some(last) = tags.last_mut() {
                if !line.is_empty() {
                    if !last.body.is_empty() {
                        last.body.push('\n');
                    }
                    last.body.push_str(line);
                }
            }
        }
        Self { tags }
    }

    pub fn tags(&self) -> &[DocTag] {
        &self.tags
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }

    /// Body of the first tag named `name`.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.body.as_str())
    }

    fn first_of(&self, names: &[&'static str]) -> Option<(&'static str, &str)> {
        names
            .iter()
            .find_map(|name| self.tag(name).map(|body| (*name, body)))
    }

    /// `@return` (or a tool-specific variant), with the tag that supplied it.
    pub fn return_type(
        &self,
        ctx: &dyn TypeNameContext,
    ) -> Option<(&'static str, Result<Type, TypeParseError>)> {
        let (tag, body) = self.first_of(RETURN_TAGS)?;
        Some((tag, leading_type(body, ctx)))
    }

    /// Raw body of the first `@return` variant.
    pub fn return_text(&self) -> Option<&str> {
        self.first_of(RETURN_TAGS).map(|(_, body)| body)
    }

    pub fn override_text(&self, tag: &str) -> Option<&str> {
        self.tag(&tag.to_ascii_lowercase())
    }

    /// The vendor override tag, e.g. `@scry-return`.
    pub fn override_type(
        &self,
        tag: &str,
        ctx: &dyn TypeNameContext,
    ) -> Option<Result<Type, TypeParseError>> {
        let body = self.override_text(tag)?;
        Some(leading_type(body, ctx))
    }

    /// Type given to parameter `$name`.
    pub fn param_type(
        &self,
        name: &str,
        ctx: &dyn TypeNameContext,
    ) -> Option<Result<Type, TypeParseError>> {
        PARAM_TAGS.iter().find_map(|tag| {
            self.tags
                .iter()
                .filter(|candidate| candidate.name == *tag)
                .find_map(|candidate| match parse_type_prefix(&candidate.body, ctx) {
                    Ok((ty, rest)) => (param_name(rest) == Some(name)).then_some(Ok(ty)),
                    Err(err) => (param_name_anywhere(&candidate.body) == Some(name))
                        .then_some(Err(err)),
                })
        })
    }

    /// Every `@throws` type, in order.
    pub fn throws(&self, ctx: &dyn TypeNameContext) -> Vec<Result<Type, TypeParseError>> {
        self.tags
            .iter()
            .filter(|tag| tag.name == "throws")
            .map(|tag| leading_type(&tag.body, ctx))
            .collect()
    }

    pub fn var_type(&self, ctx: &dyn TypeNameContext) -> Option<Result<Type, TypeParseError>> {
        let (_, body) = self.first_of(VAR_TAGS)?;
        Some(leading_type(body, ctx))
    }

    /// Declared templates. Bounds are parsed with `ctx`; a bound that does
    /// not parse is dropped.
    pub fn templates(&self, ctx: &dyn TypeNameContext) -> Vec<TemplateType> {
        let mut templates: Vec<TemplateType> = Vec::new();
        for tag in self
            .tags
            .iter()
            .filter(|tag| TEMPLATE_TAGS.contains(&tag.name.as_str()))
        {
            let mut words = tag.body.splitn(2, char::is_whitespace);
            let Some(name) = words.next().filter(|name| !name.is_empty()) else {
                continue;
            };
            if templates.iter().any(|known| known.name == name) {
                continue;
            }
            let mut template = TemplateType::new(name);
            let rest = words.next().unwrap_or("").trim_start();
            let bound = rest
                .strip_prefix("of ")
                .or_else(|| rest.strip_prefix("as "));
            if let Some(bound) = bound {
                if let Ok(bound) = leading_type(bound, ctx) {
                    template = template.with_bound(bound);
                }
            }
            templates.push(template);
        }
        templates
    }
}

fn clean_line(raw: &str) -> &str {
    let line = raw.trim();
    let line = line.strip_prefix("/**").unwrap_or(line);
    let line = line.strip_suffix("*/").unwrap_or(line);
    line.trim_start_matches('*').trim()
}

/// Whether the leading type in `text` is `static` or `$this`, possibly
/// nullable or in a union.
pub fn names_receiver(text: &str) -> bool {
    let leading = text.split_whitespace().next().unwrap_or("");
    leading
        .trim_start_matches('(')
        .split('|')
        .map(|part| part.trim_start_matches('?').trim_end_matches(')'))
        .any(|part| part.eq_ignore_ascii_case("static") || part == "$this")
}

fn leading_type(body: &str, ctx: &dyn TypeNameContext) -> Result<Type, TypeParseError> {
    parse_type_prefix(body, ctx).map(|(ty, _)| ty)
}

/// `$name` (or `...$name`, `&$name`) at the start of `rest`.
fn param_name(rest: &str) -> Option<&str> {
    let rest = rest.trim_start_matches("...").trim_start_matches('&');
    let name = rest.strip_prefix('$')?;
    let end = name
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(name.len());
    Some(&name[..end])
}

fn param_name_anywhere(body: &str) -> Option<&str> {
    body.split_whitespace().find_map(param_name)
}

#[cfg(test)]
#[path = "../tests/docblock_tests.rs"]
mod tests;
