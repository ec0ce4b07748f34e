//! Reflection builder: curated signatures for built-in functions and classes.
//!
//! Units without analyzable source (the runtime's own functions and
//! classes) get their definition from static tables written in the same
//! type-expression grammar as doc tags. The tables are parsed once, on
//! first use. Parameters are written as in PHP (`type $name`, `type
//! ...$name`), with an optional `= type` giving the type of the default.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use scry_types::{PlainNames, TypeParseError, parse_type, parse_type_prefix};
use tracing::warn;

use crate::definition::{FunctionLikeDefinition, ParamDefinition, UnitId};

struct Signature {
    name: &'static str,
    params: &'static [&'static str],
    returns: &'static str,
    throws: &'static [&'static str],
}

const fn sig(
    name: &'static str,
    params: &'static [&'static str],
    returns: &'static str,
) -> Signature {
    Signature {
        name,
        params,
        returns,
        throws: &[],
    }
}

const fn sig_throws(
    name: &'static str,
    params: &'static [&'static str],
    returns: &'static str,
    throws: &'static [&'static str],
) -> Signature {
    Signature {
        name,
        params,
        returns,
        throws,
    }
}

// =============================================================================
// Tables
// =============================================================================

static FUNCTIONS: &[Signature] = &[
    // strings
    sig("strlen", &["string $string"], "int"),
    sig("strtolower", &["string $string"], "string"),
    sig("strtoupper", &["string $string"], "string"),
    sig("ucfirst", &["string $string"], "string"),
    sig("lcfirst", &["string $string"], "string"),
    sig("trim", &["string $string", "string $characters = string"], "string"),
    sig("ltrim", &["string $string", "string $characters = string"], "string"),
    sig("rtrim", &["string $string", "string $characters = string"], "string"),
    sig("substr", &["string $string", "int $offset", "?int $length = null"], "string"),
    sig("strpos", &["string $haystack", "string $needle", "int $offset = 0"], "int|false"),
    sig("str_contains", &["string $haystack", "string $needle"], "bool"),
    sig("str_starts_with", &["string $haystack", "string $needle"], "bool"),
    sig("str_ends_with", &["string $haystack", "string $needle"], "bool"),
    sig(
        "str_replace",
        &["array|string $search", "array|string $replace", "array|string $subject"],
        "array|string",
    ),
    sig("str_repeat", &["string $string", "int $times"], "string"),
    sig("sprintf", &["string $format", "mixed ...$values"], "string"),
    sig("implode", &["array|string $separator", "?array $array = null"], "string"),
    sig(
        "explode",
        &["string $separator", "string $string", "int $limit = int"],
        "list<string>",
    ),
    sig(
        "number_format",
        &[
            "float $num",
            "int $decimals = 0",
            "?string $decimal_separator = '.'",
            "?string $thousands_separator = ','",
        ],
        "string",
    ),
    sig(
        "preg_match",
        &["string $pattern", "string $subject", "array $matches = null", "int $flags = 0", "int $offset = 0"],
        "int|false",
    ),
    sig(
        "preg_replace",
        &["array|string $pattern", "array|string $replacement", "array|string $subject", "int $limit = -1"],
        "array|string|null",
    ),
    sig("uniqid", &["string $prefix = ''", "bool $more_entropy = false"], "string"),
    sig("md5", &["string $string", "bool $binary = false"], "string"),
    sig("http_build_query", &["array|object $data"], "string"),
    // arrays
    sig("count", &["array|Countable $value", "int $mode = 0"], "int"),
    sig("array_keys", &["array $array"], "list<int|string>"),
    sig("array_values", &["array $array"], "list<mixed>"),
    sig("array_merge", &["array ...$arrays"], "array"),
    sig("array_map", &["?callable $callback", "array $array", "array ...$arrays"], "array"),
    sig("array_filter", &["array $array", "?callable $callback = null", "int $mode = 0"], "array"),
    sig("array_key_exists", &["int|string $key", "array $array"], "bool"),
    sig("array_search", &["mixed $needle", "array $haystack", "bool $strict = false"], "int|string|false"),
    sig("array_slice", &["array $array", "int $offset", "?int $length = null"], "array"),
    sig("array_unique", &["array $array", "int $flags = 2"], "array"),
    sig("array_flip", &["array $array"], "array<int|string>"),
    sig("array_sum", &["array $array"], "int|float"),
    sig("in_array", &["mixed $needle", "array $haystack", "bool $strict = false"], "bool"),
    sig("range", &["int|float|string $start", "int|float|string $end", "int|float $step = 1"], "list<int|float|string>"),
    sig("compact", &["array|string $var_name", "array|string ...$var_names"], "array<string, mixed>"),
    // math
    sig("abs", &["int|float $num"], "int|float"),
    sig("max", &["mixed $value", "mixed ...$values"], "mixed"),
    sig("min", &["mixed $value", "mixed ...$values"], "mixed"),
    sig("round", &["int|float $num", "int $precision = 0"], "float"),
    sig("floor", &["int|float $num"], "float"),
    sig("ceil", &["int|float $num"], "float"),
    sig_throws("intdiv", &["int $num1", "int $num2"], "int", &["DivisionByZeroError", "ArithmeticError"]),
    sig("random_int", &["int $min", "int $max"], "int"),
    // types
    sig("is_array", &["mixed $value"], "bool"),
    sig("is_string", &["mixed $value"], "bool"),
    sig("is_int", &["mixed $value"], "bool"),
    sig("is_numeric", &["mixed $value"], "bool"),
    sig("is_null", &["mixed $value"], "bool"),
    sig("intval", &["mixed $value", "int $base = 10"], "int"),
    sig("strval", &["mixed $value"], "string"),
    sig("gettype", &["mixed $value"], "string"),
    // json, time
    sig("json_encode", &["mixed $value", "int $flags = 0", "int $depth = 512"], "string|false"),
    sig("json_decode", &["string $json", "?bool $associative = null", "int $depth = 512", "int $flags = 0"], "mixed"),
    sig("time", &[], "int"),
    sig("date", &["string $format", "?int $timestamp = null"], "string"),
    sig("microtime", &["bool $as_float = false"], "string|float"),
];

static METHODS: &[(&str, Signature)] = &[
    ("Throwable", sig("getMessage", &[], "string")),
    ("Throwable", sig("getCode", &[], "int")),
    ("Throwable", sig("getPrevious", &[], "?Throwable")),
    ("Throwable", sig("getFile", &[], "string")),
    ("Throwable", sig("getLine", &[], "int")),
    ("Throwable", sig("getTrace", &[], "list<array<string, mixed>>")),
    ("Throwable", sig("getTraceAsString", &[], "string")),
    ("Throwable", sig("__toString", &[], "string")),
    (
        "Exception",
        sig(
            "__construct",
            &["string $message = ''", "int $code = 0", "?Throwable $previous = null"],
            "void",
        ),
    ),
    (
        "Error",
        sig(
            "__construct",
            &["string $message = ''", "int $code = 0", "?Throwable $previous = null"],
            "void",
        ),
    ),
    ("DateTimeInterface", sig("format", &["string $format"], "string")),
    ("DateTimeInterface", sig("getTimestamp", &[], "int")),
    (
        "DateTime",
        sig_throws(
            "__construct",
            &["string $datetime = 'now'", "?DateTimeZone $timezone = null"],
            "void",
            &["Exception"],
        ),
    ),
    ("DateTime", sig("modify", &["string $modifier"], "DateTime|false")),
    (
        "DateTimeImmutable",
        sig_throws(
            "__construct",
            &["string $datetime = 'now'", "?DateTimeZone $timezone = null"],
            "void",
            &["Exception"],
        ),
    ),
    ("DateTimeImmutable", sig("modify", &["string $modifier"], "DateTimeImmutable|false")),
    ("Countable", sig("count", &[], "int")),
    ("JsonSerializable", sig("jsonSerialize", &[], "mixed")),
    ("Stringable", sig("__toString", &[], "string")),
];

/// `(class, parent)` pairs of the built-in class hierarchy, lower-cased.
static PARENTS: &[(&str, &str)] = &[
    ("exception", "Throwable"),
    ("error", "Throwable"),
    ("errorexception", "Exception"),
    ("jsonexception", "Exception"),
    ("logicexception", "Exception"),
    ("runtimeexception", "Exception"),
    ("badfunctioncallexception", "LogicException"),
    ("badmethodcallexception", "BadFunctionCallException"),
    ("domainexception", "LogicException"),
    ("invalidargumentexception", "LogicException"),
    ("lengthexception", "LogicException"),
    ("outofrangeexception", "LogicException"),
    ("outofboundsexception", "RuntimeException"),
    ("overflowexception", "RuntimeException"),
    ("rangeexception", "RuntimeException"),
    ("underflowexception", "RuntimeException"),
    ("unexpectedvalueexception", "RuntimeException"),
    ("typeerror", "Error"),
    ("argumentcounterror", "TypeError"),
    ("valueerror", "Error"),
    ("arithmeticerror", "Error"),
    ("divisionbyzeroerror", "ArithmeticError"),
    ("assertionerror", "Error"),
    ("unhandledmatcherror", "Error"),
    ("datetime", "DateTimeInterface"),
    ("datetimeimmutable", "DateTimeInterface"),
];

/// Built-in classes without a parent.
const ROOTS: &[&str] = &[
    "throwable",
    "datetimeinterface",
    "datetimezone",
    "dateinterval",
    "countable",
    "jsonserializable",
    "stringable",
    "stdclass",
    "closure",
];

// =============================================================================
// Parsed tables
// =============================================================================

static FUNCTION_TABLE: Lazy<FxHashMap<String, FunctionLikeDefinition>> = Lazy::new(|| {
    FUNCTIONS
        .iter()
        .filter_map(|signature| {
            let unit = UnitId::function(signature.name);
            build(&unit, signature).map(|definition| (signature.name.to_ascii_lowercase(), definition))
        })
        .collect()
});

static METHOD_TABLE: Lazy<FxHashMap<(String, String), FunctionLikeDefinition>> = Lazy::new(|| {
    METHODS
        .iter()
        .filter_map(|(class, signature)| {
            let unit = UnitId::method(class, signature.name);
            build(&unit, signature).map(|definition| {
                (
                    (class.to_ascii_lowercase(), signature.name.to_ascii_lowercase()),
                    definition,
                )
            })
        })
        .collect()
});

fn build(unit: &UnitId, signature: &Signature) -> Option<FunctionLikeDefinition> {
    match parse_signature(unit, signature) {
        Ok(definition) => Some(definition),
        Err(err) => {
            warn!(unit = %unit, error = %err, "reflection: skipping unparsable built-in");
            None
        }
    }
}

fn parse_signature(
    unit: &UnitId,
    signature: &Signature,
) -> Result<FunctionLikeDefinition, TypeParseError> {
    let params = signature
        .params
        .iter()
        .map(|param| parse_param(param))
        .collect::<Result<Vec<_>, _>>()?;
    let mut definition = FunctionLikeDefinition::new(signature.name, unit.clone())
        .with_params(params)
        .with_return_type(parse_type(signature.returns)?);
    for exception in signature.throws {
        definition.add_exception(parse_type(exception)?);
    }
    Ok(definition)
}

/// `type [...]$name [= default-type]`
fn parse_param(src: &str) -> Result<ParamDefinition, TypeParseError> {
    let (ty, rest) = parse_type_prefix(src, &PlainNames)?;
    let variadic = rest.starts_with("...");
    let rest = rest.trim_start_matches("...").trim_start_matches('$');
    let (name, default) = match rest.split_once('=') {
        Some((name, default)) => (name.trim(), Some(parse_type(default.trim())?)),
        None => (rest.trim(), None),
    };
    Ok(ParamDefinition {
        name: name.to_string(),
        ty,
        default,
        variadic,
    })
}

// =============================================================================
// Lookups
// =============================================================================

/// Definition of a built-in function, by (case-insensitive) name.
pub fn builtin_function(name: &str) -> Option<FunctionLikeDefinition> {
    FUNCTION_TABLE
        .get(&name.trim_start_matches('\\').to_ascii_lowercase())
        .cloned()
}

/// Definition of a built-in method, looked up on `class` and then on its
/// built-in ancestors.
pub fn builtin_method(class: &str, name: &str) -> Option<FunctionLikeDefinition> {
    let method = name.to_ascii_lowercase();
    let mut current = Some(class.trim_start_matches('\\').to_string());
    while let Some(class) = current {
        let key = (class.to_ascii_lowercase(), method.clone());
        if let Some(definition) = METHOD_TABLE.get(&key) {
            return Some(definition.clone());
        }
        current = builtin_parent(&class).map(str::to_string);
    }
    None
}

/// Parent of a built-in class (`InvalidArgumentException` ->
/// `LogicException`). Interfaces count as parents of their implementors.
pub fn builtin_parent(class: &str) -> Option<&'static str> {
    let key = class.trim_start_matches('\\').to_ascii_lowercase();
    PARENTS
        .iter()
        .find(|(child, _)| *child == key)
        .map(|(_, parent)| *parent)
}

/// True for classes the runtime declares.
pub fn is_builtin_class(class: &str) -> bool {
    let key = class.trim_start_matches('\\').to_ascii_lowercase();
    ROOTS.contains(&key.as_str()) || PARENTS.iter().any(|(child, _)| *child == key)
}

#[cfg(test)]
#[path = "../../tests/reflection_tests.rs"]
mod tests;
