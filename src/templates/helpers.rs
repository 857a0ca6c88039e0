//! Helper library exposed to templates.
//!
//! Every helper is a pure function over JSON values and never fails on an
//! unexpected input type: container helpers fall back to `0` or `""`, string
//! helpers to `""`. The Tera registrations in [`register_helpers`] are thin
//! adapters over the functions below, which are usable directly from Rust.
//!
//! | Kind | Name | Usage |
//! |---|---|---|
//! | filter | `camel_case`, `pascal_case`, `snake_case`, `screaming_snake_case`, `kebab_case` | `{{ name \| pascal_case }}` |
//! | filter | `length`, `join`, `first`, `last`, `contains` | `{{ items \| join(sep=", ") }}` |
//! | filter | `trim`, `upper`, `lower`, `substitute` | `{{ s \| substitute(pattern="-", replacement="_") }}` |
//! | filter | `json`, `map_type`, `indent`, `string_literal` | `{{ t \| map_type(language="python") }}` |
//! | function | `eq`, `neq`, `gt`, `gte`, `lt`, `lte` | `{{ gt(a=x, b=1) }}` |
//! | function | `all`, `any`, `negate` | `{{ all(values=[a, b]) }}` |
//!
//! `and`, `or` and `not` are operators in Tera's expression grammar, so the logical
//! combinators are registered as `all`, `any` and `negate`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tera::Tera;

use crate::core::language::Language;
use crate::core::utils::{
    escape_string_literal, to_camel_case, to_kebab_case, to_pascal_case, to_screaming_snake_case,
    to_snake_case,
};

type Args = HashMap<String, Value>;

/// Most distinct `substitute` patterns kept compiled at once
const PATTERN_CACHE_CAPACITY: usize = 64;

/// `substitute` patterns compiled so far. Templates reuse a handful of patterns
/// across every tool they render.
static PATTERN_CACHE: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(Default::default);

/// Compile `pattern`, or reuse the compiled copy. Invalid patterns are not cached.
fn compiled_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut cache = PATTERN_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    if cache.len() >= PATTERN_CACHE_CAPACITY {
        cache.clear();
    }
    cache.insert(pattern.to_string(), re.clone());
    Ok(re)
}

/// Logical and over all values
pub fn all_truthy(values: &[Value]) -> bool {
    values.iter().all(is_truthy)
}

/// Logical or over all values
pub fn any_truthy(values: &[Value]) -> bool {
    values.iter().any(is_truthy)
}

/// JavaScript-style truthiness: `null`, `false`, `0` and `""` are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Order two values: numbers numerically, strings lexically, anything else unordered
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Element count of arrays, objects and strings; `0` otherwise
pub fn length(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(s) => s.chars().count(),
        _ => 0,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Join array elements; `""` for non-arrays
pub fn join(value: &Value, separator: &str) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(display)
            .collect::<Vec<_>>()
            .join(separator),
        _ => String::new(),
    }
}

/// First array element, or `""`
pub fn first(value: &Value) -> Value {
    match value {
        Value::Array(items) => items.first().cloned().unwrap_or_else(empty),
        _ => empty(),
    }
}

/// Last array element, or `""`
pub fn last(value: &Value) -> Value {
    match value {
        Value::Array(items) => items.last().cloned().unwrap_or_else(empty),
        _ => empty(),
    }
}

fn empty() -> Value {
    Value::String(String::new())
}

/// Membership: array element, substring, or object key
pub fn contains(container: &Value, needle: &Value) -> bool {
    match (container, needle) {
        (Value::Array(items), needle) => items.contains(needle),
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}

fn with_str(value: &Value, f: impl FnOnce(&str) -> String) -> String {
    value.as_str().map(f).unwrap_or_default()
}

pub fn trim(value: &Value) -> String {
    with_str(value, |s| s.trim().to_string())
}

pub fn upper(value: &Value) -> String {
    with_str(value, str::to_uppercase)
}

pub fn lower(value: &Value) -> String {
    with_str(value, str::to_lowercase)
}

/// Replace every regex match; `""` for non-strings
pub fn substitute(
    value: &Value,
    pattern: &str,
    replacement: &str,
) -> Result<String, regex::Error> {
    let Some(s) = value.as_str() else {
        return Ok(String::new());
    };
    let re = compiled_pattern(pattern)?;
    Ok(re.replace_all(s, replacement).into_owned())
}

/// Pretty-printed JSON dump
pub fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Map an abstract type name to the target language's type
pub fn map_type(type_name: &str, language: Language) -> String {
    let mapped = match (type_name, language) {
        ("string", Language::TypeScript) => "string",
        ("string", Language::Python) => "str",
        ("number", Language::TypeScript) => "number",
        ("number", Language::Python) => "float",
        ("boolean", Language::TypeScript) => "boolean",
        ("boolean", Language::Python) => "bool",
        ("array", Language::TypeScript) => "unknown[]",
        ("array", Language::Python) => "List[Any]",
        ("object", Language::TypeScript) => "Record<string, unknown>",
        ("object", Language::Python) => "Dict[str, Any]",
        ("any", Language::TypeScript) => "unknown",
        ("any", Language::Python) => "Any",
        (other, _) => other,
    };
    mapped.to_string()
}

/// Prefix every line with `spaces` spaces
pub fn indent(text: &str, spaces: usize) -> String {
    let prefix = " ".repeat(spaces);
    text.split('\n')
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn arg<'a>(args: &'a Args, name: &str) -> &'a Value {
    args.get(name).unwrap_or(&Value::Null)
}

fn str_arg<'a>(args: &'a Args, name: &str, default: &'a str) -> &'a str {
    args.get(name).and_then(Value::as_str).unwrap_or(default)
}

fn case_filter(
    convert: fn(&str) -> String,
) -> impl Fn(&Value, &Args) -> tera::Result<Value> + Send + Sync {
    move |value: &Value, _: &Args| Ok(Value::String(with_str(value, convert)))
}

fn comparison(
    accept: fn(Ordering) -> bool,
) -> impl Fn(&Args) -> tera::Result<Value> + Send + Sync {
    move |args: &Args| {
        let result = compare(arg(args, "a"), arg(args, "b")).is_some_and(accept);
        Ok(Value::Bool(result))
    }
}

fn values_arg(args: &Args) -> Vec<Value> {
    match arg(args, "values") {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Register every helper on a Tera instance, replacing same-named builtins
pub fn register_helpers(tera: &mut Tera) {
    tera.register_filter("camel_case", case_filter(to_camel_case));
    tera.register_filter("pascal_case", case_filter(to_pascal_case));
    tera.register_filter("snake_case", case_filter(to_snake_case));
    tera.register_filter("screaming_snake_case", case_filter(to_screaming_snake_case));
    tera.register_filter("kebab_case", case_filter(to_kebab_case));

    tera.register_filter("length", |value: &Value, _: &Args| {
        Ok(Value::from(length(value)))
    });
    tera.register_filter("join", |value: &Value, args: &Args| {
        Ok(Value::String(join(value, str_arg(args, "sep", ", "))))
    });
    tera.register_filter("first", |value: &Value, _: &Args| Ok(first(value)));
    tera.register_filter("last", |value: &Value, _: &Args| Ok(last(value)));
    tera.register_filter("contains", |value: &Value, args: &Args| {
        Ok(Value::Bool(contains(value, arg(args, "value"))))
    });

    tera.register_filter("trim", |value: &Value, _: &Args| Ok(Value::String(trim(value))));
    tera.register_filter("upper", |value: &Value, _: &Args| Ok(Value::String(upper(value))));
    tera.register_filter("lower", |value: &Value, _: &Args| Ok(Value::String(lower(value))));
    tera.register_filter("substitute", |value: &Value, args: &Args| {
        let pattern = str_arg(args, "pattern", "");
        let replacement = str_arg(args, "replacement", "");
        substitute(value, pattern, replacement)
            .map(Value::String)
            .map_err(|e| tera::Error::msg(format!("substitute: invalid pattern '{pattern}': {e}")))
    });

    tera.register_filter("json", |value: &Value, _: &Args| {
        Ok(Value::String(to_pretty_json(value)))
    });
    tera.register_filter("map_type", |value: &Value, args: &Args| {
        let language = Language::from_sdk(args.get("language").and_then(Value::as_str));
        Ok(Value::String(with_str(value, |t| map_type(t, language))))
    });
    tera.register_filter("indent", |value: &Value, args: &Args| {
        let spaces = args.get("spaces").and_then(Value::as_u64).unwrap_or(2) as usize;
        Ok(Value::String(with_str(value, |s| indent(s, spaces))))
    });
    tera.register_filter("string_literal", |value: &Value, args: &Args| {
        let quote = str_arg(args, "quote", "'").chars().next().unwrap_or('\'');
        Ok(Value::String(with_str(value, |s| escape_string_literal(s, quote))))
    });

    tera.register_function("eq", |args: &Args| {
        Ok(Value::Bool(arg(args, "a") == arg(args, "b")))
    });
    tera.register_function("neq", |args: &Args| {
        Ok(Value::Bool(arg(args, "a") != arg(args, "b")))
    });
    tera.register_function("gt", comparison(Ordering::is_gt));
    tera.register_function("gte", comparison(Ordering::is_ge));
    tera.register_function("lt", comparison(Ordering::is_lt));
    tera.register_function("lte", comparison(Ordering::is_le));
    tera.register_function("all", |args: &Args| {
        Ok(Value::Bool(all_truthy(&values_arg(args))))
    });
    tera.register_function("any", |args: &Args| {
        Ok(Value::Bool(any_truthy(&values_arg(args))))
    });
    tera.register_function("negate", |args: &Args| {
        Ok(Value::Bool(!is_truthy(arg(args, "value"))))
    });
}
