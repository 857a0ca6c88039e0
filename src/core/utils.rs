//! String transformation utilities for code generation
//!
//! All case conversions normalize through [`to_snake_case`] first, so mixed inputs
//! such as `getUser-by_id` convert consistently across every target style.

/// Converts a string to snake_case.
///
/// Handles camelCase, PascalCase, kebab-case and space-separated input.
/// Runs of capitals are not split (`HTTPResponse` becomes `httpresponse`).
///
/// # Examples
/// ```
/// use mcpforge::core::utils::to_snake_case;
///
/// assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
/// assert_eq!(to_snake_case("find-pets-by-status"), "find_pets_by_status");
/// assert_eq!(to_snake_case("get HTTP Response"), "get_http_response");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_is_lowercase = false;

    for ch in s.chars() {
        if ch.is_uppercase() {
            if prev_is_lowercase {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
            prev_is_lowercase = false;
        } else if ch.is_alphanumeric() {
            result.push(ch);
            prev_is_lowercase = ch.is_lowercase() || ch.is_ascii_digit();
        } else if matches!(ch, '-' | '_' | ' ' | '.') {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_is_lowercase = false;
        }
    }

    result.trim_matches('_').to_string()
}

/// Converts a string to PascalCase for type and class names.
///
/// # Examples
/// ```
/// use mcpforge::core::utils::to_pascal_case;
///
/// assert_eq!(to_pascal_case("say_hello"), "SayHello");
/// assert_eq!(to_pascal_case("rate-limit"), "RateLimit");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

/// Converts a string to camelCase.
pub fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Converts a string to SCREAMING_SNAKE_CASE for constants and error codes.
pub fn to_screaming_snake_case(s: &str) -> String {
    to_snake_case(s).to_uppercase()
}

/// Converts a string to kebab-case.
pub fn to_kebab_case(s: &str) -> String {
    to_snake_case(s).replace('_', "-")
}

/// Escapes a string for use inside a quoted string literal.
///
/// The same escapes are valid in TypeScript and Python literals, so one function
/// serves both targets; `quote` is the delimiter in use.
pub fn escape_string_literal(s: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c == quote => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Collapses a description onto one line for Markdown table cells.
pub fn table_cell(s: &str) -> String {
    let single_line = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.is_empty() {
        "-".to_string()
    } else {
        single_line.replace('|', "\\|")
    }
}
