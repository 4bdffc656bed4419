//! Name transforms for generated code
//!
//! Best-effort English pluralization of camelCase words plus the class-name
//! helpers used when deriving field, accessor and alias names. This is a
//! plain suffix heuristic, not a linguistic model.

/// Lower-case the first character
#[must_use]
pub fn lcfirst(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper-case the first character
#[must_use]
pub fn ucfirst(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Pluralize a singular camelCase word
///
/// `bar` → `bars`, `FooBar` → `fooBars`, `city` → `cities`, `box` → `boxes`.
#[must_use]
pub fn to_plural(word: &str) -> String {
    let word = lcfirst(word);
    if word.is_empty() {
        return word;
    }
    let lower = word.to_ascii_lowercase();

    if let Some(stem) = word.strip_suffix('y') {
        let consonant_before = stem.chars().last().is_some_and(|c| !is_vowel(c));
        if consonant_before {
            return format!("{stem}ies");
        }
    }

    if ["ch", "sh", "x", "s", "z"].iter().any(|s| lower.ends_with(s)) {
        return format!("{word}es");
    }

    format!("{word}s")
}

/// Singularize a plural camelCase word
///
/// `bars` → `bar`, `FooBars` → `fooBar`, `cities` → `city`, `bar` → `bar`.
#[must_use]
pub fn to_singular(word: &str) -> String {
    let word = lcfirst(word);
    let lower = word.to_ascii_lowercase();

    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }

    if ["ches", "shes", "xes", "zes", "sses"]
        .iter()
        .any(|s| lower.len() > s.len() && lower.ends_with(s))
    {
        return word[..word.len() - 2].to_string();
    }

    if lower.len() > 1 && lower.ends_with('s') && !lower.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }

    word
}

/// Upper camel case from `_`, `.`, `\` or space separated words
///
/// `foo_bar.baz\pizza` → `FooBarBazPizza`
#[must_use]
pub fn as_camel_case(value: &str) -> String {
    value
        .split(|c: char| matches!(c, '_' | '.' | '\\' | ' ' | '-'))
        .filter(|part| !part.is_empty())
        .map(ucfirst)
        .collect()
}

/// Lower camel case: `UserProfile` → `userProfile`, `foo_bar` → `fooBar`
#[must_use]
pub fn as_lower_camel_case(value: &str) -> String {
    lcfirst(&as_camel_case(value))
}

/// Last segment of a fully-qualified class name
#[must_use]
pub fn short_class_name(fqn: &str) -> &str {
    fqn.rsplit('\\').next().unwrap_or(fqn)
}

/// Namespace portion of a fully-qualified class name (`""` for global)
#[must_use]
pub fn namespace_of(fqn: &str) -> &str {
    let fqn = fqn.trim_start_matches('\\');
    match fqn.rfind('\\') {
        Some(idx) => &fqn[..idx],
        None => "",
    }
}

/// Whether `name` can be used as a property or method name
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
