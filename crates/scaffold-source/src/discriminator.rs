//! Minimal namespace suffixes that tell two same-named classes apart
//!
//! Used for human-readable relation text (`User` vs `Friend\User`) and for
//! import aliases (`FriendUser`). Pure; no side effects.

use crate::error::NamingError;
use crate::inflector::{as_camel_case, short_class_name};

fn segments(fqn: &str) -> Vec<&str> {
    fqn.split('\\').filter(|s| !s.is_empty()).collect()
}

/// Namespace segments compare case-insensitively
fn same_segments(a: &[&str], b: &[&str]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignore_ascii_case(y))
}

/// Compute the disambiguating namespace suffix of each name
///
/// Trims the longest common namespace prefix. If what remains is still
/// equal, widens the window backward from the leaf one segment at a time
/// until the two differ.
///
/// # Errors
/// Returns [`NamingError::Ambiguous`] when both names denote the same class.
///
/// # Examples
/// ```
/// use scaffold_source::discriminate;
///
/// let pair = discriminate("App\\Entity\\User", "App\\Entity\\Friend\\User").unwrap();
/// assert_eq!(pair, (String::new(), "Friend".to_string()));
/// ```
pub fn discriminate(class_name: &str, other: &str) -> Result<(String, String), NamingError> {
    let full_a = segments(class_name);
    let full_b = segments(other);

    if same_segments(&full_a, &full_b) {
        return Err(NamingError::Ambiguous {
            left: class_name.to_string(),
            right: other.to_string(),
        });
    }

    let ns_a = &full_a[..full_a.len().saturating_sub(1)];
    let ns_b = &full_b[..full_b.len().saturating_sub(1)];

    let common = ns_a
        .iter()
        .zip(ns_b)
        .take_while(|(a, b)| a.eq_ignore_ascii_case(b))
        .count();

    let suffix_a = &ns_a[common..];
    let suffix_b = &ns_b[common..];
    if !same_segments(suffix_a, suffix_b) {
        return Ok((suffix_a.join("\\"), suffix_b.join("\\")));
    }

    let longest = full_a.len().max(full_b.len());
    for width in 1..=longest {
        let window_a = &full_a[full_a.len().saturating_sub(width)..];
        let window_b = &full_b[full_b.len().saturating_sub(width)..];
        if !same_segments(window_a, window_b) {
            let ns_window_a = &window_a[..window_a.len().saturating_sub(1)];
            let ns_window_b = &window_b[..window_b.len().saturating_sub(1)];
            return Ok((ns_window_a.join("\\"), ns_window_b.join("\\")));
        }
    }

    Err(NamingError::Ambiguous {
        left: class_name.to_string(),
        right: other.to_string(),
    })
}

/// Display name of `class_name` when shown next to `other`
///
/// The short name, prefixed by the disambiguating suffix when both share a
/// short name (`Friend\User`).
///
/// # Errors
/// Returns [`NamingError::Ambiguous`] for indistinguishable names.
pub fn display_name(class_name: &str, other: &str) -> Result<String, NamingError> {
    let short = short_class_name(class_name);
    if !short.eq_ignore_ascii_case(short_class_name(other)) {
        return Ok(short.to_string());
    }
    let (suffix, _) = discriminate(class_name, other)?;
    if suffix.is_empty() {
        Ok(short.to_string())
    } else {
        Ok(format!("{suffix}\\{short}"))
    }
}

/// Import alias for `class_name` when its short name clashes with `other`
///
/// Uses the discriminated suffix (`App\Entity\Friend\User` → `FriendUser`);
/// when that suffix is empty, falls back to the last namespace segment.
///
/// # Errors
/// Returns [`NamingError::Ambiguous`] for indistinguishable names.
pub fn alias_for(class_name: &str, other: &str) -> Result<String, NamingError> {
    let (suffix, _) = discriminate(class_name, other)?;
    let short = short_class_name(class_name);
    let prefix = if suffix.is_empty() {
        let segs = segments(class_name);
        if segs.len() >= 2 {
            segs[segs.len() - 2].to_string()
        } else {
            "Root".to_string()
        }
    } else {
        as_camel_case(&suffix)
    };
    Ok(format!("{prefix}{short}"))
}
