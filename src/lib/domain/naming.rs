//! Agent name to tool identifier mapping

/// Separator placed between the alphanumeric runs of an identifier.
pub const SEPARATOR: char = '_';

/// Converts a human readable agent name into a tool identifier.
///
/// Every character other than an ASCII letter or digit acts as a separator,
/// each run of separators becomes a single `_`, and letters are lowercased.
/// The mapping is pure and idempotent. Distinct names may collide; callers
/// that need uniqueness resolve it themselves.
pub fn to_identifier(name: &str) -> String {
    let mut identifier = String::with_capacity(name.len());
    let mut in_separator = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            identifier.push(ch.to_ascii_lowercase());
            in_separator = false;
        } else if !in_separator {
            identifier.push(SEPARATOR);
            in_separator = true;
        }
    }
    identifier
}

/// Identifier used for the `n`th agent (1-based) that maps to `base`.
pub fn with_suffix(base: &str, n: usize) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}{SEPARATOR}{n}")
    }
}
