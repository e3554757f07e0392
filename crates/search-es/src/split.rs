//! Splitting of comma-separated OR values.
//!
//! `name=Smith,Jones` searches for either name. A literal comma is written
//! `\,`. Only a backslash directly before a comma is consumed; any other
//! backslash is kept as-is.

/// Splits a raw value into its OR alternatives.
///
/// Always returns at least one alternative. A trailing unescaped comma yields
/// a final empty alternative.
pub fn split_alternatives(value: &str) -> Vec<String> {
    let mut alternatives = Vec::new();
    let mut current = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                chars.next();
                current.push(',');
            }
            ',' => alternatives.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    alternatives.push(current);

    alternatives
}
