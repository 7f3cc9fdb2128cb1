//! URL-safe identifiers derived from product names.

use deunicode::deunicode;

const FALLBACK_SLUG: &str = "product";

/// Transliterates to ASCII, lowercases alphanumerics and collapses every other
/// run of characters into a single `-`, trimming separators from both ends.
///
/// Names that transliterate to no alphanumerics at all map to `"product"` so
/// the result is never empty.
pub fn slugify(name: &str) -> String {
    let ascii = deunicode(name);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_separator = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}
