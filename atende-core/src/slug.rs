//! Tool-name slugification
//!
//! Generated tool names must match `[a-zA-Z0-9_-]+`; action display names
//! are free text, so they are slugged: lowercase, runs of non-alphanumeric
//! characters collapsed to a single underscore, leading/trailing
//! underscores trimmed.

/// Slugify a display name into a valid tool name.
///
/// Idempotent: slugifying an already-valid slug returns it unchanged.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_separator = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}
