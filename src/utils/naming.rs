//! Column-name normalization for deterministic node ids.

/// Normalizes a column name for use inside a node id.
///
/// Lowercases the name, collapses every run of non-alphanumeric characters to
/// a single `_`, and trims leading/trailing underscores. The result is stable
/// across re-derivations, which is what lets hydration reconcile a stored
/// graph with a freshly derived one.
///
/// ```
/// use colweave::utils::normalize_column_name;
///
/// assert_eq!(normalize_column_name("Unit Price (USD)"), "unit_price_usd");
/// assert_eq!(normalize_column_name("notes"), "notes");
/// ```
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut gap = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        } else {
            gap = true;
        }
    }
    if out.is_empty() {
        // A name with no alphanumeric content still needs a stable slug.
        out.push('_');
    }
    out
}
