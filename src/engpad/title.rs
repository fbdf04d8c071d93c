//! Default titles for new documents.
//!
//! A new document gets its kind's base title; while that title is taken by a
//! loaded document (or by a create still in flight) a counter is appended:
//! `Untitled Document`, `Untitled Document 1`, `Untitled Document 2`, ...

use std::collections::HashSet;

/// First title in the sequence `base`, `base 1`, `base 2`, ... not in `taken`.
pub fn disambiguate(base: &str, taken: &HashSet<&str>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1u64..)
        .map(|n| format!("{} {}", base, n))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}
