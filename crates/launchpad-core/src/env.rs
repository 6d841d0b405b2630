//! Environment merging for spawned processes.

use std::collections::BTreeMap;

use crate::platform::Platform;

/// Snapshot of the current process environment.
///
/// Variables whose name or value is not valid Unicode are skipped.
pub fn current_environment() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Merge `overrides` on top of `base`.
///
/// An override with a value replaces the base entry; an override of `None`
/// removes it. On Windows variable names are case-insensitive, so an
/// override also replaces a base entry whose name differs only in case.
pub fn merge_environment(
    base: impl IntoIterator<Item = (String, String)>,
    overrides: &BTreeMap<String, Option<String>>,
    platform: Platform,
) -> BTreeMap<String, String> {
    let mut merged: BTreeMap<String, String> = base.into_iter().collect();

    for (key, value) in overrides {
        if platform.is_windows() {
            merged.retain(|existing, _| !existing.eq_ignore_ascii_case(key));
        } else {
            merged.remove(key);
        }
        if let Some(value) = value {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}
