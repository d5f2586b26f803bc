//! Layer merging for `cmdgate.toml` files.

use toml::{Table, Value};

/// Fold `overlay` into `base`, with the overlay winning.
///
/// Tables merge key by key, so a workspace file can override one
/// `[policy.profiles.NAME]` entry without restating the others. Arrays such
/// as a profile's `allow` list are replaced whole, never concatenated.
pub fn merge_toml_values(base: &mut Value, overlay: &Value) {
    match (base.as_table_mut(), overlay.as_table()) {
        (Some(base_table), Some(overlay_table)) => merge_tables(base_table, overlay_table),
        _ => *base = overlay.clone(),
    }
}

fn merge_tables(base: &mut Table, overlay: &Table) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => merge_toml_values(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
