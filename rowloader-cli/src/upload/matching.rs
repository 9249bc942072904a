//! Column matching between imported data and the target schema

/// Columns present both in the table and on the target object, in table
/// column order. An empty result is valid; escalating it is the caller's
/// concern.
pub fn matched_columns(table_columns: &[String], property_names: &[String]) -> Vec<String> {
    table_columns
        .iter()
        .filter(|column| property_names.contains(column))
        .cloned()
        .collect()
}
