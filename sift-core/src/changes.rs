use crate::{Model, Values};

/// Entries of `proposed` that would change `current`, keyed by column name.
///
/// An entry is left out when it names the primary key or an unknown column, when it is an
/// unset date or time, when both sides are zero values, or when both sides are equal,
/// directly or through their text form.
pub fn changed_values<M: Model>(current: &M, proposed: &Values) -> Values {
    let primary_key = M::primary_key_def().map(|v| v.name);
    let row = current.row();
    let mut result = Values::new();
    for (key, value) in proposed {
        let Some(column) = M::column_def(key) else {
            log::trace!("Skipping `{key}`: not a column of `{}`", M::table_name());
            continue;
        };
        if primary_key.is_some_and(|pk| pk.eq_ignore_ascii_case(column.name)) {
            log::trace!("Skipping `{key}`: primary key");
            continue;
        }
        if value.is_temporal() && value.is_null() {
            log::trace!("Skipping `{key}`: time not set");
            continue;
        }
        let Some((_, stored)) = row.iter().find(|(c, _)| *c == column.name) else {
            continue;
        };
        if stored.is_zero() && value.is_zero() {
            log::trace!("Skipping `{key}`: both zero");
            continue;
        }
        if stored.loosely_eq(value) {
            log::trace!("Skipping `{key}`: same value");
            continue;
        }
        result.insert(column.name.to_string(), value.clone());
    }
    result
}
