use std::cmp::Ordering;

/// Coerce a raw table cell to a number. Blank, non-numeric and NaN cells become `None`.
pub(crate) fn coerce_numeric(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| !v.is_nan())
}

/// Descending order over optional keys, with `None` after every present value.
/// Used with a stable sort, equal keys keep their input order.
pub(crate) fn descending_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable "sort descending then take the first row per key" selection.
///
/// Returns, for each distinct key, the index of the row with the largest value;
/// ties go to the row seen first in input order and rows without a value only
/// win when no row for that key has one. Keys are returned in first-seen order.
pub(crate) fn first_max_per_key<K, F, V>(len: usize, key: F, value: V) -> Vec<(K, usize)>
where
    K: Eq + std::hash::Hash + Clone,
    F: Fn(usize) -> K,
    V: Fn(usize) -> Option<f64>,
{
    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| descending_nulls_last(value(a), value(b)));

    let mut chosen = std::collections::HashMap::with_capacity(len);
    for i in order {
        chosen.entry(key(i)).or_insert(i);
    }

    let mut seen = std::collections::HashSet::with_capacity(chosen.len());
    (0..len)
        .filter_map(|i| {
            let k = key(i);
            seen.insert(k.clone()).then(|| (k.clone(), chosen[&k]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_numeric_rejects_junk() {
        assert_eq!(coerce_numeric(Some(" 900 ")), Some(900.0));
        assert_eq!(coerce_numeric(Some("1.5e2")), Some(150.0));
        assert_eq!(coerce_numeric(Some("")), None);
        assert_eq!(coerce_numeric(Some("n/a")), None);
        assert_eq!(coerce_numeric(Some("NaN")), None);
        assert_eq!(coerce_numeric(None), None);
    }

    #[test]
    fn nulls_sort_after_values() {
        let mut values = vec![None, Some(1.0), Some(3.0), None, Some(2.0)];
        values.sort_by(|a, b| descending_nulls_last(*a, *b));
        assert_eq!(values, vec![Some(3.0), Some(2.0), Some(1.0), None, None]);
    }

    #[test]
    fn first_max_prefers_earliest_tie() {
        let keys = ["a", "b", "a", "a", "b"];
        let values = [Some(5.0), None, Some(5.0), Some(1.0), None];
        let picked = first_max_per_key(keys.len(), |i| keys[i], |i| values[i]);
        assert_eq!(picked, vec![("a", 0), ("b", 1)]);
    }

    #[test]
    fn first_max_skips_missing_values_when_any_present() {
        let keys = ["u", "u", "u"];
        let values = [None, Some(2015.0), Some(2018.0)];
        let picked = first_max_per_key(keys.len(), |i| keys[i], |i| values[i]);
        assert_eq!(picked, vec![("u", 2)]);
    }
}
