//! Helpers over ordered lists of column identifiers.

/// Identifiers in `a` that are not in `b`, in `a`'s order and without repeats.
#[must_use]
pub fn difference(a: &[String], b: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in a {
        if !b.contains(id) && !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}

/// Remove every occurrence of `id`. Returns whether anything was removed.
pub fn remove_all(list: &mut Vec<String>, id: &str) -> bool {
    let before = list.len();
    list.retain(|c| c != id);
    list.len() != before
}

/// Append `id` unless it is already present. Returns whether it was added.
pub fn insert_unique(list: &mut Vec<String>, id: &str) -> bool {
    if list.iter().any(|c| c == id) {
        return false;
    }
    list.push(id.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_difference_both_ways() {
        let old = ids(&["new", "review"]);
        let new = ids(&["review", "doing", "doing"]);

        assert_eq!(difference(&new, &old), ids(&["doing"]));
        assert_eq!(difference(&old, &new), ids(&["new"]));
        assert!(difference(&old, &old).is_empty());
    }

    #[test]
    fn test_remove_all_purges_duplicates() {
        let mut list = ids(&["a", "b", "a", "c", "a"]);

        assert!(remove_all(&mut list, "a"));
        assert_eq!(list, ids(&["b", "c"]));
        assert!(!remove_all(&mut list, "a"));
    }

    #[test]
    fn test_insert_unique() {
        let mut list = ids(&["a"]);

        assert!(!insert_unique(&mut list, "a"));
        assert!(insert_unique(&mut list, "b"));
        assert_eq!(list, ids(&["a", "b"]));
    }
}
