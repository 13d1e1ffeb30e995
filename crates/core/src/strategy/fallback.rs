//! Ordered fallback resolution and result clean-up shared by all strategies.

use std::collections::HashSet;

use tracing::{debug, warn};

/// Runs `strategies` in order and returns the first non-empty result.
///
/// Every strategy is named for logging. When all come back empty the result
/// is empty too; that is a valid "nothing here" outcome, not an error.
///
/// ```rust
/// use tankobon_core::strategy::first_non_empty;
///
/// let none = || Vec::<u8>::new();
/// let some = || vec![1, 2];
/// let strategies: [(&str, &dyn Fn() -> Vec<u8>); 2] = [("none", &none), ("some", &some)];
/// assert_eq!(first_non_empty(&strategies), vec![1, 2]);
/// ```
pub fn first_non_empty<T, F>(strategies: &[(&str, F)]) -> Vec<T>
where
    F: Fn() -> Vec<T>,
{
    for (name, strategy) in strategies {
        let result = strategy();
        if !result.is_empty() {
            debug!(strategy = *name, count = result.len(), "strategy matched");
            return result;
        }
        debug!(strategy = *name, "strategy found nothing");
    }

    Vec::new()
}

/// Removes exact duplicates while keeping first-seen order.
pub fn dedup_ordered<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

/// Keeps the first half (rounded up) of `urls` when there are more than `threshold`.
///
/// Some readers render every page twice under two markup variants, so a
/// pattern scan sees each URL twice with slightly different spelling. This is
/// a heuristic about that double emission, not a guarantee, so it logs a
/// warning whenever it cuts.
pub fn halve_duplicates(mut urls: Vec<String>, threshold: usize) -> Vec<String> {
    if urls.len() > threshold {
        let keep = urls.len().div_ceil(2);
        warn!(found = urls.len(), kept = keep, threshold, "page list looks doubled, keeping first half");
        urls.truncate(keep);
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_empty_stops_at_first_match() {
        let calls = std::cell::Cell::new(0);
        let empty = || {
            calls.set(calls.get() + 1);
            Vec::<String>::new()
        };
        let hit = || {
            calls.set(calls.get() + 1);
            vec!["a".to_string()]
        };
        let never = || -> Vec<String> { panic!("should not run") };

        let strategies: [(&str, &dyn Fn() -> Vec<String>); 3] = [("empty", &empty), ("hit", &hit), ("never", &never)];

        assert_eq!(first_non_empty(&strategies), vec!["a".to_string()]);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_first_non_empty_all_empty() {
        let empty = Vec::<u32>::new;
        let strategies = [("a", empty), ("b", empty)];
        assert!(first_non_empty(&strategies).is_empty());
    }

    #[test]
    fn test_dedup_ordered() {
        let urls = ["b", "a", "b", "c", "a"].map(String::from);
        assert_eq!(dedup_ordered(urls), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_halve_duplicates_below_threshold() {
        let urls: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        assert_eq!(halve_duplicates(urls.clone(), 5), urls);
    }

    #[test]
    fn test_halve_duplicates_rounds_up() {
        let urls: Vec<String> = (0..7).map(|i| i.to_string()).collect();
        let kept = halve_duplicates(urls, 4);
        assert_eq!(kept, vec!["0", "1", "2", "3"]);
    }
}
