//! De-duplication and `optional_limit` enforcement for the outermost
//! resolver of `ReachableResources`/`LookupResources`/`LookupSubjects`. Operates over one already-materialized result set per
//! call — the local resolvers in `rebac-engine` return a complete `Vec<T>`
//! rather than an incremental stream, so pagination here is slicing plus a
//! cursor, not a true producer/consumer pipeline.

use std::collections::HashSet;
use std::hash::Hash;

use rebac_model::Cursor;

pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
}

/// Removes later duplicates by `key_fn`, keeping the first occurrence.
/// `ReachableResources` in particular can report the same resource id twice
/// when it is reachable through more than one rewrite branch.
#[must_use]
pub fn dedup_by_key<T, K, F>(items: Vec<T>, key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key_fn(item))).collect()
}

/// Slices `all` starting at the offset encoded in `cursor`, capped at
/// `limit` items, and mints the cursor for the next page. A cursor minted
/// under a different `dispatch_version` is treated as absent rather than
/// rejected, so a ring reshuffle or schema reload simply
/// restarts pagination from the top instead of erroring the caller.
#[must_use]
pub fn paginate<T: Clone>(all: &[T], cursor: &Cursor, dispatch_version: u32, limit: Option<usize>) -> Page<T> {
    let offset = if cursor.is_stale(dispatch_version) {
        0
    } else {
        cursor.at_level(0).and_then(|section| section.parse::<usize>().ok()).unwrap_or(0)
    };

    let offset = offset.min(all.len());
    let remaining = &all[offset..];
    let take = limit.unwrap_or(remaining.len()).min(remaining.len());
    let items = remaining[..take].to_vec();
    let next_offset = offset + take;

    let next_cursor = if next_offset < all.len() {
        Some(Cursor::start(dispatch_version).pushed(next_offset.to_string()))
    } else {
        None
    };

    Page { items, next_cursor }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence() {
        let items = vec!["doc1", "doc2", "doc1", "doc3"];
        let deduped = dedup_by_key(items, |s| *s);
        assert_eq!(deduped, vec!["doc1", "doc2", "doc3"]);
    }

    #[test]
    fn pagination_without_limit_returns_everything_and_no_cursor() {
        let all = vec![1, 2, 3];
        let page = paginate(&all, &Cursor::default(), 1, None);
        assert_eq!(page.items, vec![1, 2, 3]);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn pagination_with_limit_mints_a_resumable_cursor() {
        let all = vec![1, 2, 3, 4, 5];
        let first = paginate(&all, &Cursor::default(), 1, Some(2));
        assert_eq!(first.items, vec![1, 2]);
        let cursor = first.next_cursor.expect("more items remain");

        let second = paginate(&all, &cursor, 1, Some(2));
        assert_eq!(second.items, vec![3, 4]);

        let third = paginate(&all, &second.next_cursor.unwrap(), 1, Some(2));
        assert_eq!(third.items, vec![5]);
        assert!(third.next_cursor.is_none());
    }

    #[test]
    fn stale_cursor_restarts_from_the_top() {
        let all = vec![1, 2, 3];
        let cursor = Cursor::start(1).pushed("2");
        let page = paginate(&all, &cursor, 2, None);
        assert_eq!(page.items, vec![1, 2, 3], "version mismatch should restart pagination");
    }
}

#[cfg(test)]
mod pagination_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Resuming with the last cursor yields a
        // suffix of what a single non-resumed call would have produced,
        // and walking every page this way reconstructs the whole set.
        #[test]
        fn resuming_pages_reconstructs_the_full_set(
            all in prop::collection::vec(any::<u32>(), 0..200),
            page_size in 1usize..32,
        ) {
            let mut reconstructed = Vec::new();
            let mut cursor = Cursor::default();
            loop {
                let page = paginate(&all, &cursor, 7, Some(page_size));
                reconstructed.extend(page.items);
                match page.next_cursor {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
            prop_assert_eq!(reconstructed, all);
        }
    }
}
