//! Order-preserving merge of ranked result lists.

use std::collections::HashSet;

use crate::types::{MergePriority, SearchItem};

use super::url_key::canonical_key;

/// Merge result lists given in priority order, dropping repeated pages.
///
/// Lists are walked highest priority first. The first item seen for a
/// [`canonical_key`] is kept; later items with the same key are dropped,
/// including duplicates inside a single list. Stops once `cap` items have
/// been admitted.
///
/// Every surviving item of an earlier list precedes every item admitted
/// from a later one.
pub fn merge_dedupe<I>(lists: I, cap: usize) -> Vec<SearchItem>
where
    I: IntoIterator<Item = Vec<SearchItem>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    'lists: for list in lists {
        for item in list {
            if merged.len() >= cap {
                break 'lists;
            }
            if seen.insert(canonical_key(&item.url)) {
                merged.push(item);
            }
        }
    }

    merged
}

/// Merge fast and deep results in the order `priority` dictates.
pub fn merge_tiers(
    fast: Vec<SearchItem>,
    deep: Vec<SearchItem>,
    priority: MergePriority,
    cap: usize,
) -> Vec<SearchItem> {
    match priority {
        MergePriority::FastFirst => merge_dedupe([fast, deep], cap),
        MergePriority::DeepFirst => merge_dedupe([deep, fast], cap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EngineTag;

    fn item(url: &str, source: EngineTag) -> SearchItem {
        SearchItem {
            title: format!("Title for {url}"),
            url: url.into(),
            snippet: None,
            source,
        }
    }

    fn fast(urls: &[&str]) -> Vec<SearchItem> {
        urls.iter().map(|u| item(u, EngineTag::DdgHtml)).collect()
    }

    fn deep(urls: &[&str]) -> Vec<SearchItem> {
        urls.iter().map(|u| item(u, EngineTag::BingBrowser)).collect()
    }

    fn urls(items: &[SearchItem]) -> Vec<&str> {
        items.iter().map(|i| i.url.as_str()).collect()
    }

    #[test]
    fn keys_are_pairwise_distinct() {
        let merged = merge_dedupe(
            [
                fast(&[
                    "https://a.com/x?ref=1",
                    "https://b.com/",
                    "https://a.com/x#frag",
                ]),
                deep(&["https://B.com/", "https://c.com/y", "https://a.com/x"]),
            ],
            50,
        );
        let keys: Vec<String> = merged.iter().map(|i| canonical_key(&i.url)).collect();
        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(keys.len(), unique.len());
        assert_eq!(
            urls(&merged),
            vec!["https://a.com/x?ref=1", "https://b.com/", "https://c.com/y"]
        );
    }

    #[test]
    fn first_list_order_precedes_later_lists() {
        let merged = merge_dedupe(
            [
                fast(&["https://a.com/1", "https://a.com/2", "https://a.com/3"]),
                deep(&["https://z.com/", "https://a.com/2", "https://y.com/"]),
            ],
            10,
        );
        assert_eq!(
            urls(&merged),
            vec![
                "https://a.com/1",
                "https://a.com/2",
                "https://a.com/3",
                "https://z.com/",
                "https://y.com/",
            ]
        );
        // The duplicate keeps the higher-priority list's copy.
        assert_eq!(merged[1].source, EngineTag::DdgHtml);
    }

    #[test]
    fn stops_at_cap() {
        let merged = merge_dedupe(
            [
                fast(&["https://a.com/", "https://b.com/"]),
                deep(&["https://c.com/", "https://d.com/"]),
            ],
            3,
        );
        assert_eq!(
            urls(&merged),
            vec!["https://a.com/", "https://b.com/", "https://c.com/"]
        );
    }

    #[test]
    fn zero_cap_yields_nothing() {
        assert!(merge_dedupe([fast(&["https://a.com/"])], 0).is_empty());
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert!(merge_dedupe(Vec::<Vec<SearchItem>>::new(), 5).is_empty());
        assert!(merge_dedupe([Vec::new(), Vec::new()], 5).is_empty());
    }

    #[test]
    fn unparsable_urls_dedupe_on_raw_string() {
        let merged = merge_dedupe(
            [fast(&["not a url", "not a url", "also not"])],
            10,
        );
        assert_eq!(urls(&merged), vec!["not a url", "also not"]);
    }

    #[test]
    fn deep_first_puts_deep_results_ahead() {
        let merged = merge_tiers(
            fast(&["https://a.com/", "https://shared.com/page"]),
            deep(&["https://shared.com/page?x=1", "https://b.com/"]),
            MergePriority::DeepFirst,
            10,
        );
        assert_eq!(
            urls(&merged),
            vec![
                "https://shared.com/page?x=1",
                "https://b.com/",
                "https://a.com/",
            ]
        );
        assert_eq!(merged[0].source, EngineTag::BingBrowser);
    }

    #[test]
    fn fast_first_keeps_fast_copy_of_shared_page() {
        let merged = merge_tiers(
            fast(&["https://shared.com/page"]),
            deep(&["https://shared.com/page", "https://b.com/"]),
            MergePriority::FastFirst,
            10,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source, EngineTag::DdgHtml);
        assert_eq!(merged[1].url, "https://b.com/");
    }
}
