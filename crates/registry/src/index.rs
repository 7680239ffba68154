//! The in-memory views over the pack collection.
//!
//! Nothing in here touches storage or locks; [`Registry`](crate::Registry)
//! wraps an [`Index`] in a lock and pairs every change with its persistence.

use crate::slug;
use crate::{PLACEHOLDER_SLUG, Pack};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
pub(crate) struct Index {
    /// Authoritative store.
    by_slug: HashMap<String, Arc<Pack>>,
    /// Every `main` pack in `by_slug`, ascending by `minecraft.minimum`.
    main: Vec<Arc<Pack>>,
    /// Slugs handed out to promotions whose artifact is still being written.
    reserved: HashSet<String>,
}

impl Index {
    pub(crate) fn get(&self, slug: &str) -> Option<Arc<Pack>> {
        self.by_slug.get(slug).cloned()
    }

    pub(crate) fn main(&self) -> &[Arc<Pack>] {
        &self.main
    }

    /// The main pack whose minimum version sorts last.
    pub(crate) fn current_main(&self) -> Option<Arc<Pack>> {
        self.main.last().cloned()
    }

    /// Every pack, ordered by slug.
    pub(crate) fn all(&self) -> Vec<Arc<Pack>> {
        let mut packs: Vec<_> = self.by_slug.values().cloned().collect();
        packs.sort_by(|a, b| a.slug.cmp(&b.slug));
        packs
    }

    pub(crate) fn len(&self) -> usize {
        self.by_slug.len()
    }

    fn is_taken(&self, slug: &str) -> bool {
        slug == PLACEHOLDER_SLUG || self.by_slug.contains_key(slug) || self.reserved.contains(slug)
    }

    /// Draws candidates until one is neither indexed, reserved, nor the
    /// placeholder's slug. There is no attempt limit.
    pub(crate) fn allocate_slug(&self) -> String {
        self.allocate_slug_with(slug::candidate)
    }

    pub(crate) fn allocate_slug_with(&self, mut generate: impl FnMut() -> String) -> String {
        loop {
            let candidate = generate();
            if !self.is_taken(&candidate) {
                return candidate;
            }
            tracing::debug!(slug = %candidate, "Slug collision; drawing another");
        }
    }

    pub(crate) fn reserve(&mut self, slug: String) {
        self.reserved.insert(slug);
    }

    pub(crate) fn release(&mut self, slug: &str) {
        self.reserved.remove(slug);
    }

    #[cfg(test)]
    pub(crate) fn has_reservations(&self) -> bool {
        !self.reserved.is_empty()
    }

    /// Inserts or replaces a pack and re-derives its place in the main list.
    pub(crate) fn insert(&mut self, pack: Arc<Pack>) {
        self.main.retain(|existing| existing.slug != pack.slug);
        self.by_slug.insert(pack.slug.clone(), Arc::clone(&pack));
        if pack.main {
            self.main.push(pack);
            // Stable: packs sharing a minimum keep insertion order.
            self.main.sort_by(|a, b| a.minecraft.minimum.cmp(&b.minecraft.minimum));
        }
    }

    /// Removes a pack from both views.
    pub(crate) fn remove(&mut self, slug: &str) -> Option<Arc<Pack>> {
        self.main.retain(|existing| existing.slug != slug);
        self.by_slug.remove(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionRange;
    use time::macros::datetime;

    fn pack(slug: &str, minimum: &str, main: bool) -> Arc<Pack> {
        Arc::new(Pack {
            name: format!("Pack {slug}"),
            description: None,
            slug: slug.to_string(),
            uploaded: datetime!(2024-06-01 10:00:00 UTC),
            minecraft: VersionRange::new(minimum, "1.21"),
            sha1: String::new(),
            main,
            is_temporary: false,
        })
    }

    fn main_slugs(index: &Index) -> Vec<&str> {
        index.main().iter().map(|p| p.slug.as_str()).collect()
    }

    /// The main list must always equal the filtered, sorted projection of the slug map.
    fn assert_consistent(index: &Index) {
        let mut expected: Vec<_> = index.by_slug.values().filter(|p| p.main).cloned().collect();
        expected.sort_by(|a, b| a.minecraft.minimum.cmp(&b.minecraft.minimum));
        let actual = index.main();
        assert_eq!(actual.len(), expected.len());
        for window in actual.windows(2) {
            assert!(window[0].minecraft.minimum <= window[1].minecraft.minimum);
        }
        for pack in actual {
            assert!(Arc::ptr_eq(pack, &index.by_slug[&pack.slug]), "stale main entry {}", pack.slug);
        }
    }

    #[test]
    fn test_insert_sorts_main_by_minimum() {
        let mut index = Index::default();
        index.insert(pack("aaaaaaaa", "1.19", true));
        index.insert(pack("bbbbbbbb", "1.16", true));
        index.insert(pack("cccccccc", "1.20", false));
        index.insert(pack("dddddddd", "1.20", true));
        assert_eq!(main_slugs(&index), ["bbbbbbbb", "aaaaaaaa", "dddddddd"]);
        assert_eq!(index.current_main().unwrap().slug, "dddddddd");
        assert_eq!(index.len(), 4);
        assert_consistent(&index);
    }

    #[test]
    fn test_ordering_is_lexical() {
        let mut index = Index::default();
        index.insert(pack("aaaaaaaa", "1.8", true));
        index.insert(pack("bbbbbbbb", "1.21", true));
        // "1.8" > "1.21" as strings.
        assert_eq!(main_slugs(&index), ["bbbbbbbb", "aaaaaaaa"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = Index::default();
        index.insert(pack("bbbbbbbb", "1.19", true));
        index.insert(pack("aaaaaaaa", "1.19", true));
        assert_eq!(main_slugs(&index), ["bbbbbbbb", "aaaaaaaa"]);
    }

    #[test]
    fn test_reinsert_replaces_main_entry() {
        let mut index = Index::default();
        index.insert(pack("aaaaaaaa", "1.19", true));
        index.insert(pack("aaaaaaaa", "1.12", true));
        assert_eq!(index.main().len(), 1);
        assert_eq!(index.main()[0].minecraft.minimum, "1.12");
        index.insert(pack("aaaaaaaa", "1.12", false));
        assert!(index.main().is_empty());
        assert!(index.get("aaaaaaaa").is_some());
        assert_consistent(&index);
    }

    #[test]
    fn test_remove() {
        let mut index = Index::default();
        index.insert(pack("aaaaaaaa", "1.19", true));
        index.insert(pack("bbbbbbbb", "1.20", true));
        assert_eq!(index.remove("aaaaaaaa").unwrap().slug, "aaaaaaaa");
        assert!(index.get("aaaaaaaa").is_none());
        assert_eq!(main_slugs(&index), ["bbbbbbbb"]);
        assert!(index.remove("aaaaaaaa").is_none());
    }

    #[test]
    fn test_main_list_stays_consistent_across_upserts() {
        let slugs = ["aaaaaaaa", "bbbbbbbb", "cccccccc", "dddddddd", "eeeeeeee"];
        let minimums = ["1.16", "1.8", "1.20", "1.19", "1.12.2", "1.20"];
        let mut index = Index::default();
        for step in 0..200usize {
            let slug = slugs[(step * 7) % slugs.len()];
            let minimum = minimums[(step * 5 + step / 3) % minimums.len()];
            let main = (step * 3 + step / 7) % 4 != 0;
            index.insert(pack(slug, minimum, main));
            assert_consistent(&index);
        }
    }

    #[test]
    fn test_allocate_slug_retries_until_free() {
        let mut index = Index::default();
        index.insert(pack("aaaaaaaa", "1.19", true));
        index.reserve("bbbbbbbb".to_string());
        let mut candidates = ["aaaaaaaa", "bbbbbbbb", "aaaaaaaa", "cccccccc"].into_iter();
        let mut draws = 0;
        let slug = index.allocate_slug_with(|| {
            draws += 1;
            candidates.next().unwrap().to_string()
        });
        assert_eq!(slug, "cccccccc");
        assert_eq!(draws, 4);
        index.release("bbbbbbbb");
        let slug = index.allocate_slug_with(|| "bbbbbbbb".to_string());
        assert_eq!(slug, "bbbbbbbb");
    }

    #[test]
    fn test_allocate_slug_skips_placeholder_slug() {
        let index = Index::default();
        let mut candidates = [PLACEHOLDER_SLUG, "0a1b2c3d"].into_iter();
        let slug = index.allocate_slug_with(|| candidates.next().unwrap().to_string());
        assert_eq!(slug, "0a1b2c3d");
    }

    #[test]
    fn test_allocate_slug_never_returns_existing() {
        let mut index = Index::default();
        for _ in 0..500 {
            let slug = index.allocate_slug();
            assert!(index.get(&slug).is_none());
            index.insert(pack(&slug, "1.19", false));
        }
        assert_eq!(index.len(), 500);
    }

    #[test]
    fn test_all_is_sorted_by_slug() {
        let mut index = Index::default();
        index.insert(pack("cccccccc", "1.19", false));
        index.insert(pack("aaaaaaaa", "1.19", true));
        index.insert(pack("bbbbbbbb", "1.19", false));
        let slugs: Vec<_> = index.all().iter().map(|p| p.slug.clone()).collect();
        assert_eq!(slugs, ["aaaaaaaa", "bbbbbbbb", "cccccccc"]);
    }
}
