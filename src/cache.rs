//! In-memory caches for the reader
//!
//! `ReadingWindow` keeps the hadiths around the current reading position so
//! adjacent pages render without a store round-trip. `DoorCache` keeps
//! recently opened door listings with LRU eviction.

use crate::error::Result;
use crate::model::{Hadith, HadithDetails};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, warn};

const MAX_PRESIZED_SLOTS: i64 = 1024;

const DEFAULT_DOOR_CAPACITY: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(n) => n,
    None => unreachable!(),
};

pub struct ReadingWindow {
    radius: i64,
    entries: HashMap<i64, HadithDetails>,
}

impl ReadingWindow {
    pub fn new(radius: i64) -> Self {
        let radius = radius.max(0);
        let slots = radius
            .saturating_mul(2)
            .saturating_add(1)
            .min(MAX_PRESIZED_SLOTS);
        Self {
            radius,
            entries: HashMap::with_capacity(usize::try_from(slots).unwrap_or(0)),
        }
    }

    /// Inclusive id range kept around `center`, clipped to `[1, count]`.
    pub fn bounds(&self, center: i64, count: i64) -> Option<(i64, i64)> {
        let low = center.saturating_sub(self.radius).max(1);
        let high = center.saturating_add(self.radius).min(count);
        (low <= high).then_some((low, high))
    }

    /// Drop entries outside the window around `center`, then fill the
    /// missing slots through `load`. Ids `load` cannot resolve stay empty.
    pub fn recenter<F>(&mut self, center: i64, count: i64, mut load: F)
    where
        F: FnMut(i64) -> Option<HadithDetails>,
    {
        let radius = self.radius.unsigned_abs();
        self.entries
            .retain(|id, _| id.abs_diff(center) <= radius && *id >= 1 && *id <= count);

        let Some((low, high)) = self.bounds(center, count) else {
            return;
        };
        for id in low..=high {
            if self.entries.contains_key(&id) {
                continue;
            }
            match load(id) {
                Some(details) => {
                    self.entries.insert(id, details);
                }
                None => warn!(id, "hadith unavailable, leaving window slot empty"),
            }
        }
        debug!(center, low, high, cached = self.entries.len(), "reading window rebuilt");
    }

    pub fn get(&self, id: i64) -> Option<&HadithDetails> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Cached ids, ascending
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

}

pub struct DoorCache {
    cache: LruCache<i64, Arc<Vec<Hadith>>>,
}

impl DoorCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_DOOR_CAPACITY);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn get_or_load<F>(&mut self, door_id: i64, load: F) -> Result<Arc<Vec<Hadith>>>
    where
        F: FnOnce() -> Result<Vec<Hadith>>,
    {
        if let Some(hadiths) = self.cache.get(&door_id) {
            return Ok(Arc::clone(hadiths));
        }

        let hadiths = Arc::new(load()?);
        self.cache.put(door_id, Arc::clone(&hadiths));
        Ok(hadiths)
    }

    /// (entries, capacity)
    pub fn stats(&self) -> (usize, usize) {
        (self.cache.len(), self.cache.cap().get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Book, Door};

    fn details(id: i64) -> HadithDetails {
        HadithDetails {
            hadith: Hadith {
                id,
                door_id: 1,
                book_id: 1,
                title: format!("حديث {}", id),
                matn: String::new(),
                sharh: String::new(),
                matn_normal: None,
            },
            door: Door { id: 1, book_id: 1, title: "باب".into() },
            book: Book { id: 1, title: "كتاب".into() },
        }
    }

    #[test]
    fn test_bounds_clip_to_corpus() {
        let window = ReadingWindow::new(3);
        assert_eq!(window.bounds(1, 1896), Some((1, 4)));
        assert_eq!(window.bounds(100, 1896), Some((97, 103)));
        assert_eq!(window.bounds(1895, 1896), Some((1892, 1896)));
        assert_eq!(window.bounds(1, 0), None);
    }

    #[test]
    fn test_extreme_radius_and_center_saturate() {
        let window = ReadingWindow::new(i64::MAX);
        assert_eq!(window.bounds(5, 10), Some((1, 10)));
        assert_eq!(window.bounds(i64::MAX, 10), Some((1, 10)));

        let window = ReadingWindow::new(3);
        assert_eq!(window.bounds(i64::MAX, i64::MAX), Some((i64::MAX - 3, i64::MAX)));
        assert_eq!(window.bounds(i64::MIN, 10), None);
    }

    #[test]
    fn test_recenter_evicts_and_fills() {
        let mut window = ReadingWindow::new(3);
        window.recenter(1, 1896, |id| Some(details(id)));
        assert_eq!(window.ids(), vec![1, 2, 3, 4]);

        window.recenter(4, 1896, |id| Some(details(id)));
        assert_eq!(window.ids(), (1..=7).collect::<Vec<_>>());

        window.recenter(20, 1896, |id| Some(details(id)));
        assert_eq!(window.ids(), (17..=23).collect::<Vec<_>>());
        assert_eq!(window.get(20).map(|d| d.hadith.id), Some(20));
    }

    #[test]
    fn test_recenter_loads_only_missing() {
        let mut window = ReadingWindow::new(3);
        window.recenter(10, 100, |id| Some(details(id)));

        let mut loaded = Vec::new();
        window.recenter(11, 100, |id| {
            loaded.push(id);
            Some(details(id))
        });
        assert_eq!(loaded, vec![14]);
        assert!(!window.contains(7));
    }

    #[test]
    fn test_unresolvable_ids_left_out() {
        let mut window = ReadingWindow::new(3);
        window.recenter(5, 10, |id| (id != 6).then(|| details(id)));
        assert_eq!(window.ids(), vec![2, 3, 4, 5, 7, 8]);
    }

    #[test]
    fn test_zero_radius_keeps_only_center() {
        let mut window = ReadingWindow::new(0);
        window.recenter(5, 10, |id| Some(details(id)));
        assert_eq!(window.ids(), vec![5]);
    }

    #[test]
    fn test_door_cache_loads_once_and_evicts() {
        let mut cache = DoorCache::new(2);
        let mut loads = 0;

        for door in [1, 1, 2, 1, 3, 2] {
            cache
                .get_or_load(door, || {
                    loads += 1;
                    Ok(vec![details(door).hadith])
                })
                .unwrap();
        }
        // 1, 2 loaded; 1 hit; 3 evicts 2; 2 reloaded
        assert_eq!(loads, 4);
        assert_eq!(cache.stats(), (2, 2));
    }

    #[test]
    fn test_door_cache_zero_capacity_falls_back() {
        let cache = DoorCache::new(0);
        assert_eq!(cache.stats(), (0, 32));
    }
}
