//! Write-back cache overlay
//!
//! Buffers puts and deletes over a parent store. Reads and range scans see
//! the overlay merged over the parent. Nothing reaches the parent until
//! `commit`; dropping the cache discards every buffered write.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::storage::{KvPair, ReadStorage, Storage};
use crate::Result;

pub struct CacheStorage<'a, S: Storage + ?Sized> {
    parent: &'a mut S,
    // None marks a pending delete
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, S: Storage + ?Sized> CacheStorage<'a, S> {
    pub fn new(parent: &'a mut S) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of buffered writes and deletes.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Flush buffered writes to the parent in key order.
    pub fn commit(self) -> Result<()> {
        for (key, value) in self.writes {
            match value {
                Some(value) => self.parent.put(&key, &value)?,
                None => self.parent.delete(&key)?,
            }
        }
        Ok(())
    }

    pub fn discard(self) {}
}

impl<'a, S: Storage + ?Sized> ReadStorage for CacheStorage<'a, S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(buffered) => Ok(buffered.clone()),
            None => self.parent.get(key),
        }
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(Vec::new());
        }

        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.range(start, end)?.into_iter().collect();

        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        for (key, value) in self.writes.range::<[u8], _>((Bound::Included(start), upper)) {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }

    fn first_in_range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Option<KvPair>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(None);
        }

        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let buffered = self
            .writes
            .range::<[u8], _>((Bound::Included(start), upper))
            .find_map(|(key, value)| value.as_ref().map(|value| (key, value)));

        // lowest parent entry that is not deleted in the overlay
        let mut from = start.to_vec();
        let parent = loop {
            match self.parent.first_in_range(&from, end)? {
                Some((key, _)) if matches!(self.writes.get(&key), Some(None)) => {
                    from = key;
                    from.push(0);
                }
                found => break found,
            }
        };

        // on equal keys the overlay value wins
        Ok(match (buffered, parent) {
            (Some((key, _)), Some(parent)) if parent.0 < *key => Some(parent),
            (Some((key, value)), _) => Some((key.clone(), value.clone())),
            (None, parent) => parent,
        })
    }
}

impl<'a, S: Storage + ?Sized> Storage for CacheStorage<'a, S> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStorage;
    use rand::Rng;

    #[test]
    fn test_overlay_shadows_parent() {
        let mut parent = InMemoryStorage::new();
        parent.put(b"a", b"1").unwrap();
        parent.put(b"b", b"2").unwrap();

        let mut cache = CacheStorage::new(&mut parent);
        cache.put(b"a", b"10").unwrap();
        cache.delete(b"b").unwrap();
        cache.put(b"c", b"3").unwrap();

        assert_eq!(cache.get(b"a").unwrap(), Some(b"10".to_vec()));
        assert_eq!(cache.get(b"b").unwrap(), None);
        assert_eq!(
            cache.range(b"a", None).unwrap(),
            vec![
                (b"a".to_vec(), b"10".to_vec()),
                (b"c".to_vec(), b"3".to_vec()),
            ]
        );
        assert_eq!(cache.pending(), 3);
    }

    #[test]
    fn test_first_in_range_merges_overlay() {
        let mut parent = InMemoryStorage::new();
        for key in [&b"a"[..], &b"b"[..], &b"c"[..], &b"e"[..]] {
            parent.put(key, b"p").unwrap();
        }

        let mut cache = CacheStorage::new(&mut parent);
        cache.delete(b"a").unwrap();
        cache.delete(b"b").unwrap();
        assert_eq!(cache.first_in_range(b"a", None).unwrap(), Some((b"c".to_vec(), b"p".to_vec())));

        cache.put(b"c", b"o").unwrap();
        assert_eq!(cache.first_in_range(b"a", None).unwrap(), Some((b"c".to_vec(), b"o".to_vec())));

        cache.put(b"bb", b"o").unwrap();
        assert_eq!(cache.first_in_range(b"a", None).unwrap(), Some((b"bb".to_vec(), b"o".to_vec())));

        cache.delete(b"bb").unwrap();
        cache.delete(b"c").unwrap();
        assert_eq!(cache.first_in_range(b"a", Some(&b"e"[..])).unwrap(), None);
        assert_eq!(cache.first_in_range(b"a", None).unwrap(), Some((b"e".to_vec(), b"p".to_vec())));
    }

    #[test]
    fn test_first_in_range_agrees_with_range() {
        let mut rng = rand::thread_rng();
        let mut parent = InMemoryStorage::new();
        for _ in 0..64 {
            let key = [rng.gen_range(0..32u8)];
            parent.put(&key, b"p").unwrap();
        }

        let mut cache = CacheStorage::new(&mut parent);
        for _ in 0..64 {
            let key = [rng.gen_range(0..32u8)];
            if rng.gen_bool(0.5) {
                cache.delete(&key).unwrap();
            } else {
                cache.put(&key, b"o").unwrap();
            }
        }

        for start in 0..33u8 {
            for end in start..33u8 {
                let (start, end) = ([start], [end]);
                assert_eq!(
                    cache.first_in_range(&start, Some(&end[..])).unwrap(),
                    cache.range(&start, Some(&end[..])).unwrap().into_iter().next()
                );
            }
        }
    }

    #[test]
    fn test_discard_leaves_parent_untouched() {
        let mut parent = InMemoryStorage::new();
        parent.put(b"a", b"1").unwrap();

        let mut cache = CacheStorage::new(&mut parent);
        cache.delete(b"a").unwrap();
        cache.discard();

        assert_eq!(parent.get(b"a").unwrap(), Some(b"1".to_vec()));
    }
}
