//! Storage traits and the in-memory implementation

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{Result, StoreError};

pub type KvPair = (Vec<u8>, Vec<u8>);

/// Read half of an ordered byte-keyed store.
pub trait ReadStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Entries with `start <= key < end` in ascending byte order.
    /// `end = None` leaves the range open above.
    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>>;

    /// Lowest entry with `start <= key < end`. Backends override this to
    /// stop after one entry instead of materializing the range.
    fn first_in_range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Option<KvPair>> {
        Ok(self.range(start, end)?.into_iter().next())
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Every entry whose key starts with `prefix`, in key order.
    fn prefix(&self, prefix: &[u8]) -> Result<Vec<KvPair>> {
        let end = prefix_end(prefix);
        self.range(prefix, end.as_deref())
    }
}

pub trait Storage: ReadStorage {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

impl<S: ReadStorage + ?Sized> ReadStorage for &S {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>> {
        (**self).range(start, end)
    }

    fn first_in_range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Option<KvPair>> {
        (**self).first_in_range(start, end)
    }
}

impl<S: ReadStorage + ?Sized> ReadStorage for &mut S {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>> {
        (**self).range(start, end)
    }

    fn first_in_range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Option<KvPair>> {
        (**self).first_in_range(start, end)
    }
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }
}

/// Smallest key greater than every key that starts with `prefix`.
/// `None` when no such key exists (empty or all-`0xff` prefix).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// In-memory storage (for testing, demos and single-process hosts)
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("storage lock poisoned".to_string())
}

impl ReadStorage for InMemoryStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(Vec::new());
        }

        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };

        let data = self.data.read().map_err(poisoned)?;
        Ok(data
            .range::<[u8], _>((Bound::Included(start), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn first_in_range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Option<KvPair>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(None);
        }

        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };

        let data = self.data.read().map_err(poisoned)?;
        Ok(data
            .range::<[u8], _>((Bound::Included(start), upper))
            .next()
            .map(|(k, v)| (k.clone(), v.clone())))
    }
}

impl Storage for InMemoryStorage {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.remove(key);
        Ok(())
    }
}
