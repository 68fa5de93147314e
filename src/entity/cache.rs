use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::data_structs::Accession;
use crate::error::Error;

/// Shared, mutable handle to a cached entity.
pub type Shared<T> = Rc<RefCell<T>>;

/// Accession-keyed store guaranteeing that each entity is built at most once.
///
/// [`EntityCache::get_or_create`] is the only way to add entries. A factory
/// that fails leaves no entry, so the next request for the same accession
/// runs a fresh factory. Entries are never evicted.
///
/// Handles are `Rc<RefCell<_>>`, so the cache is confined to one thread.
#[derive(Debug)]
pub struct EntityCache<T> {
    entries: IndexMap<Accession, Shared<T>>,
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T> EntityCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entity, or builds it with `factory` and caches it.
    ///
    /// `factory` is called only on a miss, and the result is stored only if
    /// it is `Ok`.
    pub fn get_or_create<F>(
        &mut self,
        accession: &Accession,
        factory: F,
    ) -> Result<Shared<T>, Error>
    where
        F: FnOnce() -> Result<T, Error>, {
        if let Some(entry) = self.entries.get(accession) {
            debug!("Cache hit for {}", accession);
            return Ok(entry.clone());
        }

        debug!("Cache miss for {}, building", accession);
        let entity = Rc::new(RefCell::new(factory()?));
        self.entries.insert(accession.clone(), entity.clone());
        Ok(entity)
    }

    pub fn get(
        &self,
        accession: &Accession,
    ) -> Option<Shared<T>> {
        self.entries.get(accession).cloned()
    }

    pub fn contains(
        &self,
        accession: &Accession,
    ) -> bool {
        self.entries.contains_key(accession)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached accessions in insertion order.
    pub fn accessions(&self) -> impl Iterator<Item = &Accession> + '_ {
        self.entries.keys()
    }
}
