//! Sorting of containers after the map stage, and the comparison functions used for it.

use std::cmp::Ordering;

use log::debug;

use crate::container::{ContainerId, ContainerStore};
use crate::error::{MRError, Result};
use crate::record_types::Record;

/// Function type to be used as custom compare function
pub type Comparer<T> = fn(a: &T, b: &T) -> Ordering;

/// Orders records by key, bytewise. This is the order the shuffle expects.
#[inline]
pub fn compare_key(a: &Record, b: &Record) -> Ordering {
    a.key.as_bytes().cmp(b.key.as_bytes())
}

/// Orders records by value.
#[inline]
pub fn compare_value(a: &Record, b: &Record) -> Ordering {
    a.value.cmp(&b.value)
}

/// Called by every map worker on its own output container once it is complete.
pub trait SortHook: Sync {
    /// Sorts the container `id` using `cmp`, or `compare_key` if None.
    fn sort(&self, store: &ContainerStore, id: ContainerId, cmp: Option<Comparer<Record>>) -> Result<()>;
}

impl<F> SortHook for F
    where F: Fn(&ContainerStore, ContainerId, Option<Comparer<Record>>) -> Result<()> + Sync
{
    fn sort(&self, store: &ContainerStore, id: ContainerId, cmp: Option<Comparer<Record>>) -> Result<()> {
        self(store, id, cmp)
    }
}

/// Loads a whole container into memory, sorts it (stable) and rewrites it.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemorySort;

impl SortHook for MemorySort {
    fn sort(&self, store: &ContainerStore, id: ContainerId, cmp: Option<Comparer<Record>>) -> Result<()> {
        let mut records = store.read_all(id)?;
        records.sort_by(cmp.unwrap_or(compare_key));

        let mut out = store.create(id)?;
        for r in &records {
            out.write_record(r).map_err(|e| MRError::io(store.path(id), e))?;
        }
        std::io::Write::flush(&mut out).map_err(|e| MRError::io(store.path(id), e))?;
        debug!("sorted container {} ({} records)", id, records.len());
        Ok(())
    }
}
