//! Merges an arbitrary number of sorted record streams into one sorted stream.
//!
//! The working set holds at most one pending record per source that is still open. Each
//! step yields the pending record with the smallest key and refills the working set from
//! the source it came from; an exhausted source is dropped (closing its file).

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::record_types::Record;

/// A pending record and the index of the source it was read from.
struct Pending {
    record: Record,
    source: usize,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Pending) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Pending) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Key bytes first; among equal keys, the lower source index wins.
impl Ord for Pending {
    fn cmp(&self, other: &Pending) -> Ordering {
        match self.record.key.as_bytes().cmp(other.record.key.as_bytes()) {
            Ordering::Equal => self.source.cmp(&other.source),
            o => o,
        }
    }
}

/// See module description.
pub struct ShardMergeIterator<It: Iterator<Item = Record>> {
    sources: Vec<Option<It>>,
    working_set: BinaryHeap<Reverse<Pending>>,
}

impl<It: Iterator<Item = Record>> ShardMergeIterator<It> {
    /// Takes the sorted sources and primes the working set with the first record of each.
    pub fn build<ItIt: IntoIterator<Item = It>>(sources: ItIt) -> ShardMergeIterator<It> {
        let mut merge = ShardMergeIterator {
            sources: sources.into_iter().map(Some).collect(),
            working_set: BinaryHeap::new(),
        };
        for i in 0..merge.sources.len() {
            merge.replenish(i);
        }
        merge
    }

    /// Reads the next record of source `i` into the working set, or closes the source if it
    /// is exhausted.
    fn replenish(&mut self, i: usize) {
        let next = match self.sources[i] {
            None => return,
            Some(ref mut src) => src.next(),
        };
        match next {
            Some(record) => {
                self.working_set.push(Reverse(Pending {
                    record: record,
                    source: i,
                }))
            }
            None => self.sources[i] = None,
        }
    }

    /// How many sources have not been exhausted yet.
    pub fn open_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.is_some()).count()
    }
}

impl<It: Iterator<Item = Record>> Iterator for ShardMergeIterator<It> {
    type Item = Record;
    fn next(&mut self) -> Option<Self::Item> {
        let Reverse(smallest) = self.working_set.pop()?;
        self.replenish(smallest.source);
        Some(smallest.record)
    }
}
