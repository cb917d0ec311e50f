//! Redistributes M sorted containers into R sorted containers.
//!
//! The inputs are merged (see `shard_merge`) and the merged stream is cut into R consecutive
//! runs of about `ceil(total / R)` records each, where `total` is taken from the counter of the
//! preceding stage. A run of equal keys is never cut: once a destination is full, the shuffle
//! only moves on to the next one when the key changes. Reading the destinations in id order
//! therefore yields the fully sorted input, and every key lives in exactly one destination.

use std::io::Write;

use log::{debug, info};
use time::OffsetDateTime;

use crate::container::{ContainerId, ContainerStore};
use crate::error::{MRError, Result};
use crate::record_types::ItemCounter;
use crate::shard_merge::ShardMergeIterator;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShuffleStats {
    pub sources: usize,
    pub destinations: usize,
    pub records: usize,
    /// Records per destination the shuffle aimed for.
    pub target_size: usize,
}

fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// Shuffles containers `0..m` into `r` new containers, deletes the inputs and renames the
/// outputs to `0..r`.
pub fn shuffle(store: &ContainerStore, counter: &ItemCounter, m: usize, r: usize) -> Result<ShuffleStats> {
    if r == 0 {
        return Err(MRError::InvalidPartitionCount(r));
    }
    let started = OffsetDateTime::now_utc();
    let target_size = ceil_div(counter.get(), r);

    let mut sources = Vec::with_capacity(m);
    for i in 0..m {
        sources.push(store.open(i as ContainerId)?);
    }
    let mut outputs = Vec::with_capacity(r);
    for i in 0..r {
        outputs.push(store.create((m + i) as ContainerId)?);
    }

    let merged = ShardMergeIterator::build(sources);
    let mut prev_key: Option<String> = None;
    let (mut dest, mut in_dest, mut records) = (0, 0, 0);

    for record in merged {
        let same_key = prev_key.as_ref() == Some(&record.key);

        if in_dest >= target_size && in_dest > 0 && !same_key && dest + 1 < r {
            debug!("shuffle: destination {} full with {} records", dest, in_dest);
            dest += 1;
            in_dest = 0;
        }

        outputs[dest]
            .write_record(&record)
            .map_err(|e| MRError::io(store.path((m + dest) as ContainerId), e))?;
        in_dest += 1;
        records += 1;

        if !same_key {
            prev_key = Some(record.key);
        }
    }

    for (i, out) in outputs.iter_mut().enumerate() {
        out.flush().map_err(|e| MRError::io(store.path((m + i) as ContainerId), e))?;
    }
    drop(outputs);

    for i in 0..m {
        store.delete(i as ContainerId)?;
    }
    store.normalize()?;

    let elapsed = OffsetDateTime::now_utc() - started;
    info!("shuffled {} records from {} into {} partitions (target {}) in {} ms",
          records,
          m,
          r,
          target_size,
          elapsed.whole_milliseconds());

    Ok(ShuffleStats {
        sources: m,
        destinations: r,
        records: records,
        target_size: target_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_types::Record;
    use tempfile::TempDir;

    fn setup(partitions: &[&[&str]]) -> (TempDir, ContainerStore, ItemCounter) {
        let dir = TempDir::new().unwrap();
        let store = ContainerStore::new(dir.path(), "c");
        let counter = ItemCounter::new();
        for (i, keys) in partitions.iter().enumerate() {
            let mut w = store.create(i as ContainerId).unwrap();
            for k in keys.iter() {
                w.write_record(&Record::new(*k, i as i64)).unwrap();
                counter.incr();
            }
        }
        (dir, store, counter)
    }

    fn keys(store: &ContainerStore, id: ContainerId) -> Vec<String> {
        store.read_all(id).unwrap().into_iter().map(|r| r.key).collect()
    }

    #[test]
    fn test_shuffle_balanced() {
        let (_d, store, counter) = setup(&[&["a", "c", "e", "g"], &["b", "d", "f", "h"]]);
        let stats = shuffle(&store, &counter, 2, 4).unwrap();

        assert_eq!(stats.records, 8);
        assert_eq!(stats.target_size, 2);
        assert_eq!(store.ids().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(keys(&store, 0), vec!["a", "b"]);
        assert_eq!(keys(&store, 1), vec!["c", "d"]);
        assert_eq!(keys(&store, 2), vec!["e", "f"]);
        assert_eq!(keys(&store, 3), vec!["g", "h"]);
    }

    #[test]
    fn test_shuffle_keeps_groups_together() {
        let (_d, store, counter) = setup(&[&["a", "k", "k", "k"], &["k", "k", "z"], &["b"]]);
        shuffle(&store, &counter, 3, 3).unwrap();

        // target is 3; the run of five "k"s overflows the first destination
        assert_eq!(keys(&store, 0), vec!["a", "b", "k", "k", "k", "k", "k"]);
        assert_eq!(keys(&store, 1), vec!["z"]);
        assert!(keys(&store, 2).is_empty());
    }

    #[test]
    fn test_shuffle_group_law() {
        let parts: &[&[&str]] = &[&["ant", "bee", "bee", "cat", "dog", "dog", "dog"],
                                  &["bee", "cow", "dog", "eel", "fox"],
                                  &["ant", "ant", "cat", "eel", "eel", "gnu"]];
        let (_d, store, counter) = setup(parts);
        let stats = shuffle(&store, &counter, 3, 4).unwrap();
        assert_eq!(stats.records, 18);

        let mut all = Vec::new();
        let mut owner = std::collections::HashMap::new();
        for id in store.ids().unwrap() {
            for k in keys(&store, id) {
                let o = owner.entry(k.clone()).or_insert(id);
                assert_eq!(*o, id, "key {} split across containers", k);
                all.push(k);
            }
        }
        let mut expected: Vec<String> = parts.iter().flat_map(|p| p.iter().map(|s| s.to_string())).collect();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_shuffle_into_one() {
        let (_d, store, counter) = setup(&[&["x", "y"], &["w"], &[]]);
        shuffle(&store, &counter, 3, 1).unwrap();
        assert_eq!(store.ids().unwrap(), vec![0]);
        assert_eq!(keys(&store, 0), vec!["w", "x", "y"]);
    }

    #[test]
    fn test_shuffle_zero_destinations() {
        let (_d, store, counter) = setup(&[&["x"]]);
        assert!(shuffle(&store, &counter, 1, 0).is_err());
    }
}
