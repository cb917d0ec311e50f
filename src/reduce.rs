//! Implements the Reduce phase.
//!

use std::io::{BufRead, Write};

use log::debug;

use crate::container::ContainerStore;
use crate::controller::Assignment;
use crate::error::{MRError, Result};
use crate::mapreducer::Reducer;
use crate::record_types::ItemCounter;

/// One reduce partition: folds its entire input into the reducer's accumulator and writes
/// the final accumulator as the only record of its output container. The input container is
/// deleted afterwards.
pub struct ReducePartition<'a> {
    store: &'a ContainerStore,
    assignment: Assignment,
    reducer: Box<dyn Reducer>,
    counter: &'a ItemCounter,
}

impl<'a> ReducePartition<'a> {
    pub fn new(store: &'a ContainerStore,
               assignment: Assignment,
               reducer: Box<dyn Reducer>,
               counter: &'a ItemCounter)
               -> ReducePartition<'a> {
        ReducePartition {
            store: store,
            assignment: assignment,
            reducer: reducer,
            counter: counter,
        }
    }

    /// Run the Reduce partition; returns the number of records written (always 1).
    pub fn run(mut self) -> Result<usize> {
        self.do_reduce()?;
        if self.assignment.owns_input() {
            self.store.delete(self.assignment.input)?;
        }
        debug!("reduce partition {} -> {}",
               self.assignment.partition,
               self.reducer.result());
        Ok(1)
    }

    fn do_reduce(&mut self) -> Result<()> {
        let a = self.assignment;
        let in_path = self.store.path(a.input);
        let out_path = self.store.path(a.output);
        let mut input = a.open_input(self.store)?;

        loop {
            let exhausted = input.fill_buf().map_err(|e| MRError::io(&in_path, e))?.is_empty();
            if exhausted {
                break;
            }
            self.reducer.reduce(&mut input);
        }
        // close the input before it's deleted
        drop(input);

        let mut output = self.store.create(a.output)?;
        output.write_record(self.reducer.result()).map_err(|e| MRError::io(&out_path, e))?;
        output.flush().map_err(|e| MRError::io(&out_path, e))?;
        self.counter.incr();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure_mr::ClosureReducer;
    use crate::record_types::Record;
    use crate::split::Offset;
    use tempfile::TempDir;

    fn sum(acc: &Record, r: Record) -> Record {
        Record::new(r.key, acc.value + r.value)
    }

    fn assignment() -> Assignment {
        Assignment {
            partition: 0,
            input: 0,
            output: 1,
            start: Offset::At(0),
            end: Offset::End,
        }
    }

    fn write(store: &ContainerStore, id: i64, records: &[(&str, i64)]) {
        let mut w = store.create(id).unwrap();
        for &(k, v) in records {
            w.write_record(&Record::new(k, v)).unwrap();
        }
    }

    #[test]
    fn test_reduce_partition() {
        let dir = TempDir::new().unwrap();
        let store = ContainerStore::new(dir.path(), "c");
        write(&store, 0, &[("a", 1), ("b", 2), ("c", 3)]);
        let counter = ItemCounter::new();

        let rp = ReducePartition::new(&store,
                                      assignment(),
                                      Box::new(ClosureReducer::new(sum, Record::new("", 0))),
                                      &counter);
        assert_eq!(rp.run().unwrap(), 1);
        assert_eq!(store.read_all(1).unwrap(), vec![Record::new("c", 6)]);
        assert_eq!(counter.get(), 1);
        // reduce partitions retire their input
        assert!(!store.exists(0));
    }

    #[test]
    fn test_reduce_partition_empty_input() {
        let dir = TempDir::new().unwrap();
        let store = ContainerStore::new(dir.path(), "c");
        write(&store, 0, &[]);
        let counter = ItemCounter::new();

        let rp = ReducePartition::new(&store,
                                      assignment(),
                                      Box::new(ClosureReducer::new(sum, Record::new("seed", 5))),
                                      &counter);
        rp.run().unwrap();
        assert_eq!(store.read_all(1).unwrap(), vec![Record::new("seed", 5)]);
    }

    #[test]
    fn test_reduce_partition_missing_input() {
        let dir = TempDir::new().unwrap();
        let store = ContainerStore::new(dir.path(), "c");
        let counter = ItemCounter::new();

        let rp = ReducePartition::new(&store,
                                      assignment(),
                                      Box::new(ClosureReducer::new(sum, Record::new("", 0))),
                                      &counter);
        assert!(rp.run().is_err());
    }
}
