//! Implements the Map phase.
//!

use std::io::{BufRead, Write};

use log::debug;

use crate::container::ContainerStore;
use crate::controller::Assignment;
use crate::error::{MRError, Result};
use crate::mapreducer::Mapper;
use crate::record_types::ItemCounter;
use crate::sort::SortHook;

/// One map partition: reads its input range, calls the mapper until the range is consumed,
/// writes every returned record to its output container and finally sorts that container.
/// Mapper threads run on this; there is one MapPartition per partition of a stage.
pub struct MapPartition<'a> {
    store: &'a ContainerStore,
    assignment: Assignment,
    mapper: Box<dyn Mapper>,
    sort: Option<&'a dyn SortHook>,
    counter: &'a ItemCounter,
}

impl<'a> MapPartition<'a> {
    pub fn new(store: &'a ContainerStore,
               assignment: Assignment,
               mapper: Box<dyn Mapper>,
               sort: Option<&'a dyn SortHook>,
               counter: &'a ItemCounter)
               -> MapPartition<'a> {
        MapPartition {
            store: store,
            assignment: assignment,
            mapper: mapper,
            sort: sort,
            counter: counter,
        }
    }

    /// Runs the partition; returns the number of records written.
    pub fn run(mut self) -> Result<usize> {
        let written = self.do_map()?;

        if self.assignment.owns_input() {
            self.store.delete(self.assignment.input)?;
        }
        if let Some(sort) = self.sort {
            sort.sort(self.store, self.assignment.output, None)?;
        }
        debug!("map partition {} wrote {} records", self.assignment.partition, written);
        Ok(written)
    }

    fn do_map(&mut self) -> Result<usize> {
        let a = self.assignment;
        let in_path = self.store.path(a.input);
        let out_path = self.store.path(a.output);
        let mut input = a.open_input(self.store)?;
        let mut output = self.store.create(a.output)?;
        let mut written = 0;

        loop {
            let exhausted = input.fill_buf().map_err(|e| MRError::io(&in_path, e))?.is_empty();
            if exhausted {
                break;
            }
            let record = self.mapper.map(&mut input);
            if record.is_end() {
                break;
            }
            output.write_record(&record).map_err(|e| MRError::io(&out_path, e))?;
            self.counter.incr();
            written += 1;
        }
        output.flush().map_err(|e| MRError::io(&out_path, e))?;
        Ok(written)
    }
}
