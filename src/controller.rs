//! Controls the execution of a mapreduce instance.
//!
//! `run_stage()` runs one stage: one thread per partition, all joined before it returns.
//! `MRController` chains stages and shuffles over one working directory.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::mpsc::channel;

use log::{error, info};
use scoped_threadpool::Pool;
use time::OffsetDateTime;

use crate::container::{ContainerId, ContainerStore, INPUT_ID};
use crate::error::{MRError, Result};
use crate::map::MapPartition;
use crate::mapreducer::Functor;
use crate::parameters::MRParameters;
use crate::record_types::{ItemCounter, Record};
use crate::reduce::ReducePartition;
use crate::shuffle::{self, ShuffleStats};
use crate::sort::{MemorySort, SortHook};
use crate::split::{split_file, Offset};

/// What one partition of a stage reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub partition: usize,
    pub input: ContainerId,
    pub output: ContainerId,
    pub start: Offset,
    pub end: Offset,
}

impl Assignment {
    /// Assigns `count` partitions. Without boundaries, partition i reads all of container i;
    /// with boundaries, it reads `[b[i], b[i+1])` of the input container. Partition i always
    /// writes container `i + count`.
    pub fn plan(count: usize, boundaries: &[Offset]) -> Vec<Assignment> {
        (0..count)
            .map(|i| {
                let output = (i + count) as ContainerId;
                if boundaries.is_empty() {
                    Assignment {
                        partition: i,
                        input: i as ContainerId,
                        output: output,
                        start: Offset::At(0),
                        end: Offset::End,
                    }
                } else {
                    Assignment {
                        partition: i,
                        input: INPUT_ID,
                        output: output,
                        start: boundaries[i],
                        end: boundaries[i + 1],
                    }
                }
            })
            .collect()
    }

    /// Whether the partition reads a container of its own (which it deletes when done),
    /// rather than a range of the shared input.
    pub fn owns_input(&self) -> bool {
        self.input != INPUT_ID
    }

    /// Opens the input range for reading; the returned stream ends at the end boundary.
    pub fn open_input(&self, store: &ContainerStore) -> Result<io::BufReader<io::Take<fs::File>>> {
        let path = store.path(self.input);
        let mut f = fs::File::open(&path).map_err(|e| MRError::io(&path, e))?;

        let start = match self.start {
            Offset::At(p) => p,
            Offset::End => return Ok(io::BufReader::new(f.take(0))),
        };
        f.seek(SeekFrom::Start(start)).map_err(|e| MRError::io(&path, e))?;
        let limit = match self.end {
            Offset::At(e) => e.saturating_sub(start),
            Offset::End => u64::MAX,
        };
        Ok(io::BufReader::new(f.take(limit)))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageStats {
    pub partitions: usize,
    /// Records written by all partitions.
    pub records: usize,
}

/// Runs one stage with `count` partitions in parallel and blocks until all of them are done.
/// See `Assignment::plan()` for what each partition reads. `sort` is applied to the output of
/// map partitions. The counter is reset first and then counts every record written.
///
/// If any partition fails, the first error (by partition) is returned once all partitions
/// have finished. Otherwise the outputs are renamed to `0..count`.
pub fn run_stage(store: &ContainerStore,
                 count: usize,
                 boundaries: &[Offset],
                 functor: &Functor,
                 sort: Option<&dyn SortHook>,
                 counter: &ItemCounter)
                 -> Result<StageStats> {
    if count == 0 {
        return Err(MRError::InvalidPartitionCount(count));
    }
    if !boundaries.is_empty() && boundaries.len() != count + 1 {
        return Err(MRError::SplitFailed {
            expected: count + 1,
            got: boundaries.len(),
        });
    }

    let started = OffsetDateTime::now_utc();
    counter.reset();

    let (send, recv) = channel();
    let mut pool = Pool::new(count as u32);

    pool.scoped(|scope| {
        for a in Assignment::plan(count, boundaries) {
            let done = send.clone();

            scope.execute(move || {
                let result = match *functor {
                    Functor::Map(ref new_mapper) => {
                        MapPartition::new(store, a, new_mapper(), sort, counter).run()
                    }
                    Functor::Reduce(ref new_reducer) => {
                        ReducePartition::new(store, a, new_reducer(), counter).run()
                    }
                };
                let _ = done.send((a.partition, result));
            });
        }
        scope.join_all();
    });
    drop(send);

    let mut results: Vec<(usize, Result<usize>)> = recv.iter().collect();
    results.sort_by_key(|&(p, _)| p);

    let mut records = 0;
    let mut failure = None;
    for (partition, result) in results {
        match result {
            Ok(n) => records += n,
            Err(e) => {
                error!("{} partition {} failed: {}", functor.role(), partition, e);
                if failure.is_none() {
                    failure = Some(MRError::Worker {
                        partition: partition,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }

    store.normalize()?;

    let elapsed = OffsetDateTime::now_utc() - started;
    info!("{} stage: {} partitions wrote {} records in {} ms",
          functor.role(),
          count,
          records,
          elapsed.whole_milliseconds());

    Ok(StageStats {
        partitions: count,
        records: records,
    })
}

/// Chains stages and shuffles over one working directory, keeping track of how many
/// containers the last step left behind.
pub struct MRController {
    params: MRParameters,
    store: ContainerStore,
    counter: ItemCounter,

    // How many containers are there after the last step?
    partitions: usize,
}

impl MRController {
    /// Sets up the working directory (creating and, depending on the parameters, cleaning it).
    pub fn new(params: MRParameters) -> Result<MRController> {
        let store = ContainerStore::from_params(&params);
        store.create_or_clean(params.clean_on_init)?;
        let partitions = store.ids()?.len();

        Ok(MRController {
            params: params,
            store: store,
            counter: ItemCounter::new(),
            partitions: partitions,
        })
    }

    /// Sets up a controller and runs `pipeline()` on it.
    pub fn run(params: MRParameters,
               map: &Functor,
               reduce: &Functor,
               finish: &Functor)
               -> Result<Vec<Record>> {
        let mut controller = MRController::new(params)?;
        controller.pipeline(map, reduce, finish)
    }

    /// Runs the usual pipeline: map over `params.mappers` sorted partitions of the input,
    /// shuffle into `params.reducers` partitions, reduce those, then shuffle everything into one
    /// partition and reduce it with `finish`. Returns the final records.
    pub fn pipeline(&mut self, map: &Functor, reduce: &Functor, finish: &Functor) -> Result<Vec<Record>> {
        let (mappers, reducers) = (self.params.mappers, self.params.reducers);
        let sort = MemorySort;

        self.map(mappers, map, Some(&sort))?
            .shuffle(reducers)?
            .reduce(reduce)?
            .shuffle(1)?
            .reduce(finish)?;
        self.results()
    }

    pub fn params(&self) -> &MRParameters {
        &self.params
    }

    pub fn store(&self) -> &ContainerStore {
        &self.store
    }

    pub fn counter(&self) -> &ItemCounter {
        &self.counter
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    pub fn install_input<P: AsRef<Path>>(&self, src: P) -> Result<u64> {
        self.store.install_input(src)
    }

    /// Splits the input container into `mappers` ranges and runs `functor` over them.
    pub fn map(&mut self,
               mappers: usize,
               functor: &Functor,
               sort: Option<&dyn SortHook>)
               -> Result<&mut MRController> {
        if mappers == 0 {
            return Err(MRError::InvalidPartitionCount(mappers));
        }
        if !self.store.exists(INPUT_ID) {
            return Err(MRError::MissingInput(self.store.input_path()));
        }
        let boundaries = split_file(&self.store, self.params.delimiter, mappers);
        if boundaries.len() != mappers + 1 {
            return Err(MRError::SplitFailed {
                expected: mappers + 1,
                got: boundaries.len(),
            });
        }
        let stats = run_stage(&self.store, mappers, &boundaries, functor, sort, &self.counter)?;
        self.partitions = stats.partitions;
        Ok(self)
    }

    /// Runs `functor` over every current container, one partition each.
    pub fn map_containers(&mut self,
                          functor: &Functor,
                          sort: Option<&dyn SortHook>)
                          -> Result<&mut MRController> {
        let stats = run_stage(&self.store, self.partitions, &[], functor, sort, &self.counter)?;
        self.partitions = stats.partitions;
        Ok(self)
    }

    /// Reduces every current container into one record.
    pub fn reduce(&mut self, functor: &Functor) -> Result<&mut MRController> {
        self.map_containers(functor, None)
    }

    /// Shuffles the current containers into `reducers` containers.
    pub fn shuffle(&mut self, reducers: usize) -> Result<&mut MRController> {
        self.shuffle_stats(reducers)?;
        Ok(self)
    }

    /// Like shuffle(), but returns the statistics of the shuffle.
    pub fn shuffle_stats(&mut self, reducers: usize) -> Result<ShuffleStats> {
        let stats = shuffle::shuffle(&self.store, &self.counter, self.partitions, reducers)?;
        self.partitions = reducers;
        Ok(stats)
    }

    /// All records of the current containers, in container order.
    pub fn results(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for id in self.store.ids()? {
            records.extend(self.store.read_all(id)?);
        }
        Ok(records)
    }
}
